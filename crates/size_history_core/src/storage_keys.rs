pub const PLOT_OBJECT_KEY: &str = "plot.png";
pub const PLOT_CONTENT_TYPE: &str = "image/png";

/// Location of a published artifact inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    pub container_id: String,
    pub key: String,
}

impl ArtifactLocation {
    pub fn plot(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            key: PLOT_OBJECT_KEY.to_string(),
        }
    }

    pub fn uri(&self) -> String {
        format!(
            "s3://{}/{}",
            self.container_id.trim_matches('/'),
            self.key.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_location_uses_fixed_key() {
        let location = ArtifactLocation::plot("testbucket");
        assert_eq!(location.key, PLOT_OBJECT_KEY);
        assert_eq!(location.uri(), "s3://testbucket/plot.png");
    }
}
