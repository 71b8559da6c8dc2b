use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_TABLE: &str = "S3-object-size-history";
pub const SIZE_INDEX_NAME: &str = "container_id-total_size_bytes-index";

pub const ATTR_CONTAINER_ID: &str = "container_id";
pub const ATTR_OBSERVED_AT: &str = "observed_at";
pub const ATTR_TOTAL_SIZE_BYTES: &str = "total_size_bytes";
pub const ATTR_OBJECT_COUNT: &str = "object_count";

/// One point-in-time snapshot of a container's aggregate size.
///
/// Keyed by `(container_id, observed_at)`. Records are append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SizeObservation {
    pub container_id: String,
    /// Milliseconds since the Unix epoch.
    pub observed_at: i64,
    pub total_size_bytes: u64,
    pub object_count: u64,
}

impl SizeObservation {
    pub fn empty(container_id: impl Into<String>, observed_at: i64) -> Self {
        Self {
            container_id: container_id.into(),
            observed_at,
            total_size_bytes: 0,
            object_count: 0,
        }
    }

    /// Builds an observation from the sizes of every object in the container.
    pub fn from_object_sizes(
        container_id: impl Into<String>,
        observed_at: i64,
        sizes: impl IntoIterator<Item = u64>,
    ) -> Self {
        let mut observation = Self::empty(container_id, observed_at);
        for size in sizes {
            observation.total_size_bytes = observation.total_size_bytes.saturating_add(size);
            observation.object_count += 1;
        }
        observation
    }

    pub fn key(&self) -> ObservationKey {
        ObservationKey {
            container_id: self.container_id.clone(),
            observed_at: self.observed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObservationKey {
    pub container_id: String,
    pub observed_at: i64,
}

impl std::fmt::Display for ObservationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.container_id, self.observed_at)
    }
}
