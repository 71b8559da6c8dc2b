#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size_bytes: u64,
}

/// Object-level access to a named container.
pub trait ContainerObjects {
    /// Lists every object currently in the container, following pagination.
    fn list_objects(&self, container_id: &str) -> Result<Vec<ObjectSummary>, String>;

    fn put_object(
        &self,
        container_id: &str,
        key: &str,
        body: &[u8],
        content_type: Option<&str>,
    ) -> Result<(), String>;

    fn delete_object(&self, container_id: &str, key: &str) -> Result<(), String>;
}
