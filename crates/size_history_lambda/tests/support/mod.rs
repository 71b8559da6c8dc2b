use std::collections::BTreeMap;
use std::sync::Mutex;

use size_history_core::trend::TrendSeries;
use size_history_lambda::adapters::object_store::{ContainerObjects, ObjectSummary};
use size_history_lambda::handlers::plotter::TrendRenderer;

/// Single in-memory bucket keyed by object name.
#[derive(Default)]
pub struct MemoryBucket {
    objects: Mutex<BTreeMap<String, (Vec<u8>, Option<String>)>>,
}

impl MemoryBucket {
    pub fn with_objects(objects: &[(&str, usize)]) -> Self {
        let bucket = Self::default();
        for (key, size) in objects {
            bucket
                .put_object("testbucket", key, &vec![b'x'; *size], None)
                .expect("seed object");
        }
        bucket
    }

    pub fn object(&self, key: &str) -> Option<(Vec<u8>, Option<String>)> {
        self.objects.lock().expect("poisoned mutex").get(key).cloned()
    }
}

impl ContainerObjects for MemoryBucket {
    fn list_objects(&self, _container_id: &str) -> Result<Vec<ObjectSummary>, String> {
        Ok(self
            .objects
            .lock()
            .expect("poisoned mutex")
            .iter()
            .map(|(key, (body, _))| ObjectSummary {
                key: key.clone(),
                size_bytes: body.len() as u64,
            })
            .collect())
    }

    fn put_object(
        &self,
        _container_id: &str,
        key: &str,
        body: &[u8],
        content_type: Option<&str>,
    ) -> Result<(), String> {
        self.objects.lock().expect("poisoned mutex").insert(
            key.to_string(),
            (body.to_vec(), content_type.map(str::to_string)),
        );
        Ok(())
    }

    fn delete_object(&self, _container_id: &str, key: &str) -> Result<(), String> {
        self.objects.lock().expect("poisoned mutex").remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub struct CapturingRenderer {
    pub rendered: Mutex<Vec<TrendSeries>>,
}

impl TrendRenderer for CapturingRenderer {
    fn render_png(&self, series: &TrendSeries) -> Result<Vec<u8>, String> {
        self.rendered
            .lock()
            .expect("poisoned mutex")
            .push(series.clone());
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}
