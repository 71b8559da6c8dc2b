use aws_sdk_s3::primitives::ByteStream;

use crate::adapters::object_store::{ContainerObjects, ObjectSummary};

/// [`ContainerObjects`] backed by S3 buckets.
#[derive(Clone)]
pub struct S3ContainerObjects {
    s3_client: aws_sdk_s3::Client,
}

impl S3ContainerObjects {
    pub fn new(s3_client: aws_sdk_s3::Client) -> Self {
        Self { s3_client }
    }
}

impl ContainerObjects for S3ContainerObjects {
    fn list_objects(&self, container_id: &str) -> Result<Vec<ObjectSummary>, String> {
        let bucket = container_id.to_string();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let mut objects = Vec::new();
                let mut continuation_token: Option<String> = None;
                loop {
                    let output = client
                        .list_objects_v2()
                        .bucket(&bucket)
                        .set_continuation_token(continuation_token.take())
                        .send()
                        .await
                        .map_err(|error| format!("failed to list objects in s3: {error}"))?;

                    for object in output.contents() {
                        objects.push(ObjectSummary {
                            key: object.key().unwrap_or_default().to_string(),
                            size_bytes: object
                                .size()
                                .and_then(|size| u64::try_from(size).ok())
                                .unwrap_or(0),
                        });
                    }

                    match output.next_continuation_token() {
                        Some(token) if output.is_truncated().unwrap_or(false) => {
                            continuation_token = Some(token.to_string());
                        }
                        _ => break,
                    }
                }
                Ok::<_, String>(objects)
            })
        })
    }

    fn put_object(
        &self,
        container_id: &str,
        key: &str,
        body: &[u8],
        content_type: Option<&str>,
    ) -> Result<(), String> {
        let bucket = container_id.to_string();
        let object_key = key.to_string();
        let body_bytes = body.to_vec();
        let content_type = content_type.map(str::to_string);
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_object()
                    .bucket(bucket)
                    .key(object_key)
                    .set_content_type(content_type)
                    .body(ByteStream::from(body_bytes))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to write object to s3: {error}"))
            })
        })
    }

    fn delete_object(&self, container_id: &str, key: &str) -> Result<(), String> {
        let bucket = container_id.to_string();
        let object_key = key.to_string();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .delete_object()
                    .bucket(bucket)
                    .key(object_key)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to delete object from s3: {error}"))
            })
        })
    }
}
