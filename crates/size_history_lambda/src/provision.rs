//! One-shot creation of the bucket and history table the pipeline depends on.

use std::time::Duration;

use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType, Projection,
    ProjectionType, ScalarAttributeType,
};
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use size_history_core::contract::{
    ATTR_CONTAINER_ID, ATTR_OBSERVED_AT, ATTR_TOTAL_SIZE_BYTES, SIZE_INDEX_NAME,
};
use size_history_core::retry::{poll_until, PollOutcome, RetryPolicy};
use thiserror::Error;

const COMPONENT: &str = "provision";
const TABLE_ACTIVE: &str = "ACTIVE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisionError {
    #[error("failed to create bucket {bucket}: {message}")]
    Bucket { bucket: String, message: String },
    #[error("failed to create table {table}: {message}")]
    Table { table: String, message: String },
    #[error("table {table} did not become active: {message}")]
    NotReady { table: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionPlan {
    pub bucket: String,
    pub table: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub bucket: CreateOutcome,
    pub table: CreateOutcome,
    pub table_status: String,
}

/// Control-plane calls needed to stand up the store.
pub trait InfrastructureApi {
    fn create_bucket(&self, bucket: &str, region: &str) -> Result<CreateOutcome, String>;
    fn create_history_table(&self, table: &str) -> Result<CreateOutcome, String>;
    fn table_status(&self, table: &str) -> Result<String, String>;
}

pub fn default_table_poll_policy() -> RetryPolicy {
    RetryPolicy::exponential(10, Duration::from_secs(1), Duration::from_secs(8))
}

pub fn provision_stack(
    plan: &ProvisionPlan,
    api: &impl InfrastructureApi,
    policy: &RetryPolicy,
    sleep: &mut dyn FnMut(Duration),
) -> Result<ProvisionReport, ProvisionError> {
    let bucket = api
        .create_bucket(&plan.bucket, &plan.region)
        .map_err(|message| ProvisionError::Bucket {
            bucket: plan.bucket.clone(),
            message,
        })?;
    tracing::info!(component = COMPONENT, event = "bucket_ready", bucket = %plan.bucket, outcome = ?bucket);

    let table = api
        .create_history_table(&plan.table)
        .map_err(|message| ProvisionError::Table {
            table: plan.table.clone(),
            message,
        })?;
    tracing::info!(component = COMPONENT, event = "table_requested", table = %plan.table, outcome = ?table);

    let table_status = poll_until(policy, sleep, |attempt| {
        let status = api.table_status(&plan.table)?;
        tracing::info!(
            component = COMPONENT,
            event = "table_status",
            table = %plan.table,
            attempt,
            status = %status,
        );
        if status == TABLE_ACTIVE {
            Ok(PollOutcome::Ready(status))
        } else {
            Ok(PollOutcome::Pending(status))
        }
    })
    .map_err(|message| ProvisionError::NotReady {
        table: plan.table.clone(),
        message,
    })?;

    Ok(ProvisionReport {
        bucket,
        table,
        table_status,
    })
}

pub struct AwsInfrastructure {
    pub s3_client: aws_sdk_s3::Client,
    pub dynamodb_client: aws_sdk_dynamodb::Client,
}

impl InfrastructureApi for AwsInfrastructure {
    fn create_bucket(&self, bucket: &str, region: &str) -> Result<CreateOutcome, String> {
        let client = self.s3_client.clone();
        let bucket = bucket.to_string();
        // us-east-1 rejects an explicit location constraint.
        let configuration = (region != "us-east-1").then(|| {
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region))
                .build()
        });

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                match client
                    .create_bucket()
                    .bucket(bucket)
                    .set_create_bucket_configuration(configuration)
                    .send()
                    .await
                {
                    Ok(_) => Ok(CreateOutcome::Created),
                    Err(error) => {
                        let service_error = error.into_service_error();
                        if service_error.is_bucket_already_owned_by_you() {
                            Ok(CreateOutcome::AlreadyExists)
                        } else {
                            Err(service_error.to_string())
                        }
                    }
                }
            })
        })
    }

    fn create_history_table(&self, table: &str) -> Result<CreateOutcome, String> {
        let client = self.dynamodb_client.clone();
        let table = table.to_string();
        let definition = HistoryTableDefinition::new()?;

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                match client
                    .create_table()
                    .table_name(table)
                    .set_key_schema(Some(definition.key_schema))
                    .set_attribute_definitions(Some(definition.attributes))
                    .global_secondary_indexes(definition.size_index)
                    .billing_mode(BillingMode::PayPerRequest)
                    .send()
                    .await
                {
                    Ok(_) => Ok(CreateOutcome::Created),
                    Err(error) => {
                        let service_error = error.into_service_error();
                        if service_error.is_resource_in_use_exception() {
                            Ok(CreateOutcome::AlreadyExists)
                        } else {
                            Err(service_error.to_string())
                        }
                    }
                }
            })
        })
    }

    fn table_status(&self, table: &str) -> Result<String, String> {
        let client = self.dynamodb_client.clone();
        let table = table.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .describe_table()
                    .table_name(table)
                    .send()
                    .await
                    .map_err(|error| format!("failed to describe table: {error}"))?;
                Ok::<_, String>(
                    output
                        .table()
                        .and_then(|description| description.table_status())
                        .map(|status| status.as_str().to_string())
                        .unwrap_or_else(|| "UNKNOWN".to_string()),
                )
            })
        })
    }
}

/// Key schema of the history table plus the by-size secondary index.
pub struct HistoryTableDefinition {
    pub key_schema: Vec<KeySchemaElement>,
    pub attributes: Vec<AttributeDefinition>,
    pub size_index: GlobalSecondaryIndex,
}

impl HistoryTableDefinition {
    pub fn new() -> Result<Self, String> {
        let key_schema = vec![
            key_element(ATTR_CONTAINER_ID, KeyType::Hash)?,
            key_element(ATTR_OBSERVED_AT, KeyType::Range)?,
        ];
        let attributes = vec![
            attribute(ATTR_CONTAINER_ID, ScalarAttributeType::S)?,
            attribute(ATTR_OBSERVED_AT, ScalarAttributeType::N)?,
            attribute(ATTR_TOTAL_SIZE_BYTES, ScalarAttributeType::N)?,
        ];
        let size_index = GlobalSecondaryIndex::builder()
            .index_name(SIZE_INDEX_NAME)
            .key_schema(key_element(ATTR_CONTAINER_ID, KeyType::Hash)?)
            .key_schema(key_element(ATTR_TOTAL_SIZE_BYTES, KeyType::Range)?)
            .projection(
                Projection::builder()
                    .projection_type(ProjectionType::All)
                    .build(),
            )
            .build()
            .map_err(|error| format!("invalid size index definition: {error}"))?;

        Ok(Self {
            key_schema,
            attributes,
            size_index,
        })
    }
}

fn key_element(name: &str, key_type: KeyType) -> Result<KeySchemaElement, String> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .map_err(|error| format!("invalid key schema element {name}: {error}"))
}

fn attribute(name: &str, kind: ScalarAttributeType) -> Result<AttributeDefinition, String> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(kind)
        .build()
        .map_err(|error| format!("invalid attribute definition {name}: {error}"))
}
