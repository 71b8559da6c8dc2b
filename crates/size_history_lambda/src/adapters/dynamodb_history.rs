//! DynamoDB-backed [`SizeHistoryStore`].
//!
//! Table key: `container_id` (hash) + `observed_at` (range). The global
//! secondary index [`SIZE_INDEX_NAME`] keys on `container_id` +
//! `total_size_bytes` and serves historical-maximum lookups.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use size_history_core::contract::{
    SizeObservation, ATTR_CONTAINER_ID, ATTR_OBJECT_COUNT, ATTR_OBSERVED_AT,
    ATTR_TOTAL_SIZE_BYTES, SIZE_INDEX_NAME,
};
use size_history_core::store::{SizeHistoryStore, StoreError};

pub type Item = HashMap<String, AttributeValue>;

#[derive(Clone)]
pub struct DynamoDbSizeHistoryStore {
    table: String,
    dynamodb_client: aws_sdk_dynamodb::Client,
}

impl DynamoDbSizeHistoryStore {
    pub fn new(table: impl Into<String>, dynamodb_client: aws_sdk_dynamodb::Client) -> Self {
        Self {
            table: table.into(),
            dynamodb_client,
        }
    }
}

impl SizeHistoryStore for DynamoDbSizeHistoryStore {
    fn append(&self, observation: &SizeObservation) -> Result<(), StoreError> {
        let client = self.dynamodb_client.clone();
        let table = self.table.clone();
        let item = observation_to_item(observation);
        let key = observation.key();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let result = client
                    .put_item()
                    .table_name(table)
                    .set_item(Some(item))
                    .condition_expression("attribute_not_exists(#observed_at)")
                    .expression_attribute_names("#observed_at", ATTR_OBSERVED_AT)
                    .send()
                    .await;

                match result {
                    Ok(_) => Ok(()),
                    Err(error) => {
                        let service_error = error.into_service_error();
                        if service_error.is_conditional_check_failed_exception() {
                            Err(StoreError::DuplicateKey(key))
                        } else {
                            Err(StoreError::Write(service_error.to_string()))
                        }
                    }
                }
            })
        })
    }

    fn query_range(
        &self,
        container_id: &str,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<SizeObservation>, StoreError> {
        if from_ms > to_ms {
            return Ok(Vec::new());
        }
        let client = self.dynamodb_client.clone();
        let table = self.table.clone();
        let container_id = container_id.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let mut observations = Vec::new();
                let mut exclusive_start_key: Option<Item> = None;
                loop {
                    let output = client
                        .query()
                        .table_name(&table)
                        .key_condition_expression(
                            "#container_id = :container_id AND #observed_at BETWEEN :from AND :to",
                        )
                        .expression_attribute_names("#container_id", ATTR_CONTAINER_ID)
                        .expression_attribute_names("#observed_at", ATTR_OBSERVED_AT)
                        .expression_attribute_values(
                            ":container_id",
                            AttributeValue::S(container_id.clone()),
                        )
                        .expression_attribute_values(":from", AttributeValue::N(from_ms.to_string()))
                        .expression_attribute_values(":to", AttributeValue::N(to_ms.to_string()))
                        .scan_index_forward(true)
                        .set_exclusive_start_key(exclusive_start_key.take())
                        .send()
                        .await
                        .map_err(|error| {
                            StoreError::Query(format!("dynamodb range query failed: {error}"))
                        })?;

                    for item in output.items() {
                        observations.push(observation_from_item(item).map_err(StoreError::Query)?);
                    }

                    match output.last_evaluated_key() {
                        Some(key) if !key.is_empty() => exclusive_start_key = Some(key.clone()),
                        _ => break,
                    }
                }
                Ok::<_, StoreError>(observations)
            })
        })
    }

    fn query_max(&self, container_id: &str) -> Result<Option<SizeObservation>, StoreError> {
        let client = self.dynamodb_client.clone();
        let table = self.table.clone();
        let container_id = container_id.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .query()
                    .table_name(table)
                    .index_name(SIZE_INDEX_NAME)
                    .key_condition_expression("#container_id = :container_id")
                    .expression_attribute_names("#container_id", ATTR_CONTAINER_ID)
                    .expression_attribute_values(":container_id", AttributeValue::S(container_id))
                    .scan_index_forward(false)
                    .limit(1)
                    .send()
                    .await
                    .map_err(|error| {
                        StoreError::Query(format!("dynamodb max-size query failed: {error}"))
                    })?;

                output
                    .items()
                    .first()
                    .map(observation_from_item)
                    .transpose()
                    .map_err(StoreError::Query)
            })
        })
    }
}

pub fn observation_to_item(observation: &SizeObservation) -> Item {
    HashMap::from([
        (
            ATTR_CONTAINER_ID.to_string(),
            AttributeValue::S(observation.container_id.clone()),
        ),
        (
            ATTR_OBSERVED_AT.to_string(),
            AttributeValue::N(observation.observed_at.to_string()),
        ),
        (
            ATTR_TOTAL_SIZE_BYTES.to_string(),
            AttributeValue::N(observation.total_size_bytes.to_string()),
        ),
        (
            ATTR_OBJECT_COUNT.to_string(),
            AttributeValue::N(observation.object_count.to_string()),
        ),
    ])
}

pub fn observation_from_item(item: &Item) -> Result<SizeObservation, String> {
    let container_id = match item.get(ATTR_CONTAINER_ID) {
        Some(AttributeValue::S(value)) => value.clone(),
        _ => return Err(format!("item is missing string attribute '{ATTR_CONTAINER_ID}'")),
    };

    Ok(SizeObservation {
        container_id,
        observed_at: number_attribute(item, ATTR_OBSERVED_AT)?,
        total_size_bytes: number_attribute(item, ATTR_TOTAL_SIZE_BYTES)?,
        object_count: number_attribute(item, ATTR_OBJECT_COUNT)?,
    })
}

fn number_attribute<T: std::str::FromStr>(item: &Item, name: &str) -> Result<T, String> {
    match item.get(name) {
        Some(AttributeValue::N(raw)) => raw
            .parse::<T>()
            .map_err(|_| format!("attribute '{name}' is not a valid integer: {raw}")),
        _ => Err(format!("item is missing numeric attribute '{name}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SizeObservation {
        SizeObservation {
            container_id: "testbucket".to_string(),
            observed_at: 1_739_400_000_123,
            total_size_bytes: 150_000,
            object_count: 3,
        }
    }

    #[test]
    fn item_uses_numeric_attributes_for_keys_and_sizes() {
        let item = observation_to_item(&sample());
        assert_eq!(
            item.get(ATTR_OBSERVED_AT),
            Some(&AttributeValue::N("1739400000123".to_string()))
        );
        assert_eq!(
            item.get(ATTR_TOTAL_SIZE_BYTES),
            Some(&AttributeValue::N("150000".to_string()))
        );
        assert_eq!(observation_from_item(&item), Ok(sample()));
    }

    #[test]
    fn rejects_item_without_object_count() {
        let mut item = observation_to_item(&sample());
        item.remove(ATTR_OBJECT_COUNT);

        let error = observation_from_item(&item).expect_err("missing attribute should fail");
        assert!(error.contains("object_count"));
    }

    #[test]
    fn rejects_fractional_size() {
        let mut item = observation_to_item(&sample());
        item.insert(
            ATTR_TOTAL_SIZE_BYTES.to_string(),
            AttributeValue::N("1.5".to_string()),
        );

        let error = observation_from_item(&item).expect_err("fractional size should fail");
        assert!(error.contains("not a valid integer"));
    }

    #[test]
    fn rejects_non_string_container() {
        let mut item = observation_to_item(&sample());
        item.insert(
            ATTR_CONTAINER_ID.to_string(),
            AttributeValue::N("7".to_string()),
        );
        assert!(observation_from_item(&item).is_err());
    }
}
