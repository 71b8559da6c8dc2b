use std::collections::BTreeSet;
use std::time::Instant;

use serde_json::Value;
use size_history_core::contract::SizeObservation;
use size_history_core::store::{SizeHistoryStore, StoreError};
use thiserror::Error;

use crate::adapters::object_store::ContainerObjects;
use crate::handlers::response::HandlerResponse;

const COMPONENT: &str = "size_tracker";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecorderError {
    #[error("failed to list objects in {container_id}: {message}")]
    Listing {
        container_id: String,
        message: String,
    },
    #[error(transparent)]
    Append(#[from] StoreError),
}

/// Lists the container, appends one observation taken at `observed_at` and returns it.
pub fn record_container_size(
    container_id: &str,
    observed_at: i64,
    containers: &impl ContainerObjects,
    store: &impl SizeHistoryStore,
) -> Result<SizeObservation, RecorderError> {
    let objects = containers
        .list_objects(container_id)
        .map_err(|message| RecorderError::Listing {
            container_id: container_id.to_string(),
            message,
        })?;

    let observation = SizeObservation::from_object_sizes(
        container_id,
        observed_at,
        objects.iter().map(|object| object.size_bytes),
    );
    store.append(&observation)?;
    Ok(observation)
}

/// Handles a bucket notification (or manual invocation) by recording each affected container once.
///
/// Every container is attempted; one failure does not undo or skip the others, and any failure
/// turns the whole response into a 500 naming the failed containers.
pub fn handle_size_tracking_event(
    event: &Value,
    default_container: &str,
    observed_at: i64,
    containers: &impl ContainerObjects,
    store: &impl SizeHistoryStore,
) -> HandlerResponse {
    let started_at = Instant::now();
    let mut container_ids = container_ids_from_event(event);
    if container_ids.is_empty() {
        container_ids.push(default_container.to_string());
    }

    let mut failures = Vec::new();
    for container_id in &container_ids {
        match record_container_size(container_id, observed_at, containers, store) {
            Ok(observation) => {
                tracing::info!(
                    component = COMPONENT,
                    event = "observation_recorded",
                    container_id = %observation.container_id,
                    observed_at = observation.observed_at,
                    total_size_bytes = observation.total_size_bytes,
                    object_count = observation.object_count,
                    duration_ms = started_at.elapsed().as_millis() as u64,
                );
            }
            Err(error) => {
                tracing::error!(
                    component = COMPONENT,
                    event = "observation_failed",
                    container_id = %container_id,
                    error = %error,
                );
                failures.push(error.to_string());
            }
        }
    }

    if failures.is_empty() {
        HandlerResponse::message(200, "Bucket size data updated successfully.")
    } else {
        HandlerResponse::message(500, &format!("Error: {}", failures.join("; ")))
    }
}

/// Distinct bucket names named by the `Records` of an S3 notification, in first-seen order.
pub fn container_ids_from_event(event: &Value) -> Vec<String> {
    let Some(records) = event.get("Records").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut seen = BTreeSet::new();
    records
        .iter()
        .filter(|record| {
            record
                .get("eventSource")
                .and_then(Value::as_str)
                .map(|source| source == "aws:s3")
                .unwrap_or(false)
        })
        .filter_map(|record| {
            record
                .pointer("/s3/bucket/name")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect()
}
