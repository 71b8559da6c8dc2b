use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use size_history_lambda::adapters::dynamodb_history::DynamoDbSizeHistoryStore;
use size_history_lambda::adapters::s3_container::S3ContainerObjects;
use size_history_lambda::config::StoreConfig;
use size_history_lambda::handlers::recorder::handle_size_tracking_event;
use size_history_lambda::handlers::response::HandlerResponse;
use size_history_lambda::telemetry::init_logging;

struct RuntimeDependencies {
    config: StoreConfig,
    containers: S3ContainerObjects,
    store: DynamoDbSizeHistoryStore,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<HandlerResponse, Error> {
    let observed_at = Utc::now().timestamp_millis();
    Ok(handle_size_tracking_event(
        &event.payload,
        &deps.config.bucket,
        observed_at,
        &deps.containers,
        &deps.store,
    ))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let config = StoreConfig::from_env().map_err(|error| Error::from(error.to_string()))?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        store: DynamoDbSizeHistoryStore::new(
            config.table.clone(),
            aws_sdk_dynamodb::Client::new(&aws_config),
        ),
        containers: S3ContainerObjects::new(aws_sdk_s3::Client::new(&aws_config)),
        config,
    };

    lambda_runtime::run(service_fn(|event| handle_request(event, &deps))).await
}
