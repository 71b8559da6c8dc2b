use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use size_history_lambda::adapters::chart_render::PlottersTrendRenderer;
use size_history_lambda::adapters::dynamodb_history::DynamoDbSizeHistoryStore;
use size_history_lambda::adapters::s3_container::S3ContainerObjects;
use size_history_lambda::config::PlotConfig;
use size_history_lambda::handlers::plotter::handle_plot_request;
use size_history_lambda::handlers::response::HandlerResponse;
use size_history_lambda::telemetry::init_logging;

struct RuntimeDependencies {
    config: PlotConfig,
    containers: S3ContainerObjects,
    store: DynamoDbSizeHistoryStore,
    renderer: PlottersTrendRenderer,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<HandlerResponse, Error> {
    let now_ms = Utc::now().timestamp_millis();
    Ok(handle_plot_request(
        &event.payload,
        &deps.config.store.bucket,
        deps.config.default_window_seconds,
        now_ms,
        &deps.store,
        &deps.renderer,
        &deps.containers,
    ))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let config = PlotConfig::from_env().map_err(|error| Error::from(error.to_string()))?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        store: DynamoDbSizeHistoryStore::new(
            config.store.table.clone(),
            aws_sdk_dynamodb::Client::new(&aws_config),
        ),
        containers: S3ContainerObjects::new(aws_sdk_s3::Client::new(&aws_config)),
        renderer: PlottersTrendRenderer::default(),
        config,
    };

    lambda_runtime::run(service_fn(|event| handle_request(event, &deps))).await
}
