use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use size_history_lambda::adapters::http_trigger::HttpPlotTrigger;
use size_history_lambda::adapters::s3_container::S3ContainerObjects;
use size_history_lambda::config::DriverEnvConfig;
use size_history_lambda::handlers::driver::{
    default_driver_script, handle_driver_event_blocking, DriverConfig,
};
use size_history_lambda::handlers::response::HandlerResponse;
use size_history_lambda::telemetry::init_logging;

struct RuntimeDependencies {
    config: DriverConfig,
    containers: S3ContainerObjects,
    trigger: HttpPlotTrigger,
}

async fn handle_request(
    _event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<HandlerResponse, Error> {
    Ok(handle_driver_event_blocking(
        &deps.config,
        &deps.containers,
        &deps.trigger,
    ))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let env = DriverEnvConfig::from_env().map_err(|error| Error::from(error.to_string()))?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        config: DriverConfig {
            container_id: env.bucket,
            plotting_api_url: env.plotting_api_url,
            step_delay: env.step_delay,
            script: default_driver_script(),
        },
        containers: S3ContainerObjects::new(aws_sdk_s3::Client::new(&aws_config)),
        trigger: HttpPlotTrigger::new().map_err(Error::from)?,
    };

    lambda_runtime::run(service_fn(|event| handle_request(event, &deps))).await
}
