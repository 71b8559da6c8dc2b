use lambda_runtime::Error;
use size_history_core::contract::DEFAULT_HISTORY_TABLE;
use size_history_lambda::config::{BUCKET_ENV, TABLE_ENV};
use size_history_lambda::provision::{
    default_table_poll_policy, provision_stack, AwsInfrastructure, ProvisionPlan,
};
use size_history_lambda::telemetry::init_logging;

const DEFAULT_REGION: &str = "us-east-2";

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let bucket = std::env::var(BUCKET_ENV)
        .map_err(|_| Error::from(format!("{BUCKET_ENV} must be configured")))?;
    let table = std::env::var(TABLE_ENV).unwrap_or_else(|_| DEFAULT_HISTORY_TABLE.to_string());

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let region = aws_config
        .region()
        .map(|region| region.to_string())
        .unwrap_or_else(|| DEFAULT_REGION.to_string());

    let plan = ProvisionPlan {
        bucket,
        table,
        region,
    };
    let infrastructure = AwsInfrastructure {
        s3_client: aws_sdk_s3::Client::new(&aws_config),
        dynamodb_client: aws_sdk_dynamodb::Client::new(&aws_config),
    };

    let report = tokio::task::block_in_place(|| {
        provision_stack(
            &plan,
            &infrastructure,
            &default_table_poll_policy(),
            &mut std::thread::sleep,
        )
    })
    .map_err(|error| Error::from(error.to_string()))?;

    tracing::info!(
        component = "provision",
        event = "stack_ready",
        bucket = %plan.bucket,
        table = %plan.table,
        bucket_outcome = ?report.bucket,
        table_outcome = ?report.table,
        table_status = %report.table_status,
    );
    Ok(())
}
