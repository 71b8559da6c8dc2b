pub mod chart_render;
pub mod dynamodb_history;
pub mod http_trigger;
pub mod invoke;
pub mod object_store;
pub mod s3_container;
