//! `scimp serve`: the Lambda runtime loop.

use crate::aws::load_sdk_config;
use crate::handler::Handler;
use anyhow::{Result, anyhow};
use lambda_runtime::service_fn;
use std::sync::Arc;
use tracing::info;

pub async fn run() -> Result<()> {
    let handler = Arc::new(Handler::new(load_sdk_config().await));
    info!(version = env!("CARGO_PKG_VERSION"), "Starting Lambda runtime");

    lambda_runtime::run(service_fn(move |event| {
        let handler = Arc::clone(&handler);
        async move { handler.invoke(event).await }
    }))
    .await
    .map_err(|err| anyhow!("Lambda runtime failed: {err}"))
}
