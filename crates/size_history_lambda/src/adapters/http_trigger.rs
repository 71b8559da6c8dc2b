use std::time::Duration;

use crate::adapters::invoke::{PlotTrigger, TriggerResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin HTTP client for calling the plotting API.
#[derive(Debug, Clone)]
pub struct HttpPlotTrigger {
    client: reqwest::Client,
}

impl HttpPlotTrigger {
    pub fn new() -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| format!("failed to build http client: {error}"))?;
        Ok(Self { client })
    }
}

impl PlotTrigger for HttpPlotTrigger {
    fn trigger(&self, url: &str) -> Result<TriggerResponse, String> {
        let client = self.client.clone();
        let url = url.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let response = client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|error| format!("request to {url} failed: {error}"))?;
                let status_code = response.status().as_u16();
                let body = response
                    .text()
                    .await
                    .map_err(|error| format!("failed to read response body: {error}"))?;
                Ok::<_, String>(TriggerResponse { status_code, body })
            })
        })
    }
}
