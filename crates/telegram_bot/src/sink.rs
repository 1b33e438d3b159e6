//! Client for the external ingestion hook, the system of record.

use std::future::Future;

use api_types::sink::SinkPayload;
use reqwest::{Client, StatusCode};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("sink answered {0}")]
    Status(StatusCode),
}

/// Receiver of finished records.
///
/// Implementations never fail past this boundary: every problem is logged
/// and reported as `false`.
pub trait Sink: Send + Sync {
    fn submit(&self, payload: &SinkPayload) -> impl Future<Output = bool> + Send;
}

#[derive(Clone, Debug)]
pub struct HttpSink {
    client: Client,
    url: String,
}

impl HttpSink {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn post_json(&self, payload: &SinkPayload) -> Result<StatusCode, SinkError> {
        let resp = self.client.post(&self.url).json(payload).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(status);
        }

        match resp.text().await {
            Ok(body) => tracing::debug!("sink body: {body}"),
            Err(err) => tracing::debug!("sink body read failed: {err}"),
        }
        Err(SinkError::Status(status))
    }
}

impl Sink for HttpSink {
    async fn submit(&self, payload: &SinkPayload) -> bool {
        match self.post_json(payload).await {
            Ok(status) => {
                tracing::info!(user_id = payload.user_id, %status, "record delivered to sink");
                true
            }
            Err(err) => {
                tracing::error!(user_id = payload.user_id, "record not delivered: {err}");
                false
            }
        }
    }
}
