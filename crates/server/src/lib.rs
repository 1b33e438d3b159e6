//! Webhook adapter: one Telegram POST becomes one conversation step.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use teloxide::types::Update;
use telegram_bot::{ChatOutput, Conversation, Sink};

pub use server::{WebhookState, router, run, run_with_listener};

mod server;
mod webhook;

/// Whatever consumes decoded updates behind the webhook.
pub trait UpdateProcessor: Send + Sync + 'static {
    fn process(&self, update: Update) -> impl Future<Output = ()> + Send;
}

impl<O, S> UpdateProcessor for Conversation<O, S>
where
    O: ChatOutput + 'static,
    S: Sink + 'static,
{
    async fn process(&self, update: Update) {
        self.handle_update(&update).await;
    }
}

#[derive(Debug)]
pub enum WebhookError {
    /// Secret token header missing or wrong.
    Unauthorized,
    /// The bot could not be built at startup (no token).
    NotConfigured,
    BadUpdate(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            WebhookError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            WebhookError::NotConfigured => {
                tracing::error!("update received but the bot is not configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "bot is not configured".to_string(),
                )
            }
            WebhookError::BadUpdate(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<serde_json::Error> for WebhookError {
    fn from(value: serde_json::Error) -> Self {
        Self::BadUpdate(format!("invalid update: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_401() {
        let res = WebhookError::Unauthorized.into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn not_configured_maps_to_500() {
        let res = WebhookError::NotConfigured.into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn bad_update_maps_to_400() {
        let err = serde_json::from_str::<Update>("{").unwrap_err();
        let res = WebhookError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
