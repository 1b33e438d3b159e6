use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as HeaderError, Header},
};
use teloxide::types::Update;

use crate::{UpdateProcessor, WebhookError, server::WebhookState};

static SECRET_HEADER: HeaderName = HeaderName::from_static("x-telegram-bot-api-secret-token");

/// `TypedHeader` for the secret Telegram echoes back on every webhook call
/// (the `secret_token` given to `setWebhook`).
#[derive(Debug)]
pub(crate) struct SecretToken(String);

impl Header for SecretToken {
    fn name() -> &'static HeaderName {
        &SECRET_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, HeaderError>
    where
        Self: Sized,
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(HeaderError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(HeaderError::invalid());
        };

        Ok(SecretToken(value.to_string()))
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        match HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode secret token header"),
        }
    }
}

pub(crate) async fn receive<P: UpdateProcessor>(
    State(state): State<WebhookState<P>>,
    secret: Option<TypedHeader<SecretToken>>,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    if let Some(expected) = state.secret.as_deref() {
        let given = secret.as_ref().map(|TypedHeader(SecretToken(value))| value.as_str());
        if given != Some(expected) {
            tracing::warn!("webhook call with a wrong secret token");
            return Err(WebhookError::Unauthorized);
        }
    }

    let Some(processor) = state.processor.as_ref() else {
        return Err(WebhookError::NotConfigured);
    };

    let update: Update = serde_json::from_slice(&body)?;
    tracing::debug!(update_id = update.id.0, "update received");
    processor.process(update).await;

    Ok(StatusCode::OK)
}

pub(crate) async fn health() -> StatusCode {
    StatusCode::OK
}
