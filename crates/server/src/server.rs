use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{UpdateProcessor, webhook};

pub struct WebhookState<P> {
    pub(crate) processor: Option<Arc<P>>,
    pub(crate) secret: Option<String>,
}

// Derive would require `P: Clone`.
impl<P> Clone for WebhookState<P> {
    fn clone(&self) -> Self {
        Self {
            processor: self.processor.clone(),
            secret: self.secret.clone(),
        }
    }
}

impl<P: UpdateProcessor> WebhookState<P> {
    /// `None` keeps the endpoint up while answering every update with a
    /// server error.
    pub fn new(processor: Option<Arc<P>>) -> Self {
        Self {
            processor,
            secret: None,
        }
    }

    pub fn with_secret(mut self, secret: Option<String>) -> Self {
        self.secret = secret.filter(|s| !s.is_empty());
        self
    }
}

pub fn router<P: UpdateProcessor>(state: WebhookState<P>, path: &str) -> Router {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    Router::new()
        .route(&path, post(webhook::receive::<P>))
        .route("/health", get(webhook::health))
        .with_state(state)
}

pub async fn run<P: UpdateProcessor>(
    state: WebhookState<P>,
    bind: &str,
    port: u16,
    path: &str,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind((bind, port)).await?;
    run_with_listener(state, listener, path).await
}

pub async fn run_with_listener<P: UpdateProcessor>(
    state: WebhookState<P>,
    listener: tokio::net::TcpListener,
    path: &str,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Webhook listening on {}{}", addr, path);

    axum::serve(listener, router(state, path))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down webhook server");
}
