//! Telegram bot that walks a user through one cash-book entry
//! (direction, category, amount, note, review) and posts the result to an
//! ingestion hook.
//!
//! The conversation itself is transport agnostic ([`Conversation`]); this
//! crate also provides the Telegram and HTTP implementations it runs on in
//! production, and a long-polling runner for local use.

use std::{path::PathBuf, sync::Arc, time::Duration};

use reqwest::Client;
use teloxide::{prelude::*, types::Update};

pub use events::{Command, Event, Incoming};
pub use handlers::{Conversation, NO_NOTE};
pub use sink::{HttpSink, Sink, SinkError};
pub use state::{
    ChatKey, Identity, NO_USERNAME, PromptSlot, PromptSlots, Session, SessionStore, Step,
    StoreError,
};
pub use transport::{ChatOutput, TelegramOutput, TransportError};

mod events;
mod handlers;
mod sink;
mod state;
mod transport;
mod ui;

pub const DEFAULT_SINK_URL: &str = "https://hook.eu2.make.com/b80ogwk3q1wuydgfgwjgq0nsvcwhot96";
const DEFAULT_SINK_TIMEOUT: Duration = Duration::from_secs(10);

/// The production conversation: Telegram in front, HTTP hook behind.
pub type Engine = Conversation<TelegramOutput, HttpSink>;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("telegram token is missing")]
    MissingToken,
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Debug)]
pub struct BotBuilder {
    token: Option<String>,
    sink_url: String,
    sink_timeout: Duration,
    sessions_path: Option<PathBuf>,
    allowed_users: Vec<u64>,
    username: Option<String>,
}

impl Default for BotBuilder {
    fn default() -> Self {
        Self {
            token: None,
            sink_url: DEFAULT_SINK_URL.to_string(),
            sink_timeout: DEFAULT_SINK_TIMEOUT,
            sessions_path: None,
            allowed_users: Vec::new(),
            username: None,
        }
    }
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        let token = token.trim();
        self.token = (!token.is_empty()).then(|| token.to_string());
        self
    }

    pub fn sink(mut self, url: &str, timeout: Duration) -> BotBuilder {
        self.sink_url = url.to_string();
        self.sink_timeout = timeout;
        self
    }

    /// Persists sessions as JSON files under `path` instead of in memory.
    pub fn sessions_path(mut self, path: impl Into<PathBuf>) -> BotBuilder {
        self.sessions_path = Some(path.into());
        self
    }

    pub fn allowed_users(mut self, allowed_users: Vec<u64>) -> BotBuilder {
        self.allowed_users = allowed_users;
        self
    }

    /// Bot username, for commands addressed as `/start@username`. When not
    /// given, [`identify`] asks Telegram for it.
    pub fn username(mut self, username: &str) -> BotBuilder {
        let username = username.trim().trim_start_matches('@');
        self.username = (!username.is_empty()).then(|| username.to_string());
        self
    }

    /// Fails without a token: the engine is never half-built.
    pub fn build(self) -> Result<Engine, BuildError> {
        tracing::info!("Initializing telegram bot...");
        let token = self.token.ok_or(BuildError::MissingToken)?;

        let client = Client::builder().timeout(self.sink_timeout).build()?;
        let sessions = match self.sessions_path {
            Some(path) => {
                tracing::info!("Sessions stored under {}", path.display());
                SessionStore::in_directory(path)
            }
            None => SessionStore::in_memory(),
        };

        Ok(Conversation::new(
            TelegramOutput::new(Bot::new(token)),
            HttpSink::new(client, self.sink_url),
            sessions,
        )
        .with_allowed_users(self.allowed_users)
        .with_bot_username(self.username.unwrap_or_default()))
    }
}

pub fn builder() -> BotBuilder {
    BotBuilder::default()
}

/// Fills in the bot username with `getMe` when none was configured. On
/// failure the engine is returned as is and only unaddressed commands work
/// in group chats.
pub async fn identify(engine: Engine) -> Engine {
    if !engine.bot_username().is_empty() {
        return engine;
    }

    match engine.output().bot().get_me().await {
        Ok(me) => match me.user.username.clone() {
            Some(username) => {
                tracing::info!("Running as @{username}");
                engine.with_bot_username(username)
            }
            None => engine,
        },
        Err(err) => {
            tracing::warn!("failed to read the bot username: {err}");
            engine
        }
    }
}

/// Drives the conversation through long polling, one update at a time.
pub async fn run_polling(engine: Arc<Engine>) {
    tracing::info!("Starting telegram bot (long polling)...");

    let bot = engine.output().bot().clone();
    let handler = dptree::entry().endpoint(handle_update);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![engine])
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_update(update: Update, engine: Arc<Engine>) -> ResponseResult<()> {
    engine.handle_update(&update).await;
    Ok(())
}
