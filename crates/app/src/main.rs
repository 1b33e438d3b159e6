use std::{sync::Arc, time::Duration};

use server::WebhookState;
use settings::Mode;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "kasbot={level},telegram_bot={level},server={level},ledger={level}",
            level = settings.app.level
        ))
        .init();

    let mut builder = telegram_bot::builder()
        .sink(
            &settings.sink.url,
            Duration::from_secs(settings.sink.timeout_secs),
        )
        .allowed_users(settings.telegram.allowed_users.clone());
    if let Some(token) = &settings.telegram.token {
        builder = builder.token(token);
    }
    if let Some(username) = &settings.telegram.username {
        builder = builder.username(username);
    }
    if let Some(path) = &settings.sessions.path {
        builder = builder.sessions_path(path);
    }

    let engine = match builder.build() {
        Ok(engine) => Some(Arc::new(telegram_bot::identify(engine).await)),
        Err(err) => {
            tracing::error!("failed to initialize telegram bot: {err}");
            None
        }
    };

    match settings.telegram.mode {
        Mode::Polling => {
            let engine = engine.ok_or("polling mode needs a telegram token")?;
            telegram_bot::run_polling(engine).await;
        }
        Mode::Webhook => {
            let state = WebhookState::new(engine).with_secret(settings.server.secret_token);
            server::run(
                state,
                &settings.server.bind,
                settings.server.port,
                &settings.server.path,
            )
            .await?;
        }
    }

    Ok(())
}
