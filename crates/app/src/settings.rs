//! Settings for the application, read from `settings.toml` (or the file named
//! by `KASBOT_SETTINGS`) and overridden by `KASBOT_*` environment variables,
//! e.g. `KASBOT_TELEGRAM__TOKEN`.
use config::{Config, ConfigError, Environment, File, Source};
use serde::Deserialize;

const SETTINGS_ENV: &str = "KASBOT_SETTINGS";

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Webhook,
    Polling,
}

#[derive(Debug, Deserialize)]
pub struct Telegram {
    pub token: Option<String>,
    /// Looked up with `getMe` when absent.
    pub username: Option<String>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub allowed_users: Vec<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Sink {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct Sessions {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    pub path: String,
    pub secret_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub telegram: Telegram,
    pub sink: Sink,
    #[serde(default)]
    pub sessions: Sessions,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let file = match std::env::var(SETTINGS_ENV) {
            Ok(path) => File::with_name(&path),
            Err(_) => File::with_name("settings").required(false),
        };

        Self::load(file, environment())
    }

    fn load<F>(file: F, env: Environment) -> Result<Self, ConfigError>
    where
        F: Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("telegram.mode", "webhook")?
            .set_default("sink.url", telegram_bot::DEFAULT_SINK_URL)?
            .set_default("sink.timeout_secs", 10_i64)?
            .set_default("server.bind", "127.0.0.1")?
            .set_default("server.port", 8080_i64)?
            .set_default("server.path", "/webhook")?
            .add_source(file)
            .add_source(env)
            .build()?;

        settings.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("KASBOT")
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("telegram.allowed_users")
        .try_parsing(true)
}
