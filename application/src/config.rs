//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
///
/// Each external collaborator is optional: the operations depending on a
/// missing one fail with a configuration error when invoked, everything
/// else keeps working.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Service {
    /// Payment provider configuration.
    pub payment: Option<Payment>,

    /// Email notification channel configuration.
    pub email: Option<Email>,

    /// Messaging notification channel configuration.
    pub messaging: Option<Messaging>,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            payment,
            email,
            messaging,
        } = value;

        Self {
            payment: payment.map(|p| service::infra::payment::Config {
                secret_key: p.secret_key.into(),
                webhook_secret: p.webhook_secret.into(),
                api_url: p.api_url,
                app_url: p.app_url,
                timeout: p.timeout,
            }),
            email: email.map(|e| service::infra::notification::EmailConfig {
                api_key: e.api_key.into(),
                api_url: e.api_url,
                from: e.from,
                timeout: e.timeout,
            }),
            messaging: messaging.map(|m| {
                service::infra::notification::MessagingConfig {
                    access_token: m.access_token.into(),
                    api_url: m.api_url,
                    timeout: m.timeout,
                }
            }),
        }
    }
}

/// Payment provider configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Payment {
    /// Secret API key of the payment provider.
    pub secret_key: String,

    /// Secret the provider signs webhook deliveries with.
    pub webhook_secret: String,

    /// Base URL of the payment provider HTTP API.
    #[default("https://api.stripe.com".to_owned())]
    pub api_url: String,

    /// Public base URL of this application, used to build the checkout
    /// redirect URLs.
    #[default("http://127.0.0.1:3000".to_owned())]
    pub app_url: String,

    /// Timeout of payment provider HTTP requests.
    #[default(time::Duration::from_secs(30))]
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,
}

/// Email notification channel configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Email {
    /// Secret API key of the email provider.
    pub api_key: String,

    /// Base URL of the email provider HTTP API.
    #[default("https://api.resend.com".to_owned())]
    pub api_url: String,

    /// Sender address of outgoing emails.
    pub from: String,

    /// Timeout of email provider HTTP requests.
    #[default(time::Duration::from_secs(30))]
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,
}

/// Messaging notification channel configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Messaging {
    /// Secret channel access token of the messaging provider.
    pub access_token: String,

    /// Base URL of the messaging provider HTTP API.
    #[default("https://api.line.me".to_owned())]
    pub api_url: String,

    /// Timeout of messaging provider HTTP requests.
    #[default(time::Duration::from_secs(30))]
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}
