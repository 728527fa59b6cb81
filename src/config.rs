use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,
    pub table: String,

    /// When set, requests for any other application are rejected
    pub application_id: Option<String>,

    // CEK request signatures
    pub cek_public_key_path: Option<String>,
    pub cek_public_key_url: String,
    pub skip_signature_check: bool,

    // LINE push messages
    pub channel_access_token: Option<String>,
    pub line_api_base: String,

    pub rate_webhook_per_min: u32,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").context("SERVER_ADDR must be set")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            table: env::var("TIMECARD_TABLE").unwrap_or_else(|_| "timecard".to_string()),

            application_id: optional("APPLICATION_ID"),

            cek_public_key_path: optional("CEK_PUBLIC_KEY_PATH"),
            cek_public_key_url: env::var("CEK_PUBLIC_KEY_URL").unwrap_or_else(|_| {
                "https://clova-cek-requests.line.me/.well-known/signature-public-key.pem"
                    .to_string()
            }),
            skip_signature_check: parse_or("SKIP_SIGNATURE_CHECK", false)?,

            channel_access_token: optional("CHANNEL_ACCESS_TOKEN"),
            line_api_base: env::var("LINE_API_BASE")
                .unwrap_or_else(|_| "https://api.line.me".to_string()),

            rate_webhook_per_min: parse_or("RATE_WEBHOOK_PER_MIN", 600)?,
            log_level: parse_or("LOG_LEVEL", tracing::Level::DEBUG)?,
        })
    }
}

/// Unset and empty are treated alike.
fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}
