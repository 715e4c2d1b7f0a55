use chrono_tz::Tz;
use std::{fmt::Display, str::FromStr};
use todo_reminder_utils::create_random_secret;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    /// Time zone used for all calendar arithmetic of recurring reminders
    pub timezone: Tz,
    /// How often the dispatcher polls for due occurrences
    pub dispatch_interval_secs: u64,
    /// Maximum number of occurrences delivered concurrently within one tick
    pub dispatch_concurrency: usize,
    /// Timeout for a single call to the notifier
    pub notifier_timeout_millis: u64,
    /// How often the holiday calendar is refreshed from the holiday api
    pub holiday_refresh_interval_secs: u64,
    /// Base url of the holiday api, the year is appended to it
    pub holiday_api_url: String,
    /// Address of the chat bot. When absent notifications are only logged
    pub gocq_uri: Option<String>,
    pub blob_base_url: String,
    pub blob_bucket: String,
    /// Lifetime of signed attachment urls
    pub blob_url_expires_secs: i64,
    /// Secret used to sign attachment urls
    pub blob_signing_secret: String,
}

fn parse_env<T: FromStr + Display>(name: &str, default_value: T) -> T {
    match std::env::var(name) {
        Ok(value) => match value.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default value: {}.",
                    name, value, default_value
                );
                default_value
            }
        },
        Err(_) => default_value,
    }
}

impl Config {
    pub fn new() -> Self {
        let blob_signing_secret = match std::env::var("BLOB_SIGNING_SECRET") {
            Ok(secret) => secret,
            Err(_) => {
                info!("Did not find BLOB_SIGNING_SECRET environment variable. Going to create one.");
                let secret = create_random_secret(32);
                info!(
                    "Secret for signing attachment urls was generated and set to: {}",
                    secret
                );
                secret
            }
        };
        let gocq_uri = match std::env::var("GOCQ_URI") {
            Ok(uri) if !uri.trim().is_empty() => Some(uri.trim_end_matches('/').to_string()),
            _ => {
                info!("Did not find GOCQ_URI environment variable. Notifications will only be logged.");
                None
            }
        };

        Self {
            port: parse_env("PORT", 5000),
            timezone: parse_env("TIMEZONE", Tz::UTC),
            dispatch_interval_secs: std::cmp::max(parse_env("DISPATCH_INTERVAL_SECS", 20), 1),
            dispatch_concurrency: std::cmp::max(parse_env("DISPATCH_CONCURRENCY", 8), 1),
            notifier_timeout_millis: parse_env("NOTIFIER_TIMEOUT_MILLIS", 5000),
            holiday_refresh_interval_secs: std::cmp::max(
                parse_env("HOLIDAY_REFRESH_INTERVAL_SECS", 60 * 60 * 24 * 7),
                60,
            ),
            holiday_api_url: std::env::var("HOLIDAY_API_URL")
                .unwrap_or_else(|_| "https://timor.tech/api/holiday/year".into()),
            gocq_uri,
            blob_base_url: std::env::var("BLOB_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:9000".into()),
            blob_bucket: std::env::var("BLOB_BUCKET").unwrap_or_else(|_| "todo-reminder".into()),
            blob_url_expires_secs: parse_env("BLOB_URL_EXPIRES_SECS", 60 * 60),
            blob_signing_secret,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
