//! Application configuration loaded from environment variables.
//!
//! - `FOODSTORE_API_URL`: REST base URL, defaults to the production API
//! - `FOODSTORE_PHONE` / `FOODSTORE_PASSWORD`: optional login credentials
//! - `FOODSTORE_AUTH_FILE`: optional path where the auth record is persisted
//! - `FOODSTORE_RECONNECT_DELAY_MS`: delay between order stream reconnects

use std::path::PathBuf;
use std::time::Duration;

/// Default REST API base URL.
const DEFAULT_API_URL: &str = "https://api.yenhafood.site/api";

/// Fixed delay before the order stream reconnects.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
}

/// Back-office API configuration values.
#[derive(Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub auth_file: Option<PathBuf>,
    pub reconnect_delay: Duration,
}

/// Loads the application configuration from environment variables.
///
/// The base URL defaults to `https://api.yenhafood.site/api` and can be
/// overridden with `FOODSTORE_API_URL`. Login credentials are optional
/// but when one is set both must be present.
///
/// # Errors
///
/// Returns [`FoodstoreError::Config`](crate::FoodstoreError::Config) if
/// only one of the two credential variables is set, or if the reconnect
/// delay is not a positive integer.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let base_url = non_empty_var("FOODSTORE_API_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let phone_number = non_empty_var("FOODSTORE_PHONE");
    let password = non_empty_var("FOODSTORE_PASSWORD");

    match (&phone_number, &password) {
        (Some(_), None) => {
            return Err(crate::FoodstoreError::Config(
                "FOODSTORE_PHONE is set but FOODSTORE_PASSWORD is missing".to_string(),
            ));
        }
        (None, Some(_)) => {
            return Err(crate::FoodstoreError::Config(
                "FOODSTORE_PASSWORD is set but FOODSTORE_PHONE is missing".to_string(),
            ));
        }
        _ => {}
    }

    let reconnect_delay = match non_empty_var("FOODSTORE_RECONNECT_DELAY_MS") {
        Some(raw) => parse_delay_ms(&raw)?,
        None => DEFAULT_RECONNECT_DELAY,
    };

    Ok(AppConfig {
        api: ApiConfig {
            base_url,
            phone_number,
            password,
            auth_file: non_empty_var("FOODSTORE_AUTH_FILE").map(PathBuf::from),
            reconnect_delay,
        },
    })
}

fn parse_delay_ms(raw: &str) -> crate::Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(crate::FoodstoreError::Config(format!(
            "FOODSTORE_RECONNECT_DELAY_MS must be a positive integer, got {raw:?}"
        ))),
    }
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
