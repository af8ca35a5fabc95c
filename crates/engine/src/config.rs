//! Runtime configuration read from the environment.

use std::time::Duration;

use covenant_domain::GameCalendar;

const DEFAULT_DATABASE_PATH: &str = "covenant.db";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: String,
    pub server_host: String,
    pub server_port: u16,
    /// Defines where the game's calendar day starts and ends.
    pub calendar: GameCalendar,
    pub sweep_interval: Duration,
    /// Comma-separated origins, or `*`. No CORS layer when unset.
    pub cors_allowed_origins: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Malformed values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database_path =
            lookup("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());
        let server_host = lookup("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let server_port = parse_or(
            "SERVER_PORT",
            lookup("SERVER_PORT").or_else(|| lookup("PORT")),
            DEFAULT_PORT,
        );

        let offset = parse_or(
            "GAME_UTC_OFFSET_HOURS",
            lookup("GAME_UTC_OFFSET_HOURS"),
            DEFAULT_UTC_OFFSET_HOURS,
        );
        let calendar = GameCalendar::with_offset_hours(offset).unwrap_or_else(|e| {
            tracing::warn!(offset, error = %e, "Invalid game UTC offset, using default");
            default_calendar()
        });

        let sweep_secs = parse_or(
            "SWEEP_INTERVAL_SECS",
            lookup("SWEEP_INTERVAL_SECS"),
            DEFAULT_SWEEP_INTERVAL_SECS,
        )
        .max(1);

        Self {
            database_path,
            server_host,
            server_port,
            calendar,
            sweep_interval: Duration::from_secs(sweep_secs),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn default_calendar() -> GameCalendar {
    GameCalendar::with_offset_hours(DEFAULT_UTC_OFFSET_HOURS)
        .unwrap_or_else(|_| GameCalendar::utc())
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Malformed config value, using default");
            default
        }),
    }
}
