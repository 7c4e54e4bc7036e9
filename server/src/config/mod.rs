use std::env;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

pub mod security;

pub use security::create_security_headers_layer;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_GEOCODER_URL: &str = "http://maps.google.com/maps/geo";
const DEFAULT_GEOCODER_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MESSAGE_WAIT_MINUTES: i64 = 60;
const DEFAULT_MESSAGE_MAX: i32 = 100;
const DEFAULT_EVENTS_PER_PAGE: i64 = 20;
const DEFAULT_SESSION_TTL_HOURS: i64 = 336;
/// Ten years.
const SESSION_TTL_HOURS_RANGE: RangeInclusive<i64> = 1..=87_600;
/// One year.
const MESSAGE_WAIT_MINUTES_RANGE: RangeInclusive<i64> = 0..=525_600;
const DEFAULT_MARKUP: &str = "markdown";
const DEFAULT_ROLES: &str = "des:Designer,dev:Developer,org:Organizer,other:Other";

/// A profile role choice, `code` is what gets stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub production: bool,
    pub geocoder_url: String,
    pub geocoder_api_key: Option<String>,
    pub geocoder_timeout: Duration,
    pub mail_service_url: Option<String>,
    pub mail_service_token: String,
    pub mail_from: String,
    /// Minutes a profile has to wait between two outbound emails.
    pub message_wait_minutes: i64,
    /// Initial `allowed_emails` cap for new profiles.
    pub message_max: i32,
    pub roles: Vec<Role>,
    pub default_markup: String,
    pub events_per_page: i64,
    pub session_ttl_hours: i64,
    pub staff_usernames: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let production = env::var("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/anthill".to_string()),
            port: parse_or("PORT", DEFAULT_PORT),
            production,
            geocoder_url: env::var("GEOCODER_URL")
                .unwrap_or_else(|_| DEFAULT_GEOCODER_URL.to_string()),
            geocoder_api_key: non_empty_var("GEOCODER_API_KEY"),
            geocoder_timeout: Duration::from_secs(parse_or(
                "GEOCODER_TIMEOUT_SECS",
                DEFAULT_GEOCODER_TIMEOUT_SECS,
            )),
            mail_service_url: non_empty_var("MAIL_SERVICE_URL"),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_default(),
            mail_from: env::var("MAIL_FROM").unwrap_or_else(|_| "anthill@localhost".to_string()),
            message_wait_minutes: clamp_to(
                "ANTHILL_MESSAGE_WAIT",
                parse_or("ANTHILL_MESSAGE_WAIT", DEFAULT_MESSAGE_WAIT_MINUTES),
                MESSAGE_WAIT_MINUTES_RANGE,
            ),
            message_max: parse_or("ANTHILL_MESSAGE_MAX", DEFAULT_MESSAGE_MAX),
            roles: parse_roles(
                &env::var("ANTHILL_ROLES").unwrap_or_else(|_| DEFAULT_ROLES.to_string()),
            ),
            default_markup: env::var("ANTHILL_DEFAULT_MARKUP")
                .unwrap_or_else(|_| DEFAULT_MARKUP.to_string()),
            events_per_page: parse_or("EVENTS_PER_PAGE", DEFAULT_EVENTS_PER_PAGE).max(1),
            session_ttl_hours: clamp_to(
                "SESSION_TTL_HOURS",
                parse_or("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS),
                SESSION_TTL_HOURS_RANGE,
            ),
            staff_usernames: env::var("STAFF_USERNAMES")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
        }
    }

    /// Configuration for tests and local tinkering: in-memory storage, no
    /// external services.
    pub fn for_memory() -> Self {
        Self {
            database_url: "memory://".to_string(),
            port: 0,
            production: false,
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            geocoder_api_key: None,
            geocoder_timeout: Duration::from_secs(DEFAULT_GEOCODER_TIMEOUT_SECS),
            mail_service_url: None,
            mail_service_token: String::new(),
            mail_from: "anthill@localhost".to_string(),
            message_wait_minutes: DEFAULT_MESSAGE_WAIT_MINUTES,
            message_max: DEFAULT_MESSAGE_MAX,
            roles: parse_roles(DEFAULT_ROLES),
            default_markup: DEFAULT_MARKUP.to_string(),
            events_per_page: DEFAULT_EVENTS_PER_PAGE,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            staff_usernames: Vec::new(),
        }
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with("memory://")
    }

    pub fn message_wait(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.message_wait_minutes)
    }

    pub fn is_role(&self, code: &str) -> bool {
        self.roles.iter().any(|r| r.code == code)
    }

    pub fn is_staff_username(&self, username: &str) -> bool {
        self.staff_usernames.iter().any(|s| s == username)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Config: invalid value '{}' for {}, using {}", raw, key, default);
                default
            }
        },
        Err(_) => default,
    }
}

/// Durations feed chrono arithmetic, which panics far outside these ranges.
fn clamp_to(key: &str, value: i64, range: RangeInclusive<i64>) -> i64 {
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        tracing::warn!("Config: {} for {} is out of range, using {}", value, key, clamped);
    }
    clamped
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses `code:Label` pairs. A bare `code` uses itself as the label.
fn parse_roles(raw: &str) -> Vec<Role> {
    let mut roles: Vec<Role> = split_list(raw)
        .into_iter()
        .map(|entry| match entry.split_once(':') {
            Some((code, label)) => Role {
                code: code.trim().to_string(),
                label: label.trim().to_string(),
            },
            None => Role {
                code: entry.clone(),
                label: entry,
            },
        })
        .filter(|r| !r.code.is_empty())
        .collect();

    // profiles default to "other", so it always has to be a valid choice
    if !roles.iter().any(|r| r.code == "other") {
        roles.push(Role {
            code: "other".to_string(),
            label: "Other".to_string(),
        });
    }
    roles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roles_with_labels() {
        let roles = parse_roles("dev:Developer, des:Designer");
        assert_eq!(roles[0].code, "dev");
        assert_eq!(roles[0].label, "Developer");
        assert_eq!(roles[1].code, "des");
        assert!(roles.iter().any(|r| r.code == "other"));
    }

    #[test]
    fn test_parse_roles_bare_codes_and_blanks() {
        let roles = parse_roles("org,,other");
        assert_eq!(roles.len(), 2);
        assert_eq!(roles[0].label, "org");
    }

    #[test]
    fn test_durations_are_clamped() {
        assert_eq!(clamp_to("SESSION_TTL_HOURS", 336, SESSION_TTL_HOURS_RANGE), 336);
        assert_eq!(clamp_to("SESSION_TTL_HOURS", -5, SESSION_TTL_HOURS_RANGE), 1);
        assert_eq!(
            clamp_to("SESSION_TTL_HOURS", i64::MAX, SESSION_TTL_HOURS_RANGE),
            87_600
        );
        assert_eq!(clamp_to("ANTHILL_MESSAGE_WAIT", -1, MESSAGE_WAIT_MINUTES_RANGE), 0);
        assert_eq!(
            clamp_to("ANTHILL_MESSAGE_WAIT", 10_000_000_000_000, MESSAGE_WAIT_MINUTES_RANGE),
            525_600
        );

        // the clamped extremes are safe to turn into durations
        let _ = chrono::Utc::now() + chrono::Duration::hours(*SESSION_TTL_HOURS_RANGE.end());
        let _ = chrono::Duration::minutes(*MESSAGE_WAIT_MINUTES_RANGE.end());
    }

    #[test]
    fn test_memory_config_defaults() {
        let config = Config::for_memory();
        assert!(config.uses_memory_store());
        assert_eq!(config.message_wait(), chrono::Duration::minutes(60));
        assert_eq!(config.message_max, 100);
        assert!(config.is_role("other"));
        assert!(!config.is_role("admin"));
    }
}
