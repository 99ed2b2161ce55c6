use std::env;
use std::net::SocketAddr;

use rust_decimal::Decimal;
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./transparency.db?mode=rwc";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

/// Sessions live between one hour and one year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;
pub const MAX_DB_CONNECTIONS: u32 = 64;

/// Runtime settings, read once at start-up from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub session_ttl_hours: i64,
    pub require_email_verification: bool,
    pub fiscal_year: i32,
    pub usd_conversion_rate: Decimal,
    pub llm: LlmConfig,
    pub log_json: bool,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|v| v.parse::<SocketAddr>().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            bind_addr,
            db_max_connections: env_clamped("DB_MAX_CONNECTIONS", 5, 1, MAX_DB_CONNECTIONS),
            session_ttl_hours: env_clamped("SESSION_TTL_HOURS", 24, 1, MAX_SESSION_TTL_HOURS),
            require_email_verification: env_bool("REQUIRE_EMAIL_VERIFICATION", true),
            fiscal_year: env_clamped("FISCAL_YEAR", 2024, 1900, 9999),
            usd_conversion_rate: env_decimal("USD_CONVERSION_RATE", Decimal::new(12, 3)),
            llm: LlmConfig {
                api_key: env::var("LLM_API_KEY").ok().filter(|k| !k.trim().is_empty()),
                base_url: env::var("LLM_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.to_string()),
                model: env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            },
            log_json: env_bool("LOG_JSON", false),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            db_max_connections: 5,
            session_ttl_hours: 24,
            require_email_verification: true,
            fiscal_year: 2024,
            usd_conversion_rate: Decimal::new(12, 3),
            llm: LlmConfig {
                api_key: None,
                base_url: DEFAULT_LLM_BASE_URL.to_string(),
                model: DEFAULT_LLM_MODEL.to_string(),
            },
            log_json: false,
        }
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

/// Parses `raw` as an integer and clamps it to `min..=max`. Values too large
/// for `T` saturate at `max`; anything unparseable falls back to `default`.
fn parse_clamped<T>(raw: Option<&str>, default: T, min: T, max: T) -> T
where
    T: TryFrom<i128> + Ord + Copy,
{
    let Some(n) = raw.and_then(|v| v.trim().parse::<i128>().ok()) else {
        return default;
    };
    T::try_from(n)
        .unwrap_or(if n < 0 { min } else { max })
        .clamp(min, max)
}

fn env_clamped<T>(name: &str, default: T, min: T, max: T) -> T
where
    T: TryFrom<i128> + Ord + Copy,
{
    parse_clamped(env::var(name).ok().as_deref(), default, min, max)
}

fn env_decimal(name: &str, default: Decimal) -> Decimal {
    env::var(name)
        .ok()
        .and_then(|v| Decimal::from_str(v.trim()).ok())
        .filter(|d| *d > Decimal::ZERO)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo_institution() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.fiscal_year, 2024);
        assert_eq!(cfg.usd_conversion_rate, Decimal::from_str("0.012").unwrap());
        assert!(cfg.require_email_verification);
        assert!(cfg.llm.api_key.is_none());
    }

    #[test]
    fn oversized_session_ttl_is_clamped_instead_of_wrapping() {
        let ttl = |raw| parse_clamped::<i64>(Some(raw), 24, 1, MAX_SESSION_TTL_HOURS);
        assert_eq!(ttl("18446744073709551615"), MAX_SESSION_TTL_HOURS);
        assert_eq!(ttl("9223372036854775807"), MAX_SESSION_TTL_HOURS);
        assert_eq!(ttl("0"), 1);
        assert_eq!(ttl("-5"), 1);
        assert_eq!(ttl("48"), 48);
        assert_eq!(ttl("soon"), 24);
    }

    #[test]
    fn pool_size_never_wraps_to_zero() {
        assert_eq!(parse_clamped::<u32>(Some("4294967296"), 5, 1, MAX_DB_CONNECTIONS), MAX_DB_CONNECTIONS);
        assert_eq!(parse_clamped::<u32>(None, 5, 1, MAX_DB_CONNECTIONS), 5);
    }
}
