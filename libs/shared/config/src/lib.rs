use std::env;
use std::str::FromStr;

use chrono::Duration;
use tracing::warn;

pub const DEFAULT_SLOT_DURATION_MINUTES: i64 = 30;
pub const DEFAULT_SLOT_BUFFER_MINUTES: i64 = 10;

/// Upper bound for both slot settings; no slot can outlast a day.
const MAX_SLOT_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub slot_duration_minutes: i64,
    pub slot_buffer_minutes: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            slot_duration_minutes: DEFAULT_SLOT_DURATION_MINUTES,
            slot_buffer_minutes: DEFAULT_SLOT_BUFFER_MINUTES,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            slot_duration_minutes: parse_minutes("SLOT_DURATION_MINUTES", 1, DEFAULT_SLOT_DURATION_MINUTES),
            slot_buffer_minutes: parse_minutes("SLOT_BUFFER_MINUTES", 0, DEFAULT_SLOT_BUFFER_MINUTES),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    pub fn slot_duration(&self) -> Duration {
        minutes_or_default(self.slot_duration_minutes, 1, DEFAULT_SLOT_DURATION_MINUTES)
    }

    pub fn slot_buffer(&self) -> Duration {
        minutes_or_default(self.slot_buffer_minutes, 0, DEFAULT_SLOT_BUFFER_MINUTES)
    }
}

fn minutes_or_default(minutes: i64, min: i64, default: i64) -> Duration {
    let minutes = if (min..=MAX_SLOT_MINUTES).contains(&minutes) { minutes } else { default };
    Duration::minutes(minutes)
}

fn parse_minutes(name: &str, min: i64, default: i64) -> i64 {
    let minutes = parse_var(name, default);
    if (min..=MAX_SLOT_MINUTES).contains(&minutes) {
        return minutes;
    }

    warn!("{} must be between {} and {} minutes, got {}, using default {}", name, min, MAX_SLOT_MINUTES, minutes, default);
    default
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scheduling_values() {
        let config = AppConfig::default();

        assert_eq!(config.slot_duration(), Duration::minutes(30));
        assert_eq!(config.slot_buffer(), Duration::minutes(10));
        assert!(!config.is_configured());
    }

    #[test]
    fn test_invalid_numeric_var_falls_back_to_default() {
        env::set_var("TEST_CONFIG_BAD_NUMBER", "thirty");
        assert_eq!(parse_var("TEST_CONFIG_BAD_NUMBER", 30i64), 30);

        env::set_var("TEST_CONFIG_GOOD_NUMBER", " 45 ");
        assert_eq!(parse_var("TEST_CONFIG_GOOD_NUMBER", 30i64), 45);
    }

    #[test]
    fn test_out_of_range_minutes_fall_back_to_default() {
        env::set_var("TEST_CONFIG_HUGE_MINUTES", i64::MAX.to_string());
        assert_eq!(parse_minutes("TEST_CONFIG_HUGE_MINUTES", 1, 30), 30);

        env::set_var("TEST_CONFIG_ZERO_MINUTES", "0");
        assert_eq!(parse_minutes("TEST_CONFIG_ZERO_MINUTES", 1, 30), 30);
        assert_eq!(parse_minutes("TEST_CONFIG_ZERO_MINUTES", 0, 10), 0);

        env::set_var("TEST_CONFIG_FULL_DAY", "1440");
        assert_eq!(parse_minutes("TEST_CONFIG_FULL_DAY", 1, 30), 1440);
    }

    #[test]
    fn test_slot_durations_never_panic_on_bad_fields() {
        let config = AppConfig {
            slot_duration_minutes: i64::MAX,
            slot_buffer_minutes: i64::MIN,
            ..AppConfig::default()
        };

        assert_eq!(config.slot_duration(), Duration::minutes(DEFAULT_SLOT_DURATION_MINUTES));
        assert_eq!(config.slot_buffer(), Duration::minutes(DEFAULT_SLOT_BUFFER_MINUTES));
    }
}
