//! Handles settings for the application. Configuration is read from
//! `settings.toml` in the working directory; any key can be overridden with
//! an `AGENDA__<SECTION>__<KEY>` environment variable.
//!
//! See `settings.toml` for an example.
use config::{Config, ConfigError, Environment, File};
use engine::BookingPolicy;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

/// Overrides of the default booking rules. Absent keys keep the default.
#[derive(Debug, Default, Deserialize)]
pub struct Booking {
    pub timezone: Option<String>,
    pub opening_hour: Option<u32>,
    pub closing_hour: Option<u32>,
    pub guard_minutes: Option<i64>,
}

impl Booking {
    pub fn policy(&self) -> Result<BookingPolicy, String> {
        let mut policy = BookingPolicy::default();
        if let Some(timezone) = &self.timezone {
            let tz = timezone
                .parse::<chrono_tz::Tz>()
                .map_err(|_| format!("unknown timezone: {timezone}"))?;
            policy = policy.timezone(tz);
        }
        if self.opening_hour.is_some() || self.closing_hour.is_some() {
            policy = policy
                .opening_hours(
                    self.opening_hour.unwrap_or(policy.opening_hour),
                    self.closing_hour.unwrap_or(policy.closing_hour),
                )
                .map_err(|err| err.to_string())?;
        }
        if let Some(minutes) = self.guard_minutes {
            policy = policy.guard_minutes(minutes).map_err(|err| err.to_string())?;
        }
        Ok(policy)
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
    #[serde(default)]
    pub booking: Booking,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder().add_source(File::with_name("settings").required(false)),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder
            .set_default("app.level", "info")?
            .add_source(
                Environment::with_prefix("AGENDA")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    #[cfg(test)]
    fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Self::from_builder(Config::builder().add_source(File::from_str(raw, FileFormat::Toml)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_file_parses() {
        let settings = Settings::from_toml(
            r#"
            [app]
            level = "debug"

            [server]
            port = 3000
            database = { sqlite = "agenda.db" }

            [booking]
            timezone = "UTC"
            opening_hour = 9
            guard_minutes = 45
            "#,
        )
        .unwrap();

        assert_eq!(settings.app.level, "debug");
        let server = settings.server.unwrap();
        assert_eq!(server.port, 3000);
        assert_eq!(server.database, Database::Sqlite("agenda.db".to_string()));

        let policy = settings.booking.policy().unwrap();
        assert_eq!(policy.timezone, chrono_tz::UTC);
        assert_eq!(policy.opening_hour, 9);
        assert_eq!(policy.closing_hour, 18);
        assert_eq!(policy.guard_window, chrono::Duration::minutes(45));
    }

    #[test]
    fn defaults_apply_when_sections_are_missing() {
        let settings = Settings::from_toml(
            r#"
            [server]
            port = 8080
            database = "memory"
            "#,
        )
        .unwrap();
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.unwrap().database, Database::Memory);
        assert_eq!(settings.booking.policy().unwrap(), BookingPolicy::default());
    }

    #[test]
    fn bad_booking_values_are_reported() {
        let booking = Booking {
            timezone: Some("Mars/Olympus".to_string()),
            ..Default::default()
        };
        assert!(booking.policy().is_err());

        let booking = Booking {
            opening_hour: Some(19),
            ..Default::default()
        };
        assert!(booking.policy().is_err());
    }
}
