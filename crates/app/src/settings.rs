//! Application settings, read from `settings.toml` (or the file named by
//! `PENNYWISE_CONFIG`) and overridden by `PENNYWISE__SECTION__KEY`
//! environment variables.
use config::{Config, ConfigError, Environment, File};
use engine::{AlertDefaults, BudgetConfig, DetectionConfig, EngineConfig};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: Database,
}

fn default_port() -> u16 {
    3000
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
    pub detection: DetectionConfig,
    pub budget: BudgetConfig,
    pub alerts: AlertDefaults,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let path =
            std::env::var("PENNYWISE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        Config::builder()
            .add_source(File::with_name(&path).required(false))
            .add_source(
                Environment::with_prefix("PENNYWISE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            detection: self.detection.clone(),
            budget: self.budget.clone(),
            alerts: self.alerts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let settings = parse("");
        assert_eq!(settings.app.level, "info");
        assert!(settings.server.is_none());
        assert_eq!(settings.engine_config(), EngineConfig::default());
    }

    #[test]
    fn sections_override_single_keys() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            port = 8080
            database = { sqlite = "data/pennywise.db" }

            [alerts]
            reminder_days_ahead = 7
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        let server = settings.server.unwrap();
        assert_eq!(server.port, 8080);
        assert!(server.bind.is_none());
        assert!(matches!(server.database, Database::Sqlite(ref path) if path == "data/pennywise.db"));
        assert_eq!(settings.alerts.reminder_days_ahead, 7);
        assert_eq!(settings.alerts.utilization_threshold_pct, 30.0);
        assert_eq!(settings.detection, DetectionConfig::default());
    }

    #[test]
    fn memory_database() {
        let settings = parse(
            r#"
            [server]
            database = "memory"
            "#,
        );
        let server = settings.server.unwrap();
        assert_eq!(server.port, 3000);
        assert!(matches!(server.database, Database::Memory));
    }
}
