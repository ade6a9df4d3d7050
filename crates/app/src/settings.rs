//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` and from `ANTFARM__*` environment variables
//! (`ANTFARM__SERVER__PORT=8080` overrides `server.port`).
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
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

#[derive(Debug, Deserialize)]
pub struct Classifier {
    pub api_key: String,
    pub model: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Server,
    pub classifier: Option<Classifier>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name("settings").required(false))
                .add_source(Environment::with_prefix("ANTFARM").separator("__")),
        )
    }

    fn from_config(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> Result<Settings, ConfigError> {
        Settings::from_config(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    #[test]
    fn sqlite_database_and_classifier() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            bind = "0.0.0.0"
            port = 5001
            database = { sqlite = "antfarm.db" }

            [classifier]
            api_key = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.server.port, 5001);
        assert_eq!(
            settings.server.database,
            Database::Sqlite("antfarm.db".to_string())
        );
        let classifier = settings.classifier.unwrap();
        assert_eq!(classifier.api_key, "secret");
        assert!(classifier.model.is_none());
    }

    #[test]
    fn memory_database_without_classifier() {
        let settings = parse(
            r#"
            [server]
            port = 3000
            database = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.database, Database::Memory);
        assert!(settings.server.bind.is_none());
        assert!(settings.classifier.is_none());
    }

    #[test]
    fn server_section_is_required() {
        assert!(parse("[app]\nlevel = \"info\"").is_err());
    }
}
