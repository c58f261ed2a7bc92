use anyhow::{Context, Result};
use balance_core::{GeneratorConfig, QuestionCatalog};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::db::{self, Database};

const APP_NAME: &str = "family-balance";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Port for the HTTP API
    pub port: u16,
    /// SQLite file. Defaults to the platform data directory.
    pub database_path: Option<PathBuf>,
    /// JSON question catalog. The built-in 80-question survey when unset.
    pub catalog_path: Option<PathBuf>,
    pub generator: GeneratorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            database_path: None,
            catalog_path: None,
            generator: GeneratorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the user's config directory, then apply
    /// environment overrides. Falls back to defaults if the file doesn't exist
    /// or fails to parse.
    pub fn load() -> Self {
        let config = match get_config_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;

        let config = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Apply `FAMILY_BALANCE_PORT`, `FAMILY_BALANCE_DB` and
    /// `FAMILY_BALANCE_CATALOG`. Unparsable ports are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(port) = lookup("FAMILY_BALANCE_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("Ignoring invalid FAMILY_BALANCE_PORT: {}", port),
            }
        }
        if let Some(path) = lookup("FAMILY_BALANCE_DB").filter(|p| !p.is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("FAMILY_BALANCE_CATALOG").filter(|p| !p.is_empty()) {
            self.catalog_path = Some(PathBuf::from(path));
        }
        self
    }

    /// Rewrite the user's config file from its own contents, filling in
    /// defaults. Environment overrides are never persisted.
    pub fn write_user_file() -> Result<PathBuf> {
        let path = get_config_path()?;
        Self::rewrite(&path)?;
        Ok(path)
    }

    pub fn rewrite(path: &Path) -> Result<Self> {
        let config = Self::load_from(path)?;
        config.save_to(path)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn load_catalog(&self) -> Result<QuestionCatalog> {
        match &self.catalog_path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read catalog {}", path.display()))?;
                let catalog = QuestionCatalog::from_json(&content)
                    .with_context(|| format!("Invalid catalog {}", path.display()))?;
                Ok(catalog)
            }
            None => Ok(QuestionCatalog::standard()),
        }
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => db::default_path(),
        }
    }

    /// Open and migrate the configured database with the configured catalog
    /// and generator settings.
    pub fn open_database(&self) -> Result<Database> {
        let db = Database::open(self.database_path()?)?
            .with_catalog(self.load_catalog()?)
            .with_generator(self.generator.clone());
        db.migrate()?;
        Ok(db)
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.port, 3000);
        assert_eq!(config.generator.max_meeting_tasks, 2);
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = AppConfig::default();
        config.port = 8080;
        config.generator.legacy_default_balances = true;

        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"generator": {"max_meeting_tasks": 4}}"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.generator.max_meeting_tasks, 4);
        assert!(!config.generator.legacy_default_balances);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn environment_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FAMILY_BALANCE_PORT", "4000"),
            ("FAMILY_BALANCE_DB", "/tmp/balance.db"),
        ]);
        let config = AppConfig::default().with_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.port, 4000);
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/balance.db")));
        assert_eq!(config.catalog_path, None);

        let bad = HashMap::from([("FAMILY_BALANCE_PORT", "lots")]);
        let config = AppConfig::default().with_overrides(|k| bad.get(k).map(|v| v.to_string()));
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn rewrite_keeps_file_values_not_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"port": 4000}"#).unwrap();

        let env = HashMap::from([("FAMILY_BALANCE_PORT", "5000"), ("FAMILY_BALANCE_DB", "/tmp/x.db")]);
        let effective = AppConfig::load_from(&path)
            .unwrap()
            .with_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(effective.port, 5000);

        let written = AppConfig::rewrite(&path).unwrap();
        assert_eq!(written.port, 4000);
        assert_eq!(written.database_path, None);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("max_meeting_tasks"));
        assert_eq!(AppConfig::load_from(&path).unwrap(), written);
    }

    #[test]
    fn loads_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, r#"[{"id": "q1", "category": "Invisible Parental Tasks"}]"#).unwrap();

        let config = AppConfig {
            catalog_path: Some(path),
            ..Default::default()
        };
        let catalog = config.load_catalog().unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(AppConfig::default().load_catalog().unwrap().len(), 80);
    }
}
