use anyhow::{Context, Result};
use headmap_core::{AggregationRules, ConditionNames};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Location of the ~/.headmap directory, or a local `.headmap` directory if
/// the home directory cannot be determined. Nothing is created.
pub fn headmap_data_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".headmap"),
        None => PathBuf::from(".headmap"),
    }
}

/// Returns the ~/.headmap directory, creating it if needed.
/// Falls back to a local `.headmap` directory if it cannot be created.
pub fn headmap_data_dir() -> PathBuf {
    let path = headmap_data_path();
    if let Err(e) = fs::create_dir_all(&path) {
        warn!(
            error = %e,
            path = %path.display(),
            "Could not create data dir, falling back to local .headmap"
        );
        let fallback = PathBuf::from(".headmap");
        let _ = fs::create_dir_all(&fallback);
        return fallback;
    }
    path
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EngineConfig {
    /// Directory holding the engine's `<function>.csv` exports
    #[serde(default = "default_table_dir")]
    pub table_dir: PathBuf,
}

fn default_table_dir() -> PathBuf {
    headmap_data_path().join("exports")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            table_dir: default_table_dir(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub aggregation: AggregationRules,
    #[serde(default)]
    pub conditions: ConditionNames,
}

impl Config {
    pub fn default_path() -> PathBuf {
        headmap_data_dir().join("config.toml")
    }

    /// Reads `path`, writing a default config there first if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Config::default();
            config.save(path)?;
            info!(path = %path.display(), "Created default config");
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let toml = toml::to_string_pretty(self).context("serializing config")?;
        fs::write(path, toml).with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [engine]
            table_dir = "/srv/exports"

            [aggregation]
            user_symptom = "composite"

            [conditions]
            symptoms = ["anxiety", "insomnia"]
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.table_dir, PathBuf::from("/srv/exports"));
        assert_eq!(config.aggregation.user_symptom, "composite");
        assert_eq!(config.aggregation.rewards_excluded_band, "D");
        assert_eq!(
            config.aggregation.requests.rewards.numbers,
            "rewardsh.data.numbers"
        );
        assert_eq!(config.conditions.symptoms, ["anxiety", "insomnia"]);
        assert_eq!(config.conditions.sites.len(), 19);
    }

    #[test]
    fn test_load_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load(&path).unwrap();

        assert!(path.exists());
        assert_eq!(Config::load(&path).unwrap(), created);
    }

    #[test]
    fn test_saved_config_round_trips_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.engine.table_dir = dir.path().join("exports");
        config.conditions.symptoms = vec!["anxiety".into()];
        config.aggregation.rewards_excluded_sites.push("O2".into());

        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
