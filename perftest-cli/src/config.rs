//! Configuration loading from perftest.toml
//!
//! Global settings can be specified in a `perftest.toml` file in the project
//! root. The file is discovered by walking up from the checked path and
//! applied with `set_defaults` before discovery begins.
//!
//! ```toml
//! [time]
//! number = 10000
//! repeat = 5
//! baseline = "standard"
//!
//! [memory]
//! repeat = 1
//!
//! [output]
//! format = "human"
//! ```

use anyhow::Context;
use perftest_core::{ConfigError, MeasurementKind, Params, SettingValue, SettingsStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file
pub const CONFIG_FILE: &str = "perftest.toml";

/// perftest configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PerftestConfig {
    /// Global TIME settings
    #[serde(default)]
    pub time: toml::Table,
    /// Global MEMORY settings
    #[serde(default)]
    pub memory: toml::Table,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

impl PerftestConfig {
    /// Load configuration from a file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Find the config governing `root` (a check module or directory).
    ///
    /// Walks up from `root`; a file that exists but does not parse is an
    /// error, never a silent fallback to defaults.
    pub fn discover(root: &Path) -> anyhow::Result<Option<Self>> {
        let start = if root.is_file() {
            root.parent().unwrap_or(root)
        } else {
            root
        };
        let start = start
            .canonicalize()
            .unwrap_or_else(|_| start.to_path_buf());
        Self::discover_from(start)
    }

    /// Walk up from `dir` looking for a config file
    pub fn discover_from(mut dir: PathBuf) -> anyhow::Result<Option<Self>> {
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.is_file() {
                let config = Self::load(&config_path)?;
                tracing::debug!(path = %config_path.display(), "loaded config");
                return Ok(Some(config));
            }
            if !dir.pop() {
                return Ok(None);
            }
        }
    }

    /// Apply `[time]` and `[memory]` as global overrides
    pub fn apply(&self, store: &mut SettingsStore) -> Result<(), ConfigError> {
        for (kind, table) in [
            (MeasurementKind::Time, &self.time),
            (MeasurementKind::Memory, &self.memory),
        ] {
            let params = params_from_table(kind, table)?;
            if !params.is_empty() {
                store.set_defaults(kind, params)?;
            }
        }
        Ok(())
    }

    /// Fresh settings store seeded from this configuration
    pub fn settings_store(&self) -> Result<SettingsStore, ConfigError> {
        let mut store = SettingsStore::new();
        self.apply(&mut store)?;
        Ok(store)
    }
}

fn params_from_table(kind: MeasurementKind, table: &toml::Table) -> Result<Params, ConfigError> {
    let mut params = Params::new();
    for (name, value) in table {
        let value = setting_value(value).ok_or_else(|| {
            ConfigError::new(format!(
                "[{}] {}: unsupported value type `{}`",
                kind,
                name,
                value.type_str()
            ))
        })?;
        params
            .set_named(name, value)
            .map_err(|e| ConfigError::new(format!("[{}] {}", kind, e)))?;
    }
    Ok(params)
}

fn setting_value(value: &toml::Value) -> Option<SettingValue> {
    match value {
        toml::Value::Integer(n) => Some(SettingValue::Integer(*n)),
        toml::Value::Boolean(b) => Some(SettingValue::Bool(*b)),
        toml::Value::String(s) => Some(SettingValue::Text(s.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perftest_core::{CallOverrides, FunctionId};

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [time]
            number = 1000
            repeat = 3
            baseline = "standard"

            [memory]
            repeat = 2

            [output]
            format = "json"
        "#;

        let config: PerftestConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.output.format, "json");

        let store = config.settings_store().unwrap();
        let f = FunctionId::new("demo::f");
        let time = store
            .resolve(&f, MeasurementKind::Time, &CallOverrides::none())
            .unwrap();
        assert_eq!(time.number, 1000);
        assert_eq!(time.repeat, 3);
        assert_eq!(time.baseline.map(|b| b.name()), Some("standard"));

        let memory = store
            .resolve(&f, MeasurementKind::Memory, &CallOverrides::none())
            .unwrap();
        assert_eq!(memory.repeat, 2);
        assert!(memory.baseline.is_none());
    }

    #[test]
    fn test_default_config() {
        let config: PerftestConfig = toml::from_str("").unwrap();
        assert_eq!(config.output.format, "human");
        let store = config.settings_store().unwrap();
        assert!(store.global_params(MeasurementKind::Time).is_none());
    }

    #[test]
    fn test_unknown_setting_rejected() {
        let config: PerftestConfig = toml::from_str("[time]\nnumbr = 10\n").unwrap();
        let err = config.settings_store().unwrap_err();
        assert!(err.message().contains("numbr"));
    }

    #[test]
    fn test_mistyped_setting_rejected() {
        let config: PerftestConfig = toml::from_str("[time]\nrepeat = 1.5\n").unwrap();
        let err = config.settings_store().unwrap_err();
        assert!(err.message().contains("repeat"));

        let config: PerftestConfig = toml::from_str("[memory]\nnumber = 10\n").unwrap();
        assert!(config.settings_store().is_err());
    }

    #[test]
    fn test_discover_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[time]\nrepeat = 7\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = PerftestConfig::discover_from(nested).unwrap().unwrap();
        assert_eq!(config.time.get("repeat").and_then(|v| v.as_integer()), Some(7));
    }

    #[test]
    fn test_discover_from_check_path() {
        let dir = tempfile::tempdir().unwrap();
        let demo = dir.path().join("demo");
        let src = demo.join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(demo.join(CONFIG_FILE), "[time]\nrepeat = 3\n").unwrap();
        let module = src.join("perftest_demo.rs");
        std::fs::write(&module, "").unwrap();

        for root in [&src, &module] {
            let config = PerftestConfig::discover(root).unwrap().unwrap();
            assert_eq!(config.time.get("repeat").and_then(|v| v.as_integer()), Some(3));
        }
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[time\nrepeat = 3\n").unwrap();
        let err = PerftestConfig::discover(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to parse"));
    }
}
