//! Layered CLI configuration using Figment
//!
//! Sources, later overriding earlier:
//! 1. Built-in defaults
//! 2. `formsmith.toml`, `formsmith.yaml`, `formsmith.json` in the working directory
//! 3. `FORMSMITH_*` environment variables

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use formsmith_fields::FormEngine;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Base name of the configuration files looked up in a directory.
pub const CONFIG_FILE_STEM: &str = "formsmith";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "FORMSMITH_";

/// How `validate` reports several failures on the same field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorDisplay {
    /// One message per field, the last reported one.
    #[default]
    Last,
    /// Every message.
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormsmithConfig {
    /// Directory holding one YAML file per form schema.
    pub store_dir: PathBuf,
    /// Refresh loop pass cap; the field count when unset.
    pub max_refresh_passes: Option<usize>,
    pub error_display: ErrorDisplay,
}

impl Default for FormsmithConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(".formsmith/forms"),
            max_refresh_passes: None,
            error_display: ErrorDisplay::Last,
        }
    }
}

impl FormsmithConfig {
    /// Load configuration relative to the current directory.
    pub fn load() -> Result<Self, figment::Error> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::load_from(&cwd)
    }

    /// Load configuration with config files looked up in `dir`.
    pub fn load_from(dir: &Path) -> Result<Self, figment::Error> {
        debug!(?dir, "loading formsmith configuration");
        let config: Self = Self::figment(dir).extract()?;
        trace!(?config, "configuration loaded");
        Ok(config)
    }

    fn figment(dir: &Path) -> Figment {
        let file = |ext: &str| dir.join(format!("{CONFIG_FILE_STEM}.{ext}"));
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(file("toml")))
            .merge(Yaml::file(file("yaml")))
            .merge(Json::file(file("json")))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Engine configured with these settings.
    pub fn engine(&self) -> FormEngine {
        match self.max_refresh_passes {
            Some(passes) => FormEngine::new().with_max_passes(passes),
            None => FormEngine::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn defaults_without_files() {
        let temp_dir = TempDir::new().unwrap();
        let config = FormsmithConfig::load_from(temp_dir.path()).unwrap();
        assert_eq!(config, FormsmithConfig::default());
    }

    #[test]
    #[serial]
    fn toml_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("formsmith.toml"),
            "store_dir = \"schemas\"\nerror_display = \"all\"\n",
        )
        .unwrap();

        let config = FormsmithConfig::load_from(temp_dir.path()).unwrap();
        assert_eq!(config.store_dir, PathBuf::from("schemas"));
        assert_eq!(config.error_display, ErrorDisplay::All);
        assert_eq!(config.max_refresh_passes, None);
    }

    #[test]
    #[serial]
    fn json_file_wins_over_yaml() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("formsmith.yaml"),
            "max_refresh_passes: 3\nstore_dir: from-yaml\n",
        )
        .unwrap();
        fs::write(
            temp_dir.path().join("formsmith.json"),
            r#"{"store_dir": "from-json"}"#,
        )
        .unwrap();

        let config = FormsmithConfig::load_from(temp_dir.path()).unwrap();
        assert_eq!(config.store_dir, PathBuf::from("from-json"));
        assert_eq!(config.max_refresh_passes, Some(3));
    }

    #[test]
    #[serial]
    fn environment_overrides_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("formsmith.toml"),
            "max_refresh_passes = 2\n",
        )
        .unwrap();

        std::env::set_var("FORMSMITH_MAX_REFRESH_PASSES", "9");
        let config = FormsmithConfig::load_from(temp_dir.path());
        std::env::remove_var("FORMSMITH_MAX_REFRESH_PASSES");

        assert_eq!(config.unwrap().max_refresh_passes, Some(9));
    }

    #[test]
    #[serial]
    fn invalid_value_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("formsmith.toml"),
            "error_display = \"sometimes\"\n",
        )
        .unwrap();
        assert!(FormsmithConfig::load_from(temp_dir.path()).is_err());
    }
}
