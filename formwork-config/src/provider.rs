//! Configuration provider using Figment for Formwork

use crate::{
    discovery::{discover, ConfigFile, ConfigFormat},
    error::{ConfigError, ConfigResult},
    types::FormworkConfig,
};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use std::path::PathBuf;
use tracing::{debug, trace};

/// Prefix of the environment variables read by [`ConfigProvider`].
pub const ENV_PREFIX: &str = "FORMWORK_";

/// Configuration provider using figment
///
/// Sources are merged in precedence order, later ones overriding earlier:
/// 1. defaults
/// 2. `formwork.{json,yml,yaml,toml}` in the search directory, or the one
///    explicit file when given
/// 3. `FORMWORK_` environment variables, `__` separating sections
///    (`FORMWORK_SUBMIT__ARRAY_DELIMITER=;`)
///
/// Nothing is cached; every [`load`](Self::load) reads the sources again.
#[derive(Debug, Clone, Default)]
pub struct ConfigProvider {
    file: Option<PathBuf>,
    search_dir: Option<PathBuf>,
}

impl ConfigProvider {
    /// A provider searching the current directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read exactly this file instead of searching.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Search this directory instead of the current one.
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dir = Some(dir.into());
        self
    }

    /// Load and check the configuration.
    pub fn load(&self) -> ConfigResult<FormworkConfig> {
        let config: FormworkConfig = self.build_figment()?.extract()?;
        config.validate()?;
        debug!(?config, "loaded configuration");
        Ok(config)
    }

    /// Build the figment with all sources in precedence order.
    pub fn build_figment(&self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(FormworkConfig::default()));
        for file in self.config_files()? {
            trace!(path = %file.path.display(), format = ?file.format, "merging configuration file");
            figment = match file.format {
                ConfigFormat::Toml => figment.merge(Toml::file(&file.path)),
                ConfigFormat::Yaml => figment.merge(Yaml::file(&file.path)),
                ConfigFormat::Json => figment.merge(Json::file(&file.path)),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    fn config_files(&self) -> ConfigResult<Vec<ConfigFile>> {
        if let Some(path) = &self.file {
            if !path.is_file() {
                return Err(ConfigError::FileNotFound { path: path.clone() });
            }
            return Ok(vec![ConfigFile::new(path.clone())?]);
        }
        let dir = match &self.search_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };
        Ok(discover(&dir))
    }
}

/// Load configuration from the current directory and environment.
pub fn load_config() -> ConfigResult<FormworkConfig> {
    ConfigProvider::new().load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_fields::{CyclePolicy, UnknownKeyPolicy};
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_defaults_without_files() {
        let dir = TempDir::new().unwrap();
        let config = ConfigProvider::new().with_search_dir(dir.path()).load().unwrap();
        assert_eq!(config, FormworkConfig::default());
    }

    #[test]
    #[serial]
    fn test_toml_file_in_search_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("formwork.toml"),
            "[definitions]\ncycle_policy = \"permissive\"\n\n[migration]\nstrict = true\n",
        )
        .unwrap();

        let config = ConfigProvider::new().with_search_dir(dir.path()).load().unwrap();
        assert_eq!(config.definitions.cycle_policy, CyclePolicy::Permissive);
        assert!(config.migration.strict);
        assert_eq!(config.migration.array_delimiter, ",");
    }

    #[test]
    #[serial]
    fn test_toml_overrides_json() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("formwork.json"),
            r#"{"submit": {"array_delimiter": "|", "revalidate_fields": false}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("formwork.toml"), "[submit]\narray_delimiter = \";\"\n").unwrap();

        let config = ConfigProvider::new().with_search_dir(dir.path()).load().unwrap();
        assert_eq!(config.submit.array_delimiter, ";");
        assert!(!config.submit.revalidate_fields);
    }

    #[test]
    #[serial]
    fn test_explicit_file_missing_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = ConfigProvider::new()
            .with_file(dir.path().join("nope.yaml"))
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    #[serial]
    fn test_explicit_yaml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.yaml");
        fs::write(&path, "migration:\n  unknown_keys: preserve\n").unwrap();

        let config = ConfigProvider::new().with_file(&path).load().unwrap();
        assert_eq!(config.migration.unknown_keys, UnknownKeyPolicy::Preserve);
    }

    #[test]
    #[serial]
    fn test_environment_overrides_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("formwork.toml"), "[migration]\nstrict = false\n").unwrap();
        std::env::set_var("FORMWORK_MIGRATION__STRICT", "true");
        std::env::set_var("FORMWORK_SUBMIT__ARRAY_DELIMITER", ";");

        let result = ConfigProvider::new().with_search_dir(dir.path()).load();

        std::env::remove_var("FORMWORK_MIGRATION__STRICT");
        std::env::remove_var("FORMWORK_SUBMIT__ARRAY_DELIMITER");

        let config = result.unwrap();
        assert!(config.migration.strict);
        assert_eq!(config.submit.array_delimiter, ";");
    }

    #[test]
    #[serial]
    fn test_bad_values_are_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("formwork.toml"), "[definitions]\ncycle_policy = \"sometimes\"\n")
            .unwrap();
        let err = ConfigProvider::new().with_search_dir(dir.path()).load().unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));

        fs::write(dir.path().join("formwork.toml"), "[migration]\narray_delimiter = \"\"\n").unwrap();
        let err = ConfigProvider::new().with_search_dir(dir.path()).load().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
