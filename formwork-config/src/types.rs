//! Configuration shape and conversion into the engine's option structs

use crate::error::{ConfigError, ConfigResult};
use formwork_fields::{CyclePolicy, LoadOptions, MigrationOptions, UnknownKeyPolicy};
use formwork_submit::SubmitOptions;
use serde::{Deserialize, Serialize};

/// Complete Formwork configuration.
///
/// Every section and key has a default, so an empty file (or no file at all)
/// is a valid configuration. Unknown top-level keys are ignored so unrelated
/// `FORMWORK_*` variables do not break loading; unknown keys inside a section
/// are errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormworkConfig {
    pub definitions: DefinitionsConfig,
    pub migration: MigrationConfig,
    pub submit: SubmitConfig,
}

/// How definitions are loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefinitionsConfig {
    pub cycle_policy: CyclePolicy,
}

/// How instances move between definition versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrationConfig {
    pub unknown_keys: UnknownKeyPolicy,
    pub strict: bool,
    pub array_delimiter: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            unknown_keys: UnknownKeyPolicy::default(),
            strict: false,
            array_delimiter: ",".to_string(),
        }
    }
}

/// How submissions are processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubmitConfig {
    pub array_delimiter: String,
    pub revalidate_fields: bool,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            array_delimiter: ",".to_string(),
            revalidate_fields: true,
        }
    }
}

impl FormworkConfig {
    /// Reject values that parse but cannot work.
    pub fn validate(&self) -> ConfigResult<()> {
        for (key, delimiter) in [
            ("migration.array_delimiter", &self.migration.array_delimiter),
            ("submit.array_delimiter", &self.submit.array_delimiter),
        ] {
            if delimiter.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "delimiter must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            cycle_policy: self.definitions.cycle_policy,
        }
    }

    /// Migration options without converters; hosts add those in code.
    pub fn migration_options(&self) -> MigrationOptions {
        MigrationOptions::default()
            .with_unknown_keys(self.migration.unknown_keys)
            .with_strict(self.migration.strict)
            .with_array_delimiter(self.migration.array_delimiter.clone())
    }

    pub fn submit_options(&self) -> SubmitOptions {
        SubmitOptions::default()
            .with_array_delimiter(self.submit.array_delimiter.clone())
            .with_revalidate_fields(self.submit.revalidate_fields)
    }
}
