//! # Formwork Config
//!
//! Layered configuration for the Formwork engine, built on figment:
//! defaults, then a `formwork.{json,yml,yaml,toml}` file, then `FORMWORK_`
//! environment variables.
//!
//! ```no_run
//! use formwork_config::ConfigProvider;
//!
//! let config = ConfigProvider::new().load()?;
//! let submit = config.submit_options();
//! assert!(!submit.array_delimiter.is_empty());
//! # Ok::<(), formwork_config::ConfigError>(())
//! ```

mod discovery;
mod error;
mod provider;
mod types;

pub use discovery::{discover, ConfigFile, ConfigFormat, CONFIG_FILE_NAMES};
pub use error::{ConfigError, ConfigResult};
pub use provider::{load_config, ConfigProvider, ENV_PREFIX};
pub use types::{DefinitionsConfig, FormworkConfig, MigrationConfig, SubmitConfig};
