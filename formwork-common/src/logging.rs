//! Helpers for structured values in log lines.

use serde::Serialize;
use std::fmt::{self, Debug};

/// Render a value as YAML inside a `tracing` message.
///
/// ```ignore
/// use formwork_common::Pretty;
/// tracing::debug!("migrated values: {}", Pretty(&values));
/// ```
///
/// Falls back to `{:#?}` when the value cannot be serialized.
pub struct Pretty<T>(pub T);

impl<T: Serialize + Debug> Pretty<T> {
    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_yaml_ng::to_string(&self.0) {
            Ok(yaml) => write!(f, "\n{}", yaml.trim_end()),
            Err(_) => write!(f, "\n{:#?}", self.0),
        }
    }
}

impl<T: Serialize + Debug> fmt::Display for Pretty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f)
    }
}

impl<T: Serialize + Debug> fmt::Debug for Pretty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f)
    }
}
