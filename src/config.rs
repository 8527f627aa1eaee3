//! Conversion options
//!
//! Options come from an optional YAML or JSON file and are then overridden
//! by command-line flags.

use crate::error::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables shared by all three translators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Nesting depth at which tree extraction stops descending
    pub max_depth: usize,
    /// Iteration cap for flattening nested MIN/MAX calls
    pub minmax_iterations: usize,
    /// Identifiers derived from labels are truncated to this length
    pub max_identifier_len: usize,
    /// Emit `"Heading` lines between sheet sections
    pub headings: bool,
    /// Emit a leading comment naming the source kind
    pub header_comment: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            max_depth: 256,
            minmax_iterations: 10,
            max_identifier_len: 30,
            headings: true,
            header_comment: true,
        }
    }
}

impl ConvertOptions {
    /// Load options from a `.yaml`/`.yml` or `.json` file
    pub fn from_file(path: &Path) -> BridgeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let options: Self = match extension(path).as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            other => {
                return Err(BridgeError::UnsupportedFormat(format!(
                    "config file '{}' has unsupported extension {:?}",
                    path.display(),
                    other
                )))
            }
        };
        options.validate()?;
        Ok(options)
    }

    /// Reject values that would disable a translator outright
    pub fn validate(&self) -> BridgeResult<()> {
        if self.max_depth == 0 {
            return Err(BridgeError::Config("max_depth must be at least 1".into()));
        }
        if self.max_identifier_len == 0 {
            return Err(BridgeError::Config(
                "max_identifier_len must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}
