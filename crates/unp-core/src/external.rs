//! The companion unique-note tool's config.
//!
//! The editor's built-in unique-note tool persists its settings as
//! `.obsidian/zk-prefixer.json` under the vault root:
//!
//! ```json
//! { "folder": "Zettel", "format": "YYYYMMDDHHmm", "template": "" }
//! ```
//!
//! Only `folder` and `format` matter here. The file is owned by the
//! companion tool and may change at any time, so it is re-read for every
//! conversion request instead of being cached.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::error::ConfigError;
use crate::idformat::{IdFormat, DEFAULT_ID_FORMAT};

/// Location of the companion config relative to the vault root.
pub const COMPANION_CONFIG_PATH: &str = ".obsidian/zk-prefixer.json";

/// Destination and ID pattern for converted notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalConfig {
    /// Vault-relative folder that receives converted notes. Never empty.
    pub destination_folder: String,
    /// Moment-style ID pattern.
    pub id_format: String,
}

impl ExternalConfig {
    /// The compiled ID pattern.
    #[must_use]
    pub fn id_format(&self) -> IdFormat {
        IdFormat::parse(&self.id_format)
    }

    /// Merge a parsed companion config over the defaults.
    ///
    /// `folder` overrides the (empty) default destination when it is a
    /// non-empty string. `format` overrides [`DEFAULT_ID_FORMAT`] only when
    /// it is a string that is not blank after trimming.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LoadFailure`] if `loaded` is not a JSON object.
    /// Returns [`ConfigError::MissingDestination`] if no destination remains
    /// after the merge.
    pub fn merge(source: &Path, loaded: &Value) -> Result<Self, ConfigError> {
        let fields = loaded.as_object().ok_or_else(|| ConfigError::LoadFailure {
            path: source.display().to_string(),
            reason: "expected a JSON object".to_string(),
        })?;

        let mut config = Self {
            destination_folder: String::new(),
            id_format: DEFAULT_ID_FORMAT.to_string(),
        };

        if let Some(folder) = fields.get("folder").and_then(Value::as_str) {
            if !folder.is_empty() {
                config.destination_folder = folder.to_string();
            }
        }
        if let Some(format) = fields.get("format").and_then(Value::as_str) {
            if !format.trim().is_empty() {
                config.id_format = format.to_string();
            }
        }

        if config.destination_folder.is_empty() {
            tracing::error!(path = %source.display(), ?config, "companion config has no destination folder");
            return Err(ConfigError::MissingDestination {
                path: source.display().to_string(),
            });
        }

        Ok(config)
    }
}

/// Absolute path of the companion config for a vault.
#[must_use]
pub fn companion_config_path(vault_root: &Path) -> PathBuf {
    vault_root.join(COMPANION_CONFIG_PATH)
}

/// Parse raw companion config text read from `source`.
///
/// # Errors
///
/// Returns [`ConfigError::LoadFailure`] if `raw` is not valid JSON, and
/// anything [`ExternalConfig::merge`] returns.
pub fn parse_external_config(source: &Path, raw: &str) -> Result<ExternalConfig, ConfigError> {
    let loaded: Value = serde_json::from_str(raw).map_err(|e| {
        tracing::error!(path = %source.display(), error = %e, "companion config is not valid JSON");
        ConfigError::LoadFailure {
            path: source.display().to_string(),
            reason: e.to_string(),
        }
    })?;
    ExternalConfig::merge(source, &loaded)
}
