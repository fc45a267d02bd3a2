//! Error types for Unique Note Plus.

use thiserror::Error;

/// Errors raised while loading the companion unique-note config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load unique note settings from {path}: {reason}")]
    LoadFailure { path: String, reason: String },

    #[error("unique note settings in {path} do not name a destination folder")]
    MissingDestination { path: String },
}

/// Errors raised by the plugin's own settings store.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("malformed settings in {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("failed to write settings to {path}: {reason}")]
    Write { path: String, reason: String },
}

/// Errors raised while reading or rewriting a note's front matter.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("front matter is not valid YAML: {0}")]
    InvalidYaml(String),

    #[error("front matter must be a mapping, found {0}")]
    NotAMapping(&'static str),

    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_display_human_readable_messages() {
        let err = ConfigError::MissingDestination {
            path: ".obsidian/zk-prefixer.json".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("destination folder"));
        assert!(msg.contains("zk-prefixer.json"));

        let err = SettingsError::Malformed {
            path: "data.json".to_string(),
            reason: "expected a boolean".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("data.json"));
        assert!(msg.contains("boolean"));
    }
}
