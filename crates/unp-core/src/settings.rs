//! The plugin's own persisted settings.
//!
//! Stored as JSON in the editor's per-plugin data file:
//! ```json
//! { "recursiveFolders": false, "folderAsTag": true, "tagPlacement": "frontmatter" }
//! ```
//! Loading merges whatever is persisted over [`PluginSettings::default`]
//! field by field; saving always writes the full record.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Plugin identifier, used for the settings directory name.
pub const PLUGIN_ID: &str = "unique-note-plus";

/// Where a folder tag goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagPlacement {
    /// Merged into the `tags` list of the note's front matter.
    Frontmatter,
    /// Appended as `#tag` at the end of the note body.
    #[default]
    Append,
}

impl fmt::Display for TagPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagPlacement::Frontmatter => f.write_str("frontmatter"),
            TagPlacement::Append => f.write_str("append"),
        }
    }
}

impl FromStr for TagPlacement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "frontmatter" => Ok(TagPlacement::Frontmatter),
            "append" => Ok(TagPlacement::Append),
            other => Err(format!(
                "unknown tag placement '{other}': expected 'frontmatter' or 'append'"
            )),
        }
    }
}

/// Conversion behaviour chosen by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSettings {
    /// Descend into sub-folders when converting a folder.
    pub recursive_folders: bool,
    /// Tag converted notes with their folder's name.
    pub folder_as_tag: bool,
    pub tag_placement: TagPlacement,
}

/// Persisted settings as found on disk; every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialSettings {
    pub recursive_folders: Option<bool>,
    pub folder_as_tag: Option<bool>,
    pub tag_placement: Option<TagPlacement>,
}

impl PluginSettings {
    /// Fill every field missing from `persisted` with its default.
    #[must_use]
    pub fn merged(persisted: Option<PartialSettings>) -> Self {
        let defaults = Self::default();
        let Some(persisted) = persisted else {
            return defaults;
        };
        Self {
            recursive_folders: persisted
                .recursive_folders
                .unwrap_or(defaults.recursive_folders),
            folder_as_tag: persisted.folder_as_tag.unwrap_or(defaults.folder_as_tag),
            tag_placement: persisted.tag_placement.unwrap_or(defaults.tag_placement),
        }
    }
}

/// Loads and saves [`PluginSettings`] at a fixed path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<vault>/.obsidian/plugins/unique-note-plus/data.json`.
    #[must_use]
    pub fn for_vault(vault_root: &Path) -> Self {
        Self::new(
            vault_root
                .join(".obsidian")
                .join("plugins")
                .join(PLUGIN_ID)
                .join("data.json"),
        )
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, merged over defaults. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Read`] if the file exists but cannot be read
    /// and [`SettingsError::Malformed`] if its JSON has the wrong shape.
    pub fn load(&self) -> Result<PluginSettings, SettingsError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no persisted settings, using defaults");
                return Ok(PluginSettings::default());
            }
            Err(e) => {
                return Err(SettingsError::Read {
                    path: self.path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };

        if raw.trim().is_empty() {
            return Ok(PluginSettings::default());
        }

        let persisted: Option<PartialSettings> =
            serde_json::from_str(&raw).map_err(|e| SettingsError::Malformed {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(PluginSettings::merged(persisted))
    }

    /// Persist the full settings record.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Write`] if the file or its directory cannot
    /// be written.
    pub fn save(&self, settings: &PluginSettings) -> Result<(), SettingsError> {
        let write_err = |reason: String| SettingsError::Write {
            path: self.path.display().to_string(),
            reason,
        };

        let json = serde_json::to_string_pretty(settings).map_err(|e| write_err(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        std::fs::write(&self.path, json).map_err(|e| write_err(e.to_string()))?;

        tracing::debug!(path = %self.path.display(), ?settings, "saved settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = PluginSettings::default();
        assert!(!settings.recursive_folders);
        assert!(!settings.folder_as_tag);
        assert_eq!(settings.tag_placement, TagPlacement::Append);
    }

    #[test]
    fn merge_overrides_only_present_fields() {
        let persisted: PartialSettings =
            serde_json::from_str(r#"{ "folderAsTag": true, "somethingElse": 3 }"#).unwrap();
        let settings = PluginSettings::merged(Some(persisted));
        assert!(settings.folder_as_tag);
        assert!(!settings.recursive_folders);
        assert_eq!(settings.tag_placement, TagPlacement::Append);
    }

    #[test]
    fn tag_placement_wire_format_is_lowercase() {
        let json = serde_json::to_string(&TagPlacement::Frontmatter).unwrap();
        assert_eq!(json, "\"frontmatter\"");
        let json = serde_json::to_value(PluginSettings::default()).unwrap();
        assert_eq!(json["tagPlacement"], "append");
        assert_eq!(json["recursiveFolders"], false);
    }

    #[test]
    fn tag_placement_parses_from_cli_text() {
        assert_eq!("Frontmatter".parse::<TagPlacement>(), Ok(TagPlacement::Frontmatter));
        assert_eq!("append".parse::<TagPlacement>(), Ok(TagPlacement::Append));
        assert!("footer".parse::<TagPlacement>().is_err());
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::for_vault(dir.path());
        assert_eq!(store.load().unwrap(), PluginSettings::default());
    }

    #[test]
    fn load_null_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("data.json"));
        std::fs::write(store.path(), "null").unwrap();
        assert_eq!(store.load().unwrap(), PluginSettings::default());
    }

    #[test]
    fn save_then_load_returns_saved_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::for_vault(dir.path());
        let settings = PluginSettings {
            recursive_folders: true,
            folder_as_tag: true,
            tag_placement: TagPlacement::Frontmatter,
        };

        store.save(&settings).unwrap();
        assert!(store.path().ends_with("plugins/unique-note-plus/data.json"));
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn load_rejects_wrong_shape() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("data.json"));
        std::fs::write(store.path(), r#"{ "tagPlacement": "footer" }"#).unwrap();
        assert!(matches!(store.load(), Err(SettingsError::Malformed { .. })));
    }
}
