//! Collaborators the converter needs from its host.
//!
//! The converter never touches files or the user directly; it goes
//! through a [`Vault`] for note I/O and a [`Notifier`] for user-facing
//! messages. Every vault call is an await point, so a batch conversion
//! yields to the runtime between steps.

use std::path::Path;

use async_trait::async_trait;
use unp_core::external::{companion_config_path, parse_external_config};
use unp_core::{frontmatter, ConfigError, Entry, ExternalConfig, NoteRef};

use crate::error::VaultError;

/// Note storage as exposed by the host.
#[async_trait]
pub trait Vault: Send + Sync {
    /// Absolute vault root.
    fn root(&self) -> &Path;

    /// The note the user currently has open, if any.
    async fn active_note(&self) -> Result<Option<NoteRef>, VaultError>;

    /// Resolve a vault-relative path to a note or a folder tree.
    async fn entry(&self, path: &Path) -> Result<Entry, VaultError>;

    async fn read(&self, note: &NoteRef) -> Result<String, VaultError>;

    async fn write(&self, note: &NoteRef, content: &str) -> Result<(), VaultError>;

    async fn append(&self, note: &NoteRef, text: &str) -> Result<(), VaultError>;

    /// Move a note to the vault-relative path `to`, returning its new
    /// record. Fails with [`VaultError::TargetExists`] if `to` is taken.
    async fn rename(&self, note: &NoteRef, to: &Path) -> Result<NoteRef, VaultError>;

    /// Read the companion unique-note config from the vault's config dir.
    async fn external_config(&self) -> Result<ExternalConfig, ConfigError> {
        let path = companion_config_path(self.root());
        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to read companion config");
            ConfigError::LoadFailure {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        parse_external_config(&path, &raw)
    }

    /// Merge `tag` into the note's front matter tag list.
    ///
    /// Returns `false` when the tag was already there and the note was
    /// left untouched.
    async fn add_front_matter_tag(&self, note: &NoteRef, tag: &str) -> Result<bool, VaultError> {
        let content = self.read(note).await?;
        let updated = frontmatter::add_tag(&content, tag).map_err(|source| {
            VaultError::Frontmatter {
                path: note.path.clone(),
                source,
            }
        })?;
        match updated {
            Some(updated) => {
                self.write(note, &updated).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A short, non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Surfaces [`Notice`]s to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}
