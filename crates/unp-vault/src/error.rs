//! Error types for vault access and note conversion.

use std::path::PathBuf;

use thiserror::Error;
use unp_core::{ConfigError, FrontmatterError};

/// Failures reported by a [`Vault`](crate::Vault) implementation.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("no such note or folder: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a markdown note: {}", .0.display())]
    NotANote(PathBuf),

    #[error("path is outside the vault: {}", .0.display())]
    OutsideVault(PathBuf),

    #[error("destination already exists: {}", .0.display())]
    TargetExists(PathBuf),

    #[error("front matter of {} could not be updated: {source}", .path.display())]
    Frontmatter {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl VaultError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return VaultError::NotFound(path.into());
        }
        VaultError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures of a single note conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("cannot convert: no {0}")]
    MissingMetadata(&'static str),

    #[error("unique note settings unavailable: {0}")]
    ConfigUnavailable(#[from] ConfigError),

    #[error("cannot rename {} to {}: destination already exists", .from.display(), .to.display())]
    TargetExists { from: PathBuf, to: PathBuf },

    #[error(transparent)]
    Vault(#[from] VaultError),
}
