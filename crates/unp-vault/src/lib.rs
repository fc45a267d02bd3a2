//! # unp-vault
//!
//! The vault side of Unique Note Plus.
//!
//! The vault directory is the source of truth; nothing is cached between
//! requests. This crate provides:
//! - Host collaborator traits ([`Vault`], [`Notifier`])
//! - [`FsVault`], a vault backed by a directory on disk
//! - [`MemoryVault`], an in-memory vault for tests
//! - Folder traversal ([`traversal::expand`])
//! - The unique-note workflow ([`Converter`])

pub mod converter;
pub mod error;
pub mod fs;
pub mod host;
pub mod memory;
pub mod traversal;

pub use converter::{BatchReport, Converter, FailedNote, Outcome};
pub use error::{ConvertError, VaultError};
pub use fs::FsVault;
pub use host::{Notice, NoticeLevel, Notifier, Vault};
pub use memory::{MemoryVault, RecordingNotifier};
