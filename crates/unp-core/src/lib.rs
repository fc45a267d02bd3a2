//! # unp-core
//!
//! Core types and rules for Unique Note Plus.
//!
//! This crate holds everything that does not need a live vault:
//! - Note model ([`NoteRef`], [`FolderRef`], [`Entry`], [`RenamedNote`])
//! - Slug generation for folder tags ([`slugify`])
//! - Moment-style note ID formats ([`IdFormat`])
//! - The companion unique-note config ([`ExternalConfig`])
//! - Plugin settings and their store ([`PluginSettings`], [`SettingsStore`])
//! - Front matter tag merging ([`frontmatter`])
//! - Error hierarchy ([`ConfigError`], [`SettingsError`], [`FrontmatterError`])

pub mod error;
pub mod external;
pub mod frontmatter;
pub mod idformat;
pub mod note;
pub mod settings;
pub mod slug;

pub use error::{ConfigError, FrontmatterError, SettingsError};
pub use external::ExternalConfig;
pub use idformat::{IdFormat, DEFAULT_ID_FORMAT};
pub use note::{Entry, FolderRef, NoteRef, ParentFolder, RenamedNote};
pub use settings::{PluginSettings, SettingsStore, TagPlacement};
pub use slug::slugify;
