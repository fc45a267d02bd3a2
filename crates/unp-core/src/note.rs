//! Notes and folders as seen by the converter.
//!
//! Paths are always relative to the vault root. The vault owns these
//! records; the converter only reads them and gets a fresh [`NoteRef`]
//! back after a rename.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

/// The folder a note lives in. The vault root has an empty name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentFolder {
    pub name: String,
    pub path: PathBuf,
}

impl ParentFolder {
    /// Parent record for a vault-relative path.
    #[must_use]
    pub fn of(path: &Path) -> Self {
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        Self {
            name: file_name(parent),
            path: parent.to_path_buf(),
        }
    }
}

/// A single note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRef {
    pub path: PathBuf,
    /// File name including the extension.
    pub name: String,
    /// Creation time, if the vault could determine one.
    pub created: Option<DateTime<Local>>,
    pub parent: Option<ParentFolder>,
}

impl NoteRef {
    /// Build a note record from its vault-relative path, deriving the
    /// name and parent folder from the path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, created: Option<DateTime<Local>>) -> Self {
        let path = path.into();
        Self {
            name: file_name(&path),
            parent: Some(ParentFolder::of(&path)),
            created,
            path,
        }
    }
}

/// A folder and its children in on-disk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRef {
    pub name: String,
    pub path: PathBuf,
    pub children: Vec<Entry>,
}

impl FolderRef {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, children: Vec<Entry>) -> Self {
        let path = path.into();
        Self {
            name: file_name(&path),
            path,
            children,
        }
    }
}

/// Anything the vault can hand out: a note or a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Note(NoteRef),
    Folder(FolderRef),
}

impl Entry {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Entry::Note(note) => &note.path,
            Entry::Folder(folder) => &folder.path,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Entry::Note(note) => &note.name,
            Entry::Folder(folder) => &folder.name,
        }
    }
}

/// Outcome of converting one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedNote {
    pub from: PathBuf,
    pub to: PathBuf,
    /// Folder tag applied to the note, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
