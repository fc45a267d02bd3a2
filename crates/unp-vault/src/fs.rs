//! A vault backed by a directory on disk.
//!
//! Layout conventions follow the editor the vault belongs to:
//! - notes are `.md` files; other files are not notes
//! - hidden entries (`.obsidian`, `.trash`, dotfiles) are never listed
//! - the open note is the first existing entry of `lastOpenFiles` in
//!   `.obsidian/workspace.json`
//!
//! Folder children are listed in name order so batch conversions are
//! reproducible.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use unp_core::{Entry, FolderRef, NoteRef};
use walkdir::{DirEntry, WalkDir};

use crate::error::VaultError;
use crate::host::Vault;

const WORKSPACE_PATH: &str = ".obsidian/workspace.json";

/// The slice of the editor's workspace state used to find the open note.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkspaceState {
    #[serde(default)]
    last_open_files: Vec<String>,
}

/// A vault rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    /// Open the vault at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotFound`] if `root` is not an existing
    /// directory.
    pub fn open(root: &Path) -> Result<Self, VaultError> {
        let root = root.canonicalize().map_err(|e| VaultError::io(root, e))?;
        if !root.is_dir() {
            return Err(VaultError::NotFound(root));
        }
        tracing::debug!(root = %root.display(), "opened vault");
        Ok(Self { root })
    }

    /// Normalise a user-supplied path to a vault-relative one.
    ///
    /// Absolute paths must point inside the vault; relative paths may not
    /// climb out of it.
    fn relative(&self, path: &Path) -> Result<PathBuf, VaultError> {
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.root)
                .map_err(|_| VaultError::OutsideVault(path.to_path_buf()))?
        } else {
            path
        };

        let mut clean = PathBuf::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => clean.push(part),
                Component::CurDir => {}
                _ => return Err(VaultError::OutsideVault(path.to_path_buf())),
            }
        }
        Ok(clean)
    }

    fn absolute(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Look up a note by path, rejecting folders and non-markdown files.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotANote`] for anything that is not a note.
    pub async fn note(&self, path: &Path) -> Result<NoteRef, VaultError> {
        match self.entry(path).await? {
            Entry::Note(note) => Ok(note),
            Entry::Folder(folder) => Err(VaultError::NotANote(folder.path)),
        }
    }

    async fn note_ref(&self, relative: &Path) -> Result<NoteRef, VaultError> {
        let absolute = self.absolute(relative);
        let metadata = tokio::fs::metadata(&absolute)
            .await
            .map_err(|e| VaultError::io(relative, e))?;

        Ok(NoteRef::new(relative, created_at(&metadata)))
    }

    /// Load `relative` and everything below it as a folder tree.
    ///
    /// The walk runs on the blocking pool. Entries arrive in pre-order with
    /// siblings sorted by name, so the tree is assembled with a stack of
    /// open folders.
    async fn load_folder(&self, relative: &Path) -> Result<FolderRef, VaultError> {
        let root = self.root.clone();
        let relative = relative.to_path_buf();
        let folder = relative.clone();
        tokio::task::spawn_blocking(move || walk_folder(&root, &relative))
            .await
            .map_err(|e| VaultError::io(folder, std::io::Error::other(e.to_string())))?
    }
}

fn walk_folder(root: &Path, relative: &Path) -> Result<FolderRef, VaultError> {
    let walker = WalkDir::new(root.join(relative))
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        // Depth 0 is the requested folder itself, which may sit under a dot-dir
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    // open[0] is the requested folder; deeper entries are its open descendants
    let mut open = vec![FolderRef::new(relative, Vec::new())];
    for entry in walker {
        let entry = entry.map_err(|e| VaultError::io(relative, e.into()))?;
        let child = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| VaultError::OutsideVault(entry.path().to_path_buf()))?
            .to_path_buf();

        close_folders(&mut open, entry.depth());
        if entry.file_type().is_dir() {
            open.push(FolderRef::new(child, Vec::new()));
        } else if is_markdown(&child) {
            let metadata = entry.metadata().map_err(|e| VaultError::io(&child, e.into()))?;
            let note = NoteRef::new(child, created_at(&metadata));
            if let Some(parent) = open.last_mut() {
                parent.children.push(Entry::Note(note));
            }
        } else {
            tracing::trace!(path = %child.display(), "skipping non-note file");
        }
    }

    close_folders(&mut open, 1);
    open.pop().ok_or_else(|| VaultError::NotFound(relative.to_path_buf()))
}

/// Fold open folders into their parents until only `depth` remain.
fn close_folders(open: &mut Vec<FolderRef>, depth: usize) {
    while open.len() > depth {
        let Some(done) = open.pop() else { return };
        match open.last_mut() {
            Some(parent) => parent.children.push(Entry::Folder(done)),
            None => {
                open.push(done);
                return;
            }
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

// Birth time is not reported everywhere; fall back to mtime.
fn created_at(metadata: &std::fs::Metadata) -> Option<DateTime<Local>> {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .ok()
        .map(DateTime::<Local>::from)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md"))
}

#[async_trait]
impl Vault for FsVault {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn active_note(&self) -> Result<Option<NoteRef>, VaultError> {
        let path = self.absolute(Path::new(WORKSPACE_PATH));
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(VaultError::io(WORKSPACE_PATH, e)),
        };

        let workspace: WorkspaceState = match serde_json::from_str(&raw) {
            Ok(workspace) => workspace,
            Err(e) => {
                tracing::warn!(error = %e, "workspace state is unreadable, no active note");
                return Ok(None);
            }
        };

        for candidate in &workspace.last_open_files {
            let Ok(relative) = self.relative(Path::new(candidate)) else {
                continue;
            };
            if is_markdown(&relative) && tokio::fs::metadata(self.absolute(&relative)).await.is_ok() {
                return self.note_ref(&relative).await.map(Some);
            }
        }
        Ok(None)
    }

    async fn entry(&self, path: &Path) -> Result<Entry, VaultError> {
        let relative = self.relative(path)?;
        let metadata = tokio::fs::metadata(self.absolute(&relative))
            .await
            .map_err(|e| VaultError::io(&relative, e))?;

        if metadata.is_dir() {
            Ok(Entry::Folder(self.load_folder(&relative).await?))
        } else if is_markdown(&relative) {
            Ok(Entry::Note(self.note_ref(&relative).await?))
        } else {
            Err(VaultError::NotANote(relative))
        }
    }

    async fn read(&self, note: &NoteRef) -> Result<String, VaultError> {
        tokio::fs::read_to_string(self.absolute(&note.path))
            .await
            .map_err(|e| VaultError::io(&note.path, e))
    }

    async fn write(&self, note: &NoteRef, content: &str) -> Result<(), VaultError> {
        tokio::fs::write(self.absolute(&note.path), content)
            .await
            .map_err(|e| VaultError::io(&note.path, e))
    }

    async fn append(&self, note: &NoteRef, text: &str) -> Result<(), VaultError> {
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(self.absolute(&note.path))
            .await
            .map_err(|e| VaultError::io(&note.path, e))?;
        file.write_all(text.as_bytes())
            .await
            .map_err(|e| VaultError::io(&note.path, e))?;
        file.flush().await.map_err(|e| VaultError::io(&note.path, e))
    }

    async fn rename(&self, note: &NoteRef, to: &Path) -> Result<NoteRef, VaultError> {
        let target = self.relative(to)?;
        let absolute_target = self.absolute(&target);

        if tokio::fs::try_exists(&absolute_target)
            .await
            .map_err(|e| VaultError::io(&target, e))?
        {
            return Err(VaultError::TargetExists(target));
        }
        if let Some(parent) = absolute_target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| VaultError::io(&target, e))?;
        }
        tokio::fs::rename(self.absolute(&note.path), &absolute_target)
            .await
            .map_err(|e| VaultError::io(&note.path, e))?;

        tracing::debug!(from = %note.path.display(), to = %target.display(), "renamed note");
        Ok(NoteRef {
            created: note.created,
            ..NoteRef::new(target, None)
        })
    }
}
