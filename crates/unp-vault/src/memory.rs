//! In-memory collaborators for tests and embedding.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use unp_core::external::{companion_config_path, parse_external_config};
use unp_core::{ConfigError, Entry, ExternalConfig, FolderRef, NoteRef};

use crate::error::VaultError;
use crate::host::{Notice, Notifier, Vault};

#[derive(Debug, Clone)]
struct StoredNote {
    content: String,
    created: Option<DateTime<Local>>,
}

#[derive(Debug, Default)]
struct State {
    notes: BTreeMap<PathBuf, StoredNote>,
    folders: BTreeSet<PathBuf>,
    active: Option<PathBuf>,
    companion_config: Option<String>,
    renames: Vec<(PathBuf, PathBuf)>,
}

/// A vault that lives entirely in memory.
///
/// Folders are implied by the notes added to them; empty folders can be
/// added explicitly. Children list in name order, like [`FsVault`].
///
/// [`FsVault`]: crate::FsVault
#[derive(Debug)]
pub struct MemoryVault {
    root: PathBuf,
    state: Mutex<State>,
}

impl Default for MemoryVault {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVault {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/vault"),
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the raw companion config JSON. `None` behaves like a missing file.
    pub fn set_companion_config(&self, raw: Option<&str>) {
        self.state().companion_config = raw.map(str::to_string);
    }

    pub fn add_note(&self, path: impl Into<PathBuf>, content: &str, created: Option<DateTime<Local>>) {
        let path = path.into();
        let mut state = self.state();
        let mut ancestor = path.parent();
        while let Some(folder) = ancestor.filter(|p| !p.as_os_str().is_empty()) {
            state.folders.insert(folder.to_path_buf());
            ancestor = folder.parent();
        }
        state.notes.insert(
            path,
            StoredNote {
                content: content.to_string(),
                created,
            },
        );
    }

    pub fn add_folder(&self, path: impl Into<PathBuf>) {
        self.state().folders.insert(path.into());
    }

    pub fn set_active(&self, path: Option<&Path>) {
        self.state().active = path.map(Path::to_path_buf);
    }

    /// Current content of the note at `path`.
    #[must_use]
    pub fn content(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state().notes.get(path.as_ref()).map(|n| n.content.clone())
    }

    #[must_use]
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.state().notes.contains_key(path.as_ref())
    }

    /// Every successful rename so far, oldest first.
    #[must_use]
    pub fn renames(&self) -> Vec<(PathBuf, PathBuf)> {
        self.state().renames.clone()
    }

    fn note_ref(state: &State, path: &Path) -> Option<NoteRef> {
        state
            .notes
            .get(path)
            .map(|stored| NoteRef::new(path, stored.created))
    }

    fn folder(state: &State, path: &Path) -> FolderRef {
        let mut children: Vec<Entry> = Vec::new();
        for folder in state.folders.iter().filter(|f| f.parent() == Some(path)) {
            children.push(Entry::Folder(Self::folder(state, folder)));
        }
        for (note, stored) in state.notes.iter().filter(|(n, _)| n.parent() == Some(path)) {
            children.push(Entry::Note(NoteRef::new(note.as_path(), stored.created)));
        }
        children.sort_by(|a, b| a.name().cmp(b.name()));
        FolderRef::new(path, children)
    }
}

#[async_trait]
impl Vault for MemoryVault {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn active_note(&self) -> Result<Option<NoteRef>, VaultError> {
        let state = self.state();
        Ok(state
            .active
            .as_deref()
            .and_then(|path| Self::note_ref(&state, path)))
    }

    async fn entry(&self, path: &Path) -> Result<Entry, VaultError> {
        let state = self.state();
        if let Some(note) = Self::note_ref(&state, path) {
            return Ok(Entry::Note(note));
        }
        if path.as_os_str().is_empty() || state.folders.contains(path) {
            return Ok(Entry::Folder(Self::folder(&state, path)));
        }
        Err(VaultError::NotFound(path.to_path_buf()))
    }

    async fn external_config(&self) -> Result<ExternalConfig, ConfigError> {
        let source = companion_config_path(&self.root);
        match self.state().companion_config.clone() {
            Some(raw) => parse_external_config(&source, &raw),
            None => Err(ConfigError::LoadFailure {
                path: source.display().to_string(),
                reason: "file not found".to_string(),
            }),
        }
    }

    async fn read(&self, note: &NoteRef) -> Result<String, VaultError> {
        self.content(&note.path)
            .ok_or_else(|| VaultError::NotFound(note.path.clone()))
    }

    async fn write(&self, note: &NoteRef, content: &str) -> Result<(), VaultError> {
        let mut state = self.state();
        let stored = state
            .notes
            .get_mut(&note.path)
            .ok_or_else(|| VaultError::NotFound(note.path.clone()))?;
        stored.content = content.to_string();
        Ok(())
    }

    async fn append(&self, note: &NoteRef, text: &str) -> Result<(), VaultError> {
        let mut state = self.state();
        let stored = state
            .notes
            .get_mut(&note.path)
            .ok_or_else(|| VaultError::NotFound(note.path.clone()))?;
        stored.content.push_str(text);
        Ok(())
    }

    async fn rename(&self, note: &NoteRef, to: &Path) -> Result<NoteRef, VaultError> {
        let mut state = self.state();
        if state.notes.contains_key(to) {
            return Err(VaultError::TargetExists(to.to_path_buf()));
        }
        let stored = state
            .notes
            .remove(&note.path)
            .ok_or_else(|| VaultError::NotFound(note.path.clone()))?;
        let created = stored.created;
        state.notes.insert(to.to_path_buf(), stored);
        let mut ancestor = to.parent();
        while let Some(folder) = ancestor.filter(|p| !p.as_os_str().is_empty()) {
            state.folders.insert(folder.to_path_buf());
            ancestor = folder.parent();
        }
        state.renames.push((note.path.clone(), to.to_path_buf()));
        Ok(NoteRef::new(to, created))
    }
}

/// A [`Notifier`] that keeps every notice it receives.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
