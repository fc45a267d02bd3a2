//! Folder traversal for batch conversion.

use unp_core::{Entry, FolderRef, NoteRef};

/// Collect the notes of `folder` in the order they will be converted.
///
/// Direct children are visited in their listed order. Sub-folders are
/// descended into depth-first, in place, only when `recursive` is set;
/// otherwise they are skipped along with everything inside them.
#[must_use]
pub fn expand(folder: &FolderRef, recursive: bool) -> Vec<NoteRef> {
    let mut notes = Vec::new();
    collect(folder, recursive, &mut notes);
    notes
}

fn collect(folder: &FolderRef, recursive: bool, notes: &mut Vec<NoteRef>) {
    for child in &folder.children {
        match child {
            Entry::Note(note) => notes.push(note.clone()),
            Entry::Folder(sub) if recursive => collect(sub, recursive, notes),
            Entry::Folder(_) => {}
        }
    }
}
