//! The unique-note workflow.
//!
//! Converting a note means:
//! 1. resolving its name and creation time,
//! 2. loading the companion config (destination folder + ID format),
//! 3. optionally tagging it with its folder's slug,
//! 4. renaming it to `{destination}/{id} {name}`.
//!
//! Tagging happens before the rename and is not undone if the rename
//! fails; such a note stays tagged under its old name.

use std::path::{Path, PathBuf};

use serde::Serialize;
use unp_core::{
    slugify, Entry, ExternalConfig, FolderRef, NoteRef, PluginSettings, RenamedNote, TagPlacement,
};

use crate::error::{ConvertError, VaultError};
use crate::host::{Notice, Notifier, Vault};
use crate::traversal;

const CONFIG_NOTICE: &str = "Failed to load Unique Notes settings, check logs for details";

/// A note that could not be converted as part of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedNote {
    pub path: PathBuf,
    pub error: String,
}

/// Result of converting every note under a folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub converted: Vec<RenamedNote>,
    pub failed: Vec<FailedNote>,
}

impl BatchReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// What converting an [`Entry`] produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Note(RenamedNote),
    Folder(BatchReport),
}

/// Converts notes using one settings snapshot.
pub struct Converter<'a, V: Vault + ?Sized, N: Notifier + ?Sized> {
    vault: &'a V,
    notifier: &'a N,
    settings: PluginSettings,
}

impl<'a, V: Vault + ?Sized, N: Notifier + ?Sized> Converter<'a, V, N> {
    pub fn new(vault: &'a V, notifier: &'a N, settings: PluginSettings) -> Self {
        Self {
            vault,
            notifier,
            settings,
        }
    }

    /// Look up the note or folder at `path`.
    ///
    /// Failures are reported to the notifier before being returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Vault`] when nothing convertible lives at
    /// `path`.
    pub async fn resolve(&self, path: &Path) -> Result<Entry, ConvertError> {
        let result = self.vault.entry(path).await.map_err(ConvertError::from);
        if let Err(err) = &result {
            self.report_failure(err);
        }
        result
    }

    /// Convert `note`, or the vault's active note when `None`.
    ///
    /// Failures are reported to the notifier before being returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::MissingMetadata`] when there is no note or it
    /// lacks a name or creation time, [`ConvertError::ConfigUnavailable`]
    /// when the companion config cannot be loaded, and
    /// [`ConvertError::TargetExists`] when the new name is already taken.
    pub async fn convert(&self, note: Option<NoteRef>) -> Result<RenamedNote, ConvertError> {
        let result = self.resolve_and_convert(note).await;
        if let Err(err) = &result {
            self.report_failure(err);
        }
        result
    }

    async fn resolve_and_convert(&self, note: Option<NoteRef>) -> Result<RenamedNote, ConvertError> {
        let note = match note {
            Some(note) => note,
            None => self
                .vault
                .active_note()
                .await?
                .ok_or(ConvertError::MissingMetadata("active note"))?,
        };
        check_metadata(&note)?;

        let config = self.vault.external_config().await?;
        self.convert_with(&note, &config).await
    }

    /// Convert one note against an already loaded companion config.
    ///
    /// Does not notify; callers decide how failures surface.
    ///
    /// # Errors
    ///
    /// See [`Converter::convert`].
    pub async fn convert_with(
        &self,
        note: &NoteRef,
        config: &ExternalConfig,
    ) -> Result<RenamedNote, ConvertError> {
        let created = check_metadata(note)?;
        let new_name = format!("{} {}", config.id_format().render(&created), note.name);
        let target = destination(config).join(&new_name);

        let tag = self.folder_tag(note);
        if let Some(tag) = &tag {
            self.apply_tag(note, tag).await?;
        }

        let renamed = match self.vault.rename(note, &target).await {
            Ok(renamed) => renamed,
            Err(err) => {
                if tag.is_some() {
                    tracing::warn!(path = %note.path.display(), "note was tagged but could not be renamed");
                }
                return Err(match err {
                    VaultError::TargetExists(to) => ConvertError::TargetExists {
                        from: note.path.clone(),
                        to,
                    },
                    other => other.into(),
                });
            }
        };

        tracing::info!(from = %note.path.display(), to = %renamed.path.display(), ?tag, "converted note");
        Ok(RenamedNote {
            from: note.path.clone(),
            to: renamed.path,
            tag,
        })
    }

    /// Convert every note under `folder`, one at a time.
    ///
    /// The companion config is loaded once for the whole batch; if that
    /// fails nothing is touched. A failing note does not stop the batch:
    /// it is recorded in the report and the next note is converted. One
    /// summary notice is sent at the end.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::ConfigUnavailable`] if the companion config
    /// cannot be loaded.
    pub async fn convert_folder(&self, folder: &FolderRef) -> Result<BatchReport, ConvertError> {
        let config = match self.vault.external_config().await {
            Ok(config) => config,
            Err(err) => {
                let err = ConvertError::from(err);
                self.report_failure(&err);
                return Err(err);
            }
        };

        let notes = traversal::expand(folder, self.settings.recursive_folders);
        tracing::info!(
            folder = %folder.path.display(),
            count = notes.len(),
            recursive = self.settings.recursive_folders,
            "converting folder"
        );

        let mut report = BatchReport::default();
        for note in &notes {
            match self.convert_with(note, &config).await {
                Ok(renamed) => report.converted.push(renamed),
                Err(err) => {
                    tracing::error!(path = %note.path.display(), error = %err, "failed to convert note");
                    report.failed.push(FailedNote {
                        path: note.path.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        self.notifier.notify(batch_notice(folder, &report));
        Ok(report)
    }

    /// Convert whatever `entry` is: a single note or a whole folder.
    ///
    /// # Errors
    ///
    /// See [`Converter::convert`] and [`Converter::convert_folder`].
    pub async fn convert_entry(&self, entry: Entry) -> Result<Outcome, ConvertError> {
        match entry {
            Entry::Note(note) => self.convert(Some(note)).await.map(Outcome::Note),
            Entry::Folder(folder) => self.convert_folder(&folder).await.map(Outcome::Folder),
        }
    }

    fn folder_tag(&self, note: &NoteRef) -> Option<String> {
        if !self.settings.folder_as_tag {
            return None;
        }
        let tag = note
            .parent
            .as_ref()
            .map(|parent| slugify(&parent.name))
            .unwrap_or_default();
        if tag.is_empty() {
            tracing::debug!(path = %note.path.display(), "folder name has no taggable characters");
            return None;
        }
        Some(tag)
    }

    async fn apply_tag(&self, note: &NoteRef, tag: &str) -> Result<(), ConvertError> {
        match self.settings.tag_placement {
            TagPlacement::Frontmatter => {
                let added = self.vault.add_front_matter_tag(note, tag).await?;
                if !added {
                    tracing::debug!(path = %note.path.display(), tag, "front matter already has tag");
                }
            }
            // Appending is not deduplicated: converting twice appends twice.
            TagPlacement::Append => self.vault.append(note, &format!("\n\n#{tag}")).await?,
        }
        Ok(())
    }

    fn report_failure(&self, err: &ConvertError) {
        tracing::error!(error = %err, "conversion failed");
        let message = match err {
            ConvertError::MissingMetadata(_) | ConvertError::ConfigUnavailable(_) => {
                CONFIG_NOTICE.to_string()
            }
            other => format!("Failed to convert to unique note: {other}"),
        };
        self.notifier.notify(Notice::error(message));
    }
}

fn check_metadata(note: &NoteRef) -> Result<chrono::DateTime<chrono::Local>, ConvertError> {
    if note.name.is_empty() {
        return Err(ConvertError::MissingMetadata("note name"));
    }
    note.created
        .ok_or(ConvertError::MissingMetadata("creation time"))
}

/// Destination folder as a vault-relative path.
fn destination(config: &ExternalConfig) -> &Path {
    Path::new(config.destination_folder.trim_matches('/'))
}

fn batch_notice(folder: &FolderRef, report: &BatchReport) -> Notice {
    let label = if folder.name.is_empty() {
        "vault root".to_string()
    } else {
        folder.name.clone()
    };
    if report.is_success() {
        return Notice::info(format!(
            "Converted {} notes in {label} to unique notes",
            report.converted.len()
        ));
    }
    let failed: Vec<String> = report
        .failed
        .iter()
        .map(|f| f.path.display().to_string())
        .collect();
    Notice::error(format!(
        "Converted {} notes in {label}; {} failed: {}",
        report.converted.len(),
        report.failed.len(),
        failed.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Local, TimeZone};
    use unp_core::frontmatter;

    use crate::host::NoticeLevel;
    use crate::memory::{MemoryVault, RecordingNotifier};

    const ZETTEL: &str = r#"{ "folder": "Zettel", "format": "" }"#;

    fn created() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    }

    fn settings(folder_as_tag: bool, tag_placement: TagPlacement) -> PluginSettings {
        PluginSettings {
            recursive_folders: false,
            folder_as_tag,
            tag_placement,
        }
    }

    fn vault_with_ideas(content: &str) -> MemoryVault {
        let vault = MemoryVault::new();
        vault.set_companion_config(Some(ZETTEL));
        vault.add_note("My Projects/Ideas.md", content, Some(created()));
        vault
    }

    #[tokio::test]
    async fn append_tag_and_rename() {
        let vault = vault_with_ideas("Some idea.");
        let notifier = RecordingNotifier::default();
        let converter = Converter::new(&vault, &notifier, settings(true, TagPlacement::Append));

        let note = NoteRef::new("My Projects/Ideas.md", Some(created()));
        let renamed = converter.convert(Some(note)).await.unwrap();

        assert_eq!(renamed.to, PathBuf::from("Zettel/202401151030 Ideas.md"));
        assert_eq!(renamed.tag.as_deref(), Some("my-projects"));
        assert!(!vault.contains("My Projects/Ideas.md"));
        let content = vault.content("Zettel/202401151030 Ideas.md").unwrap();
        assert_eq!(content, "Some idea.\n\n#my-projects");
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn missing_companion_config_aborts_before_mutation() {
        let vault = vault_with_ideas("Some idea.");
        vault.set_companion_config(None);
        let notifier = RecordingNotifier::default();
        let converter = Converter::new(&vault, &notifier, settings(true, TagPlacement::Append));

        let note = NoteRef::new("My Projects/Ideas.md", Some(created()));
        let err = converter.convert(Some(note)).await.unwrap_err();

        assert!(matches!(err, ConvertError::ConfigUnavailable(_)));
        assert!(vault.renames().is_empty());
        assert_eq!(vault.content("My Projects/Ideas.md").as_deref(), Some("Some idea."));
        let notices = notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].message, CONFIG_NOTICE);
    }

    #[tokio::test]
    async fn missing_destination_is_config_unavailable() {
        let vault = vault_with_ideas("");
        vault.set_companion_config(Some(r#"{ "format": "YYYY" }"#));
        let notifier = RecordingNotifier::default();
        let converter = Converter::new(&vault, &notifier, PluginSettings::default());

        let err = converter
            .convert(Some(NoteRef::new("My Projects/Ideas.md", Some(created()))))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::ConfigUnavailable(unp_core::ConfigError::MissingDestination { .. })
        ));
        assert!(vault.renames().is_empty());
    }

    #[tokio::test]
    async fn uses_active_note_when_none_given() {
        let vault = vault_with_ideas("");
        vault.set_active(Some(Path::new("My Projects/Ideas.md")));
        let notifier = RecordingNotifier::default();
        let converter = Converter::new(&vault, &notifier, PluginSettings::default());

        let renamed = converter.convert(None).await.unwrap();
        assert_eq!(renamed.from, PathBuf::from("My Projects/Ideas.md"));
        assert_eq!(renamed.tag, None);
        assert_eq!(vault.content("Zettel/202401151030 Ideas.md").as_deref(), Some(""));
    }

    #[tokio::test]
    async fn no_active_note_is_missing_metadata() {
        let vault = vault_with_ideas("");
        let notifier = RecordingNotifier::default();
        let converter = Converter::new(&vault, &notifier, PluginSettings::default());

        let err = converter.convert(None).await.unwrap_err();
        assert!(matches!(err, ConvertError::MissingMetadata("active note")));
        assert_eq!(notifier.notices().len(), 1);
    }

    #[tokio::test]
    async fn missing_creation_time_is_missing_metadata() {
        let vault = vault_with_ideas("");
        let notifier = RecordingNotifier::default();
        let converter = Converter::new(&vault, &notifier, PluginSettings::default());

        let err = converter
            .convert(Some(NoteRef::new("My Projects/Ideas.md", None)))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::MissingMetadata("creation time")));
        assert!(vault.renames().is_empty());
    }

    #[tokio::test]
    async fn custom_id_format_and_nested_destination() {
        let vault = vault_with_ideas("");
        vault.set_companion_config(Some(r#"{ "folder": "Notes/Zettel/", "format": "YYYY-MM-DD HHmm" }"#));
        let notifier = RecordingNotifier::default();
        let converter = Converter::new(&vault, &notifier, PluginSettings::default());

        let renamed = converter
            .convert(Some(NoteRef::new("My Projects/Ideas.md", Some(created()))))
            .await
            .unwrap();
        assert_eq!(renamed.to, PathBuf::from("Notes/Zettel/2024-01-15 1030 Ideas.md"));
    }

    #[tokio::test]
    async fn append_placement_repeats_the_tag() {
        let vault = vault_with_ideas("Body");
        vault.set_companion_config(Some(r#"{ "folder": "My Projects", "format": "YYYY" }"#));
        let notifier = RecordingNotifier::default();
        let converter = Converter::new(&vault, &notifier, settings(true, TagPlacement::Append));

        let first = converter
            .convert(Some(NoteRef::new("My Projects/Ideas.md", Some(created()))))
            .await
            .unwrap();
        assert_eq!(first.to, PathBuf::from("My Projects/2024 Ideas.md"));
        converter
            .convert(Some(NoteRef::new(first.to.clone(), Some(created()))))
            .await
            .unwrap();

        let content = vault.content("My Projects/2024 2024 Ideas.md").unwrap();
        assert_eq!(content, "Body\n\n#my-projects\n\n#my-projects");
    }

    #[tokio::test]
    async fn frontmatter_placement_keeps_one_tag() {
        let vault = vault_with_ideas("---\nstatus: draft\n---\nBody\n");
        vault.set_companion_config(Some(r#"{ "folder": "My Projects", "format": "YYYY" }"#));
        let notifier = RecordingNotifier::default();
        let converter = Converter::new(&vault, &notifier, settings(true, TagPlacement::Frontmatter));

        let first = converter
            .convert(Some(NoteRef::new("My Projects/Ideas.md", Some(created()))))
            .await
            .unwrap();
        let second = converter
            .convert(Some(NoteRef::new(first.to.clone(), Some(created()))))
            .await
            .unwrap();

        let content = vault.content(&second.to).unwrap();
        let (matter, body) = frontmatter::parse_frontmatter(&content).unwrap();
        assert_eq!(frontmatter::tags(&matter), vec!["my-projects"]);
        assert_eq!(body, "Body\n");
        assert!(matter.get("status").is_some());
    }

    #[tokio::test]
    async fn frontmatter_placement_on_note_opening_with_a_rule() {
        let vault = vault_with_ideas("---\nA note that opens with a rule.\n");
        let notifier = RecordingNotifier::default();
        let converter = Converter::new(&vault, &notifier, settings(true, TagPlacement::Frontmatter));

        let renamed = converter
            .convert(Some(NoteRef::new("My Projects/Ideas.md", Some(created()))))
            .await
            .unwrap();

        let content = vault.content(&renamed.to).unwrap();
        let (matter, body) = frontmatter::parse_frontmatter(&content).unwrap();
        assert_eq!(frontmatter::tags(&matter), vec!["my-projects"]);
        assert_eq!(body, "---\nA note that opens with a rule.\n");
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn resolve_reports_missing_paths() {
        let vault = vault_with_ideas("");
        let notifier = RecordingNotifier::default();
        let converter = Converter::new(&vault, &notifier, PluginSettings::default());

        let entry = converter.resolve(Path::new("My Projects/Ideas.md")).await.unwrap();
        assert!(matches!(entry, Entry::Note(_)));
        assert!(notifier.notices().is_empty());

        let err = converter.resolve(Path::new("Missing.md")).await.unwrap_err();
        assert!(matches!(err, ConvertError::Vault(VaultError::NotFound(_))));
        let notices = notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(notices[0].message.contains("Missing.md"));
    }

    #[tokio::test]
    async fn root_notes_are_not_tagged() {
        let vault = MemoryVault::new();
        vault.set_companion_config(Some(ZETTEL));
        vault.add_note("Loose.md", "text", Some(created()));
        let notifier = RecordingNotifier::default();
        let converter = Converter::new(&vault, &notifier, settings(true, TagPlacement::Append));

        let renamed = converter
            .convert(Some(NoteRef::new("Loose.md", Some(created()))))
            .await
            .unwrap();
        assert_eq!(renamed.tag, None);
        assert_eq!(vault.content(&renamed.to).as_deref(), Some("text"));
    }

    #[tokio::test]
    async fn occupied_target_leaves_tagged_note_in_place() {
        let vault = vault_with_ideas("Body");
        vault.add_note("Zettel/202401151030 Ideas.md", "other", Some(created()));
        let notifier = RecordingNotifier::default();
        let converter = Converter::new(&vault, &notifier, settings(true, TagPlacement::Append));

        let err = converter
            .convert(Some(NoteRef::new("My Projects/Ideas.md", Some(created()))))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::TargetExists { .. }));
        assert_eq!(
            vault.content("My Projects/Ideas.md").as_deref(),
            Some("Body\n\n#my-projects")
        );
        assert_eq!(vault.content("Zettel/202401151030 Ideas.md").as_deref(), Some("other"));
        assert_eq!(notifier.notices()[0].level, NoticeLevel::Error);
    }

    fn batch_vault() -> MemoryVault {
        let vault = MemoryVault::new();
        vault.set_companion_config(Some(r#"{ "folder": "Zettel", "format": "YYYYMMDDHHmmss" }"#));
        let at = |s| Some(Local.with_ymd_and_hms(2024, 1, 15, 10, 30, s).unwrap());
        vault.add_note("Inbox/a.md", "", at(1));
        vault.add_note("Inbox/b.md", "", at(2));
        vault.add_note("Inbox/Sub/c.md", "", at(3));
        vault
    }

    async fn inbox(vault: &MemoryVault) -> FolderRef {
        match vault.entry(Path::new("Inbox")).await.unwrap() {
            Entry::Folder(folder) => folder,
            Entry::Note(_) => panic!("expected a folder"),
        }
    }

    #[tokio::test]
    async fn folder_batch_skips_sub_folders_unless_recursive() {
        let vault = batch_vault();
        let notifier = RecordingNotifier::default();
        let converter = Converter::new(&vault, &notifier, PluginSettings::default());

        let report = converter.convert_folder(&inbox(&vault).await).await.unwrap();
        assert_eq!(report.converted.len(), 2);
        assert!(report.is_success());
        assert_eq!(vault.renames().len(), 2);
        assert!(vault.contains("Inbox/Sub/c.md"));

        let notices = notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Info);
        assert!(notices[0].message.contains("Converted 2 notes in Inbox"));
    }

    #[tokio::test]
    async fn folder_batch_recurses_in_pre_order() {
        let vault = batch_vault();
        let notifier = RecordingNotifier::default();
        let settings = PluginSettings {
            recursive_folders: true,
            ..PluginSettings::default()
        };
        let converter = Converter::new(&vault, &notifier, settings);

        let report = converter.convert_folder(&inbox(&vault).await).await.unwrap();
        let from: Vec<PathBuf> = report.converted.iter().map(|r| r.from.clone()).collect();
        assert_eq!(
            from,
            vec![
                PathBuf::from("Inbox/Sub/c.md"),
                PathBuf::from("Inbox/a.md"),
                PathBuf::from("Inbox/b.md"),
            ]
        );
        assert!(vault.contains("Zettel/20240115103003 c.md"));
    }

    #[tokio::test]
    async fn folder_batch_continues_past_failures() {
        let vault = batch_vault();
        vault.add_note("Zettel/20240115103001 a.md", "taken", None);
        let notifier = RecordingNotifier::default();
        let converter = Converter::new(&vault, &notifier, PluginSettings::default());

        let report = converter.convert_folder(&inbox(&vault).await).await.unwrap();
        assert_eq!(report.converted.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].path, PathBuf::from("Inbox/a.md"));
        assert!(vault.contains("Zettel/20240115103002 b.md"));

        let notices = notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(notices[0].message.contains("Inbox/a.md"));
    }

    #[tokio::test]
    async fn folder_batch_without_config_touches_nothing() {
        let vault = batch_vault();
        vault.set_companion_config(Some("not json"));
        let notifier = RecordingNotifier::default();
        let converter = Converter::new(&vault, &notifier, PluginSettings::default());

        let err = converter.convert_folder(&inbox(&vault).await).await.unwrap_err();
        assert!(matches!(err, ConvertError::ConfigUnavailable(_)));
        assert!(vault.renames().is_empty());
        assert_eq!(notifier.notices()[0].message, CONFIG_NOTICE);
    }

    #[tokio::test]
    async fn convert_entry_dispatches_on_kind() {
        let vault = batch_vault();
        let notifier = RecordingNotifier::default();
        let converter = Converter::new(&vault, &notifier, PluginSettings::default());

        let entry = vault.entry(Path::new("Inbox/Sub/c.md")).await.unwrap();
        let outcome = converter.convert_entry(entry).await.unwrap();
        assert!(matches!(outcome, Outcome::Note(_)));

        let entry = vault.entry(Path::new("Inbox")).await.unwrap();
        let Outcome::Folder(report) = converter.convert_entry(entry).await.unwrap() else {
            panic!("expected a folder outcome");
        };
        assert_eq!(report.converted.len(), 2);
    }
}
