//! Unique Note Plus CLI: rename vault notes to timestamped unique notes
//!
//! Commands: convert, convert-folder, open, settings, completions

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use unp_core::{Entry, ExternalConfig, PluginSettings, SettingsStore, TagPlacement};
use unp_vault::{Converter, FsVault, Notice, NoticeLevel, Notifier, Outcome, Vault};

#[derive(Parser)]
#[command(name = "unp")]
#[command(version)]
#[command(about = "Rename notes to timestamp-prefixed unique notes")]
struct Cli {
    /// Vault root directory
    #[arg(long, global = true, env = "UNP_VAULT", default_value = ".")]
    vault: PathBuf,

    /// More log output (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Less log output (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Convert to Unique Note (the given note, or the open one)
    Convert {
        /// Vault-relative path of the note
        note: Option<PathBuf>,
    },
    /// Convert folder children to Unique Notes
    #[command(alias = "cf")]
    ConvertFolder {
        /// Vault-relative path of the folder
        folder: PathBuf,
        /// Descend into sub-folders for this run
        #[arg(long)]
        recursive: bool,
    },
    /// Convert a note or every note in a folder, whichever the path is
    Open {
        path: PathBuf,
    },
    /// Show or change plugin settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(clap::Subcommand)]
enum SettingsAction {
    /// Print the current settings and companion config
    Show,
    /// Change one or more settings and save them
    Set {
        /// Recursively select children when converting a folder
        #[arg(long)]
        recursive_folders: Option<bool>,
        /// Add the folder name as a tag when converting a note
        #[arg(long)]
        folder_as_tag: Option<bool>,
        /// Where the folder tag goes: frontmatter or append
        #[arg(long)]
        tag_placement: Option<TagPlacement>,
    },
}

/// Prints notices to stderr, keeping stdout for JSON results.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => eprintln!("{}", notice.message),
            NoticeLevel::Error => eprintln!("error: {}", notice.message),
        }
    }
}

fn init_tracing(verbose: u8, quiet: u8) {
    let level = match i16::from(verbose) - i16::from(quiet) {
        i16::MIN..=-1 => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run one command. `Ok(false)` means the command ran but something in it
/// failed and has already been reported.
async fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "unp", &mut io::stdout());
            Ok(true)
        }
        Commands::Settings { action } => run_settings(&cli.vault, action).await,
        Commands::Convert { note } => {
            let vault = open_vault(&cli.vault)?;
            let settings = load_settings(&vault)?;
            let converter = Converter::new(&vault, &TerminalNotifier, settings);

            let note = match note {
                Some(path) => match converter.resolve(&path).await {
                    Ok(Entry::Note(note)) => Some(note),
                    Ok(Entry::Folder(folder)) => {
                        TerminalNotifier.notify(Notice::error(format!(
                            "{} is a folder, use convert-folder",
                            folder.path.display()
                        )));
                        return Ok(false);
                    }
                    Err(_) => return Ok(false),
                },
                None => None,
            };
            match converter.convert(note).await {
                Ok(renamed) => {
                    print_json(&renamed)?;
                    Ok(true)
                }
                Err(_) => Ok(false),
            }
        }
        Commands::ConvertFolder { folder, recursive } => {
            let vault = open_vault(&cli.vault)?;
            let mut settings = load_settings(&vault)?;
            settings.recursive_folders |= recursive;
            let converter = Converter::new(&vault, &TerminalNotifier, settings);

            let folder = match converter.resolve(&folder).await {
                Ok(Entry::Folder(folder)) => folder,
                Ok(Entry::Note(note)) => {
                    TerminalNotifier.notify(Notice::error(format!(
                        "{} is a note, use convert",
                        note.path.display()
                    )));
                    return Ok(false);
                }
                Err(_) => return Ok(false),
            };
            match converter.convert_folder(&folder).await {
                Ok(report) => {
                    print_json(&report)?;
                    Ok(report.is_success())
                }
                Err(_) => Ok(false),
            }
        }
        Commands::Open { path } => {
            let vault = open_vault(&cli.vault)?;
            let settings = load_settings(&vault)?;
            let converter = Converter::new(&vault, &TerminalNotifier, settings);

            let Ok(entry) = converter.resolve(&path).await else {
                return Ok(false);
            };
            match converter.convert_entry(entry).await {
                Ok(outcome) => {
                    print_json(&outcome)?;
                    Ok(match outcome {
                        Outcome::Note(_) => true,
                        Outcome::Folder(report) => report.is_success(),
                    })
                }
                Err(_) => Ok(false),
            }
        }
    }
}

#[derive(Serialize)]
struct SettingsView {
    path: PathBuf,
    settings: PluginSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    companion: Option<ExternalConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    companion_error: Option<String>,
}

async fn run_settings(vault_root: &Path, action: SettingsAction) -> Result<bool> {
    let vault = open_vault(vault_root)?;
    let store = SettingsStore::for_vault(vault.root());
    let mut settings = store.load()?;

    if let SettingsAction::Set {
        recursive_folders,
        folder_as_tag,
        tag_placement,
    } = action
    {
        if let Some(value) = recursive_folders {
            settings.recursive_folders = value;
        }
        if let Some(value) = folder_as_tag {
            settings.folder_as_tag = value;
        }
        if let Some(value) = tag_placement {
            settings.tag_placement = value;
        }
        store.save(&settings)?;
        tracing::info!(?settings, "settings saved");
    }

    let (companion, companion_error) = match vault.external_config().await {
        Ok(config) => (Some(config), None),
        Err(e) => (None, Some(e.to_string())),
    };
    print_json(&SettingsView {
        path: store.path().to_path_buf(),
        settings,
        companion,
        companion_error,
    })?;
    Ok(true)
}

fn open_vault(root: &Path) -> Result<FsVault> {
    FsVault::open(root).with_context(|| format!("failed to open vault at {}", root.display()))
}

fn load_settings(vault: &FsVault) -> Result<PluginSettings> {
    Ok(SettingsStore::for_vault(vault.root()).load()?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
