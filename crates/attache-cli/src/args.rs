use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "attache",
    version,
    about = "Format attachment names in a markdown vault"
)]
pub struct Cli {
    /// Vault root directory.
    #[arg(long, default_value = ".", global = true)]
    pub vault: PathBuf,

    /// Settings file; defaults to <vault>/.attache.yaml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rename the attachments embedded in a note
    Format {
        /// The note to format, vault-relative
        note: PathBuf,
        /// Behave like an editor-triggered pass: honor the cooldown
        /// window and the excluded-folder list
        #[arg(long)]
        auto: bool,
    },
    /// Run a formatting pass over every note under a folder
    Scan {
        /// Vault-relative folder; omit to scan the whole vault
        #[arg(default_value = "")]
        folder: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Bundle the attachments of a note into a tar.gz archive
    Export {
        /// The note whose attachments to bundle
        note: PathBuf,
    },
    /// Bundle every attachment no note references
    ExportUnused,
    /// Print the resolved path of an attachment link
    Path {
        /// Link target as written in a note
        link: String,
    },
    /// List the folders of the vault
    Folders,
    /// Inspect or change settings
    Config {
        /// Setting key, e.g. `connector` or `image.label`; omit to
        /// print everything
        key: Option<String>,
        /// New value; omit to print the current one
        value: Option<String>,
    },
}
