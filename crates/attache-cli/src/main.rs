use attache_core::config::PathMode;
use attache_core::export::{export_note, export_unused, ExportOutcome};
use attache_core::format::SkipReason;
use attache_core::journal::Journal;
use attache_core::{
    AttacheError, Formatter, PassOutcome, PhysicalFileSystem, Result, Settings, Trigger, Vault,
};
use clap::Parser;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod args;
use args::{Cli, Commands};

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.vault.join(".attache.yaml"));
    log::debug!(
        "vault {}, settings {}",
        cli.vault.display(),
        config_path.display()
    );

    match &cli.command {
        Commands::Format { note, auto } => handle_format(&cli, &config_path, note, *auto),
        Commands::Scan { folder, yes } => handle_scan(&cli, &config_path, folder, *yes),
        Commands::Export { note } => handle_export(&cli, &config_path, note),
        Commands::ExportUnused => handle_export_unused(&cli, &config_path),
        Commands::Path { link } => handle_path(&cli, &config_path, link),
        Commands::Folders => handle_folders(&cli),
        Commands::Config { key, value } => {
            handle_config(&config_path, key.as_deref(), value.as_deref())
        }
    }
}

fn load_settings(path: &Path) -> Result<Settings> {
    if path.exists() {
        Settings::from_yaml(&std::fs::read_to_string(path)?)
    } else {
        Ok(Settings::default())
    }
}

fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    std::fs::write(path, settings.to_yaml()?)?;
    Ok(())
}

fn open_vault(cli: &Cli) -> Vault {
    Vault::open(cli.vault.clone(), Arc::new(PhysicalFileSystem))
}

/// Accept notes given either vault-relative or prefixed with the vault
/// root.
fn relativize(cli: &Cli, note: &Path) -> PathBuf {
    note.strip_prefix(&cli.vault).unwrap_or(note).to_path_buf()
}

fn handle_format(cli: &Cli, config_path: &Path, note: &Path, auto: bool) -> Result<()> {
    let settings = load_settings(config_path)?;
    let journal = Journal::new(&settings.log);
    let mut vault = open_vault(cli);
    let mut formatter = Formatter::new(settings);

    let note = relativize(cli, note);
    let trigger = if auto { Trigger::Auto } else { Trigger::Forced };

    match formatter.format_note(&mut vault, &journal, &note, trigger)? {
        PassOutcome::Done(report) => {
            println!(
                "{}: {} renamed, {} copied, {} skipped",
                note.display(),
                report.renamed,
                report.copied,
                report.skipped
            );
        }
        PassOutcome::Skipped(reason) => {
            println!("{}: skipped ({})", note.display(), skip_reason(reason));
        }
    }
    Ok(())
}

fn handle_scan(cli: &Cli, config_path: &Path, folder: &str, yes: bool) -> Result<()> {
    let settings = load_settings(config_path)?;
    let journal = Journal::new(&settings.log);
    let mut vault = open_vault(cli);
    let mut formatter = Formatter::new(settings);

    let target = if folder.is_empty() { "the whole vault" } else { folder };
    if !yes && !confirm(&format!("Rename attachments in every note under {}?", target))? {
        println!("Aborted.");
        return Ok(());
    }

    let outcomes = formatter.scan_folder(&mut vault, &journal, folder, |position, total, note| {
        println!("Attachment renaming: {}/{} {}", position, total, note.display());
    })?;

    let mut renamed = 0;
    let mut copied = 0;
    for (_, outcome) in &outcomes {
        if let PassOutcome::Done(report) = outcome {
            renamed += report.renamed;
            copied += report.copied;
        }
    }
    println!(
        "Scanned {} notes: {} renamed, {} copied",
        outcomes.len(),
        renamed,
        copied
    );
    Ok(())
}

fn handle_export(cli: &Cli, config_path: &Path, note: &Path) -> Result<()> {
    let settings = load_settings(config_path)?;
    let mut vault = open_vault(cli);
    let note = relativize(cli, note);

    let outcome = export_note(&mut vault, &settings, &note)?;
    print_export(&outcome);
    Ok(())
}

fn handle_export_unused(cli: &Cli, config_path: &Path) -> Result<()> {
    let settings = load_settings(config_path)?;
    let mut vault = open_vault(cli);

    let outcome = export_unused(&mut vault, &settings)?;
    print_export(&outcome);
    Ok(())
}

fn print_export(outcome: &ExportOutcome) {
    match &outcome.archive {
        Some(archive) => {
            println!("{} attachments exported to {}", outcome.bundled, archive.display());
            if outcome.deleted > 0 {
                println!("{} attachments deleted", outcome.deleted);
            }
        }
        None => println!("No attachments found."),
    }
}

fn handle_path(cli: &Cli, config_path: &Path, link: &str) -> Result<()> {
    let settings = load_settings(config_path)?;
    let vault = open_vault(cli);

    let Some(rel) = vault.resolve_link(link) else {
        return Err(AttacheError::AttachmentNotFound(link.to_string()));
    };

    match settings.copy_path_mode {
        PathMode::Relative => println!("./{}", rel.display()),
        PathMode::Absolute => {
            let absolute = vault.absolute(&rel);
            let absolute = std::fs::canonicalize(&absolute).unwrap_or(absolute);
            println!("{}", absolute.display());
        }
    }
    Ok(())
}

fn handle_folders(cli: &Cli) -> Result<()> {
    let vault = open_vault(cli);
    let mut folders = vault.folders().to_vec();
    folders.sort();
    for folder in folders {
        println!("{}", folder);
    }
    Ok(())
}

fn handle_config(config_path: &Path, key: Option<&str>, value: Option<&str>) -> Result<()> {
    let mut settings = load_settings(config_path)?;

    match (key, value) {
        (None, _) => print!("{}", settings.to_yaml()?),
        (Some(key), None) => println!("{}", settings.get(key)?),
        (Some(key), Some(value)) => {
            match settings.set(key, value) {
                Ok(()) => {}
                Err(AttacheError::IllegalSetting { field, value }) => {
                    // Illegal input falls back to the default value.
                    eprintln!(
                        "Warning: illegal character in {} value {:?}; reverting to default",
                        field, value
                    );
                    settings.reset(key)?;
                }
                Err(e) => return Err(e),
            }
            save_settings(config_path, &settings)?;
            println!("{} = {}", key, settings.get(key)?);
        }
    }
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn skip_reason(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::InProgress => "a pass is already running",
        SkipReason::Cooldown => "within the cooldown window",
        SkipReason::ExcludedFolder => "the note is under an excluded folder",
        SkipReason::AutoDisabled => "auto formatting is off",
    }
}
