use crate::config::{SharedPolicy, Settings};
use crate::detector;
use crate::error::{AttacheError, Result};
use crate::journal::Journal;
use crate::kind::AttachmentKind;
use crate::model::{EmbedRef, ResolvedAttachment};
use crate::naming::NamePattern;
use crate::parser;
use crate::vault::Vault;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

mod plan;


pub use plan::{PassPlan, PlannedRename, Substitution};

/// Delay before another auto pass may run, coalescing the rapid
/// notification bursts an edit produces.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(2);

/// What triggered a pass. Auto passes honor the cooldown window and
/// the excluded-folder list; forced passes (rescan, folder scan)
/// bypass both but never the reentrancy flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Auto,
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A pass is already running.
    InProgress,
    /// Within the cooldown window of the previous pass.
    Cooldown,
    /// The note lies under an excluded folder.
    ExcludedFolder,
    /// Auto formatting is switched off.
    AutoDisabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    Done(PassReport),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub renamed: usize,
    pub copied: usize,
    /// Embeds passed over: resolution misses and shared-policy skips.
    pub skipped: usize,
    pub substituted: usize,
}

/// Drives formatting passes. One pass walks `Idle -> Scanning ->
/// Renaming -> Idle`; the `renaming` flag plus the cooldown stamp is
/// the whole concurrency control.
pub struct Formatter {
    settings: Settings,
    renaming: bool,
    cooldown: Duration,
    last_pass: Option<Instant>,
}

impl Formatter {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            renaming: false,
            cooldown: DEFAULT_COOLDOWN,
            last_pass: None,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run one formatting pass over a note.
    ///
    /// Individual resolution misses are skipped; storage failures
    /// abort the pass mid-way and moves already performed stay - there
    /// is no rollback.
    pub fn format_note(
        &mut self,
        vault: &mut Vault,
        journal: &Journal,
        note: &Path,
        trigger: Trigger,
    ) -> Result<PassOutcome> {
        if self.renaming {
            return Ok(PassOutcome::Skipped(SkipReason::InProgress));
        }
        if trigger == Trigger::Auto {
            if !self.settings.auto_format {
                return Ok(PassOutcome::Skipped(SkipReason::AutoDisabled));
            }
            if let Some(last) = self.last_pass {
                if last.elapsed() < self.cooldown {
                    return Ok(PassOutcome::Skipped(SkipReason::Cooldown));
                }
            }
            if self.is_excluded(note) {
                return Ok(PassOutcome::Skipped(SkipReason::ExcludedFolder));
            }
        }

        self.renaming = true;
        let outcome = self.run_pass(vault, journal, note);
        self.renaming = false;
        self.last_pass = Some(Instant::now());
        outcome.map(PassOutcome::Done)
    }

    /// Run a forced pass over every note under a folder, in index
    /// order. `progress` is called with (position, total, note) before
    /// each pass. An empty folder string addresses the vault root.
    pub fn scan_folder(
        &mut self,
        vault: &mut Vault,
        journal: &Journal,
        folder: &str,
        mut progress: impl FnMut(usize, usize, &Path),
    ) -> Result<Vec<(PathBuf, PassOutcome)>> {
        let folder = folder.trim_matches('/');
        if !folder.is_empty() && !vault.folders().iter().any(|f| f == folder) {
            return Err(AttacheError::FolderNotFound(folder.to_string()));
        }

        let notes: Vec<PathBuf> = vault
            .notes()
            .into_iter()
            .filter(|note| folder.is_empty() || note.starts_with(folder))
            .collect();

        let total = notes.len();
        let mut outcomes = Vec::with_capacity(total);
        for (position, note) in notes.into_iter().enumerate() {
            progress(position + 1, total, &note);
            let outcome = self.format_note(vault, journal, &note, Trigger::Forced)?;
            outcomes.push((note, outcome));
        }
        Ok(outcomes)
    }

    fn is_excluded(&self, note: &Path) -> bool {
        let mut parent = note.parent();
        while let Some(folder) = parent {
            if folder.as_os_str().is_empty() {
                break;
            }
            if self
                .settings
                .excluded_folders
                .iter()
                .any(|excluded| Path::new(excluded) == folder)
            {
                return true;
            }
            parent = folder.parent();
        }
        false
    }

    fn run_pass(&self, vault: &mut Vault, journal: &Journal, note: &Path) -> Result<PassReport> {
        let content = vault.read_note(note)?;
        let title = note
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let note_folder = note.parent().unwrap_or_else(|| Path::new("")).to_path_buf();

        let embeds = parser::parse_embeds(&content);
        if embeds.is_empty() {
            log::debug!("no attachments found in {}", note.display());
            return Ok(PassReport::default());
        }

        let started = Local::now();
        let plan = self.plan_pass(vault, &embeds, &title, &note_folder, started);

        let mut report = PassReport {
            skipped: plan.skipped,
            ..PassReport::default()
        };
        if plan.renames.is_empty() && plan.substitutions.is_empty() {
            return Ok(report);
        }

        journal.begin_pass(vault, note, started)?;

        // Displacing an occupant may move a file a later step still
        // wants to rename; the relocation map tracks where it went.
        let mut relocated: HashMap<PathBuf, PathBuf> = HashMap::new();

        for planned in &plan.renames {
            let from = relocated
                .remove(&planned.from)
                .unwrap_or_else(|| planned.from.clone());

            // Destination folder may be a configured subfolder that
            // does not exist yet.
            if let Some(dir) = planned.dest.parent() {
                if !dir.as_os_str().is_empty() && from.parent() != Some(dir) {
                    vault.create_dir_all(dir)?;
                }
            }

            // A different occupant of the destination is displaced to
            // a temporary name first; data is never overwritten.
            if planned.dest != from && vault.contains(&planned.dest) {
                let occupant_name = file_name(&planned.dest);
                let tmp_name = format!("tmp{}_{}", now_millis(), occupant_name);
                let tmp = planned.dest.with_file_name(&tmp_name);
                journal.record_rename(vault, &occupant_name, &tmp_name)?;
                log::info!("rename attachment {:?} to {:?}", occupant_name, tmp_name);
                vault.rename_file(&planned.dest, &tmp)?;
                relocated.insert(planned.dest.clone(), tmp);
            }

            let from_name = file_name(&from);
            let dest_name = file_name(&planned.dest);
            if planned.copy {
                journal.record_copy(vault, &from_name, &dest_name)?;
                log::info!("copy attachment {:?} to {:?}", from_name, dest_name);
                vault.copy_file(&from, &planned.dest)?;
                report.copied += 1;
            } else {
                journal.record_rename(vault, &from_name, &dest_name)?;
                log::info!("rename attachment {:?} to {:?}", from_name, dest_name);
                vault.rename_file(&from, &planned.dest)?;
                report.renamed += 1;
            }
        }

        if !plan.substitutions.is_empty() {
            let rewritten = plan::apply_substitutions(&content, &plan.substitutions);
            vault.write(note, rewritten.as_bytes())?;
            report.substituted = plan.substitutions.len();
        }

        Ok(report)
    }

    /// Pure planning: bucket embeds by kind, de-duplicate by resolved
    /// path, apply the shared policy, assign per-kind sequence numbers
    /// in discovery order, compute destinations.
    fn plan_pass(
        &self,
        vault: &Vault,
        embeds: &[EmbedRef],
        title: &str,
        note_folder: &Path,
        started: DateTime<Local>,
    ) -> PassPlan {
        // One entry per resolved file, carrying every embed of it: the
        // file is renamed once, every link to it is rewritten.
        let mut buckets: [Vec<(Vec<EmbedRef>, ResolvedAttachment)>; 4] = Default::default();
        let mut plan = PassPlan::default();

        for embed in embeds {
            let Some(extension) = parser::link_extension(&embed.link) else {
                continue;
            };
            let Some(kind) = AttachmentKind::from_extension(&extension) else {
                continue;
            };
            let kind_settings = self.settings.kind(kind);
            if !kind_settings.enabled {
                continue;
            }
            match kind.extension_index(&extension) {
                Some(index) if kind_settings.extension_enabled(index) => {}
                _ => continue,
            }

            let Some(attachment) = vault.resolve_attachment(embed) else {
                plan.skipped += 1;
                continue;
            };

            let bucket = &mut buckets[bucket_of(kind)];
            match bucket.iter_mut().find(|(_, seen)| seen.path == attachment.path) {
                Some((embeds_of, _)) => embeds_of.push(embed.clone()),
                None => bucket.push((vec![embed.clone()], attachment)),
            }
        }

        let pattern = NamePattern::new(&self.settings, started, note_folder);

        for kind in AttachmentKind::ALL {
            let kind_settings = self.settings.kind(kind);
            let mut index = 1;

            for (embeds_of, attachment) in &buckets[bucket_of(kind)] {
                let formatted =
                    detector::is_formatted(&attachment.stem, title, &kind_settings.label, &self.settings);

                let policy = self.settings.shared_policy;
                if policy == SharedPolicy::NoChange && formatted {
                    // Renamed under another note; leave it and consume
                    // no sequence number.
                    plan.skipped += 1;
                    continue;
                }

                let dest = destination(
                    &pattern,
                    title,
                    &kind_settings.label,
                    index,
                    attachment,
                    kind_settings.subfolder.as_deref(),
                    note_folder,
                );
                let copy = policy == SharedPolicy::Copy && formatted;

                // A plain rename to the name it already carries is a
                // no-op; the pass stays idempotent.
                if copy || dest != attachment.path {
                    for embed in embeds_of {
                        plan.substitutions.push(Substitution {
                            span: embed.span.clone(),
                            old_link: embed.link.clone(),
                            new_link: substitute_target(&dest, &embed.link),
                        });
                    }
                    plan.renames.push(PlannedRename {
                        kind,
                        from: attachment.path.clone(),
                        dest,
                        copy,
                    });
                }
                index += 1;
            }
        }

        plan
    }
}

fn bucket_of(kind: AttachmentKind) -> usize {
    AttachmentKind::ALL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or(0)
}

fn destination(
    pattern: &NamePattern,
    title: &str,
    label: &str,
    index: usize,
    attachment: &ResolvedAttachment,
    subfolder: Option<&str>,
    note_folder: &Path,
) -> PathBuf {
    let name = pattern.build(title, label, index, &attachment.extension);
    match subfolder {
        Some(subfolder) => note_folder.join(subfolder).join(name),
        None => attachment.parent().join(name),
    }
}

/// New link text for a copy substitution: links written as paths stay
/// paths, bare names stay bare names.
fn substitute_target(dest: &Path, old_link: &str) -> String {
    if old_link.contains('/') {
        dest.to_string_lossy().replace('\\', "/")
    } else {
        dest.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| dest.to_string_lossy().to_string())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0)
}
