//! Command handlers. Each handler opens the store, performs one operation
//! and prints a short report.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::{info, warn};

use fieldsurvey_core::export::{
    CategoryFilter, ExportRequest, ScreeningExportOptions, SessionExportOptions, TimeRange,
};
use fieldsurvey_core::mirror::JsonMirror;
use fieldsurvey_core::models::{NewScreening, NewSession, RecordId, RecordPatch, SessionKind};
use fieldsurvey_core::store::{RecordStore, StaticConnectivity};
use fieldsurvey_core::utils::{format_date, yes_no};
use fieldsurvey_core::{BatchConflict, Config};

use crate::cli::{Command, ExportCommand, ScreeningCommand, SessionCommand, Toggle};

pub async fn run(command: Command, config: Config, data_dir: PathBuf) -> Result<()> {
    match command {
        Command::Offline { mode } => {
            // Start from the file so command-line overrides are not persisted.
            let mut stored = Config::load().unwrap_or_default();
            stored.offline_mode = matches!(mode, Toggle::On);
            stored.save().context("Failed to save config")?;
            info!(offline = stored.offline_mode, "Offline preference saved");
            println!("Offline mode {}", if stored.offline_mode { "on" } else { "off" });
            Ok(())
        }
        Command::Status => status(&open_store(&config, &data_dir)?, &data_dir),
        Command::Screening(cmd) => screening(&mut open_store(&config, &data_dir)?, cmd),
        Command::Session(cmd) => session(&mut open_store(&config, &data_dir)?, cmd),
        Command::Update { id, patch } => update(&mut open_store(&config, &data_dir)?, &id, &patch),
        Command::Sync => sync(&mut open_store(&config, &data_dir)?).await,
        Command::Export(cmd) => export(&open_store(&config, &data_dir)?, cmd),
    }
}

fn open_store(config: &Config, data_dir: &Path) -> Result<RecordStore> {
    let mirror = JsonMirror::new(data_dir.to_path_buf())
        .with_context(|| format!("Failed to open data directory {}", data_dir.display()))?;
    let connectivity = StaticConnectivity::new(!config.offline_mode);
    let store = RecordStore::open(Arc::new(mirror), Arc::new(connectivity), config.collector())
        .context("Failed to load stored records")?;
    Ok(store.with_export_dir(config.export_dir()))
}

/// Read a JSON document from a file, or stdin for `-`.
fn read_json(path: &Path) -> Result<Value> {
    let contents = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&contents).context("Payload is not valid JSON")
}

fn read_batch(path: &Path) -> Result<Vec<Value>> {
    match read_json(path)? {
        Value::Array(items) => Ok(items),
        _ => bail!("Import payload must be a JSON array"),
    }
}

fn status(store: &RecordStore, data_dir: &Path) -> Result<()> {
    let summary = store.summary();
    let ages = JsonMirror::new(data_dir.to_path_buf())?.get_mirror_ages();

    println!("Collector:      {}", store.owner());
    println!("Online:         {}", yes_no(store.is_online()));
    println!(
        "Screenings:     {} ({} today) - SAM {}, MAM {}, Normal {}  [saved {}]",
        summary.screenings,
        summary.screened_today,
        summary.sam,
        summary.mam,
        summary.normal,
        ages.screening_age()
    );
    println!(
        "FMT sessions:   {}  [saved {}]",
        summary.fmt_sessions,
        ages.sessions_age(SessionKind::Fmt)
    );
    println!(
        "SM sessions:    {}  [saved {}]",
        summary.sm_sessions,
        ages.sessions_age(SessionKind::Sm)
    );
    println!("Awaiting sync:  {}", summary.unsynced);
    Ok(())
}

fn screening(store: &mut RecordStore, cmd: ScreeningCommand) -> Result<()> {
    match cmd {
        ScreeningCommand::Add { file, force } => {
            let candidate = NewScreening::from_json(&read_json(&file)?)?;
            let ids = commit_screenings(store, vec![candidate], force)?;
            for record in ids.iter().filter_map(|id| store.find_screening(*id)) {
                println!(
                    "Added screening #{} {} - {} (synced: {})",
                    record.serial,
                    record.id,
                    record.remarks,
                    yes_no(record.synced)
                );
            }
        }
        ScreeningCommand::Import { file, force } => {
            let candidates = read_batch(&file)?
                .iter()
                .map(NewScreening::from_json)
                .collect::<Result<Vec<_>, _>>()?;
            let ids = commit_screenings(store, candidates, force)?;
            println!("Imported {} screening record(s)", ids.len());
        }
        ScreeningCommand::List => {
            for r in store.screenings() {
                println!(
                    "#{:<4} {}  {:<20} {:<20} {:<12} MUAC {:>5.1} {:<6} synced:{}  {}",
                    r.serial,
                    format_date(r.collected_at.date()),
                    r.name,
                    r.guardian_name,
                    r.location.village,
                    r.muac,
                    r.classification(),
                    yes_no(r.synced),
                    r.id
                );
            }
        }
    }
    Ok(())
}

/// Describe every candidate that repeats a same-day screening, either a
/// stored record or an earlier row of the same batch.
fn duplicate_report(store: &RecordStore, candidates: &[NewScreening]) -> Vec<String> {
    store
        .check_batch_duplicates(candidates)
        .into_iter()
        .map(|(i, conflict)| {
            let c = &candidates[i];
            let repeats = match conflict {
                BatchConflict::Stored(existing) => {
                    format!("record #{} ({})", existing.serial, existing.id)
                }
                BatchConflict::Earlier(j) => format!("row {} of this batch", j + 1),
            };
            format!(
                "row {}: {} / {} / {} repeats {}",
                i + 1,
                c.name,
                c.guardian_name,
                c.location.village,
                repeats
            )
        })
        .collect()
}

/// Run duplicate detection, then commit the batch. Any same-day repeat
/// refuses the whole batch unless `force` is set.
fn commit_screenings(
    store: &mut RecordStore,
    candidates: Vec<NewScreening>,
    force: bool,
) -> Result<Vec<RecordId>> {
    let duplicates = duplicate_report(store, &candidates);
    if !duplicates.is_empty() {
        if !force {
            bail!(
                "{} possible same-day duplicate(s):\n  {}\nRe-run with --force to add anyway.",
                duplicates.len(),
                duplicates.join("\n  ")
            );
        }
        for duplicate in &duplicates {
            warn!(duplicate = %duplicate, "Adding despite same-day duplicate");
            println!("Warning: {}", duplicate);
        }
    }
    Ok(store.bulk_add_screening(candidates)?)
}

fn session(store: &mut RecordStore, cmd: SessionCommand) -> Result<()> {
    match cmd {
        SessionCommand::Add { file } => {
            let candidate = NewSession::from_json(&read_json(&file)?)?;
            let record = store.add_session(candidate)?;
            println!(
                "Added {} session #{} {} (synced: {})",
                record.kind,
                record.serial,
                record.id,
                yes_no(record.synced)
            );
        }
        SessionCommand::Import { file } => {
            let candidates = read_batch(&file)?
                .iter()
                .map(NewSession::from_json)
                .collect::<Result<Vec<_>, _>>()?;
            let ids = store.bulk_add_session(candidates)?;
            println!("Imported {} session record(s)", ids.len());
        }
        SessionCommand::List => {
            for kind in SessionKind::ALL {
                for r in store.sessions(kind) {
                    println!(
                        "{:<3} #{:<3} {}  {:<20} {:<20} {:<12} synced:{}  {}",
                        r.kind,
                        r.serial,
                        format_date(r.date),
                        r.name,
                        r.father_or_husband_name,
                        r.village,
                        yes_no(r.synced),
                        r.id
                    );
                }
            }
        }
    }
    Ok(())
}

fn update(store: &mut RecordStore, id: &str, patch_path: &Path) -> Result<()> {
    let id: RecordId = id.parse().with_context(|| format!("Invalid record id: {}", id))?;
    let patch: RecordPatch =
        serde_json::from_value(read_json(patch_path)?).context("Invalid patch payload")?;
    let kind = store.update_record(id, &patch)?;
    println!("Updated {} record {}", kind, id);
    Ok(())
}

async fn sync(store: &mut RecordStore) -> Result<()> {
    let outcome = store.sync_all().await?;
    if outcome.marked == 0 {
        println!("Everything is already synced");
    } else {
        println!("Synced {} record(s)", outcome.marked);
    }
    Ok(())
}

fn export(store: &RecordStore, cmd: ExportCommand) -> Result<()> {
    let request = match cmd {
        ExportCommand::Screening { range, sam, mam, split } => {
            ExportRequest::Screening(ScreeningExportOptions {
                time_range: time_range(range.today),
                categories: CategoryFilter { sam, mam },
                split_by_owner: split,
            })
        }
        ExportCommand::Session { kind, range } => ExportRequest::Session(SessionExportOptions {
            kind: kind.into(),
            time_range: time_range(range.today),
        }),
    };

    let summary = store.export_snapshot(&request)?;
    println!(
        "Exported {} record(s) across {} sheet(s) to {}",
        summary.record_count,
        summary.sheet_names.len(),
        summary.path.display()
    );
    Ok(())
}

fn time_range(today: bool) -> TimeRange {
    if today {
        TimeRange::Today
    } else {
        TimeRange::All
    }
}
