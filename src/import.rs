// 📥 Import Pipeline - Addon export → stored roster
//
// read → fingerprint → parse → extract → reconcile → save + audit → notify
//
// Also owns the weekly reset check and discovery of the addon's
// SavedVariables file inside a game install.

use crate::config::AppConfig;
use crate::db::{
    RosterStore, SettingsStore, SqliteStore, SETTING_GAME_PATH, SETTING_LAST_IMPORT_HASH,
    SETTING_LAST_WEEK_ID,
};
use crate::extract::{extract_export, ExportDocument};
use crate::notification::{publish, NotificationKind, Notifier};
use crate::parser::TableParser;
use crate::reconciliation::{reconcile, ReconciliationReport};
use crate::temporal::{current_week_id, Clock, WeekId};
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const EXPORT_FILE_NAME: &str = "WoWStatTracker_Addon.lua";

// ============================================================================
// EXPORT FILE
// ============================================================================

/// `<game>/_retail_/WTF/Account/<account>/SavedVariables/WoWStatTracker_Addon.lua`
///
/// Accounts are tried in name order; dot-directories and the account-level
/// `SavedVariables` directory are skipped.
pub fn find_export_file(game_path: &Path) -> Option<PathBuf> {
    let accounts_dir = game_path.join("_retail_").join("WTF").join("Account");
    let entries = match fs::read_dir(&accounts_dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(path = %accounts_dir.display(), error = %err, "no account directory");
            return None;
        }
    };

    let mut accounts: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            !name.starts_with('.') && name != "SavedVariables"
        })
        .map(|entry| entry.path())
        .collect();
    accounts.sort();

    accounts
        .into_iter()
        .map(|account| account.join("SavedVariables").join(EXPORT_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Explicit path, then configured export, then discovery under the game install
pub fn locate_export(
    explicit: Option<&Path>,
    config: &AppConfig,
    settings: &dyn SettingsStore,
) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        return Ok(Some(path.to_path_buf()));
    }
    if let Some(path) = &config.export_path {
        return Ok(Some(path.clone()));
    }

    let game_path = match &config.game_path {
        Some(path) => Some(path.clone()),
        None => settings.get_setting(SETTING_GAME_PATH)?.map(PathBuf::from),
    };
    Ok(game_path.and_then(|game| find_export_file(&game)))
}

/// Read an export; invalid UTF-8 is replaced rather than rejected
pub fn read_export(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn load_export(text: &str, parser: &TableParser) -> ExportDocument {
    extract_export(&parser.parse(text))
}

/// SHA-256 of the export text, hex encoded
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// IMPORT
// ============================================================================

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Auto-import: skip unchanged exports and suppress result notifications
    pub silent: bool,
    pub parser: TableParser,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            silent: false,
            parser: TableParser::new(),
        }
    }
}

#[derive(Debug)]
pub enum ImportOutcome {
    /// Silent import of an export identical to the last one
    Unchanged,
    /// Export held no characters (missing, empty or unparsable)
    NoData,
    Imported {
        report: ReconciliationReport,
        /// Addon version when it differs from this tracker's
        version_mismatch: Option<String>,
    },
}

pub fn run_import(
    store: &mut SqliteStore,
    text: &str,
    options: &ImportOptions,
    clock: &dyn Clock,
    notifier: &mut dyn Notifier,
) -> Result<ImportOutcome> {
    let hash = fingerprint(text);
    if options.silent && store.get_setting(SETTING_LAST_IMPORT_HASH)?.as_deref() == Some(hash.as_str()) {
        debug!("export unchanged since last import");
        return Ok(ImportOutcome::Unchanged);
    }

    let document = load_export(text, &options.parser);
    if document.is_empty() {
        warn!("export contained no character data");
        publish(
            store,
            notifier,
            "No data found: could not parse character data from addon file.",
            NotificationKind::Warning,
        )?;
        return Ok(ImportOutcome::NoData);
    }

    let version_mismatch = document
        .addon_version
        .clone()
        .filter(|version| version != crate::VERSION);
    if let Some(version) = &version_mismatch {
        warn!(addon = %version, tracker = crate::VERSION, "version mismatch");
        publish(
            store,
            notifier,
            format!(
                "Addon version {} does not match tracker version {}. Update both to the same release.",
                version,
                crate::VERSION
            ),
            NotificationKind::Warning,
        )?;
    }

    let week = current_week_id(clock);
    let roster = store.load_roster()?;
    let report = reconcile(roster, &document.characters, &week);

    info!(
        updated = report.updated,
        added = report.added,
        stale = report.stale,
        skipped = report.skipped,
        week = %week,
        "reconciled addon export"
    );

    if report.has_changes() {
        store.save_roster(&report.roster)?;
        store.record_reconciliation(&report)?;
    }
    store.set_setting(SETTING_LAST_IMPORT_HASH, &hash)?;

    if !options.silent {
        let kind = if report.has_changes() {
            NotificationKind::Success
        } else {
            NotificationKind::Info
        };
        publish(store, notifier, report.summary(), kind)?;
    }

    Ok(ImportOutcome::Imported {
        report,
        version_mismatch,
    })
}

// ============================================================================
// WEEKLY RESET
// ============================================================================

/// Zero weekly fields once per epoch; returns true when a reset happened
///
/// The first run only records the current week.
pub fn check_weekly_reset(store: &mut SqliteStore, clock: &dyn Clock) -> Result<bool> {
    let current = current_week_id(clock);
    let last = store.get_setting(SETTING_LAST_WEEK_ID)?;
    debug!(current = %current, last = ?last, "weekly reset check");

    match last {
        None => {
            store.set_setting(SETTING_LAST_WEEK_ID, current.as_str())?;
            Ok(false)
        }
        Some(last) if current.matches(&last) => Ok(false),
        Some(last) => {
            reset_weekly_all(store, &last, &current)?;
            Ok(true)
        }
    }
}

/// Zero weekly fields of every record and stamp them with `current`
pub fn reset_weekly_all(store: &mut SqliteStore, previous: &str, current: &WeekId) -> Result<usize> {
    let mut roster = store.load_roster()?;
    for record in &mut roster {
        record.reset_weekly(current);
    }
    store.save_roster(&roster)?;
    store.record_weekly_reset(previous, current, roster.len())?;
    store.set_setting(SETTING_LAST_WEEK_ID, current.as_str())?;

    info!(previous = %previous, current = %current, characters = roster.len(), "weekly reset applied");
    Ok(roster.len())
}

// ============================================================================
// TESTS
// ============================================================================
