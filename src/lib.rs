// Vault Tracker - Core Library
// Weekly gear and Great Vault progress for a roster of characters,
// fed by the in-game addon's SavedVariables export.

pub mod value;          // Value tree produced by the parser
pub mod parser;         // Addon table-text parser
pub mod temporal;       // Weekly reset epochs
pub mod extract;        // Typed view over parsed character tables
pub mod analyzer;       // Vault, socket, enchant and status analysis
pub mod entities;       // Stored character records
pub mod reconciliation; // Merge an export into the stored roster
pub mod notification;   // User-facing messages + history
pub mod db;             // SQLite store
pub mod config;         // Environment configuration
pub mod import;         // Import pipeline + weekly reset
pub mod report;         // Markdown / CSV report

// Re-export commonly used types
pub use value::{Key, Number, Table, Value};
pub use parser::{parse, ParseError, TableParser, DEFAULT_MAX_DEPTH};
pub use temporal::{
    current_week_id, next_reset, reset_boundary, week_id_for,
    Clock, FixedClock, SystemClock, WeekId,
};
pub use extract::{extract_export, CharacterFields, ExportDocument, ParsedCharacter};
pub use analyzer::{analyze_all, analyze_character, CharacterAnalysis, RewardTier, Status, VaultInfo};
pub use entities::CharacterRecord;
pub use reconciliation::{reconcile, CharacterChange, ReconciliationEngine, ReconciliationReport};
pub use notification::{ConsoleNotifier, Notification, NotificationKind, NotificationLog, Notifier};
pub use db::{Event, RosterStore, SettingsStore, SqliteStore};
pub use config::AppConfig;
pub use import::{check_weekly_reset, run_import, ImportOptions, ImportOutcome};
pub use report::{build_report, write_csv};

/// Library version, compared against the addon's export version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
