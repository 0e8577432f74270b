// 🗄️ SQLite Store - Roster, settings, audit events and notification history
//
// One connection, one writer. Saving the roster replaces it wholesale inside
// a single transaction, so readers see either the old or the new roster.

use crate::entities::CharacterRecord;
use crate::notification::{Notification, NotificationKind, NotificationLog, MAX_NOTIFICATIONS};
use crate::reconciliation::ReconciliationReport;
use crate::temporal::WeekId;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SETTING_LAST_WEEK_ID: &str = "last_week_id";
pub const SETTING_LAST_IMPORT_HASH: &str = "last_import_hash";
pub const SETTING_GAME_PATH: &str = "game_path";

// ============================================================================
// STORE SEAMS
// ============================================================================

/// Load/save round-trip for the character roster
pub trait RosterStore {
    fn load_roster(&self) -> Result<Vec<CharacterRecord>>;
    /// Replace the stored roster atomically
    fn save_roster(&mut self, roster: &[CharacterRecord]) -> Result<()>;
}

/// Key-value configuration store
pub trait SettingsStore {
    fn get_setting(&self, key: &str) -> Result<Option<String>>;
    fn set_setting(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove_setting(&mut self, key: &str) -> Result<()>;
}

// ============================================================================
// EVENTS
// ============================================================================

/// Audit trail entry
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL for crash recovery; in-memory databases report "memory" instead
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS characters (
            id TEXT PRIMARY KEY,
            position INTEGER NOT NULL,
            realm TEXT NOT NULL,
            name TEXT NOT NULL,
            guild TEXT NOT NULL DEFAULT '',
            item_level REAL NOT NULL DEFAULT 0,
            heroic_items INTEGER NOT NULL DEFAULT 0,
            champion_items INTEGER NOT NULL DEFAULT 0,
            veteran_items INTEGER NOT NULL DEFAULT 0,
            adventure_items INTEGER NOT NULL DEFAULT 0,
            old_items INTEGER NOT NULL DEFAULT 0,
            upgrade_current INTEGER NOT NULL DEFAULT 0,
            upgrade_max INTEGER NOT NULL DEFAULT 0,
            socket_missing_count INTEGER NOT NULL DEFAULT 0,
            socket_empty_count INTEGER NOT NULL DEFAULT 0,
            enchant_missing_count INTEGER NOT NULL DEFAULT 0,
            vault_visited INTEGER NOT NULL DEFAULT 0,
            delves INTEGER NOT NULL DEFAULT 0,
            gilded_stash INTEGER NOT NULL DEFAULT 0,
            gearing_up INTEGER NOT NULL DEFAULT 0,
            quests INTEGER NOT NULL DEFAULT 0,
            timewalk INTEGER NOT NULL DEFAULT 0,
            notes TEXT NOT NULL DEFAULT '',
            week_id TEXT NOT NULL DEFAULT '',
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS notifications (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT UNIQUE NOT NULL,
            message TEXT NOT NULL,
            kind TEXT NOT NULL,
            timestamp TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_characters_identity
         ON characters(name COLLATE NOCASE, realm COLLATE NOCASE)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
        [],
    )?;

    Ok(())
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ============================================================================
// EVENT LOG
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    let timestamp_str: String = row.get(1)?;
    let data_json: String = row.get(5)?;

    Ok(Event {
        event_id: row.get(0)?,
        timestamp: parse_timestamp(1, &timestamp_str)?,
        event_type: row.get(2)?,
        entity_type: row.get(3)?,
        entity_id: row.get(4)?,
        data: serde_json::from_str(&data_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
        actor: row.get(6)?,
    })
}

/// Get events for a specific entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], event_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

/// Most recent events of any kind
pub fn recent_events(conn: &Connection, limit: usize) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         ORDER BY timestamp DESC, id DESC
         LIMIT ?1",
    )?;

    let events = stmt
        .query_map(params![limit as i64], event_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        setup_database(&conn).context("Failed to set up database schema")?;
        Ok(SqliteStore { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn character_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM characters", [], |row| row.get(0))?;
        Ok(count)
    }

    /// One audit event per added or updated character
    pub fn record_reconciliation(&self, report: &ReconciliationReport) -> Result<usize> {
        let mut written = 0;
        for change in &report.changes {
            let Some(record) = report
                .roster
                .iter()
                .find(|r| r.full_name() == change.character)
            else {
                continue;
            };
            let event_type = if change.added {
                "character_added"
            } else {
                "character_updated"
            };
            let event = Event::new(
                event_type,
                "character",
                &record.id,
                serde_json::json!({
                    "character": change.character,
                    "fields": change.fields,
                    "stale": change.stale,
                    "week_id": report.week.as_str(),
                }),
                "addon_import",
            );
            insert_event(&self.conn, &event)?;
            written += 1;
        }
        Ok(written)
    }

    pub fn record_weekly_reset(&self, previous: &str, current: &WeekId, characters: usize) -> Result<()> {
        let event = Event::new(
            "weekly_reset",
            "roster",
            current.as_str(),
            serde_json::json!({
                "previous_week_id": previous,
                "characters": characters,
            }),
            "weekly_reset",
        );
        insert_event(&self.conn, &event)
    }
}

fn character_from_row(row: &Row<'_>) -> rusqlite::Result<CharacterRecord> {
    Ok(CharacterRecord {
        id: row.get("id")?,
        realm: row.get("realm")?,
        name: row.get("name")?,
        guild: row.get("guild")?,
        item_level: row.get("item_level")?,
        heroic_items: row.get("heroic_items")?,
        champion_items: row.get("champion_items")?,
        veteran_items: row.get("veteran_items")?,
        adventure_items: row.get("adventure_items")?,
        old_items: row.get("old_items")?,
        upgrade_current: row.get("upgrade_current")?,
        upgrade_max: row.get("upgrade_max")?,
        socket_missing_count: row.get("socket_missing_count")?,
        socket_empty_count: row.get("socket_empty_count")?,
        enchant_missing_count: row.get("enchant_missing_count")?,
        vault_visited: row.get("vault_visited")?,
        delves: row.get("delves")?,
        gilded_stash: row.get("gilded_stash")?,
        gearing_up: row.get("gearing_up")?,
        quests: row.get("quests")?,
        timewalk: row.get("timewalk")?,
        notes: row.get("notes")?,
        week_id: row.get("week_id")?,
    })
}

impl RosterStore for SqliteStore {
    fn load_roster(&self) -> Result<Vec<CharacterRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, realm, name, guild, item_level,
                    heroic_items, champion_items, veteran_items, adventure_items, old_items,
                    upgrade_current, upgrade_max,
                    socket_missing_count, socket_empty_count, enchant_missing_count,
                    vault_visited, delves, gilded_stash, gearing_up, quests, timewalk,
                    notes, week_id
             FROM characters
             ORDER BY position",
        )?;

        let roster = stmt
            .query_map([], character_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read roster")?;

        Ok(roster)
    }

    fn save_roster(&mut self, roster: &[CharacterRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM characters", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO characters (
                    id, position, realm, name, guild, item_level,
                    heroic_items, champion_items, veteran_items, adventure_items, old_items,
                    upgrade_current, upgrade_max,
                    socket_missing_count, socket_empty_count, enchant_missing_count,
                    vault_visited, delves, gilded_stash, gearing_up, quests, timewalk,
                    notes, week_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                          ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)",
            )?;

            for (position, c) in roster.iter().enumerate() {
                stmt.execute(params![
                    c.id,
                    position as i64,
                    c.realm,
                    c.name,
                    c.guild,
                    c.item_level,
                    c.heroic_items,
                    c.champion_items,
                    c.veteran_items,
                    c.adventure_items,
                    c.old_items,
                    c.upgrade_current,
                    c.upgrade_max,
                    c.socket_missing_count,
                    c.socket_empty_count,
                    c.enchant_missing_count,
                    c.vault_visited,
                    c.delves,
                    c.gilded_stash,
                    c.gearing_up,
                    c.quests,
                    c.timewalk,
                    c.notes,
                    c.week_id,
                ])
                .with_context(|| format!("Failed to save {}", c.full_name()))?;
            }
        }
        tx.commit().context("Failed to commit roster")?;
        Ok(())
    }
}

impl SettingsStore for SqliteStore {
    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_setting(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_setting(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl NotificationLog for SqliteStore {
    fn add_notification(&mut self, notification: &Notification) -> Result<()> {
        self.conn.execute(
            "INSERT INTO notifications (id, message, kind, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![
                notification.id,
                notification.message,
                notification.kind.as_str(),
                notification.timestamp.to_rfc3339(),
            ],
        )?;
        self.conn.execute(
            "DELETE FROM notifications WHERE seq NOT IN (
                SELECT seq FROM notifications ORDER BY seq DESC LIMIT ?1
            )",
            params![MAX_NOTIFICATIONS as i64],
        )?;
        Ok(())
    }

    fn notifications(&self) -> Result<Vec<Notification>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, message, kind, timestamp FROM notifications ORDER BY seq DESC",
        )?;

        let list = stmt
            .query_map([], |row| {
                let kind: String = row.get(2)?;
                let timestamp: String = row.get(3)?;
                Ok(Notification {
                    id: row.get(0)?,
                    message: row.get(1)?,
                    kind: NotificationKind::parse(&kind),
                    timestamp: parse_timestamp(3, &timestamp)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(list)
    }

    fn remove_notification(&mut self, id: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM notifications WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    fn clear_notifications(&mut self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM notifications", [])?;
        Ok(removed)
    }
}

// ============================================================================
// TESTS
// ============================================================================
