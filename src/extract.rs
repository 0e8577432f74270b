// 🔎 Field Extraction - Typed view over a parsed addon export
// Turns the generic Value tree into per-character fields.
//
// Every field is optional: "absent" and "present" must stay distinguishable
// for the merge step. List-or-map shapes are normalised to lists here so
// the analyzer never sees them.

use crate::entities::character::MAX_TIMEWALK;
use crate::value::{Table, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// EXPORT DOCUMENT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportDocument {
    /// `metadata.version` written by the addon
    pub addon_version: Option<String>,
    pub characters: Vec<ParsedCharacter>,
}

impl ExportDocument {
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedCharacter {
    pub name: String,
    pub realm: String,
    pub fields: CharacterFields,
}

impl ParsedCharacter {
    pub fn full_name(&self) -> String {
        format!("{}-{}", self.name, self.realm)
    }
}

// ============================================================================
// FIELD GROUPS
// ============================================================================

/// One vault row: completed activities plus the threshold → level detail
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityRow {
    pub count: i64,
    /// (threshold, difficulty level) in export order
    pub detail: Vec<(i64, i64)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocketFields {
    pub socketable_count: i64,
    pub socketed_count: i64,
    pub empty_count: i64,
    /// Slot ids that could hold a socket but have none
    pub missing_slots: Vec<i64>,
    /// Slot ids with a socket but no gem
    pub empty_slots: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnchantFields {
    pub enchantable_count: i64,
    pub enchant_count: i64,
    pub missing_slots: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimewalkQuest {
    pub progress: i64,
    pub completed: bool,
    pub accepted: bool,
}

impl TimewalkQuest {
    /// Completions this week, 0..=5
    pub fn done(&self) -> i64 {
        if self.completed {
            MAX_TIMEWALK
        } else {
            self.progress.clamp(0, MAX_TIMEWALK)
        }
    }
}

/// Per-slot upgrade track, e.g. Head on the Hero track at 5/8
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotUpgrade {
    pub slot: i64,
    pub slot_name: String,
    pub track: String,
    pub current: i64,
    pub max: i64,
}

impl SlotUpgrade {
    pub fn is_pending(&self) -> bool {
        self.current < self.max
    }
}

/// Typed fields of one character; `None` means the export did not carry it
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CharacterFields {
    pub guild: Option<String>,
    pub class: Option<String>,
    pub item_level: Option<f64>,
    pub heroic_items: Option<i64>,
    pub champion_items: Option<i64>,
    pub veteran_items: Option<i64>,
    pub adventure_items: Option<i64>,
    pub old_items: Option<i64>,
    pub upgrade_current: Option<i64>,
    pub upgrade_max: Option<i64>,
    pub sockets: Option<SocketFields>,
    pub enchants: Option<EnchantFields>,
    pub slot_upgrades: Vec<SlotUpgrade>,

    // Weekly
    pub vault_visited: Option<bool>,
    pub gearing_up: Option<bool>,
    pub quests: Option<bool>,
    pub vault_delves: Option<ActivityRow>,
    pub vault_dungeons: Option<ActivityRow>,
    pub delves: Option<i64>,
    pub gilded_stash: Option<i64>,
    pub timewalking: Option<TimewalkQuest>,
    pub timewalk: Option<i64>,

    pub week_id: Option<String>,
}

impl CharacterFields {
    /// Read every known field from a character table
    pub fn from_table(t: &Table) -> Self {
        let gearing_up = bool_field(t, "gearing_up");
        let vault_delves = activity_row(t, "vault_delves", "tiers");
        let timewalking = timewalk_quest(t);

        // Gearing Up is itself a delve; it is tracked separately
        let delves = vault_delves.as_ref().map(|row| {
            let bonus = if gearing_up == Some(true) { 1 } else { 0 };
            row.count.saturating_sub(bonus).max(0)
        });

        CharacterFields {
            guild: string_field(t, "guild"),
            class: string_field(t, "class"),
            item_level: t.field("item_level").and_then(Value::as_f64),
            heroic_items: int_field(t, "heroic_items"),
            champion_items: int_field(t, "champion_items"),
            veteran_items: int_field(t, "veteran_items"),
            adventure_items: int_field(t, "adventure_items"),
            old_items: int_field(t, "old_items"),
            upgrade_current: int_field(t, "upgrade_current"),
            upgrade_max: int_field(t, "upgrade_max"),
            sockets: socket_fields(t),
            enchants: enchant_fields(t),
            slot_upgrades: slot_upgrades(t),
            vault_visited: bool_field(t, "vault_visited"),
            gearing_up,
            quests: bool_field(t, "quests"),
            vault_dungeons: activity_row(t, "vault_dungeons", "levels"),
            vault_delves,
            delves,
            gilded_stash: t
                .field("gilded_stash")
                .and_then(Value::as_table)
                .and_then(|g| int_field(g, "claimed")),
            timewalk: timewalking.as_ref().map(TimewalkQuest::done),
            timewalking,
            week_id: string_field(t, "week_id"),
        }
    }

    /// Copy with every weekly field cleared (data from a past week)
    pub fn without_weekly(&self) -> Self {
        CharacterFields {
            vault_visited: None,
            gearing_up: None,
            quests: None,
            vault_delves: None,
            vault_dungeons: None,
            delves: None,
            gilded_stash: None,
            timewalking: None,
            timewalk: None,
            ..self.clone()
        }
    }

    /// Gear below the top upgrade track (old gear is not counted)
    pub fn sub_top_items(&self) -> i64 {
        self.champion_items
            .unwrap_or(0)
            .saturating_add(self.veteran_items.unwrap_or(0))
            .saturating_add(self.adventure_items.unwrap_or(0))
    }

    /// True when this data describes `week`; records without a week id never do
    pub fn is_from_week(&self, week: &str) -> bool {
        self.week_id.as_deref() == Some(week)
    }
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Split `"Name-Realm"` at the last dash
pub fn split_character_key(key: &str) -> Option<(&str, &str)> {
    key.rsplit_once('-')
}

pub fn extract_character(key: &str, data: &Value) -> Option<ParsedCharacter> {
    let Some((name, realm)) = split_character_key(key) else {
        debug!(key, "character key without realm skipped");
        return None;
    };
    let Some(table) = data.as_table() else {
        debug!(key, kind = data.type_name(), "character entry is not a table");
        return None;
    };

    Some(ParsedCharacter {
        name: name.to_string(),
        realm: realm.to_string(),
        fields: CharacterFields::from_table(table),
    })
}

/// Extract the addon version and every character from a parsed export
pub fn extract_export(root: &Value) -> ExportDocument {
    let addon_version = root
        .path(&["metadata", "version"])
        .and_then(Value::as_str)
        .map(str::to_string);

    let characters = root
        .path(&["characters"])
        .and_then(Value::as_table)
        .map(|chars| {
            chars
                .iter()
                .filter_map(|(key, data)| extract_character(&key.to_string(), data))
                .collect()
        })
        .unwrap_or_default();

    ExportDocument {
        addon_version,
        characters,
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn string_field(t: &Table, name: &str) -> Option<String> {
    t.field(name).and_then(Value::as_str).map(str::to_string)
}

fn int_field(t: &Table, name: &str) -> Option<i64> {
    t.field(name).and_then(Value::as_i64)
}

fn bool_field(t: &Table, name: &str) -> Option<bool> {
    t.field(name).and_then(Value::as_bool)
}

/// Numbers held by a list-or-map table, in table order
fn number_list(t: &Table, name: &str) -> Vec<i64> {
    match t.field(name) {
        Some(Value::Table(items)) => items.values().filter_map(Value::as_i64).collect(),
        Some(other) if !other.is_nil() => {
            debug!(field = name, kind = other.type_name(), "expected a list of slot ids");
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn activity_row(t: &Table, row: &str, detail: &str) -> Option<ActivityRow> {
    let row_table = t.field(row).and_then(Value::as_table)?;
    let detail = row_table
        .field(detail)
        .and_then(Value::as_table)
        .map(|d| {
            d.iter()
                .filter_map(|(key, level)| {
                    let threshold = key.as_int().or_else(|| key.as_str()?.parse().ok())?;
                    Some((threshold, level.as_i64()?))
                })
                .collect()
        })
        .unwrap_or_default();

    Some(ActivityRow {
        count: int_field(row_table, "count").unwrap_or(0),
        detail,
    })
}

fn socket_fields(t: &Table) -> Option<SocketFields> {
    let s = t.field("socket_info").and_then(Value::as_table)?;
    Some(SocketFields {
        socketable_count: int_field(s, "socketable_count").unwrap_or(0),
        socketed_count: int_field(s, "socketed_count").unwrap_or(0),
        empty_count: int_field(s, "empty_count").unwrap_or(0),
        missing_slots: number_list(s, "missing_sockets"),
        empty_slots: number_list(s, "empty_sockets"),
    })
}

fn enchant_fields(t: &Table) -> Option<EnchantFields> {
    let e = t.field("enchant_info").and_then(Value::as_table)?;
    Some(EnchantFields {
        enchantable_count: int_field(e, "enchantable_count").unwrap_or(0),
        enchant_count: int_field(e, "enchant_count").unwrap_or(0),
        missing_slots: number_list(e, "missing_enchants"),
    })
}

fn timewalk_quest(t: &Table) -> Option<TimewalkQuest> {
    let q = t.field("timewalking_quest").and_then(Value::as_table)?;
    Some(TimewalkQuest {
        progress: int_field(q, "progress").unwrap_or(0),
        completed: bool_field(q, "completed").unwrap_or(false),
        accepted: bool_field(q, "accepted").unwrap_or(false),
    })
}

fn slot_upgrades(t: &Table) -> Vec<SlotUpgrade> {
    let Some(list) = t.field("slot_upgrades").and_then(Value::as_table) else {
        return Vec::new();
    };
    list.values()
        .filter_map(Value::as_table)
        .filter_map(|entry| {
            let slot = int_field(entry, "slot").unwrap_or(0);
            let track = string_field(entry, "track").unwrap_or_default();
            if slot <= 0 || track.is_empty() {
                return None;
            }
            Some(SlotUpgrade {
                slot,
                slot_name: string_field(entry, "slot_name").unwrap_or_default(),
                track,
                current: int_field(entry, "current").unwrap_or(0),
                max: int_field(entry, "max").unwrap_or(0),
            })
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
