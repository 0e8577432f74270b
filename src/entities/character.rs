// 🧙 Character Entity - One row of the roster
//
// Identity is the case-insensitive (name, realm) pair; `id` is a stable
// surrogate used by the store and the audit log. Gear counts are long-lived,
// weekly fields describe the epoch named by `week_id`, and `notes` belong
// to the user alone.

use crate::temporal::WeekId;
use serde::{Deserialize, Serialize};

pub const MAX_ITEM_LEVEL: f64 = 1000.0;
pub const MAX_ITEMS_PER_CATEGORY: i64 = 50;
pub const MAX_DELVES: i64 = 8;
pub const MAX_GILDED_STASH: i64 = 3;
/// Timewalking quest requires this many dungeon completions
pub const MAX_TIMEWALK: i64 = 5;

/// Weekly fields, zeroed on reset and excluded from stale merges
pub const WEEKLY_FIELDS: [&str; 6] = [
    "vault_visited",
    "delves",
    "gilded_stash",
    "gearing_up",
    "quests",
    "timewalk",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterRecord {
    // ========================================================================
    // IDENTITY
    // ========================================================================
    pub id: String,
    pub realm: String,
    pub name: String,

    // ========================================================================
    // GEAR (non-weekly)
    // ========================================================================
    pub guild: String,
    pub item_level: f64,
    pub heroic_items: i64,
    pub champion_items: i64,
    pub veteran_items: i64,
    pub adventure_items: i64,
    pub old_items: i64,
    pub upgrade_current: i64,
    pub upgrade_max: i64,
    pub socket_missing_count: i64,
    pub socket_empty_count: i64,
    pub enchant_missing_count: i64,

    // ========================================================================
    // WEEKLY
    // ========================================================================
    pub vault_visited: bool,
    pub delves: i64,
    pub gilded_stash: i64,
    pub gearing_up: bool,
    pub quests: bool,
    pub timewalk: i64,

    // ========================================================================
    // USER + BOOKKEEPING
    // ========================================================================
    /// Free text; imports never write it
    pub notes: String,
    /// Epoch the weekly fields describe; empty when unknown
    pub week_id: String,
}

impl Default for CharacterRecord {
    fn default() -> Self {
        CharacterRecord {
            id: uuid::Uuid::new_v4().to_string(),
            realm: String::new(),
            name: String::new(),
            guild: String::new(),
            item_level: 0.0,
            heroic_items: 0,
            champion_items: 0,
            veteran_items: 0,
            adventure_items: 0,
            old_items: 0,
            upgrade_current: 0,
            upgrade_max: 0,
            socket_missing_count: 0,
            socket_empty_count: 0,
            enchant_missing_count: 0,
            vault_visited: false,
            delves: 0,
            gilded_stash: 0,
            gearing_up: false,
            quests: false,
            timewalk: 0,
            notes: String::new(),
            week_id: String::new(),
        }
    }
}

impl CharacterRecord {
    pub fn new(realm: impl Into<String>, name: impl Into<String>) -> Self {
        CharacterRecord {
            realm: realm.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}-{}", self.name, self.realm)
    }

    /// Lower-cased (name, realm) identity key
    pub fn identity(&self) -> (String, String) {
        (self.name.to_lowercase(), self.realm.to_lowercase())
    }

    pub fn matches(&self, name: &str, realm: &str) -> bool {
        self.identity() == (name.to_lowercase(), realm.to_lowercase())
    }

    /// Human-readable problems; empty when the record is valid
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Character name is required".to_string());
        }
        if self.realm.trim().is_empty() {
            errors.push("Realm is required".to_string());
        }
        if !(0.0..=MAX_ITEM_LEVEL).contains(&self.item_level) {
            errors.push(format!("Item level must be between 0 and {}", MAX_ITEM_LEVEL));
        }

        let counts = [
            ("heroic_items", self.heroic_items),
            ("champion_items", self.champion_items),
            ("veteran_items", self.veteran_items),
            ("adventure_items", self.adventure_items),
            ("old_items", self.old_items),
        ];
        for (field, value) in counts {
            if !(0..=MAX_ITEMS_PER_CATEGORY).contains(&value) {
                errors.push(format!(
                    "{} must be between 0 and {}",
                    field, MAX_ITEMS_PER_CATEGORY
                ));
            }
        }

        if !(0..=MAX_DELVES).contains(&self.delves) {
            errors.push(format!("Delves must be between 0 and {}", MAX_DELVES));
        }
        if !(0..=MAX_GILDED_STASH).contains(&self.gilded_stash) {
            errors.push(format!("Gilded stash must be between 0 and {}", MAX_GILDED_STASH));
        }
        if !(0..=MAX_TIMEWALK).contains(&self.timewalk) {
            errors.push(format!("Timewalk must be between 0 and {}", MAX_TIMEWALK));
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Zero the weekly fields; identity, gear and notes are kept
    pub fn reset_weekly(&mut self, week: &WeekId) {
        self.vault_visited = false;
        self.delves = 0;
        self.gilded_stash = 0;
        self.gearing_up = false;
        self.quests = false;
        self.timewalk = 0;
        self.week_id = week.to_string();
    }
}

// ============================================================================
// TESTS
// ============================================================================
