// ⚖️ Reconciliation Engine - Merge an addon export into the stored roster
//
// Matching is case-insensitive on (name, realm). For a match, every field the
// export carries that differs from the stored value is applied; `notes` is
// never touched. Characters whose export is from another week keep their
// weekly fields, but gear still updates. Fresh data landing on a record from
// an older week zeroes that record's weekly fields first.

use crate::analyzer::{enchant_info, socket_info};
use crate::entities::{CharacterRecord, WEEKLY_FIELDS};
use crate::extract::{CharacterFields, ParsedCharacter};
use crate::temporal::WeekId;
use serde::Serialize;
use tracing::debug;

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

/// What happened to one character during a merge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterChange {
    pub character: String,
    pub added: bool,
    pub stale: bool,
    /// Names of the fields written (empty for additions)
    pub fields: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub week: WeekId,
    pub updated: usize,
    pub added: usize,
    /// Incoming characters whose data belongs to another week
    pub stale: usize,
    /// Incoming characters without a name or realm
    pub skipped: usize,
    pub roster: Vec<CharacterRecord>,
    pub changes: Vec<CharacterChange>,
}

impl ReconciliationReport {
    pub fn has_changes(&self) -> bool {
        self.updated > 0 || self.added > 0
    }

    /// (updated, added, roster)
    pub fn into_parts(self) -> (usize, usize, Vec<CharacterRecord>) {
        (self.updated, self.added, self.roster)
    }

    pub fn summary(&self) -> String {
        if !self.has_changes() {
            return "All characters up to date.".to_string();
        }

        let plural = |n: usize| if n == 1 { "character" } else { "characters" };
        let mut msg = match (self.updated, self.added) {
            (u, a) if u > 0 && a > 0 => format!("Updated {}, added {} {}.", u, a, plural(u + a)),
            (u, 0) => format!("Updated {} {}.", u, plural(u)),
            (_, a) => format!("Added {} {}.", a, plural(a)),
        };
        if self.stale > 0 {
            msg.push_str(&format!(" ({} stale)", self.stale));
        }
        msg
    }
}

// ============================================================================
// FIELD MERGE
// ============================================================================

/// Write `incoming` into `slot` when present and different
fn apply<T: PartialEq>(
    slot: &mut T,
    incoming: Option<T>,
    field: &'static str,
    changed: &mut Vec<&'static str>,
) {
    if let Some(value) = incoming {
        if *slot != value {
            *slot = value;
            if !changed.contains(&field) {
                changed.push(field);
            }
        }
    }
}

/// Zero weekly fields still describing an older week; returns the fields cleared
fn roll_over(record: &mut CharacterRecord, current_week: &WeekId) -> Vec<&'static str> {
    if record.week_id.is_empty() || current_week.matches(&record.week_id) {
        return Vec::new();
    }

    let before = record.clone();
    record.reset_weekly(current_week);

    [
        (before.vault_visited != record.vault_visited, WEEKLY_FIELDS[0]),
        (before.delves != record.delves, WEEKLY_FIELDS[1]),
        (before.gilded_stash != record.gilded_stash, WEEKLY_FIELDS[2]),
        (before.gearing_up != record.gearing_up, WEEKLY_FIELDS[3]),
        (before.quests != record.quests, WEEKLY_FIELDS[4]),
        (before.timewalk != record.timewalk, WEEKLY_FIELDS[5]),
        (true, "week_id"),
    ]
    .into_iter()
    .filter_map(|(differs, field)| differs.then_some(field))
    .collect()
}

/// Merge extracted fields into a record; returns the fields written
fn merge_fields(
    record: &mut CharacterRecord,
    fields: &CharacterFields,
    include_weekly: bool,
    current_week: &WeekId,
) -> Vec<&'static str> {
    let mut changed = Vec::new();

    apply(&mut record.guild, fields.guild.clone(), "guild", &mut changed);
    apply(&mut record.item_level, fields.item_level, "item_level", &mut changed);
    apply(&mut record.heroic_items, fields.heroic_items, "heroic_items", &mut changed);
    apply(&mut record.champion_items, fields.champion_items, "champion_items", &mut changed);
    apply(&mut record.veteran_items, fields.veteran_items, "veteran_items", &mut changed);
    apply(&mut record.adventure_items, fields.adventure_items, "adventure_items", &mut changed);
    apply(&mut record.old_items, fields.old_items, "old_items", &mut changed);
    apply(&mut record.upgrade_current, fields.upgrade_current, "upgrade_current", &mut changed);
    apply(&mut record.upgrade_max, fields.upgrade_max, "upgrade_max", &mut changed);

    if fields.sockets.is_some() {
        let sockets = socket_info(fields);
        apply(&mut record.socket_missing_count, Some(sockets.missing_count), "socket_missing_count", &mut changed);
        apply(&mut record.socket_empty_count, Some(sockets.empty_count), "socket_empty_count", &mut changed);
    }
    if fields.enchants.is_some() {
        let enchants = enchant_info(fields);
        apply(&mut record.enchant_missing_count, Some(enchants.missing_count), "enchant_missing_count", &mut changed);
    }

    if include_weekly {
        for field in roll_over(record, current_week) {
            if !changed.contains(&field) {
                changed.push(field);
            }
        }
        apply(&mut record.vault_visited, fields.vault_visited, WEEKLY_FIELDS[0], &mut changed);
        apply(&mut record.delves, fields.delves, WEEKLY_FIELDS[1], &mut changed);
        apply(&mut record.gilded_stash, fields.gilded_stash, WEEKLY_FIELDS[2], &mut changed);
        apply(&mut record.gearing_up, fields.gearing_up, WEEKLY_FIELDS[3], &mut changed);
        apply(&mut record.quests, fields.quests, WEEKLY_FIELDS[4], &mut changed);
        apply(&mut record.timewalk, fields.timewalk, WEEKLY_FIELDS[5], &mut changed);
        apply(&mut record.week_id, Some(current_week.to_string()), "week_id", &mut changed);
    }

    changed
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

pub struct ReconciliationEngine {
    current_week: WeekId,
}

impl ReconciliationEngine {
    pub fn new(current_week: WeekId) -> Self {
        ReconciliationEngine { current_week }
    }

    pub fn current_week(&self) -> &WeekId {
        &self.current_week
    }

    /// Incoming data from a different, known week
    pub fn is_stale(&self, fields: &CharacterFields) -> bool {
        match fields.week_id.as_deref() {
            Some(week) if !week.is_empty() => !self.current_week.matches(week),
            _ => false,
        }
    }

    /// Merge `incoming` into `stored`
    ///
    /// ```
    /// use vault_tracker::{CharacterRecord, ReconciliationEngine, WeekId};
    ///
    /// let stored = vec![CharacterRecord::new("Draenor", "Thrall")];
    /// let engine = ReconciliationEngine::new(WeekId::new("20241224"));
    ///
    /// let report = engine.reconcile(stored.clone(), &[]);
    /// assert_eq!(report.into_parts(), (0, 0, stored));
    /// ```
    pub fn reconcile(
        &self,
        stored: Vec<CharacterRecord>,
        incoming: &[ParsedCharacter],
    ) -> ReconciliationReport {
        let mut report = ReconciliationReport {
            week: self.current_week.clone(),
            updated: 0,
            added: 0,
            stale: 0,
            skipped: 0,
            roster: stored,
            changes: Vec::new(),
        };

        for character in incoming {
            let name = character.name.trim();
            let realm = character.realm.trim();
            if name.is_empty() || realm.is_empty() {
                report.skipped += 1;
                continue;
            }

            let stale = self.is_stale(&character.fields);
            if stale {
                report.stale += 1;
                debug!(
                    character = %character.full_name(),
                    week = ?character.fields.week_id,
                    current = %self.current_week,
                    "stale weekly data excluded"
                );
            }

            let existing = report.roster.iter_mut().find(|r| r.matches(name, realm));
            match existing {
                Some(record) => {
                    let fields = merge_fields(record, &character.fields, !stale, &self.current_week);
                    if !fields.is_empty() {
                        debug!(character = %record.full_name(), ?fields, "character updated");
                        report.updated += 1;
                        report.changes.push(CharacterChange {
                            character: record.full_name(),
                            added: false,
                            stale,
                            fields,
                        });
                    }
                }
                None => {
                    let mut record = CharacterRecord::new(realm, name);
                    merge_fields(&mut record, &character.fields, !stale, &self.current_week);
                    debug!(character = %record.full_name(), stale, "character added");
                    report.added += 1;
                    report.changes.push(CharacterChange {
                        character: record.full_name(),
                        added: true,
                        stale,
                        fields: Vec::new(),
                    });
                    report.roster.push(record);
                }
            }
        }

        report
    }
}

/// Merge an export into the roster for `current_week`
pub fn reconcile(
    stored: Vec<CharacterRecord>,
    incoming: &[ParsedCharacter],
    current_week: &WeekId,
) -> ReconciliationReport {
    ReconciliationEngine::new(current_week.clone()).reconcile(stored, incoming)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{SocketFields, TimewalkQuest};

    const WEEK: &str = "20241224";
    const LAST_WEEK: &str = "20241217";

    fn week() -> WeekId {
        WeekId::new(WEEK)
    }

    fn incoming(name: &str, realm: &str, fields: CharacterFields) -> ParsedCharacter {
        ParsedCharacter {
            name: name.to_string(),
            realm: realm.to_string(),
            fields,
        }
    }

    fn stored_thrall() -> CharacterRecord {
        CharacterRecord {
            item_level: 690.0,
            champion_items: 4,
            vault_visited: true,
            delves: 3,
            gilded_stash: 1,
            timewalk: 2,
            notes: "raid main".to_string(),
            week_id: WEEK.to_string(),
            ..CharacterRecord::new("Draenor", "Thrall")
        }
    }

    #[test]
    fn test_empty_incoming_is_identity() {
        let stored = vec![stored_thrall(), CharacterRecord::new("Silvermoon", "Jaina")];
        let report = reconcile(stored.clone(), &[], &week());

        assert_eq!(report.summary(), "All characters up to date.");
        assert_eq!(report.into_parts(), (0, 0, stored));

        println!("✅ Idempotence test passed");
    }

    #[test]
    fn test_update_matches_case_insensitively() {
        let report = reconcile(
            vec![stored_thrall()],
            &[incoming(
                "THRALL",
                "draenor",
                CharacterFields {
                    item_level: Some(701.5),
                    delves: Some(8),
                    week_id: Some(WEEK.to_string()),
                    ..Default::default()
                },
            )],
            &week(),
        );

        assert_eq!(report.updated, 1);
        assert_eq!(report.added, 0);
        assert_eq!(report.roster.len(), 1);
        let c = &report.roster[0];
        assert_eq!(c.name, "Thrall");
        assert_eq!(c.item_level, 701.5);
        assert_eq!(c.delves, 8);
        assert_eq!(c.notes, "raid main");
        assert_eq!(report.changes[0].fields, vec!["item_level", "delves"]);
        assert_eq!(report.summary(), "Updated 1 character.");
    }

    #[test]
    fn test_stale_incoming_keeps_weekly_fields() {
        let before = stored_thrall();
        let report = reconcile(
            vec![before.clone()],
            &[incoming(
                "Thrall",
                "Draenor",
                CharacterFields {
                    item_level: Some(705.0),
                    vault_visited: Some(false),
                    delves: Some(0),
                    gilded_stash: Some(3),
                    timewalk: Some(5),
                    week_id: Some(LAST_WEEK.to_string()),
                    ..Default::default()
                },
            )],
            &week(),
        );

        let c = &report.roster[0];
        assert_eq!(report.stale, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(c.item_level, 705.0);
        assert_eq!(c.vault_visited, before.vault_visited);
        assert_eq!(c.delves, before.delves);
        assert_eq!(c.gilded_stash, before.gilded_stash);
        assert_eq!(c.timewalk, before.timewalk);
        assert_eq!(c.week_id, WEEK);
        assert_eq!(report.summary(), "Updated 1 character. (1 stale)");

        println!("✅ Stale exclusion test passed");
    }

    #[test]
    fn test_new_stale_character_omits_weekly_fields() {
        let report = reconcile(
            Vec::new(),
            &[incoming(
                "Jaina",
                "Silvermoon",
                CharacterFields {
                    item_level: Some(680.0),
                    quests: Some(true),
                    delves: Some(5),
                    week_id: Some(LAST_WEEK.to_string()),
                    ..Default::default()
                },
            )],
            &week(),
        );

        assert_eq!(report.added, 1);
        let c = &report.roster[0];
        assert_eq!(c.item_level, 680.0);
        assert!(!c.quests);
        assert_eq!(c.delves, 0);
        assert!(c.week_id.is_empty());
        assert_eq!(report.summary(), "Added 1 character. (1 stale)");
    }

    #[test]
    fn test_new_current_character_carries_weekly_fields() {
        let report = reconcile(
            Vec::new(),
            &[incoming(
                "Jaina",
                "Silvermoon",
                CharacterFields {
                    delves: Some(5),
                    timewalking: Some(TimewalkQuest {
                        completed: true,
                        ..Default::default()
                    }),
                    timewalk: Some(5),
                    week_id: Some(WEEK.to_string()),
                    ..Default::default()
                },
            )],
            &week(),
        );

        let c = &report.roster[0];
        assert_eq!(c.delves, 5);
        assert_eq!(c.timewalk, 5);
        assert_eq!(c.week_id, WEEK);
        assert!(report.changes[0].added);
    }

    #[test]
    fn test_absent_and_equal_fields_are_not_changes() {
        let report = reconcile(
            vec![stored_thrall()],
            &[incoming(
                "Thrall",
                "Draenor",
                CharacterFields {
                    item_level: Some(690.0),
                    champion_items: Some(4),
                    week_id: Some(WEEK.to_string()),
                    ..Default::default()
                },
            )],
            &week(),
        );

        assert_eq!(report.updated, 0);
        assert!(!report.has_changes());
        assert_eq!(report.roster[0], stored_thrall_with_id(&report.roster[0].id));
    }

    fn stored_thrall_with_id(id: &str) -> CharacterRecord {
        CharacterRecord {
            id: id.to_string(),
            ..stored_thrall()
        }
    }

    #[test]
    fn test_fresh_import_rolls_over_old_week_record() {
        let stored = CharacterRecord {
            vault_visited: true,
            delves: 8,
            gilded_stash: 3,
            week_id: LAST_WEEK.to_string(),
            ..stored_thrall()
        };

        let report = reconcile(
            vec![stored],
            &[incoming(
                "Thrall",
                "Draenor",
                CharacterFields {
                    item_level: Some(700.0),
                    week_id: Some(WEEK.to_string()),
                    ..Default::default()
                },
            )],
            &week(),
        );

        let c = &report.roster[0];
        assert_eq!(report.stale, 0);
        assert_eq!(report.updated, 1);
        assert_eq!(c.item_level, 700.0);
        assert!(!c.vault_visited);
        assert_eq!(c.delves, 0);
        assert_eq!(c.gilded_stash, 0);
        assert_eq!(c.timewalk, 0);
        assert_eq!(c.week_id, WEEK);
        assert_eq!(c.notes, "raid main");
        assert_eq!(
            report.changes[0].fields,
            vec!["item_level", "vault_visited", "delves", "gilded_stash", "timewalk", "week_id"]
        );

        println!("✅ Old-week roll-over test passed");
    }

    #[test]
    fn test_rolled_over_record_takes_fresh_weekly_values() {
        let stored = CharacterRecord {
            delves: 8,
            week_id: LAST_WEEK.to_string(),
            ..stored_thrall()
        };

        let report = reconcile(
            vec![stored],
            &[incoming(
                "Thrall",
                "Draenor",
                CharacterFields {
                    delves: Some(2),
                    quests: Some(true),
                    week_id: Some(WEEK.to_string()),
                    ..Default::default()
                },
            )],
            &week(),
        );

        let c = &report.roster[0];
        assert_eq!(c.delves, 2);
        assert!(c.quests);
        assert!(!c.vault_visited);
        assert_eq!(c.gilded_stash, 0);
        let fields = &report.changes[0].fields;
        assert_eq!(fields.iter().filter(|f| **f == "delves").count(), 1);
        assert!(fields.contains(&"quests"));
    }

    #[test]
    fn test_stale_import_leaves_old_week_record_alone() {
        let stored = CharacterRecord {
            delves: 8,
            week_id: LAST_WEEK.to_string(),
            ..stored_thrall()
        };
        let report = reconcile(
            vec![stored],
            &[incoming(
                "Thrall",
                "Draenor",
                CharacterFields {
                    item_level: Some(700.0),
                    week_id: Some(LAST_WEEK.to_string()),
                    ..Default::default()
                },
            )],
            &week(),
        );

        let c = &report.roster[0];
        assert_eq!(c.delves, 8);
        assert_eq!(c.week_id, LAST_WEEK);
    }

    #[test]
    fn test_missing_name_or_realm_skipped() {
        let report = reconcile(
            Vec::new(),
            &[
                incoming("", "Draenor", CharacterFields::default()),
                incoming("Thrall", "  ", CharacterFields::default()),
            ],
            &week(),
        );

        assert_eq!(report.skipped, 2);
        assert_eq!(report.added, 0);
        assert!(report.roster.is_empty());
    }

    #[test]
    fn test_socket_gaps_merge_as_counts() {
        let report = reconcile(
            vec![stored_thrall()],
            &[incoming(
                "Thrall",
                "Draenor",
                CharacterFields {
                    sockets: Some(SocketFields {
                        socketable_count: 3,
                        socketed_count: 1,
                        empty_slots: vec![1],
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )],
            &week(),
        );

        let c = &report.roster[0];
        assert_eq!(c.socket_missing_count, 2);
        assert_eq!(c.socket_empty_count, 1);
        assert_eq!(c.enchant_missing_count, 0);
    }

    #[test]
    fn test_mixed_summary_and_duplicates() {
        let fresh = |ilvl: f64| CharacterFields {
            item_level: Some(ilvl),
            week_id: Some(WEEK.to_string()),
            ..Default::default()
        };
        let mut second = stored_thrall();
        second.name = "Sylvanas".to_string();

        let report = reconcile(
            vec![stored_thrall(), second],
            &[
                incoming("Thrall", "Draenor", fresh(700.0)),
                incoming("Sylvanas", "Draenor", fresh(710.0)),
                incoming("Jaina", "Silvermoon", fresh(650.0)),
                incoming("jaina", "silvermoon", fresh(655.0)),
            ],
            &week(),
        );

        assert_eq!(report.added, 1);
        assert_eq!(report.updated, 3);
        assert_eq!(report.roster.len(), 3);
        assert_eq!(report.roster[2].item_level, 655.0);
        assert_eq!(report.summary(), "Updated 3, added 1 characters.");
    }

    #[test]
    fn test_summary_wording() {
        let mut report = reconcile(Vec::new(), &[], &week());
        report.updated = 2;
        report.added = 1;
        report.stale = 1;
        assert_eq!(report.summary(), "Updated 2, added 1 characters. (1 stale)");

        report.updated = 0;
        report.added = 2;
        report.stale = 0;
        assert_eq!(report.summary(), "Added 2 characters.");
    }
}
