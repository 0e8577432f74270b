// 📊 Progress Analyzer - Weekly gear and vault verdicts
// Pure functions from extracted character fields to gap analyses and a
// Done / Warning / Fail status.
//
// Vault rows unlock one reward slot at each of 1, 4 and 8 completions.
// Difficulty level maps to a reward tier, and each tier to a fixed item level.

use crate::extract::{CharacterFields, ParsedCharacter};
use crate::temporal::WeekId;
use serde::Serialize;

/// Completions needed for the 1st, 2nd and 3rd slot of a vault row
pub const VAULT_THRESHOLDS: [i64; 3] = [1, 4, 8];

/// Rewards at or above this item level count as top-band
pub const TOP_BAND_ITEM_LEVEL: i64 = 694;

/// Characters with fewer upgrade levels left than this are "almost done"
pub const ALMOST_DONE_UPGRADES: i64 = 10;

// ============================================================================
// REWARD TIERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RewardTier {
    Base,
    Mid,
    Top,
}

impl RewardTier {
    /// Level → tier: 8+ top, 2-7 (and 0 for timewalking/heroic) mid, 1 base
    pub fn from_level(level: i64) -> Self {
        if level >= 8 {
            RewardTier::Top
        } else if level >= 2 || level == 0 {
            RewardTier::Mid
        } else {
            RewardTier::Base
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RewardTier::Base => "T1",
            RewardTier::Mid => "T2",
            RewardTier::Top => "T8+",
        }
    }

    pub fn item_level(&self) -> i64 {
        match self {
            RewardTier::Base => 671,
            RewardTier::Mid => 678,
            RewardTier::Top => 710,
        }
    }
}

pub fn count_vault_slots(count: i64) -> usize {
    VAULT_THRESHOLDS.iter().filter(|&&t| count >= t).count()
}

// ============================================================================
// VAULT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VaultReward {
    pub tier: RewardTier,
    pub item_level: i64,
}

impl VaultReward {
    pub fn new(tier: RewardTier) -> Self {
        VaultReward {
            tier,
            item_level: tier.item_level(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VaultInfo {
    pub delve_count: i64,
    pub dungeon_count: i64,
    pub delve_slots: usize,
    pub dungeon_slots: usize,
    pub total_slots: usize,
    pub rewards: Vec<VaultReward>,
    pub top_band_rewards: usize,
}

/// Rewards for one row; unlocked slots without detail are assumed mid tier
fn row_rewards(count: i64, levels: &[(i64, i64)], rewards: &mut Vec<VaultReward>) -> usize {
    let slots = count_vault_slots(count);
    rewards.extend(levels.iter().map(|&(_, level)| VaultReward::new(RewardTier::from_level(level))));
    for _ in levels.len()..slots {
        rewards.push(VaultReward::new(RewardTier::Mid));
    }
    slots
}

pub fn vault_info(fields: &CharacterFields) -> VaultInfo {
    let mut info = VaultInfo::default();

    if let Some(row) = &fields.vault_delves {
        info.delve_count = row.count;
        info.delve_slots = row_rewards(row.count, &row.detail, &mut info.rewards);
    }
    if let Some(row) = &fields.vault_dungeons {
        info.dungeon_count = row.count;
        info.dungeon_slots = row_rewards(row.count, &row.detail, &mut info.rewards);
    }

    info.total_slots = info.delve_slots + info.dungeon_slots;
    info.top_band_rewards = info
        .rewards
        .iter()
        .filter(|r| r.item_level >= TOP_BAND_ITEM_LEVEL)
        .count();
    info
}

/// `"T8+ (710) ×2, T2 (678)"`, highest item level first; `"-"` when empty
pub fn format_vault_rewards(rewards: &[VaultReward]) -> String {
    if rewards.is_empty() {
        return "-".to_string();
    }

    let mut groups: Vec<(VaultReward, usize)> = Vec::new();
    for reward in rewards {
        match groups.iter_mut().find(|(r, _)| *r == *reward) {
            Some((_, n)) => *n += 1,
            None => groups.push((*reward, 1)),
        }
    }
    groups.sort_by(|a, b| b.0.item_level.cmp(&a.0.item_level));

    groups
        .iter()
        .map(|(r, n)| {
            let key = format!("{} ({})", r.tier.label(), r.item_level);
            if *n > 1 {
                format!("{} ×{}", key, n)
            } else {
                key
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// SLOTS, SOCKETS, ENCHANTS
// ============================================================================

/// Equipment slot id → display name; unknown ids render as `Slot N`
pub fn slot_name(id: i64) -> String {
    let name = match id {
        1 => "Head",
        2 => "Neck",
        3 => "Shoulder",
        5 => "Chest",
        6 => "Waist",
        7 => "Legs",
        8 => "Feet",
        9 => "Wrist",
        10 => "Hands",
        11 => "Ring1",
        12 => "Ring2",
        13 => "Trinket1",
        14 => "Trinket2",
        15 => "Back",
        16 => "MainHand",
        17 => "OffHand",
        _ => return format!("Slot {}", id),
    };
    name.to_string()
}

fn slot_names(ids: &[i64]) -> Vec<String> {
    ids.iter().map(|&id| slot_name(id)).collect()
}

/// Count from counters unless a non-empty slot list says otherwise
fn gap_count(counted: i64, slots: &[String]) -> i64 {
    if slots.is_empty() {
        counted.max(0)
    } else {
        slots.len() as i64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SocketInfo {
    /// Socketable slots without a socket
    pub missing_count: i64,
    pub missing_slots: Vec<String>,
    pub socketed_count: i64,
    pub total_socketable: i64,
    /// Sockets without a gem
    pub empty_count: i64,
    pub empty_slots: Vec<String>,
}

pub fn socket_info(fields: &CharacterFields) -> SocketInfo {
    let Some(s) = &fields.sockets else {
        return SocketInfo::default();
    };
    let missing_slots = slot_names(&s.missing_slots);
    let empty_slots = slot_names(&s.empty_slots);

    SocketInfo {
        missing_count: gap_count(s.socketable_count.saturating_sub(s.socketed_count), &missing_slots),
        missing_slots,
        socketed_count: s.socketed_count,
        total_socketable: s.socketable_count,
        empty_count: gap_count(s.empty_count, &empty_slots),
        empty_slots,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnchantInfo {
    pub missing_count: i64,
    pub missing_slots: Vec<String>,
    pub enchant_count: i64,
    pub enchantable_count: i64,
}

pub fn enchant_info(fields: &CharacterFields) -> EnchantInfo {
    let Some(e) = &fields.enchants else {
        return EnchantInfo::default();
    };
    let missing_slots = slot_names(&e.missing_slots);

    EnchantInfo {
        missing_count: gap_count(e.enchantable_count.saturating_sub(e.enchant_count), &missing_slots),
        missing_slots,
        enchant_count: e.enchant_count,
        enchantable_count: e.enchantable_count,
    }
}

/// `"2 (Head, Wrist)"`, or `"-"` when nothing is missing
pub fn gap_display(count: i64, slots: &[String]) -> String {
    match (count, slots.is_empty()) {
        (0, _) => "-".to_string(),
        (n, true) => n.to_string(),
        (n, false) => format!("{} ({})", n, slots.join(", ")),
    }
}

// ============================================================================
// STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    Done,
    Warning,
    Fail,
}

impl Status {
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Done => "✅",
            Status::Warning => "⚠️",
            Status::Fail => "❌",
        }
    }

    pub fn meaning(&self) -> &'static str {
        match self {
            Status::Done => "Done for the week",
            Status::Warning => "Need more vault slots or T8+ content",
            Status::Fail => "No vault rewards",
        }
    }

    /// Sort rank: Done first
    pub fn rank(&self) -> u8 {
        match self {
            Status::Done => 0,
            Status::Warning => 1,
            Status::Fail => 2,
        }
    }
}

/// Weekly verdict; the first matching rule wins
pub fn status(
    fields: &CharacterFields,
    vault: &VaultInfo,
    socket: &SocketInfo,
    timewalk_available: bool,
) -> Status {
    let has_sub_top = fields.sub_top_items() > 0;
    let upgrade_max = fields.upgrade_max.unwrap_or(0);
    let fully_upgraded = upgrade_max > 0 && fields.upgrade_current.unwrap_or(0) >= upgrade_max;
    let all_gemmed = socket.missing_count == 0 && socket.empty_count == 0;
    let timewalk = fields.timewalk.unwrap_or(0);
    let timewalk_owed = timewalk_available && timewalk < 1;

    if fully_upgraded && all_gemmed && !has_sub_top {
        return if timewalk_owed { Status::Warning } else { Status::Done };
    }
    if vault.total_slots == 0 {
        return Status::Fail;
    }
    if timewalk_owed {
        return Status::Warning;
    }
    if !has_sub_top && vault.total_slots >= 3 {
        return Status::Done;
    }
    if has_sub_top && vault.top_band_rewards >= 3 && vault.total_slots >= 3 {
        // Timewalking drops top-track gear, so it must be finished too
        return if timewalk_available && timewalk < 5 {
            Status::Warning
        } else {
            Status::Done
        };
    }
    Status::Warning
}

/// The bonus activity runs this week if any current character has picked it up
pub fn timewalk_available(characters: &[ParsedCharacter], current_week: &WeekId) -> bool {
    characters.iter().any(|c| {
        c.fields.is_from_week(current_week.as_str())
            && c
                .fields
                .timewalking
                .as_ref()
                .is_some_and(|q| q.accepted || q.progress > 0)
    })
}

// ============================================================================
// CHARACTER ANALYSIS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterAnalysis {
    pub name: String,
    pub realm: String,
    pub class: String,
    pub item_level: f64,
    pub heroic_items: i64,
    pub champion_items: i64,
    pub veteran_items: i64,
    pub upgrade_current: i64,
    pub upgrade_max: i64,
    pub upgrades_left: i64,
    pub is_complete: bool,
    pub is_current_week: bool,
    pub vault: VaultInfo,
    pub sockets: SocketInfo,
    pub enchants: EnchantInfo,
    pub status: Status,
    /// `"2 Champ, 1 Vet"` or `"-"`
    pub missing: String,
    /// Slots still climbing their track, e.g. `"Head 5/8"`
    pub pending_upgrades: Vec<String>,
    /// User annotations from the stored roster
    pub notes: String,
}

impl CharacterAnalysis {
    pub fn full_name(&self) -> String {
        format!("{}-{}", self.name, self.realm)
    }

    pub fn vault_display(&self) -> String {
        format_vault_rewards(&self.vault.rewards)
    }

    pub fn socket_display(&self) -> String {
        gap_display(self.sockets.missing_count, &self.sockets.missing_slots)
    }

    pub fn empty_display(&self) -> String {
        gap_display(self.sockets.empty_count, &self.sockets.empty_slots)
    }

    pub fn enchant_display(&self) -> String {
        gap_display(self.enchants.missing_count, &self.enchants.missing_slots)
    }

    /// Missing gear plus user notes in parentheses
    pub fn notes_display(&self) -> String {
        let mut parts = Vec::new();
        if self.missing != "-" {
            parts.push(self.missing.clone());
        }
        if !self.notes.is_empty() {
            parts.push(format!("({})", self.notes));
        }
        if parts.is_empty() {
            "-".to_string()
        } else {
            parts.join(" ")
        }
    }

    pub fn is_almost_done(&self) -> bool {
        !self.is_complete && self.upgrades_left < ALMOST_DONE_UPGRADES
    }
}

/// Analyze one character; weekly data from another week is treated as reset
pub fn analyze_character(
    character: &ParsedCharacter,
    current_week: &WeekId,
    timewalk_available: bool,
) -> CharacterAnalysis {
    let is_current_week = character.fields.is_from_week(current_week.as_str());
    let fields = if is_current_week {
        character.fields.clone()
    } else {
        character.fields.without_weekly()
    };

    let champion_items = fields.champion_items.unwrap_or(0);
    let veteran_items = fields.veteran_items.unwrap_or(0);
    let upgrade_current = fields.upgrade_current.unwrap_or(0);
    let upgrade_max = fields.upgrade_max.unwrap_or(0);
    let upgrades_left = upgrade_max.saturating_sub(upgrade_current).max(0);

    let vault = vault_info(&fields);
    let sockets = socket_info(&fields);
    let enchants = enchant_info(&fields);
    let status = status(&fields, &vault, &sockets, timewalk_available);

    let mut missing = Vec::new();
    if champion_items > 0 {
        missing.push(format!("{} Champ", champion_items));
    }
    if veteran_items > 0 {
        missing.push(format!("{} Vet", veteran_items));
    }

    let pending_upgrades = fields
        .slot_upgrades
        .iter()
        .filter(|u| u.is_pending())
        .map(|u| {
            let name = if u.slot_name.is_empty() {
                slot_name(u.slot)
            } else {
                u.slot_name.clone()
            };
            format!("{} {}/{}", name, u.current, u.max)
        })
        .collect();

    CharacterAnalysis {
        name: character.name.clone(),
        realm: character.realm.clone(),
        class: fields.class.clone().unwrap_or_else(|| "Unknown".to_string()),
        item_level: fields.item_level.unwrap_or(0.0),
        heroic_items: fields.heroic_items.unwrap_or(0),
        champion_items,
        veteran_items,
        upgrade_current,
        upgrade_max,
        upgrades_left,
        is_complete: upgrades_left == 0 && champion_items == 0 && veteran_items == 0,
        is_current_week,
        vault,
        sockets,
        enchants,
        status,
        missing: if missing.is_empty() {
            "-".to_string()
        } else {
            missing.join(", ")
        },
        pending_upgrades,
        notes: String::new(),
    }
}

/// Analyze a whole export against the current week
pub fn analyze_all(characters: &[ParsedCharacter], current_week: &WeekId) -> Vec<CharacterAnalysis> {
    let tw = timewalk_available(characters, current_week);
    characters
        .iter()
        .map(|c| analyze_character(c, current_week, tw))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ActivityRow, EnchantFields, SlotUpgrade, SocketFields, TimewalkQuest};

    const WEEK: &str = "20241224";

    fn row(count: i64, levels: &[i64]) -> Option<ActivityRow> {
        Some(ActivityRow {
            count,
            detail: levels.iter().enumerate().map(|(i, &l)| (i as i64 + 1, l)).collect(),
        })
    }

    /// Every item on the top track, fully upgraded, nothing to gem
    fn maxed_fields() -> CharacterFields {
        CharacterFields {
            item_level: Some(723.0),
            heroic_items: Some(16),
            champion_items: Some(0),
            veteran_items: Some(0),
            adventure_items: Some(0),
            upgrade_current: Some(128),
            upgrade_max: Some(128),
            week_id: Some(WEEK.to_string()),
            ..Default::default()
        }
    }

    fn character(fields: CharacterFields) -> ParsedCharacter {
        ParsedCharacter {
            name: "Thrall".to_string(),
            realm: "Draenor".to_string(),
            fields,
        }
    }

    #[test]
    fn test_vault_thresholds() {
        let expected = [(0, 0), (1, 1), (3, 1), (4, 2), (7, 2), (8, 3), (12, 3), (-1, 0)];
        for (count, slots) in expected {
            assert_eq!(count_vault_slots(count), slots, "count {}", count);
        }
        println!("✅ Vault threshold test passed");
    }

    #[test]
    fn test_level_to_tier() {
        assert_eq!(RewardTier::from_level(0), RewardTier::Mid);
        assert_eq!(RewardTier::from_level(1), RewardTier::Base);
        assert_eq!(RewardTier::from_level(2), RewardTier::Mid);
        assert_eq!(RewardTier::from_level(7), RewardTier::Mid);
        assert_eq!(RewardTier::from_level(8), RewardTier::Top);
        assert_eq!(RewardTier::from_level(11), RewardTier::Top);
        assert_eq!(RewardTier::Top.item_level(), 710);
        assert_eq!(RewardTier::Mid.item_level(), 678);
        assert_eq!(RewardTier::Base.item_level(), 671);
    }

    #[test]
    fn test_vault_fallback_to_mid_tier() {
        let fields = CharacterFields {
            vault_delves: row(2, &[]),
            ..Default::default()
        };
        let vault = vault_info(&fields);

        assert_eq!(vault.delve_slots, 1);
        assert_eq!(vault.total_slots, 1);
        assert_eq!(vault.rewards, vec![VaultReward::new(RewardTier::Mid)]);
        assert_eq!(vault.top_band_rewards, 0);

        println!("✅ Vault fallback test passed");
    }

    #[test]
    fn test_vault_partial_detail_is_padded() {
        let fields = CharacterFields {
            vault_delves: row(8, &[8, 11]),
            vault_dungeons: row(4, &[]),
            ..Default::default()
        };
        let vault = vault_info(&fields);

        assert_eq!(vault.delve_slots, 3);
        assert_eq!(vault.dungeon_slots, 2);
        assert_eq!(vault.total_slots, 5);
        assert_eq!(vault.rewards.len(), 5);
        assert_eq!(vault.top_band_rewards, 2);
        assert_eq!(format_vault_rewards(&vault.rewards), "T8+ (710) ×2, T2 (678) ×3");
    }

    #[test]
    fn test_format_vault_rewards() {
        assert_eq!(format_vault_rewards(&[]), "-");
        let rewards = vec![
            VaultReward::new(RewardTier::Mid),
            VaultReward::new(RewardTier::Top),
            VaultReward::new(RewardTier::Base),
            VaultReward::new(RewardTier::Top),
        ];
        assert_eq!(format_vault_rewards(&rewards), "T8+ (710) ×2, T2 (678), T1 (671)");
    }

    #[test]
    fn test_slot_names() {
        assert_eq!(slot_name(1), "Head");
        assert_eq!(slot_name(17), "OffHand");
        assert_eq!(slot_name(4), "Slot 4");
        assert_eq!(slot_name(99), "Slot 99");
    }

    #[test]
    fn test_socket_and_enchant_gaps() {
        let fields = CharacterFields {
            sockets: Some(SocketFields {
                socketable_count: 3,
                socketed_count: 1,
                empty_count: 0,
                missing_slots: vec![],
                empty_slots: vec![1, 9],
            }),
            enchants: Some(EnchantFields {
                enchantable_count: 8,
                enchant_count: 8,
                missing_slots: vec![5],
            }),
            ..Default::default()
        };

        let sockets = socket_info(&fields);
        assert_eq!(sockets.missing_count, 2);
        assert_eq!(sockets.empty_count, 2);
        assert_eq!(gap_display(sockets.empty_count, &sockets.empty_slots), "2 (Head, Wrist)");
        assert_eq!(gap_display(sockets.missing_count, &sockets.missing_slots), "2");

        let enchants = enchant_info(&fields);
        assert_eq!(enchants.missing_count, 1);
        assert_eq!(enchants.missing_slots, vec!["Chest".to_string()]);

        assert_eq!(socket_info(&CharacterFields::default()), SocketInfo::default());
        assert_eq!(gap_display(0, &[]), "-");
    }

    #[test]
    fn test_status_fully_geared() {
        let fields = maxed_fields();
        let vault = vault_info(&fields);
        let socket = socket_info(&fields);

        assert_eq!(status(&fields, &vault, &socket, false), Status::Done);
        assert_eq!(status(&fields, &vault, &socket, true), Status::Warning);

        let with_tw = CharacterFields {
            timewalk: Some(1),
            ..maxed_fields()
        };
        assert_eq!(status(&with_tw, &vault, &socket, true), Status::Done);

        println!("✅ Fully geared status test passed");
    }

    #[test]
    fn test_status_no_vault_slots_fails() {
        let fields = CharacterFields {
            champion_items: Some(3),
            upgrade_current: Some(40),
            upgrade_max: Some(128),
            ..Default::default()
        };
        let vault = vault_info(&fields);
        let socket = socket_info(&fields);

        assert_eq!(status(&fields, &vault, &socket, false), Status::Fail);
        assert_eq!(status(&fields, &vault, &socket, true), Status::Fail);
    }

    #[test]
    fn test_status_unsocketed_maxed_character_uses_vault() {
        let fields = CharacterFields {
            sockets: Some(SocketFields {
                empty_count: 1,
                ..Default::default()
            }),
            vault_delves: row(8, &[8, 8, 8]),
            ..maxed_fields()
        };
        let vault = vault_info(&fields);
        let socket = socket_info(&fields);

        // Rule 1 misses on the empty socket, rule 4 matches
        assert_eq!(status(&fields, &vault, &socket, false), Status::Done);
    }

    #[test]
    fn test_status_sub_top_gear_needs_top_band_rewards() {
        let base = CharacterFields {
            champion_items: Some(2),
            upgrade_current: Some(60),
            upgrade_max: Some(128),
            ..Default::default()
        };

        let three_top = CharacterFields {
            vault_delves: row(8, &[8, 10, 11]),
            ..base.clone()
        };
        let vault = vault_info(&three_top);
        let socket = socket_info(&three_top);
        assert_eq!(status(&three_top, &vault, &socket, false), Status::Done);

        let tw_partial = CharacterFields {
            timewalk: Some(3),
            ..three_top.clone()
        };
        assert_eq!(status(&tw_partial, &vault, &socket, true), Status::Warning);
        let tw_full = CharacterFields {
            timewalk: Some(5),
            ..three_top
        };
        assert_eq!(status(&tw_full, &vault, &socket, true), Status::Done);

        let mid_only = CharacterFields {
            vault_delves: row(8, &[4, 4, 4]),
            ..base
        };
        let vault = vault_info(&mid_only);
        assert_eq!(status(&mid_only, &vault, &socket, false), Status::Warning);
    }

    #[test]
    fn test_status_no_sub_top_gear_with_three_slots() {
        let fields = CharacterFields {
            upgrade_current: Some(100),
            upgrade_max: Some(128),
            vault_dungeons: row(8, &[]),
            ..Default::default()
        };
        let vault = vault_info(&fields);
        let socket = socket_info(&fields);

        assert_eq!(vault.total_slots, 3);
        assert_eq!(status(&fields, &vault, &socket, false), Status::Done);
        assert_eq!(status(&fields, &vault, &socket, true), Status::Warning);
    }

    #[test]
    fn test_old_items_are_not_sub_top() {
        let fields = CharacterFields {
            old_items: Some(4),
            ..maxed_fields()
        };
        assert_eq!(fields.sub_top_items(), 0);
    }

    #[test]
    fn test_timewalk_available_ignores_stale_characters() {
        let week = WeekId::new(WEEK);
        let stale = character(CharacterFields {
            timewalking: Some(TimewalkQuest {
                accepted: true,
                ..Default::default()
            }),
            week_id: Some("20241217".to_string()),
            ..Default::default()
        });
        assert!(!timewalk_available(&[stale.clone()], &week));

        let current = character(CharacterFields {
            timewalking: Some(TimewalkQuest {
                progress: 1,
                ..Default::default()
            }),
            week_id: Some(WEEK.to_string()),
            ..Default::default()
        });
        assert!(timewalk_available(&[stale, current], &week));
    }

    #[test]
    fn test_analyze_stale_character_resets_weekly_data() {
        let week = WeekId::new(WEEK);
        let ch = character(CharacterFields {
            champion_items: Some(2),
            veteran_items: Some(1),
            upgrade_current: Some(100),
            upgrade_max: Some(128),
            vault_delves: row(8, &[8, 8, 8]),
            timewalk: Some(5),
            week_id: Some("20241217".to_string()),
            ..Default::default()
        });

        let analysis = analyze_character(&ch, &week, false);
        assert!(!analysis.is_current_week);
        assert_eq!(analysis.vault.total_slots, 0);
        assert_eq!(analysis.status, Status::Fail);
        assert_eq!(analysis.upgrades_left, 28);
        assert!(!analysis.is_complete);
        assert!(!analysis.is_almost_done());
        assert_eq!(analysis.missing, "2 Champ, 1 Vet");
        assert_eq!(analysis.vault_display(), "-");

        println!("✅ Stale analysis test passed");
    }

    #[test]
    fn test_analyze_current_character() {
        let week = WeekId::new(WEEK);
        let ch = character(CharacterFields {
            class: Some("Shaman".to_string()),
            vault_delves: row(4, &[8]),
            slot_upgrades: vec![
                SlotUpgrade {
                    slot: 1,
                    slot_name: "Head".to_string(),
                    track: "Hero".to_string(),
                    current: 5,
                    max: 8,
                },
                SlotUpgrade {
                    slot: 9,
                    slot_name: String::new(),
                    track: "Hero".to_string(),
                    current: 7,
                    max: 8,
                },
            ],
            upgrade_current: Some(126),
            ..maxed_fields()
        });

        let mut analysis = analyze_character(&ch, &week, false);
        assert!(analysis.is_current_week);
        assert_eq!(analysis.full_name(), "Thrall-Draenor");
        assert_eq!(analysis.class, "Shaman");
        assert_eq!(analysis.upgrades_left, 2);
        assert!(analysis.is_almost_done());
        assert_eq!(analysis.vault_display(), "T8+ (710), T2 (678)");
        assert_eq!(analysis.pending_upgrades, vec!["Head 5/8", "Wrist 7/8"]);
        assert_eq!(analysis.status, Status::Warning);
        assert_eq!(analysis.notes_display(), "-");

        analysis.notes = "main".to_string();
        assert_eq!(analysis.notes_display(), "(main)");
    }

    #[test]
    fn test_analyze_all_shares_timewalk_flag() {
        let week = WeekId::new(WEEK);
        let runner = character(CharacterFields {
            timewalking: Some(TimewalkQuest {
                accepted: true,
                ..Default::default()
            }),
            timewalk: Some(0),
            ..maxed_fields()
        });
        let analyses = analyze_all(&[runner.clone(), runner], &week);

        assert!(analyses.iter().all(|a| a.status == Status::Warning));
    }

    #[test]
    fn test_extreme_counts_do_not_overflow() {
        let week = WeekId::new(WEEK);
        let extreme = character(CharacterFields {
            champion_items: Some(i64::MAX),
            veteran_items: Some(1),
            upgrade_current: Some(i64::MIN),
            upgrade_max: Some(i64::MAX),
            sockets: Some(SocketFields {
                socketable_count: i64::MAX,
                socketed_count: i64::MIN,
                ..Default::default()
            }),
            enchants: Some(EnchantFields {
                enchantable_count: i64::MIN,
                enchant_count: i64::MAX,
                ..Default::default()
            }),
            week_id: Some(WEEK.to_string()),
            ..Default::default()
        });

        let analyses = analyze_all(&[extreme], &week);
        let a = &analyses[0];

        assert_eq!(a.upgrades_left, i64::MAX);
        assert_eq!(a.sockets.missing_count, i64::MAX);
        assert_eq!(a.enchants.missing_count, 0);
        assert!(!a.is_complete);
        assert_eq!(a.status, Status::Fail);

        println!("✅ Extreme count test passed");
    }
}
