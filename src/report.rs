// 📊 Gear & Vault Report - Markdown tables and CSV export
//
// Characters are grouped by how much upgrading is left; each group is a
// Markdown table padded for terminals that draw emoji two cells wide.

use crate::analyzer::{CharacterAnalysis, Status, ALMOST_DONE_UPGRADES};
use crate::entities::CharacterRecord;
use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::fs::File;
use std::io;
use std::path::Path;

const COMPLETE_HEADERS: [&str; 7] = [
    "Character",
    "Class",
    "iLvl",
    "Vault Rewards",
    "Sockets",
    "Needs Gem",
    "Needs Enchant",
];

const CSV_HEADERS: [&str; 13] = [
    "Character",
    "Class",
    "Item Level",
    "Status",
    "Progress",
    "Left",
    "Vault Rewards",
    "Sockets",
    "Needs Gem",
    "Needs Enchant",
    "Missing",
    "Pending Upgrades",
    "Notes",
];

// ============================================================================
// TEXT LAYOUT
// ============================================================================

/// Terminal cell width: emoji and misc symbols count 2, variation selectors 0
pub fn display_width(s: &str) -> usize {
    s.chars()
        .map(|c| match c as u32 {
            0xFE0E | 0xFE0F => 0,
            code if code >= 0x1F300 => 2,
            0x2600..=0x27BF => 2,
            _ => 1,
        })
        .sum()
}

pub fn pad_to_width(s: &str, width: usize) -> String {
    let current = display_width(s);
    if current >= width {
        return s.to_string();
    }
    format!("{}{}", s, " ".repeat(width - current))
}

/// Markdown table; missing cells render blank, no rows renders nothing
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }

    let line = |cells: Vec<String>| format!("| {} |", cells.join(" | "));

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(line(
        headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| pad_to_width(h, *w))
            .collect(),
    ));
    lines.push(line(widths.iter().map(|w| "-".repeat(*w)).collect()));
    for row in rows {
        lines.push(line(
            widths
                .iter()
                .enumerate()
                .map(|(i, w)| pad_to_width(row.get(i).map(String::as_str).unwrap_or(""), *w))
                .collect(),
        ));
    }

    lines.join("\n")
}

// ============================================================================
// REPORT
// ============================================================================

/// Copy user notes from the stored roster onto matching analyses
pub fn attach_notes(analyses: &mut [CharacterAnalysis], roster: &[CharacterRecord]) {
    for analysis in analyses.iter_mut() {
        if let Some(record) = roster
            .iter()
            .find(|r| r.matches(&analysis.name, &analysis.realm))
        {
            analysis.notes = record.notes.clone();
        }
    }
}

fn by_item_level_desc(a: &CharacterAnalysis, b: &CharacterAnalysis) -> Ordering {
    b.item_level.total_cmp(&a.item_level)
}

fn character_cell(c: &CharacterAnalysis) -> String {
    format!("{} {}", c.status.symbol(), c.full_name())
}

fn complete_row(c: &CharacterAnalysis) -> Vec<String> {
    vec![
        character_cell(c),
        c.class.clone(),
        format!("{:.1}", c.item_level),
        c.vault_display(),
        c.socket_display(),
        c.empty_display(),
        c.enchant_display(),
    ]
}

fn progress_row(c: &CharacterAnalysis) -> Vec<String> {
    vec![
        character_cell(c),
        c.class.clone(),
        format!("{:.1}", c.item_level),
        format!("{}/{}", c.upgrade_current, c.upgrade_max),
        c.upgrades_left.to_string(),
        c.vault_display(),
        c.socket_display(),
        c.empty_display(),
        c.enchant_display(),
        c.notes_display(),
    ]
}

fn progress_headers(last: &'static str) -> [&'static str; 10] {
    [
        "Character",
        "Class",
        "iLvl",
        "Progress",
        "Left",
        "Vault Rewards",
        "Sockets",
        "Needs Gem",
        "Needs Enchant",
        last,
    ]
}

fn push_section(lines: &mut Vec<String>, title: String, table: String) {
    lines.push(title);
    lines.push(String::new());
    lines.push(table);
    lines.push(String::new());
}

/// Markdown gear and vault report
///
/// Groups: fully upgraded with nothing below the top track, fewer than
/// ten upgrade levels left, everything else. Each group is sorted by item
/// level, highest first; empty groups are omitted.
pub fn build_report(analyses: &[CharacterAnalysis]) -> String {
    let mut complete: Vec<&CharacterAnalysis> = analyses.iter().filter(|c| c.is_complete).collect();
    let mut almost: Vec<&CharacterAnalysis> = analyses.iter().filter(|c| c.is_almost_done()).collect();
    let mut needs_work: Vec<&CharacterAnalysis> = analyses
        .iter()
        .filter(|c| !c.is_complete && c.upgrades_left >= ALMOST_DONE_UPGRADES)
        .collect();
    for group in [&mut complete, &mut almost, &mut needs_work] {
        group.sort_by(|a, b| by_item_level_desc(a, b));
    }

    let mut lines = vec!["## Hero Gear & Vault Report".to_string(), String::new()];

    if !complete.is_empty() {
        let rows: Vec<Vec<String>> = complete.iter().map(|c| complete_row(c)).collect();
        push_section(
            &mut lines,
            format!("### Fully 8/8 Hero ({} characters)", complete.len()),
            render_table(&COMPLETE_HEADERS, &rows),
        );
    }
    if !almost.is_empty() {
        let rows: Vec<Vec<String>> = almost.iter().map(|c| progress_row(c)).collect();
        push_section(
            &mut lines,
            format!("### Almost Done ({} characters)", almost.len()),
            render_table(&progress_headers("Notes"), &rows),
        );
    }
    if !needs_work.is_empty() {
        let rows: Vec<Vec<String>> = needs_work.iter().map(|c| progress_row(c)).collect();
        push_section(
            &mut lines,
            format!("### More Work Needed ({} characters)", needs_work.len()),
            render_table(&progress_headers("Missing"), &rows),
        );
    }

    let summary: Vec<Vec<String>> = [Status::Done, Status::Warning, Status::Fail]
        .iter()
        .map(|status| {
            let count = analyses.iter().filter(|c| c.status == *status).count();
            vec![
                status.symbol().to_string(),
                count.to_string(),
                status.meaning().to_string(),
            ]
        })
        .collect();
    let total_left = analyses
        .iter()
        .fold(0i64, |acc, c| acc.saturating_add(c.upgrades_left));

    lines.push("### Summary".to_string());
    lines.push(String::new());
    lines.push(render_table(&["Status", "Count", "Meaning"], &summary));
    lines.push(String::new());
    lines.push(format!(
        "- {} upgrade levels remaining across all characters",
        total_left
    ));

    let mut report = lines.join("\n");
    report.push('\n');
    report
}

// ============================================================================
// CSV
// ============================================================================

fn csv_record(c: &CharacterAnalysis) -> Vec<String> {
    vec![
        c.full_name(),
        c.class.clone(),
        format!("{:.1}", c.item_level),
        c.status.symbol().to_string(),
        format!("{}/{}", c.upgrade_current, c.upgrade_max),
        c.upgrades_left.to_string(),
        c.vault_display(),
        c.socket_display(),
        c.empty_display(),
        c.enchant_display(),
        c.missing.clone(),
        c.pending_upgrades.join("; "),
        c.notes.clone(),
    ]
}

/// One row per character, in input order, after a header row
pub fn write_csv<W: io::Write>(analyses: &[CharacterAnalysis], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(CSV_HEADERS)?;
    for c in analyses {
        wtr.write_record(csv_record(c))
            .with_context(|| format!("Failed to write CSV row for {}", c.full_name()))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_file(analyses: &[CharacterAnalysis], path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(analyses, file)
}

// ============================================================================
// TESTS
// ============================================================================
