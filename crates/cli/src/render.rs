use fn_history_entity_locator::EntityInfo;
use fn_history_protocol::{AnalyzeResponse, ChangeType, SnapshotPayload};
use std::collections::HashSet;

const RULE_WIDTH: usize = 60;

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `2024-03-05T10:00:00+01:00` -> `2024-03-05`
fn short_date(timestamp: &str) -> &str {
    timestamp.get(..10).unwrap_or(timestamp)
}

fn change_label(change: ChangeType) -> &'static str {
    match change {
        ChangeType::Created => "CREATED",
        ChangeType::Modified => "MODIFIED",
    }
}

fn render_snapshot(out: &mut String, snapshot: &SnapshotPayload, total: usize) {
    let commit = &snapshot.commit;
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push('\n');
    out.push_str(&format!(
        "## Version {}/{} - {}\n",
        snapshot.index + 1,
        total,
        change_label(snapshot.change_type)
    ));
    out.push_str(&format!(
        "Commit: {} ({})\n",
        commit.short_hash,
        short_date(&commit.date)
    ));
    out.push_str(&format!("Author: {}\n", commit.author));
    out.push_str(&format!("Message: {}\n\n", commit.subject));

    let changed: HashSet<usize> = snapshot.changed_lines.iter().copied().collect();
    for (offset, line) in snapshot.source.split('\n').enumerate() {
        let marker = if changed.contains(&offset) { '+' } else { ' ' };
        out.push_str(&format!(
            "{marker} {:4} | {line}\n",
            snapshot.start_line + offset
        ));
    }
    out.push('\n');
}

/// Plain-text history: a header, then every version with its numbered
/// source and `+` on the lines that changed
pub fn render_history(response: &AnalyzeResponse) -> String {
    let total = response.snapshots.len();
    let mut out = String::new();
    out.push_str(&format!(
        "# {}: {}\n",
        capitalize(response.entity_type.as_str()),
        response.entity_name
    ));
    out.push_str(&format!("# File: {}\n", response.file_path));
    out.push_str(&format!("# Versions: {total}\n\n"));

    for snapshot in &response.snapshots {
        render_snapshot(&mut out, snapshot, total);
    }
    out
}

pub fn render_entities(entities: &[EntityInfo]) -> String {
    let mut out = String::new();
    for entity in entities {
        out.push_str(&format!(
            "{:<9} {:<32} {:>5}-{:<5} {}\n",
            entity.entity_type.as_str(),
            entity.name,
            entity.start_line,
            entity.end_line,
            entity.signature
        ));
    }
    out
}
