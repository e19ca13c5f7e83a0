//! The extraction engine: rule table × line sequence → [`PayslipRecord`].
//!
//! ## Why a pure function?
//!
//! `extract` takes normalized lines and returns a record — no I/O, no
//! shared state, no clock. Identical input always yields an identical
//! record, which makes the whole stage trivially testable and safe to run
//! from any number of ingestion tasks at once.
//!
//! A field whose rule never fires simply stays `None`. Absence is data,
//! not an error: real payslips omit fields all the time.

use crate::extract::rules::{FieldRule, Scope, HEADER, RULES};
use crate::record::PayslipRecord;
use tracing::debug;

/// Run the positional header rule and the full rule table over the lines.
pub fn extract(lines: &[String]) -> PayslipRecord {
    let mut record = PayslipRecord::default();
    apply_header(&mut record, lines);
    for rule in RULES.iter() {
        apply_rule(&mut record, rule, lines);
    }
    debug!(
        fields = field_count(&record),
        lines = lines.len(),
        "extraction finished"
    );
    record
}

fn field_count(record: &PayslipRecord) -> usize {
    // Serialization skips absent fields, so the object length is the count
    // of populated ones.
    match serde_json::to_value(record) {
        Ok(serde_json::Value::Object(map)) => map.len(),
        _ => 0,
    }
}

/// Positional name/family extraction. Applies only when the document is
/// long enough and the name line actually carries the separator; otherwise
/// both fields stay empty.
fn apply_header(record: &mut PayslipRecord, lines: &[String]) {
    if lines.len() < HEADER.min_lines {
        return;
    }
    let Some((name, _)) = lines[HEADER.name_line].split_once(HEADER.separator) else {
        debug!("header layout not recognized, skipping name extraction");
        return;
    };
    let name = name.trim();
    if !name.is_empty() {
        record.name = Some(name.to_string());
    }
    let family = lines[HEADER.family_line].trim();
    if !family.is_empty() {
        record.family_name = Some(family.to_string());
    }
}

fn apply_rule(record: &mut PayslipRecord, rule: &FieldRule, lines: &[String]) {
    let candidates = match rule.scope {
        Scope::AllLines => lines,
        Scope::FirstLineOnly => &lines[..lines.len().min(1)],
    };
    for line in candidates {
        if !rule.anchors.is_empty() && !rule.anchors.iter().any(|a| line.contains(a)) {
            continue;
        }
        // An anchored line that fails the capture pattern does not end the
        // scan; a later line may carry the value.
        let Some(captures) = rule.pattern.captures(line) else {
            continue;
        };
        let Some(value) = captures.get(1) else {
            continue;
        };
        let mut value = value.as_str().trim().to_string();
        if rule.numeric {
            value = normalize_number(&value);
        }
        if value.is_empty() {
            continue;
        }
        debug!(field = rule.name, "rule matched");
        (rule.assign)(record, value);
        return;
    }
}

/// Fold Persian and Arabic-Indic digits to ASCII and strip grouping
/// separators. Everything else passes through unchanged.
///
/// Also used on inbound chat text, where recipients type identifiers in
/// whichever digit script their keyboard produces.
pub fn normalize_number(value: &str) -> String {
    value
        .chars()
        .filter_map(|c| match c {
            ',' | '\u{066C}' => None,
            '\u{06F0}'..='\u{06F9}' => {
                Some(char::from(b'0' + (c as u32 - 0x06F0) as u8))
            }
            '\u{0660}'..='\u{0669}' => {
                Some(char::from(b'0' + (c as u32 - 0x0660) as u8))
            }
            other => Some(other),
        })
        .collect()
}
