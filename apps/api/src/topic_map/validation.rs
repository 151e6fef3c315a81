//! Topic map validation: hard invariants (reject) and soft quality checks (warn).
//!
//! Hard rules, all collected before returning:
//! - `content_title`, `primary_keyword`, `content_type` are non-blank
//! - `priority_score` is within 1–5
//! - multi-valued fields carry no blank items
//! - titles are unique within the batch
//! - exactly one Pillar, with no parent
//! - every Cluster's parent is the Pillar, every Spoke's parent is a Cluster
//!
//! The tier rule makes the hierarchy a tree by construction: a parent is always
//! one level above its child, so no chain can loop back on itself.

use std::collections::HashMap;

use crate::topic_map::error::{ValidationError, Violation};
use crate::topic_map::record::{recommended_range, Level, TopicRecord};

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 5;

/// Validates a full batch. `Ok(())` only when no hard rule is broken.
pub fn validate_records(records: &[TopicRecord]) -> Result<(), ValidationError> {
    let violations = collect_violations(records);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(violations))
    }
}

/// Returns every hard-rule violation in the batch, in record order, batch-wide rules last.
pub fn collect_violations(records: &[TopicRecord]) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (index, record) in records.iter().enumerate() {
        check_record(index, record, &mut violations);
    }

    // title -> (index, level) of its first occurrence
    let mut titles: HashMap<&str, (usize, Level)> = HashMap::new();
    for (index, record) in records.iter().enumerate() {
        let title = record.content_title.trim();
        if title.is_empty() {
            continue;
        }
        if let Some((first, _)) = titles.get(title) {
            violations.push(Violation::record(
                index,
                &record.content_title,
                format!("content_title duplicates entry {first}"),
            ));
        } else {
            titles.insert(title, (index, record.level));
        }
    }

    for (index, record) in records.iter().enumerate() {
        let (Some(expected), Some(parent)) = (record.level.expected_parent(), &record.parent_topic)
        else {
            continue;
        };
        let parent = parent.trim();
        if parent.is_empty() {
            continue; // already reported by check_record
        }
        match titles.get(parent) {
            None => violations.push(Violation::record(
                index,
                &record.content_title,
                format!("parent_topic '{parent}' does not match any content_title"),
            )),
            Some((_, level)) if *level != expected => violations.push(Violation::record(
                index,
                &record.content_title,
                format!(
                    "parent_topic '{parent}' is a {level}; a {} must sit under a {expected}",
                    record.level
                ),
            )),
            Some(_) => {}
        }
    }

    let pillars = records.iter().filter(|r| r.level == Level::Pillar).count();
    if pillars != 1 {
        violations.push(Violation::batch(format!(
            "expected exactly 1 Pillar, found {pillars}"
        )));
    }

    violations
}

fn check_record(index: usize, record: &TopicRecord, out: &mut Vec<Violation>) {
    let title = record.content_title.as_str();
    let mut flag = |message: String| out.push(Violation::record(index, title, message));

    if record.content_title.trim().is_empty() {
        flag("content_title must not be empty".to_string());
    }
    if record.primary_keyword.trim().is_empty() {
        flag("primary_keyword must not be empty".to_string());
    }
    if record.content_type.trim().is_empty() {
        flag("content_type must not be empty".to_string());
    }
    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&record.priority_score) {
        flag(format!(
            "priority_score {} is outside {MIN_PRIORITY}-{MAX_PRIORITY}",
            record.priority_score
        ));
    }

    for (field, items) in list_fields(record) {
        if items.iter().any(|item| item.trim().is_empty()) {
            flag(format!("{field} contains a blank item"));
        }
    }

    let has_parent = record
        .parent_topic
        .as_deref()
        .is_some_and(|p| !p.trim().is_empty());
    match record.level {
        Level::Pillar if record.parent_topic.is_some() => {
            flag("a Pillar must not have a parent_topic".to_string());
        }
        Level::Cluster | Level::Spoke if !has_parent => {
            flag(format!("a {} requires a parent_topic", record.level));
        }
        _ => {}
    }
}

fn list_fields(record: &TopicRecord) -> [(&'static str, &[String]); 4] {
    [
        ("semantic_entities", &record.semantic_entities),
        ("paa_questions", &record.paa_questions),
        ("citations", &record.citations),
        ("internal_link_targets", &record.internal_link_targets),
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// Soft quality checks
// ────────────────────────────────────────────────────────────────────────────

/// Editorial checks that never reject a batch: entity/PAA/citation counts,
/// unresolved link targets and word counts off the content type's recommendation.
pub fn quality_warnings(records: &[TopicRecord]) -> Vec<String> {
    let titles: std::collections::HashSet<&str> =
        records.iter().map(|r| r.content_title.trim()).collect();
    let mut warnings = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let label = format!("Entry {index} ({})", record.content_title);

        let entities = record.semantic_entities.len();
        if !(3..=5).contains(&entities) {
            warnings.push(format!(
                "{label}: semantic_entities should have 3-5 items, got {entities}"
            ));
        }
        if record.paa_questions.len() < 2 {
            warnings.push(format!(
                "{label}: paa_questions should have at least 2 items, got {}",
                record.paa_questions.len()
            ));
        }
        if record.citations.is_empty() {
            warnings.push(format!("{label}: citations should have at least 1 item"));
        }
        for target in &record.internal_link_targets {
            if !titles.contains(target.trim()) {
                warnings.push(format!(
                    "{label}: internal link target '{target}' does not match any content_title"
                ));
            }
        }
        if let Some(recommended) = recommended_range(&record.content_type) {
            if recommended != record.word_count_range {
                warnings.push(format!(
                    "{label}: word_count_range {} differs from the {recommended} recommended for {}",
                    record.word_count_range, record.content_type
                ));
            }
        }
    }

    warnings
}
