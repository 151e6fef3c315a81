//! Record table: one validated generation run, with read-only views over it.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::topic_map::delimited::{to_delimited_text, Delimiter};
use crate::topic_map::error::ValidationError;
use crate::topic_map::record::{FieldError, Level, TopicRecord, UserIntent};
use crate::topic_map::validation::validate_records;

/// A validated, immutable collection of topic records in generation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicTable {
    records: Vec<TopicRecord>,
}

/// Conjunctive filter over a table. Each empty set matches everything; a
/// non-empty set matches any of its members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicFilter {
    pub levels: Vec<Level>,
    pub intents: Vec<UserIntent>,
    pub content_types: Vec<String>,
    pub min_priority: Option<u8>,
    /// Apply the default display order instead of table order.
    pub sort: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("invalid {param} '{value}'")]
    Invalid { param: &'static str, value: String },
}

impl TopicFilter {
    /// Builds a filter from query-string pairs. `level`, `intent` and
    /// `content_type` may repeat; blank values and unknown keys are ignored.
    /// Enum values parse as leniently as they do on import.
    pub fn from_query_pairs(pairs: &[(String, String)]) -> Result<Self, FilterError> {
        let mut filter = TopicFilter::default();
        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "level" => filter.levels.push(value.parse()?),
                "intent" => filter.intents.push(value.parse()?),
                "content_type" => filter.content_types.push(value.to_string()),
                "min_priority" => {
                    let min = value.parse::<u8>().map_err(|_| FilterError::Invalid {
                        param: "min_priority",
                        value: value.to_string(),
                    })?;
                    filter.min_priority = Some(min);
                }
                "sort" => {
                    filter.sort = value.parse::<bool>().map_err(|_| FilterError::Invalid {
                        param: "sort",
                        value: value.to_string(),
                    })?;
                }
                _ => {}
            }
        }
        Ok(filter)
    }

    pub fn matches(&self, record: &TopicRecord) -> bool {
        (self.levels.is_empty() || self.levels.contains(&record.level))
            && (self.intents.is_empty() || self.intents.contains(&record.user_intent))
            && (self.content_types.is_empty()
                || self
                    .content_types
                    .iter()
                    .any(|ct| record.content_type.trim().eq_ignore_ascii_case(ct.trim())))
            && self
                .min_priority
                .map_or(true, |min| record.priority_score >= min)
    }
}

/// Counts shown above the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatistics {
    pub total: usize,
    pub pillars: usize,
    pub clusters: usize,
    pub spokes: usize,
    pub intent_distribution: BTreeMap<String, usize>,
}

impl TopicTable {
    /// Validates and takes ownership of a whole batch. Nothing is kept on failure.
    pub fn load(records: Vec<TopicRecord>) -> Result<Self, ValidationError> {
        validate_records(&records)?;
        Ok(Self { records })
    }

    pub fn records(&self) -> &[TopicRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn pillar(&self) -> Option<&TopicRecord> {
        self.records.iter().find(|r| r.level == Level::Pillar)
    }

    pub fn filter(&self, filter: &TopicFilter) -> Vec<&TopicRecord> {
        let mut matched: Vec<&TopicRecord> =
            self.records.iter().filter(|r| filter.matches(r)).collect();
        if filter.sort {
            sort_for_display(&mut matched);
        }
        matched
    }

    pub fn statistics(&self) -> TableStatistics {
        let count = |level: Level| self.records.iter().filter(|r| r.level == level).count();
        let mut intent_distribution = BTreeMap::new();
        for record in &self.records {
            *intent_distribution
                .entry(record.user_intent.to_string())
                .or_insert(0) += 1;
        }
        TableStatistics {
            total: self.records.len(),
            pillars: count(Level::Pillar),
            clusters: count(Level::Cluster),
            spokes: count(Level::Spoke),
            intent_distribution,
        }
    }

    pub fn to_delimited_text(&self, delimiter: Delimiter) -> String {
        to_delimited_text(&self.records, delimiter)
    }
}

fn sort_for_display(records: &mut [&TopicRecord]) {
    // Stable: equal keys keep table order.
    records.sort_by(|a, b| {
        a.level
            .cmp(&b.level)
            .then_with(|| b.priority_score.cmp(&a.priority_score))
    });
}
