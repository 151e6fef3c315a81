//! Topic record: the canonical 13-field unit of a topical map.
//!
//! Enum-typed fields parse leniently (trimmed, case-insensitive) but always
//! render in their canonical display form, so export output is stable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error produced when a single field value cannot be turned into its typed form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unknown {field} '{value}' (expected one of: {expected})")]
    UnknownVariant {
        field: &'static str,
        value: String,
        expected: String,
    },

    #[error("malformed word count range '{0}' (expected '<low>-<high>' with 0 < low < high)")]
    WordCountRange(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Level
// ────────────────────────────────────────────────────────────────────────────

/// Tier in the content hierarchy. Ordering is the default display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    Pillar,
    Cluster,
    Spoke,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Pillar, Level::Cluster, Level::Spoke];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Pillar => "Pillar",
            Level::Cluster => "Cluster",
            Level::Spoke => "Spoke",
        }
    }

    /// The level a record of this tier must point to via `parent_topic`.
    pub fn expected_parent(&self) -> Option<Level> {
        match self {
            Level::Pillar => None,
            Level::Cluster => Some(Level::Pillar),
            Level::Spoke => Some(Level::Cluster),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| FieldError::UnknownVariant {
                field: "level",
                value: s.to_string(),
                expected: join_names(Level::ALL.iter().map(Level::as_str)),
            })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// UserIntent
// ────────────────────────────────────────────────────────────────────────────

/// Search intent behind a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UserIntent {
    Informational,
    Navigational,
    #[serde(rename = "Commercial Investigation")]
    CommercialInvestigation,
    Transactional,
}

impl UserIntent {
    pub const ALL: [UserIntent; 4] = [
        UserIntent::Informational,
        UserIntent::Navigational,
        UserIntent::CommercialInvestigation,
        UserIntent::Transactional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserIntent::Informational => "Informational",
            UserIntent::Navigational => "Navigational",
            UserIntent::CommercialInvestigation => "Commercial Investigation",
            UserIntent::Transactional => "Transactional",
        }
    }
}

impl fmt::Display for UserIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserIntent {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Models sometimes emit "Commercial_Investigation" or "commercial-investigation".
        let wanted: String = s
            .trim()
            .chars()
            .map(|c| if c == '_' || c == '-' { ' ' } else { c })
            .collect();
        UserIntent::ALL
            .into_iter()
            .find(|intent| intent.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| FieldError::UnknownVariant {
                field: "user_intent",
                value: s.to_string(),
                expected: join_names(UserIntent::ALL.iter().map(UserIntent::as_str)),
            })
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

// ────────────────────────────────────────────────────────────────────────────
// WordCountRange
// ────────────────────────────────────────────────────────────────────────────

/// Target article length, written `<low>-<high>`.
///
/// Construction guarantees `0 < low < high`, so a value of this type is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WordCountRange {
    low: u32,
    high: u32,
}

impl WordCountRange {
    pub fn new(low: u32, high: u32) -> Result<Self, FieldError> {
        if low == 0 || low >= high {
            return Err(FieldError::WordCountRange(format!("{low}-{high}")));
        }
        Ok(Self { low, high })
    }
}

impl fmt::Display for WordCountRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

impl FromStr for WordCountRange {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || FieldError::WordCountRange(s.to_string());
        let (low, high) = s.trim().split_once('-').ok_or_else(malformed)?;
        let low = low.trim().parse::<u32>().map_err(|_| malformed())?;
        let high = high.trim().parse::<u32>().map_err(|_| malformed())?;
        WordCountRange::new(low, high).map_err(|_| malformed())
    }
}

impl TryFrom<String> for WordCountRange {
    type Error = FieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WordCountRange> for String {
    fn from(range: WordCountRange) -> Self {
        range.to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Content type catalogue
// ────────────────────────────────────────────────────────────────────────────

/// Known content formats and their recommended word counts (low, high).
pub const CONTENT_TYPES: &[(&str, u32, u32)] = &[
    ("Pillar Page", 3000, 5000),
    ("Ultimate Guide", 2500, 4000),
    ("How-To Guide", 1500, 2500),
    ("Explainer", 1000, 2000),
    ("Comparison", 1500, 2500),
    ("Listicle", 1500, 3000),
    ("FAQ Page", 1000, 2000),
    ("Case Study", 1000, 2000),
    ("Checklist", 800, 1500),
    ("Statistics/Data Page", 1000, 2000),
    ("Glossary", 1500, 3000),
    ("Service Page", 800, 1500),
    ("Resource Hub", 1000, 2000),
    ("Product Page", 800, 1500),
];

/// Recommended word count range for a catalogued content type, if any.
pub fn recommended_range(content_type: &str) -> Option<WordCountRange> {
    let wanted = content_type.trim();
    CONTENT_TYPES
        .iter()
        .find(|(name, _, _)| name.eq_ignore_ascii_case(wanted))
        .and_then(|&(_, low, high)| WordCountRange::new(low, high).ok())
}

// ────────────────────────────────────────────────────────────────────────────
// TopicRecord
// ────────────────────────────────────────────────────────────────────────────

/// One row of a topical map. Immutable once it has entered a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub level: Level,
    pub content_title: String,
    pub primary_keyword: String,
    pub user_intent: UserIntent,
    pub semantic_entities: Vec<String>,
    pub content_type: String,
    pub rag_directions: String,
    pub paa_questions: Vec<String>,
    pub citations: Vec<String>,
    /// Absent only for the Pillar.
    #[serde(default)]
    pub parent_topic: Option<String>,
    pub priority_score: u8,
    pub word_count_range: WordCountRange,
    pub internal_link_targets: Vec<String>,
}
