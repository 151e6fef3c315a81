//! Conversion of loosely-typed model entries into `TopicRecord`s.
//!
//! Local, recoverable issues are repaired in place: strings are trimmed, blank
//! list items dropped, numeric strings accepted for the priority, an empty
//! parent treated as absent, and a missing or malformed word-count range
//! replaced by the content type's recommendation. Structural problems (missing
//! fields, wrong types, unknown enum values) become violations.

use serde_json::{Map, Value};

use crate::topic_map::error::Violation;
use crate::topic_map::record::{recommended_range, Level, TopicRecord, UserIntent, WordCountRange};

/// Records that coerced cleanly, each with its position in the model's array,
/// plus one violation per problem found in the rest.
#[derive(Debug, Default)]
pub struct Coerced {
    pub records: Vec<(usize, TopicRecord)>,
    pub violations: Vec<Violation>,
}

pub fn coerce_entries(entries: &[Value]) -> Coerced {
    let mut coerced = Coerced::default();
    for (index, entry) in entries.iter().enumerate() {
        match coerce_entry(entry) {
            Ok(record) => coerced.records.push((index, record)),
            Err(problems) => {
                let title = entry
                    .get("content_title")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .trim();
                coerced.violations.extend(
                    problems
                        .into_iter()
                        .map(|message| Violation::record(index, title, message)),
                );
            }
        }
    }
    coerced
}

fn coerce_entry(entry: &Value) -> Result<TopicRecord, Vec<String>> {
    let Some(obj) = entry.as_object() else {
        return Err(vec!["entry is not a JSON object".to_string()]);
    };
    let mut fields = Fields {
        obj,
        problems: Vec::new(),
    };

    let level = fields
        .string("level")
        .and_then(|s| fields.parsed::<Level>(&s));
    let content_title = fields.string("content_title");
    let primary_keyword = fields.string("primary_keyword");
    let user_intent = fields
        .string("user_intent")
        .and_then(|s| fields.parsed::<UserIntent>(&s));
    let semantic_entities = fields.list("semantic_entities");
    let content_type = fields.string("content_type");
    let rag_directions = fields.string("rag_directions");
    let paa_questions = fields.list("paa_questions");
    let citations = fields.list("citations");
    let parent_topic = fields.parent();
    let priority_score = fields.priority();
    let internal_link_targets = fields.list("internal_link_targets");
    let word_count_range = content_type
        .as_deref()
        .and_then(|ct| fields.word_count_range(ct));

    match (
        level,
        content_title,
        primary_keyword,
        user_intent,
        semantic_entities,
        content_type,
        rag_directions,
        paa_questions,
        citations,
        priority_score,
        word_count_range,
        internal_link_targets,
    ) {
        (
            Some(level),
            Some(content_title),
            Some(primary_keyword),
            Some(user_intent),
            Some(semantic_entities),
            Some(content_type),
            Some(rag_directions),
            Some(paa_questions),
            Some(citations),
            Some(priority_score),
            Some(word_count_range),
            Some(internal_link_targets),
        ) if fields.problems.is_empty() => Ok(TopicRecord {
            level,
            content_title,
            primary_keyword,
            user_intent,
            semantic_entities,
            content_type,
            rag_directions,
            paa_questions,
            citations,
            parent_topic,
            priority_score,
            word_count_range,
            internal_link_targets,
        }),
        _ => Err(fields.problems),
    }
}

/// Field accessor that records a problem for every value it cannot use.
struct Fields<'a> {
    obj: &'a Map<String, Value>,
    problems: Vec<String>,
}

impl<'a> Fields<'a> {
    fn required(&mut self, key: &str) -> Option<&'a Value> {
        let obj: &'a Map<String, Value> = self.obj;
        match obj.get(key) {
            Some(Value::Null) | None => {
                self.problems.push(format!("missing required field: {key}"));
                None
            }
            Some(value) => Some(value),
        }
    }

    fn string(&mut self, key: &str) -> Option<String> {
        match self.required(key)? {
            Value::String(s) => Some(s.trim().to_string()),
            other => {
                let kind = json_kind(other);
                self.problems
                    .push(format!("{key} must be a string, got {kind}"));
                None
            }
        }
    }

    fn parsed<T>(&mut self, value: &str) -> Option<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        value
            .parse::<T>()
            .map_err(|e| self.problems.push(e.to_string()))
            .ok()
    }

    /// Array of strings or numbers; a bare string counts as a one-item list.
    fn list(&mut self, key: &str) -> Option<Vec<String>> {
        let value = self.required(key)?;
        let items: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            Value::String(_) => vec![value],
            other => {
                let kind = json_kind(other);
                self.problems
                    .push(format!("{key} must be a list of strings, got {kind}"));
                return None;
            }
        };

        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::String(s) if s.trim().is_empty() => {}
                Value::String(s) => out.push(s.trim().to_string()),
                Value::Number(n) => out.push(n.to_string()),
                Value::Null => {}
                other => {
                    self.problems.push(format!(
                        "{key} items must be strings, got {}",
                        json_kind(other)
                    ));
                    return None;
                }
            }
        }
        Some(out)
    }

    fn parent(&mut self) -> Option<String> {
        let obj: &'a Map<String, Value> = self.obj;
        match obj.get("parent_topic") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::String(_)) | Some(Value::Null) | None => None,
            Some(other) => {
                let kind = json_kind(other);
                self.problems
                    .push(format!("parent_topic must be a string, got {kind}"));
                None
            }
        }
    }

    fn priority(&mut self) -> Option<u8> {
        let value = self.required("priority_score")?;
        let number = match value {
            Value::Number(n) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                    .map(|f| f as u64)
            }),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        match number.map(u8::try_from) {
            Some(Ok(score)) => Some(score),
            Some(Err(_)) => {
                self.problems
                    .push(format!("priority_score {value} is outside 1-5"));
                None
            }
            None => {
                self.problems
                    .push(format!("priority_score {value} is not an integer"));
                None
            }
        }
    }

    /// The declared range when it parses, else the catalogue recommendation.
    fn word_count_range(&mut self, content_type: &str) -> Option<WordCountRange> {
        let declared = match self.obj.get("word_count_range") {
            Some(Value::String(s)) => Some(s.replace(['–', '—'], "-").parse::<WordCountRange>()),
            _ => None,
        };
        match (declared, recommended_range(content_type)) {
            (Some(Ok(range)), _) => Some(range),
            (_, Some(fallback)) => Some(fallback),
            (Some(Err(e)), None) => {
                self.problems.push(e.to_string());
                None
            }
            (None, None) => {
                self.problems.push(format!(
                    "missing word_count_range and no recommendation exists for content_type '{content_type}'"
                ));
                None
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pillar_json() -> Value {
        json!({
            "level": "Pillar",
            "content_title": "  Content Marketing ",
            "primary_keyword": "content marketing",
            "user_intent": "Informational",
            "semantic_entities": ["SEO", "", "keyword research", "on-page optimization"],
            "content_type": "Pillar Page",
            "rag_directions": "Lead with a definition.",
            "paa_questions": ["What is content marketing?", "Why does it matter?"],
            "citations": ["Adoption statistic — industry report"],
            "parent_topic": "",
            "priority_score": "5",
            "word_count_range": "3000-5000",
            "internal_link_targets": []
        })
    }

    #[test]
    fn test_clean_entry_is_repaired() {
        let coerced = coerce_entries(&[pillar_json()]);
        assert!(coerced.violations.is_empty());
        let (index, record) = &coerced.records[0];
        assert_eq!(*index, 0);
        assert_eq!(record.content_title, "Content Marketing");
        assert_eq!(record.semantic_entities.len(), 3);
        assert_eq!(record.parent_topic, None);
        assert_eq!(record.priority_score, 5);
    }

    #[test]
    fn test_word_count_range_falls_back_to_catalogue() {
        let mut entry = pillar_json();
        entry["word_count_range"] = json!("lots");
        let coerced = coerce_entries(&[entry]);
        assert_eq!(
            coerced.records[0].1.word_count_range,
            WordCountRange::new(3000, 5000).unwrap()
        );

        let mut entry = pillar_json();
        entry["word_count_range"] = json!("1200–1800");
        let coerced = coerce_entries(&[entry]);
        assert_eq!(coerced.records[0].1.word_count_range.to_string(), "1200-1800");
    }

    #[test]
    fn test_off_catalogue_type_needs_a_range() {
        let mut entry = pillar_json();
        entry["content_type"] = json!("Podcast Episode");
        entry.as_object_mut().unwrap().remove("word_count_range");
        let coerced = coerce_entries(&[entry]);
        assert!(coerced.records.is_empty());
        assert!(coerced.violations[0]
            .message
            .contains("no recommendation exists for content_type 'Podcast Episode'"));
    }

    #[test]
    fn test_structural_problems_become_violations() {
        let mut entry = pillar_json();
        entry["level"] = json!("Hub");
        entry["user_intent"] = json!(3);
        entry.as_object_mut().unwrap().remove("citations");
        let coerced = coerce_entries(&[json!("not an object"), entry]);

        assert!(coerced.records.is_empty());
        let messages: Vec<String> = coerced.violations.iter().map(|v| v.to_string()).collect();
        assert_eq!(messages[0], "Entry 0: entry is not a JSON object");
        assert!(messages[1].starts_with("Entry 1 (Content Marketing): unknown level 'Hub'"));
        assert_eq!(
            messages[2],
            "Entry 1 (Content Marketing): user_intent must be a string, got a number"
        );
        assert_eq!(
            messages[3],
            "Entry 1 (Content Marketing): missing required field: citations"
        );
        assert_eq!(messages.len(), 4);
    }

    #[test]
    fn test_priority_outside_byte_range() {
        let mut entry = pillar_json();
        entry["priority_score"] = json!(900);
        let coerced = coerce_entries(&[entry]);
        assert_eq!(
            coerced.violations[0].message,
            "priority_score 900 is outside 1-5"
        );
    }

    #[test]
    fn test_out_of_range_priority_is_left_for_validation() {
        let mut entry = pillar_json();
        entry["priority_score"] = json!(6.0);
        let coerced = coerce_entries(&[entry]);
        assert_eq!(coerced.records[0].1.priority_score, 6);
    }

    #[test]
    fn test_bare_string_becomes_single_item_list() {
        let mut entry = pillar_json();
        entry["citations"] = json!("Market size — analyst report");
        let coerced = coerce_entries(&[entry]);
        assert_eq!(
            coerced.records[0].1.citations,
            vec!["Market size — analyst report"]
        );
    }
}
