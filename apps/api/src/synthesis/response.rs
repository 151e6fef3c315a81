//! Recovery of a JSON array of entries from raw model output.

use serde_json::Value;

use crate::llm_client::strip_json_fences;

/// Removes code fences and trailing commas before `]` or `}`.
///
/// Commas inside string literals are left alone.
pub fn clean_json_response(raw: &str) -> String {
    let text = strip_json_fences(raw);
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
                if !matches!(next, Some(']') | Some('}')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Parses cleaned text as a JSON array of entries.
pub fn parse_entries(cleaned: &str) -> Result<Vec<Value>, serde_json::Error> {
    serde_json::from_str(cleaned)
}

/// A cleaned response that does not close its array was cut off mid-stream.
pub fn is_truncated(cleaned: &str) -> bool {
    let text = cleaned.trim_end();
    text.starts_with('[') && !text.ends_with(']')
}

/// Keeps every complete object of a truncated array.
///
/// Cuts after each `}` from the end backwards until the prefix closes into a
/// valid array. `None` when no complete object survives.
pub fn salvage_truncated(cleaned: &str) -> Option<Vec<Value>> {
    cleaned
        .rmatch_indices('}')
        .find_map(|(i, _)| {
            let candidate = clean_json_response(&format!("{}]", &cleaned[..=i]));
            parse_entries(&candidate).ok()
        })
        .filter(|entries| !entries.is_empty())
}

/// The last `max_chars` characters of `text`, for the continuation prompt.
pub fn tail(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    match text.char_indices().nth(count - max_chars) {
        Some((i, _)) => &text[i..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_removes_fences_and_trailing_commas() {
        let raw = "```json\n[{\"a\": 1, \"b\": [1, 2,],},\n]\n```";
        assert_eq!(clean_json_response(raw), "[{\"a\": 1, \"b\": [1, 2]}\n]");
        assert_eq!(parse_entries(&clean_json_response(raw)).unwrap().len(), 1);
    }

    #[test]
    fn test_clean_keeps_commas_inside_strings() {
        let raw = r#"[{"title": "Tips, tricks ,]", "q": "say \"hi,}\""}]"#;
        assert_eq!(clean_json_response(raw), raw);
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(parse_entries("{\"level\": \"Pillar\"}").is_err());
    }

    #[test]
    fn test_is_truncated() {
        assert!(is_truncated("[{\"a\": 1}, {\"a\""));
        assert!(!is_truncated("[{\"a\": 1}]\n"));
        assert!(!is_truncated("Sorry, I cannot help with that."));
    }

    #[test]
    fn test_salvage_keeps_complete_objects() {
        let cleaned = r#"[{"t": "one"}, {"t": "two", "x": {"y": 1}}, {"t": "thr"#;
        let entries = salvage_truncated(cleaned).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1]["x"]["y"], 1);
    }

    #[test]
    fn test_salvage_skips_brace_inside_string() {
        let cleaned = r#"[{"t": "one"}, {"t": "two }"#;
        let entries = salvage_truncated(cleaned).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_salvage_without_complete_object() {
        assert!(salvage_truncated("[{\"t\": \"on").is_none());
    }

    #[test]
    fn test_tail_is_char_safe() {
        assert_eq!(tail("héllo", 3), "llo");
        assert_eq!(tail("ab", 5), "ab");
    }
}
