//! Delimited text export/import (CSV or TSV) for topic records.
//!
//! Format:
//! - header row with the 13 display names in [`COLUMNS`] order, one row per record
//! - multi-valued fields joined with `|`; inside an item `\` is written `\\` and `|` is written `\|`
//! - a cell containing the field separator, `|`, `"`, `\n` or `\r` is wrapped in `"`, inner `"` doubled
//! - rows end with `\n`; `\r\n` and a leading UTF-8 BOM are accepted on import
//!
//! `from_delimited_text(to_delimited_text(records)) == records` for every valid table.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::topic_map::error::ParseError;
use crate::topic_map::record::{Level, TopicRecord, UserIntent, WordCountRange};

/// Export header, in column order.
pub const COLUMNS: [&str; 13] = [
    "Level",
    "Content Title",
    "Primary Keyword",
    "User Intent",
    "Semantic Entities",
    "Content Type",
    "RAG Directions",
    "PAA Questions",
    "Citations",
    "Parent Topic",
    "Priority Score",
    "Word Count Range",
    "Internal Link Targets",
];

const LIST_SEPARATOR: char = '|';
const ESCAPE: char = '\\';
const QUOTE: char = '"';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Delimiter {
    #[default]
    #[serde(rename = "csv")]
    Comma,
    #[serde(rename = "tsv")]
    Tab,
}

impl Delimiter {
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Delimiter::Comma => "csv",
            Delimiter::Tab => "tsv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Delimiter::Comma => "text/csv; charset=utf-8",
            Delimiter::Tab => "text/tab-separated-values; charset=utf-8",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Export
// ────────────────────────────────────────────────────────────────────────────

pub fn to_delimited_text(records: &[TopicRecord], delimiter: Delimiter) -> String {
    let mut out = String::new();
    write_row(&mut out, COLUMNS.iter().map(|c| c.to_string()), delimiter);
    for record in records {
        write_row(&mut out, record_cells(record), delimiter);
    }
    out
}

fn record_cells(record: &TopicRecord) -> [String; 13] {
    [
        record.level.to_string(),
        record.content_title.clone(),
        record.primary_keyword.clone(),
        record.user_intent.to_string(),
        join_list(&record.semantic_entities),
        record.content_type.clone(),
        record.rag_directions.clone(),
        join_list(&record.paa_questions),
        join_list(&record.citations),
        record.parent_topic.clone().unwrap_or_default(),
        record.priority_score.to_string(),
        record.word_count_range.to_string(),
        join_list(&record.internal_link_targets),
    ]
}

fn write_row(out: &mut String, cells: impl IntoIterator<Item = String>, delimiter: Delimiter) {
    let separator = delimiter.as_char();
    for (i, cell) in cells.into_iter().enumerate() {
        if i > 0 {
            out.push(separator);
        }
        if needs_quoting(&cell, separator) {
            out.push(QUOTE);
            out.push_str(&cell.replace(QUOTE, "\"\""));
            out.push(QUOTE);
        } else {
            out.push_str(&cell);
        }
    }
    out.push('\n');
}

fn needs_quoting(cell: &str, separator: char) -> bool {
    cell.chars()
        .any(|c| c == separator || c == LIST_SEPARATOR || c == QUOTE || c == '\n' || c == '\r')
}

fn join_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| escape_item(item))
        .collect::<Vec<_>>()
        .join("|")
}

fn escape_item(item: &str) -> String {
    let mut escaped = String::with_capacity(item.len());
    for c in item.chars() {
        if c == ESCAPE || c == LIST_SEPARATOR {
            escaped.push(ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// `topical_map_<slug>_<YYYYMMDD>.<ext>` for a seed topic.
pub fn export_filename(topic: &str, delimiter: Delimiter, date: NaiveDate) -> String {
    let mut slug = String::new();
    for c in topic.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    let slug = if slug.is_empty() { "topic" } else { slug };
    format!(
        "topical_map_{slug}_{}.{}",
        date.format("%Y%m%d"),
        delimiter.extension()
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Import
// ────────────────────────────────────────────────────────────────────────────

/// Parses exported text back into records. Structure only: hierarchy invariants
/// are checked when the records are loaded into a table.
pub fn from_delimited_text(text: &str, delimiter: Delimiter) -> Result<Vec<TopicRecord>, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rows = split_rows(text, delimiter.as_char())?.into_iter();

    let (header_row, header) = rows.next().ok_or_else(|| ParseError::Row {
        row: 1,
        message: "missing header row".to_string(),
    })?;
    check_header(header_row, &header)?;

    rows.map(|(row, cells)| parse_record(row, cells)).collect()
}

fn check_header(row: usize, header: &[String]) -> Result<(), ParseError> {
    if header.len() != COLUMNS.len() {
        return Err(ParseError::Row {
            row,
            message: format!(
                "expected {} header columns, found {}",
                COLUMNS.len(),
                header.len()
            ),
        });
    }
    for (found, expected) in header.iter().zip(COLUMNS) {
        if found.trim() != expected {
            return Err(ParseError::Cell {
                row,
                column: expected,
                message: format!("unexpected header '{found}'"),
            });
        }
    }
    Ok(())
}

fn parse_record(row: usize, cells: Vec<String>) -> Result<TopicRecord, ParseError> {
    if cells.len() != COLUMNS.len() {
        return Err(ParseError::Row {
            row,
            message: format!("expected {} columns, found {}", COLUMNS.len(), cells.len()),
        });
    }
    let cell_error = |column: usize, message: String| ParseError::Cell {
        row,
        column: COLUMNS[column],
        message,
    };
    let list = |column: usize| split_list(&cells[column]).map_err(|m| cell_error(column, m));

    let level: Level = cells[0].parse().map_err(|e| cell_error(0, format!("{e}")))?;
    let user_intent: UserIntent = cells[3].parse().map_err(|e| cell_error(3, format!("{e}")))?;
    let priority_score = cells[10]
        .trim()
        .parse::<u8>()
        .map_err(|_| cell_error(10, format!("'{}' is not an integer 1-5", cells[10])))?;
    let word_count_range: WordCountRange =
        cells[11].parse().map_err(|e| cell_error(11, format!("{e}")))?;

    Ok(TopicRecord {
        level,
        content_title: cells[1].clone(),
        primary_keyword: cells[2].clone(),
        user_intent,
        semantic_entities: list(4)?,
        content_type: cells[5].clone(),
        rag_directions: cells[6].clone(),
        paa_questions: list(7)?,
        citations: list(8)?,
        parent_topic: Some(cells[9].clone()).filter(|p| !p.is_empty()),
        priority_score,
        word_count_range,
        internal_link_targets: list(12)?,
    })
}

fn split_list(cell: &str) -> Result<Vec<String>, String> {
    if cell.is_empty() {
        return Ok(Vec::new());
    }
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = cell.chars();
    while let Some(c) = chars.next() {
        match c {
            ESCAPE => match chars.next() {
                Some(next @ (ESCAPE | LIST_SEPARATOR)) => current.push(next),
                Some(other) => return Err(format!("invalid escape sequence '\\{other}'")),
                None => return Err("dangling escape character at end of cell".to_string()),
            },
            LIST_SEPARATOR => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);
    Ok(items)
}

/// Splits text into rows of unquoted cells, tagging each row with its 1-based
/// record number. Blank lines are skipped but still counted.
fn split_rows(text: &str, separator: char) -> Result<Vec<(usize, Vec<String>)>, ParseError> {
    let mut rows = Vec::new();
    let mut row_number = 1;
    let mut cells: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    let mut finish_row = |cells: &mut Vec<String>, cell: &mut String, row: usize| {
        cells.push(std::mem::take(cell));
        let cells = std::mem::take(cells);
        let blank = cells.len() == 1 && cells[0].is_empty();
        if !blank {
            rows.push((row, cells));
        }
    };

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == QUOTE {
                if chars.peek() == Some(&QUOTE) {
                    chars.next();
                    cell.push(QUOTE);
                } else {
                    in_quotes = false;
                }
            } else {
                cell.push(c);
            }
            continue;
        }
        match c {
            QUOTE if cell.is_empty() => in_quotes = true,
            c if c == separator => cells.push(std::mem::take(&mut cell)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                finish_row(&mut cells, &mut cell, row_number);
                row_number += 1;
            }
            c => cell.push(c),
        }
    }

    if in_quotes {
        return Err(ParseError::Row {
            row: row_number,
            message: "unterminated quoted field".to_string(),
        });
    }
    if !cell.is_empty() || !cells.is_empty() {
        finish_row(&mut cells, &mut cell, row_number);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic_map::table::TopicTable;
    use crate::topic_map::validation::fixtures::{content_marketing, record};

    #[test]
    fn test_content_marketing_exports_four_lines_and_round_trips() {
        let table = TopicTable::load(content_marketing()).unwrap();
        let text = table.to_delimited_text(Delimiter::Comma);
        assert_eq!(text.lines().count(), 4);
        assert_eq!(text.lines().next().unwrap(), COLUMNS.join(","));

        let parsed = from_delimited_text(&text, Delimiter::Comma).unwrap();
        assert_eq!(parsed, table.records());
        assert!(TopicTable::load(parsed).is_ok());
    }

    #[test]
    fn test_semantic_entities_join_with_pipe() {
        let records = content_marketing();
        let text = to_delimited_text(&records[..1], Delimiter::Tab);
        let row = text.lines().nth(1).unwrap();
        let cells: Vec<&str> = row.split('\t').collect();
        // Pipes force quoting of the cell.
        assert_eq!(cells[4], "\"SEO|keyword research|on-page optimization\"");

        let parsed = from_delimited_text(&text, Delimiter::Tab).unwrap();
        assert_eq!(
            parsed[0].semantic_entities,
            vec!["SEO", "keyword research", "on-page optimization"]
        );
    }

    #[test]
    fn test_pillar_row_has_empty_parent_cell() {
        let records = content_marketing();
        let text = to_delimited_text(&records[..1], Delimiter::Comma);
        let parsed = from_delimited_text(&text, Delimiter::Comma).unwrap();
        assert_eq!(parsed[0].parent_topic, None);
    }

    #[test]
    fn test_awkward_characters_round_trip() {
        let mut records = content_marketing();
        records[0].content_title = "Content Marketing, \"Done Right\"".to_string();
        records[1].parent_topic = Some(records[0].content_title.clone());
        records[0].rag_directions = "Line one\nLine two\r\n\tindented | piped".to_string();
        records[1].semantic_entities = vec![
            "A|B testing".to_string(),
            "C:\\drive\\path".to_string(),
            "trailing\\".to_string(),
            "\\|".to_string(),
        ];
        records[2].paa_questions = vec!["What about \"quotes\", commas, and tabs\t?".to_string()];
        records[2].citations.clear();

        for delimiter in [Delimiter::Comma, Delimiter::Tab] {
            let text = to_delimited_text(&records, delimiter);
            let parsed = from_delimited_text(&text, delimiter).unwrap();
            assert_eq!(parsed, records, "round trip failed for {delimiter:?}");
        }
    }

    #[test]
    fn test_empty_lists_round_trip() {
        let mut records = content_marketing();
        records[0].semantic_entities.clear();
        records[0].internal_link_targets.clear();
        let text = to_delimited_text(&records, Delimiter::Comma);
        let parsed = from_delimited_text(&text, Delimiter::Comma).unwrap();
        assert!(parsed[0].semantic_entities.is_empty());
        assert!(parsed[0].internal_link_targets.is_empty());
    }

    #[test]
    fn test_header_only_yields_no_records() {
        let text = to_delimited_text(&[], Delimiter::Comma);
        assert!(from_delimited_text(&text, Delimiter::Comma)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_crlf_and_bom_are_accepted() {
        let records = content_marketing();
        let text = format!(
            "\u{feff}{}",
            to_delimited_text(&records, Delimiter::Comma).replace('\n', "\r\n")
        );
        let parsed = from_delimited_text(&text, Delimiter::Comma).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_column_count_mismatch_names_row() {
        let records = content_marketing();
        let mut text = to_delimited_text(&records, Delimiter::Comma);
        text.push_str("Spoke,Too Short\n");
        let err = from_delimited_text(&text, Delimiter::Comma).unwrap_err();
        assert_eq!(
            err,
            ParseError::Row {
                row: 5,
                message: "expected 13 columns, found 2".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_level_names_row_and_column() {
        let records = content_marketing();
        let text = to_delimited_text(&records, Delimiter::Comma).replacen("\nSpoke,", "\nLeaf,", 1);
        match from_delimited_text(&text, Delimiter::Comma).unwrap_err() {
            ParseError::Cell { row, column, message } => {
                assert_eq!(row, 4);
                assert_eq!(column, "Level");
                assert!(message.contains("'Leaf'"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_intent_is_reported() {
        let mut records = content_marketing();
        records.truncate(1);
        let text = to_delimited_text(&records, Delimiter::Tab).replace("\tInformational\t", "\tCurious\t");
        let err = from_delimited_text(&text, Delimiter::Tab).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Cell { row: 2, column: "User Intent", .. }
        ));
    }

    #[test]
    fn test_malformed_word_count_range_is_reported() {
        let mut records = content_marketing();
        records.truncate(1);
        let text = to_delimited_text(&records, Delimiter::Comma).replace("3000-5000", "5000-3000");
        let err = from_delimited_text(&text, Delimiter::Comma).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Cell { row: 2, column: "Word Count Range", .. }
        ));
    }

    #[test]
    fn test_non_integer_priority_is_reported() {
        let mut records = content_marketing();
        records.truncate(1);
        let text = to_delimited_text(&records, Delimiter::Comma).replace(",5,3000", ",high,3000");
        let err = from_delimited_text(&text, Delimiter::Comma).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Cell { row: 2, column: "Priority Score", .. }
        ));
    }

    #[test]
    fn test_out_of_range_priority_parses_but_fails_load() {
        let mut records = content_marketing();
        records[0].priority_score = 6;
        let text = to_delimited_text(&records, Delimiter::Comma);
        let parsed = from_delimited_text(&text, Delimiter::Comma).unwrap();
        assert!(TopicTable::load(parsed).is_err());
    }

    #[test]
    fn test_bad_header_is_rejected() {
        let text = "Level,Title\nPillar,X\n";
        let err = from_delimited_text(text, Delimiter::Comma).unwrap_err();
        assert!(matches!(err, ParseError::Row { row: 1, .. }));

        let renamed = to_delimited_text(&content_marketing(), Delimiter::Comma)
            .replacen("Primary Keyword", "Keyword", 1);
        let err = from_delimited_text(&renamed, Delimiter::Comma).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Cell { row: 1, column: "Primary Keyword", .. }
        ));
    }

    #[test]
    fn test_missing_header_is_rejected() {
        assert!(matches!(
            from_delimited_text("", Delimiter::Comma).unwrap_err(),
            ParseError::Row { row: 1, .. }
        ));
    }

    #[test]
    fn test_unterminated_quote_is_rejected() {
        let mut text = to_delimited_text(&content_marketing(), Delimiter::Comma);
        text.push_str("Spoke,\"never closed\n");
        let err = from_delimited_text(&text, Delimiter::Comma).unwrap_err();
        assert!(matches!(err, ParseError::Row { row: 5, .. }));
    }

    #[test]
    fn test_invalid_escape_in_list_is_rejected() {
        assert!(split_list("a\\b").is_err());
        assert!(split_list("a\\").is_err());
        assert_eq!(split_list("a\\|b|c").unwrap(), vec!["a|b", "c"]);
    }

    #[test]
    fn test_blank_lines_are_skipped_but_counted() {
        let records = vec![record(Level::Pillar, "Solo", None, 3)];
        let text = to_delimited_text(&records, Delimiter::Comma);
        let mut lines: Vec<&str> = text.lines().collect();
        lines.insert(1, "");
        let spaced = lines.join("\n");
        let parsed = from_delimited_text(&spaced, Delimiter::Comma).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_export_filename_slugs_topic() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(
            export_filename("Content Marketing & SEO!", Delimiter::Comma, date),
            "topical_map_content_marketing_seo_20261016.csv"
        );
        assert_eq!(
            export_filename("  ", Delimiter::Tab, date),
            "topical_map_topic_20261016.tsv"
        );
    }
}
