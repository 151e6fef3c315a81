//! Research Collector: runs the query battery and compiles a research digest
//! for the synthesis prompt.
//!
//! Queries run one after another with a fixed pause between them. A failed
//! query is logged and skipped; only when every query fails does the last
//! search error reach the caller.

use std::time::Duration;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::research::queries::build_research_queries;
use crate::research::search_client::{SearchClient, SearchError, SearchResponse, Snippet};

const MAX_URLS: usize = 30;
const MAX_SNIPPETS: usize = 25;
const MAX_STATS: usize = 15;
const MAX_QUESTIONS: usize = 20;
const STAT_SNIPPET_CHARS: usize = 300;

const STAT_INDICATORS: &[&str] = &["%", "percent", "billion", "million", "thousand", "$"];
const CONTENT_TYPE_MARKERS: &[&str] = &[
    "guide",
    "how to",
    "vs",
    "comparison",
    "review",
    "best",
    "checklist",
    "faq",
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResearchRequest {
    pub topic: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub competitors: Vec<String>,
}

/// Counts reported back to the caller alongside a generated map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResearchSummary {
    pub summary: String,
    pub query_count: usize,
    pub failed_queries: usize,
    pub url_count: usize,
    pub snippet_count: usize,
    pub stats_count: usize,
    pub questions_count: usize,
}

/// Everything the synthesizer needs from the research phase.
#[derive(Debug, Clone, Default)]
pub struct ResearchDigest {
    pub queries: Vec<String>,
    pub snippets: Vec<Snippet>,
    pub compiled_text: String,
    pub summary: ResearchSummary,
}

/// Raw material gathered across all queries, before de-duplication.
#[derive(Debug, Default)]
struct Findings {
    answers: Vec<String>,
    urls: Vec<String>,
    snippets: Vec<Snippet>,
    snippet_lines: Vec<String>,
    questions: Vec<String>,
    stats: Vec<String>,
    content_types: Vec<&'static str>,
}

pub async fn collect_research(
    client: &dyn SearchClient,
    request: &ResearchRequest,
    delay: Duration,
) -> Result<ResearchDigest, SearchError> {
    let year = chrono::Utc::now().year();
    let queries = build_research_queries(
        &request.topic,
        request.industry.as_deref(),
        &request.competitors,
        year,
    );
    info!(
        "Running {} research queries for '{}'",
        queries.len(),
        request.topic
    );

    let mut findings = Findings::default();
    let mut failed = 0;
    let mut last_error = None;

    for (i, query) in queries.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match client.search(query).await {
            Ok(response) => findings.absorb(query, &response),
            Err(e) => {
                warn!("Research query skipped: {query} ({e})");
                failed += 1;
                last_error = Some(e);
            }
        }
    }

    if failed == queries.len() {
        if let Some(e) = last_error {
            return Err(e);
        }
    }

    Ok(findings.compile(&request.topic, queries, failed))
}

impl Findings {
    fn absorb(&mut self, query: &str, response: &SearchResponse) {
        self.snippets.extend(response.snippets());
        if let Some(answer) = response.answer.as_deref().filter(|a| !a.trim().is_empty()) {
            self.answers.push(format!("**Query: {query}**\n{answer}"));
        }

        for result in &response.results {
            let title = result.title.trim();
            let snippet = result.content.trim();

            if !result.url.is_empty() && !title.is_empty() {
                self.urls.push(format!("- [{title}]({})", result.url));
            }
            if !snippet.is_empty() {
                self.snippet_lines.push(format!("[{title}]: {snippet}"));
            }

            for text in [title, snippet] {
                self.questions.extend(extract_questions(text));
            }

            let lower = snippet.to_lowercase();
            if STAT_INDICATORS.iter().any(|i| lower.contains(i)) {
                self.stats
                    .push(snippet.chars().take(STAT_SNIPPET_CHARS).collect());
            }

            let title_lower = title.to_lowercase();
            self.content_types.extend(
                CONTENT_TYPE_MARKERS
                    .iter()
                    .filter(|marker| title_lower.contains(*marker)),
            );
        }
    }

    fn compile(self, topic: &str, queries: Vec<String>, failed: usize) -> ResearchDigest {
        let urls = unique(&self.urls, MAX_URLS);
        let snippet_lines = unique(&self.snippet_lines, MAX_SNIPPETS);
        let stats = unique(&self.stats, MAX_STATS);
        let questions = unique(&self.questions, MAX_QUESTIONS);
        let content_types = count_in_order(&self.content_types);

        let mut sections: Vec<String> = Vec::new();
        if !self.answers.is_empty() {
            sections.push("### AI-Generated Research Summaries\n".to_string());
            sections.push(self.answers.join("\n\n"));
        }
        if !urls.is_empty() {
            sections.push("\n### Top-Ranking URLs and Titles\n".to_string());
            sections.push(urls.join("\n"));
        }
        if !snippet_lines.is_empty() {
            sections.push("\n### Content Snippets from Search Results\n".to_string());
            sections.push(snippet_lines.join("\n\n"));
        }
        if !stats.is_empty() {
            sections.push("\n### Statistics and Data Points Found\n".to_string());
            sections.extend(stats.iter().map(|s| format!("- {s}")));
        }
        if !questions.is_empty() {
            sections.push("\n### Questions Identified in Results\n".to_string());
            sections.extend(questions.iter().map(|q| format!("- {q}")));
        }
        if !content_types.is_empty() {
            sections.push("\n### Content Types Observed Ranking\n".to_string());
            sections.extend(
                content_types
                    .iter()
                    .map(|(ct, n)| format!("- {ct}: {n} occurrences")),
            );
        }

        let url_count = unique(&self.urls, usize::MAX).len();
        let summary = ResearchSummary {
            summary: format!(
                "Executed {} research queries for '{}'. Found {} unique URLs, {} content snippets, {} data points, and {} questions.",
                queries.len(),
                topic,
                url_count,
                self.snippet_lines.len(),
                self.stats.len(),
                self.questions.len()
            ),
            query_count: queries.len(),
            failed_queries: failed,
            url_count,
            snippet_count: self.snippet_lines.len(),
            stats_count: self.stats.len(),
            questions_count: self.questions.len(),
        };

        ResearchDigest {
            queries,
            snippets: self.snippets,
            compiled_text: sections.join("\n"),
            summary,
        }
    }
}

/// Pulls question sentences out of free text: the clause before each `?`,
/// trimmed back to its last sentence, kept when 16–199 characters long.
fn extract_questions(text: &str) -> Vec<String> {
    if !text.contains('?') {
        return Vec::new();
    }
    let parts: Vec<&str> = text.split('?').collect();
    parts[..parts.len() - 1]
        .iter()
        .filter_map(|part| {
            let sentence = part.trim().rsplit('.').next().unwrap_or("").trim();
            let question = format!("{sentence}?");
            let len = question.chars().count();
            (len > 15 && len < 200).then_some(question)
        })
        .collect()
}

/// First `limit` distinct items, in first-seen order.
fn unique(items: &[String], limit: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(item.as_str()))
        .take(limit)
        .cloned()
        .collect()
}

/// Occurrence counts, most frequent first; ties keep first-seen order.
fn count_in_order(items: &[&'static str]) -> Vec<(&'static str, usize)> {
    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    for &item in items {
        match counts.iter().position(|(name, _)| *name == item) {
            Some(i) => counts[i].1 += 1,
            None => counts.push((item, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
