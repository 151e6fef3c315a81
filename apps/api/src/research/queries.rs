//! Research query battery: a fixed, topic-derived, de-duplicated set of searches.

use std::collections::HashSet;

/// Competitor `site:` queries appended to the battery.
pub const MAX_COMPETITOR_QUERIES: usize = 3;

/// Builds the research queries for `topic`, in a stable order.
///
/// `year` feeds the statistics query so results skew recent.
pub fn build_research_queries(
    topic: &str,
    industry: Option<&str>,
    competitors: &[String],
    year: i32,
) -> Vec<String> {
    let topic = topic.trim();
    let industry_query = match industry.map(str::trim).filter(|i| !i.is_empty()) {
        Some(industry) => format!("{topic} {industry}"),
        None => format!("{topic} trends"),
    };

    let mut queries = vec![
        topic.to_string(),
        format!("{topic} guide"),
        format!("{topic} how to"),
        format!("what is {topic}"),
        format!("{topic} questions people ask"),
        format!("{topic} statistics {year}"),
        format!("{topic} vs"),
        format!("best {topic}"),
        industry_query,
        format!("{topic} common mistakes"),
    ];

    queries.extend(
        competitors
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .take(MAX_COMPETITOR_QUERIES)
            .map(|c| format!("site:{c} {topic}")),
    );

    let mut seen = HashSet::new();
    queries.retain(|q| seen.insert(q.to_lowercase()));
    queries
}
