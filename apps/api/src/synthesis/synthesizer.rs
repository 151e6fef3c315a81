//! Map Synthesis: turns a research digest into a validated topic map.
//!
//! Flow: render prompt → generate → parse (fix prompt on failure,
//!       continuation when truncated) → coerce entries → validate batch.
//!
//! Nothing is returned unless the whole batch passes validation; quality
//! warnings are logged and never block.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::TextGenerator;
use crate::research::{ResearchDigest, ResearchRequest};
use crate::synthesis::coerce::coerce_entries;
use crate::synthesis::prompts::{
    CONTINUATION_PROMPT_TEMPLATE, JSON_FIX_PROMPT_TEMPLATE, TOPIC_MAP_PROMPT_TEMPLATE,
    TOPIC_MAP_SYSTEM,
};
use crate::synthesis::response::{
    clean_json_response, is_truncated, parse_entries, salvage_truncated, tail,
};
use crate::topic_map::error::{ParseError, ValidationError};
use crate::topic_map::record::{TopicRecord, CONTENT_TYPES};
use crate::topic_map::validation::{collect_violations, quality_warnings};

/// Characters of the failed output echoed back in the JSON fix prompt.
const FIX_PROMPT_OUTPUT_CHARS: usize = 8000;
/// Characters of the truncated output echoed back in the continuation prompt.
const CONTINUATION_TAIL_CHARS: usize = 500;

// ────────────────────────────────────────────────────────────────────────────
// Request
// ────────────────────────────────────────────────────────────────────────────

/// How many topics to ask for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Focused,
    Comprehensive,
}

impl Scope {
    pub fn topic_count(&self) -> &'static str {
        match self {
            Scope::Focused => "15-25",
            Scope::Comprehensive => "40-75",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Scope::Focused => "Focused (15-25 topics)",
            Scope::Comprehensive => "Comprehensive (40-75 topics)",
        }
    }
}

/// Seed topic plus the optional context that steers research and synthesis.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationRequest {
    pub topic: String,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub geo_focus: Option<String>,
    #[serde(default)]
    pub competitors: Vec<String>,
    #[serde(default)]
    pub existing_content: Option<String>,
}

impl GenerationRequest {
    pub fn research_request(&self) -> ResearchRequest {
        ResearchRequest {
            topic: self.topic.trim().to_string(),
            industry: self.industry.clone(),
            competitors: self.competitors.clone(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Prompt rendering
// ────────────────────────────────────────────────────────────────────────────

pub fn system_prompt() -> String {
    let catalogue = CONTENT_TYPES
        .iter()
        .map(|(name, low, high)| format!("- {name}: {low}-{high} words"))
        .collect::<Vec<_>>()
        .join("\n");
    TOPIC_MAP_SYSTEM.replace("{content_types}", &catalogue)
}

pub fn render_user_prompt(request: &GenerationRequest, digest: &ResearchDigest) -> String {
    fn or_default<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
        value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(default)
    }

    let competitors = request
        .competitors
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    TOPIC_MAP_PROMPT_TEMPLATE
        .replace("{topic}", request.topic.trim())
        .replace("{scope}", request.scope.label())
        .replace(
            "{industry}",
            or_default(request.industry.as_deref(), "Not specified"),
        )
        .replace(
            "{audience}",
            or_default(request.audience.as_deref(), "Not specified"),
        )
        .replace(
            "{geo_focus}",
            or_default(request.geo_focus.as_deref(), "Not specified"),
        )
        .replace(
            "{competitors}",
            or_default(Some(competitors.as_str()), "None provided"),
        )
        .replace(
            "{existing_content}",
            or_default(request.existing_content.as_deref(), "None provided"),
        )
        .replace("{topic_count}", request.scope.topic_count())
        .replace("{research}", &digest.compiled_text)
}

// ────────────────────────────────────────────────────────────────────────────
// Synthesis
// ────────────────────────────────────────────────────────────────────────────

/// Generates, repairs and validates a topic map for `request`.
pub async fn generate_topic_map(
    generator: &dyn TextGenerator,
    request: &GenerationRequest,
    digest: &ResearchDigest,
) -> Result<Vec<TopicRecord>, AppError> {
    let system = system_prompt();
    let prompt = render_user_prompt(request, digest);

    info!(
        "Generating {} topic map for '{}'",
        request.scope.label(),
        request.topic
    );
    let raw = generator.complete(&system, &prompt).await?;
    let entries = recover_entries(generator, &system, &raw).await?;
    if entries.is_empty() {
        return Err(ParseError::Response("no topic map entries were generated".to_string()).into());
    }

    let coerced = coerce_entries(&entries);
    let (positions, records): (Vec<usize>, Vec<TopicRecord>) =
        coerced.records.into_iter().unzip();

    let mut violations = coerced.violations;
    violations.extend(collect_violations(&records).into_iter().map(|mut v| {
        v.index = v.index.and_then(|i| positions.get(i).copied());
        v
    }));
    if !violations.is_empty() {
        violations.sort_by_key(|v| (v.index.is_none(), v.index));
        let error = ValidationError::new(violations);
        warn!(
            "Generated map for '{}' failed validation: {} violation(s) across {} entries",
            request.topic,
            error.violations.len(),
            error.record_indexes().len()
        );
        return Err(error.into());
    }

    for warning in quality_warnings(&records) {
        warn!("Topic map quality: {warning}");
    }
    info!(
        "Generated {} topic map entries for '{}'",
        records.len(),
        request.topic
    );
    Ok(records)
}

/// Parses the first response, falling back to a continuation request when it
/// was truncated and then to a single JSON fix request.
async fn recover_entries(
    generator: &dyn TextGenerator,
    system: &str,
    raw: &str,
) -> Result<Vec<serde_json::Value>, AppError> {
    let cleaned = clean_json_response(raw);
    let parse_error = match parse_entries(&cleaned) {
        Ok(entries) => return Ok(entries),
        Err(e) => e,
    };

    if is_truncated(&cleaned) {
        if let Some(mut entries) = salvage_truncated(&cleaned) {
            warn!(
                "Response truncated after {} complete entries, requesting continuation",
                entries.len()
            );
            let prompt = CONTINUATION_PROMPT_TEMPLATE
                .replace("{last_chunk}", tail(raw, CONTINUATION_TAIL_CHARS));
            let continuation = generator.complete(system, &prompt).await?;
            match parse_entries(&clean_json_response(&continuation)) {
                Ok(more) if !more.is_empty() => {
                    entries.extend(more);
                    return Ok(entries);
                }
                _ => warn!("Continuation did not parse, falling back to a JSON fix request"),
            }
        }
    }

    warn!("Response did not parse as a JSON array ({parse_error}), requesting a fix");
    let output: String = raw.chars().take(FIX_PROMPT_OUTPUT_CHARS).collect();
    let prompt = JSON_FIX_PROMPT_TEMPLATE
        .replace("{error}", &parse_error.to_string())
        .replace("{output}", &output);
    let fixed = generator.complete(system, &prompt).await?;

    parse_entries(&clean_json_response(&fixed)).map_err(|e| {
        ParseError::Response(format!(
            "response is not a valid JSON array even after a fix request: {e}"
        ))
        .into()
    })
}
