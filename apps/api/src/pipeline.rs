//! Generation pipeline: research the seed topic, then synthesize a validated map.

use std::time::Duration;

use tracing::{debug, info};

use crate::errors::AppError;
use crate::llm_client::TextGenerator;
use crate::research::search_client::Snippet;
use crate::research::{collect_research, ResearchSummary, SearchClient};
use crate::synthesis::{generate_topic_map, GenerationRequest};
use crate::topic_map::record::TopicRecord;

/// Output of one successful run, ready to load into a session.
#[derive(Debug, Clone)]
pub struct GeneratedMap {
    pub records: Vec<TopicRecord>,
    pub research: ResearchSummary,
    pub sources: Vec<Snippet>,
}

/// Runs research then synthesis for `request`.
///
/// Rejects a blank topic before any external call is made.
pub async fn run_generation(
    search: &dyn SearchClient,
    generator: &dyn TextGenerator,
    request: &GenerationRequest,
    research_delay: Duration,
) -> Result<GeneratedMap, AppError> {
    if request.topic.trim().is_empty() {
        return Err(AppError::BadRequest("topic must not be empty".to_string()));
    }

    let digest = collect_research(search, &request.research_request(), research_delay).await?;
    info!("Research complete: {}", digest.summary.summary);
    debug!("Research queries: {:?}", digest.queries);

    let records = generate_topic_map(generator, request, &digest).await?;
    Ok(GeneratedMap {
        records,
        research: digest.summary,
        sources: digest.snippets,
    })
}
