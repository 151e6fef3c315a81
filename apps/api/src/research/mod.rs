pub mod collector;
pub mod queries;
pub mod search_client;

pub use collector::{collect_research, ResearchDigest, ResearchRequest, ResearchSummary};
pub use search_client::{SearchClient, SearchError, TavilyClient};
