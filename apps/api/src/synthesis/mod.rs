// Map synthesis: prompt rendering, response recovery, coercion and validation.
// All model calls go through the `TextGenerator` seam in llm_client.

pub mod coerce;
pub mod prompts;
pub mod response;
pub mod synthesizer;

pub use synthesizer::{generate_topic_map, GenerationRequest};
