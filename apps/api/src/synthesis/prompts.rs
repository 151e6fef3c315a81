// Prompt constants for topic map synthesis.
// Templates use `{name}` placeholders filled with `str::replace` before sending.

/// System prompt for every synthesis call: hierarchy, intent, entity, RAG, PAA,
/// citation and priority rules, plus the JSON-array-only output contract.
pub const TOPIC_MAP_SYSTEM: &str = r#"You are an expert SEO content strategist specialising in topical authority and retrieval-friendly content architecture. Analyse the research data you are given and produce a topical map.

You MUST respond with a valid JSON array only. Do NOT use markdown code fences. Do NOT include explanations.

## Hierarchy
- Pillar: the single broadest topic. Exactly ONE Pillar per map, with content type "Pillar Page" and an empty parent_topic.
- Cluster: a major facet of the Pillar. Its parent_topic is the Pillar's exact content_title. A focused map has 3-5 Clusters; a comprehensive map has 8-15.
- Spoke: one narrow question, comparison or subtopic. Its parent_topic is the exact content_title of a Cluster. Each Cluster gets 2-5 Spokes (focused) or 4-10 (comprehensive).

## Linking
- Clusters link to the Pillar and Spokes link to their Cluster.
- Spokes under the same Cluster link to each other.
- Add cross-cluster links where topics naturally relate. Link targets must be exact content_titles from the map.

## Titles
- Every content_title is unique and contains the primary keyword or a close semantic variant.
- Phrase titles for the search intent: questions for informational topics, action phrases for transactional ones. No clickbait.

## User intent
- Informational: learning or understanding ("what is", "how to", "why").
- Navigational: looking for a specific page or brand.
- Commercial Investigation: researching before a purchase ("best", "vs", "review", "top").
- Transactional: ready to act ("buy", "hire", "get quote", "sign up").

## Semantic entities
List 3-5 entities a knowledge graph expects alongside the topic: related concepts, named organisations, people or tools, and technical terms.

## RAG directions
Give concrete structural guidance so the finished piece is easy for AI answer engines to retrieve: lead with the direct answer, self-contained 150-400 word sections, summary blocks after major sections, question-style headers, front-loaded definitions and data points, and featured-snippet formatting.

## People Also Ask
Give 3-5 real or highly plausible questions per topic, phrased exactly as a searcher would type or say them, mixing definitional, procedural and comparative questions.

## Citations
Name 1-2 or more claims per topic that need a source, formatted as "<claim or data point> — <source type or specific source>". Prefer government data, industry reports, peer-reviewed research and recognised organisations. Reuse statistics surfaced by the research along with their sources.

## Priority score (integer 1-5)
5: high volume, high intent, low competition, strong information gain.
4: high volume with medium competition, or medium volume with low competition and clear differentiation.
3: medium volume and competition; solid supporting content.
2: lower volume but needed for completeness and internal linking.
1: long-tail or highly competitive; nice to have.

## Content types and word counts
{content_types}
"#;

/// User prompt. Replace every `{placeholder}` before sending.
pub const TOPIC_MAP_PROMPT_TEMPLATE: &str = r#"## Input

Topic: {topic}
Scope: {scope}
Industry/Niche: {industry}
Target Audience: {audience}
Geographic Focus: {geo_focus}
Competitors: {competitors}
Existing Content to Exclude: {existing_content}

## Research Data

{research}

## Instructions

Using the research above, generate a complete topical map as a JSON array. Every element has exactly these keys:

{
  "level": "Pillar|Cluster|Spoke",
  "content_title": "SEO-optimised title",
  "primary_keyword": "main target keyword",
  "user_intent": "Informational|Navigational|Commercial Investigation|Transactional",
  "semantic_entities": ["entity1", "entity2", "entity3"],
  "content_type": "one of the listed content types",
  "rag_directions": "structural guidance for retrieval optimisation",
  "paa_questions": ["Question 1?", "Question 2?", "Question 3?"],
  "citations": ["Claim needing a citation — Source type"],
  "parent_topic": "exact parent title; empty string for the Pillar",
  "priority_score": 1,
  "word_count_range": "min-max",
  "internal_link_targets": ["Topic Title 1", "Topic Title 2"]
}

Generate {topic_count} topics in total.

Output ONLY the JSON array."#;

/// Sent once when the first response does not parse. Replace `{error}` and `{output}`.
pub const JSON_FIX_PROMPT_TEMPLATE: &str = r#"The following output was supposed to be a JSON array but failed to parse. Fix it so it is valid JSON and return ONLY the corrected JSON array, with no markdown fences or commentary.

Error: {error}

Original output:
{output}"#;

/// Sent when the first response was cut off. Replace `{last_chunk}`.
pub const CONTINUATION_PROMPT_TEMPLATE: &str = r#"Your previous response was truncated. Continue the JSON array from exactly where it stopped without repeating any entry already generated. Output ONLY the remaining entries as a JSON array, ending with the closing bracket ].

The previous output ended with:
{last_chunk}"#;
