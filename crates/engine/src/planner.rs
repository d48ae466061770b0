//! Query planner
//!
//! Turns the research topic into the first round's query batch. The planner
//! must deliver the full requested count; a short plan aborts the run.

use serde::Deserialize;
use tracing::{debug, warn};

use scout_provider::{parse_structured, CompletionParams, Provider};

use crate::engine::EngineSettings;
use crate::prompts;
use crate::state::PlannedQuery;
use crate::{EngineError, Result};

#[derive(Debug, Deserialize)]
struct QueryPlan {
    query: Vec<PlannedQuery>,
}

/// Generate the initial query batch for a topic
pub async fn plan<P: Provider>(
    provider: &P,
    settings: &EngineSettings,
    topic: &str,
) -> Result<Vec<PlannedQuery>> {
    let count = settings.initial_search_query_count as usize;
    let prompt = prompts::planning_prompt(topic, count, &prompts::current_date());

    let completion = provider
        .complete(CompletionParams {
            model: settings.query_generator_model.clone(),
            prompt,
            temperature: 1.0,
            json_output: true,
            ..CompletionParams::default()
        })
        .await
        .map_err(|e| EngineError::Planning(e.to_string()))?;

    let plan: QueryPlan =
        parse_structured(&completion.content).map_err(|e| EngineError::Planning(e.to_string()))?;

    let mut queries = plan.query;
    if queries.len() < count {
        return Err(EngineError::Planning(format!(
            "planner returned {} of {} requested queries",
            queries.len(),
            count
        )));
    }
    if queries.len() > count {
        warn!(
            "planner returned {} queries, truncating to {}",
            queries.len(),
            count
        );
        queries.truncate(count);
    }

    for planned in &queries {
        debug!(query = %planned.query, rationale = %planned.rationale, "planned query");
    }

    Ok(queries)
}
