//! Reflection evaluator
//!
//! Reviews the accumulated summaries against the topic and judges whether
//! the evidence suffices, proposing follow-up queries when it does not.

use serde::{Deserialize, Serialize};
use tracing::debug;

use scout_provider::{parse_structured, CompletionParams, Provider};

use crate::engine::EngineSettings;
use crate::prompts;
use crate::{EngineError, Result};

/// The evaluator's judgment, consumed immediately by the loop controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reflection {
    pub is_sufficient: bool,
    #[serde(default)]
    pub follow_up_queries: Vec<String>,
}

/// Judge the accumulated evidence for a topic
pub async fn evaluate<P: Provider>(
    provider: &P,
    settings: &EngineSettings,
    topic: &str,
    summaries: &[String],
) -> Result<Reflection> {
    let prompt = prompts::reflection_prompt(topic, summaries, &prompts::current_date());

    let completion = provider
        .complete(CompletionParams {
            model: settings.reflection_model.clone(),
            prompt,
            json_output: true,
            ..CompletionParams::default()
        })
        .await
        .map_err(|e| EngineError::Reflection(e.to_string()))?;

    let reflection: Reflection = parse_structured(&completion.content)
        .map_err(|e| EngineError::Reflection(e.to_string()))?;

    debug!(
        is_sufficient = reflection.is_sufficient,
        follow_ups = reflection.follow_up_queries.len(),
        "reflection judged"
    );

    Ok(reflection)
}
