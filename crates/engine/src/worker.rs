//! Research worker
//!
//! One worker handles one query: retrieve documents, summarize them, hand
//! back a single summary plus the source URLs. Workers never touch shared
//! state; the controller merges their outputs at the join barrier.

use std::sync::Arc;
use tracing::{debug, warn};

use scout_provider::{CompletionParams, Provider};
use scout_search::SearchProvider;

use crate::engine::EngineSettings;
use crate::prompts;
use crate::state::WorkerOutput;
use crate::{EngineError, Result};

/// Isolated per-task view handed to one worker
#[derive(Debug, Clone)]
pub struct WorkerTask {
    /// Zero-based index, unique within the round
    pub id: usize,
    pub query: String,
}

/// Execute one research task
pub async fn run<P, S>(
    task: WorkerTask,
    provider: Arc<P>,
    search: Arc<S>,
    settings: EngineSettings,
) -> Result<WorkerOutput>
where
    P: Provider,
    S: SearchProvider,
{
    let WorkerTask { id, query } = task;
    debug!(id, query = %query, "research worker started");

    let documents = search
        .search(&query, settings.max_search_results)
        .await
        .map_err(|e| EngineError::Worker {
            id,
            query: query.clone(),
            reason: e.to_string(),
        })?;

    let sources: Vec<String> = documents.iter().map(|d| d.url.clone()).collect();

    let summary = if documents.is_empty() {
        // Nothing to synthesize; skip the model call but still yield the
        // round's one summary entry for this query
        warn!(id, query = %query, "no documents retrieved");
        format!("No search results were found for \"{}\".", query)
    } else {
        let contents: Vec<String> = documents.into_iter().map(|d| d.raw_content).collect();
        let prompt = prompts::summarize_prompt(&query, &contents, &prompts::current_date());

        let completion = provider
            .complete(CompletionParams {
                model: settings.summarize_model.clone(),
                prompt,
                ..CompletionParams::default()
            })
            .await
            .map_err(|e| EngineError::Worker {
                id,
                query: query.clone(),
                reason: e.to_string(),
            })?;

        completion.content
    };

    debug!(id, sources = sources.len(), "research worker finished");

    Ok(WorkerOutput {
        id,
        query,
        summary,
        sources,
    })
}
