//! Research engine driver
//!
//! Owns the injected collaborators and walks the state machine: it feeds
//! events into `machine::step` and performs the returned actions. Workers
//! fan out on a `JoinSet`; the driver suspends at the join barrier and only
//! merges a round that completed in full.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, info};

use scout_config::Config;
use scout_provider::Provider;
use scout_search::SearchProvider;

use crate::machine::{self, Action, Event, Phase};
use crate::state::{ResearchState, TopicTurn, WorkerOutput};
use crate::worker::{self, WorkerTask};
use crate::{planner, reflection};
use crate::{EngineError, Result};

/// Run parameters, fixed for the lifetime of one engine
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub query_generator_model: String,
    pub summarize_model: String,
    pub reflection_model: String,
    pub initial_search_query_count: u32,
    pub max_research_loops: u32,
    pub max_search_results: u32,
    /// Upper bound on one worker's retrieval + summarization
    pub worker_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            query_generator_model: "deepseek-chat".to_string(),
            summarize_model: "deepseek-chat".to_string(),
            reflection_model: "deepseek-chat".to_string(),
            initial_search_query_count: 3,
            max_research_loops: 2,
            max_search_results: 3,
            worker_timeout: Duration::from_secs(120),
        }
    }
}

impl EngineSettings {
    /// Build settings from the loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            query_generator_model: config.query_generator_model(),
            summarize_model: config.summarize_model(),
            reflection_model: config.reflection_model(),
            initial_search_query_count: config.initial_search_query_count(),
            max_research_loops: config.max_research_loops(),
            max_search_results: config.max_search_results(),
            ..EngineSettings::default()
        }
    }
}

/// The research engine with its injected collaborators
pub struct ResearchEngine<P, S> {
    provider: Arc<P>,
    search: Arc<S>,
    settings: EngineSettings,
}

impl<P, S> ResearchEngine<P, S>
where
    P: Provider + 'static,
    S: SearchProvider + 'static,
{
    pub fn new(provider: P, search: S, settings: EngineSettings) -> Self {
        Self {
            provider: Arc::new(provider),
            search: Arc::new(search),
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Run one research loop to completion and return the final state
    pub async fn run(&self, topic: Vec<TopicTurn>) -> Result<ResearchState> {
        let mut state = ResearchState::new(topic);
        info!(run_id = %state.run_id, "research run started");

        let planned =
            planner::plan(self.provider.as_ref(), &self.settings, &state.research_topic()).await?;
        let batch: Vec<String> = planned.into_iter().map(|q| q.query).collect();
        state.record_queries(batch.clone());

        let mut phase = Phase::Planning;
        let mut event = Event::PlanReady { queries: batch };

        loop {
            let (next, action) = machine::step(phase, event)?;
            phase = next;

            match action {
                Action::Dispatch(queries) => {
                    let outputs = self.dispatch_round(queries).await?;
                    event = Event::RoundComplete { outputs };
                }
                Action::Merge(outputs) => {
                    info!(
                        run_id = %state.run_id,
                        summaries = outputs.len(),
                        "round aggregated"
                    );
                    for output in outputs {
                        state.absorb(output);
                    }
                    event = Event::Merged {
                        loop_count: state.loop_count,
                        max_loops: self.settings.max_research_loops,
                    };
                }
                Action::Reflect => {
                    // Counting oracle: one increment per evaluator invocation
                    state.loop_count += 1;
                    let reflection = reflection::evaluate(
                        self.provider.as_ref(),
                        &self.settings,
                        &state.research_topic(),
                        &state.summaries,
                    )
                    .await?;
                    event = Event::Judged { reflection };
                }
                Action::Continue { follow_ups } => {
                    info!(
                        run_id = %state.run_id,
                        follow_ups = follow_ups.len(),
                        "continuing with follow-up queries"
                    );
                    state.record_queries(follow_ups.clone());
                    event = Event::PlanReady { queries: follow_ups };
                }
                Action::Finish(reason) => {
                    info!(
                        run_id = %state.run_id,
                        loops = state.loop_count,
                        reason = ?reason,
                        summaries = state.summaries.len(),
                        sources = state.sources.len(),
                        "research run finished"
                    );
                    return Ok(state);
                }
            }
        }
    }

    /// Fan out one worker per query and wait for the whole round
    ///
    /// All-or-nothing: the first worker failure aborts the remaining
    /// siblings and fails the round before anything is merged.
    async fn dispatch_round(&self, queries: Vec<String>) -> Result<Vec<WorkerOutput>> {
        debug!("dispatching {} research workers", queries.len());

        let mut tasks: JoinSet<Result<WorkerOutput>> = JoinSet::new();
        for (id, query) in queries.into_iter().enumerate() {
            let task = WorkerTask { id, query };
            let provider = Arc::clone(&self.provider);
            let search = Arc::clone(&self.search);
            let settings = self.settings.clone();
            let timeout = self.settings.worker_timeout;
            let (task_id, task_query) = (task.id, task.query.clone());

            tasks.spawn(async move {
                match tokio::time::timeout(timeout, worker::run(task, provider, search, settings))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(EngineError::Worker {
                        id: task_id,
                        query: task_query,
                        reason: "timed out".to_string(),
                    }),
                }
            });
        }

        let mut outputs = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(output)) => {
                    debug!(id = output.id, query = %output.query, "worker joined");
                    outputs.push(output);
                }
                Ok(Err(err)) => {
                    tasks.abort_all();
                    return Err(err);
                }
                Err(join_err) => {
                    tasks.abort_all();
                    return Err(EngineError::State(format!(
                        "worker task died: {}",
                        join_err
                    )));
                }
            }
        }

        Ok(outputs)
    }
}
