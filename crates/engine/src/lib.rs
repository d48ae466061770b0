//! Research engine - the iterative plan, search, reflect loop
//!
//! A run plans an initial batch of search queries, fans each query out to a
//! concurrent research worker, merges the workers' summaries into the shared
//! research state at a join barrier, then asks a reflection evaluator whether
//! the evidence suffices. Insufficient evidence yields follow-up queries and
//! another round, bounded by a hard loop cap.

use thiserror::Error;

pub mod engine;
pub mod machine;
pub mod planner;
mod prompts;
pub mod reflection;
pub mod state;
pub mod worker;

pub use engine::{EngineSettings, ResearchEngine};
pub use machine::{Action, Event, Phase, StopReason};
pub use reflection::Reflection;
pub use state::{PlannedQuery, ResearchState, TopicTurn, WorkerOutput};
pub use worker::WorkerTask;

/// Engine errors; the variant names the phase that failed
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("planning failed: {0}")]
    Planning(String),

    #[error("worker {id} failed for query \"{query}\": {reason}")]
    Worker {
        id: usize,
        query: String,
        reason: String,
    },

    #[error("reflection failed: {0}")]
    Reflection(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("state machine protocol violation: {0}")]
    State(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
