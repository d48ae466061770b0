//! Shared research state
//!
//! One record per run. Collection fields are append-only; the engine mutates
//! the record only between phases, never from inside a worker.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One conversation turn of the research topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicTurn {
    pub role: String,
    pub content: String,
}

impl TopicTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// A planned search query with its justification
///
/// The rationale is carried for observability only; no control decision
/// reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedQuery {
    pub query: String,
    #[serde(default)]
    pub rationale: String,
}

/// Output of one research worker: exactly one summary plus its sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerOutput {
    pub id: usize,
    pub query: String,
    pub summary: String,
    pub sources: Vec<String>,
}

/// The evolving research record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchState {
    pub run_id: Uuid,
    pub topic: Vec<TopicTurn>,
    pub queries: Vec<String>,
    pub summaries: Vec<String>,
    pub sources: Vec<String>,
    /// Reflection rounds completed so far
    pub loop_count: u32,
    /// Slot for a future answer-synthesis stage; the engine never writes it
    pub final_answer: Option<String>,
}

impl ResearchState {
    /// Create a fresh state for one run
    pub fn new(topic: Vec<TopicTurn>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            topic,
            queries: Vec::new(),
            summaries: Vec::new(),
            sources: Vec::new(),
            loop_count: 0,
            final_answer: None,
        }
    }

    /// Create a state from a single user question
    pub fn from_question(question: impl Into<String>) -> Self {
        Self::new(vec![TopicTurn::user(question)])
    }

    /// Reduce the conversation to a single research-topic string
    pub fn research_topic(&self) -> String {
        match self.topic.as_slice() {
            [only] => only.content.clone(),
            turns => turns
                .iter()
                .map(|t| format!("{}: {}", t.role, t.content))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Append a batch of issued queries
    pub fn record_queries(&mut self, queries: impl IntoIterator<Item = String>) {
        self.queries.extend(queries);
    }

    /// Merge one worker's output; the single mutation point for the
    /// accumulator fields
    pub fn absorb(&mut self, output: WorkerOutput) {
        self.summaries.push(output.summary);
        self.sources.extend(output.sources);
    }
}
