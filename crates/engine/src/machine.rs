//! Loop controller state machine
//!
//! Pure transitions: the async driver feeds one event per phase and performs
//! the returned action. All termination logic lives here, so the loop
//! boundary is testable without a model or search call.
//!
//! The loop cap gates the aggregating→reflecting edge and takes precedence
//! over sufficiency: a capped run never invokes the evaluator again, even if
//! the model would insist more research is needed.

use crate::reflection::Reflection;
use crate::state::WorkerOutput;
use crate::{EngineError, Result};

/// Controller phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Planning,
    Dispatched,
    Aggregating,
    Reflecting,
    Continuing,
    Done,
}

/// Events fed by the driver
#[derive(Debug)]
pub enum Event {
    /// A query batch is ready to fan out (initial plan or follow-ups)
    PlanReady { queries: Vec<String> },
    /// Every worker of the round completed; outputs in completion order
    RoundComplete { outputs: Vec<WorkerOutput> },
    /// The round's outputs were merged into the state
    Merged { loop_count: u32, max_loops: u32 },
    /// The reflection evaluator produced a judgment
    Judged { reflection: Reflection },
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Event::PlanReady { .. } => "PlanReady",
            Event::RoundComplete { .. } => "RoundComplete",
            Event::Merged { .. } => "Merged",
            Event::Judged { .. } => "Judged",
        }
    }
}

/// Actions for the driver to perform
#[derive(Debug)]
pub enum Action {
    /// Fan out one worker per query and wait at the join barrier
    Dispatch(Vec<String>),
    /// Merge the round's outputs into the state
    Merge(Vec<WorkerOutput>),
    /// Invoke the reflection evaluator
    Reflect,
    /// Feed the follow-up queries back in as the next round's batch
    Continue { follow_ups: Vec<String> },
    /// Terminal; return the state to the caller
    Finish(StopReason),
}

/// Why a run terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The evaluator judged the evidence sufficient
    Sufficient,
    /// The hard loop cap was reached
    LoopLimit,
    /// The evaluator judged the evidence insufficient but proposed no
    /// follow-ups; treated as sufficiency-equivalent to guarantee termination
    NoFollowUps,
}

/// Advance the controller by one event
pub fn step(phase: Phase, event: Event) -> Result<(Phase, Action)> {
    match (phase, event) {
        (Phase::Planning, Event::PlanReady { queries })
        | (Phase::Continuing, Event::PlanReady { queries }) => {
            Ok((Phase::Dispatched, Action::Dispatch(queries)))
        }

        (Phase::Dispatched, Event::RoundComplete { outputs }) => {
            Ok((Phase::Aggregating, Action::Merge(outputs)))
        }

        (
            Phase::Aggregating,
            Event::Merged {
                loop_count,
                max_loops,
            },
        ) => {
            if loop_count >= max_loops {
                Ok((Phase::Done, Action::Finish(StopReason::LoopLimit)))
            } else {
                Ok((Phase::Reflecting, Action::Reflect))
            }
        }

        (Phase::Reflecting, Event::Judged { reflection }) => {
            if reflection.is_sufficient {
                Ok((Phase::Done, Action::Finish(StopReason::Sufficient)))
            } else if reflection.follow_up_queries.is_empty() {
                Ok((Phase::Done, Action::Finish(StopReason::NoFollowUps)))
            } else {
                Ok((
                    Phase::Continuing,
                    Action::Continue {
                        follow_ups: reflection.follow_up_queries,
                    },
                ))
            }
        }

        (phase, event) => Err(EngineError::State(format!(
            "event {} not valid in phase {:?}",
            event.name(),
            phase
        ))),
    }
}
