//! End-to-end loop tests against scripted collaborators
//!
//! A single fake provider serves the planner, summarizer, and evaluator
//! roles, routed by model id; a fake search provider counts calls and can
//! delay or fail specific queries.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scout_engine::{EngineError, EngineSettings, ResearchEngine, ResearchState, TopicTurn};
use scout_provider::{Completion, CompletionParams, Provider, ProviderError};
use scout_search::{Document, SearchError, SearchProvider};

const PLANNER_MODEL: &str = "planner-model";
const SUMMARIZER_MODEL: &str = "summarizer-model";
const REFLECTOR_MODEL: &str = "reflector-model";

fn test_settings() -> EngineSettings {
    EngineSettings {
        query_generator_model: PLANNER_MODEL.to_string(),
        summarize_model: SUMMARIZER_MODEL.to_string(),
        reflection_model: REFLECTOR_MODEL.to_string(),
        initial_search_query_count: 3,
        max_research_loops: 2,
        max_search_results: 3,
        worker_timeout: Duration::from_secs(5),
    }
}

fn plan_json(queries: &[&str]) -> String {
    let items: Vec<String> = queries
        .iter()
        .map(|q| format!(r#"{{"query": "{}", "rationale": "covers {}"}}"#, q, q))
        .collect();
    format!(r#"{{"query": [{}]}}"#, items.join(","))
}

fn insufficient(follow_ups: &[&str]) -> String {
    let items: Vec<String> = follow_ups.iter().map(|q| format!("\"{}\"", q)).collect();
    format!(
        r#"{{"is_sufficient": false, "follow_up_queries": [{}]}}"#,
        items.join(",")
    )
}

fn sufficient() -> String {
    r#"{"is_sufficient": true, "follow_up_queries": []}"#.to_string()
}

/// Fake provider routed by model id
struct ScriptedProvider {
    plan: String,
    scripted_reflections: Mutex<Vec<String>>,
    fallback_reflection: String,
    reflection_calls: Arc<AtomicUsize>,
    summarize_calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    fn new(plan_queries: &[&str]) -> Self {
        Self {
            plan: plan_json(plan_queries),
            scripted_reflections: Mutex::new(Vec::new()),
            fallback_reflection: insufficient(&["f1", "f2"]),
            reflection_calls: Arc::new(AtomicUsize::new(0)),
            summarize_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue reflection outputs consumed in order; the fallback repeats after
    fn with_reflections(self, items: &[String]) -> Self {
        *self.scripted_reflections.lock().unwrap() = items.to_vec();
        self
    }

    fn with_fallback(mut self, json: &str) -> Self {
        self.fallback_reflection = json.to_string();
        self
    }

    fn counters(&self) -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        (
            Arc::clone(&self.reflection_calls),
            Arc::clone(&self.summarize_calls),
        )
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(
        &self,
        params: CompletionParams,
    ) -> Result<Completion, ProviderError> {
        match params.model.as_str() {
            PLANNER_MODEL => Ok(Completion::text(self.plan.clone())),
            SUMMARIZER_MODEL => {
                self.summarize_calls.fetch_add(1, Ordering::SeqCst);
                // The worker prompt carries the query on its final line
                let query = params
                    .prompt
                    .lines()
                    .rev()
                    .find_map(|l| l.strip_prefix("Research query: "))
                    .unwrap_or("unknown");
                Ok(Completion::text(format!("synthesis of {}", query)))
            }
            REFLECTOR_MODEL => {
                self.reflection_calls.fetch_add(1, Ordering::SeqCst);
                let mut scripted = self.scripted_reflections.lock().unwrap();
                let content = if scripted.is_empty() {
                    self.fallback_reflection.clone()
                } else {
                    scripted.remove(0)
                };
                Ok(Completion::text(content))
            }
            other => Err(ProviderError::Api(format!("unexpected model {}", other))),
        }
    }

    fn default_model(&self) -> String {
        PLANNER_MODEL.to_string()
    }

    fn is_configured(&self) -> bool {
        true
    }
}

/// Fake search provider with per-query delays and failures
struct ScriptedSearch {
    calls: Arc<AtomicUsize>,
    fail_query: Option<String>,
    delays_ms: HashMap<String, u64>,
    results_per_query: usize,
}

impl ScriptedSearch {
    fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail_query: None,
            delays_ms: HashMap::new(),
            results_per_query: 2,
        }
    }

    fn failing_on(mut self, query: &str) -> Self {
        self.fail_query = Some(query.to_string());
        self
    }

    fn with_delay(mut self, query: &str, ms: u64) -> Self {
        self.delays_ms.insert(query.to_string(), ms);
        self
    }

    fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Document>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(ms) = self.delays_ms.get(query) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }

        if self.fail_query.as_deref() == Some(query) {
            return Err(SearchError::Api("retries exhausted".to_string()));
        }

        let count = self.results_per_query.min(max_results as usize);
        Ok((0..count)
            .map(|i| {
                Document::new(
                    format!("https://source/{}/{}", query.replace(' ', "-"), i),
                    query,
                    format!("content about {}", query),
                )
            })
            .collect())
    }

    fn is_configured(&self) -> bool {
        true
    }
}

async fn run_engine(
    provider: ScriptedProvider,
    search: ScriptedSearch,
    settings: EngineSettings,
) -> Result<ResearchState, EngineError> {
    let engine = ResearchEngine::new(provider, search, settings);
    engine
        .run(vec![TopicTurn::user("How do tokio join sets work?")])
        .await
}

// ========== Cap Termination ==========

#[tokio::test]
async fn test_never_sufficient_run_terminates_at_cap() {
    let provider = ScriptedProvider::new(&["q1", "q2", "q3"]);
    let (reflections, _) = provider.counters();
    let search = ScriptedSearch::new();
    let searches = search.calls();

    let state = run_engine(provider, search, test_settings()).await.unwrap();

    // Three dispatch rounds: the initial plan plus one per continue decision
    assert_eq!(searches.load(Ordering::SeqCst), 3 + 2 + 2);
    assert_eq!(
        state.queries,
        vec!["q1", "q2", "q3", "f1", "f2", "f1", "f2"]
    );
    // Exactly two evaluator invocations, each counted once
    assert_eq!(reflections.load(Ordering::SeqCst), 2);
    assert_eq!(state.loop_count, 2);
    assert_eq!(state.summaries.len(), 7);
}

// ========== Sufficiency on Round One ==========

#[tokio::test]
async fn test_sufficient_on_first_round_stops_immediately() {
    let provider = ScriptedProvider::new(&["q1", "q2", "q3"]).with_reflections(&[sufficient()]);
    let (reflections, _) = provider.counters();
    let search = ScriptedSearch::new();
    let searches = search.calls();

    let state = run_engine(provider, search, test_settings()).await.unwrap();

    assert_eq!(searches.load(Ordering::SeqCst), 3);
    assert_eq!(reflections.load(Ordering::SeqCst), 1);
    assert_eq!(state.loop_count, 1);
    assert_eq!(state.queries, vec!["q1", "q2", "q3"]);
    assert_eq!(state.summaries.len(), 3);
}

// ========== Worker Failure Aborts the Round ==========

#[tokio::test]
async fn test_worker_failure_aborts_run_before_any_merge() {
    let provider = ScriptedProvider::new(&["q1", "q2", "q3"]);
    let (reflections, _) = provider.counters();
    let search = ScriptedSearch::new().failing_on("q2");

    let result = run_engine(provider, search, test_settings()).await;

    match result {
        Err(EngineError::Worker { query, reason, .. }) => {
            assert_eq!(query, "q2");
            assert!(reason.contains("retries exhausted"));
        }
        other => panic!("expected Worker error, got {:?}", other),
    }
    // The round never reached reflection, so nothing was counted or merged
    assert_eq!(reflections.load(Ordering::SeqCst), 0);
}

// ========== Insufficient but No Follow-Ups ==========

#[tokio::test]
async fn test_insufficient_without_follow_ups_terminates() {
    let provider = ScriptedProvider::new(&["q1", "q2", "q3"]).with_reflections(&[insufficient(&[])]);
    let (reflections, _) = provider.counters();
    let search = ScriptedSearch::new();
    let searches = search.calls();

    let state = run_engine(provider, search, test_settings()).await.unwrap();

    assert_eq!(searches.load(Ordering::SeqCst), 3);
    assert_eq!(reflections.load(Ordering::SeqCst), 1);
    assert_eq!(state.loop_count, 1);
    assert_eq!(state.summaries.len(), 3);
}

// ========== Termination guarantees ==========

#[tokio::test]
async fn test_cap_of_zero_never_reflects() {
    let settings = EngineSettings {
        max_research_loops: 0,
        ..test_settings()
    };
    let provider = ScriptedProvider::new(&["q1", "q2", "q3"]);
    let (reflections, _) = provider.counters();
    let search = ScriptedSearch::new();
    let searches = search.calls();

    let state = run_engine(provider, search, settings).await.unwrap();

    assert_eq!(searches.load(Ordering::SeqCst), 3);
    assert_eq!(reflections.load(Ordering::SeqCst), 0);
    assert_eq!(state.loop_count, 0);
    assert_eq!(state.summaries.len(), 3);
}

#[tokio::test]
async fn test_loop_count_never_exceeds_cap() {
    for cap in 0..4u32 {
        let settings = EngineSettings {
            max_research_loops: cap,
            ..test_settings()
        };
        let provider = ScriptedProvider::new(&["q1", "q2", "q3"]);
        let (reflections, _) = provider.counters();
        let search = ScriptedSearch::new();

        let state = run_engine(provider, search, settings).await.unwrap();

        assert!(state.loop_count <= cap);
        assert_eq!(state.loop_count as usize, reflections.load(Ordering::SeqCst));
    }
}

#[tokio::test]
async fn test_zero_query_plan_round_completes_and_loops_to_cap() {
    let settings = EngineSettings {
        initial_search_query_count: 0,
        ..test_settings()
    };
    let provider = ScriptedProvider::new(&[]);
    let search = ScriptedSearch::new();
    let searches = search.calls();

    let state = run_engine(provider, search, settings).await.unwrap();

    // Round one dispatches nothing; the evaluator's follow-ups feed the
    // two remaining rounds until the cap
    assert_eq!(searches.load(Ordering::SeqCst), 4);
    assert_eq!(state.loop_count, 2);
}

// ========== Merge semantics ==========

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_completion_order_does_not_change_merged_content() {
    let settings = EngineSettings {
        max_research_loops: 0,
        ..test_settings()
    };

    // First run: q1 held back the longest, q3 returns immediately
    let provider = ScriptedProvider::new(&["q1", "q2", "q3"]);
    let search = ScriptedSearch::new()
        .with_delay("q1", 80)
        .with_delay("q2", 40);
    let delayed = run_engine(provider, search, settings.clone()).await.unwrap();

    // Second run: no delays
    let provider = ScriptedProvider::new(&["q1", "q2", "q3"]);
    let search = ScriptedSearch::new();
    let prompt_order = run_engine(provider, search, settings).await.unwrap();

    // Entry order follows completion order
    assert_eq!(delayed.summaries[0], "synthesis of q3");

    // Content is completion-order independent
    let summaries_a: BTreeSet<_> = delayed.summaries.iter().cloned().collect();
    let summaries_b: BTreeSet<_> = prompt_order.summaries.iter().cloned().collect();
    assert_eq!(summaries_a, summaries_b);

    let sources_a: BTreeSet<_> = delayed.sources.iter().cloned().collect();
    let sources_b: BTreeSet<_> = prompt_order.sources.iter().cloned().collect();
    assert_eq!(sources_a, sources_b);
    assert_eq!(delayed.sources.len(), prompt_order.sources.len());
}

#[tokio::test]
async fn test_each_worker_merged_exactly_once() {
    let provider = ScriptedProvider::new(&["q1", "q2", "q3"]).with_reflections(&[sufficient()]);
    let (_, summaries) = provider.counters();
    let search = ScriptedSearch::new();

    let state = run_engine(provider, search, test_settings()).await.unwrap();

    assert_eq!(summaries.load(Ordering::SeqCst), 3);
    assert_eq!(state.summaries.len(), 3);
    // Two sources per query, no duplicates dropped or invented
    assert_eq!(state.sources.len(), 6);
    let unique: BTreeSet<_> = state.sources.iter().collect();
    assert_eq!(unique.len(), 6);
}

// ========== Failure propagation ==========

#[tokio::test]
async fn test_worker_timeout_fails_the_round() {
    let settings = EngineSettings {
        worker_timeout: Duration::from_millis(50),
        ..test_settings()
    };
    let provider = ScriptedProvider::new(&["q1", "q2", "q3"]);
    let search = ScriptedSearch::new().with_delay("q2", 400);

    let result = run_engine(provider, search, settings).await;

    match result {
        Err(EngineError::Worker { query, reason, .. }) => {
            assert_eq!(query, "q2");
            assert!(reason.contains("timed out"));
        }
        other => panic!("expected Worker timeout error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_planner_deficit_aborts_run() {
    // Planner yields two queries when three were requested
    let provider = ScriptedProvider::new(&["q1", "q2"]);
    let search = ScriptedSearch::new();
    let searches = search.calls();

    let result = run_engine(provider, search, test_settings()).await;

    assert!(matches!(result, Err(EngineError::Planning(_))));
    assert_eq!(searches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_reflection_failure_aborts_run() {
    let provider =
        ScriptedProvider::new(&["q1", "q2", "q3"]).with_fallback("this is not a judgment");
    let search = ScriptedSearch::new();

    let result = run_engine(provider, search, test_settings()).await;

    assert!(matches!(result, Err(EngineError::Reflection(_))));
}

// ========== State plumbing ==========

#[tokio::test]
async fn test_topic_is_preserved_and_answer_slot_stays_empty() {
    let provider = ScriptedProvider::new(&["q1", "q2", "q3"]).with_reflections(&[sufficient()]);
    let engine = ResearchEngine::new(provider, ScriptedSearch::new(), test_settings());

    let topic = vec![
        TopicTurn::user("What is io_uring?"),
        TopicTurn::assistant("A Linux async I/O interface."),
        TopicTurn::user("How do Rust runtimes use it?"),
    ];
    let state = engine.run(topic).await.unwrap();

    assert_eq!(state.topic.len(), 3);
    assert!(state.final_answer.is_none());
    assert!(state.research_topic().contains("io_uring"));
}

#[tokio::test]
async fn test_follow_up_rounds_reuse_summarizer_not_planner() {
    // The plan is only consulted once; follow-up rounds bypass planning
    let provider = ScriptedProvider::new(&["q1", "q2", "q3"])
        .with_reflections(&[insufficient(&["f1"]), sufficient()]);
    let (reflections, summaries) = provider.counters();
    let search = ScriptedSearch::new();

    let state = run_engine(provider, search, test_settings()).await.unwrap();

    assert_eq!(state.queries, vec!["q1", "q2", "q3", "f1"]);
    assert_eq!(reflections.load(Ordering::SeqCst), 2);
    assert_eq!(summaries.load(Ordering::SeqCst), 4);
    assert_eq!(state.loop_count, 2);
}
