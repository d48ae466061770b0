//! Command implementations

use anyhow::Result;

use scout_config::Config;
use scout_engine::{EngineSettings, ResearchEngine, ResearchState, TopicTurn};
use scout_provider::DeepSeekProvider;
use scout_search::TavilyProvider;

/// Create the config file and data directory
pub async fn init_command() -> Result<()> {
    let config = scout_config::init().await?;

    println!("Config ready at {:?}", scout_config::config_path());
    println!(
        "Models: planner={}, summarizer={}, reflector={}",
        config.query_generator_model(),
        config.summarize_model(),
        config.reflection_model()
    );
    if !config.has_credentials() {
        println!(
            "Set {} and {} (environment or config file) before running research.",
            scout_config::MODEL_API_KEY_VAR,
            scout_config::SEARCH_API_KEY_VAR
        );
    }

    Ok(())
}

/// Run one research loop for a question and print the record
pub async fn research_command(
    question: String,
    loops: Option<u32>,
    queries: Option<u32>,
    results: Option<u32>,
) -> Result<()> {
    let config = Config::load().await?;
    // Missing credentials are fatal before any work starts
    let (model_key, search_key) = config.require_credentials()?;

    let mut settings = EngineSettings::from_config(&config);
    if let Some(loops) = loops {
        settings.max_research_loops = loops;
    }
    if let Some(count) = queries {
        settings.initial_search_query_count = count;
    }
    if let Some(max) = results {
        settings.max_search_results = max;
    }

    let provider = DeepSeekProvider::new(
        model_key,
        config.model_api_base(),
        Some(config.query_generator_model()),
    );
    let search = TavilyProvider::new(search_key, config.search_api_base());
    let engine = ResearchEngine::new(provider, search, settings);

    let state = engine.run(vec![TopicTurn::user(question.as_str())]).await?;
    print_record(&question, &state);

    Ok(())
}

fn print_record(question: &str, state: &ResearchState) {
    println!("# Research record");
    println!();
    println!("Question: {}", question);
    println!("Rounds of reflection: {}", state.loop_count);
    println!();

    println!("## Queries issued");
    for (i, query) in state.queries.iter().enumerate() {
        println!("{}. {}", i + 1, query);
    }
    println!();

    println!("## Findings");
    for summary in &state.summaries {
        println!("{}", summary);
        println!();
    }

    if !state.sources.is_empty() {
        println!("## Sources");
        for (i, source) in state.sources.iter().enumerate() {
            println!("{}. {}", i + 1, source);
        }
    }
}

/// Show configuration status
pub async fn status_command() -> Result<()> {
    let config = Config::load().await?;

    println!("Config file: {:?}", scout_config::config_path());
    println!(
        "Models: planner={}, summarizer={}, reflector={}, answer={}",
        config.query_generator_model(),
        config.summarize_model(),
        config.reflection_model(),
        config.answer_model()
    );
    println!(
        "Fan-out: {} initial queries, {} loops max, {} results per search",
        config.initial_search_query_count(),
        config.max_research_loops(),
        config.max_search_results()
    );
    println!(
        "Model key ({}): {}",
        scout_config::MODEL_API_KEY_VAR,
        if config.model_api_key().is_some() {
            "configured"
        } else {
            "missing"
        }
    );
    println!(
        "Search key ({}): {}",
        scout_config::SEARCH_API_KEY_VAR,
        if config.search_api_key().is_some() {
            "configured"
        } else {
            "missing"
        }
    );

    Ok(())
}
