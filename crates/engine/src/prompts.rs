//! Prompt rendering for the three model-facing steps

use chrono::Local;

/// Current date as rendered into prompts
pub(crate) fn current_date() -> String {
    Local::now().format("%B %d, %Y").to_string()
}

pub(crate) fn planning_prompt(topic: &str, count: usize, date: &str) -> String {
    format!(
        r#"Your goal is to generate sophisticated and diverse web search queries for researching the topic below.

Instructions:
- Return exactly {count} queries.
- Each query should target a distinct aspect of the topic.
- Prefer queries that surface recent information; the current date is {date}.

Respond with ONLY a JSON object of the form:
{{"query": [{{"query": "search text", "rationale": "why this query helps"}}]}}

Topic:
{topic}"#,
        count = count,
        date = date,
        topic = topic
    )
}

pub(crate) fn summarize_prompt(query: &str, contents: &[String], date: &str) -> String {
    format!(
        r#"Synthesize the web content below into a focused summary that addresses the research query at the end. Today's date is {date}.

Instructions:
- Keep verifiable facts, figures, and dates; drop boilerplate.
- Note disagreements between sources instead of papering over them.
- Write a few dense paragraphs of plain text, no preamble.

Content:
{content}

Research query: {query}"#,
        date = date,
        content = contents.join("\n\n"),
        query = query
    )
}

pub(crate) fn reflection_prompt(topic: &str, summaries: &[String], date: &str) -> String {
    let numbered = summaries
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are reviewing research summaries gathered for the topic below. Today's date is {date}.

Decide whether the summaries are sufficient to answer the topic. If they are not, propose follow-up web search queries that close the specific gaps you identify.

Respond with ONLY a JSON object of the form:
{{"is_sufficient": true or false, "follow_up_queries": ["query", ...]}}

Topic:
{topic}

Summaries:
{summaries}"#,
        date = date,
        topic = topic,
        summaries = numbered
    )
}
