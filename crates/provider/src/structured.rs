//! Extraction of structured JSON from model output
//!
//! Even with JSON output forced, models occasionally wrap the object in a
//! markdown fence or surrounding prose. Extraction strips that before
//! deserializing into the target type.

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::{ProviderError, Result};

/// Locate the JSON payload inside raw model output
pub fn extract_json(content: &str) -> &str {
    // Fenced block first: ```json ... ``` or bare ``` ... ```
    let fence = Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("static regex");
    if let Some(caps) = fence.captures(content) {
        if let Some(inner) = caps.get(1) {
            return inner.as_str().trim();
        }
    }

    // Otherwise the outermost object span
    if let (Some(start), Some(end)) = (content.find('{'), content.rfind('}')) {
        if end > start {
            return &content[start..=end];
        }
    }

    content.trim()
}

/// Parse raw model output into a structured value
pub fn parse_structured<T: DeserializeOwned>(content: &str) -> Result<T> {
    let payload = extract_json(content);
    if payload.is_empty() {
        return Err(ProviderError::InvalidResponse);
    }
    serde_json::from_str(payload).map_err(ProviderError::Json)
}
