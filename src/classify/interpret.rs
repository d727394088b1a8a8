use std::sync::LazyLock;

use regex::Regex;

use super::types::{ClassificationResult, RawClassification};

/// First brace-delimited span, shortest match, across lines.
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*?\}").expect("static pattern is valid"));

#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    Parsed(ClassificationResult),
    Fallback { reason: String },
}

impl Interpretation {
    pub fn into_result(self) -> ClassificationResult {
        match self {
            Interpretation::Parsed(result) => result,
            Interpretation::Fallback { .. } => ClassificationResult::unknown(),
        }
    }
}

/// Extracts `{industry, confidence}` from a model reply.
///
/// The whole reply is tried as JSON first. Failing that, the first `{...}` span in the
/// text is tried. Never panics; anything unusable becomes `Fallback`.
pub fn interpret(raw: &str) -> Interpretation {
    if let Ok(result) = parse_candidate(raw.trim()) {
        return Interpretation::Parsed(result);
    }

    let Some(candidate) = JSON_OBJECT.find(raw) else {
        return Interpretation::Fallback {
            reason: "no JSON object found in reply".to_string(),
        };
    };

    match parse_candidate(candidate.as_str()) {
        Ok(result) => Interpretation::Parsed(result),
        Err(reason) => Interpretation::Fallback {
            reason: format!("embedded JSON object rejected: {reason}"),
        },
    }
}

fn parse_candidate(text: &str) -> Result<ClassificationResult, String> {
    let raw: RawClassification = serde_json::from_str(text).map_err(|e| e.to_string())?;
    ClassificationResult::try_from(raw)
}
