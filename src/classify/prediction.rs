//! Parsing of inference API prediction payloads.

use serde::Deserialize;

use super::ClassificationResult;
use crate::http::AttemptFailure;

#[derive(Deserialize, Debug)]
struct Candidate {
    label: String,
    score: f64,
}

/// The API answers `[[{label, score}, ...]]` for a single input, but some
/// deployments drop the outer batch list.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum PredictionBody {
    Batched(Vec<Vec<Candidate>>),
    Flat(Vec<Candidate>),
}

/// Picks the top candidate from a prediction body.
///
/// Candidates arrive sorted by descending score, so the first one wins.
/// Any body that does not yield a usable candidate is `Malformed`.
pub fn parse_prediction(body: &str) -> Result<ClassificationResult, AttemptFailure> {
    let parsed: PredictionBody = serde_json::from_str(body)
        .map_err(|e| AttemptFailure::Malformed(format!("not a prediction list: {}", e)))?;

    let top = match parsed {
        PredictionBody::Batched(batches) => batches
            .into_iter()
            .next()
            .and_then(|candidates| candidates.into_iter().next()),
        PredictionBody::Flat(candidates) => candidates.into_iter().next(),
    }
    .ok_or_else(|| AttemptFailure::Malformed("empty prediction list".to_string()))?;

    let label = top.label.trim().to_lowercase();
    if label.is_empty() {
        return Err(AttemptFailure::Malformed("empty label".to_string()));
    }
    if !top.score.is_finite() || !(0.0..=1.0).contains(&top.score) {
        return Err(AttemptFailure::Malformed(format!(
            "score {} outside [0, 1]",
            top.score
        )));
    }

    Ok(ClassificationResult {
        label,
        confidence: (top.score * 1000.0).round() / 10.0,
    })
}
