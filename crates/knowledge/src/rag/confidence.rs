//! Confidence heuristic.
//!
//! Confidence is the mean retrieval similarity, clamped to [0, 1]. It says
//! how close the retrieved passages were to the question, not how likely the
//! answer is to be correct.

use super::types::RetrievedChunk;

pub fn estimate(chunks: &[RetrievedChunk]) -> f32 {
    let scores: Vec<f32> = chunks.iter().map(|c| c.score).collect();
    from_scores(&scores)
}

pub fn from_scores(scores: &[f32]) -> f32 {
    if scores.is_empty() {
        return 0.0;
    }

    let mean = scores.iter().map(|s| f64::from(*s)).sum::<f64>() / scores.len() as f64;
    if !mean.is_finite() {
        return 0.0;
    }
    mean.clamp(0.0, 1.0) as f32
}
