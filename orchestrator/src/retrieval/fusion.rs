// Fusion Engine: weighted linear combination of lexical and semantic scores

use crate::error::{Result, SearchError};
use crate::models::ScoreMap;

// Slack for weight pairs like 0.7 + 0.3 whose float sum lands a hair above 1
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// A validated pair of fusion weights: both non-negative, summing to at most 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    lexical: f64,
    semantic: f64,
}

impl FusionWeights {
    pub fn new(lexical: f64, semantic: f64) -> Result<Self> {
        let valid = lexical.is_finite()
            && semantic.is_finite()
            && lexical >= 0.0
            && semantic >= 0.0
            && lexical + semantic <= 1.0 + WEIGHT_SUM_TOLERANCE;

        if valid {
            Ok(Self { lexical, semantic })
        } else {
            Err(SearchError::InvalidWeights { lexical, semantic })
        }
    }

    pub fn lexical(&self) -> f64 {
        self.lexical
    }

    pub fn semantic(&self) -> f64 {
        self.semantic
    }
}

/// Validates the weights, then fuses the two maps.
pub fn fuse(
    lexical: &ScoreMap,
    semantic: &ScoreMap,
    lex_weight: f64,
    semantic_weight: f64,
) -> Result<ScoreMap> {
    let weights = FusionWeights::new(lex_weight, semantic_weight)?;
    Ok(fuse_weighted(lexical, semantic, weights))
}

/// Lexical documents come first in lexical order, then semantic-only documents
/// in semantic order. Scores are not renormalized afterwards.
pub fn fuse_weighted(lexical: &ScoreMap, semantic: &ScoreMap, weights: FusionWeights) -> ScoreMap {
    let mut fused = ScoreMap::with_capacity(lexical.len() + semantic.len());

    for entry in lexical.iter() {
        let mut score = entry.score * weights.lexical();
        if let Some(semantic_score) = semantic.get(entry.document_id) {
            score += semantic_score * weights.semantic();
        }
        fused.insert(entry.document_id, score);
    }

    for entry in semantic.iter() {
        if !lexical.contains(entry.document_id) {
            fused.insert(entry.document_id, entry.score * weights.semantic());
        }
    }

    fused
}
