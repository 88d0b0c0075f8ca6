//! Cosine-similarity ranking of chunk embeddings against a query embedding.
//!
//! This is the provisional ranking stage: its output is a short list of
//! candidates handed to the reranker, which supersedes this ordering.

use tracing::debug;

use crate::document::Embedding;
use crate::error::{Error, Result};

/// A chunk index paired with its similarity score against the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    /// Index into the chunk sequence the embeddings were produced from.
    pub index: usize,
    /// Cosine similarity against the query embedding, in [-1, 1].
    pub score: f32,
}

/// Compute cosine similarity between two vectors.
///
/// Returns exactly `0.0` if either vector has zero magnitude, so a
/// degenerate embedding never propagates NaN into the ranking.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Score every chunk embedding against the query and return the top `top_k`
/// indices in descending-similarity order.
///
/// The sort is stable: equal scores keep original chunk order, so repeated
/// calls over the same input produce identical orderings. If fewer than
/// `top_k` chunks exist, all of them are returned.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if any chunk embedding's
/// dimensionality differs from the query's.
pub fn rank(
    query: &Embedding,
    chunk_embeddings: &[Embedding],
    top_k: usize,
) -> Result<Vec<Ranked>> {
    for (index, embedding) in chunk_embeddings.iter().enumerate() {
        if embedding.len() != query.len() {
            return Err(Error::DimensionMismatch(format!(
                "chunk {index} has dimension {}, query has dimension {}",
                embedding.len(),
                query.len()
            )));
        }
    }

    let mut ranked: Vec<Ranked> = chunk_embeddings
        .iter()
        .enumerate()
        .map(|(index, embedding)| Ranked { index, score: cosine_similarity(query, embedding) })
        .collect();

    // Stable sort: ties preserve original chunk order.
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(top_k);

    debug!(
        candidates = ranked.len(),
        top_score = ranked.first().map(|r| r.score),
        "similarity ranking complete"
    );

    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orthogonal_and_aligned_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), -1.0);
    }

    #[test]
    fn zero_vector_scores_exactly_zero() {
        let score = cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]);
        assert_eq!(score, 0.0);
        assert!(!score.is_nan());
    }

    #[test]
    fn ranks_by_descending_similarity() {
        let query = vec![1.0, 0.0];
        let chunks = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]];
        let ranked = rank(&query, &chunks, 2).unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].index, 0);
        assert_eq!(ranked[0].score, 1.0);
        assert_eq!(ranked[1].index, 2);
        assert!((ranked[1].score - 0.707).abs() < 1e-3);
    }

    #[test]
    fn ties_keep_original_chunk_order() {
        let query = vec![1.0, 0.0];
        let chunks = vec![vec![2.0, 0.0], vec![3.0, 0.0], vec![0.5, 0.0]];
        let ranked = rank(&query, &chunks, 3).unwrap();
        // All three score 1.0; original order must survive.
        assert_eq!(
            ranked.iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn top_k_larger_than_input_returns_everything() {
        let query = vec![1.0];
        let chunks = vec![vec![1.0], vec![-1.0]];
        let ranked = rank(&query, &chunks, 10).unwrap();
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let query = vec![1.0, 0.0];
        let chunks = vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]];
        assert!(matches!(rank(&query, &chunks, 5), Err(Error::DimensionMismatch(_))));
    }
}
