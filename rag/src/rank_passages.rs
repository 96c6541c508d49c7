use std::cmp::Ordering;

use crate::embed_text::Embedding;

#[derive(Clone, Debug, PartialEq)]
pub struct ScoredPassage {
    /// Position in the loaded corpus.
    pub index: usize,
    pub text: String,
    pub score: f32,
}

/// Cosine similarity; 0.0 for mismatched lengths, a zero vector, or a result
/// that is not finite (an overflowing component makes the norms infinite).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let score = dot_product / (norm_a * norm_b);
    // -0.0 folds into 0.0 so equal scores compare equal under total_cmp.
    if !score.is_finite() || score == 0.0 {
        0.0
    } else {
        score
    }
}

/// Scores every candidate against `query` and keeps the best `k`.
///
/// The sort is stable, so candidates with equal scores stay in corpus order.
/// An empty candidate list gives an empty result.
pub fn rank_passages(
    query: &Embedding,
    candidates: &[(usize, String, Embedding)],
    k: usize,
) -> Vec<ScoredPassage> {
    if candidates.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<ScoredPassage> = candidates
        .iter()
        .map(|(index, text, embedding)| ScoredPassage {
            index: *index,
            text: text.clone(),
            score: cosine_similarity(query.as_slice(), embedding.as_slice()),
        })
        .collect();

    scored.sort_by(|a, b| descending(a.score, b.score));
    scored.truncate(k);
    scored
}

fn descending(a: f32, b: f32) -> Ordering {
    b.total_cmp(&a)
}
