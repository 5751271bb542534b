use serde::{Deserialize, Serialize};

/// A fixed-length embedding produced by an embedding model.
///
/// Once attached to a record an embedding is never mutated; operations that
/// need a different form (e.g. unit length) return a new value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Embedding {
    data: Vec<f32>,
}

impl Embedding {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// True when every component is a finite number
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    /// L2 norm
    #[inline]
    pub fn norm(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Compute cosine similarity with another embedding.
    ///
    /// Returns 0.0 when dimensions differ or either side has zero norm.
    #[inline]
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.dim() != other.dim() {
            return 0.0;
        }

        let dot_product: f32 = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a * b)
            .sum();

        let norm_a = self.norm();
        let norm_b = other.norm();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }

    /// Get a unit-length copy; zero vectors are returned unchanged
    #[inline]
    #[must_use]
    pub fn normalized(&self) -> Self {
        let norm = self.norm();
        if norm <= f32::EPSILON {
            return self.clone();
        }
        let inv_norm = 1.0 / norm;
        Self::new(self.data.iter().map(|x| x * inv_norm).collect())
    }
}
