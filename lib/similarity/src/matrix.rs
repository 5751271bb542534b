//! Pairwise cosine similarity
//!
//! Rows of both sides are L2-normalized once and the whole matrix is then a
//! single `A · Bᵀ` product.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use tracing::debug;
use venturematch_core::{ensure_compatible, Embedding, EntityCollection, Error, Result};

/// Dense |A| × |B| matrix of cosine similarities in [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    data: Array2<f32>,
}

impl SimilarityMatrix {
    pub fn from_array(data: Array2<f32>) -> Self {
        Self { data }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        self.data.get((i, j)).copied()
    }

    #[inline]
    pub fn row(&self, i: usize) -> ArrayView1<'_, f32> {
        self.data.row(i)
    }

    /// Per-row maximum with its column; first occurrence wins on ties
    pub fn row_max(&self) -> Vec<Option<(usize, f32)>> {
        self.data.rows().into_iter().map(argmax).collect()
    }

    /// Per-row sum of similarities
    pub fn row_sums(&self) -> Vec<f32> {
        self.data.sum_axis(Axis(1)).to_vec()
    }
}

/// Compute cosine similarity between every record of `a` and every record of `b`.
///
/// Fails with `DimensionMismatch` before any arithmetic if the collections
/// were embedded with different dimensions.
pub fn similarity_matrix(a: &EntityCollection, b: &EntityCollection) -> Result<SimilarityMatrix> {
    let dim = ensure_compatible(a, b)?;
    let ea = a.embeddings()?;
    let eb = b.embeddings()?;

    let dim = match dim {
        Some(d) if !ea.is_empty() && !eb.is_empty() => d,
        _ => return Ok(SimilarityMatrix::from_array(Array2::zeros((ea.len(), eb.len())))),
    };

    let ma = stack_rows(&ea, dim)?;
    let mb = stack_rows(&eb, dim)?;
    debug!("Computing {}x{} similarity matrix (dim {})", ma.nrows(), mb.nrows(), dim);
    Ok(SimilarityMatrix::from_array(cosine_similarity_matrix(ma.view(), mb.view())))
}

/// Cosine similarity between the rows of two matrices with equal column counts.
///
/// Zero rows have similarity 0 with everything.
pub fn cosine_similarity_matrix(a: ArrayView2<'_, f32>, b: ArrayView2<'_, f32>) -> Array2<f32> {
    let a = l2_normalize_rows(a);
    let b = l2_normalize_rows(b);
    let mut sims = a.dot(&b.t());
    sims.mapv_inplace(|x| x.clamp(-1.0, 1.0));
    sims
}

pub(crate) fn stack_rows(embeddings: &[&Embedding], dim: usize) -> Result<Array2<f32>> {
    let mut flat = Vec::with_capacity(embeddings.len() * dim);
    for e in embeddings {
        if e.dim() != dim {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: e.dim(),
                context: "similarity input".to_string(),
            });
        }
        flat.extend_from_slice(e.as_slice());
    }
    Array2::from_shape_vec((embeddings.len(), dim), flat)
        .map_err(|e| Error::InvalidInput(format!("cannot shape embedding matrix: {e}")))
}

fn l2_normalize_rows(m: ArrayView2<'_, f32>) -> Array2<f32> {
    let mut out = m.to_owned();
    for mut row in out.rows_mut() {
        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|x| x / norm);
        }
    }
    out
}

fn argmax(row: ArrayView1<'_, f32>) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (j, &v) in row.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((j, v)),
        }
    }
    best
}
