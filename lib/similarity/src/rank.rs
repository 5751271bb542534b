//! Ranking strategies over a similarity matrix
//!
//! Both strategies order query rows by a per-row score, highest first, with
//! equal scores kept in original row order.

use ndarray::ArrayView1;
use tracing::debug;
use venturematch_core::{
    Embedding, EntityCollection, EntityRecord, Error, RecordSchema, Result,
};

use crate::matrix::{cosine_similarity_matrix, stack_rows, SimilarityMatrix};

/// Default number of reference records explaining an aggregate score
pub const DEFAULT_TOP_CONTRIBUTORS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Rank by the single highest similarity to any reference record
    BestMatch,
    /// Rank by total similarity against the whole reference collection
    Aggregate,
}

/// A reference record matched to a query record
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMatch<'a> {
    pub index: usize,
    pub record: &'a EntityRecord,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry<'a> {
    /// Row of the query record in its collection
    pub index: usize,
    pub record: &'a EntityRecord,
    /// Best-match score or aggregate score, depending on the strategy
    pub score: f32,
    /// Matched reference records, most similar first
    pub matches: Vec<RankedMatch<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankingResult<'a> {
    pub strategy: Strategy,
    pub query_schema: &'static RecordSchema,
    pub reference_schema: &'static RecordSchema,
    pub entries: Vec<RankedEntry<'a>>,
}

impl RankingResult<'_> {
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rank query rows by their single best reference match.
///
/// `score(i) = max_j m[i][j]`; the match is the first column reaching it.
pub fn top_best_matches<'a>(
    a: &'a EntityCollection,
    b: &'a EntityCollection,
    matrix: &SimilarityMatrix,
    top_n: usize,
) -> Result<RankingResult<'a>> {
    check_shape(a, b, matrix)?;
    let mut result = empty_result(Strategy::BestMatch, a, b);
    if a.is_empty() || b.is_empty() {
        return Ok(result);
    }

    let best = matrix.row_max();
    let scores: Vec<f32> = best
        .iter()
        .map(|m| m.map(|(_, s)| s).unwrap_or(f32::NEG_INFINITY))
        .collect();

    for i in order_desc(&scores, top_n) {
        let Some((j, score)) = best[i] else { continue };
        result.entries.push(RankedEntry {
            index: i,
            record: &a.records()[i],
            score,
            matches: vec![RankedMatch {
                index: j,
                record: &b.records()[j],
                score,
            }],
        });
    }

    debug!("Best-match ranking selected {} of {} rows", result.len(), a.len());
    Ok(result)
}

/// Rank query rows by the sum of their similarities to every reference row,
/// reporting the `top_k_contributors` most similar references for each.
pub fn top_aggregate_matches<'a>(
    a: &'a EntityCollection,
    b: &'a EntityCollection,
    matrix: &SimilarityMatrix,
    top_n: usize,
    top_k_contributors: usize,
) -> Result<RankingResult<'a>> {
    check_shape(a, b, matrix)?;
    let mut result = empty_result(Strategy::Aggregate, a, b);
    if a.is_empty() || b.is_empty() {
        return Ok(result);
    }

    let sums = matrix.row_sums();
    for i in order_desc(&sums, top_n) {
        let row = matrix.row(i);
        let matches = top_k(row, top_k_contributors)
            .into_iter()
            .map(|(j, score)| RankedMatch {
                index: j,
                record: &b.records()[j],
                score,
            })
            .collect();
        result.entries.push(RankedEntry {
            index: i,
            record: &a.records()[i],
            score: sums[i],
            matches,
        });
    }

    debug!("Aggregate ranking selected {} of {} rows", result.len(), a.len());
    Ok(result)
}

/// Indices of the `top_n` records of `collection` most similar to `query`,
/// with their cosine similarity, highest first.
pub fn most_similar(
    collection: &EntityCollection,
    query: &Embedding,
    top_n: usize,
) -> Result<Vec<(usize, f32)>> {
    let embeddings = collection.embeddings()?;
    if embeddings.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(dim) = collection.dimension()? {
        if dim != query.dim() {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: query.dim(),
                context: format!("query against {} collection", collection.kind()),
            });
        }
    }

    let q = stack_rows(&[query], query.dim())?;
    let m = stack_rows(&embeddings, query.dim())?;
    let sims = cosine_similarity_matrix(q.view(), m.view());
    Ok(top_k(sims.row(0), top_n))
}

fn check_shape(a: &EntityCollection, b: &EntityCollection, matrix: &SimilarityMatrix) -> Result<()> {
    if matrix.rows() != a.len() || matrix.cols() != b.len() {
        return Err(Error::InvalidInput(format!(
            "similarity matrix is {}x{}, collections are {}x{}",
            matrix.rows(),
            matrix.cols(),
            a.len(),
            b.len()
        )));
    }
    Ok(())
}

fn empty_result<'a>(
    strategy: Strategy,
    a: &EntityCollection,
    b: &EntityCollection,
) -> RankingResult<'a> {
    RankingResult {
        strategy,
        query_schema: a.schema(),
        reference_schema: b.schema(),
        entries: Vec::new(),
    }
}

/// Indices sorted by descending score, ties by lower index, truncated to `n`
fn order_desc(scores: &[f32], n: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&x, &y| sort_key(scores[y]).total_cmp(&sort_key(scores[x])));
    order.truncate(n);
    order
}

/// `total_cmp` orders -0.0 below 0.0; equal scores must tie
#[inline]
fn sort_key(score: f32) -> f32 {
    if score == 0.0 {
        0.0
    } else {
        score
    }
}

fn top_k(row: ArrayView1<'_, f32>, k: usize) -> Vec<(usize, f32)> {
    let scores = row.to_vec();
    order_desc(&scores, k)
        .into_iter()
        .map(|j| (j, scores[j]))
        .collect()
}
