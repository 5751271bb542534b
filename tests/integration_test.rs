// Integration tests for venturematch
use serde_json::{json, Value};
use std::collections::HashMap;
use std::f32::consts::FRAC_1_SQRT_2;
use venturematch::{
    format_report, most_similar, populate, similarity_matrix, top_aggregate_matches,
    top_best_matches, CollectionKind, Embedder, Embedding, EmbeddingCache, EmbeddingConfig,
    EntityCollection, Error, FailurePolicy, HashEmbedder, Normalizer, ProviderError, Strategy,
    WhitespaceTokenizer, DEFAULT_TOP_CONTRIBUTORS,
};

/// Returns a fixed vector per composite text
struct TableEmbedder {
    vectors: HashMap<String, Vec<f32>>,
}

impl Embedder for TableEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding, ProviderError> {
        self.vectors
            .get(text)
            .map(|v| Embedding::new(v.clone()))
            .ok_or_else(|| ProviderError::Response(format!("no vector for {text:?}")))
    }

    fn model(&self) -> &str {
        "table"
    }
}

fn job(header: &str, description: &str) -> Value {
    json!({ "header": header, "description": description, "url": "https://news.ycombinator.com/item?id=1" })
}

fn company(name: &str, country: &str, sector: &str) -> Value {
    json!({
        "name": name,
        "sector": sector,
        "sector_hover_card": sector,
        "sector_company_page": sector,
        "introduction_company_page": format!("{name} introduction"),
        "description_company_page": format!("{name} description"),
        "country": country,
    })
}

fn normalizer() -> Normalizer<WhitespaceTokenizer> {
    Normalizer::new(EmbeddingConfig::default(), WhitespaceTokenizer).unwrap()
}

/// Normalize `raw` and give record `i` the vector `vectors[i]`
fn embed_with(kind: CollectionKind, raw: &[Value], vectors: &[Vec<f32>]) -> EntityCollection {
    let collection = normalizer().normalize(kind, raw);
    assert_eq!(collection.len(), vectors.len());
    let embedder = TableEmbedder {
        vectors: collection
            .iter()
            .zip(vectors)
            .map(|(r, v)| (r.combined_text.clone(), v.clone()))
            .collect(),
    };
    populate(collection, &embedder, FailurePolicy::Abort).unwrap().0
}

fn unit_fixture() -> (EntityCollection, EntityCollection) {
    let jobs = embed_with(
        CollectionKind::Jobs,
        &[
            job("Acme | Rust Engineer | Berlin", "payments"),
            job("Globex | Data Scientist | Remote", "forecasting"),
            job("Initech | SRE | London", "reliability"),
        ],
        &[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]],
    );
    let portfolio = embed_with(
        CollectionKind::Portfolio,
        &[
            company("Klarna", "Sweden", "Fintech"),
            company("Peakon", "Denmark", "HR Tech"),
            company("Darktrace", "UK", "Security"),
        ],
        &[
            vec![1.0, 0.0, 0.0],
            vec![FRAC_1_SQRT_2, FRAC_1_SQRT_2, 0.0],
            vec![0.0, 0.0, 1.0],
        ],
    );
    (jobs, portfolio)
}

#[test]
fn test_matrix_from_unit_vectors() {
    let (jobs, portfolio) = unit_fixture();
    let m = similarity_matrix(&jobs, &portfolio).unwrap();
    let expected = [
        [1.0, FRAC_1_SQRT_2, 0.0],
        [0.0, FRAC_1_SQRT_2, 0.0],
        [0.0, 0.0, 1.0],
    ];
    for (i, row) in expected.iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            assert!((m.get(i, j).unwrap() - value).abs() < 1e-6, "m[{i}][{j}]");
        }
    }
}

#[test]
fn test_best_match_end_to_end() {
    let (jobs, portfolio) = unit_fixture();
    let m = similarity_matrix(&jobs, &portfolio).unwrap();
    let result = top_best_matches(&jobs, &portfolio, &m, 10).unwrap();

    assert_eq!(result.strategy, Strategy::BestMatch);
    let pairs: Vec<(usize, usize)> = result
        .entries
        .iter()
        .map(|e| (e.index, e.matches[0].index))
        .collect();
    // Jobs 0 and 2 both reach 1.0; the earlier one ranks first.
    assert_eq!(pairs, vec![(0, 0), (2, 2), (1, 1)]);
    assert_eq!(result.entries[0].score, 1.0);
    assert!((result.entries[2].score - FRAC_1_SQRT_2).abs() < 1e-6);

    let text = format_report(&result);
    assert!(text.contains("Entry from the job board: Acme"));
    assert!(text.contains("    Name      : Klarna"));
    assert!(text.contains("Similarity Value: 1.0000"));
    assert!(text.contains("Similarity Value: 0.7071"));
}

#[test]
fn test_aggregate_end_to_end() {
    let (jobs, portfolio) = unit_fixture();
    let m = similarity_matrix(&jobs, &portfolio).unwrap();
    let result =
        top_aggregate_matches(&jobs, &portfolio, &m, 15, DEFAULT_TOP_CONTRIBUTORS).unwrap();

    // Row sums: 1 + 0.7071, 0.7071, 1
    let order: Vec<usize> = result.entries.iter().map(|e| e.index).collect();
    assert_eq!(order, vec![0, 2, 1]);
    assert!((result.entries[0].score - (1.0 + FRAC_1_SQRT_2)).abs() < 1e-6);
    assert!((result.entries[1].score - 1.0).abs() < 1e-6);
    assert!((result.entries[2].score - FRAC_1_SQRT_2).abs() < 1e-6);

    let contributors: Vec<Vec<usize>> = result
        .entries
        .iter()
        .map(|e| e.matches.iter().map(|c| c.index).collect())
        .collect();
    assert_eq!(contributors, vec![vec![0, 1, 2], vec![2, 0, 1], vec![1, 0, 2]]);

    let text = result.to_string();
    assert!(text.contains("Aggregate Similarity: 1.7071"));
    assert!(text.contains("Potential match: Initech"));
    assert!(text.contains("    - Name      : Darktrace"));
}

#[test]
fn test_empty_collections() {
    let (jobs, _) = unit_fixture();
    let empty = EntityCollection::new(CollectionKind::Portfolio);

    let m = similarity_matrix(&jobs, &empty).unwrap();
    assert_eq!((m.rows(), m.cols()), (3, 0));
    assert!(top_best_matches(&jobs, &empty, &m, 10).unwrap().is_empty());
    assert!(top_aggregate_matches(&jobs, &empty, &m, 15, 3).unwrap().is_empty());

    let no_jobs = EntityCollection::new(CollectionKind::Jobs);
    let (_, portfolio) = unit_fixture();
    let m = similarity_matrix(&no_jobs, &portfolio).unwrap();
    assert_eq!((m.rows(), m.cols()), (0, 3));
    assert!(top_best_matches(&no_jobs, &portfolio, &m, 10).unwrap().is_empty());
}

#[test]
fn test_dimension_mismatch_fails_before_ranking() {
    let (jobs, _) = unit_fixture();
    let portfolio = embed_with(
        CollectionKind::Portfolio,
        &[company("Klarna", "Sweden", "Fintech")],
        &[vec![1.0, 0.0]],
    );
    assert!(matches!(
        similarity_matrix(&jobs, &portfolio),
        Err(Error::DimensionMismatch { expected: 3, actual: 2, .. })
    ));
}

#[test]
fn test_normalizer_drops_malformed_and_oversized() {
    let config = EmbeddingConfig::new("table", 12, "whitespace");
    let normalizer = Normalizer::new(config, WhitespaceTokenizer).unwrap();
    let raw = vec![
        job("Acme | Rust", "short text"),
        json!({ "header": "Missing description" }),
        job("Globex | Go", &"word ".repeat(50)),
        json!("not a record"),
        job("Initech | SRE", "   also short   "),
    ];

    let (collection, report) = normalizer.normalize_with_report(CollectionKind::Jobs, &raw);
    assert_eq!(report.input, 5);
    assert_eq!(report.kept, 2);
    assert_eq!(report.dropped_malformed, 2);
    assert_eq!(report.dropped_oversized, 1);

    let positions: Vec<usize> = collection.iter().map(|r| r.position).collect();
    assert_eq!(positions, vec![0, 4]);
    assert_eq!(
        collection.get(1).unwrap().combined_text,
        "Title: Initech | SRE; Content: also short"
    );
}

#[test]
fn test_cache_pipeline_offline() {
    let dir = tempfile::tempdir().unwrap();
    let jobs_path = dir.path().join("jobs.cache");
    let portfolio_path = dir.path().join("portfolio.cache");

    let embedder = HashEmbedder::new(512);
    let config = EmbeddingConfig::new(embedder.model(), 8000, "cl100k_base");
    let cache = EmbeddingCache::new(config.clone()).unwrap();
    let normalizer = Normalizer::new(config, WhitespaceTokenizer).unwrap();

    let jobs = normalizer.normalize(
        CollectionKind::Jobs,
        &[
            job("Acme | Payments Engineer", "card payments fintech checkout"),
            job("Initech | Security Analyst", "threat detection security cyber"),
        ],
    );
    let portfolio = normalizer.normalize(
        CollectionKind::Portfolio,
        &[
            company("Darktrace", "UK", "cyber security threat detection"),
            company("Klarna", "Sweden", "fintech payments checkout"),
        ],
    );

    let (jobs, report) = cache.populate(jobs, &embedder, FailurePolicy::Abort).unwrap();
    assert_eq!(report.embedded, 2);
    let (portfolio, _) = cache.populate(portfolio, &embedder, FailurePolicy::Abort).unwrap();

    cache.persist(&jobs, &jobs_path).unwrap();
    let header = cache.persist(&portfolio, &portfolio_path).unwrap();
    assert_eq!(header.dimension, 512);
    assert_eq!(header.row_count, 2);

    let jobs_loaded = cache.load(&jobs_path).unwrap();
    let portfolio_loaded = cache.load(&portfolio_path).unwrap();
    assert!(jobs_loaded.skipped.is_empty());
    assert_eq!(jobs_loaded.collection, jobs);
    assert_eq!(portfolio_loaded.collection, portfolio);

    let m = similarity_matrix(&jobs_loaded.collection, &portfolio_loaded.collection).unwrap();
    let result =
        top_best_matches(&jobs_loaded.collection, &portfolio_loaded.collection, &m, 10).unwrap();
    let pairs: Vec<(usize, usize)> = result
        .entries
        .iter()
        .map(|e| (e.index, e.matches[0].index))
        .collect();
    assert!(pairs.contains(&(0, 1)));
    assert!(pairs.contains(&(1, 0)));

    let query = embedder.embed("payments checkout").unwrap();
    let hits = most_similar(&portfolio_loaded.collection, &query, 1).unwrap();
    assert_eq!(hits[0].0, 1);
}

#[test]
fn test_populate_skip_keeps_partial_results() {
    let collection = normalizer().normalize(
        CollectionKind::Jobs,
        &[job("Acme | Rust", "known"), job("Globex | Go", "unknown")],
    );
    let known = collection.get(0).unwrap().combined_text.clone();
    let embedder = TableEmbedder {
        vectors: HashMap::from([(known, vec![0.5, 0.5])]),
    };

    assert!(matches!(
        populate(collection.clone(), &embedder, FailurePolicy::Abort),
        Err(Error::EmbeddingProvider { .. })
    ));

    let (embedded, report) = populate(collection, &embedder, FailurePolicy::Skip).unwrap();
    assert_eq!(embedded.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].position, 1);
    assert_eq!(embedded.dimension().unwrap(), Some(2));
}
