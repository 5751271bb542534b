use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use venturematch::{
    format_report, most_similar, read_raw_records, similarity_matrix, top_aggregate_matches,
    top_best_matches, BpeTokenizer, CacheHeader, CollectionKind, Embedder, EmbeddingCache,
    EmbeddingConfig, FailurePolicy, HashEmbedder, LoadedCache, Normalizer, OpenAiEmbedder,
    OpenAiSettings, Tokenizer, WhitespaceTokenizer, DEFAULT_BASE_URL, DEFAULT_ENCODING,
    DEFAULT_HASH_DIM, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TOP_CONTRIBUTORS,
};

const DEFAULT_BEST_TOP_N: usize = 10;
const DEFAULT_AGGREGATE_TOP_N: usize = 15;

/// Match job postings against a venture portfolio by embedding similarity
#[derive(Parser, Debug)]
#[command(name = "venturematch")]
#[command(about = "Semantic matching of job postings against a venture portfolio", long_about = None)]
struct Cli {
    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize a raw JSON dump, embed every record and write a cache file
    Embed(EmbedArgs),
    /// Rank one cached collection against another and print the report
    Match(MatchArgs),
    /// Find the cached records most similar to a free-text query
    Query(QueryArgs),
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Embedding model name
    #[arg(long, env = "VENTUREMATCH_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Token budget per record; longer records are dropped
    #[arg(long, env = "VENTUREMATCH_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: usize,

    /// Tokenizer encoding matching the model
    #[arg(long, env = "VENTUREMATCH_ENCODING", default_value = DEFAULT_ENCODING)]
    encoding: String,
}

#[derive(Args, Debug)]
struct ProviderArgs {
    /// Use the local feature-hashing embedder instead of the remote API
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Vector size of the offline embedder
    #[arg(long, env = "VENTUREMATCH_HASH_DIM", default_value_t = DEFAULT_HASH_DIM)]
    hash_dim: usize,

    /// API key for the embeddings endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of an OpenAI-compatible embeddings API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

#[derive(Args, Debug)]
struct EmbedArgs {
    /// Which schema the input records follow
    #[arg(long)]
    kind: CollectionKind,

    /// Raw JSON dump (a top-level array of records)
    #[arg(short, long)]
    input: PathBuf,

    /// Cache file to write
    #[arg(short, long)]
    output: PathBuf,

    /// Drop records the provider fails on instead of aborting
    #[arg(long, default_value_t = false)]
    skip_failed: bool,

    #[command(flatten)]
    model: ModelArgs,

    #[command(flatten)]
    provider: ProviderArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Best,
    Aggregate,
    Both,
}

#[derive(Args, Debug)]
struct MatchArgs {
    /// Cache of the collection being ranked
    #[arg(long)]
    jobs: PathBuf,

    /// Cache of the reference collection
    #[arg(long)]
    portfolio: PathBuf,

    #[arg(long, value_enum, default_value_t = StrategyArg::Both)]
    strategy: StrategyArg,

    /// Entries to report (default 10 for best, 15 for aggregate)
    #[arg(long)]
    top_n: Option<usize>,

    /// Contributing references listed per aggregate entry
    #[arg(long, default_value_t = DEFAULT_TOP_CONTRIBUTORS)]
    contributors: usize,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Cache to search
    #[arg(long)]
    cache: PathBuf,

    /// Free text to embed and compare
    #[arg(long)]
    text: String,

    #[arg(long, default_value_t = DEFAULT_BEST_TOP_N)]
    top_n: usize,

    #[command(flatten)]
    model: ModelArgs,

    #[command(flatten)]
    provider: ProviderArgs,
}

impl ModelArgs {
    fn config(&self) -> EmbeddingConfig {
        EmbeddingConfig::new(self.model.clone(), self.max_tokens, self.encoding.clone())
    }
}

impl ProviderArgs {
    fn embedder(&self, model: &str, dim: Option<usize>) -> anyhow::Result<Box<dyn Embedder>> {
        if self.offline {
            return Ok(Box::new(HashEmbedder::new(dim.unwrap_or(self.hash_dim))));
        }
        let api_key = self
            .api_key
            .clone()
            .context("OPENAI_API_KEY is not set; pass --api-key or use --offline")?;
        let mut settings = OpenAiSettings::new(api_key);
        settings.base_url = self.base_url.clone();
        Ok(Box::new(OpenAiEmbedder::new(settings, model)?))
    }

    fn tokenizer(&self, encoding: &str) -> anyhow::Result<Box<dyn Tokenizer>> {
        if self.offline {
            Ok(Box::new(WhitespaceTokenizer))
        } else {
            Ok(Box::new(BpeTokenizer::for_encoding(encoding)?))
        }
    }

    /// Tokenizer for text compared against a cache, in the cache's own encoding
    fn tokenizer_for(&self, header: &CacheHeader) -> anyhow::Result<Box<dyn Tokenizer>> {
        self.tokenizer(&header.encoding_id)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting venturematch v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Embed(args) => run_embed(args),
        Command::Match(args) => run_match(args),
        Command::Query(args) => run_query(args),
    }
}

fn run_embed(args: EmbedArgs) -> anyhow::Result<()> {
    let embedder = args.provider.embedder(&args.model.model, None)?;
    let mut config = args.model.config();
    if args.provider.offline {
        config.model_name = embedder.model().to_string();
    }
    let tokenizer = args.provider.tokenizer(&config.encoding_id)?;

    let raw = read_raw_records(&args.input)
        .with_context(|| format!("failed to read records from {:?}", args.input))?;
    let normalizer = Normalizer::new(config.clone(), tokenizer.as_ref())?;
    let (collection, normalized) = normalizer.normalize_with_report(args.kind, &raw);
    if collection.is_empty() {
        warn!("No usable {} records in {:?}", args.kind, args.input);
    }

    let policy = if args.skip_failed {
        FailurePolicy::Skip
    } else {
        FailurePolicy::Abort
    };
    let cache = EmbeddingCache::new(config)?;
    let (collection, report) = cache
        .populate(collection, embedder.as_ref(), policy)
        .context("embedding failed")?;
    for failed in &report.failed {
        warn!("Skipped record #{} ({}): {}", failed.position, failed.label, failed.reason);
    }

    let header = cache
        .persist(&collection, &args.output)
        .with_context(|| format!("failed to write cache {:?}", args.output))?;

    info!(
        "Wrote {} of {} {} records to {:?} (dim {}, {} failed)",
        header.row_count,
        normalized.input,
        header.kind,
        args.output,
        header.dimension,
        report.failed.len()
    );
    Ok(())
}

fn load_cache(cache: &EmbeddingCache, path: &Path) -> anyhow::Result<LoadedCache> {
    let loaded = cache
        .load(path)
        .with_context(|| format!("failed to load cache {:?}", path))?;
    for skipped in &loaded.skipped {
        warn!(
            "Ignored row {} (record #{}) in {:?}: {}",
            skipped.row, skipped.position, path, skipped.reason
        );
    }
    info!(
        "Loaded {} {} records from {:?} (model {}, dim {})",
        loaded.collection.len(),
        loaded.header.kind,
        path,
        loaded.header.model_name,
        loaded.header.dimension
    );
    Ok(loaded)
}

fn run_match(args: MatchArgs) -> anyhow::Result<()> {
    let cache = EmbeddingCache::new(args.model.config())?;
    let jobs = load_cache(&cache, &args.jobs)?;
    let portfolio = load_cache(&cache, &args.portfolio)?;

    if jobs.header.kind != CollectionKind::Jobs {
        warn!("{:?} holds {} records, expected jobs", args.jobs, jobs.header.kind);
    }
    if portfolio.header.kind != CollectionKind::Portfolio {
        warn!(
            "{:?} holds {} records, expected portfolio",
            args.portfolio, portfolio.header.kind
        );
    }
    if jobs.header.model_name != portfolio.header.model_name {
        warn!(
            "Caches were built with different models: {} and {}",
            jobs.header.model_name, portfolio.header.model_name
        );
    }

    let matrix = similarity_matrix(&jobs.collection, &portfolio.collection)
        .context("collections cannot be compared")?;

    if matches!(args.strategy, StrategyArg::Best | StrategyArg::Both) {
        let top_n = args.top_n.unwrap_or(DEFAULT_BEST_TOP_N);
        let ranking = top_best_matches(&jobs.collection, &portfolio.collection, &matrix, top_n)?;
        println!("{}", format_report(&ranking));
    }
    if matches!(args.strategy, StrategyArg::Aggregate | StrategyArg::Both) {
        let top_n = args.top_n.unwrap_or(DEFAULT_AGGREGATE_TOP_N);
        let ranking = top_aggregate_matches(
            &jobs.collection,
            &portfolio.collection,
            &matrix,
            top_n,
            args.contributors,
        )?;
        println!("{}", format_report(&ranking));
    }
    Ok(())
}

fn run_query(args: QueryArgs) -> anyhow::Result<()> {
    let cache = EmbeddingCache::new(args.model.config())?;
    let loaded = load_cache(&cache, &args.cache)?;
    if loaded.collection.is_empty() {
        println!("No matches.");
        return Ok(());
    }

    let embedder = args
        .provider
        .embedder(&loaded.header.model_name, Some(loaded.header.dimension))?;
    let tokenizer = args.provider.tokenizer_for(&loaded.header)?;
    let tokens = tokenizer.count(&args.text);
    if tokens > args.model.max_tokens {
        bail!("query is {} tokens, limit is {}", tokens, args.model.max_tokens);
    }

    let query = embedder.embed(&args.text).context("failed to embed query")?;
    let hits = most_similar(&loaded.collection, &query, args.top_n)?;

    let schema = loaded.collection.schema();
    for (rank, (index, score)) in hits.iter().enumerate() {
        if let Some(record) = loaded.collection.get(*index) {
            println!("{:>3}. {:.4}  {}", rank + 1, score, record.label(schema));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(offline: bool) -> ProviderArgs {
        ProviderArgs {
            offline,
            hash_dim: DEFAULT_HASH_DIM,
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    fn header(encoding_id: &str) -> CacheHeader {
        CacheHeader {
            version: 1,
            kind: CollectionKind::Portfolio,
            model_name: DEFAULT_MODEL.to_string(),
            encoding_id: encoding_id.to_string(),
            dimension: 2,
            row_count: 0,
            created_at: String::new(),
            checksum: String::new(),
        }
    }

    #[test]
    fn test_query_tokenizer_follows_cache_encoding() {
        let tokenizer = provider(false).tokenizer_for(&header("p50k_base")).unwrap();
        assert_eq!(tokenizer.encoding_id(), "p50k_base");

        let tokenizer = provider(true).tokenizer_for(&header("p50k_base")).unwrap();
        assert_eq!(tokenizer.encoding_id(), "whitespace");
    }

    #[test]
    fn test_offline_embedder_matches_cache_dimension() {
        let embedder = provider(true).embedder(DEFAULT_MODEL, Some(64)).unwrap();
        assert_eq!(embedder.embed("payments").unwrap().dim(), 64);
    }
}
