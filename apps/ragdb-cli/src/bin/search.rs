use std::env;
use std::sync::Arc;

use ragdb_core::config::EngineConfig;
use ragdb_core::types::{Message, StrategyKind};
use ragdb_llm::OpenAiCompatClient;
use ragdb_retrieval::{build_strategy, Collaborators};
use ragdb_store::ChunkStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <query> [top_k]", args[0]);
        eprintln!("Example: {} 'how do I keep a root cellar dry' 5", args[0]);
        std::process::exit(1);
    }
    let query_text = &args[1];
    let config = EngineConfig::load()?;
    let top_k = args
        .get(2)
        .map(|s| s.parse::<usize>())
        .transpose()?
        .unwrap_or(config.retrieval.default_top_k);

    let strategy_kind = config.retrieval.strategy;
    println!("ragdb-search\n============");
    println!("Strategy: {strategy_kind}");
    println!("Query: {query_text}");

    let embedder = ragdb_embed::default_embedder(&config.embedding);
    let store = Arc::new(ChunkStore::connect(&config.store).await?);
    let reranker = matches!(strategy_kind, StrategyKind::Rerank | StrategyKind::Advanced)
        .then(|| ragdb_rerank::default_reranker(&config.reranker));
    let language_model = matches!(strategy_kind, StrategyKind::Advanced).then(|| {
        Arc::new(OpenAiCompatClient::new(&config.expansion))
            as Arc<dyn ragdb_core::traits::LanguageModel>
    });

    let strategy = build_strategy(
        strategy_kind,
        Collaborators { embedder, store, reranker, language_model },
        &config.expansion.language,
    )?;

    let history = vec![Message::human(query_text.clone())];
    let results = strategy.search(&history, top_k, None).await?;

    println!("\nFound {} results for: \"{query_text}\"", results.len());
    for (i, result) in results.iter().enumerate() {
        match result.rerank_score {
            Some(rerank) => println!(
                "\n  {}. rerank={:.4}  similarity={:.4}  id={}  source={}",
                i + 1,
                rerank,
                result.similarity_score,
                result.chunk.id,
                result.chunk.source_document
            ),
            None => println!(
                "\n  {}. similarity={:.4}  id={}  source={}",
                i + 1,
                result.similarity_score,
                result.chunk.id,
                result.chunk.source_document
            ),
        }
        let preview: String = result.chunk.text.chars().take(160).collect();
        println!("     {preview}");
    }
    Ok(())
}
