mod chat;
mod config;
mod embedder;
mod error;
mod indexer;
mod llm;
mod pipeline;
mod prompt;
mod retriever;
mod ui;
mod utils;
mod vector_db;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::{Context, Result};
use config::AppConfig;
use embedder::{Embedder, FastEmbedder};
use llm::{GeminiClient, LLMConfig};
use pipeline::RagPipeline;
use retriever::Retriever;
use tracing::info;
use tracing_subscriber::EnvFilter;
use ui::{Notifier, TerminalUi};

/// Services built once at startup and shared by every turn.
struct AppContext {
    config: AppConfig,
    pipeline: RagPipeline,
}

impl AppContext {
    fn build(config: AppConfig, ui: &TerminalUi) -> error::Result<Self> {
        let spinner = ui.spinner("Loading embedding model...");
        let embedder = FastEmbedder::new(config.embedding_cache_dir.clone());
        spinner.finish_and_clear();
        let embedder: Arc<dyn Embedder> = Arc::new(embedder?);

        let vector_db = indexer::index_data(&config.data_path, &config.db_dir, embedder.as_ref(), ui)?;

        let spinner = ui.spinner(&format!(
            "RAG Chain ({}) is being established...",
            config.generation_model
        ));
        let generator = GeminiClient::new(
            config.api_key.clone(),
            LLMConfig {
                model: config.generation_model.clone(),
                temperature: config.temperature,
                ..LLMConfig::default()
            },
        );
        spinner.finish_and_clear();
        let generator = generator?;
        info!("Generation model: {}", generator.model());

        let retriever = Retriever::new(vector_db, embedder, config.top_k);
        let pipeline = RagPipeline::new(retriever, Box::new(generator));
        ui.success("RAG Chain is installed and ready to use.");

        Ok(Self { config, pipeline })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vocab_rag=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (ignore errors if missing)
    dotenvy::dotenv().ok();
    init_tracing();

    let ui = TerminalUi::new();
    ui.banner();

    let config = match AppConfig::from_env().and_then(|config| config.ensure_data_file().map(|_| config)) {
        Ok(config) => config,
        Err(e) => {
            ui.error(&format!("ERROR: {e}"));
            return Err(e).context("startup configuration failed");
        }
    };

    let app = match AppContext::build(config, &ui) {
        Ok(app) => app,
        Err(e) => {
            ui.error(&format!("A critical error occurred during system installation: {e}"));
            return Err(e).context("system installation failed");
        }
    };

    info!(
        "Ready: {} records indexed from {}",
        app.pipeline.index_size(),
        app.config.data_path.display()
    );
    ui.info("Ask about a word (\"jacket kelimesi ne demek?\") or a level (\"A1 kelimelerini ver.\"). Ctrl+D to exit.");

    chat::run(&app.pipeline, &ui).await.context("failed to read input")?;
    Ok(())
}
