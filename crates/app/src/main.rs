mod client;
mod config;
mod format;
mod server;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use client::BackendClient;
use config::{Cli, Command, ServeArgs, StoreBackend};
use contract_review_core::{
    load_corpus, Comparator, DocumentIndexer, GeminiModel, InMemoryStore, IssuedDocuments,
    LopdfExtractor, PineconeStore, TextSplitter,
};
use format::ComparisonFormatter;
use server::{AppState, SharedModel, SharedStore};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Upload { file, backend } => {
            let client = BackendClient::new(&backend.backend_url);
            let response = client.upload(&file).await?;
            info!(
                file = %file.display(),
                document_id = %response.document_id,
                "{}",
                response.message
            );
            println!("{}", response.document_id);
            Ok(())
        }
        Command::Compare {
            document_id,
            query,
            raw,
            backend,
        } => {
            let client = BackendClient::new(&backend.backend_url);
            let result = client.compare(&document_id, &query).await?;
            if raw {
                println!("{result}");
            } else {
                let formatter = ComparisonFormatter::new()?;
                println!("{}", formatter.format(&result));
            }
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        started_at = %Utc::now().to_rfc3339(),
        "contract-review boot"
    );

    let store: SharedStore = match args.store {
        StoreBackend::Pinecone => {
            let host = args
                .pinecone_host
                .as_deref()
                .context("PINECONE_INDEX_HOST is required for the pinecone store")?;
            let api_key = args
                .pinecone_api_key
                .clone()
                .context("PINECONE_API_KEY is required for the pinecone store")?;
            Arc::new(PineconeStore::new(host, api_key)?)
        }
        StoreBackend::Memory => {
            warn!("using the in-memory store, indexed documents are lost on restart");
            Arc::new(InMemoryStore::new())
        }
    };

    let api_key = args
        .google_api_key
        .clone()
        .context("GOOGLE_API_KEY is required")?;
    let model: SharedModel = Arc::new(
        GeminiModel::new(api_key)
            .with_model(args.model.clone())
            .with_base_url(args.model_base_url.clone()),
    );

    let splitter = TextSplitter::new(args.chunking())?;
    let corpus = load_corpus(&args.corpus_path, &LopdfExtractor, &splitter, &store).await;
    info!(corpus = ?corpus, "corpus status");

    let issued = IssuedDocuments::new();
    let indexer = DocumentIndexer::new(store.clone(), splitter, args.upload_dir.clone())
        .with_issued_documents(issued.clone());
    let comparator =
        Comparator::new(store, model, args.comparison()).with_issued_documents(issued);
    let state = AppState::new(indexer, comparator, corpus);

    server::run_server(&args.bind, state, args.max_upload_bytes()).await
}
