//! # Chat Session Example
//!
//! Walks through one conversation: upload, a repeated question served from
//! the answer cache, a re-upload of the same content reusing the index, and
//! a new upload that starts the conversation over.
//!
//! Uses the debug backend, so no API key is needed.
//!
//! Run: `cargo run --example chat_session`

use std::sync::Arc;

use docqa::{
    Backend, CannedQuery, ChatSession, FixedSizeChunker, Page, ProviderSettings, QueryPipeline,
    RagConfig, Role, backend,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn print_conversation(session: &ChatSession) {
    for message in session.messages() {
        let who = match message.role {
            Role::User => "you",
            Role::Assistant => "docqa",
        };
        println!("  {who:>5}: {}", message.content);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = RagConfig::builder().chunk_size(120).top_k(3).backend(Backend::Debug).build()?;
    let settings = ProviderSettings::default();
    let chunker = Arc::new(FixedSizeChunker::from_config(&config)?);
    let pipeline = QueryPipeline::builder()
        .config(config.clone())
        .language_model(backend::language_model(&config, &settings)?)
        .build()?;
    let mut session = ChatSession::new(chunker, backend::embedding_provider(&config, &settings)?);

    let tender = [
        Page::new(1, "The Port Authority seeks a supplier of harbour cranes."),
        Page::new(2, "Cranes must lift 40 tonnes and be delivered before 1 March."),
    ];
    session.load_document("cranes.pdf", &tender).await?;

    session.ask(&pipeline, "How much must the cranes lift?").await?;
    session.ask(&pipeline, "How much must the cranes lift?").await?;
    info!(cached = session.cached_answers(), "asked the same question twice");

    let summary = session.canned(&pipeline, CannedQuery::Summary).await?;
    println!("Summary: {}", summary.answer);

    // Same content again: the index is reused and the conversation kept.
    session.load_document("cranes-copy.pdf", &tender).await?;
    println!("After re-uploading the same content:");
    print_conversation(&session);

    let other = [Page::new(1, "Catering services for the city hall canteen.")];
    session.load_document("catering.pdf", &other).await?;
    println!("After uploading a different document:");
    print_conversation(&session);

    if let Err(e) = session.ask(&pipeline, "   ").await {
        println!("Rejected blank question: {e}");
    }

    Ok(())
}
