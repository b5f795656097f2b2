//! # Document Q&A Example
//!
//! Segments a document, indexes it, then asks the overview questions and a
//! custom question, printing each answer with the segments it cites.
//!
//! Pages are separated by form feeds (`\x0c`), which is what most PDF text
//! extractors emit. Without a path argument a built-in tender excerpt is used.
//!
//! Runs offline with the debug backend. With the `openai` feature and
//! `OPENAI_API_KEY` set it uses OpenAI instead:
//!
//! ```bash
//! cargo run --example doc_qa -- tender.txt "When is the submission deadline?"
//! cargo run --example doc_qa --features openai -- tender.txt
//! ```

use anyhow::Context;
use docqa::{
    Backend, Document, FixedSizeChunker, Page, ProviderSettings, QueryPipeline, QueryResult,
    RagConfig, SegmentIndex, backend,
};
use tracing_subscriber::EnvFilter;

const SAMPLE_TENDER: &str = "\
Invitation to tender: municipal fleet maintenance.\n\
The City of Bergen invites qualified suppliers to submit bids for the maintenance of \
its municipal vehicle fleet of roughly 400 vehicles.\x0c\
Requirements. Suppliers must hold ISO 9001 certification and provide a service point \
within 20 km of the city centre. Response time for breakdowns must not exceed four \
hours.\x0c\
Submission. Bids must reach the contracting authority no later than 12:00 on 3 May. \
The contract runs for 24 months with an option to extend by 12 months.";

fn load_pages(path: Option<&str>) -> anyhow::Result<Vec<Page>> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?,
        None => SAMPLE_TENDER.to_string(),
    };
    Ok(text.split('\x0c').zip(1..).map(|(text, number)| Page::new(number, text)).collect())
}

fn print_result(title: &str, result: &QueryResult) {
    println!("\n== {title} ==");
    println!("{}", result.answer);
    for source in &result.sources {
        println!("  [{}] {}", source.source_id, source.text.replace('\n', " "));
    }
    if !result.unresolved_citations.is_empty() {
        println!("  (unknown sources cited: {})", result.unresolved_citations.join(", "));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docqa=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let path = args.next();
    let question = args.next().unwrap_or_else(|| "When must bids be submitted?".to_string());

    let settings = ProviderSettings::from_env();
    let backend = if cfg!(feature = "openai") && settings.api_key.is_some() {
        Backend::OpenAI
    } else {
        Backend::Debug
    };
    let config = RagConfig::builder().backend(backend).build()?;
    println!("Backend: {backend:?}");

    // -- 1. Segment ------------------------------------------------------
    let chunker = FixedSizeChunker::from_config(&config)?;
    let name = path.as_deref().unwrap_or("sample-tender.txt");
    let document = Document::from_pages(name, &load_pages(path.as_deref())?, &chunker)?;
    println!("{} -> {} segments (id {})", document.name, document.segments.len(), document.id);

    // -- 2. Index --------------------------------------------------------
    let embedder = backend::embedding_provider(&config, &settings)?;
    let index = SegmentIndex::build(vec![document], embedder).await?;

    // -- 3. Ask ----------------------------------------------------------
    let pipeline = QueryPipeline::builder()
        .config(config.clone())
        .language_model(backend::language_model(&config, &settings)?)
        .build()?;

    print_result("Overview", &pipeline.document_overview(&index).await?);

    let defaults = pipeline.default_answers(&index).await?;
    print_result("Requirements", &defaults.requirements);
    print_result("Buyer", &defaults.buyer);
    print_result("Summary", &defaults.summary);

    print_result(&question, &pipeline.answer_query(&question, &index, false).await?);

    let all = pipeline.answer_query(&question, &index, true).await?;
    print_result(&format!("{question} (all retrieved segments)"), &all);

    Ok(())
}
