//! Command-line front end for the docqa pipeline.
//!
//! One-shot mode answers a single question passed as an argument; without
//! one, an interactive loop reads questions until EOF or `exit`. The
//! Cohere credential is taken per invocation from `--api-key` or the
//! `COHERE_API_KEY` environment variable and is never persisted.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use docqa::chunking::BoundaryChunker;
use docqa::cohere::{CohereEmbedder, CohereGenerator, CohereReranker};
use docqa::wikipedia::WikipediaSource;
use docqa::{Pipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "docqa", version, about = "Answer questions about one reference document")]
struct Args {
    /// The question to answer. Omit to enter an interactive loop.
    question: Option<String>,

    /// Wikipedia article to answer questions about.
    #[arg(long, default_value = "Machine learning")]
    topic: String,

    /// Cohere API key (falls back to the COHERE_API_KEY environment variable).
    #[arg(long)]
    api_key: Option<String>,

    /// Maximum chunk size in characters.
    #[arg(long, default_value_t = 512)]
    chunk_size: usize,

    /// Overlap between consecutive chunks in characters.
    #[arg(long, default_value_t = 50)]
    chunk_overlap: usize,

    /// Number of candidates kept after similarity ranking.
    #[arg(long, default_value_t = 10)]
    top_k: usize,

    /// Number of chunks kept after reranking.
    #[arg(long, default_value_t = 3)]
    top_n: usize,

    /// Generation sampling temperature.
    #[arg(long, default_value_t = 0.3)]
    temperature: f32,

    /// Embedding model name.
    #[arg(long)]
    embedding_model: Option<String>,

    /// Rerank model name.
    #[arg(long)]
    rerank_model: Option<String>,

    /// Generation model name.
    #[arg(long)]
    generation_model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let api_key = args
        .api_key
        .clone()
        .or_else(|| std::env::var("COHERE_API_KEY").ok())
        .filter(|key| !key.trim().is_empty())
        .context("missing Cohere API key: pass --api-key or set COHERE_API_KEY")?;

    let config = PipelineConfig::builder()
        .chunk_size(args.chunk_size)
        .chunk_overlap(args.chunk_overlap)
        .retrieval_top_k(args.top_k)
        .rerank_top_n(args.top_n)
        .build()?;

    let mut embedder = CohereEmbedder::new(api_key.as_str())?;
    if let Some(model) = &args.embedding_model {
        embedder = embedder.with_model(model.as_str());
    }

    let mut reranker = CohereReranker::new(api_key.as_str())?;
    if let Some(model) = &args.rerank_model {
        reranker = reranker.with_model(model.as_str());
    }

    let mut generator = CohereGenerator::new(api_key.as_str())?.with_temperature(args.temperature);
    if let Some(model) = &args.generation_model {
        generator = generator.with_model(model.as_str());
    }
    drop(api_key);

    let pipeline = Pipeline::builder()
        .chunker(Arc::new(BoundaryChunker::new(config.chunk_size, config.chunk_overlap)?))
        .config(config)
        .source(Arc::new(WikipediaSource::new()))
        .embedder(Arc::new(embedder))
        .reranker(Arc::new(reranker))
        .answerer(Arc::new(generator))
        .build()?;

    match &args.question {
        Some(question) => {
            let answer = pipeline.answer(&args.topic, question).await?;
            println!("{}", answer.text);
        }
        None => interactive(&pipeline, &args.topic).await?,
    }

    Ok(())
}

/// Read questions until EOF, Ctrl-C, or `exit`.
async fn interactive(pipeline: &Pipeline, topic: &str) -> Result<()> {
    println!("Answering questions about \"{topic}\". Type 'exit' to quit.");
    let mut editor = DefaultEditor::new()?;

    loop {
        // readline blocks; keep it off the async worker threads.
        let line = tokio::task::block_in_place(|| editor.readline("question> "));
        match line {
            Ok(line) => {
                let question = line.trim();
                if question.is_empty() {
                    continue;
                }
                if question == "exit" || question == "quit" {
                    break;
                }
                editor.add_history_entry(question)?;

                match pipeline.answer(topic, question).await {
                    Ok(answer) => println!("\n{}\n", answer.text),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
