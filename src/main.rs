use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

mod cli;
mod config;
mod corpus;
mod semantic;
#[cfg(test)]
mod tests;
mod web;

use cli::Command;
use config::Config;
use corpus::EXCERPT_CHARS;
use semantic::{Answer, SearchEngine};

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_file(path),
        None => Config::load_with(&config::default_base_path()?),
    };

    config.context("failed to load config")
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let args = cli::Args::parse();
    let config = load_config(args.config.as_deref())?;
    let engine = SearchEngine::from_config(&config)?;

    match args.command {
        Command::Search { query, limit, json } => {
            let results = engine.search_with_limit(&query, limit)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
                return Ok(());
            }

            if results.is_empty() {
                println!("No matching documents");
                return Ok(());
            }

            let concepts = engine.extract_concepts(&query);
            for (idx, result) in results.iter().enumerate() {
                println!(
                    "{}. {} [{}] {:.3} {}",
                    idx + 1,
                    result.document.title,
                    result.document.id,
                    result.score,
                    result.relevance
                );
                let excerpt = result.document.excerpt(EXCERPT_CHARS);
                println!("   {}", engine.highlight(&excerpt, &concepts));
            }
        }

        Command::Ask { query, json } => {
            let response = engine.ask(&query)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
                return Ok(());
            }

            if response.context.is_blank() {
                println!("Ask a question, e.g. \"What is time dilation?\"");
                return Ok(());
            }

            if !response.context.concepts.is_empty() {
                println!("Key concepts: {}", response.context.concepts.join(", "));
            }
            for result in &response.results {
                println!(
                    "  {:.3} {} ({})",
                    result.score,
                    result.document.title,
                    result.relevance.label()
                );
                let excerpt = result.document.excerpt(EXCERPT_CHARS);
                println!("        {}", response.context.highlight(&excerpt));
            }

            let answer = Answer::parse(&response.answer);
            println!("\n{}", answer.body);
            if !answer.sources.is_empty() {
                println!("\nSources:");
                for source in &answer.sources {
                    println!("- {source}");
                }
            }
            if let Some(footer) = answer.footer {
                println!("\n{footer}");
            }
        }

        Command::Concepts { query } => {
            for concept in engine.extract_concepts(&query) {
                println!("{concept}");
            }
        }

        Command::Highlight { text, query } => {
            let concepts = engine.extract_concepts(&query);
            println!("{}", engine.highlight(&text, &concepts));
        }

        Command::Show { id, query } => {
            let doc = engine.require_document(&id)?;
            let concepts = query
                .as_deref()
                .map(|q| engine.extract_concepts(q))
                .unwrap_or_default();

            println!("{}", engine.highlight(&doc.title, &concepts));
            println!("{}\n", "=".repeat(doc.title.chars().count()));
            println!("{}", engine.highlight(&doc.content, &concepts));

            if !doc.tags.is_empty() {
                println!("\ntags: {}", doc.tags.join(", "));
            }
            if let Some(sources) = &doc.sources {
                println!("\nSources:");
                for source in sources {
                    println!("- {source}");
                }
            }
        }

        Command::List {} => {
            for doc in engine.documents() {
                if doc.tags.is_empty() {
                    println!("{}\t{}", doc.id, doc.title);
                } else {
                    println!("{}\t{} [{}]", doc.id, doc.title, doc.tags.join(", "));
                }
            }
        }

        Command::Topics {} => {
            for topic in engine.topics() {
                println!("{topic}");
            }
        }

        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let count = engine.initialize()?;
            let tuning = engine.config();
            log::info!(
                "indexed {count} documents ({} embedder, {} dims, weights {}/{}, min score {})",
                engine.index().embedder().name(),
                engine.index().dimensions(),
                tuning.semantic_weight,
                tuning.lexical_weight,
                tuning.min_score
            );
            web::start_daemon(Arc::new(engine), &bind)?;
        }
    }

    Ok(())
}
