use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use ora_agents::{
    AcademicAgent, Controller, Dispatcher, DocumentAgent, JsonlTraceSink, Router, Synthesizer,
    WebAgent,
};
use ora_core::{Embedder, TextGenerator};
use ora_gemini::GeminiClient;
use ora_rag::{RetrievalEngine, VectorIndexStore};
use ora_sources::{ArxivSource, DuckDuckGoSource};

#[derive(Parser)]
#[command(name = "ora")]
#[command(about = "Orchestrated retrieval assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a document into the knowledge index
    Ingest {
        /// Path to the document (PDF, or text with form-feed page breaks)
        path: PathBuf,
        /// Logical document id; defaults to the file name
        #[arg(long)]
        id: Option<String>,
    },
    /// Ask a question across all knowledge sources
    Ask {
        /// The question to answer
        query: Vec<String>,
    },
    /// Print the stored trace log
    Logs,
}

/// Everything one request needs, constructed once at startup.
///
/// Explicit wiring instead of process-global lazy state: the index
/// store and capability clients are created here and shared by handle.
struct App {
    engine: Arc<RetrievalEngine>,
    controller: Controller,
}

fn build_app() -> Result<App> {
    let gemini = Arc::new(GeminiClient::from_env()?);
    let generator: Arc<dyn TextGenerator> = gemini.clone();
    let embedder: Arc<dyn Embedder> = gemini;

    let data_dir = std::env::var("ORA_DATA_DIR").unwrap_or_else(|_| "knowledge_store".to_string());
    let store = Arc::new(VectorIndexStore::new(data_dir));
    let engine = Arc::new(RetrievalEngine::new(embedder, generator.clone(), store));

    let mut dispatcher = Dispatcher::new();
    dispatcher.register(Arc::new(DocumentAgent::new(engine.clone())));
    dispatcher.register(Arc::new(WebAgent::new(
        Arc::new(DuckDuckGoSource::new()?),
        generator.clone(),
    )));
    dispatcher.register(Arc::new(AcademicAgent::new(Arc::new(ArxivSource::new()?))));

    let trace_path =
        std::env::var("ORA_TRACE_LOG").unwrap_or_else(|_| "logs/trace.jsonl".to_string());
    let sink = Arc::new(JsonlTraceSink::new(trace_path));

    let controller = Controller::new(
        Router::new(generator.clone()),
        dispatcher,
        Synthesizer::new(generator),
        sink,
    );

    Ok(App { engine, controller })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let app = build_app()?;

    match cli.command {
        Some(Command::Ingest { path, id }) => {
            let document_id = id.unwrap_or_else(|| {
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "document".to_string())
            });
            let bytes = std::fs::read(&path)?;
            println!("{} Ingesting {}...", "📄".blue(), document_id.bold());
            let count = app.engine.ingest(&bytes, &document_id).await?;
            if count == 0 {
                println!("{} No text found; index left untouched", "⚠️".yellow());
            } else {
                println!("{} Indexed {} chunks", "✅".green(), count);
            }
        }
        Some(Command::Ask { query }) => {
            let query = query.join(" ");
            ask_once(&app, &query).await?;
        }
        Some(Command::Logs) => {
            let records = app.controller.trace_log().await?;
            if records.is_empty() {
                println!("{}", "No trace records yet".dimmed());
            }
            for record in records {
                println!(
                    "{} {} {}",
                    record.timestamp.to_rfc3339().dimmed(),
                    format!("[{}]", record.decision.reason).cyan(),
                    record.query.bold()
                );
                println!("  {}", record.final_answer);
            }
        }
        None => interactive(&app).await?,
    }

    Ok(())
}

async fn ask_once(app: &App, query: &str) -> Result<()> {
    println!("{} Thinking...", "🤖".blue());
    let (answer, record) = app.controller.answer(query).await?;

    let agents: Vec<String> = record
        .agents_used
        .iter()
        .map(|s| s.to_string())
        .collect();
    println!(
        "{} {}",
        "→ routing:".dimmed(),
        format!("{} ({})", record.decision.reason, agents.join(", ")).dimmed()
    );
    println!();
    println!("{}", answer);
    Ok(())
}

async fn interactive(app: &App) -> Result<()> {
    println!("{}", "ORA - orchestrated retrieval assistant".blue().bold());
    println!(
        "{}",
        "Ask about your documents, the web, or research papers. 'exit' to quit.".dimmed()
    );
    println!();

    loop {
        print!("{} ", "?".cyan());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("{}", "👋 Goodbye!".green());
            break;
        }

        if let Err(e) = ask_once(app, input).await {
            println!("{} {}", "❌".red(), e);
        }
    }

    Ok(())
}
