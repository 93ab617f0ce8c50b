//! rowseek - search, load and soft-delete rows in a document search engine

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rowseek::config::{self, Backend};
use rowseek::engine::{ElasticEngine, EmbeddedEngine, EngineClient};
use rowseek::{Service, Settings};

mod cli;
mod output;

use cli::{Cli, Commands};
use output::ResultPrinter;

fn main() -> ExitCode {
    // Initialize tracing; stderr keeps --json stdout clean
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run one command; `Ok(false)` means the operation reported an error.
fn run(cli: Cli) -> Result<bool> {
    let mut settings = load_settings(&cli)?;
    if let Commands::Ingest {
        delimiter,
        no_headers,
        ..
    } = &cli.command
    {
        if let Some(delimiter) = delimiter {
            config::delimiter_byte(*delimiter)?;
            settings.ingest.delimiter = *delimiter;
        }
        if *no_headers {
            settings.ingest.has_headers = false;
        }
    }
    let engine = build_engine(&settings)?;
    let service = Service::new(engine, settings);

    match cli.command {
        Commands::Search {
            query,
            mode,
            index,
            json,
        } => {
            tracing::info!(query = %query, mode = mode.as_str(), "Searching");
            let envelope = service.search(&query, Some(mode.as_str()), index.as_deref());
            ResultPrinter::new(json).print_search(&envelope)?;
            Ok(envelope.error.is_none())
        }
        Commands::Indices { json } => {
            let envelope = service.list_indices();
            ResultPrinter::new(json).print_indices(&envelope)?;
            Ok(envelope.error.is_none())
        }
        Commands::Delete { index, id, json } => {
            let outcome = service.delete_document(&index, &id);
            ResultPrinter::new(json).print_delete(&index, &id, &outcome)?;
            Ok(outcome.success)
        }
        Commands::Ingest {
            file, name, json, ..
        } => {
            let bytes = read_file(&file)?;
            let outcome = service.ingest(&bytes, name.as_deref());
            ResultPrinter::new(json).print_ingest(&outcome)?;
            Ok(outcome.error.is_none())
        }
        Commands::Validate { file } => {
            let bytes = read_file(&file)?;
            let result = service.validate(&bytes);
            ResultPrinter::new(false).print_validation(&result);
            Ok(result.is_ok())
        }
        Commands::Migrate { index } => {
            let outcome = service.migrate(&index);
            ResultPrinter::new(false).print_migrate(&index, &outcome);
            Ok(outcome.success)
        }
        Commands::Status => {
            let info = service
                .engine_info()
                .context("Engine is not reachable")?;
            ResultPrinter::new(false).print_status(&info);
            Ok(true)
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let path = cli.config.clone().unwrap_or_else(Settings::default_path);
    let mut settings = Settings::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    if let Some(url) = &cli.engine_url {
        settings.engine.backend = Backend::Elastic;
        settings.engine.url = url.clone();
    }
    if let Some(dir) = &cli.data_dir {
        settings.engine.data_dir = dir.clone();
    }
    Ok(settings)
}

fn build_engine(settings: &Settings) -> Result<Arc<dyn EngineClient>> {
    let engine = &settings.engine;
    let client: Arc<dyn EngineClient> = match engine.backend {
        Backend::Embedded => Arc::new(
            EmbeddedEngine::open(&engine.data_dir, engine.writer_heap_bytes).with_context(|| {
                format!("Failed to open data directory {}", engine.data_dir.display())
            })?,
        ),
        Backend::Elastic => Arc::new(
            ElasticEngine::new(&engine.url, engine.refresh)
                .with_context(|| format!("Failed to create client for {}", engine.url))?,
        ),
    };
    Ok(client)
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}
