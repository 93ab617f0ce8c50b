//! Terminal output for result envelopes
//!
//! Human-readable output uses colored; `--json` prints the envelope as is.

use anyhow::Result;
use colored::*;
use serde::Serialize;

use rowseek::engine::EngineInfo;
use rowseek::model::{
    DeleteOutcome, IndicesEnvelope, IngestionOutcome, SearchDocument, SearchEnvelope,
};

/// Prints envelopes either as JSON or for a terminal
pub struct ResultPrinter {
    json: bool,
}

impl ResultPrinter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn print_error(&self, error: &str) {
        eprintln!("{} {}", "error:".red().bold(), error);
    }

    pub fn print_search(&self, envelope: &SearchEnvelope) -> Result<()> {
        if self.json {
            return self.print_json(envelope);
        }
        if let Some(error) = &envelope.error {
            self.print_error(error);
            return Ok(());
        }
        if envelope.results.is_empty() {
            println!("\n{}", "No results found.".yellow());
            return Ok(());
        }

        println!(
            "\n{} {}",
            "Found".green().bold(),
            format!("{} results (showing {}):", envelope.total, envelope.results.len()).green()
        );
        println!();

        for (i, document) in envelope.results.iter().enumerate() {
            self.print_document(i + 1, document);
        }
        Ok(())
    }

    fn print_document(&self, position: usize, document: &SearchDocument) {
        println!(
            "{} {} {} {}",
            format!("[{}]", position).cyan().bold(),
            document.index.blue().bold(),
            "·".dimmed(),
            document.id.dimmed()
        );
        for (name, value) in &document.fields {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            println!("    {} {}", format!("{name}:").dimmed(), value);
        }
        println!();
    }

    pub fn print_indices(&self, envelope: &IndicesEnvelope) -> Result<()> {
        if self.json {
            return self.print_json(envelope);
        }
        if let Some(error) = &envelope.error {
            self.print_error(error);
            return Ok(());
        }
        if envelope.results.is_empty() {
            println!("\n{}", "No indices yet.".yellow());
            return Ok(());
        }

        println!();
        for index in &envelope.results {
            println!(
                "   {:<32} {:>10} {:>10}",
                index.name.blue().bold(),
                format!("{} docs", index.docs_count),
                index.size.dimmed()
            );
        }
        Ok(())
    }

    pub fn print_delete(&self, index: &str, id: &str, outcome: &DeleteOutcome) -> Result<()> {
        if self.json {
            return self.print_json(outcome);
        }
        match &outcome.error {
            Some(error) => self.print_error(error),
            None => println!("{} {}/{}", "Deleted".green().bold(), index, id),
        }
        Ok(())
    }

    pub fn print_ingest(&self, outcome: &IngestionOutcome) -> Result<()> {
        if self.json {
            return self.print_json(outcome);
        }
        if let Some(error) = &outcome.error {
            self.print_error(error);
            return Ok(());
        }

        println!(
            "\n{} {}",
            "Loaded into".green().bold(),
            outcome.index_name.as_deref().unwrap_or_default().blue().bold()
        );
        println!("   {}", "Preview:".dimmed());
        for record in &outcome.results {
            let row: Vec<String> = record
                .iter()
                .map(|(k, v)| format!("{k}={}", v.as_str().unwrap_or_default()))
                .collect();
            println!("   {}", row.join(", "));
        }
        Ok(())
    }

    pub fn print_migrate(&self, index: &str, outcome: &DeleteOutcome) {
        match &outcome.error {
            Some(error) => self.print_error(error),
            None => println!("{} {}", "Soft deletes enabled for".green().bold(), index),
        }
    }

    pub fn print_validation(&self, result: &rowseek::Result<()>) {
        match result {
            Ok(()) => println!("{}", "CSV is valid".green().bold()),
            Err(err) => self.print_error(&err.to_string()),
        }
    }

    pub fn print_status(&self, info: &EngineInfo) {
        println!("\n{}", "Engine Status".bold());
        println!("   Name: {}", info.name);
        println!("   Version: {}", info.version);
    }
}
