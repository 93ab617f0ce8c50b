//! CLI definitions using clap derive macros
//!
//! Subcommands:
//! - search: Query one or all indices
//! - indices: List indices with document counts
//! - delete: Soft-delete a document
//! - ingest: Load a CSV file into an index
//! - validate: Check a CSV file without loading it
//! - migrate: Add the soft-delete field to an index
//! - status: Check engine connectivity

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use rowseek::model::SearchMode;

/// rowseek - search, load and soft-delete rows in a document search engine
#[derive(Parser, Debug)]
#[command(name = "rowseek")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (defaults to ~/.rowseek/config.toml)
    #[arg(long, global = true, env = "ROWSEEK_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Use the Elasticsearch engine at this URL
    #[arg(long, global = true, env = "ROWSEEK_ENGINE_URL", value_name = "URL")]
    pub engine_url: Option<String>,

    /// Storage directory of the embedded engine
    #[arg(long, global = true, env = "ROWSEEK_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search documents
    Search {
        /// Search query
        #[arg(value_name = "QUERY")]
        query: String,

        /// Matching mode
        #[arg(short, long, value_enum, default_value_t = SearchMode::Free)]
        mode: SearchMode,

        /// Index to search (defaults to all)
        #[arg(short, long)]
        index: Option<String>,

        /// Output the result envelope as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// List indices with document counts and sizes
    Indices {
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Mark a document as deleted
    Delete {
        #[arg(value_name = "INDEX")]
        index: String,

        #[arg(value_name = "ID")]
        id: String,

        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Load a CSV file into an index
    Ingest {
        /// CSV file to load
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Index name (lower-cased; generated when omitted)
        #[arg(short, long)]
        name: Option<String>,

        /// Field delimiter (overrides the config file)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Treat the first row as data; columns become column_1..N
        #[arg(long, default_value = "false")]
        no_headers: bool,

        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Check that a CSV file parses, without loading it
    Validate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Add the soft-delete field to an index
    Migrate {
        #[arg(value_name = "INDEX")]
        index: String,
    },

    /// Check engine connectivity
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_search_flags() {
        let cli = Cli::parse_from(["rowseek", "search", "Tel Aviv", "--mode", "phrase", "-i", "streets"]);
        match cli.command {
            Commands::Search { query, mode, index, json } => {
                assert_eq!(query, "Tel Aviv");
                assert_eq!(mode, SearchMode::Phrase);
                assert_eq!(index.as_deref(), Some("streets"));
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_engine_url_after_subcommand() {
        let cli = Cli::parse_from(["rowseek", "indices", "--engine-url", "http://es:9200"]);
        assert_eq!(cli.engine_url.as_deref(), Some("http://es:9200"));
    }
}
