//! rowseek - a façade over a document search engine
//!
//! Builds structured queries from free text under three matching modes,
//! bulk-loads CSV data into indices with inferred mappings, and deletes
//! documents by flagging them rather than removing them.

pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod model;
pub mod query;
pub mod search;
pub mod service;
pub mod tabular;
pub mod tombstone;

pub use config::Settings;
pub use error::{Error, Result};
pub use service::Service;
