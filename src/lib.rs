//! faqrag - crawl FAQ pages into a vector collection and query them by meaning
//!
//! This crate provides:
//! - A scoped, bounded web crawler that collects the visible text of FAQ pages
//! - Question/answer extraction with keyword categorisation
//! - A Weaviate collection store with server-side embeddings and batch import
//! - CLI commands to create the collection, import data and run near-text queries

pub mod commands;
pub mod config;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod models;
pub mod parse;
pub mod progress;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use models::{MatchedRecord, QaRecord};
