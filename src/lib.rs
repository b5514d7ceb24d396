pub mod api;
pub mod assemble;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod headers;
pub mod normalize;
pub mod parsing;
pub mod pipeline;
pub mod retry;
pub mod synthetic;
pub mod types;

pub use api::{build_router, AppState};
pub use assemble::Assembler;
pub use catalog::{Catalog, GenreEntry, GenreGroup, SearchType};
pub use client::HttpPageFetcher;
pub use crate::config::AppConfig;
pub use error::ScrapeError;
pub use export::{export, list_exports, resolve_download};
pub use fetcher::PageFetcher;
pub use normalize::{normalize, FieldRules};
pub use parsing::ChartParser;
pub use pipeline::{GenreOutcome, GenreSummary, ScrapeOptions, ScrapeOutcome, Scraper};
pub use synthetic::{SampleGenerator, SyntheticRecordGenerator};
pub use types::{
    Column, ExportArtifact, ExportEntry, Field, NamingParams, NormalizedRecord, Platform,
    Provenance, RankedRecord, RawCandidateSet, ResultSet, Schema,
};

#[cfg(feature = "mock")]
pub use fetcher::MockPageFetcher;

// Re-export scraper types for testing
pub use scraper::Html;

pub type Result<T> = std::result::Result<T, ScrapeError>;
