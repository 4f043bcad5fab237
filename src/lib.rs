//! Batch editors and development server for the Gipsy Hill timeline.
//!
//! The timeline's content lives in one JavaScript file that declares the
//! entry array, an optional numbered citation index and an optional category
//! table. This crate loads that file, applies table-driven edits and writes
//! it back in a stable format.

pub mod audit;
pub mod cli;
pub mod config;
pub mod models;
pub mod server;
pub mod services;
pub mod store;
pub mod tables;
pub mod transform;

pub use config::{load_settings, Settings};
pub use models::{Category, Citation, CitationSource, ImageField, TimelineEntry};
pub use services::EditService;
pub use store::{DataStore, StoreError, StoreLayout};
