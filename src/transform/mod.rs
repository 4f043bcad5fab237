//! Table-driven edits applied to parsed entries.
//!
//! Every transform works on records, never on the serialized text, so the
//! file's whitespace and field order do not affect matching.

pub mod categories;
pub mod citations;
pub mod images;
pub mod upsert;

pub use categories::{
    assign_categories, replace_category_table, undefined_categories, AssignmentReport,
    AssignmentStatus, CategoryAssignment, CategoryTableChange,
};
pub use citations::{
    format_marker, inject_citations, strip_marker, CitationCounter, CitationOutcome, CitationTable,
};
pub use images::{rewrite_image_urls, UrlReplacement};
pub use upsert::{upsert_entry, Submission, UpsertError, UpsertOutcome};
