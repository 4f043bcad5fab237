//! Service layer for the timeline tools.
//!
//! Each operation runs the full load → edit → save pipeline against the
//! data file and returns a summary. The CLI only formats these summaries.

pub mod edit;
pub mod report;

pub use edit::{
    AppliedSubmission, CategorizeSummary, CitationSummary, EditService, QuoteFix, RepairSummary,
    ServiceError,
};
pub use report::{AuditReport, UndefinedCategory};
