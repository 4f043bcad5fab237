//! Read-only reports over the data file.

use crate::audit::{audit_citations, entries_without_images, CitationAudit};
use crate::store::StoreError;
use crate::transform::undefined_categories;

use super::EditService;

/// An entry filed under a label the category table does not define.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndefinedCategory {
    pub title: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditReport {
    pub citations: CitationAudit,
    /// `(date, title)` of entries with no picture.
    pub without_images: Vec<(String, String)>,
    /// Empty when the file has no category table.
    pub undefined_categories: Vec<UndefinedCategory>,
}

impl EditService {
    /// Cross-check citations, image coverage and category labels.
    pub fn audit(&self, image_year_cutoff: u32) -> Result<AuditReport, StoreError> {
        let store = self.load()?;
        let index = store.citations.as_deref().unwrap_or_default();

        let without_images = entries_without_images(&store.entries, image_year_cutoff)
            .into_iter()
            .map(|e| (e.date.clone(), e.title.clone()))
            .collect();

        let undefined = match &store.categories {
            Some(table) => undefined_categories(&store.entries, table)
                .into_iter()
                .map(|e| UndefinedCategory {
                    title: e.title.clone(),
                    category: e.category.clone().unwrap_or_default(),
                })
                .collect(),
            None => Vec::new(),
        };

        Ok(AuditReport {
            citations: audit_citations(&store.entries, index),
            without_images,
            undefined_categories: undefined,
        })
    }
}
