//! Batch edits of the data file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::info;

use crate::models::{Category, NumberStyle};
use crate::store::repair::{normalize_punctuation, punctuation_count};
use crate::store::{read_store, write_store, DataStore, StoreError, StoreLayout};
use crate::transform::{
    assign_categories, inject_citations, replace_category_table, rewrite_image_urls, upsert_entry,
    AssignmentReport, CategoryAssignment, CategoryTableChange, CitationCounter, CitationTable,
    Submission, UpsertError, UpsertOutcome, UrlReplacement,
};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Upsert(#[from] UpsertError),

    #[error("submission {path}: {source}")]
    Submission {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Quote normalization alone did not leave a parseable file.
    #[error("data file still needs repair after quote normalization; run `repair`")]
    NeedsRepair,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationSummary {
    /// Citation numbers assigned, 1 through `citations`.
    pub citations: u32,
    pub annotated_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorizeSummary {
    pub assignments: AssignmentReport,
    /// Present when the category table was replaced as well.
    pub table: Option<CategoryTableChange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairSummary {
    pub entries: usize,
    /// Typographic characters replaced before parsing.
    pub punctuation: usize,
    /// Whether the line-oriented repair passes were needed.
    pub repaired: bool,
}

/// A submission file that was applied and set aside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedSubmission {
    pub outcome: UpsertOutcome,
    /// Where the submission file was moved to.
    pub processed: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteFix {
    pub replaced: usize,
}

/// Runs edits against one data file.
#[derive(Debug, Clone)]
pub struct EditService {
    path: PathBuf,
    layout: StoreLayout,
}

impl EditService {
    pub fn new(path: impl Into<PathBuf>, layout: StoreLayout) -> Self {
        Self {
            path: path.into(),
            layout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<DataStore, StoreError> {
        DataStore::load(&self.path, self.layout.clone())
    }

    fn save(&self, store: &DataStore) -> Result<(), StoreError> {
        store.save(&self.path)
    }

    /// Number every source in `table` and annotate the matching entries,
    /// replacing the citation index.
    pub fn cite(&self, table: &CitationTable) -> Result<CitationSummary, ServiceError> {
        let mut store = self.load()?;
        let mut counter = CitationCounter::new();
        let outcome = inject_citations(&mut store.entries, table, &mut counter);

        // Keep writing numbers the way the existing index does.
        let style = store
            .citations
            .as_ref()
            .and_then(|index| index.first())
            .map_or(NumberStyle::default(), |c| c.number.style());
        let mut index = outcome.index;
        for citation in &mut index {
            citation.number = citation.number.with_style(style);
        }
        store.citations = Some(index);
        self.save(&store)?;

        info!(
            "Assigned {} citations across {} entries",
            counter.issued(),
            outcome.annotated
        );
        Ok(CitationSummary {
            citations: counter.issued(),
            annotated_entries: outcome.annotated,
        })
    }

    /// Reassign entry categories and optionally replace the category table.
    pub fn categorize(
        &self,
        assignments: &[CategoryAssignment],
        table: Option<IndexMap<String, Category>>,
    ) -> Result<CategorizeSummary, ServiceError> {
        let mut store = self.load()?;
        let report = assign_categories(&mut store.entries, assignments);
        let table = table.map(|t| replace_category_table(&mut store, t));
        self.save(&store)?;

        Ok(CategorizeSummary {
            assignments: report,
            table,
        })
    }

    /// Replace the category table without touching entries.
    pub fn replace_categories(
        &self,
        table: IndexMap<String, Category>,
    ) -> Result<CategoryTableChange, ServiceError> {
        let mut store = self.load()?;
        let change = replace_category_table(&mut store, table);
        self.save(&store)?;
        Ok(change)
    }

    /// Normalize punctuation, parse (repairing if needed) and rewrite the
    /// file in canonical form.
    pub fn repair(&self) -> Result<RepairSummary, ServiceError> {
        let text = read_store(&self.path)?;
        let punctuation = punctuation_count(&text);
        let store = DataStore::parse(&normalize_punctuation(&text), self.layout.clone())?;
        self.save(&store)?;

        Ok(RepairSummary {
            entries: store.entries.len(),
            punctuation,
            repaired: store.repaired,
        })
    }

    /// Replace typographic quotes throughout the file, keeping its layout.
    ///
    /// The result must parse without the repair passes, otherwise nothing is
    /// written.
    pub fn fix_quotes(&self) -> Result<QuoteFix, ServiceError> {
        let text = read_store(&self.path)?;
        let replaced = punctuation_count(&text);
        if replaced == 0 {
            return Ok(QuoteFix { replaced });
        }

        let fixed = normalize_punctuation(&text);
        let check = DataStore::parse(&fixed, self.layout.clone())?;
        if check.repaired {
            return Err(ServiceError::NeedsRepair);
        }
        write_store(&self.path, &fixed)?;

        info!("Replaced {} typographic characters", replaced);
        Ok(QuoteFix { replaced })
    }

    /// Apply URL replacements to entry media fields.
    pub fn rewrite_images(&self, replacements: &[UrlReplacement]) -> Result<usize, ServiceError> {
        let mut store = self.load()?;
        let changed = rewrite_image_urls(&mut store.entries, replacements);
        if changed > 0 {
            self.save(&store)?;
        }
        Ok(changed)
    }

    /// Apply an admin submission.
    pub fn upsert(&self, submission: &Submission) -> Result<UpsertOutcome, ServiceError> {
        let mut store = self.load()?;
        let outcome = upsert_entry(&mut store.entries, submission)?;
        self.save(&store)?;
        Ok(outcome)
    }

    /// Apply the submission stored at `path`, then rename it to
    /// `processed-<name>` so it is not applied twice.
    pub fn apply_submission(&self, path: &Path) -> Result<AppliedSubmission, ServiceError> {
        let submission_error = |source| ServiceError::Submission {
            path: path.to_path_buf(),
            source,
        };

        let name = path.file_name().ok_or_else(|| {
            submission_error(io::Error::new(io::ErrorKind::InvalidInput, "not a file"))
        })?;
        let text = fs::read_to_string(path).map_err(submission_error)?;
        let submission = Submission::from_json(&text)?;
        let outcome = self.upsert(&submission)?;

        let mut processed_name = std::ffi::OsString::from("processed-");
        processed_name.push(name);
        let processed = path.with_file_name(processed_name);
        fs::rename(path, &processed).map_err(submission_error)?;
        info!("Renamed {} to {}", path.display(), processed.display());

        Ok(AppliedSubmission { outcome, processed })
    }
}
