//! Category reassignment and category-table replacement.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{Category, TimelineEntry};
use crate::store::DataStore;

/// Move the entry titled `title` into `category`.
///
/// `date` is only used to tell apart entries sharing a title, or to confirm
/// a loose title match; it may be a fragment such as `1870` for `1870s`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAssignment {
    pub title: String,
    pub date: String,
    pub category: String,
}

impl CategoryAssignment {
    pub fn new(title: &str, date: &str, category: &str) -> Self {
        Self {
            title: title.to_string(),
            date: date.to_string(),
            category: category.to_string(),
        }
    }
}

/// What happened to one assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentStatus {
    /// Category changed on the matched entries.
    Updated { previous: Vec<Option<String>> },
    /// Matched entries already had the category.
    Unchanged,
    /// No entry matched, or several did and the date did not narrow them.
    NotFound,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentReport {
    pub results: Vec<(CategoryAssignment, AssignmentStatus)>,
}

impl AssignmentReport {
    pub fn updated(&self) -> impl Iterator<Item = &CategoryAssignment> {
        self.with_status(|s| matches!(s, AssignmentStatus::Updated { .. }))
    }

    pub fn unchanged(&self) -> impl Iterator<Item = &CategoryAssignment> {
        self.with_status(|s| *s == AssignmentStatus::Unchanged)
    }

    pub fn not_found(&self) -> impl Iterator<Item = &CategoryAssignment> {
        self.with_status(|s| *s == AssignmentStatus::NotFound)
    }

    fn with_status<'a>(
        &'a self,
        pred: impl Fn(&AssignmentStatus) -> bool + 'a,
    ) -> impl Iterator<Item = &'a CategoryAssignment> + 'a {
        self.results
            .iter()
            .filter(move |(_, status)| pred(status))
            .map(|(assignment, _)| assignment)
    }
}

/// Apply each assignment to the parsed entries.
///
/// Entries are matched by exact title. When several share the title, only
/// those whose date contains the assignment's date are kept. When no title
/// matches exactly, a case- and punctuation-insensitive title match is tried,
/// and it must also agree on the date. Unmatched assignments are reported,
/// never fatal.
pub fn assign_categories(
    entries: &mut [TimelineEntry],
    assignments: &[CategoryAssignment],
) -> AssignmentReport {
    let mut report = AssignmentReport::default();

    for assignment in assignments {
        let targets = find_targets(entries, assignment);
        let status = if targets.is_empty() {
            debug!("No entry for {} ({})", assignment.title, assignment.date);
            AssignmentStatus::NotFound
        } else {
            let mut previous = Vec::new();
            for &i in &targets {
                let entry = &mut entries[i];
                if entry.category.as_deref() != Some(assignment.category.as_str()) {
                    previous.push(entry.category.replace(assignment.category.clone()));
                }
            }
            if previous.is_empty() {
                AssignmentStatus::Unchanged
            } else {
                AssignmentStatus::Updated { previous }
            }
        };
        report.results.push((assignment.clone(), status));
    }

    report
}

fn find_targets(entries: &[TimelineEntry], assignment: &CategoryAssignment) -> Vec<usize> {
    let exact: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.title == assignment.title)
        .map(|(i, _)| i)
        .collect();

    if exact.len() == 1 {
        return exact;
    }

    let wanted = normalize_title(&assignment.title);
    let candidates: Vec<usize> = if exact.is_empty() {
        entries
            .iter()
            .enumerate()
            .filter(|(_, e)| normalize_title(&e.title) == wanted)
            .map(|(i, _)| i)
            .collect()
    } else {
        exact
    };

    candidates
        .into_iter()
        .filter(|&i| entries[i].date.contains(&assignment.date))
        .collect()
}

fn normalize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{2013}' | '\u{2014}' => '-',
            c => c,
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Labels dropped and added by a category-table replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTableChange {
    pub dropped: Vec<String>,
    pub added: Vec<String>,
}

/// Replace the store's category table wholesale.
///
/// This is not a merge: labels missing from `table` are gone afterwards.
pub fn replace_category_table(
    store: &mut DataStore,
    table: IndexMap<String, Category>,
) -> CategoryTableChange {
    let old = store.categories.take().unwrap_or_default();
    let change = CategoryTableChange {
        dropped: old
            .keys()
            .filter(|k| !table.contains_key(*k))
            .cloned()
            .collect(),
        added: table
            .keys()
            .filter(|k| !old.contains_key(*k))
            .cloned()
            .collect(),
    };
    info!(
        "Category table replaced: {} labels ({} dropped, {} added)",
        table.len(),
        change.dropped.len(),
        change.added.len()
    );
    store.categories = Some(table);
    change
}

/// Entries whose category has no definition in `table`.
pub fn undefined_categories<'a>(
    entries: &'a [TimelineEntry],
    table: &IndexMap<String, Category>,
) -> Vec<&'a TimelineEntry> {
    entries
        .iter()
        .filter(|e| matches!(&e.category, Some(c) if !table.contains_key(c)))
        .collect()
}
