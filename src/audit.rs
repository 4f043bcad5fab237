//! Read-only consistency reports over the data store.

use std::collections::{BTreeSet, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Citation, TimelineEntry};

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("valid year regex"));

/// Default cutoff for the image coverage report: later entries are skipped.
pub const DEFAULT_IMAGE_YEAR_CUTOFF: u32 = 2000;

/// A citation number referenced by an entry but absent from the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingCitation {
    pub citation: String,
    pub date: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CitationAudit {
    /// Index entries no timeline entry refers to.
    pub orphaned: Vec<Citation>,
    pub missing: Vec<MissingCitation>,
    pub defined: usize,
    /// Distinct citation numbers referenced by entries.
    pub in_use: usize,
}

impl CitationAudit {
    pub fn is_clean(&self) -> bool {
        self.orphaned.is_empty() && self.missing.is_empty()
    }
}

/// Cross-check the `citations` fields of entries against the index.
pub fn audit_citations(entries: &[TimelineEntry], index: &[Citation]) -> CitationAudit {
    let used: BTreeSet<String> = entries
        .iter()
        .filter_map(|e| e.citations.as_ref())
        .flatten()
        .map(|c| c.trim().to_string())
        .collect();

    let defined: HashSet<String> = index.iter().map(|c| c.number.to_string()).collect();

    let orphaned = index
        .iter()
        .filter(|c| !used.contains(&c.number.to_string()))
        .cloned()
        .collect();

    let missing = entries
        .iter()
        .flat_map(|e| {
            e.citations
                .iter()
                .flatten()
                .filter(|c| !defined.contains(c.trim()))
                .map(move |c| MissingCitation {
                    citation: c.clone(),
                    date: e.date.clone(),
                    title: e.title.clone(),
                })
        })
        .collect();

    CitationAudit {
        orphaned,
        missing,
        defined: index.len(),
        in_use: used.len(),
    }
}

/// Entries without any picture, excluding the ancient and modern eras.
///
/// Dates naming `AD` or the `11th-19th` span are skipped, as are dates whose
/// first four-digit year is after `year_cutoff`.
pub fn entries_without_images(entries: &[TimelineEntry], year_cutoff: u32) -> Vec<&TimelineEntry> {
    entries
        .iter()
        .filter(|e| !e.has_image())
        .filter(|e| !is_ancient(&e.date))
        .filter(|e| first_year(&e.date).map_or(true, |y| y <= year_cutoff))
        .collect()
}

fn is_ancient(date: &str) -> bool {
    let normalized = date.replace(['\u{2013}', '\u{2014}'], "-");
    normalized.contains("AD") || normalized.contains("11th-19th")
}

fn first_year(date: &str) -> Option<u32> {
    YEAR_RE.find(date).and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CitationSource;

    fn cited(date: &str, title: &str, numbers: &[&str]) -> TimelineEntry {
        let mut entry = TimelineEntry::new(date, title);
        entry.citations = Some(numbers.iter().map(|n| n.to_string()).collect());
        entry
    }

    #[test]
    fn test_audit_finds_orphans_and_missing() {
        let entries = vec![
            cited("1854", "Crystal Palace Opens", &["1", "2"]),
            cited("1858", "The Great Stink", &["2", "9"]),
        ];
        let index: Vec<Citation> = (1..=3)
            .map(|n| Citation::new(n, &CitationSource::new(format!("Source {n}"))))
            .collect();

        let audit = audit_citations(&entries, &index);
        assert_eq!(audit.orphaned.len(), 1);
        assert_eq!(audit.orphaned[0].number.get(), 3);
        assert_eq!(
            audit.missing,
            vec![MissingCitation {
                citation: "9".to_string(),
                date: "1858".to_string(),
                title: "The Great Stink".to_string(),
            }]
        );
        assert_eq!(audit.defined, 3);
        assert_eq!(audit.in_use, 3);
        assert!(!audit.is_clean());
    }

    #[test]
    fn test_entries_without_images() {
        let entries = vec![
            TimelineEntry::new("AD 43-410", "Roman Era"),
            TimelineEntry::new("11th\u{2013}19th Century", "The Great North Wood"),
            TimelineEntry::new("1854", "Crystal Palace Opens").with_image("images/palace.jpg"),
            TimelineEntry::new("1858", "The Great Stink"),
            TimelineEntry::new("17th Century", "Norwood Gypsies Settle"),
            TimelineEntry::new("2018", "Friends of Gipsy Hill Forms"),
        ];

        let titles: Vec<&str> = entries_without_images(&entries, DEFAULT_IMAGE_YEAR_CUTOFF)
            .into_iter()
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(titles, vec!["The Great Stink", "Norwood Gypsies Settle"]);
    }
}
