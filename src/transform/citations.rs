//! Numbering sources and annotating entries with citation markers.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::models::{Citation, CitationSource, TimelineEntry};

static TRAILING_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<sup>[\d,\s]+</sup>$").expect("valid marker regex"));

/// Sources keyed by the exact `date` text of the entries they support.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CitationTable {
    sources: IndexMap<String, Vec<CitationSource>>,
}

impl CitationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: impl Into<String>, sources: Vec<CitationSource>) {
        self.sources.insert(date.into(), sources);
    }

    pub fn get(&self, date: &str) -> Option<&[CitationSource]> {
        self.sources.get(date).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Replace every source named `from` with `to`, keeping its URL.
    pub fn rename_source(&mut self, from: &str, to: &str) -> usize {
        let mut renamed = 0;
        for source in self.sources.values_mut().flatten() {
            if source.source == from {
                source.source = to.to_string();
                renamed += 1;
            }
        }
        renamed
    }
}

impl FromIterator<(String, Vec<CitationSource>)> for CitationTable {
    fn from_iter<I: IntoIterator<Item = (String, Vec<CitationSource>)>>(iter: I) -> Self {
        Self {
            sources: iter.into_iter().collect(),
        }
    }
}

/// Hands out citation numbers. Starts at 1 and never reuses a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CitationCounter {
    start: u32,
    next: u32,
}

impl Default for CitationCounter {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl CitationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(start: u32) -> Self {
        Self { start, next: start }
    }

    pub fn next_number(&mut self) -> u32 {
        let n = self.next;
        self.next += 1;
        n
    }

    /// How many numbers have been handed out.
    pub fn issued(&self) -> u32 {
        self.next - self.start
    }
}

/// Format the `<sup>1,2</sup>` marker for a list of citation numbers.
pub fn format_marker(numbers: &[u32]) -> String {
    let joined = numbers
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("<sup>{joined}</sup>")
}

/// Remove a trailing citation marker, if any. Trailing whitespace before the
/// marker is preserved; whitespace after it is dropped.
pub fn strip_marker(description: &str) -> &str {
    let trimmed = description.trim_end();
    match TRAILING_MARKER_RE.find(trimmed) {
        Some(m) => &trimmed[..m.start()],
        None => trimmed,
    }
}

/// Result of [`inject_citations`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CitationOutcome {
    /// Every numbered source, in the order numbers were assigned.
    pub index: Vec<Citation>,
    /// Entries that received a marker.
    pub annotated: usize,
}

/// Annotate every entry whose date is in `table`.
///
/// Each source gets the next number from `counter`, in entry order. The
/// entry's previous marker (if any) is replaced, its `citations` field is
/// set to the assigned numbers, and the numbered sources are returned as the
/// new citation index. Running this twice from a fresh counter on the same
/// entries gives the same result.
pub fn inject_citations(
    entries: &mut [TimelineEntry],
    table: &CitationTable,
    counter: &mut CitationCounter,
) -> CitationOutcome {
    let mut outcome = CitationOutcome::default();

    for entry in entries.iter_mut() {
        let Some(sources) = table.get(&entry.date) else {
            continue;
        };
        if sources.is_empty() {
            continue;
        }

        let numbers: Vec<u32> = sources
            .iter()
            .map(|source| {
                let number = counter.next_number();
                outcome.index.push(Citation::new(number, source));
                number
            })
            .collect();

        let marker = format_marker(&numbers);
        entry.description = format!("{}{}", strip_marker(&entry.description), marker);
        entry.citations = Some(numbers.iter().map(u32::to_string).collect());
        outcome.annotated += 1;

        debug!("{} ({}): {}", entry.title, entry.date, marker);
    }

    outcome
}
