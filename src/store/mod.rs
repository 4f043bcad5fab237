//! The timeline data store: a JavaScript file holding the entry array and
//! the tables derived from it.
//!
//! Every editor runs the same pipeline once:
//! load → locate → parse (with repair) → edit → serialize → write.
//! There is no incremental update; the file is rewritten wholesale.

pub mod locate;
pub mod repair;
pub mod serialize;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::models::{Category, Citation, TimelineEntry};
pub use locate::{locate_array, locate_declaration, Declaration};
pub use repair::{parse_with_repair, repair, Recovery};
pub use serialize::{render, to_pretty_json};

/// Default comment written on the first line of the data file.
pub const DEFAULT_HEADER: &str =
    "Timeline data with full content - Updated with research findings and citations";

/// Errors raised while loading or saving the data store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no {marker} literal found in data file")]
    LiteralNotFound { marker: String },

    #[error("invalid data literal: {0}")]
    Parse(#[from] serde_json::Error),

    /// Both the strict parse and the parse of the repaired text failed.
    #[error("data literal could not be repaired (strict: {strict}; after repair: {repaired})")]
    Unrepairable {
        strict: serde_json::Error,
        repaired: serde_json::Error,
    },

    #[error("failed to serialize data: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Names and boilerplate of the generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    pub header: String,
    pub data_var: String,
    pub citations_var: String,
    pub categories_var: String,
    /// Append `window.<name> = <name>;` for each declared table.
    pub export_globals: bool,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.to_string(),
            data_var: "timelineData".to_string(),
            citations_var: "timelineCitations".to_string(),
            categories_var: "timelineCategories".to_string(),
            export_globals: false,
        }
    }
}

/// In-memory copy of the data file.
#[derive(Debug, Clone, PartialEq)]
pub struct DataStore {
    pub layout: StoreLayout,
    pub entries: Vec<TimelineEntry>,
    /// The numbered citation index, when the file has one.
    pub citations: Option<Vec<Citation>>,
    /// Category definitions keyed by label, in file order.
    pub categories: Option<IndexMap<String, Category>>,
    /// Whether any literal needed repair to parse.
    pub repaired: bool,
}

impl DataStore {
    pub fn new(layout: StoreLayout, entries: Vec<TimelineEntry>) -> Self {
        Self {
            layout,
            entries,
            citations: None,
            categories: None,
            repaired: false,
        }
    }

    /// Parse the text of a data file.
    ///
    /// The entry array is found by its declaration marker, falling back to
    /// the first `[` / last `]` span for files without one. The citation
    /// index and category table are optional.
    pub fn parse(text: &str, layout: StoreLayout) -> Result<Self, StoreError> {
        let literal = match locate_declaration(text, &layout.data_var) {
            Some(decl) => decl.literal(text),
            None => {
                debug!("No `{}` declaration, using bracket span", layout.data_var);
                locate_array(text)
            }
        };
        if literal.is_empty() {
            return Err(StoreError::LiteralNotFound {
                marker: layout.data_var.clone(),
            });
        }

        let (records, recovery) = parse_with_repair::<Vec<Map<String, Value>>>(literal)?;
        let entries = records
            .into_iter()
            .map(TimelineEntry::from_map)
            .collect::<Result<Vec<_>, _>>()?;
        let mut repaired = recovery == Recovery::Repaired;

        let citations = parse_optional::<Vec<Citation>>(text, &layout.citations_var, &mut repaired)?;
        let categories = parse_optional::<IndexMap<String, Category>>(
            text,
            &layout.categories_var,
            &mut repaired,
        )?;

        Ok(Self {
            layout,
            entries,
            citations,
            categories,
            repaired,
        })
    }

    /// Load and parse the data file at `path`.
    pub fn load(path: &Path, layout: StoreLayout) -> Result<Self, StoreError> {
        let text = read_store(path)?;
        let store = Self::parse(&text, layout)?;
        info!(
            "Loaded {} entries from {}",
            store.entries.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn render(&self) -> Result<String, StoreError> {
        render(self)
    }

    /// Serialize and overwrite the data file at `path`.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let text = self.render()?;
        write_store(path, &text)?;
        info!("Wrote {} entries to {}", self.entries.len(), path.display());
        Ok(())
    }
}

fn parse_optional<T: DeserializeOwned>(
    text: &str,
    name: &str,
    repaired: &mut bool,
) -> Result<Option<T>, StoreError> {
    let Some(decl) = locate_declaration(text, name) else {
        return Ok(None);
    };
    let (value, recovery) = parse_with_repair(decl.literal(text))?;
    *repaired |= recovery == Recovery::Repaired;
    Ok(Some(value))
}

/// Read the whole data file into memory.
pub fn read_store(path: &Path) -> Result<String, StoreError> {
    fs::read_to_string(path).map_err(|e| StoreError::io(path, e))
}

/// Replace the data file with `text`.
///
/// The text is staged in a temporary file next to the target and renamed
/// over it, so an interrupted run leaves the old file intact.
pub fn write_store(path: &Path, text: &str) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    staged
        .write_all(text.as_bytes())
        .and_then(|_| staged.as_file().sync_all())
        .map_err(|e| StoreError::io(staged.path(), e))?;
    staged
        .persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = r#"// Timeline data
var timelineData = [
{
"date": "1854",
"title": "Crystal Palace Opens",
"description": "Moved from Hyde Park.<sup>3</sup>",
"icon": "palace",
"citations": ["3"]
}
];

// Enhanced citation sources
var timelineCitations = [
  {
    "number": "3",
    "source": "Crystal Palace Company Records",
    "url": "https://www.crystalpalacefoundation.org.uk/"
  }
];
// Make data globally accessible
window.timelineData = timelineData;
window.timelineCitations = timelineCitations;
"#;

    #[test]
    fn test_parse_finds_both_declarations() {
        let store = DataStore::parse(FILE, StoreLayout::default()).unwrap();
        assert_eq!(store.entries.len(), 1);
        assert_eq!(store.entries[0].extra["icon"], "palace");
        let citations = store.citations.unwrap();
        assert_eq!(citations[0].number.get(), 3);
        assert!(store.categories.is_none());
        assert!(!store.repaired);
    }

    #[test]
    fn test_parse_without_marker_uses_bracket_span() {
        let store = DataStore::parse(r#"[{"title": "Only"}]"#, StoreLayout::default()).unwrap();
        assert_eq!(store.entries[0].title, "Only");
    }

    #[test]
    fn test_parse_reports_missing_literal() {
        let err = DataStore::parse("// nothing here\n", StoreLayout::default()).unwrap_err();
        assert!(matches!(err, StoreError::LiteralNotFound { .. }));
    }

    #[test]
    fn test_save_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline-data.js");
        fs::write(&path, FILE).unwrap();

        let store = DataStore::load(&path, StoreLayout::default()).unwrap();
        store.save(&path).unwrap();

        let reloaded = DataStore::load(&path, StoreLayout::default()).unwrap();
        assert_eq!(reloaded.entries, store.entries);
        assert_eq!(reloaded.citations, store.citations);
        // No staging files left behind.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
