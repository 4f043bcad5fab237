//! Rendering a [`DataStore`] back into the JavaScript data file.
//!
//! The page locates its data by the `var <name> = ` markers, so the shape
//! emitted here is fixed: a comment header, one declaration per table, each
//! ending in `;`, and optionally the `window.<name>` exports.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value};

use super::{DataStore, StoreError};
use crate::models::TimelineEntry;

const CITATIONS_COMMENT: &str = "// Citation sources with URLs";
const CATEGORIES_COMMENT: &str = "// Category definitions";
const EXPORTS_COMMENT: &str = "// Make data globally accessible";

/// Pretty-print with 2-space indentation, leaving non-ASCII text unescaped.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"  ");
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    // serde_json only ever writes valid UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Entries as JSON objects, each in the key order it was read with.
fn entry_maps(store: &DataStore) -> Result<Vec<Map<String, Value>>, StoreError> {
    store
        .entries
        .iter()
        .map(TimelineEntry::to_map)
        .collect::<Result<_, _>>()
        .map_err(StoreError::Serialize)
}

/// Render the whole data file.
pub fn render(store: &DataStore) -> Result<String, StoreError> {
    let layout = &store.layout;
    let mut out = String::new();

    out.push_str(&format!("// {}\n", layout.header));
    out.push_str(&format!(
        "var {} = {};\n",
        layout.data_var,
        to_pretty_json(&entry_maps(store)?).map_err(StoreError::Serialize)?
    ));

    if let Some(citations) = &store.citations {
        out.push_str(&format!(
            "\n{}\nvar {} = {};\n",
            CITATIONS_COMMENT,
            layout.citations_var,
            to_pretty_json(citations).map_err(StoreError::Serialize)?
        ));
    }

    if let Some(categories) = &store.categories {
        out.push_str(&format!(
            "\n{}\nvar {} = {};\n",
            CATEGORIES_COMMENT,
            layout.categories_var,
            to_pretty_json(categories).map_err(StoreError::Serialize)?
        ));
    }

    if layout.export_globals {
        out.push_str(EXPORTS_COMMENT);
        out.push('\n');
        for name in declared_names(store) {
            out.push_str(&format!("window.{name} = {name};\n"));
        }
    }

    Ok(out)
}

fn declared_names(store: &DataStore) -> Vec<&str> {
    let layout = &store.layout;
    let mut names = vec![layout.data_var.as_str()];
    if store.citations.is_some() {
        names.push(&layout.citations_var);
    }
    if store.categories.is_some() {
        names.push(&layout.categories_var);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Citation, CitationSource, TimelineEntry};
    use crate::store::StoreLayout;

    fn store() -> DataStore {
        let entry = TimelineEntry::new("1854", "Crystal Palace Opens")
            .with_description("Caf\u{e9} society<sup>1</sup>")
            .with_category("Culture");
        DataStore::new(StoreLayout::default(), vec![entry])
    }

    #[test]
    fn test_render_entries_only() {
        let text = render(&store()).unwrap();
        let expected = "// Timeline data with full content - Updated with research findings and citations\n\
var timelineData = [\n  {\n    \"date\": \"1854\",\n    \"title\": \"Crystal Palace Opens\",\n    \"description\": \"Caf\u{e9} society<sup>1</sup>\",\n    \"category\": \"Culture\"\n  }\n];\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_with_citation_index() {
        let mut store = store();
        store.citations = Some(vec![Citation::new(
            1,
            &CitationSource::new("Illustrated London News, 1854"),
        )]);

        let text = render(&store).unwrap();
        assert!(text.contains(
            "];\n\n// Citation sources with URLs\nvar timelineCitations = [\n  {\n    \"number\": \"1\",\n    \"source\": \"Illustrated London News, 1854\"\n  }\n];\n"
        ));
    }

    #[test]
    fn test_render_exports() {
        let mut store = store();
        store.layout.export_globals = true;
        store.citations = Some(Vec::new());

        let text = render(&store).unwrap();
        assert!(text.contains("var timelineCitations = [];\n"));
        assert!(text.ends_with(
            "// Make data globally accessible\nwindow.timelineData = timelineData;\nwindow.timelineCitations = timelineCitations;\n"
        ));
    }
}
