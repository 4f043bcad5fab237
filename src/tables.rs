//! Edit tables loaded from TOML files.
//!
//! Each editor is driven by a fixed table kept next to the data file
//! (`tables/` by default) rather than compiled into the binary.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::models::{Category, CitationSource};
use crate::transform::{CategoryAssignment, CitationTable, UrlReplacement};

pub const CITATIONS_FILE: &str = "citations.toml";
pub const ASSIGNMENTS_FILE: &str = "category-assignments.toml";
pub const CATEGORIES_FILE: &str = "categories.toml";
pub const IMAGE_URLS_FILE: &str = "image-urls.toml";

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("io error reading table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid table {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("duplicate category {name} in {path}")]
    DuplicateCategory { path: PathBuf, name: String },
}

#[derive(Debug, Deserialize)]
struct CitationsFile {
    #[serde(default)]
    entry: Vec<CitationRow>,
    /// Source renames applied after loading.
    #[serde(default)]
    rename: Vec<SourceRename>,
}

#[derive(Debug, Deserialize)]
struct CitationRow {
    date: String,
    sources: Vec<CitationSource>,
}

#[derive(Debug, Deserialize)]
struct SourceRename {
    from: String,
    to: String,
}

#[derive(Debug, Deserialize)]
struct AssignmentsFile {
    #[serde(default)]
    assign: Vec<CategoryAssignment>,
}

#[derive(Debug, Deserialize)]
struct CategoriesFile {
    #[serde(default)]
    category: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct ImageUrlsFile {
    #[serde(default)]
    replace: Vec<UrlReplacement>,
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T, TableError> {
    let text = fs::read_to_string(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text, path)
}

fn parse<T: DeserializeOwned>(text: &str, path: &Path) -> Result<T, TableError> {
    toml::from_str(text).map_err(|source| TableError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the date → sources citation table.
pub fn load_citation_table(path: &Path) -> Result<CitationTable, TableError> {
    let file: CitationsFile = load(path)?;
    let mut table: CitationTable = file
        .entry
        .into_iter()
        .map(|row| (row.date, row.sources))
        .collect();
    for rename in &file.rename {
        let n = table.rename_source(&rename.from, &rename.to);
        debug!("Renamed {} source(s) '{}' -> '{}'", n, rename.from, rename.to);
    }
    Ok(table)
}

pub fn load_category_assignments(path: &Path) -> Result<Vec<CategoryAssignment>, TableError> {
    let file: AssignmentsFile = load(path)?;
    Ok(file.assign)
}

/// Load the category definitions, keyed by name in file order.
pub fn load_category_table(path: &Path) -> Result<IndexMap<String, Category>, TableError> {
    let file: CategoriesFile = load(path)?;
    let mut table = IndexMap::with_capacity(file.category.len());
    for category in file.category {
        if table.contains_key(&category.name) {
            return Err(TableError::DuplicateCategory {
                path: path.to_path_buf(),
                name: category.name,
            });
        }
        table.insert(category.name.clone(), category);
    }
    Ok(table)
}

pub fn load_image_replacements(path: &Path) -> Result<Vec<UrlReplacement>, TableError> {
    let file: ImageUrlsFile = load(path)?;
    Ok(file.replace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_table_with_rename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CITATIONS_FILE);
        fs::write(
            &path,
            r#"
[[entry]]
date = "1854"
sources = [
  { source = "Crystal Palace Company Records", url = "https://www.crystalpalacefoundation.org.uk/" },
  { source = "Friends of Gipsy Hill Archives" },
]

[[rename]]
from = "Friends of Gipsy Hill Archives"
to = "Friends of Gipsy Hill Research (Numerous Sources)"
"#,
        )
        .unwrap();

        let table = load_citation_table(&path).unwrap();
        let sources = table.get("1854").unwrap();
        assert_eq!(sources.len(), 2);
        assert!(sources[0].url.is_some());
        assert_eq!(sources[1].source, "Friends of Gipsy Hill Research (Numerous Sources)");
        assert!(sources[1].url.is_none());
    }

    #[test]
    fn test_category_table_keeps_order_and_rejects_duplicates() {
        let text = r##"
[[category]]
name = "Railway"
color = "#E74C3C"
lightColor = "#EC7063"
description = "Railway development and transport"

[[category]]
name = "Culture"
color = "#9B59B6"
lightColor = "#BB7FCF"
description = "Cultural events and entertainment"
"##;
        let file: CategoriesFile = parse(text, Path::new("categories.toml")).unwrap();
        assert_eq!(file.category[1].light_color, "#BB7FCF");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CATEGORIES_FILE);
        fs::write(&path, text).unwrap();
        let table = load_category_table(&path).unwrap();
        let names: Vec<&str> = table.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Railway", "Culture"]);

        fs::write(&path, format!("{text}{}", text.split("\n\n").next().unwrap())).unwrap();
        assert!(matches!(
            load_category_table(&path),
            Err(TableError::DuplicateCategory { .. })
        ));
    }

    #[test]
    fn test_missing_table_is_io_error() {
        let err = load_image_replacements(Path::new("/nonexistent/image-urls.toml")).unwrap_err();
        assert!(matches!(err, TableError::Io { .. }));
    }
}
