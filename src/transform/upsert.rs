//! Applying entry submissions from the admin form.
//!
//! Submissions arrive as JSON in one of two shapes: the current one carries
//! the whole entry in `entryData` (an object, or a JSON string holding one);
//! the legacy one has flat form fields with comma-separated citations.

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::models::TimelineEntry;

#[derive(Debug, thiserror::Error)]
pub enum UpsertError {
    #[error("invalid submission JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("submission has no entry title")]
    MissingTitle,
}

/// An admin-form submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub update_type: Option<String>,
    pub original_date: Option<String>,
    pub original_entry_date: Option<String>,
    pub entry_data: Option<Value>,
    // Legacy form fields.
    pub date: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub importance: Option<String>,
    pub icon: Option<String>,
    pub citations: Option<String>,
    pub image_urls: Option<String>,
    pub image_captions: Option<String>,
}

impl Submission {
    pub fn from_json(text: &str) -> Result<Self, UpsertError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Whether the submission edits an existing entry rather than adding one.
    pub fn is_update(&self) -> bool {
        matches!(
            self.update_type.as_deref(),
            Some("update") | Some("Update Entry")
        )
    }

    /// Date of the entry being edited.
    pub fn original_date(&self) -> Option<&str> {
        self.original_date
            .as_deref()
            .or(self.original_entry_date.as_deref())
    }

    /// Build the submitted entry.
    pub fn entry(&self) -> Result<TimelineEntry, UpsertError> {
        let entry = match &self.entry_data {
            Some(Value::String(raw)) => TimelineEntry::from_map(serde_json::from_str(raw)?)?,
            Some(Value::Object(map)) => TimelineEntry::from_map(map.clone())?,
            Some(value) => serde_json::from_value(value.clone())?,
            None => self.legacy_entry(),
        };
        if entry.title.trim().is_empty() {
            return Err(UpsertError::MissingTitle);
        }
        Ok(entry)
    }

    fn legacy_entry(&self) -> TimelineEntry {
        let mut entry = TimelineEntry::new(
            self.date.clone().unwrap_or_default(),
            self.title.clone().unwrap_or_default(),
        );
        entry.description = self.description.clone().unwrap_or_default();
        entry.category = self.category.clone();
        if let Some(importance) = &self.importance {
            entry
                .extra
                .insert("importance".to_string(), Value::String(importance.clone()));
        }
        if let Some(icon) = &self.icon {
            entry.extra.insert("icon".to_string(), Value::String(icon.clone()));
        }

        if let Some(raw) = &self.citations {
            let numbers: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
            if !numbers.is_empty() {
                entry.citations = Some(numbers);
            }
        }

        if let Some(urls) = self.image_urls.as_ref().filter(|u| !u.is_empty()) {
            entry.image = Some(urls.clone());
            entry.image_caption = self.image_captions.clone().filter(|c| !c.is_empty());
        }
        entry
    }
}

/// Where a submitted entry ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Replaced the first entry whose date equals the original date.
    Replaced { index: usize },
    /// Appended to the end of the timeline. `fallback` is set when an
    /// update was requested but no entry had the original date.
    Appended { fallback: bool },
}

/// Apply a submission to the entry list.
pub fn upsert_entry(
    entries: &mut Vec<TimelineEntry>,
    submission: &Submission,
) -> Result<UpsertOutcome, UpsertError> {
    let entry = submission.entry()?;

    let original = submission.original_date().filter(|_| submission.is_update());
    let Some(original) = original else {
        info!("Adding new entry: {} ({})", entry.title, entry.date);
        entries.push(entry);
        return Ok(UpsertOutcome::Appended { fallback: false });
    };

    match entries.iter().position(|e| e.date == original) {
        Some(index) => {
            info!("Updating entry with date {}: {}", original, entry.title);
            entries[index] = entry;
            Ok(UpsertOutcome::Replaced { index })
        }
        None => {
            warn!("No entry found with date {}, adding as new entry", original);
            entries.push(entry);
            Ok(UpsertOutcome::Appended { fallback: true })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<TimelineEntry> {
        vec![
            TimelineEntry::new("1854", "Crystal Palace Opens"),
            TimelineEntry::new("1858", "The Great Stink"),
        ]
    }

    #[test]
    fn test_update_replaces_matching_date() {
        let submission = Submission::from_json(
            r#"{"updateType": "Update Entry", "originalEntryDate": "1858",
                "entryData": "{\"date\": \"1858\", \"title\": \"The Great Stink & River Effra\", \"icon\": \"river\"}"}"#,
        )
        .unwrap();

        let mut entries = entries();
        let outcome = upsert_entry(&mut entries, &submission).unwrap();

        assert_eq!(outcome, UpsertOutcome::Replaced { index: 1 });
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].title, "The Great Stink & River Effra");
        assert_eq!(entries[1].extra["icon"], "river");
    }

    #[test]
    fn test_update_without_match_appends() {
        let submission = Submission::from_json(
            r#"{"updateType": "update", "originalDate": "1999",
                "entryData": {"date": "1999", "title": "New"}}"#,
        )
        .unwrap();

        let mut entries = entries();
        let outcome = upsert_entry(&mut entries, &submission).unwrap();
        assert_eq!(outcome, UpsertOutcome::Appended { fallback: true });
        assert_eq!(entries[2].title, "New");
    }

    #[test]
    fn test_legacy_submission() {
        let submission = Submission::from_json(
            r#"{"updateType": "new", "date": "2019", "title": "First Gipsy Hill Village Fete",
                "description": "Held on the green.", "category": "Community", "icon": "tent",
                "citations": "12, 13,", "imageUrls": "images/fete.jpg", "imageCaptions": "The fete"}"#,
        )
        .unwrap();

        let mut entries = entries();
        assert_eq!(
            upsert_entry(&mut entries, &submission).unwrap(),
            UpsertOutcome::Appended { fallback: false }
        );

        let added = &entries[2];
        assert_eq!(added.category.as_deref(), Some("Community"));
        assert_eq!(added.citations, Some(vec!["12".to_string(), "13".to_string()]));
        assert_eq!(added.image.as_deref(), Some("images/fete.jpg"));
        assert_eq!(added.image_caption.as_deref(), Some("The fete"));
        assert_eq!(added.extra["icon"], "tent");
    }

    #[test]
    fn test_legacy_empty_caption_is_dropped() {
        let submission = Submission::from_json(
            r#"{"date": "2020", "title": "British Railways Sign Returns Home",
                "imageUrls": "images/sign.jpg", "imageCaptions": ""}"#,
        )
        .unwrap();

        let entry = submission.entry().unwrap();
        assert_eq!(entry.image.as_deref(), Some("images/sign.jpg"));
        assert!(entry.image_caption.is_none());
        assert!(!entry.to_map().unwrap().contains_key("imageCaption"));
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let submission = Submission::from_json(r#"{"date": "2019"}"#).unwrap();
        assert!(matches!(
            upsert_entry(&mut entries(), &submission),
            Err(UpsertError::MissingTitle)
        ));
    }
}
