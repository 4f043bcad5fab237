//! Records held in the timeline data store.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// One timeline record.
///
/// Fields the editors know about are typed; everything else (`icon`,
/// `importance`, `image2`, `image2Caption`, ...) is kept in `extra` in file
/// order so that a load/save cycle does not drop data. Entries read with
/// [`TimelineEntry::from_map`] also remember their key order, which
/// [`TimelineEntry::to_map`] replays.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    /// Free-form date text ("1854", "c. 1640", "1911 (May 12)").
    #[serde(default)]
    pub date: String,
    pub title: String,
    /// Rich text; may carry inline HTML and a trailing citation marker.
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<ImageField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_caption: Option<String>,
    #[serde(
        rename = "imageCaptionHTML",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image_caption_html: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Citation numbers referenced by the description marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip)]
    pub key_order: KeyOrder,
}

/// Key order of an entry as it was read.
///
/// Layout only: two entries with the same fields compare equal whatever
/// their key order.
#[derive(Debug, Clone, Default)]
pub struct KeyOrder(Vec<String>);

impl PartialEq for KeyOrder {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl TimelineEntry {
    pub fn new(date: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    /// Build an entry from a JSON object, remembering its key order.
    pub fn from_map(map: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let order = map.keys().cloned().collect();
        let mut entry: Self = serde_json::from_value(Value::Object(map))?;
        entry.key_order = KeyOrder(order);
        Ok(entry)
    }

    /// The entry as a JSON object, keys in the order it was read. Keys the
    /// entry did not have when read follow in field order.
    pub fn to_map(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let fields = match serde_json::to_value(self)? {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };

        let mut ordered = Map::with_capacity(fields.len());
        for key in &self.key_order.0 {
            if let Some(value) = fields.get(key) {
                ordered.insert(key.clone(), value.clone());
            }
        }
        for (key, value) in fields {
            if !ordered.contains_key(&key) {
                ordered.insert(key, value);
            }
        }
        Ok(ordered)
    }

    /// Whether the entry carries any picture at all.
    pub fn has_image(&self) -> bool {
        self.image.is_some() || self.images.is_some()
    }
}

/// The `images` field appears both as a single URL and as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageField {
    One(String),
    Many(Vec<String>),
}

impl ImageField {
    pub fn urls_mut(&mut self) -> Vec<&mut String> {
        match self {
            ImageField::One(url) => vec![url],
            ImageField::Many(urls) => urls.iter_mut().collect(),
        }
    }
}

/// A category label definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    pub color: String,
    pub light_color: String,
    pub description: String,
}

/// A source descriptor from a citation table, before it is numbered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationSource {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl CitationSource {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// How a citation number is written in the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberStyle {
    /// `"number": "12"`, which is what the page compares against.
    #[default]
    Text,
    /// `"number": 12`
    Integer,
}

/// A citation number that is written back in the style it was read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CitationNumber {
    value: u32,
    style: NumberStyle,
}

impl CitationNumber {
    pub fn new(value: u32, style: NumberStyle) -> Self {
        Self { value, style }
    }

    pub fn get(&self) -> u32 {
        self.value
    }

    pub fn style(&self) -> NumberStyle {
        self.style
    }

    pub fn with_style(self, style: NumberStyle) -> Self {
        Self { style, ..self }
    }
}

impl fmt::Display for CitationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl Serialize for CitationNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.style {
            NumberStyle::Text => serializer.collect_str(&self.value),
            NumberStyle::Integer => serializer.serialize_u32(self.value),
        }
    }
}

impl<'de> Deserialize<'de> for CitationNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self::new(n, NumberStyle::Integer)),
            Raw::Text(s) => s
                .trim()
                .parse()
                .map(|n| Self::new(n, NumberStyle::Text))
                .map_err(serde::de::Error::custom),
        }
    }
}

/// A numbered entry of the citation index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub number: CitationNumber,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Hand-maintained indexes carry extra notes (`timeline_entry`, `status`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Citation {
    pub fn new(number: u32, source: &CitationSource) -> Self {
        Self {
            number: CitationNumber::new(number, NumberStyle::default()),
            source: source.source.clone(),
            url: source.url.clone(),
            extra: Map::new(),
        }
    }
}
