//! Best-effort recovery of hand-edited data literals.
//!
//! The data file is edited by hand and pasted from word processors, so it
//! regularly picks up typographic quotes, ellipsis glyphs, bare property names
//! and unescaped quotes inside string values. The passes here are line-oriented
//! heuristics, not a tokenizer: a multi-line string value or a value containing
//! `": "` can still come out wrong. Everything they produce goes back through a
//! strict parse before it is trusted.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::StoreError;

/// Typographic punctuation and its plain replacement.
const PUNCTUATION: &[(&str, &str)] = &[
    ("\u{201C}", "\""),
    ("\u{201D}", "\""),
    ("\u{2033}", "\""),
    ("\u{2018}", "'"),
    ("\u{2019}", "'"),
    ("\u{2032}", "'"),
    ("\u{2026}", "..."),
    // UTF-8 ellipsis decoded as Windows-1252
    ("\u{E2}\u{20AC}\u{A6}", "..."),
];

static BARE_PROPERTY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^(\s*)(imageCaptionHTML|imageCaption|images|image|description|citations|category|title|date|icon)\s*:",
    )
    .expect("valid bare property regex")
});

static STRING_PROPERTY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(\s*"[^"]+"\s*:\s*)"(.*)("\s*,?\s*)$"#).expect("valid string property regex")
});

/// How a literal made it through [`parse_with_repair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Parsed as-is.
    Strict,
    /// Parsed only after [`repair`].
    Repaired,
}

/// Replace typographic quotes and ellipsis glyphs with plain equivalents.
pub fn normalize_punctuation(text: &str) -> String {
    PUNCTUATION
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Number of typographic characters [`normalize_punctuation`] would replace.
pub fn punctuation_count(text: &str) -> usize {
    PUNCTUATION
        .iter()
        .map(|(from, _)| text.matches(from).count())
        .sum()
}

/// Quote known property names written as bare JavaScript identifiers.
pub fn quote_property_names(text: &str) -> String {
    BARE_PROPERTY_RE
        .replace_all(text, r#"${1}"${2}":"#)
        .into_owned()
}

/// Escape stray `"` characters inside single-line `"key": "value"` pairs,
/// leaving the delimiting quotes alone.
pub fn escape_inner_quotes(text: &str) -> String {
    text.split('\n')
        .map(|line| match STRING_PROPERTY_RE.captures(line) {
            Some(caps) => format!(
                "{}\"{}{}",
                &caps[1],
                escape_unescaped_quotes(&caps[2]),
                &caps[3]
            ),
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_unescaped_quotes(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    let mut backslashes = 0usize;
    for c in value.chars() {
        if c == '"' && backslashes % 2 == 0 {
            out.push('\\');
        }
        backslashes = if c == '\\' { backslashes + 1 } else { 0 };
        out.push(c);
    }
    out
}

/// Run every repair pass in order.
pub fn repair(text: &str) -> String {
    let text = normalize_punctuation(text);
    let text = quote_property_names(&text);
    escape_inner_quotes(&text)
}

/// Parse strictly, falling back to [`repair`] and a second strict parse.
pub fn parse_with_repair<T: DeserializeOwned>(literal: &str) -> Result<(T, Recovery), StoreError> {
    let strict = match serde_json::from_str(literal) {
        Ok(value) => return Ok((value, Recovery::Strict)),
        Err(e) => e,
    };
    debug!("Strict parse failed ({}), attempting repair", strict);

    let repaired_text = repair(literal);
    match serde_json::from_str(&repaired_text) {
        Ok(value) => {
            warn!("Data literal needed repair before it would parse: {}", strict);
            Ok((value, Recovery::Repaired))
        }
        Err(repaired) => Err(StoreError::Unrepairable { strict, repaired }),
    }
}
