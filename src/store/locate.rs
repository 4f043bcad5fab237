//! Finding the structured literals embedded in the data file.

use std::ops::Range;

/// Return the text from the first `[` to the last `]`, inclusive.
///
/// Uses the last occurrence rather than bracket counting, so any `]` that
/// follows the array (another declaration, a comment) widens the span.
/// Returns an empty string when either bracket is missing.
pub fn locate_array(text: &str) -> &str {
    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => "",
    }
}

/// A `var <name> = <literal>;` statement located in the data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Byte offset of the declaration keyword.
    pub start: usize,
    /// Byte range of the array or object literal.
    pub literal: Range<usize>,
}

impl Declaration {
    pub fn literal<'a>(&self, text: &'a str) -> &'a str {
        &text[self.literal.clone()]
    }
}

const KEYWORDS: [&str; 3] = ["var", "let", "const"];

/// Locate the declaration of `name` by its marker line.
///
/// The literal runs from the opening bracket after `=` to the first line that
/// consists of the matching `];` or `};` terminator. A literal that opens and
/// closes on the declaration line is accepted too.
pub fn locate_declaration(text: &str, name: &str) -> Option<Declaration> {
    let start = KEYWORDS
        .iter()
        .filter_map(|kw| find_marker(text, &format!("{kw} {name}")))
        .min()?;

    let after_marker = start + text[start..].find('=')? + 1;
    let open_offset = text[after_marker..].find(|c: char| !c.is_whitespace())?;
    let open = after_marker + open_offset;

    let terminator = match text[open..].chars().next()? {
        '[' => "];",
        '{' => "};",
        _ => return None,
    };

    let mut line_start = open;
    for (index, line) in text[open..].split_inclusive('\n').enumerate() {
        let trimmed = line.trim_end();
        let terminated = if index == 0 {
            trimmed.ends_with(terminator)
        } else {
            trimmed.trim_start() == terminator
        };
        if terminated {
            // Offset of the `;`; the literal ends just before it.
            let close = line_start + trimmed.len() - 1;
            return Some(Declaration {
                start,
                literal: open..close,
            });
        }
        line_start += line.len();
    }

    None
}

/// Find `marker` where it starts a statement and is followed by `=`.
fn find_marker(text: &str, marker: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(found) = text[from..].find(marker) {
        let at = from + found;
        let boundary_before = text[..at]
            .chars()
            .next_back()
            .map_or(true, |c| c.is_whitespace() || c == ';');
        let rest = text[at + marker.len()..].trim_start();
        if boundary_before && rest.starts_with('=') {
            return Some(at);
        }
        from = at + marker.len();
    }
    None
}
