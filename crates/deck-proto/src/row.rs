//! The uniform row model every source renders into.

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

/// Opaque item handle: a video id, URL or file path. Only adapters and
/// process launchers look inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference(pub String);

impl Reference {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    /// Nothing to act on (text post, unrecognised embed).
    None,
    Playable,
    Downloadable,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub display: String,
    pub item_ref: Option<Reference>,
    pub kind: RowKind,
}

impl Row {
    pub fn new(display: impl Into<String>, item_ref: Option<Reference>, kind: RowKind) -> Self {
        Self {
            display: display.into(),
            item_ref,
            kind,
        }
    }
}

/// Truncate `text` to at most `width` terminal columns, then pad with spaces
/// to exactly `width` columns.
pub fn fit_width(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut used = 0usize;
    for ch in text.chars() {
        if ch.is_control() {
            continue;
        }
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.extend(std::iter::repeat(' ').take(width - used));
    out
}

/// Join fixed-width columns with single spaces. The last column is not padded
/// so rows don't carry trailing whitespace past the title.
pub fn format_columns(columns: &[(&str, usize)]) -> String {
    let mut line = String::new();
    for (i, (text, width)) in columns.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        let cell = fit_width(text, *width);
        if i + 1 == columns.len() {
            line.push_str(cell.trim_end());
        } else {
            line.push_str(&cell);
        }
    }
    line
}
