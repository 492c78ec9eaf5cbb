//! Notes and comments attached to nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a note and how serious it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteCategory {
    /// An identifier was corrected.
    IdentifierFix,
    /// An identifier could not be associated with anything in scope.
    IdentifierError,
    /// Resolution trace, hidden by default.
    IdentifierTrace,
    /// The writer had no target form for a construct.
    Rendering,
    /// A construct was translated with a behavioral caveat.
    Rewrite,
    /// A construct could not be translated.
    RewriteError,
}

impl NoteCategory {
    pub const ALL: [NoteCategory; 6] = [
        NoteCategory::IdentifierFix,
        NoteCategory::IdentifierError,
        NoteCategory::IdentifierTrace,
        NoteCategory::Rendering,
        NoteCategory::Rewrite,
        NoteCategory::RewriteError,
    ];

    /// Notes that make the output untrustworthy as-is.
    pub fn is_error(self) -> bool {
        matches!(self, NoteCategory::Rendering | NoteCategory::RewriteError)
    }

    pub fn label(self) -> &'static str {
        match self {
            NoteCategory::IdentifierFix => "identifier",
            NoteCategory::IdentifierError => "identifier error",
            NoteCategory::IdentifierTrace => "identifier trace",
            NoteCategory::Rendering => "rendering",
            NoteCategory::Rewrite => "translation",
            NoteCategory::RewriteError => "translation error",
        }
    }
}

impl fmt::Display for NoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Note {
    pub category: NoteCategory,
    pub text: String,
}

impl Note {
    pub fn new(category: NoteCategory, text: impl Into<String>) -> Self {
        Self {
            category,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    SingleLine,
    MultiLine,
}

/// A source comment token, kept verbatim including its delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
    pub starts_new_line: bool,
    pub text: String,
    /// Token position in the source; identifies the comment across re-attachments.
    pub token_index: usize,
}

impl Comment {
    pub fn single(text: impl Into<String>, token_index: usize) -> Self {
        Self {
            kind: CommentKind::SingleLine,
            starts_new_line: true,
            text: text.into(),
            token_index,
        }
    }

    pub fn multi(text: impl Into<String>, token_index: usize) -> Self {
        Self {
            kind: CommentKind::MultiLine,
            starts_new_line: false,
            text: text.into(),
            token_index,
        }
    }
}
