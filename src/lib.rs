//! # hana-translator
//!
//! Translates Microsoft T-SQL scripts into SAP HANA SQL / SQLScript.
//!
//! Translation is best effort. Whatever cannot be carried over exactly is
//! annotated with a note, written into the output as a `--` comment and
//! counted in the [`Summary`](summary::Summary). A translation with zero
//! errors can be run as-is.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use hana_translator::prelude::*;
//!
//! let translation = hana_translator::translate("select top 5 isnull(qty, 0) from OITM")?;
//! assert_eq!(translation.text, "SELECT TOP 5 IFNULL(qty, 0) FROM OITM;");
//! assert_eq!(translation.errors(), 0);
//! ```
//!
//! ## Pipeline
//!
//! | Stage        | Module                    |
//! |--------------|---------------------------|
//! | Placeholders | [`placeholder`]           |
//! | Parse        | [`lexer`], [`parser`]     |
//! | Rewrite      | [`modifier`]              |
//! | Identifiers  | [`fixer`]                 |
//! | Write        | [`writer`]                |
//! | Report       | [`summary`]               |

pub mod ast;
pub mod config;
pub mod error;
pub mod fixer;
pub mod lexer;
pub mod modifier;
pub mod parser;
pub mod placeholder;
pub mod scanner;
pub mod summary;
pub mod translator;
pub mod writer;

pub mod prelude {
    pub use crate::ast::{NodeId, NodeKind, Note, NoteCategory, Tree};
    pub use crate::config::Config;
    pub use crate::error::*;
    pub use crate::fixer::{ObjectCatalog, ObjectCategory};
    pub use crate::summary::Summary;
    pub use crate::translator::{Translation, Translator};
}

/// Translate a script with the default configuration.
///
/// # Example
///
/// ```
/// let translation = hana_translator::translate("select getdate()").unwrap();
/// assert_eq!(translation.text, "SELECT NOW() FROM DUMMY;\n-- translation: FROM DUMMY was added");
/// ```
pub fn translate(source: &str) -> error::TranslateResult<translator::Translation> {
    translator::Translator::default().translate(source)
}
