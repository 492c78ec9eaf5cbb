//! The translation pipeline.
//!
//! mask placeholders → parse → rewrite → fix identifiers → write → unmask.
//! Each call owns its tree and pass instances, so one [`Translator`] can
//! serve any number of calls.

use serde::Serialize;

use crate::ast::{NodeId, Tree};
use crate::config::Config;
use crate::error::TranslateResult;
use crate::fixer::{IdentifierFixer, ObjectCatalog};
use crate::modifier::Modifier;
use crate::parser::parse;
use crate::placeholder::Placeholders;
use crate::summary::Summary;
use crate::writer::render;

/// Result of one translation.
#[derive(Debug, Clone, Serialize)]
pub struct Translation {
    /// HANA SQL text.
    pub text: String,
    pub summary: Summary,
    /// Objects referenced by the translated script.
    pub catalog: ObjectCatalog,
}

impl Translation {
    pub fn statements(&self) -> usize {
        self.summary.statements
    }

    /// Error-level notes; zero means the text can be used as-is.
    pub fn errors(&self) -> usize {
        self.summary.errors
    }

    pub fn is_clean(&self) -> bool {
        self.errors() == 0
    }
}

/// Translated tree, kept for inspection.
pub struct TranslatedTree {
    pub tree: Tree,
    pub root: NodeId,
    pub catalog: ObjectCatalog,
}

#[derive(Debug, Clone, Default)]
pub struct Translator {
    config: Config,
}

impl Translator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate a T-SQL script to HANA SQL.
    pub fn translate(&self, source: &str) -> TranslateResult<Translation> {
        let (masked, placeholders) = Placeholders::mask(&self.config, source)?;
        if placeholders.only_placeholder() {
            return Ok(Translation {
                text: source.to_string(),
                summary: Summary::default(),
                catalog: ObjectCatalog::new(),
            });
        }

        let TranslatedTree {
            mut tree,
            root,
            catalog,
        } = self.translate_tree(&masked)?;
        let written = render(&mut tree, root, &self.config);
        let text = placeholders.unmask(&written);
        let summary = Summary::collect(&tree, root, &self.config.result_summary_filter);
        tracing::debug!(
            statements = summary.statements,
            errors = summary.errors,
            placeholders = placeholders.len(),
            "translation finished"
        );
        Ok(Translation {
            text,
            summary,
            catalog,
        })
    }

    /// Parse and run both passes, stopping short of writing text.
    pub fn translate_tree(&self, source: &str) -> TranslateResult<TranslatedTree> {
        let mut tree = Tree::new();
        let parsed = parse(&mut tree, source)?;
        if !parsed.errors.is_empty() {
            tracing::warn!(
                failed = parsed.errors.len(),
                statements = parsed.statements,
                "some statements could not be parsed"
            );
        }
        let root = Modifier::new().run(&mut tree, parsed.root);
        let mut fixer = IdentifierFixer::new(&self.config);
        fixer.run(&mut tree, root);
        Ok(TranslatedTree {
            tree,
            root,
            catalog: fixer.into_catalog(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NoteCategory;
    use crate::parser::MAX_DEPTH;
    use pretty_assertions::assert_eq;

    fn translator() -> Translator {
        Translator::new(Config::builder().comments(false).remove_default_schema(true).build())
    }

    #[test]
    fn test_placeholder_round_trip() {
        let translation = translator()
            .translate("select id, isnull(qty, 0) as qty from dbo.T where id = {0}")
            .unwrap();
        assert_eq!(
            translation.text,
            "SELECT id, IFNULL(qty, 0) AS \"qty\" FROM T WHERE id = {0};"
        );
        assert!(translation.is_clean());
        assert_eq!(translation.statements(), 1);
    }

    #[test]
    fn test_lone_placeholder_is_returned() {
        let translation = translator().translate("{12}").unwrap();
        assert_eq!(translation.text, "{12}");
        assert_eq!(translation.statements(), 0);
    }

    #[test]
    fn test_lex_error_is_err() {
        assert!(translator().translate("select 'open").is_err());
    }

    #[test]
    fn test_unparsed_statement_is_an_error() {
        let translation = translator().translate("select from where; select 1").unwrap();
        assert_eq!(translation.text, "SELECT 1 FROM DUMMY;");
        assert!(translation.errors() >= 1);
        assert!(translation.summary.category(NoteCategory::Rendering).is_some());
    }

    #[test]
    fn test_deep_nesting_translates() {
        for depth in [10, MAX_DEPTH - 4] {
            let source = format!("select {}1{}", "(".repeat(depth), ")".repeat(depth));
            let translation = translator().translate(&source).unwrap();
            let expected = format!("SELECT {}1{} FROM DUMMY;", "(".repeat(depth), ")".repeat(depth));
            assert_eq!(translation.text, expected);
            assert!(translation.is_clean());
        }
    }

    #[test]
    fn test_nesting_past_the_limit_is_an_error() {
        let depth = MAX_DEPTH + 40;
        let source = format!("select {}1{}; select 2", "(".repeat(depth), ")".repeat(depth));
        let translation = translator().translate(&source).unwrap();
        assert_eq!(translation.text, "SELECT 2 FROM DUMMY;");
        assert_eq!(translation.errors(), 1);
    }

    #[test]
    fn test_catalog_is_filled() {
        let translation = translator().translate("select a from T").unwrap();
        assert!(!translation.catalog.is_empty());
    }
}
