//! Aggregated notes of a translation.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::ast::{NodeData, NodeId, NoteCategory, Tree};

/// One distinct note text and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageCount {
    pub text: String,
    pub count: usize,
}

/// Notes of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: NoteCategory,
    pub count: usize,
    /// Distinct texts in first-seen order.
    pub messages: Vec<MessageCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Top-level statements written to the output.
    pub statements: usize,
    /// Rendering and rewrite-error notes, whatever the filter.
    pub errors: usize,
    pub categories: Vec<CategorySummary>,
}

/// Top-level statements of a translated tree that produce text.
pub fn count_statements(tree: &Tree, root: NodeId) -> usize {
    match tree.data(root) {
        NodeData::Block { statements } => statements
            .iter()
            .filter(|id| !tree.node(**id).hide)
            .count(),
        _ => usize::from(!tree.node(root).hide),
    }
}

impl Summary {
    /// Walk the notes under `root`, keeping the categories in `filter`.
    pub fn collect(tree: &Tree, root: NodeId, filter: &[NoteCategory]) -> Self {
        let mut errors = 0;
        let mut by_category: BTreeMap<NoteCategory, CategorySummary> = BTreeMap::new();
        for note in tree.notes_under(root) {
            if note.category.is_error() {
                errors += 1;
            }
            if !filter.contains(&note.category) {
                continue;
            }
            let entry = by_category
                .entry(note.category)
                .or_insert_with(|| CategorySummary {
                    category: note.category,
                    count: 0,
                    messages: Vec::new(),
                });
            entry.count += 1;
            match entry.messages.iter_mut().find(|message| message.text == note.text) {
                Some(message) => message.count += 1,
                None => entry.messages.push(MessageCount {
                    text: note.text.clone(),
                    count: 1,
                }),
            }
        }
        Self {
            statements: count_statements(tree, root),
            errors,
            categories: by_category.into_values().collect(),
        }
    }

    /// Notes counted, over all kept categories.
    pub fn note_count(&self) -> usize {
        self.categories.iter().map(|category| category.count).sum()
    }

    pub fn category(&self, category: NoteCategory) -> Option<&CategorySummary> {
        self.categories.iter().find(|summary| summary.category == category)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Statements: {}", self.statements)?;
        write!(f, "Errors: {}", self.errors)?;
        for category in &self.categories {
            write!(f, "\n{} ({}):", category.category.label(), category.count)?;
            for message in &category.messages {
                if message.count > 1 {
                    write!(f, "\n    {} (x{})", message.text, message.count)?;
                } else {
                    write!(f, "\n    {}", message.text)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let first = tree.add(NodeData::BreakStatement);
        let second = tree.add(NodeData::ContinueStatement);
        let hidden = tree.add(NodeData::GoStatement);
        tree.node_mut(hidden).hide = true;
        tree.add_note(first, NoteCategory::Rewrite, "FROM DUMMY was added");
        tree.add_note(second, NoteCategory::Rewrite, "FROM DUMMY was added");
        tree.add_note(second, NoteCategory::RewriteError, "GOTO is not supported");
        tree.add_note(hidden, NoteCategory::IdentifierTrace, "Object TABLE 'T' caught");
        let root = tree.add(NodeData::Block {
            statements: vec![first, second, hidden],
        });
        (tree, root)
    }

    #[test]
    fn test_counts_and_distinct_messages() {
        let (tree, root) = sample();
        let summary = Summary::collect(&tree, root, &[NoteCategory::Rewrite, NoteCategory::RewriteError]);
        assert_eq!(summary.statements, 2);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.note_count(), 3);
        let rewrite = summary.category(NoteCategory::Rewrite).unwrap();
        assert_eq!(rewrite.messages.len(), 1);
        assert_eq!(rewrite.messages[0].count, 2);
        assert!(summary.category(NoteCategory::IdentifierTrace).is_none());
    }

    #[test]
    fn test_errors_ignore_the_filter() {
        let (tree, root) = sample();
        let summary = Summary::collect(&tree, root, &[]);
        assert_eq!(summary.errors, 1);
        assert!(summary.categories.is_empty());
    }

    #[test]
    fn test_text() {
        let (tree, root) = sample();
        let summary = Summary::collect(&tree, root, &NoteCategory::ALL);
        assert_eq!(
            summary.to_string(),
            "Statements: 2\nErrors: 1\n\
             identifier trace (1):\n    Object TABLE 'T' caught\n\
             translation (2):\n    FROM DUMMY was added (x2)\n\
             translation error (1):\n    GOTO is not supported"
        );
    }
}
