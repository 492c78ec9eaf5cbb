//! Serialization of the translated tree to HANA SQL text.
//!
//! Statements are written in order. After each statement come the notes of
//! its subtree (as `--` comments, when enabled) and then the source comments
//! it carries. Hidden statements contribute their notes and comments only.
//! Nested statements that sit in a statement list of their parent (block,
//! procedure body, branch of an IF) are written the same way, one level in.
//!
//! A construct with no HANA form is written as best as possible and gets a
//! `Rendering` note, which counts as an error in the summary.

mod assembler;
mod ddl;
mod query;

pub use assembler::{Assembler, PlainAssembler, PrettyAssembler, MAX_LINE};

use crate::ast::{CommentKind, NodeData, NodeId, NodeKind, Note, NoteCategory, Tree};
use crate::config::Config;

/// Write the tree under `root` with the layout chosen by the config.
pub fn render(tree: &mut Tree, root: NodeId, config: &Config) -> String {
    if config.format_output {
        write(tree, root, config, PrettyAssembler::new())
    } else {
        write(tree, root, config, PlainAssembler::new())
    }
}

/// Write the tree under `root` through a given assembler.
pub fn write<A: Assembler>(tree: &mut Tree, root: NodeId, config: &Config, out: A) -> String {
    let mut writer = Writer {
        tree,
        config,
        out,
        glue: false,
    };
    writer.script(root);
    writer.out.finish()
}

/// Child slots whose statements are written by [`Writer::statement`].
fn holds_statements(kind: NodeKind, field: &str) -> bool {
    matches!(
        (kind, field),
        (NodeKind::Block, "statements")
            | (NodeKind::CreateProcedure, "declarations" | "body")
            | (NodeKind::IfStatement, "then_branch" | "else_branch")
            | (NodeKind::WhileStatement, "body")
            | (NodeKind::CreateTrigger, "body")
    )
}

/// Variable name as HANA writes it: no `@`, `:` in front when read.
pub(crate) fn variable_text(name: &str, argument: bool) -> String {
    if name.starts_with("::") {
        return name.to_string();
    }
    let bare = name.trim_start_matches('@');
    if argument {
        format!(":{}", bare)
    } else {
        bare.to_string()
    }
}

pub(crate) fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) struct Writer<'a, A: Assembler> {
    tree: &'a mut Tree,
    config: &'a Config,
    out: A,
    /// The next word attaches to the previous one without a space.
    glue: bool,
}

impl<A: Assembler> Writer<'_, A> {
    fn script(&mut self, root: NodeId) {
        match self.tree.data(root).clone() {
            NodeData::Block { statements } => {
                tracing::trace!(statements = statements.len(), "writing script");
                for statement in statements {
                    self.statement(statement);
                }
                self.trailer(root);
            }
            _ => self.statement(root),
        }
    }

    // --- primitives ---

    pub(super) fn word(&mut self, text: &str) {
        if !std::mem::take(&mut self.glue) {
            self.out.space();
        }
        self.out.token(text);
    }

    /// Punctuation that sticks to what precedes it.
    pub(super) fn punct(&mut self, text: &str) {
        self.glue = false;
        self.out.token(text);
    }

    /// Words joined by spaces.
    pub(super) fn words(&mut self, text: &str) {
        for word in text.split_whitespace() {
            self.word(word);
        }
    }

    pub(super) fn glue(&mut self) {
        self.glue = true;
    }

    /// `id`, then its comments.
    pub(super) fn node(&mut self, id: NodeId) {
        if !self.tree.node(id).hide {
            self.construct(id);
        } else {
            self.subtree_comments_below(id);
        }
        self.comments(id);
    }

    pub(super) fn opt(&mut self, id: Option<NodeId>) {
        if let Some(id) = id {
            self.node(id);
        }
    }

    /// Comma-separated list with break points.
    pub(super) fn list(&mut self, ids: &[NodeId]) {
        for (index, id) in ids.iter().enumerate() {
            if index > 0 {
                self.punct(",");
                self.out.space();
                self.out.breakable();
            }
            self.node(*id);
        }
    }

    /// `(a, b)`.
    pub(super) fn paren_list(&mut self, ids: &[NodeId]) {
        self.word("(");
        self.list(ids);
        self.punct(")");
    }

    /// Note that `id` has no target form.
    pub(super) fn rendering(&mut self, id: NodeId, text: impl Into<String>) {
        self.tree.add_note(id, NoteCategory::Rendering, text);
    }

    /// A child left out of the output keeps its comments.
    pub(super) fn skipped(&mut self, id: NodeId) {
        for node in self.tree.descendants(id) {
            self.comments(node);
        }
    }

    pub(super) fn skipped_all(&mut self, ids: &[NodeId]) {
        for id in ids {
            self.skipped(*id);
        }
    }

    fn subtree_comments_below(&mut self, id: NodeId) {
        for child in self.tree.child_ids(id) {
            self.skipped(child);
        }
    }

    pub(super) fn comments(&mut self, id: NodeId) {
        let comments = self.tree.node(id).comments.clone();
        for comment in comments {
            if comment.starts_new_line {
                self.out.hard_line();
            } else {
                self.out.space();
            }
            self.out.token(&comment.text);
            match comment.kind {
                CommentKind::SingleLine => self.out.hard_line(),
                CommentKind::MultiLine => self.out.space(),
            }
        }
        self.glue = false;
    }

    // --- statements ---

    /// A statement in a statement list: text, `;`, notes, comments.
    pub(super) fn statement(&mut self, id: NodeId) {
        let node = self.tree.node(id);
        let silent = node.hide || node.kind() == NodeKind::UnsupportedStatement;
        let terminate = node.terminate;
        if !silent {
            self.construct(id);
            if terminate {
                self.punct(";");
            }
        }
        let notes = self.statement_notes(id, silent);
        self.notes(&notes);
        if silent {
            self.subtree_comments_below(id);
        }
        self.comments(id);
        self.out.hard_line();
    }

    /// Statements of a body: the list of a block, or one statement.
    pub(super) fn body(&mut self, id: NodeId) {
        match self.tree.data(id).clone() {
            NodeData::Block { statements } if !self.tree.node(id).hide => {
                for statement in statements {
                    self.statement(statement);
                }
                self.trailer(id);
            }
            _ => self.statement(id),
        }
    }

    /// Own notes and comments of a list holder whose items were written.
    fn trailer(&mut self, id: NodeId) {
        let notes = self.tree.node(id).notes.clone();
        self.notes(&notes);
        self.comments(id);
        self.out.hard_line();
    }

    /// Notes of a statement's subtree, leaving out nested statements that
    /// are written on their own.
    fn statement_notes(&self, id: NodeId, everything: bool) -> Vec<Note> {
        let mut notes: Vec<Note> = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            for note in &self.tree.node(current).notes {
                if !notes.contains(note) {
                    notes.push(note.clone());
                }
            }
            let kind = self.tree.kind(current);
            for (child, slot) in self.tree.children(current).into_iter().rev() {
                if everything || !holds_statements(kind, slot.field) {
                    stack.push(child);
                }
            }
        }
        notes
    }

    fn notes(&mut self, notes: &[Note]) {
        if !self.config.translation_comments {
            return;
        }
        for note in notes
            .iter()
            .filter(|note| self.config.translation_comments_filter.contains(&note.category))
        {
            self.out.hard_line();
            let text = note.text.replace(['\r', '\n'], " ");
            self.out.token(&format!("-- {}: {}", note.category.label(), text));
            self.out.hard_line();
        }
    }

    // --- dispatch ---

    fn construct(&mut self, id: NodeId) {
        let data = self.tree.data(id).clone();
        match data {
            NodeData::Identifier { name, quoted } => {
                if quoted {
                    self.word(&quote_identifier(&name));
                } else {
                    self.word(&name);
                }
            }
            NodeData::DbObject { parts } => {
                for (index, part) in parts.iter().enumerate() {
                    if index > 0 {
                        self.punct(".");
                        self.glue();
                    }
                    self.node(*part);
                }
            }
            NodeData::CursorName { name, .. } => self.word(name.trim_start_matches('@')),
            NodeData::DataType { name, arguments } => {
                self.words(&name.to_ascii_uppercase());
                if !arguments.is_empty() {
                    self.punct(&format!("({})", arguments.join(", ")));
                }
            }
            NodeData::Block { statements } => {
                self.word("BEGIN");
                self.out.indent();
                self.out.line();
                for statement in statements {
                    self.statement(statement);
                }
                self.out.dedent();
                self.out.hard_line();
                self.word("END");
            }
            data if data.kind().is_statement() => self.statement_text(id, data),
            data if data.kind().is_a(NodeKind::Declaration) => self.declaration(id, data),
            data if data.kind().is_a(NodeKind::TableDefinition)
                || data.kind().is_a(NodeKind::AlterTableAction) =>
            {
                self.table_definition(id, data, false)
            }
            data if data.kind().is_a(NodeKind::Expression) => self.expression(id, data),
            data if data.kind().is_a(NodeKind::QueryExpression)
                || data.kind().is_a(NodeKind::TableSource) =>
            {
                self.query(id, data)
            }
            data => self.piece(id, data),
        }
    }

    /// Fallback for constructs with no HANA form: a note, and the children
    /// keep their comments.
    pub(super) fn unrendered(&mut self, id: NodeId) {
        let kind = self.tree.kind(id);
        tracing::debug!(kind = kind.name(), "no target rendering");
        self.rendering(id, format!("{} has no HANA rendering", kind.name()));
        self.subtree_comments_below(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::Modifier;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn translate_with(source: &str, config: &Config) -> String {
        let mut tree = Tree::new();
        let parsed = parse(&mut tree, source).unwrap();
        let root = Modifier::new().run(&mut tree, parsed.root);
        render(&mut tree, root, config)
    }

    fn translate(source: &str) -> String {
        translate_with(source, &Config::builder().comments(false).build())
    }

    #[test]
    fn test_variable_text() {
        assert_eq!(variable_text("@x", true), ":x");
        assert_eq!(variable_text("@x", false), "x");
        assert_eq!(variable_text("::ROWCOUNT", true), "::ROWCOUNT");
    }

    #[test]
    fn test_simple_select() {
        assert_eq!(
            translate("select a, [b c] as x from T t0 where a = 'it''s'"),
            "SELECT a, \"b c\" AS x FROM T t0 WHERE a = 'it''s';"
        );
    }

    #[test]
    fn test_statements_one_per_line() {
        assert_eq!(
            translate("delete from T where a is null; truncate table U"),
            "DELETE FROM T WHERE a IS NULL;\nTRUNCATE TABLE U;"
        );
    }

    #[test]
    fn test_notes_follow_the_statement() {
        let text = translate_with("drop table A, B", &Config::default());
        assert_eq!(
            text,
            "DROP TABLE A;\nDROP TABLE B;\n-- translation: DROP TABLE with 2 objects was split into 2 statements"
        );
    }

    #[test]
    fn test_comments_are_kept() {
        let text = translate("select a -- first\nfrom T /* second */");
        assert!(text.contains("-- first\n"));
        assert!(text.contains("/* second */"));
    }

    #[test]
    fn test_hidden_statement_keeps_notes_only() {
        let text = translate_with("waitfor delay '00:00:01'", &Config::default());
        assert_eq!(text, "-- translation: WAITFOR was removed");
    }

    #[test]
    fn test_filtered_notes_are_not_written() {
        let config = Config::builder()
            .comments_filter([NoteCategory::RewriteError])
            .build();
        assert_eq!(translate_with("waitfor delay '00:00:01'", &config), "");
    }

    #[test]
    fn test_pretty_layout() {
        let config = Config::builder().pretty(true).comments(false).build();
        let text = translate_with("select a, b from T where a = 1 order by b", &config);
        assert_eq!(text, "SELECT a, b\nFROM T\nWHERE a = 1\nORDER BY b;");
    }
}
