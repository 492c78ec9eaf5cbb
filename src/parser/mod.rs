//! Recursive-descent T-SQL parser.
//!
//! Builds nodes straight into a [`Tree`]. A statement that cannot be parsed
//! is skipped up to the next statement boundary and replaced by an
//! `UnsupportedStatement` carrying a rendering note, so one bad statement
//! does not lose the rest of the script.
//!
//! Comments are handed to the most recently built node when the token that
//! follows them is consumed. The parser tracks which node holds each comment
//! (by source token index), so a comment offered twice is moved, never copied.

mod ddl;
mod expr;
mod query;
mod stmt;

use std::collections::HashMap;

use crate::ast::{Comment, NodeData, NodeId, NoteCategory, Tree};
use crate::error::{TranslateError, TranslateResult};
use crate::lexer::{tokenize, Token, TokenKind};

/// Deepest nesting of expressions/statements accepted.
///
/// One level costs a full trip down the precedence chain, so this stays low
/// enough for a whole translation to fit a 2 MB thread stack in a debug build.
pub const MAX_DEPTH: usize = 64;

/// Outcome of parsing a script.
#[derive(Debug)]
pub struct Parsed {
    /// Root `Block` holding the top-level statements.
    pub root: NodeId,
    /// Top-level statements found, including ones that failed to parse.
    pub statements: usize,
    /// Statements replaced by a placeholder because they did not parse.
    pub errors: Vec<TranslateError>,
}

/// Parse a whole script into `tree`.
pub fn parse(tree: &mut Tree, source: &str) -> TranslateResult<Parsed> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(tree, tokens);
    Ok(parser.script())
}

/// Words that end an expression or a select item instead of naming a column.
const RESERVED: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "ANY", "AS", "ASC", "BEGIN", "BETWEEN", "BREAK", "BY", "CASE",
    "CATCH", "CHECK", "CLOSE", "COLLATE", "COMMIT", "CONSTRAINT", "CONTINUE", "CREATE", "CROSS",
    "DEALLOCATE", "DECLARE", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP", "ELSE", "END",
    "ESCAPE", "EXCEPT", "EXEC", "EXECUTE", "EXISTS", "FETCH", "FOR", "FOREIGN", "FROM", "FULL",
    "GO", "GOTO", "GROUP", "HAVING", "IF", "IN", "INNER", "INSERT", "INTERSECT", "INTO", "IS",
    "JOIN", "LEFT", "LIKE", "NOT", "NULL", "ON", "OPEN", "OPTION", "OR", "ORDER", "OUTER",
    "OUTPUT", "OVER", "PRIMARY", "PRINT", "RAISERROR", "REFERENCES", "RETURN", "RIGHT",
    "ROLLBACK", "SAVE", "SELECT", "SET", "TABLESAMPLE", "THEN", "THROW", "TOP", "TRUNCATE",
    "UNION", "UNIQUE", "UPDATE", "USE", "VALUES", "WAITFOR", "WHEN", "WHERE", "WHILE", "WITH",
];

pub(crate) fn is_reserved(word: &str) -> bool {
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(word))
}

/// Words that start a statement; recovery stops in front of them.
const STATEMENT_START: &[&str] = &[
    "ALTER", "BEGIN", "CLOSE", "COMMIT", "CREATE", "DEALLOCATE", "DECLARE", "DELETE", "DROP",
    "EXEC", "EXECUTE", "FETCH", "GO", "GOTO", "IF", "INSERT", "OPEN", "PRINT", "RAISERROR",
    "RETURN", "ROLLBACK", "SAVE", "SELECT", "SET", "THROW", "TRUNCATE", "UPDATE", "USE",
    "WAITFOR", "WHILE", "WITH",
];

pub(crate) struct Parser<'t> {
    tree: &'t mut Tree,
    tokens: Vec<Token>,
    pos: usize,
    /// Node that receives the comments of the next consumed token.
    last_node: Option<NodeId>,
    /// Comments seen before any node of the current statement was built.
    pending: Vec<Comment>,
    /// Comment token index -> node currently holding it.
    holders: HashMap<usize, NodeId>,
    depth: usize,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(tree: &'t mut Tree, tokens: Vec<Token>) -> Self {
        Self {
            tree,
            tokens,
            pos: 0,
            last_node: None,
            pending: Vec::new(),
            holders: HashMap::new(),
            depth: 0,
        }
    }

    fn script(&mut self) -> Parsed {
        let mut statements = Vec::new();
        let mut errors = Vec::new();

        loop {
            while self.eat_symbol(";") {}
            if self.peek().is_eof() {
                break;
            }
            self.last_node = None;
            let first_node = self.tree.len();
            match self.statement() {
                Ok(id) => statements.push(id),
                Err(err) => {
                    tracing::warn!(%err, "statement skipped");
                    statements.push(self.recover(first_node, &err));
                    errors.push(err);
                }
            }
        }

        let eof = self.advance_raw();
        self.offer_comments(eof.comments);
        let count = statements.len();
        let root = self.build(NodeData::Block { statements });
        tracing::debug!(statements = count, errors = errors.len(), "script parsed");
        Parsed {
            root,
            statements: count,
            errors,
        }
    }

    /// Replace a failed statement by a placeholder that owns every comment
    /// the failed attempt picked up, then skip to the next boundary.
    fn recover(&mut self, first_node: usize, err: &TranslateError) -> NodeId {
        let mut salvaged = std::mem::take(&mut self.pending);
        for index in first_node..self.tree.len() {
            salvaged.extend(self.tree.take_comments(NodeId(index)));
        }
        let sentinel = self.tree.unsupported_statement("unparsed statement");
        self.tree
            .add_note(sentinel, NoteCategory::Rendering, format!("Statement could not be parsed: {}", err));
        for comment in &salvaged {
            self.holders.insert(comment.token_index, sentinel);
        }
        self.tree.append_comments(sentinel, salvaged);
        self.last_node = Some(sentinel);

        let start = self.pos;
        let mut depth = 0usize;
        while !self.peek().is_eof() {
            let token = self.peek();
            if depth == 0 && token.is_symbol(";") {
                break;
            }
            if depth == 0
                && self.pos > start
                && token.kind == TokenKind::Word
                && STATEMENT_START.iter().any(|w| token.is_word(w))
            {
                break;
            }
            if token.is_symbol("(") {
                depth += 1;
            } else if token.is_symbol(")") {
                depth = depth.saturating_sub(1);
            }
            self.advance();
        }
        sentinel
    }

    // --- node construction and comments ---

    pub(crate) fn build(&mut self, data: NodeData) -> NodeId {
        let id = self.tree.add(data);
        if !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            self.attach_comments(id, pending);
        }
        self.last_node = Some(id);
        id
    }

    fn offer_comments(&mut self, comments: Vec<Comment>) {
        if comments.is_empty() {
            return;
        }
        match self.last_node {
            Some(node) => self.attach_comments(node, comments),
            None => self.pending.extend(comments),
        }
    }

    fn attach_comments(&mut self, node: NodeId, comments: Vec<Comment>) {
        for comment in comments {
            if let Some(holder) = self.holders.get(&comment.token_index).copied() {
                if holder == node {
                    continue;
                }
                self.tree
                    .node_mut(holder)
                    .comments
                    .retain(|c| c.token_index != comment.token_index);
            }
            self.holders.insert(comment.token_index, node);
            self.tree.append_comments(node, vec![comment]);
        }
    }

    // --- token access ---

    pub(crate) fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    pub(crate) fn peek_at(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    fn advance_raw(&mut self) -> Token {
        let token = self.peek().clone();
        if !token.is_eof() {
            self.pos += 1;
        }
        token
    }

    /// Consume one token, passing its leading comments to the last node.
    pub(crate) fn advance(&mut self) -> Token {
        let mut token = self.advance_raw();
        let comments = std::mem::take(&mut token.comments);
        self.offer_comments(comments);
        token
    }

    pub(crate) fn at_word(&self, word: &str) -> bool {
        self.peek().is_word(word)
    }

    pub(crate) fn at_word_at(&self, n: usize, word: &str) -> bool {
        self.peek_at(n).is_word(word)
    }

    pub(crate) fn at_any_word(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.at_word(w))
    }

    pub(crate) fn at_symbol(&self, symbol: &str) -> bool {
        self.peek().is_symbol(symbol)
    }

    pub(crate) fn eat_word(&mut self, word: &str) -> bool {
        if self.at_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_symbol(&mut self, symbol: &str) -> bool {
        if self.at_symbol(symbol) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_word(&mut self, word: &str) -> TranslateResult<()> {
        if self.eat_word(word) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}", word)))
        }
    }

    pub(crate) fn expect_symbol(&mut self, symbol: &str) -> TranslateResult<()> {
        if self.eat_symbol(symbol) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", symbol)))
        }
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> TranslateError {
        let token = self.peek();
        let found = if token.is_eof() {
            "end of input".to_string()
        } else {
            format!("'{}'", token.text)
        };
        TranslateError::parse(token.offset, format!("{}, found {}", message.into(), found))
    }

    /// Run `f` one nesting level deeper.
    pub(crate) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> TranslateResult<T>,
    ) -> TranslateResult<T> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // --- names ---

    /// Word or quoted identifier.
    pub(crate) fn identifier(&mut self) -> TranslateResult<NodeId> {
        let token = self.peek();
        let quoted = match token.kind {
            TokenKind::Word => false,
            TokenKind::QuotedIdent => true,
            _ => return Err(self.error("expected identifier")),
        };
        let token = self.advance();
        Ok(self.build(NodeData::Identifier {
            name: token.text,
            quoted,
        }))
    }

    pub(crate) fn at_identifier(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Word | TokenKind::QuotedIdent)
    }

    /// Identifier that is not a reserved word, for aliases.
    pub(crate) fn at_alias(&self) -> bool {
        let token = self.peek();
        match token.kind {
            TokenKind::QuotedIdent => true,
            TokenKind::Word => !is_reserved(&token.text),
            _ => false,
        }
    }

    /// `a`, `a.b`, `a.b.c`, `db..table`.
    pub(crate) fn object_name(&mut self) -> TranslateResult<NodeId> {
        let mut parts = vec![self.identifier()?];
        while self.at_symbol(".") {
            self.advance();
            if self.at_symbol(".") {
                parts.push(self.build(NodeData::Identifier {
                    name: String::new(),
                    quoted: false,
                }));
                continue;
            }
            parts.push(self.identifier()?);
        }
        Ok(self.build(NodeData::DbObject { parts }))
    }

    pub(crate) fn variable(&mut self) -> TranslateResult<NodeId> {
        if self.peek().kind != TokenKind::Variable {
            return Err(self.error("expected variable"));
        }
        let token = self.advance();
        Ok(self.build(NodeData::Variable {
            name: token.text,
            argument: true,
        }))
    }

    /// Comma-separated list of `item`.
    pub(crate) fn comma_list(
        &mut self,
        mut item: impl FnMut(&mut Self) -> TranslateResult<NodeId>,
    ) -> TranslateResult<Vec<NodeId>> {
        let mut items = vec![item(self)?];
        while self.eat_symbol(",") {
            items.push(item(self)?);
        }
        Ok(items)
    }

    /// `( item, ... )`
    pub(crate) fn paren_list(
        &mut self,
        item: impl FnMut(&mut Self) -> TranslateResult<NodeId>,
    ) -> TranslateResult<Vec<NodeId>> {
        self.expect_symbol("(")?;
        let items = self.comma_list(item)?;
        self.expect_symbol(")")?;
        Ok(items)
    }

    /// Skip a balanced parenthesized group, returning its text.
    pub(crate) fn skip_parens(&mut self) -> TranslateResult<String> {
        self.expect_symbol("(")?;
        let mut depth = 1;
        let mut words = Vec::new();
        while depth > 0 {
            let token = self.advance();
            if token.is_eof() {
                return Err(self.error("unbalanced parentheses"));
            }
            if token.is_symbol("(") {
                depth += 1;
            } else if token.is_symbol(")") {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            words.push(token.text);
        }
        Ok(words.join(" "))
    }

    /// Remaining words of the current statement, for options kept as text.
    pub(crate) fn rest_of_statement(&mut self) -> String {
        let mut words = Vec::new();
        let mut depth = 0usize;
        loop {
            let token = self.peek();
            if token.is_eof() || (depth == 0 && token.is_symbol(";")) {
                break;
            }
            if depth == 0
                && !words.is_empty()
                && token.kind == TokenKind::Word
                && STATEMENT_START.iter().any(|w| token.is_word(w))
            {
                break;
            }
            if token.is_symbol("(") {
                depth += 1;
            } else if token.is_symbol(")") {
                depth = depth.saturating_sub(1);
            }
            words.push(self.advance().text);
        }
        words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    fn parse_one(source: &str) -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let parsed = parse(&mut tree, source).unwrap();
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        let statement = tree.child_ids(parsed.root)[0];
        (tree, statement)
    }

    #[test]
    fn test_statement_count() {
        let mut tree = Tree::new();
        let parsed = parse(&mut tree, "select 1; select 2\nGO\nselect 3").unwrap();
        assert_eq!(parsed.statements, 4);
        assert_eq!(tree.kind(parsed.root), NodeKind::Block);
    }

    #[test]
    fn test_recovery_keeps_following_statements() {
        let mut tree = Tree::new();
        let parsed = parse(&mut tree, "select 1\nfrobnicate x y\nselect 2").unwrap();
        assert_eq!(parsed.errors.len(), 1);
        let kinds: Vec<_> = tree
            .child_ids(parsed.root)
            .into_iter()
            .map(|id| tree.kind(id))
            .collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::SelectStatement,
                NodeKind::UnsupportedStatement,
                NodeKind::SelectStatement
            ]
        );
    }

    #[test]
    fn test_comments_are_all_attached() {
        let mut tree = Tree::new();
        let source = "-- head\nselect a /* x */, b -- y\nfrom t /* z */\n-- tail";
        let parsed = parse(&mut tree, source).unwrap();
        assert_eq!(tree.comment_count(parsed.root), 5);
    }

    #[test]
    fn test_failed_statement_keeps_comments() {
        let mut tree = Tree::new();
        let parsed = parse(&mut tree, "select (1 /* c */ +").unwrap();
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(tree.comment_count(parsed.root), 1);
    }

    #[test]
    fn test_comment_reoffered_moves() {
        let mut tree = Tree::new();
        let first = tree.int(1);
        let second = tree.int(2);
        let mut parser = Parser::new(&mut tree, tokenize("x").unwrap());
        let comment = Comment::single("-- c", 0);
        parser.attach_comments(first, vec![comment.clone()]);
        parser.attach_comments(second, vec![comment]);
        assert!(tree.node(first).comments.is_empty());
        assert_eq!(tree.node(second).comments.len(), 1);
    }

    #[test]
    fn test_object_name_with_empty_part() {
        let (tree, statement) = parse_one("select * from db..tbl");
        let names: Vec<_> = tree
            .descendants(statement)
            .into_iter()
            .filter(|id| tree.kind(*id) == NodeKind::DbObject)
            .map(|id| tree.object_parts(id))
            .collect();
        assert!(names.contains(&vec!["db".to_string(), String::new(), "tbl".to_string()]));
    }

    #[test]
    fn test_nesting_limit() {
        let source = format!("select {}1{}", "(".repeat(MAX_DEPTH + 5), ")".repeat(MAX_DEPTH + 5));
        let mut tree = Tree::new();
        let parsed = parse(&mut tree, &source).unwrap();
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(tree.kind(tree.child_ids(parsed.root)[0]), NodeKind::UnsupportedStatement);
    }

    #[test]
    fn test_nesting_up_to_the_limit() {
        let depth = MAX_DEPTH - 4;
        let source = format!("select {}1{}", "(".repeat(depth), ")".repeat(depth));
        let mut tree = Tree::new();
        let parsed = parse(&mut tree, &source).unwrap();
        assert!(parsed.errors.is_empty());
        let parens = tree
            .descendants(parsed.root)
            .into_iter()
            .filter(|id| tree.kind(*id) == NodeKind::Parens)
            .count();
        assert_eq!(parens, depth);
    }
}
