//! Rewrite pass: T-SQL tree in, HANA tree out.
//!
//! The pass walks the parsed tree and builds its translation next to it in
//! the same arena. Every visited node is shallow-cloned and attached to the
//! clone of its parent; rules then patch the clone, swap it for a freshly
//! built replacement, split the enclosing statement or hoist new statements
//! into an enclosing block. Nodes that existed before the pass are never
//! written to.
//!
//! Two stacks run in parallel, kept here as one stack of [`Frame`]s: the
//! source node being visited and its clone in the output. Handlers receive
//! the source node id; [`Modifier::current`] is the clone.
//!
//! Comments are never dropped. A clone carries the comments of its source;
//! anything that is skipped, replaced or discarded hands its comments to the
//! nearest enclosing statement of the output.

mod ddl;
mod functions;
mod statements;

use std::collections::HashSet;

use crate::ast::{Comment, FieldMut, NodeData, NodeId, NodeKind, NoteCategory, Slot, Tree};
use crate::scanner::{Handlers, Phase, Scanner};

#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Node of the input being visited.
    old: NodeId,
    /// Its counterpart in the output.
    new: NodeId,
    /// A rule replaced `new` and already scanned its children.
    replaced: bool,
}

/// The rewrite pass. One instance per translation in flight.
pub struct Modifier {
    handlers: Handlers<Modifier>,
    frames: Vec<Frame>,
    /// Input nodes a rule has asked not to carry over.
    skipped: HashSet<NodeId>,
    /// Comment token indexes already moved to a statement.
    salvaged: HashSet<usize>,
    /// Counter behind `temp_var_N` names.
    temp_vars: usize,
    /// Lower-cased variables assigned inside the current procedure.
    assigned: HashSet<String>,
}

impl Default for Modifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for Modifier {
    fn handlers(&self) -> &Handlers<Self> {
        &self.handlers
    }

    /// Clone `child`, attach the clone where its source sits, and visit.
    fn scan_child(&mut self, tree: &mut Tree, child: NodeId, slot: Slot) {
        let Some(parent) = self.frames.last().map(|frame| frame.new) else {
            return;
        };
        if self.dropped(tree, parent, child, slot) {
            self.salvage(tree, child);
            return;
        }
        let clone = clone_node(tree, child);
        tree.attach(parent, slot, clone);
        self.frames.push(Frame {
            old: child,
            new: clone,
            replaced: false,
        });
        self.visit(tree, child);
        self.frames.pop();
    }

    fn visit(&mut self, tree: &mut Tree, id: NodeId) {
        self.dispatch(Phase::Pre, tree, id);
        let descend = self.action(tree, id);
        let replaced = self.frames.last().is_some_and(|frame| frame.replaced);
        if !replaced {
            if descend {
                self.scan_children(tree, id);
            } else {
                self.copy_children(tree, id);
            }
        }
        self.dispatch(Phase::Post, tree, id);
    }
}

impl Modifier {
    pub fn new() -> Self {
        Self {
            handlers: rules(),
            frames: Vec::new(),
            skipped: HashSet::new(),
            salvaged: HashSet::new(),
            temp_vars: 0,
            assigned: HashSet::new(),
        }
    }

    /// Translate the tree under `root`; returns the root of the output.
    pub fn run(&mut self, tree: &mut Tree, root: NodeId) -> NodeId {
        self.frames.clear();
        self.skipped.clear();
        self.salvaged.clear();
        self.assigned.clear();
        self.temp_vars = 0;

        let watermark = tree.len();
        let clone = clone_node(tree, root);
        self.frames.push(Frame {
            old: root,
            new: clone,
            replaced: false,
        });
        self.visit(tree, root);
        let result = self.frames.pop().map_or(clone, |frame| frame.new);
        tracing::debug!(created = tree.len() - watermark, "rewrite pass finished");
        result
    }

    // --- frame access for rules ---

    /// Output counterpart of the node being visited.
    pub(crate) fn current(&self) -> NodeId {
        self.frames[self.frames.len() - 1].new
    }

    /// Index of the innermost frame whose output node satisfies `pred`,
    /// skipping the current frame when `skip_current` is set.
    fn find_frame(&self, tree: &Tree, skip_current: bool, pred: impl Fn(NodeKind) -> bool) -> Option<usize> {
        let end = if skip_current {
            self.frames.len().saturating_sub(1)
        } else {
            self.frames.len()
        };
        (0..end).rev().find(|&i| pred(tree.kind(self.frames[i].new)))
    }

    fn nearest_statement(&self, tree: &Tree) -> Option<NodeId> {
        self.find_frame(tree, false, NodeKind::is_statement)
            .map(|i| self.frames[i].new)
    }

    /// Enclosing procedure in the output, if any.
    pub(crate) fn nearest_procedure(&self, tree: &Tree) -> Option<NodeId> {
        self.find_frame(tree, true, |kind| kind == NodeKind::CreateProcedure)
            .map(|i| self.frames[i].new)
    }

    /// True when an enclosing output node has `kind`.
    pub(crate) fn inside(&self, tree: &Tree, kind: NodeKind) -> bool {
        self.find_frame(tree, true, |k| k == kind).is_some()
    }

    /// Kind of the output parent of the current node.
    pub(crate) fn parent_kind(&self, tree: &Tree) -> Option<NodeKind> {
        let len = self.frames.len();
        (len >= 2).then(|| tree.kind(self.frames[len - 2].new))
    }

    /// Do not carry the input node `old` over to the output.
    pub(crate) fn skip(&mut self, old: NodeId) {
        self.skipped.insert(old);
    }

    /// Next `temp_var_N` name.
    pub(crate) fn temp_var(&mut self) -> String {
        let name = format!("temp_var_{}", self.temp_vars);
        self.temp_vars += 1;
        name
    }

    pub(crate) fn mark_assigned(&mut self, name: &str) {
        self.assigned.insert(name.to_ascii_lowercase());
    }

    pub(crate) fn is_assigned(&self, name: &str) -> bool {
        self.assigned.contains(&name.to_ascii_lowercase())
    }

    pub(crate) fn reset_assigned(&mut self) {
        self.assigned.clear();
    }

    // --- cloning protocol ---

    /// A single-valued field the rule cleared or pointed elsewhere, or a
    /// child the rule marked as skipped.
    fn dropped(&mut self, tree: &mut Tree, parent: NodeId, child: NodeId, slot: Slot) -> bool {
        if self.skipped.remove(&child) {
            return true;
        }
        !slot.is_list() && tree.field_value(parent, slot.field) != Some(child)
    }

    /// Copy the children of `id` unchanged; used when an action declines to
    /// descend without replacing the node.
    fn copy_children(&mut self, tree: &mut Tree, id: NodeId) {
        let current = self.current();
        for (child, slot) in tree.children(id) {
            if self.dropped(tree, current, child, slot) {
                self.salvage(tree, child);
                continue;
            }
            let copy = tree.deep_clone(child);
            tree.attach(current, slot, copy);
        }
    }

    /// Hand the comments and notes of a discarded input subtree to the
    /// nearest output statement.
    fn salvage(&mut self, tree: &mut Tree, old: NodeId) {
        let Some(target) = self.nearest_statement(tree).or_else(|| self.frames.last().map(|f| f.new)) else {
            return;
        };
        let mut comments = Vec::new();
        let mut notes = Vec::new();
        for id in tree.descendants(old) {
            let node = tree.node(id);
            comments.extend(
                node.comments
                    .iter()
                    .filter(|c| !self.salvaged.contains(&c.token_index))
                    .cloned(),
            );
            notes.extend(node.notes.iter().cloned());
        }
        for comment in &comments {
            self.salvaged.insert(comment.token_index);
        }
        if !comments.is_empty() {
            tracing::trace!(count = comments.len(), %target, "comments salvaged");
        }
        tree.append_comments(target, comments);
        tree.append_notes(target, notes);
    }

    /// Replace the current output node by `replacement` and translate the
    /// replacement's children. Returns `false`, the value an action
    /// handler should return after replacing.
    pub(crate) fn replace(&mut self, tree: &mut Tree, replacement: NodeId) -> bool {
        let Some(frame) = self.frames.pop() else {
            return false;
        };
        if let Some(parent) = self.frames.last() {
            tree.replace_child(parent.new, frame.new, replacement);
        }
        let (hide, terminate) = {
            let node = tree.node(frame.new);
            (node.hide, node.terminate)
        };
        tree.move_comments(frame.new, replacement);
        let notes = tree.take_notes(frame.new);
        tree.append_notes(replacement, notes);
        {
            let node = tree.node_mut(replacement);
            node.replaced = Some(frame.new);
            node.hide |= hide;
            node.terminate = terminate;
        }
        tracing::trace!(
            from = tree.kind(frame.old).name(),
            to = tree.kind(replacement).name(),
            "node replaced"
        );

        self.frames.push(Frame {
            old: frame.old,
            new: replacement,
            replaced: true,
        });
        let children = tree.children(replacement);
        tree.data_mut(replacement).clear_lists();
        for (child, slot) in children {
            self.scan_child(tree, child, slot);
        }
        self.reconcile_comments(tree, frame.old, replacement);
        false
    }

    /// Replace the current node by a sentinel carrying an error note. The
    /// source's children are dropped.
    pub(crate) fn unsupported(&mut self, tree: &mut Tree, id: NodeId, message: impl Into<String>) -> bool {
        let kind = tree.kind(id);
        let description = kind.name().to_string();
        let sentinel = if kind.is_statement() {
            tree.unsupported_statement(description)
        } else if kind.is_a(NodeKind::Clause) {
            tree.unsupported_clause(description)
        } else {
            tree.unsupported_expression(description)
        };
        tree.add_note(sentinel, NoteCategory::RewriteError, message);
        self.replace(tree, sentinel)
    }

    /// After a replacement: drop comments copied twice into `new_root` and
    /// salvage the ones of `old_root` that did not make it.
    fn reconcile_comments(&mut self, tree: &mut Tree, old_root: NodeId, new_root: NodeId) {
        let expected: Vec<Comment> = tree
            .descendants(old_root)
            .into_iter()
            .flat_map(|id| tree.node(id).comments.clone())
            .collect();
        let mut seen = HashSet::new();
        for id in tree.descendants(new_root) {
            tree.node_mut(id)
                .comments
                .retain(|comment| seen.insert(comment.token_index));
        }
        let missing: Vec<Comment> = expected
            .into_iter()
            .filter(|comment| {
                !seen.contains(&comment.token_index) && !self.salvaged.contains(&comment.token_index)
            })
            .collect();
        if missing.is_empty() {
            return;
        }
        let target = self.nearest_statement(tree).unwrap_or(new_root);
        for comment in &missing {
            self.salvaged.insert(comment.token_index);
        }
        tree.append_comments(target, missing);
    }

    /// Post-phase replacement of the current node by an already translated
    /// node. Comments stay where they are.
    pub(crate) fn splice(&mut self, tree: &mut Tree, new: NodeId) {
        let len = self.frames.len();
        let current = self.frames[len - 1].new;
        if len >= 2 {
            tree.replace_child(self.frames[len - 2].new, current, new);
        }
        tree.node_mut(new).replaced = Some(current);
        self.frames[len - 1].new = new;
    }

    /// Put `nodes` where the current node is. In a list they take its
    /// place; in a single slot they are wrapped in a block.
    pub(crate) fn splice_many(&mut self, tree: &mut Tree, nodes: Vec<NodeId>) {
        let len = self.frames.len();
        let current = self.frames[len - 1].new;
        let first = nodes.first().copied();
        if len < 2 {
            return;
        }
        let parent = self.frames[len - 2].new;
        if !tree.splice_list(parent, current, nodes.clone()) {
            let block = tree.add(NodeData::Block { statements: nodes });
            tree.replace_child(parent, current, block);
        }
        if let Some(first) = first {
            self.frames[len - 1].new = first;
        }
    }

    /// Split the current statement into `statements`. The first inherits
    /// comments and notes, the last gets `note`.
    pub(crate) fn split(&mut self, tree: &mut Tree, statements: Vec<NodeId>, note: &str) {
        let (Some(&first), Some(&last)) = (statements.first(), statements.last()) else {
            return;
        };
        let current = self.current();
        tree.move_comments(current, first);
        let notes = tree.take_notes(current);
        tree.append_notes(first, notes);
        tree.add_note(last, NoteCategory::Rewrite, note);
        tracing::debug!(count = statements.len(), "statement split");
        self.splice_many(tree, statements);
    }

    /// Insert statements around the output node of frame `index`.
    fn surround(&mut self, tree: &mut Tree, index: usize, before: Vec<NodeId>, after: Vec<NodeId>) {
        if index == 0 || index >= self.frames.len() {
            return;
        }
        let anchor = self.frames[index].new;
        let parent = self.frames[index - 1].new;
        let mut nodes = before;
        nodes.push(anchor);
        nodes.extend(after);
        if !tree.splice_list(parent, anchor, nodes.clone()) {
            let block = tree.add(NodeData::Block { statements: nodes });
            tree.replace_child(parent, anchor, block);
        }
    }

    /// Insert `statements` right before the innermost enclosing statement,
    /// or before the procedure containing it when `outside_procedure`.
    pub(crate) fn insert_before(&mut self, tree: &mut Tree, statements: Vec<NodeId>, outside_procedure: bool) {
        let index = if outside_procedure {
            self.find_frame(tree, false, |kind| kind == NodeKind::CreateProcedure)
        } else {
            None
        }
        .or_else(|| self.find_frame(tree, false, NodeKind::is_statement));
        if let Some(index) = index {
            self.surround(tree, index, statements, Vec::new());
        }
    }

    /// Insert `statements` right after the current statement.
    pub(crate) fn insert_after(&mut self, tree: &mut Tree, statements: Vec<NodeId>) {
        if let Some(index) = self.find_frame(tree, false, NodeKind::is_statement) {
            self.surround(tree, index, Vec::new(), statements);
        }
    }

    /// Remove the current statement from its block, handing comments and
    /// notes to `heir`.
    pub(crate) fn remove_current(&mut self, tree: &mut Tree, heir: NodeId) {
        let current = self.current();
        tree.move_comments(current, heir);
        let notes = tree.take_notes(current);
        tree.append_notes(heir, notes);
        self.splice_many(tree, Vec::new());
    }

    /// Drop child field `field` of the node being visited: an optional
    /// field is emptied in the clone, list items are skipped. `true` when
    /// something was there.
    pub(crate) fn drop_field(&mut self, tree: &mut Tree, old: NodeId, field: &str) -> bool {
        let current = self.current();
        let mut dropped = false;
        if let Some(FieldMut::Opt(slot)) = tree.data_mut(current).field_mut(field) {
            dropped = slot.take().is_some();
        }
        for (child, slot) in tree.children(old) {
            if slot.field == field && slot.is_list() {
                self.skipped.insert(child);
                dropped = true;
            }
        }
        dropped
    }

    /// [`Modifier::drop_field`] plus a note on the clone.
    pub(crate) fn strip(&mut self, tree: &mut Tree, old: NodeId, field: &str, category: NoteCategory, text: &str) {
        if self.drop_field(tree, old, field) {
            let current = self.current();
            tree.add_note(current, category, text);
        }
    }
}

/// Shallow copy with list fields emptied; the scan refills them.
fn clone_node(tree: &mut Tree, id: NodeId) -> NodeId {
    let clone = tree.shallow_clone(id);
    tree.data_mut(clone).clear_lists();
    clone
}

pub(crate) fn info(tree: &mut Tree, id: NodeId, text: impl Into<String>) {
    tree.add_note(id, NoteCategory::Rewrite, text);
}

pub(crate) fn error(tree: &mut Tree, id: NodeId, text: impl Into<String>) {
    tree.add_note(id, NoteCategory::RewriteError, text);
}

fn descend(_: &mut Modifier, _: &mut Tree, _: NodeId) -> bool {
    true
}

fn rules() -> Handlers<Modifier> {
    let handlers = Handlers::new().action(NodeKind::Node, descend);
    let handlers = functions::register(handlers);
    let handlers = statements::register(handlers);
    ddl::register(handlers)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::parser::parse;

    /// Parse and rewrite; returns the tree and the top-level output statements.
    pub(crate) fn rewrite(source: &str) -> (Tree, NodeId, Vec<NodeId>) {
        let mut tree = Tree::new();
        let parsed = parse(&mut tree, source).unwrap();
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        let root = Modifier::new().run(&mut tree, parsed.root);
        let statements = tree.child_ids(root);
        (tree, root, statements)
    }

    pub(crate) fn notes(tree: &Tree, root: NodeId, category: NoteCategory) -> Vec<String> {
        tree.notes_under(root)
            .into_iter()
            .filter(|note| note.category == category)
            .map(|note| note.text.clone())
            .collect()
    }

    #[test]
    fn test_input_tree_is_untouched() {
        let mut tree = Tree::new();
        let parsed = parse(&mut tree, "select isnull(a, 0) from dbo.T").unwrap();
        let before: Vec<_> = (0..tree.len()).map(|i| tree.data(NodeId(i)).clone()).collect();
        let root = Modifier::new().run(&mut tree, parsed.root);
        assert!(root.index() >= before.len());
        for (i, data) in before.iter().enumerate() {
            assert_eq!(tree.data(NodeId(i)), data);
        }
    }

    #[test]
    fn test_no_op_rewrite_matches_deep_clone() {
        let mut tree = Tree::new();
        let parsed = parse(&mut tree, "select a, b + 1 from T where c = 2").unwrap();
        let statement = tree.child_ids(parsed.root)[0];
        let copy = tree.deep_clone(statement);
        let root = Modifier::new().run(&mut tree, parsed.root);
        let rewritten = tree.child_ids(root)[0];
        let shape = |tree: &Tree, id: NodeId| -> Vec<NodeKind> {
            tree.descendants(id).into_iter().map(|n| tree.kind(n)).collect()
        };
        assert_eq!(shape(&tree, copy), shape(&tree, rewritten));
    }

    #[test]
    fn test_comments_survive_rewrite() {
        let source = "-- head\nselect isnull(/* a */ a, 0) as x -- trailing\n\
                      from T with (nolock) /* hint */\n\
                      insert into T values (1) /* one */, (2) -- two\n\
                      drop table A, /* b */ B\n-- tail";
        let mut tree = Tree::new();
        let parsed = parse(&mut tree, source).unwrap();
        let count = tree.comment_count(parsed.root);
        let root = Modifier::new().run(&mut tree, parsed.root);
        assert_eq!(tree.comment_count(root), count);
    }

    #[test]
    fn test_salvaged_comments_stay_in_source_order() {
        let (tree, root, statements) =
            rewrite("select /*c1*/ datediff(/*c2*/ month, /*c3*/ a, b /*c4*/) from T -- c5");
        assert_eq!(tree.comment_count(root), 5);
        let order: Vec<usize> = tree
            .node(statements[0])
            .comments
            .iter()
            .map(|comment| comment.token_index)
            .collect();
        assert!(order.len() >= 4, "{:?}", order);
        assert!(order.windows(2).all(|pair| pair[0] < pair[1]), "{:?}", order);
    }

    #[test]
    fn test_replacement_records_provenance() {
        let (tree, root, _) = rewrite("select len(a)");
        let call = tree
            .descendants(root)
            .into_iter()
            .find(|id| tree.function_name(*id).as_deref() == Some("LENGTH"))
            .unwrap();
        assert!(tree.node(call).replaced.is_none());
        let (tree, root, _) = rewrite("select iif(a > 1, 1, 0)");
        let case = tree
            .descendants(root)
            .into_iter()
            .find(|id| tree.kind(*id) == NodeKind::Case)
            .unwrap();
        assert!(tree.node(case).replaced.is_some());
    }
}
