//! Traversal and per-kind dispatch shared by every pass.
//!
//! A pass declares its handlers once, keyed by [`NodeKind`], in a
//! [`Handlers`] table. Lookup starts at the node's own kind and walks up
//! [`NodeKind::parent`], so a handler on `Statement` covers every statement
//! kind that has no handler of its own.
//!
//! For each node [`Scanner::scan`] runs three phases:
//!
//! 1. `Pre`, result ignored;
//! 2. `Action`, which returns whether the children are scanned;
//! 3. `Post`.

use std::collections::HashMap;

use crate::ast::{NodeId, NodeKind, Slot, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Pre,
    Action,
    Post,
}

/// A rule. For the action phase the result says whether to descend.
pub type Handler<P> = fn(&mut P, &mut Tree, NodeId) -> bool;

/// Handler table of one pass.
pub struct Handlers<P> {
    pre: HashMap<NodeKind, Handler<P>>,
    action: HashMap<NodeKind, Handler<P>>,
    post: HashMap<NodeKind, Handler<P>>,
}

impl<P> Default for Handlers<P> {
    fn default() -> Self {
        Self {
            pre: HashMap::new(),
            action: HashMap::new(),
            post: HashMap::new(),
        }
    }
}

impl<P> Handlers<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pre(mut self, kind: NodeKind, handler: Handler<P>) -> Self {
        self.pre.insert(kind, handler);
        self
    }

    pub fn action(mut self, kind: NodeKind, handler: Handler<P>) -> Self {
        self.action.insert(kind, handler);
        self
    }

    pub fn post(mut self, kind: NodeKind, handler: Handler<P>) -> Self {
        self.post.insert(kind, handler);
        self
    }

    /// First handler for `phase` on `kind` or any of its super-kinds.
    pub fn lookup(&self, phase: Phase, kind: NodeKind) -> Option<Handler<P>> {
        let table = match phase {
            Phase::Pre => &self.pre,
            Phase::Action => &self.action,
            Phase::Post => &self.post,
        };
        let mut current = Some(kind);
        while let Some(kind) = current {
            if let Some(handler) = table.get(&kind) {
                return Some(*handler);
            }
            current = kind.parent();
        }
        None
    }
}

/// Depth-first traversal with per-kind handlers.
pub trait Scanner: Sized {
    fn handlers(&self) -> &Handlers<Self>;

    /// Visit one node: pre, action (maybe descend), post.
    fn scan(&mut self, tree: &mut Tree, id: NodeId) {
        self.visit(tree, id);
    }

    /// Scan every child of `id` in order.
    fn scan_children(&mut self, tree: &mut Tree, id: NodeId) {
        for (child, slot) in tree.children(id) {
            self.scan_child(tree, child, slot);
        }
    }

    /// Called for each child during descent. Passes that rebuild the tree
    /// need to know where the child goes.
    fn scan_child(&mut self, tree: &mut Tree, child: NodeId, _slot: Slot) {
        self.scan(tree, child);
    }

    fn visit(&mut self, tree: &mut Tree, id: NodeId) {
        self.dispatch(Phase::Pre, tree, id);
        if self.action(tree, id) {
            self.scan_children(tree, id);
        }
        self.dispatch(Phase::Post, tree, id);
    }

    /// Run the action phase. A kind with no action handler anywhere in its
    /// chain is a bug in the pass; release builds log it and descend.
    fn action(&mut self, tree: &mut Tree, id: NodeId) -> bool {
        match self.dispatch(Phase::Action, tree, id) {
            Some(descend) => descend,
            None => {
                let kind = tree.kind(id);
                tracing::error!(kind = kind.name(), "no action handler registered");
                debug_assert!(false, "no action handler for {}", kind.name());
                true
            }
        }
    }

    /// Run the handler for `phase`, if any. `None` when nothing matched.
    fn dispatch(&mut self, phase: Phase, tree: &mut Tree, id: NodeId) -> Option<bool> {
        let handler = self.handlers().lookup(phase, tree.kind(id))?;
        Some(handler(self, tree, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CompareOp, NodeData};

    struct Recorder {
        handlers: Handlers<Recorder>,
        seen: Vec<NodeKind>,
        posts: usize,
    }

    impl Scanner for Recorder {
        fn handlers(&self) -> &Handlers<Self> {
            &self.handlers
        }
    }

    fn record(pass: &mut Recorder, tree: &mut Tree, id: NodeId) -> bool {
        pass.seen.push(tree.kind(id));
        true
    }

    fn record_and_stop(pass: &mut Recorder, tree: &mut Tree, id: NodeId) -> bool {
        pass.seen.push(tree.kind(id));
        false
    }

    fn count_post(pass: &mut Recorder, _tree: &mut Tree, _id: NodeId) -> bool {
        pass.posts += 1;
        true
    }

    fn comparison(tree: &mut Tree) -> NodeId {
        let left = tree.column("a");
        let right = tree.int(1);
        tree.add(NodeData::Comparison {
            left,
            op: CompareOp::Eq,
            right,
        })
    }

    #[test]
    fn test_fallback_to_group_handler() {
        let mut tree = Tree::new();
        let root = comparison(&mut tree);
        let mut pass = Recorder {
            handlers: Handlers::new()
                .action(NodeKind::Node, record)
                .post(NodeKind::Expression, count_post),
            seen: Vec::new(),
            posts: 0,
        };
        pass.scan(&mut tree, root);
        assert_eq!(
            pass.seen,
            vec![
                NodeKind::Comparison,
                NodeKind::ColumnRef,
                NodeKind::DbObject,
                NodeKind::Identifier,
                NodeKind::IntegerLiteral,
            ]
        );
        // Comparison, ColumnRef and IntegerLiteral are expressions.
        assert_eq!(pass.posts, 3);
    }

    #[test]
    fn test_action_false_skips_children() {
        let mut tree = Tree::new();
        let root = comparison(&mut tree);
        let mut pass = Recorder {
            handlers: Handlers::new()
                .action(NodeKind::Node, record)
                .action(NodeKind::ColumnRef, record_and_stop),
            seen: Vec::new(),
            posts: 0,
        };
        pass.scan(&mut tree, root);
        assert!(!pass.seen.contains(&NodeKind::Identifier));
        assert!(pass.seen.contains(&NodeKind::IntegerLiteral));
    }

    #[test]
    fn test_specific_kind_wins() {
        let handlers: Handlers<Recorder> = Handlers::new()
            .action(NodeKind::Expression, record)
            .action(NodeKind::ColumnRef, record_and_stop);
        let specific = handlers.lookup(Phase::Action, NodeKind::ColumnRef);
        let general = handlers.lookup(Phase::Action, NodeKind::IntegerLiteral);
        assert!(specific.is_some() && general.is_some());
        assert!(handlers.lookup(Phase::Action, NodeKind::Block).is_none());
        assert!(handlers.lookup(Phase::Pre, NodeKind::ColumnRef).is_none());
    }

    #[test]
    #[should_panic(expected = "no action handler")]
    fn test_missing_action_handler_fails_fast() {
        let mut tree = Tree::new();
        let root = tree.int(1);
        let mut pass = Recorder {
            handlers: Handlers::new().action(NodeKind::Statement, record),
            seen: Vec::new(),
            posts: 0,
        };
        pass.scan(&mut tree, root);
    }
}
