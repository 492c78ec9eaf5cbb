//! Arena-backed syntax tree.
//!
//! All nodes of one translation live in a single [`Tree`]. The rewrite pass
//! appends its output to the same arena, so replacing a node is an index
//! rewrite and the input tree stays untouched.

mod build;
mod dump;
mod note;
mod nodes;

pub use note::{Comment, CommentKind, Note, NoteCategory};
pub use nodes::*;

use std::fmt;

/// Index of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a child lives in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub field: &'static str,
    /// Position inside a list field, `None` for a single-valued field.
    pub index: Option<usize>,
}

impl Slot {
    pub fn field(field: &'static str) -> Self {
        Self { field, index: None }
    }

    pub fn item(field: &'static str, index: usize) -> Self {
        Self {
            field,
            index: Some(index),
        }
    }

    pub fn is_list(&self) -> bool {
        self.index.is_some()
    }
}

/// One arena entry: payload plus the metadata every kind carries.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub data: NodeData,
    pub notes: Vec<Note>,
    pub comments: Vec<Comment>,
    /// The node this one replaced during a rewrite. Diagnostics only.
    pub replaced: Option<NodeId>,
    /// Statement is not written to the output (its notes still are).
    pub hide: bool,
    /// Statement is followed by a separator when written.
    pub terminate: bool,
}

impl Node {
    pub fn new(data: NodeData) -> Self {
        Self {
            data,
            notes: Vec::new(),
            comments: Vec::new(),
            replaced: None,
            hide: false,
            terminate: true,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node::new(data));
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0].data
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0].data.kind()
    }

    pub fn children(&self, id: NodeId) -> Vec<(NodeId, Slot)> {
        self.nodes[id.0].data.children()
    }

    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).into_iter().map(|(child, _)| child).collect()
    }

    /// Copy of one node: same payload (child slots still point at the
    /// original's children), notes, comments and flags. No provenance.
    pub fn shallow_clone(&mut self, id: NodeId) -> NodeId {
        let mut node = self.nodes[id.0].clone();
        node.replaced = None;
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Copy of a whole subtree; the copy shares nothing with the source.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let copy = self.shallow_clone(id);
        for (child, slot) in self.children(id) {
            let child_copy = self.deep_clone(child);
            self.overwrite(copy, slot, child_copy);
        }
        copy
    }

    /// Put `child` exactly where `slot` says, replacing what is there.
    fn overwrite(&mut self, parent: NodeId, slot: Slot, child: NodeId) {
        match (self.data_mut(parent).field_mut(slot.field), slot.index) {
            (Some(FieldMut::One(field)), _) => *field = child,
            (Some(FieldMut::Opt(field)), _) => *field = Some(child),
            (Some(FieldMut::Many(list)), Some(index)) if index < list.len() => list[index] = child,
            _ => tracing::error!(%parent, field = slot.field, "slot does not exist on node"),
        }
    }

    /// Attach `child` under `parent` at `slot`: list slots append, single
    /// slots are assigned.
    pub fn attach(&mut self, parent: NodeId, slot: Slot, child: NodeId) -> bool {
        match self.data_mut(parent).field_mut(slot.field) {
            Some(FieldMut::One(field)) => *field = child,
            Some(FieldMut::Opt(field)) => *field = Some(child),
            Some(FieldMut::Many(list)) => list.push(child),
            None => return false,
        }
        true
    }

    /// Current occupant of a single-valued field.
    pub fn field_value(&mut self, parent: NodeId, field: &str) -> Option<NodeId> {
        match self.data_mut(parent).field_mut(field) {
            Some(FieldMut::One(id)) => Some(*id),
            Some(FieldMut::Opt(id)) => *id,
            _ => None,
        }
    }

    /// Swap `old` for `new` wherever `parent` refers to it. Identity based,
    /// first occurrence only.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) -> bool {
        let slot = self
            .children(parent)
            .into_iter()
            .find(|(child, _)| *child == old)
            .map(|(_, slot)| slot);
        match slot {
            Some(slot) => {
                self.overwrite(parent, slot, new);
                true
            }
            None => false,
        }
    }

    /// Remove `child` from whichever field of `parent` holds it. A single
    /// required field cannot be emptied and reports `false`.
    pub fn detach_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some((_, slot)) = self
            .children(parent)
            .into_iter()
            .find(|(id, _)| *id == child)
        else {
            return false;
        };
        match self.data_mut(parent).field_mut(slot.field) {
            Some(FieldMut::Opt(field)) => {
                *field = None;
                true
            }
            Some(FieldMut::Many(list)) => {
                list.retain(|id| *id != child);
                true
            }
            _ => false,
        }
    }

    /// Add a note unless the node already has the same one.
    pub fn add_note(&mut self, id: NodeId, category: NoteCategory, text: impl Into<String>) {
        let note = Note::new(category, text);
        let notes = &mut self.nodes[id.0].notes;
        if !notes.contains(&note) {
            notes.push(note);
        }
    }

    pub fn take_comments(&mut self, id: NodeId) -> Vec<Comment> {
        std::mem::take(&mut self.nodes[id.0].comments)
    }

    pub fn take_notes(&mut self, id: NodeId) -> Vec<Note> {
        std::mem::take(&mut self.nodes[id.0].notes)
    }

    /// Add comments to `id`, keeping its list in source order.
    pub fn append_comments(&mut self, id: NodeId, comments: Vec<Comment>) {
        let list = &mut self.nodes[id.0].comments;
        list.extend(comments);
        list.sort_by_key(|comment| comment.token_index);
    }

    pub fn append_notes(&mut self, id: NodeId, notes: Vec<Note>) {
        for note in notes {
            self.add_note(id, note.category, note.text);
        }
    }

    /// Move all comments of `from` to `to`.
    pub fn move_comments(&mut self, from: NodeId, to: NodeId) {
        if from != to {
            let comments = self.take_comments(from);
            self.append_comments(to, comments);
        }
    }

    /// Pre-order walk of a subtree, `root` first.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children = self.child_ids(id);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Comments attached anywhere below (and on) `root`.
    pub fn comment_count(&self, root: NodeId) -> usize {
        self.descendants(root)
            .into_iter()
            .map(|id| self.node(id).comments.len())
            .sum()
    }

    /// All notes under `root`, in pre-order.
    pub fn notes_under(&self, root: NodeId) -> Vec<&Note> {
        self.descendants(root)
            .into_iter()
            .flat_map(|id| self.node(id).notes.iter())
            .collect()
    }

    /// Replace `anchor` inside a list field of `parent` by `nodes`, in order.
    /// `false` when `anchor` is not held in a list of `parent`.
    pub fn splice_list(&mut self, parent: NodeId, anchor: NodeId, nodes: Vec<NodeId>) -> bool {
        let Some((_, slot)) = self
            .children(parent)
            .into_iter()
            .find(|(child, slot)| *child == anchor && slot.is_list())
        else {
            return false;
        };
        match (self.data_mut(parent).field_mut(slot.field), slot.index) {
            (Some(FieldMut::Many(list)), Some(index)) => {
                list.splice(index..=index, nodes);
                true
            }
            _ => false,
        }
    }

    /// Deep copy of a subtree that carries no comments, for nodes repeated
    /// in generated statements.
    pub fn copy_without_comments(&mut self, id: NodeId) -> NodeId {
        let copy = self.deep_clone(id);
        for node in self.descendants(copy) {
            self.nodes[node.0].comments.clear();
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(tree: &mut Tree) -> NodeId {
        let a = tree.column("a");
        let b = tree.int(1);
        tree.add(NodeData::Comparison {
            left: a,
            op: CompareOp::Eq,
            right: b,
        })
    }

    #[test]
    fn test_note_dedup() {
        let mut tree = Tree::new();
        let id = tree.int(0);
        tree.add_note(id, NoteCategory::Rewrite, "same");
        tree.add_note(id, NoteCategory::Rewrite, "same");
        tree.add_note(id, NoteCategory::RewriteError, "same");
        assert_eq!(tree.node(id).notes.len(), 2);
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let mut tree = Tree::new();
        let root = sample(&mut tree);
        let copy = tree.deep_clone(root);
        let original: Vec<_> = tree.child_ids(root);
        let cloned: Vec<_> = tree.child_ids(copy);
        assert_eq!(original.len(), cloned.len());
        assert!(original.iter().all(|id| !cloned.contains(id)));
        assert_eq!(tree.kind(copy), NodeKind::Comparison);
    }

    #[test]
    fn test_replace_and_detach() {
        let mut tree = Tree::new();
        let first = tree.int(1);
        let second = tree.int(2);
        let row = tree.add(NodeData::ValuesRow {
            values: vec![first, second],
        });
        let third = tree.int(3);
        assert!(tree.replace_child(row, second, third));
        assert_eq!(tree.child_ids(row), vec![first, third]);
        assert!(tree.detach_child(row, first));
        assert_eq!(tree.child_ids(row), vec![third]);
    }

    #[test]
    fn test_attach_appends_to_lists() {
        let mut tree = Tree::new();
        let block = tree.add(NodeData::Block { statements: vec![] });
        let go = tree.add(NodeData::GoStatement);
        assert!(tree.attach(block, Slot::item("statements", 7), go));
        assert_eq!(tree.child_ids(block), vec![go]);
        assert!(!tree.attach(block, Slot::field("missing"), go));
    }

    #[test]
    fn test_splice_list() {
        let mut tree = Tree::new();
        let a = tree.int(1);
        let b = tree.int(2);
        let row = tree.add(NodeData::ValuesRow { values: vec![a, b] });
        let c = tree.int(3);
        let d = tree.int(4);
        assert!(tree.splice_list(row, a, vec![c, a, d]));
        assert_eq!(tree.child_ids(row), vec![c, a, d, b]);
        let cmp = sample(&mut tree);
        let left = tree.child_ids(cmp)[0];
        assert!(!tree.splice_list(cmp, left, vec![c]));
    }

    #[test]
    fn test_copy_without_comments() {
        let mut tree = Tree::new();
        let root = sample(&mut tree);
        tree.append_comments(root, vec![Comment::single("-- a", 0)]);
        let copy = tree.copy_without_comments(root);
        assert_eq!(tree.comment_count(copy), 0);
        assert_eq!(tree.comment_count(root), 1);
    }

    #[test]
    fn test_comment_count() {
        let mut tree = Tree::new();
        let root = sample(&mut tree);
        let leaf = tree.child_ids(root)[0];
        tree.append_comments(leaf, vec![Comment::single("-- a", 0)]);
        tree.append_comments(root, vec![Comment::multi("/* b */", 1)]);
        assert_eq!(tree.comment_count(root), 2);
    }

    #[test]
    fn test_moved_comments_keep_source_order() {
        let mut tree = Tree::new();
        let root = sample(&mut tree);
        let leaf = tree.child_ids(root)[0];
        tree.append_comments(root, vec![Comment::single("-- last", 9)]);
        tree.append_comments(leaf, vec![Comment::multi("/* b */", 4), Comment::multi("/* a */", 1)]);
        tree.move_comments(leaf, root);
        let order: Vec<usize> = tree.node(root).comments.iter().map(|c| c.token_index).collect();
        assert_eq!(order, vec![1, 4, 9]);
    }
}
