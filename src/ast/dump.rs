//! Indented kind dump of a subtree, for debugging.

use super::{NodeData, NodeId, Tree};
use std::fmt::Write;

impl Tree {
    /// ```text
    /// Block
    /// ├─ SelectStatement
    /// │  └─ QuerySpecification
    /// ```
    pub fn dump(&self, root: NodeId) -> String {
        let mut out = String::new();
        self.dump_node(root, "", "", &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, lead: &str, child_lead: &str, out: &mut String) {
        let node = self.node(id);
        let _ = write!(out, "{}{}", lead, node.kind().name());
        if let Some(label) = self.label(id) {
            let _ = write!(out, " {}", label);
        }
        if node.hide {
            out.push_str(" [hidden]");
        }
        for note in &node.notes {
            let _ = write!(out, " <{}: {}>", note.category, note.text);
        }
        out.push('\n');

        let children = self.child_ids(id);
        let last = children.len().saturating_sub(1);
        for (i, child) in children.into_iter().enumerate() {
            let (branch, next) = if i == last {
                ("└─ ", "   ")
            } else {
                ("├─ ", "│  ")
            };
            self.dump_node(
                child,
                &format!("{}{}", child_lead, branch),
                &format!("{}{}", child_lead, next),
                out,
            );
        }
    }

    fn label(&self, id: NodeId) -> Option<String> {
        match self.data(id) {
            NodeData::Identifier { name, quoted: true } => Some(format!("\"{}\"", name)),
            NodeData::Identifier { name, .. } => Some(name.clone()),
            NodeData::Variable { name, .. } => Some(name.clone()),
            NodeData::IntegerLiteral { text }
            | NodeData::DecimalLiteral { text }
            | NodeData::DateLiteral { text } => Some(text.clone()),
            NodeData::StringLiteral { value, .. } => Some(format!("'{}'", value)),
            NodeData::DataType { name, .. } => Some(name.clone()),
            NodeData::UnsupportedStatement { description }
            | NodeData::UnsupportedExpression { description }
            | NodeData::UnsupportedClause { description } => Some(description.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_shape() {
        let mut tree = Tree::new();
        let left = tree.column("a");
        let right = tree.int(1);
        let sum = tree.add(NodeData::Additive {
            left,
            op: crate::ast::AddOp::Plus,
            right,
        });
        let dump = tree.dump(sum);
        assert!(dump.starts_with("Additive\n"));
        assert!(dump.contains("├─ ColumnRef"));
        assert!(dump.contains("└─ IntegerLiteral 1"));
    }
}
