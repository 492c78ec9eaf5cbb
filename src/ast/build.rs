//! Small constructors and accessors used by the parser and the passes.

use super::{NodeData, NodeId, Tree};

impl Tree {
    pub fn ident(&mut self, name: impl Into<String>) -> NodeId {
        self.add(NodeData::Identifier {
            name: name.into(),
            quoted: false,
        })
    }

    pub fn quoted_ident(&mut self, name: impl Into<String>) -> NodeId {
        self.add(NodeData::Identifier {
            name: name.into(),
            quoted: true,
        })
    }

    /// Multi-part name from plain parts.
    pub fn object(&mut self, parts: &[&str]) -> NodeId {
        let parts = parts.iter().map(|part| self.ident(*part)).collect();
        self.add(NodeData::DbObject { parts })
    }

    pub fn column(&mut self, name: &str) -> NodeId {
        let object = self.object(&[name]);
        self.add(NodeData::ColumnRef { object })
    }

    pub fn int(&mut self, value: i64) -> NodeId {
        self.add(NodeData::IntegerLiteral {
            text: value.to_string(),
        })
    }

    pub fn string(&mut self, value: impl Into<String>) -> NodeId {
        self.add(NodeData::StringLiteral {
            value: value.into(),
            unicode: false,
        })
    }

    pub fn null(&mut self) -> NodeId {
        self.add(NodeData::NullLiteral)
    }

    pub fn variable(&mut self, name: impl Into<String>, argument: bool) -> NodeId {
        self.add(NodeData::Variable {
            name: name.into(),
            argument,
        })
    }

    pub fn data_type(&mut self, name: &str, arguments: &[&str]) -> NodeId {
        self.add(NodeData::DataType {
            name: name.to_string(),
            arguments: arguments.iter().map(|arg| arg.to_string()).collect(),
        })
    }

    /// `NAME(args...)`.
    pub fn call(&mut self, name: &str, arguments: Vec<NodeId>) -> NodeId {
        let name = self.object(&[name]);
        self.add(NodeData::FunctionCall { name, arguments })
    }

    pub fn unsupported_expression(&mut self, description: impl Into<String>) -> NodeId {
        self.add(NodeData::UnsupportedExpression {
            description: description.into(),
        })
    }

    pub fn unsupported_statement(&mut self, description: impl Into<String>) -> NodeId {
        self.add(NodeData::UnsupportedStatement {
            description: description.into(),
        })
    }

    pub fn unsupported_clause(&mut self, description: impl Into<String>) -> NodeId {
        self.add(NodeData::UnsupportedClause {
            description: description.into(),
        })
    }

    pub fn identifier_name(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Identifier { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Part names of a `DbObject`, or of the object behind a `ColumnRef` or
    /// `TableRef`.
    pub fn object_parts(&self, id: NodeId) -> Vec<String> {
        match self.data(id) {
            NodeData::DbObject { parts } => parts
                .iter()
                .filter_map(|part| self.identifier_name(*part))
                .map(str::to_string)
                .collect(),
            NodeData::ColumnRef { object } | NodeData::TableRef { object, .. } => {
                self.object_parts(*object)
            }
            NodeData::Identifier { name, .. } => vec![name.clone()],
            _ => Vec::new(),
        }
    }

    pub fn object_name(&self, id: NodeId) -> String {
        self.object_parts(id).join(".")
    }

    /// Upper-cased function name of a `FunctionCall`.
    pub fn function_name(&self, id: NodeId) -> Option<String> {
        match self.data(id) {
            NodeData::FunctionCall { name, .. } => self
                .object_parts(*name)
                .last()
                .map(|part| part.to_ascii_uppercase()),
            _ => None,
        }
    }

    pub fn function_arguments(&self, id: NodeId) -> Vec<NodeId> {
        match self.data(id) {
            NodeData::FunctionCall { arguments, .. } => arguments.clone(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_parts() {
        let mut tree = Tree::new();
        let object = tree.object(&["DB", "dbo", "T"]);
        assert_eq!(tree.object_name(object), "DB.dbo.T");
        let column = tree.column("qty");
        assert_eq!(tree.object_parts(column), vec!["qty".to_string()]);
    }

    #[test]
    fn test_function_name_is_upper() {
        let mut tree = Tree::new();
        let arg = tree.int(1);
        let call = tree.call("isnull", vec![arg]);
        assert_eq!(tree.function_name(call).as_deref(), Some("ISNULL"));
        assert_eq!(tree.function_arguments(call), vec![arg]);
    }
}
