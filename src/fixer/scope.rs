//! Tables visible while resolving identifiers.
//!
//! A [`ScopeStack`] holds one frame per scope-introducing node currently
//! being scanned, outermost first. Frames are trimmed when pushed so an
//! alias never shadows into the table it names.

use serde::Serialize;

use crate::ast::NodeId;

/// A table made visible by a FROM clause or a DML/DDL target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReference {
    /// Name parts as written, default schema already removed.
    pub qualified_name: Vec<String>,
    pub alias: Option<String>,
    #[serde(skip)]
    pub node: NodeId,
}

impl TableReference {
    pub fn new(qualified_name: Vec<String>, alias: Option<String>, node: NodeId) -> Self {
        Self {
            qualified_name,
            alias,
            node,
        }
    }

    /// Dotted name, `db.schema.table`.
    pub fn full_name(&self) -> String {
        self.qualified_name.join(".")
    }

    /// Name used in diagnostics: the table name, or the alias of an unnamed source.
    pub fn display_name(&self) -> String {
        if self.qualified_name.is_empty() {
            self.alias.clone().unwrap_or_default()
        } else {
            self.full_name()
        }
    }

    /// True when `qualifier` designates this table: its alias, its full
    /// name, or the last part of a multi-part name.
    pub fn matches(&self, qualifier: &str) -> bool {
        if self
            .alias
            .as_deref()
            .is_some_and(|alias| alias.eq_ignore_ascii_case(qualifier))
        {
            return true;
        }
        if !self.qualified_name.is_empty() && self.full_name().eq_ignore_ascii_case(qualifier) {
            return true;
        }
        self.qualified_name.len() > 1
            && self
                .qualified_name
                .last()
                .is_some_and(|last| last.eq_ignore_ascii_case(qualifier))
    }

    fn has_part(&self, name: &str) -> bool {
        self.qualified_name.iter().any(|part| part.eq_ignore_ascii_case(name))
    }
}

/// Drop every entry one of whose name parts is the alias of another entry.
pub fn trim(frame: &mut Vec<TableReference>) {
    let aliases: Vec<(usize, String)> = frame
        .iter()
        .enumerate()
        .filter_map(|(index, table)| table.alias.clone().map(|alias| (index, alias)))
        .collect();
    let mut index = 0;
    frame.retain(|table| {
        let position = index;
        index += 1;
        let shadowed = aliases
            .iter()
            .any(|(owner, alias)| *owner != position && table.has_part(alias));
        if shadowed {
            tracing::trace!(table = %table.full_name(), "shadowed table dropped from scope");
        }
        !shadowed
    });
}

/// Stack of scope frames, outermost first.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<Vec<TableReference>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mut frame: Vec<TableReference>) {
        trim(&mut frame);
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Vec<TableReference>> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Tables a reference qualified by `qualifier` may belong to.
    ///
    /// Without a qualifier every visible table is a candidate. With one,
    /// frames are searched outermost first and the first matching table
    /// wins; an empty result means the qualifier is unknown.
    pub fn resolve(&self, qualifier: Option<&str>) -> Vec<&TableReference> {
        match qualifier {
            None | Some("") => self.frames.iter().flatten().collect(),
            Some(qualifier) => self
                .frames
                .iter()
                .flatten()
                .find(|table| table.matches(qualifier))
                .into_iter()
                .collect(),
        }
    }

    /// Every alias currently visible.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.frames
            .iter()
            .flatten()
            .filter_map(|table| table.alias.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, alias: Option<&str>) -> TableReference {
        TableReference::new(
            name.split('.').map(str::to_string).collect(),
            alias.map(str::to_string),
            NodeId(0),
        )
    }

    fn names(found: Vec<&TableReference>) -> Vec<String> {
        found.into_iter().map(TableReference::full_name).collect()
    }

    #[test]
    fn test_qualified_resolution_across_frames() {
        let mut scopes = ScopeStack::new();
        scopes.push(vec![table("T", Some("A"))]);
        scopes.push(vec![table("T2", Some("B"))]);

        assert_eq!(names(scopes.resolve(Some("B"))), vec!["T2"]);
        assert_eq!(names(scopes.resolve(Some("a"))), vec!["T"]);
        assert!(scopes.resolve(Some("C")).is_empty());
    }

    #[test]
    fn test_unqualified_is_every_visible_table() {
        let mut scopes = ScopeStack::new();
        scopes.push(vec![table("T", Some("A"))]);
        scopes.push(vec![table("T2", None), table("T3", None)]);
        assert_eq!(names(scopes.resolve(None)), vec!["T", "T2", "T3"]);
        scopes.pop();
        assert_eq!(names(scopes.resolve(None)), vec!["T"]);
    }

    #[test]
    fn test_name_matching() {
        let reference = table("DB.sales.Orders", None);
        assert!(reference.matches("db.SALES.orders"));
        assert!(reference.matches("orders"));
        assert!(!reference.matches("sales"));
        // A one-part name only matches as a whole.
        assert!(table("Orders", None).matches("ORDERS"));
    }

    #[test]
    fn test_outer_frame_wins() {
        let mut scopes = ScopeStack::new();
        scopes.push(vec![table("Outer", Some("t"))]);
        scopes.push(vec![table("Inner", Some("t"))]);
        assert_eq!(names(scopes.resolve(Some("t"))), vec!["Outer"]);
    }

    #[test]
    fn test_shadowing_trim() {
        let mut frame = vec![table("X", None), table("Y", Some("X"))];
        trim(&mut frame);
        assert_eq!(frame.len(), 1);
        assert_eq!(frame[0].full_name(), "Y");

        // An alias equal to its own table name does not remove it.
        let mut frame = vec![table("X", Some("X"))];
        trim(&mut frame);
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn test_trim_applies_on_push() {
        let mut scopes = ScopeStack::new();
        scopes.push(vec![table("dbo.X", None), table("Y", Some("x"))]);
        assert_eq!(names(scopes.resolve(None)), vec!["Y"]);
        assert_eq!(scopes.aliases().collect::<Vec<_>>(), vec!["x"]);
    }
}
