//! Object names seen by the identifier pass, grouped by category.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// What an identifier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectCategory {
    Column,
    Table,
    Procedure,
    Index,
    Type,
    View,
    Constraint,
    Trigger,
    Schema,
    Other,
}

impl ObjectCategory {
    pub fn name(self) -> &'static str {
        match self {
            ObjectCategory::Column => "COLUMN",
            ObjectCategory::Table => "TABLE",
            ObjectCategory::Procedure => "PROCEDURE",
            ObjectCategory::Index => "INDEX",
            ObjectCategory::Type => "TYPE",
            ObjectCategory::View => "VIEW",
            ObjectCategory::Constraint => "CONSTRAINT",
            ObjectCategory::Trigger => "TRIGGER",
            ObjectCategory::Schema => "SCHEMA",
            ObjectCategory::Other => "OTHER",
        }
    }

    /// Categories whose entries remember the tables they may belong to.
    pub fn is_table_bound(self) -> bool {
        matches!(
            self,
            ObjectCategory::Column | ObjectCategory::Index | ObjectCategory::Constraint
        )
    }
}

impl fmt::Display for ObjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Dotted name as it will be written.
    pub name: String,
    /// Candidate tables, for columns, indexes and constraints.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<String>,
}

/// Side tables of referenced objects.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ObjectCatalog {
    #[serde(flatten)]
    entries: BTreeMap<ObjectCategory, Vec<CatalogEntry>>,
}

impl ObjectCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, category: ObjectCategory, name: impl Into<String>, tables: Vec<String>) {
        self.entries.entry(category).or_default().push(CatalogEntry {
            name: name.into(),
            tables,
        });
    }

    pub fn entries(&self, category: ObjectCategory) -> &[CatalogEntry] {
        self.entries.get(&category).map(Vec::as_slice).unwrap_or_default()
    }

    /// Distinct names of one category, in first-seen order.
    pub fn names(&self, category: ObjectCategory) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in self.entries(category) {
            if !names.iter().any(|name| name.eq_ignore_ascii_case(&entry.name)) {
                names.push(&entry.name);
            }
        }
        names
    }

    /// Forget tables that are really aliases of other tables.
    pub fn drop_aliases<'a>(&mut self, aliases: impl IntoIterator<Item = &'a str>) {
        let aliases: Vec<&str> = aliases.into_iter().collect();
        if let Some(tables) = self.entries.get_mut(&ObjectCategory::Table) {
            tables.retain(|entry| !aliases.iter().any(|alias| alias.eq_ignore_ascii_case(&entry.name)));
        }
    }

    /// Merge another catalog into this one.
    pub fn extend(&mut self, other: ObjectCatalog) {
        for (category, entries) in other.entries {
            self.entries.entry(category).or_default().extend(entries);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_distinct() {
        let mut catalog = ObjectCatalog::new();
        catalog.add(ObjectCategory::Table, "OITM", Vec::new());
        catalog.add(ObjectCategory::Table, "oitm", Vec::new());
        catalog.add(ObjectCategory::Column, "t0.ItemCode", vec!["OITM".to_string()]);
        assert_eq!(catalog.names(ObjectCategory::Table), vec!["OITM"]);
        assert_eq!(catalog.entries(ObjectCategory::Column)[0].tables, vec!["OITM"]);
        assert!(catalog.entries(ObjectCategory::View).is_empty());
    }

    #[test]
    fn test_drop_aliases() {
        let mut catalog = ObjectCatalog::new();
        catalog.add(ObjectCategory::Table, "T0", Vec::new());
        catalog.add(ObjectCategory::Table, "OWOR", Vec::new());
        catalog.drop_aliases(["t0"]);
        assert_eq!(catalog.names(ObjectCategory::Table), vec!["OWOR"]);
    }

    #[test]
    fn test_serializes_by_category() {
        let mut catalog = ObjectCatalog::new();
        catalog.add(ObjectCategory::Procedure, "p", Vec::new());
        let json = serde_json::to_value(&catalog).unwrap();
        assert_eq!(json["procedure"][0]["name"], "p");
    }
}
