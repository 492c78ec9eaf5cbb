//! Identifier resolution pass.
//!
//! Runs over the translated tree, in place. Statements and queries that make
//! tables visible push a scope frame when entered and pop it when left;
//! every object name met on the way is cleaned (empty parts, default schema),
//! given its quoting, resolved against the visible tables when it is a
//! column, and recorded in an [`ObjectCatalog`].

mod catalog;
mod scope;

use std::collections::HashSet;

pub use catalog::{CatalogEntry, ObjectCatalog, ObjectCategory};
pub use scope::{ScopeStack, TableReference};

use crate::ast::{NodeData, NodeId, NodeKind, NoteCategory, Tree};
use crate::config::Config;
use crate::scanner::{Handlers, Scanner};

/// Table name the target uses for queries without FROM.
const DUMMY: &str = "DUMMY";

pub struct IdentifierFixer {
    handlers: Handlers<IdentifierFixer>,
    remove_default_schema: bool,
    default_schema: String,
    scopes: ScopeStack,
    /// Node that pushed each frame of `scopes`.
    owners: Vec<NodeId>,
    /// Query specifications whose frame was pushed by their statement.
    scoped_queries: HashSet<NodeId>,
    /// Names already handled by the node that owns them.
    fixed: HashSet<NodeId>,
    common_tables: HashSet<String>,
    aliases: HashSet<String>,
    catalog: ObjectCatalog,
}

impl Scanner for IdentifierFixer {
    fn handlers(&self) -> &Handlers<Self> {
        &self.handlers
    }
}

impl IdentifierFixer {
    pub fn new(config: &Config) -> Self {
        Self {
            handlers: rules(),
            remove_default_schema: config.remove_default_schema,
            default_schema: config.default_schema.clone(),
            scopes: ScopeStack::new(),
            owners: Vec::new(),
            scoped_queries: HashSet::new(),
            fixed: HashSet::new(),
            common_tables: HashSet::new(),
            aliases: HashSet::new(),
            catalog: ObjectCatalog::new(),
        }
    }

    /// Fix every identifier under `root`.
    pub fn run(&mut self, tree: &mut Tree, root: NodeId) {
        self.scan(tree, root);
        debug_assert!(self.owners.is_empty(), "scope frames left open");
        let aliases: Vec<String> = self.aliases.drain().collect();
        self.catalog.drop_aliases(aliases.iter().map(String::as_str));
        tracing::debug!(
            tables = self.catalog.names(ObjectCategory::Table).len(),
            columns = self.catalog.entries(ObjectCategory::Column).len(),
            "identifiers fixed"
        );
    }

    pub fn catalog(&self) -> &ObjectCatalog {
        &self.catalog
    }

    pub fn into_catalog(self) -> ObjectCatalog {
        self.catalog
    }

    // --- scopes ---

    fn enter(&mut self, owner: NodeId, frame: Vec<TableReference>) {
        for alias in frame.iter().filter_map(|table| table.alias.as_ref()) {
            self.aliases.insert(alias.to_ascii_lowercase());
        }
        self.scopes.push(frame);
        self.owners.push(owner);
    }

    /// Name parts as they will read once the default schema is gone.
    fn name_parts(&self, tree: &Tree, object: NodeId) -> Vec<String> {
        let parts = tree.object_parts(object);
        let count = parts.len();
        parts
            .into_iter()
            .enumerate()
            .filter(|(index, part)| {
                let dropped_schema = self.remove_default_schema
                    && index + 1 < count
                    && part.eq_ignore_ascii_case(&self.default_schema);
                !part.is_empty() && !dropped_schema
            })
            .map(|(_, part)| part)
            .collect()
    }

    fn object_reference(&self, tree: &Tree, object: NodeId) -> TableReference {
        TableReference::new(self.name_parts(tree, object), None, object)
    }

    /// Tables made visible by a FROM item, joins and parentheses included.
    fn collect_sources(&self, tree: &Tree, source: NodeId, out: &mut Vec<TableReference>) {
        let alias_of = |alias: &Option<NodeId>| {
            alias
                .and_then(|alias| tree.identifier_name(alias))
                .map(str::to_string)
        };
        match tree.data(source) {
            NodeData::TableRef { object, alias, .. } => {
                out.push(TableReference::new(
                    self.name_parts(tree, *object),
                    alias_of(alias),
                    source,
                ));
            }
            NodeData::Join { left, right, .. } => {
                self.collect_sources(tree, *left, out);
                self.collect_sources(tree, *right, out);
            }
            NodeData::ParenTable { source } => self.collect_sources(tree, *source, out),
            NodeData::DerivedTable { alias, .. } => {
                out.push(TableReference::new(Vec::new(), alias_of(&Some(*alias)), source));
            }
            NodeData::TableFunction { alias, .. } => {
                if let Some(alias) = alias_of(alias) {
                    out.push(TableReference::new(Vec::new(), Some(alias), source));
                }
            }
            NodeData::VariableTable { variable, alias } => {
                let name = match tree.data(*variable) {
                    NodeData::Variable { name, .. } => name.clone(),
                    _ => String::new(),
                };
                out.push(TableReference::new(vec![name], alias_of(alias), source));
            }
            _ => {}
        }
    }

    /// Frame introduced by `id`, or `None` for nodes that introduce none.
    fn frame_of(&self, tree: &Tree, id: NodeId) -> Option<Vec<TableReference>> {
        let mut frame = Vec::new();
        match tree.data(id) {
            NodeData::UpdateStatement { target, from, .. } => {
                self.collect_sources(tree, *target, &mut frame);
                for source in from {
                    self.collect_sources(tree, *source, &mut frame);
                }
            }
            NodeData::DeleteStatement { target, .. } | NodeData::InsertStatement { target, .. } => {
                self.collect_sources(tree, *target, &mut frame);
            }
            NodeData::QuerySpecification { from, .. } => {
                for source in from {
                    self.collect_sources(tree, *source, &mut frame);
                }
            }
            NodeData::CreateIndex { table, .. } | NodeData::AlterTable { table, .. } => {
                frame.push(self.object_reference(tree, *table));
            }
            NodeData::AlterIndex { table, .. } => {
                frame.extend(table.map(|table| self.object_reference(tree, table)));
            }
            NodeData::DropTable { tables } => {
                frame.extend(tables.iter().map(|table| self.object_reference(tree, *table)));
            }
            NodeData::DropIndex { items } => {
                for item in items {
                    if let NodeData::DropIndexItem { table: Some(table), .. } = tree.data(*item) {
                        frame.push(self.object_reference(tree, *table));
                    }
                }
            }
            _ => return None,
        }
        Some(frame)
    }

    fn enter_scope_of(&mut self, tree: &Tree, id: NodeId) {
        if let Some(frame) = self.frame_of(tree, id) {
            self.enter(id, frame);
        }
    }

    // --- names ---

    /// Clean up the name `id` (a `DbObject` or a lone `Identifier`),
    /// resolve it when it belongs to a table and record it.
    fn fix_name(&mut self, tree: &mut Tree, id: NodeId, category: ObjectCategory) {
        self.fixed.insert(id);
        let parts = match tree.data(id) {
            NodeData::DbObject { parts } => parts.clone(),
            NodeData::Identifier { .. } => vec![id],
            _ => return,
        };

        let count = parts.len();
        let mut kept = Vec::with_capacity(count);
        let mut names = Vec::with_capacity(count);
        let mut schema_removed = false;
        for (index, part) in parts.into_iter().enumerate() {
            let Some(name) = tree.identifier_name(part).map(str::to_string) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            if index + 1 < count && name.eq_ignore_ascii_case(&self.default_schema) {
                if self.remove_default_schema {
                    schema_removed = true;
                    continue;
                }
                quote(tree, part);
            }
            kept.push(part);
            names.push(name);
        }
        if let NodeData::DbObject { parts } = tree.data_mut(id) {
            *parts = kept;
        }
        if schema_removed {
            tree.add_note(
                id,
                NoteCategory::IdentifierFix,
                format!("Schema {} was removed", self.default_schema),
            );
        }

        let name = names.join(".");
        if names.is_empty() {
            tree.add_note(
                id,
                NoteCategory::IdentifierTrace,
                format!("Object {} '{}' has no identifiers", category, name),
            );
            return;
        }

        if category.is_table_bound() {
            let qualifier = names[..names.len() - 1].join(".");
            let tables: Vec<String> = self
                .scopes
                .resolve(Some(qualifier.as_str()))
                .into_iter()
                .map(TableReference::display_name)
                .collect();
            if !qualifier.is_empty() && tables.is_empty() {
                tree.add_note(
                    id,
                    NoteCategory::IdentifierError,
                    format!("Table '{}' of {} '{}' is not in scope", qualifier, category.name().to_lowercase(), name),
                );
            }
            self.catalog.add(category, name.clone(), tables);
        } else if category == ObjectCategory::Table {
            if !name.eq_ignore_ascii_case(DUMMY) {
                self.catalog.add(category, name.clone(), Vec::new());
            }
        } else if category != ObjectCategory::Other {
            self.catalog.add(category, name.clone(), Vec::new());
        }
        tree.add_note(
            id,
            NoteCategory::IdentifierTrace,
            format!("Object {} '{}' caught", category, name),
        );
    }

    fn fix_names(&mut self, tree: &mut Tree, ids: &[NodeId], category: ObjectCategory) {
        for id in ids {
            self.fix_name(tree, *id, category);
        }
    }
}

fn quote(tree: &mut Tree, id: NodeId) {
    if let NodeData::Identifier { quoted, .. } = tree.data_mut(id) {
        *quoted = true;
    }
}

/// The `name` field of a constraint or column definition.
fn name_field(tree: &Tree, id: NodeId) -> Option<NodeId> {
    match tree.data(id) {
        NodeData::ColumnDefinition { name, .. }
        | NodeData::ComputedColumn { name, .. }
        | NodeData::AlterColumn { name, .. }
        | NodeData::DropColumn { name }
        | NodeData::DropConstraint { name }
        | NodeData::OrderedColumn { name, .. } => Some(*name),
        NodeData::PrimaryKey { name, .. }
        | NodeData::UniqueKey { name, .. }
        | NodeData::ForeignKey { name, .. }
        | NodeData::CheckConstraint { name, .. } => *name,
        _ => None,
    }
}

fn descend(_: &mut IdentifierFixer, _: &mut Tree, _: NodeId) -> bool {
    true
}

fn stop(_: &mut IdentifierFixer, _: &mut Tree, _: NodeId) -> bool {
    false
}

/// Pop the frames `id` pushed.
fn leave(f: &mut IdentifierFixer, _: &mut Tree, id: NodeId) -> bool {
    while f.owners.last() == Some(&id) {
        f.owners.pop();
        f.scopes.pop();
    }
    true
}

fn scoped(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    f.enter_scope_of(tree, id);
    true
}

/// The statement's frame also covers ORDER BY, so it is pushed here for
/// the first query specification and not again when that is visited.
fn select_statement(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::SelectStatement { query, .. } = *tree.data(id) else {
        return true;
    };
    let frame = match f.frame_of(tree, query) {
        Some(frame) if tree.kind(query) == NodeKind::QuerySpecification => {
            f.scoped_queries.insert(query);
            frame
        }
        _ => Vec::new(),
    };
    f.enter(id, frame);
    true
}

fn query_specification(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    if !f.scoped_queries.contains(&id) {
        f.enter_scope_of(tree, id);
    }
    true
}

fn insert_statement(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    f.enter_scope_of(tree, id);
    if let NodeData::InsertStatement { columns, .. } = tree.data(id).clone() {
        f.fix_names(tree, &columns, ObjectCategory::Column);
    }
    true
}

fn drop_table(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    f.enter_scope_of(tree, id);
    if let NodeData::DropTable { tables } = tree.data(id).clone() {
        f.fix_names(tree, &tables, ObjectCategory::Table);
    }
    false
}

fn alter_table(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    f.enter_scope_of(tree, id);
    if let NodeData::AlterTable { table, .. } = *tree.data(id) {
        f.fix_name(tree, table, ObjectCategory::Table);
    }
    true
}

fn create_index(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    f.enter_scope_of(tree, id);
    let NodeData::CreateIndex {
        name,
        table,
        columns,
        include,
        ..
    } = tree.data(id).clone()
    else {
        return false;
    };
    f.fix_name(tree, name, ObjectCategory::Other);
    f.fix_name(tree, table, ObjectCategory::Table);
    let columns: Vec<NodeId> = columns
        .iter()
        .filter_map(|column| name_field(tree, *column))
        .chain(include)
        .collect();
    f.fix_names(tree, &columns, ObjectCategory::Column);
    false
}

fn drop_index(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    f.enter_scope_of(tree, id);
    for item in tree.child_ids(id) {
        if let NodeData::DropIndexItem { index, table, .. } = *tree.data(item) {
            f.fix_name(tree, index, ObjectCategory::Index);
            if let Some(table) = table {
                f.fix_name(tree, table, ObjectCategory::Table);
            }
        }
    }
    false
}

fn alter_index(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    f.enter_scope_of(tree, id);
    if let NodeData::AlterIndex { index, table, .. } = *tree.data(id) {
        if let Some(index) = index {
            f.fix_name(tree, index, ObjectCategory::Index);
        }
        if let Some(table) = table {
            f.fix_name(tree, table, ObjectCategory::Table);
        }
    }
    false
}

fn table_ref(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::TableRef { object, .. } = *tree.data(id) else {
        return false;
    };
    let parts = tree.object_parts(object);
    if let [name] = parts.as_slice()
        && f.common_tables.contains(&name.to_ascii_lowercase())
    {
        for part in tree.child_ids(object) {
            quote(tree, part);
        }
        f.fixed.insert(object);
        return false;
    }
    f.fix_name(tree, object, ObjectCategory::Table);
    false
}

fn column_ref(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    if let NodeData::ColumnRef { object } = *tree.data(id) {
        f.fix_name(tree, object, ObjectCategory::Column);
    }
    false
}

/// `t.*` must name a visible table.
fn select_star(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::SelectStar {
        qualifier: Some(qualifier),
    } = *tree.data(id)
    else {
        return false;
    };
    let name = f.name_parts(tree, qualifier).join(".");
    if f.scopes.resolve(Some(name.as_str())).is_empty() {
        tree.add_note(
            qualifier,
            NoteCategory::IdentifierError,
            format!("Table '{}' is not in scope", name),
        );
    }
    f.fix_name(tree, qualifier, ObjectCategory::Other);
    false
}

fn select_item(_: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    if let NodeData::SelectItem {
        alias: Some(alias), ..
    } = *tree.data(id)
    {
        quote(tree, alias);
    }
    true
}

fn common_table(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    if let NodeData::CommonTable { name, .. } = *tree.data(id) {
        if let Some(text) = tree.identifier_name(name) {
            f.common_tables.insert(text.to_ascii_lowercase());
        }
        quote(tree, name);
    }
    true
}

/// Statements whose `name` is the object they create.
fn created_object(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    let name = match tree.data(id) {
        NodeData::CreateTable { name, .. }
        | NodeData::CreateView { name, .. }
        | NodeData::CreateProcedure { name, .. }
        | NodeData::CreateTableType { name, .. } => *name,
        _ => return true,
    };
    f.fix_name(tree, name, ObjectCategory::Other);
    true
}

fn create_trigger(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    if let NodeData::CreateTrigger { name, table, .. } = *tree.data(id) {
        f.fix_name(tree, name, ObjectCategory::Other);
        f.fix_name(tree, table, ObjectCategory::Table);
    }
    true
}

/// Statements naming existing objects; nothing else in them needs fixing.
fn named_objects(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    let (names, category) = match tree.data(id) {
        NodeData::DropView { views } => (views.clone(), ObjectCategory::View),
        NodeData::AlterView { name, .. } => (vec![*name], ObjectCategory::View),
        NodeData::DropProcedure { procedures } => (procedures.clone(), ObjectCategory::Procedure),
        NodeData::DropTrigger { triggers } => (triggers.clone(), ObjectCategory::Trigger),
        NodeData::CreateType { name, .. } | NodeData::DropType { name } => (vec![*name], ObjectCategory::Type),
        NodeData::IdentityInsert { table, .. }
        | NodeData::TruncateTable { table }
        | NodeData::UpdateStatistics { table } => (vec![*table], ObjectCategory::Table),
        NodeData::SetSchema { schema } => (vec![*schema], ObjectCategory::Schema),
        _ => return true,
    };
    f.fix_names(tree, &names, category);
    false
}

fn exec_statement(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    if let NodeData::ExecStatement { procedure, .. } = *tree.data(id) {
        f.fix_name(tree, procedure, ObjectCategory::Procedure);
    }
    true
}

fn function_call(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    if let NodeData::FunctionCall { name, .. } = *tree.data(id) {
        f.fix_name(tree, name, ObjectCategory::Other);
    }
    true
}

/// Column definitions, keys and ALTER TABLE items name things by a lone
/// identifier.
fn definition(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    let category = match tree.kind(id) {
        NodeKind::DropColumn => ObjectCategory::Column,
        NodeKind::DropConstraint => ObjectCategory::Constraint,
        _ => ObjectCategory::Other,
    };
    if let Some(name) = name_field(tree, id) {
        f.fix_name(tree, name, category);
    }
    match tree.data(id).clone() {
        NodeData::PrimaryKey { columns, .. } | NodeData::UniqueKey { columns, .. } => {
            let names: Vec<NodeId> = columns
                .iter()
                .filter_map(|column| name_field(tree, *column))
                .collect();
            f.fix_names(tree, &names, ObjectCategory::Other);
            false
        }
        NodeData::ForeignKey { reference, .. } => {
            f.fix_name(tree, reference, ObjectCategory::Table);
            false
        }
        _ => true,
    }
}

/// Anything not handled by a parent is a column.
fn db_object(f: &mut IdentifierFixer, tree: &mut Tree, id: NodeId) -> bool {
    if !f.fixed.contains(&id) {
        f.fix_name(tree, id, ObjectCategory::Column);
    }
    false
}

fn rules() -> Handlers<IdentifierFixer> {
    Handlers::new()
        .action(NodeKind::Node, descend)
        .post(NodeKind::Node, leave)
        .action(NodeKind::Identifier, stop)
        .action(NodeKind::DbObject, db_object)
        .action(NodeKind::SelectStatement, select_statement)
        .action(NodeKind::QuerySpecification, query_specification)
        .action(NodeKind::UpdateStatement, scoped)
        .action(NodeKind::DeleteStatement, scoped)
        .action(NodeKind::InsertStatement, insert_statement)
        .action(NodeKind::DropTable, drop_table)
        .action(NodeKind::AlterTable, alter_table)
        .action(NodeKind::CreateIndex, create_index)
        .action(NodeKind::DropIndex, drop_index)
        .action(NodeKind::AlterIndex, alter_index)
        .action(NodeKind::TableRef, table_ref)
        .action(NodeKind::ColumnRef, column_ref)
        .action(NodeKind::SelectStar, select_star)
        .action(NodeKind::SelectItem, select_item)
        .action(NodeKind::CommonTable, common_table)
        .action(NodeKind::CreateTable, created_object)
        .action(NodeKind::CreateView, created_object)
        .action(NodeKind::CreateProcedure, created_object)
        .action(NodeKind::CreateTableType, created_object)
        .action(NodeKind::CreateTrigger, create_trigger)
        .action(NodeKind::DropView, named_objects)
        .action(NodeKind::AlterView, named_objects)
        .action(NodeKind::DropProcedure, named_objects)
        .action(NodeKind::DropTrigger, named_objects)
        .action(NodeKind::CreateType, named_objects)
        .action(NodeKind::DropType, named_objects)
        .action(NodeKind::IdentityInsert, named_objects)
        .action(NodeKind::TruncateTable, named_objects)
        .action(NodeKind::UpdateStatistics, named_objects)
        .action(NodeKind::SetSchema, named_objects)
        .action(NodeKind::ExecStatement, exec_statement)
        .action(NodeKind::FunctionCall, function_call)
        .action(NodeKind::TableDefinition, definition)
        .action(NodeKind::AlterColumn, definition)
        .action(NodeKind::DropColumn, definition)
        .action(NodeKind::DropConstraint, definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::Modifier;
    use crate::parser::parse;

    fn fix(source: &str, remove_default_schema: bool) -> (Tree, NodeId, ObjectCatalog) {
        let mut tree = Tree::new();
        let parsed = parse(&mut tree, source).unwrap();
        let root = Modifier::new().run(&mut tree, parsed.root);
        let config = Config {
            remove_default_schema,
            ..Config::default()
        };
        let mut fixer = IdentifierFixer::new(&config);
        fixer.run(&mut tree, root);
        (tree, root, fixer.into_catalog())
    }

    fn notes(tree: &Tree, root: NodeId, category: NoteCategory) -> Vec<String> {
        tree.notes_under(root)
            .into_iter()
            .filter(|note| note.category == category)
            .map(|note| note.text.clone())
            .collect()
    }

    fn identifiers(tree: &Tree, root: NodeId) -> Vec<(String, bool)> {
        tree.descendants(root)
            .into_iter()
            .filter_map(|id| match tree.data(id) {
                NodeData::Identifier { name, quoted } => Some((name.clone(), *quoted)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_default_schema_removed() {
        let (tree, root, catalog) = fix("select id from DB.dbo.[@table] as t0 where t0.id = 1", true);
        assert_eq!(catalog.names(ObjectCategory::Table), vec!["DB.@table"]);
        assert_eq!(
            notes(&tree, root, NoteCategory::IdentifierFix),
            vec!["Schema dbo was removed".to_string()]
        );
        assert!(!identifiers(&tree, root).iter().any(|(name, _)| name == "dbo"));
        assert!(notes(&tree, root, NoteCategory::IdentifierError).is_empty());
    }

    #[test]
    fn test_default_schema_kept_is_quoted() {
        let (tree, root, _) = fix("select id from dbo.T", false);
        assert!(identifiers(&tree, root).contains(&("dbo".to_string(), true)));
        assert!(identifiers(&tree, root).contains(&("T".to_string(), false)));
    }

    #[test]
    fn test_columns_resolve_to_tables() {
        let (tree, root, catalog) = fix(
            "select t1.DocNum, t0.ItemCode from OWOR t1 inner join WOR1 t0 on t0.DocEntry = t1.DocEntry order by t1.DocNum",
            true,
        );
        let columns = catalog.entries(ObjectCategory::Column);
        let doc_num = columns.iter().find(|entry| entry.name == "t1.DocNum").unwrap();
        assert_eq!(doc_num.tables, vec!["OWOR"]);
        let item_code = columns.iter().find(|entry| entry.name == "t0.ItemCode").unwrap();
        assert_eq!(item_code.tables, vec!["WOR1"]);
        assert_eq!(catalog.names(ObjectCategory::Table), vec!["OWOR", "WOR1"]);
        assert!(notes(&tree, root, NoteCategory::IdentifierError).is_empty());
    }

    #[test]
    fn test_unknown_qualifier_is_reported() {
        let (tree, root, _) = fix("select x.a from T as t", true);
        assert_eq!(
            notes(&tree, root, NoteCategory::IdentifierError),
            vec!["Table 'x' of column 'x.a' is not in scope".to_string()]
        );
    }

    #[test]
    fn test_subquery_sees_outer_tables() {
        let (tree, root, catalog) = fix(
            "select * from (select t0.id, name from [@TABLE] as t0) t1 where t1.id = (select max(o.id) from O o where o.id = t1.id)",
            true,
        );
        assert!(notes(&tree, root, NoteCategory::IdentifierError).is_empty());
        let columns = catalog.entries(ObjectCategory::Column);
        let inner = columns.iter().find(|entry| entry.name == "t0.id").unwrap();
        assert_eq!(inner.tables, vec!["@TABLE"]);
    }

    #[test]
    fn test_aliases_and_common_tables_are_quoted() {
        let (tree, root, _) = fix(
            "with cte as (select a from T) select isnull(qty, 0) as qty from cte",
            true,
        );
        let found = identifiers(&tree, root);
        assert!(found.contains(&("qty".to_string(), true)));
        assert_eq!(found.iter().filter(|(name, quoted)| name == "cte" && *quoted).count(), 2);
        assert!(found.contains(&("a".to_string(), false)));
    }

    #[test]
    fn test_dummy_is_left_alone() {
        let (tree, root, catalog) = fix("select 1", true);
        assert!(catalog.names(ObjectCategory::Table).is_empty());
        assert!(identifiers(&tree, root).contains(&("DUMMY".to_string(), false)));
    }

    #[test]
    fn test_ddl_categories() {
        let (_, _, catalog) = fix(
            "drop view dbo.V\ndrop procedure P1, P2\nexec dbo.P3 1\ncreate index IX on T (a, b)\nalter table T drop column c",
            true,
        );
        assert_eq!(catalog.names(ObjectCategory::View), vec!["V"]);
        assert_eq!(catalog.names(ObjectCategory::Procedure), vec!["P1", "P2", "P3"]);
        let columns = catalog.entries(ObjectCategory::Column);
        assert!(columns.iter().all(|entry| entry.tables == vec!["T".to_string()]));
        assert_eq!(columns.len(), 3);
    }

    #[test]
    fn test_empty_name_parts_removed() {
        let (tree, root, catalog) = fix("select * from DB..T", true);
        assert_eq!(catalog.names(ObjectCategory::Table), vec!["DB.T"]);
        assert_eq!(
            identifiers(&tree, root).iter().filter(|(name, _)| name.is_empty()).count(),
            0
        );
    }

    #[test]
    fn test_aliases_are_not_tables() {
        let (_, _, catalog) = fix("update t0 set a = 1 from T as t0", true);
        assert_eq!(catalog.names(ObjectCategory::Table), vec!["T"]);
    }
}
