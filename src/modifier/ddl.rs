//! DDL rules: tables, indexes, views, procedures, functions and types.

use super::statements::variable_name;
use super::{error, info, Modifier};
use crate::ast::{AlterIndexAction, NodeData, NodeId, NodeKind, NoteCategory, ProcedureOption, Tree};
use crate::scanner::Handlers;

pub(super) fn register(handlers: Handlers<Modifier>) -> Handlers<Modifier> {
    handlers
        .action(NodeKind::CreateTable, create_table)
        .post(NodeKind::CreateTable, extract_primary_keys)
        .action(NodeKind::ColumnDefinition, column_options)
        .action(NodeKind::AlterColumn, column_options)
        .action(NodeKind::AddDefinitions, add_definitions)
        .action(NodeKind::AlterTable, alter_table)
        .post(NodeKind::AlterTable, split_alter_table)
        .action(NodeKind::PrimaryKey, key_options)
        .action(NodeKind::UniqueKey, key_options)
        .action(NodeKind::ForeignKey, foreign_key)
        .post(NodeKind::DropTable, split_drop)
        .post(NodeKind::DropView, split_drop)
        .post(NodeKind::DropProcedure, split_drop)
        .post(NodeKind::DropTrigger, split_drop)
        .post(NodeKind::DropIndex, split_drop)
        .action(NodeKind::DropIndexItem, drop_index_item)
        .action(NodeKind::CreateIndex, create_index)
        .action(NodeKind::AlterIndex, alter_index)
        .action(NodeKind::CreateView, create_view)
        .action(NodeKind::AlterView, alter_view)
        .action(NodeKind::CreateProcedure, create_procedure)
        .post(NodeKind::CreateProcedure, output_parameters)
        .action(NodeKind::AlterProcedure, alter_procedure)
        .action(NodeKind::CreateFunction, create_function)
        .action(NodeKind::CreateType, create_type)
}

fn create_table(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let file_group = match tree.data_mut(current) {
        NodeData::CreateTable { file_group, .. } => file_group.take(),
        _ => None,
    };
    if let Some(file_group) = file_group {
        info(tree, current, format!("Filegroup {} was removed", file_group));
    }
    true
}

/// Clear the sort direction of every column of a key.
fn unordered(tree: &mut Tree, key: NodeId) {
    for column in tree.child_ids(key) {
        if let NodeData::OrderedColumn { order, .. } = tree.data_mut(column) {
            *order = None;
        }
    }
}

/// Primary keys, table-level or inline, move to `ALTER TABLE ... ADD`
/// statements after the CREATE TABLE.
fn extract_primary_keys(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let NodeData::CreateTable {
        name, definitions, ..
    } = tree.data(current).clone()
    else {
        return true;
    };

    let mut keys = Vec::new();
    let mut kept = Vec::new();
    for definition in definitions {
        match tree.data_mut(definition) {
            NodeData::PrimaryKey { .. } => {
                keys.push(definition);
                continue;
            }
            NodeData::ColumnDefinition { constraints, .. } => {
                let inline: Vec<NodeId> = constraints.clone();
                constraints.clear();
                for constraint in inline {
                    if tree.kind(constraint) == NodeKind::PrimaryKey {
                        keys.push(constraint);
                    } else if let NodeData::ColumnDefinition { constraints, .. } = tree.data_mut(definition) {
                        constraints.push(constraint);
                    }
                }
            }
            _ => {}
        }
        kept.push(definition);
    }
    if keys.is_empty() {
        return true;
    }
    if let NodeData::CreateTable { definitions, .. } = tree.data_mut(current) {
        *definitions = kept;
    }

    let mut alters = Vec::new();
    for key in keys {
        unordered(tree, key);
        let table = tree.copy_without_comments(name);
        let action = tree.add(NodeData::AddDefinitions {
            with_check: None,
            definitions: vec![key],
        });
        let alter = tree.add(NodeData::AlterTable { table, action });
        info(tree, alter, "PRIMARY KEY was moved to a separate ALTER TABLE statement");
        alters.push(alter);
    }
    m.insert_after(tree, alters);
    true
}

fn column_options(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let (collation, sparse) = match tree.data_mut(current) {
        NodeData::ColumnDefinition {
            collation, sparse, ..
        }
        | NodeData::AlterColumn {
            collation, sparse, ..
        } => (collation.take(), std::mem::take(sparse)),
        _ => return true,
    };
    if let Some(collation) = collation {
        info(tree, current, format!("COLLATE {} was removed", collation));
    }
    if sparse {
        info(tree, current, "SPARSE was removed");
    }
    true
}

fn add_definitions(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let with_check = match tree.data_mut(current) {
        NodeData::AddDefinitions { with_check, .. } => with_check.take(),
        _ => None,
    };
    if let Some(check) = with_check {
        let option = if check { "WITH CHECK" } else { "WITH NOCHECK" };
        info(tree, current, format!("{} was removed", option));
    }
    true
}

fn alter_table(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::AlterTable { action, .. } = *tree.data(id) else {
        return true;
    };
    match tree.data(action).clone() {
        NodeData::TableOption { text } => m.unsupported(tree, id, format!("ALTER TABLE {} is not supported", text)),
        _ => true,
    }
}

/// Column changes stay together; each constraint gets its own ALTER TABLE.
fn split_alter_table(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let NodeData::AlterTable { table, action } = *tree.data(current) else {
        return true;
    };
    let (items, adding) = match tree.data(action) {
        NodeData::AddDefinitions { definitions, .. } => (definitions.clone(), true),
        NodeData::DropDefinitions { items } => (items.clone(), false),
        _ => return true,
    };
    let (columns, constraints): (Vec<NodeId>, Vec<NodeId>) = items.into_iter().partition(|item| {
        matches!(
            tree.kind(*item),
            NodeKind::ColumnDefinition | NodeKind::ComputedColumn | NodeKind::DropColumn
        )
    });
    let mut groups = Vec::new();
    if !columns.is_empty() {
        groups.push(columns);
    }
    groups.extend(constraints.into_iter().map(|constraint| vec![constraint]));
    if groups.len() < 2 {
        return true;
    }

    let group_action = |items: Vec<NodeId>| {
        if adding {
            NodeData::AddDefinitions {
                with_check: None,
                definitions: items,
            }
        } else {
            NodeData::DropDefinitions { items }
        }
    };
    let count = groups.len();
    let mut groups = groups.into_iter();
    let mut statements = vec![current];
    if let Some(first) = groups.next() {
        *tree.data_mut(action) = group_action(first);
    }
    for group in groups {
        let table = tree.copy_without_comments(table);
        let action = tree.add(group_action(group));
        statements.push(tree.add(NodeData::AlterTable { table, action }));
    }
    m.split(tree, statements, &format!("ALTER TABLE was split into {} statements", count));
    true
}

fn key_options(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let (has_options, file_group) = match tree.data_mut(current) {
        NodeData::PrimaryKey {
            clustered,
            has_options,
            file_group,
            ..
        }
        | NodeData::UniqueKey {
            clustered,
            has_options,
            file_group,
            ..
        } => {
            *clustered = None;
            (std::mem::take(has_options), file_group.take())
        }
        _ => return true,
    };
    if has_options {
        info(tree, current, "Index options were removed from the key");
    }
    if let Some(file_group) = file_group {
        info(tree, current, format!("Filegroup {} was removed", file_group));
    }
    true
}

fn foreign_key(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let mut changed = false;
    if let NodeData::ForeignKey {
        on_delete, on_update, ..
    } = tree.data_mut(current)
    {
        for action in [on_delete, on_update].into_iter().flatten() {
            if action.eq_ignore_ascii_case("NO ACTION") {
                *action = "RESTRICT".to_string();
                changed = true;
            }
        }
    }
    if changed {
        info(tree, current, "NO ACTION was converted to RESTRICT");
    }
    true
}

/// Copy of a multi-object DROP holding only `item`.
fn single_drop(data: &NodeData, item: NodeId) -> Option<NodeData> {
    let data = match data {
        NodeData::DropTable { .. } => NodeData::DropTable { tables: vec![item] },
        NodeData::DropView { .. } => NodeData::DropView { views: vec![item] },
        NodeData::DropProcedure { .. } => NodeData::DropProcedure {
            procedures: vec![item],
        },
        NodeData::DropTrigger { .. } => NodeData::DropTrigger {
            triggers: vec![item],
        },
        NodeData::DropIndex { .. } => NodeData::DropIndex { items: vec![item] },
        _ => return None,
    };
    Some(data)
}

fn drop_keyword(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::DropTable => "DROP TABLE",
        NodeKind::DropView => "DROP VIEW",
        NodeKind::DropProcedure => "DROP PROCEDURE",
        NodeKind::DropTrigger => "DROP TRIGGER",
        _ => "DROP INDEX",
    }
}

/// One DROP per object.
fn split_drop(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let data = tree.data(current).clone();
    let items = tree.child_ids(current);
    if items.len() < 2 {
        return true;
    }
    let mut statements = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let Some(single) = single_drop(&data, *item) else {
            return true;
        };
        if position == 0 {
            *tree.data_mut(current) = single;
            statements.push(current);
        } else {
            statements.push(tree.add(single));
        }
    }
    let keyword = drop_keyword(data.kind());
    let count = items.len();
    m.split(
        tree,
        statements,
        &format!("{} with {} objects was split into {} statements", keyword, count, count),
    );
    true
}

fn drop_index_item(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    m.strip(tree, id, "table", NoteCategory::Rewrite, "Table name was removed from DROP INDEX");
    let current = m.current();
    let has_options = match tree.data_mut(current) {
        NodeData::DropIndexItem { has_options, .. } => std::mem::take(has_options),
        _ => false,
    };
    if has_options {
        error(tree, current, "DROP INDEX options are not supported");
    }
    true
}

fn create_index(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    m.strip(tree, id, "include", NoteCategory::Rewrite, "INCLUDE columns were removed");
    m.strip(tree, id, "filter", NoteCategory::RewriteError, "Filtered indexes are not supported; WHERE was removed");
    let current = m.current();
    let (has_options, file_group) = match tree.data_mut(current) {
        NodeData::CreateIndex {
            clustered,
            has_options,
            file_group,
            ..
        } => {
            *clustered = None;
            (std::mem::take(has_options), file_group.take())
        }
        _ => return true,
    };
    if has_options {
        info(tree, current, "Index options were removed");
    }
    if let Some(file_group) = file_group {
        info(tree, current, format!("Filegroup {} was removed", file_group));
    }
    true
}

fn alter_index(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::AlterIndex { index, action, .. } = *tree.data(id) else {
        return true;
    };
    if index.is_none() {
        return m.unsupported(tree, id, "ALTER INDEX ALL is not supported");
    }
    if action != AlterIndexAction::Rebuild {
        let action = format!("{:?}", action).to_uppercase();
        return m.unsupported(tree, id, format!("ALTER INDEX {} is not supported", action));
    }
    m.drop_field(tree, id, "table");
    let current = m.current();
    let has_options = match tree.data_mut(current) {
        NodeData::AlterIndex { has_options, .. } => std::mem::take(has_options),
        _ => false,
    };
    if has_options {
        error(tree, current, "ALTER INDEX options are not supported");
    }
    true
}

fn create_view(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let (check_option, with_attributes) = match tree.data_mut(current) {
        NodeData::CreateView {
            check_option,
            with_attributes,
            ..
        } => (std::mem::take(check_option), std::mem::take(with_attributes)),
        _ => return true,
    };
    if check_option {
        error(tree, current, "WITH CHECK OPTION is not supported");
    }
    if with_attributes {
        error(tree, current, "View attributes are not supported");
    }
    true
}

fn alter_view(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    tree.node_mut(current).hide = true;
    error(tree, current, "ALTER VIEW is not supported; drop and recreate the view");
    true
}

/// Notes for stripped procedure options.
fn strip_procedure_options(tree: &mut Tree, node: NodeId, options: &[ProcedureOption], for_replication: bool) {
    for option in options {
        match option {
            ProcedureOption::Encryption => info(tree, node, "WITH ENCRYPTION was removed"),
            ProcedureOption::Recompile => info(tree, node, "WITH RECOMPILE was removed"),
            ProcedureOption::SchemaBinding => info(tree, node, "WITH SCHEMABINDING was removed"),
            ProcedureOption::NativeCompilation => info(tree, node, "WITH NATIVE_COMPILATION was removed"),
            ProcedureOption::ExecuteAs(principal) => {
                error(tree, node, format!("EXECUTE AS {} is not supported", principal))
            }
        }
    }
    if for_replication {
        info(tree, node, "FOR REPLICATION was removed");
    }
}

fn create_procedure(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    m.reset_assigned();
    let current = m.current();
    let (options, for_replication) = match tree.data_mut(current) {
        NodeData::CreateProcedure {
            options,
            for_replication,
            ..
        } => (std::mem::take(options), std::mem::take(for_replication)),
        _ => return true,
    };
    strip_procedure_options(tree, current, &options, for_replication);
    true
}

/// Parameters written in the body are passed both ways.
fn output_parameters(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let parameters = match tree.data(current) {
        NodeData::CreateProcedure { parameters, .. } => parameters.clone(),
        _ => return true,
    };
    for parameter in parameters {
        let NodeData::Parameter { variable, .. } = *tree.data(parameter) else {
            continue;
        };
        let assigned = variable_name(tree, variable).is_some_and(|name| m.is_assigned(&name));
        if let NodeData::Parameter { output, .. } = tree.data_mut(parameter) {
            *output |= assigned;
        }
    }
    true
}

fn alter_procedure(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    m.unsupported(tree, id, "ALTER PROCEDURE is not supported; drop and recreate the procedure")
}

fn create_function(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::CreateFunction {
        name,
        parameters,
        returns,
        options,
        body,
    } = tree.data(id).clone()
    else {
        return true;
    };
    m.reset_assigned();
    let procedure = tree.add(NodeData::CreateProcedure {
        name,
        parameters,
        options: Vec::new(),
        for_replication: false,
        declarations: Vec::new(),
        body,
    });
    strip_procedure_options(tree, procedure, &options, false);
    if returns.is_some() {
        error(tree, procedure, "Scalar function was converted to a procedure; its return value is lost");
    } else {
        info(tree, procedure, "Table-valued function was converted to a procedure returning a result set");
    }
    m.replace(tree, procedure)
}

fn create_type(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    tree.node_mut(current).hide = true;
    error(tree, current, "Alias data types are not supported");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::tests::{notes, rewrite};

    fn kinds(tree: &Tree, ids: &[NodeId]) -> Vec<NodeKind> {
        ids.iter().map(|id| tree.kind(*id)).collect()
    }

    #[test]
    fn test_drop_table_split() {
        let (tree, _, statements) = rewrite("drop table A, B, C");
        assert_eq!(kinds(&tree, &statements), vec![NodeKind::DropTable; 3]);
        let names: Vec<_> = statements
            .iter()
            .map(|id| {
                let NodeData::DropTable { tables } = tree.data(*id) else {
                    unreachable!()
                };
                tree.object_name(tables[0])
            })
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert!(tree.node(statements[0]).notes.is_empty());
        assert!(tree.node(statements[1]).notes.is_empty());
        assert_eq!(
            tree.node(statements[2]).notes[0].text,
            "DROP TABLE with 3 objects was split into 3 statements"
        );
    }

    #[test]
    fn test_single_drop_is_untouched() {
        let (tree, root, statements) = rewrite("drop view V");
        assert_eq!(statements.len(), 1);
        assert!(tree.notes_under(root).is_empty());
    }

    #[test]
    fn test_primary_key_moves_to_alter() {
        let (tree, _, statements) = rewrite(
            "create table T (id int not null primary key clustered, name varchar(10)) on [PRIMARY]",
        );
        assert_eq!(
            kinds(&tree, &statements),
            vec![NodeKind::CreateTable, NodeKind::AlterTable]
        );
        let found: Vec<_> = tree
            .descendants(statements[0])
            .into_iter()
            .map(|id| tree.kind(id))
            .collect();
        assert!(!found.contains(&NodeKind::PrimaryKey));
        assert_eq!(
            tree.node(statements[0]).notes[0].text,
            "Filegroup PRIMARY was removed"
        );
    }

    #[test]
    fn test_alter_table_constraints_split() {
        let (tree, root, statements) =
            rewrite("alter table T with nocheck add c int null, d int, constraint CK check (c > 0), constraint U unique (d)");
        assert_eq!(kinds(&tree, &statements), vec![NodeKind::AlterTable; 3]);
        assert_eq!(notes(&tree, root, NoteCategory::Rewrite).len(), 2);
    }

    #[test]
    fn test_table_option_is_sentinel() {
        let (tree, _, statements) = rewrite("alter table T set (lock_escalation = table)");
        assert_eq!(kinds(&tree, &statements), vec![NodeKind::UnsupportedStatement]);
    }

    #[test]
    fn test_index_rules() {
        let (tree, root, _) =
            rewrite("create unique nonclustered index IX on T (a desc) include (c) where a > 0 with (fillfactor = 80)");
        assert_eq!(notes(&tree, root, NoteCategory::Rewrite).len(), 2);
        assert_eq!(notes(&tree, root, NoteCategory::RewriteError).len(), 1);
        let (tree, _, statements) = rewrite("alter index all on T rebuild");
        assert_eq!(kinds(&tree, &statements), vec![NodeKind::UnsupportedStatement]);
        let (tree, root, statements) = rewrite("alter index IX on T rebuild");
        assert_eq!(kinds(&tree, &statements), vec![NodeKind::AlterIndex]);
        assert!(notes(&tree, root, NoteCategory::RewriteError).is_empty());
    }

    #[test]
    fn test_assigned_parameters_become_output() {
        let (tree, _, statements) =
            rewrite("create procedure p @a int, @b int, @c int as begin set @b = @a end");
        let NodeData::CreateProcedure { parameters, .. } = tree.data(statements[0]) else {
            unreachable!()
        };
        let outputs: Vec<bool> = parameters
            .iter()
            .map(|id| matches!(tree.data(*id), NodeData::Parameter { output: true, .. }))
            .collect();
        assert_eq!(outputs, vec![false, true, false]);
    }

    #[test]
    fn test_function_becomes_procedure() {
        let (tree, root, statements) = rewrite("create function f(@a int) returns int as begin return @a end");
        assert_eq!(kinds(&tree, &statements), vec![NodeKind::CreateProcedure]);
        assert_eq!(notes(&tree, root, NoteCategory::RewriteError).len(), 1);
        assert!(tree.node(statements[0]).replaced.is_some());
    }

    #[test]
    fn test_view_and_type_rules() {
        let (tree, root, statements) = rewrite("create type udt from varchar(10)\nalter view v as select 1");
        assert!(statements.iter().all(|id| tree.node(*id).hide));
        assert_eq!(notes(&tree, root, NoteCategory::RewriteError).len(), 2);
    }

    #[test]
    fn test_procedure_options() {
        let (tree, root, _) = rewrite("create procedure p with encryption, execute as owner as select 1 from T");
        assert_eq!(notes(&tree, root, NoteCategory::Rewrite), vec!["WITH ENCRYPTION was removed".to_string()]);
        assert_eq!(notes(&tree, root, NoteCategory::RewriteError).len(), 1);
    }
}
