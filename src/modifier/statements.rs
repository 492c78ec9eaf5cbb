//! Query, DML and procedural rules.

use super::functions::{grouped, is_string};
use super::{error, info, Modifier};
use crate::ast::{
    AddOp, AssignOp, CompareOp, CursorAction, MulOp, NodeData, NodeId, NodeKind, NoteCategory, Slot,
    TransactionAction, Tree,
};
use crate::scanner::Handlers;

pub(super) fn register(handlers: Handlers<Modifier>) -> Handlers<Modifier> {
    handlers
        .action(NodeKind::SelectStatement, select_statement)
        .post(NodeKind::SelectStatement, select_into_table)
        .post(NodeKind::QuerySpecification, query_specification)
        .action(NodeKind::Top, top)
        .action(NodeKind::TableRef, table_ref)
        .action(NodeKind::InsertStatement, insert_statement)
        .post(NodeKind::InsertStatement, split_insert_rows)
        .action(NodeKind::UpdateStatement, update_statement)
        .action(NodeKind::DeleteStatement, delete_statement)
        .post(NodeKind::SetColumn, set_column)
        .post(NodeKind::SetVariable, set_variable)
        .post(NodeKind::ScalarDeclaration, scalar_declaration)
        .post(NodeKind::TableDeclaration, table_declaration)
        .post(NodeKind::DeclareStatement, hoist_declarations)
        .action(NodeKind::CursorDeclaration, cursor_declaration)
        .action(NodeKind::CursorName, cursor_name)
        .post(NodeKind::FetchStatement, fetch_statement)
        .post(NodeKind::IfStatement, hoist_condition)
        .action(NodeKind::ExecStatement, exec_statement)
        .post(NodeKind::ExecArgument, exec_argument)
        .action(NodeKind::ExecOption, exec_option)
        .action(NodeKind::ReturnStatement, return_statement)
        .action(NodeKind::UseStatement, use_statement)
        .action(NodeKind::GoStatement, hidden)
        .action(NodeKind::TransactionStatement, transaction)
        .action(NodeKind::WaitForStatement, hidden)
        .action(NodeKind::ThrowStatement, hidden)
        .action(NodeKind::GotoStatement, hidden)
        .action(NodeKind::LabelStatement, hidden)
        .action(NodeKind::CursorStatement, cursor_statement)
        .action(NodeKind::SetOption, set_option)
        .action(NodeKind::IdentityInsert, unsupported_statement)
        .action(NodeKind::UpdateStatistics, unsupported_statement)
        .action(NodeKind::TryStatement, try_statement)
        .post(NodeKind::TryStatement, unwrap_try)
}

// --- shared builders ---

fn dummy_table(tree: &mut Tree) -> NodeId {
    let object = tree.object(&["DUMMY"]);
    tree.add(NodeData::TableRef {
        object,
        alias: None,
        hints: Vec::new(),
        sample: None,
    })
}

/// `SELECT <value> INTO <variable> FROM DUMMY`
pub(super) fn select_into(tree: &mut Tree, variable: NodeId, value: NodeId) -> NodeId {
    let item = tree.add(NodeData::SelectItem { value, alias: None });
    let select = tree.add(NodeData::SelectClause {
        distinct: false,
        top: None,
        items: vec![item],
    });
    let from = dummy_table(tree);
    let query = tree.add(NodeData::QuerySpecification {
        select,
        into: None,
        into_variables: vec![variable],
        from: vec![from],
        where_clause: None,
        group_by: Vec::new(),
        having: None,
    });
    tree.add(NodeData::SelectStatement {
        with_clause: None,
        query,
        order_by: Vec::new(),
        option: None,
    })
}

pub(super) fn variable_name(tree: &Tree, id: NodeId) -> Option<String> {
    match tree.data(id) {
        NodeData::Variable { name, .. } => Some(name.clone()),
        _ => None,
    }
}

/// Mark a variable as an assignment target: written without `:`.
pub(super) fn assign_to(m: &mut Modifier, tree: &mut Tree, variable: NodeId) {
    if let NodeData::Variable { name, argument } = tree.data_mut(variable) {
        *argument = false;
        let name = name.clone();
        m.mark_assigned(&name);
    }
}

/// `target op= value` spelled out as `target = target op value`.
fn compound(tree: &mut Tree, target: NodeId, op: AssignOp, value: NodeId) -> NodeId {
    if op == AssignOp::Assign {
        return value;
    }
    let left = tree.copy_without_comments(target);
    if let NodeData::Variable { argument, .. } = tree.data_mut(left) {
        *argument = true;
    }
    let right = grouped(tree, value);
    let data = match op {
        AssignOp::Sub => NodeData::Additive {
            left,
            op: AddOp::Minus,
            right,
        },
        AssignOp::Mul => NodeData::Multiplicative {
            left,
            op: MulOp::Mul,
            right,
        },
        AssignOp::Div => NodeData::Multiplicative {
            left,
            op: MulOp::Div,
            right,
        },
        _ if is_string(tree, value) => NodeData::Concat { left, right },
        _ => NodeData::Additive {
            left,
            op: AddOp::Plus,
            right,
        },
    };
    tree.add(data)
}

/// Turn a scalar subquery statement into `SELECT ... INTO variable`.
fn into_variable(tree: &mut Tree, statement: NodeId, variable: NodeId) -> bool {
    let NodeData::SelectStatement { query, .. } = *tree.data(statement) else {
        return false;
    };
    match tree.data_mut(query) {
        NodeData::QuerySpecification { into_variables, .. } => into_variables.push(variable),
        _ => return false,
    }
    tree.node_mut(statement).terminate = true;
    true
}

/// Statement assigning `value` to the (already translated) `variable`.
fn assignment(tree: &mut Tree, variable: NodeId, value: NodeId) -> NodeId {
    if let NodeData::Subquery { query } = *tree.data(value)
        && into_variable(tree, query, variable)
    {
        return query;
    }
    tree.add(NodeData::SetVariable {
        variable,
        op: AssignOp::Assign,
        value,
    })
}

fn is_constant(tree: &Tree, id: NodeId) -> bool {
    match tree.data(id) {
        NodeData::IntegerLiteral { .. }
        | NodeData::DecimalLiteral { .. }
        | NodeData::StringLiteral { .. }
        | NodeData::NullLiteral
        | NodeData::DateLiteral { .. } => true,
        NodeData::Unary { operand, .. } => is_constant(tree, *operand),
        _ => false,
    }
}

fn move_metadata(tree: &mut Tree, from: NodeId, to: NodeId) {
    tree.move_comments(from, to);
    let notes = tree.take_notes(from);
    tree.append_notes(to, notes);
}

// --- queries ---

/// Statement directly inside a statement sequence.
fn statement_level(m: &Modifier, tree: &Tree) -> bool {
    matches!(
        m.parent_kind(tree),
        Some(NodeKind::Block | NodeKind::IfStatement | NodeKind::WhileStatement | NodeKind::CreateTrigger)
    )
}

fn select_statement(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    if m.inside(tree, NodeKind::CreateTrigger) && statement_level(m, tree) {
        return m.unsupported(tree, id, "Result sets cannot be returned from a trigger");
    }
    m.strip(tree, id, "option", NoteCategory::RewriteError, "OPTION clause was removed");
    true
}

/// `SELECT ... INTO table` becomes `CREATE TABLE table AS (SELECT ...)`.
fn select_into_table(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let NodeData::SelectStatement { query, .. } = *tree.data(current) else {
        return true;
    };
    let target = match tree.data_mut(query) {
        NodeData::QuerySpecification { into, .. } => into.take(),
        _ => None,
    };
    let Some(target) = target else {
        return true;
    };
    let create = tree.add(NodeData::CreateTable {
        name: target,
        definitions: Vec::new(),
        query: Some(current),
        file_group: None,
    });
    tree.node_mut(create).terminate = tree.node(current).terminate;
    tree.node_mut(current).terminate = false;
    move_metadata(tree, current, create);
    info(tree, create, "SELECT INTO was converted to CREATE TABLE AS");
    m.splice(tree, create);
    true
}

fn query_specification(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let NodeData::QuerySpecification { select, from, .. } = tree.data(current).clone() else {
        return true;
    };
    if from.is_empty() {
        let dummy = dummy_table(tree);
        if let NodeData::QuerySpecification { from, .. } = tree.data_mut(current) {
            from.push(dummy);
        }
        info(tree, current, "FROM DUMMY was added");
    }

    let items = match tree.data(select) {
        NodeData::SelectClause { items, .. } => items.clone(),
        _ => Vec::new(),
    };
    for item in items {
        let NodeData::SelectVariableItem {
            variable,
            op,
            value,
        } = *tree.data(item)
        else {
            continue;
        };
        let value = compound(tree, variable, op, value);
        assign_to(m, tree, variable);
        let replacement = tree.add(NodeData::SelectItem { value, alias: None });
        move_metadata(tree, item, replacement);
        tree.replace_child(select, item, replacement);
        if let NodeData::QuerySpecification { into_variables, .. } = tree.data_mut(current) {
            into_variables.push(variable);
        }
    }
    true
}

fn top(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let (percent, with_ties) = match tree.data_mut(current) {
        NodeData::Top { percent, with_ties, .. } => (std::mem::take(percent), std::mem::take(with_ties)),
        _ => return true,
    };
    if percent {
        error(tree, current, "TOP PERCENT is not supported");
    }
    if with_ties {
        error(tree, current, "TOP WITH TIES is not supported");
    }
    true
}

fn table_ref(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let (hints, sample) = match tree.data_mut(current) {
        NodeData::TableRef { hints, sample, .. } => (std::mem::take(hints), sample.take()),
        _ => return true,
    };
    if !hints.is_empty() {
        info(tree, current, format!("Table hints were removed: {}", hints.join(", ")));
    }
    if sample.is_some() {
        info(tree, current, "TABLESAMPLE was removed");
    }
    true
}

// --- DML ---

fn insert_statement(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::InsertStatement { source, .. } = *tree.data(id) else {
        return true;
    };
    match tree.kind(source) {
        NodeKind::ValuesExec => return m.unsupported(tree, id, "INSERT ... EXEC is not supported"),
        NodeKind::DefaultValues => return m.unsupported(tree, id, "INSERT ... DEFAULT VALUES is not supported"),
        _ => {}
    }
    m.strip(tree, id, "with_clause", NoteCategory::RewriteError, "WITH clause of INSERT was removed");
    m.strip(tree, id, "top", NoteCategory::RewriteError, "TOP clause of INSERT was removed");
    m.strip(tree, id, "output", NoteCategory::RewriteError, "OUTPUT clause was removed");
    true
}

/// One INSERT per VALUES row.
fn split_insert_rows(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let NodeData::InsertStatement {
        target,
        columns,
        source,
        ..
    } = tree.data(current).clone()
    else {
        return true;
    };
    let rows = match tree.data_mut(source) {
        NodeData::ValuesList { rows } if rows.len() > 1 => rows.split_off(1),
        _ => return true,
    };
    let mut statements = vec![current];
    for row in rows {
        let target = tree.copy_without_comments(target);
        let columns = columns
            .iter()
            .map(|column| tree.copy_without_comments(*column))
            .collect();
        let source = tree.add(NodeData::ValuesList { rows: vec![row] });
        statements.push(tree.add(NodeData::InsertStatement {
            with_clause: None,
            top: None,
            target,
            columns,
            output: None,
            source,
        }));
    }
    let count = statements.len();
    m.split(tree, statements, &format!("INSERT with {} rows was split into {} statements", count, count));
    true
}

fn update_statement(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    m.strip(tree, id, "with_clause", NoteCategory::RewriteError, "WITH clause of UPDATE was removed");
    m.strip(tree, id, "top", NoteCategory::RewriteError, "TOP clause of UPDATE was removed");
    m.strip(tree, id, "output", NoteCategory::RewriteError, "OUTPUT clause was removed");
    m.strip(tree, id, "option", NoteCategory::RewriteError, "OPTION clause was removed");
    true
}

fn delete_statement(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    m.strip(tree, id, "from", NoteCategory::RewriteError, "Second FROM clause of DELETE was removed");
    m.strip(tree, id, "with_clause", NoteCategory::RewriteError, "WITH clause of DELETE was removed");
    m.strip(tree, id, "top", NoteCategory::RewriteError, "TOP clause of DELETE was removed");
    m.strip(tree, id, "output", NoteCategory::RewriteError, "OUTPUT clause was removed");
    m.strip(tree, id, "option", NoteCategory::RewriteError, "OPTION clause was removed");
    true
}

fn set_column(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let NodeData::SetColumn { target, op, value } = *tree.data(current) else {
        return true;
    };
    if op == AssignOp::Assign {
        return true;
    }
    let value = compound(tree, target, op, value);
    *tree.data_mut(current) = NodeData::SetColumn {
        target,
        op: AssignOp::Assign,
        value,
    };
    true
}

// --- procedural ---

fn set_variable(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let NodeData::SetVariable {
        variable,
        op,
        value,
    } = *tree.data(current)
    else {
        return true;
    };
    let value = compound(tree, variable, op, value);
    assign_to(m, tree, variable);
    *tree.data_mut(current) = NodeData::SetVariable {
        variable,
        op: AssignOp::Assign,
        value,
    };

    if let NodeData::Subquery { query } = *tree.data(value)
        && into_variable(tree, query, variable)
    {
        move_metadata(tree, current, query);
        m.splice(tree, query);
    }
    true
}

fn scalar_declaration(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    if let NodeData::ScalarDeclaration { variable, .. } = *tree.data(current)
        && let NodeData::Variable { argument, .. } = tree.data_mut(variable)
    {
        *argument = false;
    }
    true
}

/// `DECLARE @t TABLE (...)` becomes a table type plus a scalar declaration.
fn table_declaration(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let NodeData::TableDeclaration {
        variable,
        definitions,
    } = tree.data(current).clone()
    else {
        return true;
    };
    let base = variable_name(tree, variable)
        .unwrap_or_default()
        .trim_start_matches('@')
        .to_string();
    let type_name = format!("{}_TYPE", base);
    let name = tree.object(&[&type_name]);
    let create = tree.add(NodeData::CreateTableType { name, definitions });
    info(tree, create, format!("Table variable {} was given table type {}", base, type_name));

    if let NodeData::Variable { argument, .. } = tree.data_mut(variable) {
        *argument = false;
    }
    let data_type = tree.data_type(&type_name, &[]);
    let scalar = tree.add(NodeData::ScalarDeclaration {
        variable,
        data_type,
        value: None,
    });
    move_metadata(tree, current, scalar);
    m.splice(tree, scalar);
    m.insert_before(tree, vec![create], true);
    true
}

/// Inside a procedure, declarations move to its declaration section, one
/// statement per variable. Non-constant initial values stay behind as
/// assignments.
fn hoist_declarations(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let Some(procedure) = m.nearest_procedure(tree) else {
        return true;
    };
    let current = m.current();
    let mut hoisted = Vec::new();
    let mut assignments = Vec::new();
    for declaration in tree.child_ids(current) {
        if let NodeData::ScalarDeclaration {
            variable,
            value: Some(value),
            ..
        } = *tree.data(declaration)
            && !is_constant(tree, value)
        {
            if let NodeData::ScalarDeclaration { value, .. } = tree.data_mut(declaration) {
                *value = None;
            }
            let target = tree.copy_without_comments(variable);
            assign_to(m, tree, target);
            assignments.push(assignment(tree, target, value));
        }
        hoisted.push(tree.add(NodeData::DeclareStatement {
            declarations: vec![declaration],
        }));
    }
    let Some(&heir) = hoisted.first() else {
        return true;
    };
    for statement in &hoisted {
        tree.attach(procedure, Slot::item("declarations", 0), *statement);
    }
    tracing::trace!(count = hoisted.len(), "declarations hoisted");
    if assignments.is_empty() {
        m.remove_current(tree, heir);
    } else {
        move_metadata(tree, current, heir);
        m.splice_many(tree, assignments);
    }
    true
}

fn cursor_declaration(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let for_update = match tree.data_mut(current) {
        NodeData::CursorDeclaration { for_update, .. } => std::mem::take(for_update),
        _ => false,
    };
    if for_update {
        info(tree, current, "FOR UPDATE was removed from the cursor declaration");
    }
    true
}

fn cursor_name(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let renamed = match tree.data_mut(current) {
        NodeData::CursorName { name, variable } if *variable => {
            *variable = false;
            *name = name.trim_start_matches('@').to_string();
            Some(name.clone())
        }
        _ => None,
    };
    if let Some(name) = renamed {
        info(tree, current, format!("Cursor variable was converted to cursor {}", name));
    }
    true
}

fn fetch_statement(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let into = match tree.data(current) {
        NodeData::FetchStatement { into, .. } => into.clone(),
        _ => return true,
    };
    for variable in into {
        assign_to(m, tree, variable);
    }
    true
}

/// IF conditions holding a query are evaluated beforehand into a
/// `temp_var_N` variable.
fn hoist_condition(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let NodeData::IfStatement { condition, .. } = *tree.data(current) else {
        return true;
    };
    let shape = tree.data(condition).clone();
    let subquery = |id: NodeId| tree.kind(id) == NodeKind::Subquery;
    let hoistable = match &shape {
        NodeData::Exists { .. } => true,
        NodeData::Not { operand } => tree.kind(*operand) == NodeKind::Exists,
        NodeData::Comparison { left, right, .. } => subquery(*left) || subquery(*right),
        NodeData::IsNull { operand, .. } => subquery(*operand),
        _ => false,
    };
    if !hoistable {
        return true;
    }
    let temp = m.temp_var();
    let reference = tree.variable(&temp, true);

    let (value, condition) = match shape {
        NodeData::Exists { .. } => {
            let value = exists_flag(tree, condition);
            let zero = tree.int(0);
            (value, NodeData::Comparison { left: reference, op: CompareOp::Gt, right: zero })
        }
        NodeData::Not { operand } if tree.kind(operand) == NodeKind::Exists => {
            let value = exists_flag(tree, operand);
            let zero = tree.int(0);
            (value, NodeData::Comparison { left: reference, op: CompareOp::Eq, right: zero })
        }
        NodeData::Comparison { left, op, right } if tree.kind(left) == NodeKind::Subquery => {
            (left, NodeData::Comparison { left: reference, op, right })
        }
        NodeData::Comparison { left, op, right } if tree.kind(right) == NodeKind::Subquery => {
            (right, NodeData::Comparison { left, op, right: reference })
        }
        NodeData::IsNull { operand, negated } if tree.kind(operand) == NodeKind::Subquery => {
            (operand, NodeData::IsNull { operand: reference, negated })
        }
        _ => return true,
    };
    let condition = tree.add(condition);
    if let NodeData::IfStatement { condition: slot, .. } = tree.data_mut(current) {
        *slot = condition;
    }

    let declared = tree.variable(&temp, false);
    let int = tree.data_type("INT", &[]);
    let declaration = tree.add(NodeData::ScalarDeclaration {
        variable: declared,
        data_type: int,
        value: None,
    });
    let declare = tree.add(NodeData::DeclareStatement {
        declarations: vec![declaration],
    });
    let target = tree.variable(&temp, false);
    let fill = select_into(tree, target, value);
    info(tree, fill, format!("IF condition was evaluated into {}", temp));

    let before = match m.nearest_procedure(tree) {
        Some(procedure) => {
            tree.attach(procedure, Slot::item("declarations", 0), declare);
            vec![fill]
        }
        None => vec![declare, fill],
    };
    m.insert_before(tree, before, false);
    true
}

/// `CASE WHEN EXISTS (...) THEN 1 ELSE 0 END`
fn exists_flag(tree: &mut Tree, exists: NodeId) -> NodeId {
    let one = tree.int(1);
    let zero = tree.int(0);
    let when = tree.add(NodeData::CaseWhen {
        condition: exists,
        result: one,
    });
    tree.add(NodeData::Case {
        operand: None,
        whens: vec![when],
        else_value: Some(zero),
    })
}

fn exec_statement(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    m.strip(
        tree,
        id,
        "return_variable",
        NoteCategory::RewriteError,
        "Procedure return value is not supported",
    );
    true
}

fn exec_argument(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    if let NodeData::ExecArgument {
        value, output: true, ..
    } = *tree.data(current)
    {
        assign_to(m, tree, value);
    }
    true
}

fn exec_option(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    match tree.data(id) {
        NodeData::ExecOption { recompile: true } => m.unsupported(tree, id, "EXECUTE ... WITH RECOMPILE is not supported"),
        _ => true,
    }
}

fn return_statement(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    if m.inside(tree, NodeKind::CreateProcedure) {
        m.strip(
            tree,
            id,
            "value",
            NoteCategory::Rewrite,
            "RETURN value was removed; procedures do not return values",
        );
    }
    true
}

fn use_statement(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::UseStatement { database } = *tree.data(id) else {
        return true;
    };
    let schema = tree.add(NodeData::SetSchema { schema: database });
    m.replace(tree, schema)
}

/// Statements with no target form are kept for their notes only.
fn hidden(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let current = m.current();
    tree.node_mut(current).hide = true;
    match tree.kind(id) {
        NodeKind::WaitForStatement => info(tree, current, "WAITFOR was removed"),
        NodeKind::ThrowStatement => error(tree, current, "THROW is not supported"),
        NodeKind::GotoStatement => error(tree, current, "GOTO is not supported"),
        NodeKind::LabelStatement => error(tree, current, "Labels are not supported"),
        _ => {}
    }
    true
}

fn transaction(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    if let NodeData::TransactionStatement {
        action: TransactionAction::Begin,
        ..
    } = tree.data(id)
    {
        let current = m.current();
        tree.node_mut(current).hide = true;
    }
    true
}

fn cursor_statement(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    if let NodeData::CursorStatement {
        action: CursorAction::Deallocate,
        ..
    } = tree.data(id)
    {
        let current = m.current();
        tree.node_mut(current).hide = true;
        error(tree, current, "DEALLOCATE is not supported");
    }
    true
}

fn set_option(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    match tree.data(id).clone() {
        NodeData::SetOption { option, .. } if option != "TRANSACTION" => {
            m.unsupported(tree, id, format!("SET {} is not supported", option))
        }
        _ => true,
    }
}

fn unsupported_statement(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let message = match tree.kind(id) {
        NodeKind::IdentityInsert => "SET IDENTITY_INSERT is not supported",
        _ => "UPDATE STATISTICS is not supported",
    };
    m.unsupported(tree, id, message)
}

fn try_statement(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    if let NodeData::TryStatement { catch_body, .. } = *tree.data(id) {
        m.skip(catch_body);
    }
    let current = m.current();
    error(tree, current, "TRY ... CATCH is not supported; the CATCH block was removed");
    true
}

/// Keep only the translated TRY body.
fn unwrap_try(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let NodeData::TryStatement { body, .. } = *tree.data(current) else {
        return true;
    };
    move_metadata(tree, current, body);
    m.splice(tree, body);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::tests::{notes, rewrite};

    fn kinds(tree: &Tree, ids: &[NodeId]) -> Vec<NodeKind> {
        ids.iter().map(|id| tree.kind(*id)).collect()
    }

    fn procedure_parts(tree: &Tree, statements: &[NodeId]) -> (Vec<NodeId>, Vec<NodeId>) {
        let procedure = statements
            .iter()
            .copied()
            .find(|id| tree.kind(*id) == NodeKind::CreateProcedure)
            .unwrap();
        let NodeData::CreateProcedure {
            declarations, body, ..
        } = tree.data(procedure)
        else {
            unreachable!()
        };
        let body = match tree.data(*body) {
            NodeData::Block { statements } => statements.clone(),
            _ => vec![*body],
        };
        (declarations.clone(), body)
    }

    #[test]
    fn test_insert_rows_are_split() {
        let (tree, root, statements) = rewrite("insert into T (a, b) values (1, 2), (3, 4), (5, 6)");
        assert_eq!(statements.len(), 3);
        assert!(kinds(&tree, &statements).iter().all(|k| *k == NodeKind::InsertStatement));
        for statement in &statements {
            let NodeData::InsertStatement { target, .. } = tree.data(*statement) else {
                unreachable!()
            };
            assert_eq!(tree.object_name(*target), "T");
        }
        assert!(tree.node(statements[0]).notes.is_empty());
        assert!(tree.node(statements[1]).notes.is_empty());
        assert_eq!(tree.node(statements[2]).notes.len(), 1);
        assert_eq!(
            notes(&tree, root, NoteCategory::Rewrite),
            vec!["INSERT with 3 rows was split into 3 statements".to_string()]
        );
    }

    #[test]
    fn test_insert_rows_keep_order() {
        let (tree, _, statements) = rewrite("insert into T values (1), (2)");
        let first_values: Vec<String> = statements
            .iter()
            .map(|id| {
                tree.descendants(*id)
                    .into_iter()
                    .find_map(|n| match tree.data(n) {
                        NodeData::IntegerLiteral { text } => Some(text.clone()),
                        _ => None,
                    })
                    .unwrap()
            })
            .collect();
        assert_eq!(first_values, vec!["1", "2"]);
    }

    #[test]
    fn test_insert_exec_is_sentinel() {
        let (tree, root, statements) = rewrite("insert into T exec p");
        assert_eq!(kinds(&tree, &statements), vec![NodeKind::UnsupportedStatement]);
        assert_eq!(notes(&tree, root, NoteCategory::RewriteError).len(), 1);
    }

    #[test]
    fn test_query_without_from_gets_dummy() {
        let (tree, root, _) = rewrite("select 1");
        assert!(tree
            .descendants(root)
            .into_iter()
            .any(|id| tree.kind(id) == NodeKind::TableRef && tree.object_name(id) == "DUMMY"));
        assert_eq!(notes(&tree, root, NoteCategory::Rewrite), vec!["FROM DUMMY was added".to_string()]);
    }

    #[test]
    fn test_select_variables_become_into() {
        let (tree, root, _) = rewrite("select @a = x, @b += y from T");
        let spec = tree
            .descendants(root)
            .into_iter()
            .find(|id| tree.kind(*id) == NodeKind::QuerySpecification)
            .unwrap();
        let NodeData::QuerySpecification { into_variables, .. } = tree.data(spec) else {
            unreachable!()
        };
        assert_eq!(into_variables.len(), 2);
        assert!(into_variables
            .iter()
            .all(|id| matches!(tree.data(*id), NodeData::Variable { argument: false, .. })));
        assert!(!tree
            .descendants(root)
            .into_iter()
            .any(|id| tree.kind(id) == NodeKind::SelectVariableItem));
    }

    #[test]
    fn test_select_into_table() {
        let (tree, _, statements) = rewrite("select a into #tmp from T");
        assert_eq!(kinds(&tree, &statements), vec![NodeKind::CreateTable]);
        assert!(tree.node(statements[0]).terminate);
    }

    #[test]
    fn test_hints_and_top() {
        let (tree, root, _) = rewrite("select top 10 percent a from T with (nolock)");
        assert_eq!(notes(&tree, root, NoteCategory::RewriteError), vec!["TOP PERCENT is not supported".to_string()]);
        assert_eq!(notes(&tree, root, NoteCategory::Rewrite).len(), 1);
    }

    #[test]
    fn test_delete_and_update_clauses() {
        let (tree, root, _) = rewrite("delete top (5) from T output deleted.a where a = 1");
        assert_eq!(notes(&tree, root, NoteCategory::RewriteError).len(), 2);
        let (tree, root, _) = rewrite("update T set a += 1 option (recompile)");
        assert_eq!(notes(&tree, root, NoteCategory::RewriteError).len(), 1);
        assert!(!tree
            .descendants(root)
            .into_iter()
            .any(|id| matches!(tree.data(id), NodeData::SetColumn { op: AssignOp::Add, .. })));
    }

    #[test]
    fn test_set_subquery_becomes_select_into() {
        let (tree, _, statements) = rewrite("set @x = (select max(a) from T)");
        assert_eq!(kinds(&tree, &statements), vec![NodeKind::SelectStatement]);
    }

    #[test]
    fn test_declarations_are_hoisted() {
        let source = "create procedure p as begin declare @a int = 1, @b int = (select 1); set @a = 2; end";
        let (tree, _, statements) = rewrite(source);
        let (declarations, body) = procedure_parts(&tree, &statements);
        assert_eq!(declarations.len(), 2);
        assert_eq!(
            kinds(&tree, &body),
            vec![NodeKind::SelectStatement, NodeKind::SetVariable]
        );
    }

    #[test]
    fn test_table_variable_gets_type() {
        let source = "create procedure p as begin declare @t table (id int); select id from @t; end";
        let (tree, _, statements) = rewrite(source);
        assert_eq!(
            kinds(&tree, &statements),
            vec![NodeKind::CreateTableType, NodeKind::CreateProcedure]
        );
        let NodeData::CreateTableType { name, .. } = tree.data(statements[0]) else {
            unreachable!()
        };
        assert_eq!(tree.object_name(*name), "t_TYPE");
    }

    #[test]
    fn test_if_exists_is_hoisted() {
        let source = "create procedure p as begin if exists (select 1 from T) set @a = 1 end";
        let (tree, _, statements) = rewrite(source);
        let (declarations, body) = procedure_parts(&tree, &statements);
        assert_eq!(declarations.len(), 1);
        assert_eq!(kinds(&tree, &body), vec![NodeKind::SelectStatement, NodeKind::IfStatement]);
        let names: Vec<_> = tree
            .descendants(body[1])
            .into_iter()
            .filter_map(|id| variable_name(&tree, id))
            .collect();
        assert!(names.contains(&"temp_var_0".to_string()));
    }

    #[test]
    fn test_if_outside_procedure_declares_before() {
        let (tree, _, statements) = rewrite("if (select count(*) from T) > 0 print 'x'");
        assert_eq!(
            kinds(&tree, &statements),
            vec![NodeKind::DeclareStatement, NodeKind::SelectStatement, NodeKind::IfStatement]
        );
    }

    #[test]
    fn test_session_statements() {
        let (tree, root, statements) = rewrite("use Sales\ngo\nbegin tran\nset nocount on\ncommit");
        assert_eq!(
            kinds(&tree, &statements),
            vec![
                NodeKind::SetSchema,
                NodeKind::GoStatement,
                NodeKind::TransactionStatement,
                NodeKind::UnsupportedStatement,
                NodeKind::TransactionStatement,
            ]
        );
        assert!(tree.node(statements[1]).hide && tree.node(statements[2]).hide);
        assert!(!tree.node(statements[4]).hide);
        assert_eq!(
            notes(&tree, root, NoteCategory::RewriteError),
            vec!["SET NOCOUNT is not supported".to_string()]
        );
    }

    #[test]
    fn test_try_keeps_body() {
        let (tree, root, statements) = rewrite("begin try select 1 from T end try begin catch select 2 end catch");
        assert_eq!(kinds(&tree, &statements), vec![NodeKind::Block]);
        assert_eq!(notes(&tree, root, NoteCategory::RewriteError).len(), 1);
    }

    #[test]
    fn test_exec_output_argument() {
        let (tree, root, _) = rewrite("exec @r = p @a output, 1");
        assert_eq!(notes(&tree, root, NoteCategory::RewriteError).len(), 1);
        assert!(tree
            .descendants(root)
            .into_iter()
            .any(|id| matches!(tree.data(id), NodeData::Variable { name, argument: false } if name == "@a")));
    }
}
