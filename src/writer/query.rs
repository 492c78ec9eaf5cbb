//! Expressions, queries, table sources and DML.

use crate::ast::{
    AddOp, AggregateFunc, AssignOp, BitOp, BuiltinValue, CompareOp, JoinKind, LogicOp, MulOp,
    NodeData, NodeId, RankingFunc, SetOp, SortOrder, UnaryOp,
};

use super::{quote_string, variable_text, Assembler, Writer};

fn compare_op(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "=",
        CompareOp::Ne => "<>",
        CompareOp::Lt => "<",
        CompareOp::Le => "<=",
        CompareOp::Gt => ">",
        CompareOp::Ge => ">=",
        CompareOp::NotLt => ">=",
        CompareOp::NotGt => "<=",
    }
}

/// HANA spelling of an aggregate.
fn aggregate_name(function: AggregateFunc) -> Option<&'static str> {
    let name = match function {
        AggregateFunc::Count | AggregateFunc::CountBig => "COUNT",
        AggregateFunc::Sum => "SUM",
        AggregateFunc::Avg => "AVG",
        AggregateFunc::Min => "MIN",
        AggregateFunc::Max => "MAX",
        AggregateFunc::Stdev => "STDDEV",
        AggregateFunc::Var => "VAR",
        AggregateFunc::Stdevp | AggregateFunc::Varp | AggregateFunc::ChecksumAgg => return None,
    };
    Some(name)
}

fn builtin_name(value: BuiltinValue) -> &'static str {
    match value {
        BuiltinValue::CurrentUser => "CURRENT_USER",
        BuiltinValue::CurrentSchema => "CURRENT_SCHEMA",
        BuiltinValue::CurrentTimestamp => "CURRENT_TIMESTAMP",
        BuiltinValue::CurrentUtcTimestamp => "CURRENT_UTCTIMESTAMP",
        BuiltinValue::CurrentDate => "CURRENT_DATE",
    }
}

fn join_keyword(kind: JoinKind) -> &'static str {
    match kind {
        JoinKind::Inner => "INNER JOIN",
        JoinKind::Left => "LEFT OUTER JOIN",
        JoinKind::Right => "RIGHT OUTER JOIN",
        JoinKind::Full => "FULL OUTER JOIN",
        JoinKind::Cross => "CROSS JOIN",
        JoinKind::CrossApply => "CROSS APPLY",
        JoinKind::OuterApply => "OUTER APPLY",
    }
}

fn assign_op(op: AssignOp) -> Option<&'static str> {
    match op {
        AssignOp::Assign => None,
        AssignOp::Add => Some("+"),
        AssignOp::Sub => Some("-"),
        AssignOp::Mul => Some("*"),
        AssignOp::Div => Some("/"),
    }
}

impl<A: Assembler> Writer<'_, A> {
    fn order(&mut self, order: Option<SortOrder>) {
        match order {
            Some(SortOrder::Asc) => self.word("ASC"),
            Some(SortOrder::Desc) => self.word("DESC"),
            None => {}
        }
    }

    /// `NAME(a, b)`.
    fn call(&mut self, name: &str, arguments: &[NodeId]) {
        self.word(name);
        self.punct("(");
        self.list(arguments);
        self.punct(")");
    }

    /// `(query)` with the query one level in.
    pub(super) fn nested_query(&mut self, query: NodeId) {
        self.word("(");
        self.out.indent();
        self.node(query);
        self.out.dedent();
        self.punct(")");
    }

    /// `target = value`, spelling out compound assignments.
    pub(super) fn assignment(&mut self, target: NodeId, op: AssignOp, value: NodeId) {
        self.node(target);
        self.word("=");
        if let Some(op) = assign_op(op) {
            let copy = self.tree.copy_without_comments(target);
            self.node(copy);
            self.word(op);
        }
        self.node(value);
    }

    pub(super) fn expression(&mut self, id: NodeId, data: NodeData) {
        match data {
            NodeData::ColumnRef { object } => self.node(object),
            NodeData::Variable { name, argument } => self.word(&variable_text(&name, argument)),
            NodeData::IntegerLiteral { text } | NodeData::DecimalLiteral { text } => self.word(&text),
            NodeData::StringLiteral { value, unicode } => {
                let prefix = if unicode { "N" } else { "" };
                self.word(&format!("{}{}", prefix, quote_string(&value)));
            }
            NodeData::NullLiteral => self.word("NULL"),
            NodeData::DateLiteral { text } => {
                self.word("TO_TIMESTAMP");
                self.punct(&format!("({})", quote_string(&text)));
            }
            NodeData::Additive { left, op, right } => {
                self.node(left);
                self.word(match op {
                    AddOp::Plus => "+",
                    AddOp::Minus => "-",
                });
                self.node(right);
            }
            NodeData::Multiplicative {
                left,
                op: MulOp::Mod,
                right,
            } => self.call("MOD", &[left, right]),
            NodeData::Multiplicative { left, op, right } => {
                self.node(left);
                self.word(if op == MulOp::Mul { "*" } else { "/" });
                self.node(right);
            }
            NodeData::Bitwise { left, op, right } => {
                let name = match op {
                    BitOp::And => "BITAND",
                    BitOp::Or => "BITOR",
                    BitOp::Xor => "BITXOR",
                };
                self.call(name, &[left, right]);
            }
            NodeData::Unary { op, operand } => {
                self.word(match op {
                    UnaryOp::Minus => "-",
                    UnaryOp::Plus => "+",
                });
                self.glue();
                self.node(operand);
            }
            NodeData::BitwiseNot { operand } => self.call("BITNOT", &[operand]),
            NodeData::Concat { left, right } => {
                self.node(left);
                self.word("||");
                self.node(right);
            }
            NodeData::Comparison { left, op, right } => {
                self.node(left);
                self.word(compare_op(op));
                self.node(right);
            }
            NodeData::Logical { left, op, right } => {
                self.node(left);
                self.out.space();
                self.out.breakable();
                self.word(match op {
                    LogicOp::And => "AND",
                    LogicOp::Or => "OR",
                });
                self.node(right);
            }
            NodeData::Not { operand } => {
                self.word("NOT");
                self.node(operand);
            }
            NodeData::IsNull { operand, negated } => {
                self.node(operand);
                self.words(if negated { "IS NOT NULL" } else { "IS NULL" });
            }
            NodeData::Between {
                operand,
                low,
                high,
                negated,
            } => {
                self.node(operand);
                if negated {
                    self.word("NOT");
                }
                self.word("BETWEEN");
                self.node(low);
                self.word("AND");
                self.node(high);
            }
            NodeData::Like {
                operand,
                pattern,
                escape,
                negated,
            } => {
                self.node(operand);
                if negated {
                    self.word("NOT");
                }
                self.word("LIKE");
                self.node(pattern);
                if let Some(escape) = escape {
                    self.word("ESCAPE");
                    self.node(escape);
                }
            }
            NodeData::InList {
                operand,
                items,
                negated,
            } => {
                self.node(operand);
                if negated {
                    self.word("NOT");
                }
                self.word("IN");
                self.paren_list(&items);
            }
            NodeData::InSubquery {
                operand,
                query,
                negated,
            } => {
                self.node(operand);
                if negated {
                    self.word("NOT");
                }
                self.word("IN");
                self.nested_query(query);
            }
            NodeData::Exists { query } => {
                self.word("EXISTS");
                self.nested_query(query);
            }
            NodeData::Parens { inner } => {
                self.word("(");
                self.node(inner);
                self.punct(")");
            }
            NodeData::Subquery { query } => self.nested_query(query),
            NodeData::FunctionCall { name, arguments } => {
                self.node(name);
                self.punct("(");
                self.list(&arguments);
                self.punct(")");
            }
            NodeData::Aggregate {
                function,
                distinct,
                argument,
                over,
            } => {
                let name = aggregate_name(function).unwrap_or_else(|| function.name());
                if aggregate_name(function).is_none() {
                    self.rendering(id, format!("{} has no HANA equivalent", function.name()));
                }
                self.word(name);
                self.punct("(");
                if distinct {
                    self.word("DISTINCT");
                }
                match argument {
                    Some(argument) => self.node(argument),
                    None => self.word("*"),
                }
                self.punct(")");
                self.opt(over);
            }
            NodeData::Ranking { function, over } => {
                self.word(match function {
                    RankingFunc::Rank => "RANK()",
                    RankingFunc::DenseRank => "DENSE_RANK()",
                    RankingFunc::RowNumber => "ROW_NUMBER()",
                });
                self.node(over);
            }
            NodeData::NTile { groups, over } => {
                self.call("NTILE", &[groups]);
                self.node(over);
            }
            NodeData::Cast { operand, data_type } => {
                self.word("CAST");
                self.punct("(");
                self.node(operand);
                self.word("AS");
                self.node(data_type);
                self.punct(")");
            }
            NodeData::Convert {
                data_type,
                operand,
                style,
            } => {
                if let Some(style) = style {
                    self.rendering(id, "CONVERT style was dropped");
                    self.skipped(style);
                }
                self.word("CAST");
                self.punct("(");
                self.node(operand);
                self.word("AS");
                self.node(data_type);
                self.punct(")");
            }
            NodeData::Case {
                operand,
                whens,
                else_value,
            } => {
                self.word("CASE");
                self.opt(operand);
                for when in whens {
                    self.out.space();
                    self.out.breakable();
                    self.node(when);
                }
                if let Some(else_value) = else_value {
                    self.out.space();
                    self.out.breakable();
                    self.word("ELSE");
                    self.node(else_value);
                }
                self.word("END");
            }
            NodeData::Collate { operand, collation } => {
                self.rendering(id, format!("COLLATE {} was dropped", collation));
                self.node(operand);
            }
            NodeData::Builtin { value } => self.word(builtin_name(value)),
            NodeData::UnsupportedExpression { .. } => self.word("NULL"),
            _ => {
                self.unrendered(id);
                self.word("NULL");
            }
        }
    }

    /// Query expressions and table sources.
    pub(super) fn query(&mut self, id: NodeId, data: NodeData) {
        match data {
            NodeData::QuerySpecification {
                select,
                into,
                into_variables,
                from,
                where_clause,
                group_by,
                having,
            } => {
                self.node(select);
                if !into_variables.is_empty() {
                    self.out.line();
                    self.word("INTO");
                    self.list(&into_variables);
                }
                if let Some(into) = into {
                    self.rendering(id, "SELECT INTO a table was not converted");
                    self.skipped(into);
                }
                if !from.is_empty() {
                    self.out.line();
                    self.word("FROM");
                    self.list(&from);
                }
                if let Some(condition) = where_clause {
                    self.out.line();
                    self.word("WHERE");
                    self.node(condition);
                }
                if !group_by.is_empty() {
                    self.out.line();
                    self.words("GROUP BY");
                    self.list(&group_by);
                }
                if let Some(condition) = having {
                    self.out.line();
                    self.word("HAVING");
                    self.node(condition);
                }
            }
            NodeData::SetOperation { left, op, right } => {
                self.node(left);
                self.out.line();
                self.words(match op {
                    SetOp::Union => "UNION",
                    SetOp::UnionAll => "UNION ALL",
                    SetOp::Except => "EXCEPT",
                    SetOp::Intersect => "INTERSECT",
                });
                self.out.line();
                self.node(right);
            }
            NodeData::ParenQuery { query } => self.nested_query(query),
            NodeData::TableRef { object, alias, .. } => {
                self.node(object);
                self.opt(alias);
            }
            NodeData::DerivedTable {
                query,
                alias,
                columns,
            } => {
                self.nested_query(query);
                self.node(alias);
                if !columns.is_empty() {
                    self.rendering(id, "Column names of a derived table were dropped");
                    self.skipped_all(&columns);
                }
            }
            NodeData::Join {
                left,
                kind,
                right,
                condition,
            } => {
                self.node(left);
                self.out.line();
                if matches!(kind, JoinKind::CrossApply | JoinKind::OuterApply) {
                    self.rendering(id, format!("{} has no HANA equivalent", join_keyword(kind)));
                }
                self.words(join_keyword(kind));
                self.node(right);
                if let Some(condition) = condition {
                    self.word("ON");
                    self.node(condition);
                }
            }
            NodeData::ParenTable { source } => {
                self.word("(");
                self.node(source);
                self.punct(")");
            }
            NodeData::TableFunction { call, alias } => {
                self.node(call);
                self.opt(alias);
            }
            NodeData::VariableTable { variable, alias } => {
                self.node(variable);
                self.opt(alias);
            }
            _ => self.unrendered(id),
        }
    }

    /// Clauses and the smaller pieces of statements.
    pub(super) fn piece(&mut self, id: NodeId, data: NodeData) {
        match data {
            NodeData::SelectClause {
                distinct,
                top,
                items,
            } => {
                self.word("SELECT");
                if distinct {
                    self.word("DISTINCT");
                }
                self.opt(top);
                self.list(&items);
            }
            NodeData::Top { count, .. } => {
                self.word("TOP");
                self.node(count);
            }
            NodeData::SelectItem { value, alias } => {
                self.node(value);
                if let Some(alias) = alias {
                    self.word("AS");
                    self.node(alias);
                }
            }
            NodeData::SelectStar { qualifier } => {
                if let Some(qualifier) = qualifier {
                    self.node(qualifier);
                    self.punct(".*");
                } else {
                    self.word("*");
                }
            }
            NodeData::OrderedItem { value, order } | NodeData::OrderedColumn { name: value, order } => {
                self.node(value);
                self.order(order);
            }
            NodeData::Over { partition, order_by } => {
                self.word("OVER");
                self.word("(");
                if !partition.is_empty() {
                    self.words("PARTITION BY");
                    self.list(&partition);
                }
                if !order_by.is_empty() {
                    self.words("ORDER BY");
                    self.list(&order_by);
                }
                self.punct(")");
            }
            NodeData::WithClause { tables } => {
                self.word("WITH");
                self.list(&tables);
                self.out.line();
            }
            NodeData::CommonTable {
                name,
                columns,
                query,
            } => {
                self.node(name);
                if !columns.is_empty() {
                    self.paren_list(&columns);
                }
                self.word("AS");
                self.nested_query(query);
            }
            NodeData::CaseWhen { condition, result } => {
                self.word("WHEN");
                self.node(condition);
                self.word("THEN");
                self.node(result);
            }
            NodeData::SetColumn { target, op, value } => self.assignment(target, op, value),
            NodeData::ValuesList { rows } => {
                self.word("VALUES");
                self.list(&rows);
            }
            NodeData::ValuesRow { values } => self.paren_list(&values),
            NodeData::ValuesQuery { query } => {
                self.out.line();
                self.node(query);
            }
            NodeData::ExecArgument { name, value, .. } => {
                if let Some(name) = name {
                    let text = match self.tree.data(name) {
                        NodeData::Variable { name, .. } => variable_text(name, false),
                        _ => self.tree.object_name(name),
                    };
                    self.word(&text);
                    self.comments(name);
                    self.word("=>");
                }
                self.node(value);
            }
            NodeData::UnsupportedClause { .. } => {}
            data => self.ddl_piece(id, data),
        }
    }

    // --- DML ---

    pub(super) fn select_statement(
        &mut self,
        id: NodeId,
        with_clause: Option<NodeId>,
        query: NodeId,
        order_by: &[NodeId],
        option: Option<NodeId>,
    ) {
        self.opt(with_clause);
        self.node(query);
        if !order_by.is_empty() {
            self.out.line();
            self.words("ORDER BY");
            self.list(order_by);
        }
        if let Some(option) = option {
            self.rendering(id, "OPTION clause was dropped");
            self.skipped(option);
        }
    }

    /// TOP and OUTPUT survive only when a rule could not remove them.
    fn dml_leftovers(&mut self, id: NodeId, top: Option<NodeId>, output: Option<NodeId>) {
        if let Some(top) = top {
            self.rendering(id, "TOP was dropped from a data modification statement");
            self.skipped(top);
        }
        if let Some(output) = output {
            self.rendering(id, "OUTPUT clause was dropped");
            self.skipped(output);
        }
    }

    pub(super) fn dml(&mut self, id: NodeId, data: NodeData) {
        match data {
            NodeData::InsertStatement {
                with_clause,
                top,
                target,
                columns,
                output,
                source,
            } => {
                self.dml_leftovers(id, top, output);
                self.words("INSERT INTO");
                self.node(target);
                if !columns.is_empty() {
                    self.paren_list(&columns);
                }
                if let Some(with_clause) = with_clause {
                    self.out.line();
                    self.node(with_clause);
                }
                self.node(source);
            }
            NodeData::UpdateStatement {
                with_clause,
                top,
                target,
                assignments,
                output,
                from,
                where_clause,
                option,
            } => {
                self.dml_leftovers(id, top, output);
                self.opt(with_clause);
                self.word("UPDATE");
                self.node(target);
                self.out.line();
                self.word("SET");
                self.list(&assignments);
                if !from.is_empty() {
                    self.out.line();
                    self.word("FROM");
                    self.list(&from);
                }
                if let Some(condition) = where_clause {
                    self.out.line();
                    self.word("WHERE");
                    self.node(condition);
                }
                if let Some(option) = option {
                    self.rendering(id, "OPTION clause was dropped");
                    self.skipped(option);
                }
            }
            NodeData::DeleteStatement {
                with_clause,
                top,
                target,
                output,
                from,
                where_clause,
                option,
            } => {
                self.dml_leftovers(id, top, output);
                self.opt(with_clause);
                self.words("DELETE FROM");
                self.node(target);
                if !from.is_empty() {
                    self.rendering(id, "DELETE with a FROM clause has no HANA equivalent");
                    self.skipped_all(&from);
                }
                if let Some(condition) = where_clause {
                    self.out.line();
                    self.word("WHERE");
                    self.node(condition);
                }
                if let Some(option) = option {
                    self.rendering(id, "OPTION clause was dropped");
                    self.skipped(option);
                }
            }
            _ => self.unrendered(id),
        }
    }
}
