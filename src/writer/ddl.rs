//! Statements other than queries: DDL, procedures and control flow.

use crate::ast::{
    AlterIndexAction, CursorAction, NodeData, NodeId, NodeKind, TransactionAction, TriggerEvent,
    TriggerTiming,
};

use super::{variable_text, Assembler, Writer};

impl<A: Assembler> Writer<'_, A> {
    /// Bare variable name, for declarations and parameters.
    fn variable_name(&mut self, id: NodeId) {
        match self.tree.data(id).clone() {
            NodeData::Variable { name, .. } => {
                self.word(&variable_text(&name, false));
                self.comments(id);
            }
            _ => self.node(id),
        }
    }

    /// `DROP <what> a` for each object; lists only survive a failed split.
    fn drop_list(&mut self, keyword: &str, ids: &[NodeId]) {
        self.words(keyword);
        self.list(ids);
    }

    /// `(definitions)`, one per line in pretty output.
    fn definitions(&mut self, ids: &[NodeId]) {
        self.word("(");
        self.out.indent();
        for (index, id) in ids.iter().enumerate() {
            if index > 0 {
                self.punct(",");
            }
            self.out.soft_line();
            self.node(*id);
        }
        self.out.dedent();
        self.out.soft_line();
        self.punct(")");
    }

    fn is_temporary(&self, name: NodeId) -> bool {
        self.tree
            .object_parts(name)
            .last()
            .is_some_and(|last| last.starts_with('#'))
    }

    pub(super) fn statement_text(&mut self, id: NodeId, data: NodeData) {
        match data {
            NodeData::SelectStatement {
                with_clause,
                query,
                order_by,
                option,
            } => self.select_statement(id, with_clause, query, &order_by, option),
            data @ (NodeData::InsertStatement { .. }
            | NodeData::UpdateStatement { .. }
            | NodeData::DeleteStatement { .. }) => self.dml(id, data),
            NodeData::CreateTable {
                name,
                definitions,
                query,
                ..
            } => {
                if self.is_temporary(name) {
                    self.words("CREATE LOCAL TEMPORARY TABLE");
                } else {
                    self.words("CREATE TABLE");
                }
                self.node(name);
                match query {
                    Some(query) => {
                        self.skipped_all(&definitions);
                        self.word("AS");
                        self.nested_query(query);
                        self.words("WITH DATA");
                    }
                    None => self.definitions(&definitions),
                }
            }
            NodeData::AlterTable { table, action } => {
                self.words("ALTER TABLE");
                self.node(table);
                self.node(action);
            }
            NodeData::DropTable { tables } => self.drop_list("DROP TABLE", &tables),
            NodeData::CreateIndex {
                unique,
                name,
                table,
                columns,
                include,
                filter,
                ..
            } => {
                self.word("CREATE");
                if unique {
                    self.word("UNIQUE");
                }
                self.word("INDEX");
                self.node(name);
                self.word("ON");
                self.node(table);
                self.paren_list(&columns);
                if !include.is_empty() || filter.is_some() {
                    self.rendering(id, "Index clauses were dropped");
                    self.skipped_all(&include);
                    if let Some(filter) = filter {
                        self.skipped(filter);
                    }
                }
            }
            NodeData::AlterIndex {
                index: Some(index),
                table,
                action: AlterIndexAction::Rebuild,
                ..
            } => {
                self.words("ALTER INDEX");
                self.node(index);
                self.word("REBUILD");
                if let Some(table) = table {
                    self.skipped(table);
                }
            }
            NodeData::DropIndex { items } => self.drop_list("DROP INDEX", &items),
            NodeData::CreateView {
                name,
                columns,
                query,
                ..
            } => {
                self.words("CREATE VIEW");
                self.node(name);
                if !columns.is_empty() {
                    self.paren_list(&columns);
                }
                self.word("AS");
                self.out.line();
                self.node(query);
            }
            NodeData::DropView { views } => self.drop_list("DROP VIEW", &views),
            NodeData::CreateProcedure {
                name,
                parameters,
                declarations,
                body,
                ..
            } => self.procedure(name, &parameters, &declarations, body),
            NodeData::DropProcedure { procedures } => self.drop_list("DROP PROCEDURE", &procedures),
            NodeData::CreateTrigger {
                name,
                table,
                timing,
                events,
                body,
            } => {
                self.words("CREATE TRIGGER");
                self.node(name);
                self.words(match timing {
                    TriggerTiming::After => "AFTER",
                    TriggerTiming::InsteadOf => "INSTEAD OF",
                });
                let events: Vec<&str> = events
                    .iter()
                    .map(|event| match event {
                        TriggerEvent::Insert => "INSERT",
                        TriggerEvent::Update => "UPDATE",
                        TriggerEvent::Delete => "DELETE",
                    })
                    .collect();
                self.words(&events.join(" OR "));
                self.word("ON");
                self.node(table);
                self.out.line();
                self.words("FOR EACH STATEMENT");
                self.out.line();
                self.block(body);
            }
            NodeData::DropTrigger { triggers } => self.drop_list("DROP TRIGGER", &triggers),
            NodeData::CreateTableType { name, definitions } => {
                self.words("CREATE TYPE");
                self.node(name);
                self.words("AS TABLE");
                self.definitions(&definitions);
            }
            NodeData::DropType { name } => {
                self.words("DROP TYPE");
                self.node(name);
            }
            NodeData::DeclareStatement { declarations } => {
                for (index, declaration) in declarations.iter().enumerate() {
                    if index > 0 {
                        self.punct(";");
                        self.out.line();
                    }
                    self.node(*declaration);
                }
            }
            NodeData::SetVariable {
                variable,
                op,
                value,
            } => self.assignment(variable, op, value),
            NodeData::SetOption { option, value } => {
                self.word("SET");
                self.word(&option);
                self.words(&value);
            }
            NodeData::IfStatement {
                condition,
                then_branch,
                else_branch,
            } => {
                self.word("IF");
                self.node(condition);
                self.word("THEN");
                self.branch(then_branch);
                if let Some(else_branch) = else_branch {
                    self.out.hard_line();
                    self.word("ELSE");
                    self.branch(else_branch);
                }
                self.out.hard_line();
                self.words("END IF");
            }
            NodeData::WhileStatement { condition, body } => {
                self.word("WHILE");
                self.node(condition);
                self.word("DO");
                self.branch(body);
                self.out.hard_line();
                self.words("END WHILE");
            }
            NodeData::BreakStatement => self.word("BREAK"),
            NodeData::ContinueStatement => self.word("CONTINUE"),
            NodeData::ReturnStatement { value } => {
                self.word("RETURN");
                self.opt(value);
            }
            NodeData::ExecStatement {
                return_variable,
                procedure,
                arguments,
                options,
            } => {
                if let Some(variable) = return_variable {
                    self.rendering(id, "Return value of a procedure call was dropped");
                    self.skipped(variable);
                }
                self.word("CALL");
                self.node(procedure);
                self.punct("(");
                self.list(&arguments);
                self.punct(")");
                self.skipped_all(&options);
            }
            NodeData::ExecString { parts } => {
                self.words("EXECUTE IMMEDIATE");
                for (index, part) in parts.iter().enumerate() {
                    if index > 0 {
                        self.word("||");
                    }
                    self.node(*part);
                }
            }
            NodeData::SetSchema { schema } => {
                self.words("SET SCHEMA");
                self.node(schema);
            }
            NodeData::TransactionStatement { action, name } => match action {
                TransactionAction::Commit => self.word("COMMIT"),
                TransactionAction::Rollback => self.word("ROLLBACK"),
                TransactionAction::Save => {
                    self.word("SAVEPOINT");
                    self.word(name.as_deref().unwrap_or("SAVEPOINT"));
                }
                TransactionAction::Begin => self.unrendered(id),
            },
            NodeData::CursorStatement { action, cursor } => {
                match action {
                    CursorAction::Open => self.word("OPEN"),
                    CursorAction::Close => self.word("CLOSE"),
                    CursorAction::Deallocate => self.unrendered(id),
                }
                self.node(cursor);
            }
            NodeData::FetchStatement { cursor, into, .. } => {
                self.word("FETCH");
                self.node(cursor);
                if !into.is_empty() {
                    self.word("INTO");
                    self.list(&into);
                }
            }
            NodeData::TruncateTable { table } => {
                self.words("TRUNCATE TABLE");
                self.node(table);
            }
            NodeData::UnsupportedStatement { .. } => {}
            _ => self.unrendered(id),
        }
    }

    /// `BEGIN ... END` around a body.
    fn block(&mut self, body: NodeId) {
        self.word("BEGIN");
        self.out.indent();
        self.out.hard_line();
        self.body(body);
        self.out.dedent();
        self.out.hard_line();
        self.word("END");
    }

    /// Statements of an IF or WHILE branch, one level in.
    fn branch(&mut self, body: NodeId) {
        self.out.indent();
        self.out.hard_line();
        self.body(body);
        self.out.dedent();
    }

    fn procedure(&mut self, name: NodeId, parameters: &[NodeId], declarations: &[NodeId], body: NodeId) {
        self.words("CREATE PROCEDURE");
        self.node(name);
        self.word("(");
        self.list(parameters);
        self.punct(")");
        self.out.line();
        self.words("LANGUAGE SQLSCRIPT AS");
        self.out.hard_line();
        self.word("BEGIN");
        self.out.indent();
        self.out.hard_line();
        for declaration in declarations {
            self.statement(*declaration);
        }
        self.body(body);
        self.out.dedent();
        self.out.hard_line();
        self.word("END");
    }

    pub(super) fn declaration(&mut self, id: NodeId, data: NodeData) {
        match data {
            NodeData::ScalarDeclaration {
                variable,
                data_type,
                value,
            } => {
                self.word("DECLARE");
                self.variable_name(variable);
                self.node(data_type);
                if let Some(value) = value {
                    self.word(":=");
                    self.node(value);
                }
            }
            NodeData::CursorDeclaration { name, query, .. } => {
                self.words("DECLARE CURSOR");
                self.node(name);
                self.word("FOR");
                self.node(query);
            }
            _ => self.unrendered(id),
        }
    }

    /// Column definitions, constraints and ALTER TABLE actions. `inline`
    /// constraints belong to a column definition and omit their columns.
    pub(super) fn table_definition(&mut self, id: NodeId, data: NodeData, inline: bool) {
        match data {
            NodeData::ColumnDefinition {
                name,
                data_type,
                identity,
                nullable,
                default_value,
                constraints,
                ..
            } => {
                self.node(name);
                self.node(data_type);
                if let Some(value) = default_value {
                    self.word("DEFAULT");
                    self.node(value);
                }
                if let Some((seed, increment)) = identity {
                    self.words("GENERATED BY DEFAULT AS IDENTITY");
                    if seed != "1" || increment != "1" {
                        self.word("(");
                        self.words(&format!("START WITH {} INCREMENT BY {}", seed, increment));
                        self.punct(")");
                    }
                }
                match nullable {
                    Some(true) => self.word("NULL"),
                    Some(false) => self.words("NOT NULL"),
                    None => {}
                }
                for constraint in constraints {
                    let data = self.tree.data(constraint).clone();
                    self.table_definition(constraint, data, true);
                    self.comments(constraint);
                }
            }
            NodeData::ComputedColumn { name, value } => {
                self.rendering(id, "Computed column needs a data type in HANA");
                self.node(name);
                self.word("AS");
                self.word("(");
                self.node(value);
                self.punct(")");
            }
            NodeData::PrimaryKey { name, columns, .. } => {
                self.constraint_name(name);
                self.words("PRIMARY KEY");
                self.key_columns(&columns, inline);
            }
            NodeData::UniqueKey { name, columns, .. } => {
                self.constraint_name(name);
                self.word("UNIQUE");
                self.key_columns(&columns, inline);
            }
            NodeData::ForeignKey {
                name,
                columns,
                reference,
                reference_columns,
                on_delete,
                on_update,
            } => {
                self.constraint_name(name);
                if !inline {
                    self.words("FOREIGN KEY");
                }
                self.key_columns(&columns, inline);
                self.word("REFERENCES");
                self.node(reference);
                if !reference_columns.is_empty() {
                    self.paren_list(&reference_columns);
                }
                if let Some(action) = on_delete {
                    self.words("ON DELETE");
                    self.words(&action);
                }
                if let Some(action) = on_update {
                    self.words("ON UPDATE");
                    self.words(&action);
                }
            }
            NodeData::CheckConstraint { name, condition } => {
                self.constraint_name(name);
                self.word("CHECK");
                self.word("(");
                self.node(condition);
                self.punct(")");
            }
            NodeData::AddDefinitions { definitions, .. } => {
                let columns = definitions.iter().all(|definition| {
                    matches!(
                        self.tree.kind(*definition),
                        NodeKind::ColumnDefinition | NodeKind::ComputedColumn
                    )
                });
                self.word("ADD");
                if columns {
                    self.paren_list(&definitions);
                } else {
                    self.list(&definitions);
                }
            }
            NodeData::DropDefinitions { items } => {
                let (columns, constraints): (Vec<NodeId>, Vec<NodeId>) = items
                    .iter()
                    .partition(|item| self.tree.kind(**item) == NodeKind::DropColumn);
                self.word("DROP");
                if !columns.is_empty() {
                    self.paren_list(&columns);
                }
                if !constraints.is_empty() {
                    if !columns.is_empty() {
                        self.rendering(id, "Columns and constraints cannot be dropped together");
                    }
                    self.list(&constraints);
                }
            }
            NodeData::AlterColumn {
                name,
                data_type,
                nullable,
                ..
            } => {
                self.word("ALTER");
                self.word("(");
                self.node(name);
                self.node(data_type);
                match nullable {
                    Some(true) => self.word("NULL"),
                    Some(false) => self.words("NOT NULL"),
                    None => {}
                }
                self.punct(")");
            }
            _ => self.unrendered(id),
        }
    }

    fn constraint_name(&mut self, name: Option<NodeId>) {
        if let Some(name) = name {
            self.word("CONSTRAINT");
            self.node(name);
        }
    }

    fn key_columns(&mut self, columns: &[NodeId], inline: bool) {
        if inline {
            self.skipped_all(columns);
        } else {
            self.paren_list(columns);
        }
    }

    /// DDL pieces that are neither statements nor definitions.
    pub(super) fn ddl_piece(&mut self, id: NodeId, data: NodeData) {
        match data {
            NodeData::DropColumn { name } => self.node(name),
            NodeData::DropConstraint { name } => {
                self.word("CONSTRAINT");
                self.node(name);
            }
            NodeData::DropIndexItem { index, table, .. } => {
                self.node(index);
                if let Some(table) = table {
                    self.skipped(table);
                }
            }
            NodeData::Parameter {
                variable,
                data_type,
                default_value,
                output,
                ..
            } => {
                self.word(if output { "INOUT" } else { "IN" });
                self.variable_name(variable);
                self.node(data_type);
                if let Some(value) = default_value {
                    self.word("DEFAULT");
                    self.node(value);
                }
            }
            _ => self.unrendered(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Tree;
    use crate::config::Config;
    use crate::modifier::Modifier;
    use crate::parser::parse;
    use crate::writer::render;
    use pretty_assertions::assert_eq;

    fn translate(source: &str) -> String {
        let mut tree = Tree::new();
        let parsed = parse(&mut tree, source).unwrap();
        let root = Modifier::new().run(&mut tree, parsed.root);
        render(&mut tree, root, &Config::builder().comments(false).build())
    }

    #[test]
    fn test_create_table_with_key() {
        assert_eq!(
            translate("create table T (id int not null primary key, name nvarchar(50) null)"),
            "CREATE TABLE T (id INT NOT NULL, name NVARCHAR(50) NULL);\nALTER TABLE T ADD PRIMARY KEY (id);"
        );
    }

    #[test]
    fn test_temporary_table_from_select_into() {
        let text = translate("select a into #t from T");
        assert!(text.starts_with("CREATE LOCAL TEMPORARY TABLE #t AS (SELECT a FROM T) WITH DATA;"), "{text}");
    }

    #[test]
    fn test_procedure_layout() {
        let text = translate(
            "create procedure p @a int, @b int output as begin declare @c int; set @b = @a + 1 end",
        );
        assert_eq!(
            text,
            "CREATE PROCEDURE p (IN a INT, INOUT b INT) LANGUAGE SQLSCRIPT AS\n\
             BEGIN\n\
             DECLARE c INT;\n\
             b = :a + 1;\n\
             END;"
        );
    }

    #[test]
    fn test_if_else() {
        let text = translate("if @a > 0 select 1 else select 2");
        assert!(text.starts_with("IF :a > 0 THEN\n"), "{text}");
        assert!(text.contains("\nELSE\n"), "{text}");
        assert!(text.ends_with("END IF;"), "{text}");
    }

    #[test]
    fn test_exec_becomes_call() {
        assert_eq!(translate("exec dbo.p 1, @x = 'a'"), "CALL dbo.p(1, x => 'a');");
    }

    #[test]
    fn test_index_and_drops() {
        assert_eq!(
            translate("create unique index IX on T (a desc, b)"),
            "CREATE UNIQUE INDEX IX ON T (a DESC, b);"
        );
        assert_eq!(translate("drop view V"), "DROP VIEW V;");
    }
}
