//! CREATE, ALTER and DROP.

use super::Parser;
use crate::ast::{
    AlterIndexAction, NodeData, NodeId, ProcedureOption, TriggerEvent, TriggerTiming,
};
use crate::error::TranslateResult;
use crate::lexer::TokenKind;

impl Parser<'_> {
    pub(crate) fn create_statement(&mut self) -> TranslateResult<NodeId> {
        self.expect_word("CREATE")?;
        if self.at_word("OR") {
            return Err(self.error("CREATE OR ALTER is not supported"));
        }
        if self.eat_word("TABLE") {
            return self.create_table();
        }
        if self.at_any_word(&["UNIQUE", "CLUSTERED", "NONCLUSTERED", "INDEX"]) {
            return self.create_index();
        }
        if self.eat_word("VIEW") {
            let (name, columns, query, check_option, with_attributes) = self.view_body()?;
            return Ok(self.build(NodeData::CreateView {
                name,
                columns,
                query,
                check_option,
                with_attributes,
            }));
        }
        if self.eat_word("PROC") || self.eat_word("PROCEDURE") {
            return self.create_procedure(false);
        }
        if self.eat_word("FUNCTION") {
            return self.create_function();
        }
        if self.eat_word("TRIGGER") {
            return self.create_trigger();
        }
        if self.eat_word("TYPE") {
            return self.create_type();
        }
        Err(self.error("unsupported CREATE statement"))
    }

    pub(crate) fn alter_statement(&mut self) -> TranslateResult<NodeId> {
        self.expect_word("ALTER")?;
        if self.eat_word("TABLE") {
            return self.alter_table();
        }
        if self.eat_word("INDEX") {
            return self.alter_index();
        }
        if self.eat_word("VIEW") {
            let (name, columns, query, check_option, with_attributes) = self.view_body()?;
            return Ok(self.build(NodeData::AlterView {
                name,
                columns,
                query,
                check_option,
                with_attributes,
            }));
        }
        if self.eat_word("PROC") || self.eat_word("PROCEDURE") {
            return self.create_procedure(true);
        }
        Err(self.error("unsupported ALTER statement"))
    }

    pub(crate) fn drop_statement(&mut self) -> TranslateResult<NodeId> {
        self.expect_word("DROP")?;
        let kind = self.advance().text.to_ascii_uppercase();
        if self.at_word("IF") && self.at_word_at(1, "EXISTS") {
            return Err(self.error("DROP ... IF EXISTS is not supported"));
        }
        let data = match kind.as_str() {
            "TABLE" => NodeData::DropTable {
                tables: self.comma_list(|p| p.object_name())?,
            },
            "VIEW" => NodeData::DropView {
                views: self.comma_list(|p| p.object_name())?,
            },
            "PROC" | "PROCEDURE" | "FUNCTION" => NodeData::DropProcedure {
                procedures: self.comma_list(|p| p.object_name())?,
            },
            "TRIGGER" => NodeData::DropTrigger {
                triggers: self.comma_list(|p| p.object_name())?,
            },
            "TYPE" => NodeData::DropType {
                name: self.object_name()?,
            },
            "INDEX" => NodeData::DropIndex {
                items: self.comma_list(|p| p.drop_index_item())?,
            },
            _ => return Err(self.error(format!("unsupported DROP {}", kind))),
        };
        Ok(self.build(data))
    }

    /// `ix ON table [WITH (...)]` or `table.ix`.
    fn drop_index_item(&mut self) -> TranslateResult<NodeId> {
        let name = self.object_name()?;
        let (index, table) = if self.eat_word("ON") {
            (name, Some(self.object_name()?))
        } else {
            (name, None)
        };
        let has_options = self.at_word("WITH") && self.peek_at(1).is_symbol("(");
        if has_options {
            self.advance();
            self.skip_parens()?;
        }
        Ok(self.build(NodeData::DropIndexItem {
            index,
            table,
            has_options,
        }))
    }

    // --- tables ---

    fn create_table(&mut self) -> TranslateResult<NodeId> {
        let name = self.object_name()?;
        let definitions = self.table_definitions()?;
        let file_group = self.file_group();
        if self.eat_word("TEXTIMAGE_ON") {
            self.advance();
        }
        Ok(self.build(NodeData::CreateTable {
            name,
            definitions,
            query: None,
            file_group,
        }))
    }

    /// `ON filegroup`, when present.
    fn file_group(&mut self) -> Option<String> {
        if self.at_word("ON") && matches!(self.peek_at(1).kind, TokenKind::Word | TokenKind::QuotedIdent) {
            self.advance();
            let mut text = self.advance().text;
            if self.at_symbol("(")
                && let Ok(inner) = self.skip_parens()
            {
                text.push_str(&format!("({})", inner));
            }
            return Some(text);
        }
        None
    }

    /// `( column-or-constraint, ... )`
    pub(crate) fn table_definitions(&mut self) -> TranslateResult<Vec<NodeId>> {
        self.paren_list(|p| p.table_definition())
    }

    fn table_definition(&mut self) -> TranslateResult<NodeId> {
        if self.at_any_word(&["CONSTRAINT", "PRIMARY", "UNIQUE", "FOREIGN", "CHECK"]) {
            return self.table_constraint(None);
        }
        if self.at_word("INDEX") {
            return Err(self.error("inline index definitions are not supported"));
        }
        self.column_definition()
    }

    fn column_definition(&mut self) -> TranslateResult<NodeId> {
        let name = self.identifier()?;
        if self.eat_word("AS") {
            let value = self.expression()?;
            self.eat_word("PERSISTED");
            return Ok(self.build(NodeData::ComputedColumn { name, value }));
        }
        let data_type = self.data_type()?;
        let column = self.tree.identifier_name(name).unwrap_or_default().to_string();

        let mut collation = None;
        let mut identity = None;
        let mut nullable = None;
        let mut default_value = None;
        let mut sparse = false;
        let mut constraints = Vec::new();
        loop {
            if self.eat_word("COLLATE") {
                collation = Some(self.advance().text);
            } else if self.eat_word("IDENTITY") {
                let mut seed = ("1".to_string(), "1".to_string());
                if self.eat_symbol("(") {
                    seed.0 = self.advance().text;
                    self.expect_symbol(",")?;
                    seed.1 = self.advance().text;
                    self.expect_symbol(")")?;
                }
                identity = Some(seed);
            } else if self.at_word("NOT") && self.at_word_at(1, "NULL") {
                self.advance();
                self.advance();
                nullable = Some(false);
            } else if self.eat_word("NULL") {
                nullable = Some(true);
            } else if self.eat_word("SPARSE") {
                sparse = true;
            } else if self.eat_word("ROWGUIDCOL") {
            } else if self.at_word("DEFAULT")
                || (self.at_word("CONSTRAINT") && self.at_word_at(2, "DEFAULT"))
            {
                if self.eat_word("CONSTRAINT") {
                    self.advance();
                }
                self.expect_word("DEFAULT")?;
                default_value = Some(self.expression()?);
            } else if self.at_any_word(&["CONSTRAINT", "PRIMARY", "UNIQUE", "REFERENCES", "CHECK", "FOREIGN"]) {
                constraints.push(self.table_constraint(Some(&column))?);
            } else {
                break;
            }
        }

        Ok(self.build(NodeData::ColumnDefinition {
            name,
            data_type,
            collation,
            identity,
            nullable,
            default_value,
            sparse,
            constraints,
        }))
    }

    /// Key or check constraint. `column` is set for constraints written
    /// inline on a column, which then apply to that column.
    fn table_constraint(&mut self, column: Option<&str>) -> TranslateResult<NodeId> {
        let name = if self.eat_word("CONSTRAINT") {
            Some(self.identifier()?)
        } else {
            None
        };

        if self.at_word("PRIMARY") || self.at_word("UNIQUE") {
            let primary = self.eat_word("PRIMARY");
            if primary {
                self.expect_word("KEY")?;
            } else {
                self.expect_word("UNIQUE")?;
            }
            let clustered = self.clustered();
            let columns = match column {
                Some(column) if !self.at_symbol("(") => {
                    let name = self.build(NodeData::Identifier {
                        name: column.to_string(),
                        quoted: false,
                    });
                    vec![self.build(NodeData::OrderedColumn { name, order: None })]
                }
                _ => self.paren_list(|p| {
                    let name = p.identifier()?;
                    let order = p.sort_order();
                    Ok(p.build(NodeData::OrderedColumn { name, order }))
                })?,
            };
            let has_options = self.at_word("WITH") && self.peek_at(1).is_symbol("(");
            if has_options {
                self.advance();
                self.skip_parens()?;
            }
            let file_group = self.file_group();
            let data = if primary {
                NodeData::PrimaryKey {
                    name,
                    clustered,
                    columns,
                    has_options,
                    file_group,
                }
            } else {
                NodeData::UniqueKey {
                    name,
                    clustered,
                    columns,
                    has_options,
                    file_group,
                }
            };
            return Ok(self.build(data));
        }

        if self.at_word("FOREIGN") || self.at_word("REFERENCES") {
            let columns = if self.eat_word("FOREIGN") {
                self.expect_word("KEY")?;
                self.paren_list(|p| p.identifier())?
            } else {
                let column = column.unwrap_or_default().to_string();
                vec![self.build(NodeData::Identifier {
                    name: column,
                    quoted: false,
                })]
            };
            self.expect_word("REFERENCES")?;
            let reference = self.object_name()?;
            let reference_columns = if self.at_symbol("(") {
                self.paren_list(|p| p.identifier())?
            } else {
                Vec::new()
            };
            let mut on_delete = None;
            let mut on_update = None;
            while self.at_word("ON") {
                self.advance();
                let event = self.advance().text.to_ascii_uppercase();
                let mut action = self.advance().text.to_ascii_uppercase();
                if matches!(action.as_str(), "NO" | "SET") {
                    action = format!("{} {}", action, self.advance().text.to_ascii_uppercase());
                }
                if event == "DELETE" {
                    on_delete = Some(action);
                } else {
                    on_update = Some(action);
                }
            }
            self.not_for_replication();
            return Ok(self.build(NodeData::ForeignKey {
                name,
                columns,
                reference,
                reference_columns,
                on_delete,
                on_update,
            }));
        }

        if self.eat_word("CHECK") {
            self.not_for_replication();
            self.expect_symbol("(")?;
            let condition = self.expression()?;
            self.expect_symbol(")")?;
            return Ok(self.build(NodeData::CheckConstraint { name, condition }));
        }

        Err(self.error("expected constraint"))
    }

    fn clustered(&mut self) -> Option<bool> {
        if self.eat_word("CLUSTERED") {
            Some(true)
        } else if self.eat_word("NONCLUSTERED") {
            Some(false)
        } else {
            None
        }
    }

    fn not_for_replication(&mut self) {
        if self.at_word("NOT") && self.at_word_at(1, "FOR") && self.at_word_at(2, "REPLICATION") {
            for _ in 0..3 {
                self.advance();
            }
        }
    }

    fn alter_table(&mut self) -> TranslateResult<NodeId> {
        let table = self.object_name()?;

        let with_check = if self.at_word("WITH") && self.at_any_word_at(1, &["CHECK", "NOCHECK"]) {
            self.advance();
            Some(self.advance().is_word("CHECK"))
        } else {
            None
        };

        let action = if self.eat_word("ADD") {
            let definitions = self.comma_list(|p| p.table_definition())?;
            self.build(NodeData::AddDefinitions {
                with_check,
                definitions,
            })
        } else if with_check.is_none() && self.at_word("DROP") {
            self.advance();
            let items = self.comma_list(|p| {
                if p.eat_word("COLUMN") {
                    let name = p.identifier()?;
                    Ok(p.build(NodeData::DropColumn { name }))
                } else {
                    p.eat_word("CONSTRAINT");
                    let name = p.identifier()?;
                    Ok(p.build(NodeData::DropConstraint { name }))
                }
            })?;
            self.build(NodeData::DropDefinitions { items })
        } else if with_check.is_none() && self.at_word("ALTER") && self.at_word_at(1, "COLUMN") {
            self.advance();
            self.advance();
            let name = self.identifier()?;
            let data_type = self.data_type()?;
            let mut collation = None;
            let mut nullable = None;
            let mut sparse = false;
            loop {
                if self.eat_word("COLLATE") {
                    collation = Some(self.advance().text);
                } else if self.at_word("NOT") && self.at_word_at(1, "NULL") {
                    self.advance();
                    self.advance();
                    nullable = Some(false);
                } else if self.eat_word("NULL") {
                    nullable = Some(true);
                } else if self.eat_word("SPARSE") {
                    sparse = true;
                } else {
                    break;
                }
            }
            self.build(NodeData::AlterColumn {
                name,
                data_type,
                collation,
                nullable,
                sparse,
            })
        } else {
            let mut text = self.rest_of_statement();
            if let Some(check) = with_check {
                text = format!("WITH {} {}", if check { "CHECK" } else { "NOCHECK" }, text);
            }
            self.build(NodeData::TableOption { text })
        };

        Ok(self.build(NodeData::AlterTable { table, action }))
    }

    fn at_any_word_at(&self, n: usize, words: &[&str]) -> bool {
        words.iter().any(|w| self.at_word_at(n, w))
    }

    // --- indexes ---

    fn create_index(&mut self) -> TranslateResult<NodeId> {
        let unique = self.eat_word("UNIQUE");
        let clustered = self.clustered();
        self.expect_word("INDEX")?;
        let name = self.identifier()?;
        self.expect_word("ON")?;
        let table = self.object_name()?;
        let columns = self.paren_list(|p| {
            let name = p.identifier()?;
            let order = p.sort_order();
            Ok(p.build(NodeData::OrderedColumn { name, order }))
        })?;
        let include = if self.eat_word("INCLUDE") {
            self.paren_list(|p| p.identifier())?
        } else {
            Vec::new()
        };
        let filter = if self.eat_word("WHERE") {
            Some(self.expression()?)
        } else {
            None
        };
        let has_options = self.at_word("WITH") && self.peek_at(1).is_symbol("(");
        if has_options {
            self.advance();
            self.skip_parens()?;
        }
        let file_group = self.file_group();
        Ok(self.build(NodeData::CreateIndex {
            unique,
            clustered,
            name,
            table,
            columns,
            include,
            filter,
            has_options,
            file_group,
        }))
    }

    fn alter_index(&mut self) -> TranslateResult<NodeId> {
        let index = if self.eat_word("ALL") {
            None
        } else {
            Some(self.identifier()?)
        };
        self.expect_word("ON")?;
        let table = Some(self.object_name()?);
        let action = match self.advance().text.to_ascii_uppercase().as_str() {
            "REBUILD" => AlterIndexAction::Rebuild,
            "DISABLE" => AlterIndexAction::Disable,
            "REORGANIZE" => AlterIndexAction::Reorganize,
            "SET" => AlterIndexAction::Set,
            _ => return Err(self.error("unsupported ALTER INDEX action")),
        };
        let has_options = !self.rest_of_statement().is_empty();
        Ok(self.build(NodeData::AlterIndex {
            index,
            table,
            action,
            has_options,
        }))
    }

    // --- views ---

    #[allow(clippy::type_complexity)]
    fn view_body(&mut self) -> TranslateResult<(NodeId, Vec<NodeId>, NodeId, bool, bool)> {
        let name = self.object_name()?;
        let columns = if self.at_symbol("(") {
            self.paren_list(|p| p.identifier())?
        } else {
            Vec::new()
        };
        let mut with_attributes = false;
        if self.eat_word("WITH") {
            with_attributes = true;
            loop {
                if !self.at_identifier() {
                    return Err(self.error("expected view attribute"));
                }
                self.advance();
                if !self.eat_symbol(",") {
                    break;
                }
            }
        }
        self.expect_word("AS")?;
        let query = self.select_statement()?;
        self.tree.node_mut(query).terminate = false;
        let check_option = self.at_word("WITH") && self.at_word_at(1, "CHECK");
        if check_option {
            self.advance();
            self.advance();
            self.expect_word("OPTION")?;
        }
        Ok((name, columns, query, check_option, with_attributes))
    }

    // --- procedures, functions, triggers ---

    fn parameters(&mut self) -> TranslateResult<Vec<NodeId>> {
        let parenthesized = self.eat_symbol("(");
        let mut parameters = Vec::new();
        if self.peek().kind == TokenKind::Variable {
            parameters = self.comma_list(|p| p.parameter())?;
        }
        if parenthesized {
            self.expect_symbol(")")?;
        }
        Ok(parameters)
    }

    fn parameter(&mut self) -> TranslateResult<NodeId> {
        let variable = self.variable()?;
        self.eat_word("AS");
        let data_type = self.data_type()?;
        self.eat_word("VARYING");
        let default_value = if self.eat_symbol("=") {
            Some(self.expression()?)
        } else {
            None
        };
        let output = self.eat_word("OUTPUT") || self.eat_word("OUT");
        let readonly = self.eat_word("READONLY");
        Ok(self.build(NodeData::Parameter {
            variable,
            data_type,
            default_value,
            output,
            readonly,
        }))
    }

    fn procedure_options(&mut self) -> TranslateResult<Vec<ProcedureOption>> {
        let mut options = Vec::new();
        if !self.eat_word("WITH") {
            return Ok(options);
        }
        loop {
            let word = self.advance().text.to_ascii_uppercase();
            let option = match word.as_str() {
                "ENCRYPTION" => ProcedureOption::Encryption,
                "RECOMPILE" => ProcedureOption::Recompile,
                "SCHEMABINDING" => ProcedureOption::SchemaBinding,
                "NATIVE_COMPILATION" => ProcedureOption::NativeCompilation,
                "EXECUTE" | "EXEC" => {
                    self.expect_word("AS")?;
                    ProcedureOption::ExecuteAs(self.advance().text.to_ascii_uppercase())
                }
                _ => return Err(self.error(format!("unsupported option {}", word))),
            };
            options.push(option);
            if !self.eat_symbol(",") {
                break;
            }
        }
        Ok(options)
    }

    /// Body of a procedure or trigger: everything up to the end of the batch.
    fn batch_body(&mut self) -> TranslateResult<NodeId> {
        let mut statements = Vec::new();
        loop {
            while self.eat_symbol(";") {}
            if self.peek().is_eof() || self.at_word("GO") {
                break;
            }
            statements.push(self.statement()?);
        }
        if statements.len() == 1 && self.tree.kind(statements[0]) == crate::ast::NodeKind::Block {
            return Ok(statements[0]);
        }
        Ok(self.build(NodeData::Block { statements }))
    }

    fn create_procedure(&mut self, alter: bool) -> TranslateResult<NodeId> {
        let name = self.object_name()?;
        if self.eat_symbol(";") {
            return Err(self.error("numbered procedures are not supported"));
        }
        let parameters = self.parameters()?;
        let options = self.procedure_options()?;
        let for_replication = self.at_word("FOR") && self.at_word_at(1, "REPLICATION");
        if for_replication {
            self.advance();
            self.advance();
        }
        self.expect_word("AS")?;
        let body = self.batch_body()?;
        let data = if alter {
            NodeData::AlterProcedure {
                name,
                parameters,
                options,
                for_replication,
                body,
            }
        } else {
            NodeData::CreateProcedure {
                name,
                parameters,
                options,
                for_replication,
                declarations: Vec::new(),
                body,
            }
        };
        Ok(self.build(data))
    }

    fn create_function(&mut self) -> TranslateResult<NodeId> {
        let name = self.object_name()?;
        let parameters = self.parameters()?;
        self.expect_word("RETURNS")?;
        if self.peek().kind == TokenKind::Variable {
            return Err(self.error("multi-statement table functions are not supported"));
        }
        let returns = if self.eat_word("TABLE") {
            None
        } else {
            Some(self.data_type()?)
        };
        let options = self.procedure_options()?;
        self.eat_word("AS");
        let body = if returns.is_none() {
            self.expect_word("RETURN")?;
            let query = if self.at_symbol("(") {
                self.parenthesized_query()?
            } else {
                self.select_statement()?
            };
            self.tree.node_mut(query).terminate = true;
            self.build(NodeData::Block {
                statements: vec![query],
            })
        } else {
            self.batch_body()?
        };
        Ok(self.build(NodeData::CreateFunction {
            name,
            parameters,
            returns,
            options,
            body,
        }))
    }

    fn create_trigger(&mut self) -> TranslateResult<NodeId> {
        let name = self.object_name()?;
        self.expect_word("ON")?;
        let table = self.object_name()?;
        if self.at_word("WITH") {
            self.procedure_options()?;
        }
        let timing = if self.eat_word("AFTER") || self.eat_word("FOR") {
            TriggerTiming::After
        } else {
            self.expect_word("INSTEAD")?;
            self.expect_word("OF")?;
            TriggerTiming::InsteadOf
        };
        let mut events = Vec::new();
        loop {
            let event = match self.advance().text.to_ascii_uppercase().as_str() {
                "INSERT" => TriggerEvent::Insert,
                "UPDATE" => TriggerEvent::Update,
                "DELETE" => TriggerEvent::Delete,
                _ => return Err(self.error("expected trigger event")),
            };
            events.push(event);
            if !self.eat_symbol(",") {
                break;
            }
        }
        self.not_for_replication();
        self.expect_word("AS")?;
        let body = self.batch_body()?;
        Ok(self.build(NodeData::CreateTrigger {
            name,
            table,
            timing,
            events,
            body,
        }))
    }

    fn create_type(&mut self) -> TranslateResult<NodeId> {
        let name = self.object_name()?;
        if self.eat_word("FROM") {
            let data_type = self.data_type()?;
            if self.at_word("NOT") && self.at_word_at(1, "NULL") {
                self.advance();
                self.advance();
            } else {
                self.eat_word("NULL");
            }
            return Ok(self.build(NodeData::CreateType { name, data_type }));
        }
        self.expect_word("AS")?;
        self.expect_word("TABLE")?;
        let definitions = self.table_definitions()?;
        Ok(self.build(NodeData::CreateTableType { name, definitions }))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{NodeData, NodeId, NodeKind, Tree};
    use crate::parser::parse;

    fn statements(source: &str) -> (Tree, Vec<NodeId>) {
        let mut tree = Tree::new();
        let parsed = parse(&mut tree, source).unwrap();
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        let ids = tree.child_ids(parsed.root);
        (tree, ids)
    }

    #[test]
    fn test_create_table_with_constraints() {
        let (tree, ids) = statements(
            "create table dbo.T (id int identity(1,1) not null primary key clustered, \
             name nvarchar(50) collate Latin1_General_CI_AS null default 'x', \
             total as qty * price, \
             constraint FK_T foreign key (pid) references P (id) on delete cascade) on [PRIMARY]",
        );
        let NodeData::CreateTable { definitions, file_group, .. } = tree.data(ids[0]) else {
            panic!("expected create table");
        };
        assert_eq!(definitions.len(), 4);
        assert_eq!(file_group.as_deref(), Some("PRIMARY"));
        let kinds: Vec<_> = tree.descendants(ids[0]).into_iter().map(|id| tree.kind(id)).collect();
        assert!(kinds.contains(&NodeKind::PrimaryKey));
        assert!(kinds.contains(&NodeKind::ComputedColumn));
        assert!(kinds.contains(&NodeKind::ForeignKey));
    }

    #[test]
    fn test_create_procedure_body() {
        let (tree, ids) = statements(
            "create procedure dbo.p @a int, @b varchar(10) = null output with recompile as\n\
             begin\n  select @a\n  set @b = 'x'\nend\ngo\nselect 1",
        );
        let NodeData::CreateProcedure { parameters, options, body, .. } = tree.data(ids[0]) else {
            panic!("expected procedure");
        };
        assert_eq!(parameters.len(), 2);
        assert_eq!(options.len(), 1);
        assert_eq!(tree.child_ids(*body).len(), 2);
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_alter_table_actions() {
        let (tree, ids) = statements(
            "alter table T add c int null, constraint PK primary key (c)\n\
             alter table T drop constraint PK, column c\n\
             alter table T alter column c bigint not null\n\
             alter table T with nocheck add constraint CK check (c > 0)",
        );
        let actions: Vec<_> = ids
            .iter()
            .map(|id| match tree.data(*id) {
                NodeData::AlterTable { action, .. } => tree.kind(*action),
                _ => panic!("expected alter table"),
            })
            .collect();
        assert_eq!(
            actions,
            vec![
                NodeKind::AddDefinitions,
                NodeKind::DropDefinitions,
                NodeKind::AlterColumn,
                NodeKind::AddDefinitions
            ]
        );
    }

    #[test]
    fn test_index_and_drop() {
        let (tree, ids) = statements(
            "create unique nonclustered index IX on T (a desc, b) include (c) where a > 0 with (fillfactor = 80)\n\
             drop index IX on T, T.IX2\n\
             drop table A, B, C",
        );
        assert!(matches!(
            tree.data(ids[0]),
            NodeData::CreateIndex { unique: true, has_options: true, .. }
        ));
        let NodeData::DropIndex { items } = tree.data(ids[1]) else {
            panic!("expected drop index");
        };
        assert_eq!(items.len(), 2);
        let NodeData::DropTable { tables } = tree.data(ids[2]) else {
            panic!("expected drop table");
        };
        assert_eq!(tables.len(), 3);
    }

    #[test]
    fn test_function_trigger_type_view() {
        let (tree, ids) = statements(
            "create function f(@a int) returns table as return (select @a as a)\ngo\n\
             create trigger tr on T after insert, update as select 1\ngo\n\
             create type udt from varchar(10) not null\n\
             create type tt as table (id int)\n\
             create view v (a) as select 1 with check option",
        );
        let kinds: Vec<_> = ids.iter().map(|id| tree.kind(*id)).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::CreateFunction,
                NodeKind::GoStatement,
                NodeKind::CreateTrigger,
                NodeKind::GoStatement,
                NodeKind::CreateType,
                NodeKind::CreateTableType,
                NodeKind::CreateView,
            ]
        );
    }
}
