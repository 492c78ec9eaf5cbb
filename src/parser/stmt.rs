//! DML, control-flow and session statements.

use super::query::assignment_operator;
use super::{Parser, STATEMENT_START};
use crate::ast::{CursorAction, NodeData, NodeId, TransactionAction};
use crate::error::TranslateResult;
use crate::lexer::TokenKind;

impl Parser<'_> {
    pub(crate) fn statement(&mut self) -> TranslateResult<NodeId> {
        self.nested(|p| p.statement_inner())
    }

    fn statement_inner(&mut self) -> TranslateResult<NodeId> {
        if self.at_symbol("(") && self.query_follows(1) {
            return self.select_statement();
        }
        if self.at_identifier() && self.peek_at(1).is_symbol(":") {
            let label = self.advance().text;
            self.advance();
            return Ok(self.build(NodeData::LabelStatement { label }));
        }
        if self.peek().kind != TokenKind::Word {
            return Err(self.error("expected statement"));
        }

        let word = self.peek().text.to_ascii_uppercase();
        match word.as_str() {
            "SELECT" => self.select_statement(),
            "WITH" => self.with_statement(),
            "INSERT" => self.insert_statement(None),
            "UPDATE" if self.at_word_at(1, "STATISTICS") => self.update_statistics(),
            "UPDATE" => self.update_statement(None),
            "DELETE" => self.delete_statement(None),
            "DECLARE" => self.declare_statement(),
            "SET" => self.set_statement(),
            "IF" => self.if_statement(),
            "WHILE" => self.while_statement(),
            "BEGIN" => self.begin_statement(),
            "COMMIT" => self.transaction(TransactionAction::Commit),
            "ROLLBACK" => self.transaction(TransactionAction::Rollback),
            "SAVE" => self.transaction(TransactionAction::Save),
            "RETURN" => self.return_statement(),
            "BREAK" => {
                self.advance();
                Ok(self.build(NodeData::BreakStatement))
            }
            "CONTINUE" => {
                self.advance();
                Ok(self.build(NodeData::ContinueStatement))
            }
            "EXEC" | "EXECUTE" => self.exec_statement(),
            "USE" => {
                self.advance();
                let database = self.identifier()?;
                Ok(self.build(NodeData::UseStatement { database }))
            }
            "GO" => {
                self.advance();
                if self.peek().kind == TokenKind::Number {
                    self.advance();
                }
                let id = self.build(NodeData::GoStatement);
                self.tree.node_mut(id).terminate = false;
                Ok(id)
            }
            "THROW" => {
                self.advance();
                let arguments = if self.at_statement_end() {
                    Vec::new()
                } else {
                    self.comma_list(|p| p.expression())?
                };
                Ok(self.build(NodeData::ThrowStatement { arguments }))
            }
            "GOTO" => {
                self.advance();
                let label = self.advance().text;
                Ok(self.build(NodeData::GotoStatement { label }))
            }
            "WAITFOR" => {
                self.advance();
                let delay = if self.eat_word("DELAY") {
                    true
                } else {
                    self.expect_word("TIME")?;
                    false
                };
                let value = self.expression()?;
                Ok(self.build(NodeData::WaitForStatement { delay, value }))
            }
            "OPEN" => self.cursor_statement(CursorAction::Open),
            "CLOSE" => self.cursor_statement(CursorAction::Close),
            "DEALLOCATE" => self.cursor_statement(CursorAction::Deallocate),
            "FETCH" => self.fetch_statement(),
            "TRUNCATE" => {
                self.advance();
                self.expect_word("TABLE")?;
                let table = self.object_name()?;
                Ok(self.build(NodeData::TruncateTable { table }))
            }
            "PRINT" | "RAISERROR" => {
                let text = self.rest_of_statement();
                let description = format!("{} statement", word);
                let id = self.build(NodeData::UnsupportedStatement { description });
                tracing::trace!(%text, "statement kept as sentinel");
                Ok(id)
            }
            "CREATE" => self.create_statement(),
            "ALTER" => self.alter_statement(),
            "DROP" => self.drop_statement(),
            _ => Err(self.error("unknown statement")),
        }
    }

    /// `;`, end of input, `END`, or the start of another statement.
    pub(crate) fn at_statement_end(&self) -> bool {
        let token = self.peek();
        token.is_eof()
            || token.is_symbol(";")
            || token.is_word("END")
            || token.is_word("ELSE")
            || (token.kind == TokenKind::Word && STATEMENT_START.iter().any(|w| token.is_word(w)))
    }

    fn with_statement(&mut self) -> TranslateResult<NodeId> {
        let with_clause = Some(self.with_clause()?);
        if self.at_word("INSERT") {
            self.insert_statement(with_clause)
        } else if self.at_word("UPDATE") {
            self.update_statement(with_clause)
        } else if self.at_word("DELETE") {
            self.delete_statement(with_clause)
        } else {
            self.select_statement_with(with_clause)
        }
    }

    /// Statements up to `END`, for `BEGIN ... END` bodies.
    pub(crate) fn statements_until_end(&mut self) -> TranslateResult<Vec<NodeId>> {
        let mut statements = Vec::new();
        loop {
            while self.eat_symbol(";") {}
            if self.at_word("END") {
                break;
            }
            if self.peek().is_eof() {
                return Err(self.error("expected END"));
            }
            statements.push(self.statement()?);
        }
        Ok(statements)
    }

    fn begin_statement(&mut self) -> TranslateResult<NodeId> {
        self.expect_word("BEGIN")?;
        if self.at_any_word(&["TRAN", "TRANSACTION", "DISTRIBUTED"]) {
            self.eat_word("DISTRIBUTED");
            self.advance();
            let name = self.transaction_name();
            return Ok(self.build(NodeData::TransactionStatement {
                action: TransactionAction::Begin,
                name,
            }));
        }
        if self.eat_word("TRY") {
            let statements = self.statements_until_end()?;
            self.expect_word("END")?;
            self.expect_word("TRY")?;
            let body = self.build(NodeData::Block { statements });
            while self.eat_symbol(";") {}
            self.expect_word("BEGIN")?;
            self.expect_word("CATCH")?;
            let statements = self.statements_until_end()?;
            self.expect_word("END")?;
            self.expect_word("CATCH")?;
            let catch_body = self.build(NodeData::Block { statements });
            return Ok(self.build(NodeData::TryStatement { body, catch_body }));
        }
        let statements = self.statements_until_end()?;
        self.expect_word("END")?;
        Ok(self.build(NodeData::Block { statements }))
    }

    fn transaction_name(&mut self) -> Option<String> {
        if self.at_statement_end() {
            return None;
        }
        match self.peek().kind {
            TokenKind::Word | TokenKind::QuotedIdent | TokenKind::Variable => {
                Some(self.advance().text)
            }
            _ => None,
        }
    }

    fn transaction(&mut self, action: TransactionAction) -> TranslateResult<NodeId> {
        self.advance();
        if !self.eat_word("TRAN") && !self.eat_word("TRANSACTION") {
            self.eat_word("WORK");
        }
        let name = self.transaction_name();
        Ok(self.build(NodeData::TransactionStatement { action, name }))
    }

    fn if_statement(&mut self) -> TranslateResult<NodeId> {
        self.expect_word("IF")?;
        let condition = self.expression()?;
        let then_branch = self.statement()?;
        while self.at_symbol(";") && self.at_word_at(1, "ELSE") {
            self.advance();
        }
        let else_branch = if self.eat_word("ELSE") {
            Some(self.statement()?)
        } else {
            None
        };
        Ok(self.build(NodeData::IfStatement {
            condition,
            then_branch,
            else_branch,
        }))
    }

    fn while_statement(&mut self) -> TranslateResult<NodeId> {
        self.expect_word("WHILE")?;
        let condition = self.expression()?;
        let body = self.statement()?;
        Ok(self.build(NodeData::WhileStatement { condition, body }))
    }

    fn return_statement(&mut self) -> TranslateResult<NodeId> {
        self.expect_word("RETURN")?;
        let value = if self.at_statement_end() {
            None
        } else {
            Some(self.expression()?)
        };
        Ok(self.build(NodeData::ReturnStatement { value }))
    }

    // --- DML ---

    /// `name [WITH (hints)]` or `@table` as the target of a DML statement.
    fn dml_target(&mut self) -> TranslateResult<NodeId> {
        if self.peek().kind == TokenKind::Variable {
            let variable = self.variable()?;
            return Ok(self.build(NodeData::VariableTable {
                variable,
                alias: None,
            }));
        }
        let object = self.object_name()?;
        let mut hints = Vec::new();
        if self.at_word("WITH") && self.peek_at(1).is_symbol("(") {
            self.advance();
            let text = self.skip_parens()?;
            hints.extend(
                text.split(',')
                    .map(|hint| hint.trim().to_string())
                    .filter(|hint| !hint.is_empty()),
            );
        }
        Ok(self.build(NodeData::TableRef {
            object,
            alias: None,
            hints,
            sample: None,
        }))
    }

    fn dml_top(&mut self) -> TranslateResult<Option<NodeId>> {
        if self.at_word("TOP") {
            Ok(Some(self.top()?))
        } else {
            Ok(None)
        }
    }

    fn output_clause(&mut self) -> TranslateResult<Option<NodeId>> {
        if !self.eat_word("OUTPUT") {
            return Ok(None);
        }
        let items = self.comma_list(|p| p.select_item())?;
        let into = if self.eat_word("INTO") {
            let target = self.dml_target()?;
            if self.at_symbol("(") {
                self.skip_parens()?;
            }
            Some(target)
        } else {
            None
        };
        Ok(Some(self.build(NodeData::OutputClause { items, into })))
    }

    fn insert_statement(&mut self, with_clause: Option<NodeId>) -> TranslateResult<NodeId> {
        self.expect_word("INSERT")?;
        let top = self.dml_top()?;
        self.eat_word("INTO");
        let target = self.dml_target()?;
        let columns = if self.at_symbol("(") && !self.query_follows(1) {
            self.paren_list(|p| p.identifier())?
        } else {
            Vec::new()
        };
        let output = self.output_clause()?;

        let source = if self.eat_word("VALUES") {
            let rows = self.comma_list(|p| {
                let values = p.paren_list(|p| {
                    if p.at_word("DEFAULT") {
                        p.advance();
                        let object = p.tree.object(&["DEFAULT"]);
                        Ok(p.build(NodeData::ColumnRef { object }))
                    } else {
                        p.expression()
                    }
                })?;
                Ok(p.build(NodeData::ValuesRow { values }))
            })?;
            self.build(NodeData::ValuesList { rows })
        } else if self.at_word("DEFAULT") {
            self.advance();
            self.expect_word("VALUES")?;
            self.build(NodeData::DefaultValues)
        } else if self.at_any_word(&["EXEC", "EXECUTE"]) {
            let exec = self.exec_statement()?;
            self.build(NodeData::ValuesExec { exec })
        } else if self.at_word("SELECT") || self.at_word("WITH") || self.at_symbol("(") {
            let query = self.select_statement()?;
            self.tree.node_mut(query).terminate = false;
            self.build(NodeData::ValuesQuery { query })
        } else {
            return Err(self.error("expected VALUES, SELECT or EXEC"));
        };

        Ok(self.build(NodeData::InsertStatement {
            with_clause,
            top,
            target,
            columns,
            output,
            source,
        }))
    }

    fn set_column(&mut self) -> TranslateResult<NodeId> {
        let target = if self.peek().kind == TokenKind::Variable {
            self.variable()?
        } else {
            let object = self.object_name()?;
            self.build(NodeData::ColumnRef { object })
        };
        let op = match assignment_operator(&self.peek().text) {
            Some(op) if self.peek().kind == TokenKind::Symbol => op,
            _ => return Err(self.error("expected assignment")),
        };
        self.advance();
        let value = self.expression()?;
        Ok(self.build(NodeData::SetColumn { target, op, value }))
    }

    fn where_clause(&mut self) -> TranslateResult<Option<NodeId>> {
        if !self.eat_word("WHERE") {
            return Ok(None);
        }
        if self.at_word("CURRENT") && self.at_word_at(1, "OF") {
            return Err(self.error("WHERE CURRENT OF is not supported"));
        }
        Ok(Some(self.expression()?))
    }

    fn update_statement(&mut self, with_clause: Option<NodeId>) -> TranslateResult<NodeId> {
        self.expect_word("UPDATE")?;
        let top = self.dml_top()?;
        let target = self.dml_target()?;
        self.expect_word("SET")?;
        let assignments = self.comma_list(|p| p.set_column())?;
        let output = self.output_clause()?;
        let from = if self.eat_word("FROM") {
            self.table_sources()?
        } else {
            Vec::new()
        };
        let where_clause = self.where_clause()?;
        let option = self.option_clause()?;
        Ok(self.build(NodeData::UpdateStatement {
            with_clause,
            top,
            target,
            assignments,
            output,
            from,
            where_clause,
            option,
        }))
    }

    fn delete_statement(&mut self, with_clause: Option<NodeId>) -> TranslateResult<NodeId> {
        self.expect_word("DELETE")?;
        let top = self.dml_top()?;
        self.eat_word("FROM");
        let target = self.dml_target()?;
        let output = self.output_clause()?;
        let from = if self.eat_word("FROM") {
            self.table_sources()?
        } else {
            Vec::new()
        };
        let where_clause = self.where_clause()?;
        let option = self.option_clause()?;
        Ok(self.build(NodeData::DeleteStatement {
            with_clause,
            top,
            target,
            output,
            from,
            where_clause,
            option,
        }))
    }

    fn update_statistics(&mut self) -> TranslateResult<NodeId> {
        self.expect_word("UPDATE")?;
        self.expect_word("STATISTICS")?;
        let table = self.object_name()?;
        let id = self.build(NodeData::UpdateStatistics { table });
        self.rest_of_statement();
        Ok(id)
    }

    // --- variables ---

    fn declare_statement(&mut self) -> TranslateResult<NodeId> {
        self.expect_word("DECLARE")?;
        let declarations = self.comma_list(|p| p.declaration())?;
        Ok(self.build(NodeData::DeclareStatement { declarations }))
    }

    fn declaration(&mut self) -> TranslateResult<NodeId> {
        if self.at_identifier() {
            let name = self.advance().text;
            let name = self.build(NodeData::CursorName {
                name,
                variable: false,
            });
            return self.cursor_declaration(name);
        }

        let variable = self.variable()?;
        self.eat_word("AS");
        if self.eat_word("TABLE") {
            let definitions = self.table_definitions()?;
            return Ok(self.build(NodeData::TableDeclaration {
                variable,
                definitions,
            }));
        }
        if self.at_word("CURSOR") {
            return Err(self.error("cursor variables must be assigned with SET"));
        }
        let data_type = self.data_type()?;
        let value = if self.eat_symbol("=") {
            Some(self.expression()?)
        } else {
            None
        };
        Ok(self.build(NodeData::ScalarDeclaration {
            variable,
            data_type,
            value,
        }))
    }

    /// `[INSENSITIVE] [SCROLL] CURSOR [options] FOR select [FOR UPDATE [OF cols]]`
    fn cursor_declaration(&mut self, name: NodeId) -> TranslateResult<NodeId> {
        while !self.at_word("CURSOR") {
            if self.at_statement_end() {
                return Err(self.error("expected CURSOR"));
            }
            self.advance();
        }
        self.advance();
        while !self.at_word("FOR") {
            if self.at_statement_end() {
                return Err(self.error("expected FOR"));
            }
            self.advance();
        }
        self.advance();
        let query = self.select_statement()?;
        self.tree.node_mut(query).terminate = false;
        let mut for_update = false;
        if self.at_word("FOR") && self.at_word_at(1, "UPDATE") {
            self.advance();
            self.advance();
            for_update = true;
            if self.eat_word("OF") {
                self.comma_list(|p| p.identifier())?;
            }
        }
        Ok(self.build(NodeData::CursorDeclaration {
            name,
            query,
            for_update,
        }))
    }

    fn set_statement(&mut self) -> TranslateResult<NodeId> {
        self.expect_word("SET")?;
        if self.peek().kind == TokenKind::Variable {
            let variable = self.variable()?;
            let op = match assignment_operator(&self.peek().text) {
                Some(op) if self.peek().kind == TokenKind::Symbol => op,
                _ => return Err(self.error("expected assignment")),
            };
            self.advance();
            if self.at_word("CURSOR")
                && let NodeData::Variable { name, .. } = self.tree.data(variable).clone()
            {
                let name = self.build(NodeData::CursorName {
                    name,
                    variable: true,
                });
                self.tree.move_comments(variable, name);
                let declaration = self.cursor_declaration(name)?;
                return Ok(self.build(NodeData::DeclareStatement {
                    declarations: vec![declaration],
                }));
            }
            let value = self.expression()?;
            return Ok(self.build(NodeData::SetVariable {
                variable,
                op,
                value,
            }));
        }

        if self.eat_word("IDENTITY_INSERT") {
            let table = self.object_name()?;
            let on = if self.eat_word("ON") {
                true
            } else {
                self.expect_word("OFF")?;
                false
            };
            return Ok(self.build(NodeData::IdentityInsert { table, on }));
        }

        let option = self.advance().text.to_ascii_uppercase();
        let value = self.rest_of_statement();
        Ok(self.build(NodeData::SetOption { option, value }))
    }

    // --- procedures ---

    fn exec_statement(&mut self) -> TranslateResult<NodeId> {
        self.advance();
        if self.at_symbol("(") {
            self.advance();
            let mut parts = vec![self.expression()?];
            while self.eat_symbol(",") {
                parts.push(self.expression()?);
            }
            self.expect_symbol(")")?;
            return Ok(self.build(NodeData::ExecString { parts }));
        }

        let return_variable =
            if self.peek().kind == TokenKind::Variable && self.peek_at(1).is_symbol("=") {
                let variable = self.variable()?;
                self.advance();
                Some(variable)
            } else {
                None
            };
        let procedure = self.object_name()?;
        let mut arguments = Vec::new();
        if !self.at_statement_end() && !self.at_word("WITH") {
            arguments = self.comma_list(|p| p.exec_argument())?;
        }
        let mut options = Vec::new();
        if self.at_word("WITH") {
            self.advance();
            if self.eat_word("RECOMPILE") {
                options.push(self.build(NodeData::ExecOption { recompile: true }));
            } else {
                return Err(self.error("unsupported EXEC option"));
            }
        }
        Ok(self.build(NodeData::ExecStatement {
            return_variable,
            procedure,
            arguments,
            options,
        }))
    }

    fn exec_argument(&mut self) -> TranslateResult<NodeId> {
        let name = if self.peek().kind == TokenKind::Variable && self.peek_at(1).is_symbol("=") {
            let name = self.variable()?;
            self.advance();
            Some(name)
        } else {
            None
        };
        let value = if self.at_word("DEFAULT") {
            self.advance();
            let object = self.tree.object(&["DEFAULT"]);
            self.build(NodeData::ColumnRef { object })
        } else {
            self.expression()?
        };
        let output = self.eat_word("OUTPUT") || self.eat_word("OUT");
        Ok(self.build(NodeData::ExecArgument {
            name,
            value,
            output,
        }))
    }

    // --- cursors ---

    fn cursor_name(&mut self) -> TranslateResult<NodeId> {
        self.eat_word("GLOBAL");
        let token = self.advance();
        let variable = match token.kind {
            TokenKind::Variable => true,
            TokenKind::Word | TokenKind::QuotedIdent => false,
            _ => return Err(self.error("expected cursor name")),
        };
        Ok(self.build(NodeData::CursorName {
            name: token.text,
            variable,
        }))
    }

    fn cursor_statement(&mut self, action: CursorAction) -> TranslateResult<NodeId> {
        self.advance();
        let cursor = self.cursor_name()?;
        Ok(self.build(NodeData::CursorStatement { action, cursor }))
    }

    fn fetch_statement(&mut self) -> TranslateResult<NodeId> {
        self.expect_word("FETCH")?;
        let mut direction = None;
        if self.at_any_word(&["NEXT", "PRIOR", "FIRST", "LAST"]) {
            direction = Some(self.advance().text.to_ascii_uppercase());
        } else if self.at_any_word(&["ABSOLUTE", "RELATIVE"]) {
            let word = self.advance().text.to_ascii_uppercase();
            let amount = self.advance().text;
            direction = Some(format!("{} {}", word, amount));
        }
        self.eat_word("FROM");
        let cursor = self.cursor_name()?;
        let into = if self.eat_word("INTO") {
            self.comma_list(|p| p.variable())?
        } else {
            Vec::new()
        };
        Ok(self.build(NodeData::FetchStatement {
            direction,
            cursor,
            into,
        }))
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
    fn test_insert_values_rows() {
        let (tree, ids) = statements("insert into dbo.T (a, b) values (1, 'x'), (2, 'y')");
        let NodeData::InsertStatement { columns, source, .. } = tree.data(ids[0]) else {
            panic!("expected insert");
        };
        assert_eq!(columns.len(), 2);
        let NodeData::ValuesList { rows } = tree.data(*source) else {
            panic!("expected values");
        };
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_insert_select_and_exec() {
        let (tree, ids) = statements("insert T select * from S; insert T exec p 1");
        assert!(matches!(tree.data(ids[0]), NodeData::InsertStatement { .. }));
        let NodeData::InsertStatement { source, .. } = tree.data(ids[1]) else {
            panic!("expected insert");
        };
        assert_eq!(tree.kind(*source), NodeKind::ValuesExec);
    }

    #[test]
    fn test_update_and_delete() {
        let (tree, ids) = statements(
            "update T set a = 1, b += 2 from T join S on T.id = S.id where S.x = 0\n\
             delete from T where a is null",
        );
        assert_eq!(tree.kind(ids[0]), NodeKind::UpdateStatement);
        assert_eq!(tree.kind(ids[1]), NodeKind::DeleteStatement);
    }

    #[test]
    fn test_control_flow() {
        let (tree, ids) = statements(
            "if @a > 1 begin set @a = 0; return end else while @a < 3 set @a += 1",
        );
        let NodeData::IfStatement { then_branch, else_branch, .. } = tree.data(ids[0]) else {
            panic!("expected if");
        };
        assert_eq!(tree.kind(*then_branch), NodeKind::Block);
        assert_eq!(tree.kind(else_branch.unwrap()), NodeKind::WhileStatement);
    }

    #[test]
    fn test_declarations() {
        let (tree, ids) = statements(
            "declare @a int = 1, @t table (id int); declare c cursor for select 1 for update",
        );
        let kinds: Vec<_> = tree.descendants(ids[0]).into_iter().map(|id| tree.kind(id)).collect();
        assert!(kinds.contains(&NodeKind::ScalarDeclaration));
        assert!(kinds.contains(&NodeKind::TableDeclaration));
        assert!(tree
            .descendants(ids[1])
            .into_iter()
            .any(|id| matches!(tree.data(id), NodeData::CursorDeclaration { for_update: true, .. })));
    }

    #[test]
    fn test_session_statements() {
        let (tree, ids) = statements(
            "use db\nset nocount on\nset identity_insert T on\nbegin tran\ncommit\nexec @r = p @x = 1, @y output",
        );
        let kinds: Vec<_> = ids.iter().map(|id| tree.kind(*id)).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::UseStatement,
                NodeKind::SetOption,
                NodeKind::IdentityInsert,
                NodeKind::TransactionStatement,
                NodeKind::TransactionStatement,
                NodeKind::ExecStatement,
            ]
        );
    }

    #[test]
    fn test_try_catch_and_labels() {
        let (tree, ids) = statements(
            "begin try select 1 end try begin catch select 2 end catch\nlbl: goto lbl",
        );
        assert_eq!(tree.kind(ids[0]), NodeKind::TryStatement);
        assert_eq!(tree.kind(ids[1]), NodeKind::LabelStatement);
        assert_eq!(tree.kind(ids[2]), NodeKind::GotoStatement);
    }

    #[test]
    fn test_cursor_statements() {
        let (tree, ids) = statements("open c; fetch next from c into @a, @b; close c; deallocate c");
        let NodeData::FetchStatement { direction, into, .. } = tree.data(ids[1]) else {
            panic!("expected fetch");
        };
        assert_eq!(direction.as_deref(), Some("NEXT"));
        assert_eq!(into.len(), 2);
    }
}
