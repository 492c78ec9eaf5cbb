//! SELECT statements, query expressions and table sources.

use super::Parser;
use crate::ast::{AssignOp, JoinKind, NodeData, NodeId, SetOp};
use crate::error::TranslateResult;
use crate::lexer::TokenKind;

impl Parser<'_> {
    /// `[WITH ...] query [ORDER BY ...] [OPTION (...)]`
    pub(crate) fn select_statement(&mut self) -> TranslateResult<NodeId> {
        let with_clause = if self.at_word("WITH") {
            Some(self.with_clause()?)
        } else {
            None
        };
        self.select_statement_with(with_clause)
    }

    pub(crate) fn select_statement_with(
        &mut self,
        with_clause: Option<NodeId>,
    ) -> TranslateResult<NodeId> {
        let query = self.query_expression()?;
        let mut order_by = Vec::new();
        if self.eat_word("ORDER") {
            self.expect_word("BY")?;
            order_by = self.comma_list(|p| p.ordered_item())?;
        }
        let option = self.option_clause()?;
        if self.at_word("FOR") && (self.at_word_at(1, "XML") || self.at_word_at(1, "BROWSE") || self.at_word_at(1, "JSON")) {
            return Err(self.error("FOR XML/JSON/BROWSE is not supported"));
        }
        Ok(self.build(NodeData::SelectStatement {
            with_clause,
            query,
            order_by,
            option,
        }))
    }

    pub(crate) fn with_clause(&mut self) -> TranslateResult<NodeId> {
        self.expect_word("WITH")?;
        let tables = self.comma_list(|p| {
            let name = p.identifier()?;
            let columns = if p.at_symbol("(") {
                p.paren_list(|p| p.identifier())?
            } else {
                Vec::new()
            };
            p.expect_word("AS")?;
            let query = p.parenthesized_query()?;
            Ok(p.build(NodeData::CommonTable {
                name,
                columns,
                query,
            }))
        })?;
        Ok(self.build(NodeData::WithClause { tables }))
    }

    pub(crate) fn option_clause(&mut self) -> TranslateResult<Option<NodeId>> {
        if !self.at_word("OPTION") {
            return Ok(None);
        }
        self.advance();
        let text = self.skip_parens()?;
        let hints = text
            .split(',')
            .map(|hint| hint.trim().to_string())
            .filter(|hint| !hint.is_empty())
            .collect();
        Ok(Some(self.build(NodeData::OptionClause { hints })))
    }

    fn query_expression(&mut self) -> TranslateResult<NodeId> {
        let mut left = self.query_term()?;
        loop {
            let op = if self.eat_word("UNION") {
                if self.eat_word("ALL") {
                    SetOp::UnionAll
                } else {
                    SetOp::Union
                }
            } else if self.eat_word("EXCEPT") {
                SetOp::Except
            } else if self.eat_word("INTERSECT") {
                SetOp::Intersect
            } else {
                break;
            };
            let right = self.query_term()?;
            left = self.build(NodeData::SetOperation { left, op, right });
        }
        Ok(left)
    }

    fn query_term(&mut self) -> TranslateResult<NodeId> {
        if self.eat_symbol("(") {
            let query = self.nested(|p| p.query_expression())?;
            self.expect_symbol(")")?;
            return Ok(self.build(NodeData::ParenQuery { query }));
        }
        self.query_specification()
    }

    fn query_specification(&mut self) -> TranslateResult<NodeId> {
        self.expect_word("SELECT")?;
        let select = self.select_clause()?;

        let into = if self.eat_word("INTO") {
            Some(self.object_name()?)
        } else {
            None
        };
        let from = if self.eat_word("FROM") {
            self.table_sources()?
        } else {
            Vec::new()
        };
        let where_clause = if self.eat_word("WHERE") {
            Some(self.expression()?)
        } else {
            None
        };
        let mut group_by = Vec::new();
        if self.eat_word("GROUP") {
            self.expect_word("BY")?;
            group_by = self.comma_list(|p| p.expression())?;
        }
        let having = if self.eat_word("HAVING") {
            Some(self.expression()?)
        } else {
            None
        };

        Ok(self.build(NodeData::QuerySpecification {
            select,
            into,
            into_variables: Vec::new(),
            from,
            where_clause,
            group_by,
            having,
        }))
    }

    fn select_clause(&mut self) -> TranslateResult<NodeId> {
        let distinct = self.eat_word("DISTINCT");
        if !distinct {
            self.eat_word("ALL");
        }
        let top = if self.at_word("TOP") {
            Some(self.top()?)
        } else {
            None
        };
        let items = self.comma_list(|p| p.select_item())?;
        Ok(self.build(NodeData::SelectClause {
            distinct,
            top,
            items,
        }))
    }

    /// `TOP (n) [PERCENT] [WITH TIES]` or `TOP n`.
    pub(crate) fn top(&mut self) -> TranslateResult<NodeId> {
        self.expect_word("TOP")?;
        let count = if self.eat_symbol("(") {
            let count = self.expression()?;
            self.expect_symbol(")")?;
            count
        } else {
            let token = self.advance();
            match token.kind {
                TokenKind::Number => self.build(NodeData::IntegerLiteral { text: token.text }),
                TokenKind::Variable => self.build(NodeData::Variable {
                    name: token.text,
                    argument: true,
                }),
                _ => return Err(self.error("expected TOP count")),
            }
        };
        let percent = self.eat_word("PERCENT");
        let with_ties = self.at_word("WITH") && self.at_word_at(1, "TIES");
        if with_ties {
            self.advance();
            self.advance();
        }
        Ok(self.build(NodeData::Top {
            count,
            percent,
            with_ties,
        }))
    }

    /// Number of tokens in a `a.b.*` prefix at the cursor, if there is one.
    fn qualified_star(&self) -> Option<usize> {
        let mut i = 0;
        while matches!(self.peek_at(i).kind, TokenKind::Word | TokenKind::QuotedIdent)
            && self.peek_at(i + 1).is_symbol(".")
        {
            i += 2;
            if self.peek_at(i).is_symbol("*") {
                return Some(i + 1);
            }
        }
        None
    }

    pub(crate) fn select_item(&mut self) -> TranslateResult<NodeId> {
        if self.eat_symbol("*") {
            return Ok(self.build(NodeData::SelectStar { qualifier: None }));
        }
        if self.qualified_star().is_some() {
            let mut parts = vec![self.identifier()?];
            self.expect_symbol(".")?;
            while !self.at_symbol("*") {
                parts.push(self.identifier()?);
                self.expect_symbol(".")?;
            }
            self.expect_symbol("*")?;
            let qualifier = self.build(NodeData::DbObject { parts });
            return Ok(self.build(NodeData::SelectStar {
                qualifier: Some(qualifier),
            }));
        }

        if self.peek().kind == TokenKind::Variable
            && let Some(op) = assignment_operator(&self.peek_at(1).text)
        {
            let variable = self.variable()?;
            self.advance();
            let value = self.expression()?;
            return Ok(self.build(NodeData::SelectVariableItem {
                variable,
                op,
                value,
            }));
        }

        // `alias = expression`
        let alias_first = matches!(
            self.peek().kind,
            TokenKind::Word | TokenKind::QuotedIdent | TokenKind::String
        ) && self.peek_at(1).is_symbol("=")
            && !super::is_reserved(&self.peek().text);
        if alias_first {
            let alias = self.alias_name()?;
            self.expect_symbol("=")?;
            let value = self.expression()?;
            return Ok(self.build(NodeData::SelectItem {
                value,
                alias: Some(alias),
            }));
        }

        let value = self.expression()?;
        let alias = self.optional_alias()?;
        Ok(self.build(NodeData::SelectItem { value, alias }))
    }

    /// Identifier, or a string used as a column alias.
    fn alias_name(&mut self) -> TranslateResult<NodeId> {
        if self.peek().kind == TokenKind::String {
            let token = self.advance();
            return Ok(self.build(NodeData::Identifier {
                name: token.text,
                quoted: true,
            }));
        }
        self.identifier()
    }

    /// `[AS] alias`
    pub(crate) fn optional_alias(&mut self) -> TranslateResult<Option<NodeId>> {
        if self.eat_word("AS") {
            return Ok(Some(self.alias_name()?));
        }
        if self.at_alias() || self.peek().kind == TokenKind::String {
            return Ok(Some(self.alias_name()?));
        }
        Ok(None)
    }

    pub(crate) fn table_sources(&mut self) -> TranslateResult<Vec<NodeId>> {
        self.comma_list(|p| p.table_source())
    }

    pub(crate) fn table_source(&mut self) -> TranslateResult<NodeId> {
        let mut left = self.nested(|p| p.table_primary())?;
        while let Some(kind) = self.join_kind() {
            let right = self.nested(|p| p.table_primary())?;
            let condition = match kind {
                JoinKind::Cross | JoinKind::CrossApply | JoinKind::OuterApply => None,
                _ => {
                    self.expect_word("ON")?;
                    Some(self.expression()?)
                }
            };
            left = self.build(NodeData::Join {
                left,
                kind,
                right,
                condition,
            });
        }
        Ok(left)
    }

    /// Consume a join keyword sequence, if one is next.
    fn join_kind(&mut self) -> Option<JoinKind> {
        let (kind, length) = if self.at_word("JOIN") {
            (JoinKind::Inner, 1)
        } else if self.at_word("INNER") && self.at_word_at(1, "JOIN") {
            (JoinKind::Inner, 2)
        } else if self.at_word("CROSS") && self.at_word_at(1, "JOIN") {
            (JoinKind::Cross, 2)
        } else if self.at_word("CROSS") && self.at_word_at(1, "APPLY") {
            (JoinKind::CrossApply, 2)
        } else if self.at_word("OUTER") && self.at_word_at(1, "APPLY") {
            (JoinKind::OuterApply, 2)
        } else if self.at_any_word(&["LEFT", "RIGHT", "FULL"]) {
            let kind = if self.at_word("LEFT") {
                JoinKind::Left
            } else if self.at_word("RIGHT") {
                JoinKind::Right
            } else {
                JoinKind::Full
            };
            if self.at_word_at(1, "JOIN") {
                (kind, 2)
            } else if self.at_word_at(1, "OUTER") && self.at_word_at(2, "JOIN") {
                (kind, 3)
            } else {
                return None;
            }
        } else {
            return None;
        };
        for _ in 0..length {
            self.advance();
        }
        Some(kind)
    }

    fn table_primary(&mut self) -> TranslateResult<NodeId> {
        if self.at_symbol("(") {
            if self.query_follows(1) {
                let query = self.parenthesized_query()?;
                self.eat_word("AS");
                let alias = self.identifier()?;
                let columns = if self.at_symbol("(") {
                    self.paren_list(|p| p.identifier())?
                } else {
                    Vec::new()
                };
                return Ok(self.build(NodeData::DerivedTable {
                    query,
                    alias,
                    columns,
                }));
            }
            self.advance();
            let source = self.table_source()?;
            self.expect_symbol(")")?;
            return Ok(self.build(NodeData::ParenTable { source }));
        }

        if self.peek().kind == TokenKind::Variable {
            let variable = self.variable()?;
            let alias = self.optional_alias()?;
            return Ok(self.build(NodeData::VariableTable { variable, alias }));
        }

        let object = self.object_name()?;
        if self.at_symbol("(") {
            self.advance();
            let arguments = if self.at_symbol(")") {
                Vec::new()
            } else {
                self.comma_list(|p| p.expression())?
            };
            self.expect_symbol(")")?;
            let call = self.build(NodeData::FunctionCall {
                name: object,
                arguments,
            });
            let alias = self.optional_alias()?;
            return Ok(self.build(NodeData::TableFunction { call, alias }));
        }

        let alias = self.optional_alias()?;
        let mut hints = Vec::new();
        let mut sample = None;
        loop {
            if self.at_word("WITH") && self.peek_at(1).is_symbol("(") {
                self.advance();
                let text = self.skip_parens()?;
                hints.extend(
                    text.split(',')
                        .map(|hint| hint.trim().to_string())
                        .filter(|hint| !hint.is_empty()),
                );
            } else if self.eat_word("TABLESAMPLE") {
                let mut text = String::new();
                if self.eat_word("SYSTEM") {
                    text.push_str("SYSTEM ");
                }
                text.push_str(&format!("({})", self.skip_parens()?));
                if self.eat_word("REPEATABLE") {
                    text.push_str(&format!(" REPEATABLE ({})", self.skip_parens()?));
                }
                sample = Some(text);
            } else {
                break;
            }
        }

        Ok(self.build(NodeData::TableRef {
            object,
            alias,
            hints,
            sample,
        }))
    }
}

pub(crate) fn assignment_operator(symbol: &str) -> Option<AssignOp> {
    let op = match symbol {
        "=" => AssignOp::Assign,
        "+=" => AssignOp::Add,
        "-=" => AssignOp::Sub,
        "*=" => AssignOp::Mul,
        "/=" => AssignOp::Div,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use crate::ast::{NodeData, NodeKind, Tree};
    use crate::parser::parse;

    fn statement(source: &str) -> (Tree, crate::ast::NodeId) {
        let mut tree = Tree::new();
        let parsed = parse(&mut tree, source).unwrap();
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        let id = tree.child_ids(parsed.root)[0];
        (tree, id)
    }

    fn kinds(tree: &Tree, root: crate::ast::NodeId) -> Vec<NodeKind> {
        tree.descendants(root).into_iter().map(|id| tree.kind(id)).collect()
    }

    #[test]
    fn test_select_with_join_and_alias() {
        let (tree, id) = statement(
            "select t0.id, name = t1.name, isnull(qty,0) as qty from A t0 \
             left outer join B as t1 on t0.id = t1.id where t0.x > 1 order by 1 desc",
        );
        let kinds = kinds(&tree, id);
        assert!(kinds.contains(&NodeKind::Join));
        assert!(kinds.contains(&NodeKind::OrderedItem));
        assert_eq!(
            kinds.iter().filter(|k| **k == NodeKind::SelectItem).count(),
            3
        );
    }

    #[test]
    fn test_union_and_cte() {
        let (tree, id) = statement(
            "with c (x) as (select 1) select x from c union all select 2",
        );
        let NodeData::SelectStatement { with_clause, query, .. } = tree.data(id) else {
            panic!("expected select");
        };
        assert!(with_clause.is_some());
        assert_eq!(tree.kind(*query), NodeKind::SetOperation);
    }

    #[test]
    fn test_table_hints_and_top() {
        let (tree, id) = statement("select top 10 percent * from T with (nolock, index(ix))");
        let refs: Vec<_> = tree
            .descendants(id)
            .into_iter()
            .filter_map(|n| match tree.data(n) {
                NodeData::TableRef { hints, .. } => Some(hints.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(refs[0].len(), 2);
        assert!(tree
            .descendants(id)
            .into_iter()
            .any(|n| matches!(tree.data(n), NodeData::Top { percent: true, .. })));
    }

    #[test]
    fn test_select_variable_and_star() {
        let (tree, id) = statement("select @a = x, t.* from t");
        let kinds = kinds(&tree, id);
        assert!(kinds.contains(&NodeKind::SelectVariableItem));
        assert!(kinds.contains(&NodeKind::SelectStar));
    }

    #[test]
    fn test_derived_table() {
        let (tree, id) = statement("select d.x from (select 1 as x) as d");
        assert!(kinds(&tree, id).contains(&NodeKind::DerivedTable));
    }
}
