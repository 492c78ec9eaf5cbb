//! Expressions and search conditions.
//!
//! Precedence, loosest first: OR, AND, NOT, predicates, `+ - & | ^`,
//! `* / %`, unary, COLLATE, primaries.

use super::{is_reserved, Parser};
use crate::ast::{
    AddOp, AggregateFunc, BitOp, BuiltinValue, CompareOp, LogicOp, MulOp, NodeData, NodeId,
    RankingFunc, SortOrder, UnaryOp,
};
use crate::error::TranslateResult;
use crate::lexer::TokenKind;

impl Parser<'_> {
    pub(crate) fn expression(&mut self) -> TranslateResult<NodeId> {
        self.nested(|p| p.or_expression())
    }

    fn or_expression(&mut self) -> TranslateResult<NodeId> {
        let mut left = self.and_expression()?;
        while self.eat_word("OR") {
            let right = self.and_expression()?;
            left = self.build(NodeData::Logical {
                left,
                op: LogicOp::Or,
                right,
            });
        }
        Ok(left)
    }

    fn and_expression(&mut self) -> TranslateResult<NodeId> {
        let mut left = self.not_expression()?;
        while self.eat_word("AND") {
            let right = self.not_expression()?;
            left = self.build(NodeData::Logical {
                left,
                op: LogicOp::And,
                right,
            });
        }
        Ok(left)
    }

    fn not_expression(&mut self) -> TranslateResult<NodeId> {
        if self.eat_word("NOT") {
            let operand = self.nested(|p| p.not_expression())?;
            return Ok(self.build(NodeData::Not { operand }));
        }
        self.predicate()
    }

    fn predicate(&mut self) -> TranslateResult<NodeId> {
        if self.eat_word("EXISTS") {
            let query = self.parenthesized_query()?;
            return Ok(self.build(NodeData::Exists { query }));
        }

        let left = self.additive()?;

        if let Some(op) = self.comparison_operator() {
            self.advance();
            let right = self.additive()?;
            return Ok(self.build(NodeData::Comparison { left, op, right }));
        }

        if self.eat_word("IS") {
            let negated = self.eat_word("NOT");
            self.expect_word("NULL")?;
            return Ok(self.build(NodeData::IsNull {
                operand: left,
                negated,
            }));
        }

        let negated = self.at_word("NOT")
            && (self.at_word_at(1, "BETWEEN") || self.at_word_at(1, "LIKE") || self.at_word_at(1, "IN"));
        if negated {
            self.advance();
        }

        if self.eat_word("BETWEEN") {
            let low = self.additive()?;
            self.expect_word("AND")?;
            let high = self.additive()?;
            return Ok(self.build(NodeData::Between {
                operand: left,
                low,
                high,
                negated,
            }));
        }

        if self.eat_word("LIKE") {
            let pattern = self.additive()?;
            let escape = if self.eat_word("ESCAPE") {
                Some(self.additive()?)
            } else {
                None
            };
            return Ok(self.build(NodeData::Like {
                operand: left,
                pattern,
                escape,
                negated,
            }));
        }

        if self.eat_word("IN") {
            if self.at_symbol("(") && self.query_follows(1) {
                let query = self.parenthesized_query()?;
                return Ok(self.build(NodeData::InSubquery {
                    operand: left,
                    query,
                    negated,
                }));
            }
            let items = self.paren_list(|p| p.expression())?;
            return Ok(self.build(NodeData::InList {
                operand: left,
                items,
                negated,
            }));
        }

        if negated {
            return Err(self.error("expected BETWEEN, LIKE or IN"));
        }
        Ok(left)
    }

    fn comparison_operator(&self) -> Option<CompareOp> {
        let token = self.peek();
        if token.kind != TokenKind::Symbol {
            return None;
        }
        let op = match token.text.as_str() {
            "=" => CompareOp::Eq,
            "<>" | "!=" => CompareOp::Ne,
            "<" => CompareOp::Lt,
            "<=" => CompareOp::Le,
            ">" => CompareOp::Gt,
            ">=" => CompareOp::Ge,
            "!<" => CompareOp::NotLt,
            "!>" => CompareOp::NotGt,
            _ => return None,
        };
        Some(op)
    }

    fn additive(&mut self) -> TranslateResult<NodeId> {
        let mut left = self.multiplicative()?;
        loop {
            let token = self.peek();
            let symbol = match token.text.as_str() {
                "+" | "-" | "&" | "|" | "^" if token.kind == TokenKind::Symbol => token.text.clone(),
                _ => break,
            };
            self.advance();
            let right = self.multiplicative()?;
            let data = match symbol.as_str() {
                "+" => NodeData::Additive { left, op: AddOp::Plus, right },
                "-" => NodeData::Additive { left, op: AddOp::Minus, right },
                "&" => NodeData::Bitwise { left, op: BitOp::And, right },
                "|" => NodeData::Bitwise { left, op: BitOp::Or, right },
                _ => NodeData::Bitwise { left, op: BitOp::Xor, right },
            };
            left = self.build(data);
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> TranslateResult<NodeId> {
        let mut left = self.unary()?;
        loop {
            let op = if self.at_symbol("*") {
                MulOp::Mul
            } else if self.at_symbol("/") {
                MulOp::Div
            } else if self.at_symbol("%") {
                MulOp::Mod
            } else {
                break;
            };
            self.advance();
            let right = self.unary()?;
            left = self.build(NodeData::Multiplicative { left, op, right });
        }
        Ok(left)
    }

    fn unary(&mut self) -> TranslateResult<NodeId> {
        if self.eat_symbol("-") {
            let operand = self.nested(|p| p.unary())?;
            return Ok(self.build(NodeData::Unary {
                op: UnaryOp::Minus,
                operand,
            }));
        }
        if self.eat_symbol("+") {
            let operand = self.nested(|p| p.unary())?;
            return Ok(self.build(NodeData::Unary {
                op: UnaryOp::Plus,
                operand,
            }));
        }
        if self.eat_symbol("~") {
            let operand = self.nested(|p| p.unary())?;
            return Ok(self.build(NodeData::BitwiseNot { operand }));
        }
        let mut operand = self.primary()?;
        while self.eat_word("COLLATE") {
            let collation = self.advance().text;
            operand = self.build(NodeData::Collate { operand, collation });
        }
        Ok(operand)
    }

    fn primary(&mut self) -> TranslateResult<NodeId> {
        let kind = self.peek().kind;
        match kind {
            TokenKind::Number => {
                let text = self.advance().text;
                let data = if text.contains(['.', 'e', 'E']) {
                    NodeData::DecimalLiteral { text }
                } else {
                    NodeData::IntegerLiteral { text }
                };
                Ok(self.build(data))
            }
            TokenKind::Binary => {
                let text = self.advance().text;
                Ok(self.build(NodeData::DecimalLiteral { text }))
            }
            TokenKind::String | TokenKind::UnicodeString => {
                let value = self.advance().text;
                Ok(self.build(NodeData::StringLiteral {
                    value,
                    unicode: kind == TokenKind::UnicodeString,
                }))
            }
            TokenKind::Variable => self.variable(),
            TokenKind::QuotedIdent => self.name_or_call(),
            TokenKind::Symbol if self.at_symbol("(") => {
                if self.query_follows(1) {
                    let query = self.parenthesized_query()?;
                    return Ok(self.build(NodeData::Subquery { query }));
                }
                self.advance();
                let inner = self.expression()?;
                self.expect_symbol(")")?;
                Ok(self.build(NodeData::Parens { inner }))
            }
            TokenKind::Word => self.word_primary(),
            _ => Err(self.error("expected expression")),
        }
    }

    fn word_primary(&mut self) -> TranslateResult<NodeId> {
        let word = self.peek().text.to_ascii_uppercase();
        let call = self.peek_at(1).is_symbol("(");
        match word.as_str() {
            "NULL" => {
                self.advance();
                Ok(self.build(NodeData::NullLiteral))
            }
            "CASE" => self.case_expression(),
            "CAST" if call => self.cast(),
            "CONVERT" if call => self.convert(),
            "IIF" if call => self.iif(),
            "CHOOSE" if call => self.choose(),
            "DATEPART" | "DATENAME" if call => self.date_part(word == "DATENAME"),
            "CURRENT_TIMESTAMP" => self.builtin(BuiltinValue::CurrentTimestamp),
            "CURRENT_USER" | "SESSION_USER" | "SYSTEM_USER" if !call => {
                self.builtin(BuiltinValue::CurrentUser)
            }
            "LEFT" | "RIGHT" if call => self.name_or_call(),
            _ if is_reserved(&word) => Err(self.error("expected expression")),
            _ => self.name_or_call(),
        }
    }

    fn builtin(&mut self, value: BuiltinValue) -> TranslateResult<NodeId> {
        self.advance();
        Ok(self.build(NodeData::Builtin { value }))
    }

    /// Column reference or function call, both possibly multi-part.
    fn name_or_call(&mut self) -> TranslateResult<NodeId> {
        let name = self.object_name()?;
        if !self.at_symbol("(") {
            return Ok(self.build(NodeData::ColumnRef { object: name }));
        }

        let parts = self.tree.object_parts(name);
        if parts.len() == 1 {
            let upper = parts[0].to_ascii_uppercase();
            if let Some(function) = AggregateFunc::from_name(&upper) {
                return self.aggregate(function);
            }
            let ranking = match upper.as_str() {
                "RANK" => Some(RankingFunc::Rank),
                "DENSE_RANK" => Some(RankingFunc::DenseRank),
                "ROW_NUMBER" => Some(RankingFunc::RowNumber),
                _ => None,
            };
            if let Some(function) = ranking {
                self.expect_symbol("(")?;
                self.expect_symbol(")")?;
                let over = self.over_clause()?;
                return Ok(self.build(NodeData::Ranking { function, over }));
            }
            if upper == "NTILE" {
                self.expect_symbol("(")?;
                let groups = self.expression()?;
                self.expect_symbol(")")?;
                let over = self.over_clause()?;
                return Ok(self.build(NodeData::NTile { groups, over }));
            }
        }

        self.expect_symbol("(")?;
        let arguments = if self.at_symbol(")") {
            Vec::new()
        } else {
            self.comma_list(|p| p.expression())?
        };
        self.expect_symbol(")")?;
        if self.at_word("OVER") {
            return Err(self.error("windowed function calls are not supported"));
        }
        Ok(self.build(NodeData::FunctionCall { name, arguments }))
    }

    fn aggregate(&mut self, function: AggregateFunc) -> TranslateResult<NodeId> {
        self.expect_symbol("(")?;
        let distinct = self.eat_word("DISTINCT");
        if !distinct {
            self.eat_word("ALL");
        }
        let argument = if self.eat_symbol("*") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_symbol(")")?;
        let over = if self.at_word("OVER") {
            Some(self.over_clause()?)
        } else {
            None
        };
        Ok(self.build(NodeData::Aggregate {
            function,
            distinct,
            argument,
            over,
        }))
    }

    fn over_clause(&mut self) -> TranslateResult<NodeId> {
        self.expect_word("OVER")?;
        self.expect_symbol("(")?;
        let mut partition = Vec::new();
        if self.eat_word("PARTITION") {
            self.expect_word("BY")?;
            partition = self.comma_list(|p| p.expression())?;
        }
        let mut order_by = Vec::new();
        if self.eat_word("ORDER") {
            self.expect_word("BY")?;
            order_by = self.comma_list(|p| p.ordered_item())?;
        }
        self.expect_symbol(")")?;
        Ok(self.build(NodeData::Over {
            partition,
            order_by,
        }))
    }

    pub(crate) fn ordered_item(&mut self) -> TranslateResult<NodeId> {
        let value = self.expression()?;
        let order = self.sort_order();
        Ok(self.build(NodeData::OrderedItem { value, order }))
    }

    pub(crate) fn sort_order(&mut self) -> Option<SortOrder> {
        if self.eat_word("ASC") {
            Some(SortOrder::Asc)
        } else if self.eat_word("DESC") {
            Some(SortOrder::Desc)
        } else {
            None
        }
    }

    fn case_expression(&mut self) -> TranslateResult<NodeId> {
        self.expect_word("CASE")?;
        let operand = if self.at_word("WHEN") {
            None
        } else {
            Some(self.expression()?)
        };
        let mut whens = Vec::new();
        while self.eat_word("WHEN") {
            let condition = self.expression()?;
            self.expect_word("THEN")?;
            let result = self.expression()?;
            whens.push(self.build(NodeData::CaseWhen { condition, result }));
        }
        if whens.is_empty() {
            return Err(self.error("expected WHEN"));
        }
        let else_value = if self.eat_word("ELSE") {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect_word("END")?;
        Ok(self.build(NodeData::Case {
            operand,
            whens,
            else_value,
        }))
    }

    fn cast(&mut self) -> TranslateResult<NodeId> {
        self.advance();
        self.expect_symbol("(")?;
        let operand = self.expression()?;
        self.expect_word("AS")?;
        let data_type = self.data_type()?;
        self.expect_symbol(")")?;
        Ok(self.build(NodeData::Cast { operand, data_type }))
    }

    fn convert(&mut self) -> TranslateResult<NodeId> {
        self.advance();
        self.expect_symbol("(")?;
        let data_type = self.data_type()?;
        self.expect_symbol(",")?;
        let operand = self.expression()?;
        let style = if self.eat_symbol(",") {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect_symbol(")")?;
        Ok(self.build(NodeData::Convert {
            data_type,
            operand,
            style,
        }))
    }

    fn iif(&mut self) -> TranslateResult<NodeId> {
        self.advance();
        self.expect_symbol("(")?;
        let condition = self.expression()?;
        self.expect_symbol(",")?;
        let then_value = self.expression()?;
        self.expect_symbol(",")?;
        let else_value = self.expression()?;
        self.expect_symbol(")")?;
        Ok(self.build(NodeData::Iif {
            condition,
            then_value,
            else_value,
        }))
    }

    fn choose(&mut self) -> TranslateResult<NodeId> {
        self.advance();
        self.expect_symbol("(")?;
        let index = self.expression()?;
        let mut options = Vec::new();
        while self.eat_symbol(",") {
            options.push(self.expression()?);
        }
        self.expect_symbol(")")?;
        Ok(self.build(NodeData::Choose { index, options }))
    }

    fn date_part(&mut self, name: bool) -> TranslateResult<NodeId> {
        self.advance();
        self.expect_symbol("(")?;
        let part = match self.peek().kind {
            TokenKind::Word | TokenKind::QuotedIdent | TokenKind::String => {
                self.advance().text.to_ascii_lowercase()
            }
            _ => return Err(self.error("expected date part")),
        };
        self.expect_symbol(",")?;
        let operand = self.expression()?;
        self.expect_symbol(")")?;
        let data = if name {
            NodeData::DateName { part, operand }
        } else {
            NodeData::DatePart { part, operand }
        };
        Ok(self.build(data))
    }

    /// `name`, `name(n)`, `name(p, s)`, `name(MAX)`, `schema.name`.
    pub(crate) fn data_type(&mut self) -> TranslateResult<NodeId> {
        if !self.at_identifier() {
            return Err(self.error("expected data type"));
        }
        let mut name = self.advance().text;
        while self.eat_symbol(".") {
            if !self.at_identifier() {
                return Err(self.error("expected data type"));
            }
            name.push('.');
            name.push_str(&self.advance().text);
        }
        if name.eq_ignore_ascii_case("DOUBLE") && self.eat_word("PRECISION") {
            name.push_str(" PRECISION");
        }
        let mut arguments = Vec::new();
        if self.eat_symbol("(") {
            loop {
                let token = self.advance();
                match token.kind {
                    TokenKind::Number | TokenKind::Word => arguments.push(token.text),
                    _ => return Err(self.error("expected type length")),
                }
                if !self.eat_symbol(",") {
                    break;
                }
            }
            self.expect_symbol(")")?;
        }
        Ok(self.build(NodeData::DataType { name, arguments }))
    }

    /// True when a query starts `n` tokens ahead, possibly behind more `(`.
    pub(crate) fn query_follows(&self, n: usize) -> bool {
        let mut i = n;
        while self.peek_at(i).is_symbol("(") {
            i += 1;
        }
        self.at_word_at(i, "SELECT") || self.at_word_at(i, "WITH")
    }

    /// `( select ... )` as a `SelectStatement`.
    pub(crate) fn parenthesized_query(&mut self) -> TranslateResult<NodeId> {
        self.expect_symbol("(")?;
        let query = self.nested(|p| p.select_statement())?;
        self.expect_symbol(")")?;
        self.tree.node_mut(query).terminate = false;
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{NodeData, NodeKind, Tree};
    use crate::lexer::tokenize;
    use crate::parser::Parser;

    fn expr(source: &str) -> (Tree, crate::ast::NodeId) {
        let mut tree = Tree::new();
        let id = {
            let mut parser = Parser::new(&mut tree, tokenize(source).unwrap());
            parser.expression().unwrap()
        };
        (tree, id)
    }

    #[test]
    fn test_precedence() {
        let (tree, id) = expr("a = 1 or b = 2 and c = 3");
        match tree.data(id) {
            NodeData::Logical { right, .. } => {
                assert_eq!(tree.kind(*right), NodeKind::Logical);
            }
            other => panic!("unexpected {:?}", other),
        }
        let (tree, id) = expr("1 + 2 * 3");
        match tree.data(id) {
            NodeData::Additive { right, .. } => {
                assert_eq!(tree.kind(*right), NodeKind::Multiplicative);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_predicates() {
        let (tree, id) = expr("x is not null");
        assert!(matches!(tree.data(id), NodeData::IsNull { negated: true, .. }));
        let (tree, id) = expr("x not between 1 and 2");
        assert!(matches!(tree.data(id), NodeData::Between { negated: true, .. }));
        let (tree, id) = expr("x in (select y from t)");
        assert_eq!(tree.kind(id), NodeKind::InSubquery);
        let (tree, id) = expr("x in (1, 2, 3)");
        assert!(matches!(tree.data(id), NodeData::InList { items, .. } if items.len() == 3));
        let (tree, id) = expr("not exists (select 1)");
        assert_eq!(tree.kind(id), NodeKind::Not);
    }

    #[test]
    fn test_functions() {
        let (tree, id) = expr("isnull(qty, 0)");
        assert_eq!(tree.function_name(id).as_deref(), Some("ISNULL"));
        let (tree, id) = expr("count(distinct x)");
        assert!(matches!(tree.data(id), NodeData::Aggregate { distinct: true, .. }));
        let (tree, id) = expr("row_number() over (partition by a order by b desc)");
        assert_eq!(tree.kind(id), NodeKind::Ranking);
        let (tree, id) = expr("convert(varchar(10), d, 112)");
        assert!(matches!(tree.data(id), NodeData::Convert { style: Some(_), .. }));
        let (tree, id) = expr("datepart(dw, d)");
        assert!(matches!(tree.data(id), NodeData::DatePart { part, .. } if part == "dw"));
        let (tree, id) = expr("name collate Latin1_General_CI_AS");
        assert_eq!(tree.kind(id), NodeKind::Collate);
    }

    #[test]
    fn test_data_type_arguments() {
        let (tree, id) = expr("cast(x as nvarchar(max))");
        let NodeData::Cast { data_type, .. } = tree.data(id) else {
            panic!("expected cast");
        };
        assert!(matches!(tree.data(*data_type), NodeData::DataType { name, arguments }
            if name == "nvarchar" && arguments == &vec!["max".to_string()]));
    }
}
