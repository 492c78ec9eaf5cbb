//! Expression rules: built-in functions, date arithmetic, operators,
//! aggregates and data types.

use super::{error, info, Modifier};
use crate::ast::{
    AddOp, AggregateFunc, BitOp, BuiltinValue, MulOp, NodeData, NodeId, NodeKind, Tree,
};
use crate::scanner::Handlers;

const PI: &str = "3.14159265358979";
const RADIANS_PER_DEGREE: &str = "0.0174532925199433";
const DEGREES_PER_RADIAN: &str = "57.2957795130823";
const ZERO_DATE: &str = "1900-01-01 00:00:00.000";

const NO_ARGUMENTS: &[&str] = &[];
const MONEY: &[&str] = &["19", "4"];
const SMALLMONEY: &[&str] = &["10", "4"];
const GUID: &[&str] = &["36"];

pub(super) fn register(handlers: Handlers<Modifier>) -> Handlers<Modifier> {
    handlers
        .action(NodeKind::FunctionCall, function_call)
        .action(NodeKind::DatePart, date_part)
        .action(NodeKind::DateName, date_name)
        .action(NodeKind::Additive, additive)
        .action(NodeKind::Multiplicative, multiplicative)
        .action(NodeKind::Bitwise, bitwise)
        .action(NodeKind::BitwiseNot, bitwise_not)
        .action(NodeKind::Convert, convert)
        .post(NodeKind::Collate, collate)
        .action(NodeKind::Iif, iif)
        .action(NodeKind::Choose, choose)
        .action(NodeKind::Aggregate, aggregate)
        .action(NodeKind::DataType, data_type)
        .action(NodeKind::Variable, global_variable)
        .action(NodeKind::UnsupportedExpression, unsupported_sentinel)
        .action(NodeKind::UnsupportedStatement, unsupported_sentinel)
        .action(NodeKind::UnsupportedClause, unsupported_sentinel)
}

/// Canonical name of a T-SQL date part, abbreviations included.
pub(crate) fn date_part_name(part: &str) -> Option<&'static str> {
    let name = match part.trim_matches(|c| c == '\'' || c == '"').to_ascii_lowercase().as_str() {
        "year" | "yy" | "yyyy" => "year",
        "quarter" | "qq" | "q" => "quarter",
        "month" | "mm" | "m" => "month",
        "dayofyear" | "dy" | "y" => "dayofyear",
        "day" | "dd" | "d" => "day",
        "week" | "wk" | "ww" => "week",
        "weekday" | "dw" | "w" => "weekday",
        "hour" | "hh" => "hour",
        "minute" | "mi" | "n" => "minute",
        "second" | "ss" | "s" => "second",
        "millisecond" | "ms" => "millisecond",
        "microsecond" | "mcs" => "microsecond",
        "nanosecond" | "ns" => "nanosecond",
        _ => return None,
    };
    Some(name)
}

/// Date part given as the first argument of DATEADD or DATEDIFF.
fn part_argument(tree: &Tree, id: NodeId) -> String {
    match tree.data(id) {
        NodeData::StringLiteral { value, .. } => value.clone(),
        _ => tree.object_name(id),
    }
}

/// Replace the name of the cloned call, keeping its arguments.
fn rename(m: &mut Modifier, tree: &mut Tree, name: &str) -> bool {
    let current = m.current();
    let object = tree.object(&[name]);
    if let NodeData::FunctionCall { name, .. } = tree.data_mut(current) {
        *name = object;
    }
    true
}

/// Operand that binds tighter than `*` once wrapped.
pub(super) fn grouped(tree: &mut Tree, id: NodeId) -> NodeId {
    match tree.kind(id) {
        NodeKind::Additive
        | NodeKind::Multiplicative
        | NodeKind::Bitwise
        | NodeKind::Concat
        | NodeKind::Unary => tree.add(NodeData::Parens { inner: id }),
        _ => id,
    }
}

fn scaled(tree: &mut Tree, factor: i64, value: NodeId) -> NodeId {
    if factor == 1 {
        return value;
    }
    let left = tree.int(factor);
    let right = grouped(tree, value);
    tree.add(NodeData::Multiplicative {
        left,
        op: MulOp::Mul,
        right,
    })
}

fn divided(tree: &mut Tree, value: NodeId, divisor: i64) -> NodeId {
    let right = tree.int(divisor);
    tree.add(NodeData::Multiplicative {
        left: value,
        op: MulOp::Div,
        right,
    })
}

/// A date argument in target form. String literals become date literals,
/// integers count days from 1900-01-01.
fn date_operand(tree: &mut Tree, id: NodeId) -> (NodeId, Option<&'static str>) {
    match tree.data(id).clone() {
        NodeData::StringLiteral { value, .. } => (tree.add(NodeData::DateLiteral { text: value }), None),
        NodeData::IntegerLiteral { .. } => {
            let zero = tree.add(NodeData::DateLiteral {
                text: ZERO_DATE.to_string(),
            });
            (
                tree.call("ADD_DAYS", vec![zero, id]),
                Some("Integer date was converted as a number of days since 1900-01-01"),
            )
        }
        _ => (id, None),
    }
}

fn replace_noted(m: &mut Modifier, tree: &mut Tree, node: NodeId, note: Option<&str>) -> bool {
    if let Some(note) = note {
        info(tree, node, note);
    }
    m.replace(tree, node)
}

fn function_call(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::FunctionCall { name, arguments } = tree.data(id).clone() else {
        return true;
    };
    if tree.object_parts(name).len() != 1 {
        return true;
    }
    let Some(function) = tree.function_name(id) else {
        return true;
    };

    match (function.as_str(), arguments.as_slice()) {
        ("SUSER_NAME" | "SUSER_SNAME" | "USER_NAME", _) => builtin(m, tree, BuiltinValue::CurrentUser),
        ("GETUTCDATE", []) => builtin(m, tree, BuiltinValue::CurrentUtcTimestamp),
        ("DB_NAME", _) => builtin(m, tree, BuiltinValue::CurrentSchema),
        ("GETDATE" | "SYSDATETIME", []) => rename(m, tree, "NOW"),
        ("LEN", [_]) => rename(m, tree, "LENGTH"),
        ("DAY", [_]) => rename(m, tree, "DAYOFMONTH"),
        ("ISNULL", [_, _]) => rename(m, tree, "IFNULL"),
        ("ATN2", [_, _]) => rename(m, tree, "ATAN2"),
        ("CEILING", [_]) => rename(m, tree, "CEIL"),
        ("LOG", [_]) => rename(m, tree, "LN"),
        ("LOG", [value, base]) => {
            let call = tree.call("LOG", vec![*base, *value]);
            m.replace(tree, call)
        }
        ("LOG10", [value]) => {
            let base = tree.int(10);
            let call = tree.call("LOG", vec![base, *value]);
            m.replace(tree, call)
        }
        ("SPACE", [count]) => {
            let pad = tree.string(" ");
            let call = tree.call("LPAD", vec![pad, *count]);
            m.replace(tree, call)
        }
        ("SQUARE", [value]) => {
            let two = tree.int(2);
            let call = tree.call("POWER", vec![*value, two]);
            m.replace(tree, call)
        }
        ("PI", []) => {
            let pi = tree.add(NodeData::DecimalLiteral {
                text: PI.to_string(),
            });
            m.replace(tree, pi)
        }
        ("RAND", [_]) => {
            let call = tree.call("RAND", Vec::new());
            info(tree, call, "RAND seed was removed");
            m.replace(tree, call)
        }
        ("RADIANS" | "DEGREES", [value]) => {
            let factor = if function == "RADIANS" {
                RADIANS_PER_DEGREE
            } else {
                DEGREES_PER_RADIAN
            };
            let factor = factor.to_string();
            let left = grouped(tree, *value);
            let right = tree.add(NodeData::DecimalLiteral { text: factor });
            let product = tree.add(NodeData::Multiplicative {
                left,
                op: MulOp::Mul,
                right,
            });
            info(tree, product, format!("{} was converted to a multiplication", function));
            m.replace(tree, product)
        }
        ("ROUND", [value, digits, _, ..]) => {
            let call = tree.call("ROUND", vec![*value, *digits]);
            info(tree, call, "ROUND truncation argument was removed");
            m.replace(tree, call)
        }
        ("CHARINDEX", [needle, haystack, rest @ ..]) => {
            let call = tree.call("LOCATE", vec![*haystack, *needle]);
            if !rest.is_empty() {
                info(tree, call, "CHARINDEX start position was removed");
            }
            m.replace(tree, call)
        }
        ("EOMONTH", [date]) => {
            let call = tree.call("LAST_DAY", vec![*date]);
            m.replace(tree, call)
        }
        ("EOMONTH", [date, months]) => {
            let shifted = tree.call("ADD_MONTHS", vec![*date, *months]);
            let call = tree.call("LAST_DAY", vec![shifted]);
            m.replace(tree, call)
        }
        ("GROUPING", _) => m.unsupported(tree, id, "GROUPING function is not supported"),
        ("DATEADD", [part, count, date]) => date_add(m, tree, id, *part, *count, *date),
        ("DATEDIFF", [part, start, end]) => date_diff(m, tree, id, *part, *start, *end),
        _ => true,
    }
}

fn builtin(m: &mut Modifier, tree: &mut Tree, value: BuiltinValue) -> bool {
    let node = tree.add(NodeData::Builtin { value });
    m.replace(tree, node)
}

fn date_add(m: &mut Modifier, tree: &mut Tree, id: NodeId, part: NodeId, count: NodeId, date: NodeId) -> bool {
    let written = part_argument(tree, part);
    let (function, factor) = match date_part_name(&written) {
        Some("year") => ("ADD_YEARS", 1),
        Some("quarter") => ("ADD_MONTHS", 3),
        Some("month") => ("ADD_MONTHS", 1),
        Some("dayofyear" | "day" | "weekday") => ("ADD_DAYS", 1),
        Some("week") => ("ADD_DAYS", 7),
        Some("hour") => ("ADD_SECONDS", 3600),
        Some("minute") => ("ADD_SECONDS", 60),
        Some("second") => ("ADD_SECONDS", 1),
        _ => return m.unsupported(tree, id, format!("DATEADD with date part {} is not supported", written)),
    };
    let (date, note) = date_operand(tree, date);
    let count = scaled(tree, factor, count);
    let call = tree.call(function, vec![date, count]);
    replace_noted(m, tree, call, note)
}

fn date_diff(m: &mut Modifier, tree: &mut Tree, id: NodeId, part: NodeId, start: NodeId, end: NodeId) -> bool {
    let written = part_argument(tree, part);
    let Some(canonical) = date_part_name(&written) else {
        return m.unsupported(tree, id, format!("DATEDIFF with date part {} is not supported", written));
    };
    let (start, start_note) = date_operand(tree, start);
    let (end, end_note) = date_operand(tree, end);
    let note = start_note.or(end_note);
    let node = match canonical {
        "year" => {
            let left = tree.call("YEAR", vec![end]);
            let right = tree.call("YEAR", vec![start]);
            tree.add(NodeData::Additive {
                left,
                op: AddOp::Minus,
                right,
            })
        }
        "dayofyear" | "day" | "weekday" => tree.call("DAYS_BETWEEN", vec![start, end]),
        "hour" | "minute" => {
            let seconds = tree.call("SECONDS_BETWEEN", vec![start, end]);
            let divisor = if canonical == "hour" { 3600 } else { 60 };
            let quotient = divided(tree, seconds, divisor);
            tree.call("FLOOR", vec![quotient])
        }
        "second" => tree.call("SECONDS_BETWEEN", vec![start, end]),
        "millisecond" | "microsecond" => {
            let ticks = tree.call("NANO100_BETWEEN", vec![start, end]);
            let divisor = if canonical == "millisecond" { 10_000 } else { 10 };
            divided(tree, ticks, divisor)
        }
        "nanosecond" => {
            let ticks = tree.call("NANO100_BETWEEN", vec![start, end]);
            let hundred = tree.int(100);
            tree.add(NodeData::Multiplicative {
                left: ticks,
                op: MulOp::Mul,
                right: hundred,
            })
        }
        _ => return m.unsupported(tree, id, format!("DATEDIFF with date part {} is not supported", written)),
    };
    replace_noted(m, tree, node, note)
}

/// Target function extracting `part`, `None` when there is none.
fn extractor(part: &str) -> Option<&'static str> {
    let function = match part {
        "year" => "YEAR",
        "quarter" => "QUARTER",
        "month" => "MONTH",
        "dayofyear" => "DAYOFYEAR",
        "day" => "DAYOFMONTH",
        "week" => "WEEK",
        "hour" => "HOUR",
        "minute" => "MINUTE",
        "second" => "SECOND",
        _ => return None,
    };
    Some(function)
}

fn date_part(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::DatePart { part, operand } = tree.data(id).clone() else {
        return true;
    };
    let canonical = date_part_name(&part);
    let (operand, note) = date_operand(tree, operand);
    let node = match canonical {
        Some("weekday") => {
            let weekday = tree.call("WEEKDAY", vec![operand]);
            let one = tree.int(1);
            let node = tree.add(NodeData::Additive {
                left: weekday,
                op: AddOp::Plus,
                right: one,
            });
            info(tree, node, "DATEPART weekday numbering depends on DATEFIRST; Monday is 1 here");
            node
        }
        Some(canonical) => match extractor(canonical) {
            Some(function) => tree.call(function, vec![operand]),
            None => return m.unsupported(tree, id, format!("DATEPART with date part {} is not supported", part)),
        },
        None => return m.unsupported(tree, id, format!("DATEPART with date part {} is not supported", part)),
    };
    replace_noted(m, tree, node, note)
}

fn date_name(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::DateName { part, operand } = tree.data(id).clone() else {
        return true;
    };
    let function = match date_part_name(&part) {
        Some("month") => Some("MONTHNAME"),
        Some("weekday") => Some("DAYNAME"),
        Some(canonical) => extractor(canonical),
        None => None,
    };
    let Some(function) = function else {
        return m.unsupported(tree, id, format!("DATENAME with date part {} is not supported", part));
    };
    let (operand, note) = date_operand(tree, operand);
    let call = tree.call(function, vec![operand]);
    replace_noted(m, tree, call, note)
}

/// Best guess whether an input expression yields a string.
pub(super) fn is_string(tree: &Tree, id: NodeId) -> bool {
    match tree.data(id) {
        NodeData::StringLiteral { .. } | NodeData::Concat { .. } => true,
        NodeData::Additive {
            left,
            op: AddOp::Plus,
            right,
        } => is_string(tree, *left) || is_string(tree, *right),
        NodeData::Parens { inner } => is_string(tree, *inner),
        NodeData::Cast { data_type, .. } | NodeData::Convert { data_type, .. } => is_string_type(tree, *data_type),
        NodeData::FunctionCall { .. } => matches!(
            tree.function_name(id).as_deref(),
            Some(
                "SUBSTRING" | "LEFT" | "RIGHT" | "UPPER" | "LOWER" | "LTRIM" | "RTRIM" | "REPLACE"
                    | "REPLICATE" | "STR" | "CHAR" | "NCHAR" | "SPACE" | "REVERSE" | "STUFF"
            )
        ),
        NodeData::DateName { .. } => true,
        _ => false,
    }
}

fn is_string_type(tree: &Tree, id: NodeId) -> bool {
    match tree.data(id) {
        NodeData::DataType { name, .. } => matches!(
            name.to_ascii_uppercase().as_str(),
            "CHAR" | "VARCHAR" | "NCHAR" | "NVARCHAR" | "TEXT" | "NTEXT"
        ),
        _ => false,
    }
}

fn additive(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::Additive {
        left,
        op: AddOp::Plus,
        right,
    } = *tree.data(id)
    else {
        return true;
    };
    if !is_string(tree, left) && !is_string(tree, right) {
        return true;
    }
    let concat = tree.add(NodeData::Concat { left, right });
    m.replace(tree, concat)
}

fn multiplicative(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::Multiplicative {
        left,
        op: MulOp::Mod,
        right,
    } = *tree.data(id)
    else {
        return true;
    };
    let call = tree.call("MOD", vec![left, right]);
    m.replace(tree, call)
}

fn bitwise(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::Bitwise { left, op, right } = *tree.data(id) else {
        return true;
    };
    let function = match op {
        BitOp::And => "BITAND",
        BitOp::Or => "BITOR",
        BitOp::Xor => "BITXOR",
    };
    let call = tree.call(function, vec![left, right]);
    m.replace(tree, call)
}

fn bitwise_not(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    m.unsupported(tree, id, "Bitwise NOT operator is not supported")
}

fn convert(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::Convert {
        data_type,
        operand,
        style,
    } = *tree.data(id)
    else {
        return true;
    };
    let cast = tree.add(NodeData::Cast { operand, data_type });
    if style.is_some() {
        info(tree, cast, "CONVERT style argument was removed");
    }
    m.replace(tree, cast)
}

/// Keep the translated operand and drop the collation.
fn collate(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    let NodeData::Collate { operand, collation } = tree.data(current).clone() else {
        return true;
    };
    tree.move_comments(current, operand);
    error(tree, operand, format!("COLLATE {} was removed", collation));
    m.splice(tree, operand);
    true
}

fn iif(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::Iif {
        condition,
        then_value,
        else_value,
    } = *tree.data(id)
    else {
        return true;
    };
    let when = tree.add(NodeData::CaseWhen {
        condition,
        result: then_value,
    });
    let case = tree.add(NodeData::Case {
        operand: None,
        whens: vec![when],
        else_value: Some(else_value),
    });
    m.replace(tree, case)
}

fn choose(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::Choose { index, options } = tree.data(id).clone() else {
        return true;
    };
    let whens = options
        .into_iter()
        .enumerate()
        .map(|(position, result)| {
            let condition = tree.int(position as i64 + 1);
            tree.add(NodeData::CaseWhen { condition, result })
        })
        .collect();
    let null = tree.null();
    let case = tree.add(NodeData::Case {
        operand: Some(index),
        whens,
        else_value: Some(null),
    });
    m.replace(tree, case)
}

fn aggregate(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::Aggregate { function, .. } = *tree.data(id) else {
        return true;
    };
    match function {
        AggregateFunc::Stdev => {
            let current = m.current();
            info(tree, current, "STDEV was converted to STDDEV");
            true
        }
        AggregateFunc::Stdevp | AggregateFunc::Varp | AggregateFunc::ChecksumAgg => {
            m.unsupported(tree, id, format!("{} function is not supported", function.name()))
        }
        _ => true,
    }
}

/// Rewrites the cloned type in place.
fn data_type(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::DataType { name, arguments } = tree.data(id).clone() else {
        return true;
    };
    let max = arguments.first().is_some_and(|arg| arg.eq_ignore_ascii_case("max"));
    let upper = name.to_ascii_uppercase();
    let mapped: Option<(&str, &[&str])> = match upper.as_str() {
        "DATETIME" | "SMALLDATETIME" | "DATETIME2" => Some(("TIMESTAMP", NO_ARGUMENTS)),
        "DATETIMEOFFSET" => {
            let current = m.current();
            info(tree, current, "DATETIMEOFFSET was converted to TIMESTAMP without time zone");
            Some(("TIMESTAMP", NO_ARGUMENTS))
        }
        "BIT" => Some(("TINYINT", NO_ARGUMENTS)),
        "MONEY" => Some(("DECIMAL", MONEY)),
        "SMALLMONEY" => Some(("DECIMAL", SMALLMONEY)),
        "UNIQUEIDENTIFIER" => Some(("VARCHAR", GUID)),
        "TEXT" => Some(("CLOB", NO_ARGUMENTS)),
        "NTEXT" => Some(("NCLOB", NO_ARGUMENTS)),
        "IMAGE" => Some(("BLOB", NO_ARGUMENTS)),
        "VARCHAR" if max => Some(("CLOB", NO_ARGUMENTS)),
        "NVARCHAR" if max => Some(("NCLOB", NO_ARGUMENTS)),
        "VARBINARY" if max => Some(("BLOB", NO_ARGUMENTS)),
        "SQL_VARIANT" | "XML" | "HIERARCHYID" | "GEOGRAPHY" | "GEOMETRY" => {
            let current = m.current();
            error(tree, current, format!("Data type {} is not supported", upper));
            None
        }
        _ => None,
    };
    if let Some((target, target_arguments)) = mapped {
        let current = m.current();
        if let NodeData::DataType { name, arguments } = tree.data_mut(current) {
            *name = target.to_string();
            *arguments = target_arguments.iter().map(|arg| arg.to_string()).collect();
        }
    }
    true
}

/// `@@` globals: only `@@ROWCOUNT` has a counterpart.
fn global_variable(m: &mut Modifier, tree: &mut Tree, id: NodeId) -> bool {
    let NodeData::Variable { name, .. } = tree.data(id).clone() else {
        return true;
    };
    let Some(global) = name.strip_prefix("@@") else {
        return true;
    };
    if global.eq_ignore_ascii_case("ROWCOUNT") {
        let current = m.current();
        if let NodeData::Variable { name, argument } = tree.data_mut(current) {
            *name = "::ROWCOUNT".to_string();
            *argument = false;
        }
        return true;
    }
    m.unsupported(tree, id, format!("Global variable {} is not supported", name))
}

/// Sentinels left by the parser carry no note yet; give them one.
pub(super) fn unsupported_sentinel(m: &mut Modifier, tree: &mut Tree, _id: NodeId) -> bool {
    let current = m.current();
    if tree.node(current).notes.is_empty() {
        let description = match tree.data(current) {
            NodeData::UnsupportedExpression { description }
            | NodeData::UnsupportedStatement { description }
            | NodeData::UnsupportedClause { description } => description.clone(),
            _ => String::new(),
        };
        error(tree, current, format!("{} is not supported", description));
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CompareOp, NoteCategory};
    use crate::modifier::tests::{notes, rewrite};

    fn first_call(tree: &Tree, root: NodeId) -> Option<String> {
        tree.descendants(root)
            .into_iter()
            .find_map(|id| tree.function_name(id))
    }

    fn kinds(tree: &Tree, root: NodeId) -> Vec<NodeKind> {
        tree.descendants(root).into_iter().map(|id| tree.kind(id)).collect()
    }

    #[test]
    fn test_date_part_aliases() {
        assert_eq!(date_part_name("yyyy"), Some("year"));
        assert_eq!(date_part_name("'mi'"), Some("minute"));
        assert_eq!(date_part_name("DW"), Some("weekday"));
        assert_eq!(date_part_name("tzoffset"), None);
    }

    #[test]
    fn test_isnull_becomes_ifnull() {
        let (tree, root, _) = rewrite("select isnull(qty, 0) from T");
        assert_eq!(first_call(&tree, root).as_deref(), Some("IFNULL"));
        assert!(notes(&tree, root, NoteCategory::RewriteError).is_empty());
    }

    #[test]
    fn test_dateadd_month() {
        let (tree, root, _) = rewrite("select dateadd(month, 1, x) from T");
        let call = tree
            .descendants(root)
            .into_iter()
            .find(|id| tree.function_name(*id).as_deref() == Some("ADD_MONTHS"))
            .unwrap();
        let args = tree.function_arguments(call);
        assert_eq!(tree.object_name(args[0]), "x");
        assert_eq!(tree.kind(args[1]), NodeKind::IntegerLiteral);
        assert!(notes(&tree, root, NoteCategory::RewriteError).is_empty());
    }

    #[test]
    fn test_dateadd_unknown_part_is_sentinel() {
        let (tree, root, _) = rewrite("select dateadd(tzoffset, 1, x) from T");
        assert!(kinds(&tree, root).contains(&NodeKind::UnsupportedExpression));
        let errors = notes(&tree, root, NoteCategory::RewriteError);
        assert_eq!(errors, vec!["DATEADD with date part tzoffset is not supported".to_string()]);
    }

    #[test]
    fn test_dateadd_quarter_scales() {
        let (tree, root, _) = rewrite("select dateadd(qq, n + 1, '2020-01-01')");
        let found = kinds(&tree, root);
        assert!(found.contains(&NodeKind::DateLiteral));
        assert!(found.contains(&NodeKind::Multiplicative));
        assert!(found.contains(&NodeKind::Parens));
    }

    #[test]
    fn test_datediff_and_datepart() {
        let (tree, root, _) = rewrite("select datediff(day, a, b), datepart(dw, a), datename(month, a) from T");
        let names: Vec<_> = tree
            .descendants(root)
            .into_iter()
            .filter_map(|id| tree.function_name(id))
            .collect();
        assert!(names.contains(&"DAYS_BETWEEN".to_string()));
        assert!(names.contains(&"WEEKDAY".to_string()));
        assert!(names.contains(&"MONTHNAME".to_string()));
        assert_eq!(notes(&tree, root, NoteCategory::Rewrite).len(), 1);
    }

    #[test]
    fn test_string_plus_is_concat() {
        let (tree, root, _) = rewrite("select 'a' + name, 1 + 2 from T");
        let found = kinds(&tree, root);
        assert!(found.contains(&NodeKind::Concat));
        assert!(found.contains(&NodeKind::Additive));
    }

    #[test]
    fn test_operators() {
        let (tree, root, _) = rewrite("select a % 2, a & 1, ~a from T");
        let names: Vec<_> = tree
            .descendants(root)
            .into_iter()
            .filter_map(|id| tree.function_name(id))
            .collect();
        assert_eq!(names, vec!["MOD".to_string(), "BITAND".to_string()]);
        assert_eq!(notes(&tree, root, NoteCategory::RewriteError).len(), 1);
    }

    #[test]
    fn test_iif_and_choose_become_case() {
        let (tree, root, _) = rewrite("select iif(a > 1, 'x', 'y'), choose(b, 'p', 'q') from T");
        let found = kinds(&tree, root);
        assert_eq!(found.iter().filter(|k| **k == NodeKind::Case).count(), 2);
        assert!(!found.contains(&NodeKind::Iif));
        assert!(!found.contains(&NodeKind::Choose));
    }

    #[test]
    fn test_convert_and_collate() {
        let (tree, root, _) = rewrite("select convert(varchar(10), d, 112), name collate Latin1_General_CI_AS from T");
        let found = kinds(&tree, root);
        assert!(found.contains(&NodeKind::Cast));
        assert!(!found.contains(&NodeKind::Collate));
        assert_eq!(notes(&tree, root, NoteCategory::Rewrite), vec!["CONVERT style argument was removed".to_string()]);
        assert_eq!(notes(&tree, root, NoteCategory::RewriteError).len(), 1);
    }

    #[test]
    fn test_data_types() {
        let (tree, root, _) = rewrite("select cast(a as datetime), cast(b as nvarchar(max)), cast(c as money)");
        let types: Vec<_> = tree
            .descendants(root)
            .into_iter()
            .filter_map(|id| match tree.data(id) {
                NodeData::DataType { name, arguments } => Some((name.clone(), arguments.len())),
                _ => None,
            })
            .collect();
        assert_eq!(
            types,
            vec![
                ("TIMESTAMP".to_string(), 0),
                ("NCLOB".to_string(), 0),
                ("DECIMAL".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_function_table() {
        let cases = [
            ("select len(a)", "LENGTH"),
            ("select log(a)", "LN"),
            ("select log10(a)", "LOG"),
            ("select square(a)", "POWER"),
            ("select space(3)", "LPAD"),
            ("select charindex('a', b)", "LOCATE"),
            ("select eomonth(d, 1)", "LAST_DAY"),
            ("select getdate()", "NOW"),
        ];
        for (source, expected) in cases {
            let (tree, root, _) = rewrite(source);
            assert_eq!(first_call(&tree, root).as_deref(), Some(expected), "{}", source);
        }
    }

    #[test]
    fn test_builtins_and_globals() {
        let (tree, root, _) = rewrite("select getutcdate(), db_name(), @@rowcount, @@error");
        let found: Vec<_> = tree
            .descendants(root)
            .into_iter()
            .filter_map(|id| match tree.data(id) {
                NodeData::Builtin { value } => Some(format!("{:?}", value)),
                NodeData::Variable { name, argument: false } => Some(name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(found, vec!["CurrentUtcTimestamp", "CurrentSchema", "::ROWCOUNT"]);
        assert_eq!(notes(&tree, root, NoteCategory::RewriteError).len(), 1);
    }

    #[test]
    fn test_aggregates() {
        let (tree, root, _) = rewrite("select stdev(a), varp(b) from T");
        assert_eq!(notes(&tree, root, NoteCategory::Rewrite), vec!["STDEV was converted to STDDEV".to_string()]);
        assert_eq!(
            notes(&tree, root, NoteCategory::RewriteError),
            vec!["VARP function is not supported".to_string()]
        );
    }

    #[test]
    fn test_unused_comparison_is_left_alone() {
        let (tree, root, _) = rewrite("select a from T where a = 1");
        assert!(tree
            .descendants(root)
            .into_iter()
            .any(|id| matches!(tree.data(id), NodeData::Comparison { op: CompareOp::Eq, .. })));
    }
}
