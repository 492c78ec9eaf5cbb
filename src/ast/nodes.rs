//! Node payloads.
//!
//! Every concrete construct is one `NodeData` variant. Child slots are
//! `NodeId`, `Option<NodeId>` or `Vec<NodeId>`; everything else is an
//! attribute. The `node_kinds!` table at the bottom is the single place that
//! says which fields are child slots, so enumeration and re-attachment are
//! generated from the same list.

use super::{NodeId, Slot};

/// Additive operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOp {
    Plus,
    Minus,
}

/// Multiplicative operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MulOp {
    Mul,
    Div,
    Mod,
}

/// Bitwise binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOp {
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    NotLt,
    NotGt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Union,
    UnionAll,
    Except,
    Intersect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
    CrossApply,
    OuterApply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Compound assignment used by `SET @v += 1` and `UPDATE ... SET c -= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    Count,
    CountBig,
    Sum,
    Avg,
    Min,
    Max,
    Stdev,
    Stdevp,
    Var,
    Varp,
    ChecksumAgg,
}

impl AggregateFunc {
    pub fn from_name(name: &str) -> Option<Self> {
        let func = match name.to_ascii_uppercase().as_str() {
            "COUNT" => Self::Count,
            "COUNT_BIG" => Self::CountBig,
            "SUM" => Self::Sum,
            "AVG" => Self::Avg,
            "MIN" => Self::Min,
            "MAX" => Self::Max,
            "STDEV" => Self::Stdev,
            "STDEVP" => Self::Stdevp,
            "VAR" => Self::Var,
            "VARP" => Self::Varp,
            "CHECKSUM_AGG" => Self::ChecksumAgg,
            _ => return None,
        };
        Some(func)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::CountBig => "COUNT_BIG",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Stdev => "STDEV",
            Self::Stdevp => "STDEVP",
            Self::Var => "VAR",
            Self::Varp => "VARP",
            Self::ChecksumAgg => "CHECKSUM_AGG",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingFunc {
    Rank,
    DenseRank,
    RowNumber,
}

/// Parameterless functions written without parentheses in HANA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinValue {
    CurrentUser,
    CurrentSchema,
    CurrentTimestamp,
    CurrentUtcTimestamp,
    CurrentDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcedureOption {
    Encryption,
    Recompile,
    ExecuteAs(String),
    SchemaBinding,
    NativeCompilation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlterIndexAction {
    Rebuild,
    Disable,
    Reorganize,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTiming {
    After,
    InsteadOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionAction {
    Begin,
    Commit,
    Rollback,
    Save,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorAction {
    Open,
    Close,
    Deallocate,
}

/// One syntactic construct.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    // --- statements ---
    Block {
        statements: Vec<NodeId>,
    },
    SelectStatement {
        with_clause: Option<NodeId>,
        query: NodeId,
        order_by: Vec<NodeId>,
        option: Option<NodeId>,
    },
    InsertStatement {
        with_clause: Option<NodeId>,
        top: Option<NodeId>,
        target: NodeId,
        columns: Vec<NodeId>,
        output: Option<NodeId>,
        source: NodeId,
    },
    UpdateStatement {
        with_clause: Option<NodeId>,
        top: Option<NodeId>,
        target: NodeId,
        assignments: Vec<NodeId>,
        output: Option<NodeId>,
        from: Vec<NodeId>,
        where_clause: Option<NodeId>,
        option: Option<NodeId>,
    },
    DeleteStatement {
        with_clause: Option<NodeId>,
        top: Option<NodeId>,
        target: NodeId,
        output: Option<NodeId>,
        from: Vec<NodeId>,
        where_clause: Option<NodeId>,
        option: Option<NodeId>,
    },
    CreateTable {
        name: NodeId,
        definitions: Vec<NodeId>,
        query: Option<NodeId>,
        file_group: Option<String>,
    },
    AlterTable {
        table: NodeId,
        action: NodeId,
    },
    DropTable {
        tables: Vec<NodeId>,
    },
    CreateIndex {
        unique: bool,
        clustered: Option<bool>,
        name: NodeId,
        table: NodeId,
        columns: Vec<NodeId>,
        include: Vec<NodeId>,
        filter: Option<NodeId>,
        has_options: bool,
        file_group: Option<String>,
    },
    AlterIndex {
        index: Option<NodeId>,
        table: Option<NodeId>,
        action: AlterIndexAction,
        has_options: bool,
    },
    DropIndex {
        items: Vec<NodeId>,
    },
    CreateView {
        name: NodeId,
        columns: Vec<NodeId>,
        query: NodeId,
        check_option: bool,
        with_attributes: bool,
    },
    AlterView {
        name: NodeId,
        columns: Vec<NodeId>,
        query: NodeId,
        check_option: bool,
        with_attributes: bool,
    },
    DropView {
        views: Vec<NodeId>,
    },
    CreateProcedure {
        name: NodeId,
        parameters: Vec<NodeId>,
        options: Vec<ProcedureOption>,
        for_replication: bool,
        declarations: Vec<NodeId>,
        body: NodeId,
    },
    AlterProcedure {
        name: NodeId,
        parameters: Vec<NodeId>,
        options: Vec<ProcedureOption>,
        for_replication: bool,
        body: NodeId,
    },
    DropProcedure {
        procedures: Vec<NodeId>,
    },
    /// `returns` is `None` for inline table-valued functions.
    CreateFunction {
        name: NodeId,
        parameters: Vec<NodeId>,
        returns: Option<NodeId>,
        options: Vec<ProcedureOption>,
        body: NodeId,
    },
    CreateTrigger {
        name: NodeId,
        table: NodeId,
        timing: TriggerTiming,
        events: Vec<TriggerEvent>,
        body: NodeId,
    },
    DropTrigger {
        triggers: Vec<NodeId>,
    },
    CreateType {
        name: NodeId,
        data_type: NodeId,
    },
    CreateTableType {
        name: NodeId,
        definitions: Vec<NodeId>,
    },
    DropType {
        name: NodeId,
    },
    DeclareStatement {
        declarations: Vec<NodeId>,
    },
    SetVariable {
        variable: NodeId,
        op: AssignOp,
        value: NodeId,
    },
    SetOption {
        option: String,
        value: String,
    },
    IdentityInsert {
        table: NodeId,
        on: bool,
    },
    IfStatement {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    WhileStatement {
        condition: NodeId,
        body: NodeId,
    },
    BreakStatement,
    ContinueStatement,
    ReturnStatement {
        value: Option<NodeId>,
    },
    ExecStatement {
        return_variable: Option<NodeId>,
        procedure: NodeId,
        arguments: Vec<NodeId>,
        options: Vec<NodeId>,
    },
    ExecString {
        parts: Vec<NodeId>,
    },
    UseStatement {
        database: NodeId,
    },
    SetSchema {
        schema: NodeId,
    },
    GoStatement,
    TransactionStatement {
        action: TransactionAction,
        name: Option<String>,
    },
    TryStatement {
        body: NodeId,
        catch_body: NodeId,
    },
    ThrowStatement {
        arguments: Vec<NodeId>,
    },
    GotoStatement {
        label: String,
    },
    LabelStatement {
        label: String,
    },
    WaitForStatement {
        delay: bool,
        value: NodeId,
    },
    CursorStatement {
        action: CursorAction,
        cursor: NodeId,
    },
    FetchStatement {
        direction: Option<String>,
        cursor: NodeId,
        into: Vec<NodeId>,
    },
    UpdateStatistics {
        table: NodeId,
    },
    TruncateTable {
        table: NodeId,
    },
    UnsupportedStatement {
        description: String,
    },

    // --- declarations ---
    ScalarDeclaration {
        variable: NodeId,
        data_type: NodeId,
        value: Option<NodeId>,
    },
    TableDeclaration {
        variable: NodeId,
        definitions: Vec<NodeId>,
    },
    CursorDeclaration {
        name: NodeId,
        query: NodeId,
        for_update: bool,
    },

    // --- names ---
    Identifier {
        name: String,
        quoted: bool,
    },
    /// Multi-part name such as `db.dbo.table`; parts are `Identifier` nodes.
    DbObject {
        parts: Vec<NodeId>,
    },
    CursorName {
        name: String,
        variable: bool,
    },

    // --- expressions ---
    ColumnRef {
        object: NodeId,
    },
    Variable {
        name: String,
        argument: bool,
    },
    IntegerLiteral {
        text: String,
    },
    DecimalLiteral {
        text: String,
    },
    StringLiteral {
        value: String,
        unicode: bool,
    },
    NullLiteral,
    DateLiteral {
        text: String,
    },
    Additive {
        left: NodeId,
        op: AddOp,
        right: NodeId,
    },
    Multiplicative {
        left: NodeId,
        op: MulOp,
        right: NodeId,
    },
    Bitwise {
        left: NodeId,
        op: BitOp,
        right: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    BitwiseNot {
        operand: NodeId,
    },
    Concat {
        left: NodeId,
        right: NodeId,
    },
    Comparison {
        left: NodeId,
        op: CompareOp,
        right: NodeId,
    },
    Logical {
        left: NodeId,
        op: LogicOp,
        right: NodeId,
    },
    Not {
        operand: NodeId,
    },
    IsNull {
        operand: NodeId,
        negated: bool,
    },
    Between {
        operand: NodeId,
        low: NodeId,
        high: NodeId,
        negated: bool,
    },
    Like {
        operand: NodeId,
        pattern: NodeId,
        escape: Option<NodeId>,
        negated: bool,
    },
    InList {
        operand: NodeId,
        items: Vec<NodeId>,
        negated: bool,
    },
    InSubquery {
        operand: NodeId,
        query: NodeId,
        negated: bool,
    },
    Exists {
        query: NodeId,
    },
    Parens {
        inner: NodeId,
    },
    Subquery {
        query: NodeId,
    },
    FunctionCall {
        name: NodeId,
        arguments: Vec<NodeId>,
    },
    Aggregate {
        function: AggregateFunc,
        distinct: bool,
        argument: Option<NodeId>,
        over: Option<NodeId>,
    },
    Ranking {
        function: RankingFunc,
        over: NodeId,
    },
    NTile {
        groups: NodeId,
        over: NodeId,
    },
    Cast {
        operand: NodeId,
        data_type: NodeId,
    },
    Convert {
        data_type: NodeId,
        operand: NodeId,
        style: Option<NodeId>,
    },
    Case {
        operand: Option<NodeId>,
        whens: Vec<NodeId>,
        else_value: Option<NodeId>,
    },
    CaseWhen {
        condition: NodeId,
        result: NodeId,
    },
    Iif {
        condition: NodeId,
        then_value: NodeId,
        else_value: NodeId,
    },
    Choose {
        index: NodeId,
        options: Vec<NodeId>,
    },
    DatePart {
        part: String,
        operand: NodeId,
    },
    DateName {
        part: String,
        operand: NodeId,
    },
    Collate {
        operand: NodeId,
        collation: String,
    },
    Builtin {
        value: BuiltinValue,
    },
    UnsupportedExpression {
        description: String,
    },

    // --- queries ---
    QuerySpecification {
        select: NodeId,
        into: Option<NodeId>,
        into_variables: Vec<NodeId>,
        from: Vec<NodeId>,
        where_clause: Option<NodeId>,
        group_by: Vec<NodeId>,
        having: Option<NodeId>,
    },
    SetOperation {
        left: NodeId,
        op: SetOp,
        right: NodeId,
    },
    ParenQuery {
        query: NodeId,
    },
    SelectClause {
        distinct: bool,
        top: Option<NodeId>,
        items: Vec<NodeId>,
    },
    Top {
        count: NodeId,
        percent: bool,
        with_ties: bool,
    },
    SelectItem {
        value: NodeId,
        alias: Option<NodeId>,
    },
    SelectStar {
        qualifier: Option<NodeId>,
    },
    SelectVariableItem {
        variable: NodeId,
        op: AssignOp,
        value: NodeId,
    },
    OrderedItem {
        value: NodeId,
        order: Option<SortOrder>,
    },
    Over {
        partition: Vec<NodeId>,
        order_by: Vec<NodeId>,
    },
    WithClause {
        tables: Vec<NodeId>,
    },
    CommonTable {
        name: NodeId,
        columns: Vec<NodeId>,
        query: NodeId,
    },
    OptionClause {
        hints: Vec<String>,
    },
    OutputClause {
        items: Vec<NodeId>,
        into: Option<NodeId>,
    },

    // --- table sources ---
    TableRef {
        object: NodeId,
        alias: Option<NodeId>,
        hints: Vec<String>,
        sample: Option<String>,
    },
    DerivedTable {
        query: NodeId,
        alias: NodeId,
        columns: Vec<NodeId>,
    },
    Join {
        left: NodeId,
        kind: JoinKind,
        right: NodeId,
        condition: Option<NodeId>,
    },
    ParenTable {
        source: NodeId,
    },
    TableFunction {
        call: NodeId,
        alias: Option<NodeId>,
    },
    VariableTable {
        variable: NodeId,
        alias: Option<NodeId>,
    },

    // --- DML pieces ---
    SetColumn {
        target: NodeId,
        op: AssignOp,
        value: NodeId,
    },
    ValuesList {
        rows: Vec<NodeId>,
    },
    ValuesRow {
        values: Vec<NodeId>,
    },
    ValuesQuery {
        query: NodeId,
    },
    DefaultValues,
    ValuesExec {
        exec: NodeId,
    },
    ExecArgument {
        name: Option<NodeId>,
        value: NodeId,
        output: bool,
    },
    ExecOption {
        recompile: bool,
    },

    // --- DDL pieces ---
    DataType {
        name: String,
        arguments: Vec<String>,
    },
    ColumnDefinition {
        name: NodeId,
        data_type: NodeId,
        collation: Option<String>,
        identity: Option<(String, String)>,
        nullable: Option<bool>,
        default_value: Option<NodeId>,
        sparse: bool,
        constraints: Vec<NodeId>,
    },
    ComputedColumn {
        name: NodeId,
        value: NodeId,
    },
    PrimaryKey {
        name: Option<NodeId>,
        clustered: Option<bool>,
        columns: Vec<NodeId>,
        has_options: bool,
        file_group: Option<String>,
    },
    UniqueKey {
        name: Option<NodeId>,
        clustered: Option<bool>,
        columns: Vec<NodeId>,
        has_options: bool,
        file_group: Option<String>,
    },
    ForeignKey {
        name: Option<NodeId>,
        columns: Vec<NodeId>,
        reference: NodeId,
        reference_columns: Vec<NodeId>,
        on_delete: Option<String>,
        on_update: Option<String>,
    },
    CheckConstraint {
        name: Option<NodeId>,
        condition: NodeId,
    },
    OrderedColumn {
        name: NodeId,
        order: Option<SortOrder>,
    },
    AddDefinitions {
        with_check: Option<bool>,
        definitions: Vec<NodeId>,
    },
    DropDefinitions {
        items: Vec<NodeId>,
    },
    DropColumn {
        name: NodeId,
    },
    DropConstraint {
        name: NodeId,
    },
    AlterColumn {
        name: NodeId,
        data_type: NodeId,
        collation: Option<String>,
        nullable: Option<bool>,
        sparse: bool,
    },
    TableOption {
        text: String,
    },
    DropIndexItem {
        index: NodeId,
        table: Option<NodeId>,
        has_options: bool,
    },
    Parameter {
        variable: NodeId,
        data_type: NodeId,
        default_value: Option<NodeId>,
        output: bool,
        readonly: bool,
    },
    UnsupportedClause {
        description: String,
    },
}

/// Mutable view of one child field, as handed out by [`NodeData::field_mut`].
pub enum FieldMut<'a> {
    One(&'a mut NodeId),
    Opt(&'a mut Option<NodeId>),
    Many(&'a mut Vec<NodeId>),
}

/// Implemented by the three shapes a child field can take.
pub(crate) trait ChildField {
    fn collect(&self, field: &'static str, out: &mut Vec<(NodeId, Slot)>);
    fn as_field_mut(&mut self) -> FieldMut<'_>;
    fn clear_list(&mut self) {}
}

impl ChildField for NodeId {
    fn collect(&self, field: &'static str, out: &mut Vec<(NodeId, Slot)>) {
        out.push((*self, Slot::field(field)));
    }

    fn as_field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::One(self)
    }
}

impl ChildField for Option<NodeId> {
    fn collect(&self, field: &'static str, out: &mut Vec<(NodeId, Slot)>) {
        if let Some(id) = self {
            out.push((*id, Slot::field(field)));
        }
    }

    fn as_field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Opt(self)
    }
}

impl ChildField for Vec<NodeId> {
    fn collect(&self, field: &'static str, out: &mut Vec<(NodeId, Slot)>) {
        for (index, id) in self.iter().enumerate() {
            out.push((*id, Slot::item(field, index)));
        }
    }

    fn as_field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Many(self)
    }

    fn clear_list(&mut self) {
        self.clear();
    }
}

/// Declares the kind hierarchy and the child fields of each variant.
///
/// Generates `NodeKind`, `NodeKind::parent`, `NodeData::kind`,
/// `NodeData::children`, `NodeData::field_mut` and `NodeData::clear_lists`.
macro_rules! node_kinds {
    (
        groups { $($group:ident => $gparent:ident),* $(,)? }
        kinds { $($variant:ident { $($field:ident),* } => $parent:ident),* $(,)? }
    ) => {
        /// Discriminant of a node, plus the abstract groups used for dispatch fallback.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeKind {
            Node,
            $($group,)*
            $($variant,)*
        }

        impl NodeKind {
            /// Immediate super-kind; `None` only for `Node`.
            pub fn parent(self) -> Option<NodeKind> {
                match self {
                    NodeKind::Node => None,
                    $(NodeKind::$group => Some(NodeKind::$gparent),)*
                    $(NodeKind::$variant => Some(NodeKind::$parent),)*
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    NodeKind::Node => "Node",
                    $(NodeKind::$group => stringify!($group),)*
                    $(NodeKind::$variant => stringify!($variant),)*
                }
            }
        }

        impl NodeData {
            pub fn kind(&self) -> NodeKind {
                match self {
                    $(NodeData::$variant { .. } => NodeKind::$variant,)*
                }
            }

            /// Ordered `(child, slot)` pairs in source order.
            pub fn children(&self) -> Vec<(NodeId, Slot)> {
                let mut out = Vec::new();
                match self {
                    $(NodeData::$variant { $($field,)* .. } => {
                        $(ChildField::collect($field, stringify!($field), &mut out);)*
                    })*
                }
                out
            }

            /// Typed access to the child field called `name`.
            pub fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>> {
                match self {
                    $(NodeData::$variant { $($field,)* .. } => {
                        $(if name == stringify!($field) {
                            return Some(ChildField::as_field_mut($field));
                        })*
                        None
                    })*
                }
            }

            /// Empties every list-typed child field.
            pub fn clear_lists(&mut self) {
                match self {
                    $(NodeData::$variant { $($field,)* .. } => {
                        $(ChildField::clear_list($field);)*
                    })*
                }
            }
        }
    };
}

node_kinds! {
    groups {
        Statement => Node,
        Declaration => Node,
        Expression => Node,
        Predicate => Expression,
        QueryExpression => Node,
        TableSource => Node,
        Clause => Node,
        ValuesSource => Clause,
        TableDefinition => Node,
        TableConstraint => TableDefinition,
        AlterTableAction => Node,
    }
    kinds {
        Block { statements } => Statement,
        SelectStatement { with_clause, query, order_by, option } => Statement,
        InsertStatement { with_clause, top, target, columns, output, source } => Statement,
        UpdateStatement { with_clause, top, target, assignments, output, from, where_clause, option } => Statement,
        DeleteStatement { with_clause, top, target, output, from, where_clause, option } => Statement,
        CreateTable { name, definitions, query } => Statement,
        AlterTable { table, action } => Statement,
        DropTable { tables } => Statement,
        CreateIndex { name, table, columns, include, filter } => Statement,
        AlterIndex { index, table } => Statement,
        DropIndex { items } => Statement,
        CreateView { name, columns, query } => Statement,
        AlterView { name, columns, query } => Statement,
        DropView { views } => Statement,
        CreateProcedure { name, parameters, declarations, body } => Statement,
        AlterProcedure { name, parameters, body } => Statement,
        DropProcedure { procedures } => Statement,
        CreateFunction { name, parameters, returns, body } => Statement,
        CreateTrigger { name, table, body } => Statement,
        DropTrigger { triggers } => Statement,
        CreateType { name, data_type } => Statement,
        CreateTableType { name, definitions } => Statement,
        DropType { name } => Statement,
        DeclareStatement { declarations } => Statement,
        SetVariable { variable, value } => Statement,
        SetOption {} => Statement,
        IdentityInsert { table } => Statement,
        IfStatement { condition, then_branch, else_branch } => Statement,
        WhileStatement { condition, body } => Statement,
        BreakStatement {} => Statement,
        ContinueStatement {} => Statement,
        ReturnStatement { value } => Statement,
        ExecStatement { return_variable, procedure, arguments, options } => Statement,
        ExecString { parts } => Statement,
        UseStatement { database } => Statement,
        SetSchema { schema } => Statement,
        GoStatement {} => Statement,
        TransactionStatement {} => Statement,
        TryStatement { body, catch_body } => Statement,
        ThrowStatement { arguments } => Statement,
        GotoStatement {} => Statement,
        LabelStatement {} => Statement,
        WaitForStatement { value } => Statement,
        CursorStatement { cursor } => Statement,
        FetchStatement { cursor, into } => Statement,
        UpdateStatistics { table } => Statement,
        TruncateTable { table } => Statement,
        UnsupportedStatement {} => Statement,

        ScalarDeclaration { variable, data_type, value } => Declaration,
        TableDeclaration { variable, definitions } => Declaration,
        CursorDeclaration { name, query } => Declaration,

        Identifier {} => Node,
        DbObject { parts } => Node,
        CursorName {} => Node,

        ColumnRef { object } => Expression,
        Variable {} => Expression,
        IntegerLiteral {} => Expression,
        DecimalLiteral {} => Expression,
        StringLiteral {} => Expression,
        NullLiteral {} => Expression,
        DateLiteral {} => Expression,
        Additive { left, right } => Expression,
        Multiplicative { left, right } => Expression,
        Bitwise { left, right } => Expression,
        Unary { operand } => Expression,
        BitwiseNot { operand } => Expression,
        Concat { left, right } => Expression,
        Comparison { left, right } => Predicate,
        Logical { left, right } => Predicate,
        Not { operand } => Predicate,
        IsNull { operand } => Predicate,
        Between { operand, low, high } => Predicate,
        Like { operand, pattern, escape } => Predicate,
        InList { operand, items } => Predicate,
        InSubquery { operand, query } => Predicate,
        Exists { query } => Predicate,
        Parens { inner } => Expression,
        Subquery { query } => Expression,
        FunctionCall { name, arguments } => Expression,
        Aggregate { argument, over } => Expression,
        Ranking { over } => Expression,
        NTile { groups, over } => Expression,
        Cast { operand, data_type } => Expression,
        Convert { data_type, operand, style } => Expression,
        Case { operand, whens, else_value } => Expression,
        CaseWhen { condition, result } => Node,
        Iif { condition, then_value, else_value } => Expression,
        Choose { index, options } => Expression,
        DatePart { operand } => Expression,
        DateName { operand } => Expression,
        Collate { operand } => Expression,
        Builtin {} => Expression,
        UnsupportedExpression {} => Expression,

        QuerySpecification { select, into, into_variables, from, where_clause, group_by, having } => QueryExpression,
        SetOperation { left, right } => QueryExpression,
        ParenQuery { query } => QueryExpression,
        SelectClause { top, items } => Clause,
        Top { count } => Clause,
        SelectItem { value, alias } => Node,
        SelectStar { qualifier } => Node,
        SelectVariableItem { variable, value } => Node,
        OrderedItem { value } => Node,
        Over { partition, order_by } => Clause,
        WithClause { tables } => Clause,
        CommonTable { name, columns, query } => Node,
        OptionClause {} => Clause,
        OutputClause { items, into } => Clause,

        TableRef { object, alias } => TableSource,
        DerivedTable { query, alias, columns } => TableSource,
        Join { left, right, condition } => TableSource,
        ParenTable { source } => TableSource,
        TableFunction { call, alias } => TableSource,
        VariableTable { variable, alias } => TableSource,

        SetColumn { target, value } => Node,
        ValuesList { rows } => ValuesSource,
        ValuesRow { values } => Node,
        ValuesQuery { query } => ValuesSource,
        DefaultValues {} => ValuesSource,
        ValuesExec { exec } => ValuesSource,
        ExecArgument { name, value } => Node,
        ExecOption {} => Clause,

        DataType {} => Node,
        ColumnDefinition { name, data_type, default_value, constraints } => TableDefinition,
        ComputedColumn { name, value } => TableDefinition,
        PrimaryKey { name, columns } => TableConstraint,
        UniqueKey { name, columns } => TableConstraint,
        ForeignKey { name, columns, reference, reference_columns } => TableConstraint,
        CheckConstraint { name, condition } => TableConstraint,
        OrderedColumn { name } => Node,
        AddDefinitions { definitions } => AlterTableAction,
        DropDefinitions { items } => AlterTableAction,
        DropColumn { name } => Node,
        DropConstraint { name } => Node,
        AlterColumn { name, data_type } => AlterTableAction,
        TableOption {} => AlterTableAction,
        DropIndexItem { index, table } => Node,
        Parameter { variable, data_type, default_value } => Node,
        UnsupportedClause {} => Clause,
    }
}

impl NodeKind {
    /// True when `self` is `group` or descends from it.
    pub fn is_a(self, group: NodeKind) -> bool {
        let mut kind = Some(self);
        while let Some(current) = kind {
            if current == group {
                return true;
            }
            kind = current.parent();
        }
        false
    }

    pub fn is_statement(self) -> bool {
        self.is_a(NodeKind::Statement)
    }

    /// Kinds that can hold a statement sequence for splits and hoisting.
    pub fn is_block(self) -> bool {
        matches!(self, NodeKind::Block | NodeKind::CreateProcedure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_chain() {
        assert_eq!(NodeKind::Comparison.parent(), Some(NodeKind::Predicate));
        assert!(NodeKind::Comparison.is_a(NodeKind::Expression));
        assert!(NodeKind::PrimaryKey.is_a(NodeKind::TableDefinition));
        assert!(!NodeKind::TableRef.is_statement());
        assert_eq!(NodeKind::Node.parent(), None);
    }

    #[test]
    fn test_children_order_and_slots() {
        let data = NodeData::Between {
            operand: NodeId(1),
            low: NodeId(2),
            high: NodeId(3),
            negated: false,
        };
        let ids: Vec<_> = data.children().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![NodeId(1), NodeId(2), NodeId(3)]);

        let data = NodeData::ValuesRow {
            values: vec![NodeId(4), NodeId(5)],
        };
        let slots: Vec<_> = data.children().into_iter().map(|(_, s)| s).collect();
        assert_eq!(slots[1], Slot::item("values", 1));
    }

    #[test]
    fn test_absent_option_is_skipped() {
        let data = NodeData::ReturnStatement { value: None };
        assert!(data.children().is_empty());
    }

    #[test]
    fn test_clear_lists_keeps_fields() {
        let mut data = NodeData::InList {
            operand: NodeId(1),
            items: vec![NodeId(2), NodeId(3)],
            negated: true,
        };
        data.clear_lists();
        assert_eq!(data.children().len(), 1);
        assert!(matches!(data.field_mut("operand"), Some(FieldMut::One(_))));
        assert!(data.field_mut("nothing").is_none());
    }
}
