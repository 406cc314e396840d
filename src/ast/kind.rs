use serde::{Deserialize, Serialize};

/// Every construct the generator knows how to build. The set is closed; the
/// generator dispatches on it through static tables rather than discovering
/// constructs at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    IntLiteral,
    FloatLiteral,
    BoolLiteral,
    StrLiteral,
    UnitLiteral,
    NoneLiteral,
    Variable,
    ConstRef,
    CliArg,
    FieldAccess,
    ArrayIndex,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Gt,
    And,
    Or,
    Not,
    FunctionCall,
    MethodCall,
    FuncRef,
    TupleLiteral,
    ArrayLiteral,
    VecLiteral,
    StructLiteral,
    BoxNew,
    SomeValue,
    Declaration,
    Assignment,
    CallStatement,
    IfElse,
    ForLoop,
}

/// Variant families share one depth budget: nesting a `Sub` inside an `Add`
/// counts as two levels of arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Literal,
    Variable,
    Access,
    Arithmetic,
    Comparison,
    Logical,
    Call,
    Composite,
    Statement,
    Control,
}

impl NodeKind {
    pub const ALL: [NodeKind; 37] = [
        NodeKind::IntLiteral,
        NodeKind::FloatLiteral,
        NodeKind::BoolLiteral,
        NodeKind::StrLiteral,
        NodeKind::UnitLiteral,
        NodeKind::NoneLiteral,
        NodeKind::Variable,
        NodeKind::ConstRef,
        NodeKind::CliArg,
        NodeKind::FieldAccess,
        NodeKind::ArrayIndex,
        NodeKind::Add,
        NodeKind::Sub,
        NodeKind::Mul,
        NodeKind::Div,
        NodeKind::Rem,
        NodeKind::Eq,
        NodeKind::Ne,
        NodeKind::Lt,
        NodeKind::Gt,
        NodeKind::And,
        NodeKind::Or,
        NodeKind::Not,
        NodeKind::FunctionCall,
        NodeKind::MethodCall,
        NodeKind::FuncRef,
        NodeKind::TupleLiteral,
        NodeKind::ArrayLiteral,
        NodeKind::VecLiteral,
        NodeKind::StructLiteral,
        NodeKind::BoxNew,
        NodeKind::SomeValue,
        NodeKind::Declaration,
        NodeKind::Assignment,
        NodeKind::CallStatement,
        NodeKind::IfElse,
        NodeKind::ForLoop,
    ];

    pub fn family(&self) -> Family {
        match self {
            NodeKind::IntLiteral
            | NodeKind::FloatLiteral
            | NodeKind::BoolLiteral
            | NodeKind::StrLiteral
            | NodeKind::UnitLiteral
            | NodeKind::NoneLiteral => Family::Literal,
            NodeKind::Variable | NodeKind::ConstRef | NodeKind::CliArg => Family::Variable,
            NodeKind::FieldAccess | NodeKind::ArrayIndex => Family::Access,
            NodeKind::Add | NodeKind::Sub | NodeKind::Mul | NodeKind::Div | NodeKind::Rem => {
                Family::Arithmetic
            }
            NodeKind::Eq | NodeKind::Ne | NodeKind::Lt | NodeKind::Gt => Family::Comparison,
            NodeKind::And | NodeKind::Or | NodeKind::Not => Family::Logical,
            NodeKind::FunctionCall | NodeKind::MethodCall | NodeKind::FuncRef => Family::Call,
            NodeKind::TupleLiteral
            | NodeKind::ArrayLiteral
            | NodeKind::VecLiteral
            | NodeKind::StructLiteral
            | NodeKind::BoxNew
            | NodeKind::SomeValue => Family::Composite,
            NodeKind::Declaration | NodeKind::Assignment | NodeKind::CallStatement => {
                Family::Statement
            }
            NodeKind::IfElse | NodeKind::ForLoop => Family::Control,
        }
    }

    /// Whether building this construct opens at least one new hole.
    pub fn is_recursive(&self) -> bool {
        match self.family() {
            Family::Arithmetic
            | Family::Comparison
            | Family::Logical
            | Family::Composite
            | Family::Control => true,
            Family::Call => *self != NodeKind::FuncRef,
            Family::Literal | Family::Variable | Family::Access | Family::Statement => false,
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(self.family(), Family::Statement | Family::Control)
    }

    pub fn members(family: Family) -> impl Iterator<Item = NodeKind> {
        NodeKind::ALL
            .iter()
            .copied()
            .filter(move |k| k.family() == family)
    }
}

#[cfg(test)]
mod kind_tests {
    use super::{Family, NodeKind};

    #[test]
    fn test_families_partition_kinds() {
        let arith = NodeKind::members(Family::Arithmetic).collect::<Vec<_>>();
        assert_eq!(
            arith,
            vec![
                NodeKind::Add,
                NodeKind::Sub,
                NodeKind::Mul,
                NodeKind::Div,
                NodeKind::Rem
            ]
        );
        let total: usize = [
            Family::Literal,
            Family::Variable,
            Family::Access,
            Family::Arithmetic,
            Family::Comparison,
            Family::Logical,
            Family::Call,
            Family::Composite,
            Family::Statement,
            Family::Control,
        ]
        .iter()
        .map(|f| NodeKind::members(*f).count())
        .sum();
        assert_eq!(total, NodeKind::ALL.len());
    }

    #[test]
    fn test_terminals_are_not_recursive() {
        assert!(!NodeKind::IntLiteral.is_recursive());
        assert!(!NodeKind::Variable.is_recursive());
        assert!(!NodeKind::FuncRef.is_recursive());
        assert!(NodeKind::FunctionCall.is_recursive());
        assert!(NodeKind::ForLoop.is_recursive());
        assert!(NodeKind::ForLoop.is_statement());
        assert!(!NodeKind::Div.is_statement());
    }
}
