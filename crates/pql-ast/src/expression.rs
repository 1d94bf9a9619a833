//! Expression tree nodes
//!
//! Every expression carries a stable [`NodeId`] and the [`SourceLocation`] it
//! was parsed from. Nodes built by passes copy the location of the node they
//! derive from.

use crate::{
    BinaryOp, BoxExpr, Identifier, Literal, NodeId, ScopeQualifier, Select, SourceLocation,
    TypeName, UnaryOp,
};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// An expression node
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// Stable identity
    pub id: NodeId,
    /// Where the expression was written
    pub location: SourceLocation,
    /// What the expression is
    pub kind: ExprKind,
}

/// All expression forms
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Literal value
    Lit(Literal),
    /// Variable reference
    Id(VarRef),
    /// Positional parameter (`?`), numbered from 1
    Param(u32),
    /// Unary operation
    Unary(UnaryExpr),
    /// Binary operation
    Binary(BinaryExpr),
    /// `[NOT] LIKE`
    Like(LikeExpr),
    /// `[NOT] BETWEEN`
    Between(BetweenExpr),
    /// `[NOT] IN`
    In(InExpr),
    /// `IS [NOT] <type>`
    Is(IsTypeExpr),
    /// Path navigation (`a.b`, `a[i]`, `a[*]`, `a.*`)
    Path(PathExpr),
    /// Scalar function call
    Call(CallExpr),
    /// Aggregate function call
    CallAgg(AggregateCall),
    /// `CASE x WHEN ... END`
    SimpleCase(SimpleCaseExpr),
    /// `CASE WHEN ... END`
    SearchedCase(SearchedCaseExpr),
    /// `NULLIF(a, b)`
    NullIf(NullIfExpr),
    /// `COALESCE(a, ...)`
    Coalesce(Vec<Expr>),
    /// List, bag or sexp constructor
    Collection(CollectionExpr),
    /// Struct constructor
    Struct(Vec<StructEntry>),
    /// `CAST`, `CAN_CAST` and `CAN_LOSSLESS_CAST`
    Cast(CastExpr),
    /// Nested SELECT
    Select(Box<Select>),
    /// Reference to a GROUP BY key by its unique name
    ///
    /// Only produced by normalization.
    GroupKeyRef(GroupKeyRef),
}

/// Variable reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRef {
    pub name: Identifier,
    pub qualifier: ScopeQualifier,
}

/// Unary operation
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: BoxExpr,
}

/// Binary operation
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub lhs: BoxExpr,
    pub rhs: BoxExpr,
}

/// `value [NOT] LIKE pattern [ESCAPE escape]`
#[derive(Debug, Clone, PartialEq)]
pub struct LikeExpr {
    pub value: BoxExpr,
    pub pattern: BoxExpr,
    pub escape: Option<BoxExpr>,
    pub negated: bool,
}

/// `value [NOT] BETWEEN from AND to`
#[derive(Debug, Clone, PartialEq)]
pub struct BetweenExpr {
    pub value: BoxExpr,
    pub from: BoxExpr,
    pub to: BoxExpr,
    pub negated: bool,
}

/// `lhs [NOT] IN rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct InExpr {
    pub lhs: BoxExpr,
    pub rhs: BoxExpr,
    pub negated: bool,
}

/// `value IS [NOT] type`
#[derive(Debug, Clone, PartialEq)]
pub struct IsTypeExpr {
    pub value: BoxExpr,
    pub type_name: TypeName,
    pub negated: bool,
}

/// Path navigation
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    pub root: BoxExpr,
    pub steps: SmallVec<[PathStep; 2]>,
}

/// A single path step
#[derive(Debug, Clone, PartialEq)]
pub enum PathStep {
    /// `.field` or `."Field"`
    Field(Identifier),
    /// `[expr]`
    Index(BoxExpr),
    /// `[*]`
    Wildcard,
    /// `.*`
    Unpivot,
}

/// Scalar function call
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub name: String,
    pub args: Vec<Expr>,
}

/// `ALL` or `DISTINCT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SetQuantifier {
    #[default]
    All,
    Distinct,
}

/// Aggregate function call
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateCall {
    pub name: String,
    pub quantifier: SetQuantifier,
    /// `None` for `COUNT(*)`
    pub arg: Option<BoxExpr>,
}

/// A `WHEN ... THEN ...` branch
#[derive(Debug, Clone, PartialEq)]
pub struct CaseBranch {
    pub when: Expr,
    pub then: Expr,
}

/// `CASE operand WHEN value THEN result ... [ELSE default] END`
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleCaseExpr {
    pub operand: BoxExpr,
    pub branches: Vec<CaseBranch>,
    pub else_expr: Option<BoxExpr>,
}

/// `CASE WHEN predicate THEN result ... [ELSE default] END`
#[derive(Debug, Clone, PartialEq)]
pub struct SearchedCaseExpr {
    pub branches: Vec<CaseBranch>,
    pub else_expr: Option<BoxExpr>,
}

/// `NULLIF(lhs, rhs)`
#[derive(Debug, Clone, PartialEq)]
pub struct NullIfExpr {
    pub lhs: BoxExpr,
    pub rhs: BoxExpr,
}

/// Kind of ordered or unordered collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    List,
    Bag,
    Sexp,
}

impl CollectionKind {
    /// Lowercase name of the collection kind
    pub const fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Bag => "bag",
            Self::Sexp => "sexp",
        }
    }
}

/// List, bag or sexp constructor
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionExpr {
    pub kind: CollectionKind,
    pub elements: Vec<Expr>,
}

/// A `key: value` pair of a struct constructor
#[derive(Debug, Clone, PartialEq)]
pub struct StructEntry {
    pub key: Expr,
    pub value: Expr,
}

/// Kind of cast expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastKind {
    Cast,
    CanCast,
    CanLosslessCast,
}

/// `CAST(value AS type)` and its predicates
#[derive(Debug, Clone, PartialEq)]
pub struct CastExpr {
    pub kind: CastKind,
    pub value: BoxExpr,
    pub as_type: TypeName,
}

/// Reference to a GROUP BY key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupKeyRef {
    /// The key's unique name
    pub unique_name: String,
    /// The identifier as written by the user
    pub surface: Identifier,
}

impl Expr {
    /// Create an expression with a fresh identity and the default location
    pub fn new(kind: ExprKind) -> Self {
        Self {
            id: NodeId::fresh(),
            location: SourceLocation::default(),
            kind,
        }
    }

    /// Create an expression with a fresh identity at the given location
    pub fn at(kind: ExprKind, location: SourceLocation) -> Self {
        Self {
            id: NodeId::fresh(),
            location,
            kind,
        }
    }

    /// Set the location of this expression
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    /// Create a literal expression
    pub fn lit(lit: Literal) -> Self {
        Self::new(ExprKind::Lit(lit))
    }

    /// Create a `NULL` literal
    pub fn null() -> Self {
        Self::lit(Literal::Null)
    }

    /// Create a `MISSING` literal
    pub fn missing() -> Self {
        Self::lit(Literal::Missing)
    }

    /// Create a boolean literal
    pub fn boolean(value: bool) -> Self {
        Self::lit(Literal::Boolean(value))
    }

    /// Create an integer literal
    pub fn int(value: i128) -> Self {
        Self::lit(Literal::Integer(value))
    }

    /// Create a string literal
    pub fn string(value: impl Into<String>) -> Self {
        Self::lit(Literal::String(value.into()))
    }

    /// Create an unqualified variable reference
    pub fn id(name: impl Into<Identifier>) -> Self {
        Self::new(ExprKind::Id(VarRef {
            name: name.into(),
            qualifier: ScopeQualifier::Unqualified,
        }))
    }

    /// Create a quoted (case-sensitive) variable reference
    pub fn quoted_id(name: impl Into<String>) -> Self {
        Self::id(Identifier::quoted(name))
    }

    /// Create a `@name` variable reference
    pub fn local_id(name: impl Into<Identifier>) -> Self {
        Self::new(ExprKind::Id(VarRef {
            name: name.into(),
            qualifier: ScopeQualifier::LocalsFirst,
        }))
    }

    /// Create a positional parameter
    pub fn param(index: u32) -> Self {
        Self::new(ExprKind::Param(index))
    }

    /// Create a unary operation
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::new(ExprKind::Unary(UnaryExpr {
            op,
            operand: Box::new(operand),
        }))
    }

    /// Create a binary operation
    pub fn binary(lhs: Expr, op: BinaryOp, rhs: Expr) -> Self {
        Self::new(ExprKind::Binary(BinaryExpr {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }))
    }

    /// Create a path expression
    pub fn path(root: Expr, steps: impl IntoIterator<Item = PathStep>) -> Self {
        Self::new(ExprKind::Path(PathExpr {
            root: Box::new(root),
            steps: steps.into_iter().collect(),
        }))
    }

    /// Create a `root.field` path
    pub fn dot(root: Expr, field: impl Into<Identifier>) -> Self {
        Self::path(root, [PathStep::Field(field.into())])
    }

    /// Create a `root[index]` path
    pub fn index(root: Expr, index: Expr) -> Self {
        Self::path(root, [PathStep::Index(Box::new(index))])
    }

    /// Create a scalar function call
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call(CallExpr {
            name: name.into(),
            args,
        }))
    }

    /// Create an aggregate call; `arg` is `None` for `COUNT(*)`
    pub fn agg(name: impl Into<String>, quantifier: SetQuantifier, arg: Option<Expr>) -> Self {
        Self::new(ExprKind::CallAgg(AggregateCall {
            name: name.into(),
            quantifier,
            arg: arg.map(Box::new),
        }))
    }

    /// Create a searched CASE expression
    pub fn searched_case(branches: Vec<(Expr, Expr)>, else_expr: Option<Expr>) -> Self {
        Self::new(ExprKind::SearchedCase(SearchedCaseExpr {
            branches: branches
                .into_iter()
                .map(|(when, then)| CaseBranch { when, then })
                .collect(),
            else_expr: else_expr.map(Box::new),
        }))
    }

    /// Create a simple CASE expression
    pub fn simple_case(
        operand: Expr,
        branches: Vec<(Expr, Expr)>,
        else_expr: Option<Expr>,
    ) -> Self {
        Self::new(ExprKind::SimpleCase(SimpleCaseExpr {
            operand: Box::new(operand),
            branches: branches
                .into_iter()
                .map(|(when, then)| CaseBranch { when, then })
                .collect(),
            else_expr: else_expr.map(Box::new),
        }))
    }

    /// Create a collection constructor
    pub fn collection(kind: CollectionKind, elements: Vec<Expr>) -> Self {
        Self::new(ExprKind::Collection(CollectionExpr { kind, elements }))
    }

    /// Create a list constructor
    pub fn list(elements: Vec<Expr>) -> Self {
        Self::collection(CollectionKind::List, elements)
    }

    /// Create a bag constructor
    pub fn bag(elements: Vec<Expr>) -> Self {
        Self::collection(CollectionKind::Bag, elements)
    }

    /// Create a struct constructor
    pub fn structure(entries: Vec<(Expr, Expr)>) -> Self {
        Self::new(ExprKind::Struct(
            entries
                .into_iter()
                .map(|(key, value)| StructEntry { key, value })
                .collect(),
        ))
    }

    /// Create a cast expression
    pub fn cast(kind: CastKind, value: Expr, as_type: TypeName) -> Self {
        Self::new(ExprKind::Cast(CastExpr {
            kind,
            value: Box::new(value),
            as_type,
        }))
    }

    /// Create a nested SELECT
    pub fn select(select: Select) -> Self {
        Self::new(ExprKind::Select(Box::new(select)))
    }

    /// Create a GROUP BY key reference
    pub fn group_key_ref(unique_name: impl Into<String>, surface: Identifier) -> Self {
        Self::new(ExprKind::GroupKeyRef(GroupKeyRef {
            unique_name: unique_name.into(),
            surface,
        }))
    }

    /// Get the variable reference if this is one
    pub fn as_var(&self) -> Option<&VarRef> {
        match &self.kind {
            ExprKind::Id(var) => Some(var),
            _ => None,
        }
    }

    /// Get the nested SELECT if this is one
    pub fn as_select(&self) -> Option<&Select> {
        match &self.kind {
            ExprKind::Select(select) => Some(select),
            _ => None,
        }
    }

    /// Get the literal if this is one
    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            ExprKind::Lit(lit) => Some(lit),
            _ => None,
        }
    }

    /// Derive a column name from the shape of the expression
    ///
    /// A variable gives its own name, a path gives its final field (a string
    /// index gives a case-sensitive name), and a group key reference gives the
    /// identifier it was written as. Other expressions have no natural name.
    pub fn derived_alias(&self) -> Option<Identifier> {
        match &self.kind {
            ExprKind::Id(var) => Some(var.name.clone()),
            ExprKind::GroupKeyRef(key) => Some(key.surface.clone()),
            ExprKind::Path(path) => match path.steps.last()? {
                PathStep::Field(field) => Some(field.clone()),
                PathStep::Index(index) => match index.as_literal()? {
                    Literal::String(s) => Some(Identifier::quoted(s.clone())),
                    _ => None,
                },
                PathStep::Wildcard | PathStep::Unpivot => None,
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Expr::id("foo"), Some(Identifier::new("foo")))]
    #[case(Expr::quoted_id("Foo"), Some(Identifier::quoted("Foo")))]
    #[case(Expr::dot(Expr::id("a"), "b"), Some(Identifier::new("b")))]
    #[case(Expr::index(Expr::id("a"), Expr::string("B")), Some(Identifier::quoted("B")))]
    #[case(Expr::index(Expr::id("a"), Expr::int(1)), None)]
    #[case(Expr::path(Expr::id("a"), [PathStep::Wildcard]), None)]
    #[case(Expr::int(1), None)]
    #[case(Expr::list(vec![]), None)]
    fn test_derived_alias(#[case] expr: Expr, #[case] expected: Option<Identifier>) {
        assert_eq!(expr.derived_alias(), expected);
    }

    #[test]
    fn test_group_key_ref_alias_is_surface() {
        let expr = Expr::group_key_ref("$__partiql__group_by_0_item_0", Identifier::new("k"));
        assert_eq!(expr.derived_alias(), Some(Identifier::new("k")));
    }

    #[test]
    fn test_constructors_allocate_fresh_ids() {
        let a = Expr::int(1);
        let b = Expr::int(1);
        assert_ne!(a.id, b.id);
        assert_eq!(a.kind, b.kind);
    }
}
