//! SELECT-FROM-WHERE tree nodes

use crate::{BoxExpr, Expr, Identifier, NodeId, SetQuantifier, SourceLocation};
use serde::{Deserialize, Serialize};

/// A SELECT query
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    /// `ALL` or `DISTINCT`
    pub quantifier: SetQuantifier,
    /// What the query produces
    pub projection: Projection,
    /// FROM clause
    pub from: Option<FromSource>,
    /// LET bindings, in order
    pub let_clause: Vec<LetBinding>,
    /// WHERE clause
    pub where_clause: Option<BoxExpr>,
    /// GROUP BY clause
    pub group_by: Option<GroupBy>,
    /// HAVING clause
    pub having: Option<BoxExpr>,
    /// ORDER BY clause
    pub order_by: Vec<SortSpec>,
    /// LIMIT clause
    pub limit: Option<BoxExpr>,
    /// OFFSET clause
    pub offset: Option<BoxExpr>,
}

impl Select {
    /// Create a query with the given projection and no clauses
    pub fn new(projection: Projection) -> Self {
        Self {
            quantifier: SetQuantifier::All,
            projection,
            from: None,
            let_clause: Vec::new(),
            where_clause: None,
            group_by: None,
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// `SELECT *`
    pub fn star() -> Self {
        Self::new(Projection::Star)
    }

    /// `SELECT VALUE expr`
    pub fn value(expr: Expr) -> Self {
        Self::new(Projection::Value(Box::new(expr)))
    }

    /// `SELECT item, ...`
    pub fn items(items: Vec<ProjectItem>) -> Self {
        Self::new(Projection::List(items))
    }

    pub fn distinct(mut self) -> Self {
        self.quantifier = SetQuantifier::Distinct;
        self
    }

    pub fn from(mut self, from: FromSource) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_let(mut self, expr: Expr, alias: impl Into<Identifier>) -> Self {
        self.let_clause.push(LetBinding {
            expr,
            alias: alias.into(),
        });
        self
    }

    pub fn with_where(mut self, predicate: Expr) -> Self {
        self.where_clause = Some(Box::new(predicate));
        self
    }

    pub fn group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = Some(group_by);
        self
    }

    pub fn having(mut self, predicate: Expr) -> Self {
        self.having = Some(Box::new(predicate));
        self
    }

    pub fn order_by(mut self, spec: SortSpec) -> Self {
        self.order_by.push(spec);
        self
    }

    pub fn limit(mut self, limit: Expr) -> Self {
        self.limit = Some(Box::new(limit));
        self
    }

    pub fn offset(mut self, offset: Expr) -> Self {
        self.offset = Some(Box::new(offset));
        self
    }

    /// Check whether the query groups its input
    pub fn is_grouped(&self) -> bool {
        self.group_by.is_some()
    }
}

/// The SELECT clause
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `SELECT *`
    Star,
    /// `SELECT a, b AS c, x.*`
    List(Vec<ProjectItem>),
    /// `SELECT VALUE expr`
    Value(BoxExpr),
    /// `PIVOT value AT key`
    Pivot { value: BoxExpr, key: BoxExpr },
}

/// An item of a projection list
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectItem {
    /// `expr.*`
    All { expr: Expr },
    /// `expr [AS alias]`
    Expr {
        expr: Expr,
        alias: Option<Identifier>,
    },
}

impl ProjectItem {
    /// `expr` without an alias
    pub fn expr(expr: Expr) -> Self {
        Self::Expr { expr, alias: None }
    }

    /// `expr AS alias`
    pub fn aliased(expr: Expr, alias: impl Into<Identifier>) -> Self {
        Self::Expr {
            expr,
            alias: Some(alias.into()),
        }
    }

    /// `expr.*`
    pub fn all(expr: Expr) -> Self {
        Self::All { expr }
    }

    /// Get the item's expression
    pub fn expression(&self) -> &Expr {
        match self {
            Self::All { expr } | Self::Expr { expr, .. } => expr,
        }
    }

    /// Get the item's alias, if it has one
    pub fn alias(&self) -> Option<&Identifier> {
        match self {
            Self::Expr { alias, .. } => alias.as_ref(),
            Self::All { .. } => None,
        }
    }
}

/// A FROM clause source
#[derive(Debug, Clone, PartialEq)]
pub enum FromSource {
    /// `expr [AS a] [AT b] [BY c]`
    Scan(FromItem),
    /// `UNPIVOT expr [AS a] [AT b] [BY c]`
    Unpivot(FromItem),
    /// Join of two sources; a comma is an inner join without predicate
    Join(Box<Join>),
}

impl FromSource {
    pub fn scan(item: FromItem) -> Self {
        Self::Scan(item)
    }

    pub fn unpivot(item: FromItem) -> Self {
        Self::Unpivot(item)
    }

    pub fn join(kind: JoinKind, left: FromSource, right: FromSource, predicate: Option<Expr>) -> Self {
        Self::Join(Box::new(Join {
            kind,
            left,
            right,
            predicate,
        }))
    }

    /// `left, right`
    pub fn comma(left: FromSource, right: FromSource) -> Self {
        Self::join(JoinKind::Inner, left, right, None)
    }

    /// Leaf items in clause order
    pub fn items(&self) -> Vec<&FromItem> {
        let mut out = Vec::new();
        self.collect_items(&mut out);
        out
    }

    fn collect_items<'a>(&'a self, out: &mut Vec<&'a FromItem>) {
        match self {
            Self::Scan(item) | Self::Unpivot(item) => out.push(item),
            Self::Join(join) => {
                join.left.collect_items(out);
                join.right.collect_items(out);
            }
        }
    }
}

/// A single FROM clause item
#[derive(Debug, Clone, PartialEq)]
pub struct FromItem {
    /// Stable identity
    pub id: NodeId,
    /// The ranged-over expression
    pub expr: Expr,
    /// `AS` alias
    pub as_alias: Option<Identifier>,
    /// `AT` alias
    pub at_alias: Option<Identifier>,
    /// `BY` alias
    pub by_alias: Option<Identifier>,
}

impl FromItem {
    /// `expr` without aliases
    pub fn new(expr: Expr) -> Self {
        Self {
            id: NodeId::fresh(),
            expr,
            as_alias: None,
            at_alias: None,
            by_alias: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<Identifier>) -> Self {
        self.as_alias = Some(alias.into());
        self
    }

    pub fn at(mut self, alias: impl Into<Identifier>) -> Self {
        self.at_alias = Some(alias.into());
        self
    }

    pub fn by(mut self, alias: impl Into<Identifier>) -> Self {
        self.by_alias = Some(alias.into());
        self
    }

    pub fn location(&self) -> SourceLocation {
        self.expr.location
    }
}

/// Join kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

/// Join of two FROM sources
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub left: FromSource,
    pub right: FromSource,
    pub predicate: Option<Expr>,
}

/// `LET expr AS alias`
#[derive(Debug, Clone, PartialEq)]
pub struct LetBinding {
    pub expr: Expr,
    pub alias: Identifier,
}

/// Grouping strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GroupingStrategy {
    /// `GROUP BY`
    #[default]
    Full,
    /// `GROUP PARTIAL BY`
    Partial,
}

/// GROUP BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    pub strategy: GroupingStrategy,
    pub keys: Vec<GroupKey>,
    /// `GROUP AS` alias
    pub group_as: Option<Identifier>,
}

impl GroupBy {
    /// Full grouping by the given keys
    pub fn new(keys: Vec<GroupKey>) -> Self {
        Self {
            strategy: GroupingStrategy::Full,
            keys,
            group_as: None,
        }
    }

    pub fn partial(mut self) -> Self {
        self.strategy = GroupingStrategy::Partial;
        self
    }

    pub fn group_as(mut self, alias: impl Into<Identifier>) -> Self {
        self.group_as = Some(alias.into());
        self
    }
}

/// A GROUP BY key
#[derive(Debug, Clone, PartialEq)]
pub struct GroupKey {
    /// Stable identity, used to attach the key's unique name
    pub id: NodeId,
    pub expr: Expr,
    pub alias: Option<Identifier>,
}

impl GroupKey {
    pub fn new(expr: Expr) -> Self {
        Self {
            id: NodeId::fresh(),
            expr,
            alias: None,
        }
    }

    pub fn aliased(expr: Expr, alias: impl Into<Identifier>) -> Self {
        Self {
            id: NodeId::fresh(),
            expr,
            alias: Some(alias.into()),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderingSpec {
    Asc,
    Desc,
}

/// Placement of nulls in the sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullOrdering {
    First,
    Last,
}

/// An ORDER BY key
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub expr: Expr,
    pub order: Option<OrderingSpec>,
    pub nulls: Option<NullOrdering>,
}

impl SortSpec {
    pub fn new(expr: Expr) -> Self {
        Self {
            expr,
            order: None,
            nulls: None,
        }
    }

    pub fn desc(mut self) -> Self {
        self.order = Some(OrderingSpec::Desc);
        self
    }

    pub fn asc(mut self) -> Self {
        self.order = Some(OrderingSpec::Asc);
        self
    }

    pub fn nulls(mut self, nulls: NullOrdering) -> Self {
        self.nulls = Some(nulls);
        self
    }
}
