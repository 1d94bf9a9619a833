//! Rendering trees back to query text

use crate::{
    CastKind, CollectionKind, DmlOp, Expr, ExprKind, FromItem, FromSource, GroupBy,
    GroupingStrategy, JoinKind, Literal, NullOrdering, OrderingSpec, PathStep, ProjectItem,
    Projection, ScopeQualifier, Select, SetQuantifier, SortSpec, Statement, TypeName, UnaryOp,
};
use std::fmt::{self, Display, Formatter};

fn comma_separated<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Operand that needs parentheses when nested inside an operator
fn is_compound(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Binary(_)
            | ExprKind::Like(_)
            | ExprKind::Between(_)
            | ExprKind::In(_)
            | ExprKind::Is(_)
            | ExprKind::Unary(_)
    )
}

struct Operand<'a>(&'a Expr);

impl Display for Operand<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if is_compound(self.0) {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Missing => f.write_str("MISSING"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Float(v) => write!(f, "{v:e}"),
            Self::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Symbol(s) => write!(f, "`{s}`"),
            Self::Timestamp(ts) => write!(f, "TIMESTAMP '{}'", ts.to_rfc3339()),
            Self::Blob(bytes) | Self::Clob(bytes) => {
                f.write_str(if matches!(self, Self::Blob(_)) { "BLOB '" } else { "CLOB '" })?;
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                f.write_str("'")
            }
        }
    }
}

impl Display for TypeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql_name())
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Lit(lit) => write!(f, "{lit}"),
            ExprKind::Id(var) => {
                if var.qualifier == ScopeQualifier::LocalsFirst {
                    f.write_str("@")?;
                }
                write!(f, "{}", var.name)
            }
            ExprKind::Param(_) => f.write_str("?"),
            ExprKind::Unary(u) => match u.op {
                UnaryOp::Not => write!(f, "NOT {}", Operand(&u.operand)),
                op => write!(f, "{}{}", op.symbol(), Operand(&u.operand)),
            },
            ExprKind::Binary(b) => write!(
                f,
                "{} {} {}",
                Operand(&b.lhs),
                b.op.symbol(),
                Operand(&b.rhs)
            ),
            ExprKind::Like(l) => {
                write!(f, "{} ", Operand(&l.value))?;
                if l.negated {
                    f.write_str("NOT ")?;
                }
                write!(f, "LIKE {}", Operand(&l.pattern))?;
                if let Some(escape) = &l.escape {
                    write!(f, " ESCAPE {}", Operand(escape))?;
                }
                Ok(())
            }
            ExprKind::Between(b) => write!(
                f,
                "{} {}BETWEEN {} AND {}",
                Operand(&b.value),
                if b.negated { "NOT " } else { "" },
                Operand(&b.from),
                Operand(&b.to)
            ),
            ExprKind::In(i) => write!(
                f,
                "{} {}IN {}",
                Operand(&i.lhs),
                if i.negated { "NOT " } else { "" },
                Operand(&i.rhs)
            ),
            ExprKind::Is(i) => write!(
                f,
                "{} IS {}{}",
                Operand(&i.value),
                if i.negated { "NOT " } else { "" },
                i.type_name
            ),
            ExprKind::Path(p) => {
                write!(f, "{}", Operand(&p.root))?;
                for step in &p.steps {
                    match step {
                        PathStep::Field(name) => write!(f, ".{name}")?,
                        PathStep::Index(index) => write!(f, "[{index}]")?,
                        PathStep::Wildcard => f.write_str("[*]")?,
                        PathStep::Unpivot => f.write_str(".*")?,
                    }
                }
                Ok(())
            }
            ExprKind::Call(c) => {
                write!(f, "{}(", c.name)?;
                comma_separated(f, &c.args)?;
                f.write_str(")")
            }
            ExprKind::CallAgg(a) => {
                write!(f, "{}(", a.name)?;
                match &a.arg {
                    None => f.write_str("*")?,
                    Some(arg) => {
                        if a.quantifier == SetQuantifier::Distinct {
                            f.write_str("DISTINCT ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                }
                f.write_str(")")
            }
            ExprKind::SimpleCase(c) => {
                write!(f, "CASE {}", c.operand)?;
                for b in &c.branches {
                    write!(f, " WHEN {} THEN {}", b.when, b.then)?;
                }
                if let Some(e) = &c.else_expr {
                    write!(f, " ELSE {e}")?;
                }
                f.write_str(" END")
            }
            ExprKind::SearchedCase(c) => {
                f.write_str("CASE")?;
                for b in &c.branches {
                    write!(f, " WHEN {} THEN {}", b.when, b.then)?;
                }
                if let Some(e) = &c.else_expr {
                    write!(f, " ELSE {e}")?;
                }
                f.write_str(" END")
            }
            ExprKind::NullIf(n) => write!(f, "NULLIF({}, {})", n.lhs, n.rhs),
            ExprKind::Coalesce(args) => {
                f.write_str("COALESCE(")?;
                comma_separated(f, args)?;
                f.write_str(")")
            }
            ExprKind::Collection(c) => {
                let (open, close) = match c.kind {
                    CollectionKind::List => ("[", "]"),
                    CollectionKind::Bag => ("<<", ">>"),
                    CollectionKind::Sexp => ("SEXP(", ")"),
                };
                f.write_str(open)?;
                comma_separated(f, &c.elements)?;
                f.write_str(close)
            }
            ExprKind::Struct(entries) => {
                f.write_str("{")?;
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", entry.key, entry.value)?;
                }
                f.write_str("}")
            }
            ExprKind::Cast(c) => {
                let name = match c.kind {
                    CastKind::Cast => "CAST",
                    CastKind::CanCast => "CAN_CAST",
                    CastKind::CanLosslessCast => "CAN_LOSSLESS_CAST",
                };
                write!(f, "{name}({} AS {})", c.value, c.as_type)
            }
            ExprKind::Select(select) => write!(f, "({select})"),
            ExprKind::GroupKeyRef(key) => write!(f, "\"{}\"", key.unique_name),
        }
    }
}

impl Display for ProjectItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::All { expr } => write!(f, "{}.*", Operand(expr)),
            Self::Expr { expr, alias } => {
                write!(f, "{expr}")?;
                if let Some(alias) = alias {
                    write!(f, " AS {alias}")?;
                }
                Ok(())
            }
        }
    }
}

impl Display for Projection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Star => f.write_str("*"),
            Self::List(items) => comma_separated(f, items),
            Self::Value(expr) => write!(f, "VALUE {expr}"),
            Self::Pivot { value, key } => write!(f, "PIVOT {value} AT {key}"),
        }
    }
}

impl Display for FromItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if let Some(alias) = &self.as_alias {
            write!(f, " AS {alias}")?;
        }
        if let Some(alias) = &self.at_alias {
            write!(f, " AT {alias}")?;
        }
        if let Some(alias) = &self.by_alias {
            write!(f, " BY {alias}")?;
        }
        Ok(())
    }
}

impl Display for FromSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan(item) => write!(f, "{item}"),
            Self::Unpivot(item) => write!(f, "UNPIVOT {item}"),
            Self::Join(join) => {
                write!(f, "{}", join.left)?;
                let right = &join.right;
                let nested = matches!(right, FromSource::Join(_));
                match (join.kind, &join.predicate) {
                    (JoinKind::Inner, None) => f.write_str(", ")?,
                    (kind, _) => {
                        let name = match kind {
                            JoinKind::Inner => "INNER",
                            JoinKind::Left => "LEFT",
                            JoinKind::Right => "RIGHT",
                            JoinKind::Full => "FULL",
                        };
                        write!(f, " {name} JOIN ")?;
                    }
                }
                if nested {
                    write!(f, "({right})")?;
                } else {
                    write!(f, "{right}")?;
                }
                if let Some(predicate) = &join.predicate {
                    write!(f, " ON {predicate}")?;
                }
                Ok(())
            }
        }
    }
}

impl Display for GroupBy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("GROUP ")?;
        if self.strategy == GroupingStrategy::Partial {
            f.write_str("PARTIAL ")?;
        }
        f.write_str("BY ")?;
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", key.expr)?;
            if let Some(alias) = &key.alias {
                write!(f, " AS {alias}")?;
            }
        }
        if let Some(alias) = &self.group_as {
            write!(f, " GROUP AS {alias}")?;
        }
        Ok(())
    }
}

impl Display for SortSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        match self.order {
            Some(OrderingSpec::Asc) => f.write_str(" ASC")?,
            Some(OrderingSpec::Desc) => f.write_str(" DESC")?,
            None => {}
        }
        match self.nulls {
            Some(NullOrdering::First) => f.write_str(" NULLS FIRST")?,
            Some(NullOrdering::Last) => f.write_str(" NULLS LAST")?,
            None => {}
        }
        Ok(())
    }
}

impl Display for Select {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.projection {
            Projection::Pivot { .. } => write!(f, "{}", self.projection)?,
            projection => {
                f.write_str("SELECT ")?;
                if self.quantifier == SetQuantifier::Distinct {
                    f.write_str("DISTINCT ")?;
                }
                write!(f, "{projection}")?;
            }
        }
        if let Some(from) = &self.from {
            write!(f, " FROM {from}")?;
        }
        if !self.let_clause.is_empty() {
            f.write_str(" LET ")?;
            for (i, binding) in self.let_clause.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{} AS {}", binding.expr, binding.alias)?;
            }
        }
        if let Some(predicate) = &self.where_clause {
            write!(f, " WHERE {predicate}")?;
        }
        if let Some(group_by) = &self.group_by {
            write!(f, " {group_by}")?;
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {having}")?;
        }
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY ")?;
            comma_separated(f, &self.order_by)?;
        }
        if let Some(limit) = &self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        if let Some(offset) = &self.offset {
            write!(f, " OFFSET {offset}")?;
        }
        Ok(())
    }
}

impl Display for DmlOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert { target, values } => write!(f, "INSERT INTO {target} VALUE {values}"),
            Self::Set(assignments) => {
                f.write_str("SET ")?;
                for (i, a) in assignments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} = {}", a.target, a.value)?;
                }
                Ok(())
            }
            Self::Remove(target) => write!(f, "REMOVE {target}"),
            Self::Delete => f.write_str("DELETE"),
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(expr) => match expr.as_select() {
                Some(select) => write!(f, "{select}"),
                None => write!(f, "{expr}"),
            },
            Self::Dml(dml) => {
                let mut parts = Vec::new();
                if let Some(from) = &dml.from {
                    parts.push(format!("FROM {from}"));
                }
                if let Some(predicate) = &dml.where_clause {
                    parts.push(format!("WHERE {predicate}"));
                }
                parts.extend(dml.operations.iter().map(ToString::to_string));
                f.write_str(&parts.join(" "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryOp, DmlStatement, FromItem, GroupKey, Identifier};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Expr::string("it's"), "'it''s'")]
    #[case(Expr::local_id("x"), "@x")]
    #[case(Expr::quoted_id("X"), "\"X\"")]
    #[case(Expr::path(Expr::id("a"), [PathStep::Field(Identifier::new("b")), PathStep::Wildcard]), "a.b[*]")]
    #[case(Expr::agg("COUNT", SetQuantifier::All, None), "COUNT(*)")]
    #[case(Expr::bag(vec![Expr::int(1), Expr::int(2)]), "<<1, 2>>")]
    #[case(
        Expr::binary(
            Expr::binary(Expr::id("a"), BinaryOp::Add, Expr::int(1)),
            BinaryOp::Mul,
            Expr::int(2)
        ),
        "(a + 1) * 2"
    )]
    #[case(
        Expr::searched_case(vec![(Expr::boolean(true), Expr::string("a"))], None),
        "CASE WHEN true THEN 'a' END"
    )]
    fn test_expr_display(#[case] expr: Expr, #[case] expected: &str) {
        assert_eq!(expr.to_string(), expected);
    }

    #[test]
    fn test_select_display() {
        let select = Select::items(vec![ProjectItem::aliased(Expr::id("a"), "x")])
            .distinct()
            .from(FromSource::join(
                JoinKind::Left,
                FromSource::scan(FromItem::new(Expr::id("t")).alias("t").at("i")),
                FromSource::unpivot(FromItem::new(Expr::id("s")).alias("v")),
                Some(Expr::boolean(true)),
            ))
            .group_by(GroupBy::new(vec![GroupKey::aliased(Expr::id("a"), "a")]).group_as("g"))
            .having(Expr::boolean(true))
            .order_by(SortSpec::new(Expr::id("x")).desc().nulls(NullOrdering::Last))
            .limit(Expr::int(10));

        assert_eq!(
            Statement::query(Expr::select(select)).to_string(),
            "SELECT DISTINCT a AS x FROM t AS t AT i LEFT JOIN UNPIVOT s AS v ON true \
             GROUP BY a AS a GROUP AS g HAVING true ORDER BY x DESC NULLS LAST LIMIT 10"
        );
    }

    #[test]
    fn test_dml_display() {
        let dml = DmlStatement::new(vec![DmlOp::Delete])
            .from(FromSource::scan(FromItem::new(Expr::id("t")).alias("t")))
            .with_where(Expr::binary(Expr::id("a"), BinaryOp::Eq, Expr::int(1)));
        assert_eq!(
            Statement::Dml(dml).to_string(),
            "FROM t AS t WHERE a = 1 DELETE"
        );
    }
}
