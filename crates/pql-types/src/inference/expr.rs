//! Typing of scalar expressions

use log::trace;
use pql_ast::{
    BetweenExpr, BinaryExpr, BinaryOp, CastExpr, CastKind, CollectionExpr, Expr, ExprKind,
    GroupKeyRef, Identifier, InExpr, LikeExpr, Literal, NullIfExpr, PathExpr, PathStep,
    ScopeQualifier, SearchedCaseExpr, SimpleCaseExpr, SourceLocation, StructEntry, UnaryExpr,
    UnaryOp, VarRef,
};
use pql_diagnostics::{Result, SemanticError};
use smallvec::SmallVec;

use super::StaticTypeInferencer;
use crate::semantic::LookupPosition;
use crate::{ProblemDetail, ScalarKind, StaticType, StringLength, StructField};

pub(super) fn is_numeric_member(ty: &StaticType) -> bool {
    matches!(ty, StaticType::Scalar(s) if s.kind.is_numeric())
}

pub(super) fn is_integer_member(ty: &StaticType) -> bool {
    matches!(ty, StaticType::Scalar(s) if s.kind.is_integer())
}

pub(super) fn is_text_member(ty: &StaticType) -> bool {
    matches!(ty, StaticType::Scalar(s) if s.kind.is_text())
}

fn is_bool_member(ty: &StaticType) -> bool {
    matches!(ty, StaticType::Scalar(s) if s.kind == ScalarKind::Bool)
}

/// How an operand relates to the type family an operator expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fit {
    Fits,
    /// Only `Null`/`Missing`
    Unknown,
    Mismatch,
}

fn fit(ty: &StaticType, accept: impl Fn(&StaticType) -> bool) -> Fit {
    if ty.is_any() {
        Fit::Fits
    } else if ty.is_unknown() {
        Fit::Unknown
    } else if ty.known_members().into_iter().any(accept) {
        Fit::Fits
    } else {
        Fit::Mismatch
    }
}

/// Add the `Null`/`Missing` parts carried by the operands
fn with_unknowns_of(ty: StaticType, operands: &[StaticType]) -> StaticType {
    operands
        .iter()
        .filter_map(StaticType::unknown_part)
        .fold(ty, |acc, unknown| acc.union(&unknown))
}

/// Apply `f` to each member of a type and union the results
pub(super) fn map_members(ty: &StaticType, f: impl Fn(&StaticType) -> StaticType) -> StaticType {
    StaticType::union_of(ty.members().into_iter().map(f))
}

fn literal_type(lit: &Literal) -> StaticType {
    match lit {
        Literal::Null => StaticType::Null,
        Literal::Missing => StaticType::Missing,
        Literal::Boolean(_) => StaticType::bool(),
        Literal::Integer(v) if i32::try_from(*v).is_ok() => StaticType::int4(),
        Literal::Integer(_) => StaticType::int8(),
        Literal::Decimal(_) => StaticType::decimal(),
        Literal::Float(_) => StaticType::float(),
        Literal::String(_) => StaticType::string(),
        Literal::Symbol(_) => StaticType::symbol(),
        Literal::Timestamp(_) => StaticType::timestamp(),
        Literal::Blob(_) => StaticType::blob(),
        Literal::Clob(_) => StaticType::clob(),
    }
}

fn field_of(member: &StaticType, name: &Identifier) -> StaticType {
    match member {
        StaticType::Any => StaticType::Any,
        StaticType::Struct(s) => match s.field(&name.name, name.quoted) {
            Some(ty) => ty,
            None if s.content_closed => StaticType::Missing,
            None => StaticType::Any,
        },
        _ => StaticType::Missing,
    }
}

fn index_of(member: &StaticType, key: Option<&Identifier>, index: &StaticType) -> StaticType {
    match member {
        StaticType::Any => StaticType::Any,
        StaticType::Struct(_) => match key {
            Some(key) => field_of(member, key),
            None => StaticType::Any,
        },
        StaticType::Collection(c)
            if index.is_any() || index.known_members().into_iter().any(is_integer_member) =>
        {
            c.element.as_ref().clone()
        }
        _ => StaticType::Missing,
    }
}

fn wildcard_of(member: &StaticType) -> StaticType {
    match member {
        StaticType::Collection(c) => c.element.as_ref().clone(),
        StaticType::Null | StaticType::Missing => StaticType::Missing,
        other => other.clone(),
    }
}

/// Value type of unpivoting a single member
pub(super) fn unpivot_of(member: &StaticType) -> StaticType {
    match member {
        StaticType::Struct(s) if s.content_closed => {
            StaticType::union_of(s.fields.iter().map(|f| f.ty.clone()))
        }
        StaticType::Struct(_) | StaticType::Any => StaticType::Any,
        StaticType::Null | StaticType::Missing => StaticType::Missing,
        other => other.clone(),
    }
}

impl StaticTypeInferencer<'_> {
    /// Type an expression and record its type
    pub(super) fn infer_expr(&mut self, expr: &Expr) -> Result<StaticType> {
        let location = expr.location;
        let ty = match &expr.kind {
            ExprKind::Lit(lit) => literal_type(lit),
            ExprKind::Id(var) => self.infer_var(expr, var, LookupPosition::Expression)?,
            ExprKind::Param(_) => StaticType::Any,
            ExprKind::Unary(unary) => self.infer_unary(unary, location)?,
            ExprKind::Binary(binary) => self.infer_binary(binary, location)?,
            ExprKind::Like(like) => self.infer_like(like, location)?,
            ExprKind::Between(between) => self.infer_between(between, location)?,
            ExprKind::In(in_expr) => self.infer_in(in_expr, location)?,
            ExprKind::Is(is) => {
                self.infer_expr(&is.value)?;
                StaticType::bool()
            }
            ExprKind::Path(path) => self.infer_path(path, LookupPosition::Expression)?,
            ExprKind::Call(call) => self.infer_call(call, location)?,
            ExprKind::CallAgg(agg) => self.infer_aggregate(agg, location)?,
            ExprKind::SimpleCase(case) => self.infer_simple_case(case)?,
            ExprKind::SearchedCase(case) => self.infer_searched_case(case)?,
            ExprKind::NullIf(null_if) => self.infer_null_if(null_if, location)?,
            ExprKind::Coalesce(args) => self.infer_coalesce(args)?,
            ExprKind::Collection(collection) => self.infer_collection(collection)?,
            ExprKind::Struct(entries) => self.infer_struct(entries)?,
            ExprKind::Cast(cast) => self.infer_cast(cast)?,
            ExprKind::Select(select) => self.infer_select(select)?,
            ExprKind::GroupKeyRef(key) => self.infer_group_key_ref(expr, key)?,
        };
        Ok(self.record(expr.id, ty))
    }

    /// Resolve a variable and record the qualifier used
    pub(super) fn infer_var(
        &mut self,
        expr: &Expr,
        var: &VarRef,
        position: LookupPosition,
    ) -> Result<StaticType> {
        let resolved = self
            .resolver
            .resolve(&self.chain, var, position, expr.location)?;
        self.annotations.set_qualifier(expr.id, resolved.qualifier);
        Ok(resolved.ty)
    }

    fn infer_group_key_ref(&mut self, expr: &Expr, key: &GroupKeyRef) -> Result<StaticType> {
        let unique = Identifier::quoted(key.unique_name.clone());
        let Some(binding) = self.chain.lookup(&unique) else {
            return Err(SemanticError::UnboundBinding {
                name: key.surface.name.clone(),
                location: expr.location,
            });
        };
        let ty = binding.ty.clone();
        self.annotations
            .set_qualifier(expr.id, ScopeQualifier::LocalsFirst);
        Ok(ty)
    }

    /// Check operands against an operator's type family
    ///
    /// Returns `false` when a problem was reported; the caller then uses its
    /// continuation type.
    fn check_operands(
        &mut self,
        operands: &[StaticType],
        accept: impl Fn(&StaticType) -> bool,
        op: &str,
        location: SourceLocation,
    ) -> bool {
        let fits: SmallVec<[Fit; 4]> = operands.iter().map(|t| fit(t, &accept)).collect();
        if fits.contains(&Fit::Mismatch) {
            self.report(
                location,
                ProblemDetail::DataTypeMismatch {
                    arg_types: operands.to_vec(),
                    op: op.to_string(),
                },
            );
            false
        } else if fits.contains(&Fit::Unknown) {
            self.report(location, ProblemDetail::AlwaysReturnsNullOrMissing);
            false
        } else {
            true
        }
    }

    /// Check that the first operand is comparable to each of the others
    fn check_comparable(
        &mut self,
        operands: &[StaticType],
        op: &str,
        location: SourceLocation,
    ) -> bool {
        let Some((value, others)) = operands.split_first() else {
            return true;
        };
        if others.iter().any(|other| !value.is_comparable(other)) {
            self.report(
                location,
                ProblemDetail::DataTypeMismatch {
                    arg_types: operands.to_vec(),
                    op: op.to_string(),
                },
            );
            false
        } else if operands.iter().any(StaticType::is_unknown) {
            self.report(location, ProblemDetail::AlwaysReturnsNullOrMissing);
            false
        } else {
            true
        }
    }

    /// Check that a predicate can be boolean
    pub(super) fn check_condition(&mut self, ty: &StaticType, location: SourceLocation) {
        if ty.is_any() {
            return;
        }
        if ty.is_unknown() {
            self.report(location, ProblemDetail::AlwaysReturnsNullOrMissing);
        } else if !ty.known_members().into_iter().any(is_bool_member) {
            self.report(
                location,
                ProblemDetail::IncompatibleDataTypeForExpr {
                    expected: StaticType::bool(),
                    actual: ty.clone(),
                },
            );
        }
    }

    fn infer_unary(&mut self, unary: &UnaryExpr, location: SourceLocation) -> Result<StaticType> {
        let operand = self.infer_expr(&unary.operand)?;
        let operands = std::slice::from_ref(&operand);
        Ok(match unary.op {
            UnaryOp::Not => self.logical(operands, unary.op.symbol(), location),
            UnaryOp::Pos | UnaryOp::Neg => {
                if !self.check_operands(operands, is_numeric_member, unary.op.symbol(), location) {
                    StaticType::all_numeric()
                } else if operand.is_any() {
                    StaticType::Any
                } else {
                    let known = StaticType::union_of(operand.known_members().into_iter().map(
                        |m| {
                            if is_numeric_member(m) {
                                m.clone()
                            } else {
                                StaticType::Missing
                            }
                        },
                    ));
                    with_unknowns_of(known, operands)
                }
            }
        })
    }

    fn infer_binary(
        &mut self,
        binary: &BinaryExpr,
        location: SourceLocation,
    ) -> Result<StaticType> {
        let lhs = self.infer_expr(&binary.lhs)?;
        let rhs = self.infer_expr(&binary.rhs)?;
        let operands = [lhs, rhs];
        let op = binary.op.symbol();
        Ok(match binary.op {
            BinaryOp::And | BinaryOp::Or => self.logical(&operands, op, location),
            BinaryOp::Concat => self.concat(&operands, location),
            o if o.is_comparison() => {
                if self.check_comparable(&operands, op, location) {
                    with_unknowns_of(StaticType::bool(), &operands)
                } else {
                    StaticType::bool()
                }
            }
            _ => self.arithmetic(&operands, op, location),
        })
    }

    fn arithmetic(&mut self, operands: &[StaticType; 2], op: &str, location: SourceLocation) -> StaticType {
        if !self.check_operands(operands, is_numeric_member, op, location) {
            return StaticType::all_numeric();
        }
        if operands.iter().any(StaticType::is_any) {
            return StaticType::Any;
        }
        let [lhs, rhs] = operands;
        let widened = lhs.without_unknowns().widen(&rhs.without_unknowns());
        with_unknowns_of(widened, operands)
    }

    fn logical(&mut self, operands: &[StaticType], op: &str, location: SourceLocation) -> StaticType {
        if self.check_operands(operands, is_bool_member, op, location) {
            with_unknowns_of(StaticType::bool(), operands)
        } else {
            StaticType::bool()
        }
    }

    fn concat(&mut self, operands: &[StaticType; 2], location: SourceLocation) -> StaticType {
        if !self.check_operands(operands, is_text_member, BinaryOp::Concat.symbol(), location) {
            return StaticType::string();
        }
        let length = |ty: &StaticType| {
            ty.without_unknowns()
                .as_scalar()
                .and_then(|s| s.length())
        };
        let [lhs, rhs] = operands;
        let ty = match (length(lhs), length(rhs)) {
            (Some(StringLength::Equals(a)), Some(StringLength::Equals(b))) => {
                StaticType::string_with(StringLength::Equals(a.saturating_add(b)))
            }
            (Some(a), Some(b)) => {
                StaticType::string_with(StringLength::UpTo(a.value().saturating_add(b.value())))
            }
            _ => StaticType::string(),
        };
        with_unknowns_of(ty, operands)
    }

    fn infer_like(&mut self, like: &LikeExpr, location: SourceLocation) -> Result<StaticType> {
        let mut operands = vec![self.infer_expr(&like.value)?, self.infer_expr(&like.pattern)?];
        if let Some(escape) = &like.escape {
            operands.push(self.infer_expr(escape)?);
        }
        Ok(if self.check_operands(&operands, is_text_member, "LIKE", location) {
            with_unknowns_of(StaticType::bool(), &operands)
        } else {
            StaticType::bool()
        })
    }

    fn infer_between(
        &mut self,
        between: &BetweenExpr,
        location: SourceLocation,
    ) -> Result<StaticType> {
        let operands = [
            self.infer_expr(&between.value)?,
            self.infer_expr(&between.from)?,
            self.infer_expr(&between.to)?,
        ];
        Ok(if self.check_comparable(&operands, "BETWEEN", location) {
            with_unknowns_of(StaticType::bool(), &operands)
        } else {
            StaticType::bool()
        })
    }

    fn infer_in(&mut self, in_expr: &InExpr, location: SourceLocation) -> Result<StaticType> {
        let lhs = self.infer_expr(&in_expr.lhs)?;
        let rhs = self.infer_expr(&in_expr.rhs)?;

        let element = if rhs.is_any() {
            Some(StaticType::Any)
        } else {
            let elements: Vec<StaticType> = rhs
                .known_members()
                .into_iter()
                .filter_map(|m| m.as_collection().map(|c| c.element.as_ref().clone()))
                .collect();
            (!elements.is_empty()).then(|| StaticType::union_of(elements))
        };

        let operands = [lhs, rhs];
        let [lhs, rhs] = &operands;
        let mismatch = match &element {
            Some(element) => !lhs.is_comparable(element),
            None => !rhs.is_unknown(),
        };
        Ok(if mismatch {
            self.report(
                location,
                ProblemDetail::DataTypeMismatch {
                    arg_types: operands.to_vec(),
                    op: "IN".to_string(),
                },
            );
            StaticType::bool()
        } else if lhs.is_unknown() || rhs.is_unknown() {
            self.report(location, ProblemDetail::AlwaysReturnsNullOrMissing);
            StaticType::bool()
        } else {
            with_unknowns_of(StaticType::bool(), &operands)
        })
    }

    fn infer_null_if(&mut self, null_if: &NullIfExpr, location: SourceLocation) -> Result<StaticType> {
        let operands = [self.infer_expr(&null_if.lhs)?, self.infer_expr(&null_if.rhs)?];
        self.check_comparable(&operands, "NULLIF", location);
        let [lhs, _] = operands;
        Ok(lhs.as_nullable())
    }

    /// Union of argument types up to the first argument that is never
    /// `Null` or `Missing`
    fn infer_coalesce(&mut self, args: &[Expr]) -> Result<StaticType> {
        let mut types = Vec::with_capacity(args.len());
        for arg in args {
            types.push(self.infer_expr(arg)?);
        }

        let mut members = Vec::new();
        let mut settled = false;
        for ty in &types {
            members.push(ty.clone());
            if !ty.is_nullable() && !ty.is_optional() {
                settled = true;
                break;
            }
        }

        let union = StaticType::union_of(members);
        Ok(if settled {
            union.without_unknowns()
        } else if types.is_empty() {
            StaticType::Null
        } else if types.iter().all(|t| *t == StaticType::Missing) {
            StaticType::Missing
        } else if union.is_unknown() {
            StaticType::Null
        } else {
            union.without_unknowns().as_nullable()
        })
    }

    fn infer_simple_case(&mut self, case: &SimpleCaseExpr) -> Result<StaticType> {
        let operand = self.infer_expr(&case.operand)?;
        let mut results = Vec::with_capacity(case.branches.len() + 1);
        for branch in &case.branches {
            let when = self.infer_expr(&branch.when)?;
            self.check_comparable(&[operand.clone(), when], "CASE", branch.when.location);
            results.push(self.infer_expr(&branch.then)?);
        }
        results.push(self.infer_else(case.else_expr.as_deref())?);
        Ok(StaticType::union_of(results))
    }

    fn infer_searched_case(&mut self, case: &SearchedCaseExpr) -> Result<StaticType> {
        let mut results = Vec::with_capacity(case.branches.len() + 1);
        for branch in &case.branches {
            let when = self.infer_expr(&branch.when)?;
            self.check_condition(&when, branch.when.location);
            results.push(self.infer_expr(&branch.then)?);
        }
        results.push(self.infer_else(case.else_expr.as_deref())?);
        Ok(StaticType::union_of(results))
    }

    fn infer_else(&mut self, else_expr: Option<&Expr>) -> Result<StaticType> {
        match else_expr {
            Some(expr) => self.infer_expr(expr),
            None => Ok(StaticType::Null),
        }
    }

    /// Type a path, navigating member-wise through unions
    ///
    /// `[*]` and `.*` steps iterate; the result of a path containing one is a
    /// bag of the navigated type.
    pub(super) fn infer_path(
        &mut self,
        path: &PathExpr,
        position: LookupPosition,
    ) -> Result<StaticType> {
        let mut current = match &path.root.kind {
            ExprKind::Id(var) => {
                let ty = self.infer_var(&path.root, var, position)?;
                self.record(path.root.id, ty)
            }
            _ => self.infer_expr(&path.root)?,
        };

        let mut iterated = false;
        for step in &path.steps {
            current = match step {
                PathStep::Field(name) => map_members(&current, |m| field_of(m, name)),
                PathStep::Index(index) => {
                    let index_ty = self.infer_expr(index)?;
                    let key = index
                        .as_literal()
                        .and_then(Literal::as_text)
                        .map(Identifier::quoted);
                    map_members(&current, |m| index_of(m, key.as_ref(), &index_ty))
                }
                PathStep::Wildcard => {
                    iterated = true;
                    map_members(&current, wildcard_of)
                }
                PathStep::Unpivot => {
                    iterated = true;
                    map_members(&current, unpivot_of)
                }
            };
        }

        Ok(if iterated {
            StaticType::bag(current)
        } else {
            current
        })
    }

    fn infer_collection(&mut self, collection: &CollectionExpr) -> Result<StaticType> {
        let mut elements = Vec::with_capacity(collection.elements.len());
        for element in &collection.elements {
            elements.push(self.infer_expr(element)?);
        }
        let element = if elements.is_empty() {
            StaticType::Any
        } else {
            StaticType::union_of(elements)
        };
        Ok(StaticType::collection(collection.kind, element))
    }

    fn infer_struct(&mut self, entries: &[StructEntry]) -> Result<StaticType> {
        let mut fields = Vec::with_capacity(entries.len());
        let mut closed = true;
        for entry in entries {
            self.infer_expr(&entry.key)?;
            let value = self.infer_expr(&entry.value)?;
            match entry.key.as_literal() {
                Some(lit) => match lit.as_text() {
                    Some(name) => fields.push(StructField::new(name, value)),
                    None => trace!("dropping struct field with non-text key {}", entry.key),
                },
                None => closed = false,
            }
        }
        Ok(StaticType::structure(fields, closed))
    }

    fn infer_cast(&mut self, cast: &CastExpr) -> Result<StaticType> {
        let value = self.infer_expr(&cast.value)?;
        if cast.kind != CastKind::Cast {
            return Ok(StaticType::bool());
        }

        let target = StaticType::from(&cast.as_type);
        if value.is_unknown() {
            return Ok(value);
        }
        if value.is_any() || target.is_any() {
            return Ok(target);
        }
        let may_fail = value
            .known_members()
            .into_iter()
            .any(|m| !m.same_family(&target));
        let target = if may_fail {
            target.as_optional()
        } else {
            target
        };
        Ok(with_unknowns_of(target, std::slice::from_ref(&value)))
    }
}
