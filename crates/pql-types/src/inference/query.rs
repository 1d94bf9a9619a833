//! Typing of SELECT queries and DML statements

use pql_ast::{
    CollectionKind, DmlOp, DmlStatement, Expr, ExprKind, FromItem, FromSource, GroupBy,
    Identifier, JoinKind, ProjectItem, Projection, Select, SourceLocation,
};
use pql_diagnostics::Result;

use super::expr::{is_integer_member, is_text_member, map_members, unpivot_of};
use super::{QueryLevel, StaticTypeInferencer};
use crate::semantic::{Binding, BindingKind, LookupPosition, Scope, ScopeKind};
use crate::{ProblemDetail, StaticType, StructField};

/// Element and position types of scanning a source
fn scan_types(source: &StaticType) -> (StaticType, StaticType) {
    if source.is_any() {
        return (StaticType::Any, StaticType::Any);
    }
    let mut elements = Vec::new();
    let mut positions = Vec::new();
    for member in source.members() {
        match member {
            StaticType::Collection(c) => {
                elements.push(c.element.as_ref().clone());
                positions.push(if c.kind == CollectionKind::List {
                    StaticType::int8()
                } else {
                    StaticType::Missing
                });
            }
            other => {
                elements.push(other.clone());
                positions.push(StaticType::Missing);
            }
        }
    }
    (StaticType::union_of(elements), StaticType::union_of(positions))
}

fn synthesized_alias(expr: &Expr, index: usize) -> Identifier {
    expr.derived_alias()
        .unwrap_or_else(|| Identifier::new(format!("_{}", index + 1)))
}

impl StaticTypeInferencer<'_> {
    /// Type a SELECT in a fresh query level
    pub(super) fn infer_select(&mut self, select: &Select) -> Result<StaticType> {
        self.chain.enter(ScopeKind::Query);
        self.levels.push(QueryLevel { from_scope: None });
        let result = self.infer_select_clauses(select);
        self.levels.pop();
        self.chain.leave();
        result
    }

    fn infer_select_clauses(&mut self, select: &Select) -> Result<StaticType> {
        let from_known = match &select.from {
            Some(from) => {
                self.bind_from_source(from, false)?;
                self.from_bindings_known()
            }
            None => true,
        };

        for binding in &select.let_clause {
            let ty = self.infer_expr(&binding.expr)?;
            if let Some(scope) = self.chain.current_mut() {
                scope.define(Binding {
                    name: binding.alias.clone(),
                    ty,
                    kind: BindingKind::Let,
                });
            }
        }

        if let Some(predicate) = &select.where_clause {
            self.infer_condition(predicate)?;
        }
        if let Some(group_by) = &select.group_by {
            self.enter_grouping(group_by)?;
        }
        if let Some(predicate) = &select.having {
            self.infer_condition(predicate)?;
        }

        let element = self.infer_projection(&select.projection, from_known)?;

        for spec in &select.order_by {
            self.infer_expr(&spec.expr)?;
        }
        for clause in [&select.limit, &select.offset].into_iter().flatten() {
            self.infer_row_count(clause)?;
        }

        Ok(match &select.projection {
            Projection::Pivot { .. } => element,
            _ if select.order_by.is_empty() => StaticType::bag(element),
            _ => StaticType::list(element),
        })
    }

    /// Type a predicate clause and annotate it as boolean
    fn infer_condition(&mut self, predicate: &Expr) -> Result<()> {
        let ty = self.infer_expr(predicate)?;
        self.check_condition(&ty, predicate.location);
        self.record(predicate.id, StaticType::bool());
        Ok(())
    }

    fn infer_row_count(&mut self, expr: &Expr) -> Result<()> {
        let ty = self.infer_expr(expr)?;
        if !ty.is_any() && !ty.known_members().into_iter().any(is_integer_member) {
            self.report(
                expr.location,
                ProblemDetail::IncompatibleDataTypeForExpr {
                    expected: StaticType::int(),
                    actual: ty,
                },
            );
        }
        Ok(())
    }

    /// Type the root of a FROM source, where globals take precedence
    fn infer_source(&mut self, expr: &Expr) -> Result<StaticType> {
        let ty = match &expr.kind {
            ExprKind::Id(var) => self.infer_var(expr, var, LookupPosition::FromSource)?,
            ExprKind::Path(path) => self.infer_path(path, LookupPosition::FromSource)?,
            _ => return self.infer_expr(expr),
        };
        Ok(self.record(expr.id, ty))
    }

    /// Bind a FROM source into the current frame
    ///
    /// `padded` marks sources on the outer side of an outer join, whose
    /// bindings become nullable.
    fn bind_from_source(&mut self, source: &FromSource, padded: bool) -> Result<()> {
        match source {
            FromSource::Scan(item) => {
                let source = self.infer_source(&item.expr)?;
                let (element, position) = scan_types(&source);
                self.bind_from_item(item, element, position, padded)
            }
            FromSource::Unpivot(item) => {
                let source = self.infer_source(&item.expr)?;
                let value = map_members(&source, unpivot_of);
                self.bind_from_item(item, value, StaticType::string(), padded)
            }
            FromSource::Join(join) => {
                let (left_padded, right_padded) = match join.kind {
                    JoinKind::Inner => (false, false),
                    JoinKind::Left => (false, true),
                    JoinKind::Right => (true, false),
                    JoinKind::Full => (true, true),
                };
                self.bind_from_source(&join.left, padded || left_padded)?;
                self.bind_from_source(&join.right, padded || right_padded)?;
                if let Some(predicate) = &join.predicate {
                    self.infer_condition(predicate)?;
                }
                Ok(())
            }
        }
    }

    fn bind_from_item(
        &mut self,
        item: &FromItem,
        element: StaticType,
        position: StaticType,
        padded: bool,
    ) -> Result<()> {
        let location = item.location();
        let pad = |ty: StaticType| if padded { ty.as_nullable() } else { ty };

        let as_alias = item.as_alias.clone().or_else(|| item.expr.derived_alias());
        if let Some(alias) = as_alias {
            self.define_from(alias, pad(element), BindingKind::FromAs, location)?;
        }
        if let Some(alias) = &item.at_alias {
            self.define_from(alias.clone(), pad(position), BindingKind::FromAt, location)?;
        }
        if let Some(alias) = &item.by_alias {
            self.define_from(alias.clone(), StaticType::Any, BindingKind::FromBy, location)?;
        }
        Ok(())
    }

    fn define_from(
        &mut self,
        name: Identifier,
        ty: StaticType,
        kind: BindingKind,
        location: SourceLocation,
    ) -> Result<()> {
        match self.chain.current_mut() {
            Some(scope) => scope.define_unique(Binding { name, ty, kind }, location),
            None => Ok(()),
        }
    }

    fn from_bindings_known(&self) -> bool {
        self.chain.current().is_some_and(|scope| {
            scope
                .bindings()
                .filter(|b| b.kind.is_from())
                .all(|b| !b.ty.is_any())
        })
    }

    /// Replace the FROM frame with the grouped frame
    ///
    /// Keys are typed against the FROM frame, which is kept aside for
    /// aggregate arguments.
    fn enter_grouping(&mut self, group_by: &GroupBy) -> Result<()> {
        let mut grouped = Scope::new(ScopeKind::Grouped);
        for (index, key) in group_by.keys.iter().enumerate() {
            let ty = self.infer_expr(&key.expr)?;
            let alias = key
                .alias
                .clone()
                .unwrap_or_else(|| synthesized_alias(&key.expr, index));
            grouped.define(Binding {
                name: alias,
                ty: ty.clone(),
                kind: BindingKind::GroupKey,
            });
            if let Some(unique) = self.meta.unique_name(key.id) {
                grouped.define(Binding {
                    name: Identifier::quoted(unique),
                    ty,
                    kind: BindingKind::GroupKeyUniqueName,
                });
            }
        }

        if let Some(alias) = &group_by.group_as {
            let fields = self
                .chain
                .current()
                .map(|scope| {
                    scope
                        .bindings()
                        .filter(|b| b.kind.is_from())
                        .map(|b| StructField::new(b.name.name.clone(), b.ty.clone()))
                        .collect()
                })
                .unwrap_or_default();
            grouped.define(Binding {
                name: alias.clone(),
                ty: StaticType::bag(StaticType::structure(fields, true)),
                kind: BindingKind::GroupAs,
            });
        }

        let from_scope = self.chain.leave();
        self.chain.push(grouped);
        if let Some(level) = self.levels.last_mut() {
            level.from_scope = from_scope;
        }
        Ok(())
    }

    fn infer_projection(&mut self, projection: &Projection, from_known: bool) -> Result<StaticType> {
        match projection {
            Projection::Value(expr) => self.infer_expr(expr),
            Projection::Pivot { value, key } => {
                self.infer_expr(value)?;
                let key_ty = self.infer_expr(key)?;
                if !key_ty.is_any()
                    && !key_ty.is_unknown()
                    && !key_ty.known_members().into_iter().any(is_text_member)
                {
                    self.report(
                        key.location,
                        ProblemDetail::IncompatibleDataTypeForExpr {
                            expected: StaticType::string(),
                            actual: key_ty,
                        },
                    );
                }
                Ok(StaticType::open_struct())
            }
            Projection::Star => Ok(self.star_struct(from_known)),
            Projection::List(items) => self.infer_select_list(items, from_known),
        }
    }

    fn infer_select_list(&mut self, items: &[ProjectItem], from_known: bool) -> Result<StaticType> {
        let mut fields = Vec::with_capacity(items.len());
        let mut aliases: Vec<Identifier> = Vec::with_capacity(items.len());
        let mut closed = from_known;

        for (index, item) in items.iter().enumerate() {
            match item {
                ProjectItem::All { expr } => {
                    let ty = self.infer_expr(expr)?;
                    match ty.as_struct() {
                        Some(s) if s.content_closed => fields.extend(s.fields.iter().cloned()),
                        _ => closed = false,
                    }
                }
                ProjectItem::Expr { expr, alias } => {
                    let ty = self.infer_expr(expr)?;
                    if ty.is_any() {
                        closed = false;
                    }
                    let alias = alias
                        .clone()
                        .unwrap_or_else(|| synthesized_alias(expr, index));
                    if aliases.iter().any(|a| a.collides_with(&alias)) {
                        self.report(
                            expr.location,
                            ProblemDetail::DuplicateAliasInSelectList {
                                alias: alias.name.clone(),
                            },
                        );
                    }
                    fields.push(StructField::new(alias.name.clone(), ty));
                    aliases.push(alias);
                }
            }
        }
        Ok(StaticType::structure(fields, closed))
    }

    /// Row type of `SELECT *` over the current frame
    fn star_struct(&self, from_known: bool) -> StaticType {
        let Some(scope) = self.chain.current() else {
            return StaticType::open_struct();
        };
        let mut fields = Vec::new();
        let mut closed = from_known;
        for binding in scope.bindings() {
            match binding.kind {
                BindingKind::FromAs => match binding.ty.as_struct() {
                    Some(s) if s.content_closed => fields.extend(s.fields.iter().cloned()),
                    _ => closed = false,
                },
                BindingKind::FromAt
                | BindingKind::FromBy
                | BindingKind::GroupKey
                | BindingKind::GroupAs => {
                    fields.push(StructField::new(binding.name.name.clone(), binding.ty.clone()));
                }
                BindingKind::Let | BindingKind::GroupKeyUniqueName => {}
            }
        }
        StaticType::structure(fields, closed)
    }

    /// Type a DML statement; its result is `Any`
    pub(super) fn infer_dml(&mut self, dml: &DmlStatement) -> Result<StaticType> {
        self.chain.enter(ScopeKind::Dml);
        let result = self.infer_dml_clauses(dml);
        self.chain.leave();
        result.map(|()| StaticType::Any)
    }

    fn infer_dml_clauses(&mut self, dml: &DmlStatement) -> Result<()> {
        if let Some(from) = &dml.from {
            self.bind_from_source(from, false)?;
        }
        if let Some(predicate) = &dml.where_clause {
            self.infer_condition(predicate)?;
        }
        for op in &dml.operations {
            match op {
                DmlOp::Insert { target, values } => {
                    self.infer_source(target)?;
                    self.infer_expr(values)?;
                }
                DmlOp::Set(assignments) => {
                    for assignment in assignments {
                        self.infer_expr(&assignment.target)?;
                        self.infer_expr(&assignment.value)?;
                    }
                }
                DmlOp::Remove(target) => {
                    self.infer_expr(target)?;
                }
                DmlOp::Delete => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BindingEnvironment, FunctionRegistry, InferenceOptions, InferenceOutput};
    use pql_ast::{
        AggregateRegistry, BinaryOp, GroupKey, NodeMeta, SetQuantifier, SortSpec, Statement,
        group_key_unique_name,
    };
    use pql_diagnostics::SemanticError;
    use pretty_assertions::assert_eq;

    fn env() -> BindingEnvironment {
        BindingEnvironment::new()
            .with(
                "people",
                StaticType::bag(StaticType::closed_struct([
                    ("name", StaticType::string()),
                    ("age", StaticType::int4()),
                ])),
            )
            .with("nums", StaticType::list(StaticType::int4()))
            .with("anything", StaticType::Any)
            .with(
                "rec",
                StaticType::closed_struct([("a", StaticType::int4()), ("b", StaticType::bool())]),
            )
    }

    fn infer_with(meta: &NodeMeta, statement: Statement) -> Result<InferenceOutput> {
        let env = env();
        let functions = FunctionRegistry::builtins();
        let options = InferenceOptions::new();
        StaticTypeInferencer::new(&env, &functions, &options, meta).infer(&statement)
    }

    fn infer(select: Select) -> Result<InferenceOutput> {
        infer_with(&NodeMeta::new(), Statement::query(Expr::select(select)))
    }

    fn people() -> FromSource {
        FromSource::scan(FromItem::new(Expr::id("people")).alias("p"))
    }

    #[test]
    fn test_select_list_is_closed_bag() {
        let select = Select::items(vec![
            ProjectItem::aliased(Expr::dot(Expr::id("p"), "name"), "n"),
            ProjectItem::expr(Expr::dot(Expr::id("p"), "age")),
        ])
        .from(people());
        let output = infer(select).unwrap();
        assert_eq!(
            output.result_type,
            StaticType::bag(StaticType::closed_struct([
                ("n", StaticType::string()),
                ("age", StaticType::int4()),
            ]))
        );
    }

    #[test]
    fn test_local_binding_shadows_global() {
        let local = Expr::id("p");
        let local_id = local.id;
        let select = Select::value(local).from(people());
        let output = infer(select).unwrap();
        assert_eq!(
            output.annotations.qualifier_of(local_id),
            Some(pql_ast::ScopeQualifier::LocalsFirst)
        );
    }

    #[test]
    fn test_order_by_makes_list_and_value_projection() {
        let select = Select::value(Expr::id("n"))
            .from(FromSource::scan(FromItem::new(Expr::id("nums")).alias("n").at("i")))
            .order_by(SortSpec::new(Expr::id("i")));
        let output = infer(select).unwrap();
        assert_eq!(output.result_type, StaticType::list(StaticType::int4()));
    }

    #[test]
    fn test_at_binding_types() {
        let select = Select::value(Expr::id("i"))
            .from(FromSource::scan(FromItem::new(Expr::id("nums")).alias("n").at("i")));
        assert_eq!(infer(select).unwrap().result_type, StaticType::bag(StaticType::int8()));

        let select = Select::value(Expr::id("i"))
            .from(FromSource::scan(FromItem::new(Expr::id("people")).alias("p").at("i")));
        assert_eq!(infer(select).unwrap().result_type, StaticType::bag(StaticType::Missing));
    }

    #[test]
    fn test_duplicate_from_alias_is_fatal() {
        let select = Select::star().from(FromSource::comma(
            people(),
            FromSource::scan(FromItem::new(Expr::id("nums")).alias("P")),
        ));
        assert!(matches!(infer(select), Err(SemanticError::AmbiguousBinding { .. })));
    }

    #[test]
    fn test_outer_join_pads_bindings() {
        let select = Select::value(Expr::id("n")).from(FromSource::join(
            JoinKind::Left,
            people(),
            FromSource::scan(FromItem::new(Expr::id("nums")).alias("n")),
            Some(Expr::boolean(true)),
        ));
        assert_eq!(
            infer(select).unwrap().result_type,
            StaticType::bag(StaticType::int4().as_nullable())
        );
    }

    #[test]
    fn test_unpivot() {
        let select = Select::value(Expr::id("v")).from(FromSource::unpivot(
            FromItem::new(Expr::id("rec")).alias("v").at("k"),
        ));
        assert_eq!(
            infer(select).unwrap().result_type,
            StaticType::bag(StaticType::union_of([StaticType::int4(), StaticType::bool()]))
        );

        let keys = Select::value(Expr::id("k")).from(FromSource::unpivot(
            FromItem::new(Expr::id("anything")).alias("v").at("k"),
        ));
        assert_eq!(infer(keys).unwrap().result_type, StaticType::bag(StaticType::string()));
    }

    #[test]
    fn test_where_must_be_boolean() {
        let predicate = Expr::dot(Expr::id("p"), "age");
        let predicate_id = predicate.id;
        let select = Select::star().from(people()).with_where(predicate);
        let output = infer(select).unwrap();
        assert_eq!(
            output.problems[0].detail,
            ProblemDetail::IncompatibleDataTypeForExpr {
                expected: StaticType::bool(),
                actual: StaticType::int4(),
            }
        );
        assert_eq!(output.annotations.type_of(predicate_id), Some(&StaticType::bool()));
    }

    #[test]
    fn test_join_predicate_must_be_boolean() {
        let predicate = Expr::dot(Expr::id("p"), "name");
        let predicate_id = predicate.id;
        let select = Select::value(Expr::id("n")).from(FromSource::join(
            JoinKind::Inner,
            people(),
            FromSource::scan(FromItem::new(Expr::id("nums")).alias("n")),
            Some(predicate),
        ));
        let output = infer(select).unwrap();
        assert_eq!(
            output.problems[0].detail,
            ProblemDetail::IncompatibleDataTypeForExpr {
                expected: StaticType::bool(),
                actual: StaticType::string(),
            }
        );
        assert_eq!(output.annotations.type_of(predicate_id), Some(&StaticType::bool()));
        assert_eq!(output.result_type, StaticType::bag(StaticType::int4()));
    }

    #[test]
    fn test_null_having_is_a_warning() {
        let having = Expr::null();
        let having_id = having.id;
        let select = Select::value(Expr::id("k"))
            .from(people())
            .group_by(GroupBy::new(vec![GroupKey::aliased(Expr::dot(Expr::id("p"), "name"), "k")]))
            .having(having);
        let output = infer(select).unwrap();
        assert_eq!(output.problems.len(), 1);
        assert_eq!(output.problems[0].detail, ProblemDetail::AlwaysReturnsNullOrMissing);
        assert!(!output.has_errors());
        assert_eq!(output.annotations.type_of(having_id), Some(&StaticType::bool()));
    }

    #[test]
    fn test_aggregate_outside_projection_sees_from_frame() {
        let ordered = Select::value(Expr::id("k"))
            .from(people())
            .group_by(GroupBy::new(vec![GroupKey::aliased(Expr::dot(Expr::id("p"), "name"), "k")]))
            .order_by(SortSpec::new(Expr::agg(
                "sum",
                SetQuantifier::All,
                Some(Expr::dot(Expr::id("p"), "age")),
            )));
        let output = infer(ordered).unwrap();
        assert!(output.problems.is_empty());
        assert_eq!(output.result_type, StaticType::list(StaticType::string()));

        let value = Select::value(Expr::agg(
            "sum",
            SetQuantifier::All,
            Some(Expr::dot(Expr::id("p"), "age")),
        ))
        .from(people())
        .group_by(GroupBy::new(vec![GroupKey::aliased(Expr::dot(Expr::id("p"), "name"), "k")]));
        assert_eq!(
            infer(value).unwrap().result_type,
            StaticType::bag(StaticType::int4().as_nullable())
        );
    }

    #[test]
    fn test_aggregate_registry_does_not_limit_typing() {
        let registered = Expr::agg("count", SetQuantifier::All, None);
        let mut registry = AggregateRegistry::new();
        registry.register("count", registered.id);

        let query = Expr::select(
            Select::items(vec![
                ProjectItem::aliased(registered, "c"),
                ProjectItem::aliased(
                    Expr::agg("max", SetQuantifier::All, Some(Expr::dot(Expr::id("p"), "age"))),
                    "m",
                ),
            ])
            .from(people())
            .group_by(GroupBy::new(vec![GroupKey::aliased(Expr::dot(Expr::id("p"), "name"), "k")])),
        );
        let mut meta = NodeMeta::new();
        meta.set_aggregates(query.id, registry);

        let output = infer_with(&meta, Statement::query(query)).unwrap();
        assert_eq!(
            output.result_type,
            StaticType::bag(StaticType::closed_struct([
                ("c", StaticType::int8()),
                ("m", StaticType::int4().as_nullable()),
            ]))
        );
    }

    #[test]
    fn test_quoted_aliases_differing_in_case() {
        let select = Select::items(vec![
            ProjectItem::aliased(Expr::quoted_id("a"), Identifier::quoted("a")),
            ProjectItem::aliased(Expr::quoted_id("A"), Identifier::quoted("A")),
        ])
        .from(FromSource::comma(
            FromSource::scan(FromItem::new(Expr::id("nums")).alias(Identifier::quoted("a"))),
            FromSource::scan(FromItem::new(Expr::id("rec")).alias(Identifier::quoted("A"))),
        ));
        let output = infer(select).unwrap();
        assert_eq!(output.problems, vec![]);
        assert_eq!(
            output.result_type,
            StaticType::bag(StaticType::closed_struct([
                ("a", StaticType::int4()),
                (
                    "A",
                    StaticType::closed_struct([("a", StaticType::int4()), ("b", StaticType::bool())]),
                ),
            ]))
        );
    }

    #[test]
    fn test_quoted_alias_clashes_with_unquoted() {
        let select = Select::items(vec![
            ProjectItem::aliased(Expr::int(1), Identifier::quoted("a")),
            ProjectItem::aliased(Expr::int(2), "A"),
        ]);
        let output = infer(select).unwrap();
        assert_eq!(
            output.problems[0].detail,
            ProblemDetail::DuplicateAliasInSelectList {
                alias: "A".to_string()
            }
        );
    }

    #[test]
    fn test_star_over_any_source_is_open() {
        let select = Select::star().from(FromSource::scan(
            FromItem::new(Expr::id("anything")).alias("a"),
        ));
        assert_eq!(
            infer(select).unwrap().result_type,
            StaticType::bag(StaticType::open_struct())
        );
    }

    #[test]
    fn test_duplicate_alias_in_select_list() {
        let select = Select::items(vec![
            ProjectItem::aliased(Expr::int(1), "x"),
            ProjectItem::aliased(Expr::int(2), "X"),
        ]);
        let output = infer(select).unwrap();
        assert_eq!(
            output.problems[0].detail,
            ProblemDetail::DuplicateAliasInSelectList {
                alias: "X".to_string()
            }
        );
    }

    #[test]
    fn test_grouped_query() {
        let key = GroupKey::aliased(Expr::dot(Expr::id("p"), "name"), "name");
        let mut meta = NodeMeta::new();
        meta.set_unique_name(key.id, group_key_unique_name(0, 0));

        let count = Expr::agg("count", SetQuantifier::All, None);
        let sum = Expr::agg("sum", SetQuantifier::All, Some(Expr::dot(Expr::id("p"), "age")));
        let mut registry = AggregateRegistry::new();
        registry.register("count", count.id);
        registry.register("sum", sum.id);

        let select = Select::items(vec![
            ProjectItem::aliased(
                Expr::group_key_ref(group_key_unique_name(0, 0), Identifier::new("name")),
                "name",
            ),
            ProjectItem::aliased(count, "c"),
            ProjectItem::aliased(sum, "total"),
        ])
        .from(people())
        .group_by(GroupBy::new(vec![key]).group_as("g"))
        .having(Expr::binary(
            Expr::agg("count", SetQuantifier::All, None),
            BinaryOp::Gt,
            Expr::int(1),
        ));
        let query = Expr::select(select);
        meta.set_aggregates(query.id, registry);

        let output = infer_with(&meta, Statement::query(query)).unwrap();
        assert_eq!(
            output.result_type,
            StaticType::bag(StaticType::closed_struct([
                ("name", StaticType::string()),
                ("c", StaticType::int8()),
                ("total", StaticType::int4().as_nullable()),
            ]))
        );
        assert!(output.problems.is_empty());
    }

    #[test]
    fn test_from_binding_is_hidden_after_grouping() {
        let select = Select::value(Expr::id("p"))
            .from(people())
            .group_by(GroupBy::new(vec![GroupKey::aliased(
                Expr::dot(Expr::id("p"), "age"),
                "age",
            )]));
        assert!(matches!(
            infer(select),
            Err(SemanticError::UnboundBinding { name, .. }) if name == "p"
        ));
    }

    #[test]
    fn test_limit_must_be_integer() {
        let select = Select::value(Expr::int(1)).limit(Expr::string("ten"));
        let output = infer(select).unwrap();
        assert_eq!(
            output.problems[0].detail,
            ProblemDetail::IncompatibleDataTypeForExpr {
                expected: StaticType::int(),
                actual: StaticType::string(),
            }
        );
    }

    #[test]
    fn test_dml_result_is_any() {
        let dml = DmlStatement::new(vec![DmlOp::Delete])
            .from(people())
            .with_where(Expr::binary(
                Expr::dot(Expr::id("p"), "age"),
                BinaryOp::Gt,
                Expr::int(30),
            ));
        let output = infer_with(&NodeMeta::new(), Statement::Dml(dml)).unwrap();
        assert_eq!(output.result_type, StaticType::Any);
        assert!(output.problems.is_empty());
    }
}
