//! End-to-end analysis tests

use pql::ast::{
    BinaryOp, DmlOp, DmlStatement, Expr, FromItem, FromSource, GroupBy, GroupKey, Identifier,
    ProjectItem,
    Projection, ScopeQualifier, Select, SetQuantifier, SortSpec, SourceLocation, Statement,
};
use pql::types::{FunctionSignature, ScopeConstraint, StructField};
use pql::{
    AnalysisStatus, ProblemDetail, SemanticError, SemanticOptions, StaticAnalyzer, StaticType,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn orders() -> StaticType {
    StaticType::bag(StaticType::closed_struct([
        ("region", StaticType::string()),
        ("total", StaticType::decimal()),
        ("qty", StaticType::int4()),
    ]))
}

fn analyzer() -> StaticAnalyzer {
    StaticAnalyzer::new(
        SemanticOptions::new()
            .with_global("orders", orders())
            .with_global("foo", StaticType::bag(StaticType::Any))
            .with_global("x", StaticType::string())
            .with_global("y", StaticType::int4()),
    )
}

fn query(select: Select) -> Statement {
    Statement::query(Expr::select(select))
}

fn projection(statement: &Statement) -> &Projection {
    &statement
        .as_query()
        .and_then(Expr::as_select)
        .unwrap()
        .projection
}

#[test]
fn test_select_star_expands_to_source_alias() {
    let select = Select::star().from(FromSource::scan(FromItem::new(Expr::id("foo")).alias("f")));
    let outcome = analyzer().analyze(query(select)).unwrap();
    assert_eq!(projection(&outcome.statement).to_string(), "\"f\".*");
    assert_eq!(outcome.status(), AnalysisStatus::Success);
}

#[test]
fn test_projected_name_resolves_to_local_alias() {
    let options = SemanticOptions::new().with_global(
        "a",
        StaticType::bag(StaticType::closed_struct([("v", StaticType::int4())])),
    );
    let projected = Expr::id("a");
    let projected_id = projected.id;
    let source = Expr::id("a");
    let source_id = source.id;
    let select = Select::items(vec![ProjectItem::expr(projected)])
        .from(FromSource::scan(FromItem::new(source)));

    let outcome = StaticAnalyzer::new(options).analyze(query(select)).unwrap();
    assert_eq!(outcome.statement.to_string(), "SELECT a AS a FROM a AS a");
    assert_eq!(
        outcome.annotations.qualifier_of(projected_id),
        Some(ScopeQualifier::LocalsFirst)
    );
    assert_eq!(
        outcome.annotations.qualifier_of(source_id),
        Some(ScopeQualifier::Unqualified)
    );
    assert_eq!(
        outcome.result_type,
        StaticType::bag(StaticType::closed_struct([(
            "a",
            StaticType::closed_struct([("v", StaticType::int4())]),
        )]))
    );
}

#[test]
fn test_mismatched_operands() {
    let expr = Expr::binary(
        Expr::id("x").with_location(SourceLocation::new(1, 1, 1)),
        BinaryOp::Add,
        Expr::id("y").with_location(SourceLocation::new(1, 5, 1)),
    )
    .with_location(SourceLocation::new(1, 3, 1));

    let outcome = analyzer().analyze(Statement::query(expr)).unwrap();
    assert_eq!(outcome.status(), AnalysisStatus::Failure);
    assert_eq!(outcome.problems.len(), 1);
    assert_eq!(outcome.problems[0].location, SourceLocation::new(1, 3, 1));
    assert!(matches!(
        outcome.problems[0].detail,
        ProblemDetail::DataTypeMismatch { .. }
    ));
    assert_eq!(outcome.result_type, StaticType::all_numeric());
}

#[test]
fn test_case_without_else() {
    let expr = Expr::searched_case(
        vec![
            (Expr::boolean(true), Expr::string("a")),
            (Expr::boolean(false), Expr::boolean(false)),
        ],
        None,
    );
    let outcome = analyzer().analyze(Statement::query(expr)).unwrap();
    assert_eq!(
        outcome.result_type,
        StaticType::union_of([StaticType::string(), StaticType::bool(), StaticType::Null])
    );
}

#[test]
fn test_grouped_star_projects_keys() {
    let select = Select::star()
        .from(FromSource::scan(FromItem::new(Expr::id("orders")).alias("o")))
        .group_by(GroupBy::new(vec![
            GroupKey::new(Expr::dot(Expr::id("o"), "region")),
            GroupKey::aliased(Expr::dot(Expr::id("o"), "qty"), "q"),
        ]));
    let outcome = analyzer().analyze(query(select)).unwrap();
    assert_eq!(
        projection(&outcome.statement).to_string(),
        "\"$__partiql__group_by_0_item_0\" AS region, \"$__partiql__group_by_0_item_1\" AS q"
    );
    assert_eq!(
        outcome.result_type,
        StaticType::bag(StaticType::closed_struct([
            ("region", StaticType::string()),
            ("q", StaticType::int4()),
        ]))
    );
}

#[test]
fn test_open_source_gives_open_rows() {
    let select = Select::items(vec![ProjectItem::expr(Expr::dot(Expr::id("f"), "a"))])
        .from(FromSource::scan(FromItem::new(Expr::id("foo")).alias("f")));
    let outcome = analyzer().analyze(query(select)).unwrap();
    assert_eq!(
        outcome.result_type,
        StaticType::bag(StaticType::structure(
            vec![StructField::new("a", StaticType::Any)],
            false
        ))
    );
}

#[test]
fn test_grouped_aggregate_query() {
    let select = Select::items(vec![
        ProjectItem::expr(Expr::id("region")),
        ProjectItem::aliased(
            Expr::agg("sum", SetQuantifier::All, Some(Expr::dot(Expr::id("o"), "total"))),
            "total",
        ),
        ProjectItem::expr(Expr::agg("count", SetQuantifier::All, None)),
    ])
    .from(FromSource::scan(FromItem::new(Expr::id("orders")).alias("o")))
    .group_by(GroupBy::new(vec![GroupKey::new(Expr::dot(Expr::id("o"), "region"))]))
    .having(Expr::binary(
        Expr::agg("max", SetQuantifier::All, Some(Expr::dot(Expr::id("o"), "qty"))),
        BinaryOp::Gt,
        Expr::int(1),
    ))
    .order_by(SortSpec::new(Expr::id("total")).desc());
    let root = Expr::select(select);
    let root_id = root.id;

    let outcome = analyzer().analyze(Statement::query(root)).unwrap();
    assert_eq!(outcome.problems, vec![]);
    assert_eq!(
        outcome.meta.aggregates(root_id).unwrap().summary(),
        vec![
            ("max".to_string(), 0),
            ("sum".to_string(), 1),
            ("count".to_string(), 2),
        ]
    );
    assert_eq!(
        outcome.result_type,
        StaticType::list(StaticType::closed_struct([
            ("region", StaticType::string()),
            ("total", StaticType::decimal().as_nullable()),
            ("_3", StaticType::int8()),
        ]))
    );
}

#[test]
fn test_from_binding_is_gone_after_grouping() {
    let select = Select::value(Expr::dot(Expr::id("o"), "qty"))
        .from(FromSource::scan(FromItem::new(Expr::id("orders")).alias("o")))
        .group_by(GroupBy::new(vec![GroupKey::new(Expr::dot(Expr::id("o"), "region"))]));
    let err = analyzer().analyze(query(select)).unwrap_err();
    assert!(matches!(err, SemanticError::UnboundBinding { name, .. } if name == "o"));
}

#[test]
fn test_grouped_aggregates_outside_select_list() {
    let sum_qty = || Expr::agg("sum", SetQuantifier::All, Some(Expr::dot(Expr::id("o"), "qty")));
    let select = Select::value(sum_qty())
        .from(FromSource::scan(FromItem::new(Expr::id("orders")).alias("o")))
        .group_by(GroupBy::new(vec![GroupKey::new(Expr::dot(Expr::id("o"), "region"))]))
        .order_by(SortSpec::new(sum_qty()));
    let outcome = analyzer().analyze(query(select)).unwrap();
    assert_eq!(outcome.problems, vec![]);
    assert_eq!(
        outcome.result_type,
        StaticType::list(StaticType::int4().as_nullable())
    );
}

#[test]
fn test_quoted_names_keep_their_case() {
    let select = Select::items(vec![
        ProjectItem::aliased(Expr::quoted_id("a"), Identifier::quoted("a")),
        ProjectItem::aliased(Expr::quoted_id("A"), Identifier::quoted("A")),
    ])
    .from(FromSource::comma(
        FromSource::scan(FromItem::new(Expr::id("y")).alias(Identifier::quoted("a"))),
        FromSource::scan(FromItem::new(Expr::id("x")).alias(Identifier::quoted("A"))),
    ));
    let outcome = analyzer().analyze(query(select)).unwrap();
    assert_eq!(outcome.problems, vec![]);
    assert_eq!(
        outcome.result_type,
        StaticType::bag(StaticType::closed_struct([
            ("a", StaticType::int4()),
            ("A", StaticType::string()),
        ]))
    );
}

#[rstest]
#[case(ScopeConstraint::PreventGlobalsExceptInFrom)]
#[case(ScopeConstraint::PreventGlobalsInNestedQueries)]
fn test_global_access_constraints(#[case] constraint: ScopeConstraint) {
    let options = SemanticOptions::new()
        .with_global("orders", orders())
        .with_global("limit_value", StaticType::int4())
        .with_constraint(constraint);
    let nested = Select::value(Expr::id("limit_value"));
    let select = Select::value(Expr::select(nested))
        .from(FromSource::scan(FromItem::new(Expr::id("orders")).alias("o")));

    let err = StaticAnalyzer::new(options).analyze(query(select)).unwrap_err();
    assert!(matches!(
        err,
        SemanticError::IllegalGlobalVariableAccess { name, .. } if name == "limit_value"
    ));
}

#[test]
fn test_structural_violation_is_fatal() {
    let select = Select::value(Expr::int(1))
        .from(FromSource::scan(FromItem::new(Expr::id("orders"))))
        .having(Expr::boolean(true));
    let err = analyzer().analyze(query(select)).unwrap_err();
    assert!(matches!(err, SemanticError::HavingWithoutGroupBy { .. }));
}

#[test]
fn test_custom_function() {
    let analyzer = StaticAnalyzer::new(
        SemanticOptions::new()
            .with_global("x", StaticType::string())
            .with_function(
                FunctionSignature::new("shout", StaticType::string()).required(StaticType::string()),
            ),
    );
    let outcome = analyzer
        .analyze(Statement::query(Expr::call("SHOUT", vec![Expr::id("x")])))
        .unwrap();
    assert_eq!(outcome.result_type, StaticType::string());
    assert!(outcome.status().is_success());
}

#[test]
fn test_dml_statement() {
    let dml = DmlStatement::new(vec![DmlOp::Remove(Expr::dot(Expr::id("orders"), "qty"))])
        .from(FromSource::scan(FromItem::new(Expr::id("orders"))))
        .with_where(Expr::binary(
            Expr::dot(Expr::id("orders"), "qty"),
            BinaryOp::Lt,
            Expr::int(0),
        ));
    let outcome = analyzer().analyze(Statement::Dml(dml)).unwrap();
    assert_eq!(
        outcome.statement.to_string(),
        "FROM orders AS orders WHERE orders.qty < 0 REMOVE orders.qty"
    );
    assert_eq!(outcome.result_type, StaticType::Any);
    assert!(outcome.problems.is_empty());
}

#[test]
fn test_diagnostics_rendering() {
    let arg = Expr::int(1).with_location(SourceLocation::new(2, 13, 1));
    let expr = Expr::call("upper", vec![arg]).with_location(SourceLocation::new(2, 7, 8));
    let outcome = analyzer().analyze(Statement::query(expr)).unwrap();
    let rendered: Vec<String> = outcome
        .diagnostics()
        .iter()
        .map(ToString::to_string)
        .collect();
    insta::assert_snapshot!(rendered.join("\n"), @"error: PQL0203 - invalid argument type for upper: expected string, found int4 at 2:13");
}
