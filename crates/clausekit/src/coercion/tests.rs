use super::*;
use crate::diagnostics::{DiagnosticKind, ImplicitPolicy};
use crate::node::{
    ExprOps, ListOp, SelectableOps, bindparam, column, column_typed, lambda, select, table, text,
};
use crate::value::BindValue;

fn users() -> NodeRef {
    table(
        "users",
        &[("id", SqlType::Integer), ("name", SqlType::String)],
    )
}

fn addresses() -> NodeRef {
    table(
        "addresses",
        &[("id", SqlType::Integer), ("user_id", SqlType::Integer)],
    )
}

fn coerce(role: Role, input: impl Into<Input>) -> ClauseResult<Coercion> {
    expect(role, input, &CoercionArgs::new())
}

fn bind_of(node: &NodeRef) -> &crate::node::BindParam {
    match node.kind() {
        NodeKind::BindParam(b) => b,
        other => panic!("expected a bind parameter, got {other:?}"),
    }
}

fn argument_message(err: ClauseError) -> String {
    err.as_argument()
        .map(|a| a.message().to_string())
        .unwrap_or_else(|| panic!("expected an argument error, got {err:?}"))
}

struct Handle(NodeRef);

impl AsClauseElement for Handle {
    fn clause_element(&self) -> Input {
        Input::Node(Arc::clone(&self.0))
    }
}

struct Endless;

impl AsClauseElement for Endless {
    fn clause_element(&self) -> Input {
        Input::element(Endless)
    }
}

struct Entity(Option<NodeRef>);

impl Inspectable for Entity {
    fn inspect(&self) -> Option<Inspection> {
        Some(self.0.clone().map_or_else(Inspection::opaque, Inspection::new))
    }

    fn repr(&self) -> String {
        "<Entity>".to_string()
    }
}

#[test]
fn satisfying_node_is_returned_as_is() {
    let users = users();
    let id = users.c("id").unwrap();
    let stmt = select([Arc::clone(&id)]).unwrap().build();

    let cases = [
        (Role::ExpressionElement, &id),
        (Role::BinaryElement, &id),
        (Role::OnClause, &id),
        (Role::WhereHaving, &id),
        (Role::StatementOption, &id),
        (Role::ByOf, &id),
        (Role::OrderBy, &id),
        (Role::GroupBy, &id),
        (Role::ColumnArgument, &id),
        (Role::ColumnArgumentOrKey, &id),
        (Role::DmlColumn, &id),
        (Role::LimitOffset, &id),
        (Role::StrAsPlainColumn, &id),
        (Role::LabeledColumnExpr, &id),
        (Role::ColumnsClause, &id),
        (Role::FromClause, &users),
        (Role::JoinTarget, &users),
        (Role::StrictFromClause, &users),
        (Role::DmlTable, &users),
        (Role::ReturnsRows, &users),
        (Role::SelectStatement, &stmt),
        (Role::Statement, &stmt),
        (Role::DmlSelect, &stmt),
        (Role::CompoundElement, &stmt),
    ];
    for (role, input) in cases {
        let out = coerce(role, input).unwrap();
        let node = out.value.node().unwrap_or_else(|| panic!("{role}: no node"));
        assert!(Arc::ptr_eq(node, input), "{role} rebuilt its input");
        assert!(out.diagnostics.is_empty(), "{role} raised a diagnostic");
    }
}

#[test]
fn literals_round_trip_through_unique_binds() {
    let when = chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(12, 30, 0)
        .unwrap();
    let id = uuid::Uuid::from_u128(0x1234);
    let shapes = [
        (Input::from(5), BindValue::Int(5), SqlType::Integer),
        (Input::from(2.5), BindValue::Float(2.5), SqlType::Float),
        (Input::from("x"), BindValue::from("x"), SqlType::String),
        (Input::from(true), BindValue::Bool(true), SqlType::Boolean),
        (Input::from(when), BindValue::Timestamp(when), SqlType::DateTime),
        (Input::from(id), BindValue::Uuid(id), SqlType::Uuid),
    ];
    let roles = [
        (Role::ExpressionElement, CoercionArgs::new()),
        (
            Role::BinaryElement,
            CoercionArgs::new().expr(column("x")).operator(BinaryOp::Eq),
        ),
        (Role::LiteralValue, CoercionArgs::new()),
    ];

    for (role, args) in &roles {
        for (input, value, type_) in &shapes {
            let out = expect(*role, input.clone(), args).unwrap();
            let node = out.value.into_node().unwrap();
            let bind = bind_of(&node);
            assert_eq!(&bind.value, value, "{role} {input:?}");
            assert!(bind.unique, "{role} {input:?}");
            assert_eq!(node.sql_type(), *type_, "{role} {input:?}");
        }
    }
}

#[test]
fn literal_value_wraps_plain_values_only() {
    let node = crate::node::literal(5).unwrap();
    let bind = bind_of(&node);
    assert_eq!(bind.value, BindValue::Int(5));
    assert!(bind.key.is_none());
    assert!(bind.unique);

    let typed = expect(
        Role::LiteralValue,
        "2024",
        &CoercionArgs::new().type_(SqlType::Integer),
    )
    .unwrap()
    .value
    .into_node()
    .unwrap();
    assert_eq!(typed.sql_type(), SqlType::Integer);

    let users = users();
    let err = coerce(Role::LiteralValue, users.c("id").unwrap()).unwrap_err();
    assert!(argument_message(err).starts_with("Literal value expected, got "));
}

#[test]
fn argument_error_displays_its_message() {
    let err = coerce(Role::LiteralValue, table("t", &[])).unwrap_err();
    let argument = err.as_argument().unwrap();
    let source: &dyn std::error::Error = argument;
    assert_eq!(source.to_string(), argument.message());
    assert_eq!(err.to_string(), argument.message());
}

#[test]
fn scalar_becomes_unique_bind() {
    let out = expect(
        Role::ExpressionElement,
        5,
        &CoercionArgs::new().type_(SqlType::Integer),
    )
    .unwrap();
    let node = out.value.into_node().unwrap();
    let bind = bind_of(&node);
    assert_eq!(bind.value, BindValue::Int(5));
    assert!(bind.unique);
    assert_eq!(node.sql_type(), SqlType::Integer);
}

#[test]
fn none_becomes_null_for_expressions() {
    let out = coerce(Role::ExpressionElement, ()).unwrap();
    assert!(matches!(out.value.node().unwrap().kind(), NodeKind::Null));
}

#[test]
fn binary_bind_is_keyed_and_typed_by_left_side() {
    let age = column_typed("age", SqlType::Integer);
    let args = CoercionArgs::new()
        .expr(Arc::clone(&age))
        .operator(BinaryOp::Eq);
    let node = expect(Role::BinaryElement, "x", &args)
        .unwrap()
        .value
        .into_node()
        .unwrap();
    assert_eq!(bind_of(&node).key.as_deref(), Some("age"));
    assert_eq!(node.sql_type(), SqlType::String);

    // An untyped bind takes the left side's type.
    let untyped = bindparam("p", BindValue::Null);
    let node = expect(Role::BinaryElement, &untyped, &args)
        .unwrap()
        .value
        .into_node()
        .unwrap();
    assert_eq!(node.sql_type(), SqlType::Integer);
    assert!(!Arc::ptr_eq(&node, &untyped));
}

#[test]
fn select_as_column_expression_is_deprecated_scalar_subquery() {
    let users = users();
    let stmt = select([users.c("id").unwrap()]).unwrap().build();

    let out = coerce(Role::ExpressionElement, &stmt).unwrap();
    let node = out.value.into_node().unwrap();
    match node.kind() {
        NodeKind::ScalarSubquery(inner) => assert!(Arc::ptr_eq(inner, &stmt)),
        other => panic!("expected a scalar subquery, got {other:?}"),
    }
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].kind, DiagnosticKind::Deprecated);

    let explicit = stmt.scalar_subquery().unwrap();
    let out = coerce(Role::ExpressionElement, &explicit).unwrap();
    assert!(out.diagnostics.is_empty());
}

#[test]
fn policy_controls_implicit_coercions() {
    let stmt = select([users().c("id").unwrap()]).unwrap().build();

    let err = expect(
        Role::ExpressionElement,
        &stmt,
        &CoercionArgs::new().policy(ImplicitPolicy::Error),
    )
    .unwrap_err();
    assert!(matches!(err, ClauseError::Deprecated(_)));

    let out = expect(
        Role::ExpressionElement,
        &stmt,
        &CoercionArgs::new().policy(ImplicitPolicy::Silent),
    )
    .unwrap();
    assert!(out.diagnostics.is_empty());
    assert!(out.value.node().is_some());
}

#[test]
fn mapping_is_rejected_with_role_and_value() {
    let value = Input::from(serde_json::json!({"a": 1}));
    let err = coerce(Role::WhereHaving, value).unwrap_err();
    let message = argument_message(err);
    assert!(message.contains("SQL expression for WHERE/HAVING role"));
    assert!(message.contains("{'a': 1}"));
}

#[test]
fn raw_string_in_where_asks_for_text() {
    let err = expect(
        Role::WhereHaving,
        "id = 1",
        &CoercionArgs::new().argname("whereclause"),
    )
    .unwrap_err();
    assert_eq!(
        argument_message(err),
        "Textual SQL expression 'id = 1' for argument whereclause should be explicitly \
         declared as text('id = 1')"
    );
}

#[test]
fn columns_clause_string_suggests_column_or_literal_column() {
    let err = coerce(Role::ColumnsClause, "name").unwrap_err();
    assert!(argument_message(err).contains("or use column('name')"));

    let err = coerce(Role::ColumnsClause, "count(*) AS n").unwrap_err();
    assert!(argument_message(err).contains("or use literal_column("));
}

#[test]
fn columns_clause_literals() {
    let star = coerce(Role::ColumnsClause, "*").unwrap().value.into_node().unwrap();
    match star.kind() {
        NodeKind::Column(c) => {
            assert_eq!(c.name, "*");
            assert!(c.is_literal);
        }
        other => panic!("expected a literal column, got {other:?}"),
    }

    let one = coerce(Role::ColumnsClause, 1).unwrap().value.into_node().unwrap();
    assert!(matches!(one.kind(), NodeKind::Column(c) if c.name == "1" && c.is_literal));
}

#[test]
fn select_in_from_clause() {
    let stmt = select([users().c("id").unwrap()]).unwrap().build();

    let out = coerce(Role::FromClause, &stmt).unwrap();
    assert!(matches!(
        out.value.node().unwrap().kind(),
        NodeKind::Subquery { name: None, .. }
    ));
    assert_eq!(out.diagnostics.len(), 1);
    assert!(out.diagnostics[0].is_deprecation());

    let out = expect(
        Role::FromClause,
        &stmt,
        &CoercionArgs::new().explicit_subquery(true),
    )
    .unwrap();
    assert!(out.diagnostics.is_empty());

    let err = coerce(Role::StrictFromClause, &stmt).unwrap_err();
    let argument = err.as_argument().unwrap();
    assert_eq!(argument.code, Some("89ve"));
    assert_eq!(
        argument.advice.as_deref(),
        Some("To create a FROM clause from a Select object, use the .subquery() method.")
    );
}

#[test]
fn in_list_of_literals_is_one_expanding_bind() {
    let id = users().c("id").unwrap();
    let args = CoercionArgs::new()
        .expr(Arc::clone(&id))
        .operator(BinaryOp::In);
    let node = expect(Role::InElement, vec![1, 2, 3], &args)
        .unwrap()
        .value
        .into_node()
        .unwrap();
    let bind = bind_of(&node);
    assert!(bind.expanding);
    assert_eq!(bind.value.expand().len(), 3);
    assert_eq!(node.sql_type(), SqlType::Integer);
}

#[test]
fn in_list_with_none_is_grouped_clause_list() {
    let id = users().c("id").unwrap();
    let args = CoercionArgs::new()
        .expr(Arc::clone(&id))
        .operator(BinaryOp::In);
    let items = Input::List(vec![Input::Int(1), Input::None]);
    let node = expect(Role::InElement, items, &args)
        .unwrap()
        .value
        .into_node()
        .unwrap();
    let NodeKind::Grouping(list) = node.kind() else {
        panic!("expected a grouping, got {node:?}");
    };
    let NodeKind::ClauseList { clauses, .. } = list.kind() else {
        panic!("expected a clause list, got {list:?}");
    };
    assert!(matches!(clauses[0].kind(), NodeKind::BindParam(_)));
    assert!(matches!(clauses[1].kind(), NodeKind::Null));
}

#[test]
fn in_scalar_is_rejected() {
    let err = coerce(Role::InElement, 5).unwrap_err();
    assert!(err.is_argument());
}

#[test]
fn table_in_in_is_implicit_select() {
    let users = users();
    let out = coerce(Role::InElement, &users).unwrap();
    assert!(matches!(
        out.value.node().unwrap().kind(),
        NodeKind::ScalarSubquery(_)
    ));
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].kind, DiagnosticKind::ImplicitCoercion);
    assert!(out.diagnostics[0].message.starts_with("Coercing Table object"));
}

#[test]
fn clause_element_chain_is_followed() {
    let name = column("name");
    let nested = Input::element(Handle(Arc::clone(&name)));
    let out = coerce(Role::ExpressionElement, nested).unwrap();
    assert!(Arc::ptr_eq(out.value.node().unwrap(), &name));
}

#[test]
fn endless_clause_element_chain_is_a_construction_error() {
    let err = coerce(Role::ExpressionElement, Input::element(Endless)).unwrap_err();
    assert!(err.is_construction());
}

#[test]
fn inspection_fallback() {
    let users = users();
    let out = coerce(Role::FromClause, Input::mapped(Entity(Some(Arc::clone(&users))))).unwrap();
    assert!(Arc::ptr_eq(out.value.node().unwrap(), &users));

    let err = coerce(Role::FromClause, Input::mapped(Entity(None))).unwrap_err();
    assert!(argument_message(err).contains("got <Entity>."));

    // Roles without inspection treat the handle as an unknown literal.
    let err = coerce(Role::WhereHaving, Input::mapped(Entity(Some(users)))).unwrap_err();
    assert!(err.is_argument());
}

#[test]
fn limit_offset_values() {
    let out = coerce(Role::LimitOffset, ()).unwrap();
    assert!(out.value.is_empty());

    let node = coerce(Role::LimitOffset, "10").unwrap().value.into_node().unwrap();
    assert_eq!(bind_of(&node).value, BindValue::Int(10));
    assert_eq!(node.sql_type(), SqlType::Integer);

    assert!(coerce(Role::LimitOffset, "ten").unwrap_err().is_argument());
}

#[test]
fn limit_offset_floats_must_fit_an_integer() {
    let node = coerce(Role::LimitOffset, 25.0).unwrap().value.into_node().unwrap();
    assert_eq!(bind_of(&node).value, BindValue::Int(25));

    for rejected in [2.5, 1e19, -1e19, f64::INFINITY, f64::NAN] {
        let err = coerce(Role::LimitOffset, rejected).unwrap_err();
        assert!(err.is_argument(), "{rejected} was accepted");
    }
}

#[test]
fn dml_column_resolves_to_key() {
    let users = users();
    let out = expect_as_key(Role::DmlColumn, users.c("name").unwrap(), &CoercionArgs::new()).unwrap();
    assert_eq!(out.value.key(), Some("name"));

    let out = expect_as_key(Role::DmlColumn, "name", &CoercionArgs::new()).unwrap();
    assert_eq!(out.value.key(), Some("name"));

    assert!(expect_as_key(Role::DmlColumn, 5, &CoercionArgs::new()).is_err());
}

#[test]
fn truncated_label_only_takes_strings() {
    let out = coerce(Role::TruncatedLabel, "total").unwrap();
    assert_eq!(out.value.key(), Some("total"));

    let err = coerce(Role::TruncatedLabel, column("x")).unwrap_err();
    assert!(err.is_argument());
}

#[test]
fn flat_anonymized_join_adapts_on_clause() {
    let users = users();
    let addresses = addresses();
    let on = users
        .c("id")
        .unwrap()
        .eq(addresses.c("user_id").unwrap())
        .unwrap();
    let join = users.join(&addresses, on).unwrap();

    let node = expect(
        Role::AnonymizedFromClause,
        &join,
        &CoercionArgs::new().flat(true),
    )
    .unwrap()
    .value
    .into_node()
    .unwrap();

    let NodeKind::Join(j) = node.kind() else {
        panic!("expected a join, got {node:?}");
    };
    assert!(matches!(j.left.kind(), NodeKind::Alias { name: None, .. }));
    assert!(matches!(j.right.kind(), NodeKind::Alias { name: None, .. }));
    let NodeKind::Binary { left, right, .. } = j.on.kind() else {
        panic!("expected a comparison, got {:?}", j.on);
    };
    let table_of = |n: &NodeRef| match n.kind() {
        NodeKind::Column(c) => c.table.clone().unwrap(),
        other => panic!("expected a column, got {other:?}"),
    };
    assert!(Arc::ptr_eq(&table_of(left), &j.left));
    assert!(Arc::ptr_eq(&table_of(right), &j.right));
}

#[test]
fn non_flat_anonymized_join_is_wrapped() {
    let users = users();
    let addresses = addresses();
    let on = users
        .c("id")
        .unwrap()
        .eq(addresses.c("user_id").unwrap())
        .unwrap();
    let join = users.join(&addresses, on).unwrap();
    let node = coerce(Role::AnonymizedFromClause, &join)
        .unwrap()
        .value
        .into_node()
        .unwrap();
    assert!(matches!(node.kind(), NodeKind::Subquery { name: None, .. }));
}

#[test]
fn order_by_label_becomes_label_reference() {
    let total = column("total").label("t").unwrap();
    let node = coerce(Role::OrderBy, &total).unwrap().value.into_node().unwrap();
    assert!(matches!(node.kind(), NodeKind::LabelReference(inner) if Arc::ptr_eq(inner, &total)));

    let desc = total.desc();
    let node = coerce(Role::OrderBy, &desc).unwrap().value.into_node().unwrap();
    assert!(matches!(node.kind(), NodeKind::LabelReference(_)));

    let node = coerce(Role::OrderBy, "t").unwrap().value.into_node().unwrap();
    assert!(matches!(node.kind(), NodeKind::TextualLabelReference(name) if name == "t"));
}

#[test]
fn group_by_table_expands_to_its_columns() {
    let users = users();
    let node = coerce(Role::GroupBy, &users).unwrap().value.into_node().unwrap();
    match node.kind() {
        NodeKind::ClauseList { op, clauses } => {
            assert_eq!(*op, ListOp::Comma);
            assert_eq!(clauses.len(), 2);
        }
        other => panic!("expected a clause list, got {other:?}"),
    }
}

#[test]
fn text_as_select_statement() {
    let node = coerce(Role::SelectStatement, text("SELECT 1"))
        .unwrap()
        .value
        .into_node()
        .unwrap();
    assert!(matches!(node.kind(), NodeKind::TextualSelect { .. }));

    let err = coerce(Role::SelectStatement, "SELECT 1").unwrap_err();
    assert!(argument_message(err).contains("should be explicitly declared as text('SELECT 1')"));
}

#[test]
fn plain_string_statement_is_deprecated_text() {
    let out = coerce(Role::Statement, "SELECT 1").unwrap();
    assert!(out.value.node().unwrap().is_text());
    assert_eq!(out.diagnostics.len(), 1);
}

#[test]
fn lambdas_are_deferred_only_where_allowed() {
    let id = users().c("id").unwrap();
    let deferred = lambda(move |scope| Ok(Input::from(id.eq(scope.value("x"))?)));

    let node = coerce(Role::WhereHaving, deferred.clone())
        .unwrap()
        .value
        .into_node()
        .unwrap();
    assert!(node.is_deferred());

    let err = coerce(Role::ExpressionElement, deferred).unwrap_err();
    assert!(argument_message(err).contains("got <lambda>."));
}

#[test]
fn compound_element_advice() {
    let users = users();
    let err = coerce(Role::CompoundElement, &users).unwrap_err();
    assert_eq!(
        err.as_argument().unwrap().advice.as_deref(),
        Some("To SELECT from any FROM clause, use the .select() method.")
    );

    let sub = select([&users]).unwrap().build().subquery().unwrap();
    let err = coerce(Role::CompoundElement, &sub).unwrap_err();
    assert_eq!(
        err.as_argument().unwrap().advice.as_deref(),
        Some("Use the plain select() object without calling .subquery() or .alias().")
    );
}

#[test]
fn expression_from_table_suggests_table_valued() {
    let err = coerce(Role::ExpressionElement, users()).unwrap_err();
    assert!(argument_message(err).ends_with("use the .table_valued() method."));
}

#[test]
fn const_expr_accepts_only_constants() {
    assert!(matches!(
        coerce(Role::ConstExpr, true).unwrap().value.node().unwrap().kind(),
        NodeKind::True
    ));
    assert!(coerce(Role::ConstExpr, 1).unwrap_err().is_argument());
}

#[test]
fn dml_select_from_table_selects_everything() {
    let users = users();
    let node = coerce(Role::DmlSelect, &users).unwrap().value.into_node().unwrap();
    assert!(matches!(node.kind(), NodeKind::Select(_)));
}

#[test]
fn legacy_join_target_string() {
    let args = CoercionArgs::new().legacy(true);
    let out = expect(Role::JoinTarget, "addresses", &args).unwrap();
    assert_eq!(out.value.key(), Some("addresses"));
    assert_eq!(out.diagnostics.len(), 1);

    assert!(coerce(Role::JoinTarget, "addresses").is_err());
}

#[test]
fn registry_covers_every_role() {
    for role in Role::ALL {
        assert_eq!(role_impl(role).role(), role);
    }
}

#[test]
fn column_collection_finds_keys_and_columns() {
    let users = users();
    let lower = crate::node::func("lower", [users.c("name").unwrap()]).unwrap();
    let inputs: Vec<Input> = vec!["email".into(), users.c("id").unwrap().into(), lower.into()];

    let entries =
        expect_col_expression_collection(Role::DdlConstraintColumn, inputs, &CoercionArgs::new())
            .unwrap();
    let names: Vec<Option<String>> = entries
        .iter()
        .map(|entry| match entry.element() {
            Some(Coerced::Key(key)) => Some(key),
            Some(Coerced::Node(node)) => match node.kind() {
                NodeKind::Column(c) => Some(c.name.clone()),
                other => panic!("expected a column, got {other:?}"),
            },
            _ => None,
        })
        .collect();
    assert_eq!(
        names,
        vec![
            Some("email".to_string()),
            Some("id".to_string()),
            Some("name".to_string())
        ]
    );
    assert_eq!(entries[0].key.as_deref(), Some("email"));
    assert!(entries[0].column.is_none());

    let err = expect_col_expression_collection(Role::DdlConstraintColumn, [5], &CoercionArgs::new())
        .unwrap_err();
    assert!(err.is_argument());
}
