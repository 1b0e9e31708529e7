use super::*;

fn users() -> NodeRef {
    table(
        "users",
        &[
            ("id", SqlType::Integer),
            ("name", SqlType::String),
            ("age", SqlType::Integer),
        ],
    )
}

fn orders() -> NodeRef {
    table(
        "orders",
        &[("id", SqlType::Integer), ("user_id", SqlType::Integer)],
    )
}

#[test]
fn columns_are_bound_to_their_table() {
    let users = users();
    let id = users.c("id").unwrap();
    match id.kind() {
        NodeKind::Column(c) => {
            assert_eq!(c.name, "id");
            assert!(Arc::ptr_eq(c.table.as_ref().unwrap(), &users));
        }
        other => panic!("expected a column, got {other:?}"),
    }
    assert_eq!(id.sql_type(), SqlType::Integer);
    assert_eq!(users.columns().len(), 3);
}

#[test]
fn unknown_column_is_a_construction_error() {
    let err = users().c("missing").unwrap_err();
    assert!(err.is_construction());

    let open = table("anything", &[]);
    assert!(open.c("whatever").is_ok());
}

#[test]
fn comparison_with_none_becomes_is_null() {
    let name = users().c("name").unwrap();
    let cond = name.eq(()).unwrap();
    assert!(matches!(
        cond.kind(),
        NodeKind::Binary { op: BinaryOp::Is, right, .. } if matches!(right.kind(), NodeKind::Null)
    ));

    let cond = name.ne(()).unwrap();
    assert!(matches!(cond.kind(), NodeKind::Binary { op: BinaryOp::IsNot, .. }));

    assert!(name.lt(()).unwrap_err().is_construction());
}

#[test]
fn not_flips_comparisons() {
    let age = users().c("age").unwrap();
    let negated = not_(age.gt(18).unwrap()).unwrap();
    assert!(matches!(negated.kind(), NodeKind::Binary { op: BinaryOp::Le, .. }));

    let negated = not_(func("is_admin", [age]).unwrap()).unwrap();
    assert!(matches!(negated.kind(), NodeKind::Unary { op: UnaryOp::Not, .. }));
}

#[test]
fn and_flattens_nested_conjunctions() {
    let users = users();
    let a = users.c("id").unwrap().gt(1).unwrap();
    let b = users.c("age").unwrap().lt(30).unwrap();
    let c = users.c("name").unwrap().like("a%").unwrap();
    let inner = and_([a, b]).unwrap();
    let outer = and_([inner, c]).unwrap();
    match outer.kind() {
        NodeKind::ClauseList { op, clauses } => {
            assert_eq!(*op, ListOp::And);
            assert_eq!(clauses.len(), 3);
        }
        other => panic!("expected a clause list, got {other:?}"),
    }

    assert!(and_(Vec::<NodeRef>::new()).unwrap_err().is_construction());
}

#[test]
fn or_rejects_plain_strings() {
    let err = or_(["id = 1"]).unwrap_err();
    assert!(err.is_argument());
}

#[test]
fn between_holds_both_bounds() {
    let age = users().c("age").unwrap();
    let range = age.between(18, 65).unwrap();
    let NodeKind::Binary { op, right, .. } = range.kind() else {
        panic!("expected a binary expression, got {range:?}");
    };
    assert_eq!(*op, BinaryOp::Between);
    assert!(matches!(
        right.kind(),
        NodeKind::ClauseList { op: ListOp::And, clauses } if clauses.len() == 2
    ));
}

#[test]
fn orderings_merge_modifiers() {
    let name = users().c("name").unwrap();
    let ordering = name.desc().nulls_last();
    match ordering.kind() {
        NodeKind::Ordering {
            element,
            descending,
            nulls,
        } => {
            assert!(Arc::ptr_eq(element, &name));
            assert!(*descending);
            assert_eq!(*nulls, Some(NullsOrder::Last));
        }
        other => panic!("expected an ordering, got {other:?}"),
    }
}

#[test]
fn function_types() {
    let users = users();
    let count = func("count", [users.c("id").unwrap()]).unwrap();
    assert_eq!(count.sql_type(), SqlType::Integer);
    let lower = func("lower", [users.c("name").unwrap()]).unwrap();
    assert_eq!(lower.sql_type(), SqlType::String);
}

#[test]
fn cast_needs_a_concrete_type() {
    let id = users().c("id").unwrap();
    assert!(cast(&id, SqlType::Null).unwrap_err().is_construction());
    assert_eq!(id.cast(SqlType::String).unwrap().sql_type(), SqlType::String);
}

#[test]
fn label_names_must_be_strings() {
    let id = users().c("id").unwrap();
    assert!(id.label(5).unwrap_err().is_argument());
    let labeled = id.label("user_id").unwrap();
    assert!(matches!(
        labeled.kind(),
        NodeKind::Label { name: Some(name), .. } if name == "user_id"
    ));
}

#[test]
fn repeated_filters_are_anded() {
    let users = users();
    let stmt = select([&users])
        .unwrap()
        .filter(users.c("id").unwrap().gt(1).unwrap())
        .unwrap()
        .filter(users.c("age").unwrap().lt(30).unwrap())
        .unwrap()
        .build();
    let NodeKind::Select(s) = stmt.kind() else {
        panic!("expected a select");
    };
    assert!(matches!(
        s.where_.as_ref().unwrap().kind(),
        NodeKind::ClauseList { op: ListOp::And, clauses } if clauses.len() == 2
    ));
}

#[test]
fn join_without_from_starts_at_first_column_table() {
    let users = users();
    let orders = orders();
    let on = users
        .c("id")
        .unwrap()
        .eq(orders.c("user_id").unwrap())
        .unwrap();
    let stmt = select([users.c("name").unwrap()])
        .unwrap()
        .join(&orders, on)
        .unwrap()
        .build();
    let NodeKind::Select(s) = stmt.kind() else {
        panic!("expected a select");
    };
    assert_eq!(s.froms.len(), 1);
    match s.froms[0].kind() {
        NodeKind::Join(j) => {
            assert!(Arc::ptr_eq(&j.left, &users));
            assert!(Arc::ptr_eq(&j.right, &orders));
            assert_eq!(j.kind, JoinKind::Inner);
        }
        other => panic!("expected a join, got {other:?}"),
    }
}

#[test]
fn join_with_nothing_to_join_from() {
    let err = select([literal_column("1")])
        .unwrap()
        .join(orders(), true_())
        .unwrap_err();
    assert!(err.is_construction());
}

#[test]
fn limit_none_clears_limit() {
    let users = users();
    let stmt = select([&users])
        .unwrap()
        .limit(10)
        .unwrap()
        .limit(())
        .unwrap()
        .offset(5)
        .unwrap()
        .build();
    let NodeKind::Select(s) = stmt.kind() else {
        panic!("expected a select");
    };
    assert!(s.limit.is_none());
    assert!(matches!(s.offset.as_ref().unwrap().kind(), NodeKind::BindParam(_)));
}

#[test]
fn builders_keep_coercion_diagnostics() {
    let users = users();
    let inner = select([users.c("id").unwrap()]).unwrap().build();
    let outer = select([literal_column("*")])
        .unwrap()
        .from(&inner)
        .unwrap()
        .build();
    assert_eq!(outer.diagnostics().len(), 1);
    assert!(outer.diagnostics()[0].is_deprecation());
    assert!(inner.diagnostics().is_empty());
}

#[test]
fn subquery_requires_a_select() {
    assert!(users().subquery().unwrap_err().is_construction());
    assert!(users().scalar_subquery().unwrap_err().is_construction());
    assert!(text("x").alias("t").unwrap_err().is_construction());
}

#[test]
fn aliasing_an_alias_replaces_the_name() {
    let users = users();
    let a = users.alias("a").unwrap();
    let b = a.alias("b").unwrap();
    match b.kind() {
        NodeKind::Alias { element, name } => {
            assert!(Arc::ptr_eq(element, &users));
            assert_eq!(name.as_deref(), Some("b"));
        }
        other => panic!("expected an alias, got {other:?}"),
    }
    assert_eq!(b.c("name").unwrap().sql_type(), SqlType::String);
}

#[test]
fn compound_selects() {
    let users = users();
    let a = select([users.c("id").unwrap()]).unwrap().build();
    let b = select([users.c("age").unwrap()]).unwrap().build();
    let u = union([&a, &b]).unwrap();
    assert!(u.is_select_statement());
    assert_eq!(u.exported_columns(), vec![("id".to_string(), SqlType::Integer)]);

    assert!(union(Vec::<NodeRef>::new()).unwrap_err().is_construction());
    assert!(union_all([&users]).unwrap_err().is_argument());
}

#[test]
fn exists_wraps_a_scalar_subquery() {
    let users = users();
    let stmt = select([users.c("id").unwrap()]).unwrap().build();
    let node = exists(&stmt).unwrap();
    match node.kind() {
        NodeKind::Unary {
            op: UnaryOp::Exists,
            operand,
        } => assert!(matches!(operand.kind(), NodeKind::ScalarSubquery(_))),
        other => panic!("expected EXISTS, got {other:?}"),
    }
}

#[test]
fn insert_values_take_the_column_type() {
    let users = users();
    let stmt = insert(&users)
        .unwrap()
        .value("name", "alice")
        .unwrap()
        .value(users.c("age").unwrap(), ())
        .unwrap()
        .build()
        .unwrap();
    let NodeKind::Insert(i) = stmt.kind() else {
        panic!("expected an insert");
    };
    assert_eq!(i.values.len(), 2);
    assert_eq!(i.values[0].0, "name");
    match i.values[0].1.kind() {
        NodeKind::BindParam(b) => {
            assert_eq!(b.key.as_deref(), Some("name"));
            assert!(b.crud);
        }
        other => panic!("expected a bind parameter, got {other:?}"),
    }
    assert!(matches!(i.values[1].1.kind(), NodeKind::Null));
}

#[test]
fn insert_rejects_unknown_columns_and_non_tables() {
    let users = users();
    let err = insert(&users).unwrap().value("nope", 1).unwrap_err();
    assert!(err.is_construction());

    let sub = select([&users]).unwrap().build().subquery().unwrap();
    assert!(insert(&sub).unwrap_err().is_argument());
}

#[test]
fn insert_from_select_excludes_values() {
    let users = users();
    let src = select([users.c("name").unwrap()]).unwrap().build();
    let err = insert(&users)
        .unwrap()
        .value("name", "x")
        .unwrap()
        .from_select(["name"], &src)
        .unwrap()
        .build()
        .unwrap_err();
    assert!(err.is_construction());
}

#[test]
fn update_set_twice_keeps_last_value() {
    let users = users();
    let stmt = update(&users)
        .unwrap()
        .set("age", 1)
        .unwrap()
        .set("age", 2)
        .unwrap()
        .filter(users.c("id").unwrap().eq(7).unwrap())
        .unwrap()
        .build();
    let NodeKind::Update(u) = stmt.kind() else {
        panic!("expected an update");
    };
    assert_eq!(u.values.len(), 1);
    match u.values[0].1.kind() {
        NodeKind::BindParam(b) => assert_eq!(b.value, BindValue::Int(2)),
        other => panic!("expected a bind parameter, got {other:?}"),
    }
    assert!(u.where_.is_some());
}

#[test]
fn rewrite_shares_untouched_and_repeated_subtrees() {
    let users = users();
    let id = users.c("id").unwrap();
    let tree = and_([id.gt(1).unwrap(), id.lt(10).unwrap()]).unwrap();

    let same = rewrite(&tree, &mut |_: &NodeRef| Ok(None)).unwrap();
    assert!(Arc::ptr_eq(&same, &tree));

    let replacement = column_typed("other", SqlType::Integer);
    let rewritten = rewrite(&tree, &mut |n: &NodeRef| {
        Ok(Arc::ptr_eq(n, &id).then(|| Arc::clone(&replacement)))
    })
    .unwrap();
    let NodeKind::ClauseList { clauses, .. } = rewritten.kind() else {
        panic!("expected a clause list");
    };
    for clause in clauses {
        let NodeKind::Binary { left, .. } = clause.kind() else {
            panic!("expected a comparison");
        };
        assert!(Arc::ptr_eq(left, &replacement));
    }
}

#[test]
fn deep_deannotate_strips_every_level() {
    let id = annotate(&users().c("id").unwrap(), "origin", "orm");
    let cond = annotate(&id.eq(1).unwrap(), "origin", "orm");
    let stripped = deep_deannotate(&cond).unwrap();
    assert!(stripped.annotations().is_empty());
    let NodeKind::Binary { left, .. } = stripped.kind() else {
        panic!("expected a comparison");
    };
    assert!(left.annotations().is_empty());

    let shallow = deannotate(&cond);
    assert!(shallow.annotations().is_empty());
    let NodeKind::Binary { left, .. } = shallow.kind() else {
        panic!("expected a comparison");
    };
    assert_eq!(left.annotations().get("origin").map(String::as_str), Some("orm"));
}

#[test]
fn in_with_subquery_and_literals() {
    let users = users();
    let orders = orders();
    let ids = select([orders.c("user_id").unwrap()]).unwrap().build();
    let cond = users.c("id").unwrap().in_(&ids).unwrap();
    assert!(matches!(
        cond.kind(),
        NodeKind::Binary { op: BinaryOp::In, right, .. } if matches!(right.kind(), NodeKind::ScalarSubquery(_))
    ));

    let cond = users.c("id").unwrap().not_in(vec![1, 2]).unwrap();
    assert!(matches!(cond.kind(), NodeKind::Binary { op: BinaryOp::NotIn, .. }));
}

#[test]
fn repr_of_common_nodes() {
    let users = users();
    assert_eq!(users.repr(), "Table('users')");
    assert_eq!(users.c("id").unwrap().repr(), "Column('id', table='users')");
    assert_eq!(bindparam("x", 1).repr(), "BindParameter('x', 1)");
    assert_eq!(null().repr(), "<Null object>");
}
