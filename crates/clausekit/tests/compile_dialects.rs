use clausekit::coercion::{CoercionArgs, Input, expect};
use clausekit::prelude::*;
use clausekit::{AsClauseElement, CompilerConfig, Role, cache_key};

fn users() -> NodeRef {
    table(
        "users",
        &[
            ("id", SqlType::Integer),
            ("name", SqlType::String),
            ("active", SqlType::Boolean),
        ],
    )
}

fn active_users(limit: i64, name: &str) -> NodeRef {
    let users = users();
    select([users.c("id").unwrap(), users.c("name").unwrap()])
        .unwrap()
        .filter(users.c("active").unwrap().eq(true).unwrap())
        .unwrap()
        .filter(users.c("name").unwrap().like(name).unwrap())
        .unwrap()
        .order_by([users.c("id").unwrap().desc()])
        .unwrap()
        .limit(limit)
        .unwrap()
        .build()
}

/// A mapped attribute handle from some outer layer.
struct Attribute {
    table: NodeRef,
    name: &'static str,
}

impl AsClauseElement for Attribute {
    fn clause_element(&self) -> Input {
        match self.table.c(self.name) {
            Ok(column) => column.into(),
            Err(_) => Input::None,
        }
    }
}

#[test]
fn one_tree_four_dialects() {
    let stmt = active_users(10, "a%");
    let compiler = Compiler::default();

    let expected: [(&dyn Dialect, &str); 4] = [
        (
            &Postgres,
            "SELECT users.id, users.name FROM users WHERE users.active = $1 \
             AND users.name LIKE $2 ORDER BY users.id DESC LIMIT $3",
        ),
        (
            &Sqlite,
            "SELECT users.id, users.name FROM users WHERE users.active = ? \
             AND users.name LIKE ? ORDER BY users.id DESC LIMIT ?",
        ),
        (
            &Mysql,
            "SELECT users.id, users.name FROM users WHERE users.active = %s \
             AND users.name LIKE %s ORDER BY users.id DESC LIMIT %s",
        ),
        (
            &Generic,
            "SELECT users.id, users.name FROM users WHERE users.active = :active_1 \
             AND users.name LIKE :name_1 ORDER BY users.id DESC \
             FETCH FIRST :param_1 ROWS ONLY",
        ),
    ];

    for (dialect, sql) in expected {
        let compiled = compiler.compile(&stmt, dialect).unwrap();
        assert_eq!(compiled.sql, sql, "dialect {}", dialect.name());
        assert_eq!(
            compiled.params,
            vec![BindValue::Bool(true), BindValue::from("a%"), BindValue::Int(10)]
        );
    }
    assert_eq!(compiler.cache_len(), 4);
}

#[test]
fn trees_differing_only_in_values_share_a_key() {
    let a = active_users(10, "a%");
    let b = active_users(99, "zz");
    assert_eq!(cache_key(&a), cache_key(&b));

    let users = users();
    let other = select([users.c("id").unwrap(), users.c("name").unwrap()])
        .unwrap()
        .filter(users.c("active").unwrap().ne(true).unwrap())
        .unwrap()
        .build();
    assert_ne!(cache_key(&a), cache_key(&other));
}

#[test]
fn literal_coercion_then_compile() {
    let users = users();
    let id = users.c("id").unwrap();
    let coerced = expect(
        Role::ExpressionElement,
        5,
        &CoercionArgs::new().type_(SqlType::Integer),
    )
    .unwrap();
    let bind = coerced.value.into_node().unwrap();
    assert_eq!(bind.sql_type(), SqlType::Integer);

    let clause = and_([
        id.eq(&bind).unwrap(),
        users.c("name").unwrap().eq("x").unwrap(),
    ])
    .unwrap();
    let compiled = compile(&clause, &Postgres).unwrap();
    assert_eq!(compiled.sql.matches('$').count(), 2);
    assert_eq!(compiled.params, vec![BindValue::Int(5), BindValue::from("x")]);
}

#[test]
fn rejected_mapping_names_role_and_value() {
    let err = expect(
        Role::WhereHaving,
        serde_json::json!({"a": 1}),
        &CoercionArgs::new(),
    )
    .unwrap_err();
    let argument = err.as_argument().unwrap();
    assert_eq!(argument.role, Role::WhereHaving.name());
    assert!(argument.message().contains("'a'"));
}

#[test]
fn external_handles_resolve_through_their_clause_element() {
    let users = users();
    let name = Input::element(Attribute {
        table: users.clone(),
        name: "name",
    });
    let stmt = select([name])
        .unwrap()
        .filter(users.c("id").unwrap().eq(1).unwrap())
        .unwrap()
        .build();
    let compiled = compile(&stmt, &Sqlite).unwrap();
    assert_eq!(compiled.sql, "SELECT users.name FROM users WHERE users.id = ?");
}

#[test]
fn explicit_scalar_subquery_is_not_deprecated() {
    let users = users();
    let max_id = select([func("max", [users.c("id").unwrap()]).unwrap()])
        .unwrap()
        .build();

    let implicit = users.c("id").unwrap().eq(&max_id).unwrap();
    let explicit = users
        .c("id")
        .unwrap()
        .eq(max_id.scalar_subquery().unwrap())
        .unwrap();

    let implicit = compile(&implicit, &Postgres).unwrap();
    let explicit = compile(&explicit, &Postgres).unwrap();
    assert_eq!(implicit.sql, explicit.sql);
    assert_eq!(implicit.diagnostics.len(), 1);
    assert!(explicit.diagnostics.is_empty());
}

#[test]
fn in_lists_with_a_small_cache() {
    let compiler = Compiler::new(CompilerConfig::new().cache_capacity(2));
    let users = users();

    for n in 1..=5 {
        let values: Vec<i64> = (0..n).collect();
        let clause = users.c("id").unwrap().in_(values.clone()).unwrap();
        let compiled = compiler.compile(&clause, &Mysql).unwrap();
        assert_eq!(compiled.sql.matches("%s").count(), n as usize);
        let expected: Vec<BindValue> = values.into_iter().map(BindValue::Int).collect();
        assert_eq!(compiled.params, expected);
    }
    assert_eq!(compiler.cache_len(), 1);
    assert_eq!(compiler.stats().cache_hits, 4);
}

#[test]
fn eviction_keeps_the_most_recent_templates() {
    let compiler = Compiler::new(CompilerConfig::new().cache_capacity(2));
    let users = users();
    let by_id = users.c("id").unwrap().eq(1).unwrap();
    let by_name = users.c("name").unwrap().eq("a").unwrap();
    let inactive = users.c("active").unwrap().eq(false).unwrap();

    compiler.compile(&by_id, &Postgres).unwrap();
    compiler.compile(&by_name, &Postgres).unwrap();
    compiler.compile(&by_id, &Postgres).unwrap();
    compiler.compile(&inactive, &Postgres).unwrap();
    assert_eq!(compiler.cache_len(), 2);

    assert!(compiler.compile(&by_id, &Postgres).unwrap().cache_hit);
    assert!(!compiler.compile(&by_name, &Postgres).unwrap().cache_hit);
}
