//! # clausekit
//!
//! Composable SQL expression trees with role-based coercion and a caching,
//! dialect-aware compiler.
//!
//! ## Features
//!
//! - **Expression algebra**: immutable, shareable [`Node`] trees for column
//!   expressions, SELECT/compound statements and INSERT/UPDATE/DELETE
//! - **Role-based coercion**: every consumption site declares a [`Role`];
//!   plain values, strings and foreign objects are converted (or rejected with
//!   a precise [`ArgumentError`]) the same way everywhere
//! - **Structural cache keys**: trees that differ only in their literal values
//!   share a [`CacheKey`](cache_key::CacheKey)
//! - **Caching compiler**: rendered templates are reused per dialect; only
//!   parameter values are re-collected
//! - **Dialects**: [`Postgres`], [`Sqlite`], [`Mysql`] and a [`Generic`] ANSI
//!   dialect behind the [`Dialect`] trait
//!
//! ## Building and compiling
//!
//! ```ignore
//! use clausekit::prelude::*;
//!
//! let users = table("users", &[("id", SqlType::Integer), ("name", SqlType::String)]);
//! let stmt = select([users.c("id")?, users.c("name")?])?
//!     .filter(users.c("name")?.like("a%")?)?
//!     .order_by([users.c("id")?.desc()])?
//!     .limit(10)?
//!     .build();
//!
//! let compiled = compile(&stmt, &Postgres)?;
//! // SELECT users.id, users.name FROM users WHERE users.name LIKE $1
//! //   ORDER BY users.id DESC LIMIT $2
//! ```
//!
//! ## Coercion
//!
//! ```ignore
//! use clausekit::coercion::{expect, CoercionArgs};
//! use clausekit::Role;
//!
//! let err = expect(Role::WhereHaving, serde_json::json!({"a": 1}), &CoercionArgs::new())
//!     .unwrap_err();
//! assert!(err.is_argument());
//! ```

pub mod cache_key;
pub mod coercion;
pub mod compiler;
pub mod diagnostics;
pub mod dialect;
pub mod error;
pub mod node;
pub mod prelude;
pub mod role;
pub mod types;
pub mod value;

pub use cache_key::{CacheKey, cache_key};
pub use coercion::{
    AsClauseElement, Coerced, Coercion, CoercionArgs, ColumnExpression, Input, Inspectable, expect,
    expect_col_expression_collection,
};
pub use compiler::{
    CompileOptions, Compiled, Compiler, CompilerConfig, CompilerStats, compile, default_compiler,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, ImplicitPolicy};
pub use dialect::{Dialect, Generic, Mysql, Postgres, Sqlite};
pub use error::{ArgumentError, ClauseError, ClauseResult};
pub use node::{Node, NodeKind, NodeRef};
pub use role::Role;
pub use types::SqlType;
pub use value::BindValue;
