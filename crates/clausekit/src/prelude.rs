//! Convenient imports for typical `clausekit` usage.
//!
//! ```ignore
//! use clausekit::prelude::*;
//! ```

pub use crate::node::{
    ExprOps, Scope, SelectBuilder, SelectableOps, and_, bindparam, cast, column, column_typed,
    delete, except, exists, expanding_bindparam, false_, func, insert, intersect, lambda, literal,
    literal_column, not_, null, or_, select, table, table_in_schema, text, true_, union,
    union_all, update,
};
pub use crate::{
    BindValue, ClauseError, ClauseResult, CompileOptions, Compiled, Compiler, Dialect, Generic,
    Mysql, NodeRef, Postgres, Sqlite, SqlType, compile,
};
