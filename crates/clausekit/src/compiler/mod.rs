//! Caching, dialect-aware SQL compiler.
//!
//! Compiling a tree runs four steps:
//!
//! 1. deferred expressions are resolved against the [`CompileOptions`] scope;
//! 2. one walk over the tree produces its [cache key](crate::cache_key), its
//!    bind parameters in slot order and the identifiers already in use;
//! 3. the rendered template is looked up by `(dialect, cache key)` and only
//!    rendered on a miss;
//! 4. the template is assembled with this tree's parameter values.
//!
//! Templates never contain values, so two trees that differ only in their
//! literals share one cache entry.
//!
//! # Example
//! ```ignore
//! use clausekit::prelude::*;
//!
//! let users = table("users", &[("id", SqlType::Integer), ("name", SqlType::String)]);
//! let stmt = select([users.c("name")?])?
//!     .filter(users.c("id")?.eq(5)?)?
//!     .build();
//!
//! let compiled = compile(&stmt, &Postgres)?;
//! assert_eq!(compiled.sql, "SELECT users.name FROM users WHERE users.id = $1");
//! assert_eq!(compiled.params, vec![BindValue::Int(5)]);
//! ```

mod cache;
mod config;
mod names;
mod render;
mod template;


pub use config::{CacheConfig, CompileOptions, CompilerConfig, DEFAULT_CACHE_CAPACITY};

use crate::cache_key::{Analysis, analyze};
use crate::coercion::{CoercionArgs, MAX_CLAUSE_ELEMENT_DEPTH, coerce_node};
use crate::diagnostics::Diagnostic;
use crate::dialect::Dialect;
use crate::error::{ClauseError, ClauseResult};
use crate::node::{Node, NodeKind, NodeRef, Scope, rewrite};
use crate::value::BindValue;
use cache::{FragmentCache, FragmentKey};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};
use template::Template;

/// A compiled statement, ready to hand to a driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compiled {
    pub sql: String,
    /// Parameter values in placeholder order.
    pub params: Vec<BindValue>,
    /// Rendered parameter names, parallel to `params`.
    pub param_names: Vec<String>,
    /// Diagnostics carried by the tree and raised while resolving deferred
    /// expressions.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether the SQL text came from the template cache.
    pub cache_hit: bool,
}

/// Compiler statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompilerStats {
    /// Total number of compile calls that got as far as rendering.
    pub compilations: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Trees whose cache key exceeded the size bound.
    pub uncacheable: u64,
    /// Templates currently cached.
    pub cached_templates: usize,
}

/// Compiles trees to SQL, caching rendered templates per dialect.
///
/// A compiler is `Send + Sync`; share one between threads to share its cache.
#[derive(Debug)]
pub struct Compiler {
    config: CompilerConfig,
    cache: FragmentCache,
    compilations: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    uncacheable: AtomicU64,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            cache: FragmentCache::new(config.cache.capacity),
            config,
            compilations: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            uncacheable: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn compile(&self, node: &NodeRef, dialect: &dyn Dialect) -> ClauseResult<Compiled> {
        self.compile_with(node, dialect, &CompileOptions::default())
    }

    pub fn compile_with(
        &self,
        node: &NodeRef,
        dialect: &dyn Dialect,
        options: &CompileOptions,
    ) -> ClauseResult<Compiled> {
        let mut resolve_diagnostics = Vec::new();
        let node = resolve_deferred(node, &options.scope, &mut resolve_diagnostics)?;

        let analysis = analyze(&node, self.config.max_key_elements);
        analysis.check_bind_names()?;
        self.compilations.fetch_add(1, Ordering::Relaxed);

        let (template, cache_hit) = self.template(&node, dialect, &analysis, options)?;
        let (sql, params) = template.assemble(&analysis.binds, dialect)?;
        let (params, param_names) = params.into_parts();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "clausekit.compile",
            dialect = dialect.name(),
            cache_hit,
            params = params.len(),
            sql = %truncate_sql(&sql, LOG_SQL_MAX_BYTES),
            "compiled statement"
        );

        let mut diagnostics = analysis.diagnostics;
        diagnostics.extend(resolve_diagnostics);
        Ok(Compiled {
            sql,
            params,
            param_names,
            diagnostics,
            cache_hit,
        })
    }

    fn template(
        &self,
        node: &NodeRef,
        dialect: &dyn Dialect,
        analysis: &Analysis,
        options: &CompileOptions,
    ) -> ClauseResult<(Arc<Template>, bool)> {
        let Some(key) = &analysis.key else {
            self.uncacheable.fetch_add(1, Ordering::Relaxed);
            let template = render::render(node, dialect, analysis, options.literal_binds)?;
            return Ok((Arc::new(template), false));
        };
        if options.literal_binds || !self.config.cache.enabled {
            let template = render::render(node, dialect, analysis, options.literal_binds)?;
            return Ok((Arc::new(template), false));
        }

        let key = FragmentKey {
            dialect: dialect.name(),
            key: key.clone(),
        };
        if let Some(template) = self.cache.get(&key) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok((template, true));
        }

        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        let template = Arc::new(render::render(node, dialect, analysis, false)?);
        Ok((self.cache.insert_if_absent(key, template), false))
    }

    /// Get a snapshot of current statistics.
    pub fn stats(&self) -> CompilerStats {
        CompilerStats {
            compilations: self.compilations.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            uncacheable: self.uncacheable.load(Ordering::Relaxed),
            cached_templates: self.cache.len(),
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop every cached template; statistics are kept.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

static DEFAULT_COMPILER: LazyLock<Compiler> = LazyLock::new(Compiler::default);

/// The process-wide compiler used by [`compile`].
pub fn default_compiler() -> &'static Compiler {
    &DEFAULT_COMPILER
}

/// Compile `node` for `dialect` with the process-wide compiler.
pub fn compile(node: &NodeRef, dialect: &dyn Dialect) -> ClauseResult<Compiled> {
    DEFAULT_COMPILER.compile(node, dialect)
}

// ==================== Deferred expressions ====================

fn resolve_deferred(
    node: &NodeRef,
    scope: &Scope,
    diagnostics: &mut Vec<Diagnostic>,
) -> ClauseResult<NodeRef> {
    if !contains_deferred(node, &mut HashSet::new()) {
        return Ok(Arc::clone(node));
    }
    resolve_at(node, scope, diagnostics, 0)
}

fn resolve_at(
    node: &NodeRef,
    scope: &Scope,
    diagnostics: &mut Vec<Diagnostic>,
    depth: usize,
) -> ClauseResult<NodeRef> {
    rewrite(node, &mut |n: &NodeRef| {
        let NodeKind::Deferred { lambda, role } = n.kind() else {
            return Ok(None);
        };
        if depth == MAX_CLAUSE_ELEMENT_DEPTH {
            return Err(ClauseError::construction(format!(
                "deferred expression did not resolve after {MAX_CLAUSE_ELEMENT_DEPTH} steps"
            )));
        }
        let input = lambda.call(scope)?;
        let (resolved, diags) = coerce_node(*role, input, &CoercionArgs::new())?;
        diagnostics.extend(diags);
        resolve_at(&resolved, scope, &mut *diagnostics, depth + 1).map(Some)
    })
}

fn contains_deferred(node: &NodeRef, seen: &mut HashSet<*const Node>) -> bool {
    if !seen.insert(Arc::as_ptr(node)) {
        return false;
    }
    node.is_deferred() || node.children().into_iter().any(|c| contains_deferred(c, seen))
}

#[cfg(feature = "tracing")]
const LOG_SQL_MAX_BYTES: usize = 500;

#[cfg(feature = "tracing")]
fn truncate_sql(sql: &str, max_bytes: usize) -> String {
    if sql.len() <= max_bytes {
        return sql.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &sql[..end])
}
