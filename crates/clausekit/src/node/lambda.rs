//! Deferred expressions resolved at compile time.

use crate::coercion::Input;
use crate::error::ClauseResult;
use crate::value::BindValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

type LambdaFn = dyn Fn(&Scope) -> ClauseResult<Input> + Send + Sync;

/// A zero-argument expression factory, invoked by the compiler with the
/// bound names of the compile [`Scope`].
#[derive(Clone)]
pub struct Lambda(Arc<LambdaFn>);

impl Lambda {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Scope) -> ClauseResult<Input> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn call(&self, scope: &Scope) -> ClauseResult<Input> {
        (self.0)(scope)
    }

    /// Identity of the underlying closure.
    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lambda({:#x})", self.id())
    }
}

/// Shorthand for [`Lambda::new`] wrapped as an [`Input`].
pub fn lambda<F>(f: F) -> Input
where
    F: Fn(&Scope) -> ClauseResult<Input> + Send + Sync + 'static,
{
    Input::Lambda(Lambda::new(f))
}

/// Names bound for deferred expressions during one compilation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    names: BTreeMap<String, BindValue>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, name: impl Into<String>, value: impl Into<BindValue>) -> Self {
        self.names.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&BindValue> {
        self.names.get(name)
    }

    /// The bound value as a coercion input; unbound names read as `None`.
    pub fn value(&self, name: &str) -> Input {
        self.names
            .get(name)
            .map_or(Input::None, |v| Input::from(v.clone()))
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
