use crate::cache_key::DEFAULT_MAX_KEY_ELEMENTS;
use crate::node::Scope;

/// Default number of rendered templates kept per compiler.
pub const DEFAULT_CACHE_CAPACITY: usize = 500;

/// Configuration for a [`Compiler`](super::Compiler).
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Rendered template cache.
    pub cache: CacheConfig,
    /// Trees whose cache key would exceed this many elements are rendered
    /// every time.
    pub max_key_elements: usize,
}

/// Rendered template cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            max_key_elements: DEFAULT_MAX_KEY_ELEMENTS,
        }
    }
}

impl CompilerConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable template caching with the given capacity.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = CacheConfig {
            enabled: capacity > 0,
            capacity,
        };
        self
    }

    /// Disable template caching.
    pub fn no_cache(mut self) -> Self {
        self.cache.enabled = false;
        self
    }

    /// Set the largest cache key (in elements) still worth caching.
    pub fn max_key_elements(mut self, max: usize) -> Self {
        self.max_key_elements = max;
        self
    }
}

/// Per-call compile options.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Names available to deferred expressions.
    pub scope: Scope,
    /// Render parameter values inline instead of as placeholders.
    ///
    /// Bypasses the template cache.
    pub literal_binds: bool,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Bind one name for deferred expressions.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<crate::value::BindValue>) -> Self {
        self.scope = self.scope.bind(name, value);
        self
    }

    pub fn literal_binds(mut self, enabled: bool) -> Self {
        self.literal_binds = enabled;
        self
    }
}
