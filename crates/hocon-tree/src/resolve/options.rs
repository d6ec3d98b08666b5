//! Options for substitution resolution.

/// Options controlling how substitutions are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Fall back to environment variables for substitutions that are not
    /// found in the tree (default: true)
    pub use_system_environment: bool,

    /// Leave unresolvable substitutions in place instead of failing
    /// (default: false)
    pub allow_unresolved: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            use_system_environment: true,
            allow_unresolved: false,
        }
    }
}

impl ResolveOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that never consult the environment.
    pub fn no_system() -> Self {
        Self::default().use_system_environment(false)
    }

    pub fn use_system_environment(mut self, value: bool) -> Self {
        self.use_system_environment = value;
        self
    }

    pub fn allow_unresolved(mut self, value: bool) -> Self {
        self.allow_unresolved = value;
        self
    }
}
