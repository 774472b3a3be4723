// ============================================================================
// Semantic Analysis Configuration
// ============================================================================

/// When two function declarations of the same name and arity count as the
/// same signature (and so collide in a scope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverloadEquality {
    /// Every argument position must be cast-compatible.
    #[default]
    AllArguments,
    /// A single cast-compatible argument position is enough. Matches the
    /// behaviour of older VSL compilers, which rejected most overloads that
    /// share an arity.
    AnyArgument,
}

/// Configuration for semantic analysis
#[derive(Debug, Clone)]
pub struct SemaConfig {
    /// Overload collision rule used by `Scope::set`
    pub overload_equality: OverloadEquality,

    /// Whether uses of `@deprecated` items produce warnings (default: true)
    pub deprecation_warnings: bool,

    /// Whether warnings abort analysis like errors (default: false)
    pub warnings_as_errors: bool,

    /// Maximum nesting of resolver calls before analysis gives up
    /// (default: 256)
    pub max_resolution_depth: usize,
}

impl Default for SemaConfig {
    fn default() -> Self {
        Self {
            overload_equality: OverloadEquality::AllArguments,
            deprecation_warnings: true,
            warnings_as_errors: false,
            max_resolution_depth: 256,
        }
    }
}

impl SemaConfig {
    /// Configuration that treats every warning as fatal
    pub fn strict() -> Self {
        Self {
            warnings_as_errors: true,
            ..Default::default()
        }
    }

    /// Configuration reproducing the any-argument overload collision rule
    pub fn legacy() -> Self {
        Self {
            overload_equality: OverloadEquality::AnyArgument,
            ..Default::default()
        }
    }
}
