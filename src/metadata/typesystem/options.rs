//! Session configuration of the type system.

/// Name of the core library in current runtimes
pub const DEFAULT_SYSTEM_MODULE: &str = "System.Private.CoreLib";

/// Configuration for a [`crate::metadata::typesystem::TypeSystemContext`].
///
/// # Examples
///
/// ```rust
/// use typescope::metadata::typesystem::TypeSystemOptions;
///
/// let options = TypeSystemOptions::default()
///     .with_system_module("mscorlib")
///     .with_max_inheritance_depth(64);
/// assert_eq!(options.system_module, "mscorlib");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSystemOptions {
    /// Assembly name of the module the well-known types are resolved from
    pub system_module: String,

    /// Maximum number of base types walked from any type (default: 256)
    /// Deeper chains are reported as [`crate::Error::RecursionLimit`], which is how cyclic
    /// inheritance in malformed metadata surfaces
    pub max_inheritance_depth: usize,

    /// Maximum nesting of types inside a single signature blob (default: 50)
    pub max_signature_depth: usize,
}

impl Default for TypeSystemOptions {
    fn default() -> Self {
        Self {
            system_module: DEFAULT_SYSTEM_MODULE.to_string(),
            max_inheritance_depth: 256,
            max_signature_depth: crate::metadata::signatures::MAX_RECURSION_DEPTH,
        }
    }
}

impl TypeSystemOptions {
    /// Set the assembly name of the core library
    #[must_use]
    pub fn with_system_module(mut self, name: &str) -> Self {
        self.system_module = name.to_string();
        self
    }

    /// Set the inheritance walk limit
    #[must_use]
    pub fn with_max_inheritance_depth(mut self, depth: usize) -> Self {
        self.max_inheritance_depth = depth;
        self
    }

    /// Set the signature nesting limit
    #[must_use]
    pub fn with_max_signature_depth(mut self, depth: usize) -> Self {
        self.max_signature_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = TypeSystemOptions::default();
        assert_eq!(options.system_module, "System.Private.CoreLib");
        assert_eq!(options.max_inheritance_depth, 256);
        assert_eq!(options.max_signature_depth, 50);
    }

    #[test]
    fn setters_chain() {
        let options = TypeSystemOptions::default()
            .with_max_signature_depth(8)
            .with_max_inheritance_depth(4);
        assert_eq!(options.max_signature_depth, 8);
        assert_eq!(options.max_inheritance_depth, 4);
        assert_eq!(options.system_module, DEFAULT_SYSTEM_MODULE);
    }
}
