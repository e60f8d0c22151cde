use thiserror::Error;

use crate::metadata::{token::Token, typesystem::WellKnownType};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Metadata Errors
/// - [`Error::Malformed`] - Corrupted heap or signature data
/// - [`Error::OutOfBounds`] - A heap index or blob read past the end of its data
/// - [`Error::NotSupported`] - An encoding this layer does not decode
/// - [`Error::TypeNotFound`] - The metadata reader has no row for a token
///
/// ## Load Errors
/// - [`Error::TypeLoad`] - A type cannot be loaded because its metadata is inconsistent,
///   e.g. an unresolvable base type or a finalizer chain not rooted at `System.Object`
/// - [`Error::RecursionLimit`] - An inheritance or signature walk exceeded its depth limit
///
/// ## Configuration Errors
/// - [`Error::WellKnownTypeMissing`] - The core library lacks a required type
/// - [`Error::ContextNotInitialized`] - Well-known types were requested before
///   [`crate::metadata::typesystem::TypeSystemContext::initialize`] succeeded
/// - [`Error::ModuleExists`] / [`Error::ModuleNotFound`] - Module registration problems
///
/// # Examples
///
/// ```rust,no_run
/// use typescope::{Error, metadata::typesystem::TypeRc};
///
/// fn report(ty: &TypeRc) {
///     match ty.base_type() {
///         Ok(Some(base)) => println!("base: {}", base.full_name().unwrap_or_default()),
///         Ok(None) => println!("no base type"),
///         Err(Error::TypeLoad { namespace, name, reason, .. }) => {
///             eprintln!("failed to load {namespace}.{name}: {reason}");
///         }
///         Err(e) => eprintln!("{e}"),
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The metadata is damaged and could not be decoded.
    ///
    /// The error includes the source location where the malformation was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while reading a heap or blob.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The encountered encoding is valid but not decoded by this library.
    #[error("This encoding is not supported - {0}")]
    NotSupported(String),

    /// The metadata reader has no row for this token.
    #[error("Failed to find row in metadata - {0}")]
    TypeNotFound(Token),

    /// A type failed to load because its metadata is inconsistent.
    ///
    /// Load errors are reported against the offending type and are never cached; asking
    /// again re-attempts the resolution.
    #[error("Failed to load type '{namespace}.{name}' from module '{module}' - {reason}")]
    TypeLoad {
        /// Name of the module defining the type
        module: String,
        /// Namespace of the type
        namespace: String,
        /// Name of the type
        name: String,
        /// What went wrong
        reason: String,
    },

    /// A well-known type is missing from the core library.
    #[error("The core library does not define the well-known type {0}")]
    WellKnownTypeMissing(WellKnownType),

    /// Well-known types were requested before the context was initialized.
    #[error("The type system context has not been initialized")]
    ContextNotInitialized,

    /// A module with this name is already registered.
    #[error("A module named '{0}' is already registered")]
    ModuleExists(String),

    /// No module with this name is registered.
    #[error("No module named '{0}' is registered")]
    ModuleNotFound(String),

    /// A back-reference outlived the object it points to.
    #[error("The owning {0} has already been dropped")]
    Dropped(&'static str),

    /// Reach the maximum recursion level allowed.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// General error during type system usage.
    #[error("{0}")]
    TypeError(String),
}

impl Error {
    /// Returns true for load errors, the failures a host reports against a type before
    /// aborting the affected compilation unit.
    #[must_use]
    pub fn is_load_error(&self) -> bool {
        matches!(self, Error::TypeLoad { .. } | Error::RecursionLimit(_))
    }

    /// Returns true for configuration errors caused by an unusable core library or module set.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::WellKnownTypeMissing(_)
                | Error::ContextNotInitialized
                | Error::ModuleExists(_)
                | Error::ModuleNotFound(_)
        )
    }
}
