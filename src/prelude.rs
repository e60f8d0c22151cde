//! # typescope Prelude
//!
//! The types needed to create a context, register modules and query the type system.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all typescope operations
pub use crate::Error;

/// The result type used throughout typescope
pub use crate::Result;

// ================================================================================================
// Metadata Access
// ================================================================================================

/// Metadata token type for referencing table entries
pub use crate::metadata::token::Token;

/// The metadata reader collaborator and its in-memory implementation
pub use crate::metadata::reader::{MetadataReader, MetadataTables};

// ================================================================================================
// Type System
// ================================================================================================

/// Session root and configuration
pub use crate::metadata::typesystem::{TypeSystemContext, TypeSystemOptions};

/// Modules and the entities their tokens resolve to
pub use crate::metadata::typesystem::{Entity, ModuleDesc};

/// Type descriptors
pub use crate::metadata::typesystem::{
    Instantiation, MetadataType, ParameterizedKind, TypeCategory, TypeDesc, TypeKind, TypeRc,
    WellKnownType,
};

/// Members and signatures
pub use crate::metadata::typesystem::{
    FieldDesc, FieldRc, MethodDesc, MethodRc, MethodSignature, MethodSignatureFlags,
};
