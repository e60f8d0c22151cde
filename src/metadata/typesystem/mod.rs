//! Lazy, metadata-backed .NET type system.
//!
//! This module turns the raw rows of one or more modules into canonical type descriptors that
//! are resolved on demand. Nothing is computed until asked for: names, base types, flags,
//! members and signatures are each resolved on first use and cached on the descriptor.
//!
//! # Key Components
//!
//! - [`TypeSystemContext`]: Session root, owns modules and all constructed types
//! - [`ModuleDesc`]: One module, resolving its tokens into interned descriptors
//! - [`TypeDesc`]: A type, one of the variants of [`TypeKind`]
//! - [`MetadataType`]: A `TypeDef` row and the information derived from it
//! - [`MethodDesc`] / [`FieldDesc`]: Members, including their views on instantiated types
//! - [`MethodSignature`]: Resolved method signatures, comparable by value
//! - [`TypeFlags`]: Derived flags, computed per [`FlagCategory`]
//!
//! # Identity
//!
//! Descriptors are canonical: two requests for the same type return the same `Arc`, so
//! `Arc::ptr_eq` (and `==`, which compares by address) is type equality. This holds across
//! threads; concurrent first requests agree on a single winner.
//!
//! # Examples
//!
//! ```rust,ignore
//! use typescope::prelude::*;
//!
//! let context = TypeSystemContext::new(TypeSystemOptions::default());
//! let core = context.add_module(core_library)?;
//! context.initialize()?;
//!
//! let string = core.get_type_by_name("System", "String")?.unwrap();
//! assert!(string.is_well_known_type(WellKnownType::String));
//! assert_eq!(string.base_type()?.unwrap().full_name()?, "System.Object");
//! ```

mod context;
mod desc;
mod field;
mod flags;
mod generics;
pub mod hash;
mod instantiated;
mod metadatatype;
mod method;
mod module;
mod options;
mod parameterized;
mod signature;
mod virtuals;
mod wellknown;

pub use context::TypeSystemContext;
pub use desc::{TypeDesc, TypeKind, TypeRc};
pub use field::{FieldDesc, FieldRc, Fields};
pub use flags::{AttributeFlags, FlagCategory, TypeCategory, TypeFlags};
pub use generics::{
    GenericConstraints, GenericParameterDesc, GenericParameterKind, GenericVariance,
    Instantiation, SignatureVariable,
};
pub use instantiated::InstantiatedType;
pub use metadatatype::{BaseTypeState, ClassLayoutMetadata, MetadataType, PInvokeStringFormat};
pub use method::{MethodDesc, MethodRc, Methods};
pub use module::{Entity, ModuleDesc};
pub use options::{TypeSystemOptions, DEFAULT_SYSTEM_MODULE};
pub use parameterized::{ParameterizedKind, ParameterizedType};
pub use signature::{EmbeddedModifier, MethodSignature, MethodSignatureFlags};
pub use wellknown::WellKnownType;

pub(crate) use method::{MemberSource, MethodFilter};
