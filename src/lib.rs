// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
#![allow(clippy::too_many_arguments)]

//! # typescope
//!
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/BinFlip/typescope/blob/main/LICENSE-APACHE)
//!
//! A lazy, metadata-backed type system for .NET modules. `typescope` resolves types, members
//! and signatures from ECMA-335 metadata tables on demand and hands out canonical descriptors,
//! so two requests for the same type always return the same object.
//!
//! ## Features
//!
//! - **Lazy resolution** - Names, base types, flags, members and signatures are computed on
//!   first use and cached
//! - **Canonical identity** - Instantiated types, arrays, pointers, by-refs and signature
//!   variables are interned per context; identity comparison is equality
//! - **Cross-module references** - `TypeRef`s resolve through the registered modules
//! - **Generics** - Instantiation, substitution and member views on instantiated types
//! - **Thread safe** - Every query may run concurrently; first computations race safely
//!
//! ## Quick Start
//!
//! ```rust
//! use typescope::prelude::*;
//! use typescope::metadata::builder::MetadataBuilder;
//!
//! let context = TypeSystemContext::new(TypeSystemOptions::default());
//! let core = MetadataBuilder::core_library("System.Private.CoreLib")?.build();
//! let module = context.add_module(core)?;
//! context.initialize()?;
//!
//! let string = module.get_type_by_name("System", "String")?.unwrap();
//! assert_eq!(string.full_name()?, "System.String");
//! assert!(string.base_type()?.unwrap().is_well_known_type(WellKnownType::Object));
//! # Ok::<(), typescope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata::reader`] - The [`metadata::reader::MetadataReader`] trait the type system
//!   consumes, and in-memory tables implementing it
//! - [`metadata::builder`] - Assembles in-memory tables with correctly encoded heaps
//! - [`metadata::signatures`] - Signature blob parsing and encoding
//! - [`metadata::typesystem`] - The context, modules and descriptors
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events: `debug` for module registration and load failures,
//! `trace` for descriptor interning and flag computation, `info` once a context is
//! initialized. Install any `tracing` subscriber to see them.
//!
//! ## Testing
//!
//! ```bash
//! cargo test
//! cargo bench
//! ```
#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use typescope::prelude::*;
///
/// let context = TypeSystemContext::new(TypeSystemOptions::default());
/// assert!(!context.is_initialized());
/// ```
pub mod prelude;

/// Metadata access and the type system built from it
pub mod metadata;

/// `typescope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `typescope` Error type
///
/// # Examples
///
/// ```rust
/// use typescope::{prelude::*, Error};
///
/// let context = TypeSystemContext::new(TypeSystemOptions::default());
/// match context.get_well_known_type(WellKnownType::Object) {
///     Err(Error::ContextNotInitialized) => {}
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub use error::Error;
