use std::{
    fmt,
    ops::Deref,
    sync::{Arc, OnceLock, Weak},
};

use bitflags::bitflags;

use crate::{
    metadata::{
        tables::{GenericParamAttributes, GenericParamRaw, TableId},
        token::Token,
        typesystem::{ModuleDesc, TypeRc},
    },
    Error::Dropped,
    Result,
};

/// An ordered, immutable list of type arguments or generic parameters.
///
/// Cloning is cheap. Two instantiations are equal when they hold the same type descriptors in
/// the same order.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Instantiation(Arc<[TypeRc]>);

impl Instantiation {
    /// Create an instantiation from `types`
    #[must_use]
    pub fn new(types: Vec<TypeRc>) -> Self {
        Instantiation(types.into())
    }

    /// The empty instantiation of non-generic types and methods
    #[must_use]
    pub fn empty() -> Self {
        Instantiation::default()
    }
}

impl Deref for Instantiation {
    type Target = [TypeRc];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<TypeRc>> for Instantiation {
    fn from(types: Vec<TypeRc>) -> Self {
        Instantiation::new(types)
    }
}

impl fmt::Debug for Instantiation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// Variance of a generic parameter (§II.9.11)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericVariance {
    /// Invariant
    None,
    /// `out T`
    Covariant,
    /// `in T`
    Contravariant,
}

bitflags! {
    /// Special constraints of a generic parameter
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GenericConstraints: u32 {
        /// `class`
        const REFERENCE_TYPE = GenericParamAttributes::REFERENCE_TYPE_CONSTRAINT;
        /// `struct`
        const NOT_NULLABLE_VALUE_TYPE = GenericParamAttributes::NOT_NULLABLE_VALUE_TYPE_CONSTRAINT;
        /// `new()`
        const DEFAULT_CONSTRUCTOR = GenericParamAttributes::DEFAULT_CONSTRUCTOR_CONSTRAINT;
    }
}

/// Whether a generic parameter belongs to a type or a method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericParameterKind {
    /// Declared by a `TypeDef`
    Type,
    /// Declared by a `MethodDef`
    Method,
}

/// A `GenericParam` row of a type or method.
pub struct GenericParameterDesc {
    module: Weak<ModuleDesc>,
    token: Token,
    owner: Token,
    index: u32,
    flags: u32,
    name_index: u32,
    name: OnceLock<String>,
}

impl GenericParameterDesc {
    pub(crate) fn new(module: Weak<ModuleDesc>, row: &GenericParamRaw) -> Self {
        GenericParameterDesc {
            module,
            token: row.token,
            owner: row.owner,
            index: row.number,
            flags: row.flags,
            name_index: row.name,
            name: OnceLock::new(),
        }
    }

    /// The `GenericParam` token
    #[must_use]
    pub fn token(&self) -> Token {
        self.token
    }

    /// The `TypeDef` or `MethodDef` declaring this parameter
    #[must_use]
    pub fn owner(&self) -> Token {
        self.owner
    }

    /// Position in the owner's parameter list, from zero
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The declaring module.
    ///
    /// # Errors
    /// Returns [`crate::Error::Dropped`] once the module is gone.
    pub fn module(&self) -> Result<Arc<ModuleDesc>> {
        self.module.upgrade().ok_or(Dropped("module"))
    }

    /// Name of the parameter, decoded on first use.
    ///
    /// # Errors
    /// Returns an error if the module is gone or the string heap entry is invalid.
    pub fn name(&self) -> Result<&str> {
        if let Some(name) = self.name.get() {
            return Ok(name);
        }

        let module = self.module()?;
        let name = module.reader().strings()?.get(self.name_index)?.to_string();
        Ok(self.name.get_or_init(|| name))
    }

    /// Type or method parameter
    #[must_use]
    pub fn kind(&self) -> GenericParameterKind {
        if self.owner.is_table(TableId::MethodDef) {
            GenericParameterKind::Method
        } else {
            GenericParameterKind::Type
        }
    }

    /// Declared variance
    #[must_use]
    pub fn variance(&self) -> GenericVariance {
        match self.flags & GenericParamAttributes::VARIANCE_MASK {
            GenericParamAttributes::COVARIANT => GenericVariance::Covariant,
            GenericParamAttributes::CONTRAVARIANT => GenericVariance::Contravariant,
            _ => GenericVariance::None,
        }
    }

    /// Declared special constraints
    #[must_use]
    pub fn constraints(&self) -> GenericConstraints {
        GenericConstraints::from_bits_truncate(
            self.flags & GenericParamAttributes::SPECIAL_CONSTRAINT_MASK,
        )
    }
}

/// `!n` or `!!n` as written inside a signature, before substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureVariable {
    /// Position of the referenced generic parameter
    pub index: u32,
    /// `true` for method variables (`!!n`)
    pub is_method: bool,
}
