//! Resolved method signatures.
//!
//! A [`MethodSignature`] is the type-system form of a `MethodDefSig` / `MethodRefSig` blob:
//! every type token has been resolved to a [`TypeRc`], and signature variables are still
//! present until a substitution is applied.

use std::borrow::Cow;

use bitflags::bitflags;

use crate::{
    metadata::typesystem::{Instantiation, TypeRc},
    Result,
};

bitflags! {
    /// Calling convention and instance flags of a method signature
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodSignatureFlags: u16 {
        /// Mask over the unmanaged calling convention and vararg kinds
        const UNMANAGED_CALLING_CONVENTION_MASK = 0x000F;
        /// `cdecl`
        const UNMANAGED_CALLING_CONVENTION_CDECL = 0x0001;
        /// `stdcall`
        const UNMANAGED_CALLING_CONVENTION_STDCALL = 0x0002;
        /// `thiscall`
        const UNMANAGED_CALLING_CONVENTION_THISCALL = 0x0003;
        /// `fastcall`
        const UNMANAGED_CALLING_CONVENTION_FASTCALL = 0x0004;
        /// Managed `vararg`
        const CALLING_CONVENTION_VARARGS = 0x0005;
        /// No `this` parameter
        const STATIC = 0x0010;
        /// The `this` parameter is listed explicitly
        const EXPLICIT_THIS = 0x0020;
    }
}

impl MethodSignatureFlags {
    fn calling_convention(self) -> u16 {
        self.bits() & Self::UNMANAGED_CALLING_CONVENTION_MASK.bits()
    }

    /// Flags with any unmanaged calling convention folded into the managed default
    fn without_unmanaged_convention(self) -> Self {
        match self.calling_convention() {
            1..=4 => self.difference(Self::UNMANAGED_CALLING_CONVENTION_MASK),
            _ => self,
        }
    }
}

/// A custom modifier attached to the return type or a parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmbeddedModifier {
    /// 0 for the return type, `i + 1` for parameter `i`
    pub position: usize,
    /// `modreq` if set, `modopt` otherwise
    pub is_required: bool,
    /// The modifier type
    pub modifier: TypeRc,
}

/// A method signature with resolved types.
///
/// The derived equality is exact: flags, generic arity, every type and every embedded
/// modifier must match. [`MethodSignature::equivalent_to`] is the looser comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    flags: MethodSignatureFlags,
    generic_parameter_count: u32,
    return_type: TypeRc,
    parameters: Vec<TypeRc>,
    embedded_modifiers: Vec<EmbeddedModifier>,
}

impl MethodSignature {
    /// Create a signature without custom modifiers
    #[must_use]
    pub fn new(
        flags: MethodSignatureFlags,
        generic_parameter_count: u32,
        return_type: TypeRc,
        parameters: Vec<TypeRc>,
    ) -> Self {
        MethodSignature {
            flags,
            generic_parameter_count,
            return_type,
            parameters,
            embedded_modifiers: Vec::new(),
        }
    }

    /// Attach custom modifiers
    #[must_use]
    pub fn with_modifiers(mut self, embedded_modifiers: Vec<EmbeddedModifier>) -> Self {
        self.embedded_modifiers = embedded_modifiers;
        self
    }

    /// Calling convention and instance flags
    #[must_use]
    pub fn flags(&self) -> MethodSignatureFlags {
        self.flags
    }

    /// Number of generic parameters of the method
    #[must_use]
    pub fn generic_parameter_count(&self) -> u32 {
        self.generic_parameter_count
    }

    /// The return type
    #[must_use]
    pub fn return_type(&self) -> &TypeRc {
        &self.return_type
    }

    /// The fixed parameters, by-ref parameters as by-ref types
    #[must_use]
    pub fn parameters(&self) -> &[TypeRc] {
        &self.parameters
    }

    /// Custom modifiers in signature order
    #[must_use]
    pub fn embedded_modifiers(&self) -> &[EmbeddedModifier] {
        &self.embedded_modifiers
    }

    /// Number of fixed parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Returns true if there are no fixed parameters
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Returns true for signatures without a `this` parameter
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodSignatureFlags::STATIC)
    }

    /// Returns true for the managed vararg calling convention
    #[must_use]
    pub fn is_vararg(&self) -> bool {
        self.flags.calling_convention() == MethodSignatureFlags::CALLING_CONVENTION_VARARGS.bits()
    }

    /// Compare ignoring the unmanaged calling convention and optional custom modifiers.
    ///
    /// Types, parameter order, generic arity, the managed flags and the required modifiers
    /// must still match exactly.
    #[must_use]
    pub fn equivalent_to(&self, other: &MethodSignature) -> bool {
        if self.flags.without_unmanaged_convention() != other.flags.without_unmanaged_convention()
            || self.generic_parameter_count != other.generic_parameter_count
            || self.return_type != other.return_type
            || self.parameters != other.parameters
        {
            return false;
        }

        let required = |signature: &MethodSignature| -> Vec<EmbeddedModifier> {
            signature
                .embedded_modifiers
                .iter()
                .filter(|modifier| modifier.is_required)
                .cloned()
                .collect()
        };
        required(self) == required(other)
    }

    /// Replace type variables by the entries of `type_arguments`.
    ///
    /// Method variables are left in place. An empty instantiation returns an unchanged copy.
    ///
    /// # Errors
    /// Returns an error if a substituted type cannot be constructed.
    pub fn apply_substitution(&self, type_arguments: &Instantiation) -> Result<MethodSignature> {
        if type_arguments.is_empty() {
            return Ok(self.clone());
        }

        let method_arguments = Instantiation::empty();
        let substitute =
            |ty: &TypeRc| ty.instantiate_signature(type_arguments, &method_arguments);

        let parameters = self
            .parameters
            .iter()
            .map(substitute)
            .collect::<Result<Vec<_>>>()?;
        let embedded_modifiers = self
            .embedded_modifiers
            .iter()
            .map(|modifier| {
                Ok(EmbeddedModifier {
                    position: modifier.position,
                    is_required: modifier.is_required,
                    modifier: substitute(&modifier.modifier)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(MethodSignature {
            flags: self.flags,
            generic_parameter_count: self.generic_parameter_count,
            return_type: substitute(&self.return_type)?,
            parameters,
            embedded_modifiers,
        })
    }

    /// This signature with `substitution` applied, borrowing when there is nothing to do
    pub(crate) fn substituted(
        &self,
        substitution: Option<&Instantiation>,
    ) -> Result<Cow<'_, MethodSignature>> {
        match substitution {
            Some(arguments) if !arguments.is_empty() => {
                Ok(Cow::Owned(self.apply_substitution(arguments)?))
            }
            _ => Ok(Cow::Borrowed(self)),
        }
    }
}
