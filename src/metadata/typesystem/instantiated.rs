use std::sync::OnceLock;

use crate::{
    metadata::typesystem::{Instantiation, TypeRc},
    Result,
};

/// A generic type definition closed over type arguments, e.g. `List<int>`.
///
/// Names, nesting, flags and members come from the definition; everything that mentions the
/// definition's generic parameters is seen through [`InstantiatedType::instantiation`].
pub struct InstantiatedType {
    definition: TypeRc,
    instantiation: Instantiation,
    base_type: OnceLock<Option<TypeRc>>,
}

impl InstantiatedType {
    pub(crate) fn new(definition: TypeRc, instantiation: Instantiation) -> Self {
        InstantiatedType {
            definition,
            instantiation,
            base_type: OnceLock::new(),
        }
    }

    /// The generic definition
    #[must_use]
    pub fn definition(&self) -> &TypeRc {
        &self.definition
    }

    /// The type arguments, one per generic parameter of the definition
    #[must_use]
    pub fn instantiation(&self) -> &Instantiation {
        &self.instantiation
    }

    /// The definition's base type with the type arguments substituted for its signature
    /// variables.
    ///
    /// # Errors
    /// Returns the definition's load error if its base type cannot be resolved.
    pub fn base_type(&self) -> Result<Option<TypeRc>> {
        if let Some(base) = self.base_type.get() {
            return Ok(base.clone());
        }

        let open = match self.definition.as_metadata() {
            Some(definition) => definition.open_base_type()?,
            None => self.definition.base_type()?,
        };
        let base = match open {
            Some(base) => {
                Some(base.instantiate_signature(&self.instantiation, &Instantiation::empty())?)
            }
            None => None,
        };
        Ok(self.base_type.get_or_init(|| base).clone())
    }
}
