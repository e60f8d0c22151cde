//! Virtual method resolution over the base type chain.

use std::sync::Arc;

use crate::{
    metadata::typesystem::{MethodRc, TypeDesc},
    Error::RecursionLimit,
    Result,
};

/// Find the method a virtual call to `declaration` dispatches to on an instance of `ty`.
///
/// Starting at `ty`, each type in the base chain is searched for a method with the
/// declaration's name and signature. The declaration itself ends the search, as does a
/// virtual method reusing the slot; `newslot` methods start a new slot and are skipped.
pub(crate) fn find_virtual_function_target_method(
    ty: &TypeDesc,
    declaration: &MethodRc,
) -> Result<Option<MethodRc>> {
    let name = declaration.name()?;
    let signature = declaration.signature()?;
    let max_depth = ty.context()?.options().max_inheritance_depth;

    let mut current = Some(ty.to_rc()?);
    let mut depth = 0;
    while let Some(candidate_type) = current {
        if depth > max_depth {
            return Err(RecursionLimit(max_depth));
        }

        for method in candidate_type.get_methods_named(name)? {
            let method = method?;
            if Arc::ptr_eq(&method, declaration) {
                return Ok(Some(method));
            }

            if method.is_virtual() && !method.is_new_slot() && method.signature()? == signature {
                return Ok(Some(method));
            }
        }

        current = candidate_type.base_type()?;
        depth += 1;
    }

    Ok(None)
}
