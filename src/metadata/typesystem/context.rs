//! The type system context.
//!
//! A [`TypeSystemContext`] owns the registered modules and every structural descriptor
//! built from them: instantiated types, parameterized types, signature variables and the
//! member views on instantiated types. Each of those is created through a canonicalizing
//! constructor, so equally-shaped requests return the same `Arc` and identity comparison is
//! equality.
//!
//! # Lifecycle
//!
//! 1. Create the context with [`TypeSystemContext::new`]
//! 2. Register modules with [`TypeSystemContext::add_module`]
//! 3. Call [`TypeSystemContext::initialize`] once the system module is registered
//! 4. Resolve types through the modules
//!
//! # Examples
//!
//! ```rust,ignore
//! use typescope::prelude::*;
//!
//! let context = TypeSystemContext::new(TypeSystemOptions::default());
//! context.add_module(core_library_tables)?;
//! context.initialize()?;
//!
//! let int32 = context.get_well_known_type(WellKnownType::Int32)?;
//! let array = context.sz_array_type(&int32);
//! assert!(Arc::ptr_eq(&array, &context.sz_array_type(&int32)));
//! ```

use std::sync::{Arc, OnceLock, Weak};

use dashmap::{mapref::entry::Entry, DashMap};
use strum::IntoEnumIterator;
use tracing::{debug, info, trace};

use crate::{
    metadata::{
        reader::MetadataReader,
        typesystem::{
            FieldDesc, FieldRc, InstantiatedType, Instantiation, MethodDesc, MethodRc,
            ModuleDesc, ParameterizedKind, ParameterizedType, SignatureVariable, TypeDesc,
            TypeKind, TypeRc, TypeSystemOptions, WellKnownType,
        },
    },
    Error::{
        ContextNotInitialized, ModuleExists, ModuleNotFound, TypeError, WellKnownTypeMissing,
    },
    Result,
};

/// Highest array rank ECMA-335 permits
const MAX_ARRAY_RANK: u32 = 32;

/// The root of a type system session.
pub struct TypeSystemContext {
    /// Handed to the descriptors this context creates as their back-reference
    this: Weak<TypeSystemContext>,
    options: TypeSystemOptions,
    /// Registered modules in registration order
    modules: boxcar::Vec<Arc<ModuleDesc>>,
    /// Registered modules by assembly name
    modules_by_name: DashMap<String, Arc<ModuleDesc>>,
    /// Resolved well-known types, indexed by [`WellKnownType`] discriminant
    well_known: OnceLock<Vec<TypeRc>>,
    instantiated_types: DashMap<(TypeRc, Instantiation), TypeRc>,
    parameterized_types: DashMap<(TypeRc, ParameterizedKind), TypeRc>,
    signature_variables: DashMap<SignatureVariable, TypeRc>,
    methods_on_instantiated_types: DashMap<(TypeRc, MethodRc), MethodRc>,
    fields_on_instantiated_types: DashMap<(TypeRc, FieldRc), FieldRc>,
}

impl TypeSystemContext {
    /// Create an empty context
    #[must_use]
    pub fn new(options: TypeSystemOptions) -> Arc<Self> {
        Arc::new_cyclic(|this| TypeSystemContext {
            this: this.clone(),
            options,
            modules: boxcar::Vec::new(),
            modules_by_name: DashMap::new(),
            well_known: OnceLock::new(),
            instantiated_types: DashMap::new(),
            parameterized_types: DashMap::new(),
            signature_variables: DashMap::new(),
            methods_on_instantiated_types: DashMap::new(),
            fields_on_instantiated_types: DashMap::new(),
        })
    }

    /// The options the context was created with
    #[must_use]
    pub fn options(&self) -> &TypeSystemOptions {
        &self.options
    }

    /// Register the module read by `reader`.
    ///
    /// # Errors
    /// Returns [`crate::Error::ModuleExists`] if a module with the same assembly name is
    /// already registered.
    pub fn add_module<R: MetadataReader + 'static>(&self, reader: R) -> Result<Arc<ModuleDesc>> {
        self.add_module_boxed(Box::new(reader))
    }

    /// Register the module read by an already boxed `reader`.
    ///
    /// # Errors
    /// Returns [`crate::Error::ModuleExists`] if a module with the same assembly name is
    /// already registered.
    pub fn add_module_boxed(&self, reader: Box<dyn MetadataReader>) -> Result<Arc<ModuleDesc>> {
        let name = reader.assembly_name().to_string();
        match self.modules_by_name.entry(name) {
            Entry::Occupied(entry) => Err(ModuleExists(entry.key().clone())),
            Entry::Vacant(entry) => {
                let module =
                    ModuleDesc::new(self.this.clone(), self.options.max_signature_depth, reader);
                entry.insert(module.clone());
                self.modules.push(module.clone());
                debug!(module = module.name(), "registered module");
                Ok(module)
            }
        }
    }

    /// The registered module named `name`
    #[must_use]
    pub fn module(&self, name: &str) -> Option<Arc<ModuleDesc>> {
        self.modules_by_name
            .get(name)
            .map(|entry| entry.value().clone())
    }

    /// Registered modules in registration order
    pub fn modules(&self) -> impl Iterator<Item = &Arc<ModuleDesc>> {
        self.modules.iter().map(|(_, module)| module)
    }

    /// Resolve the well-known types from the system module.
    ///
    /// Calling this again after success does nothing.
    ///
    /// # Errors
    /// Returns [`crate::Error::ModuleNotFound`] if the system module is not registered and
    /// [`crate::Error::WellKnownTypeMissing`] for the first well-known type it does not
    /// define.
    pub fn initialize(&self) -> Result<()> {
        if self.well_known.get().is_some() {
            return Ok(());
        }

        let system_module = self
            .module(&self.options.system_module)
            .ok_or_else(|| ModuleNotFound(self.options.system_module.clone()))?;

        let mut well_known = Vec::with_capacity(WellKnownType::iter().len());
        for kind in WellKnownType::iter() {
            let (namespace, name) = kind.namespace_and_name();
            let resolved = system_module
                .get_type_by_name(namespace, name)?
                .ok_or(WellKnownTypeMissing(kind))?;

            if let Some(category) = kind.fixed_category() {
                resolved.fix_category(category);
            }
            well_known.push(resolved);
        }

        if self.well_known.set(well_known).is_ok() {
            info!(
                system_module = system_module.name(),
                "initialized type system context"
            );
        }
        Ok(())
    }

    /// Returns true once [`TypeSystemContext::initialize`] succeeded
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.well_known.get().is_some()
    }

    /// The canonical descriptor of a well-known type.
    ///
    /// # Errors
    /// Returns [`crate::Error::ContextNotInitialized`] before initialization.
    pub fn get_well_known_type(&self, kind: WellKnownType) -> Result<TypeRc> {
        self.well_known
            .get()
            .and_then(|types| types.get(kind as usize))
            .cloned()
            .ok_or(ContextNotInitialized)
    }

    /// Returns true if `ty` is the well-known type `kind`
    #[must_use]
    pub fn is_well_known_type(&self, ty: &TypeDesc, kind: WellKnownType) -> bool {
        self.well_known
            .get()
            .and_then(|types| types.get(kind as usize))
            .is_some_and(|known| std::ptr::eq(known.as_ref(), ty))
    }

    /// The canonical instantiation of the generic definition `definition`.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeError`] if `definition` is not a metadata type or the
    /// number of arguments differs from its number of generic parameters.
    pub fn instantiated_type(
        &self,
        definition: &TypeRc,
        instantiation: Instantiation,
    ) -> Result<TypeRc> {
        let key = (definition.clone(), instantiation);
        if let Some(existing) = self.instantiated_types.get(&key) {
            return Ok(existing.value().clone());
        }

        let Some(metadata) = definition.as_metadata() else {
            return Err(TypeError(format!(
                "{definition} is not a generic type definition"
            )));
        };
        let expected = metadata.instantiation()?.len();
        if expected == 0 || expected != key.1.len() {
            return Err(TypeError(format!(
                "{definition} takes {expected} type arguments, {} given",
                key.1.len()
            )));
        }

        trace!(definition = %definition, arguments = ?key.1, "interning instantiated type");
        let kind = TypeKind::Instantiated(InstantiatedType::new(key.0.clone(), key.1.clone()));
        Ok(self
            .instantiated_types
            .entry(key)
            .or_insert_with(|| TypeDesc::new(self.this.clone(), kind))
            .value()
            .clone())
    }

    fn parameterized_type(&self, kind: ParameterizedKind, parameter: &TypeRc) -> TypeRc {
        let key = (parameter.clone(), kind);
        if let Some(existing) = self.parameterized_types.get(&key) {
            return existing.value().clone();
        }

        self.parameterized_types
            .entry(key)
            .or_insert_with(|| {
                TypeDesc::new(
                    self.this.clone(),
                    TypeKind::Parameterized(ParameterizedType::new(kind, parameter.clone())),
                )
            })
            .value()
            .clone()
    }

    /// The canonical single-dimensional, zero-based array of `element`
    #[must_use]
    pub fn sz_array_type(&self, element: &TypeRc) -> TypeRc {
        self.parameterized_type(ParameterizedKind::SzArray, element)
    }

    /// The canonical multi-dimensional array of `element`.
    ///
    /// A rank 1 array is distinct from the single-dimensional array of the same element.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeError`] for a rank of 0 or above 32.
    pub fn array_type(&self, element: &TypeRc, rank: u32) -> Result<TypeRc> {
        if rank == 0 || rank > MAX_ARRAY_RANK {
            return Err(TypeError(format!("invalid array rank {rank}")));
        }
        Ok(self.parameterized_type(ParameterizedKind::Array(rank), element))
    }

    /// The canonical managed reference to `target`
    #[must_use]
    pub fn by_ref_type(&self, target: &TypeRc) -> TypeRc {
        self.parameterized_type(ParameterizedKind::ByRef, target)
    }

    /// The canonical unmanaged pointer to `target`
    #[must_use]
    pub fn pointer_type(&self, target: &TypeRc) -> TypeRc {
        self.parameterized_type(ParameterizedKind::Pointer, target)
    }

    /// The canonical signature variable `!index`, or `!!index` for method variables
    #[must_use]
    pub fn signature_variable(&self, index: u32, is_method: bool) -> TypeRc {
        let key = SignatureVariable { index, is_method };
        if let Some(existing) = self.signature_variables.get(&key) {
            return existing.value().clone();
        }

        self.signature_variables
            .entry(key)
            .or_insert_with(|| TypeDesc::new(self.this.clone(), TypeKind::SignatureVariable(key)))
            .value()
            .clone()
    }

    /// The canonical view of the definition method `method` on the instantiated type `owner`
    #[must_use]
    pub fn method_on_instantiated_type(&self, method: &MethodRc, owner: &TypeRc) -> MethodRc {
        let key = (owner.clone(), method.clone());
        if let Some(existing) = self.methods_on_instantiated_types.get(&key) {
            return existing.value().clone();
        }

        self.methods_on_instantiated_types
            .entry(key)
            .or_insert_with(|| {
                Arc::new(MethodDesc::new_on_instantiated_type(
                    method.clone(),
                    owner.clone(),
                ))
            })
            .value()
            .clone()
    }

    /// The canonical view of the definition field `field` on the instantiated type `owner`
    #[must_use]
    pub fn field_on_instantiated_type(&self, field: &FieldRc, owner: &TypeRc) -> FieldRc {
        let key = (owner.clone(), field.clone());
        if let Some(existing) = self.fields_on_instantiated_types.get(&key) {
            return existing.value().clone();
        }

        self.fields_on_instantiated_types
            .entry(key)
            .or_insert_with(|| {
                Arc::new(FieldDesc::new_on_instantiated_type(
                    field.clone(),
                    owner.clone(),
                ))
            })
            .value()
            .clone()
    }
}

impl std::fmt::Debug for TypeSystemContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeSystemContext")
            .field("system_module", &self.options.system_module)
            .field("modules", &self.modules.count())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
