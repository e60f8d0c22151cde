//! The canonical type node.
//!
//! Every type the type system knows about is one [`TypeDesc`], shared as a [`TypeRc`]. The
//! variant specific data lives in [`TypeKind`]; the methods on [`TypeDesc`] dispatch over it
//! so callers can ask any type for its name, base type, flags or members without knowing how
//! it was constructed.
//!
//! Identity is reference identity. The module, or for constructed types the context, hands
//! out exactly one node per key, so two `TypeRc`s denote the same type iff they point to the
//! same node.

use std::{
    borrow::Cow,
    fmt,
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Weak,
    },
};

use tracing::trace;

use crate::{
    metadata::typesystem::{
        flags::FlagCache,
        hash::{
            compute_array_type_hash_code, compute_byref_type_hash_code,
            compute_generic_instance_hash_code, compute_name_hash_code,
            compute_pointer_type_hash_code, compute_signature_variable_hash_code,
        },
        virtuals, AttributeFlags, ClassLayoutMetadata, FieldRc, Fields, FlagCategory,
        GenericParameterDesc, GenericVariance, InstantiatedType, Instantiation, MemberSource,
        MetadataType, MethodFilter, MethodRc, MethodSignature, Methods, ModuleDesc,
        ParameterizedKind, ParameterizedType, PInvokeStringFormat, SignatureVariable,
        TypeCategory, TypeFlags, TypeSystemContext, WellKnownType,
    },
    Error::{Dropped, TypeError},
    Result,
};

/// A shared, canonical type descriptor
pub type TypeRc = Arc<TypeDesc>;

/// How a type was constructed
pub enum TypeKind {
    /// A `TypeDef` row
    Metadata(MetadataType),
    /// A generic definition closed over type arguments
    Instantiated(InstantiatedType),
    /// A generic parameter of a type or method definition
    GenericParameter(GenericParameterDesc),
    /// `!n` or `!!n` inside a signature
    SignatureVariable(SignatureVariable),
    /// An array, by-ref or pointer over another type
    Parameterized(ParameterizedType),
}

/// A type known to the type system.
pub struct TypeDesc {
    this: Weak<TypeDesc>,
    context: Weak<TypeSystemContext>,
    kind: TypeKind,
    flags: FlagCache,
    hash: AtomicU32,
}

impl TypeDesc {
    pub(crate) fn new(context: Weak<TypeSystemContext>, kind: TypeKind) -> TypeRc {
        Arc::new_cyclic(|this| TypeDesc {
            this: this.clone(),
            context,
            kind,
            flags: FlagCache::default(),
            hash: AtomicU32::new(0),
        })
    }

    /// The variant data
    #[must_use]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// The `TypeDef` data, for metadata types
    #[must_use]
    pub fn as_metadata(&self) -> Option<&MetadataType> {
        match &self.kind {
            TypeKind::Metadata(metadata) => Some(metadata),
            _ => None,
        }
    }

    /// Definition and arguments, for instantiated types
    #[must_use]
    pub fn as_instantiated(&self) -> Option<&InstantiatedType> {
        match &self.kind {
            TypeKind::Instantiated(instantiated) => Some(instantiated),
            _ => None,
        }
    }

    /// The `GenericParam` data, for generic parameters
    #[must_use]
    pub fn as_generic_parameter(&self) -> Option<&GenericParameterDesc> {
        match &self.kind {
            TypeKind::GenericParameter(parameter) => Some(parameter),
            _ => None,
        }
    }

    /// Index and kind, for signature variables
    #[must_use]
    pub fn as_signature_variable(&self) -> Option<SignatureVariable> {
        match &self.kind {
            TypeKind::SignatureVariable(variable) => Some(*variable),
            _ => None,
        }
    }

    /// Shape and parameter type, for arrays, by-refs and pointers
    #[must_use]
    pub fn as_parameterized(&self) -> Option<&ParameterizedType> {
        match &self.kind {
            TypeKind::Parameterized(parameterized) => Some(parameterized),
            _ => None,
        }
    }

    /// The `MetadataType` behind a definition or an instantiation of it
    #[must_use]
    pub fn type_definition(&self) -> Option<&MetadataType> {
        match &self.kind {
            TypeKind::Metadata(metadata) => Some(metadata),
            TypeKind::Instantiated(instantiated) => instantiated.definition().as_metadata(),
            _ => None,
        }
    }

    /// A new shared handle to this node.
    ///
    /// # Errors
    /// Returns [`crate::Error::Dropped`] while the node is being torn down.
    pub fn to_rc(&self) -> Result<TypeRc> {
        self.this.upgrade().ok_or(Dropped("type"))
    }

    /// The context this type belongs to.
    ///
    /// # Errors
    /// Returns [`crate::Error::Dropped`] once the context is gone.
    pub fn context(&self) -> Result<Arc<TypeSystemContext>> {
        self.context.upgrade().ok_or(Dropped("type system context"))
    }

    /// The module whose metadata defines this type, `None` for signature variables.
    ///
    /// Constructed types report the module of the type they are constructed from.
    ///
    /// # Errors
    /// Returns [`crate::Error::Dropped`] once the module is gone.
    pub fn module(&self) -> Result<Option<Arc<ModuleDesc>>> {
        match &self.kind {
            TypeKind::Metadata(metadata) => metadata.module().map(Some),
            TypeKind::Instantiated(instantiated) => instantiated.definition().module(),
            TypeKind::GenericParameter(parameter) => parameter.module().map(Some),
            TypeKind::Parameterized(parameterized) => parameterized.parameter_type().module(),
            TypeKind::SignatureVariable(_) => Ok(None),
        }
    }

    /// Simple name, e.g. `List`1`, `Int32[]` or `!0`.
    ///
    /// # Errors
    /// Returns an error if the name cannot be decoded from the metadata.
    pub fn name(&self) -> Result<Cow<'_, str>> {
        match &self.kind {
            TypeKind::Metadata(metadata) => metadata.name().map(Cow::Borrowed),
            TypeKind::Instantiated(instantiated) => instantiated.definition().name(),
            TypeKind::GenericParameter(parameter) => parameter.name().map(Cow::Borrowed),
            TypeKind::SignatureVariable(variable) => Ok(Cow::Owned(variable_name(*variable))),
            TypeKind::Parameterized(parameterized) => {
                let element = parameterized.parameter_type().name()?;
                Ok(Cow::Owned(format!("{element}{}", parameterized.suffix())))
            }
        }
    }

    /// Namespace, empty for nested types and types without one.
    ///
    /// # Errors
    /// Returns an error if the namespace cannot be decoded from the metadata.
    pub fn namespace(&self) -> Result<Cow<'_, str>> {
        match &self.kind {
            TypeKind::Metadata(metadata) => metadata.namespace().map(Cow::Borrowed),
            TypeKind::Instantiated(instantiated) => instantiated.definition().namespace(),
            TypeKind::Parameterized(parameterized) => parameterized.parameter_type().namespace(),
            TypeKind::GenericParameter(_) | TypeKind::SignatureVariable(_) => {
                Ok(Cow::Borrowed(""))
            }
        }
    }

    /// Qualified name, `Namespace.Outer+Inner`, with type arguments in angle brackets.
    ///
    /// # Errors
    /// Returns an error if a name cannot be decoded from the metadata.
    pub fn full_name(&self) -> Result<String> {
        match &self.kind {
            TypeKind::Metadata(metadata) => metadata.full_name(),
            TypeKind::Instantiated(instantiated) => {
                let arguments = instantiated
                    .instantiation()
                    .iter()
                    .map(|argument| argument.full_name())
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!(
                    "{}<{}>",
                    instantiated.definition().full_name()?,
                    arguments.join(",")
                ))
            }
            TypeKind::GenericParameter(parameter) => Ok(parameter.name()?.to_string()),
            TypeKind::SignatureVariable(variable) => Ok(variable_name(*variable)),
            TypeKind::Parameterized(parameterized) => Ok(format!(
                "{}{}",
                parameterized.parameter_type().full_name()?,
                parameterized.suffix()
            )),
        }
    }

    /// The enclosing type of a nested type.
    ///
    /// # Errors
    /// Returns an error if the enclosing type cannot be resolved.
    pub fn containing_type(&self) -> Result<Option<TypeRc>> {
        match &self.kind {
            TypeKind::Metadata(metadata) => metadata.containing_type(),
            TypeKind::Instantiated(instantiated) => instantiated.definition().containing_type(),
            _ => Ok(None),
        }
    }

    /// The type this type derives from.
    ///
    /// Interfaces, `System.Object`, generic parameters, by-refs and pointers have none. Arrays
    /// derive from `System.Array`.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeLoad`] if the metadata names a base type that cannot be
    /// resolved. The failure is not remembered; asking again retries.
    pub fn base_type(&self) -> Result<Option<TypeRc>> {
        match &self.kind {
            TypeKind::Metadata(metadata) => metadata.base_type(),
            TypeKind::Instantiated(instantiated) => instantiated.base_type(),
            TypeKind::Parameterized(parameterized) => match parameterized.kind() {
                ParameterizedKind::SzArray | ParameterizedKind::Array(_) => Ok(Some(
                    self.context()?.get_well_known_type(WellKnownType::Array)?,
                )),
                ParameterizedKind::ByRef | ParameterizedKind::Pointer => Ok(None),
            },
            TypeKind::GenericParameter(_) | TypeKind::SignatureVariable(_) => Ok(None),
        }
    }

    /// Returns true if [`TypeDesc::base_type`] is some.
    ///
    /// # Errors
    /// See [`TypeDesc::base_type`].
    pub fn has_base_type(&self) -> Result<bool> {
        Ok(self.base_type()?.is_some())
    }

    /// Generic parameters of a definition or arguments of an instantiation, empty otherwise.
    ///
    /// # Errors
    /// Returns an error if a generic parameter row cannot be resolved.
    pub fn instantiation(&self) -> Result<Instantiation> {
        match &self.kind {
            TypeKind::Metadata(metadata) => metadata.instantiation().cloned(),
            TypeKind::Instantiated(instantiated) => Ok(instantiated.instantiation().clone()),
            _ => Ok(Instantiation::empty()),
        }
    }

    /// Returns true for metadata types declaring generic parameters.
    ///
    /// # Errors
    /// See [`TypeDesc::instantiation`].
    pub fn is_generic_definition(&self) -> Result<bool> {
        match &self.kind {
            TypeKind::Metadata(metadata) => Ok(!metadata.instantiation()?.is_empty()),
            _ => Ok(false),
        }
    }

    /// Returns true if this type is the well-known type `kind`.
    ///
    /// Before the context is initialized no type is well-known.
    #[must_use]
    pub fn is_well_known_type(&self, kind: WellKnownType) -> bool {
        self.context
            .upgrade()
            .is_some_and(|context| context.is_well_known_type(self, kind))
    }

    /// Compute the flag categories in `requested`.
    ///
    /// Categories already published are returned as cached; only the missing ones are
    /// computed. Concurrent callers may compute the same category twice, the first published
    /// value wins. The returned flags carry exactly the requested categories.
    ///
    /// # Errors
    /// Returns [`crate::Error::ContextNotInitialized`] for category derivation before the
    /// context is initialized, and load errors from base type or finalizer resolution.
    pub fn compute_flags(&self, requested: FlagCategory) -> Result<TypeFlags> {
        let cached = self.flags.snapshot(requested);
        let missing = requested.difference(cached.computed());
        if missing.is_empty() {
            return Ok(cached);
        }

        let mut computed = TypeFlags::default();
        if missing.contains(FlagCategory::CATEGORY) {
            computed.category = Some(self.compute_category()?);
        }
        if missing.contains(FlagCategory::GENERIC_VARIANCE) {
            computed.has_generic_variance = Some(self.compute_generic_variance()?);
        }
        if missing.contains(FlagCategory::FINALIZER) {
            computed.has_finalizer = Some(self.get_finalizer()?.is_some());
        }
        if missing.contains(FlagCategory::ATTRIBUTES) {
            computed.attributes = Some(self.compute_attribute_flags()?);
        }

        trace!(categories = ?missing, "computed type flags");
        let published = self.flags.publish(computed);

        Ok(TypeFlags {
            category: cached.category.or(published.category),
            has_generic_variance: cached
                .has_generic_variance
                .or(published.has_generic_variance),
            has_finalizer: cached.has_finalizer.or(published.has_finalizer),
            attributes: cached.attributes.or(published.attributes),
        })
    }

    /// Fix the category of a well-known type ahead of derivation
    pub(crate) fn fix_category(&self, category: TypeCategory) -> bool {
        self.flags.fix_category(category)
    }

    fn compute_category(&self) -> Result<TypeCategory> {
        match &self.kind {
            TypeKind::Metadata(metadata) => {
                let context = self.context()?;
                let value_type = context.get_well_known_type(WellKnownType::ValueType)?;
                let enum_type = context.get_well_known_type(WellKnownType::Enum)?;

                Ok(match metadata.base_type()? {
                    Some(base) if Arc::ptr_eq(&base, &value_type) => TypeCategory::ValueType,
                    Some(base) if Arc::ptr_eq(&base, &enum_type) => TypeCategory::Enum,
                    _ if metadata.is_interface() => TypeCategory::Interface,
                    _ => TypeCategory::Class,
                })
            }
            TypeKind::Instantiated(instantiated) => instantiated.definition().category(),
            TypeKind::GenericParameter(_) => Ok(TypeCategory::GenericParameter),
            TypeKind::SignatureVariable(variable) => Ok(if variable.is_method {
                TypeCategory::SignatureMethodVariable
            } else {
                TypeCategory::SignatureTypeVariable
            }),
            TypeKind::Parameterized(parameterized) => Ok(match parameterized.kind() {
                ParameterizedKind::SzArray => TypeCategory::SzArray,
                ParameterizedKind::Array(_) => TypeCategory::Array,
                ParameterizedKind::ByRef => TypeCategory::ByRef,
                ParameterizedKind::Pointer => TypeCategory::Pointer,
            }),
        }
    }

    fn compute_generic_variance(&self) -> Result<bool> {
        match &self.kind {
            TypeKind::Metadata(metadata) => Ok(metadata.instantiation()?.iter().any(|parameter| {
                parameter
                    .as_generic_parameter()
                    .is_some_and(|parameter| parameter.variance() != GenericVariance::None)
            })),
            TypeKind::Instantiated(instantiated) => {
                instantiated.definition().has_generic_variance()
            }
            _ => Ok(false),
        }
    }

    fn compute_attribute_flags(&self) -> Result<AttributeFlags> {
        match &self.kind {
            TypeKind::Metadata(metadata) => metadata.scan_attribute_flags(self.is_value_type()?),
            TypeKind::Instantiated(instantiated) => instantiated.definition().attribute_flags(),
            _ => Ok(AttributeFlags::empty()),
        }
    }

    /// The derived category.
    ///
    /// # Errors
    /// See [`TypeDesc::compute_flags`].
    pub fn category(&self) -> Result<TypeCategory> {
        self.compute_flags(FlagCategory::CATEGORY)?
            .category
            .ok_or_else(|| TypeError("category was not computed".to_string()))
    }

    /// The marker attributes found on the type.
    ///
    /// # Errors
    /// See [`TypeDesc::compute_flags`].
    pub fn attribute_flags(&self) -> Result<AttributeFlags> {
        self.compute_flags(FlagCategory::ATTRIBUTES)?
            .attributes
            .ok_or_else(|| TypeError("attribute flags were not computed".to_string()))
    }

    /// Value types, enums, nullables and primitives.
    ///
    /// # Errors
    /// See [`TypeDesc::compute_flags`].
    pub fn is_value_type(&self) -> Result<bool> {
        Ok(self.category()?.is_value_type())
    }

    /// # Errors
    /// See [`TypeDesc::compute_flags`].
    pub fn is_enum(&self) -> Result<bool> {
        Ok(self.category()? == TypeCategory::Enum)
    }

    /// # Errors
    /// See [`TypeDesc::compute_flags`].
    pub fn is_interface(&self) -> Result<bool> {
        Ok(self.category()? == TypeCategory::Interface)
    }

    /// Reference types that are not interfaces, arrays or pointers.
    ///
    /// # Errors
    /// See [`TypeDesc::compute_flags`].
    pub fn is_class(&self) -> Result<bool> {
        Ok(self.category()? == TypeCategory::Class)
    }

    /// # Errors
    /// See [`TypeDesc::compute_flags`].
    pub fn is_primitive(&self) -> Result<bool> {
        Ok(self.category()?.is_primitive())
    }

    /// # Errors
    /// See [`TypeDesc::compute_flags`].
    pub fn is_nullable(&self) -> Result<bool> {
        Ok(self.category()? == TypeCategory::Nullable)
    }

    /// Returns true if any generic parameter of the definition is co- or contravariant.
    ///
    /// # Errors
    /// See [`TypeDesc::compute_flags`].
    pub fn has_generic_variance(&self) -> Result<bool> {
        self.compute_flags(FlagCategory::GENERIC_VARIANCE)?
            .has_generic_variance
            .ok_or_else(|| TypeError("generic variance was not computed".to_string()))
    }

    /// Returns true if the type overrides `System.Object.Finalize`.
    ///
    /// # Errors
    /// See [`TypeDesc::get_finalizer`].
    pub fn has_finalizer(&self) -> Result<bool> {
        self.compute_flags(FlagCategory::FINALIZER)?
            .has_finalizer
            .ok_or_else(|| TypeError("finalizer presence was not computed".to_string()))
    }

    /// A value type marked `IsByRefLikeAttribute` (a `ref struct`).
    ///
    /// # Errors
    /// See [`TypeDesc::compute_flags`].
    pub fn is_byref_like(&self) -> Result<bool> {
        Ok(self.attribute_flags()?.contains(AttributeFlags::IS_BYREF_LIKE))
    }

    /// # Errors
    /// See [`TypeDesc::compute_flags`].
    pub fn is_intrinsic(&self) -> Result<bool> {
        Ok(self.attribute_flags()?.contains(AttributeFlags::IS_INTRINSIC))
    }

    /// A value type marked `InlineArrayAttribute`.
    ///
    /// # Errors
    /// See [`TypeDesc::compute_flags`].
    pub fn is_inline_array(&self) -> Result<bool> {
        Ok(self.attribute_flags()?.contains(AttributeFlags::IS_INLINE_ARRAY))
    }

    /// Returns true for single and multi-dimensional arrays
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.as_parameterized()
            .is_some_and(|p| matches!(p.kind(), ParameterizedKind::SzArray | ParameterizedKind::Array(_)))
    }

    /// Returns true for single dimension, zero based arrays
    #[must_use]
    pub fn is_sz_array(&self) -> bool {
        self.as_parameterized()
            .is_some_and(|p| p.kind() == ParameterizedKind::SzArray)
    }

    /// Returns true for managed references
    #[must_use]
    pub fn is_byref(&self) -> bool {
        self.as_parameterized()
            .is_some_and(|p| p.kind() == ParameterizedKind::ByRef)
    }

    /// Returns true for unmanaged pointers
    #[must_use]
    pub fn is_pointer(&self) -> bool {
        self.as_parameterized()
            .is_some_and(|p| p.kind() == ParameterizedKind::Pointer)
    }

    /// Returns true for generic parameters
    #[must_use]
    pub fn is_generic_parameter(&self) -> bool {
        matches!(self.kind, TypeKind::GenericParameter(_))
    }

    /// Returns true for `!n` and `!!n`
    #[must_use]
    pub fn is_signature_variable(&self) -> bool {
        matches!(self.kind, TypeKind::SignatureVariable(_))
    }

    /// Where the members of this type come from: the definition, viewed through this type
    pub(crate) fn member_source(&self) -> Result<Option<MemberSource>> {
        let definition = match &self.kind {
            TypeKind::Metadata(_) => self.to_rc()?,
            TypeKind::Instantiated(instantiated) => instantiated.definition().clone(),
            _ => return Ok(None),
        };
        let Some(metadata) = definition.as_metadata() else {
            return Ok(None);
        };

        Ok(Some(MemberSource {
            module: metadata.module()?,
            definition: definition.clone(),
            owner: self.to_rc()?,
        }))
    }

    /// Methods declared by the type, in row order.
    ///
    /// The sequence is lazy: each item resolves one method. Calling this again starts a new
    /// enumeration. Instantiated types yield views of the definition's methods.
    ///
    /// # Errors
    /// Returns an error if the type's row cannot be read.
    pub fn get_methods(&self) -> Result<Methods> {
        Methods::new(self.member_source()?, MethodFilter::All)
    }

    /// The virtual methods among [`TypeDesc::get_methods`]
    ///
    /// # Errors
    /// Returns an error if the type's row cannot be read.
    pub fn get_virtual_methods(&self) -> Result<Methods> {
        Methods::new(self.member_source()?, MethodFilter::Virtual)
    }

    /// Methods named `name`, in row order
    pub(crate) fn get_methods_named(&self, name: &str) -> Result<Methods> {
        Methods::new(self.member_source()?, MethodFilter::Named(name.to_string()))
    }

    /// Find a method by name, and by exact signature if one is given.
    ///
    /// Each candidate's signature has `substitution` applied before it is compared. Without a
    /// signature, the first method with the name is returned.
    ///
    /// # Errors
    /// Returns an error if a candidate's signature cannot be resolved.
    pub fn get_method(
        &self,
        name: &str,
        signature: Option<&MethodSignature>,
        substitution: Option<&Instantiation>,
    ) -> Result<Option<MethodRc>> {
        self.find_method(name, signature, substitution, |wanted, candidate| {
            wanted == candidate
        })
    }

    /// Like [`TypeDesc::get_method`], comparing with [`MethodSignature::equivalent_to`]
    ///
    /// # Errors
    /// Returns an error if a candidate's signature cannot be resolved.
    pub fn get_method_with_equivalent_signature(
        &self,
        name: &str,
        signature: Option<&MethodSignature>,
        substitution: Option<&Instantiation>,
    ) -> Result<Option<MethodRc>> {
        self.find_method(name, signature, substitution, MethodSignature::equivalent_to)
    }

    fn find_method(
        &self,
        name: &str,
        signature: Option<&MethodSignature>,
        substitution: Option<&Instantiation>,
        matches: impl Fn(&MethodSignature, &MethodSignature) -> bool,
    ) -> Result<Option<MethodRc>> {
        for method in self.get_methods_named(name)? {
            let method = method?;
            let Some(wanted) = signature else {
                return Ok(Some(method));
            };

            let candidate = method.signature()?.substituted(substitution)?;
            if matches(wanted, &candidate) {
                return Ok(Some(method));
            }
        }

        Ok(None)
    }

    /// The type initializer, `.cctor`.
    ///
    /// # Errors
    /// Returns an error if a method row cannot be read.
    pub fn get_static_constructor(&self) -> Result<Option<MethodRc>> {
        for method in self.get_methods_named(".cctor")? {
            let method = method?;
            if method.is_runtime_special_name() {
                return Ok(Some(method));
            }
        }
        Ok(None)
    }

    /// The public parameterless instance constructor.
    ///
    /// Abstract types have none. Candidates are checked in row order; vararg constructors do
    /// not qualify.
    ///
    /// # Errors
    /// Returns an error if a candidate's signature cannot be resolved.
    pub fn get_default_constructor(&self) -> Result<Option<MethodRc>> {
        if self.type_definition().is_some_and(MetadataType::is_abstract) {
            return Ok(None);
        }

        for method in self.get_methods_named(".ctor")? {
            let method = method?;
            if !method.is_runtime_special_name() || !method.is_public() {
                continue;
            }

            let signature = method.signature()?;
            if signature.is_empty() && !signature.is_vararg() {
                return Ok(Some(method));
            }
        }
        Ok(None)
    }

    /// The override of `System.Object.Finalize` reached by virtual dispatch on this type.
    ///
    /// Returns `None` for types without a base type, for core libraries that do not declare
    /// `Finalize`, and for types that inherit the root implementation unchanged.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeLoad`] if dispatch finds no implementation at all, which
    /// means the inheritance chain is not rooted at `System.Object`, and
    /// [`crate::Error::RecursionLimit`] for cyclic chains.
    pub fn get_finalizer(&self) -> Result<Option<MethodRc>> {
        if !self.has_base_type()? {
            return Ok(None);
        }

        let object = self
            .context()?
            .get_well_known_type(WellKnownType::Object)?;
        let Some(declaration) = object.get_method("Finalize", None, None)? else {
            return Ok(None);
        };

        let Some(target) = self.resolve_virtual_method(&declaration)? else {
            return Err(self.load_error("the inheritance chain is not rooted at System.Object"));
        };

        if Arc::ptr_eq(target.owning_type(), &object) {
            Ok(None)
        } else {
            Ok(Some(target))
        }
    }

    /// The implementation of the virtual method `declaration` that a call on an instance of
    /// this type dispatches to, searching this type and then its base types.
    ///
    /// # Errors
    /// Returns an error if a base type or signature cannot be resolved, or
    /// [`crate::Error::RecursionLimit`] for cyclic inheritance.
    pub fn resolve_virtual_method(&self, declaration: &MethodRc) -> Result<Option<MethodRc>> {
        virtuals::find_virtual_function_target_method(self, declaration)
    }

    /// Fields declared by the type, in row order.
    ///
    /// # Errors
    /// Returns an error if the type's row cannot be read.
    pub fn get_fields(&self) -> Result<Fields> {
        Fields::new(self.member_source()?, None)
    }

    /// Find a field by name.
    ///
    /// # Errors
    /// Returns an error if a field row cannot be read.
    pub fn get_field(&self, name: &str) -> Result<Option<FieldRc>> {
        Fields::new(self.member_source()?, Some(name.to_string()))?
            .next()
            .transpose()
    }

    /// Types nested directly in this type.
    ///
    /// # Errors
    /// Returns an error if a nested type cannot be resolved.
    pub fn get_nested_types(&self) -> Result<Vec<TypeRc>> {
        match self.type_definition() {
            Some(metadata) => metadata.get_nested_types(),
            None => Ok(Vec::new()),
        }
    }

    /// Find a nested type by name.
    ///
    /// Nested types declaring a namespace are matched by `Namespace.Name`, all others by
    /// their simple name.
    ///
    /// # Errors
    /// Returns an error if a nested type row cannot be read.
    pub fn get_nested_type(&self, name: &str) -> Result<Option<TypeRc>> {
        match self.type_definition() {
            Some(metadata) => metadata.get_nested_type(name),
            None => Ok(None),
        }
    }

    /// Returns true if a custom attribute of type `namespace.name` is applied to the type.
    ///
    /// # Errors
    /// Returns an error if an attribute row cannot be read.
    pub fn has_custom_attribute(&self, namespace: &str, name: &str) -> Result<bool> {
        match self.type_definition() {
            Some(metadata) => metadata.has_custom_attribute(namespace, name),
            None => Ok(false),
        }
    }

    /// The element count of an inline array.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeError`] if the type is not an inline array, or an error if
    /// the attribute value cannot be decoded.
    pub fn get_inline_array_length(&self) -> Result<i32> {
        if !self.is_inline_array()? {
            return Err(TypeError(format!(
                "{} is not an inline array",
                self.full_name()?
            )));
        }

        match self.type_definition() {
            Some(metadata) => metadata.inline_array_length(),
            None => Ok(0),
        }
    }

    /// Packing and size from the `ClassLayout` table, zero when unspecified
    #[must_use]
    pub fn get_class_layout(&self) -> ClassLayoutMetadata {
        self.type_definition()
            .map(MetadataType::get_class_layout)
            .unwrap_or_default()
    }

    /// The type an enum is stored as; any other type is its own underlying type.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeLoad`] for an enum without an instance field.
    pub fn underlying_type(&self) -> Result<TypeRc> {
        if !self.is_enum()? {
            return self.to_rc();
        }

        for field in self.get_fields()? {
            let field = field?;
            if !field.is_static() {
                return Ok(field.field_type()?.clone());
            }
        }

        Err(self.load_error("enum does not declare an instance field"))
    }

    /// `TypeDef` flags of the definition, 0 for other types
    #[must_use]
    pub fn attributes(&self) -> u32 {
        self.type_definition().map_or(0, MetadataType::attributes)
    }

    /// # Errors
    /// See [`TypeDesc::compute_flags`].
    pub fn is_sealed(&self) -> Result<bool> {
        match self.type_definition() {
            Some(metadata) => Ok(metadata.is_sealed()),
            None => Ok(self.is_array() || self.is_value_type()?),
        }
    }

    /// Returns true for abstract definitions and interfaces
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.type_definition().is_some_and(MetadataType::is_abstract)
    }

    /// Returns true for explicit field layout
    #[must_use]
    pub fn is_explicit_layout(&self) -> bool {
        self.type_definition()
            .is_some_and(MetadataType::is_explicit_layout)
    }

    /// Returns true for sequential field layout
    #[must_use]
    pub fn is_sequential_layout(&self) -> bool {
        self.type_definition()
            .is_some_and(MetadataType::is_sequential_layout)
    }

    /// Returns true if the type initializer may run lazily
    #[must_use]
    pub fn is_before_field_init(&self) -> bool {
        self.type_definition()
            .is_some_and(MetadataType::is_before_field_init)
    }

    /// Returns true for the `<Module>` type holding global members
    #[must_use]
    pub fn is_module_type(&self) -> bool {
        self.as_metadata().is_some_and(MetadataType::is_module_type)
    }

    /// String marshalling of the definition
    #[must_use]
    pub fn pinvoke_string_format(&self) -> Option<PInvokeStringFormat> {
        self.type_definition()
            .map(MetadataType::pinvoke_string_format)
    }

    /// The identity hash, derived from the type's name and structure.
    ///
    /// Equal types hash equally in every session. The value is cached after the first call.
    ///
    /// # Errors
    /// Returns an error if a name cannot be decoded.
    pub fn hash_code(&self) -> Result<u32> {
        let cached = self.hash.load(Ordering::Acquire);
        if cached != 0 {
            return Ok(cached);
        }

        let computed = match &self.kind {
            TypeKind::Metadata(metadata) => metadata.compute_hash_code()?,
            TypeKind::Instantiated(instantiated) => compute_generic_instance_hash_code(
                instantiated.definition().hash_code()?,
                instantiated
                    .instantiation()
                    .iter()
                    .map(|argument| argument.hash_code())
                    .collect::<Result<Vec<_>>>()?,
            ),
            TypeKind::GenericParameter(parameter) => compute_name_hash_code(parameter.name()?),
            TypeKind::SignatureVariable(variable) => {
                compute_signature_variable_hash_code(variable.index, variable.is_method)
            }
            TypeKind::Parameterized(parameterized) => {
                let parameter = parameterized.parameter_type().hash_code()?;
                match parameterized.kind() {
                    ParameterizedKind::SzArray => compute_array_type_hash_code(parameter, None),
                    ParameterizedKind::Array(rank) => {
                        compute_array_type_hash_code(parameter, Some(rank))
                    }
                    ParameterizedKind::ByRef => compute_byref_type_hash_code(parameter),
                    ParameterizedKind::Pointer => compute_pointer_type_hash_code(parameter),
                }
            }
        };

        self.hash.store(computed, Ordering::Release);
        Ok(computed)
    }

    /// Replace signature variables by the matching entries of `type_arguments` and
    /// `method_arguments`.
    ///
    /// Variables without a matching argument are kept. Types without variables return
    /// themselves.
    ///
    /// # Errors
    /// Returns an error if a substituted type cannot be constructed.
    pub fn instantiate_signature(
        &self,
        type_arguments: &Instantiation,
        method_arguments: &Instantiation,
    ) -> Result<TypeRc> {
        match &self.kind {
            TypeKind::SignatureVariable(variable) => {
                let arguments = if variable.is_method {
                    method_arguments
                } else {
                    type_arguments
                };
                match arguments.get(variable.index as usize) {
                    Some(argument) => Ok(argument.clone()),
                    None => self.to_rc(),
                }
            }
            TypeKind::Instantiated(instantiated) => {
                let mut changed = false;
                let mut arguments = Vec::with_capacity(instantiated.instantiation().len());
                for argument in instantiated.instantiation().iter() {
                    let substituted =
                        argument.instantiate_signature(type_arguments, method_arguments)?;
                    changed |= !Arc::ptr_eq(argument, &substituted);
                    arguments.push(substituted);
                }

                if changed {
                    self.context()?
                        .instantiated_type(instantiated.definition(), Instantiation::new(arguments))
                } else {
                    self.to_rc()
                }
            }
            TypeKind::Parameterized(parameterized) => {
                let parameter = parameterized.parameter_type();
                let substituted =
                    parameter.instantiate_signature(type_arguments, method_arguments)?;
                if Arc::ptr_eq(parameter, &substituted) {
                    return self.to_rc();
                }

                let context = self.context()?;
                match parameterized.kind() {
                    ParameterizedKind::SzArray => Ok(context.sz_array_type(&substituted)),
                    ParameterizedKind::Array(rank) => context.array_type(&substituted, rank),
                    ParameterizedKind::ByRef => Ok(context.by_ref_type(&substituted)),
                    ParameterizedKind::Pointer => Ok(context.pointer_type(&substituted)),
                }
            }
            TypeKind::Metadata(_) | TypeKind::GenericParameter(_) => self.to_rc(),
        }
    }

    /// A load error reported against this type
    pub(crate) fn load_error(&self, reason: &str) -> crate::Error {
        let module = self
            .module()
            .ok()
            .flatten()
            .map(|module| module.name().to_string())
            .unwrap_or_default();
        let namespace = self
            .namespace()
            .map(Cow::into_owned)
            .unwrap_or_default();
        let name = self.name().map(Cow::into_owned).unwrap_or_default();

        crate::Error::TypeLoad {
            module,
            namespace,
            name,
            reason: reason.to_string(),
        }
    }
}

fn variable_name(variable: SignatureVariable) -> String {
    if variable.is_method {
        format!("!!{}", variable.index)
    } else {
        format!("!{}", variable.index)
    }
}

impl PartialEq for TypeDesc {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for TypeDesc {}

impl Hash for TypeDesc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self, state);
    }
}

impl fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.full_name() {
            Ok(name) => write!(f, "TypeDesc({name})"),
            Err(_) => write!(f, "TypeDesc({:p})", self),
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.full_name() {
            Ok(name) => f.write_str(&name),
            Err(_) => f.write_str("<unresolved type>"),
        }
    }
}
