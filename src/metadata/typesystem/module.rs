//! Modules: the owners of metadata-backed descriptors.
//!
//! A [`ModuleDesc`] wraps the [`MetadataReader`] of one module and turns its tokens into
//! canonical descriptors. Every `TypeDef`, `MethodDef`, `Field` and `GenericParam` row it
//! resolves is interned, so resolving a token twice returns the same `Arc`. `TypeRef`s are
//! followed to the module they name through the [`TypeSystemContext`]; `TypeSpec`s are
//! decoded and built through the context's canonicalizing constructors.
//!
//! # Thread Safety
//!
//! Resolution may be called from any number of threads. The intern tables insert atomically;
//! a thread that loses an insert race adopts the winner's descriptor.

use std::{
    collections::HashMap,
    sync::{Arc, OnceLock, Weak},
};

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::{
    metadata::{
        customattributes::{parse_custom_attribute_blob, CustomAttributeValue},
        reader::MetadataReader,
        signatures::{
            is_field_signature, CustomModifier, SignatureField, SignatureMethod,
            SignatureParameter, SignatureParser, TypeSignature,
        },
        tables::{CustomAttributeRaw, TableId},
        token::Token,
        typesystem::{
            EmbeddedModifier, FieldDesc, FieldRc, GenericParameterDesc, Instantiation,
            MetadataType, MethodDesc, MethodRc, MethodSignature, MethodSignatureFlags, TypeDesc,
            TypeKind, TypeRc, TypeSystemContext, WellKnownType,
        },
    },
    Error::{self, Dropped, NotSupported, TypeNotFound},
    Result,
};

/// Anything a token of a module can resolve to
#[derive(Debug, Clone)]
pub enum Entity {
    /// A `TypeDef`, `TypeRef`, `TypeSpec` or `GenericParam`
    Type(TypeRc),
    /// A `MethodDef`, or a `MemberRef` naming a method
    Method(MethodRc),
    /// A `Field`, or a `MemberRef` naming a field
    Field(FieldRc),
}

/// A module registered with a [`TypeSystemContext`].
pub struct ModuleDesc {
    /// Handed to the descriptors this module creates as their back-reference
    this: Weak<ModuleDesc>,
    /// The owning context, resolving references into other modules
    context: Weak<TypeSystemContext>,
    /// Assembly name other modules refer to this one by
    name: String,
    /// Limit passed to the signature parser
    max_signature_depth: usize,
    /// The metadata of this module
    reader: Box<dyn MetadataReader>,
    /// Resolved types by `TypeDef`, `TypeRef` and `TypeSpec` token
    types: SkipMap<Token, TypeRc>,
    /// Interned methods by `MethodDef` token
    methods: DashMap<Token, MethodRc>,
    /// Interned fields by `Field` token
    fields: DashMap<Token, FieldRc>,
    /// Interned generic parameters by `GenericParam` token
    generic_parameters: DashMap<Token, TypeRc>,
    /// Non-nested `TypeDef`s by (namespace, name), built on first lookup
    types_by_name: OnceLock<HashMap<(String, String), Token>>,
}

impl ModuleDesc {
    pub(crate) fn new(
        context: Weak<TypeSystemContext>,
        max_signature_depth: usize,
        reader: Box<dyn MetadataReader>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| ModuleDesc {
            this: this.clone(),
            context,
            name: reader.assembly_name().to_string(),
            max_signature_depth,
            reader,
            types: SkipMap::new(),
            methods: DashMap::new(),
            fields: DashMap::new(),
            generic_parameters: DashMap::new(),
            types_by_name: OnceLock::new(),
        })
    }

    /// The assembly name of the module
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The metadata of the module
    #[must_use]
    pub fn reader(&self) -> &dyn MetadataReader {
        self.reader.as_ref()
    }

    /// The context the module is registered with.
    ///
    /// # Errors
    /// Returns [`crate::Error::Dropped`] once the context is gone.
    pub fn context(&self) -> Result<Arc<TypeSystemContext>> {
        self.context.upgrade().ok_or(Dropped("type system context"))
    }

    /// Resolve a `TypeDef`, `TypeRef` or `TypeSpec` token.
    ///
    /// Returns `Ok(None)` for the nil token and for a `TypeRef` naming a module that is not
    /// registered or a type that module does not define.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] for a token without a row, and an error for
    /// malformed signatures or tokens of other tables.
    pub fn get_type(&self, token: Token) -> Result<Option<TypeRc>> {
        if token.is_null() {
            return Ok(None);
        }

        if let Some(entry) = self.types.get(&token) {
            return Ok(Some(entry.value().clone()));
        }

        let resolved = match token.table_id() {
            Some(TableId::TypeDef) => Some(self.create_type_def(token)?),
            Some(TableId::TypeRef) => self.resolve_type_ref(token)?,
            Some(TableId::TypeSpec) => Some(self.resolve_type_spec(token)?),
            _ => return Err(malformed_error!("Token {} does not denote a type", token)),
        };

        Ok(resolved.map(|ty| self.types.get_or_insert(token, ty).value().clone()))
    }

    fn create_type_def(&self, token: Token) -> Result<TypeRc> {
        let row = self.reader.type_def(token).ok_or(TypeNotFound(token))?;
        trace!(module = self.name.as_str(), %token, "created type");
        Ok(TypeDesc::new(
            self.context.clone(),
            TypeKind::Metadata(MetadataType::new(self.this.clone(), row)),
        ))
    }

    fn resolve_type_ref(&self, token: Token) -> Result<Option<TypeRc>> {
        let row = self.reader.type_ref(token).ok_or(TypeNotFound(token))?;
        let strings = self.reader.strings()?;
        let name = strings.get(row.type_name)?;
        let namespace = strings.get(row.type_namespace)?;
        let scope = row.resolution_scope;

        match scope.table_id() {
            Some(TableId::AssemblyRef) => {
                let assembly = self
                    .reader
                    .assembly_ref(scope)
                    .ok_or(TypeNotFound(scope))?;
                let assembly_name = strings.get(assembly.name)?;

                let Some(module) = self.context()?.module(assembly_name) else {
                    debug!(
                        module = self.name.as_str(),
                        assembly = assembly_name,
                        namespace,
                        name,
                        "type reference into an unregistered module"
                    );
                    return Ok(None);
                };
                module.get_type_by_name(namespace, name)
            }
            Some(TableId::Module) => self.get_type_by_name(namespace, name),
            Some(TableId::TypeRef) => {
                let Some(enclosing) = self.get_type(scope)? else {
                    return Ok(None);
                };
                if namespace.is_empty() {
                    enclosing.get_nested_type(name)
                } else {
                    enclosing.get_nested_type(&format!("{namespace}.{name}"))
                }
            }
            Some(TableId::ModuleRef) => Err(NotSupported(format!(
                "type reference {token} scoped to a module reference"
            ))),
            _ => Err(malformed_error!(
                "Invalid resolution scope {} for type reference {}",
                scope,
                token
            )),
        }
    }

    fn resolve_type_spec(&self, token: Token) -> Result<TypeRc> {
        let row = self.reader.type_spec(token).ok_or(TypeNotFound(token))?;
        let blob = self.reader.blobs()?.get(row.signature)?;
        let signature =
            SignatureParser::with_max_depth(blob, self.max_signature_depth).parse_type_spec_signature()?;
        self.resolve_type_signature(&signature.base)
    }

    /// Resolve a type token that must resolve, turning an unresolvable reference into a
    /// load error
    fn require_type(&self, token: Token) -> Result<TypeRc> {
        if let Some(resolved) = self.get_type(token)? {
            return Ok(resolved);
        }

        let (namespace, name) = match self.reader.type_ref(token) {
            Some(row) => {
                let strings = self.reader.strings()?;
                (
                    strings.get(row.type_namespace)?.to_string(),
                    strings.get(row.type_name)?.to_string(),
                )
            }
            None => (String::new(), token.to_string()),
        };

        debug!(
            module = self.name.as_str(),
            %token,
            namespace = namespace.as_str(),
            name = name.as_str(),
            "unresolvable type reference"
        );
        Err(Error::TypeLoad {
            module: self.name.clone(),
            namespace,
            name,
            reason: "the type reference cannot be resolved".to_string(),
        })
    }

    /// Find a non-nested `TypeDef` by namespace and name.
    ///
    /// # Errors
    /// Returns an error if the name index cannot be built from the string heap.
    pub fn get_type_by_name(&self, namespace: &str, name: &str) -> Result<Option<TypeRc>> {
        let index = match self.types_by_name.get() {
            Some(index) => index,
            None => {
                let built = self.build_name_index()?;
                self.types_by_name.get_or_init(|| built)
            }
        };

        match index.get(&(namespace.to_string(), name.to_string())) {
            Some(token) => self.get_type(*token),
            None => Ok(None),
        }
    }

    fn build_name_index(&self) -> Result<HashMap<(String, String), Token>> {
        let strings = self.reader.strings()?;
        let mut index = HashMap::new();

        for rid in 1..=self.reader.type_def_count() {
            let token = Token::from_parts(TableId::TypeDef, rid);
            let row = self.reader.type_def(token).ok_or(TypeNotFound(token))?;
            if row.is_nested() {
                continue;
            }

            let key = (
                strings.get(row.type_namespace)?.to_string(),
                strings.get(row.type_name)?.to_string(),
            );
            index.entry(key).or_insert(token);
        }

        trace!(module = self.name.as_str(), types = index.len(), "built type name index");
        Ok(index)
    }

    /// Every `TypeDef` of the module in row order, resolved lazily.
    ///
    /// Each call starts a new enumeration.
    pub fn types(&self) -> impl Iterator<Item = Result<TypeRc>> + '_ {
        (1..=self.reader.type_def_count()).map(|rid| {
            let token = Token::from_parts(TableId::TypeDef, rid);
            self.get_type(token)?.ok_or(TypeNotFound(token))
        })
    }

    /// Resolve every `TypeDef` of the module on the rayon thread pool.
    ///
    /// Returns the number of types resolved.
    ///
    /// # Errors
    /// Returns the first error any type reported.
    pub fn load_all_types(&self) -> Result<usize> {
        let loaded = (1..=self.reader.type_def_count())
            .into_par_iter()
            .map(|rid| {
                let token = Token::from_parts(TableId::TypeDef, rid);
                self.get_type(token)?.ok_or(TypeNotFound(token))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(module = self.name.as_str(), types = loaded.len(), "loaded all types");
        Ok(loaded.len())
    }

    /// Resolve a `MethodDef` token.
    ///
    /// `owner` is the declaring type; without it the declaring type is looked up.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] for a token without a row.
    pub fn get_method(&self, token: Token, owner: Option<&TypeRc>) -> Result<MethodRc> {
        if let Some(method) = self.methods.get(&token) {
            return Ok(method.value().clone());
        }

        let row = self.reader.method_def(token).ok_or(TypeNotFound(token))?;
        let owner = match owner {
            Some(owner) => owner.clone(),
            None => {
                let owner = self
                    .reader
                    .method_owner(token)
                    .ok_or_else(|| malformed_error!("Method {} has no declaring type", token))?;
                self.get_type(owner)?.ok_or(TypeNotFound(owner))?
            }
        };

        trace!(module = self.name.as_str(), %token, "interning method");
        Ok(self
            .methods
            .entry(token)
            .or_insert_with(|| Arc::new(MethodDesc::new_metadata(self.this.clone(), row, owner)))
            .value()
            .clone())
    }

    /// Resolve a `Field` token.
    ///
    /// `owner` is the declaring type; without it the declaring type is looked up.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] for a token without a row.
    pub fn get_field(&self, token: Token, owner: Option<&TypeRc>) -> Result<FieldRc> {
        if let Some(field) = self.fields.get(&token) {
            return Ok(field.value().clone());
        }

        let row = self.reader.field(token).ok_or(TypeNotFound(token))?;
        let owner = match owner {
            Some(owner) => owner.clone(),
            None => {
                let owner = self
                    .reader
                    .field_owner(token)
                    .ok_or_else(|| malformed_error!("Field {} has no declaring type", token))?;
                self.get_type(owner)?.ok_or(TypeNotFound(owner))?
            }
        };

        trace!(module = self.name.as_str(), %token, "interning field");
        Ok(self
            .fields
            .entry(token)
            .or_insert_with(|| Arc::new(FieldDesc::new_metadata(self.this.clone(), row, owner)))
            .value()
            .clone())
    }

    /// Resolve a `GenericParam` token.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] for a token without a row.
    pub fn get_generic_parameter(&self, token: Token) -> Result<TypeRc> {
        if let Some(parameter) = self.generic_parameters.get(&token) {
            return Ok(parameter.value().clone());
        }

        let row = self.reader.generic_param(token).ok_or(TypeNotFound(token))?;
        Ok(self
            .generic_parameters
            .entry(token)
            .or_insert_with(|| {
                TypeDesc::new(
                    self.context.clone(),
                    TypeKind::GenericParameter(GenericParameterDesc::new(self.this.clone(), row)),
                )
            })
            .value()
            .clone())
    }

    /// The generic parameters of a `TypeDef` or `MethodDef`, in declaration order
    pub(crate) fn generic_parameters(&self, owner: Token) -> Result<Instantiation> {
        self.reader
            .generic_params(owner)
            .iter()
            .map(|parameter| self.get_generic_parameter(*parameter))
            .collect::<Result<Vec<_>>>()
            .map(Instantiation::new)
    }

    /// Resolve any token that denotes a type or member.
    ///
    /// A `MemberRef` is looked up by name and signature on its parent type and the parent's
    /// base types. `Ok(None)` means the token names an entity that does not exist.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] for tokens of tables that do not denote types or
    /// members.
    pub fn get_object(&self, token: Token) -> Result<Option<Entity>> {
        match token.table_id() {
            Some(TableId::TypeDef | TableId::TypeRef | TableId::TypeSpec) => {
                Ok(self.get_type(token)?.map(Entity::Type))
            }
            Some(TableId::GenericParam) => {
                Ok(Some(Entity::Type(self.get_generic_parameter(token)?)))
            }
            Some(TableId::MethodDef) => Ok(Some(Entity::Method(self.get_method(token, None)?))),
            Some(TableId::Field) => Ok(Some(Entity::Field(self.get_field(token, None)?))),
            Some(TableId::MemberRef) => self.resolve_member_ref(token),
            _ => Err(NotSupported(format!("token {token} does not denote a type or member"))),
        }
    }

    fn resolve_member_ref(&self, token: Token) -> Result<Option<Entity>> {
        let row = self.reader.member_ref(token).ok_or(TypeNotFound(token))?;
        if row.class.is_table(TableId::MethodDef) {
            return Ok(Some(Entity::Method(self.get_method(row.class, None)?)));
        }
        if row.class.is_table(TableId::ModuleRef) {
            return Err(NotSupported(format!(
                "member reference {token} scoped to a module reference"
            )));
        }

        let Some(parent) = self.get_type(row.class)? else {
            return Ok(None);
        };
        let name = self.reader.strings()?.get(row.name)?;
        let blob = self.reader.blobs()?.get(row.signature)?;
        let context = self.context()?;
        let max_depth = context.options().max_inheritance_depth;

        if is_field_signature(blob) {
            let mut current = Some(parent);
            let mut depth = 0;
            while let Some(candidate) = current {
                if depth > max_depth {
                    return Err(Error::RecursionLimit(max_depth));
                }
                if let Some(field) = candidate.get_field(name)? {
                    return Ok(Some(Entity::Field(field)));
                }
                current = candidate.base_type()?;
                depth += 1;
            }
            return Ok(None);
        }

        let signature = self.resolve_method_signature(&self.parse_method_signature(blob)?)?;
        let wanted = match parent.as_instantiated() {
            Some(instantiated) => signature.apply_substitution(instantiated.instantiation())?,
            None => signature,
        };

        let mut current = Some(parent);
        let mut depth = 0;
        while let Some(candidate) = current {
            if depth > max_depth {
                return Err(Error::RecursionLimit(max_depth));
            }
            if let Some(method) = candidate.get_method(name, Some(&wanted), None)? {
                return Ok(Some(Entity::Method(method)));
            }
            current = candidate.base_type()?;
            depth += 1;
        }
        Ok(None)
    }

    /// Parse a method signature blob with this module's depth limit
    pub(crate) fn parse_method_signature(&self, blob: &[u8]) -> Result<SignatureMethod> {
        SignatureParser::with_max_depth(blob, self.max_signature_depth).parse_method_signature()
    }

    /// Parse a field signature blob with this module's depth limit
    pub(crate) fn parse_field_signature(&self, blob: &[u8]) -> Result<SignatureField> {
        SignatureParser::with_max_depth(blob, self.max_signature_depth).parse_field_signature()
    }

    /// Resolve a parsed type signature of this module.
    ///
    /// Type variables become signature variables; they are substituted when the type is
    /// viewed through an instantiation.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeLoad`] for type tokens that cannot be resolved,
    /// [`crate::Error::NotSupported`] for function pointers, and configuration errors if
    /// the context is not initialized.
    pub fn resolve_type_signature(&self, signature: &TypeSignature) -> Result<TypeRc> {
        let context = self.context()?;
        let well_known = |kind| context.get_well_known_type(kind);

        match signature {
            TypeSignature::Void => well_known(WellKnownType::Void),
            TypeSignature::Boolean => well_known(WellKnownType::Boolean),
            TypeSignature::Char => well_known(WellKnownType::Char),
            TypeSignature::I1 => well_known(WellKnownType::SByte),
            TypeSignature::U1 => well_known(WellKnownType::Byte),
            TypeSignature::I2 => well_known(WellKnownType::Int16),
            TypeSignature::U2 => well_known(WellKnownType::UInt16),
            TypeSignature::I4 => well_known(WellKnownType::Int32),
            TypeSignature::U4 => well_known(WellKnownType::UInt32),
            TypeSignature::I8 => well_known(WellKnownType::Int64),
            TypeSignature::U8 => well_known(WellKnownType::UInt64),
            TypeSignature::R4 => well_known(WellKnownType::Single),
            TypeSignature::R8 => well_known(WellKnownType::Double),
            TypeSignature::I => well_known(WellKnownType::IntPtr),
            TypeSignature::U => well_known(WellKnownType::UIntPtr),
            TypeSignature::String => well_known(WellKnownType::String),
            TypeSignature::Object => well_known(WellKnownType::Object),
            TypeSignature::TypedByRef => well_known(WellKnownType::TypedReference),
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => {
                self.require_type(*token)
            }
            TypeSignature::GenericParamType(index) => Ok(context.signature_variable(*index, false)),
            TypeSignature::GenericParamMethod(index) => {
                Ok(context.signature_variable(*index, true))
            }
            TypeSignature::Ptr(pointer) => {
                Ok(context.pointer_type(&self.resolve_type_signature(&pointer.base)?))
            }
            TypeSignature::ByRef(inner) => {
                Ok(context.by_ref_type(&self.resolve_type_signature(inner)?))
            }
            TypeSignature::SzArray(array) => {
                Ok(context.sz_array_type(&self.resolve_type_signature(&array.base)?))
            }
            TypeSignature::Array(array) => {
                context.array_type(&self.resolve_type_signature(&array.base)?, array.rank)
            }
            TypeSignature::GenericInst(definition, arguments) => {
                let definition = self.resolve_type_signature(definition)?;
                let arguments = arguments
                    .iter()
                    .map(|argument| self.resolve_type_signature(argument))
                    .collect::<Result<Vec<_>>>()?;
                context.instantiated_type(&definition, Instantiation::new(arguments))
            }
            TypeSignature::Pinned(inner) => self.resolve_type_signature(inner),
            TypeSignature::FnPtr(_) => Err(NotSupported(
                "function pointer types are not represented".to_string(),
            )),
        }
    }

    /// Resolve a parsed method signature of this module.
    ///
    /// By-ref parameters become by-ref types; custom modifiers are kept with their position.
    ///
    /// # Errors
    /// See [`ModuleDesc::resolve_type_signature`].
    pub fn resolve_method_signature(&self, signature: &SignatureMethod) -> Result<MethodSignature> {
        let context = self.context()?;

        let mut flags = MethodSignatureFlags::empty();
        if signature.vararg {
            flags |= MethodSignatureFlags::CALLING_CONVENTION_VARARGS;
        } else if signature.cdecl {
            flags |= MethodSignatureFlags::UNMANAGED_CALLING_CONVENTION_CDECL;
        } else if signature.stdcall {
            flags |= MethodSignatureFlags::UNMANAGED_CALLING_CONVENTION_STDCALL;
        } else if signature.thiscall {
            flags |= MethodSignatureFlags::UNMANAGED_CALLING_CONVENTION_THISCALL;
        } else if signature.fastcall {
            flags |= MethodSignatureFlags::UNMANAGED_CALLING_CONVENTION_FASTCALL;
        }
        if !signature.has_this {
            flags |= MethodSignatureFlags::STATIC;
        }
        if signature.explicit_this {
            flags |= MethodSignatureFlags::EXPLICIT_THIS;
        }

        let mut embedded_modifiers = Vec::new();
        let mut resolve_parameter = |position: usize, parameter: &SignatureParameter| -> Result<TypeRc> {
            self.collect_modifiers(position, &parameter.modifiers, &mut embedded_modifiers)?;
            let resolved = self.resolve_type_signature(&parameter.base)?;
            if parameter.by_ref {
                Ok(context.by_ref_type(&resolved))
            } else {
                Ok(resolved)
            }
        };

        let return_type = resolve_parameter(0, &signature.return_type)?;
        let parameters = signature
            .params
            .iter()
            .enumerate()
            .map(|(index, parameter)| resolve_parameter(index + 1, parameter))
            .collect::<Result<Vec<_>>>()?;

        Ok(MethodSignature::new(
            flags,
            signature.param_count_generic,
            return_type,
            parameters,
        )
        .with_modifiers(embedded_modifiers))
    }

    fn collect_modifiers(
        &self,
        position: usize,
        modifiers: &[CustomModifier],
        into: &mut Vec<EmbeddedModifier>,
    ) -> Result<()> {
        for modifier in modifiers {
            into.push(EmbeddedModifier {
                position,
                is_required: modifier.is_required,
                modifier: self.require_type(modifier.modifier_type)?,
            });
        }
        Ok(())
    }

    /// Namespace and name of the attribute type a custom attribute row constructs.
    ///
    /// Attribute types named through a `TypeSpec` report `None`.
    pub(crate) fn attribute_namespace_and_name(
        &self,
        attribute: &CustomAttributeRaw,
    ) -> Result<Option<(&str, &str)>> {
        let constructor = attribute.constructor;
        let attribute_type = match constructor.table_id() {
            Some(TableId::MethodDef) => self.reader.method_owner(constructor).ok_or_else(|| {
                malformed_error!("Attribute constructor {} has no declaring type", constructor)
            })?,
            Some(TableId::MemberRef) => {
                self.reader
                    .member_ref(constructor)
                    .ok_or(TypeNotFound(constructor))?
                    .class
            }
            _ => return Ok(None),
        };

        let strings = self.reader.strings()?;
        match attribute_type.table_id() {
            Some(TableId::TypeDef) => {
                let row = self
                    .reader
                    .type_def(attribute_type)
                    .ok_or(TypeNotFound(attribute_type))?;
                Ok(Some((
                    strings.get(row.type_namespace)?,
                    strings.get(row.type_name)?,
                )))
            }
            Some(TableId::TypeRef) => {
                let row = self
                    .reader
                    .type_ref(attribute_type)
                    .ok_or(TypeNotFound(attribute_type))?;
                Ok(Some((
                    strings.get(row.type_namespace)?,
                    strings.get(row.type_name)?,
                )))
            }
            _ => Ok(None),
        }
    }

    /// The first custom attribute of type `namespace.name` applied to `parent`
    pub(crate) fn find_custom_attribute(
        &self,
        parent: Token,
        namespace: &str,
        name: &str,
    ) -> Result<Option<&CustomAttributeRaw>> {
        for attribute in self.reader.custom_attributes(parent) {
            if let Some((attribute_namespace, attribute_name)) =
                self.attribute_namespace_and_name(attribute)?
            {
                if attribute_namespace == namespace && attribute_name == name {
                    return Ok(Some(attribute));
                }
            }
        }
        Ok(None)
    }

    /// Returns true if a custom attribute of type `namespace.name` is applied to `parent`.
    ///
    /// # Errors
    /// Returns an error if an attribute row cannot be read.
    pub fn has_custom_attribute(&self, parent: Token, namespace: &str, name: &str) -> Result<bool> {
        Ok(self.find_custom_attribute(parent, namespace, name)?.is_some())
    }

    /// Decode the value blob of a custom attribute against its constructor's signature.
    ///
    /// # Errors
    /// Returns an error if the constructor cannot be read or the value uses an encoding
    /// the attribute parser does not decode.
    pub fn decode_custom_attribute(
        &self,
        attribute: &CustomAttributeRaw,
    ) -> Result<CustomAttributeValue> {
        let constructor = attribute.constructor;
        let signature_index = match constructor.table_id() {
            Some(TableId::MethodDef) => {
                self.reader
                    .method_def(constructor)
                    .ok_or(TypeNotFound(constructor))?
                    .signature
            }
            Some(TableId::MemberRef) => {
                self.reader
                    .member_ref(constructor)
                    .ok_or(TypeNotFound(constructor))?
                    .signature
            }
            _ => {
                return Err(NotSupported(format!(
                    "attribute constructor {constructor}"
                )))
            }
        };

        let blobs = self.reader.blobs()?;
        let signature = self.parse_method_signature(blobs.get(signature_index)?)?;
        parse_custom_attribute_blob(blobs.get(attribute.value)?, &signature)
    }
}

impl std::fmt::Debug for ModuleDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleDesc")
            .field("name", &self.name)
            .field("types", &self.types.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{
            customattributes::CustomAttributeArgument,
            signatures::SignaturePointer,
            tables::{MethodAttributes, TypeAttributes},
        },
        test::CoreLibrary,
    };

    const COMPILER_SERVICES: &str = "System.Runtime.CompilerServices";

    fn corelib_ref() -> Token {
        Token::from_parts(TableId::AssemblyRef, 1)
    }

    #[test]
    fn type_tokens() {
        let corelib = CoreLibrary::new();
        let module = corelib.module();

        assert!(module.get_type(Token::new(0)).unwrap().is_none());
        let object = module.get_type(Token::from_parts(TableId::TypeDef, 2)).unwrap().unwrap();
        assert!(object.is_well_known_type(WellKnownType::Object));
        assert!(Arc::ptr_eq(
            &object,
            &module.get_type(Token::from_parts(TableId::TypeDef, 2)).unwrap().unwrap()
        ));
        assert!(matches!(
            module.get_type(Token::from_parts(TableId::MethodDef, 1)),
            Err(Error::Malformed { .. })
        ));
        assert!(matches!(
            module.get_type(Token::from_parts(TableId::TypeDef, 10_000)),
            Err(TypeNotFound(_))
        ));
    }

    #[test]
    fn module_ref_scopes_are_not_supported() {
        let corelib = CoreLibrary::new();
        let mut builder = CoreLibrary::app_builder("Scopes");
        let module_ref = Token::from_parts(TableId::ModuleRef, 1);
        let foreign = builder.type_ref(module_ref, "Other", "Foreign");
        let module = corelib.add_module(builder);

        assert!(matches!(module.get_type(foreign), Err(NotSupported(_))));
    }

    #[test]
    fn type_signatures() {
        let corelib = CoreLibrary::new();
        let module = corelib.module();
        let int32 = corelib.well_known(WellKnownType::Int32);

        let pointer = module
            .resolve_type_signature(&TypeSignature::Ptr(SignaturePointer {
                modifiers: vec![],
                base: Box::new(TypeSignature::I4),
            }))
            .unwrap();
        assert!(Arc::ptr_eq(&pointer, &corelib.context().pointer_type(&int32)));

        let pinned = module
            .resolve_type_signature(&TypeSignature::Pinned(Box::new(TypeSignature::I4)))
            .unwrap();
        assert!(Arc::ptr_eq(&pinned, &int32));

        let function_pointer = TypeSignature::FnPtr(Box::new(SignatureMethod::static_method(
            TypeSignature::Void,
            vec![],
        )));
        assert!(matches!(
            module.resolve_type_signature(&function_pointer),
            Err(NotSupported(_))
        ));
    }

    #[test]
    fn method_signature_flags_and_modifiers() {
        let corelib = CoreLibrary::new();
        let mut builder = CoreLibrary::app_builder("Signatures");
        let modifier = builder.type_ref(corelib_ref(), COMPILER_SERVICES, "IntrinsicAttribute");
        let module = corelib.add_module(builder);

        let signature = SignatureMethod {
            params: vec![SignatureParameter {
                modifiers: vec![CustomModifier {
                    is_required: true,
                    modifier_type: modifier,
                }],
                by_ref: true,
                base: TypeSignature::I4,
            }],
            ..SignatureMethod::instance(TypeSignature::Void, vec![])
        };
        let resolved = module.resolve_method_signature(&signature).unwrap();

        assert!(resolved.flags().is_empty());
        assert!(!resolved.is_static());
        let int32 = corelib.well_known(WellKnownType::Int32);
        assert!(Arc::ptr_eq(
            &resolved.parameters()[0],
            &corelib.context().by_ref_type(&int32)
        ));
        let modifiers = resolved.embedded_modifiers();
        assert_eq!(modifiers.len(), 1);
        assert_eq!(modifiers[0].position, 1);
        assert!(modifiers[0].is_required);
        assert_eq!(modifiers[0].modifier.name().unwrap(), "IntrinsicAttribute");

        let vararg = SignatureMethod {
            vararg: true,
            default: false,
            ..SignatureMethod::static_method(TypeSignature::Void, vec![])
        };
        let resolved = module.resolve_method_signature(&vararg).unwrap();
        assert!(resolved.is_vararg());
        assert!(resolved.is_static());
    }

    #[test]
    fn custom_attributes_through_both_constructor_kinds() {
        let corelib = CoreLibrary::new();
        let mut builder = CoreLibrary::app_builder("Attributes");
        let object = builder.type_ref(corelib_ref(), "System", "Object");
        let value_type = builder.type_ref(corelib_ref(), "System", "ValueType");
        let attribute = builder.type_ref(corelib_ref(), "System", "Attribute");

        let inline_array =
            builder.type_ref(corelib_ref(), COMPILER_SERVICES, "InlineArrayAttribute");
        let inline_array_ctor = builder
            .member_ref(
                inline_array,
                ".ctor",
                &SignatureMethod::instance(TypeSignature::Void, vec![TypeSignature::I4]),
            )
            .unwrap();

        let marker = builder.type_def("App", "MarkerAttribute", TypeAttributes::PUBLIC, attribute);
        let marker_ctor = builder
            .method_def(
                marker,
                ".ctor",
                MethodAttributes::PUBLIC
                    | MethodAttributes::SPECIAL_NAME
                    | MethodAttributes::RTSPECIAL_NAME,
                &SignatureMethod::instance(TypeSignature::Void, vec![]),
            )
            .unwrap();

        let buffer = builder.type_def(
            "App",
            "Buffer",
            TypeAttributes::PUBLIC | TypeAttributes::SEALED,
            value_type,
        );
        builder
            .custom_attribute(buffer, inline_array_ctor, &[CustomAttributeArgument::I4(16)])
            .unwrap();
        let marked = builder.type_def("App", "Marked", TypeAttributes::PUBLIC, object);
        builder.custom_attribute(marked, marker_ctor, &[]).unwrap();
        let module = corelib.add_module(builder);

        assert!(module.has_custom_attribute(marked, "App", "MarkerAttribute").unwrap());
        assert!(!module.has_custom_attribute(buffer, "App", "MarkerAttribute").unwrap());

        let row = module
            .find_custom_attribute(buffer, COMPILER_SERVICES, "InlineArrayAttribute")
            .unwrap()
            .unwrap();
        let value = module.decode_custom_attribute(row).unwrap();
        assert_eq!(value.fixed_args, [CustomAttributeArgument::I4(16)]);
        assert!(value.named_args.is_empty());

        let buffer = module.get_type(buffer).unwrap().unwrap();
        assert_eq!(buffer.get_inline_array_length().unwrap(), 16);
    }

    #[test]
    fn types_by_name_skip_nested_types() {
        let corelib = CoreLibrary::new();
        let mut builder = CoreLibrary::app_builder("Nested");
        let object = builder.type_ref(corelib_ref(), "System", "Object");
        let outer = builder.type_def("App", "Outer", TypeAttributes::PUBLIC, object);
        builder.nested_type_def(outer, "", "Outer", TypeAttributes::NESTED_PUBLIC, object);
        let module = corelib.add_module(builder);

        let found = module.get_type_by_name("App", "Outer").unwrap().unwrap();
        assert!(!found.as_metadata().unwrap().is_nested());
        assert!(module.get_type_by_name("", "Outer").unwrap().is_none());
        assert!(module.get_type_by_name("App", "Inner").unwrap().is_none());
    }
}
