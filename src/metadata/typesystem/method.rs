//! Method descriptors and lazy member enumeration.

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, OnceLock, Weak},
};

use crate::{
    metadata::{
        tables::{MethodAttributes, MethodDefRaw},
        token::Token,
        typesystem::{FieldRc, Instantiation, MetadataType, MethodSignature, ModuleDesc, TypeRc},
    },
    Error::{Dropped, TypeError, TypeNotFound},
    Result,
};

/// A shared, canonical method descriptor
pub type MethodRc = Arc<MethodDesc>;

enum MethodSource {
    Metadata {
        module: Weak<ModuleDesc>,
        token: Token,
        flags: u32,
        impl_flags: u32,
        name_index: u32,
        signature_index: u32,
    },
    OnInstantiatedType {
        definition: MethodRc,
    },
}

/// A method of a type.
///
/// Methods defined by a `MethodDef` row are interned by their module; the views of those
/// methods on instantiated types are interned by the context. The name and the signature
/// are resolved on first use.
pub struct MethodDesc {
    owner: TypeRc,
    source: MethodSource,
    name: OnceLock<String>,
    signature: OnceLock<MethodSignature>,
    instantiation: OnceLock<Instantiation>,
}

impl MethodDesc {
    pub(crate) fn new_metadata(module: Weak<ModuleDesc>, row: &MethodDefRaw, owner: TypeRc) -> Self {
        MethodDesc {
            owner,
            source: MethodSource::Metadata {
                module,
                token: row.token,
                flags: row.flags,
                impl_flags: row.impl_flags,
                name_index: row.name,
                signature_index: row.signature,
            },
            name: OnceLock::new(),
            signature: OnceLock::new(),
            instantiation: OnceLock::new(),
        }
    }

    pub(crate) fn new_on_instantiated_type(definition: MethodRc, owner: TypeRc) -> Self {
        MethodDesc {
            owner,
            source: MethodSource::OnInstantiatedType { definition },
            name: OnceLock::new(),
            signature: OnceLock::new(),
            instantiation: OnceLock::new(),
        }
    }

    /// The `MethodDef` token, of the definition for views on instantiated types
    #[must_use]
    pub fn token(&self) -> Token {
        match &self.source {
            MethodSource::Metadata { token, .. } => *token,
            MethodSource::OnInstantiatedType { definition } => definition.token(),
        }
    }

    /// The type declaring this method
    #[must_use]
    pub fn owning_type(&self) -> &TypeRc {
        &self.owner
    }

    /// The method on the generic definition this method is a view of, or itself
    #[must_use]
    pub fn typical_definition(&self) -> &MethodDesc {
        match &self.source {
            MethodSource::Metadata { .. } => self,
            MethodSource::OnInstantiatedType { definition } => definition,
        }
    }

    /// The module defining the method's metadata.
    ///
    /// # Errors
    /// Returns [`crate::Error::Dropped`] once the module is gone.
    pub fn module(&self) -> Result<Arc<ModuleDesc>> {
        match &self.source {
            MethodSource::Metadata { module, .. } => module.upgrade().ok_or(Dropped("module")),
            MethodSource::OnInstantiatedType { definition } => definition.module(),
        }
    }

    /// # Errors
    /// Returns an error if the name cannot be decoded.
    pub fn name(&self) -> Result<&str> {
        match &self.source {
            MethodSource::Metadata { name_index, .. } => {
                if let Some(name) = self.name.get() {
                    return Ok(name);
                }

                let name = self.module()?.reader().strings()?.get(*name_index)?.to_string();
                Ok(self.name.get_or_init(|| name))
            }
            MethodSource::OnInstantiatedType { definition } => definition.name(),
        }
    }

    /// The resolved signature, with the owner's type arguments substituted for views on
    /// instantiated types.
    ///
    /// # Errors
    /// Returns an error if the signature blob is malformed or names a type that cannot be
    /// resolved.
    pub fn signature(&self) -> Result<&MethodSignature> {
        if let Some(signature) = self.signature.get() {
            return Ok(signature);
        }

        let signature = match &self.source {
            MethodSource::Metadata {
                signature_index, ..
            } => {
                let module = self.module()?;
                let blob = module.reader().blobs()?.get(*signature_index)?;
                let parsed = module.parse_method_signature(blob)?;
                module.resolve_method_signature(&parsed)?
            }
            MethodSource::OnInstantiatedType { definition } => definition
                .signature()?
                .apply_substitution(&self.owner.instantiation()?)?,
        };
        Ok(self.signature.get_or_init(|| signature))
    }

    /// The method's own generic parameters.
    ///
    /// # Errors
    /// Returns an error if a generic parameter row cannot be resolved.
    pub fn instantiation(&self) -> Result<&Instantiation> {
        if let Some(instantiation) = self.instantiation.get() {
            return Ok(instantiation);
        }

        let parameters = match &self.source {
            MethodSource::Metadata { token, .. } => self.module()?.generic_parameters(*token)?,
            MethodSource::OnInstantiatedType { definition } => definition.instantiation()?.clone(),
        };
        Ok(self.instantiation.get_or_init(|| parameters))
    }

    /// `MethodAttributes` of the row
    #[must_use]
    pub fn attributes(&self) -> u32 {
        match &self.source {
            MethodSource::Metadata { flags, .. } => *flags,
            MethodSource::OnInstantiatedType { definition } => definition.attributes(),
        }
    }

    /// `MethodImplAttributes` of the row
    #[must_use]
    pub fn impl_attributes(&self) -> u32 {
        match &self.source {
            MethodSource::Metadata { impl_flags, .. } => *impl_flags,
            MethodSource::OnInstantiatedType { definition } => definition.impl_attributes(),
        }
    }

    /// Returns true for virtual methods
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.attributes() & MethodAttributes::VIRTUAL != 0
    }

    /// Returns true for methods without a `this` parameter
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.attributes() & MethodAttributes::STATIC != 0
    }

    /// Returns true for methods without an implementation
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.attributes() & MethodAttributes::ABSTRACT != 0
    }

    /// Returns true for virtual methods that cannot be overridden
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.attributes() & MethodAttributes::FINAL != 0
    }

    /// Returns true for virtual methods introducing a new vtable slot
    #[must_use]
    pub fn is_new_slot(&self) -> bool {
        self.attributes() & MethodAttributes::NEW_SLOT != 0
    }

    /// Returns true for public methods
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.attributes() & MethodAttributes::MEMBER_ACCESS_MASK == MethodAttributes::PUBLIC
    }

    /// Returns true if the name has a meaning to the runtime
    #[must_use]
    pub fn is_runtime_special_name(&self) -> bool {
        self.attributes() & MethodAttributes::RTSPECIAL_NAME != 0
    }

    /// Returns true for instance constructors, `.ctor`.
    ///
    /// # Errors
    /// Returns an error if the name cannot be decoded.
    pub fn is_constructor(&self) -> Result<bool> {
        Ok(self.is_runtime_special_name() && self.name()? == ".ctor")
    }

    /// Returns true for type initializers, `.cctor`.
    ///
    /// # Errors
    /// Returns an error if the name cannot be decoded.
    pub fn is_static_constructor(&self) -> Result<bool> {
        Ok(self.is_runtime_special_name() && self.name()? == ".cctor")
    }

    /// Returns true if a custom attribute of type `namespace.name` is applied to the method.
    ///
    /// # Errors
    /// Returns an error if an attribute row cannot be read.
    pub fn has_custom_attribute(&self, namespace: &str, name: &str) -> Result<bool> {
        self.module()?
            .has_custom_attribute(self.token(), namespace, name)
    }
}

impl PartialEq for MethodDesc {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for MethodDesc {}

impl Hash for MethodDesc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self, state);
    }
}

impl fmt::Debug for MethodDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MethodDesc({}::{})",
            self.owner,
            self.name().unwrap_or("<unresolved>")
        )
    }
}

/// The members of a definition as seen from `owner`, the definition itself or an
/// instantiation of it.
pub(crate) struct MemberSource {
    pub(crate) module: Arc<ModuleDesc>,
    pub(crate) definition: TypeRc,
    pub(crate) owner: TypeRc,
}

impl MemberSource {
    fn is_definition(&self) -> bool {
        Arc::ptr_eq(&self.definition, &self.owner)
    }

    pub(crate) fn method(&self, token: Token) -> Result<MethodRc> {
        let method = self.module.get_method(token, Some(&self.definition))?;
        if self.is_definition() {
            return Ok(method);
        }

        Ok(self
            .module
            .context()?
            .method_on_instantiated_type(&method, &self.owner))
    }

    pub(crate) fn field(&self, token: Token) -> Result<FieldRc> {
        let field = self.module.get_field(token, Some(&self.definition))?;
        if self.is_definition() {
            return Ok(field);
        }

        Ok(self
            .module
            .context()?
            .field_on_instantiated_type(&field, &self.owner))
    }

    pub(crate) fn method_handles(&self) -> Result<Vec<Token>> {
        let token = self.definition_token()?;
        let row = self
            .module
            .reader()
            .type_def(token)
            .ok_or(TypeNotFound(token))?;
        Ok(row.method_list.clone())
    }

    pub(crate) fn field_handles(&self) -> Result<Vec<Token>> {
        let token = self.definition_token()?;
        let row = self
            .module
            .reader()
            .type_def(token)
            .ok_or(TypeNotFound(token))?;
        Ok(row.field_list.clone())
    }

    fn definition_token(&self) -> Result<Token> {
        self.definition
            .as_metadata()
            .map(MetadataType::token)
            .ok_or_else(|| TypeError("members of a non-definition".to_string()))
    }
}

/// Which `MethodDef` rows a [`Methods`] sequence yields, decided on the raw row
#[derive(Debug, Clone)]
pub(crate) enum MethodFilter {
    All,
    Virtual,
    Named(String),
}

impl MethodFilter {
    fn accepts(&self, module: &ModuleDesc, token: Token) -> Result<bool> {
        match self {
            MethodFilter::All => Ok(true),
            MethodFilter::Virtual => {
                let row = module.reader().method_def(token).ok_or(TypeNotFound(token))?;
                Ok(row.is_virtual())
            }
            MethodFilter::Named(name) => {
                let reader = module.reader();
                let row = reader.method_def(token).ok_or(TypeNotFound(token))?;
                Ok(reader.strings()?.get(row.name)? == name)
            }
        }
    }
}

/// Lazy sequence of the methods of a type.
///
/// Each item resolves, and interns, one method. Errors are reported per item; the sequence
/// continues after one.
pub struct Methods {
    source: Option<MemberSource>,
    handles: Vec<Token>,
    next: usize,
    filter: MethodFilter,
}

impl Methods {
    pub(crate) fn new(source: Option<MemberSource>, filter: MethodFilter) -> Result<Self> {
        let handles = match &source {
            Some(source) => source.method_handles()?,
            None => Vec::new(),
        };

        Ok(Methods {
            source,
            handles,
            next: 0,
            filter,
        })
    }
}

impl Iterator for Methods {
    type Item = Result<MethodRc>;

    fn next(&mut self) -> Option<Self::Item> {
        let source = self.source.as_ref()?;

        while let Some(&handle) = self.handles.get(self.next) {
            self.next += 1;
            match self.filter.accepts(&source.module, handle) {
                Ok(true) => return Some(source.method(handle)),
                Ok(false) => {}
                Err(error) => return Some(Err(error)),
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.handles.len().saturating_sub(self.next)))
    }
}
