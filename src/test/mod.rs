//! Shared fixtures for unit tests
//!
//! [`CoreLibrary`] registers the minimal core library of
//! [`MetadataBuilder::core_library`] with a fresh context and initializes it. Further
//! modules are added with [`CoreLibrary::add_module`].

use std::sync::Arc;

use crate::metadata::{
    builder::MetadataBuilder,
    typesystem::{ModuleDesc, TypeRc, TypeSystemContext, TypeSystemOptions, WellKnownType},
};

/// Assembly name of the core library fixture
pub const CORE_LIBRARY: &str = "System.Private.CoreLib";

/// An initialized context holding the core library fixture
pub struct CoreLibrary {
    context: Arc<TypeSystemContext>,
    module: Arc<ModuleDesc>,
}

impl CoreLibrary {
    pub fn new() -> Self {
        Self::with_options(TypeSystemOptions::default())
    }

    pub fn with_options(options: TypeSystemOptions) -> Self {
        let context = TypeSystemContext::new(options);
        let tables = MetadataBuilder::core_library(CORE_LIBRARY).unwrap().build();
        let module = context.add_module(tables).unwrap();
        context.initialize().unwrap();
        CoreLibrary { context, module }
    }

    pub fn context(&self) -> &Arc<TypeSystemContext> {
        &self.context
    }

    pub fn module(&self) -> &Arc<ModuleDesc> {
        &self.module
    }

    pub fn well_known(&self, kind: WellKnownType) -> TypeRc {
        self.context.get_well_known_type(kind).unwrap()
    }

    /// A builder for a module that references the core library as its first `AssemblyRef`
    pub fn app_builder(name: &str) -> MetadataBuilder {
        let mut builder = MetadataBuilder::new(name);
        builder.assembly_ref(CORE_LIBRARY);
        builder
    }

    /// Register a module built with `builder`
    pub fn add_module(&self, builder: MetadataBuilder) -> Arc<ModuleDesc> {
        self.context.add_module(builder.build()).unwrap()
    }
}
