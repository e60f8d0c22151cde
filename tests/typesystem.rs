//! Integration tests for type resolution across modules of a shared context.
//!
//! Every test builds its metadata in memory: the minimal core library plus one or more
//! application modules referencing it through `AssemblyRef` rows.

use std::{
    sync::{Arc, Barrier},
    thread,
};

use tracing_subscriber::EnvFilter;
use typescope::{
    metadata::{
        builder::MetadataBuilder,
        signatures::{SignatureMethod, TypeSignature},
        tables::{MethodAttributes, TableId, TypeAttributes},
        typesystem::{BaseTypeState, FlagCategory, TypeFlags},
    },
    prelude::*,
};

const CORELIB: &str = "System.Private.CoreLib";

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn context_with_core_library(options: TypeSystemOptions) -> Result<Arc<TypeSystemContext>> {
    init_logging();
    let system_module = options.system_module.clone();
    let context = TypeSystemContext::new(options);
    context.add_module(MetadataBuilder::core_library(&system_module)?.build())?;
    context.initialize()?;
    Ok(context)
}

/// A module builder with the core library as `AssemblyRef` row 1 and a `TypeRef` to
/// `System.Object`
fn app_builder(name: &str) -> (MetadataBuilder, Token) {
    let mut builder = MetadataBuilder::new(name);
    let corelib = builder.assembly_ref(CORELIB);
    let object = builder.type_ref(corelib, "System", "Object");
    (builder, object)
}

/// `N.B`1<T> : Object`, `N.C : N.B`1<int32>` and `N.D`1<U> : N.B`1<U>`
fn generic_hierarchy(context: &TypeSystemContext) -> Result<Arc<ModuleDesc>> {
    let (mut builder, object) = app_builder("App");
    let generic_base = builder.type_def("N", "B`1", TypeAttributes::PUBLIC, object);
    builder.generic_param(generic_base, "T", 0);

    let base_of_int = builder.type_spec(&TypeSignature::GenericInst(
        Box::new(TypeSignature::Class(generic_base)),
        vec![TypeSignature::I4],
    ))?;
    builder.type_def("N", "C", TypeAttributes::PUBLIC, base_of_int);

    let base_of_variable = builder.type_spec(&TypeSignature::GenericInst(
        Box::new(TypeSignature::Class(generic_base)),
        vec![TypeSignature::GenericParamType(0)],
    ))?;
    let derived = builder.type_def("N", "D`1", TypeAttributes::PUBLIC, base_of_variable);
    builder.generic_param(derived, "U", 0);

    context.add_module(builder.build())
}

#[test]
fn class_deriving_from_generic_instantiation() -> Result<()> {
    let context = context_with_core_library(TypeSystemOptions::default())?;
    let module = generic_hierarchy(&context)?;

    let c = module.get_type_by_name("N", "C")?.unwrap();
    assert_eq!(c.full_name()?, "N.C");
    assert!(c.is_class()?);
    assert!(!c.is_generic_definition()?);

    let base = c.base_type()?.unwrap();
    assert_eq!(base.full_name()?, "N.B`1<System.Int32>");
    assert_eq!(base.name()?, "B`1");
    assert_eq!(base.namespace()?, "N");

    let definition = module.get_type_by_name("N", "B`1")?.unwrap();
    assert!(definition.is_generic_definition()?);
    let int32 = context.get_well_known_type(WellKnownType::Int32)?;
    let expected = context.instantiated_type(&definition, Instantiation::new(vec![int32]))?;
    assert!(Arc::ptr_eq(&base, &expected));
    assert!(Arc::ptr_eq(
        base.as_instantiated().unwrap().definition(),
        &definition
    ));

    let root = base.base_type()?.unwrap();
    assert!(root.is_well_known_type(WellKnownType::Object));
    assert!(root.base_type()?.is_none());
    Ok(())
}

#[test]
fn generic_base_is_seen_through_the_instantiation() -> Result<()> {
    let context = context_with_core_library(TypeSystemOptions::default())?;
    let module = generic_hierarchy(&context)?;
    let generic_base = module.get_type_by_name("N", "B`1")?.unwrap();
    let derived = module.get_type_by_name("N", "D`1")?.unwrap();

    // On the definition the base is closed over the definition's own parameter
    let open_base = derived.base_type()?.unwrap();
    let argument = &open_base.instantiation()?[0];
    assert!(argument.is_generic_parameter());
    assert_eq!(argument.name()?, "U");
    assert!(Arc::ptr_eq(argument, &derived.instantiation()?[0]));

    let string = context.get_well_known_type(WellKnownType::String)?;
    let derived_of_string =
        context.instantiated_type(&derived, Instantiation::new(vec![string.clone()]))?;
    let base = derived_of_string.base_type()?.unwrap();
    let expected = context.instantiated_type(&generic_base, Instantiation::new(vec![string]))?;
    assert!(Arc::ptr_eq(&base, &expected));
    assert_eq!(derived_of_string.full_name()?, "N.D`1<System.String>");
    Ok(())
}

#[test]
fn instantiation_arity_is_checked() -> Result<()> {
    let context = context_with_core_library(TypeSystemOptions::default())?;
    let module = generic_hierarchy(&context)?;
    let generic_base = module.get_type_by_name("N", "B`1")?.unwrap();
    let int32 = context.get_well_known_type(WellKnownType::Int32)?;
    let c = module.get_type_by_name("N", "C")?.unwrap();

    let too_many = context.instantiated_type(
        &generic_base,
        Instantiation::new(vec![int32.clone(), int32.clone()]),
    );
    assert!(matches!(too_many, Err(Error::TypeError(_))));

    let not_generic = context.instantiated_type(&c, Instantiation::new(vec![int32.clone()]));
    assert!(matches!(not_generic, Err(Error::TypeError(_))));

    let array = context.sz_array_type(&int32);
    let not_a_definition = context.instantiated_type(&array, Instantiation::new(vec![int32]));
    assert!(matches!(not_a_definition, Err(Error::TypeError(_))));
    Ok(())
}

#[test]
fn constructed_types_are_canonical() -> Result<()> {
    let context = context_with_core_library(TypeSystemOptions::default())?;
    let int32 = context.get_well_known_type(WellKnownType::Int32)?;

    let vector = context.sz_array_type(&int32);
    assert!(Arc::ptr_eq(&vector, &context.sz_array_type(&int32)));
    assert_eq!(vector.full_name()?, "System.Int32[]");
    assert_eq!(vector.category()?, TypeCategory::SzArray);
    assert!(vector.is_sz_array() && vector.is_array());
    assert!(vector.is_sealed()?);
    assert!(vector
        .base_type()?
        .unwrap()
        .is_well_known_type(WellKnownType::Array));

    let rank_one = context.array_type(&int32, 1)?;
    assert!(!Arc::ptr_eq(&vector, &rank_one));
    assert_eq!(rank_one.full_name()?, "System.Int32[*]");
    assert_eq!(rank_one.category()?, TypeCategory::Array);
    assert!(rank_one.is_array() && !rank_one.is_sz_array());
    assert_eq!(context.array_type(&int32, 3)?.name()?, "Int32[,,]");
    assert!(matches!(context.array_type(&int32, 0), Err(Error::TypeError(_))));

    let by_ref = context.by_ref_type(&int32);
    assert!(Arc::ptr_eq(&by_ref, &context.by_ref_type(&int32)));
    assert_eq!(by_ref.name()?, "Int32&");
    assert!(by_ref.is_byref());
    assert!(by_ref.base_type()?.is_none());

    let pointer = context.pointer_type(&vector);
    assert_eq!(pointer.full_name()?, "System.Int32[]*");
    assert!(pointer.is_pointer());
    assert_eq!(pointer.category()?, TypeCategory::Pointer);

    let type_variable = context.signature_variable(0, false);
    let method_variable = context.signature_variable(1, true);
    assert!(Arc::ptr_eq(&type_variable, &context.signature_variable(0, false)));
    assert!(!Arc::ptr_eq(&type_variable, &context.signature_variable(0, true)));
    assert_eq!(type_variable.full_name()?, "!0");
    assert_eq!(method_variable.full_name()?, "!!1");
    assert_eq!(method_variable.category()?, TypeCategory::SignatureMethodVariable);
    assert!(type_variable.module()?.is_none());
    Ok(())
}

#[test]
fn concurrent_first_resolution_agrees() -> Result<()> {
    let context = context_with_core_library(TypeSystemOptions::default())?;
    let module = generic_hierarchy(&context)?;
    let (context, module) = (&context, &module);

    let resolved: Vec<(TypeRc, TypeRc, TypeRc)> = thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(move || {
                    let c = module.get_type_by_name("N", "C").unwrap().unwrap();
                    let base = c.base_type().unwrap().unwrap();
                    let array = context.sz_array_type(&base);
                    (c, base, array)
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().unwrap())
            .collect()
    });

    let (c, base, array) = &resolved[0];
    for (other_c, other_base, other_array) in &resolved[1..] {
        assert!(Arc::ptr_eq(c, other_c));
        assert!(Arc::ptr_eq(base, other_base));
        assert!(Arc::ptr_eq(array, other_array));
    }
    Ok(())
}

#[test]
fn concurrent_first_computation_agrees() -> Result<()> {
    const THREADS: usize = 8;

    for _ in 0..20 {
        let context = context_with_core_library(TypeSystemOptions::default())?;
        let module = generic_hierarchy(&context)?;
        let barrier = Barrier::new(THREADS);
        let (module, barrier) = (&module, &barrier);

        let computed: Vec<(TypeRc, String, Instantiation, u32, TypeFlags)> =
            thread::scope(|scope| {
                let workers: Vec<_> = (0..THREADS)
                    .map(|_| {
                        scope.spawn(move || {
                            barrier.wait();
                            let d = module.get_type_by_name("N", "D`1").unwrap().unwrap();
                            let flags = d.compute_flags(FlagCategory::all()).unwrap();
                            let name = d.name().unwrap().into_owned();
                            let instantiation = d.instantiation().unwrap();
                            let hash = d.hash_code().unwrap();
                            (d, name, instantiation, hash, flags)
                        })
                    })
                    .collect();
                workers
                    .into_iter()
                    .map(|worker| worker.join().unwrap())
                    .collect()
            });

        let (d, name, instantiation, hash, flags) = &computed[0];
        assert_eq!(name, "D`1");
        assert_eq!(instantiation.len(), 1);
        assert_eq!(flags.computed(), FlagCategory::all());
        for (other_d, other_name, other_instantiation, other_hash, other_flags) in &computed[1..]
        {
            assert!(Arc::ptr_eq(d, other_d));
            assert_eq!(name, other_name);
            assert_eq!(instantiation, other_instantiation);
            assert_eq!(hash, other_hash);
            assert_eq!(flags, other_flags);
        }
        assert_eq!(d.compute_flags(FlagCategory::all())?, *flags);
    }
    Ok(())
}

#[test]
fn parallel_load_matches_enumeration() -> Result<()> {
    let context = context_with_core_library(TypeSystemOptions::default())?;
    let core = context.module(CORELIB).unwrap();

    let loaded = core.load_all_types()?;
    assert_eq!(loaded as u32, core.reader().type_def_count());

    let enumerated = core.types().collect::<Result<Vec<_>>>()?;
    assert_eq!(enumerated.len(), loaded);
    assert!(enumerated[0].is_module_type());
    // A second enumeration starts over and yields the same descriptors
    let again = core.types().next().unwrap()?;
    assert!(Arc::ptr_eq(&enumerated[0], &again));
    Ok(())
}

#[test]
fn unresolvable_base_is_a_load_error_until_the_module_appears() -> Result<()> {
    let context = context_with_core_library(TypeSystemOptions::default())?;
    let (mut builder, _) = app_builder("App");
    let missing = builder.assembly_ref("Missing.Assembly");
    let base = builder.type_ref(missing, "Other", "Base");
    builder.type_def("N", "Orphan", TypeAttributes::PUBLIC, base);
    let module = context.add_module(builder.build())?;

    let orphan = module.get_type_by_name("N", "Orphan")?.unwrap();
    let error = orphan.base_type().unwrap_err();
    assert!(error.is_load_error());
    assert!(matches!(
        &error,
        Error::TypeLoad { module, name, .. } if module == "App" && name == "Orphan"
    ));
    assert!(matches!(
        orphan.as_metadata().unwrap().base_type_state(),
        BaseTypeState::Uninitialized
    ));
    assert!(orphan.category().is_err());

    let (mut other, object) = app_builder("Missing.Assembly");
    other.type_def("Other", "Base", TypeAttributes::PUBLIC, object);
    context.add_module(other.build())?;

    let resolved = orphan.base_type()?.unwrap();
    assert_eq!(resolved.full_name()?, "Other.Base");
    assert!(orphan.is_class()?);
    Ok(())
}

#[test]
fn configuration_errors() -> Result<()> {
    init_logging();
    let context = TypeSystemContext::new(TypeSystemOptions::default());
    assert!(matches!(
        context.get_well_known_type(WellKnownType::Object),
        Err(Error::ContextNotInitialized)
    ));
    assert!(matches!(
        context.initialize(),
        Err(Error::ModuleNotFound(name)) if name == CORELIB
    ));

    context.add_module(MetadataBuilder::new(CORELIB).build())?;
    let error = context.initialize().unwrap_err();
    assert!(matches!(error, Error::WellKnownTypeMissing(WellKnownType::Void)));
    assert!(error.is_configuration_error());
    assert!(!context.is_initialized());

    let duplicate = context.add_module(MetadataBuilder::new(CORELIB).build());
    assert!(matches!(duplicate, Err(Error::ModuleExists(name)) if name == CORELIB));
    Ok(())
}

#[test]
fn custom_system_module_name() -> Result<()> {
    let options = TypeSystemOptions::default().with_system_module("mscorlib");
    let context = context_with_core_library(options)?;
    assert!(context.is_initialized());
    // Initializing twice is a no-op
    context.initialize()?;

    let object = context.get_well_known_type(WellKnownType::Object)?;
    assert_eq!(object.module()?.unwrap().name(), "mscorlib");
    assert!(context.module(CORELIB).is_none());
    assert_eq!(context.modules().count(), 1);
    Ok(())
}

#[test]
fn nested_types_resolve_within_and_across_modules() -> Result<()> {
    let context = context_with_core_library(TypeSystemOptions::default())?;

    let (mut builder, object) = app_builder("App");
    let outer = builder.type_def("N", "Outer", TypeAttributes::PUBLIC, object);
    builder.nested_type_def(outer, "", "Inner", TypeAttributes::NESTED_PUBLIC, object);
    let this_module = Token::from_parts(TableId::Module, 1);
    let outer_ref = builder.type_ref(this_module, "N", "Outer");
    let inner_ref = builder.type_ref(outer_ref, "", "Inner");
    let app = context.add_module(builder.build())?;

    let outer = app.get_type_by_name("N", "Outer")?.unwrap();
    let inner = outer.get_nested_type("Inner")?.unwrap();
    assert_eq!(inner.full_name()?, "N.Outer+Inner");
    assert!(Arc::ptr_eq(&inner.containing_type()?.unwrap(), &outer));
    assert_eq!(outer.get_nested_types()?.len(), 1);
    assert!(outer.get_nested_type("Missing")?.is_none());
    assert!(app.get_type_by_name("", "Inner")?.is_none());
    assert!(Arc::ptr_eq(&app.get_type(inner_ref)?.unwrap(), &inner));

    let mut consumer = MetadataBuilder::new("Consumer");
    let app_ref = consumer.assembly_ref("App");
    let outer_ref = consumer.type_ref(app_ref, "N", "Outer");
    let inner_ref = consumer.type_ref(outer_ref, "", "Inner");
    let missing_ref = consumer.type_ref(outer_ref, "", "Missing");
    let consumer = context.add_module(consumer.build())?;

    assert!(Arc::ptr_eq(&consumer.get_type(inner_ref)?.unwrap(), &inner));
    assert!(consumer.get_type(missing_ref)?.is_none());
    assert!(consumer.get_type(Token::from_parts(TableId::TypeRef, 0))?.is_none());
    assert!(matches!(
        consumer.get_type(Token::from_parts(TableId::TypeRef, 40)),
        Err(Error::TypeNotFound(_))
    ));
    Ok(())
}

#[test]
fn hash_codes_are_stable_across_contexts() -> Result<()> {
    let first = context_with_core_library(TypeSystemOptions::default())?;
    let second = context_with_core_library(TypeSystemOptions::default())?;

    for kind in [WellKnownType::String, WellKnownType::Int32, WellKnownType::Nullable] {
        let a = first.get_well_known_type(kind)?;
        let b = second.get_well_known_type(kind)?;
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.hash_code()?, b.hash_code()?);
        assert_eq!(
            first.sz_array_type(&a).hash_code()?,
            second.sz_array_type(&b).hash_code()?
        );
    }

    let string = first.get_well_known_type(WellKnownType::String)?;
    let object = first.get_well_known_type(WellKnownType::Object)?;
    assert_ne!(string.hash_code()?, object.hash_code()?);
    assert_ne!(
        first.sz_array_type(&string).hash_code()?,
        first.pointer_type(&string).hash_code()?
    );
    Ok(())
}

#[test]
fn well_known_categories() -> Result<()> {
    let context = context_with_core_library(TypeSystemOptions::default())?;
    let category = |kind: WellKnownType| -> Result<TypeCategory> {
        context.get_well_known_type(kind)?.category()
    };

    assert_eq!(category(WellKnownType::Int32)?, TypeCategory::Int32);
    assert_eq!(category(WellKnownType::Boolean)?, TypeCategory::Boolean);
    assert_eq!(category(WellKnownType::Nullable)?, TypeCategory::Nullable);
    assert_eq!(category(WellKnownType::String)?, TypeCategory::Class);
    assert_eq!(category(WellKnownType::Object)?, TypeCategory::Class);
    assert_eq!(category(WellKnownType::RuntimeTypeHandle)?, TypeCategory::ValueType);
    assert!(context
        .get_well_known_type(WellKnownType::Double)?
        .is_primitive()?);
    assert!(context
        .get_well_known_type(WellKnownType::Nullable)?
        .is_nullable()?);
    assert!(context
        .get_well_known_type(WellKnownType::String)?
        .is_sealed()?);
    Ok(())
}

#[test]
fn end_to_end_class_with_constructor_and_virtual_method() -> Result<()> {
    let context = context_with_core_library(TypeSystemOptions::default())?;
    let (mut builder, object) = app_builder("App");
    let class = builder.type_def("N", "C", TypeAttributes::PUBLIC, object);
    let ctor_flags = MethodAttributes::PUBLIC
        | MethodAttributes::HIDE_BY_SIG
        | MethodAttributes::SPECIAL_NAME
        | MethodAttributes::RTSPECIAL_NAME;
    let ctor = builder.method_def(
        class,
        ".ctor",
        ctor_flags,
        &SignatureMethod::instance(TypeSignature::Void, vec![]),
    )?;
    builder.method_def(
        class,
        "M",
        MethodAttributes::PUBLIC
            | MethodAttributes::HIDE_BY_SIG
            | MethodAttributes::VIRTUAL
            | MethodAttributes::NEW_SLOT,
        &SignatureMethod::instance(TypeSignature::Void, vec![]),
    )?;

    // Only a vararg constructor without fixed parameters
    let variadic = builder.type_def("N", "Variadic", TypeAttributes::PUBLIC, object);
    builder.method_def(
        variadic,
        ".ctor",
        ctor_flags,
        &SignatureMethod {
            vararg: true,
            default: false,
            ..SignatureMethod::instance(TypeSignature::Void, vec![])
        },
    )?;
    let module = context.add_module(builder.build())?;

    let c = module.get_type_by_name("N", "C")?.unwrap();
    assert_eq!(c.name()?, "C");
    assert_eq!(c.namespace()?, "N");
    assert_eq!(c.category()?, TypeCategory::Class);
    assert_eq!(c.get_default_constructor()?.unwrap().token(), ctor);
    assert!(c.get_finalizer()?.is_none());
    assert!(!c.has_finalizer()?);
    assert_eq!(c.get_virtual_methods()?.count(), 1);
    assert_eq!(c.hash_code()?, c.hash_code()?);

    let variadic = module.get_type_by_name("N", "Variadic")?.unwrap();
    assert!(variadic.get_default_constructor()?.is_none());
    Ok(())
}
