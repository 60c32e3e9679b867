//! Construction-protocol behavior: member injection order, override
//! suppression, and descriptor shape errors.

use std::sync::Arc;

use wireup::{configure, ComponentError, Dep, MethodDecl, TypeDescriptor, Visibility};

struct Clock {
    now: u64,
}

#[derive(Default)]
struct Widget {
    clock: Option<Arc<Clock>>,
    log: Vec<&'static str>,
}

fn bind_clock(components: &mut wireup::ComponentCollection) {
    components.bind_instance(Clock { now: 7 }, &[]).unwrap();
}

#[test]
fn injects_declared_field_after_construction() {
    let mut components = configure();
    bind_clock(&mut components);
    components
        .bind_component::<Widget>(
            TypeDescriptor::of::<Widget>()
                .default_constructor(Widget::default)
                .level("Widget")
                .inject_field("clock", Dep::of::<Clock>(), |widget, deps| {
                    widget.clock = Some(deps.take::<Clock>()?);
                    Ok(())
                })
                .done()
                .finish(),
        )
        .unwrap();

    let cx = components.build().unwrap();
    let widget = cx.get::<Widget>().unwrap();
    assert_eq!(widget.clock.as_ref().unwrap().now, 7);
}

#[test]
fn injects_declared_method_with_dependencies() {
    let mut components = configure();
    bind_clock(&mut components);
    components
        .bind_component::<Widget>(
            TypeDescriptor::of::<Widget>()
                .default_constructor(Widget::default)
                .level("Widget")
                .inject_method("install", vec![Dep::of::<Clock>()], |widget, deps| {
                    widget.clock = Some(deps.take::<Clock>()?);
                    widget.log.push("install");
                    Ok(())
                })
                .done()
                .finish(),
        )
        .unwrap();

    let cx = components.build().unwrap();
    let widget = cx.get::<Widget>().unwrap();
    assert_eq!(widget.clock.as_ref().unwrap().now, 7);
    assert_eq!(widget.log, vec!["install"]);
}

#[test]
fn runs_protocol_constructor_then_fields_then_methods_base_first() {
    let mut components = configure();
    bind_clock(&mut components);
    components
        .bind_component::<Widget>(
            TypeDescriptor::of::<Widget>()
                .inject_constructor(vec![], |_| {
                    Ok(Widget { log: vec!["constructor"], ..Widget::default() })
                })
                .level("Base")
                .inject_field("clock", Dep::of::<Clock>(), |widget, deps| {
                    widget.clock = Some(deps.take::<Clock>()?);
                    widget.log.push("base field");
                    Ok(())
                })
                .inject_method("base_setup", vec![], |widget, _| {
                    widget.log.push("base method");
                    Ok(())
                })
                .done()
                .level("Derived")
                .inject_method("derived_setup", vec![], |widget, _| {
                    widget.log.push("derived method");
                    Ok(())
                })
                .done()
                .finish(),
        )
        .unwrap();

    let cx = components.build().unwrap();
    let widget = cx.get::<Widget>().unwrap();
    assert_eq!(
        widget.log,
        vec!["constructor", "base field", "base method", "derived method"]
    );
}

#[test]
fn overridden_inject_method_runs_once_at_most_derived_level() {
    let mut components = configure();
    components
        .bind_component::<Widget>(
            TypeDescriptor::of::<Widget>()
                .default_constructor(Widget::default)
                .level("Base")
                .inject_method("setup", vec![], |widget, _| {
                    widget.log.push("base setup");
                    Ok(())
                })
                .done()
                .level("Derived")
                .inject_method("setup", vec![], |widget, _| {
                    widget.log.push("derived setup");
                    Ok(())
                })
                .done()
                .finish(),
        )
        .unwrap();

    let cx = components.build().unwrap();
    let widget = cx.get::<Widget>().unwrap();
    assert_eq!(widget.log, vec!["derived setup"]);
}

#[test]
fn unmarked_override_suppresses_inherited_inject_method() {
    let mut components = configure();
    components
        .bind_component::<Widget>(
            TypeDescriptor::of::<Widget>()
                .default_constructor(Widget::default)
                .level("Base")
                .inject_method("setup", vec![], |widget, _| {
                    widget.log.push("base setup");
                    Ok(())
                })
                .done()
                .level("Derived")
                .plain_method("setup", vec![])
                .done()
                .finish(),
        )
        .unwrap();

    let cx = components.build().unwrap();
    let widget = cx.get::<Widget>().unwrap();
    assert!(widget.log.is_empty());
}

#[test]
fn same_name_different_parameters_is_not_an_override() {
    let mut components = configure();
    bind_clock(&mut components);
    components
        .bind_component::<Widget>(
            TypeDescriptor::of::<Widget>()
                .default_constructor(Widget::default)
                .level("Base")
                .inject_method("setup", vec![], |widget, _| {
                    widget.log.push("base setup()");
                    Ok(())
                })
                .done()
                .level("Derived")
                .inject_method("setup", vec![Dep::of::<Clock>()], |widget, deps| {
                    deps.take::<Clock>()?;
                    widget.log.push("derived setup(clock)");
                    Ok(())
                })
                .done()
                .finish(),
        )
        .unwrap();

    let cx = components.build().unwrap();
    let widget = cx.get::<Widget>().unwrap();
    assert_eq!(widget.log, vec!["base setup()", "derived setup(clock)"]);
}

#[test]
fn private_methods_never_participate_in_override_matching() {
    let mut components = configure();
    components
        .bind_component::<Widget>(
            TypeDescriptor::of::<Widget>()
                .default_constructor(Widget::default)
                .level("Base")
                .inject_method_decl(
                    MethodDecl::new("setup").visibility(Visibility::Private),
                    vec![],
                    |widget, _| {
                        widget.log.push("base private setup");
                        Ok(())
                    },
                )
                .done()
                .level("Derived")
                .inject_method_decl(
                    MethodDecl::new("setup").visibility(Visibility::Private),
                    vec![],
                    |widget, _| {
                        widget.log.push("derived private setup");
                        Ok(())
                    },
                )
                .done()
                .finish(),
        )
        .unwrap();

    let cx = components.build().unwrap();
    let widget = cx.get::<Widget>().unwrap();
    // Both run, base-first: no override relation between private methods.
    assert_eq!(widget.log, vec!["base private setup", "derived private setup"]);
}

#[test]
fn read_only_inject_field_is_rejected() {
    let mut components = configure();
    let err = components
        .bind_component::<Widget>(
            TypeDescriptor::of::<Widget>()
                .default_constructor(Widget::default)
                .level("Widget")
                .read_only_field("clock", Dep::of::<Clock>())
                .done()
                .finish(),
        )
        .unwrap_err();
    match err {
        ComponentError::FinalInjectField { fields, .. } => {
            assert_eq!(fields, vec!["Widget::clock"])
        }
        other => panic!("expected FinalInjectField, got {other}"),
    }
}

#[test]
fn inject_method_with_type_parameters_is_rejected() {
    let mut components = configure();
    let err = components
        .bind_component::<Widget>(
            TypeDescriptor::of::<Widget>()
                .default_constructor(Widget::default)
                .level("Widget")
                .inject_method_decl(
                    MethodDecl::new("install").with_type_parameters(),
                    vec![],
                    |_, _| Ok(()),
                )
                .done()
                .finish(),
        )
        .unwrap_err();
    match err {
        ComponentError::GenericInjectMethod { methods, .. } => {
            assert_eq!(methods, vec!["Widget::install"])
        }
        other => panic!("expected GenericInjectMethod, got {other}"),
    }
}

#[test]
fn marked_constructor_wins_over_default_constructor() {
    let mut components = configure();
    bind_clock(&mut components);
    components
        .bind_component::<Widget>(
            TypeDescriptor::of::<Widget>()
                .default_constructor(|| panic!("default constructor must not run"))
                .inject_constructor(vec![Dep::of::<Clock>()], |deps| {
                    Ok(Widget {
                        clock: Some(deps.take::<Clock>()?),
                        log: vec!["marked"],
                    })
                })
                .finish(),
        )
        .unwrap();

    let cx = components.build().unwrap();
    let widget = cx.get::<Widget>().unwrap();
    assert_eq!(widget.log, vec!["marked"]);
    assert_eq!(widget.clock.as_ref().unwrap().now, 7);
}

#[test]
fn exhausted_dependency_values_name_the_component_under_construction() {
    let mut components = configure();
    components
        .bind_component::<Widget>(
            TypeDescriptor::of::<Widget>()
                .inject_constructor(vec![], |deps| {
                    deps.take::<Clock>()?;
                    Ok(Widget::default())
                })
                .finish(),
        )
        .unwrap();

    let cx = components.build().unwrap();
    match cx.get::<Widget>() {
        Err(ComponentError::TypeMismatch(name)) => {
            assert_eq!(name, std::any::type_name::<Widget>());
        }
        other => panic!("expected TypeMismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn multiple_inject_constructors_are_rejected() {
    let mut components = configure();
    let err = components
        .bind_component::<Widget>(
            TypeDescriptor::of::<Widget>()
                .inject_constructor(vec![], |_| Ok(Widget::default()))
                .inject_constructor(vec![], |_| Ok(Widget::default()))
                .finish(),
        )
        .unwrap_err();
    assert!(matches!(err, ComponentError::AmbiguousConstructor(_)));
}

#[test]
fn missing_constructor_is_rejected() {
    let mut components = configure();
    let err = components
        .bind_component::<Widget>(TypeDescriptor::of::<Widget>().finish())
        .unwrap_err();
    assert!(matches!(err, ComponentError::NoDefaultConstructor(_)));
}

#[test]
fn abstract_descriptor_cannot_be_bound_as_component() {
    trait Port: Send + Sync {}

    let mut components = configure();
    let err = components
        .bind_component::<Widget>(TypeDescriptor::abstract_of::<dyn Port>())
        .unwrap_err();
    assert!(matches!(err, ComponentError::AbstractComponent(_)));
}

#[test]
fn constructor_error_propagates_to_the_caller() {
    let mut components = configure();
    components
        .bind_component::<Widget>(
            TypeDescriptor::of::<Widget>()
                .inject_constructor(vec![], |_| {
                    Err(ComponentError::TypeMismatch("widget init failed"))
                })
                .finish(),
        )
        .unwrap();

    let cx = components.build().unwrap();
    assert!(matches!(
        cx.get::<Widget>(),
        Err(ComponentError::TypeMismatch("widget init failed"))
    ));
}
