//! Graph validation: missing dependencies, cycles, and the deferred
//! escape hatch.

use std::sync::Arc;

use wireup::{configure, ComponentError, Dep, Lazy, TypeDescriptor, SINGLETON};

struct A {
    b: Option<Arc<B>>,
}

struct B {
    a: Option<Lazy<A>>,
}

struct C;

#[test]
fn missing_dependency_fails_at_build() {
    let mut components = configure();
    components
        .bind_component::<A>(
            TypeDescriptor::of::<A>()
                .inject_constructor(vec![Dep::of::<B>()], |deps| {
                    Ok(A { b: Some(deps.take::<B>()?) })
                })
                .finish(),
        )
        .unwrap();

    let err = components.build().unwrap_err();
    match err {
        ComponentError::UnsatisfiedDependency { component, dependency } => {
            assert_eq!(component.display_name(), std::any::type_name::<A>());
            assert_eq!(dependency.display_name(), std::any::type_name::<B>());
        }
        other => panic!("expected UnsatisfiedDependency, got {other}"),
    }
}

#[test]
fn two_component_cycle_fails_at_build() {
    let mut components = configure();
    components
        .bind_component::<A>(
            TypeDescriptor::of::<A>()
                .inject_constructor(vec![Dep::of::<B>()], |deps| {
                    Ok(A { b: Some(deps.take::<B>()?) })
                })
                .finish(),
        )
        .unwrap();
    components
        .bind_component::<B>(
            TypeDescriptor::of::<B>()
                .inject_constructor(vec![Dep::of::<A>()], |deps| {
                    deps.take::<A>()?;
                    Ok(B { a: None })
                })
                .finish(),
        )
        .unwrap();

    let err = components.build().unwrap_err();
    match err {
        ComponentError::CircularDependency { path, repeated } => {
            assert!(path.len() >= 2);
            assert_eq!(path.last(), Some(&repeated));
            assert_eq!(path.first(), Some(&repeated));
        }
        other => panic!("expected CircularDependency, got {other}"),
    }
}

#[test]
fn self_cycle_fails_at_build() {
    let mut components = configure();
    components
        .bind_component::<C>(
            TypeDescriptor::of::<C>()
                .inject_constructor(vec![Dep::of::<C>()], |deps| {
                    deps.take::<C>()?;
                    Ok(C)
                })
                .finish(),
        )
        .unwrap();

    let err = components.build().unwrap_err();
    match err {
        ComponentError::CircularDependency { repeated, .. } => {
            assert_eq!(repeated.display_name(), std::any::type_name::<C>());
        }
        other => panic!("expected CircularDependency, got {other}"),
    }
}

#[test]
fn three_component_cycle_fails_at_build() {
    struct X;
    struct Y;
    struct Z;

    let mut components = configure();
    components
        .bind_component::<X>(
            TypeDescriptor::of::<X>()
                .inject_constructor(vec![Dep::of::<Y>()], |deps| {
                    deps.take::<Y>()?;
                    Ok(X)
                })
                .finish(),
        )
        .unwrap();
    components
        .bind_component::<Y>(
            TypeDescriptor::of::<Y>()
                .inject_constructor(vec![Dep::of::<Z>()], |deps| {
                    deps.take::<Z>()?;
                    Ok(Y)
                })
                .finish(),
        )
        .unwrap();
    components
        .bind_component::<Z>(
            TypeDescriptor::of::<Z>()
                .inject_constructor(vec![Dep::of::<X>()], |deps| {
                    deps.take::<X>()?;
                    Ok(Z)
                })
                .finish(),
        )
        .unwrap();

    assert!(matches!(
        components.build(),
        Err(ComponentError::CircularDependency { .. })
    ));
}

#[test]
fn deferred_reference_breaks_the_cycle() {
    let mut components = configure();
    components
        .bind_component_with::<A>(
            TypeDescriptor::of::<A>()
                .inject_constructor(vec![Dep::of::<B>()], |deps| {
                    Ok(A { b: Some(deps.take::<B>()?) })
                })
                .finish(),
            &[SINGLETON],
        )
        .unwrap();
    components
        .bind_component_with::<B>(
            TypeDescriptor::of::<B>()
                .inject_constructor(vec![Dep::lazy::<A>()], |deps| {
                    Ok(B { a: Some(deps.take_lazy::<A>()?) })
                })
                .finish(),
            &[SINGLETON],
        )
        .unwrap();

    let cx = components.build().unwrap();
    let a = cx.get::<A>().unwrap();
    let b = a.b.as_ref().unwrap();

    // After construction the deferred handle resolves to the cached
    // singleton, closing the loop at runtime.
    let back = b.a.as_ref().unwrap().get().unwrap();
    assert!(Arc::ptr_eq(&a, &back));
}

#[test]
fn deferred_handle_to_an_unscoped_target_yields_fresh_instances() {
    struct Source;
    struct Holder {
        source: Lazy<Source>,
    }

    let mut components = configure();
    components
        .bind_component::<Source>(
            TypeDescriptor::of::<Source>().default_constructor(|| Source).finish(),
        )
        .unwrap();
    components
        .bind_component::<Holder>(
            TypeDescriptor::of::<Holder>()
                .inject_constructor(vec![Dep::lazy::<Source>()], |deps| {
                    Ok(Holder { source: deps.take_lazy::<Source>()? })
                })
                .finish(),
        )
        .unwrap();

    let cx = components.build().unwrap();
    let holder = cx.get::<Holder>().unwrap();
    let first = holder.source.get().unwrap();
    let second = holder.source.get().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn every_binding_is_validated_not_only_reachable_ones() {
    struct Used;
    struct Orphan;
    struct MissingDep;

    let mut components = configure();
    components.bind_instance(Used, &[]).unwrap();
    components
        .bind_component::<Orphan>(
            TypeDescriptor::of::<Orphan>()
                .inject_constructor(vec![Dep::of::<MissingDep>()], |deps| {
                    deps.take::<MissingDep>()?;
                    Ok(Orphan)
                })
                .finish(),
        )
        .unwrap();

    assert!(matches!(
        components.build(),
        Err(ComponentError::UnsatisfiedDependency { .. })
    ));
}
