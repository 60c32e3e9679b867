//! The injection engine: derives an injection plan from a type
//! descriptor and runs the construct-then-initialize protocol.

use std::sync::Arc;

use crate::descriptors::{
    ConstructFn, FieldAccess, MemberFn, MethodBody, MethodSpec, TypeDescriptor,
};
use crate::error::{ComponentError, DiResult};
use crate::provider::{AnyArc, ComponentProvider, Context};
use crate::reference::{ComponentRef, Lazy, LazyHandle};

/// Positional access to the resolved dependency values of one
/// injection element, handed to descriptor closures.
///
/// Values are taken in the same order the element declared its
/// [`Dep`](crate::Dep)s.
pub struct Deps {
    values: std::vec::IntoIter<Resolved>,
    component: &'static str,
}

enum Resolved {
    Instance(AnyArc),
    Deferred(LazyHandle),
}

impl Deps {
    fn next(&mut self) -> DiResult<Resolved> {
        self.values
            .next()
            .ok_or(ComponentError::TypeMismatch(self.component))
    }

    /// Takes the next value as a concrete type.
    pub fn take<T: Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        match self.next()? {
            Resolved::Instance(any) => any
                .downcast::<T>()
                .map_err(|_| ComponentError::TypeMismatch(std::any::type_name::<T>())),
            Resolved::Deferred(_) => {
                Err(ComponentError::TypeMismatch(std::any::type_name::<T>()))
            }
        }
    }

    /// Takes the next value as a trait object (bound via the trait
    /// binding path).
    pub fn take_trait<T: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        match self.next()? {
            Resolved::Instance(any) => {
                let outer = any
                    .downcast::<Arc<T>>()
                    .map_err(|_| ComponentError::TypeMismatch(std::any::type_name::<T>()))?;
                Ok((*outer).clone())
            }
            Resolved::Deferred(_) => {
                Err(ComponentError::TypeMismatch(std::any::type_name::<T>()))
            }
        }
    }

    /// Takes the next value as a deferred handle (declared with
    /// [`Dep::lazy`](crate::Dep::lazy)).
    pub fn take_lazy<T: Send + Sync + 'static>(&mut self) -> DiResult<Lazy<T>> {
        match self.next()? {
            Resolved::Deferred(handle) => Ok(Lazy::from_handle(handle)),
            Resolved::Instance(_) => {
                Err(ComponentError::TypeMismatch(std::any::type_name::<T>()))
            }
        }
    }
}

struct ConstructorPlan {
    refs: Vec<ComponentRef>,
    construct: ConstructFn,
}

struct MemberPlan {
    refs: Vec<ComponentRef>,
    run: MemberFn,
}

/// Provider that builds instances of one concrete type by running the
/// injection protocol: resolve constructor dependencies, construct,
/// then per hierarchy level base-first assign fields and invoke
/// inject-marked methods.
///
/// The plan is derived once from the descriptor; every shape error of
/// the descriptor (abstract type, constructor ambiguity, read-only
/// inject fields, generic inject methods, ambiguous qualifiers) is
/// reported here, at binding time. An undecorated `InjectionProvider`
/// re-runs the full protocol on every `get`, producing a fresh
/// instance each time.
pub struct InjectionProvider {
    component: &'static str,
    constructor: ConstructorPlan,
    members: Vec<MemberPlan>,
    dependencies: Vec<ComponentRef>,
}

impl InjectionProvider {
    pub fn new(descriptor: TypeDescriptor) -> DiResult<Self> {
        let component = descriptor.type_name;
        if descriptor.is_abstract {
            return Err(ComponentError::AbstractComponent(component));
        }

        if descriptor.constructors.len() > 1 {
            return Err(ComponentError::AmbiguousConstructor(component));
        }
        let mut marked = descriptor.constructors;
        let constructor_spec = match marked.pop() {
            Some(spec) => spec,
            None => descriptor
                .default_constructor
                .ok_or(ComponentError::NoDefaultConstructor(component))?,
        };

        // Fields: base-first, declaration order; read-only marked
        // fields cannot be assigned after construction.
        let read_only: Vec<String> = descriptor
            .levels
            .iter()
            .flat_map(|level| {
                level
                    .fields
                    .iter()
                    .filter(|field| matches!(field.access, FieldAccess::ReadOnly))
                    .map(move |field| format!("{}::{}", level.name, field.name))
            })
            .collect();
        if !read_only.is_empty() {
            return Err(ComponentError::FinalInjectField { component, fields: read_only });
        }

        let methods = collect_methods(&descriptor.levels);
        let generic: Vec<String> = methods
            .iter()
            .filter(|(_, _, m)| m.decl.type_parameters)
            .map(|(li, _, m)| format!("{}::{}", descriptor.levels[*li].name, m.decl.name))
            .collect();
        if !generic.is_empty() {
            return Err(ComponentError::GenericInjectMethod { component, methods: generic });
        }

        let constructor = ConstructorPlan {
            refs: site_references(&constructor_spec.params, component, "constructor")?,
            construct: constructor_spec.construct,
        };

        // Initialization order: per level base-first, fields before
        // methods.
        let mut members = Vec::new();
        let mut method_iter = methods.into_iter().peekable();
        for (li, level) in descriptor.levels.iter().enumerate() {
            for field in &level.fields {
                let run = match &field.access {
                    FieldAccess::Writable(assign) => assign.clone(),
                    FieldAccess::ReadOnly => continue, // rejected above
                };
                members.push(MemberPlan {
                    refs: site_references(std::slice::from_ref(&field.dep), component, field.name)?,
                    run,
                });
            }
            while let Some((mli, _, _)) = method_iter.peek() {
                if *mli != li {
                    break;
                }
                let (_, _, method) = match method_iter.next() {
                    Some(entry) => entry,
                    None => break,
                };
                let run = match method.body {
                    MethodBody::Inject(invoke) => invoke,
                    MethodBody::Plain => continue,
                };
                members.push(MemberPlan {
                    refs: site_references(&method.params, component, method.decl.name)?,
                    run,
                });
            }
        }

        let mut dependencies = constructor.refs.clone();
        for member in &members {
            dependencies.extend(member.refs.iter().cloned());
        }

        Ok(InjectionProvider { component, constructor, members, dependencies })
    }

    fn resolve_sites(&self, cx: &Context, refs: &[ComponentRef]) -> DiResult<Deps> {
        let mut values = Vec::with_capacity(refs.len());
        for reference in refs {
            if reference.is_deferred() {
                values.push(Resolved::Deferred(LazyHandle::new(
                    cx.clone(),
                    reference.key().clone(),
                )));
                continue;
            }
            // Graph validation proved every direct reference bound, so
            // a miss here means the reference was built against a
            // different context.
            let instance = cx
                .instance(reference.key())?
                .ok_or_else(|| ComponentError::NotFound(reference.key().clone()))?;
            values.push(Resolved::Instance(instance));
        }
        Ok(Deps {
            values: values.into_iter(),
            component: self.component,
        })
    }
}

impl ComponentProvider for InjectionProvider {
    fn get(&self, cx: &Context) -> DiResult<AnyArc> {
        let mut deps = self.resolve_sites(cx, &self.constructor.refs)?;
        let mut instance = (self.constructor.construct)(&mut deps)?;
        for member in &self.members {
            let mut deps = self.resolve_sites(cx, &member.refs)?;
            (member.run)(&mut *instance, &mut deps)?;
        }
        Ok(Arc::from(instance))
    }

    fn dependencies(&self) -> Vec<ComponentRef> {
        self.dependencies.clone()
    }
}

/// Collects inject-marked methods across levels with override
/// suppression: a marked method is dropped when a more-derived marked
/// method overrides it (injected once, at the most-derived override)
/// or when a more-derived unmarked method overrides it (the level
/// opted out). Returns `(level_index, declaration_index, method)`
/// sorted base-first.
fn collect_methods(
    levels: &[crate::descriptors::LevelSpec],
) -> Vec<(usize, usize, MethodSpec)> {
    let mut collected: Vec<(usize, usize, MethodSpec)> = Vec::new();
    for li in (0..levels.len()).rev() {
        for (mi, method) in levels[li].methods.iter().enumerate() {
            if !method.is_inject() {
                continue;
            }
            if collected.iter().any(|(_, _, derived)| derived.overrides(method)) {
                continue;
            }
            let opted_out = levels[li + 1..].iter().any(|level| {
                level
                    .methods
                    .iter()
                    .any(|other| !other.is_inject() && other.overrides(method))
            });
            if opted_out {
                continue;
            }
            collected.push((li, mi, method.clone()));
        }
    }
    collected.sort_by_key(|(li, mi, _)| (*li, *mi));
    collected
}

fn site_references(
    params: &[crate::descriptors::Dep],
    component: &'static str,
    element: &'static str,
) -> DiResult<Vec<ComponentRef>> {
    params
        .iter()
        .map(|dep| dep.to_reference(component, element))
        .collect()
}
