//! Type descriptors: explicit injection metadata for concrete types.
//!
//! Classic containers discover injectable constructors, fields, and
//! methods by runtime reflection. Here that discovery is replaced by a
//! descriptor the application builds once per bound type: the same
//! information (marked constructors, fields and methods grouped by
//! hierarchy level, dependency sites with qualifiers), expressed as
//! data plus typed closures instead of reflective member handles.
//!
//! A descriptor only *declares*. All shape rules (constructor
//! ambiguity, read-only fields, override suppression, qualifier
//! arity) are enforced when the [`InjectionProvider`](crate::InjectionProvider)
//! derives its plan from the descriptor at binding time.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::error::{ComponentError, DiResult};
use crate::injection::Deps;
use crate::key::{ComponentKey, Tag, TagKind};
use crate::reference::ComponentRef;

pub(crate) type ConstructFn =
    Arc<dyn Fn(&mut Deps) -> DiResult<Box<dyn Any + Send + Sync>> + Send + Sync>;
pub(crate) type MemberFn =
    Arc<dyn Fn(&mut (dyn Any + Send + Sync), &mut Deps) -> DiResult<()> + Send + Sync>;

/// One injection-site dependency: a target type, an optional deferred
/// flag, and the qualifier tags attached to the site.
///
/// More than one qualifier on a single site is rejected with
/// `AmbiguousQualifier` when the injection plan is derived.
#[derive(Clone)]
pub struct Dep {
    target: DepTarget,
    deferred: bool,
    qualifiers: Vec<Tag>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DepTarget {
    Type(TypeId, &'static str),
    Trait(&'static str),
}

impl Dep {
    /// Direct dependency on a concrete type.
    pub fn of<T: 'static>() -> Self {
        Dep {
            target: DepTarget::Type(TypeId::of::<T>(), std::any::type_name::<T>()),
            deferred: false,
            qualifiers: Vec::new(),
        }
    }

    /// Deferred dependency on a concrete type, materialized as a
    /// [`Lazy<T>`](crate::Lazy) handle and exempt from cycle checking.
    pub fn lazy<T: 'static>() -> Self {
        Dep { deferred: true, ..Dep::of::<T>() }
    }

    /// Direct dependency on a trait binding.
    pub fn of_trait<T: ?Sized + 'static>() -> Self {
        Dep {
            target: DepTarget::Trait(std::any::type_name::<T>()),
            deferred: false,
            qualifiers: Vec::new(),
        }
    }

    /// Attaches a qualifier tag to this site.
    pub fn qualified(mut self, qualifier: Tag) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    /// True when both sites name the same target type with the same
    /// deferral. Used for override signature matching.
    pub(crate) fn same_site_type(&self, other: &Dep) -> bool {
        self.target == other.target && self.deferred == other.deferred
    }

    /// Derives the component reference for this site, enforcing the
    /// at-most-one-qualifier rule.
    pub(crate) fn to_reference(
        &self,
        component: &'static str,
        element: &'static str,
    ) -> DiResult<ComponentRef> {
        if self.qualifiers.len() > 1 {
            return Err(ComponentError::AmbiguousQualifier { component, element });
        }
        let qualifier = match self.qualifiers.first() {
            Some(tag) if tag.kind() != TagKind::Qualifier => {
                return Err(ComponentError::IllegalTag { target: element, tag: *tag });
            }
            Some(tag) => Some(*tag),
            None => None,
        };
        let key = match self.target {
            DepTarget::Type(id, name) => match qualifier {
                Some(q) => ComponentKey::TypeQualified(id, name, q),
                None => ComponentKey::Type(id, name),
            },
            DepTarget::Trait(name) => match qualifier {
                Some(q) => ComponentKey::TraitQualified(name, q),
                None => ComponentKey::Trait(name),
            },
        };
        Ok(ComponentRef::new(key, self.deferred))
    }
}

/// Visibility of a declared method, for override matching.
///
/// Private methods never participate in override matching; all others
/// match by name and parameter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Module,
    Private,
}

/// Declaration options for a method beyond name and parameters.
#[derive(Debug, Clone, Copy)]
pub struct MethodDecl {
    pub(crate) name: &'static str,
    pub(crate) visibility: Visibility,
    pub(crate) type_parameters: bool,
}

impl MethodDecl {
    pub fn new(name: &'static str) -> Self {
        MethodDecl { name, visibility: Visibility::Public, type_parameters: false }
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Marks the method as declaring its own type parameters. Such
    /// methods are rejected with `GenericInjectMethod` when marked for
    /// injection.
    pub fn with_type_parameters(mut self) -> Self {
        self.type_parameters = true;
        self
    }
}

#[derive(Clone)]
pub(crate) struct ConstructorSpec {
    pub(crate) params: Vec<Dep>,
    pub(crate) construct: ConstructFn,
}

#[derive(Clone)]
pub(crate) enum FieldAccess {
    Writable(MemberFn),
    ReadOnly,
}

#[derive(Clone)]
pub(crate) struct FieldSpec {
    pub(crate) name: &'static str,
    pub(crate) dep: Dep,
    pub(crate) access: FieldAccess,
}

#[derive(Clone)]
pub(crate) enum MethodBody {
    /// Inject-marked: invoked during the construction protocol.
    Inject(MemberFn),
    /// Declared without the injection mark; exists only to suppress an
    /// inherited marked method.
    Plain,
}

#[derive(Clone)]
pub(crate) struct MethodSpec {
    pub(crate) decl: MethodDecl,
    pub(crate) params: Vec<Dep>,
    pub(crate) body: MethodBody,
}

impl MethodSpec {
    pub(crate) fn is_inject(&self) -> bool {
        matches!(self.body, MethodBody::Inject(_))
    }

    /// Whether `self` (declared at a more-derived level) overrides
    /// `base`.
    pub(crate) fn overrides(&self, base: &MethodSpec) -> bool {
        if self.decl.visibility == Visibility::Private
            || base.decl.visibility == Visibility::Private
        {
            return false;
        }
        self.decl.name == base.decl.name
            && self.params.len() == base.params.len()
            && self
                .params
                .iter()
                .zip(base.params.iter())
                .all(|(a, b)| a.same_site_type(b))
    }
}

/// One level of the type's hierarchy, base-most first in the
/// descriptor. Fields and methods keep declaration order within a
/// level.
#[derive(Clone)]
pub(crate) struct LevelSpec {
    pub(crate) name: &'static str,
    pub(crate) fields: Vec<FieldSpec>,
    pub(crate) methods: Vec<MethodSpec>,
}

/// Immutable description of a concrete type: how to construct it and
/// which members receive injection, grouped by hierarchy level.
///
/// Built once per bound type and reused for every instantiation.
///
/// # Examples
///
/// ```rust
/// use wireup::{Dep, TypeDescriptor};
/// use std::sync::Arc;
///
/// struct Config { url: String }
/// struct Repository { config: Arc<Config> }
///
/// let descriptor = TypeDescriptor::of::<Repository>()
///     .inject_constructor(vec![Dep::of::<Config>()], |deps| {
///         Ok(Repository { config: deps.take::<Config>()? })
///     })
///     .finish();
/// assert_eq!(descriptor.type_name(), std::any::type_name::<Repository>());
/// ```
#[derive(Clone)]
pub struct TypeDescriptor {
    pub(crate) type_name: &'static str,
    pub(crate) is_abstract: bool,
    pub(crate) tags: Vec<Tag>,
    pub(crate) constructors: Vec<ConstructorSpec>,
    pub(crate) default_constructor: Option<ConstructorSpec>,
    pub(crate) levels: Vec<LevelSpec>,
}

impl TypeDescriptor {
    /// Starts a descriptor for a concrete, instantiable type.
    pub fn of<T: Send + Sync + 'static>() -> DescriptorBuilder<T> {
        DescriptorBuilder {
            descriptor: TypeDescriptor {
                type_name: std::any::type_name::<T>(),
                is_abstract: false,
                tags: Vec::new(),
                constructors: Vec::new(),
                default_constructor: None,
                levels: Vec::new(),
            },
            _marker: std::marker::PhantomData,
        }
    }

    /// Descriptor for a non-instantiable type. Binding it as a
    /// component fails with `AbstractComponent`.
    pub fn abstract_of<T: ?Sized + 'static>() -> TypeDescriptor {
        TypeDescriptor {
            type_name: std::any::type_name::<T>(),
            is_abstract: true,
            tags: Vec::new(),
            constructors: Vec::new(),
            default_constructor: None,
            levels: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Tags declared on the type itself (scope and/or qualifiers).
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }
}

/// Typed builder for [`TypeDescriptor`].
pub struct DescriptorBuilder<T> {
    descriptor: TypeDescriptor,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> DescriptorBuilder<T> {
    /// Declares a tag on the type, the counterpart of annotating the
    /// implementation class (a scope tag here is picked up by
    /// `bind_component` when no explicit scope is given).
    pub fn tagged(mut self, tag: Tag) -> Self {
        self.descriptor.tags.push(tag);
        self
    }

    /// Declares an inject-marked constructor. Declaring more than one
    /// fails with `AmbiguousConstructor` at binding time.
    pub fn inject_constructor<F>(mut self, params: Vec<Dep>, make: F) -> Self
    where
        F: Fn(&mut Deps) -> DiResult<T> + Send + Sync + 'static,
    {
        self.descriptor.constructors.push(ConstructorSpec {
            params,
            construct: erase_constructor(make),
        });
        self
    }

    /// Declares the zero-dependency default constructor, used when no
    /// constructor is inject-marked.
    pub fn default_constructor<F>(mut self, make: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.descriptor.default_constructor = Some(ConstructorSpec {
            params: Vec::new(),
            construct: erase_constructor(move |_| Ok(make())),
        });
        self
    }

    /// Opens a hierarchy level. Declare levels base-most first; fields
    /// are assigned and methods invoked in that order.
    pub fn level(self, name: &'static str) -> LevelBuilder<T> {
        LevelBuilder {
            builder: self,
            level: LevelSpec { name, fields: Vec::new(), methods: Vec::new() },
        }
    }

    pub fn finish(self) -> TypeDescriptor {
        self.descriptor
    }
}

/// Builder for the members declared at one hierarchy level.
pub struct LevelBuilder<T> {
    builder: DescriptorBuilder<T>,
    level: LevelSpec,
}

impl<T: Send + Sync + 'static> LevelBuilder<T> {
    /// Declares an inject-marked, assignable field.
    pub fn inject_field<F>(mut self, name: &'static str, dep: Dep, assign: F) -> Self
    where
        F: Fn(&mut T, &mut Deps) -> DiResult<()> + Send + Sync + 'static,
    {
        self.level.fields.push(FieldSpec {
            name,
            dep,
            access: FieldAccess::Writable(erase_member(assign)),
        });
        self
    }

    /// Declares an inject-marked field that cannot be assigned after
    /// construction. Binding a type with such a field fails with
    /// `FinalInjectField`.
    pub fn read_only_field(mut self, name: &'static str, dep: Dep) -> Self {
        self.level.fields.push(FieldSpec { name, dep, access: FieldAccess::ReadOnly });
        self
    }

    /// Declares an inject-marked method with default (public)
    /// visibility.
    pub fn inject_method<F>(self, name: &'static str, params: Vec<Dep>, invoke: F) -> Self
    where
        F: Fn(&mut T, &mut Deps) -> DiResult<()> + Send + Sync + 'static,
    {
        self.inject_method_decl(MethodDecl::new(name), params, invoke)
    }

    /// Declares an inject-marked method with full declaration options.
    pub fn inject_method_decl<F>(mut self, decl: MethodDecl, params: Vec<Dep>, invoke: F) -> Self
    where
        F: Fn(&mut T, &mut Deps) -> DiResult<()> + Send + Sync + 'static,
    {
        self.level.methods.push(MethodSpec {
            decl,
            params,
            body: MethodBody::Inject(erase_member(invoke)),
        });
        self
    }

    /// Declares an unmarked method. It is never invoked by the
    /// container, but it suppresses an inherited inject-marked method
    /// with the same signature (the level opted out of injection for
    /// that slot).
    pub fn plain_method(self, name: &'static str, params: Vec<Dep>) -> Self {
        self.plain_method_decl(MethodDecl::new(name), params)
    }

    /// Declares an unmarked method with full declaration options.
    pub fn plain_method_decl(mut self, decl: MethodDecl, params: Vec<Dep>) -> Self {
        self.level.methods.push(MethodSpec { decl, params, body: MethodBody::Plain });
        self
    }

    /// Closes this level.
    pub fn done(mut self) -> DescriptorBuilder<T> {
        self.builder.descriptor.levels.push(self.level);
        self.builder
    }
}

fn erase_constructor<T, F>(make: F) -> ConstructFn
where
    T: Send + Sync + 'static,
    F: Fn(&mut Deps) -> DiResult<T> + Send + Sync + 'static,
{
    Arc::new(move |deps| Ok(Box::new(make(deps)?) as Box<dyn Any + Send + Sync>))
}

fn erase_member<T, F>(run: F) -> MemberFn
where
    T: Send + Sync + 'static,
    F: Fn(&mut T, &mut Deps) -> DiResult<()> + Send + Sync + 'static,
{
    Arc::new(move |any, deps| {
        let instance = any
            .downcast_mut::<T>()
            .ok_or(ComponentError::TypeMismatch(std::any::type_name::<T>()))?;
        run(instance, deps)
    })
}
