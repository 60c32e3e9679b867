//! The binding registry: accumulates bindings during configuration and
//! produces validated [`Context`]s.

use std::collections::HashMap;
use std::sync::Arc;

use crate::descriptors::TypeDescriptor;
use crate::error::{ComponentError, DiResult};
use crate::injection::InjectionProvider;
use crate::key::{key_of, key_of_trait, ComponentKey, Tag, TagKind, SINGLETON};
use crate::provider::{AnyArc, ComponentProvider, Context, InstanceProvider};
use crate::reference::ComponentRef;
use crate::scope::{singleton_decorator, ScopeDecorator};
use crate::validation::check_bindings;

pub mod modules;
pub use modules::{BindingModule, Declarations};

/// Mutable binding registry, owned by the configuring thread.
///
/// Configuration and serving are strictly ordered phases: bindings are
/// accumulated here, then [`build`](ComponentCollection::build)
/// validates the whole graph and snapshots it into an immutable
/// [`Context`]. Binding a key twice is an error, not an overwrite.
///
/// # Examples
///
/// ```rust
/// use wireup::{configure, Dep, TypeDescriptor, SINGLETON};
/// use std::sync::Arc;
///
/// struct Logger { prefix: &'static str }
/// struct Service { logger: Arc<Logger> }
///
/// let mut components = configure();
/// components.bind_instance(Logger { prefix: "app" }, &[]).unwrap();
/// components.bind_component::<Service>(
///     TypeDescriptor::of::<Service>()
///         .tagged(SINGLETON)
///         .inject_constructor(vec![Dep::of::<Logger>()], |deps| {
///             Ok(Service { logger: deps.take::<Logger>()? })
///         })
///         .finish(),
/// ).unwrap();
///
/// let cx = components.build().unwrap();
/// let service = cx.get::<Service>().unwrap();
/// assert_eq!(service.logger.prefix, "app");
/// ```
pub struct ComponentCollection {
    bindings: HashMap<ComponentKey, Arc<dyn ComponentProvider>>,
    scopes: HashMap<Tag, ScopeDecorator>,
}

impl ComponentCollection {
    /// Creates an empty collection with the singleton scope
    /// pre-registered.
    pub fn new() -> Self {
        let mut scopes: HashMap<Tag, ScopeDecorator> = HashMap::new();
        scopes.insert(SINGLETON, singleton_decorator());
        ComponentCollection { bindings: HashMap::new(), scopes }
    }

    /// Binds a fixed instance under its concrete type.
    ///
    /// With no qualifiers the instance is bound under the unqualified
    /// key; otherwise it is bound once per qualifier (and *not* under
    /// the unqualified key). Every tag must be of qualifier kind.
    pub fn bind_instance<T: Send + Sync + 'static>(
        &mut self,
        value: T,
        qualifiers: &[Tag],
    ) -> DiResult<()> {
        self.bind_shared_instance(Arc::new(value), qualifiers)
    }

    pub(crate) fn bind_shared_instance<T: Send + Sync + 'static>(
        &mut self,
        value: Arc<T>,
        qualifiers: &[Tag],
    ) -> DiResult<()> {
        check_qualifier_tags(std::any::type_name::<T>(), qualifiers)?;
        let provider: Arc<dyn ComponentProvider> = Arc::new(InstanceProvider::new(value));
        self.bind_under(key_of::<T>(), provider, qualifiers)
    }

    /// Binds a fixed trait-object instance under the trait.
    pub fn bind_trait_instance<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        value: Arc<T>,
        qualifiers: &[Tag],
    ) -> DiResult<()> {
        check_qualifier_tags(std::any::type_name::<T>(), qualifiers)?;
        // Double-wrapped so the trait object survives type erasure.
        let stored: AnyArc = Arc::new(value);
        let provider: Arc<dyn ComponentProvider> = Arc::new(InstanceProvider::new(stored));
        self.bind_under(key_of_trait::<T>(), provider, qualifiers)
    }

    /// Binds a component using the tags declared on its descriptor.
    pub fn bind_component<T: Send + Sync + 'static>(
        &mut self,
        descriptor: TypeDescriptor,
    ) -> DiResult<()> {
        let tags = descriptor.tags.clone();
        self.bind_component_with::<T>(descriptor, &tags)
    }

    /// Binds a component with explicit tags.
    ///
    /// Tags must be qualifiers or scopes. The effective scope is the
    /// explicit scope tag if given, else the scope tag declared on the
    /// descriptor; more than one candidate in either place is an error.
    /// Qualified bindings share one provider, so a qualified singleton
    /// stays a single instance.
    pub fn bind_component_with<T: Send + Sync + 'static>(
        &mut self,
        descriptor: TypeDescriptor,
        tags: &[Tag],
    ) -> DiResult<()> {
        let provider = self.component_provider(descriptor, tags)?;
        let qualifiers: Vec<Tag> = tags.iter().copied().filter(Tag::is_qualifier).collect();
        self.bind_under(key_of::<T>(), provider, &qualifiers)
    }

    /// Binds a component exported as a trait. `coerce` performs the
    /// explicit unsizing from the concrete type to the trait object.
    pub fn bind_trait_component<T, C>(
        &mut self,
        descriptor: TypeDescriptor,
        coerce: fn(Arc<C>) -> Arc<T>,
        tags: &[Tag],
    ) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        C: Send + Sync + 'static,
    {
        let descriptor = pre_checked(descriptor, tags)?;
        let scope = effective_scope(descriptor.type_name, tags, &descriptor.tags)?;
        let inner = Arc::new(InjectionProvider::new(descriptor)?);
        let exported: Arc<dyn ComponentProvider> =
            Arc::new(TraitExportProvider { inner, coerce });
        let provider = self.apply_scope(exported, scope)?;
        let qualifiers: Vec<Tag> = tags.iter().copied().filter(Tag::is_qualifier).collect();
        self.bind_under(key_of_trait::<T>(), provider, &qualifiers)
    }

    /// Registers a user-defined scope decorator under a scope tag.
    /// Re-registering an existing tag replaces its decorator.
    pub fn register_scope(&mut self, tag: Tag, decorator: ScopeDecorator) -> DiResult<()> {
        if !tag.is_scope() {
            return Err(ComponentError::IllegalTag { target: "scope registration", tag });
        }
        self.scopes.insert(tag, decorator);
        Ok(())
    }

    /// Replays a declarative module against this collection.
    pub fn install(&mut self, module: &dyn BindingModule) -> DiResult<()> {
        module.register(self)
    }

    /// Validates every binding's dependency graph and snapshots the
    /// registry into an immutable, shareable [`Context`].
    ///
    /// Idempotent: the collection is not mutated and may build again;
    /// scope caches live in the shared providers, so singletons survive
    /// across builds.
    pub fn build(&self) -> DiResult<Context> {
        check_bindings(&self.bindings)?;
        Ok(Context::new(self.bindings.clone()))
    }

    fn component_provider(
        &self,
        descriptor: TypeDescriptor,
        tags: &[Tag],
    ) -> DiResult<Arc<dyn ComponentProvider>> {
        let descriptor = pre_checked(descriptor, tags)?;
        let scope = effective_scope(descriptor.type_name, tags, &descriptor.tags)?;
        let injection = Arc::new(InjectionProvider::new(descriptor)?);
        self.apply_scope(injection, scope)
    }

    fn apply_scope(
        &self,
        provider: Arc<dyn ComponentProvider>,
        scope: Option<Tag>,
    ) -> DiResult<Arc<dyn ComponentProvider>> {
        match scope {
            Some(scope) => {
                let decorator = self
                    .scopes
                    .get(&scope)
                    .ok_or(ComponentError::UnknownScope(scope))?;
                Ok(decorator(provider))
            }
            None => Ok(provider),
        }
    }

    fn bind_under(
        &mut self,
        base: ComponentKey,
        provider: Arc<dyn ComponentProvider>,
        qualifiers: &[Tag],
    ) -> DiResult<()> {
        if qualifiers.is_empty() {
            return self.insert(base, provider);
        }
        for qualifier in qualifiers {
            self.insert(base.with_qualifier(Some(*qualifier)), provider.clone())?;
        }
        Ok(())
    }

    fn insert(
        &mut self,
        key: ComponentKey,
        provider: Arc<dyn ComponentProvider>,
    ) -> DiResult<()> {
        if self.bindings.contains_key(&key) {
            return Err(ComponentError::DuplicateBinding(key));
        }
        self.bindings.insert(key, provider);
        Ok(())
    }
}

impl Default for ComponentCollection {
    fn default() -> Self {
        Self::new()
    }
}

/// Rejects plain tags up front; component bindings only understand
/// qualifiers and scopes.
fn pre_checked(descriptor: TypeDescriptor, tags: &[Tag]) -> DiResult<TypeDescriptor> {
    for tag in tags {
        if tag.kind() == TagKind::Plain {
            return Err(ComponentError::IllegalTag { target: descriptor.type_name, tag: *tag });
        }
    }
    Ok(descriptor)
}

/// Effective scope: the explicit scope tag, else the one declared on
/// the descriptor. More than one in the consulted set is ambiguous.
fn effective_scope(
    target: &'static str,
    explicit: &[Tag],
    declared: &[Tag],
) -> DiResult<Option<Tag>> {
    match single_scope(target, explicit)? {
        Some(scope) => Ok(Some(scope)),
        None => single_scope(target, declared),
    }
}

fn single_scope(target: &'static str, tags: &[Tag]) -> DiResult<Option<Tag>> {
    let scopes: Vec<Tag> = tags.iter().copied().filter(Tag::is_scope).collect();
    if scopes.len() > 1 {
        return Err(ComponentError::IllegalTag { target, tag: scopes[1] });
    }
    Ok(scopes.first().copied())
}

/// Wraps an injection provider so its concrete product is stored under
/// a trait key using the double-`Arc` convention.
struct TraitExportProvider<T: ?Sized, C> {
    inner: Arc<InjectionProvider>,
    coerce: fn(Arc<C>) -> Arc<T>,
}

impl<T, C> ComponentProvider for TraitExportProvider<T, C>
where
    T: ?Sized + Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    fn get(&self, cx: &Context) -> DiResult<AnyArc> {
        let concrete = self
            .inner
            .get(cx)?
            .downcast::<C>()
            .map_err(|_| ComponentError::TypeMismatch(std::any::type_name::<C>()))?;
        let as_trait: Arc<T> = (self.coerce)(concrete);
        Ok(Arc::new(as_trait))
    }

    fn dependencies(&self) -> Vec<ComponentRef> {
        self.inner.dependencies()
    }
}

fn check_qualifier_tags(target: &'static str, tags: &[Tag]) -> DiResult<()> {
    for tag in tags {
        if !tag.is_qualifier() {
            return Err(ComponentError::IllegalTag { target, tag: *tag });
        }
    }
    Ok(())
}
