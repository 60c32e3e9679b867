//! The immutable, validated resolution context.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ComponentError, DiResult};
use crate::key::{
    key_of, key_of_qualified, key_of_trait, key_of_trait_qualified, ComponentKey, Tag,
};
use crate::provider::{AnyArc, ComponentProvider};
use crate::reference::{ComponentRef, Lazy, LazyHandle};

/// Immutable, thread-safe read view over a validated set of bindings.
///
/// A context is produced by [`ComponentCollection::build`](crate::ComponentCollection::build)
/// after graph validation has proven every binding's dependencies
/// satisfiable and acyclic. It is cheaply cloneable (`Arc` internally)
/// and safe to resolve from concurrently; nothing can be added or
/// removed after build.
///
/// # Examples
///
/// ```rust
/// use wireup::configure;
///
/// struct Config { port: u16 }
///
/// let mut components = configure();
/// components.bind_instance(Config { port: 8080 }, &[]).unwrap();
///
/// let cx = components.build().unwrap();
/// let config = cx.get::<Config>().unwrap();
/// assert_eq!(config.port, 8080);
/// ```
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    bindings: HashMap<ComponentKey, Arc<dyn ComponentProvider>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("bindings", &self.inner.bindings.len())
            .finish()
    }
}

impl Context {
    pub(crate) fn new(bindings: HashMap<ComponentKey, Arc<dyn ComponentProvider>>) -> Self {
        Context { inner: Arc::new(ContextInner { bindings }) }
    }

    /// Whether the given key has a binding.
    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.inner.bindings.contains_key(key)
    }

    /// Runs the bound provider for `key`, or `Ok(None)` if unbound.
    pub(crate) fn instance(&self, key: &ComponentKey) -> DiResult<Option<AnyArc>> {
        match self.inner.bindings.get(key) {
            Some(provider) => provider.get(self).map(Some),
            None => Ok(None),
        }
    }

    /// Resolves a component reference.
    ///
    /// Returns `Ok(None)` iff the reference's key was never bound. A
    /// direct reference runs the full construction protocol; a deferred
    /// reference yields a [`LazyHandle`] without constructing anything.
    /// `Err` only propagates failures from a component's own
    /// construction logic.
    pub fn resolve(&self, reference: &ComponentRef) -> DiResult<Option<AnyArc>> {
        if !self.contains(reference.key()) {
            return Ok(None);
        }
        if reference.is_deferred() {
            let handle = LazyHandle::new(self.clone(), reference.key().clone());
            return Ok(Some(Arc::new(handle)));
        }
        self.instance(reference.key())
    }

    /// Resolves an unqualified concrete type.
    pub fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.get_by_key(key_of::<T>())
    }

    /// Resolves a qualified concrete type.
    pub fn get_qualified<T: Send + Sync + 'static>(&self, qualifier: Tag) -> DiResult<Arc<T>> {
        self.get_by_key(key_of_qualified::<T>(qualifier))
    }

    fn get_by_key<T: Send + Sync + 'static>(&self, key: ComponentKey) -> DiResult<Arc<T>> {
        let any = self
            .instance(&key)?
            .ok_or_else(|| ComponentError::NotFound(key))?;
        any.downcast::<T>()
            .map_err(|_| ComponentError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves an unqualified trait binding.
    pub fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.get_trait_by_key(key_of_trait::<T>())
    }

    /// Resolves a qualified trait binding.
    pub fn get_trait_qualified<T: ?Sized + Send + Sync + 'static>(
        &self,
        qualifier: Tag,
    ) -> DiResult<Arc<T>> {
        self.get_trait_by_key(key_of_trait_qualified::<T>(qualifier))
    }

    fn get_trait_by_key<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: ComponentKey,
    ) -> DiResult<Arc<T>> {
        let any = self
            .instance(&key)?
            .ok_or_else(|| ComponentError::NotFound(key))?;
        // Unwrap the Arc<Arc<dyn Trait>> storage convention.
        let outer = any
            .downcast::<Arc<T>>()
            .map_err(|_| ComponentError::TypeMismatch(std::any::type_name::<T>()))?;
        Ok((*outer).clone())
    }

    /// Obtains a deferred handle to an unqualified concrete type.
    pub fn lazy<T: Send + Sync + 'static>(&self) -> DiResult<Lazy<T>> {
        self.lazy_by_key(key_of::<T>())
    }

    /// Obtains a deferred handle to a qualified concrete type.
    pub fn lazy_qualified<T: Send + Sync + 'static>(&self, qualifier: Tag) -> DiResult<Lazy<T>> {
        self.lazy_by_key(key_of_qualified::<T>(qualifier))
    }

    fn lazy_by_key<T: Send + Sync + 'static>(&self, key: ComponentKey) -> DiResult<Lazy<T>> {
        if !self.contains(&key) {
            return Err(ComponentError::NotFound(key));
        }
        Ok(Lazy::from_handle(LazyHandle::new(self.clone(), key)))
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Context Bindings ===\n");
        let mut keys: Vec<String> = self.inner.bindings.keys().map(|k| k.to_string()).collect();
        keys.sort();
        for key in keys {
            s.push_str(&format!("  {}\n", key));
        }
        s
    }
}
