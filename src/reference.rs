//! Component references and the deferred-access handle.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{ComponentError, DiResult};
use crate::key::{
    key_of, key_of_qualified, key_of_trait, key_of_trait_qualified, ComponentKey, Tag,
};
use crate::provider::{AnyArc, Context};

/// A resolution request: a component key plus a flag saying whether the
/// caller wants the value directly or behind a deferred-access handle.
///
/// A deferred reference is exempt from cycle checking because its
/// evaluation legitimately happens later, after the cycle has been
/// broken by scope caching or temporal ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentRef {
    key: ComponentKey,
    deferred: bool,
}

impl ComponentRef {
    /// Direct reference to an unqualified concrete type.
    pub fn of<T: 'static>() -> Self {
        ComponentRef { key: key_of::<T>(), deferred: false }
    }

    /// Direct reference to a qualified concrete type.
    pub fn of_qualified<T: 'static>(qualifier: Tag) -> Self {
        ComponentRef { key: key_of_qualified::<T>(qualifier), deferred: false }
    }

    /// Direct reference to an unqualified trait binding.
    pub fn of_trait<T: ?Sized + 'static>() -> Self {
        ComponentRef { key: key_of_trait::<T>(), deferred: false }
    }

    /// Direct reference to a qualified trait binding.
    pub fn of_trait_qualified<T: ?Sized + 'static>(qualifier: Tag) -> Self {
        ComponentRef { key: key_of_trait_qualified::<T>(qualifier), deferred: false }
    }

    /// Deferred reference to an unqualified concrete type.
    pub fn deferred<T: 'static>() -> Self {
        ComponentRef { key: key_of::<T>(), deferred: true }
    }

    /// Deferred reference to a qualified concrete type.
    pub fn deferred_qualified<T: 'static>(qualifier: Tag) -> Self {
        ComponentRef { key: key_of_qualified::<T>(qualifier), deferred: true }
    }

    pub(crate) fn new(key: ComponentKey, deferred: bool) -> Self {
        ComponentRef { key, deferred }
    }

    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred
    }
}

/// Untyped deferred-access handle: a bound key plus the context it will
/// resolve against. This is what [`Context::resolve`] yields for a
/// deferred reference.
#[derive(Clone)]
pub struct LazyHandle {
    cx: Context,
    key: ComponentKey,
}

impl LazyHandle {
    pub(crate) fn new(cx: Context, key: ComponentKey) -> Self {
        LazyHandle { cx, key }
    }

    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    /// Resolves the target now, running its construction protocol.
    pub fn get_any(&self) -> DiResult<AnyArc> {
        self.cx
            .instance(&self.key)?
            .ok_or_else(|| ComponentError::NotFound(self.key.clone()))
    }
}

/// Typed deferred-access handle for cycle-breaking.
///
/// `Lazy<T>` is the container's only special-cased wrapper type: a
/// dependency declared through it is recorded as deferred and skipped by
/// the graph validator's cycle walk. `get` resolves against the context
/// the component was constructed from, so an unscoped target produces a
/// fresh instance per call while a singleton target returns the cached
/// one.
///
/// Call `get` only after construction has completed. Invoking it from
/// inside the construction of a singleton it points back to would wait
/// on that singleton's own initialization.
#[derive(Clone)]
pub struct Lazy<T: ?Sized> {
    handle: LazyHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Lazy<T> {
    pub(crate) fn from_handle(handle: LazyHandle) -> Self {
        Lazy { handle, _marker: PhantomData }
    }

    /// Resolves the target now.
    pub fn get(&self) -> DiResult<Arc<T>> {
        let any = self.handle.get_any()?;
        any.downcast::<T>()
            .map_err(|_| ComponentError::TypeMismatch(std::any::type_name::<T>()))
    }
}
