//! Declarative binding modules.
//!
//! A [`BindingModule`] groups related bindings so subsystems can
//! register themselves as a unit. [`Declarations`] is the value-level
//! form: an ordered list of binding entries recorded up front and
//! replayed against a collection later, any error surfacing at replay
//! time.

use std::sync::Arc;

use crate::collection::ComponentCollection;
use crate::descriptors::TypeDescriptor;
use crate::error::DiResult;
use crate::key::Tag;

/// A reusable group of bindings.
///
/// # Examples
///
/// ```rust
/// use wireup::{BindingModule, ComponentCollection, DiResult};
///
/// struct Clock;
///
/// struct CoreModule;
///
/// impl BindingModule for CoreModule {
///     fn register(&self, components: &mut ComponentCollection) -> DiResult<()> {
///         components.bind_instance(Clock, &[])
///     }
/// }
///
/// let mut components = ComponentCollection::new();
/// components.install(&CoreModule).unwrap();
/// let cx = components.build().unwrap();
/// assert!(cx.get::<Clock>().is_ok());
/// ```
pub trait BindingModule {
    /// Applies this module's bindings to the collection.
    fn register(&self, components: &mut ComponentCollection) -> DiResult<()>;
}

type Entry = Box<dyn Fn(&mut ComponentCollection) -> DiResult<()> + Send + Sync>;

/// An ordered list of recorded bindings, replayed by
/// [`ComponentCollection::install`].
///
/// Entries are recorded without touching a collection; duplicate keys,
/// illegal tags, and the rest are reported when the declarations are
/// installed, in recording order.
#[derive(Default)]
pub struct Declarations {
    entries: Vec<Entry>,
}

impl Declarations {
    pub fn new() -> Self {
        Declarations { entries: Vec::new() }
    }

    /// Records an instance binding. The value is captured now and
    /// shared by every replay.
    pub fn instance<T: Send + Sync + 'static>(&mut self, value: T, qualifiers: &[Tag]) -> &mut Self {
        let value = Arc::new(value);
        let qualifiers = qualifiers.to_vec();
        self.push(move |components| {
            components.bind_shared_instance(value.clone(), &qualifiers)
        })
    }

    /// Records a trait-object instance binding.
    pub fn trait_instance<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        value: Arc<T>,
        qualifiers: &[Tag],
    ) -> &mut Self {
        let qualifiers = qualifiers.to_vec();
        self.push(move |components| {
            components.bind_trait_instance::<T>(value.clone(), &qualifiers)
        })
    }

    /// Records a component binding using the descriptor's own tags.
    pub fn component<T: Send + Sync + 'static>(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        self.push(move |components| components.bind_component::<T>(descriptor.clone()))
    }

    /// Records a component binding with explicit tags.
    pub fn component_with<T: Send + Sync + 'static>(
        &mut self,
        descriptor: TypeDescriptor,
        tags: &[Tag],
    ) -> &mut Self {
        let tags = tags.to_vec();
        self.push(move |components| {
            components.bind_component_with::<T>(descriptor.clone(), &tags)
        })
    }

    /// Records a component binding exported as a trait.
    pub fn trait_component<T, C>(
        &mut self,
        descriptor: TypeDescriptor,
        coerce: fn(Arc<C>) -> Arc<T>,
        tags: &[Tag],
    ) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        C: Send + Sync + 'static,
    {
        let tags = tags.to_vec();
        self.push(move |components| {
            components.bind_trait_component::<T, C>(descriptor.clone(), coerce, &tags)
        })
    }

    fn push<F>(&mut self, entry: F) -> &mut Self
    where
        F: Fn(&mut ComponentCollection) -> DiResult<()> + Send + Sync + 'static,
    {
        self.entries.push(Box::new(entry));
        self
    }
}

impl BindingModule for Declarations {
    fn register(&self, components: &mut ComponentCollection) -> DiResult<()> {
        for entry in &self.entries {
            entry(components)?;
        }
        Ok(())
    }
}
