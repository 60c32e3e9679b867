//! Component providers: the polymorphic unit of construction.
//!
//! A provider owns a construction function and declares which other
//! component keys it needs. The declared dependencies feed the graph
//! validator only; `get` re-resolves them independently through the
//! context it is handed.

use std::any::Any;
use std::sync::Arc;

use crate::error::DiResult;
use crate::reference::ComponentRef;

pub mod context;
pub use context::Context;

/// Type-erased instance storage. Trait-object instances are stored
/// double-wrapped as `Arc<Arc<dyn Trait>>` inside the `Any`.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// A unit of construction: given a resolution context, produces an
/// instance and declares the component references it depends on.
///
/// Providers are immutable once built. A provider may wrap another
/// provider (scope decoration); wrapping changes how often the inner
/// construction protocol runs, never what it depends on.
pub trait ComponentProvider: Send + Sync {
    /// Produces an instance, resolving dependencies through `cx`.
    fn get(&self, cx: &Context) -> DiResult<AnyArc>;

    /// The component references this provider needs. Used only by the
    /// graph validator.
    fn dependencies(&self) -> Vec<ComponentRef> {
        Vec::new()
    }
}

/// Trivial provider that always returns a captured instance.
pub struct InstanceProvider {
    instance: AnyArc,
}

impl InstanceProvider {
    pub fn new(instance: AnyArc) -> Self {
        InstanceProvider { instance }
    }
}

impl ComponentProvider for InstanceProvider {
    fn get(&self, _cx: &Context) -> DiResult<AnyArc> {
        Ok(self.instance.clone())
    }
}
