//! Scope decoration: wrapping a provider to change its lifecycle.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::DiResult;
use crate::provider::{AnyArc, ComponentProvider, Context};
use crate::reference::ComponentRef;

/// A scope decorator wraps a provider to control how often the wrapped
/// construction protocol actually runs. Decoration never changes what
/// the provider depends on, so graph validation sees through it.
pub type ScopeDecorator =
    Arc<dyn Fn(Arc<dyn ComponentProvider>) -> Arc<dyn ComponentProvider> + Send + Sync>;

/// The built-in singleton decorator: run the wrapped provider once,
/// cache the result forever.
///
/// The cache cell serializes racing first resolutions, so the wrapped
/// protocol executes at most once even under concurrent first use;
/// every later read is lock-free. The cache lives in the provider, not
/// the context, so a collection built twice still yields one instance.
pub struct SingletonProvider {
    inner: Arc<dyn ComponentProvider>,
    cell: OnceCell<AnyArc>,
}

impl SingletonProvider {
    pub fn new(inner: Arc<dyn ComponentProvider>) -> Self {
        SingletonProvider { inner, cell: OnceCell::new() }
    }
}

impl ComponentProvider for SingletonProvider {
    fn get(&self, cx: &Context) -> DiResult<AnyArc> {
        self.cell
            .get_or_try_init(|| self.inner.get(cx))
            .map(|instance| instance.clone())
    }

    fn dependencies(&self) -> Vec<ComponentRef> {
        self.inner.dependencies()
    }
}

pub(crate) fn singleton_decorator() -> ScopeDecorator {
    Arc::new(|provider| Arc::new(SingletonProvider::new(provider)))
}
