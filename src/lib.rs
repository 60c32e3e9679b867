//! Validated inversion-of-control container with descriptor-driven
//! injection, qualifiers, and pluggable scopes.
//!
//! Components are described by [`TypeDescriptor`]s (constructor,
//! field, and method injection sites, declared explicitly), bound into
//! a [`ComponentCollection`], and served from an immutable [`Context`]
//! once [`ComponentCollection::build`] has validated the whole
//! dependency graph. Missing and circular dependencies are
//! configuration errors reported at build time, never at resolution
//! time.
//!
//! # Quick start
//!
//! ```rust
//! use wireup::{configure, Dep, TypeDescriptor};
//! use std::sync::Arc;
//!
//! struct Config { url: String }
//! struct Client { config: Arc<Config> }
//!
//! fn main() -> wireup::DiResult<()> {
//!     let mut components = configure();
//!     components.bind_instance(Config { url: "http://localhost".into() }, &[])?;
//!     components.bind_component::<Client>(
//!         TypeDescriptor::of::<Client>()
//!             .inject_constructor(vec![Dep::of::<Config>()], |deps| {
//!                 Ok(Client { config: deps.take::<Config>()? })
//!             })
//!             .finish(),
//!     )?;
//!
//!     let cx = components.build()?;
//!     let client = cx.get::<Client>()?;
//!     assert_eq!(client.config.url, "http://localhost");
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `diagnostics` — debug dumps of built contexts
//!   ([`Context::to_debug_string`]).

pub mod collection;
pub mod descriptors;
pub mod error;
pub mod injection;
pub mod key;
pub mod provider;
pub mod reference;
pub mod scope;

mod validation;

pub use collection::{BindingModule, ComponentCollection, Declarations};
pub use descriptors::{
    Dep, DescriptorBuilder, LevelBuilder, MethodDecl, TypeDescriptor, Visibility,
};
pub use error::{ComponentError, DiResult};
pub use injection::{Deps, InjectionProvider};
pub use key::{
    key_of, key_of_qualified, key_of_trait, key_of_trait_qualified, ComponentKey, Tag, TagKind,
    SINGLETON,
};
pub use provider::{AnyArc, ComponentProvider, Context, InstanceProvider};
pub use reference::{ComponentRef, Lazy, LazyHandle};
pub use scope::{ScopeDecorator, SingletonProvider};

/// Starts a fresh [`ComponentCollection`].
pub fn configure() -> ComponentCollection {
    ComponentCollection::new()
}
