//! Build-time graph validation.
//!
//! Every binding is walked (not just ones reachable from some root), so
//! an unused component with a broken dependency is caught before any
//! resolution is served. Validation runs exactly once, at context-build
//! time.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ComponentError, DiResult};
use crate::key::ComponentKey;
use crate::provider::ComponentProvider;

pub(crate) fn check_bindings(
    bindings: &HashMap<ComponentKey, Arc<dyn ComponentProvider>>,
) -> DiResult<()> {
    for key in bindings.keys() {
        let mut visiting = Vec::new();
        check(key, bindings, &mut visiting)?;
    }
    Ok(())
}

fn check(
    component: &ComponentKey,
    bindings: &HashMap<ComponentKey, Arc<dyn ComponentProvider>>,
    visiting: &mut Vec<ComponentKey>,
) -> DiResult<()> {
    let provider = match bindings.get(component) {
        Some(provider) => provider,
        None => return Ok(()), // callers only recurse into bound keys
    };
    for dependency in provider.dependencies() {
        let dep_key = dependency.key();
        if !bindings.contains_key(dep_key) {
            return Err(ComponentError::UnsatisfiedDependency {
                component: component.clone(),
                dependency: dep_key.clone(),
            });
        }
        // A deferred reference resolves after construction, so it may
        // legitimately point back into the current path.
        if dependency.is_deferred() {
            continue;
        }
        if visiting.contains(dep_key) {
            let mut path = visiting.clone();
            path.push(dep_key.clone());
            return Err(ComponentError::CircularDependency {
                path,
                repeated: dep_key.clone(),
            });
        }
        visiting.push(dep_key.clone());
        check(dep_key, bindings, visiting)?;
        visiting.pop();
    }
    Ok(())
}
