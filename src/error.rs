//! Error types for the component container.

use std::fmt;

use crate::key::{ComponentKey, Tag};

/// Container errors
///
/// Every variant is a configuration-time or validation-time fault except
/// [`NotFound`](ComponentError::NotFound) and
/// [`TypeMismatch`](ComponentError::TypeMismatch), which can surface
/// from ad-hoc typed lookups and descriptor closures at resolve time.
/// Binding-shape errors are raised by the offending `bind_*` call; graph
/// errors are raised exhaustively by [`build`](crate::ComponentCollection::build);
/// nothing is deferred to resolution.
#[derive(Debug, Clone)]
pub enum ComponentError {
    /// A tag used in a binding is neither a recognized qualifier nor a
    /// recognized scope, or more than one scope tag was given.
    IllegalTag { target: &'static str, tag: Tag },
    /// A component key was bound twice.
    DuplicateBinding(ComponentKey),
    /// A scope tag has no registered decorator.
    UnknownScope(Tag),
    /// The descriptor describes a non-instantiable type.
    AbstractComponent(&'static str),
    /// No inject-marked constructor and no default constructor.
    NoDefaultConstructor(&'static str),
    /// More than one inject-marked constructor.
    AmbiguousConstructor(&'static str),
    /// Inject-marked fields that are read-only and cannot be assigned,
    /// as `Level::field` paths.
    FinalInjectField { component: &'static str, fields: Vec<String> },
    /// Inject-marked methods with their own type parameters, as
    /// `Level::method` paths.
    GenericInjectMethod { component: &'static str, methods: Vec<String> },
    /// More than one qualifier tag on a single injection element.
    AmbiguousQualifier { component: &'static str, element: &'static str },
    /// Graph validation found a reference to an unbound key.
    UnsatisfiedDependency { component: ComponentKey, dependency: ComponentKey },
    /// Graph validation found a non-deferred reference cycle; `path` is
    /// the visiting stack with the repeating key appended.
    CircularDependency { path: Vec<ComponentKey>, repeated: ComponentKey },
    /// Typed lookup of a key that was never bound.
    NotFound(ComponentKey),
    /// A descriptor closure received a value of an unexpected type.
    TypeMismatch(&'static str),
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentError::IllegalTag { target, tag } => {
                write!(f, "Illegal tag {} on {}", tag, target)
            }
            ComponentError::DuplicateBinding(key) => {
                write!(f, "Duplicate binding: {}", key)
            }
            ComponentError::UnknownScope(tag) => {
                write!(f, "Unknown scope: {}", tag)
            }
            ComponentError::AbstractComponent(name) => {
                write!(f, "Component can not be abstract: {}", name)
            }
            ComponentError::NoDefaultConstructor(name) => {
                write!(f, "No default constructor: {}", name)
            }
            ComponentError::AmbiguousConstructor(name) => {
                write!(f, "Ambiguous injectable constructors: {}", name)
            }
            ComponentError::FinalInjectField { component, fields } => {
                write!(f, "Injectable field can not be read-only: {} in {}", fields.join(", "), component)
            }
            ComponentError::GenericInjectMethod { component, methods } => {
                write!(f, "Injectable method can not have type parameters: {} in {}", methods.join(", "), component)
            }
            ComponentError::AmbiguousQualifier { component, element } => {
                write!(f, "Ambiguous qualifiers on {} of {}", element, component)
            }
            ComponentError::UnsatisfiedDependency { component, dependency } => {
                write!(f, "Unsatisfied dependency: {} required by {}", dependency, component)
            }
            ComponentError::CircularDependency { path, repeated } => {
                let rendered: Vec<String> = path.iter().map(|k| k.to_string()).collect();
                write!(f, "Circular dependency closing at {}: {}", repeated, rendered.join(" -> "))
            }
            ComponentError::NotFound(key) => {
                write!(f, "Component not found: {}", key)
            }
            ComponentError::TypeMismatch(name) => {
                write!(f, "Type mismatch for: {}", name)
            }
        }
    }
}

impl std::error::Error for ComponentError {}

/// Result type for container operations
pub type DiResult<T> = Result<T, ComponentError>;
