//! Component keys and binding tags.

use std::any::TypeId;
use std::fmt;

/// Kind of a binding [`Tag`].
///
/// Tags replace the annotation system of classic containers: a qualifier
/// is just an opaque comparable tag, and a scope is an opaque key into
/// the scope-decorator table. `Plain` tags are recognized as neither and
/// are rejected wherever a qualifier or scope is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// Disambiguates multiple bindings of the same declared type.
    Qualifier,
    /// Selects a registered scope decorator.
    Scope,
    /// A marker with no container meaning.
    Plain,
}

/// Opaque binding marker: a named tag with a declared kind.
///
/// # Examples
///
/// ```rust
/// use wireup::{Tag, TagKind};
///
/// let primary = Tag::qualifier("primary");
/// assert_eq!(primary.kind(), TagKind::Qualifier);
/// assert_eq!(primary.name(), "primary");
///
/// let request = Tag::scope("request");
/// assert_eq!(request.kind(), TagKind::Scope);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    name: &'static str,
    kind: TagKind,
}

/// The built-in singleton scope: cache the first produced instance forever.
pub const SINGLETON: Tag = Tag { name: "singleton", kind: TagKind::Scope };

impl Tag {
    /// Creates a qualifier tag.
    pub const fn qualifier(name: &'static str) -> Self {
        Tag { name, kind: TagKind::Qualifier }
    }

    /// Creates a scope tag.
    pub const fn scope(name: &'static str) -> Self {
        Tag { name, kind: TagKind::Scope }
    }

    /// Creates a plain marker tag with no container meaning.
    pub const fn plain(name: &'static str) -> Self {
        Tag { name, kind: TagKind::Plain }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    pub fn is_qualifier(&self) -> bool {
        self.kind == TagKind::Qualifier
    }

    pub fn is_scope(&self) -> bool {
        self.kind == TagKind::Scope
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)
    }
}

/// Key for binding storage and lookup.
///
/// A key is the identity of a binding: the declared type plus an
/// optional qualifier. Concrete types carry their `TypeId`; trait
/// objects are keyed by trait name because their instances are stored
/// double-wrapped (`Arc<Arc<dyn Trait>>`) and resolved along a separate
/// downcast path.
///
/// # Examples
///
/// ```rust
/// use wireup::{key_of, key_of_qualified, Tag};
///
/// struct Database;
///
/// let plain = key_of::<Database>();
/// let named = key_of_qualified::<Database>(Tag::qualifier("replica"));
/// assert_ne!(plain, named);
/// assert_eq!(named.qualifier(), Some(Tag::qualifier("replica")));
/// ```
#[derive(Debug, Clone)]
pub enum ComponentKey {
    /// Concrete type key with TypeId and name for diagnostics
    Type(TypeId, &'static str),
    /// Concrete type key disambiguated by a qualifier tag
    TypeQualified(TypeId, &'static str, Tag),
    /// Trait binding key
    Trait(&'static str),
    /// Trait binding key disambiguated by a qualifier tag
    TraitQualified(&'static str, Tag),
}

impl ComponentKey {
    /// Get the type or trait name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            ComponentKey::Type(_, name) => name,
            ComponentKey::TypeQualified(_, name, _) => name,
            ComponentKey::Trait(name) => name,
            ComponentKey::TraitQualified(name, _) => name,
        }
    }

    /// Get the qualifier for qualified keys, or None for unqualified keys
    pub fn qualifier(&self) -> Option<Tag> {
        match self {
            ComponentKey::Type(_, _) | ComponentKey::Trait(_) => None,
            ComponentKey::TypeQualified(_, _, q) => Some(*q),
            ComponentKey::TraitQualified(_, q) => Some(*q),
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.qualifier().is_some()
    }

    /// Rebuild this key under the given qualifier (or unqualified for None).
    pub(crate) fn with_qualifier(&self, qualifier: Option<Tag>) -> ComponentKey {
        match self {
            ComponentKey::Type(id, name) | ComponentKey::TypeQualified(id, name, _) => {
                match qualifier {
                    Some(q) => ComponentKey::TypeQualified(*id, name, q),
                    None => ComponentKey::Type(*id, name),
                }
            }
            ComponentKey::Trait(name) | ComponentKey::TraitQualified(name, _) => match qualifier {
                Some(q) => ComponentKey::TraitQualified(name, q),
                None => ComponentKey::Trait(name),
            },
        }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.qualifier() {
            Some(q) => write!(f, "{} {}", q, self.display_name()),
            None => write!(f, "{}", self.display_name()),
        }
    }
}

// Equality by TypeId (+ qualifier) for concrete types; the display
// string is ignored.
impl PartialEq for ComponentKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ComponentKey::Type(a, _), ComponentKey::Type(b, _)) => a == b,
            (ComponentKey::TypeQualified(a, _, qa), ComponentKey::TypeQualified(b, _, qb)) => {
                a == b && qa == qb
            }
            (ComponentKey::Trait(a), ComponentKey::Trait(b)) => a == b,
            (ComponentKey::TraitQualified(a, qa), ComponentKey::TraitQualified(b, qb)) => {
                a == b && qa == qb
            }
            _ => false,
        }
    }
}

impl Eq for ComponentKey {}

impl std::hash::Hash for ComponentKey {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            ComponentKey::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            ComponentKey::TypeQualified(id, _, q) => {
                1u8.hash(state);
                id.hash(state);
                q.hash(state);
            }
            ComponentKey::Trait(name) => {
                2u8.hash(state);
                name.hash(state);
            }
            ComponentKey::TraitQualified(name, q) => {
                3u8.hash(state);
                name.hash(state);
                q.hash(state);
            }
        }
    }
}

/// Key for an unqualified concrete type binding.
#[inline]
pub fn key_of<T: 'static>() -> ComponentKey {
    ComponentKey::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}

/// Key for a qualified concrete type binding.
#[inline]
pub fn key_of_qualified<T: 'static>(qualifier: Tag) -> ComponentKey {
    ComponentKey::TypeQualified(TypeId::of::<T>(), std::any::type_name::<T>(), qualifier)
}

/// Key for an unqualified trait binding.
#[inline]
pub fn key_of_trait<T: ?Sized + 'static>() -> ComponentKey {
    ComponentKey::Trait(std::any::type_name::<T>())
}

/// Key for a qualified trait binding.
#[inline]
pub fn key_of_trait_qualified<T: ?Sized + 'static>(qualifier: Tag) -> ComponentKey {
    ComponentKey::TraitQualified(std::any::type_name::<T>(), qualifier)
}
