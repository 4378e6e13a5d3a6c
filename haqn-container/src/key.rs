//! Type identification keys.
//!
//! [`TypeName`] identifies a class, interface or alias within the container.
//! Every map the injector keeps is keyed by it.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A type, interface or alias name.
///
/// Keeps the name as written (minus leading separators) for display, and a
/// normalized lower-case form used for equality, ordering and hashing.
///
/// # Examples
/// ```
/// use haqn_container::key::TypeName;
///
/// let key = TypeName::new("\\App\\Mailer");
/// assert_eq!(key.as_str(), "App\\Mailer");
/// assert_eq!(key.normalized(), "app\\mailer");
/// assert_eq!(key, TypeName::new("app\\MAILER"));
/// ```
#[derive(Clone)]
pub struct TypeName {
    name: Arc<str>,
    normalized: Arc<str>,
}

impl TypeName {
    /// Creates a key, stripping leading `\` and `::` separators.
    pub fn new(name: &str) -> Self {
        let name = name.trim_start_matches(['\\', ':']);
        Self {
            normalized: Self::normalize(name).into(),
            name: name.into(),
        }
    }

    /// The normalized form of `name`, as used for map keys.
    ///
    /// ```
    /// use haqn_container::key::TypeName;
    ///
    /// assert_eq!(TypeName::normalize("::Foo::Bar"), "foo::bar");
    /// ```
    pub fn normalize(name: &str) -> String {
        name.trim_start_matches(['\\', ':']).to_lowercase()
    }

    /// Returns the name as written.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Returns the normalized (lower-case) name.
    #[inline]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Returns `true` for an empty name.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl PartialEq for TypeName {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for TypeName {}

impl PartialEq<str> for TypeName {
    fn eq(&self, other: &str) -> bool {
        *self.normalized == *Self::normalize(other)
    }
}

impl PartialEq<&str> for TypeName {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Hash for TypeName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl PartialOrd for TypeName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized.cmp(&other.normalized)
    }
}

// Lookups by normalized string share the hash of the key itself.
impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        &self.normalized
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl From<&String> for TypeName {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeName({})", self.name)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
