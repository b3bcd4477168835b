//! Interface keys for the service registry.

use std::any::TypeId;

/// Key identifying the contract a service satisfies.
///
/// A key is the `TypeId` of the interface type, which is usually a trait
/// object such as `dyn Greeter`, or the concrete type itself when a service
/// is registered under its own name. The type name is carried along for
/// diagnostics only.
///
/// # Examples
///
/// ```rust
/// use ferrous_host::{key_of, Key};
///
/// trait Greeter: Send + Sync {}
///
/// let a = key_of::<dyn Greeter>();
/// let b = Key::of::<dyn Greeter>();
/// assert_eq!(a, b);
/// assert!(a.display_name().contains("Greeter"));
/// assert_ne!(a, key_of::<String>());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Key {
    id: TypeId,
    name: &'static str,
}

impl Key {
    /// Builds the key for an interface type.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Get the type name for display
    ///
    /// Returns the `std::any::type_name` of the interface, for logs and
    /// error messages.
    pub fn display_name(&self) -> &'static str {
        self.name
    }

    /// The `TypeId` backing this key.
    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

// Equality and hashing use the TypeId only; the name is informational.
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Helper for creating interface keys
#[inline(always)]
pub fn key_of<T: ?Sized + 'static>() -> Key {
    Key::of::<T>()
}
