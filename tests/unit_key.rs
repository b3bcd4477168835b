/// Unit tests for Key type methods

use ferrous_host::{key_of, HttpRequest, Key};
use std::any::TypeId;
use std::collections::HashSet;

trait Plugin: Send + Sync {}

#[test]
fn test_key_display_name_concrete() {
    let key = key_of::<String>();
    assert_eq!(key.display_name(), "alloc::string::String");
    assert_eq!(key.to_string(), "alloc::string::String");
    assert_eq!(key.type_id(), TypeId::of::<String>());
}

#[test]
fn test_key_display_name_trait_object() {
    let key = key_of::<dyn Plugin>();
    assert!(key.display_name().starts_with("dyn "));
    assert!(key.display_name().ends_with("Plugin"));
}

#[test]
fn test_key_equality_uses_type_id() {
    assert_eq!(Key::of::<dyn Plugin>(), key_of::<dyn Plugin>());
    assert_ne!(key_of::<dyn Plugin>(), key_of::<String>());
    assert_ne!(key_of::<HttpRequest>(), key_of::<String>());
}

#[test]
fn test_key_hash_consistency() {
    let mut set = HashSet::new();
    set.insert(key_of::<String>());
    set.insert(key_of::<String>());
    set.insert(key_of::<dyn Plugin>());
    assert_eq!(set.len(), 2);
    assert!(set.contains(&key_of::<dyn Plugin>()));
}
