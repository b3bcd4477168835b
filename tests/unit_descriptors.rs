/// Unit tests for ServiceDescriptor and Lifetime

use ferrous_host::{
    key_of, Construct, HttpRequest, HttpResponse, Lifetime, Service, ServiceCollection,
    ServiceDescriptor,
};
use std::sync::Arc;

#[derive(Default)]
struct Clock;

impl Service for Clock {
    type Params = ();
    fn handle(&self, _: ()) -> anyhow::Result<()> {
        Ok(())
    }
}

struct Audit;

impl Construct for Audit {
    type Deps = (Arc<Clock>, Arc<HttpRequest>);
    fn construct(_: Self::Deps) -> anyhow::Result<Self> {
        Ok(Audit)
    }
}

impl Service for Audit {
    type Params = (Arc<HttpResponse>, Arc<Clock>);
    fn handle(&self, _: Self::Params) -> anyhow::Result<()> {
        Ok(())
    }
}

#[test]
fn test_service_descriptor_type_name() {
    let descriptor = ServiceDescriptor {
        key: key_of::<String>(),
        lifetime: Lifetime::Singleton,
        impl_type_name: "alloc::string::String",
        dependencies: Vec::new(),
        parameters: Vec::new(),
        has_shared_instance: true,
    };

    assert_eq!(descriptor.type_name(), "alloc::string::String");
    assert!(!descriptor.type_name().is_empty());
}

#[test]
fn test_descriptor_records_dependencies_and_parameters() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton::<Clock, Clock>().add_transient::<Audit, Audit>();

    let descriptors = sc.descriptors();
    let clock = &descriptors[0];
    assert!(clock.has_shared_instance);
    assert!(clock.dependencies.is_empty());
    assert!(clock.parameters.is_empty());

    let audit = &descriptors[1];
    assert_eq!(audit.lifetime, Lifetime::Transient);
    assert!(!audit.has_shared_instance);
    assert_eq!(audit.dependencies, vec![key_of::<Clock>(), key_of::<HttpRequest>()]);
    assert_eq!(audit.parameters, vec![key_of::<HttpResponse>(), key_of::<Clock>()]);
}

#[test]
fn test_lifetime_display() {
    assert_eq!(Lifetime::Singleton.to_string(), "singleton");
    assert_eq!(Lifetime::Scoped.to_string(), "scoped");
    assert_eq!(Lifetime::Transient.to_string(), "transient");
    assert_ne!(Lifetime::Scoped, Lifetime::Transient);
}

#[test]
fn test_provider_descriptors_match_collection() {
    let mut sc = ServiceCollection::new();
    sc.add_scoped::<Audit, Audit>().add_singleton::<Clock, Clock>();
    let before = sc.descriptors();

    let sp = sc.build();
    let after = sp.descriptors();
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.key, a.key);
        assert_eq!(b.lifetime, a.lifetime);
        assert_eq!(b.impl_type_name, a.impl_type_name);
    }
    assert_eq!(sp.len(), 2);
    assert!(!sp.is_empty());
}

#[cfg(feature = "diagnostics")]
#[test]
fn test_debug_string_lists_registrations_in_order() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton::<Clock, Clock>().add_scoped::<Audit, Audit>();
    let dump = sc.build().to_debug_string();

    let clock = dump.find("#0 ").unwrap();
    let audit = dump.find("#1 ").unwrap();
    assert!(clock < audit);
    assert!(dump.contains("(singleton)"));
    assert!(dump.contains("(scoped)"));
    assert!(dump.contains("HttpRequest"));
}
