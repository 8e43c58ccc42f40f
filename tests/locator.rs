use locus::{
    locator::{self, with_resolver},
    ContainerResolver, InMemoryResolver, MutableResolver, MutableResolverExt as _, ResolverExt as _,
};
use std::{panic, sync::Arc};
use tracing_test::traced_test;

struct Clock(u64);

fn install_clock(now: u64) -> Arc<dyn MutableResolver> {
    let resolver: Arc<dyn MutableResolver> = Arc::new(ContainerResolver::new());
    resolver.register_constant(Clock(now), None).unwrap();
    resolver
}

fn now() -> Option<u64> {
    locator::current().get::<Clock>(None).unwrap().map(|clock| clock.0)
}

#[test]
#[traced_test]
fn test_nested_overrides_restore_in_order() {
    let original = locator::current();
    assert_eq!(now(), None);

    {
        let _outer = with_resolver(install_clock(1));
        assert_eq!(now(), Some(1));
        {
            let _inner = with_resolver(install_clock(2));
            assert_eq!(now(), Some(2));
        }
        assert_eq!(now(), Some(1));
    }

    assert_eq!(now(), None);
    assert!(Arc::ptr_eq(&locator::current(), &original));
}

#[test]
#[traced_test]
fn test_override_restored_after_panic() {
    let baseline: Arc<dyn MutableResolver> = Arc::new(InMemoryResolver::new());
    let _baseline = with_resolver(baseline.clone());

    let result = panic::catch_unwind(|| {
        let _guard = with_resolver(install_clock(7));
        assert_eq!(now(), Some(7));
        panic!("scope body failed");
    });

    assert!(result.is_err());
    assert!(Arc::ptr_eq(&locator::current(), &baseline));
    assert_eq!(now(), None);
}

#[test]
#[traced_test]
fn test_set_current_returns_previous() {
    let first: Arc<dyn MutableResolver> = Arc::new(InMemoryResolver::new());
    let second = install_clock(3);

    locator::set_current(first.clone());
    let previous = locator::set_current(second).unwrap();

    assert!(Arc::ptr_eq(&previous, &first));
    assert_eq!(now(), Some(3));
}
