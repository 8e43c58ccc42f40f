//! Ambient "current" resolver.
//!
//! The slot is per thread: a resolver installed on one thread is never seen by another.
//! Prefer passing a resolver explicitly; the ambient one is a convenience for composition roots and tests.

use alloc::sync::Arc;
use core::marker::PhantomData;
use std::{cell::RefCell, thread_local};
use tracing::{debug, error};

use crate::{ext::MutableResolverExt as _, in_memory::InMemoryResolver, resolver::MutableResolver};

thread_local! {
    static CURRENT: RefCell<Option<Arc<dyn MutableResolver>>> = const { RefCell::new(None) };
}

fn default_resolver() -> Arc<dyn MutableResolver> {
    let resolver = InMemoryResolver::new();
    if let Err(err) = resolver.initialize_defaults() {
        error!("{}", err);
    }
    debug!("Default ambient resolver created");
    Arc::new(resolver)
}

/// Current resolver of this thread.
/// If none was set, an [`InMemoryResolver`] with [`MutableResolverExt::initialize_defaults`] applied is created.
///
/// [`MutableResolverExt::initialize_defaults`]: crate::MutableResolverExt::initialize_defaults
#[must_use]
pub fn current() -> Arc<dyn MutableResolver> {
    CURRENT.with(|current| current.borrow_mut().get_or_insert_with(default_resolver).clone())
}

/// Replaces the current resolver of this thread and returns the previous one.
pub fn set_current(resolver: Arc<dyn MutableResolver>) -> Option<Arc<dyn MutableResolver>> {
    CURRENT.with(|current| current.replace(Some(resolver)))
}

/// Makes `resolver` current until the guard is dropped, then restores the previous one.
/// Restoring happens on unwinding too.
///
/// # Warning
/// Guards must be dropped in reverse order of creation, otherwise an outer guard restores
/// a resolver an inner guard has already replaced.
pub fn with_resolver(resolver: Arc<dyn MutableResolver>) -> ResolverGuard {
    let previous = set_current(resolver);
    debug!("Ambient resolver overridden");

    ResolverGuard {
        previous,
        _not_send: PhantomData,
    }
}

/// Restores the previous ambient resolver on drop. Bound to the thread it was created on.
#[must_use = "the previous resolver is restored when the guard is dropped"]
pub struct ResolverGuard {
    previous: Option<Arc<dyn MutableResolver>>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ResolverGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        // The slot can be gone already if the guard lives in another thread local
        let replaced = CURRENT.try_with(|current| current.replace(previous));
        drop(replaced);
        debug!("Ambient resolver restored");
    }
}
