use alloc::sync::Arc;
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    any::{Instance, TypeInfo},
    errors::InstantiateErrorKind,
};

pub(crate) type BoxedFactory = Arc<dyn Fn() -> Result<Instance, InstantiateErrorKind> + Send + Sync>;

#[must_use]
fn boxed_factory<T, F>(factory: F) -> BoxedFactory
where
    T: Send + Sync + 'static,
    F: Fn() -> Result<T, InstantiateErrorKind> + Send + Sync + 'static,
{
    Arc::new(move || factory().map(Instance::new))
}

/// What a registration holds and how it yields instances.
#[derive(Clone)]
pub enum Producer {
    /// A value built before registration, returned as is on every resolution.
    Instance(Instance),
    /// A factory called on every resolution.
    Factory(Factory),
    /// A factory called on the first resolution only, its result is shared afterwards.
    Memoized(Memoized),
}

impl Producer {
    #[inline]
    #[must_use]
    pub const fn instance(instance: Instance) -> Self {
        Self::Instance(instance)
    }

    #[inline]
    #[must_use]
    pub fn constant<T: Send + Sync + 'static>(value: T) -> Self {
        Self::Instance(Instance::new(value))
    }

    #[inline]
    #[must_use]
    pub fn factory<T, F>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> Result<T, InstantiateErrorKind> + Send + Sync + 'static,
    {
        Self::Factory(Factory {
            implementation: TypeInfo::of::<T>(),
            factory: boxed_factory(factory),
        })
    }

    #[inline]
    #[must_use]
    pub fn lazy<T, F>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> Result<T, InstantiateErrorKind> + Send + Sync + 'static,
    {
        Self::Memoized(Memoized {
            inner: Arc::new(MemoizedInner {
                implementation: TypeInfo::of::<T>(),
                factory: boxed_factory(factory),
                value: Mutex::new(None),
            }),
        })
    }

    /// Runtime type of the values this producer yields.
    #[inline]
    #[must_use]
    pub fn implementation(&self) -> TypeInfo {
        match self {
            Self::Instance(instance) => instance.type_info(),
            Self::Factory(factory) => factory.implementation,
            Self::Memoized(memoized) => memoized.inner.implementation,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) const fn kind(&self) -> &'static str {
        match self {
            Self::Instance(_) => "instance",
            Self::Factory(_) => "factory",
            Self::Memoized(_) => "memoized",
        }
    }

    /// # Errors
    /// Returns the factory error, if the producer calls one and it fails
    pub fn produce(&self) -> Result<Instance, InstantiateErrorKind> {
        match self {
            Self::Instance(instance) => Ok(instance.clone()),
            Self::Factory(factory) => (factory.factory)(),
            Self::Memoized(memoized) => memoized.get(),
        }
    }
}

#[derive(Clone)]
pub struct Factory {
    implementation: TypeInfo,
    factory: BoxedFactory,
}

#[derive(Clone)]
pub struct Memoized {
    inner: Arc<MemoizedInner>,
}

struct MemoizedInner {
    implementation: TypeInfo,
    factory: BoxedFactory,
    value: Mutex<Option<Instance>>,
}

impl Memoized {
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.value.lock().is_some()
    }

    /// The lock is held while the factory runs, so concurrent first calls wait for
    /// the one running factory and all of them get its instance.
    /// A failed factory leaves the value uninitialized.
    fn get(&self) -> Result<Instance, InstantiateErrorKind> {
        let mut value = self.inner.value.lock();
        if let Some(instance) = value.as_ref() {
            return Ok(instance.clone());
        }

        let instance = (self.inner.factory)()?;
        debug!(implementation = self.inner.implementation.name, "Memoized");

        *value = Some(instance.clone());
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::Producer;
    use crate::{any::TypeInfo, errors::InstantiateErrorKind};

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
        vec::Vec,
    };
    use core::sync::atomic::{AtomicU8, Ordering};
    use std::{sync::Barrier, thread};
    use tracing_test::traced_test;

    struct Service(u8);

    #[test]
    #[traced_test]
    fn test_factory_called_on_every_produce() {
        let calls = Arc::new(AtomicU8::new(0));
        let producer = Producer::factory({
            let calls = calls.clone();
            move || Ok(Service(calls.fetch_add(1, Ordering::SeqCst)))
        });

        assert_eq!(producer.implementation(), TypeInfo::of::<Service>());
        assert_eq!(producer.produce().unwrap().downcast_ref::<Service>().unwrap().0, 0);
        assert_eq!(producer.produce().unwrap().downcast_ref::<Service>().unwrap().0, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    #[traced_test]
    fn test_constant_is_shared() {
        let producer = Producer::constant(Service(7));

        let first = producer.produce().unwrap();
        let second = producer.produce().unwrap();
        assert!(first.ptr_eq(&second));
    }

    #[test]
    #[traced_test]
    fn test_lazy_called_once_concurrently() {
        const THREADS: usize = 8;

        let calls = Arc::new(AtomicU8::new(0));
        let producer = Producer::lazy({
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                thread::yield_now();
                Ok(Service(1))
            }
        });
        let Producer::Memoized(memoized) = &producer else {
            unreachable!();
        };
        assert!(!memoized.is_initialized());

        let barrier = Arc::new(Barrier::new(THREADS));
        let handles = (0..THREADS)
            .map(|_| {
                let producer = producer.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    producer.produce().unwrap()
                })
            })
            .collect::<Vec<_>>();
        let instances = handles.into_iter().map(|handle| handle.join().unwrap()).collect::<Vec<_>>();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(memoized.is_initialized());
        assert!(instances.iter().all(|instance| instance.ptr_eq(&instances[0])));
    }

    #[test]
    #[traced_test]
    fn test_lazy_failure_is_not_cached() {
        let calls = Arc::new(AtomicU8::new(0));
        let producer = Producer::lazy({
            let calls = calls.clone();
            move || {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Err(InstantiateErrorKind::Custom(anyhow::anyhow!("not ready")));
                }
                Ok(Service(2))
            }
        });

        assert!(producer.produce().is_err());
        assert_eq!(producer.produce().unwrap().downcast_ref::<Service>().unwrap().0, 2);
        assert_eq!(producer.produce().unwrap().downcast_ref::<Service>().unwrap().0, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(logs_contain("Memoized"));
    }
}
