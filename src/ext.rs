use alloc::{boxed::Box, sync::Arc, vec::Vec};
use core::{any::type_name, ops::ControlFlow};
use tracing::warn;

use crate::{
    any::{Instance, TypeInfo},
    errors::{InstantiateErrorKind, RegisterErrorKind, ResolveErrorKind, SubscribeErrorKind, UnregisterErrorKind},
    key::ServiceKey,
    logging::{DefaultLogManager, LogManager, Logger, TracingLogger},
    producer::Producer,
    resolver::{MutableResolver, Resolver},
    subscription::Subscription,
};

fn downcast<T: Send + Sync + 'static>(instance: Instance) -> Option<Arc<T>> {
    match instance.downcast() {
        Ok(value) => Some(value),
        Err(instance) => {
            warn!(
                expected = type_name::<T>(),
                actual = instance.type_info().name,
                "Instance of another type skipped"
            );
            None
        }
    }
}

/// Typed helpers for any [`Resolver`].
pub trait ResolverExt: Resolver {
    /// Gets the latest registered `T`.
    /// An instance of another runtime type registered under `T` is treated as missing.
    ///
    /// # Errors
    /// See [`Resolver::get_service`]
    #[inline]
    fn get<T: Send + Sync + 'static>(&self, contract: Option<&str>) -> Result<Option<Arc<T>>, ResolveErrorKind> {
        Ok(self.get_service(TypeInfo::of::<T>(), contract)?.and_then(downcast))
    }

    /// Gets every registered `T`, skipping instances of other runtime types.
    ///
    /// # Errors
    /// See [`Resolver::get_services`]
    #[inline]
    fn get_all<T: Send + Sync + 'static>(&self, contract: Option<&str>) -> Result<Vec<Arc<T>>, ResolveErrorKind> {
        Ok(self
            .get_services(TypeInfo::of::<T>(), contract)?
            .into_iter()
            .filter_map(downcast)
            .collect())
    }
}

impl<R: Resolver + ?Sized> ResolverExt for R {}

/// Typed helpers for any [`MutableResolver`].
pub trait MutableResolverExt: MutableResolver {
    /// # Errors
    /// See [`MutableResolver::register`]
    #[inline]
    fn register_factory<T, F>(&self, factory: F, contract: Option<&str>) -> Result<(), RegisterErrorKind>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Result<T, InstantiateErrorKind> + Send + Sync + 'static,
    {
        self.register(Producer::factory(factory), TypeInfo::of::<T>(), contract)
    }

    /// Registers a value returned as is on every resolution.
    ///
    /// # Errors
    /// See [`MutableResolver::register`]
    #[inline]
    fn register_constant<T: Send + Sync + 'static>(&self, value: T, contract: Option<&str>) -> Result<(), RegisterErrorKind> {
        self.register(Producer::constant(value), TypeInfo::of::<T>(), contract)
    }

    /// Registers an instance under a service type which can differ from its own.
    ///
    /// # Errors
    /// See [`MutableResolver::register`]
    #[inline]
    fn register_constant_as(&self, instance: Instance, service: TypeInfo, contract: Option<&str>) -> Result<(), RegisterErrorKind> {
        self.register(Producer::instance(instance), service, contract)
    }

    /// Registers a factory called on first resolution only.
    /// Concurrent first resolutions wait for the one running factory and share its instance.
    ///
    /// # Errors
    /// See [`MutableResolver::register`]
    #[inline]
    fn register_lazy_singleton<T, F>(&self, factory: F, contract: Option<&str>) -> Result<(), RegisterErrorKind>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Result<T, InstantiateErrorKind> + Send + Sync + 'static,
    {
        self.register_lazy_singleton_as(factory, TypeInfo::of::<T>(), contract)
    }

    /// Same as [`Self::register_lazy_singleton`] under a service type which can differ from `T`.
    ///
    /// # Errors
    /// See [`MutableResolver::register`]
    #[inline]
    fn register_lazy_singleton_as<T, F>(&self, factory: F, service: TypeInfo, contract: Option<&str>) -> Result<(), RegisterErrorKind>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Result<T, InstantiateErrorKind> + Send + Sync + 'static,
    {
        self.register(Producer::lazy(factory), service, contract)
    }

    /// # Errors
    /// See [`MutableResolver::has_registration`]
    #[inline]
    fn has_registration_of<T: ?Sized + 'static>(&self, contract: Option<&str>) -> Result<bool, ResolveErrorKind> {
        self.has_registration(TypeInfo::of::<T>(), contract)
    }

    /// # Errors
    /// See [`MutableResolver::unregister_current`]
    #[inline]
    fn unregister_current_of<T: ?Sized + 'static>(&self, contract: Option<&str>) -> Result<(), UnregisterErrorKind> {
        self.unregister_current(TypeInfo::of::<T>(), contract)
    }

    /// # Errors
    /// See [`MutableResolver::unregister_all`]
    #[inline]
    fn unregister_all_of<T: ?Sized + 'static>(&self, contract: Option<&str>) -> Result<(), UnregisterErrorKind> {
        self.unregister_all(TypeInfo::of::<T>(), contract)
    }

    /// # Errors
    /// See [`MutableResolver::service_registration_callback`]
    #[inline]
    fn on_registered<T, F>(&self, contract: Option<&str>, callback: F) -> Result<Subscription, SubscribeErrorKind>
    where
        T: ?Sized + 'static,
        F: FnMut(&ServiceKey) -> ControlFlow<()> + Send + 'static,
    {
        self.service_registration_callback(TypeInfo::of::<T>(), contract, Box::new(callback))
    }

    /// Registers a [`DefaultLogManager`] factory as `Arc<dyn LogManager>`
    /// and a [`TracingLogger`] as `Arc<dyn Logger>`.
    ///
    /// # Errors
    /// See [`MutableResolver::register`]
    fn initialize_defaults(&self) -> Result<(), RegisterErrorKind> {
        self.register_factory(|| Ok(Arc::new(DefaultLogManager::default()) as Arc<dyn LogManager>), None)?;
        self.register_constant(Arc::new(TracingLogger::default()) as Arc<dyn Logger>, None)
    }
}

impl<R: MutableResolver + ?Sized> MutableResolverExt for R {}
