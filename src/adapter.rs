use alloc::{sync::Arc, vec::Vec};
use core::{any::type_name, fmt::Display};
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::{
    any::{Instance, TypeInfo},
    config::{IfAlreadyRegistered, IfUnresolved},
    container::Container,
    errors::{RegisterErrorKind, ResolveErrorKind, SubscribeErrorKind, UnregisterErrorKind},
    key::ServiceKey,
    producer::Producer,
    resolver::{MutableResolver, Resolver},
    subscription::{RegistrationCallback, Subscription},
};

/// [`MutableResolver`] over a [`Container`].
///
/// Registrations are appended with [`IfAlreadyRegistered::AppendNewImplementation`] and misses
/// are resolved with [`IfUnresolved::ReturnDefault`].
///
/// Plain factories are called once, right on registration, and the instance is stored.
/// Memoized producers are stored as is, so they are still built on first resolution.
///
/// Registration callbacks aren't supported.
pub struct ContainerResolver {
    container: Mutex<Option<Arc<Container>>>,
}

impl Default for ContainerResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerResolver {
    /// Creates resolver with a new default container
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_container(Container::new())
    }

    #[inline]
    #[must_use]
    pub fn with_container(container: Container) -> Self {
        Self {
            container: Mutex::new(Some(Arc::new(container))),
        }
    }

    /// The backing container, `None` after disposal.
    #[inline]
    #[must_use]
    pub fn container(&self) -> Option<Arc<Container>> {
        self.container.lock().clone()
    }

    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.container.lock().is_none()
    }

    #[inline]
    fn container_or<E: Display>(&self, disposed: E) -> Result<Arc<Container>, E> {
        match self.container() {
            Some(container) => Ok(container),
            None => {
                error!("{}", disposed);
                Err(disposed)
            }
        }
    }
}

impl Resolver for ContainerResolver {
    fn get_service(&self, service: TypeInfo, contract: Option<&str>) -> Result<Option<Instance>, ResolveErrorKind> {
        self.container_or(ResolveErrorKind::Disposed)?
            .resolve_with(&ServiceKey::new(service, contract), IfUnresolved::ReturnDefault)
    }

    fn get_services(&self, service: TypeInfo, contract: Option<&str>) -> Result<Vec<Instance>, ResolveErrorKind> {
        self.container_or(ResolveErrorKind::Disposed)?
            .resolve_many(&ServiceKey::new(service, contract))
    }

    fn dispose(&self) {
        let Some(container) = self.container.lock().take() else {
            debug!("Already disposed");
            return;
        };
        container.dispose();
    }
}

impl MutableResolver for ContainerResolver {
    fn register(&self, producer: Producer, service: TypeInfo, contract: Option<&str>) -> Result<(), RegisterErrorKind> {
        let container = self.container_or(RegisterErrorKind::Disposed)?;
        let key = ServiceKey::new(service, contract);

        match producer {
            Producer::Factory(_) => {
                let instance = match producer.produce() {
                    Ok(instance) => instance,
                    Err(source) => {
                        let err = RegisterErrorKind::Instantiate { key, source };
                        error!("{}", err);
                        return Err(err);
                    }
                };
                container.use_instance(key, instance, IfAlreadyRegistered::AppendNewImplementation)
            }
            Producer::Instance(_) | Producer::Memoized(_) => container.register(key, producer, IfAlreadyRegistered::AppendNewImplementation),
        }
    }

    fn has_registration(&self, service: TypeInfo, contract: Option<&str>) -> Result<bool, ResolveErrorKind> {
        self.container_or(ResolveErrorKind::Disposed)?
            .is_registered(&ServiceKey::new(service, contract))
    }

    fn unregister_current(&self, service: TypeInfo, contract: Option<&str>) -> Result<(), UnregisterErrorKind> {
        self.container_or(UnregisterErrorKind::Disposed)?
            .unregister(&ServiceKey::new(service, contract))
            .map(|_| ())
    }

    fn unregister_all(&self, service: TypeInfo, contract: Option<&str>) -> Result<(), UnregisterErrorKind> {
        self.container_or(UnregisterErrorKind::Disposed)?
            .unregister_where(&ServiceKey::new(service, contract), |producer| producer.implementation() == service)
            .map(|_| ())
    }

    #[inline]
    fn supports_registration_callbacks(&self) -> bool {
        false
    }

    fn service_registration_callback(
        &self,
        _service: TypeInfo,
        _contract: Option<&str>,
        _callback: RegistrationCallback,
    ) -> Result<Subscription, SubscribeErrorKind> {
        let err = SubscribeErrorKind::Unsupported {
            resolver: type_name::<Self>(),
        };
        error!("{}", err);
        Err(err)
    }
}
