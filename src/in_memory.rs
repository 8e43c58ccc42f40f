use alloc::vec::Vec;
use parking_lot::RwLock;
use tracing::{debug, error, info_span};

use crate::{
    any::{Instance, TypeInfo},
    container::produce,
    errors::{RegisterErrorKind, ResolveErrorKind, SubscribeErrorKind, UnregisterErrorKind},
    key::ServiceKey,
    producer::Producer,
    registry::Registry,
    resolver::{MutableResolver, Resolver},
    subscription::{Callbacks, RegistrationCallback, Subscription},
};

#[derive(Default)]
struct State {
    registry: Registry,
    callbacks: Callbacks,
}

/// [`MutableResolver`] keeping producers in memory.
///
/// Unlike [`crate::ContainerResolver`], factories are called on every resolution and
/// registration callbacks are supported. A new subscriber is called once for each producer
/// already registered under its key, then once for each new one.
/// Callbacks and producers run outside of the internal lock.
pub struct InMemoryResolver {
    state: RwLock<Option<State>>,
}

impl Default for InMemoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryResolver {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(Some(State::default())),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state.read().is_none()
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> Result<T, ResolveErrorKind> {
        match self.state.read().as_ref() {
            Some(state) => Ok(f(state)),
            None => {
                let err = ResolveErrorKind::Disposed;
                error!("{}", err);
                Err(err)
            }
        }
    }

    fn write<T>(&self, f: impl FnOnce(&mut State) -> T) -> Result<T, UnregisterErrorKind> {
        match self.state.write().as_mut() {
            Some(state) => Ok(f(state)),
            None => {
                let err = UnregisterErrorKind::Disposed;
                error!("{}", err);
                Err(err)
            }
        }
    }
}

impl Resolver for InMemoryResolver {
    fn get_service(&self, service: TypeInfo, contract: Option<&str>) -> Result<Option<Instance>, ResolveErrorKind> {
        let key = ServiceKey::new(service, contract);
        let span = info_span!("get_service", service = service.name, contract = key.contract());
        let _guard = span.enter();

        match self.read(|state| state.registry.last(&key))? {
            Some(producer) => produce(&key, &producer).map(Some),
            None => {
                debug!("Not found");
                Ok(None)
            }
        }
    }

    fn get_services(&self, service: TypeInfo, contract: Option<&str>) -> Result<Vec<Instance>, ResolveErrorKind> {
        let key = ServiceKey::new(service, contract);
        let span = info_span!("get_services", service = service.name, contract = key.contract());
        let _guard = span.enter();

        let producers = self.read(|state| state.registry.all(&key))?;
        debug!(count = producers.len(), "Found");

        producers.iter().map(|producer| produce(&key, producer)).collect()
    }

    fn dispose(&self) {
        let Some(mut state) = self.state.write().take() else {
            debug!("Already disposed");
            return;
        };

        let released = state.registry.clear();
        let callbacks = state.callbacks.clear();
        debug!(released, callbacks, "Resolver disposed");
    }
}

impl MutableResolver for InMemoryResolver {
    fn register(&self, producer: Producer, service: TypeInfo, contract: Option<&str>) -> Result<(), RegisterErrorKind> {
        let key = ServiceKey::new(service, contract);
        let span = info_span!("register", service = service.name, contract = key.contract(), kind = producer.kind());
        let _guard = span.enter();

        let callbacks = {
            let mut guard = self.state.write();
            let Some(state) = guard.as_mut() else {
                let err = RegisterErrorKind::Disposed;
                error!("{}", err);
                return Err(err);
            };

            state.registry.append(key.clone(), producer);
            state.callbacks.active(&key)
        };
        debug!(callbacks = callbacks.len(), "Registered");

        for callback in callbacks {
            callback.notify(&key);
        }
        Ok(())
    }

    fn has_registration(&self, service: TypeInfo, contract: Option<&str>) -> Result<bool, ResolveErrorKind> {
        let key = ServiceKey::new(service, contract);
        self.read(|state| state.registry.contains(&key))
    }

    fn unregister_current(&self, service: TypeInfo, contract: Option<&str>) -> Result<(), UnregisterErrorKind> {
        let key = ServiceKey::new(service, contract);
        let removed = self.write(|state| state.registry.remove(&key))?;
        debug!(service = service.name, contract = key.contract(), removed, "Unregistered");
        Ok(())
    }

    fn unregister_all(&self, service: TypeInfo, contract: Option<&str>) -> Result<(), UnregisterErrorKind> {
        let key = ServiceKey::new(service, contract);
        let removed = self.write(|state| state.registry.remove_where(&key, |producer| producer.implementation() == service))?;
        debug!(service = service.name, contract = key.contract(), removed, "Unregistered by implementation");
        Ok(())
    }

    #[inline]
    fn supports_registration_callbacks(&self) -> bool {
        true
    }

    fn service_registration_callback(
        &self,
        service: TypeInfo,
        contract: Option<&str>,
        callback: RegistrationCallback,
    ) -> Result<Subscription, SubscribeErrorKind> {
        let key = ServiceKey::new(service, contract);

        let (subscription, entry, registered) = {
            let mut guard = self.state.write();
            let Some(state) = guard.as_mut() else {
                let err = SubscribeErrorKind::Disposed;
                error!("{}", err);
                return Err(err);
            };

            let registered = state.registry.all(&key).len();
            let (subscription, entry) = state.callbacks.subscribe(key.clone(), callback);
            debug!(subscribers = state.callbacks.len(), "Callback added");
            (subscription, entry, registered)
        };
        debug!(service = service.name, contract = key.contract(), registered, "Subscribed");

        for _ in 0..registered {
            entry.notify(&key);
        }
        Ok(subscription)
    }
}
