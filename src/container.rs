use alloc::vec::Vec;
use parking_lot::RwLock;
use tracing::{debug, error, info_span};

use crate::{
    any::Instance,
    config::{Config, IfAlreadyRegistered, IfUnresolved},
    errors::{RegisterErrorKind, ResolveErrorKind, UnregisterErrorKind},
    key::ServiceKey,
    producer::Producer,
    registry::Registry,
};

/// Backing store of producers with its own registration and resolution policies.
///
/// It's the engine behind [`crate::ContainerResolver`], but can be used directly too.
/// Producers are called outside of the internal lock, so they can use the container themselves.
pub struct Container {
    registry: RwLock<Option<Registry>>,
    config: Config,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_config(Config::default())
    }

    #[inline]
    #[must_use]
    pub fn new_with_config(config: Config) -> Self {
        Self {
            registry: RwLock::new(Some(Registry::new())),
            config,
        }
    }

    /// Resolves the latest producer of the key using [`Config::if_unresolved`] on miss.
    ///
    /// # Errors
    /// See [`Self::resolve_with`]
    #[inline]
    pub fn resolve(&self, key: &ServiceKey) -> Result<Option<Instance>, ResolveErrorKind> {
        self.resolve_with(key, self.config.if_unresolved)
    }

    /// Resolves the latest producer of the key.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::Unresolved`] if the key has no producers and `if_unresolved` is [`IfUnresolved::Throw`]
    /// - Returns [`ResolveErrorKind::Instantiate`] if the producer fails
    /// - Returns [`ResolveErrorKind::Disposed`] if the container is disposed
    pub fn resolve_with(&self, key: &ServiceKey, if_unresolved: IfUnresolved) -> Result<Option<Instance>, ResolveErrorKind> {
        let span = info_span!("resolve", service = key.service.name, contract = key.contract());
        let _guard = span.enter();

        let Some(producer) = self.read(|registry| registry.last(key))? else {
            return match if_unresolved {
                IfUnresolved::ReturnDefault => {
                    debug!("Not found");
                    Ok(None)
                }
                IfUnresolved::Throw => {
                    let err = ResolveErrorKind::Unresolved { key: key.clone() };
                    error!("{}", err);
                    Err(err)
                }
            };
        };

        produce(key, &producer).map(Some)
    }

    /// Resolves every producer of the key in registration order.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::Instantiate`] if any producer fails
    /// - Returns [`ResolveErrorKind::Disposed`] if the container is disposed
    pub fn resolve_many(&self, key: &ServiceKey) -> Result<Vec<Instance>, ResolveErrorKind> {
        let span = info_span!("resolve_many", service = key.service.name, contract = key.contract());
        let _guard = span.enter();

        let producers = self.read(|registry| registry.all(key))?;
        debug!(count = producers.len(), "Found");

        producers.iter().map(|producer| produce(key, producer)).collect()
    }

    /// # Errors
    /// Returns [`ResolveErrorKind::Disposed`] if the container is disposed
    #[inline]
    pub fn is_registered(&self, key: &ServiceKey) -> Result<bool, ResolveErrorKind> {
        self.read(|registry| registry.contains(key))
    }

    /// Registers the producer using [`Config::if_already_registered`].
    ///
    /// # Errors
    /// See [`Self::register`]
    #[inline]
    pub fn add(&self, key: ServiceKey, producer: Producer) -> Result<(), RegisterErrorKind> {
        self.register(key, producer, self.config.if_already_registered)
    }

    /// # Errors
    /// - Returns [`RegisterErrorKind::AlreadyRegistered`] if the key has producers and `if_already_registered` is [`IfAlreadyRegistered::Throw`]
    /// - Returns [`RegisterErrorKind::Disposed`] if the container is disposed
    pub fn register(&self, key: ServiceKey, producer: Producer, if_already_registered: IfAlreadyRegistered) -> Result<(), RegisterErrorKind> {
        let span = info_span!("register", service = key.service.name, contract = key.contract(), kind = producer.kind());
        let _guard = span.enter();

        let mut guard = self.registry.write();
        let Some(registry) = guard.as_mut() else {
            let err = RegisterErrorKind::Disposed;
            error!("{}", err);
            return Err(err);
        };

        match if_already_registered {
            IfAlreadyRegistered::AppendNewImplementation => {
                registry.append(key, producer);
                debug!("Appended");
            }
            IfAlreadyRegistered::Replace => {
                let replaced = registry.replace(key, producer);
                debug!(replaced, "Replaced");
            }
            IfAlreadyRegistered::Keep if registry.contains(&key) => {
                debug!("Already registered, kept");
            }
            IfAlreadyRegistered::Throw if registry.contains(&key) => {
                let err = RegisterErrorKind::AlreadyRegistered { key };
                error!("{}", err);
                return Err(err);
            }
            IfAlreadyRegistered::Keep | IfAlreadyRegistered::Throw => {
                registry.append(key, producer);
                debug!("Registered");
            }
        }
        Ok(())
    }

    /// Registers an already built instance.
    ///
    /// # Errors
    /// See [`Self::register`]
    #[inline]
    pub fn use_instance(&self, key: ServiceKey, instance: Instance, if_already_registered: IfAlreadyRegistered) -> Result<(), RegisterErrorKind> {
        self.register(key, Producer::instance(instance), if_already_registered)
    }

    /// Removes every producer of the key and returns how many were removed.
    ///
    /// # Errors
    /// Returns [`UnregisterErrorKind::Disposed`] if the container is disposed
    pub fn unregister(&self, key: &ServiceKey) -> Result<usize, UnregisterErrorKind> {
        let removed = self.write(|registry| registry.remove(key))?;
        debug!(service = key.service.name, contract = key.contract(), removed, "Unregistered");
        Ok(removed)
    }

    /// Removes producers of the key matching `condition` and returns how many were removed.
    ///
    /// # Errors
    /// Returns [`UnregisterErrorKind::Disposed`] if the container is disposed
    pub fn unregister_where(&self, key: &ServiceKey, condition: impl FnMut(&Producer) -> bool) -> Result<usize, UnregisterErrorKind> {
        let removed = self.write(|registry| registry.remove_where(key, condition))?;
        debug!(service = key.service.name, contract = key.contract(), removed, "Unregistered by condition");
        Ok(removed)
    }

    /// Count of producers, `0` after disposal.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.read().as_ref().map_or(0, Registry::len)
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.registry.read().is_none()
    }

    /// Drops every producer. Later calls do nothing, other methods fail with a `Disposed` error.
    pub fn dispose(&self) {
        if let Some(mut registry) = self.registry.write().take() {
            let released = registry.clear();
            debug!(released, "Container disposed");
        }
    }
}

impl Container {
    #[inline]
    fn read<T>(&self, f: impl FnOnce(&Registry) -> T) -> Result<T, ResolveErrorKind> {
        match self.registry.read().as_ref() {
            Some(registry) => Ok(f(registry)),
            None => {
                let err = ResolveErrorKind::Disposed;
                error!("{}", err);
                Err(err)
            }
        }
    }

    #[inline]
    fn write<T>(&self, f: impl FnOnce(&mut Registry) -> T) -> Result<T, UnregisterErrorKind> {
        match self.registry.write().as_mut() {
            Some(registry) => Ok(f(registry)),
            None => {
                let err = UnregisterErrorKind::Disposed;
                error!("{}", err);
                Err(err)
            }
        }
    }
}

pub(crate) fn produce(key: &ServiceKey, producer: &Producer) -> Result<Instance, ResolveErrorKind> {
    match producer.produce() {
        Ok(instance) => {
            debug!(implementation = instance.type_info().name, "Resolved");
            Ok(instance)
        }
        Err(source) => {
            let err = ResolveErrorKind::Instantiate { key: key.clone(), source };
            error!("{}", err);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Container;
    use crate::{
        any::{Instance, TypeInfo},
        config::{Config, IfAlreadyRegistered, IfUnresolved},
        errors::{InstantiateErrorKind, RegisterErrorKind, ResolveErrorKind, UnregisterErrorKind},
        key::ServiceKey,
        producer::Producer,
    };

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
        vec::Vec,
    };
    use core::sync::atomic::{AtomicU8, Ordering};
    use tracing_test::traced_test;

    fn values(instances: &[Instance]) -> Vec<u8> {
        instances.iter().map(|instance| *instance.downcast_ref::<u8>().unwrap()).collect()
    }

    #[test]
    #[traced_test]
    fn test_resolve_policies() {
        let key = ServiceKey::of::<u8>(None);
        let container = Container::new();

        assert!(matches!(container.resolve(&key), Err(ResolveErrorKind::Unresolved { .. })));
        assert!(container.resolve_with(&key, IfUnresolved::ReturnDefault).unwrap().is_none());
        assert!(container.resolve_many(&key).unwrap().is_empty());
        assert!(logs_contain("No registration for u8"));

        let container = Container::new_with_config(Config {
            if_unresolved: IfUnresolved::ReturnDefault,
            ..Config::default()
        });
        assert!(container.resolve(&key).unwrap().is_none());
    }

    #[test]
    #[traced_test]
    fn test_append_resolves_latest() {
        let key = ServiceKey::of::<u8>(None);
        let container = Container::new();
        container.add(key.clone(), Producer::constant(1u8)).unwrap();
        container
            .use_instance(key.clone(), Instance::new(2u8), IfAlreadyRegistered::AppendNewImplementation)
            .unwrap();

        assert_eq!(*container.resolve(&key).unwrap().unwrap().downcast_ref::<u8>().unwrap(), 2);
        assert_eq!(values(&container.resolve_many(&key).unwrap()), [1, 2]);
        assert_eq!(container.len(), 2);
    }

    #[test]
    #[traced_test]
    fn test_register_policies() {
        let key = ServiceKey::of::<u8>(Some("policy"));
        let container = Container::new();
        container.add(key.clone(), Producer::constant(1u8)).unwrap();
        container.add(key.clone(), Producer::constant(2u8)).unwrap();

        container.register(key.clone(), Producer::constant(3u8), IfAlreadyRegistered::Keep).unwrap();
        assert_eq!(values(&container.resolve_many(&key).unwrap()), [1, 2]);

        container.register(key.clone(), Producer::constant(4u8), IfAlreadyRegistered::Replace).unwrap();
        assert_eq!(values(&container.resolve_many(&key).unwrap()), [4]);

        let err = container.register(key.clone(), Producer::constant(5u8), IfAlreadyRegistered::Throw).unwrap_err();
        assert!(matches!(err, RegisterErrorKind::AlreadyRegistered { key: err_key } if err_key == key));

        let other = ServiceKey::of::<u8>(None);
        container.register(other.clone(), Producer::constant(6u8), IfAlreadyRegistered::Throw).unwrap();
        container.register(ServiceKey::of::<u16>(None), Producer::constant(7u16), IfAlreadyRegistered::Keep).unwrap();
        assert!(container.is_registered(&other).unwrap());
        assert!(container.is_registered(&ServiceKey::of::<u16>(None)).unwrap());
    }

    #[test]
    #[traced_test]
    fn test_factory_failure() {
        let key = ServiceKey::of::<u8>(None);
        let container = Container::new();
        container
            .add(
                key.clone(),
                Producer::factory(|| Err::<u8, _>(InstantiateErrorKind::Custom(anyhow::anyhow!("broken")))),
            )
            .unwrap();

        assert!(matches!(container.resolve(&key), Err(ResolveErrorKind::Instantiate { .. })));
        assert!(matches!(container.resolve_many(&key), Err(ResolveErrorKind::Instantiate { .. })));
        assert!(logs_contain("broken"));
    }

    #[test]
    #[traced_test]
    fn test_unregister_where() {
        let key = ServiceKey::of::<u8>(None);
        let container = Container::new();
        container.add(key.clone(), Producer::constant(1u8)).unwrap();
        container.add(key.clone(), Producer::constant(1u16)).unwrap();
        container.add(key.clone(), Producer::constant(2u8)).unwrap();

        let removed = container
            .unregister_where(&key, |producer| producer.implementation() == TypeInfo::of::<u8>())
            .unwrap();
        assert_eq!(removed, 2);
        assert!(container.resolve(&key).unwrap().unwrap().is::<u16>());

        assert_eq!(container.unregister(&key).unwrap(), 1);
        assert!(!container.is_registered(&key).unwrap());
        assert!(container.is_empty());
    }

    #[test]
    #[traced_test]
    fn test_producer_uses_container() {
        let container = Arc::new(Container::new());
        let calls = Arc::new(AtomicU8::new(0));
        container.add(ServiceKey::of::<u8>(None), Producer::constant(3u8)).unwrap();
        container
            .add(
                ServiceKey::of::<u16>(None),
                Producer::factory({
                    let container = Arc::downgrade(&container);
                    let calls = calls.clone();
                    move || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        let container = container.upgrade().unwrap();
                        let value = container.resolve(&ServiceKey::of::<u8>(None)).unwrap().unwrap();
                        Ok(u16::from(*value.downcast_ref::<u8>().unwrap()) * 2)
                    }
                }),
            )
            .unwrap();

        assert_eq!(*container.resolve(&ServiceKey::of::<u16>(None)).unwrap().unwrap().downcast_ref::<u16>().unwrap(), 6);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn test_dispose_twice() {
        let key = ServiceKey::of::<u8>(None);
        let container = Container::new();
        container.add(key.clone(), Producer::constant(1u8)).unwrap();

        container.dispose();
        container.dispose();

        assert!(container.is_disposed());
        assert_eq!(container.len(), 0);
        assert!(matches!(container.resolve(&key), Err(ResolveErrorKind::Disposed)));
        assert!(matches!(container.add(key.clone(), Producer::constant(1u8)), Err(RegisterErrorKind::Disposed)));
        assert!(matches!(container.unregister(&key), Err(UnregisterErrorKind::Disposed)));
        assert!(logs_contain("Container disposed"));
    }

    #[test]
    #[traced_test]
    fn test_unregister_after_dispose_logged() {
        let key = ServiceKey::of::<u8>(None);
        let container = Container::new();
        container.dispose();

        assert!(matches!(container.unregister_where(&key, |_| true), Err(UnregisterErrorKind::Disposed)));
        assert!(logs_contain("Resolver is disposed"));
    }
}
