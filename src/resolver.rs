use alloc::vec::Vec;

use crate::{
    any::{Instance, TypeInfo},
    errors::{RegisterErrorKind, ResolveErrorKind, SubscribeErrorKind, UnregisterErrorKind},
    producer::Producer,
    subscription::{RegistrationCallback, Subscription},
};

/// Read side of a service locator.
///
/// An empty contract is the same as no contract. A missing registration isn't an error:
/// [`Self::get_service`] returns `None` and [`Self::get_services`] returns an empty list.
pub trait Resolver: Send + Sync {
    /// Gets the latest registered instance of the service.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::Instantiate`] if the producer fails
    /// - Returns [`ResolveErrorKind::Disposed`] if the resolver is disposed
    fn get_service(&self, service: TypeInfo, contract: Option<&str>) -> Result<Option<Instance>, ResolveErrorKind>;

    /// Gets every registered instance of the service in registration order.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::Instantiate`] if any producer fails
    /// - Returns [`ResolveErrorKind::Disposed`] if the resolver is disposed
    fn get_services(&self, service: TypeInfo, contract: Option<&str>) -> Result<Vec<Instance>, ResolveErrorKind>;

    /// Releases registrations. Repeated calls do nothing.
    fn dispose(&self);
}

/// Service locator which registrations can be changed at runtime.
pub trait MutableResolver: Resolver {
    /// Adds the producer after any existing producers of the same service and contract.
    ///
    /// # Errors
    /// - Returns [`RegisterErrorKind::Instantiate`] if the resolver calls the factory on registration and it fails
    /// - Returns [`RegisterErrorKind::Disposed`] if the resolver is disposed
    fn register(&self, producer: Producer, service: TypeInfo, contract: Option<&str>) -> Result<(), RegisterErrorKind>;

    /// # Errors
    /// Returns [`ResolveErrorKind::Disposed`] if the resolver is disposed
    fn has_registration(&self, service: TypeInfo, contract: Option<&str>) -> Result<bool, ResolveErrorKind>;

    /// Removes every producer of the service and contract.
    ///
    /// # Errors
    /// Returns [`UnregisterErrorKind::Disposed`] if the resolver is disposed
    fn unregister_current(&self, service: TypeInfo, contract: Option<&str>) -> Result<(), UnregisterErrorKind>;

    /// Removes producers of the service and contract which implementation type is exactly `service`.
    /// Producers of other types registered under the same key are kept.
    ///
    /// # Errors
    /// Returns [`UnregisterErrorKind::Disposed`] if the resolver is disposed
    fn unregister_all(&self, service: TypeInfo, contract: Option<&str>) -> Result<(), UnregisterErrorKind>;

    /// Whether [`Self::service_registration_callback`] is supported.
    fn supports_registration_callbacks(&self) -> bool;

    /// Subscribes the callback to registrations of the service and contract.
    ///
    /// # Errors
    /// - Returns [`SubscribeErrorKind::Unsupported`] if the resolver doesn't support callbacks
    /// - Returns [`SubscribeErrorKind::Disposed`] if the resolver is disposed
    fn service_registration_callback(
        &self,
        service: TypeInfo,
        contract: Option<&str>,
        callback: RegistrationCallback,
    ) -> Result<Subscription, SubscribeErrorKind>;
}
