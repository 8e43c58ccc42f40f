#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub(crate) mod adapter;
pub(crate) mod any;
pub(crate) mod config;
pub(crate) mod container;
pub(crate) mod errors;
pub(crate) mod ext;
pub(crate) mod in_memory;
pub(crate) mod key;
pub(crate) mod producer;
pub(crate) mod registry;
pub(crate) mod resolver;
pub(crate) mod subscription;

pub mod logging;

#[cfg(feature = "std")]
pub mod locator;

pub use adapter::ContainerResolver;
pub use any::{Instance, TypeInfo};
pub use config::{Config, IfAlreadyRegistered, IfUnresolved};
pub use container::Container;
pub use errors::{InstantiateErrorKind, RegisterErrorKind, ResolveErrorKind, SubscribeErrorKind, UnregisterErrorKind};
pub use ext::{MutableResolverExt, ResolverExt};
pub use in_memory::InMemoryResolver;
pub use key::ServiceKey;
pub use producer::{Factory, Memoized, Producer};
pub use resolver::{MutableResolver, Resolver};
pub use subscription::{RegistrationCallback, Subscription};
