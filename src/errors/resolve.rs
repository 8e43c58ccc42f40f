use super::InstantiateErrorKind;
use crate::key::ServiceKey;

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("Resolver is disposed")]
    Disposed,
    #[error("No registration for {key}")]
    Unresolved { key: ServiceKey },
    #[error("Factory of {key} failed: {source}")]
    Instantiate {
        key: ServiceKey,
        #[source]
        source: InstantiateErrorKind,
    },
}
