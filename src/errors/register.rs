use super::InstantiateErrorKind;
use crate::key::ServiceKey;

#[derive(thiserror::Error, Debug)]
pub enum RegisterErrorKind {
    #[error("Resolver is disposed")]
    Disposed,
    #[error("{key} is already registered")]
    AlreadyRegistered { key: ServiceKey },
    #[error("Factory of {key} failed: {source}")]
    Instantiate {
        key: ServiceKey,
        #[source]
        source: InstantiateErrorKind,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum UnregisterErrorKind {
    #[error("Resolver is disposed")]
    Disposed,
}
