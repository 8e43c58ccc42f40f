mod instantiate;
mod register;
mod resolve;
mod subscribe;

pub use instantiate::InstantiateErrorKind;
pub use register::{RegisterErrorKind, UnregisterErrorKind};
pub use resolve::ResolveErrorKind;
pub use subscribe::SubscribeErrorKind;
