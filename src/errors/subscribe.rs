#[derive(thiserror::Error, Debug)]
pub enum SubscribeErrorKind {
    /// The resolver can't notify about registrations.
    /// Check [`crate::MutableResolver::supports_registration_callbacks`] before subscribing.
    #[error("Registration callbacks aren't supported by {resolver}")]
    Unsupported { resolver: &'static str },
    #[error("Resolver is disposed")]
    Disposed,
}
