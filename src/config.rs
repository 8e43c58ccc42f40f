/// Policy for registering under a key that already has producers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IfAlreadyRegistered {
    /// Keep existing producers and add the new one after them.
    #[default]
    AppendNewImplementation,
    /// Drop existing producers.
    Replace,
    /// Ignore the new producer.
    Keep,
    /// Fail with [`crate::RegisterErrorKind::AlreadyRegistered`].
    Throw,
}

/// Policy for resolving a key without producers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IfUnresolved {
    /// Fail with [`crate::ResolveErrorKind::Unresolved`].
    #[default]
    Throw,
    /// Return `None`.
    ReturnDefault,
}

/// Config for a [`crate::Container`]
/// ## Fields
/// - `if_already_registered`:
///   Policy used by [`crate::Container::add`] when the key already has producers.
/// - `if_unresolved`:
///   Policy used by [`crate::Container::resolve`] when the key has no producers.
///
/// Methods taking an explicit policy ignore these.
#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    pub if_already_registered: IfAlreadyRegistered,
    pub if_unresolved: IfUnresolved,
}
