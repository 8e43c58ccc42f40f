use alloc::string::{String, ToString};
use core::fmt::{self, Display, Formatter};

use crate::any::TypeInfo;

/// Lookup key of a registration: a service type plus an optional contract.
///
/// An empty contract is the same as no contract.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceKey {
    pub service: TypeInfo,
    pub contract: Option<String>,
}

impl ServiceKey {
    #[inline]
    #[must_use]
    pub fn new(service: TypeInfo, contract: Option<&str>) -> Self {
        Self {
            service,
            contract: normalize_contract(contract).map(ToString::to_string),
        }
    }

    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>(contract: Option<&str>) -> Self {
        Self::new(TypeInfo::of::<T>(), contract)
    }

    #[inline]
    #[must_use]
    pub fn contract(&self) -> Option<&str> {
        self.contract.as_deref()
    }
}

impl Display for ServiceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.contract {
            Some(contract) => write!(f, "{} ({contract})", self.service.name),
            None => f.write_str(self.service.name),
        }
    }
}

#[inline]
#[must_use]
pub(crate) fn normalize_contract(contract: Option<&str>) -> Option<&str> {
    contract.filter(|contract| !contract.is_empty())
}

#[cfg(test)]
mod tests {
    use super::ServiceKey;

    use alloc::string::ToString as _;

    #[test]
    fn test_empty_contract_is_no_contract() {
        assert_eq!(ServiceKey::of::<u8>(Some("")), ServiceKey::of::<u8>(None));
        assert_eq!(ServiceKey::of::<u8>(Some("")).contract(), None);
        assert_ne!(ServiceKey::of::<u8>(Some("a")), ServiceKey::of::<u8>(None));
        assert_ne!(ServiceKey::of::<u8>(Some("a")), ServiceKey::of::<u16>(Some("a")));
    }

    #[test]
    fn test_display() {
        assert_eq!(ServiceKey::of::<u8>(None).to_string(), "u8");
        assert_eq!(ServiceKey::of::<u8>(Some("primary")).to_string(), "u8 (primary)");
    }
}
