use alloc::{collections::BTreeMap, vec::Vec};

use crate::{key::ServiceKey, producer::Producer};

/// Producers by key, each list kept in registration order.
#[derive(Default)]
pub(crate) struct Registry {
    entries: BTreeMap<ServiceKey, Vec<Producer>>,
}

impl Registry {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn append(&mut self, key: ServiceKey, producer: Producer) {
        self.entries.entry(key).or_default().push(producer);
    }

    #[inline]
    pub(crate) fn replace(&mut self, key: ServiceKey, producer: Producer) -> usize {
        self.entries.insert(key, Vec::from([producer])).map_or(0, |replaced| replaced.len())
    }

    #[inline]
    #[must_use]
    pub(crate) fn contains(&self, key: &ServiceKey) -> bool {
        self.entries.contains_key(key)
    }

    /// The latest producer for the key.
    #[inline]
    #[must_use]
    pub(crate) fn last(&self, key: &ServiceKey) -> Option<Producer> {
        self.entries.get(key).and_then(|producers| producers.last()).cloned()
    }

    #[inline]
    #[must_use]
    pub(crate) fn all(&self, key: &ServiceKey) -> Vec<Producer> {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    #[inline]
    pub(crate) fn remove(&mut self, key: &ServiceKey) -> usize {
        self.entries.remove(key).map_or(0, |removed| removed.len())
    }

    /// Removes producers of the key matching `condition`. A key left without producers is dropped.
    pub(crate) fn remove_where(&mut self, key: &ServiceKey, mut condition: impl FnMut(&Producer) -> bool) -> usize {
        let Some(producers) = self.entries.get_mut(key) else {
            return 0;
        };

        let len = producers.len();
        producers.retain(|producer| !condition(producer));
        let removed = len - producers.len();
        if producers.is_empty() {
            self.entries.remove(key);
        }
        removed
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    #[inline]
    pub(crate) fn clear(&mut self) -> usize {
        let len = self.len();
        self.entries.clear();
        len
    }
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::{any::TypeInfo, key::ServiceKey, producer::Producer};

    #[test]
    fn test_append_keeps_order() {
        let key = ServiceKey::of::<u8>(None);
        let mut registry = Registry::new();
        registry.append(key.clone(), Producer::constant(1u8));
        registry.append(key.clone(), Producer::constant(2u8));
        registry.append(ServiceKey::of::<u8>(Some("other")), Producer::constant(3u8));

        let values = registry
            .all(&key)
            .iter()
            .map(|producer| *producer.produce().unwrap().downcast_ref::<u8>().unwrap())
            .collect::<alloc::vec::Vec<_>>();
        assert_eq!(values, [1, 2]);
        assert_eq!(*registry.last(&key).unwrap().produce().unwrap().downcast_ref::<u8>().unwrap(), 2);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_replace() {
        let key = ServiceKey::of::<u8>(None);
        let mut registry = Registry::new();
        assert_eq!(registry.replace(key.clone(), Producer::constant(1u8)), 0);
        registry.append(key.clone(), Producer::constant(2u8));
        assert_eq!(registry.replace(key.clone(), Producer::constant(3u8)), 2);
        assert_eq!(registry.all(&key).len(), 1);
    }

    #[test]
    fn test_remove_where_drops_empty_key() {
        let key = ServiceKey::of::<u8>(None);
        let mut registry = Registry::new();
        registry.append(key.clone(), Producer::constant(1u8));
        registry.append(key.clone(), Producer::constant(1u16));

        assert_eq!(registry.remove_where(&key, |producer| producer.implementation() == TypeInfo::of::<u8>()), 1);
        assert!(registry.contains(&key));
        assert_eq!(registry.remove_where(&key, |_| true), 1);
        assert!(!registry.contains(&key));
        assert_eq!(registry.remove_where(&key, |_| true), 0);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut registry = Registry::new();
        registry.append(ServiceKey::of::<u8>(None), Producer::constant(1u8));
        registry.append(ServiceKey::of::<u8>(None), Producer::constant(2u8));
        registry.append(ServiceKey::of::<u16>(None), Producer::constant(3u16));

        assert_eq!(registry.remove(&ServiceKey::of::<u8>(None)), 2);
        assert_eq!(registry.remove(&ServiceKey::of::<u8>(None)), 0);
        assert_eq!(registry.clear(), 1);
        assert_eq!(registry.len(), 0);
    }
}
