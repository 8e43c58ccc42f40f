use alloc::{
    boxed::Box,
    collections::{BTreeMap, VecDeque},
    sync::Arc,
    vec::Vec,
};
use core::{
    cell::RefCell,
    ops::ControlFlow,
    sync::atomic::{AtomicBool, Ordering},
};
use parking_lot::{Mutex, ReentrantMutex};
use tracing::debug;

use crate::key::ServiceKey;

/// Called with the key of each new registration. Returning [`ControlFlow::Break`] unsubscribes.
pub type RegistrationCallback = Box<dyn FnMut(&ServiceKey) -> ControlFlow<()> + Send>;

/// Handle of a registration callback. Delivery stops when it's cancelled or dropped.
#[must_use = "dropping a subscription cancels it"]
pub struct Subscription {
    active: Arc<AtomicBool>,
}

impl Subscription {
    #[inline]
    pub fn cancel(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// `false` after [`Self::cancel`], after the callback returned [`ControlFlow::Break`]
    /// or after the resolver was disposed.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Clone)]
pub(crate) struct CallbackEntry {
    active: Arc<AtomicBool>,
    inner: Arc<CallbackInner>,
}

struct CallbackInner {
    /// Owned by the thread running the callback. The `RefCell` is borrowed while it runs.
    callback: ReentrantMutex<RefCell<RegistrationCallback>>,
    pending: Mutex<VecDeque<ServiceKey>>,
}

impl CallbackEntry {
    #[inline]
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Delivers the key to the callback.
    ///
    /// A registration made by the callback itself isn't delivered to it.
    /// Keys from other threads are queued while the callback runs and delivered by the running thread.
    pub(crate) fn notify(&self, key: &ServiceKey) {
        if !self.is_active() {
            return;
        }
        if let Some(runner) = self.inner.callback.try_lock() {
            if runner.try_borrow_mut().is_err() {
                debug!(service = key.service.name, "Callback is running on this thread, re-entrant notification skipped");
                return;
            }
        }

        self.inner.pending.lock().push_back(key.clone());
        self.drain();
    }

    #[inline]
    fn next_pending(&self) -> Option<ServiceKey> {
        self.inner.pending.lock().pop_front()
    }

    fn drain(&self) {
        loop {
            let Some(runner) = self.inner.callback.try_lock() else {
                return;
            };
            let Ok(mut callback) = runner.try_borrow_mut() else {
                return;
            };

            while let Some(key) = self.next_pending() {
                if self.is_active() && (*callback)(&key).is_break() {
                    self.active.store(false, Ordering::Release);
                    debug!(service = key.service.name, "Callback unsubscribed itself");
                }
            }

            drop(callback);
            drop(runner);

            // A key queued after the last pop but before unlocking is ours to deliver
            if self.inner.pending.lock().is_empty() {
                return;
            }
        }
    }
}

/// Registration callbacks by key.
#[derive(Default)]
pub(crate) struct Callbacks {
    entries: BTreeMap<ServiceKey, Vec<CallbackEntry>>,
}

impl Callbacks {
    /// Cancelled callbacks of every key are dropped before adding the new one.
    pub(crate) fn subscribe(&mut self, key: ServiceKey, callback: RegistrationCallback) -> (Subscription, CallbackEntry) {
        self.entries.retain(|_, entries| {
            entries.retain(CallbackEntry::is_active);
            !entries.is_empty()
        });

        let active = Arc::new(AtomicBool::new(true));
        let entry = CallbackEntry {
            active: active.clone(),
            inner: Arc::new(CallbackInner {
                callback: ReentrantMutex::new(RefCell::new(callback)),
                pending: Mutex::new(VecDeque::new()),
            }),
        };
        self.entries.entry(key).or_default().push(entry.clone());

        (Subscription { active }, entry)
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Active callbacks of the key. Cancelled ones are dropped on the way.
    pub(crate) fn active(&mut self, key: &ServiceKey) -> Vec<CallbackEntry> {
        let Some(entries) = self.entries.get_mut(key) else {
            return Vec::new();
        };

        entries.retain(CallbackEntry::is_active);
        if entries.is_empty() {
            self.entries.remove(key);
            return Vec::new();
        }
        entries.clone()
    }

    /// Deactivates and drops every callback.
    pub(crate) fn clear(&mut self) -> usize {
        let entries = core::mem::take(&mut self.entries);
        let mut count = 0;
        for entry in entries.into_values().flatten() {
            entry.active.store(false, Ordering::Release);
            count += 1;
        }
        count
    }
}
