//! Single-flight resource cells.
//!
//! A [`LazyResource`] memoizes the in-flight load future itself, not only its
//! eventual value. The first caller swaps the slot from `Unloaded` to
//! `Loading` while holding a short lock (never across an `.await`); every
//! later caller clones the same [`PendingResource`], so a resource is loaded
//! at most once no matter how many callers race for it.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};

use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use crate::error::Result;

/// A cloneable handle to a load that may still be running.
pub type PendingResource<T> = Shared<BoxFuture<'static, Result<Arc<T>>>>;

/// Lifecycle of a lazily loaded resource.
pub enum ResourceSlot<T: ?Sized> {
    Unloaded,
    Loading(PendingResource<T>),
    Ready(Arc<T>),
}

impl<T: ?Sized> fmt::Debug for ResourceSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unloaded => f.write_str("Unloaded"),
            Self::Loading(_) => f.write_str("Loading"),
            Self::Ready(_) => f.write_str("Ready"),
        }
    }
}

/// A named resource slot with single-flight loading.
///
/// On success the slot settles to `Ready` for the rest of its life. On
/// failure it falls back to `Unloaded`, so a later call can try again.
pub struct LazyResource<T: ?Sized> {
    name: String,
    slot: Mutex<ResourceSlot<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> LazyResource<T> {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            slot: Mutex::new(ResourceSlot::Unloaded),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the pending load for this resource, starting it with `load` if
    /// the slot is `Unloaded`.
    ///
    /// `load` runs under the slot lock and must only build the future; the
    /// actual work happens when the returned handle is first polled.
    pub fn get_or_load<F, Fut>(self: &Arc<Self>, load: F) -> PendingResource<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<T>>> + Send + 'static,
    {
        let mut slot = self.slot.lock();
        match &*slot {
            ResourceSlot::Ready(value) => {
                return future::ready(Ok(Arc::clone(value))).boxed().shared();
            }
            ResourceSlot::Loading(pending) => {
                log::debug!("{}: joining in-flight load", self.name);
                return pending.clone();
            }
            ResourceSlot::Unloaded => {}
        }

        log::debug!("{}: starting load", self.name);
        let cell: Weak<Self> = Arc::downgrade(self);
        let work = load();
        let pending = async move {
            let result = work.await;
            if let Some(cell) = cell.upgrade() {
                cell.settle(&result);
            }
            result
        }
        .boxed()
        .shared();

        *slot = ResourceSlot::Loading(pending.clone());
        pending
    }

    /// The loaded value, if the slot is `Ready`.
    pub fn ready(&self) -> Option<Arc<T>> {
        match &*self.slot.lock() {
            ResourceSlot::Ready(value) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.slot.lock(), ResourceSlot::Ready(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(*self.slot.lock(), ResourceSlot::Loading(_))
    }

    fn settle(&self, result: &Result<Arc<T>>) {
        let mut slot = self.slot.lock();
        if !matches!(*slot, ResourceSlot::Loading(_)) {
            return;
        }
        *slot = match result {
            Ok(value) => {
                log::debug!("{}: ready", self.name);
                ResourceSlot::Ready(Arc::clone(value))
            }
            Err(err) => {
                log::warn!("{}: load failed, slot reset: {err}", self.name);
                ResourceSlot::Unloaded
            }
        };
    }
}

impl<T: ?Sized> fmt::Debug for LazyResource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyResource")
            .field("name", &self.name)
            .field("slot", &*self.slot.lock())
            .finish()
    }
}
