//! Virtqueue handles and the ring factory.
//!
//! A [`Virtqueue`] is the operational object for one queue: it is bound to a
//! single vring, carries the queue's name and callback, and knows how to
//! kick the remote side. Handles are built by a [`RingFactory`]; the
//! descriptor enqueue/dequeue machinery lives behind the factory and is not
//! part of this crate.

use alloc::string::String;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

use spin::Mutex;

use crate::config::VRING_MAX_DESCS;
use crate::device::VirtioDevice;
use crate::error::{Result, VirtioError};
use crate::vring::{VringAllocInfo, VringLayout};

/// Callback run when the remote side signals a queue.
pub type VqCallback = fn(&Virtqueue);

/// Transport hook used to signal the remote side about a queue.
pub type VqNotify = Arc<dyn Fn(&Virtqueue) + Send + Sync>;

/// Opaque caller-supplied argument attached to a queue.
pub type VqPriv = Arc<dyn Any + Send + Sync>;

/// One provisioned virtqueue.
pub struct Virtqueue {
    index: usize,
    name: String,
    ring: VringAllocInfo,
    layout: VringLayout,
    callback: Option<VqCallback>,
    notify: VqNotify,
    priv_data: Mutex<Option<VqPriv>>,
}

impl Virtqueue {
    /// Bind a new handle to `ring`.
    ///
    /// Fails with [`VirtioError::InvalidRing`] when the ring's layout
    /// overflows the address space.
    pub fn new(
        index: usize,
        name: &str,
        ring: &VringAllocInfo,
        callback: Option<VqCallback>,
        notify: VqNotify,
    ) -> Result<Self> {
        let layout = ring.layout().ok_or(VirtioError::InvalidRing)?;

        Ok(Virtqueue {
            index,
            name: String::from(name),
            ring: *ring,
            layout,
            callback,
            notify,
            priv_data: Mutex::new(None),
        })
    }

    /// Queue index within the device.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ring this queue is bound to.
    pub fn ring(&self) -> &VringAllocInfo {
        &self.ring
    }

    pub fn layout(&self) -> &VringLayout {
        &self.layout
    }

    pub fn num_descs(&self) -> u16 {
        self.ring.num_descs
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Attach the caller's private argument, replacing any previous one.
    pub fn set_priv(&self, priv_data: Option<VqPriv>) {
        *self.priv_data.lock() = priv_data;
    }

    /// The caller's private argument.
    pub fn priv_data(&self) -> Option<VqPriv> {
        self.priv_data.lock().clone()
    }

    /// Signal the remote side that this queue has new work.
    pub fn notify(&self) {
        (self.notify)(self);
    }

    /// Run the queue callback in response to a remote notification.
    ///
    /// Returns `false` when no callback is installed.
    pub fn handle_interrupt(&self) -> bool {
        match self.callback {
            Some(callback) => {
                callback(self);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Virtqueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Virtqueue")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("ring", &self.ring)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// Builds operational virtqueues on top of pre-allocated ring memory.
pub trait RingFactory: Send + Sync {
    /// Create the queue at `index`, bound to `ring`.
    ///
    /// Any error is returned to the caller of
    /// [`create_virtqueues`](crate::create_virtqueues) unchanged.
    fn create_virtqueue(
        &self,
        vdev: &VirtioDevice,
        index: usize,
        name: &str,
        ring: &VringAllocInfo,
        callback: Option<VqCallback>,
        notify: VqNotify,
    ) -> Result<Virtqueue>;
}

/// Default factory for split rings.
///
/// Checks that the ring is usable and binds a [`Virtqueue`] to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitRingFactory;

impl RingFactory for SplitRingFactory {
    fn create_virtqueue(
        &self,
        _vdev: &VirtioDevice,
        index: usize,
        name: &str,
        ring: &VringAllocInfo,
        callback: Option<VqCallback>,
        notify: VqNotify,
    ) -> Result<Virtqueue> {
        if ring.vaddr == 0 {
            return Err(VirtioError::InvalidRing);
        }
        let num = ring.num_descs;
        if num == 0 || !num.is_power_of_two() || num > VRING_MAX_DESCS {
            return Err(VirtioError::InvalidQueueSize);
        }

        Virtqueue::new(index, name, ring, callback, notify)
    }
}
