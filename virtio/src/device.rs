//! Virtio device model.
//!
//! A [`VirtioDevice`] describes one endpoint of a shared-memory virtio link:
//! which role it plays, the rings that were laid out for it, and the hooks
//! the transport provides.
//!
//! # Roles
//!
//! - Driver: owns the ring memory and clears it before the peer looks at it
//! - Device: attaches to rings the peer has already initialized

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::config::{DEVICE_SUPPORT, DRIVER_SUPPORT};
use crate::error::Result;
use crate::ids;
use crate::io::IoRegion;
use crate::virtqueue::{RingFactory, SplitRingFactory, Virtqueue, VqCallback, VqNotify, VqPriv};
use crate::vring::VringAllocInfo;

/// Which side of the link this endpoint is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum VirtioRole {
    Driver = 0,
    Device = 1,
}

/// Device identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VirtioDeviceId {
    /// Device type (see [`ids::device_id`]).
    pub device: u32,
    pub vendor: u32,
    pub version: u32,
}

/// One vring slot: the ring memory and, once provisioned, its queue.
pub struct VringInfo {
    /// Ring layout and location.
    pub alloc: VringAllocInfo,
    /// Notification ID used by the transport for this ring.
    pub notify_id: u32,
    /// Memory region backing the ring.
    pub io: Arc<dyn IoRegion>,
    /// Queue bound to this ring.
    pub vq: Option<Virtqueue>,
}

impl VringInfo {
    pub fn new(alloc: VringAllocInfo, notify_id: u32, io: Arc<dyn IoRegion>) -> Self {
        VringInfo {
            alloc,
            notify_id,
            io,
            vq: None,
        }
    }
}

impl fmt::Debug for VringInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VringInfo")
            .field("alloc", &self.alloc)
            .field("notify_id", &self.notify_id)
            .field("vq", &self.vq)
            .finish()
    }
}

/// Transport-provided replacement for generic queue provisioning.
///
/// Transports whose rings are managed elsewhere (for example behind a
/// hypervisor) implement this to take over queue creation entirely.
pub trait VirtqueueOverride: Send + Sync {
    /// Create `nvqs` queues for `vdev`.
    ///
    /// Receives the arguments of [`create_virtqueues`](crate::create_virtqueues)
    /// exactly as the caller passed them. `flags` is only meaningful here.
    fn create_virtqueues(
        &self,
        vdev: &mut VirtioDevice,
        flags: u32,
        nvqs: usize,
        names: &[&str],
        callbacks: &[Option<VqCallback>],
        callback_args: &[Option<VqPriv>],
    ) -> Result<()>;

    /// Release the queues created by [`VirtqueueOverride::create_virtqueues`].
    ///
    /// The default implementation detaches every handle from its slot.
    fn delete_virtqueues(&self, vdev: &mut VirtioDevice) -> usize {
        vdev.release_virtqueues()
    }
}

/// One endpoint of a virtio link.
pub struct VirtioDevice {
    /// Notification ID of the device itself.
    pub notify_id: u32,
    pub id: VirtioDeviceId,
    /// Negotiated features.
    pub features: u64,
    role: VirtioRole,
    vrings: Vec<VringInfo>,
    notify: VqNotify,
    ring_factory: Arc<dyn RingFactory>,
    queue_override: Option<Arc<dyn VirtqueueOverride>>,
}

impl VirtioDevice {
    /// Create a device with no rings, using [`SplitRingFactory`].
    pub fn new(role: VirtioRole, id: VirtioDeviceId, notify: VqNotify) -> Self {
        VirtioDevice {
            notify_id: 0,
            id,
            features: 0,
            role,
            vrings: Vec::new(),
            notify,
            ring_factory: Arc::new(SplitRingFactory),
            queue_override: None,
        }
    }

    /// Set the rings laid out for this device. Their count is the maximum
    /// number of queues the device can provision.
    pub fn with_vrings(mut self, vrings: Vec<VringInfo>) -> Self {
        self.vrings = vrings;
        self
    }

    pub fn with_ring_factory(mut self, factory: Arc<dyn RingFactory>) -> Self {
        self.ring_factory = factory;
        self
    }

    /// Install a transport override for queue provisioning.
    pub fn with_override(mut self, queue_override: Arc<dyn VirtqueueOverride>) -> Self {
        self.queue_override = Some(queue_override);
        self
    }

    pub fn role(&self) -> VirtioRole {
        self.role
    }

    /// True when acting as driver and driver support is compiled in.
    pub fn is_driver(&self) -> bool {
        DRIVER_SUPPORT && self.role == VirtioRole::Driver
    }

    /// True when acting as device and device support is compiled in.
    pub fn is_device(&self) -> bool {
        DEVICE_SUPPORT && self.role == VirtioRole::Device
    }

    /// Human-readable device type name.
    pub fn name(&self) -> Option<&'static str> {
        u16::try_from(self.id.device).ok().and_then(ids::dev_name)
    }

    /// Number of vring slots.
    pub fn vrings_num(&self) -> usize {
        self.vrings.len()
    }

    pub fn vring(&self, index: usize) -> Option<&VringInfo> {
        self.vrings.get(index)
    }

    pub fn vrings(&self) -> &[VringInfo] {
        &self.vrings
    }

    pub fn vrings_mut(&mut self) -> &mut [VringInfo] {
        &mut self.vrings
    }

    /// Queue provisioned at `index`.
    pub fn virtqueue(&self, index: usize) -> Option<&Virtqueue> {
        self.vrings.get(index)?.vq.as_ref()
    }

    pub fn virtqueue_mut(&mut self, index: usize) -> Option<&mut Virtqueue> {
        self.vrings.get_mut(index)?.vq.as_mut()
    }

    /// Iterate over provisioned queues in slot order.
    pub fn virtqueues(&self) -> impl Iterator<Item = &Virtqueue> {
        self.vrings.iter().filter_map(|vring| vring.vq.as_ref())
    }

    /// Shared notify hook handed to every queue.
    pub fn notify_fn(&self) -> VqNotify {
        self.notify.clone()
    }

    pub fn ring_factory(&self) -> Arc<dyn RingFactory> {
        self.ring_factory.clone()
    }

    pub fn queue_override(&self) -> Option<Arc<dyn VirtqueueOverride>> {
        self.queue_override.clone()
    }

    /// Detach every queue from its slot, returning how many were released.
    pub fn release_virtqueues(&mut self) -> usize {
        self.vrings
            .iter_mut()
            .filter_map(|vring| vring.vq.take())
            .count()
    }
}

impl fmt::Debug for VirtioDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtioDevice")
            .field("notify_id", &self.notify_id)
            .field("id", &self.id)
            .field("features", &self.features)
            .field("role", &self.role)
            .field("vrings", &self.vrings)
            .field("has_override", &self.queue_override.is_some())
            .finish()
    }
}
