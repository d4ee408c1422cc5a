//! Recording adapters shared by the integration tests.
//!
//! Every adapter appends to one [`CallLog`] so tests can assert on the exact
//! order of region and factory calls.

#![allow(dead_code)]

use std::sync::Arc;

use amp_virtio::config::VRING_DEFAULT_ALIGN;
use amp_virtio::{
    IoRegion, Result, RingFactory, SplitRingFactory, VirtioDevice, VirtioDeviceId, VirtioError,
    VirtioRole, Virtqueue, VirtqueueOverride, VqCallback, VqNotify, VqPriv, VringAllocInfo,
    VringInfo,
};
use spin::Mutex;

pub const REGION_BASE: usize = 0x2000_0000;
pub const REGION_SIZE: usize = 0x10_0000;
pub const RING_STRIDE: usize = 0x4000;
pub const RING_ALIGN: usize = VRING_DEFAULT_ALIGN;
pub const RING_DESCS: u16 = 16;

/// One observed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    VirtToOffset { vaddr: usize },
    BlockSet { offset: usize, value: u8, len: usize },
    CreateRing { index: usize, name: String, vaddr: usize },
    Override { flags: u32, nvqs: usize },
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Region that records calls instead of touching memory.
pub struct RecordingRegion {
    pub log: CallLog,
}

impl IoRegion for RecordingRegion {
    fn virt_to_offset(&self, vaddr: usize) -> Option<usize> {
        self.log.lock().push(Call::VirtToOffset { vaddr });
        let offset = vaddr.checked_sub(REGION_BASE)?;
        (offset < REGION_SIZE).then_some(offset)
    }

    fn block_set(&self, offset: usize, value: u8, len: usize) -> Result<usize> {
        self.log.lock().push(Call::BlockSet { offset, value, len });
        Ok(len)
    }

    fn size(&self) -> usize {
        REGION_SIZE
    }
}

/// Factory that records calls and optionally fails at one index.
pub struct RecordingFactory {
    pub log: CallLog,
    pub fail_at: Option<(usize, VirtioError)>,
}

impl RingFactory for RecordingFactory {
    fn create_virtqueue(
        &self,
        vdev: &VirtioDevice,
        index: usize,
        name: &str,
        ring: &VringAllocInfo,
        callback: Option<VqCallback>,
        notify: VqNotify,
    ) -> Result<Virtqueue> {
        self.log.lock().push(Call::CreateRing {
            index,
            name: name.to_string(),
            vaddr: ring.vaddr,
        });
        match self.fail_at {
            Some((at, err)) if at == index => Err(err),
            _ => SplitRingFactory.create_virtqueue(vdev, index, name, ring, callback, notify),
        }
    }
}

/// Override that records the forwarded call and returns a canned result.
pub struct RecordingOverride {
    pub log: CallLog,
    pub result: Result<()>,
}

impl VirtqueueOverride for RecordingOverride {
    fn create_virtqueues(
        &self,
        _vdev: &mut VirtioDevice,
        flags: u32,
        nvqs: usize,
        _names: &[&str],
        _callbacks: &[Option<VqCallback>],
        _callback_args: &[Option<VqPriv>],
    ) -> Result<()> {
        self.log.lock().push(Call::Override { flags, nvqs });
        self.result
    }
}

/// Ring descriptor for slot `index`.
pub fn ring_at(index: usize) -> VringAllocInfo {
    VringAllocInfo::new(REGION_BASE + index * RING_STRIDE, RING_ALIGN, RING_DESCS)
}

/// Device with `rings` slots over a recording region and factory.
pub fn recording_device(role: VirtioRole, rings: usize, log: &CallLog) -> VirtioDevice {
    recording_device_failing(role, rings, log, None)
}

pub fn recording_device_failing(
    role: VirtioRole,
    rings: usize,
    log: &CallLog,
    fail_at: Option<(usize, VirtioError)>,
) -> VirtioDevice {
    let io: Arc<dyn IoRegion> = Arc::new(RecordingRegion { log: log.clone() });
    let vrings = (0..rings)
        .map(|i| VringInfo::new(ring_at(i), i as u32, io.clone()))
        .collect();
    let factory = Arc::new(RecordingFactory {
        log: log.clone(),
        fail_at,
    });

    VirtioDevice::new(role, VirtioDeviceId::default(), Arc::new(|_: &Virtqueue| {}))
        .with_vrings(vrings)
        .with_ring_factory(factory)
}

pub fn queue_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("vq{}", i)).collect()
}
