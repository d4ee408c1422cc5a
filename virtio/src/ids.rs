//! Virtio device and feature identifiers.
//!
//! Static lookup tables mapping device-type codes and feature bits to
//! human-readable names, used for diagnostics only.

use alloc::vec::Vec;

use bitflags::bitflags;

use crate::device::VirtioDevice;

/// Virtio device type IDs.
pub mod device_id {
    pub const NETWORK: u16 = 1;
    pub const BLOCK: u16 = 2;
    pub const CONSOLE: u16 = 3;
    pub const ENTROPY: u16 = 4;
    pub const BALLOON: u16 = 5;
    pub const IOMEMORY: u16 = 6;
    pub const RPMSG: u16 = 7;
    pub const SCSI: u16 = 8;
    pub const NINE_P: u16 = 9;
    pub const MAC80211_WLAN: u16 = 10;
    pub const RPROC_SERIAL: u16 = 11;
    pub const GPU: u16 = 16;
    pub const INPUT: u16 = 18;
    pub const VSOCK: u16 = 19;
    pub const SOUND: u16 = 25;
    pub const FS: u16 = 26;
    pub const MAC80211_HWSIM: u16 = 29;
    pub const I2C_ADAPTER: u16 = 34;
    pub const BT: u16 = 40;
    pub const GPIO: u16 = 41;
}

bitflags! {
    /// Device-independent feature bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CommonFeatures: u64 {
        /// Notify when the available ring runs empty.
        const NOTIFY_ON_EMPTY = 1 << 24;
        /// Descriptor layout is not tied to the header layout.
        const ANY_LAYOUT = 1 << 27;
        /// Indirect descriptor tables.
        const RING_INDIRECT_DESC = 1 << 28;
        /// Used/available event index suppression.
        const RING_EVENT_IDX = 1 << 29;
        /// Never negotiated; marks a broken peer.
        const BAD_FEATURE = 1 << 30;
    }
}

/// Device type code and its name.
#[derive(Debug, Clone, Copy)]
struct VirtioIdent {
    devid: u16,
    name: &'static str,
}

const fn ident(devid: u16, name: &'static str) -> VirtioIdent {
    VirtioIdent { devid, name }
}

static VIRTIO_IDENT_TABLE: &[VirtioIdent] = &[
    ident(device_id::NETWORK, "Network"),
    ident(device_id::BLOCK, "Block"),
    ident(device_id::CONSOLE, "Console"),
    ident(device_id::ENTROPY, "Entropy"),
    ident(device_id::BALLOON, "Balloon"),
    ident(device_id::IOMEMORY, "IOMemory"),
    ident(device_id::SCSI, "SCSI"),
    ident(device_id::NINE_P, "9P Transport"),
    ident(device_id::MAC80211_WLAN, "MAC80211 WLAN"),
    ident(device_id::RPROC_SERIAL, "Remoteproc Serial"),
    ident(device_id::GPU, "GPU"),
    ident(device_id::INPUT, "Input"),
    ident(device_id::VSOCK, "Vsock Transport"),
    ident(device_id::SOUND, "Sound"),
    ident(device_id::FS, "File System"),
    ident(device_id::MAC80211_HWSIM, "MAC80211 HWSIM"),
    ident(device_id::I2C_ADAPTER, "I2C Adapter"),
    ident(device_id::BT, "Bluetooth"),
    ident(device_id::GPIO, "GPIO"),
];

/// Feature bit value and its name.
///
/// A table entry whose `value` is zero terminates the table; it is never
/// matched as a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureDesc {
    pub value: u64,
    pub name: &'static str,
}

impl FeatureDesc {
    pub const fn new(value: u64, name: &'static str) -> Self {
        FeatureDesc { value, name }
    }
}

/// Names for [`CommonFeatures`].
pub static COMMON_FEATURE_DESC: &[FeatureDesc] = &[
    FeatureDesc::new(CommonFeatures::NOTIFY_ON_EMPTY.bits(), "NotifyOnEmpty"),
    FeatureDesc::new(CommonFeatures::RING_INDIRECT_DESC.bits(), "RingIndirect"),
    FeatureDesc::new(CommonFeatures::RING_EVENT_IDX.bits(), "EventIdx"),
    FeatureDesc::new(CommonFeatures::BAD_FEATURE.bits(), "BadFeature"),
];

/// Look up the name of a device type.
pub fn dev_name(devid: u16) -> Option<&'static str> {
    VIRTIO_IDENT_TABLE
        .iter()
        .find(|ident| ident.devid == devid)
        .map(|ident| ident.name)
}

/// Ordered set of feature name tables.
///
/// Sources are searched in insertion order and the first match wins, so a
/// table pushed earlier shadows the same bit in a later table.
pub struct FeatureNameResolver<'a> {
    sources: Vec<&'a [FeatureDesc]>,
}

impl<'a> FeatureNameResolver<'a> {
    /// Create a resolver with no sources.
    pub fn new() -> Self {
        FeatureNameResolver {
            sources: Vec::new(),
        }
    }

    /// Create a resolver over `device_specific` (if any) followed by the
    /// common feature table.
    pub fn with_common(device_specific: Option<&'a [FeatureDesc]>) -> Self {
        let mut resolver = Self::new();
        if let Some(desc) = device_specific {
            resolver.push_source(desc);
        }
        resolver.push_source(COMMON_FEATURE_DESC);
        resolver
    }

    /// Append a lower-priority source.
    pub fn push_source(&mut self, desc: &'a [FeatureDesc]) {
        self.sources.push(desc);
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Resolve a feature value to its name.
    pub fn resolve(&self, value: u64) -> Option<&'a str> {
        self.sources.iter().find_map(|desc| {
            desc.iter()
                .take_while(|entry| entry.value != 0)
                .find(|entry| entry.value == value)
                .map(|entry| entry.name)
        })
    }
}

impl Default for FeatureNameResolver<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Look up the name of a feature, preferring `device_specific` over the
/// common table.
pub fn feature_name<'a>(value: u64, device_specific: Option<&'a [FeatureDesc]>) -> Option<&'a str> {
    FeatureNameResolver::with_common(device_specific).resolve(value)
}

/// Describe a device's features.
///
/// Kept for interface compatibility only. It performs a single lookup whose
/// result is discarded and has no other effect.
#[deprecated(note = "has no effect; use `feature_name` directly")]
pub fn describe(
    _vdev: &VirtioDevice,
    _msg: &str,
    _features: u32,
    desc: Option<&[FeatureDesc]>,
) {
    let _ = feature_name(0, desc);
}
