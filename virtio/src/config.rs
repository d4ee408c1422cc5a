//! Virtio link configuration constants.
//!
//! Compile-time configuration for queue provisioning. Role support is
//! selected through the `driver` and `device` cargo features.

/// Default vring alignment used by shared-memory links (4 KB).
pub const VRING_DEFAULT_ALIGN: usize = 4096;

/// Largest descriptor count a split ring may declare.
pub const VRING_MAX_DESCS: u16 = 32768;

/// Driver role compiled in.
pub const DRIVER_SUPPORT: bool = cfg!(feature = "driver");

/// Device role compiled in.
pub const DEVICE_SUPPORT: bool = cfg!(feature = "device");
