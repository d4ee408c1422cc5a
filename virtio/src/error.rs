//! Virtio error types

use core::fmt;

/// Errors reported while provisioning or tearing down virtqueues.
///
/// The provisioner itself only produces [`VirtioError::InvalidArgument`],
/// [`VirtioError::InvalidQueueParameter`] and
/// [`VirtioError::RegionOutOfRange`]. Every other variant comes from a ring
/// factory or a transport override and is forwarded untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtioError {
    /// Missing or malformed device handle or argument slice.
    InvalidArgument,
    /// More queues requested than the device declares.
    InvalidQueueParameter,
    /// Descriptor count is zero, not a power of two, or too large.
    InvalidQueueSize,
    /// Ring base address is null, or its layout overflows the address space.
    InvalidRing,
    /// Address or byte range falls outside the backing memory region.
    RegionOutOfRange,
    /// Out of memory while building a queue.
    NoMemory,
    /// Transport-specific failure code.
    Transport(i32),
}

impl fmt::Display for VirtioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VirtioError::InvalidArgument => write!(f, "invalid argument"),
            VirtioError::InvalidQueueParameter => write!(f, "invalid virtqueue parameter"),
            VirtioError::InvalidQueueSize => write!(f, "invalid virtqueue size"),
            VirtioError::InvalidRing => write!(f, "invalid vring"),
            VirtioError::RegionOutOfRange => write!(f, "address outside memory region"),
            VirtioError::NoMemory => write!(f, "out of memory"),
            VirtioError::Transport(code) => write!(f, "transport error: {}", code),
        }
    }
}

/// Result type for virtio operations
pub type Result<T> = core::result::Result<T, VirtioError>;
