//! AMP Virtio
//!
//! Virtqueue provisioning for virtio links between processor cores that
//! share memory without a hypervisor in between (for example an application
//! core and a remote coprocessor).
//!
//! # Architecture
//!
//! ```text
//!            create_virtqueues()
//!                    │
//!        ┌───────────┴────────────┐
//!        │ transport override?    │
//!        ├─ yes ──> VirtqueueOverride::create_virtqueues
//!        └─ no ───> for each ring i:
//!                     IoRegion::block_set   (driver role only)
//!                     RingFactory::create_virtqueue
//! ```
//!
//! # Modules
//!
//! - `device`: Device, vring slots and the transport override hook
//! - `provision`: Queue creation and teardown
//! - `virtqueue`: Queue handles and the ring factory
//! - `vring`: Split ring memory layout
//! - `io`: Shared memory region access
//! - `ids`: Device type and feature names
//! - `config`: Compile-time configuration

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod device;
pub mod error;
pub mod ids;
pub mod io;
pub mod provision;
pub mod virtqueue;
pub mod vring;

// Re-exports for convenience
pub use device::{VirtioDevice, VirtioDeviceId, VirtioRole, VirtqueueOverride, VringInfo};
pub use error::{Result, VirtioError};
#[allow(deprecated)]
pub use ids::describe;
pub use ids::{dev_name, feature_name, FeatureDesc, FeatureNameResolver};
pub use io::{IoRegion, MappedRegion};
pub use provision::{create_virtqueues, delete_virtqueues};
pub use virtqueue::{RingFactory, SplitRingFactory, Virtqueue, VqCallback, VqNotify, VqPriv};
pub use vring::{vring_size, VringAllocInfo, VringLayout};
