//! Virtqueue provisioning.
//!
//! Attaches virtqueues to the rings a device was laid out with. In the
//! driver role each ring is cleared before its queue is created so the peer
//! never sees stale descriptors.

use crate::device::VirtioDevice;
use crate::error::{Result, VirtioError};
use crate::virtqueue::{VqCallback, VqPriv};

/// Create `nvqs` virtqueues on `vdev`.
///
/// Queue `i` is bound to the device's ring `i`, named `names[i]`, and runs
/// `callbacks[i]` on remote notification; `callback_args[i]` is attached as
/// the queue's private argument. `flags` is passed through to a transport
/// override and otherwise ignored.
///
/// When the device carries a [`VirtqueueOverride`](crate::VirtqueueOverride)
/// the call is forwarded to it unchanged and its result returned as-is.
///
/// # Errors
///
/// - [`VirtioError::InvalidArgument`] if `vdev` is `None`, or an argument
///   slice holds fewer than `nvqs` entries.
/// - [`VirtioError::InvalidQueueParameter`] if `nvqs` exceeds the number of
///   rings the device declares. No queue is created.
/// - [`VirtioError::RegionOutOfRange`] if a driver-role ring does not lie in
///   its memory region, including a ring whose size overflows `usize`.
/// - Any error returned by the ring factory, unchanged.
///
/// # Partial failure
///
/// A failure at queue `i` stops provisioning immediately. Queues `0..i`
/// created by this same call stay attached to the device; nothing is rolled
/// back. Callers must tear the whole link down (for example with
/// [`delete_virtqueues`]) before retrying.
pub fn create_virtqueues(
    vdev: Option<&mut VirtioDevice>,
    flags: u32,
    nvqs: usize,
    names: &[&str],
    callbacks: &[Option<VqCallback>],
    callback_args: &[Option<VqPriv>],
) -> Result<()> {
    let vdev = vdev.ok_or(VirtioError::InvalidArgument)?;

    if let Some(queue_override) = vdev.queue_override() {
        log::debug!("[VirtIO] Delegating creation of {} virtqueues to transport", nvqs);
        return queue_override.create_virtqueues(vdev, flags, nvqs, names, callbacks, callback_args);
    }

    let num_vrings = vdev.vrings_num();
    if nvqs > num_vrings {
        log::warn!(
            "[VirtIO] Requested {} virtqueues, device declares {}",
            nvqs,
            num_vrings
        );
        return Err(VirtioError::InvalidQueueParameter);
    }
    if names.len() < nvqs || callbacks.len() < nvqs || callback_args.len() < nvqs {
        return Err(VirtioError::InvalidArgument);
    }

    log::debug!(
        "[VirtIO] Creating {} virtqueues ({:?} role, device {:?})",
        nvqs,
        vdev.role(),
        vdev.name()
    );

    let factory = vdev.ring_factory();
    let notify = vdev.notify_fn();

    for i in 0..nvqs {
        let vring = &vdev.vrings()[i];
        let alloc = vring.alloc;

        if vdev.is_driver() {
            let io = &vring.io;
            let len = alloc.size().ok_or(VirtioError::RegionOutOfRange)?;
            let offset = io
                .virt_to_offset(alloc.vaddr)
                .ok_or(VirtioError::RegionOutOfRange)?;
            io.block_set(offset, 0, len)?;
            log::trace!("[VirtIO] Cleared vring {} ({} bytes at offset {:#x})", i, len, offset);
        }

        let vq = match factory.create_virtqueue(vdev, i, names[i], &alloc, callbacks[i], notify.clone()) {
            Ok(vq) => vq,
            Err(e) => {
                log::warn!(
                    "[VirtIO] Virtqueue {} ({}) creation failed: {}; {} earlier queues left in place",
                    i,
                    names[i],
                    e,
                    i
                );
                return Err(e);
            }
        };
        vq.set_priv(callback_args[i].clone());
        vdev.vrings_mut()[i].vq = Some(vq);
    }

    Ok(())
}

/// Release every virtqueue attached to `vdev`.
///
/// Forwards to the transport override when one is installed. Ring memory is
/// left untouched. Returns the number of queues released.
pub fn delete_virtqueues(vdev: Option<&mut VirtioDevice>) -> Result<usize> {
    let vdev = vdev.ok_or(VirtioError::InvalidArgument)?;

    let released = match vdev.queue_override() {
        Some(queue_override) => queue_override.delete_virtqueues(vdev),
        None => vdev.release_virtqueues(),
    };
    log::debug!("[VirtIO] Released {} virtqueues", released);

    Ok(released)
}
