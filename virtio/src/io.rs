//! Shared memory region access.
//!
//! Ring memory is reached through an [`IoRegion`], which translates virtual
//! addresses into region-relative offsets and fills byte ranges. Transports
//! with their own memory model implement the trait; [`MappedRegion`] covers
//! the common case of a window mapped into our address space.

use core::ptr;
use core::sync::atomic::{fence, Ordering};

use crate::error::{Result, VirtioError};

/// Memory region backing one or more vrings.
pub trait IoRegion: Send + Sync {
    /// Offset of `vaddr` from the start of the region, or `None` when the
    /// address lies outside it.
    fn virt_to_offset(&self, vaddr: usize) -> Option<usize>;

    /// Set `len` bytes starting at `offset` to `value`.
    ///
    /// Returns the number of bytes written.
    fn block_set(&self, offset: usize, value: u8, len: usize) -> Result<usize>;

    /// Region size in bytes.
    fn size(&self) -> usize;
}

/// A window of shared memory mapped at a fixed virtual address.
pub struct MappedRegion {
    /// Virtual base address.
    virt: usize,
    /// Physical (bus) base address seen by the remote side.
    phys: usize,
    /// Window size in bytes.
    size: usize,
}

impl MappedRegion {
    /// Create a region over `size` bytes mapped at `virt` and identity
    /// mapped to the same physical address.
    ///
    /// # Safety
    ///
    /// `virt..virt + size` must be mapped, writable, and stay valid for the
    /// lifetime of the region.
    pub unsafe fn new(virt: usize, size: usize) -> Self {
        // SAFETY: forwarded caller contract.
        unsafe { Self::with_phys(virt, virt, size) }
    }

    /// Create a region whose physical base differs from its virtual base.
    ///
    /// # Safety
    ///
    /// Same as [`MappedRegion::new`].
    pub unsafe fn with_phys(virt: usize, phys: usize, size: usize) -> Self {
        MappedRegion { virt, phys, size }
    }

    /// Translate a virtual address to the remote side's physical address.
    pub fn virt_to_phys(&self, vaddr: usize) -> Option<usize> {
        self.virt_to_offset(vaddr).map(|offset| self.phys + offset)
    }

    /// Translate a physical address back into our virtual address space.
    pub fn phys_to_virt(&self, paddr: usize) -> Option<usize> {
        let offset = paddr.checked_sub(self.phys)?;
        (offset < self.size).then(|| self.virt + offset)
    }
}

// SAFETY: the region only hands out offsets and performs volatile writes
// into memory the constructor's caller vouched for.
unsafe impl Send for MappedRegion {}
unsafe impl Sync for MappedRegion {}

impl IoRegion for MappedRegion {
    fn virt_to_offset(&self, vaddr: usize) -> Option<usize> {
        let offset = vaddr.checked_sub(self.virt)?;
        (offset < self.size).then_some(offset)
    }

    fn block_set(&self, offset: usize, value: u8, len: usize) -> Result<usize> {
        let end = offset.checked_add(len).ok_or(VirtioError::RegionOutOfRange)?;
        if end > self.size {
            return Err(VirtioError::RegionOutOfRange);
        }

        let base = (self.virt + offset) as *mut u8;
        for i in 0..len {
            // SAFETY: offset + i < size, and the window is valid per `new`.
            unsafe { ptr::write_volatile(base.add(i), value) };
        }

        // Make the fill visible to the remote core before anything else
        // is published.
        fence(Ordering::SeqCst);

        Ok(len)
    }

    fn size(&self) -> usize {
        self.size
    }
}
