//! Split vring memory layout.
//!
//! A split virtqueue occupies one contiguous block of shared memory:
//! - Descriptor table: `num` 16-byte descriptors
//! - Available ring: flags, idx, `num` ring entries, used_event
//! - Used ring: flags, idx, `num` used elements, avail_event, starting at the
//!   next `align` boundary

use core::mem::size_of;

/// Virtqueue descriptor (`struct vring_desc`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct VringDesc {
    /// Buffer address.
    pub addr: u64,
    /// Buffer length.
    pub len: u32,
    /// Descriptor flags.
    pub flags: u16,
    /// Next descriptor index if NEXT flag is set.
    pub next: u16,
}

/// Used ring element (`struct vring_used_elem`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct VringUsedElem {
    /// Index of the descriptor chain head.
    pub id: u32,
    /// Total bytes written to buffer.
    pub len: u32,
}

/// Available/used ring header (flags + idx).
const RING_HEADER_SIZE: usize = 2 * size_of::<u16>();

/// Trailing event index field.
const EVENT_FIELD_SIZE: usize = size_of::<u16>();

/// Where a vring lives and how it is shaped.
///
/// Described once when the link's ring memory is laid out; the provisioner
/// reads it but never changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VringAllocInfo {
    /// Virtual base address of the ring.
    pub vaddr: usize,
    /// Alignment of the used ring.
    pub align: usize,
    /// Number of descriptors.
    pub num_descs: u16,
}

impl VringAllocInfo {
    pub const fn new(vaddr: usize, align: usize, num_descs: u16) -> Self {
        VringAllocInfo {
            vaddr,
            align,
            num_descs,
        }
    }

    /// Layout of this ring, or `None` if it does not fit in the address
    /// space.
    pub fn layout(&self) -> Option<VringLayout> {
        VringLayout::new(self.num_descs as usize, self.align)
    }

    /// Total bytes covered by this ring.
    pub fn size(&self) -> Option<usize> {
        vring_size(self.num_descs as usize, self.align)
    }
}

/// Byte offsets of the three ring areas, relative to the ring base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VringLayout {
    pub desc_len: usize,
    pub avail_offset: usize,
    pub avail_len: usize,
    pub used_offset: usize,
    pub used_len: usize,
    pub total_len: usize,
}

impl VringLayout {
    /// Compute the layout for `num` descriptors with the used ring aligned
    /// to `align`. An alignment of 0 or 1 adds no padding.
    ///
    /// Returns `None` when any offset overflows `usize`.
    pub fn new(num: usize, align: usize) -> Option<Self> {
        let desc_len = num.checked_mul(size_of::<VringDesc>())?;
        let avail_offset = desc_len;
        let avail_len = num
            .checked_mul(size_of::<u16>())?
            .checked_add(RING_HEADER_SIZE + EVENT_FIELD_SIZE)?;
        let used_offset = align_up(avail_offset.checked_add(avail_len)?, align)?;
        let used_len = num
            .checked_mul(size_of::<VringUsedElem>())?
            .checked_add(RING_HEADER_SIZE + EVENT_FIELD_SIZE)?;

        Some(VringLayout {
            desc_len,
            avail_offset,
            avail_len,
            used_offset,
            used_len,
            total_len: used_offset.checked_add(used_len)?,
        })
    }
}

/// Number of bytes a split vring with `num` descriptors occupies.
pub fn vring_size(num: usize, align: usize) -> Option<usize> {
    VringLayout::new(num, align).map(|layout| layout.total_len)
}

#[inline]
fn align_up(value: usize, align: usize) -> Option<usize> {
    if align <= 1 {
        Some(value)
    } else {
        value.checked_next_multiple_of(align)
    }
}
