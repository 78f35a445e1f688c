use core::fmt;

use crate::{MAX_REGIONS, XLEN};

bitflags::bitflags! {
    /// Permissions and attributes attached to a memory region.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RegionFlags: usize {
        const READABLE = 1 << 0;
        const WRITEABLE = 1 << 1;
        const EXECUTABLE = 1 << 2;
        /// The region also constrains machine mode accesses.
        const MMODE = 1 << 3;
        const MMIO = 1 << 31;

        const RWX = Self::READABLE.bits() | Self::WRITEABLE.bits() | Self::EXECUTABLE.bits();
    }
}

/// Regions of a domain, bounded and length-known.
pub type RegionTable = heapless::Vec<MemRegion, MAX_REGIONS>;

/// A naturally aligned power of two memory range: `[base, base + 2^order)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemRegion {
    pub base: usize,
    pub order: u32,
    pub flags: RegionFlags,
}

/// Mask of the offset bits inside a region of the given order.
fn offset_mask(order: u32) -> usize {
    if order >= XLEN {
        usize::MAX
    } else {
        (1 << order) - 1
    }
}

/// Smallest order whose region can hold `size` bytes.
fn log2_roundup(size: usize) -> u32 {
    size.checked_next_power_of_two()
        .map_or(XLEN, |size| size.trailing_zeros())
}

impl MemRegion {
    pub const fn new(base: usize, order: u32, flags: RegionFlags) -> Self {
        Self { base, order, flags }
    }

    /// Region protecting the firmware image. Every domain must carry an identical copy of it.
    ///
    /// The size is rounded up to a power of two (never below 8 bytes) and the base is aligned
    /// down to it. No flags are set, so supervisor and user mode cannot touch it.
    pub fn firmware(fw_start: usize, fw_size: usize) -> Self {
        // NAPOT regions start at 8 bytes, anything smaller could never be valid
        let order = log2_roundup(fw_size).max(3);
        Self {
            base: fw_start & !offset_mask(order),
            order,
            flags: RegionFlags::empty(),
        }
    }

    /// Region spanning the whole address space with read, write and execute access.
    pub const fn catch_all() -> Self {
        Self {
            base: 0,
            order: XLEN,
            flags: RegionFlags::RWX,
        }
    }

    /// `3 <= order <= XLEN` and the base is aligned to the region size.
    pub fn is_valid(&self) -> bool {
        if self.order < 3 || self.order > XLEN {
            return false;
        }

        self.base & offset_mask(self.order) == 0
    }

    pub fn start(&self) -> usize {
        self.base
    }

    /// Last address covered by the region (inclusive).
    pub fn end(&self) -> usize {
        self.base.saturating_add(offset_mask(self.order))
    }

    pub fn contains(&self, addr: usize) -> bool {
        self.start() <= addr && addr <= self.end()
    }

    pub fn is_mmio(&self) -> bool {
        self.flags.contains(RegionFlags::MMIO)
    }

    /// Whether `self` lies entirely within `other`.
    pub fn is_subset_of(&self, other: &MemRegion) -> bool {
        other.start() <= self.start() && self.end() <= other.end()
    }

    /// Two regions conflict when one nests inside the other with the very same flags: the inner
    /// one then carves out nothing and the table is ambiguous.
    pub fn conflicts_with(&self, other: &MemRegion) -> bool {
        (self.is_subset_of(other) || other.is_subset_of(self)) && self.flags == other.flags
    }

    /// Evaluation order key: smaller regions first, then lower base. Regions over the same range
    /// are ordered by their flag bits so the order never depends on the input.
    pub fn sort_key(&self) -> (u32, usize, usize) {
        (self.order, self.base, self.flags.bits())
    }
}

impl fmt::Display for MemRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}-0x{:016x} ", self.start(), self.end())?;

        let names = [
            (RegionFlags::MMODE, 'M'),
            (RegionFlags::MMIO, 'I'),
            (RegionFlags::READABLE, 'R'),
            (RegionFlags::WRITEABLE, 'W'),
            (RegionFlags::EXECUTABLE, 'X'),
        ];

        let mut first = true;
        for (flag, name) in names {
            if self.flags.contains(flag) {
                write!(f, "{}{}", if first { '(' } else { ',' }, name)?;
                first = false;
            }
        }
        f.write_str(if first { "()" } else { ")" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firmware_region_is_rounded_and_aligned() {
        let fw = MemRegion::firmware(0x8000_0000, 0x1_8000);
        assert_eq!(fw.order, 17);
        assert_eq!(fw.base, 0x8000_0000);
        assert_eq!(fw.flags, RegionFlags::empty());

        let fw = MemRegion::firmware(0x8002_1000, 0x1_0000);
        assert_eq!(fw.order, 16);
        assert_eq!(fw.base, 0x8002_0000);
        assert!(fw.is_valid());
    }

    #[test]
    fn tiny_firmware_region_stays_valid() {
        let fw = MemRegion::firmware(0x1004, 1);
        assert_eq!(fw.order, 3);
        assert_eq!(fw.base, 0x1000);
        assert!(fw.is_valid());
    }

    #[test]
    fn catch_all_spans_everything() {
        let all = MemRegion::catch_all();
        assert!(all.is_valid());
        assert_eq!(all.start(), 0);
        assert_eq!(all.end(), usize::MAX);
        assert!(all.contains(0));
        assert!(all.contains(usize::MAX));
    }

    #[test]
    fn validity() {
        assert!(MemRegion::new(0x1000, 12, RegionFlags::RWX).is_valid());
        assert!(!MemRegion::new(0x1800, 12, RegionFlags::RWX).is_valid());
        assert!(!MemRegion::new(0x0, 2, RegionFlags::RWX).is_valid());
        assert!(!MemRegion::new(0x0, XLEN + 1, RegionFlags::RWX).is_valid());
        assert!(MemRegion::new(0x8, 3, RegionFlags::RWX).is_valid());
    }

    #[test]
    fn bounds_are_inclusive() {
        let r = MemRegion::new(0x1000, 12, RegionFlags::READABLE);
        assert_eq!(r.end(), 0x1fff);
        assert!(r.contains(0x1000));
        assert!(r.contains(0x1fff));
        assert!(!r.contains(0x2000));
        assert!(!r.contains(0xfff));
    }

    #[test]
    fn subset_uses_each_region_size() {
        let small = MemRegion::new(0x1000, 12, RegionFlags::RWX);
        let big = MemRegion::new(0x0, 16, RegionFlags::RWX);
        assert!(small.is_subset_of(&big));
        assert!(!big.is_subset_of(&small));
        assert!(small.is_subset_of(&small));

        let outside = MemRegion::new(0x1_0000, 12, RegionFlags::RWX);
        assert!(!outside.is_subset_of(&big));
    }

    #[test]
    fn conflicts_need_nesting_and_equal_flags() {
        let outer = MemRegion::new(0x0, 16, RegionFlags::RWX);
        let same_flags = MemRegion::new(0x1000, 12, RegionFlags::RWX);
        let carve_out = MemRegion::new(0x1000, 12, RegionFlags::READABLE);
        let disjoint = MemRegion::new(0x10_0000, 12, RegionFlags::RWX);

        assert!(outer.conflicts_with(&same_flags));
        assert!(same_flags.conflicts_with(&outer));
        assert!(!outer.conflicts_with(&carve_out));
        assert!(!outer.conflicts_with(&disjoint));
        assert!(same_flags.conflicts_with(&same_flags));
    }

    #[test]
    fn display_lists_flags() {
        let fw = MemRegion::new(0x8000_0000, 16, RegionFlags::empty());
        assert_eq!(
            fw.to_string(),
            "0x0000000080000000-0x000000008000ffff ()"
        );

        let uart = MemRegion::new(
            0x1000_0000,
            12,
            RegionFlags::MMIO | RegionFlags::READABLE | RegionFlags::WRITEABLE,
        );
        assert_eq!(
            uart.to_string(),
            "0x0000000010000000-0x0000000010000fff (I,R,W)"
        );
    }
}
