/*
 * PMP plan of a domain. Every region becomes one NAPOT entry, in the order the sanitizer left
 * them, so the lowest numbered matching entry is the first matching region. Regions that also
 * bind machine mode are locked.
 *
 * The plan only computes register values, programming the CSRs is up to the hart bring-up code.
 * Source: https://www.five-embeddev.com/riscv-priv-isa-manual/latest-adoc/machine.html#pmp
 */

use riscv::register::{Permission, Range};

use crate::{
    domain::Domain,
    error::{DomainError, InvalidReason, Table},
    region::{MemRegion, RegionFlags},
    MAX_PMP_ENTRIES, XLEN,
};

const PMP_LOCK: u8 = 1 << 7;
const PMP_SHIFT: u32 = 2;

/// Entries held by one `pmpcfg` register on RV64.
const ENTRIES_PER_CFG: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PmpEntry {
    pub cfg: u8,
    pub addr: usize,
}

impl PmpEntry {
    /// Encodes a region, which must be valid (`3 <= order <= XLEN`, naturally aligned).
    pub fn napot(region: &MemRegion) -> Result<Self, DomainError> {
        if !region.is_valid() {
            return Err(InvalidReason::MisalignedRegion {
                base: region.base,
                order: region.order,
            }
            .into());
        }

        let permission = permission(region.flags);
        let locked = region.flags.contains(RegionFlags::MMODE);
        let cfg = (locked as u8) * PMP_LOCK | (Range::NAPOT as u8) << 3 | permission as u8;

        let addr = if region.order >= XLEN {
            usize::MAX
        } else {
            let ones = (1usize << (region.order - 3)) - 1;
            (region.base >> PMP_SHIFT) | ones
        };

        Ok(Self { cfg, addr })
    }

    pub fn is_locked(&self) -> bool {
        self.cfg & PMP_LOCK != 0
    }
}

fn permission(flags: RegionFlags) -> Permission {
    let r = flags.contains(RegionFlags::READABLE);
    let w = flags.contains(RegionFlags::WRITEABLE);
    let x = flags.contains(RegionFlags::EXECUTABLE);
    match (r, w, x) {
        (false, false, false) => Permission::NONE,
        (true, false, false) => Permission::R,
        (false, true, false) => Permission::W,
        (true, true, false) => Permission::RW,
        (false, false, true) => Permission::X,
        (true, false, true) => Permission::RX,
        (false, true, true) => Permission::WX,
        (true, true, true) => Permission::RWX,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PmpPlan {
    entries: heapless::Vec<PmpEntry, MAX_PMP_ENTRIES>,
}

impl PmpPlan {
    /// Plans the entries of a sanitized domain on a hart implementing `pmp_count` entries.
    pub fn for_domain(domain: &Domain, pmp_count: usize) -> Result<Self, DomainError> {
        let limit = pmp_count.min(MAX_PMP_ENTRIES);
        if domain.regions.len() > limit {
            log::warn!(
                "domain {}: {} regions but only {} PMP entries",
                domain.name,
                domain.regions.len(),
                limit
            );
            return Err(DomainError::CapacityExceeded(Table::PmpEntries));
        }

        let mut entries = heapless::Vec::new();
        for region in domain.regions.iter() {
            entries
                .push(PmpEntry::napot(region)?)
                .map_err(|_| DomainError::CapacityExceeded(Table::PmpEntries))?;
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PmpEntry] {
        &self.entries
    }

    /// Value of the `n`-th even `pmpcfg` register: entries `8n .. 8n + 8`, entry `8n` in the
    /// lowest byte. Unused entries stay off.
    pub fn cfg_word(&self, n: usize) -> usize {
        self.entries
            .iter()
            .skip(n * ENTRIES_PER_CFG)
            .take(ENTRIES_PER_CFG)
            .enumerate()
            .fold(0, |word, (slot, entry)| {
                word | (entry.cfg as usize) << (8 * slot)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PrivilegeMode;

    fn domain(regions: &[MemRegion]) -> Domain {
        Domain::new("pmp", [0].into_iter().collect())
            .with_boot(0, 0x8020_0000, PrivilegeMode::Supervisor, 0)
            .with_regions(regions.iter().copied())
            .unwrap()
    }

    #[test]
    fn firmware_entry_blocks_everything() {
        let entry = PmpEntry::napot(&MemRegion::firmware(0x8000_0000, 0x2_0000)).unwrap();
        // A = NAPOT, no permissions, unlocked
        assert_eq!(entry.cfg, 0x18);
        assert_eq!(entry.addr, (0x8000_0000 >> 2) | 0x3fff);
        assert!(!entry.is_locked());
    }

    #[test]
    fn catch_all_entry() {
        let entry = PmpEntry::napot(&MemRegion::catch_all()).unwrap();
        assert_eq!(entry.cfg, 0x1f);
        assert_eq!(entry.addr, usize::MAX);
    }

    #[test]
    fn smallest_region() {
        let entry = PmpEntry::napot(&MemRegion::new(0x1000, 3, RegionFlags::READABLE)).unwrap();
        assert_eq!(entry.cfg, 0x19);
        assert_eq!(entry.addr, 0x400);
    }

    #[test]
    fn machine_regions_are_locked() {
        let entry = PmpEntry::napot(&MemRegion::new(
            0x1000_0000,
            12,
            RegionFlags::MMODE | RegionFlags::READABLE | RegionFlags::WRITEABLE | RegionFlags::MMIO,
        ))
        .unwrap();
        assert!(entry.is_locked());
        assert_eq!(entry.cfg, 0x80 | 0x18 | 0x3);
    }

    #[test]
    fn plan_follows_region_order() {
        let fw = MemRegion::firmware(0x8000_0000, 0x2_0000);
        let uart = MemRegion::new(0x1000_0000, 12, RegionFlags::MMIO | RegionFlags::READABLE);
        let plan = PmpPlan::for_domain(&domain(&[uart, fw, MemRegion::catch_all()]), 16).unwrap();

        let entries = plan.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], PmpEntry::napot(&uart).unwrap());
        assert_eq!(entries[1], PmpEntry::napot(&fw).unwrap());
        assert_eq!(entries[2].addr, usize::MAX);

        assert_eq!(plan.cfg_word(0), 0x19 | 0x18 << 8 | 0x1f << 16);
        assert_eq!(plan.cfg_word(1), 0);
    }

    #[test]
    fn cfg_word_packs_eight_entries() {
        let regions: Vec<MemRegion> = (0..10)
            .map(|i| MemRegion::new(i << 12, 12, RegionFlags::READABLE))
            .collect();
        let plan = PmpPlan::for_domain(&domain(&regions), 16).unwrap();

        assert_eq!(plan.cfg_word(0), 0x1919_1919_1919_1919);
        assert_eq!(plan.cfg_word(1), 0x1919);
    }

    #[test]
    fn invalid_regions_are_refused() {
        let tiny = MemRegion::new(0x1000, 2, RegionFlags::READABLE);
        assert_eq!(
            PmpEntry::napot(&tiny),
            Err(DomainError::InvalidConfiguration(
                InvalidReason::MisalignedRegion {
                    base: 0x1000,
                    order: 2
                }
            ))
        );

        let fw = MemRegion::firmware(0x8000_0000, 0x2_0000);
        let misaligned = MemRegion::new(0x1800, 12, RegionFlags::READABLE);
        assert_eq!(
            PmpPlan::for_domain(&domain(&[fw, tiny]), 16),
            Err(DomainError::InvalidConfiguration(
                InvalidReason::MisalignedRegion {
                    base: 0x1000,
                    order: 2
                }
            ))
        );
        assert_eq!(
            PmpPlan::for_domain(&domain(&[misaligned, fw]), 16),
            Err(DomainError::InvalidConfiguration(
                InvalidReason::MisalignedRegion {
                    base: 0x1800,
                    order: 12
                }
            ))
        );
    }

    #[test]
    fn too_many_regions() {
        let fw = MemRegion::firmware(0x8000_0000, 0x2_0000);
        let d = domain(&[fw, MemRegion::catch_all()]);

        assert_eq!(
            PmpPlan::for_domain(&d, 1),
            Err(DomainError::CapacityExceeded(Table::PmpEntries))
        );
        assert!(PmpPlan::for_domain(&d, 2).is_ok());
    }
}
