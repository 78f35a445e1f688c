/*
 * Address access checks. The regions of a finalized domain are sorted from the most specific
 * (smallest) to the least specific, so the first region containing the address decides. Machine
 * mode only obeys regions flagged MMODE and is trusted everywhere else, while supervisor and user
 * mode are denied anything no region grants.
 */

use crate::{
    domain::{Domain, PrivilegeMode},
    region::RegionFlags,
};

bitflags::bitflags! {
    /// Kind of access being checked.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: usize {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const EXECUTE = 1 << 2;
        const MMIO = 1 << 3;
    }
}

impl AccessFlags {
    /// Region permissions an access of this kind requires.
    fn required(self) -> RegionFlags {
        let mut rwx = RegionFlags::empty();
        if self.contains(Self::READ) {
            rwx |= RegionFlags::READABLE;
        }
        if self.contains(Self::WRITE) {
            rwx |= RegionFlags::WRITEABLE;
        }
        if self.contains(Self::EXECUTE) {
            rwx |= RegionFlags::EXECUTABLE;
        }
        rwx
    }
}

/// Decides whether `domain` lets `mode` perform `access` on `addr`.
pub fn check_addr(domain: &Domain, addr: usize, mode: PrivilegeMode, access: AccessFlags) -> bool {
    let rwx = access.required();
    let mmio = access.contains(AccessFlags::MMIO);

    for region in domain.regions.iter() {
        if mode == PrivilegeMode::Machine && !region.flags.contains(RegionFlags::MMODE) {
            continue;
        }

        if region.contains(addr) {
            if mmio != region.is_mmio() {
                return false;
            }
            return region.flags.contains(rwx);
        }
    }

    mode == PrivilegeMode::Machine
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{hartmask::HartMask, region::MemRegion};

    fn domain(regions: &[MemRegion]) -> Domain {
        Domain::new("test", [0].into_iter().collect::<HartMask>())
            .with_regions(regions.iter().copied())
            .unwrap()
    }

    #[test]
    fn default_allow_machine_default_deny_others() {
        let d = domain(&[MemRegion::new(0x1000, 12, RegionFlags::RWX)]);

        for access in [AccessFlags::READ, AccessFlags::WRITE, AccessFlags::EXECUTE] {
            assert!(check_addr(&d, 0x9000, PrivilegeMode::Machine, access));
            assert!(!check_addr(&d, 0x9000, PrivilegeMode::Supervisor, access));
            assert!(!check_addr(&d, 0x9000, PrivilegeMode::User, access));
        }
    }

    #[test]
    fn empty_domain() {
        let d = domain(&[]);
        assert!(check_addr(&d, 0, PrivilegeMode::Machine, AccessFlags::READ));
        assert!(!check_addr(&d, 0, PrivilegeMode::User, AccessFlags::READ));
    }

    #[test]
    fn specific_region_overrides_catch_all() {
        let d = domain(&[
            MemRegion::new(0x1000, 12, RegionFlags::empty()),
            MemRegion::catch_all(),
        ]);

        assert!(!check_addr(&d, 0x1500, PrivilegeMode::User, AccessFlags::READ));
        assert!(check_addr(&d, 0x3000, PrivilegeMode::User, AccessFlags::READ));
        assert!(check_addr(&d, 0x3000, PrivilegeMode::Supervisor, AccessFlags::EXECUTE));
    }

    #[test]
    fn permissions_must_cover_request() {
        let d = domain(&[MemRegion::new(0x1000, 12, RegionFlags::READABLE)]);

        assert!(check_addr(&d, 0x1008, PrivilegeMode::Supervisor, AccessFlags::READ));
        assert!(!check_addr(&d, 0x1008, PrivilegeMode::Supervisor, AccessFlags::WRITE));
        assert!(!check_addr(
            &d,
            0x1008,
            PrivilegeMode::Supervisor,
            AccessFlags::READ | AccessFlags::WRITE
        ));
    }

    #[test]
    fn mmio_must_match() {
        let uart = MemRegion::new(
            0x1000_0000,
            12,
            RegionFlags::MMIO | RegionFlags::READABLE | RegionFlags::WRITEABLE,
        );
        let d = domain(&[uart, MemRegion::catch_all()]);

        let mmio_read = AccessFlags::MMIO | AccessFlags::READ;
        assert!(check_addr(&d, 0x1000_0010, PrivilegeMode::Supervisor, mmio_read));
        // plain memory access to an MMIO window stops at the window
        assert!(!check_addr(&d, 0x1000_0010, PrivilegeMode::Supervisor, AccessFlags::READ));
        // MMIO access to plain memory
        assert!(!check_addr(&d, 0x8000_0000, PrivilegeMode::Supervisor, mmio_read));
    }

    #[test]
    fn machine_mode_skips_regions_without_mmode() {
        let d = domain(&[
            MemRegion::new(0x1000, 12, RegionFlags::empty()),
            MemRegion::new(0x2000, 12, RegionFlags::MMODE | RegionFlags::READABLE),
            MemRegion::catch_all(),
        ]);

        // firmware-style region does not restrict machine mode
        assert!(check_addr(&d, 0x1000, PrivilegeMode::Machine, AccessFlags::WRITE));
        // MMODE region does
        assert!(check_addr(&d, 0x2000, PrivilegeMode::Machine, AccessFlags::READ));
        assert!(!check_addr(&d, 0x2000, PrivilegeMode::Machine, AccessFlags::WRITE));
        // supervisor mode is bound by both
        assert!(!check_addr(&d, 0x1000, PrivilegeMode::Supervisor, AccessFlags::READ));
        assert!(check_addr(&d, 0x2000, PrivilegeMode::Supervisor, AccessFlags::READ));
    }

    #[test]
    fn first_match_wins() {
        let d = domain(&[
            MemRegion::new(0x1000, 12, RegionFlags::READABLE),
            MemRegion::new(0x0, 16, RegionFlags::RWX),
        ]);
        assert!(!check_addr(&d, 0x1000, PrivilegeMode::User, AccessFlags::WRITE));
        assert!(check_addr(&d, 0x2000, PrivilegeMode::User, AccessFlags::WRITE));
    }
}
