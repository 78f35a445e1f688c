/*
 * Domain sanitizer. A domain coming from the platform is checked step by step before it may be
 * registered:
 *  - its possible harts exist on the platform;
 *  - every region is naturally aligned with 3 <= order <= XLEN;
 *  - the firmware region is present, bit for bit;
 *  - no region nests inside another one with the same flags;
 *  - regions are then sorted by (order, base), most specific first;
 *  - the next stage runs in S-mode or U-mode from an executable address.
 * The first failing check rejects the whole domain.
 */

use crate::{
    access::AccessFlags,
    domain::{Domain, PrivilegeMode},
    ensure,
    error::{DomainError, InvalidReason},
    platform::Platform,
    region::MemRegion,
};

pub fn sanitize<P: Platform + ?Sized>(
    domain: &mut Domain,
    platform: &P,
    firmware_region: &MemRegion,
) -> Result<(), DomainError> {
    // Check possible HARTs
    ensure!(
        !domain.possible_harts.is_empty(),
        InvalidReason::NoPossibleHarts
    )?;
    if let Some(hartid) = domain
        .possible_harts
        .iter()
        .find(|h| !platform.is_hart_valid(*h))
    {
        return Err(InvalidReason::InvalidHart(hartid).into());
    }

    // Check memory regions
    if let Some(region) = domain.regions.iter().find(|r| !r.is_valid()) {
        return Err(InvalidReason::MisalignedRegion {
            base: region.base,
            order: region.order,
        }
        .into());
    }

    ensure!(
        domain.regions.iter().any(|r| r == firmware_region),
        InvalidReason::MissingFirmwareRegion
    )?;

    let regions = &domain.regions;
    for (first, a) in regions.iter().enumerate() {
        for (second, b) in regions.iter().enumerate().skip(first + 1) {
            ensure!(
                !a.conflicts_with(b),
                InvalidReason::ConflictingRegions { first, second }
            )?;
        }
    }

    domain.regions.sort_unstable_by_key(MemRegion::sort_key);

    // Only S-mode or U-mode may follow, so machine mode state stays out of reach and every
    // access of the next stage goes through the region checks.
    ensure!(
        matches!(
            domain.next_mode,
            PrivilegeMode::Supervisor | PrivilegeMode::User
        ),
        InvalidReason::IllegalNextMode
    )?;

    ensure!(
        domain.check_addr(domain.next_addr, domain.next_mode, AccessFlags::EXECUTE),
        InvalidReason::NextAddressNotExecutable(domain.next_addr)
    )?;

    Ok(())
}
