/*
 * Cold boot entry of the domain engine and the globally published registry.
 *
 * The cold boot hart calls `cold_boot` exactly once, after the console is up and before any other
 * hart leaves the firmware. Warm harts and the trap path only ever read the registry through
 * `registry` and `hart_domain`.
 */

use spin::Once;

use crate::{
    domain::Domain,
    finalize::finalize,
    platform::{BootParams, HartStarter, Platform},
    registry::{Registry, RegistryBuilder},
};

pub static REGISTRY: Once<Registry> = Once::new();

/// Builds the root domain, discovers and starts every platform domain and leaves in
/// `boot.next` where the cold boot hart continues.
pub fn cold_boot<P, S>(
    platform: &P,
    starter: &mut S,
    boot: &mut BootParams,
    cold_hartid: usize,
) -> anyhow::Result<&'static Registry>
where
    P: Platform + ?Sized,
    S: HartStarter + ?Sized,
{
    log::info!(
        "firmware at 0x{:x} ({} bytes), cold boot on hart {}",
        boot.fw_start,
        boot.fw_size,
        cold_hartid
    );

    let builder = RegistryBuilder::new(platform, boot, cold_hartid)
        .map_err(|err| anyhow::anyhow!("root domain setup failed: {}", err))?;

    let registry = finalize(
        &REGISTRY,
        builder,
        platform,
        starter,
        cold_hartid,
        &mut boot.next,
    )
    .map_err(|err| anyhow::anyhow!("domain finalization failed: {}", err))?;

    registry.dump();
    log::info!(
        "{} domains ready, cold boot hart continues at 0x{:x} in {}",
        registry.domain_count(),
        boot.next.addr,
        boot.next.mode
    );

    Ok(registry)
}

/// The published registry, once cold boot got that far.
pub fn registry() -> Option<&'static Registry> {
    REGISTRY.get()
}

pub fn hart_domain(hartid: usize) -> Option<&'static Domain> {
    registry().and_then(|r| r.domain_for_hart(hartid))
}
