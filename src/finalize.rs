/*
 * Domain finalization, run once on the cold boot hart:
 *  - discovery: every valid hart, in ascending order, is handed to the domain the platform says
 *    owns it. A domain seen for the first time is sanitized and registered under the next index;
 *  - publication: the registry becomes immutable and globally visible;
 *  - start: the boot hart of every domain is started at the domain entry point. The cold boot
 *    hart only records its own continuation and jumps there after the firmware returns.
 * Remote harts are started strictly after publication, so no hart can ever look at a registry
 * that does not know its domain yet.
 */

use spin::Once;

use crate::{
    error::{DomainError, Table},
    platform::{HartStarter, NextStage, Platform},
    registry::{Registry, RegistryBuilder},
    sanitize::sanitize,
    MAX_DOMAINS, MAX_HARTS,
};

pub fn finalize<'p, P, S>(
    cell: &'static Once<Registry>,
    builder: RegistryBuilder<'p>,
    platform: &'p P,
    starter: &mut S,
    cold_hartid: usize,
    next: &mut NextStage,
) -> Result<&'static Registry, DomainError>
where
    P: Platform + ?Sized,
    S: HartStarter + ?Sized,
{
    if cell.is_completed() {
        return Err(DomainError::AlreadyFinalized);
    }

    let registry = discover(builder, platform)?;

    let mut published = false;
    let registry = cell.call_once(|| {
        published = true;
        registry
    });
    if !published {
        return Err(DomainError::AlreadyFinalized);
    }

    start_domains(registry, starter, cold_hartid, next)?;

    Ok(registry)
}

fn discover<'p, P>(
    mut builder: RegistryBuilder<'p>,
    platform: &'p P,
) -> Result<Registry, DomainError>
where
    P: Platform + ?Sized,
{
    for hartid in 0..MAX_HARTS {
        if !platform.is_hart_valid(hartid) {
            continue;
        }

        let Some(source) = platform.domain_for_hart(hartid) else {
            continue;
        };

        let index = match builder.find(source) {
            Some(index) => index,
            None => {
                if builder.domain_count() >= MAX_DOMAINS {
                    return Err(DomainError::CapacityExceeded(Table::Domains));
                }

                let mut domain = source.clone();
                let firmware_region = builder.firmware_region();
                sanitize(&mut domain, platform, &firmware_region).inspect_err(|err| {
                    log::error!("domain {} rejected: {}", source.name, err);
                })?;

                let index = builder.register(source, domain)?;
                log::debug!("domain {} registered at index {}", source.name, index);
                index
            }
        };

        builder.assign(hartid, index);
    }

    Ok(builder.build())
}

fn start_domains<S>(
    registry: &Registry,
    starter: &mut S,
    cold_hartid: usize,
    next: &mut NextStage,
) -> Result<(), DomainError>
where
    S: HartStarter + ?Sized,
{
    for domain in registry.domains() {
        let hartid = domain.boot_hartid;

        // Ignore if boot HART not possible for this domain
        if !domain.possible_harts.test(hartid) {
            log::warn!(
                "domain {}: boot hart {} is not a possible hart",
                domain.name,
                hartid
            );
            continue;
        }

        // Ignore if boot HART was assigned to a different domain
        if registry.domain_index_for_hart(hartid) != Some(domain.index())
            || !domain.is_assigned_hart(hartid)
        {
            log::warn!(
                "domain {}: boot hart {} belongs to another domain",
                domain.name,
                hartid
            );
            continue;
        }

        if hartid == cold_hartid {
            *next = NextStage::of(domain);
            log::debug!(
                "domain {}: cold boot hart continues at 0x{:x} in {}",
                domain.name,
                domain.next_addr,
                domain.next_mode
            );
        } else {
            starter
                .start_hart(hartid, domain.next_addr, domain.next_mode, domain.next_arg1)
                .map_err(|code| DomainError::StartFailure { hartid, code })?;
            log::debug!(
                "domain {}: started hart {} at 0x{:x} in {}",
                domain.name,
                hartid,
                domain.next_addr,
                domain.next_mode
            );
        }
    }

    Ok(())
}
