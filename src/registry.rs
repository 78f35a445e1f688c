/*
 * Domain registry. The registry holds the root domain plus every domain discovered at cold boot,
 * reachable both by hart id and by dense domain index. It is assembled by a `RegistryBuilder` on
 * the cold boot hart and, once published, is only ever handed out by shared reference.
 *
 * The root domain owns every valid hart and carries two regions:
 *  - the firmware region, inaccessible below machine mode;
 *  - a catch-all region granting read/write/execute on the whole address space.
 */

use crate::{
    domain::Domain,
    error::{DomainError, Table},
    hartmask::HartMask,
    platform::{BootParams, Platform},
    region::MemRegion,
    MAX_DOMAINS, MAX_HARTS,
};

#[derive(Debug)]
pub struct Registry {
    domains: heapless::Vec<Domain, MAX_DOMAINS>,
    hart_domain: [Option<usize>; MAX_HARTS],
    firmware_region: MemRegion,
}

impl Registry {
    pub fn domain(&self, index: usize) -> Option<&Domain> {
        self.domains.get(index)
    }

    /// Registered domains in index order.
    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    pub fn root(&self) -> &Domain {
        &self.domains[0]
    }

    pub fn domain_for_hart(&self, hartid: usize) -> Option<&Domain> {
        self.domain_index_for_hart(hartid)
            .and_then(|index| self.domains.get(index))
    }

    pub fn domain_index_for_hart(&self, hartid: usize) -> Option<usize> {
        self.hart_domain.get(hartid).copied().flatten()
    }

    /// Copy of the firmware region every domain must contain.
    pub fn firmware_region(&self) -> MemRegion {
        self.firmware_region
    }

    pub fn is_assigned_hart(&self, index: usize, hartid: usize) -> bool {
        self.domain(index)
            .is_some_and(|d| d.is_assigned_hart(hartid))
    }

    pub fn assigned_hartmask(&self, index: usize, hbase: usize) -> usize {
        self.domain(index)
            .map_or(0, |d| d.assigned_hartmask(hbase))
    }

    pub fn dump(&self) {
        for domain in self.domains.iter() {
            domain.dump();
        }
    }
}

/// Registry under construction. Discovery fills it on the cold boot hart before it is published.
pub struct RegistryBuilder<'p> {
    pub(crate) registry: Registry,
    /// Platform description each registered domain was copied from, by domain index. The root
    /// domain has none.
    sources: heapless::Vec<Option<&'p Domain>, MAX_DOMAINS>,
}

impl<'p> RegistryBuilder<'p> {
    /// Builds the root domain from the cold boot parameters and maps every valid hart to it.
    pub fn new<P: Platform + ?Sized>(
        platform: &P,
        boot: &BootParams,
        cold_hartid: usize,
    ) -> Result<Self, DomainError> {
        let firmware_region = MemRegion::firmware(boot.fw_start, boot.fw_size);

        let harts: HartMask = (0..MAX_HARTS)
            .filter(|h| platform.is_hart_valid(*h))
            .collect();

        let mut root = Domain::new("root", harts)
            .with_boot(cold_hartid, boot.next.addr, boot.next.mode, boot.next.arg1)
            .with_system_reset(true)
            .with_regions([firmware_region, MemRegion::catch_all()])?;
        root.assigned_harts = harts;
        root.index = 0;

        let mut registry = Registry {
            domains: heapless::Vec::new(),
            hart_domain: [None; MAX_HARTS],
            firmware_region,
        };
        for hartid in harts.iter() {
            registry.hart_domain[hartid] = Some(0);
        }
        registry
            .domains
            .push(root)
            .map_err(|_| DomainError::CapacityExceeded(Table::Domains))?;

        let mut sources = heapless::Vec::new();
        sources
            .push(None)
            .map_err(|_| DomainError::CapacityExceeded(Table::Domains))?;

        Ok(Self { registry, sources })
    }

    /// Index of the domain copied from `source`, if it was registered already.
    pub(crate) fn find(&self, source: &Domain) -> Option<usize> {
        self.sources
            .iter()
            .position(|s| s.is_some_and(|s| core::ptr::eq(s, source)))
    }

    /// Appends an already sanitized domain, giving it the next index. Its assigned harts start
    /// out empty.
    pub(crate) fn register(
        &mut self,
        source: &'p Domain,
        mut domain: Domain,
    ) -> Result<usize, DomainError> {
        let index = self.registry.domains.len();
        domain.index = index;
        domain.assigned_harts.clear_all();

        self.registry
            .domains
            .push(domain)
            .map_err(|_| DomainError::CapacityExceeded(Table::Domains))?;
        self.sources
            .push(Some(source))
            .map_err(|_| DomainError::CapacityExceeded(Table::Domains))?;
        Ok(index)
    }

    /// Moves `hartid` into domain `index` if the domain may run on it.
    pub(crate) fn assign(&mut self, hartid: usize, index: usize) {
        let Some(domain) = self.registry.domains.get(index) else {
            return;
        };
        if hartid >= MAX_HARTS || !domain.possible_harts.test(hartid) {
            return;
        }

        if let Some(previous) = self.registry.hart_domain[hartid] {
            self.registry.domains[previous].assigned_harts.clear(hartid);
        }
        self.registry.hart_domain[hartid] = Some(index);
        self.registry.domains[index].assigned_harts.set(hartid);
    }

    pub(crate) fn domain_count(&self) -> usize {
        self.registry.domains.len()
    }

    pub(crate) fn firmware_region(&self) -> MemRegion {
        self.registry.firmware_region
    }

    pub(crate) fn build(self) -> Registry {
        self.registry
    }
}
