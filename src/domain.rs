use core::fmt;

use common::sbi::{PRV_M, PRV_S, PRV_U};
use riscv::register::mstatus::MPP;

use crate::{
    access::{self, AccessFlags},
    error::{DomainError, Table},
    hartmask::HartMask,
    region::{MemRegion, RegionTable},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum PrivilegeMode {
    User = PRV_U,
    Supervisor = PRV_S,
    Machine = PRV_M,
}

impl TryFrom<usize> for PrivilegeMode {
    type Error = usize;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            PRV_U => Ok(Self::User),
            PRV_S => Ok(Self::Supervisor),
            PRV_M => Ok(Self::Machine),
            other => Err(other),
        }
    }
}

impl From<PrivilegeMode> for MPP {
    fn from(mode: PrivilegeMode) -> Self {
        match mode {
            PrivilegeMode::User => MPP::User,
            PrivilegeMode::Supervisor => MPP::Supervisor,
            PrivilegeMode::Machine => MPP::Machine,
        }
    }
}

impl fmt::Display for PrivilegeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "U-mode",
            Self::Supervisor => "S-mode",
            Self::Machine => "M-mode",
        })
    }
}

/// An isolation unit: the harts that may run it, the memory they may touch and where its boot
/// hart enters after the firmware is done.
///
/// Platforms hand out domain descriptions; the registry keeps its own sanitized copy, with the
/// regions sorted into evaluation order and `assigned_harts` rebuilt by discovery.
#[derive(Debug, Clone)]
pub struct Domain {
    pub name: &'static str,
    pub possible_harts: HartMask,
    pub assigned_harts: HartMask,
    pub regions: RegionTable,
    pub boot_hartid: usize,
    pub next_addr: usize,
    pub next_mode: PrivilegeMode,
    pub next_arg1: usize,
    pub system_reset_allowed: bool,
    pub(crate) index: usize,
}

impl Domain {
    pub fn new(name: &'static str, possible_harts: HartMask) -> Self {
        Self {
            name,
            boot_hartid: possible_harts.iter().next().unwrap_or(0),
            possible_harts,
            assigned_harts: HartMask::new(),
            regions: RegionTable::new(),
            next_addr: 0,
            next_mode: PrivilegeMode::Supervisor,
            next_arg1: 0,
            system_reset_allowed: false,
            index: 0,
        }
    }

    pub fn with_boot(
        mut self,
        hartid: usize,
        next_addr: usize,
        next_mode: PrivilegeMode,
        next_arg1: usize,
    ) -> Self {
        self.boot_hartid = hartid;
        self.next_addr = next_addr;
        self.next_mode = next_mode;
        self.next_arg1 = next_arg1;
        self
    }

    pub fn with_system_reset(mut self, allowed: bool) -> Self {
        self.system_reset_allowed = allowed;
        self
    }

    pub fn with_regions<I>(mut self, regions: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = MemRegion>,
    {
        for region in regions {
            self.add_region(region)?;
        }
        Ok(self)
    }

    pub fn add_region(&mut self, region: MemRegion) -> Result<(), DomainError> {
        self.regions
            .push(region)
            .map_err(|_| DomainError::CapacityExceeded(Table::Regions))
    }

    /// Dense index assigned at registration; the root domain is always 0.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_assigned_hart(&self, hartid: usize) -> bool {
        self.assigned_harts.test(hartid)
    }

    /// Assigned harts as one word starting at hart `hbase`.
    pub fn assigned_hartmask(&self, hbase: usize) -> usize {
        self.assigned_harts.window(hbase)
    }

    pub fn allows_system_reset(&self) -> bool {
        self.system_reset_allowed
    }

    pub fn check_addr(&self, addr: usize, mode: PrivilegeMode, access: AccessFlags) -> bool {
        access::check_addr(self, addr, mode, access)
    }

    /// Prints the domain through the logger, one line per attribute.
    pub fn dump(&self) {
        let i = self.index;
        log::info!("Domain{} Name        : {}", i, self.name);
        log::info!("Domain{} Boot HART   : {}", i, self.boot_hartid);
        log::info!("Domain{} HARTs       : {}", i, HartList(self));
        for (j, region) in self.regions.iter().enumerate() {
            log::info!("Domain{} Region{:02}    : {}", i, j, region);
        }
        log::info!("Domain{} Next Address: 0x{:016x}", i, self.next_addr);
        log::info!("Domain{} Next Arg1   : 0x{:016x}", i, self.next_arg1);
        log::info!("Domain{} Next Mode   : {}", i, self.next_mode);
        log::info!(
            "Domain{} SysReset    : {}",
            i,
            if self.system_reset_allowed { "yes" } else { "no" }
        );
    }
}

/// Possible harts of a domain, assigned ones marked with `*`.
struct HartList<'a>(&'a Domain);

impl fmt::Display for HartList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, hartid) in self.0.possible_harts.iter().enumerate() {
            if n > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", hartid)?;
            if self.0.is_assigned_hart(hartid) {
                f.write_str("*")?;
            }
        }
        Ok(())
    }
}
