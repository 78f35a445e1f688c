/*
 * Interfaces to the rest of the firmware. The platform describes which harts exist and which
 * domain owns each of them, the hart starter brings a remote hart up at a given entry point and
 * the boot parameters are what the earlier boot stage left for the cold boot hart.
 */

use crate::domain::{Domain, PrivilegeMode};

pub trait Platform {
    fn is_hart_valid(&self, hartid: usize) -> bool;

    /// Domain description owning `hartid`. `None` keeps the hart in the root domain.
    ///
    /// Domains are told apart by the address of the returned description, so a platform must
    /// hand out the same reference every time it means the same domain.
    fn domain_for_hart(&self, hartid: usize) -> Option<&Domain>;

    /// Whether machine mode faults may be delegated to the next stage. Only hart bring-up reads
    /// this.
    fn allows_mfault_delegation(&self) -> bool {
        true
    }
}

pub trait HartStarter {
    /// Starts `hartid` at `addr` in `mode` with `arg1` in a1. Errors are SBI error codes.
    fn start_hart(
        &mut self,
        hartid: usize,
        addr: usize,
        mode: PrivilegeMode,
        arg1: usize,
    ) -> Result<(), isize>;
}

/// Where the cold boot hart continues once the firmware is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextStage {
    pub addr: usize,
    pub mode: PrivilegeMode,
    pub arg1: usize,
}

impl NextStage {
    pub fn of(domain: &Domain) -> Self {
        Self {
            addr: domain.next_addr,
            mode: domain.next_mode,
            arg1: domain.next_arg1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BootParams {
    pub fw_start: usize,
    pub fw_size: usize,
    pub next: NextStage,
}
