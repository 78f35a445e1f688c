/*
 * Supervisor domain engine for the machine mode firmware. A domain is a set of harts plus a set
 * of memory regions with permissions. At cold boot the firmware builds the root domain, asks the
 * platform which domain owns each hart, validates every discovered domain and finally starts the
 * boot hart of each domain. After that the registry never changes and the trap path consults it
 * through `check_addr` on every intercepted access.
 */
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod access;
pub mod boot;
pub mod debug;
pub mod domain;
pub mod error;
pub mod finalize;
pub mod hartmask;
pub mod platform;
pub mod pmp;
pub mod region;
pub mod registry;
pub mod sanitize;
pub mod tlb;

pub use access::AccessFlags;
pub use domain::{Domain, PrivilegeMode};
pub use error::{DomainError, InvalidReason, Table};
pub use finalize::finalize;
pub use hartmask::HartMask;
pub use platform::{BootParams, HartStarter, NextStage, Platform};
pub use region::{MemRegion, RegionFlags, RegionTable};
pub use registry::{Registry, RegistryBuilder};
pub use sanitize::sanitize;

/// Native address width in bits.
pub const XLEN: u32 = usize::BITS;

/// Number of hart ids the firmware can track.
pub const MAX_HARTS: usize = 128;

/// Number of domains the registry can hold, root domain included.
pub const MAX_DOMAINS: usize = 32;

/// Number of memory regions a single domain can declare.
pub const MAX_REGIONS: usize = 16;

/// Number of PMP entries a plan can describe.
pub const MAX_PMP_ENTRIES: usize = 64;
