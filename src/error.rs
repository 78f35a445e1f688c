use common::sbi::{SBI_EALREADY, SBI_EINVAL, SBI_ENOSPC};
use thiserror::Error;

/// Why the sanitizer refused a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidReason {
    #[error("domain has no possible harts")]
    NoPossibleHarts,
    #[error("hart {0} is not valid on this platform")]
    InvalidHart(usize),
    #[error("region 0x{base:x} of order {order} is misaligned or out of range")]
    MisalignedRegion { base: usize, order: u32 },
    #[error("firmware region is missing")]
    MissingFirmwareRegion,
    #[error("regions {first} and {second} overlap with identical flags")]
    ConflictingRegions { first: usize, second: usize },
    #[error("next mode must be supervisor or user")]
    IllegalNextMode,
    #[error("next address 0x{0:x} is not executable in next mode")]
    NextAddressNotExecutable(usize),
}

/// Fixed capacity tables that can run out of room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Domains,
    Regions,
    PmpEntries,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid domain configuration: {0}")]
    InvalidConfiguration(#[from] InvalidReason),
    #[error("no space left in the {0:?} table")]
    CapacityExceeded(Table),
    #[error("failed to start hart {hartid} (sbi error {code})")]
    StartFailure { hartid: usize, code: isize },
    #[error("domains are already finalized")]
    AlreadyFinalized,
}

impl DomainError {
    /// SBI error code reported to the caller of the failed operation.
    pub fn to_sbi_error(&self) -> isize {
        match self {
            Self::InvalidConfiguration(_) => SBI_EINVAL,
            Self::CapacityExceeded(_) => SBI_ENOSPC,
            Self::StartFailure { code, .. } => *code,
            Self::AlreadyFinalized => SBI_EALREADY,
        }
    }
}
