//! Remote fence requests scoped to a domain.
//!
//! A request names the kind of fence and the range it covers. `request_domain_flush` hands it to
//! the flush queue once per `XLEN` wide window of harts assigned to the domain, the same shape the
//! RFENCE extension uses for its `hart_mask`/`hart_mask_base` pair.

use common::sbi::{
    SBI_EXT_RFENCE_REMOTE_FENCE_I, SBI_EXT_RFENCE_REMOTE_HFENCE_GVMA,
    SBI_EXT_RFENCE_REMOTE_HFENCE_GVMA_VMID, SBI_EXT_RFENCE_REMOTE_HFENCE_VVMA,
    SBI_EXT_RFENCE_REMOTE_HFENCE_VVMA_ASID, SBI_EXT_RFENCE_REMOTE_SFENCE_VMA,
    SBI_EXT_RFENCE_REMOTE_SFENCE_VMA_ASID,
};

use crate::{hartmask::HartMask, registry::Registry, MAX_HARTS};

/// Size (or start) meaning the whole address space.
pub const TLB_FLUSH_ALL: usize = usize::MAX;

/// Depth of each hart's flush queue.
pub const TLB_FIFO_NUM_ENTRIES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlbFlushKind {
    Vma,
    VmaAsid,
    Gvma,
    GvmaVmid,
    Vvma,
    VvmaAsid,
    Itlb,
}

impl TlbFlushKind {
    /// RFENCE function id requesting this kind of fence.
    pub fn function_id(self) -> usize {
        match self {
            Self::Vma => SBI_EXT_RFENCE_REMOTE_SFENCE_VMA,
            Self::VmaAsid => SBI_EXT_RFENCE_REMOTE_SFENCE_VMA_ASID,
            Self::Gvma => SBI_EXT_RFENCE_REMOTE_HFENCE_GVMA,
            Self::GvmaVmid => SBI_EXT_RFENCE_REMOTE_HFENCE_GVMA_VMID,
            Self::Vvma => SBI_EXT_RFENCE_REMOTE_HFENCE_VVMA,
            Self::VvmaAsid => SBI_EXT_RFENCE_REMOTE_HFENCE_VVMA_ASID,
            Self::Itlb => SBI_EXT_RFENCE_REMOTE_FENCE_I,
        }
    }

    pub fn from_function_id(fid: usize) -> Option<Self> {
        match fid {
            SBI_EXT_RFENCE_REMOTE_SFENCE_VMA => Some(Self::Vma),
            SBI_EXT_RFENCE_REMOTE_SFENCE_VMA_ASID => Some(Self::VmaAsid),
            SBI_EXT_RFENCE_REMOTE_HFENCE_GVMA => Some(Self::Gvma),
            SBI_EXT_RFENCE_REMOTE_HFENCE_GVMA_VMID => Some(Self::GvmaVmid),
            SBI_EXT_RFENCE_REMOTE_HFENCE_VVMA => Some(Self::Vvma),
            SBI_EXT_RFENCE_REMOTE_HFENCE_VVMA_ASID => Some(Self::VvmaAsid),
            SBI_EXT_RFENCE_REMOTE_FENCE_I => Some(Self::Itlb),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlbRequest {
    pub start: usize,
    pub size: usize,
    pub asid: usize,
    pub vmid: usize,
    pub kind: TlbFlushKind,
    /// Hart that issued the request.
    pub source: HartMask,
}

impl TlbRequest {
    pub fn new(
        start: usize,
        size: usize,
        asid: usize,
        vmid: usize,
        kind: TlbFlushKind,
        source_hartid: usize,
    ) -> Self {
        let mut source = HartMask::new();
        source.set(source_hartid);
        Self {
            start,
            size,
            asid,
            vmid,
            kind,
            source,
        }
    }

    pub fn is_full_flush(&self) -> bool {
        self.size == TLB_FLUSH_ALL || (self.start == 0 && self.size == 0)
    }
}

/// The remote flush queue. Errors are SBI error codes.
pub trait TlbQueue {
    fn request(&mut self, hmask: usize, hbase: usize, req: &TlbRequest) -> Result<(), isize>;
}

/// Queues `req` for every hart assigned to domain `index`. Returns how many windows were queued.
pub fn request_domain_flush<Q: TlbQueue + ?Sized>(
    registry: &Registry,
    index: usize,
    queue: &mut Q,
    req: &TlbRequest,
) -> Result<usize, isize> {
    let mut queued = 0;
    for hbase in (0..MAX_HARTS).step_by(usize::BITS as usize) {
        let hmask = registry.assigned_hartmask(index, hbase);
        if hmask == 0 {
            continue;
        }
        log::trace!(
            "{:?} flush for domain {}: hbase {} hmask 0x{:x}",
            req.kind,
            index,
            hbase,
            hmask
        );
        queue.request(hmask, hbase, req)?;
        queued += 1;
    }
    Ok(queued)
}
