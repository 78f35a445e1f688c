#![cfg_attr(not(test), no_std)]

pub mod sbi {
    // Standard SBI error codes
    pub const SBI_SUCCESS: isize = 0;
    pub const SBI_ERR_FAILED: isize = -1;
    pub const SBI_ERR_NOT_SUPPORTED: isize = -2;
    pub const SBI_ERR_INVALID_PARAM: isize = -3;
    pub const SBI_ERR_DENIED: isize = -4;
    pub const SBI_ERR_INVALID_ADDRESS: isize = -5;
    pub const SBI_ERR_ALREADY_AVAILABLE: isize = -6;
    pub const SBI_ERR_ALREADY_STARTED: isize = -7;
    pub const SBI_ERR_ALREADY_STOPPED: isize = -8;

    // Firmware internal aliases
    pub const SBI_OK: isize = SBI_SUCCESS;
    pub const SBI_EFAIL: isize = SBI_ERR_FAILED;
    pub const SBI_ENOTSUPP: isize = SBI_ERR_NOT_SUPPORTED;
    pub const SBI_EINVAL: isize = SBI_ERR_INVALID_PARAM;
    pub const SBI_EDENIED: isize = SBI_ERR_DENIED;
    pub const SBI_EINVALID_ADDR: isize = SBI_ERR_INVALID_ADDRESS;
    pub const SBI_EALREADY: isize = SBI_ERR_ALREADY_AVAILABLE;
    pub const SBI_EALREADY_STARTED: isize = SBI_ERR_ALREADY_STARTED;
    pub const SBI_EALREADY_STOPPED: isize = SBI_ERR_ALREADY_STOPPED;

    pub const SBI_ENODEV: isize = -1000;
    pub const SBI_ENOSYS: isize = -1001;
    pub const SBI_ETIMEDOUT: isize = -1002;
    pub const SBI_EIO: isize = -1003;
    pub const SBI_EILL: isize = -1004;
    pub const SBI_ENOSPC: isize = -1005;
    pub const SBI_ENOMEM: isize = -1006;
    pub const SBI_ETRAP: isize = -1007;

    // Privilege levels as encoded in mstatus.MPP
    pub const PRV_U: usize = 0;
    pub const PRV_S: usize = 1;
    pub const PRV_M: usize = 3;

    // RFENCE extension, serviced through the remote TLB flush queue
    pub const SBI_EXT_RFENCE: usize = 0x52464E43;
    pub const SBI_EXT_RFENCE_REMOTE_FENCE_I: usize = 0;
    pub const SBI_EXT_RFENCE_REMOTE_SFENCE_VMA: usize = 1;
    pub const SBI_EXT_RFENCE_REMOTE_SFENCE_VMA_ASID: usize = 2;
    pub const SBI_EXT_RFENCE_REMOTE_HFENCE_GVMA_VMID: usize = 3;
    pub const SBI_EXT_RFENCE_REMOTE_HFENCE_GVMA: usize = 4;
    pub const SBI_EXT_RFENCE_REMOTE_HFENCE_VVMA_ASID: usize = 5;
    pub const SBI_EXT_RFENCE_REMOTE_HFENCE_VVMA: usize = 6;
}
