//! Characteristics bit-flag sets.
//!
//! Unknown bits are retained verbatim; the renderers show them as a hex
//! remainder after the named flags.

use bitflags::{bitflags, Bits, Flags};

bitflags! {
    /// COFF file header characteristics.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CoffCharacteristics: u16 {
        /// File contains no base relocations and must load at its preferred base.
        const RELOCS_STRIPPED = 0x0001;
        /// Image is valid and can be run.
        const EXECUTABLE_IMAGE = 0x0002;
        const LINE_NUMS_STRIPPED = 0x0004;
        const LOCAL_SYMS_STRIPPED = 0x0008;
        const AGGRESSIVE_WS_TRIM = 0x0010;
        /// Application can handle > 2-GB addresses.
        const LARGE_ADDRESS_AWARE = 0x0020;
        const RESERVED = 0x0040;
        const BYTES_REVERSED_LO = 0x0080;
        const MACHINE_32BIT = 0x0100;
        const DEBUG_STRIPPED = 0x0200;
        const REMOVABLE_RUN_FROM_SWAP = 0x0400;
        const NET_RUN_FROM_SWAP = 0x0800;
        const SYSTEM = 0x1000;
        const DLL = 0x2000;
        const UP_SYSTEM_ONLY = 0x4000;
        const BYTES_REVERSED_HI = 0x8000;
    }
}

bitflags! {
    /// DLL characteristics from the optional header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DllCharacteristics: u16 {
        const HIGH_ENTROPY_VA = 0x0020;
        const DYNAMIC_BASE = 0x0040;
        const FORCE_INTEGRITY = 0x0080;
        const NX_COMPAT = 0x0100;
        const NO_ISOLATION = 0x0200;
        const NO_SEH = 0x0400;
        const NO_BIND = 0x0800;
        const APPCONTAINER = 0x1000;
        const WDM_DRIVER = 0x2000;
        const GUARD_CF = 0x4000;
        const TERMINAL_SERVER_AWARE = 0x8000;
    }
}

bitflags! {
    /// Section header characteristics.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SectionCharacteristics: u32 {
        const TYPE_NO_PAD = 0x0000_0008;
        /// Section contains executable code.
        const CNT_CODE = 0x0000_0020;
        const CNT_INITIALIZED_DATA = 0x0000_0040;
        const CNT_UNINITIALIZED_DATA = 0x0000_0080;
        const LNK_OTHER = 0x0000_0100;
        const LNK_INFO = 0x0000_0200;
        const LNK_REMOVE = 0x0000_0800;
        const LNK_COMDAT = 0x0000_1000;
        const GPREL = 0x0000_8000;
        // MEM_16BIT aliases MEM_PURGEABLE in winnt.h
        const MEM_PURGEABLE = 0x0002_0000;
        const MEM_LOCKED = 0x0004_0000;
        const MEM_PRELOAD = 0x0008_0000;
        const ALIGN_1BYTES = 0x0010_0000;
        const ALIGN_2BYTES = 0x0020_0000;
        const ALIGN_4BYTES = 0x0030_0000;
        const ALIGN_8BYTES = 0x0040_0000;
        const ALIGN_16BYTES = 0x0050_0000;
        const ALIGN_32BYTES = 0x0060_0000;
        const ALIGN_64BYTES = 0x0070_0000;
        const ALIGN_128BYTES = 0x0080_0000;
        const ALIGN_256BYTES = 0x0090_0000;
        const ALIGN_512BYTES = 0x00A0_0000;
        const ALIGN_1024BYTES = 0x00B0_0000;
        const ALIGN_2048BYTES = 0x00C0_0000;
        const ALIGN_4096BYTES = 0x00D0_0000;
        const ALIGN_8192BYTES = 0x00E0_0000;
        const LNK_NRELOC_OVFL = 0x0100_0000;
        const MEM_DISCARDABLE = 0x0200_0000;
        const MEM_NOT_CACHED = 0x0400_0000;
        const MEM_NOT_PAGED = 0x0800_0000;
        const MEM_SHARED = 0x1000_0000;
        /// Section can be executed as code.
        const MEM_EXECUTE = 0x2000_0000;
        const MEM_READ = 0x4000_0000;
        const MEM_WRITE = 0x8000_0000;
    }
}

/// Renders a flag set as `A | B | 0x…`, keeping bits outside the table.
pub fn format_flags<F: Flags>(flags: &F) -> String
where
    F::Bits: std::fmt::LowerHex,
{
    let mut parts: Vec<String> = flags.iter_names().map(|(name, _)| name.to_string()).collect();
    let unknown = flags.bits() & !F::all().bits();
    if unknown != F::Bits::EMPTY {
        parts.push(format!("{unknown:#x}"));
    }
    if parts.is_empty() {
        "(none)".to_string()
    } else {
        parts.join(" | ")
    }
}
