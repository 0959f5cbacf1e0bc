//! Data directory indices and conventional names.

/// Number of entries in a conventional data directory table.
pub const DATA_DIRECTORY_COUNT: usize = 16;

pub const DIRECTORY_EXPORT: usize = 0;
pub const DIRECTORY_IMPORT: usize = 1;
pub const DIRECTORY_RESOURCE: usize = 2;
pub const DIRECTORY_EXCEPTION: usize = 3;
pub const DIRECTORY_CERTIFICATE: usize = 4;
pub const DIRECTORY_BASERELOC: usize = 5;
pub const DIRECTORY_DEBUG: usize = 6;
pub const DIRECTORY_ARCHITECTURE: usize = 7;
pub const DIRECTORY_GLOBAL_PTR: usize = 8;
pub const DIRECTORY_TLS: usize = 9;
pub const DIRECTORY_LOAD_CONFIG: usize = 10;
pub const DIRECTORY_BOUND_IMPORT: usize = 11;
pub const DIRECTORY_IAT: usize = 12;
pub const DIRECTORY_DELAY_IMPORT: usize = 13;
pub const DIRECTORY_COM_DESCRIPTOR: usize = 14;
pub const DIRECTORY_RESERVED: usize = 15;

/// Conventional display name for a data directory slot.
pub fn directory_name(index: usize) -> &'static str {
    match index {
        DIRECTORY_EXPORT => ".edata",
        DIRECTORY_IMPORT => ".idata",
        DIRECTORY_RESOURCE => ".rsrc",
        DIRECTORY_EXCEPTION => ".pdata",
        DIRECTORY_CERTIFICATE => "Certificate",
        DIRECTORY_BASERELOC => ".reloc",
        DIRECTORY_DEBUG => ".debug",
        DIRECTORY_ARCHITECTURE => "Architecture",
        DIRECTORY_GLOBAL_PTR => "Global Ptr",
        DIRECTORY_TLS => ".tls",
        DIRECTORY_LOAD_CONFIG => "Load Config",
        DIRECTORY_BOUND_IMPORT => "Bound Import",
        DIRECTORY_IAT => "IAT",
        DIRECTORY_DELAY_IMPORT => "Delay Import Descriptor",
        DIRECTORY_COM_DESCRIPTOR => ".cormeta",
        DIRECTORY_RESERVED => "Zero",
        _ => "Unknown",
    }
}
