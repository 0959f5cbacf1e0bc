//! Decoders for the PE executable format.
//!
//! The crate parses a byte slice into typed headers (DOS, COFF, optional
//! header, section table, data directories), walks the resource directory
//! tree and extracts resource payloads. Decoding is strict: structural
//! rules are enforced with byte-exact error offsets, and nothing is ever
//! written back.
//!
//! ```no_run
//! use peview_format::PeFile;
//!
//! # fn main() -> Result<(), peview_format::PeError> {
//! let data = std::fs::read("app.exe")?;
//! let pe = PeFile::parse(&data)?;
//! if let Some(section) = pe.section(".rsrc") {
//!     let table = pe.resource_table(&data, section)?;
//!     for resource in &table.resources {
//!         println!("{} {} ({} bytes)", resource.kind.name(), resource.name, resource.size);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod cursor;
mod error;
mod headers;
mod optional;
mod pe;
mod rsrc;
mod section;

pub use cursor::ByteCursor;
pub use error::PeError;
pub use headers::{DosHeader, PeHeader, DOS_HEADER_SIZE, DOS_MAGIC, PE_SIGNATURE};
pub use optional::{
    OptionalHeader, StandardFields, WindowsFields, PE32PLUS_MAGIC, PE32_MAGIC,
};
pub use pe::{DataDirectory, PeFile};
pub use rsrc::{
    Resource, ResourceDataEntry, ResourceDirectory, ResourceDirectoryEntry, ResourceExtractor,
    ResourceKey, ResourcePayload, ResourceTable,
};
pub use section::SectionHeader;
