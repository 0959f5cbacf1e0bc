//! # peview-core
//!
//! Shared leaf types for the peview PE reader: the hierarchical report
//! protocol with its text and JSON renderers, and the PE constant tables
//! (machine types, subsystems, characteristics bit-flags, resource types,
//! data-directory names).

pub mod directory;
pub mod flags;
pub mod machine;
pub mod report;
pub mod resource_type;
pub mod subsystem;

pub use directory::{
    directory_name, DATA_DIRECTORY_COUNT, DIRECTORY_CERTIFICATE, DIRECTORY_DEBUG,
    DIRECTORY_EXPORT, DIRECTORY_IMPORT, DIRECTORY_RESOURCE,
};
pub use flags::{format_flags, CoffCharacteristics, DllCharacteristics, SectionCharacteristics};
pub use machine::Machine;
pub use report::{JsonReport, Report, TextReport, Value, ValueKind};
pub use resource_type::ResourceType;
pub use subsystem::Subsystem;
