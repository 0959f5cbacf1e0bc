//! Section header decoder.

use peview_core::{format_flags, Report, SectionCharacteristics, Value, ValueKind};

use crate::{ByteCursor, PeError};

/// PE section header (40 bytes).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionHeader {
    /// Name, truncated at the first NUL and decoded permissively.
    pub name: String,
    pub virtual_size: u32,
    /// RVA of the section once mapped.
    pub virtual_address: u32,
    pub size_of_raw_data: u32,
    /// File offset of the section's raw data.
    pub pointer_to_raw_data: u32,
    pub pointer_to_relocations: u32,
    pub pointer_to_line_numbers: u32,
    pub number_of_relocations: u16,
    pub number_of_line_numbers: u16,
    pub characteristics: SectionCharacteristics,
}

impl SectionHeader {
    /// Decodes a section header at the cursor's current position.
    pub fn read(cur: &mut ByteCursor) -> Result<Self, PeError> {
        let raw_name = cur.read_bytes(8)?;
        let end = raw_name.iter().position(|&b| b == 0).unwrap_or(8);
        let name = String::from_utf8_lossy(&raw_name[..end]).into_owned();

        Ok(Self {
            name,
            virtual_size: cur.read_u32()?,
            virtual_address: cur.read_u32()?,
            size_of_raw_data: cur.read_u32()?,
            pointer_to_raw_data: cur.read_u32()?,
            pointer_to_relocations: cur.read_u32()?,
            pointer_to_line_numbers: cur.read_u32()?,
            number_of_relocations: cur.read_u16()?,
            number_of_line_numbers: cur.read_u16()?,
            characteristics: SectionCharacteristics::from_bits_retain(cur.read_u32()?),
        })
    }

    pub fn is_executable(&self) -> bool {
        self.characteristics.contains(SectionCharacteristics::MEM_EXECUTE)
    }

    pub fn is_writable(&self) -> bool {
        self.characteristics.contains(SectionCharacteristics::MEM_WRITE)
    }

    pub fn describe(&self, out: &mut dyn Report) {
        out.begin(&self.name);
        out.write("Virtual address", Value::Unsigned(self.virtual_address.into()), ValueKind::Address);
        out.write("Virtual size", Value::Unsigned(self.virtual_size.into()), ValueKind::Size);
        out.write("Data address", Value::Unsigned(self.pointer_to_raw_data.into()), ValueKind::Address);
        out.write("Data size", Value::Unsigned(self.size_of_raw_data.into()), ValueKind::Size);
        out.write(
            "Relocations address",
            Value::Unsigned(self.pointer_to_relocations.into()),
            ValueKind::Address,
        );
        out.write(
            "Relocations size",
            Value::Unsigned(self.number_of_relocations.into()),
            ValueKind::Size,
        );
        out.write(
            "Line numbers address",
            Value::Unsigned(self.pointer_to_line_numbers.into()),
            ValueKind::Address,
        );
        out.write(
            "Line numbers size",
            Value::Unsigned(self.number_of_line_numbers.into()),
            ValueKind::Size,
        );
        out.write(
            "Characteristics",
            Value::Symbolic {
                name: format_flags(&self.characteristics),
                value: self.characteristics.bits().into(),
            },
            ValueKind::Flags,
        );
        out.end();
    }
}
