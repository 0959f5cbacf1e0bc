//! Optional header decoder.
//!
//! The optional header has no fixed shape: the COFF header declares its
//! byte length, a magic selects 32-bit or 64-bit field widths, and the
//! declared length gates how far into the layout the fields actually go.
//! The decoder models this as a three-state variant so that "absent" and
//! "present but zero" stay distinguishable.

use peview_core::{format_flags, DllCharacteristics, Report, Subsystem, Value, ValueKind};

use crate::{ByteCursor, PeError};

/// PE32 optional header magic.
pub const PE32_MAGIC: u16 = 0x10B;
/// PE32+ (64-bit) optional header magic.
pub const PE32PLUS_MAGIC: u16 = 0x20B;

/// Fields shared by every present optional header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandardFields {
    /// True when the PE32+ magic selected the 64-bit layout.
    pub pe_plus: bool,
    pub major_linker_version: u8,
    pub minor_linker_version: u8,
    pub size_of_code: u32,
    pub size_of_initialized_data: u32,
    pub size_of_uninitialized_data: u32,
    pub address_of_entry_point: u32,
    pub base_of_code: u32,
    /// PE32 only; implicitly zero in the 64-bit layout.
    pub base_of_data: u32,
}

/// Windows-specific fields, present only past the short-COFF checkpoint.
///
/// The four pointer-width fields (`image_base` and the stack/heap pairs)
/// are 32 bits wide under PE32 and 64 bits wide under PE32+; both decode
/// into `u64`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowsFields {
    pub image_base: u64,
    pub section_alignment: u32,
    pub file_alignment: u32,
    pub major_operating_system_version: u16,
    pub minor_operating_system_version: u16,
    pub major_image_version: u16,
    pub minor_image_version: u16,
    pub major_subsystem_version: u16,
    pub minor_subsystem_version: u16,
    pub size_of_image: u32,
    pub size_of_headers: u32,
    pub check_sum: u32,
    pub subsystem: Subsystem,
    pub dll_characteristics: DllCharacteristics,
    pub size_of_stack_reserve: u64,
    pub size_of_stack_commit: u64,
    pub size_of_heap_reserve: u64,
    pub size_of_heap_commit: u64,
    /// Validated count of data directory entries that follow the header.
    pub number_of_rva_and_sizes: u32,
}

/// The optional header variant selected by the declared size.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OptionalHeader {
    /// Declared size zero; typical for object files.
    #[default]
    Absent,
    /// Exactly the short-COFF checkpoint (24 bytes for PE32+, 28 for PE32).
    Coff(StandardFields),
    /// Full header including the Windows-specific block.
    Windows(StandardFields, WindowsFields),
}

impl OptionalHeader {
    /// Decodes an optional header of the declared `size` at the cursor's
    /// position.
    pub fn read(cur: &mut ByteCursor, size: u16) -> Result<Self, PeError> {
        if size == 0 {
            return Ok(Self::Absent);
        }
        let size = u64::from(size);
        if size < 24 {
            return Err(PeError::malformed(
                cur.pos(),
                "optional header too short for standard fields",
            ));
        }

        let magic = cur.read_u16()?;
        let pe_plus = match magic {
            PE32_MAGIC => false,
            PE32PLUS_MAGIC => true,
            _ => {
                return Err(PeError::malformed(
                    cur.pos() - 2,
                    "invalid optional header magic",
                ))
            }
        };

        let mut standard = StandardFields {
            pe_plus,
            major_linker_version: cur.read_u8()?,
            minor_linker_version: cur.read_u8()?,
            size_of_code: cur.read_u32()?,
            size_of_initialized_data: cur.read_u32()?,
            size_of_uninitialized_data: cur.read_u32()?,
            address_of_entry_point: cur.read_u32()?,
            base_of_code: cur.read_u32()?,
            base_of_data: 0,
        };

        if !pe_plus {
            if size < 28 {
                return Err(PeError::malformed(
                    cur.pos(),
                    "optional header too short for PE32 base of data",
                ));
            }
            standard.base_of_data = cur.read_u32()?;
        }

        let checkpoint = if pe_plus { 24 } else { 28 };
        if size == checkpoint {
            return Ok(Self::Coff(standard));
        }

        // Fixed Windows block size, counted from the magic: 96 bytes under
        // PE32, 112 under PE32+ (the pointer-width fields grow).
        let windows_block = if pe_plus { 112 } else { 96 };
        let dirs_size = size.checked_sub(windows_block).ok_or_else(|| {
            PeError::malformed(cur.pos(), "optional header too short for windows fields")
        })?;

        let bits = if pe_plus { 64 } else { 32 };
        let mut windows = WindowsFields {
            image_base: cur.read_uint(bits)?,
            section_alignment: cur.read_u32()?,
            file_alignment: cur.read_u32()?,
            major_operating_system_version: cur.read_u16()?,
            minor_operating_system_version: cur.read_u16()?,
            major_image_version: cur.read_u16()?,
            minor_image_version: cur.read_u16()?,
            major_subsystem_version: cur.read_u16()?,
            minor_subsystem_version: cur.read_u16()?,
            ..WindowsFields::default()
        };

        let win32_version_value = cur.read_u32()?;
        if win32_version_value != 0 {
            return Err(PeError::malformed(cur.pos() - 4, "win32 version value must be zero"));
        }

        windows.size_of_image = cur.read_u32()?;
        windows.size_of_headers = cur.read_u32()?;
        windows.check_sum = cur.read_u32()?;
        windows.subsystem = Subsystem::from_u16(cur.read_u16()?);
        windows.dll_characteristics = DllCharacteristics::from_bits_retain(cur.read_u16()?);
        windows.size_of_stack_reserve = cur.read_uint(bits)?;
        windows.size_of_stack_commit = cur.read_uint(bits)?;
        windows.size_of_heap_reserve = cur.read_uint(bits)?;
        windows.size_of_heap_commit = cur.read_uint(bits)?;

        let loader_flags = cur.read_u32()?;
        if loader_flags != 0 {
            return Err(PeError::malformed(cur.pos() - 4, "loader flags must be zero"));
        }

        windows.number_of_rva_and_sizes = cur.read_u32()?;
        if dirs_size != u64::from(windows.number_of_rva_and_sizes) * 8 {
            return Err(PeError::malformed(
                cur.pos() - 4,
                "optional header size does not match count of data directories",
            ));
        }

        Ok(Self::Windows(standard, windows))
    }

    pub fn is_pe_plus(&self) -> bool {
        self.standard().map(|s| s.pe_plus).unwrap_or(false)
    }

    /// Standard fields, if the header is present at all.
    pub fn standard(&self) -> Option<&StandardFields> {
        match self {
            Self::Absent => None,
            Self::Coff(s) | Self::Windows(s, _) => Some(s),
        }
    }

    /// Windows-specific fields, if the header reaches that far.
    pub fn windows(&self) -> Option<&WindowsFields> {
        match self {
            Self::Windows(_, w) => Some(w),
            _ => None,
        }
    }

    /// Count of data directory entries following the header; zero unless
    /// the full Windows block is present.
    pub fn number_of_rva_and_sizes(&self) -> u32 {
        self.windows().map(|w| w.number_of_rva_and_sizes).unwrap_or(0)
    }

    /// Preferred load base; zero when the header does not declare one.
    pub fn image_base(&self) -> u64 {
        self.windows().map(|w| w.image_base).unwrap_or(0)
    }

    pub fn describe(&self, out: &mut dyn Report) {
        let Some(standard) = self.standard() else { return };
        let windows = self.windows();

        out.begin(if standard.pe_plus { "NT Optional Plus Header" } else { "NT Optional Header" });

        if let Some(w) = windows {
            out.write(
                "Subsystem",
                Value::Symbolic {
                    name: w.subsystem.name().into_owned(),
                    value: w.subsystem.value().into(),
                },
                ValueKind::Enum,
            );
            out.write(
                "DLL Characteristics",
                Value::Symbolic {
                    name: format_flags(&w.dll_characteristics),
                    value: w.dll_characteristics.bits().into(),
                },
                ValueKind::Flags,
            );
            out.write("Checksum", Value::Unsigned(w.check_sum.into()), ValueKind::Address);
        }

        out.write(
            "Entry point",
            Value::Unsigned(standard.address_of_entry_point.into()),
            ValueKind::Address,
        );
        out.write("Base of code", Value::Unsigned(standard.base_of_code.into()), ValueKind::Address);
        if standard.base_of_data != 0 {
            out.write(
                "Base of data",
                Value::Unsigned(standard.base_of_data.into()),
                ValueKind::Address,
            );
        }

        if let Some(w) = windows {
            out.write("Image base", Value::Unsigned(w.image_base), ValueKind::Address);

            out.begin("Alignment");
            out.write("Section", Value::Unsigned(w.section_alignment.into()), ValueKind::Alignment);
            out.write("File", Value::Unsigned(w.file_alignment.into()), ValueKind::Alignment);
            out.end();
        }

        out.begin("Versions");
        out.write(
            "Linker",
            Value::Version(standard.major_linker_version.into(), standard.minor_linker_version.into()),
            ValueKind::Version,
        );
        if let Some(w) = windows {
            out.write(
                "OS",
                Value::Version(w.major_operating_system_version, w.minor_operating_system_version),
                ValueKind::Version,
            );
            out.write(
                "Image",
                Value::Version(w.major_image_version, w.minor_image_version),
                ValueKind::Version,
            );
            out.write(
                "Subsystem",
                Value::Version(w.major_subsystem_version, w.minor_subsystem_version),
                ValueKind::Version,
            );
        }
        out.end();

        out.begin("Size");
        out.write("Code", Value::Unsigned(standard.size_of_code.into()), ValueKind::Size);
        out.write(
            "Initialized data",
            Value::Unsigned(standard.size_of_initialized_data.into()),
            ValueKind::Size,
        );
        out.write(
            "Uninitialized data",
            Value::Unsigned(standard.size_of_uninitialized_data.into()),
            ValueKind::Size,
        );
        if let Some(w) = windows {
            out.write("Image", Value::Unsigned(w.size_of_image.into()), ValueKind::Size);
            out.write("Headers", Value::Unsigned(w.size_of_headers.into()), ValueKind::Size);
            out.write("Stack reserve", Value::Unsigned(w.size_of_stack_reserve), ValueKind::Size);
            out.write("Stack commit", Value::Unsigned(w.size_of_stack_commit), ValueKind::Size);
            out.write("Heap reserve", Value::Unsigned(w.size_of_heap_reserve), ValueKind::Size);
            out.write("Heap commit", Value::Unsigned(w.size_of_heap_commit), ValueKind::Size);
        }
        out.end();

        out.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Serializes the fields back into the PE32 wire layout. Used only to
    /// prove that decoding lost nothing; the library itself never encodes.
    fn encode_pe32(s: &StandardFields, w: &WindowsFields) -> Vec<u8> {
        let mut b = Vec::with_capacity(96);
        b.extend_from_slice(&PE32_MAGIC.to_le_bytes());
        b.push(s.major_linker_version);
        b.push(s.minor_linker_version);
        b.extend_from_slice(&s.size_of_code.to_le_bytes());
        b.extend_from_slice(&s.size_of_initialized_data.to_le_bytes());
        b.extend_from_slice(&s.size_of_uninitialized_data.to_le_bytes());
        b.extend_from_slice(&s.address_of_entry_point.to_le_bytes());
        b.extend_from_slice(&s.base_of_code.to_le_bytes());
        b.extend_from_slice(&s.base_of_data.to_le_bytes());
        b.extend_from_slice(&(w.image_base as u32).to_le_bytes());
        b.extend_from_slice(&w.section_alignment.to_le_bytes());
        b.extend_from_slice(&w.file_alignment.to_le_bytes());
        b.extend_from_slice(&w.major_operating_system_version.to_le_bytes());
        b.extend_from_slice(&w.minor_operating_system_version.to_le_bytes());
        b.extend_from_slice(&w.major_image_version.to_le_bytes());
        b.extend_from_slice(&w.minor_image_version.to_le_bytes());
        b.extend_from_slice(&w.major_subsystem_version.to_le_bytes());
        b.extend_from_slice(&w.minor_subsystem_version.to_le_bytes());
        b.extend_from_slice(&0u32.to_le_bytes()); // win32 version value
        b.extend_from_slice(&w.size_of_image.to_le_bytes());
        b.extend_from_slice(&w.size_of_headers.to_le_bytes());
        b.extend_from_slice(&w.check_sum.to_le_bytes());
        b.extend_from_slice(&w.subsystem.value().to_le_bytes());
        b.extend_from_slice(&w.dll_characteristics.bits().to_le_bytes());
        b.extend_from_slice(&(w.size_of_stack_reserve as u32).to_le_bytes());
        b.extend_from_slice(&(w.size_of_stack_commit as u32).to_le_bytes());
        b.extend_from_slice(&(w.size_of_heap_reserve as u32).to_le_bytes());
        b.extend_from_slice(&(w.size_of_heap_commit as u32).to_le_bytes());
        b.extend_from_slice(&0u32.to_le_bytes()); // loader flags
        b.extend_from_slice(&w.number_of_rva_and_sizes.to_le_bytes());
        b
    }

    fn sample_fields() -> (StandardFields, WindowsFields) {
        let standard = StandardFields {
            pe_plus: false,
            major_linker_version: 14,
            minor_linker_version: 29,
            size_of_code: 0x1200,
            size_of_initialized_data: 0x800,
            size_of_uninitialized_data: 0x40,
            address_of_entry_point: 0x1430,
            base_of_code: 0x1000,
            base_of_data: 0x3000,
        };
        let windows = WindowsFields {
            image_base: 0x0040_0000,
            section_alignment: 0x1000,
            file_alignment: 0x200,
            major_operating_system_version: 6,
            minor_operating_system_version: 1,
            major_image_version: 1,
            minor_image_version: 0,
            major_subsystem_version: 6,
            minor_subsystem_version: 1,
            size_of_image: 0x6000,
            size_of_headers: 0x400,
            check_sum: 0xDEAD,
            subsystem: Subsystem::WindowsCui,
            dll_characteristics: DllCharacteristics::NX_COMPAT
                | DllCharacteristics::DYNAMIC_BASE,
            size_of_stack_reserve: 0x0010_0000,
            size_of_stack_commit: 0x1000,
            size_of_heap_reserve: 0x0010_0000,
            size_of_heap_commit: 0x1000,
            number_of_rva_and_sizes: 16,
        };
        (standard, windows)
    }

    #[test]
    fn size_zero_is_absent() {
        let mut cur = ByteCursor::new(&[]);
        assert_eq!(OptionalHeader::read(&mut cur, 0).unwrap(), OptionalHeader::Absent);
    }

    #[test]
    fn size_below_minimum_is_fatal() {
        let data = [0u8; 64];
        let mut cur = ByteCursor::new(&data);
        assert!(matches!(
            OptionalHeader::read(&mut cur, 23),
            Err(PeError::Malformed { .. })
        ));
    }

    #[test]
    fn invalid_magic_is_fatal() {
        let mut data = vec![0u8; 96];
        data[0..2].copy_from_slice(&0x30Bu16.to_le_bytes());
        let mut cur = ByteCursor::new(&data);
        assert!(matches!(
            OptionalHeader::read(&mut cur, 96),
            Err(PeError::Malformed { offset: 0, .. })
        ));
    }

    #[test]
    fn size_24_with_pe_plus_magic_is_short_coff() {
        let mut data = vec![0u8; 24];
        data[0..2].copy_from_slice(&PE32PLUS_MAGIC.to_le_bytes());
        data[16..20].copy_from_slice(&0x1000u32.to_le_bytes()); // entry point
        let mut cur = ByteCursor::new(&data);

        match OptionalHeader::read(&mut cur, 24).unwrap() {
            OptionalHeader::Coff(s) => {
                assert!(s.pe_plus);
                assert_eq!(s.address_of_entry_point, 0x1000);
                assert_eq!(s.base_of_data, 0);
            }
            other => panic!("expected short-COFF header, got {other:?}"),
        }
        assert_eq!(cur.pos(), 24);
    }

    #[test]
    fn pe32_shorter_than_28_is_fatal() {
        let mut data = vec![0u8; 28];
        data[0..2].copy_from_slice(&PE32_MAGIC.to_le_bytes());
        let mut cur = ByteCursor::new(&data);
        assert!(matches!(
            OptionalHeader::read(&mut cur, 26),
            Err(PeError::Malformed { .. })
        ));
    }

    #[test]
    fn pe32_full_header_round_trips() {
        let (standard, windows) = sample_fields();
        let encoded = encode_pe32(&standard, &windows);
        assert_eq!(encoded.len(), 96);

        // declared size counts the 16 directory entries that follow
        let mut cur = ByteCursor::new(&encoded);
        let decoded = OptionalHeader::read(&mut cur, 224).unwrap();
        let OptionalHeader::Windows(ds, dw) = &decoded else {
            panic!("expected full windows header");
        };
        assert_eq!(ds, &standard);
        assert_eq!(dw, &windows);
        assert_eq!(encode_pe32(ds, dw), encoded);
        assert_eq!(cur.pos(), 96);
    }

    #[test]
    fn nonzero_win32_version_value_is_fatal() {
        let (standard, windows) = sample_fields();
        let mut encoded = encode_pe32(&standard, &windows);
        encoded[52..56].copy_from_slice(&1u32.to_le_bytes());
        let mut cur = ByteCursor::new(&encoded);
        match OptionalHeader::read(&mut cur, 224) {
            Err(PeError::Malformed { offset, reason }) => {
                assert_eq!(offset, 52);
                assert!(reason.contains("win32 version"));
            }
            other => panic!("expected malformed error, got {other:?}"),
        }
    }

    #[test]
    fn nonzero_loader_flags_is_fatal() {
        let (standard, windows) = sample_fields();
        let mut encoded = encode_pe32(&standard, &windows);
        encoded[88..92].copy_from_slice(&4u32.to_le_bytes());
        let mut cur = ByteCursor::new(&encoded);
        match OptionalHeader::read(&mut cur, 224) {
            Err(PeError::Malformed { offset, .. }) => assert_eq!(offset, 88),
            other => panic!("expected malformed error, got {other:?}"),
        }
    }

    #[test]
    fn directory_count_must_match_remaining_size() {
        let (standard, mut windows) = sample_fields();
        windows.number_of_rva_and_sizes = 15;
        let encoded = encode_pe32(&standard, &windows);
        let mut cur = ByteCursor::new(&encoded);
        match OptionalHeader::read(&mut cur, 224) {
            Err(PeError::Malformed { reason, .. }) => {
                assert!(reason.contains("data directories"));
            }
            other => panic!("expected malformed error, got {other:?}"),
        }
    }

    #[test]
    fn windows_block_cannot_exceed_declared_size() {
        let mut data = vec![0u8; 96];
        data[0..2].copy_from_slice(&PE32_MAGIC.to_le_bytes());
        let mut cur = ByteCursor::new(&data);
        // 40 is past the PE32 checkpoint but smaller than the windows block
        assert!(matches!(
            OptionalHeader::read(&mut cur, 40),
            Err(PeError::Malformed { .. })
        ));
    }
}
