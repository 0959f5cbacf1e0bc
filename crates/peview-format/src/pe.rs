//! Whole-file decoder tying the individual headers together.

use indexmap::IndexMap;
use peview_core::{directory_name, Report, Value, ValueKind, DIRECTORY_RESOURCE};

use crate::{
    ByteCursor, DosHeader, OptionalHeader, PeError, PeHeader, ResourceTable, SectionHeader,
    DOS_HEADER_SIZE,
};

/// One slot of the data directory table: an RVA and a byte length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataDirectory {
    pub base: u32,
    pub size: u32,
}

impl DataDirectory {
    fn read(cur: &mut ByteCursor) -> Result<Self, PeError> {
        Ok(Self {
            base: cur.read_u32()?,
            size: cur.read_u32()?,
        })
    }

    pub fn is_present(&self) -> bool {
        self.base != 0 || self.size != 0
    }
}

/// A fully decoded PE image.
///
/// Decoding reads the headers eagerly but leaves section contents and the
/// resource tree in place; those are pulled on demand through
/// [`PeFile::resource_table`] and the extraction helpers.
#[derive(Debug, Clone)]
pub struct PeFile {
    pub dos_header: DosHeader,
    /// Raw bytes between the DOS header and the PE header, usually the
    /// real-mode stub program.
    pub dos_code: Vec<u8>,
    pub pe_header: PeHeader,
    pub optional_header: OptionalHeader,
    pub data_directories: Vec<DataDirectory>,
    /// Section headers keyed by name, in table order. A duplicate name
    /// overwrites the earlier entry.
    pub sections: IndexMap<String, SectionHeader>,
}

impl PeFile {
    /// Decodes all headers starting at the cursor's current position.
    pub fn read(cur: &mut ByteCursor) -> Result<Self, PeError> {
        let dos_header = DosHeader::read(cur)?;

        let dos_code = if u64::from(dos_header.lfanew) >= DOS_HEADER_SIZE {
            let len = u64::from(dos_header.lfanew) - DOS_HEADER_SIZE;
            cur.read_bytes(len as usize)?.to_vec()
        } else {
            Vec::new()
        };
        cur.set_pos(dos_header.lfanew.into());

        let pe_header = PeHeader::read(cur)?;
        let optional_header = OptionalHeader::read(cur, pe_header.size_of_optional_header)?;

        let count = optional_header.number_of_rva_and_sizes() as usize;
        let mut data_directories = Vec::with_capacity(count);
        for _ in 0..count {
            data_directories.push(DataDirectory::read(cur)?);
        }

        let mut sections = IndexMap::new();
        for _ in 0..pe_header.number_of_sections {
            let section = SectionHeader::read(cur)?;
            sections.insert(section.name.clone(), section);
        }

        Ok(Self {
            dos_header,
            dos_code,
            pe_header,
            optional_header,
            data_directories,
            sections,
        })
    }

    /// Convenience wrapper decoding from the start of a byte slice.
    pub fn parse(data: &[u8]) -> Result<Self, PeError> {
        let mut cur = ByteCursor::new(data);
        Self::read(&mut cur)
    }

    pub fn section(&self, name: &str) -> Option<&SectionHeader> {
        self.sections.get(name)
    }

    pub fn directory(&self, index: usize) -> Option<&DataDirectory> {
        self.data_directories.get(index)
    }

    pub fn resource_directory(&self) -> Option<&DataDirectory> {
        self.directory(DIRECTORY_RESOURCE).filter(|d| d.is_present())
    }

    /// File offset where the section's raw data starts.
    ///
    /// Some linkers store `pointer_to_raw_data` pre-biased by the image
    /// base; a pointer at or below the base is taken as biased and the
    /// base is subtracted back out.
    pub fn section_raw_start(&self, section: &SectionHeader) -> u64 {
        let pointer = u64::from(section.pointer_to_raw_data);
        let image_base = self.optional_header.image_base();
        if image_base > pointer {
            pointer
        } else {
            pointer - image_base
        }
    }

    /// Decodes the resource tree held by `section` out of `data`, the same
    /// byte source the headers were decoded from.
    pub fn resource_table(
        &self,
        data: &[u8],
        section: &SectionHeader,
    ) -> Result<ResourceTable, PeError> {
        let mut cur = ByteCursor::new(data);
        cur.set_pos(self.section_raw_start(section));
        ResourceTable::read(&mut cur, section)
    }

    pub fn describe(&self, out: &mut dyn Report) {
        self.dos_header.describe(out);

        if !self.dos_code.is_empty() {
            out.write(
                "DOS Code",
                Value::Str(String::from_utf8_lossy(&self.dos_code).into_owned()),
                ValueKind::Raw,
            );
        }

        self.pe_header.describe(out);
        self.optional_header.describe(out);

        if !self.data_directories.is_empty() {
            out.begin("Data Directories");
            for (i, dir) in self.data_directories.iter().enumerate() {
                out.begin(directory_name(i));
                out.write("Address", Value::Unsigned(dir.base.into()), ValueKind::Address);
                out.write("Size", Value::Unsigned(dir.size.into()), ValueKind::Size);
                out.end();
            }
            out.end();
        }

        if !self.sections.is_empty() {
            out.begin("Sections");
            for section in self.sections.values() {
                section.describe(out);
            }
            out.end();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PE32PLUS_MAGIC, PE_SIGNATURE};

    /// Smallest decodable image: DOS header, stub, PE32+ optional header
    /// with a zero directory count, one section.
    fn minimal_image() -> Vec<u8> {
        let lfanew = 0x80u32;
        let mut data = vec![0u8; 0x80];
        data[0] = b'M';
        data[1] = b'Z';
        data[60..64].copy_from_slice(&lfanew.to_le_bytes());
        data[64..70].copy_from_slice(b"stub!\0");

        data.extend_from_slice(&PE_SIGNATURE.to_le_bytes());
        data.extend_from_slice(&0x8664u16.to_le_bytes()); // machine
        data.extend_from_slice(&1u16.to_le_bytes()); // sections
        data.extend_from_slice(&0u32.to_le_bytes()); // timestamp
        data.extend_from_slice(&0u32.to_le_bytes()); // symbol table
        data.extend_from_slice(&0u32.to_le_bytes()); // symbol count
        data.extend_from_slice(&24u16.to_le_bytes()); // optional size: short COFF
        data.extend_from_slice(&0x0022u16.to_le_bytes()); // characteristics

        let mut optional = vec![0u8; 24];
        optional[0..2].copy_from_slice(&PE32PLUS_MAGIC.to_le_bytes());
        data.extend_from_slice(&optional);

        let mut section = vec![0u8; 40];
        section[..5].copy_from_slice(b".text");
        section[12..16].copy_from_slice(&0x1000u32.to_le_bytes()); // virtual address
        section[20..24].copy_from_slice(&0x400u32.to_le_bytes()); // raw pointer
        data.extend_from_slice(&section);

        data
    }

    #[test]
    fn decodes_a_minimal_image() {
        let data = minimal_image();
        let pe = PeFile::parse(&data).unwrap();

        assert_eq!(pe.dos_header.lfanew, 0x80);
        assert_eq!(pe.dos_code.len(), 0x40);
        assert!(pe.dos_code.starts_with(b"stub!"));
        assert_eq!(pe.pe_header.number_of_sections, 1);
        assert!(matches!(pe.optional_header, OptionalHeader::Coff(_)));
        assert!(pe.data_directories.is_empty());
        assert!(pe.resource_directory().is_none());
        assert!(pe.section(".text").is_some());
        assert!(pe.section(".data").is_none());
    }

    #[test]
    fn absent_optional_header_leaves_no_directories() {
        let mut data = vec![0u8; 64];
        data[0] = b'M';
        data[1] = b'Z';
        data[60..64].copy_from_slice(&64u32.to_le_bytes());
        data.extend_from_slice(&PE_SIGNATURE.to_le_bytes());
        data.extend_from_slice(&0x8664u16.to_le_bytes()); // machine
        data.extend_from_slice(&0u16.to_le_bytes()); // no sections
        data.extend_from_slice(&[0u8; 12]);
        data.extend_from_slice(&0u16.to_le_bytes()); // optional header size 0
        data.extend_from_slice(&0u16.to_le_bytes()); // characteristics

        let pe = PeFile::parse(&data).unwrap();
        assert_eq!(pe.optional_header, OptionalHeader::Absent);
        assert!(pe.data_directories.is_empty());
        assert!(pe.sections.is_empty());
    }

    #[test]
    fn lfanew_of_64_leaves_no_dos_code() {
        let mut data = minimal_image();
        // move the PE header directly after the DOS header
        let tail = data.split_off(0x80);
        data.truncate(64);
        data[60..64].copy_from_slice(&64u32.to_le_bytes());
        data.extend_from_slice(&tail);

        let pe = PeFile::parse(&data).unwrap();
        assert!(pe.dos_code.is_empty());
    }

    #[test]
    fn raw_start_subtracts_a_biased_pointer() {
        let section = SectionHeader {
            pointer_to_raw_data: 0x0040_0400,
            ..SectionHeader::default()
        };
        let mut pe = PeFile::parse(&minimal_image()).unwrap();

        // short-COFF header: no image base, pointer taken as-is
        assert_eq!(pe.section_raw_start(&section), 0x0040_0400);

        let windows = crate::WindowsFields {
            image_base: 0x0040_0000,
            ..crate::WindowsFields::default()
        };
        pe.optional_header = OptionalHeader::Windows(crate::StandardFields::default(), windows);
        assert_eq!(pe.section_raw_start(&section), 0x400);

        // pointer below the base stays untouched
        let plain = SectionHeader {
            pointer_to_raw_data: 0x400,
            ..SectionHeader::default()
        };
        assert_eq!(pe.section_raw_start(&plain), 0x400);
    }

    #[test]
    fn truncated_section_table_is_eof_not_malformed() {
        let mut data = minimal_image();
        data.truncate(data.len() - 10);
        assert!(matches!(
            PeFile::parse(&data),
            Err(PeError::UnexpectedEof { .. })
        ));
    }
}
