//! DOS and COFF/PE file header decoders.

use peview_core::{format_flags, CoffCharacteristics, Machine, Report, Value, ValueKind};

use crate::{ByteCursor, PeError};

/// DOS header magic number ("MZ").
pub const DOS_MAGIC: u16 = 0x5A4D;

/// PE signature ("PE\0\0").
pub const PE_SIGNATURE: u32 = 0x0000_4550;

/// Total size of the DOS header, including the magic.
pub const DOS_HEADER_SIZE: u64 = 64;

/// Legacy DOS stub header (64 bytes).
///
/// Only `lfanew` matters for PE decoding; the remaining fields are decoded
/// and kept for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DosHeader {
    pub cblp: u16,
    pub cp: u16,
    pub crlc: u16,
    pub cparhdr: u16,
    pub minalloc: u16,
    pub maxalloc: u16,
    pub ss: u16,
    pub sp: u16,
    pub csum: u16,
    pub ip: u16,
    pub cs: u16,
    pub lfarlc: u16,
    pub ovno: u16,
    pub res: [u16; 4],
    pub oemid: u16,
    pub oeminfo: u16,
    pub res2: [u16; 10],
    /// File offset of the PE header.
    pub lfanew: u32,
}

impl DosHeader {
    /// Decodes the DOS header at the cursor's current position.
    pub fn read(cur: &mut ByteCursor) -> Result<Self, PeError> {
        let magic = cur.read_u16()?;
        if magic != DOS_MAGIC {
            return Err(PeError::malformed(cur.pos() - 2, "invalid DOS magic number"));
        }

        let mut this = Self {
            cblp: cur.read_u16()?,
            cp: cur.read_u16()?,
            crlc: cur.read_u16()?,
            cparhdr: cur.read_u16()?,
            minalloc: cur.read_u16()?,
            maxalloc: cur.read_u16()?,
            ss: cur.read_u16()?,
            sp: cur.read_u16()?,
            csum: cur.read_u16()?,
            ip: cur.read_u16()?,
            cs: cur.read_u16()?,
            lfarlc: cur.read_u16()?,
            ovno: cur.read_u16()?,
            ..Self::default()
        };
        for slot in this.res.iter_mut() {
            *slot = cur.read_u16()?;
        }
        this.oemid = cur.read_u16()?;
        this.oeminfo = cur.read_u16()?;
        for slot in this.res2.iter_mut() {
            *slot = cur.read_u16()?;
        }

        this.lfanew = cur.read_u32()?;
        if this.lfanew < 62 {
            return Err(PeError::malformed(cur.pos() - 4, "overlapping DOS and PE headers"));
        }

        Ok(this)
    }

    pub fn describe(&self, out: &mut dyn Report) {
        out.begin("DOS Header");
        out.write("cblp", Value::Unsigned(self.cblp.into()), ValueKind::Address);
        out.write("cp", Value::Unsigned(self.cp.into()), ValueKind::Address);
        out.write("crlc", Value::Unsigned(self.crlc.into()), ValueKind::Address);
        out.write("cparhdr", Value::Unsigned(self.cparhdr.into()), ValueKind::Address);
        out.write("minalloc", Value::Unsigned(self.minalloc.into()), ValueKind::Address);
        out.write("maxalloc", Value::Unsigned(self.maxalloc.into()), ValueKind::Address);
        out.write("ss", Value::Unsigned(self.ss.into()), ValueKind::Address);
        out.write("sp", Value::Unsigned(self.sp.into()), ValueKind::Address);
        out.write("csum", Value::Unsigned(self.csum.into()), ValueKind::Address);
        out.write("ip", Value::Unsigned(self.ip.into()), ValueKind::Address);
        out.write("cs", Value::Unsigned(self.cs.into()), ValueKind::Address);
        out.write("lfarlc", Value::Unsigned(self.lfarlc.into()), ValueKind::Address);
        out.write("ovno", Value::Unsigned(self.ovno.into()), ValueKind::Address);
        out.write(
            "res",
            Value::List(self.res.iter().map(|&v| u64::from(v)).collect()),
            ValueKind::Count,
        );
        out.write("oemid", Value::Unsigned(self.oemid.into()), ValueKind::Address);
        out.write("oeminfo", Value::Unsigned(self.oeminfo.into()), ValueKind::Address);
        out.write(
            "res2",
            Value::List(self.res2.iter().map(|&v| u64::from(v)).collect()),
            ValueKind::Count,
        );
        out.write("lfanew", Value::Unsigned(self.lfanew.into()), ValueKind::Address);
        out.end();
    }
}

/// COFF file header, found directly after the PE signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeHeader {
    pub machine: Machine,
    pub number_of_sections: u16,
    /// Unix timestamp of the link.
    pub time_date_stamp: u32,
    pub pointer_to_symbol_table: u32,
    pub number_of_symbols: u32,
    pub size_of_optional_header: u16,
    pub characteristics: CoffCharacteristics,
}

impl PeHeader {
    /// Decodes the PE signature and COFF header at the cursor's position.
    pub fn read(cur: &mut ByteCursor) -> Result<Self, PeError> {
        let signature = cur.read_u32()?;
        if signature != PE_SIGNATURE {
            return Err(PeError::malformed(cur.pos() - 4, "invalid PE signature"));
        }

        Ok(Self {
            machine: Machine::from_u16(cur.read_u16()?),
            number_of_sections: cur.read_u16()?,
            time_date_stamp: cur.read_u32()?,
            pointer_to_symbol_table: cur.read_u32()?,
            number_of_symbols: cur.read_u32()?,
            size_of_optional_header: cur.read_u16()?,
            characteristics: CoffCharacteristics::from_bits_retain(cur.read_u16()?),
        })
    }

    /// Returns true if the image is a DLL.
    pub fn is_dll(&self) -> bool {
        self.characteristics.contains(CoffCharacteristics::DLL)
    }

    pub fn describe(&self, out: &mut dyn Report) {
        out.begin("PE Header");
        out.write(
            "Machine",
            Value::Symbolic {
                name: self.machine.name().into_owned(),
                value: self.machine.value().into(),
            },
            ValueKind::Enum,
        );
        out.write(
            "Compilation time",
            Value::Unsigned(self.time_date_stamp.into()),
            ValueKind::Datetime,
        );
        out.write(
            "Characteristics",
            Value::Symbolic {
                name: format_flags(&self.characteristics),
                value: self.characteristics.bits().into(),
            },
            ValueKind::Flags,
        );

        if self.pointer_to_symbol_table == 0 {
            out.write("Symbol table", Value::None, ValueKind::Raw);
        } else {
            out.write(
                "Symbol table",
                Value::Str(format!("with {} entries", self.number_of_symbols)),
                ValueKind::Raw,
            );
        }
        out.end();
    }
}
