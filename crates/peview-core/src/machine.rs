//! COFF machine types.

use std::borrow::Cow;

/// Target machine of a PE image, from the COFF header.
///
/// Unknown values are preserved in [`Machine::Other`] rather than rejected;
/// a reader has no reason to refuse an image it can otherwise decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Machine {
    /// Applicable to any machine type.
    Unknown,
    /// Matsushita AM33.
    Am33,
    /// x86-64.
    Amd64,
    /// ARM little endian.
    Arm,
    /// ARM64 little endian.
    Arm64,
    /// ARM Thumb-2 little endian.
    ArmNt,
    /// EFI byte code.
    Ebc,
    /// Intel 386 or later and compatible processors.
    I386,
    /// Intel Itanium processor family.
    Ia64,
    /// Mitsubishi M32R little endian.
    M32r,
    Mips16,
    MipsFpu,
    MipsFpu16,
    /// Power PC little endian.
    PowerPc,
    /// Power PC with floating point support.
    PowerPcFp,
    /// MIPS little endian.
    R4000,
    RiscV32,
    RiscV64,
    RiscV128,
    /// Hitachi SH3.
    Sh3,
    Sh3Dsp,
    Sh4,
    Sh5,
    Thumb,
    /// MIPS little-endian WCE v2.
    WceMipsV2,
    /// Any machine id not in the table above.
    Other(u16),
}

impl Machine {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0000 => Self::Unknown,
            0x01D3 => Self::Am33,
            0x8664 => Self::Amd64,
            0x01C0 => Self::Arm,
            0xAA64 => Self::Arm64,
            0x01C4 => Self::ArmNt,
            0x0EBC => Self::Ebc,
            0x014C => Self::I386,
            0x0200 => Self::Ia64,
            0x9041 => Self::M32r,
            0x0266 => Self::Mips16,
            0x0366 => Self::MipsFpu,
            0x0466 => Self::MipsFpu16,
            0x01F0 => Self::PowerPc,
            0x01F1 => Self::PowerPcFp,
            0x0166 => Self::R4000,
            0x5032 => Self::RiscV32,
            0x5064 => Self::RiscV64,
            0x5128 => Self::RiscV128,
            0x01A2 => Self::Sh3,
            0x01A3 => Self::Sh3Dsp,
            0x01A6 => Self::Sh4,
            0x01A8 => Self::Sh5,
            0x01C2 => Self::Thumb,
            0x0169 => Self::WceMipsV2,
            other => Self::Other(other),
        }
    }

    /// Raw COFF machine id.
    pub fn value(&self) -> u16 {
        match self {
            Self::Unknown => 0x0000,
            Self::Am33 => 0x01D3,
            Self::Amd64 => 0x8664,
            Self::Arm => 0x01C0,
            Self::Arm64 => 0xAA64,
            Self::ArmNt => 0x01C4,
            Self::Ebc => 0x0EBC,
            Self::I386 => 0x014C,
            Self::Ia64 => 0x0200,
            Self::M32r => 0x9041,
            Self::Mips16 => 0x0266,
            Self::MipsFpu => 0x0366,
            Self::MipsFpu16 => 0x0466,
            Self::PowerPc => 0x01F0,
            Self::PowerPcFp => 0x01F1,
            Self::R4000 => 0x0166,
            Self::RiscV32 => 0x5032,
            Self::RiscV64 => 0x5064,
            Self::RiscV128 => 0x5128,
            Self::Sh3 => 0x01A2,
            Self::Sh3Dsp => 0x01A3,
            Self::Sh4 => 0x01A6,
            Self::Sh5 => 0x01A8,
            Self::Thumb => 0x01C2,
            Self::WceMipsV2 => 0x0169,
            Self::Other(v) => *v,
        }
    }

    /// Symbolic name used by the text renderer.
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            Self::Unknown => Cow::Borrowed("UNKNOWN"),
            Self::Am33 => Cow::Borrowed("AM33"),
            Self::Amd64 => Cow::Borrowed("AMD64"),
            Self::Arm => Cow::Borrowed("ARM"),
            Self::Arm64 => Cow::Borrowed("ARM64"),
            Self::ArmNt => Cow::Borrowed("ARMNT"),
            Self::Ebc => Cow::Borrowed("EBC"),
            Self::I386 => Cow::Borrowed("I386"),
            Self::Ia64 => Cow::Borrowed("IA64"),
            Self::M32r => Cow::Borrowed("M32R"),
            Self::Mips16 => Cow::Borrowed("MIPS16"),
            Self::MipsFpu => Cow::Borrowed("MIPSFPU"),
            Self::MipsFpu16 => Cow::Borrowed("MIPSFPU16"),
            Self::PowerPc => Cow::Borrowed("POWERPC"),
            Self::PowerPcFp => Cow::Borrowed("POWERPCFP"),
            Self::R4000 => Cow::Borrowed("R4000"),
            Self::RiscV32 => Cow::Borrowed("RISCV32"),
            Self::RiscV64 => Cow::Borrowed("RISCV64"),
            Self::RiscV128 => Cow::Borrowed("RISCV128"),
            Self::Sh3 => Cow::Borrowed("SH3"),
            Self::Sh3Dsp => Cow::Borrowed("SH3DSP"),
            Self::Sh4 => Cow::Borrowed("SH4"),
            Self::Sh5 => Cow::Borrowed("SH5"),
            Self::Thumb => Cow::Borrowed("THUMB"),
            Self::WceMipsV2 => Cow::Borrowed("WCEMIPSV2"),
            Self::Other(v) => Cow::Owned(format!("MACHINE_{v:#06x}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ids_round_trip() {
        for id in [0x0000u16, 0x8664, 0x014C, 0xAA64, 0x5064] {
            assert_eq!(Machine::from_u16(id).value(), id);
        }
    }

    #[test]
    fn unknown_id_is_preserved() {
        let m = Machine::from_u16(0x1234);
        assert_eq!(m, Machine::Other(0x1234));
        assert_eq!(m.value(), 0x1234);
        assert_eq!(m.name(), "MACHINE_0x1234");
    }
}
