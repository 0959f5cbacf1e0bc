//! Windows subsystem identifiers.

use std::borrow::Cow;

/// Subsystem required to run an image, from the optional header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Subsystem {
    #[default]
    Unknown,
    /// Device drivers and native Windows processes.
    Native,
    WindowsGui,
    WindowsCui,
    Os2Cui,
    PosixCui,
    /// Native Win9x driver.
    NativeWindows,
    WindowsCeGui,
    EfiApplication,
    EfiBootServiceDriver,
    EfiRuntimeDriver,
    EfiRom,
    Xbox,
    WindowsBootApplication,
    Other(u16),
}

impl Subsystem {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => Self::Unknown,
            1 => Self::Native,
            2 => Self::WindowsGui,
            3 => Self::WindowsCui,
            5 => Self::Os2Cui,
            7 => Self::PosixCui,
            8 => Self::NativeWindows,
            9 => Self::WindowsCeGui,
            10 => Self::EfiApplication,
            11 => Self::EfiBootServiceDriver,
            12 => Self::EfiRuntimeDriver,
            13 => Self::EfiRom,
            14 => Self::Xbox,
            16 => Self::WindowsBootApplication,
            other => Self::Other(other),
        }
    }

    pub fn value(&self) -> u16 {
        match self {
            Self::Unknown => 0,
            Self::Native => 1,
            Self::WindowsGui => 2,
            Self::WindowsCui => 3,
            Self::Os2Cui => 5,
            Self::PosixCui => 7,
            Self::NativeWindows => 8,
            Self::WindowsCeGui => 9,
            Self::EfiApplication => 10,
            Self::EfiBootServiceDriver => 11,
            Self::EfiRuntimeDriver => 12,
            Self::EfiRom => 13,
            Self::Xbox => 14,
            Self::WindowsBootApplication => 16,
            Self::Other(v) => *v,
        }
    }

    pub fn name(&self) -> Cow<'static, str> {
        match self {
            Self::Unknown => Cow::Borrowed("UNKNOWN"),
            Self::Native => Cow::Borrowed("NATIVE"),
            Self::WindowsGui => Cow::Borrowed("WINDOWS_GUI"),
            Self::WindowsCui => Cow::Borrowed("WINDOWS_CUI"),
            Self::Os2Cui => Cow::Borrowed("OS2_CUI"),
            Self::PosixCui => Cow::Borrowed("POSIX_CUI"),
            Self::NativeWindows => Cow::Borrowed("NATIVE_WINDOWS"),
            Self::WindowsCeGui => Cow::Borrowed("WINDOWS_CE_GUI"),
            Self::EfiApplication => Cow::Borrowed("EFI_APPLICATION"),
            Self::EfiBootServiceDriver => Cow::Borrowed("EFI_BOOT_SERVICE_DRIVER"),
            Self::EfiRuntimeDriver => Cow::Borrowed("EFI_RUNTIME_DRIVER"),
            Self::EfiRom => Cow::Borrowed("EFI_ROM"),
            Self::Xbox => Cow::Borrowed("XBOX"),
            Self::WindowsBootApplication => Cow::Borrowed("WINDOWS_BOOT_APPLICATION"),
            Self::Other(v) => Cow::Owned(format!("SUBSYSTEM_{v}")),
        }
    }
}
