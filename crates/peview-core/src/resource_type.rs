//! Resource type ids from the first level of the resource directory tree.

use std::borrow::Cow;

/// Well-known resource types, by convention the first-level key of the tree.
///
/// Id values outside the table land in [`ResourceType::Other`]; a first-level
/// directory keyed by a string lands in [`ResourceType::Named`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Unknown,
    Cursor,
    Bitmap,
    Icon,
    Menu,
    Dialog,
    String,
    FontDir,
    Font,
    Accelerator,
    RcData,
    MessageTable,
    GroupCursor,
    GroupIcon,
    Version,
    DlgInclude,
    PlugPlay,
    Vxd,
    AniCursor,
    AniIcon,
    Html,
    Manifest,
    Other(u32),
    Named(std::string::String),
}

impl ResourceType {
    pub fn from_id(id: u32) -> Self {
        match id {
            0 => Self::Unknown,
            1 => Self::Cursor,
            2 => Self::Bitmap,
            3 => Self::Icon,
            4 => Self::Menu,
            5 => Self::Dialog,
            6 => Self::String,
            7 => Self::FontDir,
            8 => Self::Font,
            9 => Self::Accelerator,
            10 => Self::RcData,
            11 => Self::MessageTable,
            12 => Self::GroupCursor,
            14 => Self::GroupIcon,
            16 => Self::Version,
            17 => Self::DlgInclude,
            19 => Self::PlugPlay,
            20 => Self::Vxd,
            21 => Self::AniCursor,
            22 => Self::AniIcon,
            23 => Self::Html,
            24 => Self::Manifest,
            other => Self::Other(other),
        }
    }

    /// Symbolic name; also the per-type directory name used by extraction.
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            Self::Unknown => Cow::Borrowed("UNKNOWN"),
            Self::Cursor => Cow::Borrowed("CURSOR"),
            Self::Bitmap => Cow::Borrowed("BITMAP"),
            Self::Icon => Cow::Borrowed("ICON"),
            Self::Menu => Cow::Borrowed("MENU"),
            Self::Dialog => Cow::Borrowed("DIALOG"),
            Self::String => Cow::Borrowed("STRING"),
            Self::FontDir => Cow::Borrowed("FONTDIR"),
            Self::Font => Cow::Borrowed("FONT"),
            Self::Accelerator => Cow::Borrowed("ACCELERATOR"),
            Self::RcData => Cow::Borrowed("RCDATA"),
            Self::MessageTable => Cow::Borrowed("MESSAGETABLE"),
            Self::GroupCursor => Cow::Borrowed("GROUP_CURSOR"),
            Self::GroupIcon => Cow::Borrowed("GROUP_ICON"),
            Self::Version => Cow::Borrowed("VERSION"),
            Self::DlgInclude => Cow::Borrowed("DLGINCLUDE"),
            Self::PlugPlay => Cow::Borrowed("PLUGPLAY"),
            Self::Vxd => Cow::Borrowed("VXD"),
            Self::AniCursor => Cow::Borrowed("ANICURSOR"),
            Self::AniIcon => Cow::Borrowed("ANIICON"),
            Self::Html => Cow::Borrowed("HTML"),
            Self::Manifest => Cow::Borrowed("MANIFEST"),
            Self::Other(v) => Cow::Owned(format!("TYPE_{v}")),
            Self::Named(s) => Cow::Owned(s.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_gaps_are_preserved() {
        // 13, 15 and 18 have no assigned resource type
        assert_eq!(ResourceType::from_id(13), ResourceType::Other(13));
        assert_eq!(ResourceType::from_id(15), ResourceType::Other(15));
        assert_eq!(ResourceType::from_id(18), ResourceType::Other(18));
        assert_eq!(ResourceType::from_id(3), ResourceType::Icon);
        assert_eq!(ResourceType::from_id(24), ResourceType::Manifest);
    }

    #[test]
    fn names_for_extraction_dirs() {
        assert_eq!(ResourceType::Icon.name(), "ICON");
        assert_eq!(ResourceType::Other(42).name(), "TYPE_42");
        assert_eq!(ResourceType::Named("MUI".into()).name(), "MUI");
    }
}
