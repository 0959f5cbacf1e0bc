//! Resource directory tree decoder and extractor.
//!
//! The resource tree is the one part of the format that is not decoded
//! sequentially: every entry stores offsets relative to a fixed *tree base*
//! (the root directory's start), and name strings and subdirectories are
//! reached by seek-detours that must restore the cursor afterwards. The
//! offsets come straight from the file, so the walk guards against cycles,
//! unbounded nesting and runaway directory counts (sibling entries may
//! alias the same subdirectory, which depth alone does not bound).
//!
//! By convention the tree is three levels deep: type, then name-or-id,
//! then language. Leaves are flattened into [`Resource`] records with the
//! absolute file offset of their data.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;
use peview_core::ResourceType;

use crate::{ByteCursor, PeError, SectionHeader};

/// Nesting limit for resource directories; real trees have three levels.
const MAX_RESOURCE_DEPTH: usize = 32;

/// Cap on directories decoded in one walk. Sibling entries may point at the
/// same subdirectory offset, so depth alone does not bound the walk.
const MAX_RESOURCE_DIRECTORIES: usize = 4096;

/// Termination guard for the recursive walk.
struct WalkGuard {
    /// Directory offsets on the current branch, for cycle detection.
    branch: Vec<u64>,
    /// Directories decoded so far, across all branches.
    decoded: usize,
}

/// Key of a resource directory entry: a UTF-16 name or a 31-bit integer id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    Name(String),
    Id(u32),
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(s) => f.write_str(s),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

/// Leaf of the resource tree: where the data lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceDataEntry {
    /// RVA of the resource data.
    pub rva: u32,
    pub size: u32,
    pub codepage: u32,
}

impl ResourceDataEntry {
    fn read(cur: &mut ByteCursor) -> Result<Self, PeError> {
        let this = Self {
            rva: cur.read_u32()?,
            size: cur.read_u32()?,
            codepage: cur.read_u32()?,
        };
        let reserved = cur.read_u32()?;
        if reserved != 0 {
            return Err(PeError::malformed(
                cur.pos() - 4,
                "resource data entry reserved field must be zero",
            ));
        }
        Ok(this)
    }
}

/// Payload of a directory entry: either a nested directory or leaf data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourcePayload {
    Directory(ResourceDirectory),
    Data(ResourceDataEntry),
}

/// One slot of a resource directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDirectoryEntry {
    pub key: ResourceKey,
    pub payload: ResourcePayload,
}

/// A level of the resource tree.
///
/// Entries are kept in decode order, named entries first. Duplicate keys
/// overwrite; the last entry decoded under a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceDirectory {
    /// Unix timestamp.
    pub time_date_stamp: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub name_entries: IndexMap<String, ResourceDirectoryEntry>,
    pub id_entries: IndexMap<u32, ResourceDirectoryEntry>,
}

impl ResourceDirectory {
    /// Decodes the tree rooted at the cursor's current position, which also
    /// becomes the tree base every entry offset is relative to.
    pub fn read(cur: &mut ByteCursor) -> Result<Self, PeError> {
        let base = cur.pos();
        let mut guard = WalkGuard { branch: vec![0], decoded: 0 };
        Self::read_at(cur, base, &mut guard)
    }

    fn read_at(cur: &mut ByteCursor, base: u64, guard: &mut WalkGuard) -> Result<Self, PeError> {
        guard.decoded += 1;
        if guard.decoded > MAX_RESOURCE_DIRECTORIES {
            return Err(PeError::malformed(cur.pos(), "too many resource directories"));
        }

        let characteristics = cur.read_u32()?;
        if characteristics != 0 {
            return Err(PeError::malformed(
                cur.pos() - 4,
                "resource directory characteristics must be zero",
            ));
        }

        let mut this = Self {
            time_date_stamp: cur.read_u32()?,
            major_version: cur.read_u16()?,
            minor_version: cur.read_u16()?,
            ..Self::default()
        };
        let number_of_named_entries = cur.read_u16()?;
        let number_of_id_entries = cur.read_u16()?;

        for _ in 0..number_of_named_entries {
            let entry = ResourceDirectoryEntry::read(cur, base, true, guard)?;
            let ResourceKey::Name(name) = &entry.key else { unreachable!() };
            this.name_entries.insert(name.clone(), entry);
        }
        for _ in 0..number_of_id_entries {
            let entry = ResourceDirectoryEntry::read(cur, base, false, guard)?;
            let ResourceKey::Id(id) = entry.key else { unreachable!() };
            this.id_entries.insert(id, entry);
        }

        Ok(this)
    }

    /// Entries in decode order: named, then id-keyed.
    pub fn entries(&self) -> impl Iterator<Item = &ResourceDirectoryEntry> {
        self.name_entries.values().chain(self.id_entries.values())
    }
}

impl ResourceDirectoryEntry {
    fn read(
        cur: &mut ByteCursor,
        base: u64,
        named: bool,
        guard: &mut WalkGuard,
    ) -> Result<Self, PeError> {
        let name_field = cur.read_u32()?;
        if named != (name_field >> 31 != 0) {
            return Err(PeError::malformed(
                cur.pos() - 4,
                if named {
                    "id entry found in the named entry range"
                } else {
                    "named entry found in the id entry range"
                },
            ));
        }

        let key = if named {
            let saved = cur.pos();
            cur.set_pos(base + u64::from(name_field & 0x7FFF_FFFF));
            let units = cur.read_u16()?;
            let mut buf = Vec::with_capacity(units.into());
            for _ in 0..units {
                buf.push(cur.read_u16()?);
            }
            cur.set_pos(saved);
            ResourceKey::Name(String::from_utf16_lossy(&buf))
        } else {
            ResourceKey::Id(name_field)
        };

        let offset_field = cur.read_u32()?;
        let is_directory = offset_field >> 31 != 0;
        let rel = u64::from(offset_field & 0x7FFF_FFFF);

        let saved = cur.pos();
        cur.set_pos(base + rel);
        let payload = if is_directory {
            if guard.branch.contains(&rel) {
                return Err(PeError::malformed(base + rel, "resource directory cycle"));
            }
            if guard.branch.len() >= MAX_RESOURCE_DEPTH {
                return Err(PeError::malformed(base + rel, "resource directory nesting too deep"));
            }
            guard.branch.push(rel);
            let dir = ResourceDirectory::read_at(cur, base, guard)?;
            guard.branch.pop();
            ResourcePayload::Directory(dir)
        } else {
            ResourcePayload::Data(ResourceDataEntry::read(cur)?)
        };
        cur.set_pos(saved);

        Ok(Self { key, payload })
    }
}

/// Flattened view of one resource leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// First-level key, interpreted as the resource type.
    pub kind: ResourceType,
    /// Second-level key, the resource's name or id.
    pub name: ResourceKey,
    /// The leaf's own key, by convention a language id.
    pub language: ResourceKey,
    pub size: u32,
    pub codepage: u32,
    /// Absolute file offset of the data.
    pub offset: u64,
}

/// A decoded resource section: the tree plus its flattened leaves.
#[derive(Debug, Clone)]
pub struct ResourceTable {
    pub root: ResourceDirectory,
    pub resources: Vec<Resource>,
}

impl ResourceTable {
    /// Decodes the resource tree of `section`. The cursor must be positioned
    /// at the section's raw-data start; that position doubles as the tree
    /// base for the walk and as the anchor of the RVA-to-offset conversion.
    pub fn read(cur: &mut ByteCursor, section: &SectionHeader) -> Result<Self, PeError> {
        let raw_start = cur.pos();
        let root = ResourceDirectory::read(cur)?;

        let mut resources = Vec::new();
        let mut path = Vec::new();
        flatten(&root, &mut path, raw_start, section.virtual_address, &mut resources)?;

        Ok(Self { root, resources })
    }
}

fn flatten(
    dir: &ResourceDirectory,
    path: &mut Vec<ResourceKey>,
    raw_start: u64,
    section_va: u32,
    out: &mut Vec<Resource>,
) -> Result<(), PeError> {
    for entry in dir.entries() {
        match &entry.payload {
            ResourcePayload::Directory(sub) => {
                path.push(entry.key.clone());
                flatten(sub, path, raw_start, section_va, out)?;
                path.pop();
            }
            ResourcePayload::Data(data) => {
                let kind = match path.first() {
                    Some(ResourceKey::Id(id)) => ResourceType::from_id(*id),
                    Some(ResourceKey::Name(name)) => ResourceType::Named(name.clone()),
                    None => ResourceType::Unknown,
                };
                let name = path.get(1).cloned().unwrap_or_else(|| entry.key.clone());
                let offset = (u64::from(data.rva) + raw_start)
                    .checked_sub(u64::from(section_va))
                    .ok_or_else(|| {
                        PeError::malformed(
                            raw_start,
                            "resource data RVA below the section's virtual address",
                        )
                    })?;
                out.push(Resource {
                    kind,
                    name,
                    language: entry.key.clone(),
                    size: data.size,
                    codepage: data.codepage,
                    offset,
                });
            }
        }
    }
    Ok(())
}

/// Reads flattened resources back out of the byte source and writes them to
/// sinks or to a directory hierarchy keyed `TYPE/name.language`.
#[derive(Debug)]
pub struct ResourceExtractor<'d> {
    cur: ByteCursor<'d>,
}

impl<'d> ResourceExtractor<'d> {
    /// The cursor must view the same byte source the table was decoded from.
    pub fn new(cur: ByteCursor<'d>) -> Self {
        Self { cur }
    }

    /// Reads exactly `resource.size` bytes at the resource's offset.
    pub fn read(&mut self, resource: &Resource) -> Result<&'d [u8], PeError> {
        self.cur.set_pos(resource.offset);
        self.cur.read_bytes(resource.size as usize)
    }

    /// Copies one resource into a caller-supplied sink.
    pub fn write_to<W: Write>(&mut self, resource: &Resource, sink: &mut W) -> Result<(), PeError> {
        let bytes = self.read(resource)?;
        sink.write_all(bytes)?;
        Ok(())
    }

    /// Extracts every resource under `out_dir`, one subdirectory per type,
    /// overwriting files that already exist. Not atomic: a failure leaves
    /// earlier resources on disk.
    pub fn extract_all(&mut self, resources: &[Resource], out_dir: &Path) -> Result<(), PeError> {
        for resource in resources {
            let dir = out_dir.join(resource.kind.name().as_ref());
            fs::create_dir_all(&dir)?;
            let bytes = self.read(resource)?;
            fs::write(dir.join(format!("{}.{}", resource.name, resource.language)), bytes)?;
        }
        Ok(())
    }
}
