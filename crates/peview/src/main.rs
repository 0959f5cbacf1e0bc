//! peview - PE header viewer and resource extractor
//!
//! Usage:
//!   peview <binary>                      Dump all headers as text
//!   peview <binary> --json               Dump all headers as JSON
//!   peview <binary> dos-code <out>       Write the DOS stub program
//!   peview <binary> directory <idx> <out>  Write one data directory
//!   peview <binary> section <name> <out> Write a section's raw data
//!   peview <binary> resources            Extract all resources

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use peview_core::{directory_name, JsonReport, TextReport};
use peview_format::{ByteCursor, PeFile, ResourceExtractor, SectionHeader};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "peview")]
#[command(about = "A PE header viewer and resource extractor", long_about = None)]
struct Cli {
    /// Path to the PE file
    binary: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Dump headers as JSON instead of text
    #[arg(short, long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the DOS stub program to a file
    DosCode {
        /// Output file
        output: PathBuf,
    },
    /// Write the contents of a data directory to a file
    Directory {
        /// Data directory index (0-15)
        index: usize,
        /// Output file
        output: PathBuf,
    },
    /// Write a section's raw data to a file
    Section {
        /// Section name, e.g. .text
        name: String,
        /// Output file
        output: PathBuf,
    },
    /// Extract all resources into per-type directories
    Resources {
        /// Section holding the resource tree
        #[arg(short, long, default_value = ".rsrc")]
        section: String,
        /// Output directory
        #[arg(short, long, default_value = "resources")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let data = fs::read(&cli.binary)
        .with_context(|| format!("Failed to read binary: {}", cli.binary.display()))?;
    let pe = PeFile::parse(&data)
        .with_context(|| format!("Failed to parse PE file: {}", cli.binary.display()))?;

    match cli.command {
        None => dump(&pe, cli.json),
        Some(Commands::DosCode { output }) => {
            if pe.dos_code.is_empty() {
                bail!("No DOS code between the DOS and PE headers");
            }
            fs::write(&output, &pe.dos_code)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote {} bytes to {}", pe.dos_code.len(), output.display());
            Ok(())
        }
        Some(Commands::Directory { index, output }) => unpack_directory(&pe, &data, index, &output),
        Some(Commands::Section { name, output }) => unpack_section(&pe, &data, &name, &output),
        Some(Commands::Resources { section, output }) => {
            unpack_resources(&pe, &data, &section, &output)
        }
    }
}

fn dump(pe: &PeFile, json: bool) -> Result<()> {
    if json {
        let mut out = JsonReport::new();
        pe.describe(&mut out);
        println!("{}", serde_json::to_string_pretty(&out.finish())?);
    } else {
        let mut out = TextReport::new();
        pe.describe(&mut out);
        print!("{}", out.finish());
    }
    Ok(())
}

/// Maps an RVA to a file offset through the section containing it.
fn rva_to_offset(pe: &PeFile, rva: u32) -> Option<u64> {
    pe.sections.values().find_map(|section| {
        let span = u64::from(section.virtual_size.max(section.size_of_raw_data));
        if rva >= section.virtual_address
            && u64::from(rva) < u64::from(section.virtual_address) + span
        {
            Some(u64::from(rva - section.virtual_address) + pe.section_raw_start(section))
        } else {
            None
        }
    })
}

fn section_data<'d>(pe: &PeFile, data: &'d [u8], section: &SectionHeader) -> Result<&'d [u8]> {
    let mut cur = ByteCursor::new(data);
    cur.set_pos(pe.section_raw_start(section));
    cur.read_bytes(section.size_of_raw_data as usize)
        .with_context(|| format!("Section {} extends past the end of the file", section.name))
}

fn unpack_directory(pe: &PeFile, data: &[u8], index: usize, output: &Path) -> Result<()> {
    let Some(dir) = pe.directory(index) else {
        bail!("No data directory at index {index}");
    };
    if !dir.is_present() {
        bail!("Data directory {} ({}) is empty", index, directory_name(index));
    }
    let offset = rva_to_offset(pe, dir.base)
        .with_context(|| format!("No section contains RVA {:#x}", dir.base))?;

    let mut cur = ByteCursor::new(data);
    cur.set_pos(offset);
    let bytes = cur
        .read_bytes(dir.size as usize)
        .with_context(|| format!("Directory {} extends past the end of the file", index))?;

    fs::write(output, bytes).with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Wrote {} ({} bytes) to {}",
        directory_name(index),
        bytes.len(),
        output.display()
    );
    Ok(())
}

fn unpack_section(pe: &PeFile, data: &[u8], name: &str, output: &Path) -> Result<()> {
    let Some(section) = pe.section(name) else {
        bail!("No section named {name}");
    };
    let bytes = section_data(pe, data, section)?;
    fs::write(output, bytes).with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Wrote {} ({} bytes) to {}", name, bytes.len(), output.display());
    Ok(())
}

fn unpack_resources(pe: &PeFile, data: &[u8], section_name: &str, output: &Path) -> Result<()> {
    let Some(section) = pe.section(section_name) else {
        bail!("No section named {section_name}");
    };
    let table = pe
        .resource_table(data, section)
        .with_context(|| format!("Failed to decode the resource tree in {section_name}"))?;
    if table.resources.is_empty() {
        println!("No resources in {section_name}");
        return Ok(());
    }

    let mut extractor = ResourceExtractor::new(ByteCursor::new(data));
    extractor
        .extract_all(&table.resources, output)
        .with_context(|| format!("Failed to extract resources to {}", output.display()))?;

    for resource in &table.resources {
        println!(
            "{}/{}.{} ({} bytes)",
            resource.kind.name(),
            resource.name,
            resource.language,
            resource.size
        );
    }
    println!("Extracted {} resources to {}", table.resources.len(), output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use peview_format::OptionalHeader;

    fn header_only_image() -> Vec<u8> {
        let mut data = vec![0u8; 0x80];
        data[0] = b'M';
        data[1] = b'Z';
        data[60..64].copy_from_slice(&0x80u32.to_le_bytes());
        data.extend_from_slice(b"PE\0\0");
        data.extend_from_slice(&0x014Cu16.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes()); // one section
        data.extend_from_slice(&[0u8; 12]);
        data.extend_from_slice(&28u16.to_le_bytes()); // short-COFF optional header
        data.extend_from_slice(&0u16.to_le_bytes());
        let mut optional = vec![0u8; 28];
        optional[0..2].copy_from_slice(&0x10Bu16.to_le_bytes());
        data.extend_from_slice(&optional);

        let mut section = vec![0u8; 40];
        section[..5].copy_from_slice(b".data");
        section[8..12].copy_from_slice(&0x10u32.to_le_bytes()); // virtual size
        section[12..16].copy_from_slice(&0x1000u32.to_le_bytes()); // virtual address
        section[16..20].copy_from_slice(&0x10u32.to_le_bytes()); // raw size
        section[20..24].copy_from_slice(&0x200u32.to_le_bytes()); // raw pointer
        data.extend_from_slice(&section);

        data.resize(0x210, 0);
        data[0x200..0x210].copy_from_slice(b"0123456789abcdef");
        data
    }

    fn put_u16(buf: &mut [u8], at: usize, v: u16) {
        buf[at..at + 2].copy_from_slice(&v.to_le_bytes());
    }

    fn put_u32(buf: &mut [u8], at: usize, v: u32) {
        buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }

    /// Image with a .rsrc section holding one icon resource:
    /// ICON/1.1033 -> "DATA" at rva 0x1080 (file offset 0x180).
    fn resource_image() -> Vec<u8> {
        let mut data = vec![0u8; 0x200];
        data[0] = b'M';
        data[1] = b'Z';
        put_u32(&mut data, 60, 0x40); // lfanew

        data[0x40..0x44].copy_from_slice(b"PE\0\0");
        put_u16(&mut data, 0x44, 0x014C);
        put_u16(&mut data, 0x46, 1); // one section
        put_u16(&mut data, 0x54, 28); // short-COFF optional header
        put_u16(&mut data, 0x58, 0x10B); // optional header magic

        let s = 0x74;
        data[s..s + 5].copy_from_slice(b".rsrc");
        put_u32(&mut data, s + 8, 0x100); // virtual size
        put_u32(&mut data, s + 12, 0x1000); // virtual address
        put_u32(&mut data, s + 16, 0x100); // raw size
        put_u32(&mut data, s + 20, 0x100); // raw pointer

        // resource tree at 0x100: type 3 (icon) -> id 1 -> language 1033
        let t = 0x100;
        put_u16(&mut data, t + 0x0E, 1);
        put_u32(&mut data, t + 0x10, 3);
        put_u32(&mut data, t + 0x14, 0x8000_0020);
        put_u16(&mut data, t + 0x2E, 1);
        put_u32(&mut data, t + 0x30, 1);
        put_u32(&mut data, t + 0x34, 0x8000_0040);
        put_u16(&mut data, t + 0x4E, 1);
        put_u32(&mut data, t + 0x50, 1033);
        put_u32(&mut data, t + 0x54, 0x0000_0060);
        put_u32(&mut data, t + 0x60, 0x1080); // rva
        put_u32(&mut data, t + 0x64, 4); // size

        data[0x180..0x184].copy_from_slice(b"DATA");
        data
    }

    #[test]
    fn resources_are_extracted_into_the_output_directory() {
        let data = resource_image();
        let pe = PeFile::parse(&data).unwrap();

        let out = tempfile::tempdir().unwrap();
        unpack_resources(&pe, &data, ".rsrc", out.path()).unwrap();

        let bytes = fs::read(out.path().join("ICON").join("1.1033")).unwrap();
        assert_eq!(bytes, b"DATA");
    }

    #[test]
    fn rva_mapping_goes_through_the_owning_section() {
        let data = header_only_image();
        let pe = PeFile::parse(&data).unwrap();
        assert!(matches!(pe.optional_header, OptionalHeader::Coff(_)));

        assert_eq!(rva_to_offset(&pe, 0x1000), Some(0x200));
        assert_eq!(rva_to_offset(&pe, 0x1008), Some(0x208));
        assert_eq!(rva_to_offset(&pe, 0x2000), None);
    }

    #[test]
    fn section_data_reads_the_raw_span() {
        let data = header_only_image();
        let pe = PeFile::parse(&data).unwrap();
        let section = pe.section(".data").unwrap();
        assert_eq!(section_data(&pe, &data, section).unwrap(), b"0123456789abcdef");
    }
}
