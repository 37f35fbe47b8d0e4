//! The top-level ELF reader
//!
//! Parsing runs in linear phases: file header, program header table, section
//! header table, section-name resolution, per-section payload decode, and a
//! post-pass linking each dynamic section to its string table. Any failure
//! aborts the whole parse; the model is only assembled once every phase has
//! succeeded, so no partial model can escape.

use crate::base::{ByteCursor, Endianness};
use crate::error::{Error, Result};
use crate::header::elf::FileHeader;
use crate::header::program::ProgramHeader;
use crate::header::section::{SectionHeader, SectionType};
use crate::section::dynamic::DynamicTag;
use crate::section::strtab::StringTable;
use crate::section::{Section, SectionPayload};
use crate::Elf;

/// Parse `bytes` into a model
///
/// Equivalent to [Elf::read]; the reader is stateless between invocations
/// and may run concurrently from multiple threads on separate inputs.
pub fn read(bytes: Vec<u8>) -> Result<Elf> {
    let (header, segments, sections) = {
        let mut cursor = ByteCursor::new(&bytes, Endianness::Little);
        let header = FileHeader::parse(&mut cursor)?;
        let segments = parse_segments(&mut cursor, &header)?;
        let section_headers = parse_section_headers(&mut cursor, &header)?;
        let names = resolve_names(&bytes, &header, &section_headers)?;
        let mut sections = decode_payloads(&mut cursor, &header, section_headers, names)?;
        link_dynamic_string_tables(&mut sections)?;
        (header, segments, sections)
    };
    let names = sections
        .iter()
        .enumerate()
        .map(|(index, section)| (section.name.clone(), index))
        .collect();
    Ok(Elf {
        bytes,
        header,
        segments,
        sections,
        names,
    })
}

/// Parse the program header table
///
/// A zero table offset means the file carries no program headers, whatever
/// the declared count says; the header still reports the count.
fn parse_segments(cursor: &mut ByteCursor, header: &FileHeader) -> Result<Vec<ProgramHeader>> {
    let mut segments = Vec::new();
    if header.program_header_offset == 0 {
        return Ok(segments);
    }
    let class = header.identification.class;
    let stride = header.program_header_entry_size as u64;
    for index in 0..header.program_header_entry_count as u64 {
        cursor.set_position(header.program_header_offset + index * stride);
        segments.push(ProgramHeader::parse(cursor, class)?);
    }
    Ok(segments)
}

/// Parse the section header table; a zero table offset means no sections
fn parse_section_headers(
    cursor: &mut ByteCursor,
    header: &FileHeader,
) -> Result<Vec<SectionHeader>> {
    let mut headers = Vec::new();
    if header.section_header_offset == 0 {
        return Ok(headers);
    }
    let class = header.identification.class;
    let stride = header.section_header_entry_size as u64;
    for index in 0..header.section_header_entry_count as u64 {
        cursor.set_position(header.section_header_offset + index * stride);
        headers.push(SectionHeader::parse(cursor, class)?);
    }
    Ok(headers)
}

/// Resolve every section's name through the section-name string table
///
/// A zero table index means the file carries no section names; every name
/// resolves empty, and the payload dispatcher selects by type alone.
fn resolve_names(
    bytes: &[u8],
    header: &FileHeader,
    section_headers: &[SectionHeader],
) -> Result<Vec<String>> {
    if section_headers.is_empty() {
        return Ok(Vec::new());
    }
    let index = header.section_name_table_index as usize;
    if index == 0 {
        return Ok(vec![String::new(); section_headers.len()]);
    }
    let Some(table_header) = section_headers.get(index) else {
        return Err(Error::CrossReferenceFailed {
            kind: "section name table",
            detail: format!(
                "index {index} is outside a table of {} sections",
                section_headers.len()
            ),
        });
    };
    if table_header.section_type != SectionType::StringTable {
        return Err(Error::CrossReferenceFailed {
            kind: "section name table",
            detail: format!(
                "section {index} has type {:?}, not a string table",
                table_header.section_type
            ),
        });
    }
    let start = table_header.file_offset;
    let end = start
        .checked_add(table_header.size)
        .filter(|&end| end <= bytes.len() as u64)
        .ok_or(Error::UnexpectedEnd {
            offset: start,
            wanted: table_header.size,
            available: (bytes.len() as u64).saturating_sub(start),
        })?;
    let table = StringTable::new(&bytes[start as usize..end as usize]);
    section_headers
        .iter()
        .map(|section| table.string_at(section.name_offset as u64))
        .collect()
}

/// Run the payload decoder for each section, under the section's declared
/// alignment
fn decode_payloads(
    cursor: &mut ByteCursor,
    header: &FileHeader,
    section_headers: Vec<SectionHeader>,
    names: Vec<String>,
) -> Result<Vec<Section>> {
    let class = header.identification.class;
    let mut sections = Vec::new();
    for (section_header, name) in section_headers.into_iter().zip(names) {
        cursor.set_position(section_header.file_offset);
        let payload = cursor.with_alignment(section_header.alignment, |cursor| {
            SectionPayload::decode(&name, &section_header, cursor, class)
        })?;
        sections.push(Section {
            name,
            header: section_header,
            payload,
        });
    }
    Ok(sections)
}

/// Link each dynamic section to the string table its name offsets index
///
/// The `DT_STRTAB` virtual address is authoritative when present; a dynamic
/// section without one falls back to its header's link index.
fn link_dynamic_string_tables(sections: &mut [Section]) -> Result<()> {
    let mut updates = Vec::new();
    for (index, section) in sections.iter().enumerate() {
        let SectionPayload::Dynamic { entries, .. } = &section.payload else {
            continue;
        };
        let address = entries
            .iter()
            .find(|entry| entry.tag == DynamicTag::StringTable)
            .map(|entry| entry.value);
        let target = match address {
            Some(address) => {
                let position = sections
                    .iter()
                    .position(|candidate| candidate.header.virtual_address == address)
                    .ok_or_else(|| Error::CrossReferenceFailed {
                        kind: "dynamic string table",
                        detail: format!(
                            "no section's virtual address matches DT_STRTAB {address:#x}"
                        ),
                    })?;
                if !matches!(sections[position].payload, SectionPayload::StringTable { .. }) {
                    return Err(Error::CrossReferenceFailed {
                        kind: "dynamic string table",
                        detail: format!(
                            "the section at DT_STRTAB {address:#x} is not a string table"
                        ),
                    });
                }
                Some(position)
            }
            None => {
                let link = section.header.link as usize;
                sections
                    .get(link)
                    .filter(|_| link != 0)
                    .filter(|linked| {
                        matches!(linked.payload, SectionPayload::StringTable { .. })
                    })
                    .map(|_| link)
            }
        };
        if let Some(target) = target {
            updates.push((index, target));
        }
    }
    for (index, target) in updates {
        if let SectionPayload::Dynamic { string_table, .. } = &mut sections[index].payload {
            *string_table = Some(target);
        }
    }
    Ok(())
}
