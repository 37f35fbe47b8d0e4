//! Sections: a header plus a typed payload
//!
//! Payloads form a closed sum; which decoder runs is decided by a fixed rule
//! table over the section's type and name, with the name taking precedence
//! for a small allow-list of standard names. Unrecognized types fall back to
//! an opaque byte payload with a warning, which is a deliberate default
//! rather than an error.

use std::ops::Range;

use crate::base::ByteCursor;
use crate::error::{Error, Result};
use crate::header::elf::identification::ElfClass;
use crate::header::section::{SectionHeader, SectionType};

pub mod dynamic;
pub mod gnu;
pub mod note;
pub mod reloc;
pub mod strtab;
pub mod symtab;

use dynamic::DynamicEntry;
use gnu::{GnuHashTable, VersionRequirement};
use note::NoteEntry;
use reloc::RelocationEntry;
use symtab::Symbol;

#[derive(Debug, Clone, PartialEq, Eq)]
/// The decoded payload of a section
pub enum SectionPayload {
    /// An inactive section: only the header exists
    Null,
    /// Opaque program-defined bytes, kept as a range of the backing file
    ProgramBits {
        /// The payload's byte range within the file
        data: Range<usize>,
    },
    /// A section that occupies no file space; its size describes memory only
    NoBits,
    /// A string table, kept as a range of the backing file and scanned
    /// lazily through [strtab::StringTable]
    StringTable {
        /// The table's byte range within the file
        data: Range<usize>,
    },
    /// The link-editing symbol table
    SymbolTable {
        /// The decoded entries, in file order
        symbols: Vec<Symbol>,
    },
    /// The dynamic symbol table
    DynamicSymbolTable {
        /// The decoded entries, in file order
        symbols: Vec<Symbol>,
    },
    /// The program interpreter's path
    InterpreterPath {
        /// The NUL-terminated path string
        path: String,
    },
    /// The dynamic section
    Dynamic {
        /// The decoded entries including the terminator, in file order
        entries: Vec<DynamicEntry>,
        /// The index of the string table resolved for this section's name
        /// offsets; filled by a post-pass once every section is decoded
        string_table: Option<usize>,
    },
    /// A relocation section with explicit addends
    RelocationWithAddend {
        /// The decoded entries, in file order
        entries: Vec<RelocationEntry>,
    },
    /// A relocation section without addends
    Relocation {
        /// The decoded entries, in file order
        entries: Vec<RelocationEntry>,
    },
    /// A note section
    Note {
        /// The decoded entries, in file order
        entries: Vec<NoteEntry>,
    },
    /// The GNU-style symbol hash table
    GnuHash(GnuHashTable),
    /// Per-symbol version indices
    GnuVersion {
        /// One index per symbol of the linked dynamic symbol table
        versions: Vec<u16>,
    },
    /// The version requirement chains
    GnuVersionRequirements {
        /// The decoded requirement records, in file order
        requirements: Vec<VersionRequirement>,
    },
}

impl SectionPayload {
    /// Decode the payload for `header`, with `cursor` seated at the
    /// section's file offset and carrying the section's alignment
    pub(crate) fn decode(
        name: &str,
        header: &SectionHeader,
        cursor: &mut ByteCursor,
        class: ElfClass,
    ) -> Result<Self> {
        let section_type = header.section_type;
        if section_type == SectionType::Null {
            return Ok(Self::Null);
        }
        if section_type == SectionType::StringTable
            || matches!(name, ".shstrtab" | ".strtab" | ".dynstr")
        {
            return Ok(Self::StringTable {
                data: byte_range(header, cursor)?,
            });
        }
        if section_type == SectionType::SymbolTable || name == ".symtab" {
            return Ok(Self::SymbolTable {
                symbols: symtab::parse_symbols(cursor, class, header)?,
            });
        }
        if section_type == SectionType::DynamicSymbolTable || name == ".dynsym" {
            return Ok(Self::DynamicSymbolTable {
                symbols: symtab::parse_symbols(cursor, class, header)?,
            });
        }
        if section_type == SectionType::Dynamic || name == ".dynamic" {
            return Ok(Self::Dynamic {
                entries: dynamic::parse_dynamic(cursor, class, header)?,
                string_table: None,
            });
        }
        if section_type == SectionType::RelocationAddend {
            return Ok(Self::RelocationWithAddend {
                entries: reloc::parse_relocations(cursor, class, header, true)?,
            });
        }
        if section_type == SectionType::Relocation {
            return Ok(Self::Relocation {
                entries: reloc::parse_relocations(cursor, class, header, false)?,
            });
        }
        if section_type == SectionType::Note || name.starts_with(".note") {
            return Ok(Self::Note {
                entries: note::parse_notes(cursor, class, header)?,
            });
        }
        if section_type == SectionType::GnuHash || name == ".gnu.hash" {
            return Ok(Self::GnuHash(gnu::parse_gnu_hash(cursor, class, header)?));
        }
        if section_type == SectionType::GnuVersionSymbols || name == ".gnu.version" {
            return Ok(Self::GnuVersion {
                versions: gnu::parse_versions(cursor, header)?,
            });
        }
        if section_type == SectionType::GnuVersionRequirements || name == ".gnu.version_r" {
            return Ok(Self::GnuVersionRequirements {
                requirements: gnu::parse_version_requirements(cursor, header)?,
            });
        }
        if name == ".interp" {
            return Ok(Self::InterpreterPath {
                path: cursor.with_alignment(1, |cursor| {
                    cursor.set_position(header.file_offset);
                    cursor.read_cstr()
                })?,
            });
        }
        if section_type == SectionType::NoBits {
            return Ok(Self::NoBits);
        }
        if section_type != SectionType::ProgramBits {
            log::warn!(
                "Section {name:?} has unhandled type {section_type:?}, keeping raw bytes"
            );
        }
        Ok(Self::ProgramBits {
            data: byte_range(header, cursor)?,
        })
    }
}

/// The section's byte range within the file, bounds-checked
fn byte_range(header: &SectionHeader, cursor: &ByteCursor) -> Result<Range<usize>> {
    let end = header
        .file_offset
        .checked_add(header.size)
        .filter(|&end| end <= cursor.len())
        .ok_or(Error::UnexpectedEnd {
            offset: header.file_offset,
            wanted: header.size,
            available: cursor.len().saturating_sub(header.file_offset),
        })?;
    Ok(header.file_offset as usize..end as usize)
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One section of an ELF object: its resolved name, its header and its
/// decoded payload
pub struct Section {
    /// The section's name, resolved through the section-name string table
    pub name: String,
    /// The section's header
    pub header: SectionHeader,
    /// The section's decoded payload
    pub payload: SectionPayload,
}

impl Section {
    /// The decoded symbols, when this is a symbol table of either kind
    pub fn symbols(&self) -> Option<&[Symbol]> {
        match &self.payload {
            SectionPayload::SymbolTable { symbols }
            | SectionPayload::DynamicSymbolTable { symbols } => Some(symbols),
            _ => None,
        }
    }

    /// The decoded entries, when this is a dynamic section
    pub fn dynamic_entries(&self) -> Option<&[DynamicEntry]> {
        match &self.payload {
            SectionPayload::Dynamic { entries, .. } => Some(entries),
            _ => None,
        }
    }

    /// The decoded entries, when this is a relocation section of either kind
    pub fn relocations(&self) -> Option<&[RelocationEntry]> {
        match &self.payload {
            SectionPayload::RelocationWithAddend { entries }
            | SectionPayload::Relocation { entries } => Some(entries),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use super::*;
    use crate::base::Endianness;
    use crate::header::section::SectionFlags;

    fn decode(
        name: &str,
        header: &SectionHeader,
        bytes: &[u8],
        class: ElfClass,
    ) -> Result<SectionPayload> {
        let mut cursor = ByteCursor::new(bytes, Endianness::Little);
        cursor.set_position(header.file_offset);
        cursor.with_alignment(header.alignment, |cursor| {
            SectionPayload::decode(name, header, cursor, class)
        })
    }

    #[test]
    fn test_name_takes_precedence_for_interp() {
        let bytes = b"/lib64/ld-linux-x86-64.so.2\0";
        let header = SectionHeader::builder()
            .section_type(SectionType::ProgramBits)
            .flags(SectionFlags::ALLOC)
            .size(bytes.len() as u64)
            .alignment(1)
            .build();
        let payload = decode(".interp", &header, bytes, ElfClass::Elf64).unwrap();
        assert_eq!(
            payload,
            SectionPayload::InterpreterPath {
                path: "/lib64/ld-linux-x86-64.so.2".to_string()
            }
        );
    }

    #[test]
    fn test_progbits_default() {
        let bytes = [0x90u8; 16];
        let header = SectionHeader::builder()
            .section_type(SectionType::ProgramBits)
            .size(16)
            .build();
        let payload = decode(".text", &header, &bytes, ElfClass::Elf64).unwrap();
        assert_eq!(payload, SectionPayload::ProgramBits { data: 0..16 });
    }

    #[test]
    fn test_unhandled_type_falls_back_to_progbits() {
        let bytes = [0u8; 8];
        let header = SectionHeader::builder()
            .section_type(SectionType::Hash)
            .size(8)
            .build();
        let payload = decode(".hash", &header, &bytes, ElfClass::Elf64).unwrap();
        assert_eq!(payload, SectionPayload::ProgramBits { data: 0..8 });
    }

    #[test]
    fn test_nobits_has_no_bytes() {
        // The section's declared size extends far past the file
        let header = SectionHeader::builder()
            .section_type(SectionType::NoBits)
            .size(0x10000)
            .file_offset(4)
            .build();
        let payload = decode(".bss", &header, &[0u8; 8], ElfClass::Elf64).unwrap();
        assert_eq!(payload, SectionPayload::NoBits);
    }

    #[test]
    fn test_progbits_overrunning_file_rejected() {
        let header = SectionHeader::builder()
            .section_type(SectionType::ProgramBits)
            .size(64)
            .file_offset(8)
            .build();
        assert!(matches!(
            decode(".data", &header, &[0u8; 16], ElfClass::Elf64),
            Err(Error::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn test_strtab_by_name() {
        let bytes = b"\0a\0bc\0";
        let header = SectionHeader::builder()
            .section_type(SectionType::ProgramBits)
            .size(bytes.len() as u64)
            .build();
        let payload = decode(".dynstr", &header, bytes, ElfClass::Elf64).unwrap();
        assert_eq!(payload, SectionPayload::StringTable { data: 0..6 });
    }
}
