//! Relocation sections, with and without explicit addends
//!
//! The packed `info` word splits into a symbol index and a type code; the
//! split point depends on the class (`8` bits of type for 32-bit files, `32`
//! for 64-bit files). Type codes are machine-specific and kept raw; see
//! [crate::arch::x86_64::X86_64RelocationType] for the x86-64 decoding.

use crate::base::ByteCursor;
use crate::error::{Error, Result};
use crate::header::elf::identification::ElfClass;
use crate::header::section::SectionHeader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// One relocation entry
pub struct RelocationEntry {
    /// The location to patch: a virtual address, or a section offset in
    /// relocatable files
    pub offset: u64,
    /// The raw packed symbol-index/type word
    pub info: u64,
    /// The index of the symbol the relocation refers to, from the high part
    /// of the info word
    pub symbol_index: u32,
    /// The machine-specific relocation type, from the low part of the info
    /// word
    pub type_code: u32,
    /// The explicit addend; present only in addend relocation sections
    pub addend: Option<i64>,
}

impl RelocationEntry {
    /// Decode one entry at the cursor's current position
    fn parse(cursor: &mut ByteCursor, class: ElfClass, with_addend: bool) -> Result<Self> {
        let offset = class.read_word(cursor)?;
        let info = class.read_word(cursor)?;
        let (symbol_index, type_code) = match class {
            ElfClass::Elf32 => ((info >> 8) as u32, (info & 0xFF) as u32),
            ElfClass::Elf64 => ((info >> 32) as u32, (info & 0xFFFF_FFFF) as u32),
        };
        let addend = if with_addend {
            Some(match class {
                ElfClass::Elf32 => cursor.read_u32()? as i32 as i64,
                ElfClass::Elf64 => cursor.read_u64()? as i64,
            })
        } else {
            None
        };
        Ok(Self {
            offset,
            info,
            symbol_index,
            type_code,
            addend,
        })
    }
}

/// Decode every entry of a relocation section
///
/// The stride is the header's declared entry size and the count is
/// `size / entry_size`.
pub fn parse_relocations(
    cursor: &mut ByteCursor,
    class: ElfClass,
    header: &SectionHeader,
    with_addend: bool,
) -> Result<Vec<RelocationEntry>> {
    let word = class.word_size();
    let minimum = if with_addend { word * 3 } else { word * 2 };
    if header.entry_size < minimum {
        return Err(Error::InvalidFieldValue {
            field: "relocation entry size",
            expected: "two words, or three for addend relocations",
            actual: header.entry_size,
        });
    }
    let count = header.size / header.entry_size;
    cursor.with_alignment(1, |cursor| {
        let mut entries = Vec::new();
        for index in 0..count {
            cursor.set_position(header.file_offset + index * header.entry_size);
            entries.push(RelocationEntry::parse(cursor, class, with_addend)?);
        }
        Ok(entries)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use super::*;
    use crate::base::Endianness;
    use crate::header::section::SectionType;

    #[test]
    fn test_rela_64() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0x601018u64.to_le_bytes()); // Offset
        bytes.extend_from_slice(&0x0000_0003_0000_0007u64.to_le_bytes()); // Info
        bytes.extend_from_slice(&(-8i64).to_le_bytes()); // Addend
        let header = SectionHeader::builder()
            .section_type(SectionType::RelocationAddend)
            .size(bytes.len() as u64)
            .entry_size(24)
            .build();
        let mut cursor = ByteCursor::new(&bytes, Endianness::Little);
        let entries = parse_relocations(&mut cursor, ElfClass::Elf64, &header, true).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].offset, 0x601018);
        assert_eq!(entries[0].symbol_index, 3);
        assert_eq!(entries[0].type_code, 7);
        assert_eq!(entries[0].addend, Some(-8));
    }

    #[test]
    fn test_rel_32_info_split() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0x0804_9f10u32.to_le_bytes()); // Offset
        bytes.extend_from_slice(&0x0000_2906u32.to_le_bytes()); // Info
        let header = SectionHeader::builder()
            .section_type(SectionType::Relocation)
            .size(bytes.len() as u64)
            .entry_size(8)
            .build();
        let mut cursor = ByteCursor::new(&bytes, Endianness::Little);
        let entries = parse_relocations(&mut cursor, ElfClass::Elf32, &header, false).unwrap();
        assert_eq!(entries[0].symbol_index, 0x29);
        assert_eq!(entries[0].type_code, 0x06);
        assert_eq!(entries[0].addend, None);
    }

    #[test]
    fn test_zero_entry_size_rejected() {
        let header = SectionHeader::builder()
            .section_type(SectionType::RelocationAddend)
            .size(24)
            .entry_size(0)
            .build();
        let bytes = [0u8; 24];
        let mut cursor = ByteCursor::new(&bytes, Endianness::Little);
        assert!(matches!(
            parse_relocations(&mut cursor, ElfClass::Elf64, &header, true),
            Err(Error::InvalidFieldValue {
                field: "relocation entry size",
                ..
            })
        ));
    }

    #[test]
    fn test_oversized_stride_skips_padding() {
        let mut bytes = Vec::new();
        for index in 0..2u64 {
            bytes.extend_from_slice(&(0x1000 + index * 8).to_le_bytes());
            bytes.extend_from_slice(&0x0000_0001_0000_0008u64.to_le_bytes());
            bytes.extend_from_slice(&0u64.to_le_bytes()); // Addend
            bytes.extend_from_slice(&[0xAA; 8]); // Padding the stride skips
        }
        let header = SectionHeader::builder()
            .section_type(SectionType::RelocationAddend)
            .size(bytes.len() as u64)
            .entry_size(32)
            .build();
        let mut cursor = ByteCursor::new(&bytes, Endianness::Little);
        let entries = parse_relocations(&mut cursor, ElfClass::Elf64, &header, true).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].offset, 0x1008);
    }
}
