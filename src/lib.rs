//! Definitions and a reader for ELF object files
//!
//! The crate ingests a byte vector purporting to be an ELF object and
//! produces an immutable, queryable [Elf] model suitable for a
//! `readelf`-style dump: the file header, the program header table, and a
//! section list whose payloads are decoded into a closed sum. Both classes
//! (32/64-bit) and both byte orders are handled at runtime, chosen by the
//! file's own identifier bytes.
//!
//! Parsing is fail-fast: any violation surfaces a typed
//! [error::Error] and no partial model is exposed. Recoverable oddities are
//! reported as warnings through the [log] facade instead.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic, missing_docs)]

use crate::collections::FrozenMap;
use crate::error::{Error, Result};
use crate::header::elf::FileHeader;
use crate::header::program::{ProgramHeader, SegmentType};
use crate::header::section::{SectionFlags, SectionHeader, SectionType};
use crate::section::dynamic::{DynamicEntry, DynamicTag};
use crate::section::gnu::VersionRequirement;
use crate::section::reloc::RelocationEntry;
use crate::section::strtab::StringTable;
use crate::section::symtab::Symbol;
use crate::section::{Section, SectionPayload};

pub mod arch;
pub mod base;
pub mod collections;
pub mod error;
pub mod header;
pub mod logging;
pub mod reader;
pub mod section;

#[macro_export]
/// Define a closed set of codes as an enum whose reserved ranges map to
/// code-retaining variants
///
/// Known codes decode to their enumerant; a code inside one of the declared
/// reserved ranges decodes to that range's variant with the raw code
/// retained and a warning logged; anything else is an
/// [error::Error::InvalidEnumCode]. The known-code lookup doubles as the
/// set's [num_traits::FromPrimitive] implementation.
macro_rules! elf_enum {
    (
        $(#[$enum_attr:meta])*
        pub enum $enum_name:ident : $repr:ty {
            $(
                $(#[$variant_attr:meta])*
                $variant_name:ident = $variant_value:literal,
            )*
            @reserved {
                $(
                    $(#[$reserved_attr:meta])*
                    $reserved_name:ident ($category:literal) =
                        $( $reserved_lo:literal ..= $reserved_hi:literal )|+,
                )*
            }
        }
    ) => {
        $(#[$enum_attr])*
        pub enum $enum_name {
            $(
                $(#[$variant_attr])*
                $variant_name,
            )*
            $(
                $(#[$reserved_attr])*
                $reserved_name($repr),
            )*
        }

        impl ::num_traits::FromPrimitive for $enum_name {
            fn from_i64(n: i64) -> Option<Self> {
                u64::try_from(n).ok().and_then(Self::from_u64)
            }

            fn from_u64(n: u64) -> Option<Self> {
                match n {
                    $(
                        $variant_value => Some(Self::$variant_name),
                    )*
                    _ => None,
                }
            }
        }

        impl $enum_name {
            /// Decode a raw code into an enumerant of this set
            pub fn from_code(code: $repr) -> $crate::error::Result<Self> {
                if let Some(known) =
                    <Self as ::num_traits::FromPrimitive>::from_u64(code as u64)
                {
                    return Ok(known);
                }
                match code {
                    $(
                        $( $reserved_lo..=$reserved_hi )|+ => {
                            ::log::warn!(
                                concat!(
                                    stringify!($enum_name),
                                    " code {:#x} is ",
                                    $category
                                ),
                                code
                            );
                            Ok(Self::$reserved_name(code))
                        }
                    )*
                    _ => Err($crate::error::Error::InvalidEnumCode {
                        which: stringify!($enum_name),
                        value: code as u64,
                    }),
                }
            }

            /// The raw code for this enumerant
            pub fn code(&self) -> $repr {
                match self {
                    $(
                        Self::$variant_name => $variant_value,
                    )*
                    $(
                        Self::$reserved_name(code) => *code,
                    )*
                }
            }
        }
    };
}

/// Whether `section` belongs to `segment` in the loader's view
///
/// A section maps into a segment when its virtual address range starts
/// inside the segment's memory image, it is allocated, it agrees with the
/// segment on thread-local storage, it is active, and it is not empty.
pub fn section_maps_to_segment(section: &SectionHeader, segment: &ProgramHeader) -> bool {
    section.section_type != SectionType::Null
        && section.size != 0
        && section.flags.contains(SectionFlags::ALLOC)
        && (section.flags.contains(SectionFlags::TLS)
            == (segment.segment_type == SegmentType::ThreadLocalStorage))
        && section
            .virtual_address
            .checked_sub(segment.virtual_address)
            .is_some_and(|delta| delta < segment.memory_size)
}

#[derive(Debug, Clone)]
/// A parsed ELF object: the file header, the program header table and the
/// section list, backed by the file's own bytes
///
/// The model owns the backing byte vector for its lifetime; payloads that
/// expose raw bytes do so as borrowed views tied to it. Construction happens
/// once in [Elf::read] and the model is immutable afterwards.
pub struct Elf {
    /// The file's bytes
    pub(crate) bytes: Vec<u8>,
    /// The parsed file header
    pub(crate) header: FileHeader,
    /// The parsed program header table, in file order
    pub(crate) segments: Vec<ProgramHeader>,
    /// The decoded sections, ordered by section index
    pub(crate) sections: Vec<Section>,
    /// Section name to first index with that name
    pub(crate) names: FrozenMap<String, usize>,
}

impl Elf {
    /// Parse an ELF object from its bytes
    pub fn read(bytes: Vec<u8>) -> Result<Self> {
        reader::read(bytes)
    }

    /// Read a file from disk and parse it as an ELF object
    pub fn read_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Self::read(std::fs::read(path)?)
    }

    /// The parsed file header
    pub fn file_header(&self) -> &FileHeader {
        &self.header
    }

    /// The program header table, in file order
    pub fn segments(&self) -> &[ProgramHeader] {
        &self.segments
    }

    /// The program header at `index`
    pub fn segment(&self, index: usize) -> Option<&ProgramHeader> {
        self.segments.get(index)
    }

    /// The sections, ordered by section index
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The section at `index`
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// The number of sections
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// The first section named `name`
    pub fn section_by_name(&self, name: &str) -> Option<&Section> {
        self.names.get(name).and_then(|&index| self.sections.get(index))
    }

    /// The raw bytes of the section at `index`, as a view into the backing
    /// vector
    ///
    /// Sections without file bytes (Null, NoBits) yield an empty slice.
    pub fn section_data(&self, index: usize) -> Option<&[u8]> {
        let section = self.sections.get(index)?;
        match &section.payload {
            SectionPayload::ProgramBits { data } | SectionPayload::StringTable { data } => {
                self.bytes.get(data.clone())
            }
            SectionPayload::Null | SectionPayload::NoBits => Some(&[]),
            _ => {
                let start = section.header.file_offset as usize;
                let end = start.checked_add(section.header.size as usize)?;
                self.bytes.get(start..end)
            }
        }
    }

    /// The section at `index`, or a cross-reference error naming `kind`
    fn section_or_err(&self, index: usize, kind: &'static str) -> Result<&Section> {
        self.sections.get(index).ok_or_else(|| Error::CrossReferenceFailed {
            kind,
            detail: format!(
                "index {index} is outside a table of {} sections",
                self.sections.len()
            ),
        })
    }

    /// A view over the string table section at `index`
    pub fn string_table(&self, index: usize) -> Result<StringTable<'_>> {
        let section = self.section_or_err(index, "string table")?;
        let SectionPayload::StringTable { data } = &section.payload else {
            return Err(Error::CrossReferenceFailed {
                kind: "string table",
                detail: format!("section {index} is not a string table"),
            });
        };
        Ok(StringTable::new(&self.bytes[data.clone()]))
    }

    /// The string table linked from the section at `index` through its
    /// header's link field; used by symbol tables and version requirements
    pub fn linked_string_table(&self, index: usize) -> Result<StringTable<'_>> {
        let section = self.section_or_err(index, "linked string table")?;
        self.string_table(section.header.link as usize)
    }

    /// Resolve a symbol's name through its table's linked string table
    pub fn symbol_name(&self, table_index: usize, symbol: &Symbol) -> Result<String> {
        self.linked_string_table(table_index)?
            .string_at(symbol.name_offset as u64)
    }

    /// The program interpreter's path, when the file declares one
    pub fn interpreter(&self) -> Option<&str> {
        self.sections.iter().find_map(|section| match &section.payload {
            SectionPayload::InterpreterPath { path } => Some(path.as_str()),
            _ => None,
        })
    }

    /// The first dynamic section, when the file has one
    pub fn dynamic_section(&self) -> Option<&Section> {
        self.sections
            .iter()
            .find(|section| matches!(section.payload, SectionPayload::Dynamic { .. }))
    }

    /// Resolve the string value of a dynamic entry whose value is a string
    /// table offset; `Ok(None)` for any other tag
    pub fn dynamic_string(&self, entry: &DynamicEntry) -> Result<Option<String>> {
        if !entry.tag.is_string_offset() {
            return Ok(None);
        }
        for section in &self.sections {
            if let SectionPayload::Dynamic { string_table, .. } = &section.payload {
                let index = string_table.ok_or_else(|| Error::CrossReferenceFailed {
                    kind: "dynamic string table",
                    detail: "the dynamic section has no resolved string table".to_string(),
                })?;
                let table = self.string_table(index)?;
                return table.string_at(entry.value).map(Some);
            }
        }
        Ok(None)
    }

    /// The names of the libraries the file declares as needed
    pub fn needed_libraries(&self) -> Result<Vec<String>> {
        let mut libraries = Vec::new();
        if let Some(section) = self.dynamic_section() {
            if let Some(entries) = section.dynamic_entries() {
                for entry in entries.iter().filter(|entry| entry.tag == DynamicTag::Needed) {
                    if let Some(name) = self.dynamic_string(entry)? {
                        libraries.push(name);
                    }
                }
            }
        }
        Ok(libraries)
    }

    /// The per-symbol version indices, when the file carries a GNU version
    /// section
    pub fn version_indices(&self) -> Option<&[u16]> {
        self.sections.iter().find_map(|section| match &section.payload {
            SectionPayload::GnuVersion { versions } => Some(versions.as_slice()),
            _ => None,
        })
    }

    /// The version requirement records and their section index, when the
    /// file carries them
    pub fn version_requirements(&self) -> Option<(usize, &[VersionRequirement])> {
        self.sections
            .iter()
            .enumerate()
            .find_map(|(index, section)| match &section.payload {
                SectionPayload::GnuVersionRequirements { requirements } => {
                    Some((index, requirements.as_slice()))
                }
                _ => None,
            })
    }

    /// Translate a version index from the version table to a version name
    ///
    /// Index 0 is local and index 1 is global; both translate to `None`, as
    /// does any index when the file has no requirement chains (the index
    /// then names a version this file itself defines). The hidden bit is
    /// ignored. An index absent from present chains is a cross-reference
    /// error.
    pub fn version_name(&self, version: u16) -> Result<Option<String>> {
        let index = version & 0x7fff;
        if index <= 1 {
            return Ok(None);
        }
        let Some((section_index, requirements)) = self.version_requirements() else {
            return Ok(None);
        };
        for requirement in requirements {
            for aux in &requirement.aux {
                if aux.index == index {
                    let table = self.linked_string_table(section_index)?;
                    return table.string_at(aux.name_offset as u64).map(Some);
                }
            }
        }
        Err(Error::CrossReferenceFailed {
            kind: "symbol version",
            detail: format!("no requirement chain carries version index {index}"),
        })
    }

    /// Resolve the symbol a relocation refers to, with an `@version` suffix
    /// when the symbol table is the dynamic one and a version applies
    ///
    /// Relocations against symbol 0 resolve to `None`.
    pub fn relocation_symbol_name(
        &self,
        relocation_section: usize,
        entry: &RelocationEntry,
    ) -> Result<Option<String>> {
        if entry.symbol_index == 0 {
            return Ok(None);
        }
        let relocation = self.section_or_err(relocation_section, "relocation section")?;
        let table_index = relocation.header.link as usize;
        let table = self.section_or_err(table_index, "relocation symbol table")?;
        let Some(symbols) = table.symbols() else {
            return Err(Error::CrossReferenceFailed {
                kind: "relocation symbol table",
                detail: format!("section {table_index} is not a symbol table"),
            });
        };
        let symbol = symbols.get(entry.symbol_index as usize).ok_or_else(|| {
            Error::CrossReferenceFailed {
                kind: "relocation symbol",
                detail: format!(
                    "symbol index {} is outside a table of {} symbols",
                    entry.symbol_index,
                    symbols.len()
                ),
            }
        })?;
        let name = self.symbol_name(table_index, symbol)?;
        let version = if matches!(table.payload, SectionPayload::DynamicSymbolTable { .. }) {
            self.version_indices()
                .and_then(|versions| versions.get(entry.symbol_index as usize).copied())
                .map(|version| self.version_name(version))
                .transpose()?
                .flatten()
        } else {
            None
        };
        Ok(Some(match version {
            Some(version) => format!("{name}@{version}"),
            None => name,
        }))
    }

    /// The indices of the sections that belong to the segment at `index` in
    /// the loader's view
    ///
    /// Each section appears at most once; an out-of-range segment index
    /// yields no sections.
    pub fn sections_of_segment(&self, index: usize) -> Vec<usize> {
        let Some(segment) = self.segments.get(index) else {
            return Vec::new();
        };
        self.sections
            .iter()
            .enumerate()
            .filter(|(_, section)| section_maps_to_segment(&section.header, segment))
            .map(|(index, _)| index)
            .collect()
    }
}

#[allow(clippy::unwrap_used, clippy::panic)]
#[cfg(test)]
mod test {
    use super::*;
    use crate::header::elf::{ElfMachine, ElfType};
    use crate::header::program::SegmentFlags;
    use crate::section::note::NoteBody;
    use crate::section::symtab::{SymbolBinding, SymbolType};

    fn push_u16(image: &mut Vec<u8>, value: u16) {
        image.extend_from_slice(&value.to_le_bytes());
    }

    fn push_u32(image: &mut Vec<u8>, value: u32) {
        image.extend_from_slice(&value.to_le_bytes());
    }

    fn push_u64(image: &mut Vec<u8>, value: u64) {
        image.extend_from_slice(&value.to_le_bytes());
    }

    fn append(image: &mut Vec<u8>, bytes: &[u8]) -> u64 {
        let offset = image.len() as u64;
        image.extend_from_slice(bytes);
        offset
    }

    /// Accumulates a section-name string table, returning each name's offset
    struct NameTable {
        bytes: Vec<u8>,
    }

    impl NameTable {
        fn new() -> Self {
            Self { bytes: vec![0] }
        }

        fn add(&mut self, name: &str) -> u32 {
            let offset = self.bytes.len() as u32;
            self.bytes.extend_from_slice(name.as_bytes());
            self.bytes.push(0);
            offset
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push_section_header(
        image: &mut Vec<u8>,
        name_offset: u32,
        section_type: u32,
        flags: u64,
        virtual_address: u64,
        file_offset: u64,
        size: u64,
        link: u32,
        info: u32,
        alignment: u64,
        entry_size: u64,
    ) {
        push_u32(image, name_offset);
        push_u32(image, section_type);
        push_u64(image, flags);
        push_u64(image, virtual_address);
        push_u64(image, file_offset);
        push_u64(image, size);
        push_u32(image, link);
        push_u32(image, info);
        push_u64(image, alignment);
        push_u64(image, entry_size);
    }

    #[allow(clippy::too_many_arguments)]
    fn write_program_header(
        image: &mut Vec<u8>,
        at: usize,
        segment_type: u32,
        flags: u32,
        offset: u64,
        virtual_address: u64,
        file_size: u64,
        memory_size: u64,
    ) {
        let mut entry = Vec::new();
        push_u32(&mut entry, segment_type);
        push_u32(&mut entry, flags);
        push_u64(&mut entry, offset);
        push_u64(&mut entry, virtual_address);
        push_u64(&mut entry, virtual_address);
        push_u64(&mut entry, file_size);
        push_u64(&mut entry, memory_size);
        push_u64(&mut entry, 0); // Alignment
        image[at..at + 56].copy_from_slice(&entry);
    }

    /// A synthetic 64-bit little-endian shared object exercising every
    /// payload decoder: interpreter, code, dynamic symbols with versioned
    /// imports, relocations, a GNU hash table, a dynamic section and a
    /// build-id note
    fn sample_object() -> Vec<u8> {
        let mut names = NameTable::new();
        let n_interp = names.add(".interp");
        let n_text = names.add(".text");
        let n_dynstr = names.add(".dynstr");
        let n_dynsym = names.add(".dynsym");
        let n_versym = names.add(".gnu.version");
        let n_verneed = names.add(".gnu.version_r");
        let n_hash = names.add(".gnu.hash");
        let n_rela = names.add(".rela.dyn");
        let n_dynamic = names.add(".dynamic");
        let n_note = names.add(".note.gnu.build-id");
        let n_bss = names.add(".bss");
        let n_shstrtab = names.add(".shstrtab");

        // Header (64) and two program headers (2 * 56), patched below
        let mut image = vec![0u8; 64 + 112];

        let interp = b"/lib64/ld-linux-x86-64.so.2\0";
        let interp_offset = append(&mut image, interp);

        let text = [0x90u8; 16];
        let text_offset = append(&mut image, &text);

        let mut dynstr = vec![0u8];
        dynstr.extend_from_slice(b"libc.so.6\0"); // Offset 1
        dynstr.extend_from_slice(b"GLIBC_2.2.5\0"); // Offset 11
        dynstr.extend_from_slice(b"printf\0"); // Offset 23
        dynstr.extend_from_slice(b"mylib.so\0"); // Offset 30
        let dynstr_offset = append(&mut image, &dynstr);

        let mut dynsym = vec![0u8; 24]; // Null symbol
        push_u32(&mut dynsym, 23); // Name: printf
        dynsym.push(0x12); // Global function
        dynsym.push(0);
        push_u16(&mut dynsym, 0); // Undefined section
        push_u64(&mut dynsym, 0);
        push_u64(&mut dynsym, 0);
        let dynsym_offset = append(&mut image, &dynsym);

        let mut versym = Vec::new();
        push_u16(&mut versym, 0);
        push_u16(&mut versym, 2);
        let versym_offset = append(&mut image, &versym);

        let mut verneed = Vec::new();
        push_u16(&mut verneed, 1); // Structure version
        push_u16(&mut verneed, 1); // One auxiliary entry
        push_u32(&mut verneed, 1); // File: libc.so.6
        push_u32(&mut verneed, 16); // Auxiliary entries follow the record
        push_u32(&mut verneed, 0); // Last record
        push_u32(&mut verneed, 0x0b79_2063); // Hash of the version name
        push_u16(&mut verneed, 0);
        push_u16(&mut verneed, 2); // Version index 2
        push_u32(&mut verneed, 11); // Name: GLIBC_2.2.5
        push_u32(&mut verneed, 0); // Last auxiliary entry
        let verneed_offset = append(&mut image, &verneed);

        let mut hash = Vec::new();
        push_u32(&mut hash, 1); // One bucket
        push_u32(&mut hash, 1); // First covered symbol
        push_u32(&mut hash, 1); // One bloom word
        push_u32(&mut hash, 6); // Bloom shift
        push_u64(&mut hash, u64::MAX);
        push_u32(&mut hash, 1); // Bucket 0 chains from symbol 1
        push_u32(&mut hash, crate::section::gnu::gnu_hash("printf") | 1);
        let hash_offset = append(&mut image, &hash);

        let mut rela = Vec::new();
        push_u64(&mut rela, 0x40_0810); // Patch location
        push_u64(&mut rela, (1 << 32) | 7); // Symbol 1, jump slot
        push_u64(&mut rela, 0x10u64); // Addend
        let rela_offset = append(&mut image, &rela);

        let mut dynamic = Vec::new();
        for (tag, value) in [
            (1u64, 1u64), // Needed: libc.so.6
            (14, 30), // Shared object name: mylib.so
            (5, 0x40_0400), // String table address
            (6, 0x40_0500), // Symbol table address
            (0, 0),
        ] {
            push_u64(&mut dynamic, tag);
            push_u64(&mut dynamic, value);
        }
        let dynamic_offset = append(&mut image, &dynamic);

        let mut note = Vec::new();
        push_u32(&mut note, 4); // Owner size
        push_u32(&mut note, 8); // Descriptor size
        push_u32(&mut note, 3); // Build-id
        note.extend_from_slice(b"GNU\0");
        note.extend_from_slice(&[0xAB, 0xCD, 0xEF, 0x01, 0x23, 0x45, 0x67, 0x89]);
        let note_offset = append(&mut image, &note);

        let shstrtab_offset = append(&mut image, &names.bytes);
        let shstrtab_size = names.bytes.len() as u64;

        let alloc = 0x2u64;
        let section_header_offset = image.len() as u64;
        push_section_header(&mut image, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0);
        push_section_header(
            &mut image, n_interp, 1, alloc, 0x40_0200, interp_offset,
            interp.len() as u64, 0, 0, 1, 0,
        );
        push_section_header(
            &mut image, n_text, 1, 0x6, 0x40_0300, text_offset, 16, 0, 0, 16, 0,
        );
        push_section_header(
            &mut image, n_dynstr, 3, alloc, 0x40_0400, dynstr_offset,
            dynstr.len() as u64, 0, 0, 1, 0,
        );
        push_section_header(
            &mut image, n_dynsym, 11, alloc, 0x40_0500, dynsym_offset, 48, 3, 1, 8, 24,
        );
        push_section_header(
            &mut image, n_versym, 0x6fff_ffff, alloc, 0x40_0600, versym_offset, 4, 4, 0, 2, 2,
        );
        push_section_header(
            &mut image, n_verneed, 0x6fff_fffe, alloc, 0x40_0650, verneed_offset, 32, 3, 1, 4, 0,
        );
        push_section_header(
            &mut image, n_hash, 0x6fff_fff6, alloc, 0x40_0700, hash_offset, 32, 4, 0, 8, 0,
        );
        push_section_header(
            &mut image, n_rela, 4, alloc, 0x40_0800, rela_offset, 24, 4, 0, 8, 24,
        );
        push_section_header(
            &mut image, n_dynamic, 6, 0x3, 0x40_0900, dynamic_offset, 80, 3, 0, 8, 16,
        );
        push_section_header(
            &mut image, n_note, 7, alloc, 0x40_0100, note_offset, 24, 0, 0, 4, 0,
        );
        push_section_header(
            &mut image, n_bss, 8, 0x3, 0x40_0a00, dynamic_offset, 0x40, 0, 0, 16, 0,
        );
        push_section_header(
            &mut image, n_shstrtab, 3, 0, 0, shstrtab_offset, shstrtab_size, 0, 0, 1, 0,
        );

        // Program headers: one load segment covering the image, one dynamic
        write_program_header(
            &mut image, 64, 1, 0x5, 0, 0x40_0000, 0x1000, 0x1000,
        );
        write_program_header(
            &mut image, 120, 2, 0x6, dynamic_offset, 0x40_0900, 80, 80,
        );

        // File header
        let header = [
            0x7Fu8, 0x45, 0x4C, 0x46, 0x02, 0x01, 0x01, 0x00, //
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        image[..16].copy_from_slice(&header);
        image[16..18].copy_from_slice(&3u16.to_le_bytes()); // Shared object
        image[18..20].copy_from_slice(&62u16.to_le_bytes()); // x86-64
        image[20..24].copy_from_slice(&1u32.to_le_bytes());
        image[24..32].copy_from_slice(&0x40_0300u64.to_le_bytes()); // Entry
        image[32..40].copy_from_slice(&64u64.to_le_bytes()); // PHT offset
        image[40..48].copy_from_slice(&section_header_offset.to_le_bytes());
        image[52..54].copy_from_slice(&64u16.to_le_bytes()); // Header size
        image[54..56].copy_from_slice(&56u16.to_le_bytes());
        image[56..58].copy_from_slice(&2u16.to_le_bytes());
        image[58..60].copy_from_slice(&64u16.to_le_bytes());
        image[60..62].copy_from_slice(&13u16.to_le_bytes());
        image[62..64].copy_from_slice(&12u16.to_le_bytes());
        image
    }

    #[test]
    fn test_sample_object_parses() {
        let elf = Elf::read(sample_object()).unwrap();
        assert_eq!(elf.file_header().file_type, ElfType::SharedObject);
        assert_eq!(elf.file_header().machine, ElfMachine::X86_64);
        assert_eq!(elf.segments().len(), 2);
        assert_eq!(elf.section_count(), 13);
        for name in [
            ".interp", ".text", ".dynstr", ".dynsym", ".gnu.version",
            ".gnu.version_r", ".gnu.hash", ".rela.dyn", ".dynamic",
            ".note.gnu.build-id", ".bss", ".shstrtab",
        ] {
            assert!(elf.section_by_name(name).is_some(), "{name} missing");
        }
    }

    #[test]
    fn test_interpreter_path() {
        let elf = Elf::read(sample_object()).unwrap();
        assert_eq!(elf.interpreter(), Some("/lib64/ld-linux-x86-64.so.2"));
    }

    #[test]
    fn test_section_data_views() {
        let elf = Elf::read(sample_object()).unwrap();
        assert_eq!(elf.section_data(2), Some(&[0x90u8; 16][..]));
        // NoBits sections expose no bytes despite their declared size
        assert_eq!(elf.section_data(11), Some(&[][..]));
    }

    #[test]
    fn test_dynamic_symbols_resolve_names() {
        let elf = Elf::read(sample_object()).unwrap();
        let dynsym = elf.section_by_name(".dynsym").unwrap();
        let symbols = dynsym.symbols().unwrap();
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[1].binding, SymbolBinding::Global);
        assert_eq!(symbols[1].symbol_type, SymbolType::Function);
        assert_eq!(elf.symbol_name(4, &symbols[1]).unwrap(), "printf");
    }

    #[test]
    fn test_dynamic_entries_and_strings() {
        let elf = Elf::read(sample_object()).unwrap();
        let dynamic = elf.dynamic_section().unwrap();
        let entries = dynamic.dynamic_entries().unwrap();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries.last().unwrap().tag, DynamicTag::Null);
        assert_eq!(
            elf.dynamic_string(&entries[0]).unwrap().as_deref(),
            Some("libc.so.6")
        );
        assert_eq!(
            elf.dynamic_string(&entries[1]).unwrap().as_deref(),
            Some("mylib.so")
        );
        // Address-valued tags carry no string
        assert_eq!(elf.dynamic_string(&entries[2]).unwrap(), None);
        assert_eq!(elf.needed_libraries().unwrap(), vec!["libc.so.6"]);
        // The string table was resolved through the DT_STRTAB address
        let SectionPayload::Dynamic { string_table, .. } = &dynamic.payload else {
            panic!("expected a dynamic payload");
        };
        assert_eq!(*string_table, Some(3));
    }

    #[test]
    fn test_version_translation() {
        let elf = Elf::read(sample_object()).unwrap();
        assert_eq!(elf.version_indices(), Some(&[0u16, 2][..]));
        assert_eq!(elf.version_name(0).unwrap(), None);
        assert_eq!(elf.version_name(1).unwrap(), None);
        assert_eq!(elf.version_name(2).unwrap().as_deref(), Some("GLIBC_2.2.5"));
        // The hidden bit does not change the lookup
        assert_eq!(
            elf.version_name(0x8002).unwrap().as_deref(),
            Some("GLIBC_2.2.5")
        );
        assert!(matches!(
            elf.version_name(9),
            Err(Error::CrossReferenceFailed { kind: "symbol version", .. })
        ));
    }

    #[test]
    fn test_relocation_resolves_versioned_symbol() {
        let elf = Elf::read(sample_object()).unwrap();
        let rela = elf.section_by_name(".rela.dyn").unwrap();
        let entries = rela.relocations().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].symbol_index, 1);
        assert_eq!(entries[0].type_code, 7);
        assert_eq!(entries[0].addend, Some(0x10));
        assert_eq!(
            elf.relocation_symbol_name(8, &entries[0]).unwrap(),
            Some("printf@GLIBC_2.2.5".to_string())
        );
    }

    #[test]
    fn test_build_id_note() {
        let elf = Elf::read(sample_object()).unwrap();
        let note = elf.section_by_name(".note.gnu.build-id").unwrap();
        let SectionPayload::Note { entries } = &note.payload else {
            panic!("expected a note payload");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].owner, "GNU");
        assert_eq!(
            entries[0].body,
            NoteBody::GnuBuildId {
                id: vec![0xAB, 0xCD, 0xEF, 0x01, 0x23, 0x45, 0x67, 0x89]
            }
        );
    }

    #[test]
    fn test_gnu_hash_round_trip() {
        let elf = Elf::read(sample_object()).unwrap();
        let hash = elf.section_by_name(".gnu.hash").unwrap();
        let SectionPayload::GnuHash(table) = &hash.payload else {
            panic!("expected a hash payload");
        };
        assert_eq!(table.bucket_count, 1);
        assert_eq!(table.symbol_offset, 1);
        // The single chain holds one symbol
        assert_eq!(table.bucket_histogram(), vec![0, 1]);
    }

    #[test]
    fn test_sections_of_segments() {
        let elf = Elf::read(sample_object()).unwrap();
        assert_eq!(elf.segment(0).map(|s| s.flags), Some(SegmentFlags::READ | SegmentFlags::EXECUTE));
        let load = elf.sections_of_segment(0);
        // Every allocated section including NoBits .bss, but not .shstrtab
        assert_eq!(load, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
        let mut deduplicated = load.clone();
        deduplicated.dedup();
        assert_eq!(load, deduplicated);
        assert_eq!(elf.sections_of_segment(1), vec![9]);
        assert!(elf.sections_of_segment(7).is_empty());
    }

    #[test]
    fn test_section_to_segment_predicate() {
        let segment = ProgramHeader::builder()
            .segment_type(SegmentType::Load)
            .virtual_address(0x40_0000)
            .memory_size(0x1000)
            .build();
        let inside = SectionHeader::builder()
            .section_type(SectionType::ProgramBits)
            .flags(SectionFlags::ALLOC)
            .virtual_address(0x40_0100)
            .size(0x10)
            .build();
        let outside = SectionHeader::builder()
            .section_type(SectionType::ProgramBits)
            .flags(SectionFlags::ALLOC)
            .virtual_address(0x50_0000)
            .size(0x10)
            .build();
        let empty = SectionHeader::builder()
            .section_type(SectionType::ProgramBits)
            .flags(SectionFlags::ALLOC)
            .virtual_address(0x40_0200)
            .size(0)
            .build();
        assert!(section_maps_to_segment(&inside, &segment));
        assert!(!section_maps_to_segment(&outside, &segment));
        assert!(!section_maps_to_segment(&empty, &segment));
    }

    #[test]
    fn test_tls_sections_map_only_to_tls_segments() {
        let load = ProgramHeader::builder()
            .segment_type(SegmentType::Load)
            .virtual_address(0x40_0000)
            .memory_size(0x1000)
            .build();
        let tls_segment = ProgramHeader::builder()
            .segment_type(SegmentType::ThreadLocalStorage)
            .virtual_address(0x40_0000)
            .memory_size(0x1000)
            .build();
        let tls_section = SectionHeader::builder()
            .section_type(SectionType::ProgramBits)
            .flags(SectionFlags::ALLOC | SectionFlags::TLS)
            .virtual_address(0x40_0100)
            .size(0x10)
            .build();
        assert!(!section_maps_to_segment(&tls_section, &load));
        assert!(section_maps_to_segment(&tls_section, &tls_segment));
    }

    /// The scenario from the dynamic decoder's contract: a dynamic section
    /// with no DT_STRTAB resolves names through its link index
    fn dynamic_only_object() -> Vec<u8> {
        let mut names = NameTable::new();
        let n_dynstr = names.add(".dynstr");
        let n_dynamic = names.add(".dynamic");
        let n_shstrtab = names.add(".shstrtab");

        let mut image = vec![0u8; 64];

        let mut dynstr = vec![0u8; 42];
        dynstr.extend_from_slice(b"libc.so.6\0"); // Offset 42
        dynstr.resize(100, 0);
        dynstr.extend_from_slice(b"libfoo\0"); // Offset 100
        let dynstr_offset = append(&mut image, &dynstr);

        let mut dynamic = Vec::new();
        for (tag, value) in [(1u64, 42u64), (14, 100), (0, 0)] {
            push_u64(&mut dynamic, tag);
            push_u64(&mut dynamic, value);
        }
        let dynamic_offset = append(&mut image, &dynamic);

        let shstrtab_offset = append(&mut image, &names.bytes);
        let shstrtab_size = names.bytes.len() as u64;

        let section_header_offset = image.len() as u64;
        push_section_header(&mut image, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0);
        push_section_header(
            &mut image, n_dynstr, 3, 0, 0, dynstr_offset, dynstr.len() as u64, 0, 0, 1, 0,
        );
        push_section_header(
            &mut image, n_dynamic, 6, 0, 0, dynamic_offset, 48, 1, 0, 8, 16,
        );
        push_section_header(
            &mut image, n_shstrtab, 3, 0, 0, shstrtab_offset, shstrtab_size, 0, 0, 1, 0,
        );

        let header = [
            0x7Fu8, 0x45, 0x4C, 0x46, 0x02, 0x01, 0x01, 0x00, //
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        image[..16].copy_from_slice(&header);
        image[16..18].copy_from_slice(&3u16.to_le_bytes());
        image[18..20].copy_from_slice(&62u16.to_le_bytes());
        image[20..24].copy_from_slice(&1u32.to_le_bytes());
        image[40..48].copy_from_slice(&section_header_offset.to_le_bytes());
        image[52..54].copy_from_slice(&64u16.to_le_bytes());
        image[58..60].copy_from_slice(&64u16.to_le_bytes());
        image[60..62].copy_from_slice(&4u16.to_le_bytes());
        image[62..64].copy_from_slice(&3u16.to_le_bytes());
        image
    }

    #[test]
    fn test_dynamic_tag_decoding_via_link() {
        let elf = Elf::read(dynamic_only_object()).unwrap();
        let dynamic = elf.dynamic_section().unwrap();
        let entries = dynamic.dynamic_entries().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].tag, DynamicTag::Needed);
        assert_eq!(entries[1].tag, DynamicTag::SharedObjectName);
        assert_eq!(entries[2], DynamicEntry { tag: DynamicTag::Null, value: 0 });
        assert_eq!(
            elf.dynamic_string(&entries[0]).unwrap().as_deref(),
            Some("libc.so.6")
        );
        assert_eq!(
            elf.dynamic_string(&entries[1]).unwrap().as_deref(),
            Some("libfoo")
        );
        let SectionPayload::Dynamic { string_table, .. } = &dynamic.payload else {
            panic!("expected a dynamic payload");
        };
        assert_eq!(*string_table, Some(1));
    }
}
