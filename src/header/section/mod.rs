//! Implementation of the ELF section header
//!
//! Section headers describe the linker's fine-grained view of the file. The
//! header alone says how to find a section's bytes; what those bytes mean is
//! decided by the payload decoders, driven by the header's type and name.

use crate::base::ByteCursor;
use crate::elf_enum;
use crate::error::{Error, Result};
use crate::header::elf::identification::ElfClass;
use bitflags::bitflags;
use typed_builder::TypedBuilder;

elf_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// The type of a section: its contents and semantics
    pub enum SectionType : u32 {
        /// Marks the section header as inactive; it does not have an
        /// associated section
        Null = 0,
        /// Holds information defined by the program, whose format and meaning
        /// are determined solely by the program
        ProgramBits = 1,
        /// Holds a symbol table, typically providing symbols for link
        /// editing; it may contain many symbols unnecessary for dynamic
        /// linking
        SymbolTable = 2,
        /// Holds a string table; an object file may have multiple string
        /// table sections
        StringTable = 3,
        /// Holds relocation entries with explicit addends
        RelocationAddend = 4,
        /// Holds a SysV symbol hash table
        Hash = 5,
        /// Holds information for dynamic linking
        Dynamic = 6,
        /// Holds information that marks the file in some way
        Note = 7,
        /// Occupies no space in the file but otherwise resembles ProgramBits;
        /// the offset member locates its conceptual placement
        NoBits = 8,
        /// Holds relocation entries without explicit addends
        Relocation = 9,
        /// Reserved with unspecified semantics
        SharedLibrary = 10,
        /// Holds the minimal set of dynamic linking symbols
        DynamicSymbolTable = 11,
        /// An array of pointers to initialization functions
        InitializerArray = 14,
        /// An array of pointers to termination functions
        FinalizerArray = 15,
        /// An array of pointers to functions invoked before all other
        /// initialization functions
        PreInitializerArray = 16,
        /// Defines a section group: a set of sections treated specially by
        /// the linker
        Group = 17,
        /// Holds the extended section indexes for a symbol table whose
        /// entries overflow the header's 16-bit section index field
        SymbolTableIndexes = 18,
        /// RELR relative relocations
        RelocationRelative = 19,
        /// Object attributes (GNU)
        GnuAttributes = 0x6fff_fff5,
        /// GNU-style symbol hash table
        GnuHash = 0x6fff_fff6,
        /// List of prelink dependencies (GNU)
        GnuLibraryList = 0x6fff_fff7,
        /// Checksum for DSO content (GNU)
        Checksum = 0x6fff_fff8,
        /// Versions defined by this file (GNU)
        GnuVersionDefinitions = 0x6fff_fffd,
        /// Versions needed by this file (GNU)
        GnuVersionRequirements = 0x6fff_fffe,
        /// Per-symbol version indices (GNU)
        GnuVersionSymbols = 0x6fff_ffff,
        @reserved {
            /// An operating-system-specific section type
            OsSpecific ("OS-specific") = 0x6000_0000..=0x6fff_ffff,
            /// A processor-specific section type
            ProcessorSpecific ("processor-specific") = 0x7000_0000..=0x7fff_ffff,
            /// An application-specific section type
            ApplicationSpecific ("application-specific") = 0x8000_0000..=0xffff_ffff,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Bit flags describing miscellaneous section attributes
    pub struct SectionFlags: u64 {
        /// The section holds data writable during process execution
        const WRITE = 0x1;
        /// The section occupies memory during process execution
        const ALLOC = 0x2;
        /// The section holds executable machine instructions
        const EXECINSTR = 0x4;
        /// The section's elements may be merged to eliminate duplication
        const MERGE = 0x10;
        /// The section's elements are NUL-terminated character strings
        const STRINGS = 0x20;
        /// The section header's info field holds a section header table index
        const INFO_LINK = 0x40;
        /// Special ordering requirements for link editors apply relative to
        /// the linked-to section
        const LINK_ORDER = 0x80;
        /// The section requires OS-specific processing beyond the standard
        /// linking rules
        const OS_NONCONFORMING = 0x100;
        /// The section is a member of a section group
        const GROUP = 0x200;
        /// The section holds thread-local storage: each execution flow has
        /// its own instance of this data
        const TLS = 0x400;
        /// The section holds compressed data; incompatible with ALLOC
        const COMPRESSED = 0x800;
        /// Bits with operating-system-specific meaning
        const MASK_OS = 0x0ff0_0000;
        /// Bits with processor-specific meaning
        const MASK_PROCESSOR = 0xf000_0000;
    }
}

impl SectionFlags {
    /// Decode a raw flag word, rejecting bits outside the defined union
    pub fn parse(bits: u64) -> Result<Self> {
        Self::from_bits(bits).ok_or(Error::InvalidBitset {
            field: "section flags",
            bits,
        })
    }

    /// The ordered multi-character `readelf`-style flag code, e.g. `"WA"`
    /// for a writable allocated section
    pub fn code(&self) -> String {
        let keys = [
            (Self::WRITE, 'W'),
            (Self::ALLOC, 'A'),
            (Self::EXECINSTR, 'X'),
            (Self::MERGE, 'M'),
            (Self::STRINGS, 'S'),
            (Self::INFO_LINK, 'I'),
            (Self::LINK_ORDER, 'L'),
            (Self::OS_NONCONFORMING, 'O'),
            (Self::GROUP, 'G'),
            (Self::TLS, 'T'),
            (Self::COMPRESSED, 'C'),
            (Self::MASK_OS, 'o'),
            (Self::MASK_PROCESSOR, 'p'),
        ];
        keys.iter()
            .filter(|(flag, _)| self.intersects(*flag))
            .map(|&(_, key)| key)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
/// One section header table entry
pub struct SectionHeader {
    #[builder(default)]
    /// The offset of the section's name in the section-name string table
    pub name_offset: u32,
    #[builder(default = SectionType::Null)]
    /// The section's contents and semantics
    pub section_type: SectionType,
    #[builder(default)]
    /// Attribute flags. See [SectionFlags].
    pub flags: SectionFlags,
    #[builder(default)]
    /// The address of the section's first byte in the process image, or 0
    pub virtual_address: u64,
    #[builder(default)]
    /// The file offset of the section's first byte; for NoBits sections the
    /// conceptual placement only
    pub file_offset: u64,
    #[builder(default)]
    /// The section's size in bytes; NoBits sections occupy no file space
    /// regardless
    pub size: u64,
    #[builder(default)]
    /// A section header table index whose interpretation depends on the
    /// section type: the string table for symbol tables and version
    /// requirements, the symbol table for relocation and hash sections
    pub link: u32,
    #[builder(default)]
    /// Extra information whose interpretation depends on the section type
    pub info: u32,
    #[builder(default)]
    /// The section's address alignment constraint: 0 or 1 mean none,
    /// otherwise a power of two
    pub alignment: u64,
    #[builder(default)]
    /// For sections holding a table of fixed-size entries, the size in bytes
    /// of one entry; otherwise 0
    pub entry_size: u64,
}

impl SectionHeader {
    /// Parse one entry at the cursor's current position
    pub fn parse(cursor: &mut ByteCursor, class: ElfClass) -> Result<Self> {
        let name_offset = cursor.read_u32()?;
        let section_type = SectionType::from_code(cursor.read_u32()?)?;
        let flags = SectionFlags::parse(class.read_word(cursor)?)?;
        let virtual_address = class.read_word(cursor)?;
        let file_offset = class.read_word(cursor)?;
        let size = class.read_word(cursor)?;
        let link = cursor.read_u32()?;
        let info = cursor.read_u32()?;
        let alignment = class.read_word(cursor)?;
        if alignment > 1 && !alignment.is_power_of_two() {
            return Err(Error::BadAlignment { value: alignment });
        }
        let entry_size = class.read_word(cursor)?;
        Ok(Self {
            name_offset,
            section_type,
            flags,
            virtual_address,
            file_offset,
            size,
            link,
            info,
            alignment,
            entry_size,
        })
    }
}
