//! The dynamic section
//!
//! A table of `(tag, value)` pairs consumed by the dynamic linker. Entries
//! are word-sized pairs for the file's class; the table runs to the end of
//! the section and must contain a `Null` terminator, which is retained in
//! the decoded list along with any trailing padding entries.

use crate::base::ByteCursor;
use crate::elf_enum;
use crate::error::{Error, Result};
use crate::header::elf::identification::ElfClass;
use crate::header::section::SectionHeader;

elf_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// The tag of a dynamic section entry: how its value is interpreted
    pub enum DynamicTag : u64 {
        /// Marks the end of the dynamic array
        Null = 0,
        /// The string table offset of a needed library's name
        Needed = 1,
        /// The total size of the relocation entries associated with the
        /// procedure linkage table
        PltRelocationSize = 2,
        /// The address of the procedure linkage table and/or the global
        /// offset table
        PltGot = 3,
        /// The address of the SysV symbol hash table
        Hash = 4,
        /// The address of the string table
        StringTable = 5,
        /// The address of the symbol table
        SymbolTable = 6,
        /// The address of a relocation table with explicit addends
        RelocationAddend = 7,
        /// The total size in bytes of the addend relocation table
        RelocationAddendSize = 8,
        /// The size in bytes of one addend relocation entry
        RelocationAddendEntrySize = 9,
        /// The size in bytes of the string table
        StringTableSize = 10,
        /// The size in bytes of one symbol table entry
        SymbolEntrySize = 11,
        /// The address of the initialization function
        Init = 12,
        /// The address of the termination function
        Fini = 13,
        /// The string table offset of the shared object's name
        SharedObjectName = 14,
        /// The string table offset of a library search path (superseded by
        /// RunPath)
        RPath = 15,
        /// Symbol resolution starts from the shared object itself
        Symbolic = 16,
        /// The address of a relocation table without addends
        Relocation = 17,
        /// The total size in bytes of the addendless relocation table
        RelocationSize = 18,
        /// The size in bytes of one addendless relocation entry
        RelocationEntrySize = 19,
        /// The type of relocation entry the procedure linkage table uses
        PltRelocationType = 20,
        /// Used for debugging; its contents are not specified
        Debug = 21,
        /// One or more relocations modify a non-writable segment
        TextRelocations = 22,
        /// The address of the relocation entries associated exclusively with
        /// the procedure linkage table
        JumpRelocations = 23,
        /// Process all relocations before transferring control
        BindNow = 24,
        /// The address of the array of initialization function pointers
        InitArray = 25,
        /// The address of the array of termination function pointers
        FiniArray = 26,
        /// The size in bytes of the initialization function array
        InitArraySize = 27,
        /// The size in bytes of the termination function array
        FiniArraySize = 28,
        /// The string table offset of a library search path
        RunPath = 29,
        /// Flag values specific to this object
        Flags = 30,
        /// The address of the array of pre-initialization function pointers
        PreInitArray = 32,
        /// The size in bytes of the pre-initialization function array
        PreInitArraySize = 33,
        /// The address of the extended section index table
        SymbolTableIndexes = 34,
        /// The total size in bytes of the relative relocation table
        RelrSize = 35,
        /// The address of the relative relocation table
        Relr = 36,
        /// The size in bytes of one relative relocation entry
        RelrEntrySize = 37,
        /// The address of the GNU-style symbol hash table
        GnuHash = 0x6fff_fef5,
        /// The address of the TLS descriptor procedure linkage entries (GNU)
        TlsDescPlt = 0x6fff_fef6,
        /// The address of the TLS descriptor global offset entries (GNU)
        TlsDescGot = 0x6fff_fef7,
        /// The address of the prelink conflict section (GNU)
        GnuConflict = 0x6fff_fef8,
        /// The address of the prelink library list (GNU)
        GnuLibraryList = 0x6fff_fef9,
        /// The string table offset of the configuration file (GNU)
        Config = 0x6fff_fefa,
        /// The string table offset of the dependency audit library (GNU)
        DepAudit = 0x6fff_fefb,
        /// The string table offset of the audit library (GNU)
        Audit = 0x6fff_fefc,
        /// The address of the PLT padding (GNU)
        PltPad = 0x6fff_fefd,
        /// The address of the move table (GNU)
        MoveTable = 0x6fff_fefe,
        /// The address of the syminfo table (GNU)
        SymInfo = 0x6fff_feff,
        /// The address of the per-symbol version index table
        VersionSymbols = 0x6fff_fff0,
        /// The number of relative entries at the start of the addend
        /// relocation table
        RelaCount = 0x6fff_fff9,
        /// The number of relative entries at the start of the addendless
        /// relocation table
        RelCount = 0x6fff_fffa,
        /// Extended flag values specific to this object
        Flags1 = 0x6fff_fffb,
        /// The address of the version definition table
        VersionDefinitions = 0x6fff_fffc,
        /// The number of version definition entries
        VersionDefinitionCount = 0x6fff_fffd,
        /// The address of the version requirement table
        VersionRequirements = 0x6fff_fffe,
        /// The number of version requirement entries
        VersionRequirementCount = 0x6fff_ffff,
        @reserved {
            /// An operating-system-specific tag
            OsSpecific ("OS-specific") = 0x6000_000d..=0x6fff_ffff,
            /// A processor-specific tag
            ProcessorSpecific ("processor-specific") = 0x7000_0000..=0x7fff_ffff,
        }
    }
}

impl DynamicTag {
    /// Whether the entry's value is an offset of a name in the linked string
    /// table
    pub fn is_string_offset(&self) -> bool {
        matches!(
            self,
            Self::Needed | Self::SharedObjectName | Self::RPath | Self::RunPath
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// One dynamic section entry
pub struct DynamicEntry {
    /// How the value is interpreted
    pub tag: DynamicTag,
    /// The entry's value: an address, a size, a string table offset or a
    /// flag word, depending on the tag
    pub value: u64,
}

/// Decode a dynamic section into its entry list
///
/// Entries are consumed until the section's size is exhausted; a `Null`
/// terminator must be present and is retained, as are any padding entries
/// after it.
pub fn parse_dynamic(
    cursor: &mut ByteCursor,
    class: ElfClass,
    header: &SectionHeader,
) -> Result<Vec<DynamicEntry>> {
    let stride = class.word_size() * 2;
    let count = header.size / stride;
    cursor.with_alignment(1, |cursor| {
        let mut entries = Vec::new();
        let mut terminated = false;
        for index in 0..count {
            cursor.set_position(header.file_offset + index * stride);
            let tag = DynamicTag::from_code(class.read_word(cursor)?)?;
            let value = class.read_word(cursor)?;
            terminated |= tag == DynamicTag::Null;
            entries.push(DynamicEntry { tag, value });
        }
        if !terminated {
            return Err(Error::InvalidFieldValue {
                field: "dynamic section terminator",
                expected: "a DT_NULL entry before the end of the section",
                actual: header.size,
            });
        }
        Ok(entries)
    })
}
