//! Symbol table sections
//!
//! Covers both the link-editing symbol table and the dynamic symbol table;
//! the two differ only in which decoder the dispatcher selects. The entry
//! layout switches with the class: a 32-bit entry is 16 bytes ordered
//! `(name, value, size, info, other, shndx)`, a 64-bit entry is 24 bytes
//! ordered `(name, info, other, shndx, value, size)`.

use crate::base::ByteCursor;
use crate::elf_enum;
use crate::error::{Error, Result};
use crate::header::elf::identification::ElfClass;
use crate::header::section::SectionHeader;

elf_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// A symbol's binding: its linkage visibility and precedence
    pub enum SymbolBinding : u8 {
        /// Not visible outside the object file containing its definition
        Local = 0,
        /// Visible to all object files being combined
        Global = 1,
        /// Like global, but with lower precedence
        Weak = 2,
        /// A global symbol unified across all loaded objects (GNU)
        GnuUnique = 10,
        @reserved {
            /// An operating-system-specific binding
            OsSpecific ("OS-specific") = 10..=12,
            /// A processor-specific binding
            ProcessorSpecific ("processor-specific") = 13..=15,
        }
    }
}

elf_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// A symbol's type: what kind of entity it names
    pub enum SymbolType : u8 {
        /// The symbol's type is not specified
        NoType = 0,
        /// A data object: a variable, an array, and so on
        Object = 1,
        /// A function or other executable code
        Function = 2,
        /// A section; primarily used for relocation
        Section = 3,
        /// The name of the source file associated with the object
        File = 4,
        /// An uninitialized common block
        Common = 5,
        /// A thread-local storage entity
        ThreadLocal = 6,
        /// An indirect function resolved at load time (GNU)
        GnuIndirectFunction = 10,
        @reserved {
            /// An operating-system-specific symbol type
            OsSpecific ("OS-specific") = 10..=12,
            /// A processor-specific symbol type
            ProcessorSpecific ("processor-specific") = 13..=15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// A symbol's visibility, held in the low two bits of the `other` byte
pub enum SymbolVisibility {
    /// Visibility as specified by the binding
    Default,
    /// Processor-specific hidden class
    Internal,
    /// Not visible to other components
    Hidden,
    /// Visible but not preemptable
    Protected,
}

impl SymbolVisibility {
    /// Extract the visibility from a symbol's `other` byte
    pub fn from_other(other: u8) -> Self {
        match other & 0x3 {
            0 => Self::Default,
            1 => Self::Internal,
            2 => Self::Hidden,
            _ => Self::Protected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One symbol table entry
pub struct Symbol {
    /// The offset of the symbol's name in the linked string table
    pub name_offset: u32,
    /// The symbol's value: an address, an alignment, or a constant,
    /// depending on the file type and section index
    pub value: u64,
    /// The symbol's size in bytes, or 0 when it has none or it is unknown
    pub size: u64,
    /// The binding, from the high nibble of the info byte
    pub binding: SymbolBinding,
    /// The type, from the low nibble of the info byte
    pub symbol_type: SymbolType,
    /// The visibility, from the low two bits of the other byte
    pub visibility: SymbolVisibility,
    /// The index of the section the symbol is defined relative to
    pub section_index: u16,
    /// The raw info byte
    pub info: u8,
    /// The raw other byte
    pub other: u8,
}

impl Symbol {
    /// Decode one entry at the cursor's current position
    pub fn parse(cursor: &mut ByteCursor, class: ElfClass) -> Result<Self> {
        let name_offset;
        let value;
        let size;
        let info;
        let other;
        let section_index;
        match class {
            ElfClass::Elf32 => {
                name_offset = cursor.read_u32()?;
                value = cursor.read_u32()? as u64;
                size = cursor.read_u32()? as u64;
                info = cursor.read_u8()?;
                other = cursor.read_u8()?;
                section_index = cursor.read_u16()?;
            }
            ElfClass::Elf64 => {
                name_offset = cursor.read_u32()?;
                info = cursor.read_u8()?;
                other = cursor.read_u8()?;
                section_index = cursor.read_u16()?;
                value = cursor.read_u64()?;
                size = cursor.read_u64()?;
            }
        }
        Ok(Self {
            name_offset,
            value,
            size,
            binding: SymbolBinding::from_code(info >> 4)?,
            symbol_type: SymbolType::from_code(info & 0xF)?,
            visibility: SymbolVisibility::from_other(other),
            section_index,
            info,
            other,
        })
    }
}

/// Decode every entry of a symbol table section
///
/// The entry stride is the header's declared entry size when nonzero,
/// otherwise the class default; entries are re-seated at `i * stride` so an
/// oversized stride skips per-entry padding. Entries are packed
/// byte-structures, so reads run unaligned regardless of the section's
/// declared alignment.
pub fn parse_symbols(
    cursor: &mut ByteCursor,
    class: ElfClass,
    header: &SectionHeader,
) -> Result<Vec<Symbol>> {
    let minimum = class.symbol_entry_size();
    let stride = if header.entry_size == 0 {
        minimum
    } else if header.entry_size < minimum {
        return Err(Error::InvalidFieldValue {
            field: "symbol table entry size",
            expected: "at least 16 for the 32-bit class, 24 for the 64-bit class",
            actual: header.entry_size,
        });
    } else {
        header.entry_size
    };
    let count = header.size / stride;
    cursor.with_alignment(1, |cursor| {
        // No preallocation: the size field is untrusted input
        let mut symbols = Vec::new();
        for index in 0..count {
            cursor.set_position(header.file_offset + index * stride);
            symbols.push(Symbol::parse(cursor, class)?);
        }
        Ok(symbols)
    })
}
