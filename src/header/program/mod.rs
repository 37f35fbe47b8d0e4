//! Implementation of the ELF program header
//!
//! Program headers describe the segments a loader maps: the coarse,
//! execution-oriented view of the file. The 32-bit and 64-bit classes agree
//! on the fields but not on their order: the 64-bit layout moves the flags
//! word up to directly follow the type.

use crate::base::ByteCursor;
use crate::elf_enum;
use crate::error::{Error, Result};
use crate::header::elf::identification::ElfClass;
use bitflags::bitflags;
use typed_builder::TypedBuilder;

elf_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// The type of a segment
    pub enum SegmentType : u32 {
        /// Unused entry; the other members hold undefined values
        Null = 0,
        /// A loadable segment, mapped into memory at its virtual address
        Load = 1,
        /// Dynamic linking information
        Dynamic = 2,
        /// The path of the program interpreter
        Interpreter = 3,
        /// Auxiliary information
        Note = 4,
        /// Reserved with unspecified semantics
        SharedLibrary = 5,
        /// The program header table itself, when mapped into memory
        ProgramHeaderTable = 6,
        /// The thread-local storage template
        ThreadLocalStorage = 7,
        /// The exception-handling frame header (GNU)
        GnuEhFrame = 0x6474e550,
        /// Stack permissions marker (GNU)
        GnuStack = 0x6474e551,
        /// The region to remap read-only after relocation (GNU)
        GnuRelro = 0x6474e552,
        /// Covers the `.note.gnu.property` section (GNU)
        GnuProperty = 0x6474e553,
        @reserved {
            /// An operating-system-specific segment type
            OsSpecific ("OS-specific") = 0x6000_0000..=0x6fff_ffff,
            /// A processor-specific segment type
            ProcessorSpecific ("processor-specific") = 0x7000_0000..=0x7fff_ffff,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Permission flags of a segment
    pub struct SegmentFlags: u32 {
        /// The segment may be executed
        const EXECUTE = 0x1;
        /// The segment may be written
        const WRITE = 0x2;
        /// The segment may be read
        const READ = 0x4;
        /// Bits with operating-system-specific meaning
        const MASK_OS = 0x0ff0_0000;
        /// Bits with processor-specific meaning
        const MASK_PROCESSOR = 0xf000_0000;
    }
}

impl SegmentFlags {
    /// Decode a raw flag word, rejecting bits outside the defined union
    pub fn parse(bits: u32) -> Result<Self> {
        Self::from_bits(bits).ok_or(Error::InvalidBitset {
            field: "segment flags",
            bits: bits as u64,
        })
    }

    /// The three-character `readelf`-style permission code, e.g. `"R E"`
    pub fn letters(&self) -> String {
        let mut code = String::with_capacity(3);
        code.push(if self.contains(Self::READ) { 'R' } else { ' ' });
        code.push(if self.contains(Self::WRITE) { 'W' } else { ' ' });
        code.push(if self.contains(Self::EXECUTE) { 'E' } else { ' ' });
        code
    }
}

#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
/// One program header table entry: a segment descriptor
pub struct ProgramHeader {
    #[builder(default = SegmentType::Null)]
    /// What the segment holds and how to interpret it
    pub segment_type: SegmentType,
    #[builder(default)]
    /// The segment's permission flags
    pub flags: SegmentFlags,
    #[builder(default)]
    /// The file offset of the segment's first byte
    pub offset: u64,
    #[builder(default)]
    /// The virtual address of the segment's first byte in memory
    pub virtual_address: u64,
    #[builder(default)]
    /// The segment's physical address, on systems where that is relevant
    pub physical_address: u64,
    #[builder(default)]
    /// The number of bytes the segment occupies in the file
    pub file_size: u64,
    #[builder(default)]
    /// The number of bytes the segment occupies in memory; at least
    /// `file_size`, with the excess zero-filled
    pub memory_size: u64,
    #[builder(default)]
    /// The segment's alignment: 0 or 1 mean none, otherwise a power of two
    /// with `virtual_address` congruent to `offset` modulo it
    pub alignment: u64,
}

impl ProgramHeader {
    /// Parse one entry at the cursor's current position
    ///
    /// The caller re-seats the cursor at `table offset + index * entry size`
    /// for each entry.
    pub fn parse(cursor: &mut ByteCursor, class: ElfClass) -> Result<Self> {
        let segment_type = SegmentType::from_code(cursor.read_u32()?)?;
        // The 64-bit layout places the flags directly after the type; the
        // 32-bit layout places them after the sizes.
        let mut flags = SegmentFlags::empty();
        if class.is_64_bit() {
            flags = SegmentFlags::parse(cursor.read_u32()?)?;
        }
        let offset = class.read_word(cursor)?;
        let virtual_address = class.read_word(cursor)?;
        let physical_address = class.read_word(cursor)?;
        let file_size = class.read_word(cursor)?;
        let memory_size = class.read_word(cursor)?;
        if !class.is_64_bit() {
            flags = SegmentFlags::parse(cursor.read_u32()?)?;
        }
        let alignment = class.read_word(cursor)?;
        if alignment > 1 {
            if !alignment.is_power_of_two() {
                return Err(Error::BadAlignment { value: alignment });
            }
            if virtual_address % alignment != offset % alignment {
                return Err(Error::BadAlignment { value: alignment });
            }
        }
        Ok(Self {
            segment_type,
            flags,
            offset,
            virtual_address,
            physical_address,
            file_size,
            memory_size,
            alignment,
        })
    }
}
