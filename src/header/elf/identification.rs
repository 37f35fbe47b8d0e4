//! The ELF identifier: the 16-byte prologue that chooses how the rest of the
//! file is read
//!
//! The class byte selects the address width and the data encoding byte
//! selects the byte order; both are runtime properties of the cursor from
//! this point on.

use crate::base::{ByteCursor, Endianness};
use crate::elf_enum;
use crate::error::{Error, Result};
use typed_builder::TypedBuilder;

/// The magic value indicating that this is an ELF file (0x7F, 'E', 'L', 'F'
/// in ASCII)
pub const ELF_MAGIC: [u8; 4] = [0x7F, 0x45, 0x4C, 0x46];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The file's class: the address width its structures are laid out for
pub enum ElfClass {
    /// 32-bit objects: addresses, offsets and layout words are 4 bytes
    Elf32,
    /// 64-bit objects: addresses, offsets and layout words are 8 bytes
    Elf64,
}

impl ElfClass {
    /// Code for a 32-bit object
    pub const ELF32: u8 = 1;
    /// Code for a 64-bit object
    pub const ELF64: u8 = 2;

    /// Whether this is the 64-bit class
    pub fn is_64_bit(&self) -> bool {
        matches!(self, Self::Elf64)
    }

    /// The size in bytes of a class-width word (address, offset, size)
    pub fn word_size(&self) -> u64 {
        match self {
            Self::Elf32 => 4,
            Self::Elf64 => 8,
        }
    }

    /// Read a class-width word, widening to 64 bits for the 32-bit class
    pub fn read_word(&self, cursor: &mut ByteCursor) -> Result<u64> {
        match self {
            Self::Elf32 => cursor.read_u32().map(u64::from),
            Self::Elf64 => cursor.read_u64(),
        }
    }

    /// The required ELF header size for this class
    pub fn file_header_size(&self) -> u16 {
        match self {
            Self::Elf32 => 52,
            Self::Elf64 => 64,
        }
    }

    /// The required program header table entry size for this class
    pub fn program_header_entry_size(&self) -> u16 {
        match self {
            Self::Elf32 => 32,
            Self::Elf64 => 56,
        }
    }

    /// The required section header table entry size for this class
    pub fn section_header_entry_size(&self) -> u16 {
        match self {
            Self::Elf32 => 40,
            Self::Elf64 => 64,
        }
    }

    /// The size of a symbol table entry for this class
    pub fn symbol_entry_size(&self) -> u64 {
        match self {
            Self::Elf32 => 16,
            Self::Elf64 => 24,
        }
    }
}

impl TryFrom<u8> for ElfClass {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            Self::ELF32 => Ok(Self::Elf32),
            Self::ELF64 => Ok(Self::Elf64),
            other => Err(Error::InvalidFieldValue {
                field: "identifier class",
                expected: "1 (32-bit) or 2 (64-bit)",
                actual: other as u64,
            }),
        }
    }
}

/// Decode the data-encoding identifier byte into a byte order
pub fn data_encoding_from_code(value: u8) -> Result<Endianness> {
    match value {
        1 => Ok(Endianness::Little),
        2 => Ok(Endianness::Big),
        other => Err(Error::InvalidFieldValue {
            field: "identifier data encoding",
            expected: "1 (little-endian) or 2 (big-endian)",
            actual: other as u64,
        }),
    }
}

elf_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// The file's OS/ABI
    ///
    /// Identifies the OS- or ABI-specific ELF extensions used by this file.
    /// Values from 64 upward are given meaning by the processor supplement
    /// for the file's machine; codes in that range without a registered
    /// meaning are retained as architecture-specific.
    pub enum ElfOsAbi : u8 {
        /// Unix System V ABI, or no extensions
        SystemV = 0,
        /// HP-UX
        Hpux = 1,
        /// NetBSD
        NetBsd = 2,
        /// Object uses GNU ELF extensions
        Gnu = 3,
        /// SUN Solaris
        Solaris = 6,
        /// IBM AIX
        Aix = 7,
        /// SGI Irix
        Irix = 8,
        /// FreeBSD
        FreeBsd = 9,
        /// Compaq TRU64 UNIX
        Tru64 = 10,
        /// Novell Modesto
        NovellModesto = 11,
        /// OpenBSD
        OpenBsd = 12,
        /// Open Virtual Memory System
        OpenVms = 13,
        /// NSK Non-Stop Kernel
        NonStopKernel = 14,
        /// Amiga Research OS
        Aros = 15,
        /// FenixOS highly scalable multi-core OS
        FenixOs = 16,
        /// Nuxi CloudABI
        CloudAbi = 17,
        /// Stratus Technologies OpenVOS
        OpenVos = 18,
        /// ARM EABI (symbol versioning extensions per the aaelf32 supplement)
        ArmEabi = 64,
        /// ARM (non-EABI)
        Arm = 97,
        /// Standalone (embedded) application
        Standalone = 255,
        @reserved {
            /// A code in the architecture-defined range without a registered
            /// meaning
            ArchitectureSpecific ("processor-specific") = 64..=255,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
/// The decoded ELF identifier
pub struct Identification {
    /// The file's class. See [ElfClass].
    pub class: ElfClass,
    /// The file's byte order, decoded from the data-encoding byte
    pub data_encoding: Endianness,
    /// The identifier version byte; always 1
    pub version: u8,
    /// The file's OS/ABI. See [ElfOsAbi].
    pub os_abi: ElfOsAbi,
    /// The version of the ABI identified by the OS/ABI byte; 0 means
    /// unspecified
    pub abi_version: u8,
}

impl Identification {
    /// Parse the 16-byte identifier from the start of `cursor`
    ///
    /// The reserved padding bytes are required to be zero by the
    /// specification but readers must tolerate them; nonzero padding logs a
    /// warning and parsing continues.
    pub fn parse(cursor: &mut ByteCursor) -> Result<Self> {
        let magic = cursor.read_bytes(4)?;
        if magic != ELF_MAGIC {
            return Err(Error::BadMagic {
                found: [magic[0], magic[1], magic[2], magic[3]],
            });
        }
        let class = ElfClass::try_from(cursor.read_u8()?)?;
        let data_encoding = data_encoding_from_code(cursor.read_u8()?)?;
        let version = cursor.read_u8()?;
        if version != 1 {
            return Err(Error::InvalidFieldValue {
                field: "identifier version",
                expected: "1",
                actual: version as u64,
            });
        }
        let os_abi = ElfOsAbi::from_code(cursor.read_u8()?)?;
        let abi_version = cursor.read_u8()?;
        let padding = cursor.read_bytes(7)?;
        if padding.iter().any(|&b| b != 0) {
            log::warn!("Nonzero identifier padding bytes {padding:02x?}");
        }
        Ok(Self {
            class,
            data_encoding,
            version,
            os_abi,
            abi_version,
        })
    }
}
