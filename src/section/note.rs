//! Note sections
//!
//! A note section is a packed sequence of `(owner, type, description)`
//! records. The three header words are 4-byte little-endian for both classes
//! and both byte orders, matching GNU `readelf`; the description's own
//! content follows the file's byte order.

use crate::base::{ByteCursor, Endianness};
use crate::elf_enum;
use crate::error::{Error, Result};
use crate::header::elf::identification::ElfClass;
use crate::header::section::SectionHeader;

/// Round `value` up to the next multiple of four
const fn align4(value: u64) -> u64 {
    (value + 3) & !3
}

elf_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// The type of one entry in a GNU program-property note
    pub enum GnuPropertyType : u32 {
        /// The program's requested stack size
        StackSize = 1,
        /// No copy relocations on protected data symbols
        NoCopyOnProtected = 2,
        /// AArch64 feature bitmask, AND-combined over inputs
        Aarch64Feature1And = 0xc000_0000,
        /// x86 feature bitmask (IBT, SHSTK), AND-combined over inputs
        X86Feature1And = 0xc000_0002,
        @reserved {
            /// A code in the generic AND/OR-combination ranges
            OsSpecific ("OS-specific") = 0xb000_0000..=0xb000_ffff,
            /// A processor-specific property
            ProcessorSpecific ("processor-specific") = 0xc000_0000..=0xdfff_ffff,
            /// An application-specific property
            ApplicationSpecific ("application-specific") = 0xe000_0000..=0xffff_ffff,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The recognized kinds of note entry, classified by owner and discriminant
///
/// The discriminant alone is ambiguous: `3` means build-id under the `GNU`
/// owner and an SDT probe under the `stapsdt` owner.
pub enum NoteType {
    /// Operating system ABI information (`GNU`, 1)
    GnuAbiTag,
    /// Synthesized hardware capabilities (`GNU`, 2)
    GnuHwcap,
    /// Unique build identifier (`GNU`, 3)
    GnuBuildId,
    /// The version of the gold linker that produced the object (`GNU`, 4)
    GnuGoldVersion,
    /// Program property array (`GNU`, 5)
    GnuPropertyType0,
    /// A Systemtap statically-defined-tracing probe (`stapsdt`, 3)
    Stapsdt,
    /// An unrecognized owner/discriminant pair, retained raw
    Unknown(u32),
}

impl NoteType {
    /// Classify a note by its owner string and discriminant
    pub fn classify(owner: &str, code: u32) -> Self {
        match (owner, code) {
            ("GNU", 1) => Self::GnuAbiTag,
            ("GNU", 2) => Self::GnuHwcap,
            ("GNU", 3) => Self::GnuBuildId,
            ("GNU", 4) => Self::GnuGoldVersion,
            ("GNU", 5) => Self::GnuPropertyType0,
            ("stapsdt", 3) => Self::Stapsdt,
            _ => {
                log::warn!("Unrecognized note type {code:#x} for owner {owner:?}");
                Self::Unknown(code)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One entry of a GNU program-property note
pub struct GnuProperty {
    /// What the property describes
    pub property_type: GnuPropertyType,
    /// The property's data bytes
    pub data: Vec<u8>,
}

impl GnuProperty {
    /// The property data as a little-endian 32-bit word, for bitmask
    /// properties such as the x86 feature set
    pub fn as_u32(&self) -> Option<u32> {
        let bytes: [u8; 4] = self.data.get(..4)?.try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The decoded description of a note entry
pub enum NoteBody {
    /// Operating system ABI requirement
    GnuAbiTag {
        /// The OS the object was built for (0 = Linux)
        os: u32,
        /// Required kernel major version
        major: u32,
        /// Required kernel minor version
        minor: u32,
        /// Required kernel patch version
        patch: u32,
    },
    /// Synthesized hardware capabilities; kept raw
    GnuHwcap {
        /// The raw description bytes
        descriptor: Vec<u8>,
    },
    /// Unique build identifier
    GnuBuildId {
        /// The identifier bytes, conventionally rendered in hex
        id: Vec<u8>,
    },
    /// Version of the gold linker that produced the object
    GnuGoldVersion {
        /// The version string
        version: String,
    },
    /// Program property array
    GnuProperties {
        /// The decoded properties, in file order
        properties: Vec<GnuProperty>,
    },
    /// A Systemtap statically-defined-tracing probe
    Stapsdt {
        /// The probe's address
        location: u64,
        /// The address of the `.stapsdt.base` anchor
        base: u64,
        /// The address of the probe's semaphore, or 0
        semaphore: u64,
        /// The provider name
        provider: String,
        /// The probe name
        probe: String,
        /// The argument format string
        arguments: String,
    },
    /// An unrecognized note, retained raw
    Unknown {
        /// The raw description bytes
        descriptor: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One note entry: owner, discriminant and decoded description
pub struct NoteEntry {
    /// The entry's owner string, without its trailing NUL
    pub owner: String,
    /// The raw type discriminant
    pub type_code: u32,
    /// The classified note kind
    pub note_type: NoteType,
    /// The decoded description
    pub body: NoteBody,
}

/// Decode the description bytes for a classified note
fn parse_body(
    note_type: NoteType,
    descriptor: &[u8],
    cursor_endianness: Endianness,
    class: ElfClass,
) -> Result<NoteBody> {
    let mut sub = ByteCursor::new(descriptor, cursor_endianness);
    match note_type {
        NoteType::GnuAbiTag => Ok(NoteBody::GnuAbiTag {
            os: sub.read_u32()?,
            major: sub.read_u32()?,
            minor: sub.read_u32()?,
            patch: sub.read_u32()?,
        }),
        NoteType::GnuHwcap => Ok(NoteBody::GnuHwcap {
            descriptor: descriptor.to_vec(),
        }),
        NoteType::GnuBuildId => Ok(NoteBody::GnuBuildId {
            id: descriptor.to_vec(),
        }),
        NoteType::GnuGoldVersion => {
            // The version string may or may not carry a trailing NUL
            let end = descriptor
                .iter()
                .position(|&b| b == 0)
                .unwrap_or(descriptor.len());
            Ok(NoteBody::GnuGoldVersion {
                version: descriptor[..end].iter().map(|&b| b as char).collect(),
            })
        }
        NoteType::GnuPropertyType0 => Ok(NoteBody::GnuProperties {
            properties: parse_properties(descriptor, cursor_endianness, class)?,
        }),
        NoteType::Stapsdt => Ok(NoteBody::Stapsdt {
            location: class.read_word(&mut sub)?,
            base: class.read_word(&mut sub)?,
            semaphore: class.read_word(&mut sub)?,
            provider: sub.read_cstr()?,
            probe: sub.read_cstr()?,
            arguments: sub.read_cstr()?,
        }),
        NoteType::Unknown(_) => Ok(NoteBody::Unknown {
            descriptor: descriptor.to_vec(),
        }),
    }
}

/// Decode a program-property description: `(type, size, data)` records each
/// padded to the class word size
fn parse_properties(
    descriptor: &[u8],
    cursor_endianness: Endianness,
    class: ElfClass,
) -> Result<Vec<GnuProperty>> {
    let word = class.word_size();
    let mut sub = ByteCursor::new(descriptor, cursor_endianness);
    let mut properties = Vec::new();
    let mut position = 0u64;
    while position + 8 <= descriptor.len() as u64 {
        sub.set_position(position);
        let property_type = GnuPropertyType::from_code(sub.read_u32()?)?;
        let data_size = sub.read_u32()? as u64;
        let data = sub.read_bytes(data_size)?.to_vec();
        properties.push(GnuProperty {
            property_type,
            data,
        });
        let padded = (data_size + (word - 1)) & !(word - 1);
        position += 8 + padded;
    }
    Ok(properties)
}

/// Decode every entry of a note section
///
/// Entries are packed back-to-back until the section's declared size is
/// exhausted; the owner string and description are each zero-padded to a
/// 4-byte boundary.
pub fn parse_notes(
    cursor: &mut ByteCursor,
    class: ElfClass,
    header: &SectionHeader,
) -> Result<Vec<NoteEntry>> {
    let end = header.file_offset + header.size;
    cursor.with_alignment(1, |cursor| {
        let mut entries = Vec::new();
        let mut position = header.file_offset;
        while position + 12 <= end {
            cursor.set_position(position);
            // Header words are little-endian regardless of the file's order
            let name_size = cursor.read_u32_le()? as u64;
            let descriptor_size = cursor.read_u32_le()? as u64;
            let type_code = cursor.read_u32_le()?;
            let name_start = position + 12;
            let descriptor_start = name_start + align4(name_size);
            let next = descriptor_start + align4(descriptor_size);
            if next > end {
                return Err(Error::UnexpectedEnd {
                    offset: position,
                    wanted: next - position,
                    available: end - position,
                });
            }
            let owner_bytes = cursor.read_bytes(name_size)?;
            let nul = owner_bytes
                .iter()
                .position(|&b| b == 0)
                .unwrap_or(owner_bytes.len());
            let owner: String = owner_bytes[..nul].iter().map(|&b| b as char).collect();
            cursor.set_position(descriptor_start);
            let descriptor = cursor.read_bytes(descriptor_size)?;
            let note_type = NoteType::classify(&owner, type_code);
            let body = parse_body(note_type, descriptor, cursor.endianness(), class)?;
            entries.push(NoteEntry {
                owner,
                type_code,
                note_type,
                body,
            });
            position = next;
        }
        Ok(entries)
    })
}
