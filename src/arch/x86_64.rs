//! Architecture specific definitions for x86_64

// NOTE: x86_64 defines no e_flags values

use crate::error::{Error, Result};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;

#[allow(non_camel_case_types)]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[non_exhaustive]
/// Relocation types for x86-64 objects
///
/// Relocation entries store the raw type code, since the code's meaning
/// depends on the file's machine; this set decodes the codes of x86-64
/// objects for display.
pub enum X86_64RelocationType {
    /// No relocation
    NONE = 0,
    /// Direct 64 bit
    R64 = 1,
    /// PC relative 32 bit signed
    PC32 = 2,
    /// 32 bit GOT entry
    GOT32 = 3,
    /// 32 bit PLT address
    PLT32 = 4,
    /// Copy symbol at runtime
    COPY = 5,
    /// Create GOT entry
    GLOB_DAT = 6,
    /// Create PLT entry
    JUMP_SLOT = 7,
    /// Adjust by program base
    RELATIVE = 8,
    /// 32 bit signed PC relative offset to GOT
    GOTPCREL = 9,
    /// Direct 32 bit zero extended
    R32 = 10,
    /// Direct 32 bit sign extended
    R32S = 11,
    /// Direct 16 bit zero extended
    R16 = 12,
    /// 16 bit sign extended PC relative
    PC16 = 13,
    /// Direct 8 bit sign extended
    R8 = 14,
    /// 8 bit sign extended PC relative
    PC8 = 15,
    /// ID of module containing symbol
    DTPMOD64 = 16,
    /// Offset in module's TLS block
    DTPOFF64 = 17,
    /// Offset in initial TLS block
    TPOFF64 = 18,
    /// 32 bit signed PC relative offset to two GOT entries for a GD symbol
    TLSGD = 19,
    /// 32 bit signed PC relative offset to two GOT entries for an LD symbol
    TLSLD = 20,
    /// Offset in TLS block
    DTPOFF32 = 21,
    /// 32 bit signed PC relative offset to the GOT entry for an IE symbol
    GOTTPOFF = 22,
    /// Offset in initial TLS block, 32 bit
    TPOFF32 = 23,
    /// PC relative 64 bit
    PC64 = 24,
    /// 64 bit offset to GOT
    GOTOFF64 = 25,
    /// 32 bit signed PC relative offset to GOT
    GOTPC32 = 26,
    /// 64-bit GOT entry offset
    GOT64 = 27,
    /// 64-bit PC relative offset to GOT entry
    GOTPCREL64 = 28,
    /// 64-bit PC relative offset to GOT
    GOTPC64 = 29,
    /// Like GOT64, says PLT entry needed
    GOTPLT64 = 30,
    /// 64-bit GOT relative offset to PLT entry
    PLTOFF64 = 31,
    /// Size of symbol plus 32-bit addend
    SIZE32 = 32,
    /// Size of symbol plus 64-bit addend
    SIZE64 = 33,
    /// GOT offset for TLS descriptor
    GOTPC32_TLSDESC = 34,
    /// Marker for call through TLS descriptor
    TLSDESC_CALL = 35,
    /// TLS descriptor
    TLSDESC = 36,
    /// Adjust indirectly by program base
    IRELATIVE = 37,
    /// 64-bit adjust by program base
    RELATIVE64 = 38,
    /// Load from 32 bit signed PC relative offset to GOT entry, relaxable
    GOTPCRELX = 41,
    /// Load from 32 bit signed PC relative offset to GOT entry with REX
    /// prefix, relaxable
    REX_GOTPCRELX = 42,
}

impl X86_64RelocationType {
    /// Decode a raw relocation type code for an x86-64 object
    pub fn from_code(code: u32) -> Result<Self> {
        Self::from_u32(code).ok_or(Error::InvalidEnumCode {
            which: "X86_64RelocationType",
            value: code as u64,
        })
    }

    /// The raw code for this relocation type
    pub fn code(&self) -> u32 {
        *self as u32
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(
            X86_64RelocationType::from_code(7).unwrap(),
            X86_64RelocationType::JUMP_SLOT
        );
        assert_eq!(
            X86_64RelocationType::from_code(8).unwrap(),
            X86_64RelocationType::RELATIVE
        );
        assert_eq!(X86_64RelocationType::JUMP_SLOT.code(), 7);
    }

    #[test]
    fn test_unassigned_code() {
        assert_eq!(
            X86_64RelocationType::from_code(40),
            Err(Error::InvalidEnumCode {
                which: "X86_64RelocationType",
                value: 40
            })
        );
    }
}
