//! Error type for ELF object inspection

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Error type for errors during ELF object parsing and model queries
pub enum Error {
    /// The first four bytes of the input were not `0x7F 'E' 'L' 'F'`
    #[error("Bad magic bytes {found:02x?}, expected 7f 45 4c 46")]
    BadMagic {
        /// The bytes found where the magic was expected
        found: [u8; 4],
    },
    /// A closed-set enumerant code was neither a known value nor inside one of
    /// the set's reserved ranges
    #[error("Invalid code {value:#x} for {which}")]
    InvalidEnumCode {
        /// The name of the closed set the code was decoded for
        which: &'static str,
        /// The offending code
        value: u64,
    },
    /// A validated field held a value other than the one the format requires
    #[error("Invalid value for {field}: expected {expected}, found {actual:#x}")]
    InvalidFieldValue {
        /// The name of the field
        field: &'static str,
        /// A description of the permitted value(s)
        expected: &'static str,
        /// The value actually read
        actual: u64,
    },
    /// An alignment was nonzero and not a power of two, or a program header
    /// failed the `virtual_address == offset (mod alignment)` cross-check
    #[error("Bad alignment {value:#x}")]
    BadAlignment {
        /// The offending alignment value
        value: u64,
    },
    /// A read extended past the end of the input bytes
    #[error(
        "Unexpected end of input: {wanted} bytes wanted at offset {offset:#x}, {available} available"
    )]
    UnexpectedEnd {
        /// The position the read started from
        offset: u64,
        /// The number of bytes the read required
        wanted: u64,
        /// The number of bytes remaining
        available: u64,
    },
    /// A link between two parts of the file could not be resolved
    #[error("Cross-reference failed for {kind}: {detail}")]
    CrossReferenceFailed {
        /// The kind of cross-reference that failed
        kind: &'static str,
        /// What went wrong
        detail: String,
    },
    /// A flag word held bits outside the union of the defined flag codes
    #[error("Invalid bits {bits:#x} for {field}")]
    InvalidBitset {
        /// The name of the flag field
        field: &'static str,
        /// The full bit pattern that was rejected
        bits: u64,
    },
    /// An I/O error occurred while reading a file from disk
    #[error("An I/O error occurred: {kind}")]
    Io {
        /// The kind of I/O error
        kind: std::io::ErrorKind,
    },
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io { kind: value.kind() }
    }
}

/// Result type with the crate error preapplied
pub type Result<T> = std::result::Result<T, Error>;
