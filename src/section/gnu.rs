//! GNU dynamic-linking extensions: the GNU hash table, per-symbol version
//! indices and the version requirement chains

use crate::base::ByteCursor;
use crate::error::{Error, Result};
use crate::header::elf::identification::ElfClass;
use crate::header::section::SectionHeader;

/// The GNU `dl-new` hash over a symbol name
pub fn gnu_hash(name: &str) -> u32 {
    name.bytes()
        .fold(5381u32, |hash, byte| {
            hash.wrapping_mul(33).wrapping_add(byte as u32)
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The GNU-style symbol hash table: a bloom filter over symbol hashes plus
/// bucket and chain arrays
pub struct GnuHashTable {
    /// The number of hash buckets
    pub bucket_count: u32,
    /// The index of the first dynamic symbol the table covers
    pub symbol_offset: u32,
    /// The number of bloom filter words
    pub bloom_size: u32,
    /// The bloom filter's second-bit shift amount
    pub bloom_shift: u32,
    /// The bloom filter words; class-width on file, widened to 64 bits
    pub bloom: Vec<u64>,
    /// The bucket array: the first symbol index of each bucket's chain, or 0
    pub buckets: Vec<u32>,
    /// The chain array: one masked hash word per covered symbol, low bit set
    /// on the last entry of each chain
    pub chains: Vec<u32>,
}

impl GnuHashTable {
    /// The number of symbols each chain holds, accumulated into a counter
    /// per chain length
    ///
    /// Index `n` of the result counts the buckets whose chain holds `n`
    /// symbols; empty buckets are not counted.
    pub fn bucket_histogram(&self) -> Vec<u64> {
        let mut counts: Vec<u64> = Vec::new();
        for &bucket in &self.buckets {
            if bucket == 0 {
                continue;
            }
            let Some(start) = bucket.checked_sub(self.symbol_offset) else {
                log::warn!("GNU hash bucket {bucket:#x} precedes the symbol offset");
                continue;
            };
            let mut length = 0u64;
            let mut index = start as usize;
            while let Some(&word) = self.chains.get(index) {
                length += 1;
                if word & 1 == 1 {
                    break;
                }
                index += 1;
            }
            if counts.len() <= length as usize {
                counts.resize(length as usize + 1, 0);
            }
            counts[length as usize] += 1;
        }
        counts
    }
}

/// Decode a GNU hash section
///
/// The layout is a four-word header, `bloom_size` class-width bloom words,
/// `bucket_count` 32-bit buckets, and a chain array filling the remainder of
/// the section.
pub fn parse_gnu_hash(
    cursor: &mut ByteCursor,
    class: ElfClass,
    header: &SectionHeader,
) -> Result<GnuHashTable> {
    cursor.with_alignment(1, |cursor| {
        cursor.set_position(header.file_offset);
        let bucket_count = cursor.read_u32()?;
        let symbol_offset = cursor.read_u32()?;
        let bloom_size = cursor.read_u32()?;
        let bloom_shift = cursor.read_u32()?;
        let fixed = 16u64
            + bloom_size as u64 * class.word_size()
            + bucket_count as u64 * 4;
        let Some(chain_bytes) = header.size.checked_sub(fixed) else {
            return Err(Error::InvalidFieldValue {
                field: "gnu hash section size",
                expected: "room for the header, bloom and bucket arrays",
                actual: header.size,
            });
        };
        let mut bloom = Vec::new();
        for _ in 0..bloom_size {
            bloom.push(class.read_word(cursor)?);
        }
        let mut buckets = Vec::new();
        for _ in 0..bucket_count {
            buckets.push(cursor.read_u32()?);
        }
        let mut chains = Vec::new();
        for _ in 0..chain_bytes / 4 {
            chains.push(cursor.read_u32()?);
        }
        Ok(GnuHashTable {
            bucket_count,
            symbol_offset,
            bloom_size,
            bloom_shift,
            bloom,
            buckets,
            chains,
        })
    })
}

/// Decode a GNU version section: one 16-bit version index per symbol of the
/// linked dynamic symbol table
pub fn parse_versions(cursor: &mut ByteCursor, header: &SectionHeader) -> Result<Vec<u16>> {
    cursor.with_alignment(1, |cursor| {
        cursor.set_position(header.file_offset);
        let mut versions = Vec::new();
        for _ in 0..header.size / 2 {
            versions.push(cursor.read_u16()?);
        }
        Ok(versions)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// One auxiliary entry of a version requirement: a single required version
/// from the requirement's file
pub struct VersionRequirementAux {
    /// The hash of the version name, as computed by the SysV ELF hash
    pub hash: u32,
    /// Version flags (weak, base)
    pub flags: u16,
    /// The version index that symbols in the version table carry
    pub index: u16,
    /// The offset of the version name in the linked string table
    pub name_offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One version requirement: the versions needed from one shared library
pub struct VersionRequirement {
    /// The structure version of the record; always 1
    pub version: u16,
    /// The offset of the file name in the linked string table
    pub file_offset: u32,
    /// The required versions, in file order
    pub aux: Vec<VersionRequirementAux>,
}

/// Decode a GNU version requirement section: a chain of records, each with a
/// chain of auxiliary entries; both chains terminate on a zero next-offset
pub fn parse_version_requirements(
    cursor: &mut ByteCursor,
    header: &SectionHeader,
) -> Result<Vec<VersionRequirement>> {
    // Bound both walks by the worst case of back-to-back records, so a
    // malformed next-offset cycle terminates
    let record_limit = header.size / 16 + 1;
    cursor.with_alignment(1, |cursor| {
        let mut requirements = Vec::new();
        let mut record_offset = header.file_offset;
        let mut records = 0u64;
        loop {
            records += 1;
            if records > record_limit {
                return Err(Error::CrossReferenceFailed {
                    kind: "version requirements",
                    detail: "the requirement chain does not terminate".to_string(),
                });
            }
            cursor.set_position(record_offset);
            let version = cursor.read_u16()?;
            if version != 1 {
                log::warn!("Version requirement record has structure version {version}");
            }
            let aux_count = cursor.read_u16()?;
            let file_offset = cursor.read_u32()?;
            let aux_offset = cursor.read_u32()?;
            let next_offset = cursor.read_u32()?;

            let mut aux = Vec::new();
            let mut aux_position = record_offset + aux_offset as u64;
            let mut walked = 0u64;
            loop {
                walked += 1;
                if walked > record_limit {
                    return Err(Error::CrossReferenceFailed {
                        kind: "version requirements",
                        detail: "an auxiliary chain does not terminate".to_string(),
                    });
                }
                cursor.set_position(aux_position);
                let hash = cursor.read_u32()?;
                let flags = cursor.read_u16()?;
                let index = cursor.read_u16()?;
                let name_offset = cursor.read_u32()?;
                let aux_next = cursor.read_u32()?;
                aux.push(VersionRequirementAux {
                    hash,
                    flags,
                    index,
                    name_offset,
                });
                if aux_next == 0 {
                    break;
                }
                aux_position += aux_next as u64;
            }
            if aux.len() as u64 != aux_count as u64 {
                log::warn!(
                    "Version requirement declares {aux_count} auxiliary entries but chains {}",
                    aux.len()
                );
            }
            requirements.push(VersionRequirement {
                version,
                file_offset,
                aux,
            });
            if next_offset == 0 {
                break;
            }
            record_offset += next_offset as u64;
        }
        Ok(requirements)
    })
}
