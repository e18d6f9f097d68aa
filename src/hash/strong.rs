// Strong (content) hashes used to confirm weak-checksum hits.
//
// Two variants, selected by the signature magic:
//   - `0x72730137`: BLAKE2b with a 32-byte output
//   - `0x72730136`: MD4 (16 bytes), the historical rdiff default
//
// Digests are always truncated to the first `strong_len` bytes.

use std::fmt;

use blake2::Blake2b;
use blake2::digest::consts::U32;
use digest::Digest;
use md4::Md4;

use crate::error::ConfigError;

type Blake2b256 = Blake2b<U32>;

/// Largest native digest among the supported variants.
pub const MAX_STRONG_LEN: usize = 32;

/// Native BLAKE2b output length.
pub const BLAKE2_SUM_LENGTH: usize = 32;

/// Native MD4 output length.
pub const MD4_SUM_LENGTH: usize = 16;

/// Signature type, identified on the wire by its magic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigType {
    /// `RS_BLAKE2_SIG_MAGIC`.
    Blake2,
    /// `RS_MD4_SIG_MAGIC`.
    Md4,
}

impl SigType {
    pub const BLAKE2_MAGIC: u32 = 0x7273_0137;
    pub const MD4_MAGIC: u32 = 0x7273_0136;

    /// Resolve a wire magic number.
    pub fn from_magic(magic: u32) -> Option<Self> {
        match magic {
            Self::BLAKE2_MAGIC => Some(Self::Blake2),
            Self::MD4_MAGIC => Some(Self::Md4),
            _ => None,
        }
    }

    pub fn magic(self) -> u32 {
        match self {
            Self::Blake2 => Self::BLAKE2_MAGIC,
            Self::Md4 => Self::MD4_MAGIC,
        }
    }

    /// Untruncated digest length of the underlying algorithm.
    pub fn native_len(self) -> usize {
        match self {
            Self::Blake2 => BLAKE2_SUM_LENGTH,
            Self::Md4 => MD4_SUM_LENGTH,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Blake2 => "blake2",
            Self::Md4 => "md4",
        }
    }
}

impl fmt::Display for SigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#010x})", self.name(), self.magic())
    }
}

impl TryFrom<u32> for SigType {
    type Error = ConfigError;

    fn try_from(magic: u32) -> Result<Self, Self::Error> {
        Self::from_magic(magic).ok_or(ConfigError::UnknownSigType(magic))
    }
}

/// Truncated strong digest of one block.
///
/// Stored inline; only the first `len` bytes are meaningful.
#[derive(Clone, Copy)]
pub struct StrongSum {
    bytes: [u8; MAX_STRONG_LEN],
    len: usize,
}

impl StrongSum {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl PartialEq<[u8]> for StrongSum {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl fmt::Debug for StrongSum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.as_bytes() {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Strong hash configured for one session: variant plus truncation length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrongHash {
    sig_type: SigType,
    strong_len: usize,
}

impl StrongHash {
    /// Build a hasher, rejecting `strong_len` outside `1..=native_len`.
    pub fn new(sig_type: SigType, strong_len: usize) -> Result<Self, ConfigError> {
        let max = sig_type.native_len();
        if strong_len == 0 || strong_len > max {
            return Err(ConfigError::InvalidStrongLen {
                strong_len: strong_len as u32,
                sig_type,
                max: max as u32,
            });
        }
        Ok(Self {
            sig_type,
            strong_len,
        })
    }

    pub fn sig_type(&self) -> SigType {
        self.sig_type
    }

    pub fn strong_len(&self) -> usize {
        self.strong_len
    }

    /// Hash `data` and keep the first `strong_len` bytes.
    pub fn digest(&self, data: &[u8]) -> StrongSum {
        let mut bytes = [0u8; MAX_STRONG_LEN];
        match self.sig_type {
            SigType::Blake2 => {
                let full = Blake2b256::digest(data);
                bytes[..self.strong_len].copy_from_slice(&full[..self.strong_len]);
            }
            SigType::Md4 => {
                let full = Md4::digest(data);
                bytes[..self.strong_len].copy_from_slice(&full[..self.strong_len]);
            }
        }
        StrongSum {
            bytes,
            len: self.strong_len,
        }
    }
}
