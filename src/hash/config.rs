// Wire constants and tuning defaults matching librsync / rdiff.
//
// Signature and delta sessions are configured through `SignatureOptions`
// and `DeltaOptions`; both validate eagerly so that a bad configuration is
// rejected at construction time rather than mid-stream.

use crate::error::ConfigError;
use crate::hash::strong::SigType;

/// Magic number that opens every delta stream (`RS_DELTA_MAGIC`).
pub const DELTA_MAGIC: u32 = 0x7273_0236;

/// Size of the signature header: magic + block length + strong length.
pub const SIGNATURE_HEADER_LEN: usize = 12;

/// Default block length used by `rdiff signature`.
pub const DEFAULT_BLOCK_LEN: u32 = 2048;

/// Default literal buffer size (`OUTPUT_BUFFER_SIZE` in librsync-go).
pub const DEFAULT_LITERAL_BUF_SIZE: usize = 16 * 1024;

/// Upper bound on buffer space reserved ahead of input.  `block_len` comes
/// off the wire, so block buffers start at most this large and grow with
/// the data actually received.
pub const MAX_BLOCK_PREALLOC: usize = 64 * 1024;

/// Signature construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureOptions {
    /// Strong hash variant (and wire magic).
    pub sig_type: SigType,
    /// Size of every base block except possibly the last.
    pub block_len: u32,
    /// Number of strong-hash bytes kept per block.
    pub strong_len: u32,
}

impl SignatureOptions {
    /// Options using `sig_type`'s full native strong length.
    pub fn new(sig_type: SigType, block_len: u32) -> Self {
        Self {
            sig_type,
            block_len,
            strong_len: sig_type.native_len() as u32,
        }
    }

    /// Check `block_len > 0` and `0 < strong_len <= native_len(sig_type)`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_len == 0 {
            return Err(ConfigError::InvalidBlockLen);
        }
        let max = self.sig_type.native_len() as u32;
        if self.strong_len == 0 || self.strong_len > max {
            return Err(ConfigError::InvalidStrongLen {
                strong_len: self.strong_len,
                sig_type: self.sig_type,
                max,
            });
        }
        Ok(())
    }
}

impl Default for SignatureOptions {
    fn default() -> Self {
        Self::new(SigType::Blake2, DEFAULT_BLOCK_LEN)
    }
}

/// Delta session parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaOptions {
    /// Literal bytes accumulated before a LITERAL command is forced out.
    pub literal_buf_size: usize,
}

impl DeltaOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.literal_buf_size == 0 {
            return Err(ConfigError::InvalidLiteralBufSize);
        }
        Ok(())
    }
}

impl Default for DeltaOptions {
    fn default() -> Self {
        Self {
            literal_buf_size: DEFAULT_LITERAL_BUF_SIZE,
        }
    }
}
