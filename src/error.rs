// Error types.
//
// One enum per concern so streaming callers can tell a bad configuration
// from a corrupt signature, a misuse of a finished session, or a broken
// delta.  `Error` gathers them for the file helpers and the CLI.

use std::io;

use thiserror::Error;

use crate::hash::strong::SigType;

/// Invalid construction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("block length must be positive")]
    InvalidBlockLen,
    #[error("invalid strong length {strong_len} for {sig_type}: must be in 1..={max}")]
    InvalidStrongLen {
        strong_len: u32,
        sig_type: SigType,
        max: u32,
    },
    #[error("unknown signature type {0:#010x}")]
    UnknownSigType(u32),
    #[error("literal buffer size must be positive")]
    InvalidLiteralBufSize,
}

/// A signature that could not be decoded.  No partial signature is ever
/// produced alongside one of these.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unknown signature magic {0:#010x}")]
    UnknownMagic(u32),
    #[error("signature header truncated: {len} of 12 bytes")]
    TruncatedHeader { len: usize },
    #[error(
        "signature record {index} truncated: {remaining} trailing bytes, record is {record_len}"
    )]
    TruncatedRecord {
        index: usize,
        remaining: usize,
        record_len: usize,
    },
    #[error("invalid signature header: {0}")]
    InvalidHeader(#[from] ConfigError),
    #[error("I/O error reading signature: {0}")]
    Io(#[from] io::Error),
}

/// A session was used after `end()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("session already finished")]
    Finished,
}

/// A delta that could not be applied.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("bad delta magic {0:#010x}")]
    BadMagic(u32),
    #[error("unknown opcode {opcode:#04x} at offset {offset}")]
    UnknownOpcode { opcode: u8, offset: u64 },
    #[error("delta truncated at offset {offset}")]
    Truncated { offset: u64 },
    #[error("copy of {len} bytes at {offset} is outside the {base_len}-byte base")]
    CopyOutOfRange { offset: u64, len: u64, base_len: u64 },
    #[error("delta ended without an END command")]
    MissingEnd,
    #[error("unexpected data after END at offset {offset}")]
    TrailingData { offset: u64 },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Any error the crate can produce.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
