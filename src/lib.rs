//! rsdelta: librsync-compatible signatures, deltas and patches in Rust.
//!
//! The crate provides:
//! - Streaming signature construction and the rdiff signature format (`signature`)
//! - A streaming block matcher producing librsync delta streams (`delta`)
//! - Delta encoding, decoding and patch application (`wire`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use rsdelta::delta::Delta;
//! use rsdelta::hash::config::{DeltaOptions, SignatureOptions};
//! use rsdelta::hash::strong::SigType;
//! use rsdelta::signature::{Signature, SignatureBuilder};
//! use rsdelta::wire::apply;
//!
//! let base = b"hello old world, hello old friend".to_vec();
//! let new = b"hello new world, hello old friend".to_vec();
//!
//! // Signature of the base, in two chunks.
//! let mut builder = SignatureBuilder::new(SignatureOptions::new(SigType::Md4, 8)).unwrap();
//! builder.digest(&base[..10]).unwrap();
//! builder.digest(&base[10..]).unwrap();
//! let sig = builder.end().unwrap();
//!
//! // Ship it and decode it on the other side.
//! let sig = Signature::deserialize(&sig.serialize()).unwrap();
//!
//! let mut delta = Delta::new(&sig, DeltaOptions::default()).unwrap();
//! let mut bytes = delta.digest(&new).unwrap();
//! bytes.extend(delta.end().unwrap());
//!
//! assert_eq!(apply(&base, &bytes).unwrap(), new);
//! ```

pub mod delta;
pub mod error;
pub mod hash;
pub mod io;
pub mod signature;
pub mod wire;

#[cfg(feature = "cli")]
pub mod cli;

pub use delta::{Delta, DeltaStats};
pub use error::{ConfigError, Error, ParseError, PatchError, Result, StateError};
pub use hash::config::{DeltaOptions, SignatureOptions};
pub use hash::strong::SigType;
pub use signature::{Signature, SignatureBuilder};
