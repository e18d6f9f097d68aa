// Streaming delta session.
//
// Pairs a `DeltaMatcher` with a `CommandEncoder`: every `digest` call
// returns the delta bytes that became final during that call, and `end`
// returns the rest, terminated by END.  Concatenating all returned chunks
// gives the complete delta.

use std::io::{self, Read, Write};

use crate::error::{ConfigError, Error, StateError};
use crate::hash::config::DeltaOptions;
use crate::signature::Signature;
use crate::wire::encoder::CommandEncoder;

use super::matcher::DeltaMatcher;

const READ_BUF_SIZE: usize = 64 * 1024;

/// Summary of a delta session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaStats {
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub copy_commands: u64,
    pub literal_commands: u64,
    pub copy_bytes: u64,
    pub literal_bytes: u64,
    pub blocks_matched: u64,
    pub false_matches: u64,
}

/// Delta of a new object against `sig`.
///
/// ```
/// use rsdelta::delta::Delta;
/// use rsdelta::hash::config::{DeltaOptions, SignatureOptions};
/// use rsdelta::signature::signature;
/// use rsdelta::wire::apply;
///
/// let base = b"the quick brown fox jumps over the lazy dog".repeat(20);
/// let sig = signature(&base[..], SignatureOptions { block_len: 16, ..Default::default() }).unwrap();
///
/// let mut new = base.clone();
/// new.extend_from_slice(b" and runs away");
///
/// let mut d = Delta::new(&sig, DeltaOptions::default()).unwrap();
/// let mut bytes = d.digest(&new).unwrap();
/// bytes.extend(d.end().unwrap());
/// assert_eq!(apply(&base, &bytes).unwrap(), new);
/// ```
#[derive(Debug)]
pub struct Delta<'s> {
    matcher: DeltaMatcher<'s>,
    encoder: CommandEncoder,
}

impl<'s> Delta<'s> {
    pub fn new(sig: &'s Signature, opts: DeltaOptions) -> Result<Self, ConfigError> {
        Self::with_literal_buffer(sig, opts, Vec::new())
    }

    /// Like `new`, reusing `buf`'s allocation for the literal buffer.
    pub fn with_literal_buffer(
        sig: &'s Signature,
        opts: DeltaOptions,
        buf: Vec<u8>,
    ) -> Result<Self, ConfigError> {
        opts.validate()?;
        log::debug!(
            "delta: {} blocks of {} bytes, literal buffer {}",
            sig.block_count(),
            sig.block_len(),
            opts.literal_buf_size
        );
        Ok(Self {
            matcher: DeltaMatcher::new(sig, opts.literal_buf_size, buf),
            encoder: CommandEncoder::new(),
        })
    }

    /// Feed the next chunk of the new object; returns delta bytes now ready.
    pub fn digest(&mut self, chunk: &[u8]) -> Result<Vec<u8>, StateError> {
        let mut out = Vec::new();
        self.digest_into(chunk, &mut out)?;
        Ok(out)
    }

    /// Like `digest`, appending to `out`.
    pub fn digest_into(&mut self, chunk: &[u8], out: &mut Vec<u8>) -> Result<(), StateError> {
        self.matcher.feed(chunk, &mut self.encoder)?;
        self.encoder.drain_into(out);
        Ok(())
    }

    /// Finish the delta; returns the final bytes including END.
    pub fn end(&mut self) -> Result<Vec<u8>, StateError> {
        let mut out = Vec::new();
        self.end_into(&mut out)?;
        Ok(out)
    }

    pub fn end_into(&mut self, out: &mut Vec<u8>) -> Result<(), StateError> {
        self.matcher.finish(&mut self.encoder)?;
        self.encoder.end();
        self.encoder.drain_into(out);
        Ok(())
    }

    /// Feed all of `reader`, writing delta bytes to `writer` as they become
    /// ready.  Does not call `end`.  Returns bytes consumed.
    pub fn digest_reader<R: Read, W: Write>(
        &mut self,
        mut reader: R,
        mut writer: W,
    ) -> Result<u64, Error> {
        let mut buf = vec![0u8; READ_BUF_SIZE];
        let mut out = Vec::new();
        let mut total = 0u64;
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    self.digest_into(&buf[..n], &mut out)?;
                    writer.write_all(&out)?;
                    out.clear();
                    total += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(total)
    }

    pub fn stats(&self) -> DeltaStats {
        let m = self.matcher.stats();
        let e = self.encoder.stats();
        DeltaStats {
            bytes_in: m.bytes_in,
            bytes_out: e.bytes_out,
            copy_commands: e.copy_commands,
            literal_commands: e.literal_commands,
            copy_bytes: e.copy_bytes,
            literal_bytes: e.literal_bytes,
            blocks_matched: m.blocks_matched,
            false_matches: m.false_matches,
        }
    }

    /// Recover the literal buffer for the next session.
    pub fn into_literal_buffer(self) -> Vec<u8> {
        self.matcher.into_literal_buffer()
    }
}

/// One-shot delta: read the whole new object from `input`, write the
/// complete delta to `output`.
pub fn delta<R: Read, W: Write>(
    sig: &Signature,
    input: R,
    mut output: W,
    opts: DeltaOptions,
) -> Result<DeltaStats, Error> {
    let mut session = Delta::new(sig, opts)?;
    session.digest_reader(input, &mut output)?;
    output.write_all(&session.end()?)?;
    output.flush()?;
    Ok(session.stats())
}
