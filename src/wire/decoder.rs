// Delta decoding and patch application.
//
// Two entry points:
//   - `apply`: base and delta both in memory, returns the new object
//   - `patch`: base behind `BaseSource`, delta from any `Read`, output to
//     any `Write`; memory use is bounded by one copy buffer
//
// `CommandIterator` walks an in-memory delta without applying it.

use std::io::{self, Read, Seek, SeekFrom, Write};

use log::debug;

use super::int::get_int;
use super::opcode::{CommandRef, Opcode};
use crate::error::PatchError;
use crate::hash::config::DELTA_MAGIC;

const COPY_BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Base object access
// ---------------------------------------------------------------------------

/// Random-access view of the base object for COPY commands.
pub trait BaseSource {
    /// Total base length, if known up front.
    fn base_len(&self) -> Option<u64>;

    /// Fill `buf` from `offset`.  Must fail with `CopyOutOfRange` if the
    /// range is not entirely inside the base object.
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), PatchError>;

    /// Zero-copy access for in-memory bases.
    fn slice_at(&self, _offset: u64, _len: usize) -> Option<&[u8]> {
        None
    }
}

fn slice_range(data: &[u8], offset: u64, len: usize) -> Option<&[u8]> {
    let start = usize::try_from(offset).ok()?;
    let end = start.checked_add(len)?;
    data.get(start..end)
}

impl BaseSource for &[u8] {
    fn base_len(&self) -> Option<u64> {
        Some(self.len() as u64)
    }

    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), PatchError> {
        let src = self
            .slice_at(offset, buf.len())
            .ok_or(PatchError::CopyOutOfRange {
                offset,
                len: buf.len() as u64,
                base_len: self.len() as u64,
            })?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn slice_at(&self, offset: u64, len: usize) -> Option<&[u8]> {
        slice_range(self, offset, len)
    }
}

impl BaseSource for Vec<u8> {
    fn base_len(&self) -> Option<u64> {
        Some(self.len() as u64)
    }

    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), PatchError> {
        self.as_slice().read_exact_at(offset, buf)
    }

    fn slice_at(&self, offset: u64, len: usize) -> Option<&[u8]> {
        slice_range(self, offset, len)
    }
}

/// Base object behind a seekable reader (typically a `File`).
#[derive(Debug)]
pub struct SeekBase<R> {
    inner: R,
    len: u64,
}

impl<R: Read + Seek> SeekBase<R> {
    pub fn new(mut inner: R) -> io::Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        Ok(Self { inner, len })
    }
}

impl<R: Read + Seek> BaseSource for SeekBase<R> {
    fn base_len(&self) -> Option<u64> {
        Some(self.len)
    }

    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), PatchError> {
        let len = buf.len() as u64;
        if offset.checked_add(len).is_none_or(|end| end > self.len) {
            return Err(PatchError::CopyOutOfRange {
                offset,
                len,
                base_len: self.len,
            });
        }
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.read_exact(buf)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory command iteration
// ---------------------------------------------------------------------------

/// Iterator over the commands of an in-memory delta.
///
/// Yields `Err` once and then stops if the delta is malformed.  A delta that
/// runs out before END, or carries bytes after it, is an error.
pub struct CommandIterator<'a> {
    data: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> CommandIterator<'a> {
    /// Check the magic and position the iterator on the first command.
    pub fn new(data: &'a [u8]) -> Result<Self, PatchError> {
        if data.len() < 4 {
            return Err(PatchError::Truncated {
                offset: data.len() as u64,
            });
        }
        let magic = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        if magic != DELTA_MAGIC {
            return Err(PatchError::BadMagic(magic));
        }
        Ok(Self {
            data,
            pos: 4,
            done: false,
        })
    }

    /// Offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], PatchError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(PatchError::Truncated {
                offset: self.data.len() as u64,
            })?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn next_command(&mut self) -> Result<Option<CommandRef<'a>>, PatchError> {
        let at = self.pos as u64;
        let Some(&op) = self.data.get(self.pos) else {
            return Err(PatchError::MissingEnd);
        };
        self.pos += 1;
        let opcode = Opcode::decode(op).ok_or(PatchError::UnknownOpcode { opcode: op, offset: at })?;
        match opcode {
            Opcode::End => {
                if self.pos != self.data.len() {
                    return Err(PatchError::TrailingData {
                        offset: self.pos as u64,
                    });
                }
                Ok(None)
            }
            Opcode::LiteralImmediate(len) => Ok(Some(CommandRef::Literal(self.take(len)?))),
            Opcode::Literal { len_width } => {
                let len = get_int(self.take(len_width)?);
                let len = usize::try_from(len).map_err(|_| PatchError::Truncated {
                    offset: self.data.len() as u64,
                })?;
                Ok(Some(CommandRef::Literal(self.take(len)?)))
            }
            Opcode::Copy {
                offset_width,
                len_width,
            } => {
                let offset = get_int(self.take(offset_width)?);
                let len = get_int(self.take(len_width)?);
                Ok(Some(CommandRef::Copy { offset, len }))
            }
        }
    }
}

impl<'a> Iterator for CommandIterator<'a> {
    type Item = Result<CommandRef<'a>, PatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_command() {
            Ok(Some(cmd)) => Some(Ok(cmd)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Reconstruct the new object from an in-memory base and delta.
pub fn apply(base: &[u8], delta: &[u8]) -> Result<Vec<u8>, PatchError> {
    let mut out = Vec::with_capacity(base.len());
    for cmd in CommandIterator::new(delta)? {
        match cmd? {
            CommandRef::Literal(data) => out.extend_from_slice(data),
            CommandRef::Copy { offset, len } => {
                let src = usize::try_from(len)
                    .ok()
                    .and_then(|len| slice_range(base, offset, len))
                    .ok_or(PatchError::CopyOutOfRange {
                        offset,
                        len,
                        base_len: base.len() as u64,
                    })?;
                out.extend_from_slice(src);
            }
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Streaming patch
// ---------------------------------------------------------------------------

/// Counters returned by `patch`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchStats {
    pub copy_commands: u64,
    pub literal_commands: u64,
    pub copy_bytes: u64,
    pub literal_bytes: u64,
    /// Delta bytes consumed, including magic and END.
    pub delta_bytes: u64,
    pub output_bytes: u64,
}

/// `Read` adaptor that tracks the offset and turns EOF into `Truncated`.
struct DeltaReader<R> {
    inner: R,
    offset: u64,
}

impl<R: Read> DeltaReader<R> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), PatchError> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.offset += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(PatchError::Truncated { offset: self.offset })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Next byte, or `None` at a clean end of input.
    fn next_byte(&mut self) -> Result<Option<u8>, PatchError> {
        let mut b = [0u8; 1];
        loop {
            match self.inner.read(&mut b) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.offset += 1;
                    return Ok(Some(b[0]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn read_int(&mut self, width: usize) -> Result<u64, PatchError> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf[..width])?;
        Ok(get_int(&buf[..width]))
    }
}

fn copy_literal<R: Read, W: Write>(
    rd: &mut DeltaReader<R>,
    out: &mut W,
    buf: &mut [u8],
    len: u64,
) -> Result<(), PatchError> {
    let mut left = len;
    while left > 0 {
        let n = left.min(buf.len() as u64) as usize;
        rd.read_exact(&mut buf[..n])?;
        out.write_all(&buf[..n])?;
        left -= n as u64;
    }
    Ok(())
}

/// Apply a streamed delta to `base`, writing the new object to `out`.
pub fn patch<B, R, W>(base: &mut B, delta: R, mut out: W) -> Result<PatchStats, PatchError>
where
    B: BaseSource + ?Sized,
    R: Read,
    W: Write,
{
    let mut rd = DeltaReader {
        inner: delta,
        offset: 0,
    };
    let mut magic = [0u8; 4];
    rd.read_exact(&mut magic)?;
    let magic = u32::from_be_bytes(magic);
    if magic != DELTA_MAGIC {
        return Err(PatchError::BadMagic(magic));
    }

    let mut stats = PatchStats::default();
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    loop {
        let at = rd.offset;
        let op = rd.next_byte()?.ok_or(PatchError::MissingEnd)?;
        let opcode = Opcode::decode(op).ok_or(PatchError::UnknownOpcode { opcode: op, offset: at })?;
        match opcode {
            Opcode::End => break,
            Opcode::LiteralImmediate(n) => {
                copy_literal(&mut rd, &mut out, &mut buf, n as u64)?;
                stats.literal_commands += 1;
                stats.literal_bytes += n as u64;
            }
            Opcode::Literal { len_width } => {
                let len = rd.read_int(len_width)?;
                copy_literal(&mut rd, &mut out, &mut buf, len)?;
                stats.literal_commands += 1;
                stats.literal_bytes += len;
            }
            Opcode::Copy {
                offset_width,
                len_width,
            } => {
                let offset = rd.read_int(offset_width)?;
                let len = rd.read_int(len_width)?;
                if let Some(base_len) = base.base_len() {
                    if offset.checked_add(len).is_none_or(|end| end > base_len) {
                        return Err(PatchError::CopyOutOfRange {
                            offset,
                            len,
                            base_len,
                        });
                    }
                }
                let mut done = 0u64;
                while done < len {
                    let n = (len - done).min(buf.len() as u64) as usize;
                    match base.slice_at(offset + done, n) {
                        Some(src) => out.write_all(src)?,
                        None => {
                            base.read_exact_at(offset + done, &mut buf[..n])?;
                            out.write_all(&buf[..n])?;
                        }
                    }
                    done += n as u64;
                }
                stats.copy_commands += 1;
                stats.copy_bytes += len;
            }
        }
    }

    if rd.next_byte()?.is_some() {
        return Err(PatchError::TrailingData {
            offset: rd.offset - 1,
        });
    }
    stats.delta_bytes = rd.offset;
    stats.output_bytes = stats.copy_bytes + stats.literal_bytes;
    debug!(
        "patch: {} delta bytes -> {} output bytes ({} copies, {} literals)",
        stats.delta_bytes, stats.output_bytes, stats.copy_commands, stats.literal_commands
    );
    Ok(stats)
}
