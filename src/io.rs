// File-level helpers for signature, delta and patch.
//
// Each operation comes in a stream form (`*_stream`, generic over
// `Read`/`Write`, used by the CLI for stdin/stdout) and a path form
// (`*_file`).  Both return a stats struct.  With the `file-io` feature the
// stats also carry a streaming SHA-256 of the object that flowed through.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

#[cfg(feature = "file-io")]
use sha2::Digest;

use crate::delta::Delta;
use crate::error::Error;
use crate::hash::config::{DeltaOptions, SignatureOptions};
use crate::hash::strong::SigType;
use crate::signature::{Signature, SignatureBuilder, read_signature, write_signature};
use crate::wire::decoder::{BaseSource, SeekBase, patch};

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `signature_file()`.
#[derive(Debug, Clone)]
pub struct SignatureStats {
    pub sig_type: SigType,
    pub block_len: u32,
    pub strong_len: u32,
    /// Base object size in bytes.
    pub base_size: u64,
    pub blocks: usize,
    /// Encoded signature size in bytes.
    pub signature_size: u64,
    /// SHA-256 of the base object (if `file-io` feature is enabled).
    pub base_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `delta_file()`.
#[derive(Debug, Clone)]
pub struct DeltaFileStats {
    /// Blocks in the signature the delta was computed against.
    pub signature_blocks: usize,
    /// New object size in bytes.
    pub new_size: u64,
    /// Delta output size in bytes.
    pub delta_size: u64,
    pub copy_commands: u64,
    pub literal_commands: u64,
    pub copy_bytes: u64,
    pub literal_bytes: u64,
    /// SHA-256 of the new object (if `file-io` feature is enabled).
    pub new_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `patch_file()`.
#[derive(Debug, Clone)]
pub struct PatchFileStats {
    /// Base object size in bytes, when known.
    pub base_size: Option<u64>,
    /// Delta size in bytes.
    pub delta_size: u64,
    /// Reconstructed output size in bytes.
    pub output_size: u64,
    pub copy_commands: u64,
    pub literal_commands: u64,
    /// SHA-256 of the reconstructed output (if `file-io` feature is enabled).
    pub output_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// Compute the signature of everything `input` yields and write it to
/// `output`.
pub fn signature_stream<R: Read, W: Write>(
    input: R,
    output: W,
    opts: SignatureOptions,
) -> Result<SignatureStats, Error> {
    let mut builder = SignatureBuilder::new(opts)?;
    let mut input = Hashing::new(input);
    builder.digest_reader(&mut input)?;
    let sig = builder.end()?;

    let mut output = Hashing::new(output);
    write_signature(&sig, &mut output)?;
    output.flush()?;

    let (_, base_size, base_sha256) = input.finish();
    let (_, signature_size, _) = output.finish();
    Ok(SignatureStats {
        sig_type: sig.sig_type(),
        block_len: sig.block_len(),
        strong_len: sig.strong_len(),
        base_size,
        blocks: sig.block_count(),
        signature_size,
        base_sha256,
    })
}

/// Compute the signature of `base_path`, writing it to `sig_path`.
pub fn signature_file(
    base_path: &Path,
    sig_path: &Path,
    opts: SignatureOptions,
) -> Result<SignatureStats, Error> {
    let input = BufReader::with_capacity(BUF_SIZE, File::open(base_path)?);
    let output = BufWriter::with_capacity(BUF_SIZE, File::create(sig_path)?);
    signature_stream(input, output, opts)
}

/// Load an encoded signature from `path`.
pub fn read_signature_file(path: &Path) -> Result<Signature, Error> {
    let file = File::open(path)?;
    Ok(read_signature(BufReader::with_capacity(BUF_SIZE, file))?)
}

// ---------------------------------------------------------------------------
// Delta
// ---------------------------------------------------------------------------

/// Delta of everything `input` yields against `sig`, written to `output`.
pub fn delta_stream<R: Read, W: Write>(
    sig: &Signature,
    input: R,
    output: W,
    opts: DeltaOptions,
) -> Result<DeltaFileStats, Error> {
    let mut session = Delta::new(sig, opts)?;
    let mut input = Hashing::new(input);
    let mut output = Hashing::new(output);
    session.digest_reader(&mut input, &mut output)?;
    output.write_all(&session.end()?)?;
    output.flush()?;

    let stats = session.stats();
    let (_, new_size, new_sha256) = input.finish();
    let (_, delta_size, _) = output.finish();
    Ok(DeltaFileStats {
        signature_blocks: sig.block_count(),
        new_size,
        delta_size,
        copy_commands: stats.copy_commands,
        literal_commands: stats.literal_commands,
        copy_bytes: stats.copy_bytes,
        literal_bytes: stats.literal_bytes,
        new_sha256,
    })
}

/// Delta of `new_path` against the signature in `sig_path`, written to
/// `delta_path`.
pub fn delta_file(
    sig_path: &Path,
    new_path: &Path,
    delta_path: &Path,
    opts: DeltaOptions,
) -> Result<DeltaFileStats, Error> {
    let sig = read_signature_file(sig_path)?;
    let input = BufReader::with_capacity(BUF_SIZE, File::open(new_path)?);
    let output = BufWriter::with_capacity(BUF_SIZE, File::create(delta_path)?);
    delta_stream(&sig, input, output, opts)
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// Apply the delta read from `delta` to `base`, writing the new object to
/// `output`.
pub fn patch_stream<B, R, W>(base: &mut B, delta: R, output: W) -> Result<PatchFileStats, Error>
where
    B: BaseSource + ?Sized,
    R: Read,
    W: Write,
{
    let mut output = Hashing::new(output);
    let stats = patch(base, delta, &mut output)?;
    output.flush()?;
    let (_, output_size, output_sha256) = output.finish();
    Ok(PatchFileStats {
        base_size: base.base_len(),
        delta_size: stats.delta_bytes,
        output_size,
        copy_commands: stats.copy_commands,
        literal_commands: stats.literal_commands,
        output_sha256,
    })
}

/// Apply the delta in `delta_path` to `base_path`, writing `out_path`.
///
/// The base is read through seeks, never loaded whole.  The delta is
/// streamed through a `BufReader`.
pub fn patch_file(
    base_path: &Path,
    delta_path: &Path,
    out_path: &Path,
) -> Result<PatchFileStats, Error> {
    let mut base = SeekBase::new(BufReader::with_capacity(BUF_SIZE, File::open(base_path)?))?;
    let delta = BufReader::with_capacity(BUF_SIZE, File::open(delta_path)?);
    let output = BufWriter::with_capacity(BUF_SIZE, File::create(out_path)?);
    patch_stream(&mut base, delta, output)
}

// ---------------------------------------------------------------------------
// Counting / hashing adaptor
// ---------------------------------------------------------------------------

/// Pass-through `Read`/`Write` that counts bytes and, with `file-io`,
/// hashes them.
struct Hashing<T> {
    inner: T,
    count: u64,
    #[cfg(feature = "file-io")]
    hasher: sha2::Sha256,
}

impl<T> Hashing<T> {
    fn new(inner: T) -> Self {
        Self {
            inner,
            count: 0,
            #[cfg(feature = "file-io")]
            hasher: sha2::Sha256::new(),
        }
    }

    fn observe(&mut self, bytes: &[u8]) {
        self.count += bytes.len() as u64;
        #[cfg(feature = "file-io")]
        self.hasher.update(bytes);
    }

    fn finish(self) -> (T, u64, Option<[u8; 32]>) {
        #[cfg(feature = "file-io")]
        let digest = Some(self.hasher.finalize().into());
        #[cfg(not(feature = "file-io"))]
        let digest: Option<[u8; 32]> = None;
        (self.inner, self.count, digest)
    }
}

impl<R: Read> Read for Hashing<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.observe(&buf[..n]);
        Ok(n)
    }
}

impl<W: Write> Write for Hashing<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.observe(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Lower-case hex, for printing digests.
pub fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
