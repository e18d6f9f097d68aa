// Command-line front end for rsdelta.
//
// rdiff-style workflow as explicit subcommands:
//   signature BASE [SIG]        -> signature of BASE
//   delta SIG NEW [DELTA]       -> delta of NEW against SIG
//   patch BASE DELTA [OUT]      -> NEW rebuilt from BASE + DELTA
// plus `inspect-signature` / `inspect-delta` for looking at the formats.
//
// `-` reads stdin wherever a streamed input is accepted; a missing output
// path writes to stdout.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use log::info;

use crate::hash::config::{
    DEFAULT_BLOCK_LEN, DEFAULT_LITERAL_BUF_SIZE, DeltaOptions, SignatureOptions,
};
use crate::hash::strong::SigType;
use crate::io::{delta_stream, hex, patch_stream, signature_stream};
use crate::signature::{Signature, read_signature, signature};
use crate::wire::decoder::{CommandIterator, SeekBase};
use crate::wire::opcode::CommandRef;

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Byte size parsing (supports K, M, G suffixes)
// ---------------------------------------------------------------------------

fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".into());
    }
    let (num_part, multiplier) = match s.as_bytes().last() {
        Some(b'k' | b'K') => (&s[..s.len() - 1], 1024u64),
        Some(b'm' | b'M') => (&s[..s.len() - 1], 1024 * 1024),
        Some(b'g' | b'G') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        _ => (s, 1u64),
    };
    let num: u64 = num_part
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{s}': {e}"))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size overflow: '{s}'"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// librsync-compatible signature, delta and patch tool.
#[derive(Parser, Debug)]
#[command(
    name = "rsdelta",
    version,
    about = "rsync-style signatures, deltas and patches",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (errors only).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (repeat for debug and trace logging).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Compute the signature of a base file.
    Signature(SignatureArgs),
    /// Compute a delta from a signature and a new file.
    Delta(DeltaArgs),
    /// Rebuild a new file from its base and a delta.
    Patch(PatchArgs),
    /// Describe a signature file.
    InspectSignature(InspectArgs),
    /// List the commands of a delta file.
    InspectDelta(InspectArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum HashArg {
    Blake2,
    Md4,
}

impl From<HashArg> for SigType {
    fn from(h: HashArg) -> Self {
        match h {
            HashArg::Blake2 => SigType::Blake2,
            HashArg::Md4 => SigType::Md4,
        }
    }
}

#[derive(Args, Debug)]
struct SignatureTuningArgs {
    /// Strong checksum algorithm.
    #[arg(long, value_enum, default_value_t = HashArg::Blake2)]
    hash: HashArg,

    /// Block size (supports K/M/G suffix).
    #[arg(long = "block-size", short = 'b', value_parser = parse_byte_size, default_value_t = DEFAULT_BLOCK_LEN as u64)]
    block_size: u64,

    /// Strong checksum bytes kept per block (default: full hash).
    #[arg(long = "sum-size", short = 'S')]
    sum_size: Option<u32>,
}

#[derive(Args, Debug)]
struct SignatureArgs {
    #[command(flatten)]
    tuning: SignatureTuningArgs,

    /// Base file (`-` for stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    base: PathBuf,

    /// Signature output (default: stdout).
    #[arg(value_hint = ValueHint::FilePath)]
    signature: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DeltaArgs {
    /// Literal buffer size (supports K/M/G suffix).
    #[arg(long = "literal-buffer-size", value_parser = parse_byte_size, default_value_t = DEFAULT_LITERAL_BUF_SIZE as u64)]
    literal_buffer_size: u64,

    /// Treat the first argument as the base file and compute its
    /// signature on the fly.
    #[arg(long = "from-base")]
    from_base: bool,

    /// Signature options for `--from-base`.
    #[command(flatten)]
    tuning: SignatureTuningArgs,

    /// Signature file (`-` for stdin), or base file with `--from-base`.
    #[arg(value_hint = ValueHint::FilePath)]
    signature: PathBuf,

    /// New file (`-` for stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    new: PathBuf,

    /// Delta output (default: stdout).
    #[arg(value_hint = ValueHint::FilePath)]
    delta: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PatchArgs {
    /// Base file (must be seekable).
    #[arg(value_hint = ValueHint::FilePath)]
    base: PathBuf,

    /// Delta file (`-` for stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    delta: PathBuf,

    /// Output file (default: stdout).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// File to inspect (`-` for stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

// ---------------------------------------------------------------------------
// Resolved options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Signature,
    Delta,
    Patch,
    InspectSignature,
    InspectDelta,
}

#[derive(Debug)]
struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    sig_opts: SignatureOptions,
    delta_opts: DeltaOptions,
    from_base: bool,
    /// First input: base (signature, patch), signature (delta), or the
    /// inspected file.
    input_file: PathBuf,
    /// Second input: new file (delta) or delta file (patch).
    second_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

fn sig_options(t: &SignatureTuningArgs) -> Result<SignatureOptions, String> {
    let sig_type = SigType::from(t.hash);
    let block_len =
        u32::try_from(t.block_size).map_err(|_| format!("block size too large: {}", t.block_size))?;
    let opts = SignatureOptions {
        strong_len: t.sum_size.unwrap_or(sig_type.native_len() as u32),
        ..SignatureOptions::new(sig_type, block_len)
    };
    opts.validate().map_err(|e| e.to_string())?;
    Ok(opts)
}

fn resolve_options(cli: Cli) -> Result<Options, String> {
    let mut opts = Options {
        command: Command::Signature,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose,
        json_output: cli.json_output,
        sig_opts: SignatureOptions::default(),
        delta_opts: DeltaOptions::default(),
        from_base: false,
        input_file: PathBuf::new(),
        second_file: None,
        output_file: None,
    };
    match cli.command {
        Cmd::Signature(args) => {
            opts.sig_opts = sig_options(&args.tuning)?;
            opts.input_file = args.base;
            opts.output_file = args.signature;
        }
        Cmd::Delta(args) => {
            opts.command = Command::Delta;
            opts.sig_opts = sig_options(&args.tuning)?;
            opts.delta_opts = DeltaOptions {
                literal_buf_size: usize::try_from(args.literal_buffer_size)
                    .map_err(|_| format!("literal buffer too large: {}", args.literal_buffer_size))?,
            };
            opts.delta_opts.validate().map_err(|e| e.to_string())?;
            opts.from_base = args.from_base;
            opts.input_file = args.signature;
            opts.second_file = Some(args.new);
            opts.output_file = args.delta;
        }
        Cmd::Patch(args) => {
            opts.command = Command::Patch;
            opts.input_file = args.base;
            opts.second_file = Some(args.delta);
            opts.output_file = args.output;
        }
        Cmd::InspectSignature(args) => {
            opts.command = Command::InspectSignature;
            opts.input_file = args.input;
        }
        Cmd::InspectDelta(args) => {
            opts.command = Command::InspectDelta;
            opts.input_file = args.input;
        }
    }
    Ok(opts)
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("rsdelta".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

fn log_filter(opts: &Options) -> &'static str {
    if opts.quiet {
        return "error";
    }
    match opts.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

// ---------------------------------------------------------------------------
// Input / output plumbing
// ---------------------------------------------------------------------------

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn open_input(path: &Path, what: &str) -> Result<Box<dyn Read>, String> {
    if is_stdio(path) {
        return Ok(Box::new(BufReader::with_capacity(BUF_SIZE, io::stdin().lock())));
    }
    File::open(path)
        .map(|f| Box::new(BufReader::with_capacity(BUF_SIZE, f)) as Box<dyn Read>)
        .map_err(|e| format!("{what}: {}: {e}", path.display()))
}

fn open_output(path: Option<&Path>, force: bool) -> Result<Box<dyn Write>, String> {
    match path {
        None => Ok(Box::new(BufWriter::with_capacity(BUF_SIZE, io::stdout().lock()))),
        Some(p) if is_stdio(p) => Ok(Box::new(BufWriter::with_capacity(
            BUF_SIZE,
            io::stdout().lock(),
        ))),
        Some(p) => {
            if p.exists() && !force {
                return Err(format!(
                    "output file exists, use -f to overwrite: {}",
                    p.display()
                ));
            }
            File::create(p)
                .map(|f| Box::new(BufWriter::with_capacity(BUF_SIZE, f)) as Box<dyn Write>)
                .map_err(|e| format!("output file: {}: {e}", p.display()))
        }
    }
}

fn load_signature(path: &Path) -> Result<Signature, String> {
    let input = open_input(path, "signature file")?;
    read_signature(input).map_err(|e| format!("signature file: {}: {e}", path.display()))
}

fn emit_json(value: serde_json::Value) {
    eprintln!("{value:#}");
}

fn fail(msg: impl std::fmt::Display) -> i32 {
    eprintln!("rsdelta: {msg}");
    1
}

// ---------------------------------------------------------------------------
// Signature command
// ---------------------------------------------------------------------------

fn cmd_signature(opts: &Options) -> i32 {
    let input = match open_input(&opts.input_file, "base file") {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    let output = match open_output(opts.output_file.as_deref(), opts.force) {
        Ok(w) => w,
        Err(e) => return fail(e),
    };
    let stats = match signature_stream(input, output, opts.sig_opts) {
        Ok(s) => s,
        Err(e) => return fail(format!("signature error: {e}")),
    };

    info!(
        "signature: base size: {}, blocks: {}, signature size: {}",
        stats.base_size, stats.blocks, stats.signature_size
    );
    if opts.json_output {
        emit_json(serde_json::json!({
            "command": "signature",
            "hash": stats.sig_type.name(),
            "block_len": stats.block_len,
            "strong_len": stats.strong_len,
            "base_size": stats.base_size,
            "blocks": stats.blocks,
            "signature_size": stats.signature_size,
            "base_sha256": stats.base_sha256.map(|h| hex(&h)),
        }));
    }
    0
}

// ---------------------------------------------------------------------------
// Delta command
// ---------------------------------------------------------------------------

fn cmd_delta(opts: &Options) -> i32 {
    let sig = if opts.from_base {
        let base = match open_input(&opts.input_file, "base file") {
            Ok(r) => r,
            Err(e) => return fail(e),
        };
        match signature(base, opts.sig_opts) {
            Ok(s) => s,
            Err(e) => return fail(format!("signature error: {e}")),
        }
    } else {
        match load_signature(&opts.input_file) {
            Ok(s) => s,
            Err(e) => return fail(e),
        }
    };

    let new_path = opts.second_file.as_deref().unwrap_or(Path::new("-"));
    if is_stdio(new_path) && is_stdio(&opts.input_file) {
        return fail("signature and new file cannot both be stdin");
    }
    let input = match open_input(new_path, "new file") {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    let output = match open_output(opts.output_file.as_deref(), opts.force) {
        Ok(w) => w,
        Err(e) => return fail(e),
    };
    let stats = match delta_stream(&sig, input, output, opts.delta_opts) {
        Ok(s) => s,
        Err(e) => return fail(format!("delta error: {e}")),
    };

    info!(
        "delta: new size: {}, delta size: {}, copies: {} ({} bytes), literals: {} ({} bytes)",
        stats.new_size,
        stats.delta_size,
        stats.copy_commands,
        stats.copy_bytes,
        stats.literal_commands,
        stats.literal_bytes
    );
    if opts.json_output {
        emit_json(serde_json::json!({
            "command": "delta",
            "signature_blocks": stats.signature_blocks,
            "new_size": stats.new_size,
            "delta_size": stats.delta_size,
            "copy_commands": stats.copy_commands,
            "copy_bytes": stats.copy_bytes,
            "literal_commands": stats.literal_commands,
            "literal_bytes": stats.literal_bytes,
            "new_sha256": stats.new_sha256.map(|h| hex(&h)),
        }));
    }
    0
}

// ---------------------------------------------------------------------------
// Patch command
// ---------------------------------------------------------------------------

fn cmd_patch(opts: &Options) -> i32 {
    if is_stdio(&opts.input_file) {
        return fail("base file must be seekable, not stdin");
    }
    let base_file = match File::open(&opts.input_file) {
        Ok(f) => f,
        Err(e) => return fail(format!("base file: {}: {e}", opts.input_file.display())),
    };
    let mut base = match SeekBase::new(BufReader::with_capacity(BUF_SIZE, base_file)) {
        Ok(b) => b,
        Err(e) => return fail(format!("base file: {}: {e}", opts.input_file.display())),
    };
    let delta_path = opts.second_file.as_deref().unwrap_or(Path::new("-"));
    let delta = match open_input(delta_path, "delta file") {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    let output = match open_output(opts.output_file.as_deref(), opts.force) {
        Ok(w) => w,
        Err(e) => return fail(e),
    };
    let stats = match patch_stream(&mut base, delta, output) {
        Ok(s) => s,
        Err(e) => return fail(format!("patch error: {e}")),
    };

    info!(
        "patch: delta size: {}, output size: {}",
        stats.delta_size, stats.output_size
    );
    if opts.json_output {
        emit_json(serde_json::json!({
            "command": "patch",
            "base_size": stats.base_size,
            "delta_size": stats.delta_size,
            "output_size": stats.output_size,
            "copy_commands": stats.copy_commands,
            "literal_commands": stats.literal_commands,
            "output_sha256": stats.output_sha256.map(|h| hex(&h)),
        }));
    }
    0
}

// ---------------------------------------------------------------------------
// Inspect commands
// ---------------------------------------------------------------------------

fn cmd_inspect_signature(opts: &Options) -> i32 {
    let sig = match load_signature(&opts.input_file) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    if opts.json_output {
        emit_json(serde_json::json!({
            "command": "inspect-signature",
            "hash": sig.sig_type().name(),
            "magic": format!("{:#010x}", sig.sig_type().magic()),
            "block_len": sig.block_len(),
            "strong_len": sig.strong_len(),
            "blocks": sig.block_count(),
            "distinct_weak_sums": sig.weak_index().len(),
        }));
        return 0;
    }

    let mut out = io::stdout().lock();
    let res = (|| -> io::Result<()> {
        writeln!(out, "signature type:   {}", sig.sig_type())?;
        writeln!(out, "block length:     {}", sig.block_len())?;
        writeln!(out, "strong length:    {}", sig.strong_len())?;
        writeln!(out, "blocks:           {}", sig.block_count())?;
        writeln!(out, "distinct weak:    {}", sig.weak_index().len())?;
        writeln!(out, "largest bucket:   {}", sig.weak_index().max_bucket_len())?;
        if opts.verbose > 0 {
            writeln!(out, "  index       offset  weak      strong")?;
            for b in sig.blocks() {
                writeln!(
                    out,
                    "  {:<8} {:>10}  {:08x}  {}",
                    b.index,
                    sig.block_offset(b.index as usize),
                    b.weak,
                    hex(b.strong)
                )?;
            }
        }
        out.flush()
    })();
    match res {
        Ok(()) => 0,
        Err(e) => fail(format!("write error: {e}")),
    }
}

fn cmd_inspect_delta(opts: &Options) -> i32 {
    let mut data = Vec::new();
    let read = open_input(&opts.input_file, "delta file").and_then(|mut r| {
        r.read_to_end(&mut data)
            .map_err(|e| format!("delta file: {}: {e}", opts.input_file.display()))
    });
    if let Err(e) = read {
        return fail(e);
    }
    let iter = match CommandIterator::new(&data) {
        Ok(it) => it,
        Err(e) => return fail(format!("delta error: {e}")),
    };

    let mut out = io::stdout().lock();
    let (mut copies, mut literals, mut copy_bytes, mut literal_bytes) = (0u64, 0u64, 0u64, 0u64);
    let mut position = 0u64;
    for cmd in iter {
        let cmd = match cmd {
            Ok(c) => c,
            Err(e) => return fail(format!("delta error: {e}")),
        };
        let line = match cmd {
            CommandRef::Copy { offset, len } => {
                copies += 1;
                copy_bytes += len;
                format!("{position:>12}  COPY     base={offset} len={len}")
            }
            CommandRef::Literal(bytes) => {
                literals += 1;
                literal_bytes += bytes.len() as u64;
                format!("{position:>12}  LITERAL  len={}", bytes.len())
            }
        };
        position += cmd.output_len();
        if !opts.json_output {
            if let Err(e) = writeln!(out, "{line}") {
                return fail(format!("write error: {e}"));
            }
        }
    }

    if opts.json_output {
        emit_json(serde_json::json!({
            "command": "inspect-delta",
            "delta_size": data.len(),
            "output_size": position,
            "copy_commands": copies,
            "copy_bytes": copy_bytes,
            "literal_commands": literals,
            "literal_bytes": literal_bytes,
        }));
    } else if !opts.quiet {
        let _ = writeln!(
            out,
            "total: {copies} copies ({copy_bytes} bytes), {literals} literals \
             ({literal_bytes} bytes), output {position} bytes"
        );
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = match resolve_options(cli) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("rsdelta: {e}");
            process::exit(1);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(&opts)))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let exit_code = match opts.command {
        Command::Signature => cmd_signature(&opts),
        Command::Delta => cmd_delta(&opts),
        Command::Patch => cmd_patch(&opts),
        Command::InspectSignature => cmd_inspect_signature(&opts),
        Command::InspectDelta => cmd_inspect_delta(&opts),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn try_parse(args: &[&str]) -> Result<Options, String> {
        let argv: Vec<String> = std::iter::once("rsdelta".to_string())
            .chain(args.iter().map(|s| s.to_string()))
            .collect();
        let cli = Cli::try_parse_from(argv).map_err(|e| e.to_string())?;
        resolve_options(cli)
    }

    fn parse_opts(args: &[&str]) -> Options {
        try_parse(args).expect("cli parse failed")
    }

    #[test]
    fn parse_byte_size_suffixes() {
        assert_eq!(parse_byte_size("1").unwrap(), 1);
        assert_eq!(parse_byte_size("2K").unwrap(), 2 * 1024);
        assert_eq!(parse_byte_size("3m").unwrap(), 3 * 1024 * 1024);
        assert_eq!(parse_byte_size("4G").unwrap(), 4 * 1024 * 1024 * 1024);
        assert!(parse_byte_size("").is_err());
        assert!(parse_byte_size("12x").is_err());
    }

    #[test]
    fn signature_defaults() {
        let opts = parse_opts(&["signature", "base.bin"]);
        assert_eq!(opts.command, Command::Signature);
        assert_eq!(opts.sig_opts, SignatureOptions::default());
        assert_eq!(opts.input_file, PathBuf::from("base.bin"));
        assert!(opts.output_file.is_none());
    }

    #[test]
    fn signature_tuning_maps() {
        let opts = parse_opts(&[
            "signature",
            "--hash",
            "md4",
            "--block-size",
            "4K",
            "--sum-size",
            "8",
            "base.bin",
            "base.sig",
        ]);
        assert_eq!(opts.sig_opts.sig_type, SigType::Md4);
        assert_eq!(opts.sig_opts.block_len, 4096);
        assert_eq!(opts.sig_opts.strong_len, 8);
        assert_eq!(opts.output_file, Some(PathBuf::from("base.sig")));
    }

    #[test]
    fn invalid_sum_size_rejected() {
        assert!(try_parse(&["signature", "--hash", "md4", "--sum-size", "17", "b"]).is_err());
        assert!(try_parse(&["signature", "--sum-size", "0", "b"]).is_err());
        assert!(try_parse(&["signature", "--block-size", "0", "b"]).is_err());
        assert!(try_parse(&["signature", "--sum-size", "32", "b"]).is_ok());
    }

    #[test]
    fn delta_subcommand_maps() {
        let opts = parse_opts(&[
            "--force",
            "delta",
            "--literal-buffer-size",
            "1M",
            "base.sig",
            "new.bin",
            "new.delta",
        ]);
        assert_eq!(opts.command, Command::Delta);
        assert!(opts.force);
        assert!(!opts.from_base);
        assert_eq!(opts.delta_opts.literal_buf_size, 1024 * 1024);
        assert_eq!(opts.input_file, PathBuf::from("base.sig"));
        assert_eq!(opts.second_file, Some(PathBuf::from("new.bin")));
        assert_eq!(opts.output_file, Some(PathBuf::from("new.delta")));

        assert!(try_parse(&["delta", "--literal-buffer-size", "0", "s", "n"]).is_err());
        assert!(parse_opts(&["delta", "--from-base", "b", "n"]).from_base);
    }

    #[test]
    fn patch_subcommand_maps() {
        let opts = parse_opts(&["--json", "patch", "base.bin", "-"]);
        assert_eq!(opts.command, Command::Patch);
        assert!(opts.json_output);
        assert_eq!(opts.second_file, Some(PathBuf::from("-")));
        assert!(opts.output_file.is_none());
    }

    #[test]
    fn inspect_commands_map() {
        assert_eq!(
            parse_opts(&["inspect-signature", "a.sig"]).command,
            Command::InspectSignature
        );
        assert_eq!(
            parse_opts(&["inspect-delta", "a.delta"]).command,
            Command::InspectDelta
        );
    }

    #[test]
    fn verbosity_selects_log_filter() {
        assert_eq!(log_filter(&parse_opts(&["signature", "b"])), "warn");
        assert_eq!(log_filter(&parse_opts(&["-v", "signature", "b"])), "info");
        assert_eq!(log_filter(&parse_opts(&["-vv", "signature", "b"])), "debug");
        assert_eq!(log_filter(&parse_opts(&["-vvvv", "signature", "b"])), "trace");
        assert_eq!(log_filter(&parse_opts(&["-q", "signature", "b"])), "error");
        assert!(try_parse(&["-q", "-v", "signature", "b"]).is_err());
    }

    #[test]
    fn existing_output_needs_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out");
        std::fs::write(&path, b"x").unwrap();
        assert!(open_output(Some(&path), false).is_err());
        assert!(open_output(Some(&path), true).is_ok());
    }

    #[test]
    fn fuzz_hook_tolerates_garbage() {
        fuzz_try_parse_args(&["delta".into(), "--literal-buffer-size".into(), "9G9".into()]);
        fuzz_try_parse_args(&["signature".into(), "--sum-size".into(), "99".into(), "x".into()]);
    }
}
