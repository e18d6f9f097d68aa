use std::io::Cursor;

use rsdelta::delta::{Delta, delta};
use rsdelta::error::PatchError;
use rsdelta::hash::config::{DeltaOptions, SignatureOptions};
use rsdelta::hash::strong::SigType;
use rsdelta::signature::{Signature, signature};
use rsdelta::wire::{CommandIterator, CommandRef, SeekBase, apply, patch};

fn sample(len: usize, seed: u32) -> Vec<u8> {
    let mut x = seed ^ 0xA5A5_A5A5;
    (0..len)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            x as u8
        })
        .collect()
}

fn sig_of(base: &[u8], opts: SignatureOptions) -> Signature {
    // Go through the wire format, as a real peer would.
    let sig = signature(base, opts).unwrap();
    Signature::deserialize(&sig.serialize()).unwrap()
}

fn delta_chunked(sig: &Signature, new: &[u8], chunk: usize, opts: DeltaOptions) -> Vec<u8> {
    let mut d = Delta::new(sig, opts).unwrap();
    let mut out = Vec::new();
    for c in new.chunks(chunk.max(1)) {
        d.digest_into(c, &mut out).unwrap();
    }
    d.end_into(&mut out).unwrap();
    out
}

fn edits(base: &[u8]) -> Vec<(&'static str, Vec<u8>)> {
    let mut v = Vec::new();
    v.push(("identity", base.to_vec()));
    v.push(("empty", Vec::new()));

    let mut x = base.to_vec();
    x.splice(1000..1000, b"inserted text".iter().copied());
    v.push(("insert", x));

    let mut x = base.to_vec();
    x.drain(5000..5300);
    v.push(("delete", x));

    let mut x = base.to_vec();
    for i in (0..x.len()).step_by(997) {
        x[i] = x[i].wrapping_add(1);
    }
    v.push(("scattered", x));

    let mut x = base[base.len() / 2..].to_vec();
    x.extend_from_slice(&base[..base.len() / 2]);
    v.push(("rotate", x));

    let mut x = base.to_vec();
    x.extend_from_slice(base);
    v.push(("doubled", x));

    v.push(("unrelated", sample(base.len() / 3, 99)));
    v.push(("prefix", base[..base.len() - 77].to_vec()));
    v.push(("suffix", base[123..].to_vec()));
    v
}

#[test]
fn round_trip_across_edits_and_chunkings() {
    let base = sample(20_000, 1);
    for opts in [
        SignatureOptions::new(SigType::Md4, 256),
        SignatureOptions {
            strong_len: 8,
            ..SignatureOptions::new(SigType::Blake2, 700)
        },
    ] {
        let sig = sig_of(&base, opts);
        for (name, new) in edits(&base) {
            let whole = delta_chunked(&sig, &new, new.len(), DeltaOptions::default());
            assert_eq!(apply(&base, &whole).unwrap(), new, "{name}");
            for chunk in [1, 13, 255, 256, 257, 4096] {
                let d = delta_chunked(&sig, &new, chunk, DeltaOptions::default());
                assert_eq!(d, whole, "{name} chunk={chunk}");
            }
        }
    }
}

#[test]
fn identity_produces_only_copies() {
    for len in [1usize, 100, 2048, 2049, 10_000] {
        let base = sample(len, 2);
        let sig = sig_of(&base, SignatureOptions::new(SigType::Md4, 64));
        let d = delta_chunked(&sig, &base, 333, DeltaOptions::default());
        let mut covered = 0u64;
        for cmd in CommandIterator::new(&d).unwrap() {
            match cmd.unwrap() {
                CommandRef::Copy { len, .. } => covered += len,
                CommandRef::Literal(_) => panic!("literal in identity delta, len={len}"),
            }
        }
        assert_eq!(covered, len as u64);
    }
}

#[test]
fn small_literal_buffer_only_changes_granularity() {
    let base = sample(8000, 3);
    let mut new = sample(3000, 4);
    new.extend_from_slice(&base[1000..6000]);
    let sig = sig_of(&base, SignatureOptions::new(SigType::Blake2, 128));

    let big = delta_chunked(&sig, &new, 500, DeltaOptions { literal_buf_size: 1 << 20 });
    let small = delta_chunked(&sig, &new, 500, DeltaOptions { literal_buf_size: 100 });
    assert_eq!(apply(&base, &big).unwrap(), new);
    assert_eq!(apply(&base, &small).unwrap(), new);

    let literals = |d: &[u8]| {
        CommandIterator::new(d)
            .unwrap()
            .filter(|c| matches!(c, Ok(CommandRef::Literal(_))))
            .count()
    };
    assert!(literals(&small) > literals(&big));
    for cmd in CommandIterator::new(&small).unwrap() {
        if let CommandRef::Literal(bytes) = cmd.unwrap() {
            assert!(bytes.len() <= 100);
        }
    }
}

#[test]
fn streaming_patch_matches_in_memory_apply() {
    let base = sample(50_000, 5);
    let sig = sig_of(&base, SignatureOptions::default());
    let mut new = base[10_000..].to_vec();
    new.extend_from_slice(&sample(5000, 6));

    let mut d = Vec::new();
    let stats = delta(&sig, &new[..], &mut d, DeltaOptions::default()).unwrap();
    assert_eq!(stats.bytes_in, new.len() as u64);

    let mut out = Vec::new();
    let mut seek = SeekBase::new(Cursor::new(base.clone())).unwrap();
    let p = patch(&mut seek, Cursor::new(&d), &mut out).unwrap();
    assert_eq!(out, new);
    assert_eq!(p.output_bytes, new.len() as u64);
    assert_eq!(p.delta_bytes, d.len() as u64);
    assert_eq!(apply(&base, &d).unwrap(), new);
}

#[test]
fn empty_signature_gives_literal_only_delta() {
    let sig = sig_of(b"", SignatureOptions::default());
    let new = sample(40_000, 7);
    let d = delta_chunked(&sig, &new, 1000, DeltaOptions::default());
    assert!(
        CommandIterator::new(&d)
            .unwrap()
            .all(|c| matches!(c, Ok(CommandRef::Literal(_))))
    );
    assert_eq!(apply(b"", &d).unwrap(), new);
}

#[test]
fn corrupted_deltas_are_rejected() {
    let base = sample(4096, 8);
    let sig = sig_of(&base, SignatureOptions::new(SigType::Md4, 512));
    let mut new = base.clone();
    new[2000] ^= 1;
    let d = delta_chunked(&sig, &new, 4096, DeltaOptions::default());

    for cut in 0..d.len() {
        assert!(apply(&base, &d[..cut]).is_err(), "cut={cut}");
    }
    let mut extra = d.clone();
    extra.push(0);
    assert!(matches!(
        apply(&base, &extra),
        Err(PatchError::TrailingData { .. })
    ));
    // Against a shorter base, copies point past its end.
    assert!(matches!(
        apply(&base[..1000], &d),
        Err(PatchError::CopyOutOfRange { .. })
    ));
}
