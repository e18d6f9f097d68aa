#![no_main]
use libfuzzer_sys::fuzz_target;
use rsdelta::signature::signature;
use rsdelta::wire::apply;
use rsdelta::{Delta, DeltaOptions, SigType, SignatureOptions};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    // Control bytes: hash variant, block length, chunk size.
    let sig_type = if data[0] & 1 == 0 {
        SigType::Blake2
    } else {
        SigType::Md4
    };
    let block_len = 1 + (data[1] as u32 % 64);
    let chunk = 1 + data[2] as usize;
    let payload = &data[3..];

    // Split payload into "base" and "new".
    let split = payload.len() / 2;
    let (base, new) = payload.split_at(split);

    let sig = signature(base, SignatureOptions::new(sig_type, block_len)).unwrap();
    let reparsed = rsdelta::Signature::deserialize(&sig.serialize()).unwrap();

    let opts = DeltaOptions {
        literal_buf_size: 1 + (data[2] as usize % 32),
    };
    let mut session = Delta::new(&reparsed, opts).unwrap();
    let mut delta = Vec::new();
    for c in new.chunks(chunk) {
        session.digest_into(c, &mut delta).unwrap();
    }
    session.end_into(&mut delta).unwrap();

    let out = apply(base, &delta).unwrap();
    assert_eq!(out, new);
});
