#![no_main]
use libfuzzer_sys::fuzz_target;
use rsdelta::wire::{CommandIterator, CommandRef};
use rsdelta::{Delta, DeltaOptions, Signature};

fuzz_target!(|data: &[u8]| {
    // First byte splits the input into signature bytes and a new object.
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = (split as usize * 4).min(rest.len());
    let (wire, new) = rest.split_at(split);

    // Anything that parses must serialize back to the same bytes.
    let Ok(sig) = Signature::deserialize(wire) else {
        return;
    };
    assert_eq!(sig.serialize(), wire);
    assert_eq!(sig.serialized_len(), wire.len());
    for block in sig.blocks() {
        assert!(sig.weak_index().contains(block.weak));
    }

    // Header values straight off the wire must still drive a session.
    let mut session = Delta::new(&sig, DeltaOptions::default()).unwrap();
    let mut delta = Vec::new();
    for c in new.chunks(7) {
        session.digest_into(c, &mut delta).unwrap();
    }
    session.end_into(&mut delta).unwrap();

    let mut covered = 0u64;
    for cmd in CommandIterator::new(&delta).unwrap() {
        match cmd.unwrap() {
            CommandRef::Copy { len, .. } => covered += len,
            CommandRef::Literal(bytes) => covered += bytes.len() as u64,
        }
    }
    assert_eq!(covered, new.len() as u64);
});
