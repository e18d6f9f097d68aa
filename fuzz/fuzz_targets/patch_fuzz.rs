#![no_main]
use libfuzzer_sys::fuzz_target;
use rsdelta::wire::{CommandIterator, apply};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks how much of the payload is base.
    let split = (data[0] as usize).min(data.len() - 1);
    let (base, delta) = data[1..].split_at(split);

    // Arbitrary deltas must fail cleanly, never panic or over-allocate.
    let applied = apply(base, delta);
    let mut streamed = Vec::new();
    let mut src = base;
    let patched = rsdelta::wire::patch(&mut src, delta, &mut streamed);
    match (applied, patched) {
        (Ok(a), Ok(stats)) => {
            assert_eq!(a, streamed);
            assert_eq!(stats.output_bytes, a.len() as u64);
        }
        (Err(_), Err(_)) => {}
        (a, p) => panic!("apply and patch disagree: {a:?} vs {p:?}"),
    }

    if let Ok(iter) = CommandIterator::new(delta) {
        for cmd in iter {
            if cmd.is_err() {
                break;
            }
        }
    }
});
