// Block matcher: turns a new-object byte stream into COPY / LITERAL
// commands against a base signature.
//
// The matcher keeps a `block_len` window over the unconsumed input and a
// rolling checksum of it.  Each window position is looked up in the weak
// index; weak hits are confirmed with the strong hash.  On a confirmed
// match the window jumps past the matched block, otherwise it slides by
// one byte and the byte that fell out becomes literal data.
//
// States:
//   Filling:  fewer than `block_len` bytes since the last match (or start)
//   Scanning: a full window is present and its rollsum is current
//   Done:     `finish` has run; further input is a `StateError`
//
// Every decision depends only on the bytes seen so far, so the command
// stream does not depend on how input is split across `feed` calls.

use log::{debug, trace};

use crate::error::StateError;
use crate::hash::config::MAX_BLOCK_PREALLOC;
use crate::hash::rolling::Rollsum;
use crate::signature::Signature;
use crate::wire::opcode::Command;

/// Receiver for the matcher's output.
pub trait CommandSink {
    fn literal(&mut self, data: &[u8]);
    fn copy(&mut self, offset: u64, len: u64);
}

impl CommandSink for Vec<Command> {
    fn literal(&mut self, data: &[u8]) {
        self.push(Command::Literal(data.to_vec()));
    }

    fn copy(&mut self, offset: u64, len: u64) {
        self.push(Command::Copy { offset, len });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    Filling,
    Scanning,
    Done,
}

/// Counters collected while matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    pub bytes_in: u64,
    /// Windows confirmed against a base block.
    pub blocks_matched: u64,
    /// Weak-checksum hits that needed a strong hash.
    pub weak_hits: u64,
    /// Weak hits the strong hash rejected.
    pub false_matches: u64,
    /// Literal bytes emitted.
    pub literal_bytes: u64,
    /// Base bytes referenced by emitted copies.
    pub copy_bytes: u64,
}

/// Streaming block matcher bound to one signature.
#[derive(Debug)]
pub struct DeltaMatcher<'s> {
    sig: &'s Signature,
    block_len: usize,
    state: MatchState,
    /// Unconsumed input; the window is `buf[pos..pos + block_len]`.
    buf: Vec<u8>,
    pos: usize,
    sum: Rollsum,
    literal: Vec<u8>,
    literal_buf_size: usize,
    /// Copy held back so an adjacent one can extend it.
    pending: Option<(u64, u64)>,
    /// Block following the last match, tried before the weak index.
    next_block: Option<usize>,
    stats: MatchStats,
}

impl<'s> DeltaMatcher<'s> {
    /// `literal` is reused as the literal buffer; its contents are dropped.
    pub fn new(sig: &'s Signature, literal_buf_size: usize, mut literal: Vec<u8>) -> Self {
        debug_assert!(literal_buf_size > 0);
        literal.clear();
        let block_len = sig.block_len() as usize;
        Self {
            sig,
            block_len,
            state: MatchState::Filling,
            buf: Vec::with_capacity(block_len.saturating_mul(2).min(MAX_BLOCK_PREALLOC)),
            pos: 0,
            sum: Rollsum::new(),
            literal,
            literal_buf_size,
            pending: None,
            next_block: None,
            stats: MatchStats::default(),
        }
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn stats(&self) -> &MatchStats {
        &self.stats
    }

    /// Bytes received but not yet turned into commands.
    pub fn buffered(&self) -> usize {
        self.buf.len() - self.pos + self.literal.len()
    }

    /// Give back the literal buffer allocation.
    pub fn into_literal_buffer(mut self) -> Vec<u8> {
        self.literal.clear();
        self.literal
    }

    /// Consume the next chunk of the new object.
    pub fn feed<S: CommandSink + ?Sized>(
        &mut self,
        data: &[u8],
        sink: &mut S,
    ) -> Result<(), StateError> {
        if self.state == MatchState::Done {
            return Err(StateError::Finished);
        }
        self.stats.bytes_in += data.len() as u64;
        if self.sig.is_empty() {
            // Nothing to match against.
            self.push_literal(data, sink);
            return Ok(());
        }
        self.buf.extend_from_slice(data);
        self.scan(sink);
        self.buf.drain(..self.pos);
        self.pos = 0;
        Ok(())
    }

    /// Flush everything still buffered and enter `Done`.
    pub fn finish<S: CommandSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), StateError> {
        if self.state == MatchState::Done {
            return Err(StateError::Finished);
        }
        let buf = std::mem::take(&mut self.buf);
        let tail = &buf[self.pos..];
        match self.match_tail(tail) {
            Some(split) => {
                let last = self.sig.block_count() - 1;
                self.push_literal(&tail[..split], sink);
                self.emit_copy(
                    self.sig.block_offset(last),
                    (tail.len() - split) as u64,
                    sink,
                );
            }
            None => self.push_literal(tail, sink),
        }
        self.flush_pending(sink);
        self.flush_literal(sink);
        self.pos = 0;
        self.state = MatchState::Done;

        let s = &self.stats;
        debug!(
            "delta: {} bytes in, {} blocks matched, {} copy bytes, {} literal bytes, \
             {} weak hits ({} false)",
            s.bytes_in, s.blocks_matched, s.copy_bytes, s.literal_bytes, s.weak_hits, s.false_matches
        );
        Ok(())
    }

    fn scan<S: CommandSink + ?Sized>(&mut self, sink: &mut S) {
        let bl = self.block_len;
        loop {
            let avail = self.buf.len() - self.pos;
            match self.state {
                MatchState::Filling => {
                    if avail < bl {
                        break;
                    }
                    self.sum = Rollsum::init(&self.buf[self.pos..self.pos + bl]);
                    self.state = MatchState::Scanning;
                }
                MatchState::Scanning => {
                    if avail <= bl {
                        break;
                    }
                    let out = self.buf[self.pos];
                    self.sum.roll(out, self.buf[self.pos + bl]);
                    self.pos += 1;
                    self.next_block = None;
                    self.push_literal(&[out], sink);
                }
                MatchState::Done => break,
            }

            if let Some(block) = self.find_match() {
                self.stats.blocks_matched += 1;
                self.emit_copy(self.sig.block_offset(block), bl as u64, sink);
                self.next_block = Some(block + 1);
                self.pos += bl;
                self.state = MatchState::Filling;
            }
        }
    }

    /// Base block matching the current window, if any.
    fn find_match(&mut self) -> Option<usize> {
        let sig = self.sig;
        let weak = self.sum.value();
        let window = &self.buf[self.pos..self.pos + self.block_len];
        let hash = sig.strong_hash();
        let mut strong = None;

        if let Some(i) = self.next_block.filter(|&i| i < sig.block_count()) {
            if sig.weak_sum(i) == weak {
                self.stats.weak_hits += 1;
                let s = strong.insert(hash.digest(window));
                if s.as_bytes() == sig.strong_sum(i) {
                    return Some(i);
                }
                self.stats.false_matches += 1;
            }
        }

        for &i in sig.weak_index().candidates(weak) {
            let i = i as usize;
            if Some(i) == self.next_block {
                continue;
            }
            self.stats.weak_hits += 1;
            let s = strong.get_or_insert_with(|| hash.digest(window));
            if s.as_bytes() == sig.strong_sum(i) {
                return Some(i);
            }
            self.stats.false_matches += 1;
        }
        None
    }

    /// Longest proper suffix of `tail` equal to the (possibly short) last
    /// base block.  Returns where that suffix starts.
    fn match_tail(&mut self, tail: &[u8]) -> Option<usize> {
        let n = self.sig.block_count();
        if n == 0 || tail.is_empty() {
            return None;
        }
        let last = n - 1;
        let last_weak = self.sig.weak_sum(last);
        let hash = self.sig.strong_hash();

        let max_len = tail.len().min(self.block_len - 1);
        let mut start = tail.len() - max_len;
        let mut sum = Rollsum::init(&tail[start..]);
        while start < tail.len() {
            if sum.value() == last_weak {
                self.stats.weak_hits += 1;
                if hash.digest(&tail[start..]).as_bytes() == self.sig.strong_sum(last) {
                    self.stats.blocks_matched += 1;
                    trace!("tail of {} bytes matches last block", tail.len() - start);
                    return Some(start);
                }
                self.stats.false_matches += 1;
            }
            sum.rollout(tail[start]);
            start += 1;
        }
        None
    }

    fn push_literal<S: CommandSink + ?Sized>(&mut self, mut data: &[u8], sink: &mut S) {
        if data.is_empty() {
            return;
        }
        self.flush_pending(sink);
        while !data.is_empty() {
            let room = self.literal_buf_size - self.literal.len();
            let take = room.min(data.len());
            self.literal.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.literal.len() >= self.literal_buf_size {
                self.flush_literal(sink);
            }
        }
    }

    fn emit_copy<S: CommandSink + ?Sized>(&mut self, offset: u64, len: u64, sink: &mut S) {
        self.flush_literal(sink);
        if let Some((p_off, p_len)) = self.pending.as_mut() {
            if *p_off + *p_len == offset {
                *p_len += len;
                return;
            }
        }
        self.flush_pending(sink);
        self.pending = Some((offset, len));
    }

    fn flush_pending<S: CommandSink + ?Sized>(&mut self, sink: &mut S) {
        if let Some((offset, len)) = self.pending.take() {
            self.stats.copy_bytes += len;
            sink.copy(offset, len);
        }
    }

    fn flush_literal<S: CommandSink + ?Sized>(&mut self, sink: &mut S) {
        if !self.literal.is_empty() {
            self.stats.literal_bytes += self.literal.len() as u64;
            sink.literal(&self.literal);
            self.literal.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::config::SignatureOptions;
    use crate::hash::rolling::weak_checksum;
    use crate::hash::strong::{SigType, StrongHash};
    use crate::signature::SignatureBuilder;

    fn sig_of(base: &[u8], block_len: u32) -> Signature {
        let mut b = SignatureBuilder::new(SignatureOptions::new(SigType::Md4, block_len)).unwrap();
        b.digest(base).unwrap();
        b.end().unwrap()
    }

    fn run(sig: &Signature, new: &[u8], chunk: usize, lit_buf: usize) -> Vec<Command> {
        let mut m = DeltaMatcher::new(sig, lit_buf, Vec::new());
        let mut cmds = Vec::new();
        for c in new.chunks(chunk.max(1)) {
            m.feed(c, &mut cmds).unwrap();
        }
        m.finish(&mut cmds).unwrap();
        cmds
    }

    fn rebuild(base: &[u8], cmds: &[Command]) -> Vec<u8> {
        let mut out = Vec::new();
        for c in cmds {
            match c {
                Command::Copy { offset, len } => {
                    out.extend_from_slice(&base[*offset as usize..(*offset + *len) as usize])
                }
                Command::Literal(d) => out.extend_from_slice(d),
            }
        }
        out
    }

    fn data(len: usize, seed: u32) -> Vec<u8> {
        let mut x = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
        (0..len)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                x as u8
            })
            .collect()
    }

    #[test]
    fn identity_is_one_copy() {
        let base = data(1000, 1);
        let sig = sig_of(&base, 64);
        let cmds = run(&sig, &base, 1000, 1024);
        assert_eq!(cmds, vec![Command::Copy { offset: 0, len: 1000 }]);
    }

    #[test]
    fn identity_with_odd_chunks() {
        let base = data(777, 2);
        let sig = sig_of(&base, 32);
        for chunk in [1, 3, 31, 32, 33, 500] {
            let cmds = run(&sig, &base, chunk, 64);
            assert_eq!(cmds, vec![Command::Copy { offset: 0, len: 777 }], "chunk={chunk}");
        }
    }

    #[test]
    fn buffered_tracks_unconsumed_input() {
        let base = data(64, 9);
        let sig = sig_of(&base, 16);
        let mut m = DeltaMatcher::new(&sig, 1024, Vec::new());
        let mut cmds = Vec::new();
        m.feed(&base[..10], &mut cmds).unwrap();
        assert_eq!(m.buffered(), 10);
        m.feed(&base[10..16], &mut cmds).unwrap();
        // A whole block matched; the copy is pending, nothing is buffered.
        assert_eq!(m.buffered(), 0);
        m.feed(&[0xEE; 20], &mut cmds).unwrap();
        assert_eq!(m.buffered(), 20);
        m.finish(&mut cmds).unwrap();
        assert_eq!(m.buffered(), 0);
        assert_eq!(rebuild(&base, &cmds), [&base[..16], &[0xEE; 20][..]].concat());
    }

    #[test]
    fn huge_block_len_does_not_preallocate() {
        let mut wire = vec![0x72, 0x73, 0x01, 0x36, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 16];
        wire.extend_from_slice(&weak_checksum(b"short").to_be_bytes());
        wire.extend_from_slice(StrongHash::new(SigType::Md4, 16).unwrap().digest(b"short").as_bytes());
        let sig = Signature::deserialize(&wire).unwrap();
        assert_eq!(sig.block_len(), u32::MAX);
        assert_eq!(sig.block_count(), 1);

        let cmds = run(&sig, b"xyzshort", 3, 16);
        assert_eq!(
            cmds,
            vec![
                Command::Literal(b"xyz".to_vec()),
                Command::Copy { offset: 0, len: 5 },
            ]
        );
    }

    #[test]
    fn empty_inputs() {
        let sig = sig_of(b"", 16);
        assert!(sig.is_empty());
        assert!(run(&sig, b"", 4, 16).is_empty());
        assert_eq!(run(&sig, b"abc", 1, 16), vec![Command::Literal(b"abc".to_vec())]);

        let sig = sig_of(b"some base data", 4);
        assert!(run(&sig, b"", 4, 16).is_empty());
    }

    #[test]
    fn insertion_in_middle() {
        let base = data(4096, 3);
        let mut new = base[..2048].to_vec();
        new.extend_from_slice(b"INSERTED");
        new.extend_from_slice(&base[2048..]);
        let sig = sig_of(&base, 128);
        let cmds = run(&sig, &new, 4096, 1 << 16);
        assert_eq!(
            cmds,
            vec![
                Command::Copy { offset: 0, len: 2048 },
                Command::Literal(b"INSERTED".to_vec()),
                Command::Copy { offset: 2048, len: 2048 },
            ]
        );
    }

    #[test]
    fn reordered_blocks() {
        let base = data(256, 4);
        let mut new = base[128..].to_vec();
        new.extend_from_slice(&base[..128]);
        let sig = sig_of(&base, 64);
        let cmds = run(&sig, &new, 50, 1024);
        assert_eq!(
            cmds,
            vec![
                Command::Copy { offset: 128, len: 128 },
                Command::Copy { offset: 0, len: 128 },
            ]
        );
        assert_eq!(rebuild(&base, &cmds), new);
    }

    #[test]
    fn unrelated_input_is_all_literal() {
        let base = data(512, 5);
        let new = data(300, 6);
        let sig = sig_of(&base, 32);
        let cmds = run(&sig, &new, 7, 1 << 16);
        assert_eq!(cmds, vec![Command::Literal(new)]);
    }

    #[test]
    fn literal_buffer_bounds_literal_size() {
        let base = data(64, 7);
        let new = data(1000, 8);
        let sig = sig_of(&base, 16);
        let cmds = run(&sig, &new, 1000, 100);
        assert_eq!(cmds.len(), 10);
        for c in &cmds {
            assert!(matches!(c, Command::Literal(d) if d.len() == 100));
        }
        assert_eq!(rebuild(&base, &cmds), new);
    }

    #[test]
    fn chunking_does_not_change_commands() {
        let base = data(3000, 9);
        let mut new = data(100, 10);
        new.extend_from_slice(&base[500..1700]);
        new.extend_from_slice(&data(37, 11));
        new.extend_from_slice(&base[2900..]);
        new.extend_from_slice(&base[..300]);
        let sig = sig_of(&base, 100);
        let whole = run(&sig, &new, new.len(), 4096);
        for chunk in [1, 2, 99, 100, 101, 1024] {
            assert_eq!(run(&sig, &new, chunk, 4096), whole, "chunk={chunk}");
        }
        assert_eq!(rebuild(&base, &whole), new);
    }

    #[test]
    fn weak_collisions_resolved_by_strong_hash() {
        // [a, b, c] and [a+1, b-2, c+1] share both rollsum halves.
        let base = [10u8, 20, 30, 11, 18, 31];
        let sig = sig_of(&base, 3);
        assert_eq!(sig.weak_sum(0), sig.weak_sum(1));
        assert_eq!(sig.weak_index().candidates(sig.weak_sum(0)), &[0, 1]);

        let cmds = run(&sig, &[11, 18, 31], 3, 16);
        assert_eq!(cmds, vec![Command::Copy { offset: 3, len: 3 }]);
        let cmds = run(&sig, &[10, 20, 30], 3, 16);
        assert_eq!(cmds, vec![Command::Copy { offset: 0, len: 3 }]);
    }

    #[test]
    fn short_last_block_matched_at_finish() {
        let base = data(100, 12);
        let sig = sig_of(&base, 32);
        let mut new = data(10, 13);
        new.extend_from_slice(&base[96..]);
        let cmds = run(&sig, &new, 3, 64);
        assert_eq!(
            cmds,
            vec![
                Command::Literal(new[..10].to_vec()),
                Command::Copy { offset: 96, len: 4 },
            ]
        );
    }

    #[test]
    fn use_after_finish_is_state_error() {
        let sig = sig_of(b"abcdefgh", 4);
        let mut m = DeltaMatcher::new(&sig, 16, Vec::new());
        let mut cmds: Vec<Command> = Vec::new();
        m.feed(b"abcd", &mut cmds).unwrap();
        m.finish(&mut cmds).unwrap();
        assert_eq!(m.state(), MatchState::Done);
        assert_eq!(m.feed(b"x", &mut cmds), Err(StateError::Finished));
        assert_eq!(m.finish(&mut cmds), Err(StateError::Finished));
    }

    #[test]
    fn stats_track_output() {
        let base = data(640, 14);
        let mut new = base.clone();
        new[300] ^= 0xFF;
        let sig = sig_of(&base, 64);
        let mut m = DeltaMatcher::new(&sig, 1024, Vec::new());
        let mut cmds = Vec::new();
        m.feed(&new, &mut cmds).unwrap();
        m.finish(&mut cmds).unwrap();
        let s = *m.stats();
        assert_eq!(s.bytes_in, 640);
        assert_eq!(s.copy_bytes + s.literal_bytes, 640);
        assert_eq!(s.blocks_matched, 9);
        assert_eq!(rebuild(&base, &cmds), new);
    }
}
