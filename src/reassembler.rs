use std::collections::BTreeMap;

use crate::stream::ByteStream;

/// Assembles byte ranges that arrive out of order (and possibly overlapping)
/// back into an in-order stream.
///
/// Ranges at or behind the next-needed position are written straight into the
/// output stream; ranges strictly ahead are parked in `pending`. The pending
/// map maintains one invariant after every mutation: no two stored ranges
/// overlap or touch. That keeps `unassembled_bytes` a plain sum and makes the
/// drain loop a single ordered scan.
///
/// There is no capacity of its own: incoming data is clipped to what the
/// output stream could accept if everything before it arrived, so delivered
/// plus pending bytes never exceed the output's configured capacity.
pub struct Reassembler {
    output: ByteStream,
    /// start index -> bytes; disjoint, non-adjacent
    pending: BTreeMap<u64, Vec<u8>>,
    first_unassembled: u64,
    /// exclusive end of the stream, once a range flagged eof has been seen
    eof_at: Option<u64>,
}

impl Reassembler {
    pub fn new(output: ByteStream) -> Self {
        Reassembler {
            output,
            pending: BTreeMap::new(),
            first_unassembled: 0,
            eof_at: None,
        }
    }

    /// Accept the range `[index, index + data.len())` of the logical stream.
    /// `eof` marks the range's last byte as the stream's last byte. Bytes
    /// past the end of the stream or past what the output can hold are
    /// silently dropped.
    pub fn push_substring(&mut self, data: &[u8], index: u64, eof: bool) {
        if eof {
            self.eof_at = Some(index + data.len() as u64);
        }

        let mut end = index + data.len() as u64;
        if let Some(stream_end) = self.eof_at {
            end = std::cmp::min(end, stream_end);
        }
        let horizon = self.first_unassembled + self.output.remaining_capacity() as u64;
        end = std::cmp::min(end, horizon);
        let clipped: &[u8] = if end > index {
            &data[..(end - index) as usize]
        } else {
            &[]
        };

        if !self.deliver(index, clipped) && !clipped.is_empty() {
            self.insert_pending(index, clipped.to_vec());
        }

        // ranges parked earlier may have just become contiguous
        loop {
            let next = match self.pending.iter().next() {
                Some((&start, _)) if start <= self.first_unassembled => start,
                _ => break,
            };
            if let Some(data) = self.pending.remove(&next) {
                self.deliver(next, &data);
            }
        }
    }

    /// Write the part of `[index, ...)` at or behind `first_unassembled` to
    /// the output. Returns false when the range lies strictly ahead and must
    /// be parked instead.
    fn deliver(&mut self, index: u64, data: &[u8]) -> bool {
        if index > self.first_unassembled {
            return false;
        }
        let skip = (self.first_unassembled - index) as usize;
        if skip <= data.len() {
            let written = self.output.write(&data[skip..]);
            self.first_unassembled += written as u64;
        }
        if self.eof_at == Some(self.first_unassembled) {
            self.output.end_input();
        }
        true
    }

    /// Merge `[index, index + data.len())` into the pending set, collapsing
    /// every range it overlaps or touches. One merge can create a new
    /// adjacency, so this loops to a fixed point before inserting.
    fn insert_pending(&mut self, mut index: u64, mut data: Vec<u8>) {
        loop {
            let end = index + data.len() as u64;
            let hit = self
                .pending
                .iter()
                .find(|&(&start, existing)| {
                    start <= end && start + existing.len() as u64 >= index
                })
                .map(|(&start, _)| start);
            let start = match hit {
                Some(start) => start,
                None => break,
            };
            let existing = match self.pending.remove(&start) {
                Some(existing) => existing,
                None => break,
            };
            let existing_end = start + existing.len() as u64;
            if start <= index {
                if end > existing_end {
                    // existing forms the head, new bytes extend past it
                    let mut merged = existing;
                    merged.extend_from_slice(&data[(existing_end - index) as usize..]);
                    data = merged;
                } else {
                    // new range contained entirely in existing
                    data = existing;
                }
                index = start;
            } else if existing_end > end {
                // new range forms the head, existing extends past it
                data.extend_from_slice(&existing[(end - start) as usize..]);
            }
            // else: existing contained entirely in the new range
        }
        self.pending.insert(index, data);
    }

    /// Bytes parked but not yet contiguous. Overlaps were collapsed on
    /// insertion, so every position counts once.
    pub fn unassembled_bytes(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// True when no ranges are parked.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Absolute index of the next byte the in-order output needs.
    pub fn first_unassembled(&self) -> u64 {
        self.first_unassembled
    }

    pub fn stream_out(&self) -> &ByteStream {
        &self.output
    }

    pub fn stream_out_mut(&mut self) -> &mut ByteStream {
        &mut self.output
    }
}
