use std::collections::VecDeque;

use accel_cache_core::mem::{Beat, MemoryPort};

/// Call observed by the scripted memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockCall {
    /// Burst read of `len` words from `base`.
    ReadBurst { base: u64, len: usize },
    /// Accepted write.
    Write { addr: u64, data: Vec<u32> },
    /// Write offer turned away by backpressure.
    RefusedWrite { addr: u64 },
}

/// Memory whose every beat and acknowledgement is queued by the test.
///
/// Nothing happens on its own unless built with [`ScriptedMemory::responsive`], in which case
/// each burst queues `len` beats valued `base + i` and each accepted write
/// queues one acknowledgement.
#[derive(Debug, Default)]
pub struct ScriptedMemory {
    beats: VecDeque<Beat>,
    acks: u32,
    refuse_writes: u32,
    beat_gaps: u32,
    auto_respond: bool,
    /// Every call, in order.
    pub calls: Vec<MockCall>,
}

impl ScriptedMemory {
    /// Memory that only answers what the test queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory that answers every burst and write by itself.
    pub fn responsive() -> Self {
        Self {
            auto_respond: true,
            ..Self::default()
        }
    }

    /// Queues one beat.
    pub fn push_beat(&mut self, data: u32, last: bool) {
        self.beats.push_back(Beat { data, last });
    }

    /// Queues a complete burst; only the final beat carries `last`.
    pub fn push_burst(&mut self, words: &[u32]) {
        for (i, &data) in words.iter().enumerate() {
            self.push_beat(data, i + 1 == words.len());
        }
    }

    /// Queues one write acknowledgement.
    pub fn push_ack(&mut self) {
        self.acks += 1;
    }

    /// Refuses the next `n` write offers.
    pub fn refuse_writes(&mut self, n: u32) {
        self.refuse_writes = n;
    }

    /// Withholds beats for the next `n` polls.
    pub fn stall_beats(&mut self, n: u32) {
        self.beat_gaps = n;
    }

    /// Beats not yet polled.
    pub fn queued_beats(&self) -> usize {
        self.beats.len()
    }

    /// Acknowledgements not yet polled.
    pub fn queued_acks(&self) -> u32 {
        self.acks
    }

    /// `(base, len)` of every burst read.
    pub fn bursts(&self) -> Vec<(u64, usize)> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                MockCall::ReadBurst { base, len } => Some((base, len)),
                _ => None,
            })
            .collect()
    }

    /// `(addr, data)` of every accepted write.
    pub fn writes(&self) -> Vec<(u64, Vec<u32>)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                MockCall::Write { addr, data } => Some((*addr, data.clone())),
                _ => None,
            })
            .collect()
    }
}

impl MemoryPort for ScriptedMemory {
    fn read_burst(&mut self, base: u64, len: usize) {
        self.calls.push(MockCall::ReadBurst { base, len });
        if self.auto_respond {
            let words: Vec<u32> = (0..len).map(|i| base as u32 + i as u32).collect();
            self.push_burst(&words);
        }
    }

    fn poll_beat(&mut self) -> Option<Beat> {
        if self.beat_gaps > 0 {
            self.beat_gaps -= 1;
            return None;
        }
        self.beats.pop_front()
    }

    fn write(&mut self, addr: u64, data: &[u32]) -> bool {
        if self.refuse_writes > 0 {
            self.refuse_writes -= 1;
            self.calls.push(MockCall::RefusedWrite { addr });
            return false;
        }
        self.calls.push(MockCall::Write {
            addr,
            data: data.to_vec(),
        });
        if self.auto_respond {
            self.acks += 1;
        }
        true
    }

    fn poll_write_ack(&mut self) -> bool {
        if self.acks > 0 {
            self.acks -= 1;
            true
        } else {
            false
        }
    }
}
