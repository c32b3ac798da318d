//! Reference Burst Memory.
//!
//! Sparse word-addressed backing store that answers [`MemoryPort`] requests
//! with fixed timing:
//! 1. **Reads:** First beat `read_latency` ticks after the request, then one beat
//!    every `beat_interval` ticks. Bursts are served in issue order.
//! 2. **Writes:** One outstanding write at a time; further writes are refused
//!    (backpressure) until it is acknowledged `write_latency` ticks later.
//!    Data becomes visible at acknowledgement.
//!
//! Every transaction is appended to an event log so tests can check ordering.

use std::collections::{HashMap, VecDeque};

use super::{Beat, MemoryPort};
use crate::config::MemoryConfig;

/// Transaction observed by the memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemoryEvent {
    /// A burst read was requested.
    ReadBurst {
        /// Byte address of the first word.
        base: u64,
        /// Number of beats.
        len: usize,
    },
    /// A write was accepted.
    Write {
        /// Byte address of the first word.
        addr: u64,
        /// Written words.
        data: Vec<u32>,
    },
    /// A write was acknowledged.
    WriteAck {
        /// Byte address of the acknowledged write.
        addr: u64,
    },
}

#[derive(Debug)]
struct Burst {
    base: u64,
    len: usize,
    sent: usize,
    ready_at: u64,
}

#[derive(Debug)]
struct PendingWrite {
    addr: u64,
    data: Vec<u32>,
    ack_at: u64,
}

/// Backing store with burst timing.
#[derive(Debug)]
pub struct BurstMemory {
    words: HashMap<u64, u32>,
    word_bytes: u64,
    read_latency: u64,
    beat_interval: u64,
    write_latency: u64,
    now: u64,
    bursts: VecDeque<Burst>,
    write: Option<PendingWrite>,
    last_beat_at: Option<u64>,
    events: Vec<MemoryEvent>,
}

impl BurstMemory {
    /// Creates an empty memory; unwritten words read as zero.
    ///
    /// # Arguments
    ///
    /// * `config` - Read, beat, and write timing in ticks.
    /// * `word_bytes` - Size of one beat, used to step addresses within a burst.
    pub fn new(config: &MemoryConfig, word_bytes: usize) -> Self {
        Self {
            words: HashMap::new(),
            word_bytes: word_bytes.max(1) as u64,
            read_latency: config.read_latency.max(1),
            beat_interval: config.beat_interval.max(1),
            write_latency: config.write_latency.max(1),
            now: 0,
            bursts: VecDeque::new(),
            write: None,
            last_beat_at: None,
            events: Vec::new(),
        }
    }

    /// Advances the memory clock by one tick.
    pub fn tick(&mut self) {
        self.now += 1;
    }

    /// Current tick.
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Stores consecutive words starting at byte address `addr`.
    pub fn preload(&mut self, addr: u64, data: &[u32]) {
        for (i, &word) in data.iter().enumerate() {
            let _ = self.words.insert(addr + i as u64 * self.word_bytes, word);
        }
    }

    /// Reads the word at byte address `addr`.
    pub fn peek(&self, addr: u64) -> u32 {
        self.words.get(&addr).copied().unwrap_or(0)
    }

    /// Transactions observed so far.
    pub fn events(&self) -> &[MemoryEvent] {
        &self.events
    }

    /// Drains the transaction log.
    pub fn take_events(&mut self) -> Vec<MemoryEvent> {
        std::mem::take(&mut self.events)
    }

    /// Returns `true` while a burst or write is outstanding.
    pub fn is_busy(&self) -> bool {
        !self.bursts.is_empty() || self.write.is_some()
    }
}

impl MemoryPort for BurstMemory {
    fn read_burst(&mut self, base: u64, len: usize) {
        self.events.push(MemoryEvent::ReadBurst { base, len });
        if len == 0 {
            return;
        }
        self.bursts.push_back(Burst {
            base,
            len,
            sent: 0,
            ready_at: self.now + self.read_latency,
        });
    }

    fn poll_beat(&mut self) -> Option<Beat> {
        if self.last_beat_at == Some(self.now) {
            return None;
        }
        let burst = self.bursts.front_mut()?;
        if self.now < burst.ready_at {
            return None;
        }

        let addr = burst.base + burst.sent as u64 * self.word_bytes;
        burst.sent += 1;
        burst.ready_at = self.now + self.beat_interval;
        let last = burst.sent == burst.len;
        if last {
            let _ = self.bursts.pop_front();
        }
        self.last_beat_at = Some(self.now);

        Some(Beat {
            data: self.words.get(&addr).copied().unwrap_or(0),
            last,
        })
    }

    fn write(&mut self, addr: u64, data: &[u32]) -> bool {
        if self.write.is_some() {
            return false;
        }
        self.events.push(MemoryEvent::Write {
            addr,
            data: data.to_vec(),
        });
        self.write = Some(PendingWrite {
            addr,
            data: data.to_vec(),
            ack_at: self.now + self.write_latency,
        });
        true
    }

    fn poll_write_ack(&mut self) -> bool {
        match self.write.take() {
            Some(pending) if self.now >= pending.ack_at => {
                self.preload(pending.addr, &pending.data);
                self.events.push(MemoryEvent::WriteAck { addr: pending.addr });
                true
            }
            other => {
                self.write = other;
                false
            }
        }
    }
}
