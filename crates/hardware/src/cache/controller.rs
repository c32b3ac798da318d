//! Miss Controller.
//!
//! The state machine that owns every metadata and payload array of a cache
//! engine and advances by exactly one step per tick:
//!
//! ```text
//! Idle -> Check -+-> Respond -> Idle                                   (hit)
//!                +-> [Writeback] -> Fetch -> Fill -> Respond -> Idle   (miss)
//! Idle -> Flush -> ... -> Idle                                         (flush)
//! ```
//!
//! 1. **Check:** Resolve the key and scan the set. On a miss the victim is chosen
//!    and invalidated at once; its tag and dirty bit move into the victim context.
//! 2. **Writeback:** Only for dirty victims. Offer the old line to memory until
//!    accepted, then wait for the acknowledgement.
//! 3. **Fetch:** Issue the burst read for the new line.
//! 4. **Fill:** Write one beat per tick into the victim way. Ends on the `last`
//!    flag or when the expected count is reached, whichever comes first, then
//!    commits the tag.
//! 5. **Respond:** Serve the pending request from the way; writes land here and
//!    set the dirty bit on both the hit and the miss path.
//!
//! Writeback, Fill, and Flush repeat while memory stalls; nothing is skipped.
//! Beats or acknowledgements arriving in any other state are dropped and
//! recorded as protocol violations.

use tracing::{debug, trace, warn};

use super::data::DataStore;
use super::hit;
use super::policies::{self, ReplacementPolicy};
use super::resolver::AddressResolver;
use super::tag_store::TagStore;
use super::victim;
use crate::common::{
    AccessKind, CacheError, ConfigError, ProtocolViolation, Request, RequestId, ResolvedKey,
    Response,
};
use crate::config::{CacheConfig, Geometry};
use crate::mem::MemoryPort;
use crate::stats::CacheStats;

/// Miss-handling state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissState {
    /// No request in flight.
    #[default]
    Idle,
    /// Request captured, lookup happens on the next tick.
    Check,
    /// Writing a dirty victim back to memory.
    Writeback,
    /// Issuing the burst read.
    Fetch,
    /// Receiving burst beats.
    Fill,
    /// Serving the pending request.
    Respond,
    /// Writing back every dirty line.
    Flush,
}

/// A line travelling to memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WritebackJob {
    /// Destination byte address.
    pub addr: u64,
    /// Set holding the payload.
    pub set: usize,
    /// Way holding the payload.
    pub way: usize,
    /// Memory accepted the write; waiting for its acknowledgement.
    pub issued: bool,
}

/// State of an outstanding miss.
///
/// Lives from the miss decision in `Check` until the fill commits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VictimContext {
    /// Set being filled.
    pub set: usize,
    /// Way being filled.
    pub way: usize,
    /// Tag committed once the fill completes.
    pub tag: u64,
    /// Burst base address.
    pub fetch_base: u64,
    /// Beats the burst should deliver.
    pub expected: usize,
    /// Beats written so far.
    pub received: usize,
    /// Pending writeback of the evicted line, cleared on acknowledgement.
    pub writeback: Option<WritebackJob>,
}

#[derive(Clone, Copy, Debug)]
struct Target {
    key: ResolvedKey,
    way: usize,
    hit: bool,
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    id: RequestId,
    request: Request,
    target: Option<Target>,
}

#[derive(Clone, Copy, Debug)]
struct FlushCursor {
    id: RequestId,
    next: usize,
    job: Option<WritebackJob>,
    written: u32,
}

/// Cache state machine and the arrays it owns.
#[derive(Debug)]
pub struct MissController {
    geometry: Geometry,
    resolver: AddressResolver,
    tags: TagStore,
    data: DataStore,
    policy: Box<dyn ReplacementPolicy>,
    state: MissState,
    pending: Option<Pending>,
    victim: Option<VictimContext>,
    flush: Option<FlushCursor>,
    stats: CacheStats,
    diagnostics: Vec<ProtocolViolation>,
}

impl MissController {
    /// Validates `config` and builds zeroed, all-invalid arrays.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] reported by [`CacheConfig::validate`].
    pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
        let geometry = config.validate()?;
        Ok(Self {
            resolver: AddressResolver::new(&geometry),
            tags: TagStore::new(geometry.num_sets, geometry.ways),
            data: DataStore::new(
                geometry.num_sets,
                geometry.ways,
                geometry.payload_len,
                geometry.word_mask(),
            ),
            policy: policies::build(config.policy, geometry.num_sets, geometry.ways),
            geometry,
            state: MissState::Idle,
            pending: None,
            victim: None,
            flush: None,
            stats: CacheStats::default(),
            diagnostics: Vec::new(),
        })
    }

    /// Current state.
    pub const fn state(&self) -> MissState {
        self.state
    }

    /// Id of the request or flush in flight.
    pub fn in_flight(&self) -> Option<RequestId> {
        self.pending
            .map(|p| p.id)
            .or_else(|| self.flush.map(|f| f.id))
    }

    /// Checked geometry.
    pub const fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Address resolver.
    pub const fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    /// Tag store.
    pub const fn tags(&self) -> &TagStore {
        &self.tags
    }

    /// Data store.
    pub const fn data(&self) -> &DataStore {
        &self.data
    }

    /// Replacement policy.
    pub fn policy(&self) -> &dyn ReplacementPolicy {
        self.policy.as_ref()
    }

    /// Outstanding miss, if any.
    pub const fn victim(&self) -> Option<&VictimContext> {
        self.victim.as_ref()
    }

    /// Statistics.
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Protocol violations seen so far.
    pub fn diagnostics(&self) -> &[ProtocolViolation] {
        &self.diagnostics
    }

    /// Drains the protocol violation log.
    pub fn take_diagnostics(&mut self) -> Vec<ProtocolViolation> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Captures a request. The caller guarantees the controller is idle.
    pub(crate) fn admit(&mut self, id: RequestId, request: Request) {
        debug!(%id, key = %request.key, kind = ?request.kind, "request admitted");
        self.stats.requests += 1;
        self.pending = Some(Pending {
            id,
            request,
            target: None,
        });
        self.state = MissState::Check;
    }

    /// Starts a flush. The caller guarantees the controller is idle.
    pub(crate) fn admit_flush(&mut self, id: RequestId) {
        debug!(%id, "flush admitted");
        self.stats.requests += 1;
        self.flush = Some(FlushCursor {
            id,
            next: 0,
            job: None,
            written: 0,
        });
        self.state = MissState::Flush;
    }

    /// Advances the state machine by one step.
    ///
    /// Returns the response produced this tick, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Invariant`] if the lookup finds the same tag in two
    /// valid ways. The request stays in `Check`; the engine is unusable.
    pub fn step<M: MemoryPort + ?Sized>(
        &mut self,
        mem: &mut M,
    ) -> Result<Option<Response>, CacheError> {
        self.stats.ticks += 1;
        self.drop_unsolicited(mem);

        let response = match self.state {
            MissState::Idle => None,
            MissState::Check => {
                self.check()?;
                None
            }
            MissState::Writeback => {
                self.writeback(mem);
                None
            }
            MissState::Fetch => {
                self.fetch(mem);
                None
            }
            MissState::Fill => {
                self.fill(mem);
                None
            }
            MissState::Respond => self.respond(),
            MissState::Flush => self.flush_step(mem),
        };
        Ok(response)
    }

    fn drop_unsolicited<M: MemoryPort + ?Sized>(&mut self, mem: &mut M) {
        if self.state != MissState::Fill {
            if let Some(beat) = mem.poll_beat() {
                self.violation(ProtocolViolation::UnexpectedBeat {
                    data: beat.data,
                    last: beat.last,
                });
            }
        }

        let awaiting_ack = match self.state {
            MissState::Writeback => self
                .victim
                .and_then(|v| v.writeback)
                .is_some_and(|job| job.issued),
            MissState::Flush => self
                .flush
                .and_then(|f| f.job)
                .is_some_and(|job| job.issued),
            _ => false,
        };
        if !awaiting_ack && mem.poll_write_ack() {
            self.violation(ProtocolViolation::UnexpectedWriteAck);
        }
    }

    fn violation(&mut self, violation: ProtocolViolation) {
        warn!(state = ?self.state, "{violation}; discarded");
        self.stats.protocol_violations += 1;
        self.diagnostics.push(violation);
    }

    fn check(&mut self) -> Result<(), CacheError> {
        let Some(pending) = self.pending.as_mut() else {
            self.state = MissState::Idle;
            return Ok(());
        };
        let Some(key) = self.resolver.resolve(&pending.request.key) else {
            warn!(id = %pending.id, "key does not match addressing mode; request dropped");
            self.pending = None;
            self.state = MissState::Idle;
            return Ok(());
        };
        let is_write = pending.request.kind == AccessKind::Write;

        if let Some(way) = hit::find(&self.tags, key.set, key.tag)? {
            debug!(id = %pending.id, %key, way, "hit");
            if is_write {
                self.stats.write_hits += 1;
            } else {
                self.stats.read_hits += 1;
            }
            self.policy.update(key.set, way);
            pending.target = Some(Target {
                key,
                way,
                hit: true,
            });
            self.state = MissState::Respond;
            return Ok(());
        }

        if is_write {
            self.stats.write_misses += 1;
        } else {
            self.stats.read_misses += 1;
        }
        let way = victim::choose(&self.tags, self.policy.as_ref(), key.set);
        let old = self.tags.invalidate(key.set, way);
        if old.valid {
            self.stats.evictions += 1;
        }
        let writeback = (old.valid && old.dirty).then(|| WritebackJob {
            addr: self.resolver.line_base(key.set, old.tag),
            set: key.set,
            way,
            issued: false,
        });
        debug!(
            id = %pending.id,
            %key,
            way,
            evicted = old.valid,
            dirty = old.dirty,
            "miss"
        );

        self.victim = Some(VictimContext {
            set: key.set,
            way,
            tag: key.tag,
            fetch_base: self.resolver.line_base(key.set, key.tag),
            expected: self.geometry.payload_len,
            received: 0,
            writeback,
        });
        pending.target = Some(Target {
            key,
            way,
            hit: false,
        });
        self.state = if writeback.is_some() {
            MissState::Writeback
        } else {
            MissState::Fetch
        };
        Ok(())
    }

    fn writeback<M: MemoryPort + ?Sized>(&mut self, mem: &mut M) {
        let Some(victim) = self.victim.as_mut() else {
            self.state = MissState::Idle;
            return;
        };
        let Some(job) = victim.writeback.as_mut() else {
            self.state = MissState::Fetch;
            return;
        };
        if drive_write(job, &self.data, &mut self.stats, mem) {
            debug!(addr = job.addr, "writeback acknowledged");
            victim.writeback = None;
            self.state = MissState::Fetch;
        }
    }

    fn fetch<M: MemoryPort + ?Sized>(&mut self, mem: &mut M) {
        let Some(victim) = self.victim.as_ref() else {
            self.state = MissState::Idle;
            return;
        };
        debug!(base = victim.fetch_base, len = victim.expected, "burst read");
        mem.read_burst(victim.fetch_base, victim.expected);
        self.stats.fetches += 1;
        self.state = MissState::Fill;
    }

    fn fill<M: MemoryPort + ?Sized>(&mut self, mem: &mut M) {
        let Some(victim) = self.victim.as_mut() else {
            self.state = MissState::Idle;
            return;
        };
        let Some(beat) = mem.poll_beat() else {
            self.stats.fill_stall_ticks += 1;
            return;
        };

        trace!(offset = victim.received, data = beat.data, last = beat.last, "beat");
        let _ = self
            .data
            .write(victim.set, victim.way, victim.received, beat.data);
        victim.received += 1;
        self.stats.beats_received += 1;

        if !(beat.last || victim.received >= victim.expected) {
            return;
        }
        let VictimContext {
            set,
            way,
            tag,
            received,
            expected,
            ..
        } = *victim;
        if received < expected {
            debug!(received, expected, "burst ended early");
            // Unfilled words would otherwise keep the evicted line's data.
            self.data.clear_from(set, way, received);
        }
        self.tags.commit(set, way, tag);
        self.policy.update(set, way);
        self.stats.fills += 1;
        self.victim = None;
        self.state = MissState::Respond;
    }

    fn respond(&mut self) -> Option<Response> {
        self.state = MissState::Idle;
        let pending = self.pending.take()?;
        let target = pending.target?;
        let ResolvedKey { set, offset, .. } = target.key;

        let data = match pending.request.kind {
            AccessKind::Read => self.data.read(set, target.way, offset),
            AccessKind::Write => {
                let stored = self
                    .data
                    .write(set, target.way, offset, pending.request.data);
                self.tags.mark_dirty(set, target.way);
                stored
            }
        };
        debug!(id = %pending.id, hit = target.hit, data, "respond");
        Some(Response::Access {
            id: pending.id,
            kind: pending.request.kind,
            hit: target.hit,
            data,
        })
    }

    fn flush_step<M: MemoryPort + ?Sized>(&mut self, mem: &mut M) -> Option<Response> {
        let Some(cursor) = self.flush.as_mut() else {
            self.state = MissState::Idle;
            return None;
        };

        if cursor.job.is_none() {
            let ways = self.geometry.ways;
            match self.tags.next_dirty(cursor.next / ways, cursor.next % ways) {
                Some((set, way)) => {
                    let tag = self.tags.way(set, way).tag;
                    cursor.job = Some(WritebackJob {
                        addr: self.resolver.line_base(set, tag),
                        set,
                        way,
                        issued: false,
                    });
                }
                None => {
                    let (id, lines_written) = (cursor.id, cursor.written);
                    debug!(%id, lines_written, "flush complete");
                    self.flush = None;
                    self.stats.flushes += 1;
                    self.state = MissState::Idle;
                    return Some(Response::Flushed { id, lines_written });
                }
            }
        }

        if let Some(job) = cursor.job.as_mut() {
            if drive_write(job, &self.data, &mut self.stats, mem) {
                self.tags.clean(job.set, job.way);
                cursor.next = job.set * self.geometry.ways + job.way + 1;
                cursor.written += 1;
                cursor.job = None;
            }
        }
        None
    }
}

/// Advances one write/acknowledge handshake. Returns `true` once acknowledged.
fn drive_write<M: MemoryPort + ?Sized>(
    job: &mut WritebackJob,
    data: &DataStore,
    stats: &mut CacheStats,
    mem: &mut M,
) -> bool {
    if !job.issued {
        if mem.write(job.addr, data.line(job.set, job.way)) {
            debug!(addr = job.addr, set = job.set, way = job.way, "writeback issued");
            job.issued = true;
            stats.writebacks += 1;
        } else {
            stats.writeback_stall_ticks += 1;
        }
        return false;
    }
    if mem.poll_write_ack() {
        true
    } else {
        stats.writeback_stall_ticks += 1;
        false
    }
}
