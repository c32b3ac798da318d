//! Cache statistics collection and reporting.
//!
//! This module tracks the observable activity of one cache engine. It provides:
//! 1. **Traffic:** Requests split into read/write hits and misses.
//! 2. **Miss handling:** Evictions, writebacks, fetches, fills, and received beats.
//! 3. **Stalls:** Ticks spent waiting on the memory collaborator.
//! 4. **Diagnostics:** Count of protocol violations discarded by the engine.

use std::fmt::Write as _;

use serde::Serialize;

/// Counters maintained by the miss controller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Ticks executed.
    pub ticks: u64,
    /// Requests admitted (reads, writes, and flushes).
    pub requests: u64,
    /// Reads that found their line resident.
    pub read_hits: u64,
    /// Reads that required a fill.
    pub read_misses: u64,
    /// Writes that found their line resident.
    pub write_hits: u64,
    /// Writes that required a fill.
    pub write_misses: u64,
    /// Misses that displaced a valid line.
    pub evictions: u64,
    /// Dirty lines written to memory (eviction and flush).
    pub writebacks: u64,
    /// Burst reads issued.
    pub fetches: u64,
    /// Lines committed after a burst.
    pub fills: u64,
    /// Burst beats consumed.
    pub beats_received: u64,
    /// Ticks in FILL with no beat available.
    pub fill_stall_ticks: u64,
    /// Ticks waiting for a write to be accepted or acknowledged.
    pub writeback_stall_ticks: u64,
    /// Flushes completed.
    pub flushes: u64,
    /// Unsolicited beats or acknowledgements discarded.
    pub protocol_violations: u64,
}

impl CacheStats {
    /// Total hits.
    pub const fn hits(&self) -> u64 {
        self.read_hits + self.write_hits
    }

    /// Total misses.
    pub const fn misses(&self) -> u64 {
        self.read_misses + self.write_misses
    }

    /// Hit rate in `[0, 1]`; zero before any access.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    /// Renders the selected report sections.
    ///
    /// Sections are `"summary"`, `"access"`, `"miss"`, and `"stall"`; an empty
    /// slice selects all of them.
    pub fn report(&self, sections: &[String]) -> String {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let ticks = self.ticks.max(1) as f64;
        let mut out = String::new();

        if want("summary") {
            let _ = writeln!(out, "==========================================================");
            let _ = writeln!(out, "CACHE SIMULATION STATISTICS");
            let _ = writeln!(out, "==========================================================");
            let _ = writeln!(out, "sim_ticks                {}", self.ticks);
            let _ = writeln!(out, "sim_requests             {}", self.requests);
            let _ = writeln!(out, "hit_rate                 {:.2}%", self.hit_rate() * 100.0);
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("access") {
            let _ = writeln!(out, "ACCESSES");
            let _ = writeln!(out, "  read.hits              {}", self.read_hits);
            let _ = writeln!(out, "  read.misses            {}", self.read_misses);
            let _ = writeln!(out, "  write.hits             {}", self.write_hits);
            let _ = writeln!(out, "  write.misses           {}", self.write_misses);
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("miss") {
            let _ = writeln!(out, "MISS HANDLING");
            let _ = writeln!(out, "  evictions              {}", self.evictions);
            let _ = writeln!(out, "  writebacks             {}", self.writebacks);
            let _ = writeln!(out, "  fetches                {}", self.fetches);
            let _ = writeln!(out, "  fills                  {}", self.fills);
            let _ = writeln!(out, "  beats                  {}", self.beats_received);
            let _ = writeln!(out, "  flushes                {}", self.flushes);
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("stall") {
            let _ = writeln!(out, "STALLS");
            let _ = writeln!(
                out,
                "  stall.fill             {} ({:.2}%)",
                self.fill_stall_ticks,
                (self.fill_stall_ticks as f64 / ticks) * 100.0
            );
            let _ = writeln!(
                out,
                "  stall.writeback        {} ({:.2}%)",
                self.writeback_stall_ticks,
                (self.writeback_stall_ticks as f64 / ticks) * 100.0
            );
            let _ = writeln!(out, "  protocol.violations    {}", self.protocol_violations);
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        out
    }

    /// Prints the selected report sections to stdout.
    pub fn print_sections(&self, sections: &[String]) {
        print!("{}", self.report(sections));
    }

    /// Prints the full report to stdout.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
