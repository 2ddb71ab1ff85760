//! Link-status counters.
//!
//! One [`Stats`] record lives in each fragment-ID context and survives
//! context reuse. All mutation goes through the four `note_*` methods,
//! invoked at the engine boundaries only; everything else is read-only.

/// Counters for one fragment-ID context (or, aggregated, for a link).
///
/// `sdus_in` counts SDUs offered for transmission (or whose reassembly
/// started); `sdus_ok` counts SDUs fully sent or delivered. A dropped SDU
/// was seen but abandoned; a lost SDU is inferred from fragments that
/// never arrived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stats {
    /// SDUs offered to the engine.
    pub sdus_in: u64,
    /// SDUs sent or delivered successfully.
    pub sdus_ok: u64,
    /// SDUs seen but abandoned.
    pub sdus_dropped: u64,
    /// SDUs inferred lost on the link.
    pub sdus_lost: u64,
    /// Bytes offered to the engine.
    pub bytes_in: u64,
    /// Bytes of successfully sent or delivered SDUs.
    pub bytes_ok: u64,
    /// Bytes of abandoned SDUs.
    pub bytes_dropped: u64,
}

impl Stats {
    pub(crate) fn note_in(&mut self, bytes: usize) {
        self.sdus_in += 1;
        self.bytes_in += bytes as u64;
    }

    pub(crate) fn note_ok(&mut self, bytes: usize) {
        self.sdus_ok += 1;
        self.bytes_ok += bytes as u64;
    }

    pub(crate) fn note_dropped(&mut self, bytes: usize) {
        self.sdus_dropped += 1;
        self.bytes_dropped += bytes as u64;
    }

    pub(crate) fn note_lost(&mut self) {
        self.sdus_lost += 1;
    }

    /// Fold another record into this one, field by field.
    pub fn merge(&mut self, other: &Stats) {
        self.sdus_in += other.sdus_in;
        self.sdus_ok += other.sdus_ok;
        self.sdus_dropped += other.sdus_dropped;
        self.sdus_lost += other.sdus_lost;
        self.bytes_in += other.bytes_in;
        self.bytes_ok += other.bytes_ok;
        self.bytes_dropped += other.bytes_dropped;
    }

    /// Reset every counter to zero.
    pub fn reset(&mut self) {
        *self = Stats::default();
    }
}
