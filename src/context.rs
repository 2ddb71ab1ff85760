//! Per-fragment-ID context pool.
//!
//! A transmitter or receiver owns eight contexts, one per 3-bit fragment
//! ID, each holding the buffer for the ALPDU in flight plus the stream's
//! protocol state and counters. The busy bitmap is the single source of
//! truth for free/in-use and is mutated only by [`ContextPool::acquire`]
//! and [`ContextPool::release`].

use crate::stats::Stats;
use crate::wire::{LabelType, PpduKind};
use crate::FRAG_ID_COUNT;

/// State of one fragment-ID stream.
///
/// `last` is the last fragment kind emitted (TX) or accepted (RX) for the
/// ALPDU in flight; `None` means none yet. Counters persist across
/// context reuse; everything else is reset on release.
#[derive(Debug)]
pub(crate) struct Context<B> {
    /// Fragmentation or reassembly buffer, depending on direction.
    pub buf: B,
    /// Last fragment kind of the ALPDU in flight.
    pub last: Option<PpduKind>,
    /// Next sequence byte to emit or expect (sequence trailer mode).
    pub next_seq: u8,
    /// Whether the ALPDU in flight carries a CRC-32 trailer.
    pub use_crc: bool,
    /// Protocol type of the SDU in flight.
    pub proto_type: u16,
    /// Label type of the ALPDU in flight.
    pub label_type: LabelType,
    /// SDU length in flight, for byte accounting.
    pub sdu_len: usize,
    /// Link-status counters for this fragment ID.
    pub stats: Stats,
}

impl<B: Default> Context<B> {
    fn new() -> Self {
        Self {
            buf: B::default(),
            last: None,
            next_seq: 0,
            use_crc: false,
            proto_type: 0,
            label_type: LabelType::NoSupp,
            sdu_len: 0,
            stats: Stats::default(),
        }
    }
}

/// Fixed pool of eight contexts with a busy bitmap (bit `i` set = context
/// `i` in use).
#[derive(Debug)]
pub(crate) struct ContextPool<B> {
    slots: [Context<B>; FRAG_ID_COUNT],
    busy: u8,
}

impl<B: Default> ContextPool<B> {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| Context::new()),
            busy: 0,
        }
    }
}

impl<B> ContextPool<B> {
    pub fn is_busy(&self, frag_id: u8) -> bool {
        self.busy >> frag_id & 1 != 0
    }

    /// Lowest free fragment ID, searching from 0.
    pub fn first_free(&self) -> Option<u8> {
        (0..FRAG_ID_COUNT as u8).find(|&id| !self.is_busy(id))
    }

    /// Mark a free context busy and hand it out.
    pub fn acquire(&mut self, frag_id: u8) -> &mut Context<B> {
        debug_assert!(!self.is_busy(frag_id));
        self.busy |= 1 << frag_id;
        &mut self.slots[frag_id as usize]
    }

    /// Return a context to the free pool, clearing its protocol state.
    /// Counters are kept.
    pub fn release(&mut self, frag_id: u8) {
        self.busy &= !(1 << frag_id);
        let ctx = &mut self.slots[frag_id as usize];
        ctx.last = None;
        ctx.next_seq = 0;
        ctx.use_crc = false;
        ctx.proto_type = 0;
        ctx.label_type = LabelType::NoSupp;
        ctx.sdu_len = 0;
    }

    pub fn get(&self, frag_id: u8) -> &Context<B> {
        &self.slots[frag_id as usize]
    }

    pub fn get_mut(&mut self, frag_id: u8) -> &mut Context<B> {
        &mut self.slots[frag_id as usize]
    }

    /// Field-wise sum of all per-context counters.
    pub fn stats_sum(&self) -> Stats {
        let mut sum = Stats::default();
        for slot in &self.slots {
            sum.merge(&slot.stats);
        }
        sum
    }
}
