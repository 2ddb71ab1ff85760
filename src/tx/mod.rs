//! Encapsulation and fragmentation engine (transmitter side).
//!
//! [`Transmitter::encap`] builds an ALPDU from an SDU and queues it on a
//! fragment-ID context; successive [`Transmitter::pack`] calls slice the
//! ALPDU into PPDUs sized to the caller's burst budgets:
//!
//! ```text
//! queued --pack--> COMPLETE                      (fits in one burst)
//! queued --pack--> START --pack--> CONT* --pack--> END
//! ```
//!
//! COMPLETE and END release the context; the next `encap` may reuse it.

mod buffer;

use bytes::{BufMut, Bytes, BytesMut};

use crate::context::ContextPool;
use crate::error::{ConfigError, EncapError, PackError};
use crate::stats::Stats;
use crate::wire::{self, ptype, trailer, LabelType, PpduHeader, PpduKind};
use crate::{RleConfig, FRAG_ID_COUNT, MAX_PPDU_BODY, MAX_SDU_SIZE};

use buffer::FragBuffer;

/// One encoded PPDU, ready to be placed in a burst.
#[derive(Debug, Clone, PartialEq)]
pub struct Ppdu {
    kind: PpduKind,
    frag_id: u8,
    data: Bytes,
}

impl Ppdu {
    /// The PPDU kind.
    pub fn kind(&self) -> PpduKind {
        self.kind
    }

    /// Fragment ID of the context that produced this PPDU. COMPLETE
    /// PPDUs do not carry it on the wire.
    pub fn frag_id(&self) -> u8 {
        self.frag_id
    }

    /// Encoded wire bytes, header included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the PPDU, keeping the wire bytes.
    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Total wire length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the PPDU is empty (never true for packed PPDUs).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// RLE transmitter: eight independent fragmentation contexts over one
/// return link.
#[derive(Debug)]
pub struct Transmitter {
    conf: RleConfig,
    pool: ContextPool<FragBuffer>,
}

impl Transmitter {
    /// Build a transmitter. All context buffers are allocated here; the
    /// encap/pack hot path does not allocate ALPDU storage.
    pub fn new(config: RleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            conf: config,
            pool: ContextPool::new(),
        })
    }

    /// The link configuration this transmitter was built with.
    pub fn config(&self) -> &RleConfig {
        &self.conf
    }

    /// Encapsulate an SDU into the ALPDU of context `frag_id`.
    ///
    /// The context must be free; the queued ALPDU is then drained by
    /// [`pack`](Self::pack). Oversized SDUs are dropped and counted.
    pub fn encap(&mut self, frag_id: u8, sdu: &[u8], proto_type: u16) -> Result<(), EncapError> {
        if frag_id as usize >= FRAG_ID_COUNT {
            return Err(EncapError::InvalidFragId(frag_id));
        }
        if self.pool.is_busy(frag_id) {
            return Err(EncapError::ContextBusy(frag_id));
        }

        let (label_type, field, field_len) = alpdu_ptype_field(&self.conf, proto_type);
        let crc = self.conf.use_alpdu_crc.then(|| trailer::sdu_crc32(sdu));
        let use_crc = self.conf.use_alpdu_crc;

        let ctx = self.pool.get_mut(frag_id);
        ctx.stats.note_in(sdu.len());
        if sdu.len() > MAX_SDU_SIZE {
            ctx.stats.note_dropped(sdu.len());
            tracing::debug!(frag_id, len = sdu.len(), "oversized SDU dropped");
            return Err(EncapError::SduTooLarge {
                len: sdu.len(),
                max: MAX_SDU_SIZE,
            });
        }

        let ctx = self.pool.acquire(frag_id);
        ctx.buf.load(&field[..field_len], sdu, crc);
        ctx.proto_type = proto_type;
        ctx.label_type = label_type;
        ctx.use_crc = use_crc;
        ctx.sdu_len = sdu.len();
        ctx.last = None;
        ctx.next_seq = 0;
        Ok(())
    }

    /// Emit the next PPDU of context `frag_id` into a burst with
    /// `burst_budget` bytes left.
    ///
    /// Picks COMPLETE when the whole ALPDU fits (and its length fits the
    /// 11-bit body field), otherwise START, then CONT until the remainder
    /// fits an END. A budget too small to make progress leaves all state
    /// unchanged.
    pub fn pack(&mut self, frag_id: u8, burst_budget: usize) -> Result<Ppdu, PackError> {
        if frag_id as usize >= FRAG_ID_COUNT {
            return Err(PackError::InvalidFragId(frag_id));
        }
        if !self.pool.is_busy(frag_id) {
            return Err(PackError::QueueEmpty(frag_id));
        }

        let seq_len = if self.conf.use_alpdu_crc {
            0
        } else {
            trailer::SEQ_LEN
        };
        let ctx = self.pool.get_mut(frag_id);

        match ctx.last {
            None => {
                let total = ctx.buf.alpdu_len();
                if total + wire::BASE_HEADER_SIZE <= burst_budget && total <= MAX_PPDU_BODY {
                    let mut buf = BytesMut::with_capacity(wire::BASE_HEADER_SIZE + total);
                    PpduHeader::Complete {
                        body_len: total,
                        label_type: ctx.label_type,
                    }
                    .encode(&mut buf);
                    buf.extend_from_slice(ctx.buf.peek(total));
                    ctx.buf.commit(total);

                    let sdu_len = ctx.sdu_len;
                    ctx.stats.note_ok(sdu_len);
                    self.pool.release(frag_id);
                    return Ok(Ppdu {
                        kind: PpduKind::Complete,
                        frag_id,
                        data: buf.freeze(),
                    });
                }

                if burst_budget <= wire::START_HEADER_SIZE {
                    return Err(PackError::BurstTooSmall {
                        budget: burst_budget,
                        needed: wire::START_HEADER_SIZE + 1,
                    });
                }
                let take = (burst_budget - wire::START_HEADER_SIZE).min(MAX_PPDU_BODY);

                let mut buf = BytesMut::with_capacity(wire::START_HEADER_SIZE + take);
                PpduHeader::Start {
                    frag_id,
                    body_len: take,
                    total_alpdu_len: total,
                    label_type: ctx.label_type,
                    use_crc: ctx.use_crc,
                }
                .encode(&mut buf);
                buf.extend_from_slice(ctx.buf.peek(take));
                ctx.buf.commit(take);
                ctx.last = Some(PpduKind::Start);
                ctx.next_seq = 0;
                Ok(Ppdu {
                    kind: PpduKind::Start,
                    frag_id,
                    data: buf.freeze(),
                })
            }
            Some(PpduKind::Start) | Some(PpduKind::Cont) => {
                let rem = ctx.buf.remaining();
                if rem + seq_len + wire::BASE_HEADER_SIZE <= burst_budget
                    && rem + seq_len <= MAX_PPDU_BODY
                {
                    let body_len = rem + seq_len;
                    let mut buf = BytesMut::with_capacity(wire::BASE_HEADER_SIZE + body_len);
                    PpduHeader::End { frag_id, body_len }.encode(&mut buf);
                    buf.extend_from_slice(ctx.buf.peek(rem));
                    ctx.buf.commit(rem);
                    if seq_len != 0 {
                        buf.put_u8(ctx.next_seq);
                    }

                    let sdu_len = ctx.sdu_len;
                    ctx.stats.note_ok(sdu_len);
                    self.pool.release(frag_id);
                    return Ok(Ppdu {
                        kind: PpduKind::End,
                        frag_id,
                        data: buf.freeze(),
                    });
                }

                // A CONT must carry at least one ALPDU byte and must
                // leave at least one for the END.
                let needed = wire::BASE_HEADER_SIZE + seq_len + 1;
                if burst_budget < needed {
                    return Err(PackError::BurstTooSmall {
                        budget: burst_budget,
                        needed,
                    });
                }
                let take = (burst_budget - wire::BASE_HEADER_SIZE - seq_len)
                    .min(MAX_PPDU_BODY - seq_len)
                    .min(rem - 1);
                if take == 0 {
                    return Err(PackError::BurstTooSmall {
                        budget: burst_budget,
                        needed: rem + seq_len + wire::BASE_HEADER_SIZE,
                    });
                }

                let body_len = take + seq_len;
                let mut buf = BytesMut::with_capacity(wire::BASE_HEADER_SIZE + body_len);
                PpduHeader::Cont { frag_id, body_len }.encode(&mut buf);
                buf.extend_from_slice(ctx.buf.peek(take));
                ctx.buf.commit(take);
                if seq_len != 0 {
                    buf.put_u8(ctx.next_seq);
                    ctx.next_seq = ctx.next_seq.wrapping_add(1);
                }
                ctx.last = Some(PpduKind::Cont);
                Ok(Ppdu {
                    kind: PpduKind::Cont,
                    frag_id,
                    data: buf.freeze(),
                })
            }
            Some(PpduKind::Complete) | Some(PpduKind::End) => {
                unreachable!("terminal fragment kinds release the context")
            }
        }
    }

    /// Abandon the ALPDU in flight on `frag_id`; the context returns to
    /// the free pool and the drop is counted. A free or out-of-range
    /// context is left untouched.
    pub fn free(&mut self, frag_id: u8) {
        if frag_id as usize >= FRAG_ID_COUNT || !self.pool.is_busy(frag_id) {
            return;
        }
        let ctx = self.pool.get_mut(frag_id);
        let sdu_len = ctx.sdu_len;
        ctx.stats.note_dropped(sdu_len);
        tracing::debug!(frag_id, "in-flight ALPDU abandoned by host");
        self.pool.release(frag_id);
    }

    /// Counters of one fragment-ID context. Out-of-range IDs report
    /// zeroed counters.
    pub fn stats(&self, frag_id: u8) -> Stats {
        if frag_id as usize >= FRAG_ID_COUNT {
            return Stats::default();
        }
        self.pool.get(frag_id).stats
    }

    /// Counters summed over all fragment-ID contexts.
    pub fn link_stats(&self) -> Stats {
        self.pool.stats_sum()
    }

    /// Reset the counters of one fragment-ID context.
    pub fn reset_stats(&mut self, frag_id: u8) {
        if (frag_id as usize) < FRAG_ID_COUNT {
            self.pool.get_mut(frag_id).stats.reset();
        }
    }

    /// Whether `frag_id` names a context with no ALPDU in flight.
    pub fn is_free(&self, frag_id: u8) -> bool {
        (frag_id as usize) < FRAG_ID_COUNT && !self.pool.is_busy(frag_id)
    }

    /// ALPDU bytes still queued on `frag_id`; 0 when the context is free.
    pub fn queued_len(&self, frag_id: u8) -> usize {
        if (frag_id as usize) < FRAG_ID_COUNT && self.pool.is_busy(frag_id) {
            self.pool.get(frag_id).buf.remaining()
        } else {
            0
        }
    }
}

/// Decide the label type and encode the ALPDU protocol-type field.
///
/// Signalling SDUs always carry the field; an SDU whose type equals the
/// implicit default is elided when the configuration and the omissible
/// set both allow it; everything else carries the field, compressed when
/// configured and the type is in the table.
fn alpdu_ptype_field(conf: &RleConfig, proto_type: u16) -> (LabelType, [u8; 3], usize) {
    let mut field = [0u8; 3];

    if ptype::is_signal(proto_type) {
        let len = encode_ptype_field(conf, proto_type, &mut field);
        return (LabelType::Signal, field, len);
    }

    if conf.use_ptype_omission
        && proto_type == conf.implicit_proto_type
        && ptype::is_omissible(proto_type)
    {
        return (LabelType::Implicit, field, 0);
    }

    let len = encode_ptype_field(conf, proto_type, &mut field);
    (LabelType::NoSupp, field, len)
}

fn encode_ptype_field(conf: &RleConfig, proto_type: u16, field: &mut [u8; 3]) -> usize {
    if conf.use_compressed_ptype {
        match ptype::compress(proto_type) {
            Some(code) => {
                field[0] = code;
                1
            }
            None => {
                field[0] = ptype::UNCOMPRESSED_ESCAPE;
                field[1..3].copy_from_slice(&proto_type.to_be_bytes());
                3
            }
        }
    } else {
        field[..2].copy_from_slice(&proto_type.to_be_bytes());
        2
    }
}
