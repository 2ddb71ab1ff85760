//! PPDU header encoding and decoding.
//!
//! Every PPDU opens with a 16-bit base word:
//!
//! ```text
//! bit  15  14  13..11     10..8      7..0
//!      S   E   FIELD(3)   len[10:8]  len[7:0]
//! ```
//!
//! `len` is the PPDU body length (header excluded, sequence trailer
//! included). `FIELD` carries the 3-bit fragment ID on START/CONT/END and
//! `label_type(2) | ptype_suppressed(1)` on COMPLETE. START PPDUs carry a
//! second word:
//!
//! ```text
//! bit  15..4             3..2      1             0
//!      total_alpdu(12)   label(2)  ptype_supp(1) use_crc(1)
//! ```

use bytes::{BufMut, BytesMut};

use crate::error::DeencapError;
use crate::wire::{BASE_HEADER_SIZE, START_HEADER_SIZE};

/// The four PPDU shapes, shared by the codec and both state machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpduKind {
    /// Whole ALPDU in one PPDU.
    Complete,
    /// First fragment of an ALPDU.
    Start,
    /// Middle fragment.
    Cont,
    /// Last fragment.
    End,
}

impl PpduKind {
    /// Map the `(S, E)` bits of byte 0 to a PPDU kind.
    pub fn from_se(start: bool, end: bool) -> Self {
        match (start, end) {
            (true, true) => PpduKind::Complete,
            (true, false) => PpduKind::Start,
            (false, false) => PpduKind::Cont,
            (false, true) => PpduKind::End,
        }
    }

    /// Whether `next` may legally follow this fragment within one ALPDU.
    ///
    /// `prev = None` means no fragment has been seen (or emitted) yet.
    /// COMPLETE and END are terminal: the context is released on them, so
    /// nothing follows.
    pub fn may_follow(prev: Option<PpduKind>, next: PpduKind) -> bool {
        match prev {
            None => matches!(next, PpduKind::Complete | PpduKind::Start),
            Some(PpduKind::Start) | Some(PpduKind::Cont) => {
                matches!(next, PpduKind::Cont | PpduKind::End)
            }
            Some(PpduKind::Complete) | Some(PpduKind::End) => false,
        }
    }
}

/// ALPDU label type, carried in COMPLETE and START headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LabelType {
    /// Protocol-type field present in the ALPDU.
    NoSupp = 0,
    /// Protocol-type field elided; the receiver restores the link's
    /// implicit default.
    Implicit = 1,
    /// Signalling SDU; the protocol-type field is present.
    Signal = 2,
}

impl LabelType {
    /// Decode a 2-bit label together with its suppression bit.
    ///
    /// Only three of the eight combinations are legal: the suppression
    /// bit must be set exactly when the label is `Implicit`.
    fn decode(label: u8, suppressed: bool) -> Result<Self, DeencapError> {
        match (label, suppressed) {
            (0, false) => Ok(LabelType::NoSupp),
            (1, true) => Ok(LabelType::Implicit),
            (2, false) => Ok(LabelType::Signal),
            (3, _) => Err(DeencapError::MalformedHeader("reserved label type")),
            _ => Err(DeencapError::MalformedHeader(
                "label type disagrees with suppression bit",
            )),
        }
    }

    /// The suppression bit implied by this label.
    pub fn suppressed(self) -> bool {
        matches!(self, LabelType::Implicit)
    }
}

/// A decoded PPDU header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpduHeader {
    /// Whole ALPDU in one PPDU. COMPLETE PPDUs carry no fragment ID; the
    /// receiver picks any free context.
    Complete {
        /// ALPDU length in bytes.
        body_len: usize,
        /// ALPDU label type.
        label_type: LabelType,
    },
    /// First fragment of an ALPDU.
    Start {
        /// Fragment ID of the stream.
        frag_id: u8,
        /// Fragment length in bytes.
        body_len: usize,
        /// Total length of the ALPDU under reassembly.
        total_alpdu_len: usize,
        /// ALPDU label type.
        label_type: LabelType,
        /// Whether the ALPDU ends with a CRC-32 trailer.
        use_crc: bool,
    },
    /// Middle fragment.
    Cont {
        /// Fragment ID of the stream.
        frag_id: u8,
        /// Fragment length in bytes, sequence trailer included.
        body_len: usize,
    },
    /// Last fragment.
    End {
        /// Fragment ID of the stream.
        frag_id: u8,
        /// Fragment length in bytes, sequence trailer included.
        body_len: usize,
    },
}

impl PpduHeader {
    /// The kind tag of this header.
    pub fn kind(&self) -> PpduKind {
        match self {
            PpduHeader::Complete { .. } => PpduKind::Complete,
            PpduHeader::Start { .. } => PpduKind::Start,
            PpduHeader::Cont { .. } => PpduKind::Cont,
            PpduHeader::End { .. } => PpduKind::End,
        }
    }

    /// Encoded header size in bytes.
    pub fn wire_size(&self) -> usize {
        match self {
            PpduHeader::Start { .. } => START_HEADER_SIZE,
            _ => BASE_HEADER_SIZE,
        }
    }

    /// PPDU body length announced by this header.
    pub fn body_len(&self) -> usize {
        match *self {
            PpduHeader::Complete { body_len, .. }
            | PpduHeader::Start { body_len, .. }
            | PpduHeader::Cont { body_len, .. }
            | PpduHeader::End { body_len, .. } => body_len,
        }
    }

    /// Encode into `buf` in network byte order.
    pub fn encode(&self, buf: &mut BytesMut) {
        let (s, e) = match self.kind() {
            PpduKind::Complete => (1u16, 1u16),
            PpduKind::Start => (1, 0),
            PpduKind::Cont => (0, 0),
            PpduKind::End => (0, 1),
        };
        let field = match *self {
            PpduHeader::Complete { label_type, .. } => {
                (label_type as u16) << 1 | label_type.suppressed() as u16
            }
            PpduHeader::Start { frag_id, .. }
            | PpduHeader::Cont { frag_id, .. }
            | PpduHeader::End { frag_id, .. } => frag_id as u16,
        };
        let word = s << 15 | e << 14 | field << 11 | self.body_len() as u16;
        buf.put_u16(word);

        if let PpduHeader::Start {
            total_alpdu_len,
            label_type,
            use_crc,
            ..
        } = *self
        {
            let word2 = (total_alpdu_len as u16) << 4
                | (label_type as u16) << 2
                | (label_type.suppressed() as u16) << 1
                | use_crc as u16;
            buf.put_u16(word2);
        }
    }

    /// Decode a header from the front of `buf`.
    ///
    /// Returns the header and its encoded size. The caller is expected to
    /// check the announced body length against the bytes that follow.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), DeencapError> {
        if buf.len() < BASE_HEADER_SIZE {
            return Err(DeencapError::MalformedHeader("truncated base header"));
        }

        let word = u16::from_be_bytes([buf[0], buf[1]]);
        let start = word & 0x8000 != 0;
        let end = word & 0x4000 != 0;
        let field = ((word >> 11) & 0x07) as u8;
        let body_len = (word & 0x07FF) as usize;

        match PpduKind::from_se(start, end) {
            PpduKind::Complete => {
                let label_type = LabelType::decode(field >> 1, field & 1 != 0)?;
                Ok((
                    PpduHeader::Complete {
                        body_len,
                        label_type,
                    },
                    BASE_HEADER_SIZE,
                ))
            }
            PpduKind::Start => {
                if buf.len() < START_HEADER_SIZE {
                    return Err(DeencapError::MalformedHeader("truncated START header"));
                }
                let word2 = u16::from_be_bytes([buf[2], buf[3]]);
                let total_alpdu_len = (word2 >> 4) as usize;
                let label_type =
                    LabelType::decode(((word2 >> 2) & 0x03) as u8, word2 & 0x02 != 0)?;
                let use_crc = word2 & 0x01 != 0;
                if body_len > total_alpdu_len {
                    return Err(DeencapError::MalformedHeader(
                        "START fragment longer than the announced ALPDU",
                    ));
                }
                Ok((
                    PpduHeader::Start {
                        frag_id: field,
                        body_len,
                        total_alpdu_len,
                        label_type,
                        use_crc,
                    },
                    START_HEADER_SIZE,
                ))
            }
            PpduKind::Cont => {
                if body_len == 0 {
                    return Err(DeencapError::MalformedHeader("zero-body CONT"));
                }
                Ok((
                    PpduHeader::Cont {
                        frag_id: field,
                        body_len,
                    },
                    BASE_HEADER_SIZE,
                ))
            }
            PpduKind::End => Ok((
                PpduHeader::End {
                    frag_id: field,
                    body_len,
                },
                BASE_HEADER_SIZE,
            )),
        }
    }
}

/// Total wire length (header + body) of the PPDU at the front of `buf`.
///
/// Lets a host walk a burst carrying several back-to-back PPDUs without
/// deencapsulating them.
pub fn ppdu_wire_len(buf: &[u8]) -> Result<usize, DeencapError> {
    let (header, header_len) = PpduHeader::decode(buf)?;
    Ok(header_len + header.body_len())
}
