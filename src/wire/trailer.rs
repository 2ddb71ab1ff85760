//! ALPDU trailers: CRC-32 and the per-fragment sequence byte.

use crc::{Crc, CRC_32_ISO_HDLC};

/// IEEE 802.3 CRC-32: polynomial 0x04C11DB7, init 0xFFFFFFFF, final XOR
/// 0xFFFFFFFF.
const ALPDU_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Size of the CRC-32 trailer inside the ALPDU.
pub const CRC_LEN: usize = 4;

/// Size of the sequence trailer on CONT/END PPDUs.
pub const SEQ_LEN: usize = 1;

/// CRC-32 over the SDU bytes only (the protocol-type prefix is excluded).
pub fn sdu_crc32(sdu: &[u8]) -> u32 {
    ALPDU_CRC.checksum(sdu)
}

/// Split a CONT/END body into its ALPDU bytes and trailing sequence byte.
///
/// Returns `None` when the body is too short to carry the trailer.
pub fn split_seq(body: &[u8]) -> Option<(&[u8], u8)> {
    let (payload, seq) = body.split_at(body.len().checked_sub(SEQ_LEN)?);
    Some((payload, seq[0]))
}
