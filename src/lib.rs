//! # Return Link Encapsulation (RLE)
//!
//! Protocol core for the DVB-RCS2 return link: packs variable-length
//! upper-layer packets (SDUs) into fixed-capacity transport bursts at the
//! sender, fragmenting across bursts when needed, and reconstructs the
//! original SDUs at the receiver from fragments interleaved over up to
//! eight fragment-ID streams.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Host / burst driver                   │
//! ├────────────────────────────┬────────────────────────────┤
//! │  Transmitter (encap/pack)  │  Receiver (deencap)        │
//! ├────────────────────────────┴────────────────────────────┤
//! │  Context pool (8 fragment IDs, busy bitmap, counters)   │
//! ├─────────────────────────────────────────────────────────┤
//! │  Wire codec (PPDU headers, proto-type table, trailers)  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The core is sans-IO and single-threaded: each [`Transmitter::encap`],
//! [`Transmitter::pack`] or [`Receiver::deencap`] call runs to completion
//! and mutates only the fragment-ID context it touches. All buffers are
//! preallocated at construction; the hot path does not allocate.
//!
//! ## Example
//!
//! ```
//! use rle::{RleConfig, Transmitter, Receiver};
//!
//! let config = RleConfig::default();
//! let mut tx = Transmitter::new(config.clone()).unwrap();
//! let mut rx = Receiver::new(config).unwrap();
//!
//! tx.encap(0, b"hello over the return link", 0x0800).unwrap();
//! let ppdu = tx.pack(0, 64).unwrap();
//! let (frag_id, sdu, proto_type) = rx.deencap(ppdu.as_bytes()).unwrap().unwrap();
//!
//! assert_eq!(frag_id, 0);
//! assert_eq!(sdu.as_ref(), b"hello over the return link");
//! assert_eq!(proto_type, 0x0800);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod context;
pub mod error;
pub mod stats;
pub mod wire;

mod rx;
mod tx;

pub use error::{ConfigError, DeencapError, EncapError, PackError};
pub use rx::Receiver;
pub use stats::Stats;
pub use tx::{Ppdu, Transmitter};

/// Maximum SDU size accepted for encapsulation, in bytes.
pub const MAX_SDU_SIZE: usize = 4088;

/// Maximum ALPDU size: a 3-byte escaped protocol-type field plus a
/// maximum SDU plus a 4-byte CRC-32 trailer, which is also the ceiling of
/// the 12-bit total-length field in START headers.
pub const MAX_ALPDU_SIZE: usize = 4095;

/// Number of independent fragment-ID contexts per link.
pub const FRAG_ID_COUNT: usize = 8;

/// Ceiling of the 11-bit PPDU body-length field.
pub const MAX_PPDU_BODY: usize = 2047;

/// Uncompressed protocol type of signalling SDUs.
pub const SIGNAL_PROTO_TYPE: u16 = 0x0082;

/// Link-wide configuration, fixed once a [`Transmitter`] or [`Receiver`]
/// is constructed. Both ends of a link must agree on every field.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RleConfig {
    /// Default Ethertype of the link. When [`use_ptype_omission`] is set
    /// and an SDU's protocol type matches, the ALPDU protocol-type field
    /// is elided and the receiver restores it from its own configuration.
    ///
    /// [`use_ptype_omission`]: RleConfig::use_ptype_omission
    pub implicit_proto_type: u16,
    /// Trailer mode: `true` appends a CRC-32 over the SDU to every ALPDU;
    /// `false` appends a running sequence byte to each CONT/END PPDU.
    pub use_alpdu_crc: bool,
    /// Encode well-known protocol types as 1-byte compressed codes;
    /// unknown types escape to the uncompressed form.
    pub use_compressed_ptype: bool,
    /// Elide the protocol-type field when it equals the implicit default.
    pub use_ptype_omission: bool,
}

impl Default for RleConfig {
    fn default() -> Self {
        Self {
            implicit_proto_type: 0x0800, // IPv4
            use_alpdu_crc: false,
            use_compressed_ptype: false,
            use_ptype_omission: false,
        }
    }
}

impl RleConfig {
    /// Check the configuration for combinations the protocol reserves.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.implicit_proto_type == wire::ptype::VLAN_COMP_WO_PTYPE_FIELD as u16 {
            return Err(ConfigError::UnsupportedImplicitPtype(
                self.implicit_proto_type,
            ));
        }
        Ok(())
    }
}
