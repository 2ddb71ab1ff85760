//! Protocol-type compression table.
//!
//! Maps between 16-bit Ethertype/LLC values and the 7-bit compressed
//! codes of the RLE ALPDU protocol-type field, and classifies the
//! signalling and VLAN special cases. The table is closed: unknown types
//! escape to the uncompressed form behind [`UNCOMPRESSED_ESCAPE`].

/// Escape code: the compressed field carries `0xFF` followed by the full
/// 16-bit uncompressed value.
pub const UNCOMPRESSED_ESCAPE: u8 = 0xFF;

/// Reserved code for a compressed VLAN ALPDU without a protocol-type
/// field. Not supported: never produced, never decompressed, and rejected
/// as an implicit protocol type at construction.
pub const VLAN_COMP_WO_PTYPE_FIELD: u8 = 0x31;

/// Compressed code of the signalling protocol type.
pub const SIGNAL_COMP: u8 = 0x42;

/// One row of the compression table.
struct PtypeEntry {
    uncompressed: u16,
    compressed: u8,
    /// May be elided when it equals the link's implicit default.
    omissible: bool,
    /// VLAN frame whose payload carries a secondary protocol header.
    vlan_secondary: bool,
}

/// Well-known protocol types. Codes 0x31 and 0xFF are reserved and never
/// appear in the `compressed` column.
static PTYPE_TABLE: &[PtypeEntry] = &[
    PtypeEntry { uncompressed: 0x0800, compressed: 0x0D, omissible: true, vlan_secondary: false }, // IPv4
    PtypeEntry { uncompressed: 0x86DD, compressed: 0x11, omissible: true, vlan_secondary: false }, // IPv6
    PtypeEntry { uncompressed: 0x0806, compressed: 0x0E, omissible: true, vlan_secondary: false }, // ARP
    PtypeEntry { uncompressed: 0x8035, compressed: 0x1E, omissible: false, vlan_secondary: false }, // RARP
    PtypeEntry { uncompressed: 0x8100, compressed: 0x0F, omissible: true, vlan_secondary: true },  // 802.1Q VLAN
    PtypeEntry { uncompressed: 0x88A8, compressed: 0x19, omissible: true, vlan_secondary: true },  // 802.1ad QinQ
    PtypeEntry { uncompressed: 0x8847, compressed: 0x15, omissible: false, vlan_secondary: false }, // MPLS unicast
    PtypeEntry { uncompressed: 0x8848, compressed: 0x16, omissible: false, vlan_secondary: false }, // MPLS multicast
    PtypeEntry { uncompressed: 0x8863, compressed: 0x20, omissible: false, vlan_secondary: false }, // PPPoE discovery
    PtypeEntry { uncompressed: 0x8864, compressed: 0x21, omissible: false, vlan_secondary: false }, // PPPoE session
    PtypeEntry { uncompressed: 0x888E, compressed: 0x23, omissible: false, vlan_secondary: false }, // EAPOL
    PtypeEntry { uncompressed: 0x88CC, compressed: 0x26, omissible: false, vlan_secondary: false }, // LLDP
    PtypeEntry { uncompressed: 0x88F7, compressed: 0x27, omissible: false, vlan_secondary: false }, // PTP
    PtypeEntry {
        uncompressed: crate::SIGNAL_PROTO_TYPE,
        compressed: SIGNAL_COMP,
        omissible: true,
        vlan_secondary: false,
    },
];

fn lookup(proto_type: u16) -> Option<&'static PtypeEntry> {
    PTYPE_TABLE.iter().find(|e| e.uncompressed == proto_type)
}

/// Compressed code for `proto_type`, or `None` when the type is not in
/// the table and must be carried uncompressed behind the escape code.
pub fn compress(proto_type: u16) -> Option<u8> {
    lookup(proto_type).map(|e| e.compressed)
}

/// Uncompressed value for a compressed code, or `None` for unknown or
/// reserved codes.
pub fn decompress(code: u8) -> Option<u16> {
    PTYPE_TABLE
        .iter()
        .find(|e| e.compressed == code)
        .map(|e| e.uncompressed)
}

/// Whether `proto_type` belongs to the omissible set. Actual elision also
/// requires the configuration to permit omission and the type to equal
/// the implicit default.
pub fn is_omissible(proto_type: u16) -> bool {
    lookup(proto_type).is_some_and(|e| e.omissible)
}

/// Whether `proto_type` is the signalling protocol type.
pub fn is_signal(proto_type: u16) -> bool {
    proto_type == crate::SIGNAL_PROTO_TYPE
}

/// Whether `proto_type` is a VLAN type whose payload carries a secondary
/// protocol header.
pub fn vlan_has_secondary(proto_type: u16) -> bool {
    lookup(proto_type).is_some_and(|e| e.vlan_secondary)
}
