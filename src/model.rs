//! The decoded packet tree (§3): presence metadata, leaf types, and the
//! `SnmpMessage`/`Pdu`/`VarBind` structure every other module fills in or
//! reads back out.
//!
//! Every leaf is a [`Leaf<T>`] pairing an optional decoded value with its
//! [`Attr`] (byte/value length metadata). The three presence bits the
//! format documentation describes — `value_present`, `blen_present`,
//! `vlen_present` — are just `Option::is_some()` on `value`, `attr.blen`
//! and `attr.vlen` respectively; there is no separate bool to keep in
//! sync.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Byte-length (`blen`) and value-length (`vlen`) metadata for one BER
/// element. Independently absent from each other and from the value
/// they describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attr {
    pub blen: Option<usize>,
    pub vlen: Option<usize>,
}

impl Attr {
    pub const fn absent() -> Self {
        Attr {
            blen: None,
            vlen: None,
        }
    }

    pub const fn new(blen: usize, vlen: usize) -> Self {
        Attr {
            blen: Some(blen),
            vlen: Some(vlen),
        }
    }
}

/// A decoded or supplied value together with its presence metadata.
///
/// `value.is_none()` with `attr.blen`/`attr.vlen` set describes a
/// known-present placeholder whose content was filtered out (§4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf<T> {
    pub attr: Attr,
    pub value: Option<T>,
}

impl<T> Leaf<T> {
    pub fn value_present(&self) -> bool {
        self.value.is_some()
    }

    pub fn absent() -> Self {
        Leaf {
            attr: Attr::absent(),
            value: None,
        }
    }

    /// A value decoded on the wire, with both lengths known.
    pub fn new(value: T, blen: usize, vlen: usize) -> Self {
        Leaf {
            attr: Attr::new(blen, vlen),
            value: Some(value),
        }
    }

    /// A value supplied out of band (e.g. by the textual reader when
    /// no `blen`/`vlen` attribute was present).
    pub fn present(value: T) -> Self {
        Leaf {
            attr: Attr::absent(),
            value: Some(value),
        }
    }

    /// A placeholder: structurally present, value cleared by a filter
    /// or by a value that failed to parse back from text.
    pub fn placeholder(attr: Attr) -> Self {
        Leaf { attr, value: None }
    }

    pub fn clear_value(&mut self) {
        self.value = None;
    }
}

impl<T> Default for Leaf<T> {
    fn default() -> Self {
        Leaf::absent()
    }
}

pub type Int32Leaf = Leaf<i32>;
pub type Uint32Leaf = Leaf<u32>;
pub type Uint64Leaf = Leaf<u64>;
pub type OctetStringLeaf = Leaf<Vec<u8>>;
pub type OidLeaf = Leaf<Vec<u32>>;
pub type NullLeaf = Leaf<()>;
pub type Ipv4Leaf = Leaf<Ipv4Addr>;
pub type Ipv6Leaf = Leaf<Ipv6Addr>;

/// One of the two address families a packet endpoint may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::V4(a) => write!(f, "{a}"),
            Address::V6(a) => write!(f, "{a}"),
        }
    }
}

/// A source or destination endpoint. Exactly one address family per
/// endpoint, enforced by the enum rather than by a pair of presence
/// flags over two optional slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub address: Address,
    pub port: u16,
}

impl Endpoint {
    pub fn v4(addr: Ipv4Addr, port: u16) -> Self {
        Endpoint {
            address: Address::V4(addr),
            port,
        }
    }

    pub fn v6(addr: Ipv6Addr, port: u16) -> Self {
        Endpoint {
            address: Address::V6(addr),
            port,
        }
    }
}

/// The kind of operation a PDU carries. Doubles as the authoritative
/// mapping to and from the textual format's element names (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PduKind {
    Get,
    GetNext,
    GetBulk,
    Set,
    Response,
    Trap1,
    Trap2,
    Inform,
    Report,
}

impl PduKind {
    pub const fn element_name(self) -> &'static str {
        match self {
            PduKind::Get => "get-request",
            PduKind::GetNext => "get-next-request",
            PduKind::GetBulk => "get-bulk-request",
            PduKind::Set => "set-request",
            PduKind::Response => "response",
            PduKind::Trap1 => "trap",
            PduKind::Trap2 => "trap2",
            PduKind::Inform => "inform",
            PduKind::Report => "report",
        }
    }

    pub fn from_element_name(name: &str) -> Option<PduKind> {
        Some(match name {
            "get-request" => PduKind::Get,
            "get-next-request" => PduKind::GetNext,
            "get-bulk-request" => PduKind::GetBulk,
            "set-request" => PduKind::Set,
            "response" => PduKind::Response,
            "trap" => PduKind::Trap1,
            "trap2" => PduKind::Trap2,
            "inform" => PduKind::Inform,
            "report" => PduKind::Report,
            _ => return None,
        })
    }

    /// Legal under SNMPv1. Only `Trap1` is v1-exclusive; `GetBulk`,
    /// `Inform`, `Trap2` and `Report` were introduced by v2c/v3.
    pub const fn legal_in_v1(self) -> bool {
        !matches!(self, PduKind::GetBulk | PduKind::Inform | PduKind::Trap2 | PduKind::Report)
    }
}

/// Fields shared by every PDU kind except `Trap1`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenericPdu {
    pub request_id: Int32Leaf,
    pub error_status: Int32Leaf,
    pub error_index: Int32Leaf,
    pub varbinds: Vec<VarBind>,
}

/// The SNMPv1 trap PDU, structurally distinct from every other kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trap1Pdu {
    pub enterprise: OidLeaf,
    pub agent_addr: Ipv4Leaf,
    pub generic_trap: Int32Leaf,
    pub specific_trap: Int32Leaf,
    pub time_stamp: Uint32Leaf,
    pub varbinds: Vec<VarBind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pdu {
    Get(GenericPdu),
    GetNext(GenericPdu),
    GetBulk(GenericPdu),
    Set(GenericPdu),
    Response(GenericPdu),
    Trap1(Trap1Pdu),
    Trap2(GenericPdu),
    Inform(GenericPdu),
    Report(GenericPdu),
}

impl Pdu {
    pub const fn kind(&self) -> PduKind {
        match self {
            Pdu::Get(_) => PduKind::Get,
            Pdu::GetNext(_) => PduKind::GetNext,
            Pdu::GetBulk(_) => PduKind::GetBulk,
            Pdu::Set(_) => PduKind::Set,
            Pdu::Response(_) => PduKind::Response,
            Pdu::Trap1(_) => PduKind::Trap1,
            Pdu::Trap2(_) => PduKind::Trap2,
            Pdu::Inform(_) => PduKind::Inform,
            Pdu::Report(_) => PduKind::Report,
        }
    }

    /// The shared fields, for every kind but `Trap1`.
    pub fn generic(&self) -> Option<&GenericPdu> {
        match self {
            Pdu::Trap1(_) => None,
            Pdu::Get(p)
            | Pdu::GetNext(p)
            | Pdu::GetBulk(p)
            | Pdu::Set(p)
            | Pdu::Response(p)
            | Pdu::Trap2(p)
            | Pdu::Inform(p)
            | Pdu::Report(p) => Some(p),
        }
    }

    /// The shared fields, mutable, for every kind but `Trap1`.
    pub fn generic_mut(&mut self) -> Option<&mut GenericPdu> {
        match self {
            Pdu::Trap1(_) => None,
            Pdu::Get(p)
            | Pdu::GetNext(p)
            | Pdu::GetBulk(p)
            | Pdu::Set(p)
            | Pdu::Response(p)
            | Pdu::Trap2(p)
            | Pdu::Inform(p)
            | Pdu::Report(p) => Some(p),
        }
    }

    pub fn varbinds(&self) -> &[VarBind] {
        match self {
            Pdu::Trap1(t) => &t.varbinds,
            other => other
                .generic()
                .map(|g| g.varbinds.as_slice())
                .unwrap_or(&[]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub name: OidLeaf,
    pub value: VarBindValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarBindValue {
    Null(NullLeaf),
    Int32(Int32Leaf),
    Uint32(Uint32Leaf),
    Uint64(Uint64Leaf),
    IpAddr(Ipv4Leaf),
    Octets(OctetStringLeaf),
    Oid(OidLeaf),
    NoSuchObject(Attr),
    NoSuchInstance(Attr),
    EndOfMibView(Attr),
}

/// RFC 3414 `UsmSecurityParameters`, present only for SNMPv3/USM
/// messages. Authentication and privacy parameters are carried
/// opaquely: this crate reads them but does not verify or decrypt
/// (§1 Non-goals).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UsmHeader {
    pub auth_engine_id: OctetStringLeaf,
    pub auth_engine_boots: Uint32Leaf,
    pub auth_engine_time: Uint32Leaf,
    pub user: OctetStringLeaf,
    pub auth_params: OctetStringLeaf,
    pub priv_params: OctetStringLeaf,
}

/// The SNMPv3 message header (`HeaderData` plus the USM security
/// parameters), present only when `version == 3`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct V3Envelope {
    pub msg_id: Int32Leaf,
    pub msg_max_size: Int32Leaf,
    /// A single octet; see `reportable`/`is_authenticated`/`is_encrypted`.
    pub msg_flags: OctetStringLeaf,
    pub msg_security_model: Int32Leaf,
    pub usm: Option<UsmHeader>,
}

impl V3Envelope {
    fn flag_bit(&self, mask: u8) -> bool {
        self.msg_flags
            .value
            .as_ref()
            .and_then(|v| v.first())
            .map(|b| b & mask != 0)
            .unwrap_or(false)
    }

    pub fn reportable(&self) -> bool {
        self.flag_bit(0x01)
    }

    pub fn is_encrypted(&self) -> bool {
        self.flag_bit(0x02)
    }

    pub fn is_authenticated(&self) -> bool {
        self.flag_bit(0x04)
    }
}

/// The SNMPv3 `ScopedPDU`, or the bare PDU for v1/v2c (with both
/// context fields absent).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScopedPdu {
    pub context_engine_id: OctetStringLeaf,
    pub context_name: OctetStringLeaf,
    pub pdu: Option<Pdu>,
}

/// The decoded SNMP message, independent of the version that produced
/// it: `community` is populated for v1/v2c, `v3` for v3 (§3).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SnmpMessage {
    /// The outer SEQUENCE's on-the-wire byte length, i.e. the whole
    /// message's `blen`. Not part of the grammar proper (§3 models
    /// `blen`/`vlen` per-field), but every consumer downstream of the
    /// decoder — the CSV writer in particular — needs the message's
    /// total size, so the decoder records it here once.
    pub blen: Option<usize>,
    pub version: Int32Leaf,
    pub community: OctetStringLeaf,
    pub v3: Option<V3Envelope>,
    pub scoped_pdu: ScopedPdu,
}

impl SnmpMessage {
    pub fn pdu(&self) -> Option<&Pdu> {
        self.scoped_pdu.pdu.as_ref()
    }
}

/// One captured packet: arrival time, endpoints, and the decoded
/// message (or as much of it as could be decoded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub ts_sec: u32,
    pub ts_usec: u32,
    pub src: Endpoint,
    pub dst: Endpoint,
    pub message: SnmpMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_presence_is_independent() {
        let placeholder: OctetStringLeaf = Leaf::placeholder(Attr::new(8, 6));
        assert!(!placeholder.value_present());
        assert_eq!(placeholder.attr.blen, Some(8));
        assert_eq!(placeholder.attr.vlen, Some(6));
    }

    #[test]
    fn pdu_kind_round_trips_through_element_name() {
        for kind in [
            PduKind::Get,
            PduKind::GetNext,
            PduKind::GetBulk,
            PduKind::Set,
            PduKind::Response,
            PduKind::Trap1,
            PduKind::Trap2,
            PduKind::Inform,
            PduKind::Report,
        ] {
            let name = kind.element_name();
            assert_eq!(PduKind::from_element_name(name), Some(kind));
        }
    }

    #[test]
    fn trap1_illegal_outside_v1_peers() {
        assert!(PduKind::Trap1.legal_in_v1());
        assert!(!PduKind::GetBulk.legal_in_v1());
        assert!(!PduKind::Inform.legal_in_v1());
        assert!(!PduKind::Trap2.legal_in_v1());
        assert!(!PduKind::Report.legal_in_v1());
    }

    #[test]
    fn msg_flags_bits() {
        let mut env = V3Envelope::default();
        env.msg_flags = Leaf::present(vec![0x05]);
        assert!(env.reportable());
        assert!(!env.is_encrypted());
        assert!(env.is_authenticated());
    }
}
