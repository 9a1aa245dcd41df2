//! Length-preserving decoder, round-trip textual format, and flow
//! correlator for captured SNMP traffic (v1, v2c and v3/USM).
//!
//! The pipeline, leaves first: [`ber`] parses one BER tag-length-value
//! triple at a time; [`decode`] drives it through the SNMP grammar
//! into the [`model::Packet`] tree; [`text`] serializes that tree to
//! and from a round-trippable textual form; [`filter`] clears selected
//! fields by name; [`flow`] correlates requests with responses and
//! demultiplexes packets into per-flow files; [`csv`] renders one
//! summary line per packet.

pub mod ber;
pub mod csv;
pub mod decode;
pub mod error;
pub mod filter;
pub mod flow;
pub mod model;
pub mod sink;
pub mod text;

pub use decode::{decode_message, decode_packet};
pub use model::{Packet, PduKind, SnmpMessage};
pub use sink::Sink;
