//! Emits the textual format (§4.3), grounded on the original
//! implementation's `xml-write.c`: one function per element, each
//! writing its own open tag (with `blen`/`vlen` attributes when
//! present), content, and close tag.

use std::io::{self, Write};

use crate::model::*;
use crate::sink::Sink;

/// Writes the `snmptrace` document format.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextWriter;

impl Sink for TextWriter {
    fn write_begin(&self, out: &mut dyn io::Write) -> io::Result<()> {
        writeln!(out, "<?xml version=\"1.0\"?>")?;
        writeln!(out, "<snmptrace>")
    }

    fn write_packet(&self, out: &mut dyn io::Write, packet: &Packet) -> io::Result<()> {
        write_packet(out, packet)
    }

    fn write_end(&self, out: &mut dyn io::Write) -> io::Result<()> {
        writeln!(out, "</snmptrace>")
    }
}

fn write_attr(out: &mut dyn io::Write, attr: Attr) -> io::Result<()> {
    if let Some(blen) = attr.blen {
        write!(out, " blen=\"{blen}\"")?;
    }
    if let Some(vlen) = attr.vlen {
        write!(out, " vlen=\"{vlen}\"")?;
    }
    Ok(())
}

fn write_open(out: &mut dyn io::Write, name: &str, attr: Attr) -> io::Result<()> {
    write!(out, "<{name}")?;
    write_attr(out, attr)?;
    write!(out, ">")
}

fn write_close(out: &mut dyn io::Write, name: &str) -> io::Result<()> {
    write!(out, "</{name}>")
}

/// Null and the three exception markers carry no content; they are
/// always self-closing regardless of presence.
fn write_empty(out: &mut dyn io::Write, name: &str, attr: Attr) -> io::Result<()> {
    write!(out, "<{name}")?;
    write_attr(out, attr)?;
    write!(out, "/>")
}

fn write_decimal<T: std::fmt::Display>(
    out: &mut dyn io::Write,
    name: &str,
    leaf: &Leaf<T>,
) -> io::Result<()> {
    write_open(out, name, leaf.attr)?;
    if let Some(v) = &leaf.value {
        write!(out, "{v}")?;
    }
    write_close(out, name)
}

fn write_hex(out: &mut dyn io::Write, name: &str, leaf: &OctetStringLeaf) -> io::Result<()> {
    write_open(out, name, leaf.attr)?;
    if let Some(bytes) = &leaf.value {
        write!(out, "{}", hex::encode(bytes))?;
    }
    write_close(out, name)
}

fn write_oid(out: &mut dyn io::Write, name: &str, leaf: &OidLeaf) -> io::Result<()> {
    write_open(out, name, leaf.attr)?;
    if let Some(ids) = &leaf.value {
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                write!(out, ".")?;
            }
            write!(out, "{id}")?;
        }
    }
    write_close(out, name)
}

fn write_ipv4(out: &mut dyn io::Write, name: &str, leaf: &Ipv4Leaf) -> io::Result<()> {
    write_open(out, name, leaf.attr)?;
    if let Some(addr) = &leaf.value {
        write!(out, "{addr}")?;
    }
    write_close(out, name)
}

fn write_varbind(out: &mut dyn io::Write, vb: &VarBind) -> io::Result<()> {
    write_open(out, "varbind", Attr::absent())?;
    write_oid(out, "name", &vb.name)?;
    match &vb.value {
        VarBindValue::Null(l) => write_empty(out, "null", l.attr)?,
        VarBindValue::Int32(l) => write_decimal(out, "integer32", l)?,
        VarBindValue::Uint32(l) => write_decimal(out, "unsigned32", l)?,
        VarBindValue::Uint64(l) => write_decimal(out, "unsigned64", l)?,
        VarBindValue::IpAddr(l) => write_ipv4(out, "ipaddress", l)?,
        VarBindValue::Octets(l) => write_hex(out, "octet-string", l)?,
        VarBindValue::Oid(l) => write_oid(out, "object-identifier", l)?,
        VarBindValue::NoSuchObject(attr) => write_empty(out, "no-such-object", *attr)?,
        VarBindValue::NoSuchInstance(attr) => write_empty(out, "no-such-instance", *attr)?,
        VarBindValue::EndOfMibView(attr) => write_empty(out, "end-of-mib-view", *attr)?,
    }
    write_close(out, "varbind")
}

fn write_varbindlist(out: &mut dyn io::Write, varbinds: &[VarBind]) -> io::Result<()> {
    write_open(out, "variable-bindings", Attr::absent())?;
    for vb in varbinds {
        write_varbind(out, vb)?;
    }
    write_close(out, "variable-bindings")
}

fn write_generic_pdu(out: &mut dyn io::Write, name: &str, pdu: &GenericPdu) -> io::Result<()> {
    write_open(out, name, Attr::absent())?;
    write_decimal(out, "request-id", &pdu.request_id)?;
    write_decimal(out, "error-status", &pdu.error_status)?;
    write_decimal(out, "error-index", &pdu.error_index)?;
    write_varbindlist(out, &pdu.varbinds)?;
    write_close(out, name)
}

fn write_trap1(out: &mut dyn io::Write, trap: &Trap1Pdu) -> io::Result<()> {
    write_open(out, "trap", Attr::absent())?;
    write_oid(out, "enterprise", &trap.enterprise)?;
    write_ipv4(out, "agent-addr", &trap.agent_addr)?;
    write_decimal(out, "generic-trap", &trap.generic_trap)?;
    write_decimal(out, "specific-trap", &trap.specific_trap)?;
    write_decimal(out, "time-stamp", &trap.time_stamp)?;
    write_varbindlist(out, &trap.varbinds)?;
    write_close(out, "trap")
}

fn write_pdu(out: &mut dyn io::Write, pdu: &Pdu) -> io::Result<()> {
    match pdu {
        Pdu::Trap1(trap) => write_trap1(out, trap),
        other => write_generic_pdu(out, other.kind().element_name(), other.generic().unwrap()),
    }
}

fn write_scoped_pdu(out: &mut dyn io::Write, scoped: &ScopedPdu) -> io::Result<()> {
    write_open(out, "scoped-pdu", Attr::absent())?;
    write_hex(out, "context-engine-id", &scoped.context_engine_id)?;
    write_hex(out, "context-name", &scoped.context_name)?;
    if let Some(pdu) = &scoped.pdu {
        write_pdu(out, pdu)?;
    }
    write_close(out, "scoped-pdu")
}

fn write_usm(out: &mut dyn io::Write, usm: &UsmHeader) -> io::Result<()> {
    write_open(out, "usm", Attr::absent())?;
    write_hex(out, "auth-engine-id", &usm.auth_engine_id)?;
    write_decimal(out, "auth-engine-boots", &usm.auth_engine_boots)?;
    write_decimal(out, "auth-engine-time", &usm.auth_engine_time)?;
    write_hex(out, "user", &usm.user)?;
    write_hex(out, "auth-params", &usm.auth_params)?;
    write_hex(out, "priv-params", &usm.priv_params)?;
    write_close(out, "usm")
}

fn write_message(out: &mut dyn io::Write, v3: &V3Envelope) -> io::Result<()> {
    write_open(out, "message", Attr::absent())?;
    write_decimal(out, "msg-id", &v3.msg_id)?;
    write_decimal(out, "max-size", &v3.msg_max_size)?;
    write_hex(out, "flags", &v3.msg_flags)?;
    write_decimal(out, "security-model", &v3.msg_security_model)?;
    write_close(out, "message")
}

fn write_snmp(out: &mut dyn io::Write, message: &SnmpMessage) -> io::Result<()> {
    let attr = Attr {
        blen: message.blen,
        vlen: None,
    };
    write_open(out, "snmp", attr)?;
    if message.version.value_present() {
        write_decimal(out, "version", &message.version)?;
        match message.version.value {
            Some(0) | Some(1) => {
                write_hex(out, "community", &message.community)?;
                if let Some(pdu) = message.pdu() {
                    write_pdu(out, pdu)?;
                }
            }
            Some(3) => {
                if let Some(v3) = &message.v3 {
                    write_message(out, v3)?;
                    if let Some(usm) = &v3.usm {
                        write_usm(out, usm)?;
                    }
                }
                write_scoped_pdu(out, &message.scoped_pdu)?;
            }
            _ => {}
        }
    }
    write_close(out, "snmp")
}

fn write_endpoint(out: &mut dyn io::Write, name: &str, endpoint: &Endpoint) -> io::Result<()> {
    write!(out, "<{name} ip=\"{}\" port=\"{}\"/>", endpoint.address, endpoint.port)
}

fn write_packet(out: &mut dyn io::Write, packet: &Packet) -> io::Result<()> {
    write!(out, "<packet sec=\"{}\" usec=\"{}\">", packet.ts_sec, packet.ts_usec)?;
    write_endpoint(out, "src", &packet.src)?;
    write_endpoint(out, "dst", &packet.dst)?;
    write_snmp(out, &packet.message)?;
    writeln!(out, "</packet>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_message;

    const V2C_GET: [u8; 43] = [
        0x30, 0x29, 0x02, 0x01, 0x01, 0x04, 0x06, 0x70, 0x75, 0x62, 0x6c, 0x69, 0x63, 0xa0, 0x1c,
        0x02, 0x04, 0x12, 0x34, 0x56, 0x78, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30, 0x0e, 0x30,
        0x0c, 0x06, 0x08, 0x2b, 0x06, 0x01, 0x02, 0x01, 0x01, 0x03, 0x00, 0x05, 0x00,
    ];

    #[test]
    fn writes_request_id_and_community_in_canonical_form() {
        let message = decode_message(&V2C_GET, true).unwrap();
        let packet = Packet {
            ts_sec: 1000,
            ts_usec: 0,
            src: Endpoint::v4("127.0.0.1".parse().unwrap(), 44100),
            dst: Endpoint::v4("127.0.0.1".parse().unwrap(), 161),
            message,
        };
        let mut buf = Vec::new();
        write_packet(&mut buf, &packet).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("<community>7075626c6963</community>"));
        assert!(text.contains("<request-id>305419896</request-id>"));
        assert!(text.contains("<object-identifier>1.3.6.1.2.1.1.3.0</object-identifier>"));
        assert!(text.contains("<null/>"));
    }

    #[test]
    fn document_bracket_is_written_once() {
        let writer = TextWriter;
        let mut buf = Vec::new();
        writer.write_begin(&mut buf).unwrap();
        writer.write_end(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "<?xml version=\"1.0\"?>\n<snmptrace>\n</snmptrace>\n");
    }
}
