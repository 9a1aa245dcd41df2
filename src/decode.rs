//! Drives the BER primitive parser (`crate::ber`) top-down through the
//! SNMP message grammar, filling in a `crate::model::Packet` and
//! recording `blen`/`vlen` on every node (§4.2).
//!
//! Every `expect_tag` check is a grammar-position assertion: on
//! mismatch it raises `BerError::UnexpectedTag` and the caller decides
//! whether that abandons just the current subtree or the whole
//! message, per §7's disposition table.

use crate::ber::{self, Framed, Payload};
use crate::error::{BerError, Form, SnmpError, Tag, TagClass};
use crate::model::*;

/// Decode one captured UDP payload into a `Packet`. Never fails: a
/// malformed message demotes the affected subtree to "not present"
/// (logged at `warn`) rather than aborting, per the pipeline's
/// failure-containment rule (§5). `truncated` defaults to `true` for
/// live/snaplen-limited captures; pass `false` when the buffer is
/// already known complete.
pub fn decode_packet(
    ts_sec: u32,
    ts_usec: u32,
    src: Endpoint,
    dst: Endpoint,
    payload: &[u8],
    truncated: bool,
) -> Packet {
    let message = match decode_message(payload, truncated) {
        Ok(msg) => msg,
        Err(err) => {
            // Only the outermost framing (the SEQUENCE tag or the
            // version field itself) can fail to the point nothing
            // useful was decoded; every later grammar position keeps
            // whatever envelope fields were already filled in instead
            // of propagating an error here (§5, §7).
            log::warn!("dropping malformed SNMP message: {err}");
            SnmpMessage::default()
        }
    };
    Packet {
        ts_sec,
        ts_usec,
        src,
        dst,
        message,
    }
}

/// Decode one captured UDP payload into an `SnmpMessage`. Only fails
/// when the outer SEQUENCE or the version field cannot be framed at
/// all; an unsupported version, a version/PDU mismatch, or a malformed
/// PDU body is absorbed into the returned message instead, leaving the
/// envelope fields already decoded (`version`, `community`, the v3
/// envelope/USM header, scoped-PDU context fields) in place and the
/// PDU absent (§5, §7's `VersionMismatch`/`UnsupportedVersion` row).
pub fn decode_message(payload: &[u8], truncated: bool) -> Result<SnmpMessage, SnmpError> {
    let (outer_consumed, outer) = ber::parse_framing(payload, truncated)?;
    expect_tag(outer.tag, TagClass::Universal, Form::Constructed, 16)?;
    let body = outer.content;

    let (c1, ver_framed) = ber::parse_framing(body, truncated)?;
    expect_tag(ver_framed.tag, TagClass::Universal, Form::Primitive, 2)?;
    let version_leaf = int32_leaf(&ver_framed, c1);
    let rest = &body[c1..];

    let mut message = SnmpMessage {
        blen: Some(outer_consumed),
        version: version_leaf,
        ..SnmpMessage::default()
    };

    let Some(version) = message.version.value else {
        log::warn!("version field failed to decode, leaving rest of envelope absent");
        return Ok(message);
    };

    let body_result = match version {
        0 | 1 => decode_community_message(&mut message, version, rest, truncated),
        3 => decode_v3_message(&mut message, rest, truncated),
        other => Err(SnmpError::UnsupportedVersion(other)),
    };
    if let Err(err) = body_result {
        log::warn!("abandoning PDU, keeping decoded envelope: {err}");
    }
    Ok(message)
}

fn expect_tag(tag: Tag, class: TagClass, form: Form, id: u32) -> Result<(), BerError> {
    if tag.class == class && tag.form == form && tag.id == id {
        Ok(())
    } else {
        Err(BerError::UnexpectedTag {
            expected: Tag::new(class, form, id),
            got: tag,
        })
    }
}

fn int32_leaf(framed: &Framed<'_>, consumed: usize) -> Int32Leaf {
    match ber::decode_payload(framed.tag, framed.content) {
        Ok(Payload::Integer(v)) => Leaf::new(v, consumed, framed.content_length),
        _ => {
            log::warn!("int32 leaf failed to decode, marking not present");
            Leaf::placeholder(Attr::new(consumed, framed.content_length))
        }
    }
}

/// An unsigned value read from a plain universal `INTEGER` (msg-id,
/// max-size, security-model, auth-engine-boots, auth-engine-time are
/// all non-negative `INTEGER`s in their RFCs, not application-tagged
/// counters).
fn uint32_leaf_from_integer(framed: &Framed<'_>, consumed: usize) -> Uint32Leaf {
    match ber::decode_payload(framed.tag, framed.content) {
        Ok(Payload::Integer(v)) if v >= 0 => Leaf::new(v as u32, consumed, framed.content_length),
        _ => {
            log::warn!("unsigned integer leaf failed to decode, marking not present");
            Leaf::placeholder(Attr::new(consumed, framed.content_length))
        }
    }
}

/// An unsigned value read from an application-tagged Counter32,
/// Gauge32 or TimeTicks varbind value.
fn uint32_leaf_from_application(framed: &Framed<'_>, consumed: usize) -> Uint32Leaf {
    match ber::decode_payload(framed.tag, framed.content) {
        Ok(Payload::Unsigned32(v)) => Leaf::new(v, consumed, framed.content_length),
        _ => {
            log::warn!("counter/gauge/timeticks leaf failed to decode, marking not present");
            Leaf::placeholder(Attr::new(consumed, framed.content_length))
        }
    }
}

fn uint64_leaf_from_application(framed: &Framed<'_>, consumed: usize) -> Uint64Leaf {
    match ber::decode_payload(framed.tag, framed.content) {
        Ok(Payload::Unsigned64(v)) => Leaf::new(v, consumed, framed.content_length),
        _ => {
            log::warn!("counter64 leaf failed to decode, marking not present");
            Leaf::placeholder(Attr::new(consumed, framed.content_length))
        }
    }
}

fn octet_string_leaf(framed: &Framed<'_>, consumed: usize) -> OctetStringLeaf {
    match ber::decode_payload(framed.tag, framed.content) {
        Ok(Payload::OctetString(s)) => Leaf::new(s.to_vec(), consumed, framed.content_length),
        _ => {
            log::warn!("octet string leaf failed to decode, marking not present");
            Leaf::placeholder(Attr::new(consumed, framed.content_length))
        }
    }
}

fn oid_leaf(framed: &Framed<'_>, consumed: usize) -> OidLeaf {
    match ber::decode_payload(framed.tag, framed.content) {
        Ok(Payload::Oid(ids)) => Leaf::new(ids, consumed, framed.content_length),
        _ => {
            log::warn!("OID leaf failed to decode, marking not present");
            Leaf::placeholder(Attr::new(consumed, framed.content_length))
        }
    }
}

fn ipv4_leaf(framed: &Framed<'_>, consumed: usize) -> Ipv4Leaf {
    match ber::decode_payload(framed.tag, framed.content) {
        Ok(Payload::IpAddress(octets)) => Leaf::new(octets.into(), consumed, framed.content_length),
        _ => {
            log::warn!("IpAddress leaf failed to decode, marking not present");
            Leaf::placeholder(Attr::new(consumed, framed.content_length))
        }
    }
}

fn pdu_kind_from_tag_id(id: u32) -> Result<PduKind, SnmpError> {
    Ok(match id {
        0 => PduKind::Get,
        1 => PduKind::GetNext,
        2 => PduKind::Response,
        3 => PduKind::Set,
        4 => PduKind::Trap1,
        5 => PduKind::GetBulk,
        6 => PduKind::Inform,
        7 => PduKind::Trap2,
        8 => PduKind::Report,
        other => {
            return Err(SnmpError::Ber(BerError::UnexpectedTag {
                expected: Tag::new(TagClass::Context, Form::Constructed, 0),
                got: Tag::new(TagClass::Context, Form::Constructed, other),
            }))
        }
    })
}

fn decode_community_message(
    message: &mut SnmpMessage,
    version: i32,
    buf: &[u8],
    truncated: bool,
) -> Result<(), SnmpError> {
    let (c1, comm_framed) = ber::parse_framing(buf, truncated)?;
    expect_tag(comm_framed.tag, TagClass::Universal, Form::Primitive, 4)?;
    message.community = octet_string_leaf(&comm_framed, c1);
    let rest = &buf[c1..];

    let (_, pdu_framed) = ber::parse_framing(rest, truncated)?;
    if pdu_framed.tag.class != TagClass::Context || pdu_framed.tag.form != Form::Constructed {
        return Err(SnmpError::Ber(BerError::UnexpectedTag {
            expected: Tag::new(TagClass::Context, Form::Constructed, 0),
            got: pdu_framed.tag,
        }));
    }
    let kind = pdu_kind_from_tag_id(pdu_framed.tag.id)?;
    let illegal_in_v1 = version == 0 && !kind.legal_in_v1();
    let trap1_outside_v1 = kind == PduKind::Trap1 && version != 0;
    if illegal_in_v1 || trap1_outside_v1 {
        return Err(SnmpError::VersionMismatch { version });
    }
    let pdu = decode_pdu_body(kind, pdu_framed.content, truncated)?;
    message.scoped_pdu = ScopedPdu {
        pdu: Some(pdu),
        ..ScopedPdu::default()
    };
    Ok(())
}

fn decode_pdu_body(kind: PduKind, content: &[u8], truncated: bool) -> Result<Pdu, SnmpError> {
    if kind == PduKind::Trap1 {
        return decode_trap1_body(content, truncated).map(Pdu::Trap1);
    }
    let generic = decode_generic_pdu_body(content, truncated)?;
    Ok(match kind {
        PduKind::Get => Pdu::Get(generic),
        PduKind::GetNext => Pdu::GetNext(generic),
        PduKind::GetBulk => Pdu::GetBulk(generic),
        PduKind::Set => Pdu::Set(generic),
        PduKind::Response => Pdu::Response(generic),
        PduKind::Trap2 => Pdu::Trap2(generic),
        PduKind::Inform => Pdu::Inform(generic),
        PduKind::Report => Pdu::Report(generic),
        PduKind::Trap1 => unreachable!("handled above"),
    })
}

fn decode_generic_pdu_body(buf: &[u8], truncated: bool) -> Result<GenericPdu, SnmpError> {
    let (c1, f1) = ber::parse_framing(buf, truncated)?;
    expect_tag(f1.tag, TagClass::Universal, Form::Primitive, 2)?;
    let request_id = int32_leaf(&f1, c1);
    let rest = &buf[c1..];

    let (c2, f2) = ber::parse_framing(rest, truncated)?;
    expect_tag(f2.tag, TagClass::Universal, Form::Primitive, 2)?;
    let error_status = int32_leaf(&f2, c2);
    let rest = &rest[c2..];

    let (c3, f3) = ber::parse_framing(rest, truncated)?;
    expect_tag(f3.tag, TagClass::Universal, Form::Primitive, 2)?;
    let error_index = int32_leaf(&f3, c3);
    let rest = &rest[c3..];

    let (_, f4) = ber::parse_framing(rest, truncated)?;
    expect_tag(f4.tag, TagClass::Universal, Form::Constructed, 16)?;
    let varbinds = decode_varbind_list(f4.content, truncated);

    Ok(GenericPdu {
        request_id,
        error_status,
        error_index,
        varbinds,
    })
}

fn decode_trap1_body(buf: &[u8], truncated: bool) -> Result<Trap1Pdu, SnmpError> {
    let (c1, f1) = ber::parse_framing(buf, truncated)?;
    expect_tag(f1.tag, TagClass::Universal, Form::Primitive, 6)?;
    let enterprise = oid_leaf(&f1, c1);
    let rest = &buf[c1..];

    let (c2, f2) = ber::parse_framing(rest, truncated)?;
    expect_tag(f2.tag, TagClass::Application, Form::Primitive, 0)?;
    let agent_addr = ipv4_leaf(&f2, c2);
    let rest = &rest[c2..];

    let (c3, f3) = ber::parse_framing(rest, truncated)?;
    expect_tag(f3.tag, TagClass::Universal, Form::Primitive, 2)?;
    let generic_trap = int32_leaf(&f3, c3);
    let rest = &rest[c3..];

    let (c4, f4) = ber::parse_framing(rest, truncated)?;
    expect_tag(f4.tag, TagClass::Universal, Form::Primitive, 2)?;
    let specific_trap = int32_leaf(&f4, c4);
    let rest = &rest[c4..];

    let (c5, f5) = ber::parse_framing(rest, truncated)?;
    expect_tag(f5.tag, TagClass::Application, Form::Primitive, 3)?;
    let time_stamp = uint32_leaf_from_application(&f5, c5);
    let rest = &rest[c5..];

    let (_, f6) = ber::parse_framing(rest, truncated)?;
    expect_tag(f6.tag, TagClass::Universal, Form::Constructed, 16)?;
    let varbinds = decode_varbind_list(f6.content, truncated);

    Ok(Trap1Pdu {
        enterprise,
        agent_addr,
        generic_trap,
        specific_trap,
        time_stamp,
        varbinds,
    })
}

/// Decodes the SEQUENCE OF varbind entries inside a varbind-list. A
/// malformed entry is skipped (logged at `warn`); the sequence
/// boundary is known, so later siblings are still attempted (§4.2).
fn decode_varbind_list(mut buf: &[u8], truncated: bool) -> Vec<VarBind> {
    let mut out = Vec::new();
    while !buf.is_empty() {
        let (consumed, framed) = match ber::parse_framing(buf, truncated) {
            Ok(v) => v,
            Err(err) => {
                log::warn!("abandoning remainder of varbind list: {err}");
                break;
            }
        };
        if framed.tag != Tag::new(TagClass::Universal, Form::Constructed, 16) {
            log::warn!("skipping malformed varbind entry: unexpected tag {}", framed.tag);
            buf = &buf[consumed..];
            continue;
        }
        match decode_varbind(framed.content, truncated) {
            Ok(vb) => out.push(vb),
            Err(err) => log::warn!("skipping malformed varbind entry: {err}"),
        }
        buf = &buf[consumed..];
    }
    out
}

fn decode_varbind(buf: &[u8], truncated: bool) -> Result<VarBind, SnmpError> {
    let (c1, name_framed) = ber::parse_framing(buf, truncated)?;
    expect_tag(name_framed.tag, TagClass::Universal, Form::Primitive, 6)?;
    let name = oid_leaf(&name_framed, c1);
    let rest = &buf[c1..];

    let (c2, val_framed) = ber::parse_framing(rest, truncated)?;
    let value = decode_varbind_value(&val_framed, c2);
    Ok(VarBind { name, value })
}

fn decode_varbind_value(framed: &Framed<'_>, consumed: usize) -> VarBindValue {
    use Form::*;
    use TagClass::*;
    let tag = framed.tag;
    match (tag.class, tag.form, tag.id) {
        (Universal, Primitive, 5) => {
            VarBindValue::Null(Leaf::new((), consumed, framed.content_length))
        }
        (Universal, Primitive, 2) => VarBindValue::Int32(int32_leaf(framed, consumed)),
        (Universal, Primitive, 4) => VarBindValue::Octets(octet_string_leaf(framed, consumed)),
        (Universal, Primitive, 6) => VarBindValue::Oid(oid_leaf(framed, consumed)),
        (Application, Primitive, 0) => VarBindValue::IpAddr(ipv4_leaf(framed, consumed)),
        (Application, Primitive, 1..=3) => {
            VarBindValue::Uint32(uint32_leaf_from_application(framed, consumed))
        }
        (Application, Primitive, 6) => {
            VarBindValue::Uint64(uint64_leaf_from_application(framed, consumed))
        }
        (Context, Primitive, 0) => VarBindValue::NoSuchObject(Attr::new(consumed, framed.content_length)),
        (Context, Primitive, 1) => {
            VarBindValue::NoSuchInstance(Attr::new(consumed, framed.content_length))
        }
        (Context, Primitive, 2) => VarBindValue::EndOfMibView(Attr::new(consumed, framed.content_length)),
        _ => {
            log::warn!("unrecognized varbind value tag {tag}, storing as octet string");
            VarBindValue::Octets(octet_string_leaf(framed, consumed))
        }
    }
}

fn decode_v3_message(message: &mut SnmpMessage, buf: &[u8], truncated: bool) -> Result<(), SnmpError> {
    let (c1, hdr_framed) = ber::parse_framing(buf, truncated)?;
    expect_tag(hdr_framed.tag, TagClass::Universal, Form::Constructed, 16)?;
    let mut envelope = decode_header_data(hdr_framed.content, truncated)?;
    let rest = &buf[c1..];

    let (c2, secp_framed) = ber::parse_framing(rest, truncated)?;
    expect_tag(secp_framed.tag, TagClass::Universal, Form::Primitive, 4)?;
    match ber::parse_framing(secp_framed.content, truncated) {
        Ok((_, usm_framed))
            if usm_framed.tag == Tag::new(TagClass::Universal, Form::Constructed, 16) =>
        {
            match decode_usm_header(usm_framed.content, truncated) {
                Ok(usm) => envelope.usm = Some(usm),
                Err(err) => log::warn!("failed to decode USM security parameters: {err}"),
            }
        }
        Ok((_, usm_framed)) => {
            log::warn!(
                "security parameters not a SEQUENCE (tag {}), skipping USM header",
                usm_framed.tag
            );
        }
        Err(err) => log::warn!("failed to parse security parameters framing: {err}"),
    }
    message.v3 = Some(envelope);
    let rest = &rest[c2..];

    if rest.is_empty() {
        return Ok(());
    }
    let (_, scoped_framed) = ber::parse_framing(rest, truncated)?;
    if scoped_framed.tag == Tag::new(TagClass::Universal, Form::Constructed, 16) {
        message.scoped_pdu = decode_scoped_pdu(scoped_framed.content, truncated)?;
    } else {
        log::warn!("encrypted scoped PDU is not supported, leaving PDU absent");
    }
    Ok(())
}

fn decode_header_data(buf: &[u8], truncated: bool) -> Result<V3Envelope, SnmpError> {
    let (c1, f1) = ber::parse_framing(buf, truncated)?;
    expect_tag(f1.tag, TagClass::Universal, Form::Primitive, 2)?;
    let msg_id = int32_leaf(&f1, c1);
    let rest = &buf[c1..];

    let (c2, f2) = ber::parse_framing(rest, truncated)?;
    expect_tag(f2.tag, TagClass::Universal, Form::Primitive, 2)?;
    let msg_max_size = int32_leaf(&f2, c2);
    let rest = &rest[c2..];

    let (c3, f3) = ber::parse_framing(rest, truncated)?;
    expect_tag(f3.tag, TagClass::Universal, Form::Primitive, 4)?;
    let msg_flags = octet_string_leaf(&f3, c3);
    let rest = &rest[c3..];

    let (c4, f4) = ber::parse_framing(rest, truncated)?;
    expect_tag(f4.tag, TagClass::Universal, Form::Primitive, 2)?;
    let msg_security_model = int32_leaf(&f4, c4);

    Ok(V3Envelope {
        msg_id,
        msg_max_size,
        msg_flags,
        msg_security_model,
        usm: None,
    })
}

fn decode_usm_header(buf: &[u8], truncated: bool) -> Result<UsmHeader, SnmpError> {
    let (c1, f1) = ber::parse_framing(buf, truncated)?;
    expect_tag(f1.tag, TagClass::Universal, Form::Primitive, 4)?;
    let auth_engine_id = octet_string_leaf(&f1, c1);
    let rest = &buf[c1..];

    let (c2, f2) = ber::parse_framing(rest, truncated)?;
    expect_tag(f2.tag, TagClass::Universal, Form::Primitive, 2)?;
    let auth_engine_boots = uint32_leaf_from_integer(&f2, c2);
    let rest = &rest[c2..];

    let (c3, f3) = ber::parse_framing(rest, truncated)?;
    expect_tag(f3.tag, TagClass::Universal, Form::Primitive, 2)?;
    let auth_engine_time = uint32_leaf_from_integer(&f3, c3);
    let rest = &rest[c3..];

    let (c4, f4) = ber::parse_framing(rest, truncated)?;
    expect_tag(f4.tag, TagClass::Universal, Form::Primitive, 4)?;
    let user = octet_string_leaf(&f4, c4);
    let rest = &rest[c4..];

    let (c5, f5) = ber::parse_framing(rest, truncated)?;
    expect_tag(f5.tag, TagClass::Universal, Form::Primitive, 4)?;
    let auth_params = octet_string_leaf(&f5, c5);
    let rest = &rest[c5..];

    let (c6, f6) = ber::parse_framing(rest, truncated)?;
    expect_tag(f6.tag, TagClass::Universal, Form::Primitive, 4)?;
    let priv_params = octet_string_leaf(&f6, c6);

    Ok(UsmHeader {
        auth_engine_id,
        auth_engine_boots,
        auth_engine_time,
        user,
        auth_params,
        priv_params,
    })
}

fn decode_scoped_pdu(buf: &[u8], truncated: bool) -> Result<ScopedPdu, SnmpError> {
    let (c1, f1) = ber::parse_framing(buf, truncated)?;
    expect_tag(f1.tag, TagClass::Universal, Form::Primitive, 4)?;
    let context_engine_id = octet_string_leaf(&f1, c1);
    let rest = &buf[c1..];

    let (c2, f2) = ber::parse_framing(rest, truncated)?;
    expect_tag(f2.tag, TagClass::Universal, Form::Primitive, 4)?;
    let context_name = octet_string_leaf(&f2, c2);
    let rest = &rest[c2..];

    let pdu = if rest.is_empty() {
        None
    } else {
        let (_, pdu_framed) = ber::parse_framing(rest, truncated)?;
        if pdu_framed.tag.class != TagClass::Context || pdu_framed.tag.form != Form::Constructed {
            return Err(SnmpError::Ber(BerError::UnexpectedTag {
                expected: Tag::new(TagClass::Context, Form::Constructed, 0),
                got: pdu_framed.tag,
            }));
        }
        let kind = pdu_kind_from_tag_id(pdu_framed.tag.id)?;
        if kind == PduKind::Trap1 {
            return Err(SnmpError::VersionMismatch { version: 3 });
        }
        Some(decode_pdu_body(kind, pdu_framed.content, truncated)?)
    };

    Ok(ScopedPdu {
        context_engine_id,
        context_name,
        pdu,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const V2C_GET: [u8; 43] = [
        0x30, 0x29, 0x02, 0x01, 0x01, 0x04, 0x06, 0x70, 0x75, 0x62, 0x6c, 0x69, 0x63, 0xa0, 0x1c,
        0x02, 0x04, 0x12, 0x34, 0x56, 0x78, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30, 0x0e, 0x30,
        0x0c, 0x06, 0x08, 0x2b, 0x06, 0x01, 0x02, 0x01, 0x01, 0x03, 0x00, 0x05, 0x00,
    ];

    #[test]
    fn decodes_v2c_get_request() {
        let msg = decode_message(&V2C_GET, true).unwrap();
        assert_eq!(msg.version.value, Some(1));
        assert_eq!(msg.community.value.as_deref(), Some(b"public".as_slice()));
        let pdu = msg.pdu().expect("pdu");
        assert_eq!(pdu.kind(), PduKind::Get);
        let generic = pdu.generic().unwrap();
        assert_eq!(generic.request_id.value, Some(0x12345678));
        assert_eq!(generic.varbinds.len(), 1);
        assert_eq!(
            generic.varbinds[0].name.value,
            Some(vec![1, 3, 6, 1, 2, 1, 1, 3, 0])
        );
        assert!(matches!(generic.varbinds[0].value, VarBindValue::Null(_)));
    }

    #[test]
    fn blen_of_outer_sequence_matches_buffer() {
        let (consumed, outer) = ber::parse_framing(&V2C_GET, true).unwrap();
        assert_eq!(consumed, V2C_GET.len());
        assert_eq!(outer.content_length, V2C_GET.len() - 2);
    }

    #[test]
    fn rejects_bulk_request_under_v1() {
        let mut v1 = V2C_GET;
        v1[4] = 0x00; // version = 0 (v1)
        v1[13] = 0xa5; // PDU tag -> GetBulk (context-constructed 5), illegal in v1
        let message = decode_message(&v1, true).unwrap();
        assert_eq!(message.version.value, Some(0));
        assert!(message.community.value.is_some());
        assert!(message.scoped_pdu.pdu.is_none());
    }

    #[test]
    fn truncated_capture_clamps_outer_sequence() {
        let mut bytes = vec![0x30, 0x64]; // declares 100 content bytes
        bytes.extend(std::iter::repeat(0x02u8).take(60));
        let (consumed, framed) = ber::parse_framing(&bytes, true).unwrap();
        assert_eq!(consumed, 62);
        assert_eq!(framed.content_length, 60);
    }

    #[test]
    fn decode_packet_never_panics_on_garbage() {
        let pkt = decode_packet(
            0,
            0,
            Endpoint::v4("127.0.0.1".parse().unwrap(), 1),
            Endpoint::v4("127.0.0.1".parse().unwrap(), 2),
            &[0xff, 0xff, 0xff],
            true,
        );
        assert!(pkt.message.pdu().is_none());
    }
}
