//! BER primitive parser specialized for the SNMP grammar (§4.1).
//!
//! `parse_one` decodes exactly one tag-length-value triple from the
//! front of a byte slice and reports how many bytes it consumed. The
//! SNMP message decoder (`crate::decode`) drives this function
//! top-down through the grammar; this module knows nothing about PDU
//! structure, only about BER framing and the handful of SNMP-specific
//! primitive types.
//!
//! Unlike `asn1-rs`'s `FromBer`, callers here need the exact consumed
//! byte count (`blen`) and the exact content length actually used
//! after any truncation clamping (`vlen`) for every element, including
//! ones abandoned partway through content because the capture ran out
//! of bytes. That bookkeeping, plus the capture-aware truncation
//! tolerance below, is bespoke enough that we decode tags and lengths
//! by hand rather than bending a combinator library to the task.

use crate::error::{BerError, Form, Tag, TagClass};

/// The typed payload of one decoded BER element, selected by
/// `(class, form, tag_id)` as tabulated in §4.1.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<'a> {
    Integer(i32),
    Unsigned32(u32),
    Unsigned64(u64),
    OctetString(&'a [u8]),
    Null,
    Oid(Vec<u32>),
    IpAddress([u8; 4]),
    /// Raw content octets of a constructed element (SEQUENCE, or a
    /// context-constructed PDU tag) for the caller to re-parse.
    Nested(&'a [u8]),
    /// A context-class primitive 0, 1 or 2: noSuchObject,
    /// noSuchInstance or endOfMibView. The caller reads `tag.id` to
    /// tell them apart.
    Exception,
}

/// One decoded BER element together with its framing metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Element<'a> {
    pub tag: Tag,
    /// Value length actually used, i.e. `vlen`: the declared length,
    /// or the clamped available length if the element was truncated.
    pub content_length: usize,
    pub payload: Payload<'a>,
}

/// The tag/length framing of one BER element, before its content is
/// interpreted as a typed payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Framed<'a> {
    pub tag: Tag,
    /// `vlen`: the declared length, or the clamped available length
    /// if the element was truncated.
    pub content_length: usize,
    pub content: &'a [u8],
}

/// Parse the tag and length of one BER element, without interpreting
/// its content. Separated from [`parse_one`] so callers can keep the
/// framing (and so `blen`/`vlen`) even when the content fails to
/// convert to the expected type (`Overflow`, `OidOverflow`) — per
/// §7's disposition for those errors, the leaf is marked not present
/// but its structural attributes are retained.
///
/// `truncated` tells the parser whether `buf` may be a partial
/// capture: when true, a declared length exceeding the remaining
/// bytes is clamped to what is available and decoding proceeds
/// best-effort; when false, the same situation raises
/// [`BerError::Truncated`].
///
/// Returns the number of bytes consumed (`blen`) and the framing.
pub fn parse_framing<'a>(buf: &'a [u8], truncated: bool) -> Result<(usize, Framed<'a>), BerError> {
    let (tag_len, tag) = parse_tag(buf)?;
    let (len_len, declared_length) = parse_length(&buf[tag_len..])?;
    let header_len = tag_len + len_len;
    if header_len > buf.len() {
        return Err(BerError::Truncated);
    }
    let available = buf.len() - header_len;
    let content_length = if declared_length > available {
        if truncated {
            available
        } else {
            return Err(BerError::Truncated);
        }
    } else {
        declared_length
    };
    let content = &buf[header_len..header_len + content_length];
    let consumed = header_len + content_length;
    Ok((
        consumed,
        Framed {
            tag,
            content_length,
            content,
        },
    ))
}

/// Parse one tag-length-value triple from the front of `buf`, fully
/// interpreting its content. Most callers that need to recover
/// `blen`/`vlen` on a failed conversion should use [`parse_framing`]
/// and [`decode_payload`] separately instead.
pub fn parse_one<'a>(buf: &'a [u8], truncated: bool) -> Result<(usize, Element<'a>), BerError> {
    let (consumed, framed) = parse_framing(buf, truncated)?;
    let payload = decode_payload(framed.tag, framed.content)?;
    Ok((
        consumed,
        Element {
            tag: framed.tag,
            content_length: framed.content_length,
            payload,
        },
    ))
}

fn parse_tag(buf: &[u8]) -> Result<(usize, Tag), BerError> {
    let &b0 = buf.first().ok_or(BerError::Truncated)?;
    let class = match b0 >> 6 {
        0b00 => TagClass::Universal,
        0b01 => TagClass::Application,
        0b10 => TagClass::Context,
        0b11 => TagClass::Private,
        _ => unreachable!("two-bit field"),
    };
    let form = if b0 & 0x20 != 0 {
        Form::Constructed
    } else {
        Form::Primitive
    };
    let low5 = b0 & 0x1F;
    if low5 != 0x1F {
        return Ok((1, Tag::new(class, form, low5 as u32)));
    }
    let mut id: u32 = 0;
    let mut idx = 1;
    loop {
        let &b = buf.get(idx).ok_or(BerError::BadTag)?;
        if id & 0xFE00_0000 != 0 {
            return Err(BerError::BadTag);
        }
        id = (id << 7) | (b & 0x7F) as u32;
        idx += 1;
        if b & 0x80 == 0 {
            break;
        }
    }
    Ok((idx, Tag::new(class, form, id)))
}

fn parse_length(buf: &[u8]) -> Result<(usize, usize), BerError> {
    let &b0 = buf.first().ok_or(BerError::Truncated)?;
    if b0 & 0x80 == 0 {
        return Ok((1, b0 as usize));
    }
    let n = (b0 & 0x7F) as usize;
    if n == 0 {
        // Indefinite-length form: not used by DER-encoded SNMP.
        return Err(BerError::BadLength);
    }
    if buf.len() < 1 + n {
        return Err(BerError::BadLength);
    }
    let mut len: usize = 0;
    for &b in &buf[1..1 + n] {
        len = len
            .checked_shl(8)
            .ok_or(BerError::BadLength)?
            .checked_add(b as usize)
            .ok_or(BerError::BadLength)?;
    }
    Ok((1 + n, len))
}

pub fn decode_payload<'a>(tag: Tag, content: &'a [u8]) -> Result<Payload<'a>, BerError> {
    use Form::*;
    use TagClass::*;
    match (tag.class, tag.form, tag.id) {
        (Universal, Primitive, 2) => Ok(Payload::Integer(decode_int32(content, tag)?)),
        (Universal, Primitive, 4) => Ok(Payload::OctetString(content)),
        (Universal, Primitive, 5) => Ok(Payload::Null),
        (Universal, Primitive, 6) => Ok(Payload::Oid(decode_oid(content)?)),
        (Universal, Constructed, 16) => Ok(Payload::Nested(content)),
        (Application, Primitive, 0) => {
            if content.len() != 4 {
                return Err(BerError::BadLength);
            }
            let mut addr = [0u8; 4];
            addr.copy_from_slice(content);
            Ok(Payload::IpAddress(addr))
        }
        (Application, Primitive, 1..=3) => Ok(Payload::Unsigned32(decode_uint32(content, tag)?)),
        (Application, Primitive, 6) => Ok(Payload::Unsigned64(decode_uint64(content, tag)?)),
        (Context, Primitive, 0..=2) => Ok(Payload::Exception),
        (Context, Constructed, 0..=8) => Ok(Payload::Nested(content)),
        _ => Ok(Payload::OctetString(content)),
    }
}

/// Signed big-endian two's complement integer, bounded to `i32`.
fn decode_int32(content: &[u8], tag: Tag) -> Result<i32, BerError> {
    if content.is_empty() {
        return Err(BerError::BadLength);
    }
    let significant = strip_redundant_sign_bytes(content);
    if significant.len() > 4 {
        return Err(BerError::Overflow(tag));
    }
    let mut v: i64 = if significant[0] & 0x80 != 0 { -1 } else { 0 };
    for &b in significant {
        v = (v << 8) | b as i64;
    }
    Ok(v as i32)
}

fn strip_redundant_sign_bytes(content: &[u8]) -> &[u8] {
    let mut bytes = content;
    while bytes.len() > 1 {
        let (lead, next) = (bytes[0], bytes[1]);
        let redundant_positive = lead == 0x00 && next & 0x80 == 0;
        let redundant_negative = lead == 0xFF && next & 0x80 != 0;
        if redundant_positive || redundant_negative {
            bytes = &bytes[1..];
        } else {
            break;
        }
    }
    bytes
}

/// Unsigned big-endian integer, bounded to `u32`. Used for
/// application-tagged Counter32/Gauge32/TimeTicks values and for
/// plain `INTEGER` fields the grammar treats as unsigned (msg-id,
/// max-size, security-model, auth-engine-boots, auth-engine-time).
fn decode_uint32(content: &[u8], tag: Tag) -> Result<u32, BerError> {
    if content.is_empty() {
        return Err(BerError::BadLength);
    }
    let mut bytes = content;
    while bytes.len() > 1 && bytes[0] == 0 {
        bytes = &bytes[1..];
    }
    if bytes.len() > 4 {
        return Err(BerError::Overflow(tag));
    }
    let mut v: u64 = 0;
    for &b in bytes {
        v = (v << 8) | b as u64;
    }
    u32::try_from(v).map_err(|_| BerError::Overflow(tag))
}

/// Unsigned big-endian integer, bounded to `u64`. Used for Counter64.
fn decode_uint64(content: &[u8], tag: Tag) -> Result<u64, BerError> {
    if content.is_empty() {
        return Err(BerError::BadLength);
    }
    let mut bytes = content;
    while bytes.len() > 1 && bytes[0] == 0 {
        bytes = &bytes[1..];
    }
    if bytes.len() > 8 {
        return Err(BerError::Overflow(tag));
    }
    let mut v: u64 = 0;
    for &b in bytes {
        v = (v << 8) | b as u64;
    }
    Ok(v)
}

/// Object identifier sub-identifiers: `first*40 + second` packed into
/// the first content byte, then base-128 continuation for the rest.
fn decode_oid(content: &[u8]) -> Result<Vec<u32>, BerError> {
    let &first_byte = content.first().ok_or(BerError::BadLength)?;
    let first = u32::from(first_byte / 40).min(2);
    let second = u32::from(first_byte) - first * 40;
    let mut subids = vec![first, second];

    let mut acc: u32 = 0;
    let mut in_progress = false;
    for &b in &content[1..] {
        if acc & 0xFE00_0000 != 0 {
            return Err(BerError::OidOverflow);
        }
        acc = (acc << 7) | (b & 0x7F) as u32;
        in_progress = true;
        if b & 0x80 == 0 {
            subids.push(acc);
            acc = 0;
            in_progress = false;
        }
    }
    if in_progress {
        return Err(BerError::BadLength);
    }
    Ok(subids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_form_length() {
        let buf = [0x02, 0x01, 0x2a];
        let (consumed, el) = parse_one(&buf, false).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(el.content_length, 1);
        assert_eq!(el.payload, Payload::Integer(42));
    }

    #[test]
    fn long_form_length() {
        let mut buf = vec![0x04, 0x81, 0x80];
        buf.extend(std::iter::repeat(0xAAu8).take(128));
        let (consumed, el) = parse_one(&buf, false).unwrap();
        assert_eq!(consumed, 3 + 128);
        assert_eq!(el.content_length, 128);
        match el.payload {
            Payload::OctetString(s) => assert_eq!(s.len(), 128),
            _ => panic!("wrong payload"),
        }
    }

    #[test]
    fn negative_integer_two_complement() {
        let buf = [0x02, 0x01, 0xFF];
        let (_, el) = parse_one(&buf, false).unwrap();
        assert_eq!(el.payload, Payload::Integer(-1));
    }

    #[test]
    fn integer_overflow() {
        let buf = [0x02, 0x05, 0x01, 0x02, 0x03, 0x04, 0x05];
        let err = parse_one(&buf, false).unwrap_err();
        assert!(matches!(err, BerError::Overflow(_)));
    }

    #[test]
    fn truncated_strict_fails() {
        let buf = [0x30, 0x64, 0x01, 0x02, 0x03];
        let err = parse_one(&buf, false).unwrap_err();
        assert_eq!(err, BerError::Truncated);
    }

    #[test]
    fn truncated_lenient_clamps() {
        let buf = [0x30, 0x64, 0x01, 0x02, 0x03];
        let (consumed, el) = parse_one(&buf, true).unwrap();
        assert_eq!(consumed, 5);
        assert_eq!(el.content_length, 3);
    }

    #[test]
    fn extended_tag() {
        let buf = [0x5F, 0x2B, 0x01, 0x00];
        let (consumed, el) = parse_one(&buf, false).unwrap();
        assert_eq!(consumed, 4);
        assert_eq!(el.tag.id, 0x2B);
        assert_eq!(el.tag.class, TagClass::Application);
    }

    #[test]
    fn oid_sysuptime() {
        let content = [0x2b, 0x06, 0x01, 0x02, 0x01, 0x01, 0x03, 0x00];
        let oid = decode_oid(&content).unwrap();
        assert_eq!(oid, vec![1, 3, 6, 1, 2, 1, 1, 3, 0]);
    }

    #[test]
    fn timeticks_with_high_bit_set_does_not_overflow() {
        // application/primitive/3 = TimeTicks; 4 content bytes all 0xFF is
        // u32::MAX, which fits — it must not be rejected just because the
        // leading byte's high bit is set and there's no padding 0x00.
        let buf = [0x43, 0x04, 0xFF, 0xFF, 0xFF, 0xFF];
        let (_, el) = parse_one(&buf, false).unwrap();
        assert_eq!(el.payload, Payload::Unsigned32(u32::MAX));
    }

    #[test]
    fn oid_overflow() {
        let content = [0x2b, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        let err = decode_oid(&content).unwrap_err();
        assert_eq!(err, BerError::OidOverflow);
    }
}
