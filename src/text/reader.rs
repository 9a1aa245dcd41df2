//! Parses the textual format back into `Packet`s (§4.3), grounded on
//! the original implementation's `xml-read.c`.
//!
//! The original drove a hand-rolled recursive-descent reader over a
//! single set of process-wide globals for its parse state. Per the
//! redesigned architecture (§9 Design Notes) that state is an explicit
//! [`ReaderState`] — a scan cursor plus a stack of currently-open
//! element names — passed through the call chain instead, which is
//! what makes `read_packets` safe to call more than once in the same
//! process and easy to unit test in isolation.
//!
//! The vocabulary this format uses is closed and never produces `<`,
//! `>`, `&` or `"` inside a value (decimal, hex, and dotted-decimal
//! text only), so unlike a general XML reader this one does no entity
//! decoding.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::error::TextError;
use crate::model::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Open,
    SelfClose,
    Close,
}

#[derive(Debug, Clone)]
struct Tag<'a> {
    kind: TagKind,
    name: &'a str,
    attrs: Vec<(&'a str, &'a str)>,
}

impl<'a> Tag<'a> {
    fn attr(&self, key: &str) -> Option<&'a str> {
        self.attrs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    fn attr_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.attr(key).and_then(|v| v.parse().ok())
    }

    fn attr_lengths(&self) -> Attr {
        Attr {
            blen: self.attr_parsed("blen"),
            vlen: self.attr_parsed("vlen"),
        }
    }
}

/// The reader's decoder context: a scan cursor over the input plus the
/// stack of element names currently open, so malformed input can be
/// diagnosed and recovered from without any state living outside this
/// struct.
pub struct ReaderState<'a> {
    input: &'a str,
    pos: usize,
    stack: Vec<String>,
}

impl<'a> ReaderState<'a> {
    pub fn new(input: &'a str) -> Self {
        ReaderState {
            input,
            pos: 0,
            stack: Vec::new(),
        }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.input[self.pos..].chars().next() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn offset(&self) -> usize {
        self.pos
    }

    /// Reads the next tag, transparently skipping `<?...?>` processing
    /// instructions. Returns `None` at end of input.
    fn next_tag(&mut self) -> Result<Option<Tag<'a>>, TextError> {
        loop {
            self.skip_ws();
            if self.pos >= self.input.len() {
                return Ok(None);
            }
            if !self.input[self.pos..].starts_with('<') {
                return Err(TextError::new(self.pos, "expected '<'"));
            }
            if self.input[self.pos..].starts_with("<?") {
                let end = self.input[self.pos..]
                    .find("?>")
                    .ok_or_else(|| TextError::new(self.pos, "unterminated processing instruction"))?;
                self.pos += end + 2;
                continue;
            }
            let close = self.input[self.pos..].starts_with("</");
            let tag_end = self.input[self.pos..]
                .find('>')
                .ok_or_else(|| TextError::new(self.pos, "unterminated tag"))?;
            let raw = &self.input[self.pos + if close { 2 } else { 1 }..self.pos + tag_end];
            let self_close = raw.trim_end().ends_with('/');
            let raw = raw.trim_end().strip_suffix('/').unwrap_or(raw).trim();
            self.pos += tag_end + 1;

            if close {
                return Ok(Some(Tag {
                    kind: TagKind::Close,
                    name: raw,
                    attrs: Vec::new(),
                }));
            }

            let mut parts = raw.splitn(2, char::is_whitespace);
            let name = parts.next().unwrap_or("");
            let attrs = parse_attrs(parts.next().unwrap_or("").trim());
            return Ok(Some(Tag {
                kind: if self_close { TagKind::SelfClose } else { TagKind::Open },
                name,
                attrs,
            }));
        }
    }

    /// Raw text up to (not including) the next `<`.
    fn read_text(&mut self) -> &'a str {
        let start = self.pos;
        let end = self.input[self.pos..]
            .find('<')
            .map(|i| self.pos + i)
            .unwrap_or(self.input.len());
        self.pos = end;
        self.input[start..end].trim()
    }

    fn expect_open(&mut self, name: &str) -> Result<Tag<'a>, TextError> {
        let tag = self
            .next_tag()?
            .ok_or_else(|| TextError::new(self.offset(), format!("expected <{name}>, found end of input")))?;
        if tag.name != name || tag.kind == TagKind::Close {
            return Err(TextError::new(
                self.offset(),
                format!("expected <{name}>, found </{}> or <{}>", tag.name, tag.name),
            ));
        }
        if tag.kind == TagKind::Open {
            self.stack.push(name.to_string());
        }
        Ok(tag)
    }

    fn expect_close(&mut self, name: &str) -> Result<(), TextError> {
        let tag = self
            .next_tag()?
            .ok_or_else(|| TextError::new(self.offset(), format!("expected </{name}>, found end of input")))?;
        if tag.kind != TagKind::Close || tag.name != name {
            return Err(TextError::new(
                self.offset(),
                format!("expected </{name}>, found <{}>", tag.name),
            ));
        }
        self.stack.pop();
        Ok(())
    }

    /// Skips an entire subtree whose opening tag has already been
    /// consumed (or which was self-closing). Used both to discard
    /// unknown elements and to recover after a malformed one.
    fn skip_subtree(&mut self, opened: &Tag<'a>) -> Result<(), TextError> {
        if opened.kind == TagKind::SelfClose {
            return Ok(());
        }
        let mut depth = 1usize;
        loop {
            let tag = self
                .next_tag()?
                .ok_or_else(|| TextError::new(self.offset(), "unexpected end of input while skipping element"))?;
            match tag.kind {
                TagKind::Open => depth += 1,
                TagKind::SelfClose => {}
                TagKind::Close if tag.name == opened.name => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                TagKind::Close => {}
            }
        }
    }
}

fn parse_attrs(raw: &str) -> Vec<(&str, &str)> {
    let mut attrs = Vec::new();
    let mut rest = raw;
    while !rest.is_empty() {
        rest = rest.trim_start();
        let Some(eq) = rest.find('=') else { break };
        let key = rest[..eq].trim();
        rest = &rest[eq + 1..];
        let Some(quote_start) = rest.find('"') else { break };
        rest = &rest[quote_start + 1..];
        let Some(quote_end) = rest.find('"') else { break };
        let value = &rest[..quote_end];
        rest = &rest[quote_end + 1..];
        if !key.is_empty() {
            attrs.push((key, value));
        }
    }
    attrs
}

fn read_scalar_leaf<'a, T: FromStr>(
    state: &mut ReaderState<'a>,
    tag: &Tag<'a>,
) -> Result<Leaf<T>, TextError> {
    let attr = tag.attr_lengths();
    if tag.kind == TagKind::SelfClose {
        return Ok(Leaf { attr, value: None });
    }
    let text = state.read_text();
    state.expect_close(tag.name)?;
    let value = if text.is_empty() { None } else { text.parse().ok() };
    Ok(Leaf { attr, value })
}

fn read_hex_leaf<'a>(state: &mut ReaderState<'a>, tag: &Tag<'a>) -> Result<OctetStringLeaf, TextError> {
    let attr = tag.attr_lengths();
    if tag.kind == TagKind::SelfClose {
        return Ok(Leaf { attr, value: None });
    }
    let text = state.read_text();
    state.expect_close(tag.name)?;
    let value = if text.is_empty() { None } else { hex::decode(text).ok() };
    Ok(Leaf { attr, value })
}

fn read_oid_leaf<'a>(state: &mut ReaderState<'a>, tag: &Tag<'a>) -> Result<OidLeaf, TextError> {
    let attr = tag.attr_lengths();
    if tag.kind == TagKind::SelfClose {
        return Ok(Leaf { attr, value: None });
    }
    let text = state.read_text();
    state.expect_close(tag.name)?;
    let value = if text.is_empty() {
        None
    } else {
        text.split('.')
            .map(|p| p.parse::<u32>())
            .collect::<Result<Vec<u32>, _>>()
            .ok()
    };
    Ok(Leaf { attr, value })
}

fn read_ipv4_leaf<'a>(state: &mut ReaderState<'a>, tag: &Tag<'a>) -> Result<Ipv4Leaf, TextError> {
    let attr = tag.attr_lengths();
    if tag.kind == TagKind::SelfClose {
        return Ok(Leaf { attr, value: None });
    }
    let text = state.read_text();
    state.expect_close(tag.name)?;
    let value = if text.is_empty() { None } else { text.parse::<Ipv4Addr>().ok() };
    Ok(Leaf { attr, value })
}

fn read_varbind_value<'a>(state: &mut ReaderState<'a>) -> Result<VarBindValue, TextError> {
    let tag = state
        .next_tag()?
        .ok_or_else(|| TextError::new(state.offset(), "expected a varbind value element"))?;
    let attr = tag.attr_lengths();
    Ok(match tag.name {
        "null" => VarBindValue::Null(Leaf { attr, value: Some(()) }),
        "integer32" => VarBindValue::Int32(read_scalar_leaf(state, &tag)?),
        "unsigned32" => VarBindValue::Uint32(read_scalar_leaf(state, &tag)?),
        "unsigned64" => VarBindValue::Uint64(read_scalar_leaf(state, &tag)?),
        "ipaddress" => VarBindValue::IpAddr(read_ipv4_leaf(state, &tag)?),
        "octet-string" => VarBindValue::Octets(read_hex_leaf(state, &tag)?),
        "object-identifier" => VarBindValue::Oid(read_oid_leaf(state, &tag)?),
        "no-such-object" => VarBindValue::NoSuchObject(attr),
        "no-such-instance" => VarBindValue::NoSuchInstance(attr),
        "end-of-mib-view" => VarBindValue::EndOfMibView(attr),
        other => {
            log::warn!("skipping unrecognized varbind value element <{other}>");
            state.skip_subtree(&tag)?;
            VarBindValue::Null(Leaf::absent())
        }
    })
}

fn read_varbind<'a>(state: &mut ReaderState<'a>) -> Result<VarBind, TextError> {
    state.expect_open("varbind")?;
    let name_tag = state
        .next_tag()?
        .ok_or_else(|| TextError::new(state.offset(), "expected <name> in varbind"))?;
    if name_tag.name != "name" {
        return Err(TextError::new(state.offset(), "varbind missing <name>"));
    }
    let name = read_oid_leaf(state, &name_tag)?;
    let value = read_varbind_value(state)?;
    state.expect_close("varbind")?;
    Ok(VarBind { name, value })
}

fn read_varbindlist<'a>(state: &mut ReaderState<'a>) -> Result<Vec<VarBind>, TextError> {
    state.expect_open("variable-bindings")?;
    let mut out = Vec::new();
    loop {
        let tag = state
            .next_tag()?
            .ok_or_else(|| TextError::new(state.offset(), "unterminated variable-bindings"))?;
        match (tag.kind, tag.name) {
            (TagKind::Close, "variable-bindings") => break,
            (_, "varbind") => {
                state.stack.push("varbind".to_string());
                let name_tag = state
                    .next_tag()?
                    .ok_or_else(|| TextError::new(state.offset(), "expected <name> in varbind"))?;
                if name_tag.name != "name" {
                    return Err(TextError::new(state.offset(), "varbind missing <name>"));
                }
                let name = read_oid_leaf(state, &name_tag)?;
                let value = read_varbind_value(state)?;
                state.expect_close("varbind")?;
                out.push(VarBind { name, value });
            }
            (_, other) => {
                log::warn!("skipping unrecognized element <{other}> in variable-bindings");
                state.skip_subtree(&tag)?;
            }
        }
    }
    Ok(out)
}

fn read_generic_pdu<'a>(state: &mut ReaderState<'a>, name: &str) -> Result<GenericPdu, TextError> {
    state.expect_open(name)?;
    let request_id = read_scalar_leaf(state, &state_peek_expect(state, "request-id")?)?;
    let error_status = read_scalar_leaf(state, &state_peek_expect(state, "error-status")?)?;
    let error_index = read_scalar_leaf(state, &state_peek_expect(state, "error-index")?)?;
    let varbinds = read_varbindlist(state)?;
    state.expect_close(name)?;
    Ok(GenericPdu {
        request_id,
        error_status,
        error_index,
        varbinds,
    })
}

fn read_trap1<'a>(state: &mut ReaderState<'a>) -> Result<Trap1Pdu, TextError> {
    state.expect_open("trap")?;
    let enterprise = read_oid_leaf(state, &state_peek_expect(state, "enterprise")?)?;
    let agent_addr = read_ipv4_leaf(state, &state_peek_expect(state, "agent-addr")?)?;
    let generic_trap = read_scalar_leaf(state, &state_peek_expect(state, "generic-trap")?)?;
    let specific_trap = read_scalar_leaf(state, &state_peek_expect(state, "specific-trap")?)?;
    let time_stamp = read_scalar_leaf(state, &state_peek_expect(state, "time-stamp")?)?;
    let varbinds = read_varbindlist(state)?;
    state.expect_close("trap")?;
    Ok(Trap1Pdu {
        enterprise,
        agent_addr,
        generic_trap,
        specific_trap,
        time_stamp,
        varbinds,
    })
}

/// Reads the next tag and requires it to be named `name`, returning it
/// unconsumed-beyond-the-tag so the caller can pick the right leaf
/// reader. Kept separate from `expect_open` because these are leaf
/// elements, not elements that push the open-element stack.
fn state_peek_expect<'a>(state: &mut ReaderState<'a>, name: &str) -> Result<Tag<'a>, TextError> {
    let tag = state
        .next_tag()?
        .ok_or_else(|| TextError::new(state.offset(), format!("expected <{name}>, found end of input")))?;
    if tag.name != name {
        return Err(TextError::new(state.offset(), format!("expected <{name}>, found <{}>", tag.name)));
    }
    Ok(tag)
}

fn build_pdu(kind: PduKind, generic: GenericPdu) -> Pdu {
    match kind {
        PduKind::Get => Pdu::Get(generic),
        PduKind::GetNext => Pdu::GetNext(generic),
        PduKind::GetBulk => Pdu::GetBulk(generic),
        PduKind::Set => Pdu::Set(generic),
        PduKind::Response => Pdu::Response(generic),
        PduKind::Trap2 => Pdu::Trap2(generic),
        PduKind::Inform => Pdu::Inform(generic),
        PduKind::Report => Pdu::Report(generic),
        PduKind::Trap1 => unreachable!("trap1 has its own reader"),
    }
}

fn read_pdu<'a>(state: &mut ReaderState<'a>, tag_name: &str) -> Result<Pdu, TextError> {
    match PduKind::from_element_name(tag_name) {
        Some(PduKind::Trap1) => Ok(Pdu::Trap1(read_trap1(state)?)),
        Some(kind) => Ok(build_pdu(kind, read_generic_pdu(state, tag_name)?)),
        None => Err(TextError::new(state.offset(), format!("unknown PDU element <{tag_name}>"))),
    }
}

fn read_scoped_pdu<'a>(state: &mut ReaderState<'a>) -> Result<ScopedPdu, TextError> {
    state.expect_open("scoped-pdu")?;
    let context_engine_id = read_hex_leaf(state, &state_peek_expect(state, "context-engine-id")?)?;
    let context_name = read_hex_leaf(state, &state_peek_expect(state, "context-name")?)?;
    let next = state.next_tag()?;
    let pdu = match next {
        Some(tag) if tag.kind != TagKind::Close => {
            state.stack.push("scoped-pdu-child".to_string());
            let pdu = read_pdu(state, tag.name)?;
            Some(pdu)
        }
        Some(tag) => {
            // close tag for scoped-pdu; put it back by not consuming further.
            return if tag.name == "scoped-pdu" {
                Ok(ScopedPdu {
                    context_engine_id,
                    context_name,
                    pdu: None,
                })
            } else {
                Err(TextError::new(state.offset(), "malformed scoped-pdu"))
            };
        }
        None => return Err(TextError::new(state.offset(), "unterminated scoped-pdu")),
    };
    state.expect_close("scoped-pdu")?;
    Ok(ScopedPdu {
        context_engine_id,
        context_name,
        pdu,
    })
}

fn read_usm<'a>(state: &mut ReaderState<'a>) -> Result<UsmHeader, TextError> {
    state.expect_open("usm")?;
    let auth_engine_id = read_hex_leaf(state, &state_peek_expect(state, "auth-engine-id")?)?;
    let auth_engine_boots = read_scalar_leaf(state, &state_peek_expect(state, "auth-engine-boots")?)?;
    let auth_engine_time = read_scalar_leaf(state, &state_peek_expect(state, "auth-engine-time")?)?;
    let user = read_hex_leaf(state, &state_peek_expect(state, "user")?)?;
    let auth_params = read_hex_leaf(state, &state_peek_expect(state, "auth-params")?)?;
    let priv_params = read_hex_leaf(state, &state_peek_expect(state, "priv-params")?)?;
    state.expect_close("usm")?;
    Ok(UsmHeader {
        auth_engine_id,
        auth_engine_boots,
        auth_engine_time,
        user,
        auth_params,
        priv_params,
    })
}

fn read_v3_message<'a>(state: &mut ReaderState<'a>) -> Result<V3Envelope, TextError> {
    state.expect_open("message")?;
    let msg_id = read_scalar_leaf(state, &state_peek_expect(state, "msg-id")?)?;
    let msg_max_size = read_scalar_leaf(state, &state_peek_expect(state, "max-size")?)?;
    let msg_flags = read_hex_leaf(state, &state_peek_expect(state, "flags")?)?;
    let msg_security_model = read_scalar_leaf(state, &state_peek_expect(state, "security-model")?)?;
    state.expect_close("message")?;
    Ok(V3Envelope {
        msg_id,
        msg_max_size,
        msg_flags,
        msg_security_model,
        usm: None,
    })
}

fn read_snmp<'a>(state: &mut ReaderState<'a>) -> Result<SnmpMessage, TextError> {
    let open = state.expect_open("snmp")?;
    let blen = open.attr_parsed("blen");

    let next = state
        .next_tag()?
        .ok_or_else(|| TextError::new(state.offset(), "unterminated snmp element"))?;
    if next.kind == TagKind::Close && next.name == "snmp" {
        state.stack.pop();
        return Ok(SnmpMessage {
            blen,
            ..SnmpMessage::default()
        });
    }
    if next.name != "version" {
        return Err(TextError::new(state.offset(), "expected <version> inside <snmp>"));
    }
    let version = read_scalar_leaf::<i32>(state, &next)?;

    let mut message = SnmpMessage {
        blen,
        version: version.clone(),
        ..SnmpMessage::default()
    };

    match version.value {
        Some(0) | Some(1) => {
            message.community = read_hex_leaf(state, &state_peek_expect(state, "community")?)?;
            let maybe_pdu = state.next_tag()?;
            if let Some(tag) = maybe_pdu {
                if tag.kind != TagKind::Close {
                    let pdu = read_pdu(state, tag.name)?;
                    message.scoped_pdu.pdu = Some(pdu);
                } else if tag.name != "snmp" {
                    return Err(TextError::new(state.offset(), "malformed snmp element"));
                } else {
                    state.stack.pop();
                    return Ok(message);
                }
            }
        }
        Some(3) => {
            message.v3 = Some(read_v3_message(state)?);
            let tag = state
                .next_tag()?
                .ok_or_else(|| TextError::new(state.offset(), "unterminated snmp element"))?;
            if tag.name == "usm" {
                let usm = read_usm_from_open(state, tag)?;
                if let Some(v3) = &mut message.v3 {
                    v3.usm = Some(usm);
                }
                message.scoped_pdu = read_scoped_pdu(state)?;
            } else if tag.name == "scoped-pdu" {
                message.scoped_pdu = read_scoped_pdu_from_open(state, tag)?;
            } else {
                return Err(TextError::new(state.offset(), "expected <usm> or <scoped-pdu>"));
            }
        }
        _ => {
            log::warn!("unsupported SNMP version in textual input, skipping message body");
        }
    }

    state.expect_close("snmp")?;
    Ok(message)
}

fn read_usm_from_open<'a>(state: &mut ReaderState<'a>, _open: Tag<'a>) -> Result<UsmHeader, TextError> {
    let auth_engine_id = read_hex_leaf(state, &state_peek_expect(state, "auth-engine-id")?)?;
    let auth_engine_boots = read_scalar_leaf(state, &state_peek_expect(state, "auth-engine-boots")?)?;
    let auth_engine_time = read_scalar_leaf(state, &state_peek_expect(state, "auth-engine-time")?)?;
    let user = read_hex_leaf(state, &state_peek_expect(state, "user")?)?;
    let auth_params = read_hex_leaf(state, &state_peek_expect(state, "auth-params")?)?;
    let priv_params = read_hex_leaf(state, &state_peek_expect(state, "priv-params")?)?;
    state.expect_close("usm")?;
    Ok(UsmHeader {
        auth_engine_id,
        auth_engine_boots,
        auth_engine_time,
        user,
        auth_params,
        priv_params,
    })
}

fn read_scoped_pdu_from_open<'a>(state: &mut ReaderState<'a>, _open: Tag<'a>) -> Result<ScopedPdu, TextError> {
    let context_engine_id = read_hex_leaf(state, &state_peek_expect(state, "context-engine-id")?)?;
    let context_name = read_hex_leaf(state, &state_peek_expect(state, "context-name")?)?;
    let next = state
        .next_tag()?
        .ok_or_else(|| TextError::new(state.offset(), "unterminated scoped-pdu"))?;
    let pdu = if next.kind != TagKind::Close {
        Some(read_pdu(state, next.name)?)
    } else {
        None
    };
    if pdu.is_some() {
        state.expect_close("scoped-pdu")?;
    }
    Ok(ScopedPdu {
        context_engine_id,
        context_name,
        pdu,
    })
}

fn read_endpoint<'a>(state: &mut ReaderState<'a>, name: &str) -> Result<Endpoint, TextError> {
    let tag = state_peek_expect(state, name)?;
    let ip = tag
        .attr("ip")
        .ok_or_else(|| TextError::new(state.offset(), format!("<{name}> missing ip attribute")))?;
    let port = tag.attr_parsed("port").unwrap_or(0);
    let address = if let Ok(v4) = Ipv4Addr::from_str(ip) {
        Address::V4(v4)
    } else if let Ok(v6) = Ipv6Addr::from_str(ip) {
        Address::V6(v6)
    } else {
        return Err(TextError::new(state.offset(), format!("unparseable address {ip}")));
    };
    Ok(Endpoint { address, port })
}

/// Reads one `<packet>` element, including its open and close tags.
fn read_packet<'a>(state: &mut ReaderState<'a>) -> Result<Packet, TextError> {
    let open = state.expect_open("packet")?;
    let ts_sec = open.attr_parsed("sec").unwrap_or(0);
    let ts_usec = open.attr_parsed("usec").unwrap_or(0);
    let src = read_endpoint(state, "src")?;
    let dst = read_endpoint(state, "dst")?;
    let message = read_snmp(state)?;
    state.expect_close("packet")?;
    Ok(Packet {
        ts_sec,
        ts_usec,
        src,
        dst,
        message,
    })
}

/// Parses a complete `snmptrace` document, recovering from a malformed
/// `packet` element by skipping forward to the next one (§7's
/// `MalformedText` disposition). Never fails outright: a missing or
/// unparseable root produces an empty result, logged at `error`.
pub fn read_packets(input: &str) -> Vec<Packet> {
    let mut state = ReaderState::new(input);
    if let Err(err) = state.expect_open("snmptrace") {
        log::error!("not a valid snmptrace document: {err}");
        return Vec::new();
    }

    let mut packets = Vec::new();
    loop {
        let checkpoint = state.pos;
        match state.next_tag() {
            Ok(Some(tag)) if tag.kind == TagKind::Close && tag.name == "snmptrace" => break,
            Ok(Some(tag)) if tag.name == "packet" => {
                state.pos = checkpoint;
                state.stack.clear();
                match read_packet(&mut state) {
                    Ok(packet) => packets.push(packet),
                    Err(err) => {
                        log::warn!("malformed trace text, skipping to next packet: {err}");
                        if !recover_to_next_packet(&mut state) {
                            break;
                        }
                    }
                }
            }
            Ok(Some(tag)) => {
                log::warn!("skipping unrecognized top-level element <{}>", tag.name);
                if state.skip_subtree(&tag).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                log::warn!("malformed trace text, skipping to next packet: {err}");
                if !recover_to_next_packet(&mut state) {
                    break;
                }
            }
        }
    }
    packets
}

fn recover_to_next_packet(state: &mut ReaderState<'_>) -> bool {
    match state.input[state.pos..].find("<packet") {
        Some(offset) => {
            state.pos += offset;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_message;
    use crate::text::writer::TextWriter;
    use crate::sink::Sink;

    const V2C_GET: [u8; 43] = [
        0x30, 0x29, 0x02, 0x01, 0x01, 0x04, 0x06, 0x70, 0x75, 0x62, 0x6c, 0x69, 0x63, 0xa0, 0x1c,
        0x02, 0x04, 0x12, 0x34, 0x56, 0x78, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30, 0x0e, 0x30,
        0x0c, 0x06, 0x08, 0x2b, 0x06, 0x01, 0x02, 0x01, 0x01, 0x03, 0x00, 0x05, 0x00,
    ];

    fn sample_packet() -> Packet {
        Packet {
            ts_sec: 1000,
            ts_usec: 0,
            src: Endpoint::v4("127.0.0.1".parse().unwrap(), 44100),
            dst: Endpoint::v4("127.0.0.1".parse().unwrap(), 161),
            message: decode_message(&V2C_GET, true).unwrap(),
        }
    }

    #[test]
    fn round_trips_a_single_packet() {
        let packet = sample_packet();
        let writer = TextWriter;
        let mut buf = Vec::new();
        writer.write_begin(&mut buf).unwrap();
        writer.write_packet(&mut buf, &packet).unwrap();
        writer.write_end(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let parsed = read_packets(&text);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0], packet);
    }

    #[test]
    fn skips_past_a_malformed_packet_and_keeps_reading() {
        let good = sample_packet();
        let writer = TextWriter;
        let mut buf = Vec::new();
        writer.write_begin(&mut buf).unwrap();
        buf.extend_from_slice(b"<packet sec=\"1\" usec=\"0\"><src ip=\"broken\"/>");
        writer.write_packet(&mut buf, &good).unwrap();
        writer.write_end(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let parsed = read_packets(&text);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0], good);
    }

    #[test]
    fn unknown_element_is_skipped_with_its_subtree() {
        let text = "<snmptrace><bogus><nested/></bogus></snmptrace>";
        let parsed = read_packets(text);
        assert!(parsed.is_empty());
    }
}
