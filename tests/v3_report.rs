//! End-to-end decode of an SNMPv3 report carrying a USM header
//! (scenario 5): verifies the envelope, the USM fields, and that the
//! flow correlator treats a bare `Report` as unattributable on its
//! own (§4.5's `Classification::None`).

#[macro_use]
extern crate hex_literal;

use snmp_trace::decode::decode_message;
use snmp_trace::flow::{classify, Classification};
use snmp_trace::model::PduKind;

// version=3, msgID=42, msgMaxSize=1472, msgFlags=0x00, msgSecurityModel=3
// (USM); a 12-byte authoritative engine ID, boots/time zeroed, empty
// user/auth/priv parameters; an empty-context scoped PDU wrapping a
// Report with an empty varbind list.
const SNMPV3_REPORT: &[u8] = &hex!(
    "
    30 43 02 01 03 30 0d 02 01 2a 02 02 05 c0 04 01
    00 02 01 03 04 1c 30 1a 04 0c 80 00 1f 88 80 59
    dc 48 61 45 a2 63 02 01 00 02 01 00 04 00 04 00
    04 00 30 11 04 00 04 00 a8 0b 02 01 01 02 01 00
    02 01 00 30 00
    "
);

#[test]
fn decodes_v3_report_envelope_and_usm_header() {
    let msg = decode_message(SNMPV3_REPORT, false).expect("well-formed message");
    assert_eq!(msg.version.value, Some(3));
    assert!(!msg.community.value_present());

    let v3 = msg.v3.as_ref().expect("v3 envelope present");
    assert_eq!(v3.msg_id.value, Some(42));
    assert_eq!(v3.msg_max_size.value, Some(1472));
    assert_eq!(v3.msg_security_model.value, Some(3));
    assert!(!v3.reportable());
    assert!(!v3.is_encrypted());
    assert!(!v3.is_authenticated());

    let usm = v3.usm.as_ref().expect("USM header present");
    assert_eq!(
        usm.auth_engine_id.value.as_deref(),
        Some([0x80, 0x00, 0x1f, 0x88, 0x80, 0x59, 0xdc, 0x48, 0x61, 0x45, 0xa2, 0x63].as_slice())
    );
    assert_eq!(usm.auth_engine_boots.value, Some(0));
    assert_eq!(usm.auth_engine_time.value, Some(0));
    assert_eq!(usm.user.value, Some(Vec::new()));

    assert_eq!(msg.scoped_pdu.context_engine_id.value, Some(Vec::new()));
    assert_eq!(msg.scoped_pdu.context_name.value, Some(Vec::new()));

    let pdu = msg.pdu().expect("report PDU present");
    assert_eq!(pdu.kind(), PduKind::Report);
}

#[test]
fn report_classifies_as_none_for_flow_correlation() {
    let msg = decode_message(SNMPV3_REPORT, false).unwrap();
    let packet = snmp_trace::model::Packet {
        ts_sec: 0,
        ts_usec: 0,
        src: snmp_trace::model::Endpoint::v4("192.0.2.1".parse().unwrap(), 161),
        dst: snmp_trace::model::Endpoint::v4("192.0.2.2".parse().unwrap(), 44100),
        message: msg,
    };
    assert_eq!(classify(&packet), Classification::None);
}
