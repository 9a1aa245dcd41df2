//! Round-trips a multi-packet `snmptrace` document (v1 trap, v2c get,
//! v3 report) through a real file: `TextWriter` brackets the document
//! once and writes each packet, then `read_packets` parses the file
//! back and must reproduce every packet exactly (§8's round-trip law,
//! exercised here across a whole document rather than one packet at a
//! time as the per-module unit tests already do).

#[macro_use]
extern crate hex_literal;

use std::fs;
use std::io::Write;

use snmp_trace::decode::decode_message;
use snmp_trace::model::{Endpoint, Packet};
use snmp_trace::text::{read_packets, TextWriter};
use snmp_trace::Sink;

const SNMPV1_TRAP: &[u8] = &hex!(
    "
    30 25 02 01 00 04 06 70 75 62 6c 69 63 a4 18 06
    05 2b 06 01 04 01 40 04 0a 00 00 01 02 01 00 02
    01 00 43 01 05 30 00
    "
);

const SNMPV2C_GET: &[u8] = &hex!(
    "
    30 29 02 01 01 04 06 70 75 62 6c 69 63 a0 1c 02
    04 12 34 56 78 02 01 00 02 01 00 30 0e 30 0c 06
    08 2b 06 01 02 01 01 03 00 05 00
    "
);

const SNMPV3_REPORT: &[u8] = &hex!(
    "
    30 43 02 01 03 30 0d 02 01 2a 02 02 05 c0 04 01
    00 02 01 03 04 1c 30 1a 04 0c 80 00 1f 88 80 59
    dc 48 61 45 a2 63 02 01 00 02 01 00 04 00 04 00
    04 00 30 11 04 00 04 00 a8 0b 02 01 01 02 01 00
    02 01 00 30 00
    "
);

fn packet_from(ts_sec: u32, payload: &[u8]) -> Packet {
    Packet {
        ts_sec,
        ts_usec: 0,
        src: Endpoint::v4("198.51.100.1".parse().unwrap(), 162),
        dst: Endpoint::v4("198.51.100.2".parse().unwrap(), 161),
        message: decode_message(payload, false).expect("well-formed message"),
    }
}

#[test]
fn document_of_three_packets_round_trips_through_a_file() {
    let packets = vec![
        packet_from(1, SNMPV1_TRAP),
        packet_from(2, SNMPV2C_GET),
        packet_from(3, SNMPV3_REPORT),
    ];

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.xml");
    {
        let mut file = fs::File::create(&path).unwrap();
        let writer = TextWriter;
        writer.write_begin(&mut file).unwrap();
        for packet in &packets {
            writer.write_packet(&mut file, packet).unwrap();
        }
        writer.write_end(&mut file).unwrap();
    }

    let text = fs::read_to_string(&path).unwrap();
    let parsed = read_packets(&text);
    assert_eq!(parsed, packets);
}
