//! One-line-per-packet CSV summary (§4.6), grounded on the original
//! implementation's `csv-write.c`.
//!
//! Deliberately not RFC 4180 CSV (§9 Design Notes): no quoting, and
//! the column count varies across lines because the trailing OID list
//! is as long as the varbind list. That's safe only because OIDs
//! never contain a comma.

use std::fmt::Write as _;
use std::io::{self, Write};

use crate::model::{Packet, Pdu};
use crate::sink::Sink;

/// Writes the CSV line format. Has no document header/trailer, so
/// `write_begin`/`write_end` are no-ops.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvWriter;

impl Sink for CsvWriter {
    fn write_begin(&self, _out: &mut dyn io::Write) -> io::Result<()> {
        Ok(())
    }

    fn write_packet(&self, out: &mut dyn io::Write, packet: &Packet) -> io::Result<()> {
        out.write_all(render_csv_line(packet).as_bytes())
    }

    fn write_end(&self, _out: &mut dyn io::Write) -> io::Result<()> {
        Ok(())
    }
}

fn opt_col<T: std::fmt::Display>(line: &mut String, value: Option<T>) {
    if let Some(v) = value {
        let _ = write!(line, "{v}");
    }
}

/// Render one packet as a trailing-newline-terminated CSV line. A
/// free function (rather than only the `Sink` impl) because it is a
/// pure function of `packet` (§8's round-trip law) and is convenient
/// to unit test directly.
pub fn render_csv_line(packet: &Packet) -> String {
    let mut line = String::new();
    let _ = write!(line, "{}.{},", packet.ts_sec, packet.ts_usec);

    let _ = write!(line, "{},", packet.src.address);
    let _ = write!(line, "{},", packet.src.port);
    let _ = write!(line, "{},", packet.dst.address);
    let _ = write!(line, "{},", packet.dst.port);

    opt_col(&mut line, packet.message.blen);
    line.push(',');
    opt_col(&mut line, packet.message.version.value);
    line.push(',');

    match packet.message.pdu() {
        Some(pdu) => {
            let _ = write!(line, "{}", pdu.kind().element_name());
            line.push(',');
            write_pdu_columns(&mut line, pdu);
        }
        None => {
            // version, op_kind, request_id, error_status, error_index, varbind_count
            line.push_str(",,,,");
        }
    }

    format!("{line}\n")
}

fn write_pdu_columns(line: &mut String, pdu: &Pdu) {
    match pdu {
        Pdu::Trap1(trap) => {
            // Trap1 has no request-id/error-status/error-index; the
            // columns stay empty but present, matching `value_present
            // == false` rendering elsewhere in this format.
            line.push_str(",,,");
            let _ = write!(line, "{}", trap.varbinds.len());
            for vb in &trap.varbinds {
                line.push(',');
                write_oid(line, &vb.name.value);
            }
        }
        other => {
            let generic = other.generic().expect("non-Trap1 PDU has generic fields");
            opt_col(line, generic.request_id.value);
            line.push(',');
            opt_col(line, generic.error_status.value);
            line.push(',');
            opt_col(line, generic.error_index.value);
            line.push(',');
            let _ = write!(line, "{}", generic.varbinds.len());
            for vb in &generic.varbinds {
                line.push(',');
                write_oid(line, &vb.name.value);
            }
        }
    }
}

fn write_oid(line: &mut String, oid: &Option<Vec<u32>>) {
    if let Some(ids) = oid {
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                line.push('.');
            }
            let _ = write!(line, "{id}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_message;
    use crate::model::Endpoint;

    const V2C_GET: [u8; 43] = [
        0x30, 0x29, 0x02, 0x01, 0x01, 0x04, 0x06, 0x70, 0x75, 0x62, 0x6c, 0x69, 0x63, 0xa0, 0x1c,
        0x02, 0x04, 0x12, 0x34, 0x56, 0x78, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30, 0x0e, 0x30,
        0x0c, 0x06, 0x08, 0x2b, 0x06, 0x01, 0x02, 0x01, 0x01, 0x03, 0x00, 0x05, 0x00,
    ];

    #[test]
    fn renders_scenario_one() {
        let message = decode_message(&V2C_GET, true).unwrap();
        let packet = Packet {
            ts_sec: 1000,
            ts_usec: 0,
            src: Endpoint::v4("127.0.0.1".parse().unwrap(), 44100),
            dst: Endpoint::v4("127.0.0.1".parse().unwrap(), 161),
            message,
        };
        let line = render_csv_line(&packet);
        assert_eq!(
            line,
            "1000.0,127.0.0.1,44100,127.0.0.1,161,43,1,get-request,305419896,0,0,1,1.3.6.1.2.1.1.3.0\n"
        );
    }
}
