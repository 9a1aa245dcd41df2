//! Correlates decoded packets into flows and routes each to a per-flow
//! file (§4.5), grounded on the original implementation's `flow.c`.
//!
//! The original tracked flows and a request cache as hand-rolled
//! singly-linked lists with a parallel MRU array of raw `FILE*`
//! pointers. Here the same three ideas — classification, a
//! request/notify cache with time-based expiry, and an MRU-bounded
//! open-file cache — are built from a `VecDeque` and a `HashMap`
//! instead, but the eviction and naming policy match exactly.

use std::collections::{HashMap, VecDeque};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::FlowError;
use crate::model::{Endpoint, Packet, PduKind};
use crate::sink::Sink;

/// How a packet's PDU kind classifies it for flow purposes (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Command,
    Notify,
    None,
}

pub fn classify(packet: &Packet) -> Classification {
    match packet.message.pdu().map(|pdu| pdu.kind()) {
        Some(PduKind::Get | PduKind::GetNext | PduKind::GetBulk | PduKind::Set) => {
            Classification::Command
        }
        Some(PduKind::Trap1 | PduKind::Trap2 | PduKind::Inform) => Classification::Notify,
        Some(PduKind::Response | PduKind::Report) | None => Classification::None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FlowKind {
    Command,
    Notify,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FlowKey {
    kind: FlowKind,
    src: Endpoint,
    dst: Endpoint,
}

impl FlowKey {
    /// The human-readable flow name: `<role>-<src>-<role>-<dst>`,
    /// ports intentionally omitted (§4.5).
    fn name(&self) -> String {
        let (src_role, dst_role) = match self.kind {
            FlowKind::Command => ("cg", "cr"),
            FlowKind::Notify => ("no", "nr"),
        };
        format!(
            "{src_role}-{}-{dst_role}-{}",
            self.src.address, self.dst.address
        )
    }
}

struct FlowState {
    name: String,
    file: Option<File>,
    written: bool,
}

/// Request cache entry: enough of the packet to match a later response
/// or report, plus its own classification and addressing.
#[derive(Clone)]
struct CachedRequest {
    packet: Packet,
    request_id: i32,
}

/// Routes decoded packets to per-flow files, falling back to a primary
/// sink for packets that cannot (yet) be attributed to a flow.
///
/// Generic over the sink implementation so tests can plug in a sink
/// that records calls instead of writing real files.
pub struct Correlator<S: Sink> {
    sink: S,
    dir: PathBuf,
    prefix: Option<String>,
    ext: Option<String>,
    capacity: usize,
    flows: HashMap<FlowKey, FlowState>,
    mru: VecDeque<FlowKey>,
    request_cache: VecDeque<CachedRequest>,
    processed: u64,
    fallback: Option<Box<dyn Write>>,
}

/// Expiry sweep runs every this many processed packets (§4.5).
const CACHE_EXPIRY_INTERVAL: u64 = 1024;
/// Cache entries older than this many seconds are pruned on a sweep.
const CACHE_EXPIRY_SECONDS: u32 = 300;
/// Safety margin subtracted from the platform's soft fd limit.
const FD_SAFETY_MARGIN: usize = 8;
/// Capacity used when the platform reports an unbounded limit.
const FD_UNLIMITED_CAPACITY: usize = 1024;

impl<S: Sink> Correlator<S> {
    /// Builds a correlator whose open-file cache capacity is derived
    /// from the platform's soft file descriptor limit.
    pub fn new(sink: S, dir: impl Into<PathBuf>) -> Result<Self, FlowError> {
        let capacity = platform_fd_capacity()?;
        Ok(Self::with_capacity(sink, dir, capacity))
    }

    /// Builds a correlator with an explicit open-file cache capacity,
    /// bypassing platform introspection. Useful for embedding on a
    /// platform without an `rlimit` notion, or for deterministic tests.
    pub fn with_capacity(sink: S, dir: impl Into<PathBuf>, capacity: usize) -> Self {
        Correlator {
            sink,
            dir: dir.into(),
            prefix: None,
            ext: None,
            capacity: capacity.max(1),
            flows: HashMap::new(),
            mru: VecDeque::new(),
            request_cache: VecDeque::new(),
            processed: 0,
            fallback: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = Some(ext.into());
        self
    }

    /// Packets that cannot be attributed to a flow are written here
    /// instead of being dropped, matching the original's "unknown"
    /// stream.
    pub fn with_fallback(mut self, fallback: Box<dyn Write>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Process one packet: classify it, resolve (or create) its flow,
    /// and write it through the flow's file, or the fallback sink if
    /// no flow could be attributed.
    pub fn process(&mut self, packet: &Packet) -> io::Result<()> {
        self.processed += 1;
        if self.processed % CACHE_EXPIRY_INTERVAL == 0 {
            self.expire_cache(packet.ts_sec);
        }

        let (classification, reverse) = self.resolve_classification(packet);
        let kind = match classification {
            Classification::Command => FlowKind::Command,
            Classification::Notify => FlowKind::Notify,
            Classification::None => {
                self.cache_if_request(packet);
                return self.write_fallback(packet);
            }
        };

        let (src, dst) = if reverse {
            (packet.dst, packet.src)
        } else {
            (packet.src, packet.dst)
        };
        let key = FlowKey { kind, src, dst };
        match self.write_to_flow(key, packet) {
            Ok(()) => {}
            Err(err) => {
                // §7 FileOpenFailure: diagnose and fall back to the
                // primary sink rather than aborting the pipeline.
                log::error!("snmp-trace: failed to write flow file: {err}");
                self.write_fallback(packet)?;
            }
        }
        self.cache_if_request(packet);
        Ok(())
    }

    /// A response/report carries `Classification::None` on its own;
    /// this looks up the request cache to recover the flow it belongs
    /// to. Returns `(classification, reverse)` where `reverse` means
    /// the flow's endpoints must be read from `packet` swapped.
    fn resolve_classification(&self, packet: &Packet) -> (Classification, bool) {
        let own = classify(packet);
        if own != Classification::None {
            return (own, false);
        }
        match self.find_cached_request(packet) {
            Some(cached) => (classify(&cached.packet), true),
            None => (Classification::None, false),
        }
    }

    fn find_cached_request(&self, packet: &Packet) -> Option<&CachedRequest> {
        let request_id = packet
            .message
            .pdu()
            .and_then(|pdu| pdu.generic())
            .and_then(|g| g.request_id.value)?;
        self.request_cache.iter().find(|cached| {
            cached.request_id == request_id
                && cached.packet.dst == packet.src
                && cached.packet.src == packet.dst
        })
    }

    /// Commands and notifications (responses excluded) are cached so
    /// a later response or report can be matched back to them.
    fn cache_if_request(&mut self, packet: &Packet) {
        if !matches!(classify(packet), Classification::Command | Classification::Notify) {
            return;
        }
        let Some(request_id) = packet
            .message
            .pdu()
            .and_then(|pdu| pdu.generic())
            .and_then(|g| g.request_id.value)
        else {
            return;
        };
        self.request_cache.push_front(CachedRequest {
            packet: packet.clone(),
            request_id,
        });
    }

    fn expire_cache(&mut self, now_sec: u32) {
        let cutoff = now_sec.saturating_sub(CACHE_EXPIRY_SECONDS);
        self.request_cache.retain(|cached| cached.packet.ts_sec >= cutoff);
    }

    fn write_fallback(&mut self, packet: &Packet) -> io::Result<()> {
        if let Some(fallback) = &mut self.fallback {
            self.sink.write_packet(fallback.as_mut(), packet)?;
        }
        Ok(())
    }

    fn write_to_flow(&mut self, key: FlowKey, packet: &Packet) -> io::Result<()> {
        if !self.flows.contains_key(&key) {
            self.flows.insert(
                key.clone(),
                FlowState {
                    name: key.name(),
                    file: None,
                    written: false,
                },
            );
        }

        let first_write = !self.flows[&key].written;
        let path = self.flow_path(&self.flows[&key].name);
        if self.flows[&key].file.is_none() {
            // Eviction must happen before `key` is recorded in `mru` below,
            // otherwise a fresh key counts against its own capacity check
            // and a cache at exactly `capacity` entries evicts the entry
            // it is in the middle of opening (§8 invariant 6).
            self.open_flow_file(&key, &path, first_write)?;
        }
        self.touch_mru(&key);

        let state = self.flows.get_mut(&key).expect("flow just ensured present");
        if let Some(file) = &mut state.file {
            if first_write {
                self.sink.write_begin(file)?;
            }
            self.sink.write_packet(file, packet)?;
            state.written = true;
        }
        Ok(())
    }

    fn flow_path(&self, flow_name: &str) -> PathBuf {
        let mut filename = String::new();
        if let Some(prefix) = &self.prefix {
            filename.push_str(prefix);
            filename.push('-');
        }
        filename.push_str(flow_name);
        if let Some(ext) = &self.ext {
            filename.push('.');
            filename.push_str(ext);
        }
        self.dir.join(filename)
    }

    fn open_flow_file(&mut self, key: &FlowKey, path: &Path, truncate: bool) -> io::Result<()> {
        if self.mru.len() >= self.capacity {
            if let Some(evicted) = self.mru.pop_back() {
                if let Some(state) = self.flows.get_mut(&evicted) {
                    state.file = None; // dropping the File closes it
                }
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(truncate)
            .append(!truncate)
            .open(path)
            .map_err(|source| {
                io::Error::new(
                    io::ErrorKind::Other,
                    FlowError::FileOpen {
                        path: path.to_path_buf(),
                        source,
                    },
                )
            })?;
        self.flows.get_mut(key).expect("flow present").file = Some(file);
        Ok(())
    }

    fn touch_mru(&mut self, key: &FlowKey) {
        if let Some(pos) = self.mru.iter().position(|k| k == key) {
            self.mru.remove(pos);
        }
        self.mru.push_front(key.clone());
    }

    /// Reopens every flow in append mode long enough to emit the
    /// sink's trailer, then drops all open handles.
    pub fn finish(&mut self) -> io::Result<()> {
        let keys: Vec<FlowKey> = self.flows.keys().cloned().collect();
        for key in keys {
            let name = self.flows[&key].name.clone();
            let path = self.flow_path(&name);
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            self.sink.write_end(&mut file)?;
        }
        self.flows.clear();
        self.mru.clear();
        Ok(())
    }
}

#[cfg(unix)]
fn platform_fd_capacity() -> Result<usize, FlowError> {
    let mut limit = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    if unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut limit) } != 0 {
        return Err(FlowError::ResourceExhausted);
    }
    if limit.rlim_cur == libc::RLIM_INFINITY {
        return Ok(FD_UNLIMITED_CAPACITY);
    }
    let soft = limit.rlim_cur as usize;
    if soft > FD_SAFETY_MARGIN {
        Ok(soft - FD_SAFETY_MARGIN)
    } else {
        Err(FlowError::ResourceExhausted)
    }
}

#[cfg(not(unix))]
fn platform_fd_capacity() -> Result<usize, FlowError> {
    Ok(FD_UNLIMITED_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::CsvWriter;
    use crate::decode::decode_message;

    const V2C_GET: [u8; 43] = [
        0x30, 0x29, 0x02, 0x01, 0x01, 0x04, 0x06, 0x70, 0x75, 0x62, 0x6c, 0x69, 0x63, 0xa0, 0x1c,
        0x02, 0x04, 0x12, 0x34, 0x56, 0x78, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30, 0x0e, 0x30,
        0x0c, 0x06, 0x08, 0x2b, 0x06, 0x01, 0x02, 0x01, 0x01, 0x03, 0x00, 0x05, 0x00,
    ];

    fn get_request_packet(src_port: u16, dst_port: u16) -> Packet {
        Packet {
            ts_sec: 1000,
            ts_usec: 0,
            src: Endpoint::v4("10.0.0.1".parse().unwrap(), src_port),
            dst: Endpoint::v4("10.0.0.2".parse().unwrap(), dst_port),
            message: decode_message(&V2C_GET, true).unwrap(),
        }
    }

    fn response_for(request: &Packet) -> Packet {
        let mut message = request.message.clone();
        let pdu = message.scoped_pdu.pdu.take().unwrap();
        let generic = pdu.generic().unwrap().clone();
        message.scoped_pdu.pdu = Some(crate::model::Pdu::Response(generic));
        Packet {
            ts_sec: request.ts_sec,
            ts_usec: request.ts_usec,
            src: request.dst,
            dst: request.src,
            message,
        }
    }

    #[test]
    fn classifies_get_request_as_command() {
        let packet = get_request_packet(44100, 161);
        assert_eq!(classify(&packet), Classification::Command);
    }

    #[test]
    fn command_flow_is_written_to_a_file_named_by_role_and_address() {
        let dir = tempfile::tempdir().unwrap();
        let mut correlator = Correlator::with_capacity(CsvWriter, dir.path(), 4);
        let request = get_request_packet(44100, 161);
        correlator.process(&request).unwrap();
        correlator.finish().unwrap();

        let path = dir.path().join("cg-10.0.0.1-cr-10.0.0.2");
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains("get-request"));
    }

    #[test]
    fn response_is_correlated_back_onto_the_request_flow() {
        let dir = tempfile::tempdir().unwrap();
        let mut correlator = Correlator::with_capacity(CsvWriter, dir.path(), 4);
        let request = get_request_packet(44100, 161);
        let response = response_for(&request);
        correlator.process(&request).unwrap();
        correlator.process(&response).unwrap();
        correlator.finish().unwrap();

        let path = dir.path().join("cg-10.0.0.1-cr-10.0.0.2");
        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn unmatched_response_is_cached_then_falls_to_fallback_sink() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = Vec::new();
        let mut correlator =
            Correlator::with_capacity(CsvWriter, dir.path(), 4).with_fallback(Box::new(fallback));
        let request = get_request_packet(44100, 161);
        let response = response_for(&request);
        // No prior request processed: the response can't be matched.
        correlator.process(&response).unwrap();
        assert_eq!(correlator.request_cache.len(), 1);
        assert!(correlator.flows.is_empty());
    }

    #[test]
    fn cache_expiry_sweep_prunes_entries_older_than_the_window() {
        let dir = tempfile::tempdir().unwrap();
        let mut correlator = Correlator::with_capacity(CsvWriter, dir.path(), 4);
        let stale = get_request_packet(44100, 161);
        correlator.process(&stale).unwrap();
        assert_eq!(correlator.request_cache.len(), 1);

        // Advance past the 300s window and the 1024-packet sweep
        // interval with unrelated filler packets so the next sweep
        // prunes the stale entry.
        for _ in 0..CACHE_EXPIRY_INTERVAL {
            let mut filler = get_request_packet(50000, 161);
            filler.ts_sec = stale.ts_sec + CACHE_EXPIRY_SECONDS + 1;
            correlator.process(&filler).unwrap();
        }
        assert!(
            !correlator
                .request_cache
                .iter()
                .any(|c| c.packet.src == stale.src),
            "stale request should have been pruned by the expiry sweep"
        );
    }

    #[test]
    fn open_file_cache_evicts_least_recently_used_flow() {
        let dir = tempfile::tempdir().unwrap();
        let mut correlator = Correlator::with_capacity(CsvWriter, dir.path(), 1);
        let a = get_request_packet(1, 161);
        let b = {
            let mut p = get_request_packet(2, 161);
            p.src = Endpoint::v4("10.0.0.9".parse().unwrap(), 2);
            p
        };
        correlator.process(&a).unwrap();
        correlator.process(&b).unwrap();
        assert_eq!(correlator.mru.len(), 1);
        correlator.finish().unwrap();
    }
}
