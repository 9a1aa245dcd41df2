//! Error taxonomy for BER decoding, SNMP message decoding, the textual
//! round-trip format, and the flow correlator.
//!
//! Most variants here are non-fatal: the caller decides whether to
//! abandon the current subtree, abandon the whole packet, or skip to
//! the next input while the pipeline keeps running. See §7 of the
//! format documentation for the disposition of each kind.

use std::fmt;
use std::path::PathBuf;

/// ASN.1 tag class, as carried by a BER identifier octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    Universal,
    Application,
    Context,
    Private,
}

/// Whether a BER element's content octets are a raw value or a nested
/// sequence of elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Form {
    Primitive,
    Constructed,
}

/// A fully decoded `(class, form, tag number)` triple, independent of
/// any particular SNMP grammar position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    pub class: TagClass,
    pub form: Form,
    pub id: u32,
}

impl Tag {
    pub const fn new(class: TagClass, form: Form, id: u32) -> Self {
        Tag { class, form, id }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = match self.class {
            TagClass::Universal => "universal",
            TagClass::Application => "application",
            TagClass::Context => "context",
            TagClass::Private => "private",
        };
        let form = match self.form {
            Form::Primitive => "primitive",
            Form::Constructed => "constructed",
        };
        write!(f, "{class}/{form}/{}", self.id)
    }
}

/// Errors raised by the BER primitive parser (§4.1). These are always
/// scoped to a single element.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BerError {
    /// The declared length of an element exceeds the remaining buffer
    /// and the input was marked complete (not a partial capture).
    #[error("truncated BER element")]
    Truncated,
    /// The identifier octet(s) could not be decoded, e.g. an extended
    /// tag whose continuation bit never clears before the buffer ends.
    #[error("malformed tag")]
    BadTag,
    /// The length octet(s) could not be decoded.
    #[error("malformed length")]
    BadLength,
    /// An integer value needed more non-sign bytes than its target
    /// type allows.
    #[error("integer overflow decoding {0}")]
    Overflow(Tag),
    /// An OID sub-identifier does not fit in 32 unsigned bits.
    #[error("sub-identifier overflow in object identifier")]
    OidOverflow,
    /// The decoded `(class, form, tag)` did not match what the calling
    /// grammar position expected.
    #[error("unexpected tag: expected {expected}, got {got}")]
    UnexpectedTag { expected: Tag, got: Tag },
}

/// Errors raised while driving the BER parser through the SNMP message
/// grammar (§4.2).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnmpError {
    #[error(transparent)]
    Ber(#[from] BerError),
    /// `version` decoded to something other than 0, 1 or 3.
    #[error("unsupported SNMP version {0}")]
    UnsupportedVersion(i32),
    /// A PDU tag that is illegal for the message's version, e.g. a
    /// `GetBulkRequest` inside an SNMPv1 message.
    #[error("PDU type not legal for SNMP version {version}")]
    VersionMismatch { version: i32 },
}

/// Raised by the textual reader (§4.3) when an element cannot be
/// interpreted. The reader recovers by skipping to the next `packet`
/// element; this type lets the driver log a diagnostic first.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed trace text at byte {offset}: {reason}")]
pub struct TextError {
    pub offset: usize,
    pub reason: String,
}

impl TextError {
    pub fn new(offset: usize, reason: impl Into<String>) -> Self {
        TextError {
            offset,
            reason: reason.into(),
        }
    }
}

/// Raised by the flow correlator's open-file LRU (§4.5).
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// A per-flow sink file could not be opened or reopened. The
    /// correlator falls back to the primary sink for this packet.
    #[error("failed to open flow file {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The platform reports zero usable file descriptors at LRU
    /// construction time. Fatal: the correlator cannot function.
    #[error("no file descriptors available for the open-flow cache")]
    ResourceExhausted,
}
