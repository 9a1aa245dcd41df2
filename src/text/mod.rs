//! The round-trip textual format (§4.3), grounded on the original
//! implementation's `xml-write.c`/`xml-read.c`. Not validated against
//! any XML schema or grammar beyond what this module itself enforces:
//! it is a small closed vocabulary of elements whose leaf content is
//! always plain decimal, hex or dotted-decimal text, so there is no
//! entity escaping to do in either direction.

pub mod reader;
pub mod writer;

pub use reader::read_packets;
pub use writer::TextWriter;
