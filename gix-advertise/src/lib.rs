//! gix-advertise: encoding of the opening reference advertisement of the
//! smart fetch/push protocols.
//!
//! The [`Advertiser`] turns a set of named refs plus registered capability
//! tokens into the client-compatible advertisement byte stream: one line per
//! resolvable ref, the capability section on the first line only, optional
//! peeled companion lines for annotated tags, and synthetic `.have` lines
//! sourced from alternate object stores.
//!
//! Object access, the ref container and the output framing are seams the host
//! provides, see [`source`] and [`sink`].
#![deny(missing_docs, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod sink;
pub mod source;
mod advertiser;

pub use advertiser::{Advertiser, DOT_HAVE};
pub use sink::{LineSink, PacketLineSink, PlainSink};
pub use source::{AdvertisedMark, ObjectSource, RefSource, ResolvedObject};

/// The error returned by advertisement operations.
///
/// Failures to resolve objects are not errors anywhere in this crate; the
/// affected line is silently dropped instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The sink failed while writing a line or terminating the stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A ref name contained a NUL byte and cannot appear on the wire.
    #[error("ref name contains NUL: {name:?}")]
    InvalidRefName {
        /// The offending name.
        name: bstr::BString,
    },
    /// Capability or tag-dereferencing configuration was attempted after the
    /// first line had been emitted.
    #[error("advertisement already started, configuration is frozen")]
    AfterFirstLine,
    /// A line emission was attempted after [`Advertiser::end`].
    #[error("advertisement stream was already terminated")]
    SinkClosed,
}
