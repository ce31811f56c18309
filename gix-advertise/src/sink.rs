//! Line sinks carrying formatted advertisement lines to the peer.

use std::io::{self, Write as _};

use bstr::BStr;
use gix_packetline_blocking as pkt;

/// A destination for already-formatted advertisement lines.
///
/// Lines handed to a sink always end with LF and are never empty. Any framing
/// below the line level is the sink's own business; the advertiser never sees
/// it.
pub trait LineSink {
    /// Write one complete advertisement line.
    fn write_line(&mut self, line: &BStr) -> io::Result<()>;
    /// Terminate the stream with the sink's final framing marker.
    fn end(&mut self) -> io::Result<()>;
}

/// A sink framing each line as one pkt-line, with `end` emitting a flush
/// packet.
pub struct PacketLineSink<W: io::Write> {
    out: pkt::Writer<W>,
}

impl<W: io::Write> PacketLineSink<W> {
    /// Create a new sink over `write`.
    pub fn new(write: W) -> Self {
        Self {
            out: pkt::Writer::new(write),
        }
    }
}

impl<W: io::Write> LineSink for PacketLineSink<W> {
    fn write_line(&mut self, line: &BStr) -> io::Result<()> {
        self.out.write_all(line)
    }

    fn end(&mut self) -> io::Result<()> {
        pkt::encode::flush_to_write(self.out.inner_mut())?;
        self.out.inner_mut().flush()
    }
}

/// A sink forwarding lines verbatim, LF-separated, with `end` flushing the
/// underlying writer.
pub struct PlainSink<W: io::Write> {
    out: W,
}

impl<W: io::Write> PlainSink<W> {
    /// Create a new sink over `write`.
    pub fn new(write: W) -> Self {
        Self { out: write }
    }
}

impl<W: io::Write> LineSink for PlainSink<W> {
    fn write_line(&mut self, line: &BStr) -> io::Result<()> {
        self.out.write_all(line)
    }

    fn end(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
