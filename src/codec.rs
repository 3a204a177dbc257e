//! Newline-delimited frame codec shared by client and server.
//!
//! Wraps [`tokio_util::codec::LinesCodec`] with a fixed maximum line length
//! to prevent memory exhaustion from an unterminated or oversized frame.
//! Each `\n`-terminated UTF-8 line is one complete frame; JSON decoding of
//! the frame text happens one layer up, in [`crate::server`] and
//! [`crate::client`].
//!
//! Malformed lines (overlong, or not valid UTF-8) decode to
//! [`Frame::Malformed`] rather than an `Err`: a decoder error would trip
//! [`FramedRead`](tokio_util::codec::FramedRead)'s terminal error state and
//! end the stream, while the protocol requires answering `-32700` in-band
//! and reading on. `Err` is reserved for real transport I/O failures.
//!
//! `decode_eof` yields any unterminated trailing text when the peer closes
//! the stream, so a final frame missing its newline still gets one decode
//! attempt.

use std::io::ErrorKind;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::{Result, WireError};

/// Maximum frame length accepted on the inbound stream: 1 MiB.
///
/// Longer lines decode to [`Frame::Malformed`] rather than allocating;
/// the underlying codec then discards input up to the next newline, so the
/// stream recovers at the following frame boundary.
pub const MAX_FRAME_BYTES: usize = 1_048_576;

/// One decoded unit of the inbound stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete UTF-8 line, without its trailing newline.
    Line(String),
    /// A line that violated the framing rules (overlong or invalid UTF-8);
    /// carries the reason for the resulting parse-error response.
    Malformed(String),
}

/// Line codec for bidirectional skill-call streams.
#[derive(Debug)]
pub struct WireCodec(LinesCodec);

impl WireCodec {
    /// Create a codec with the default [`MAX_FRAME_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self(LinesCodec::new_with_max_length(MAX_FRAME_BYTES))
    }
}

impl Default for WireCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for WireCodec {
    type Item = Frame;
    type Error = WireError;

    /// Decode the next newline-terminated frame from `src`.
    ///
    /// Returns `Ok(None)` while `src` holds no complete frame yet (buffering).
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        map_decode(self.0.decode(src))
    }

    /// Decode the final, possibly unterminated frame at end of stream.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        map_decode(self.0.decode_eof(src))
    }
}

impl Encoder<String> for WireCodec {
    type Error = WireError;

    /// Encode `item` as an `item\n` frame into `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Io`] on underlying I/O failures; the length limit
    /// is a decoder-side concern only.
    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<()> {
        self.0.encode(item, dst).map_err(|e| match e {
            LinesCodecError::MaxLineLengthExceeded => {
                WireError::Codec(format!("frame too long: exceeded {MAX_FRAME_BYTES} bytes"))
            }
            LinesCodecError::Io(io_err) => WireError::Io(io_err.to_string()),
        })
    }
}

// ── Private helper ────────────────────────────────────────────────────────────

/// Map the inner codec's outcome onto [`Frame`]s, keeping malformed lines
/// on the `Ok` path so the framed stream never enters its error state.
fn map_decode(
    decoded: std::result::Result<Option<String>, LinesCodecError>,
) -> Result<Option<Frame>> {
    match decoded {
        Ok(line) => Ok(line.map(Frame::Line)),
        Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(Frame::Malformed(format!(
            "frame too long: exceeded {MAX_FRAME_BYTES} bytes"
        )))),
        // LinesCodec reports a line that is not valid UTF-8 as an
        // InvalidData I/O error, with the offending bytes already consumed.
        Err(LinesCodecError::Io(io_err)) if io_err.kind() == ErrorKind::InvalidData => Ok(Some(
            Frame::Malformed(format!("frame is not valid UTF-8: {io_err}")),
        )),
        Err(LinesCodecError::Io(io_err)) => Err(WireError::Io(io_err.to_string())),
    }
}
