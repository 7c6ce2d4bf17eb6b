//! CR-LF line framing over the transport.
//!
//! [`LineCodec`] frames the byte stream into protocol lines: inbound, one
//! decoded item per line with the terminator stripped (bare LF tolerated);
//! outbound, the CR-LF terminator is always appended. Non-UTF-8 bytes are
//! replaced rather than rejected, since parsing further up never fails on
//! malformed input.

use std::io;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Upper bound on a buffered inbound line. Servers cap lines far below
/// this; the limit only protects the decode buffer from unbounded growth
/// on a stream that never sends a terminator.
pub const MAX_LINE_LEN: usize = 8191;

/// Codec turning a byte stream into `String` lines and back.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineCodec {
    // Offset already scanned for a terminator, so repeated decode calls
    // on a slow stream stay linear.
    scanned: usize,
}

impl LineCodec {
    pub fn new() -> LineCodec {
        LineCodec::default()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, io::Error> {
        let newline = buf[self.scanned..].iter().position(|&b| b == b'\n');

        match newline {
            Some(offset) => {
                let end = self.scanned + offset;
                let line = buf.split_to(end + 1);
                self.scanned = 0;

                let mut line = &line[..end];
                if line.ends_with(b"\r") {
                    line = &line[..line.len() - 1];
                }

                Ok(Some(String::from_utf8_lossy(line).into_owned()))
            }
            None if buf.len() > MAX_LINE_LEN => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line exceeds {MAX_LINE_LEN} bytes without a terminator"),
            )),
            None => {
                self.scanned = buf.len();
                Ok(None)
            }
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = io::Error;

    fn encode(&mut self, line: String, buf: &mut BytesMut) -> Result<(), io::Error> {
        buf.reserve(line.len() + 2);
        buf.put_slice(line.as_bytes());
        buf.put_slice(b"\r\n");
        Ok(())
    }
}
