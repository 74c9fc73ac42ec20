//! Inbound TCP data framing.
//!
//! With header inclusion enabled the modem wraps every inbound TCP
//! segment as:
//!
//! ```text
//! +IPD,<decimal length>:<payload bytes>
//! ```
//!
//! [`IpdDecoder`] extracts one payload at a time from the persistent
//! spillover buffer. Unsolicited notifications or echo ahead of the
//! marker are discarded together with the header once a complete frame
//! is available; bytes past the declared length stay in the buffer for
//! the next read.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;

use crate::error::ModemError;
use crate::matcher;

/// Marker opening every framed inbound segment.
pub const DATA_MARKER: &str = "+IPD,";

/// Separates the decimal length field from the payload.
const LENGTH_DELIMITER: u8 = b':';

/// Upper bound on length-field digits; anything longer is a corrupt
/// header, not a frame still in flight.
const MAX_LENGTH_DIGITS: usize = 8;

/// Decoder for `+IPD,<len>:<payload>` frames.
#[derive(Debug, Default)]
pub struct IpdDecoder;

impl Decoder for IpdDecoder {
    type Item = Bytes;
    type Error = ModemError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, ModemError> {
        let Some(marker) = matcher::find_from(src, 0, DATA_MARKER.as_bytes()) else {
            return Ok(None);
        };
        let digits_start = marker + DATA_MARKER.len();

        let Some(delim) = src[digits_start..]
            .iter()
            .position(|&b| b == LENGTH_DELIMITER)
        else {
            if src.len() - digits_start > MAX_LENGTH_DIGITS {
                return Err(ModemError::FrameParse(
                    "length field not terminated".into(),
                ));
            }
            // Header still arriving.
            return Ok(None);
        };

        let digits = &src[digits_start..digits_start + delim];
        let length: usize = std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                ModemError::FrameParse(format!(
                    "bad length field: [ {} ]",
                    String::from_utf8_lossy(digits)
                ))
            })?;

        let payload_start = digits_start + delim + 1;
        if src.len() < payload_start + length {
            // Declared payload not fully arrived.
            return Ok(None);
        }

        // Preamble and header are consumed along with the payload.
        src.advance(payload_start);
        Ok(Some(src.split_to(length).freeze()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(bytes: &[u8]) -> BytesMut {
        BytesMut::from(bytes)
    }

    #[test]
    fn extracts_declared_length_and_keeps_remainder() {
        let mut src = buf(b"+IPD,5:HELLOworld");
        let frame = IpdDecoder.decode(&mut src).unwrap().unwrap();
        assert_eq!(&frame[..], b"HELLO");
        assert_eq!(&src[..], b"world");
    }

    #[test]
    fn discards_preamble_before_marker() {
        let mut src = buf(b"\r\nRECV FROM:1.2.3.4\r\n+IPD,2:Hi");
        let frame = IpdDecoder.decode(&mut src).unwrap().unwrap();
        assert_eq!(&frame[..], b"Hi");
        assert!(src.is_empty());
    }

    #[test]
    fn incomplete_header_waits() {
        let mut src = buf(b"+IPD,12");
        assert!(IpdDecoder.decode(&mut src).unwrap().is_none());
        assert_eq!(&src[..], b"+IPD,12");
    }

    #[test]
    fn incomplete_payload_waits() {
        let mut src = buf(b"+IPD,10:short");
        assert!(IpdDecoder.decode(&mut src).unwrap().is_none());
        // Nothing consumed until the whole frame is present.
        assert_eq!(&src[..], b"+IPD,10:short");
    }

    #[test]
    fn no_marker_waits() {
        let mut src = buf(b"random unsolicited noise");
        assert!(IpdDecoder.decode(&mut src).unwrap().is_none());
    }

    #[test]
    fn malformed_length_is_an_error() {
        let mut src = buf(b"+IPD,5x:HELLO");
        assert!(matches!(
            IpdDecoder.decode(&mut src),
            Err(ModemError::FrameParse(_))
        ));
    }

    #[test]
    fn empty_length_is_an_error() {
        let mut src = buf(b"+IPD,:x");
        assert!(matches!(
            IpdDecoder.decode(&mut src),
            Err(ModemError::FrameParse(_))
        ));
    }

    #[test]
    fn runaway_length_field_is_an_error() {
        let mut src = buf(b"+IPD,123456789012345");
        assert!(matches!(
            IpdDecoder.decode(&mut src),
            Err(ModemError::FrameParse(_))
        ));
    }

    #[test]
    fn zero_length_frame_is_empty() {
        let mut src = buf(b"+IPD,0:rest");
        let frame = IpdDecoder.decode(&mut src).unwrap().unwrap();
        assert!(frame.is_empty());
        assert_eq!(&src[..], b"rest");
    }

    #[test]
    fn back_to_back_frames_decode_in_order() {
        let mut src = buf(b"+IPD,3:one+IPD,3:two");
        assert_eq!(&IpdDecoder.decode(&mut src).unwrap().unwrap()[..], b"one");
        assert_eq!(&IpdDecoder.decode(&mut src).unwrap().unwrap()[..], b"two");
        assert!(IpdDecoder.decode(&mut src).unwrap().is_none());
    }
}
