// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::fmt;

/// Bytes occupied by the body header (MID, revision, NoAck, station,
/// spindle, spare) once the 4-digit length prefix has been stripped.
pub const HEADER_LEN: usize = 16;

/// Minimum total frame length (the length field counts itself).
pub const MIN_FRAME_LEN: usize = 20;

/// Maximum total frame length (the length field is 4 ASCII digits).
pub const MAX_FRAME_LEN: usize = 9999;

/// A decoded frame header plus its raw payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub mid: u16,
    pub revision: u16,
    /// `true` when the controller does not want an ACK/NAK for this message.
    pub no_ack: bool,
    pub station: u8,
    pub spindle: u8,
    pub payload: Vec<u8>,
}

/// Frame-level decode failures. All are recovered locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The first four buffered bytes are not all ASCII digits. The codec
    /// resyncs by discarding exactly one byte before returning.
    InvalidLength,
    /// The parsed length is outside `[MIN_FRAME_LEN, MAX_FRAME_LEN]`. The
    /// codec resyncs by discarding exactly one byte before returning.
    LengthOutOfRange(usize),
    /// `validate_frames` is enabled and one of the header's digit/flag
    /// fields (MID, revision, NoAck, station, spindle) did not parse. The
    /// whole frame (already isolated by its length prefix) is discarded.
    InvalidHeader,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::InvalidLength => write!(f, "frame length field is not ASCII digits"),
            FrameError::LengthOutOfRange(n) => {
                write!(f, "frame length {n} out of range [{MIN_FRAME_LEN}, {MAX_FRAME_LEN}]")
            }
            FrameError::InvalidHeader => write!(f, "frame header failed strict validation"),
        }
    }
}

impl std::error::Error for FrameError {}

/// Stateless length-prefix codec for the Open Protocol ASCII wire format.
///
/// Unlike a streaming byte-at-a-time reader, this codec operates on a
/// whole append-only buffer: callers append newly-read bytes and call
/// [`FrameCodec::decode`] in a loop until it returns `Ok(None)` (need more
/// data). This mirrors the "consume bytes from an append-only buffer"
/// framing contract directly rather than tracking partial-read state
/// across calls.
#[derive(Debug)]
pub struct FrameCodec {
    frames_decoded: u64,
    frame_errors: u64,
    strict: bool,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::with_strict(true)
    }
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a codec honoring `ClientConfig::validate_frames`: when
    /// `strict`, a header field that fails to parse (MID, revision, NoAck,
    /// station, spindle) rejects the whole frame as [`FrameError::InvalidHeader`]
    /// instead of silently defaulting to zero.
    pub fn with_strict(strict: bool) -> Self {
        Self {
            frames_decoded: 0,
            frame_errors: 0,
            strict,
        }
    }

    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    pub fn frame_errors(&self) -> u64 {
        self.frame_errors
    }

    /// Try to decode one frame from `buf`, mutating it to remove consumed
    /// bytes.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` — a complete frame was extracted.
    /// - `Ok(None)` — not enough data buffered yet; nothing was consumed.
    /// - `Err(e)` — the buffer was corrupt at the front; exactly one byte
    ///   was discarded so the next call can attempt to resynchronize.
    pub fn decode(&mut self, buf: &mut Vec<u8>) -> Result<Option<DecodedFrame>, FrameError> {
        buf.retain(|&b| b != 0);

        if buf.len() < 4 {
            return Ok(None);
        }

        let Some(len) = parse_ascii_digits(&buf[0..4]) else {
            buf.remove(0);
            self.frame_errors += 1;
            return Err(FrameError::InvalidLength);
        };

        if !(MIN_FRAME_LEN..=MAX_FRAME_LEN).contains(&len) {
            buf.remove(0);
            self.frame_errors += 1;
            return Err(FrameError::LengthOutOfRange(len));
        }

        if buf.len() < len {
            return Ok(None);
        }

        let body: Vec<u8> = buf[4..len].to_vec();
        buf.drain(0..len);

        match decode_body(&body, self.strict) {
            Some(frame) => {
                self.frames_decoded += 1;
                Ok(Some(frame))
            }
            None => {
                self.frame_errors += 1;
                Err(FrameError::InvalidHeader)
            }
        }
    }

    /// Encode `(mid, payload, expect_ack)` into an on-wire frame: a
    /// 4-digit total length followed by the 16-byte default header and
    /// the payload.
    pub fn encode(mid: u16, payload: &[u8], expect_ack: bool) -> Vec<u8> {
        let mut body = Vec::with_capacity(HEADER_LEN + payload.len());
        body.extend_from_slice(fmt_digits(mid, 4).as_bytes());
        body.extend_from_slice(b"001"); // revision, always default on encode
        body.push(if expect_ack { b'0' } else { b'1' });
        body.extend_from_slice(b"01"); // station
        body.extend_from_slice(b"01"); // spindle
        body.extend_from_slice(b"    "); // spare
        body.extend_from_slice(payload);

        let total_len = body.len() + 4;
        let mut frame = Vec::with_capacity(total_len);
        frame.extend_from_slice(fmt_digits(total_len as u16, 4).as_bytes());
        frame.extend_from_slice(&body);
        frame
    }
}

fn decode_body(body: &[u8], strict: bool) -> Option<DecodedFrame> {
    let mid_digits = parse_ascii_digits(&body[0..4]);
    let revision_digits = parse_ascii_digits(&body[4..7]);
    let no_ack_byte = body.get(7).copied();
    let station_digits = parse_ascii_digits(&body[8..10]);
    let spindle_digits = parse_ascii_digits(&body[10..12]);

    if strict
        && (mid_digits.is_none()
            || revision_digits.is_none()
            || station_digits.is_none()
            || spindle_digits.is_none()
            || !matches!(no_ack_byte, Some(b'0') | Some(b'1')))
    {
        return None;
    }

    let payload = if body.len() > HEADER_LEN {
        body[HEADER_LEN..].to_vec()
    } else {
        Vec::new()
    };
    Some(DecodedFrame {
        mid: mid_digits.unwrap_or(0) as u16,
        revision: revision_digits.unwrap_or(0) as u16,
        no_ack: no_ack_byte == Some(b'1'),
        station: station_digits.unwrap_or(0) as u8,
        spindle: spindle_digits.unwrap_or(0) as u8,
        payload,
    })
}

fn parse_ascii_digits(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

fn fmt_digits(n: u16, width: usize) -> String {
    format!("{:0width$}", n, width = width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encode_then_decode_roundtrip() {
        let frame = FrameCodec::encode(43, b"hello", true);
        let mut buf = frame.clone();
        let mut codec = FrameCodec::new();
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.mid, 43);
        assert_eq!(decoded.revision, 1);
        assert!(!decoded.no_ack);
        assert_eq!(decoded.payload, b"hello");
        assert!(buf.is_empty());
    }

    #[test]
    fn encode_no_ack_flag() {
        let frame = FrameCodec::encode(9999, b"", false);
        let mut codec = FrameCodec::new();
        let decoded = codec.decode(&mut frame.clone()).unwrap().unwrap();
        assert!(decoded.no_ack);
    }

    #[test]
    fn decode_needs_more_data() {
        let mut codec = FrameCodec::new();
        let mut buf = vec![b'0', b'0', b'2'];
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn decode_waits_for_full_body() {
        let frame = FrameCodec::encode(1, b"partial-payload-that-is-long", true);
        let mut codec = FrameCodec::new();
        let mut buf = frame[..frame.len() - 3].to_vec();
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(buf.len(), frame.len() - 3);
    }

    #[test]
    fn invalid_length_digits_resync_one_byte() {
        let mut codec = FrameCodec::new();
        let mut buf = b"abcd".to_vec();
        let err = codec.decode(&mut buf).unwrap_err();
        assert_eq!(err, FrameError::InvalidLength);
        assert_eq!(buf, b"bcd");
    }

    #[test]
    fn length_out_of_range_resync_one_byte() {
        let mut codec = FrameCodec::new();
        // "0001" parses fine as digits but is below MIN_FRAME_LEN.
        let mut buf = b"0001xxxxxxxxxxxxxxxxxx".to_vec();
        let err = codec.decode(&mut buf).unwrap_err();
        assert_eq!(err, FrameError::LengthOutOfRange(1));
        assert_eq!(buf.len(), 21);
    }

    #[test]
    fn strips_embedded_nul_bytes() {
        let frame = FrameCodec::encode(1, b"ab", true);
        let mut buf = Vec::new();
        for &b in &frame {
            buf.push(b);
            buf.push(0); // interleave stray NULs
        }
        let mut codec = FrameCodec::new();
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.mid, 1);
        assert_eq!(decoded.payload, b"ab");
    }

    #[test]
    fn resync_then_recover_valid_frame() {
        let mut codec = FrameCodec::new();
        let mut buf = b"garbage".to_vec();
        let mut errors = 0;
        let frame = FrameCodec::encode(41, b"STATUS", true);
        loop {
            match codec.decode(&mut buf) {
                Ok(Some(_)) => panic!("unexpected frame from garbage"),
                Ok(None) => break,
                Err(_) => errors += 1,
            }
        }
        assert!(errors > 0);
        buf.extend_from_slice(&frame);
        let decoded = loop {
            match codec.decode(&mut buf) {
                Ok(Some(frame)) => break frame,
                Ok(None) => panic!("ran out of buffered bytes before recovering a frame"),
                Err(_) => {}
            }
        };
        assert_eq!(decoded.mid, 41);
        assert_eq!(decoded.payload, b"STATUS");
    }

    #[test]
    fn strict_mode_rejects_malformed_no_ack_flag() {
        let mut codec = FrameCodec::with_strict(true);
        // Body: mid=0041, revision=001, NoAck='x' (invalid), station=01, spindle=01, spare.
        let mut buf = b"00200041001x0101    ".to_vec();
        let err = codec.decode(&mut buf).unwrap_err();
        assert_eq!(err, FrameError::InvalidHeader);
        assert!(buf.is_empty());
    }

    #[test]
    fn lenient_mode_defaults_malformed_fields_to_zero() {
        let mut codec = FrameCodec::with_strict(false);
        let mut buf = b"00200041001x0101    ".to_vec();
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.mid, 41);
        assert!(!frame.no_ack); // 'x' is not '1', defaults to ack-required
    }

    proptest! {
        #[test]
        fn prop_roundtrip(mid in 0u16..=9999, expect_ack in any::<bool>(), payload in prop::collection::vec(1u8..=255u8, 0..40)) {
            let frame = FrameCodec::encode(mid, &payload, expect_ack);
            let mut buf = frame.clone();
            let mut codec = FrameCodec::new();
            let decoded = codec.decode(&mut buf).unwrap().unwrap();
            prop_assert_eq!(decoded.mid, mid);
            prop_assert_eq!(decoded.no_ack, !expect_ack);
            prop_assert_eq!(decoded.payload, payload);
        }

        #[test]
        fn prop_resync_bounded(garbage in prop::collection::vec(any::<u8>(), 0..64)) {
            // Garbage that happens to contain a NUL or digit run is still
            // bounded: resync advances by exactly one byte per error.
            let mut codec = FrameCodec::new();
            let mut buf = garbage.clone();
            let mut errors = 0usize;
            loop {
                match codec.decode(&mut buf) {
                    Ok(Some(_)) => break,
                    Ok(None) => break,
                    Err(_) => {
                        errors += 1;
                        if errors > garbage.len() + 1 {
                            panic!("resync did not terminate");
                        }
                    }
                }
            }
            prop_assert!(errors <= garbage.len());
        }
    }
}
