// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Length-prefixed ASCII framing for Open Protocol over TCP.
//!
//! TCP is a stream protocol without message boundaries. Open Protocol adds
//! ASCII length-prefix framing to delimit messages:
//!
//! ```text
//! +------------------+--------------------------------------------+
//! | Length (4 ASCII  | Body: 20-byte header + payload              |
//! | decimal digits,  |   MID(4) Rev(3) NoAck(1) Stn(2) Sp(2) (4)   |
//! | total incl self) |                                              |
//! +------------------+--------------------------------------------+
//! ```
//!
//! The length field counts itself, so the minimum valid frame is 20 (an
//! empty payload) and the maximum is 9999 (the field is 4 ASCII digits).

mod codec;

pub use codec::{DecodedFrame, FrameCodec, FrameError, HEADER_LEN, MAX_FRAME_LEN, MIN_FRAME_LEN};
