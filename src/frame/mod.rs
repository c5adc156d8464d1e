//! HTTP/2 framing: the 9-byte common header plus one parse and one write
//! function per frame type.
//!
//! ```text
//! +-----------------------------------------------+
//! |                 Length (24)                   |
//! +---------------+---------------+---------------+
//! |   Type (8)    |   Flags (8)   |
//! +-+-------------+---------------+-------------------------------+
//! |R|                 Stream Identifier (31)                      |
//! +=+=============================================================+
//! |                   Frame Payload (0...)                      ...
//! +---------------------------------------------------------------+
//! ```
//!
//! The functions here are pure: parsers take the already-read common header
//! and a complete payload slice, writers append one whole frame to a caller
//! buffer and return the byte count. Sequencing rules (continuation
//! interlock, stream-id monotonicity, settings value ranges) live in the
//! codec, not here.

mod decode;
mod encode;
mod error;
mod types;

pub use decode::{
    parse_continuation, parse_data, parse_frame_header, parse_goaway, parse_headers, parse_ping,
    parse_priority, parse_push_promise, parse_rst_stream, parse_settings, parse_window_update,
};
pub use encode::{
    write_continuation, write_data, write_goaway, write_headers, write_ping, write_priority,
    write_push_promise, write_rst_stream, write_settings, write_settings_ack, write_window_update,
};
pub use error::{ErrorCode, FrameError};
pub use types::*;

/// Frame header size in bytes.
pub const FRAME_HEADER_SIZE: usize = 9;

/// Connection preface sent by clients.
pub const CONNECTION_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

/// Largest frame payload the protocol can express (2^24 - 1).
pub const MAX_FRAME_PAYLOAD_LENGTH: u32 = 16_777_215;

/// Smallest legal value for the MAX_FRAME_SIZE setting, and its default.
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16_384;

/// Default HPACK header table size.
pub const DEFAULT_HEADER_TABLE_SIZE: u32 = 4_096;

/// Default initial flow-control window size.
pub const DEFAULT_INITIAL_WINDOW_SIZE: u32 = 65_535;

/// Largest flow-control window / WINDOW_UPDATE delta (2^31 - 1).
pub const MAX_WINDOW_SIZE: u32 = 0x7FFF_FFFF;

/// Largest stream identifier (31 bits).
pub const MAX_STREAM_ID: u32 = 0x7FFF_FFFF;
