//! http2-codec - sans-io HTTP/2 protocol codec.
//!
//! A bidirectional, streaming translator between wire bytes and semantic
//! HTTP/2 events. The codec is a pure state machine: the enclosing session
//! owns the transport, feeds ingress bytes in, and drains the egress buffers
//! the generators fill. Nothing here blocks, spawns, or schedules.
//!
//! # Architecture
//!
//! - `frame`: the 9-byte common header plus per-type frame parsing/writing
//! - `hpack`: header-block compression behind a small adapter contract
//! - `message`: the HTTP message object the codec fills and reads
//! - `codec`: the connection state machine - ingress parsing with the
//!   CONTINUATION interlock, header-block assembly and validation, egress
//!   generation, and the two-step GOAWAY shutdown
//!
//! Flow control accounting, priority trees, and transport I/O are
//! deliberately out of scope; they compose on top.

pub mod codec;
pub mod frame;
pub mod hpack;
pub mod message;

// Re-export commonly used types
pub use crate::codec::{
    ClosingState, Direction, EventSink, Http2Codec, HttpException, SettingsStore,
};
pub use crate::frame::{
    CONNECTION_PREFACE, DEFAULT_HEADER_TABLE_SIZE, DEFAULT_INITIAL_WINDOW_SIZE,
    DEFAULT_MAX_FRAME_SIZE, ErrorCode, FRAME_HEADER_SIZE, FrameHeader, FrameType, Setting,
    SettingId, StreamId,
};
pub use crate::hpack::{HeaderCodec, HeaderField, HeaderSize};
pub use crate::message::{Headers, HttpMessage};
