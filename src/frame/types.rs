//! HTTP/2 frame type definitions.

use bytes::Bytes;

/// HTTP/2 frame types (RFC 7540 Section 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    Data = 0x0,
    Headers = 0x1,
    Priority = 0x2,
    RstStream = 0x3,
    Settings = 0x4,
    PushPromise = 0x5,
    Ping = 0x6,
    GoAway = 0x7,
    WindowUpdate = 0x8,
    Continuation = 0x9,
    /// Parsed only far enough to be skipped.
    AltSvc = 0xa,
}

impl FrameType {
    /// Try to convert a byte to a frame type.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x0 => Some(FrameType::Data),
            0x1 => Some(FrameType::Headers),
            0x2 => Some(FrameType::Priority),
            0x3 => Some(FrameType::RstStream),
            0x4 => Some(FrameType::Settings),
            0x5 => Some(FrameType::PushPromise),
            0x6 => Some(FrameType::Ping),
            0x7 => Some(FrameType::GoAway),
            0x8 => Some(FrameType::WindowUpdate),
            0x9 => Some(FrameType::Continuation),
            0xa => Some(FrameType::AltSvc),
            _ => None,
        }
    }

    /// Whether this frame type carries a header-block fragment and therefore
    /// participates in the CONTINUATION interlock.
    pub fn affects_compression(self) -> bool {
        matches!(
            self,
            FrameType::Headers | FrameType::PushPromise | FrameType::Continuation
        )
    }
}

/// Frame flag bits.
pub mod flags {
    /// DATA/HEADERS: last frame on the stream.
    pub const END_STREAM: u8 = 0x1;
    /// HEADERS/PUSH_PROMISE/CONTINUATION: header block is complete.
    pub const END_HEADERS: u8 = 0x4;
    /// DATA/HEADERS/PUSH_PROMISE: padding is present.
    pub const PADDED: u8 = 0x8;
    /// HEADERS: priority section is present.
    pub const PRIORITY: u8 = 0x20;
    /// SETTINGS/PING: acknowledgment.
    pub const ACK: u8 = 0x1;
}

/// Stream identifier (31 bits, high bit reserved).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct StreamId(pub u32);

impl StreamId {
    /// Connection-level stream (stream 0).
    pub const CONNECTION: StreamId = StreamId(0);

    /// Create a new stream ID, masking the reserved bit.
    #[inline]
    pub fn new(id: u32) -> Self {
        StreamId(id & super::MAX_STREAM_ID)
    }

    /// Get the raw stream ID value.
    #[inline]
    pub fn value(self) -> u32 {
        self.0
    }

    /// Check if this is the connection-level stream.
    #[inline]
    pub fn is_connection_level(self) -> bool {
        self.0 == 0
    }

    /// Check if this is a client-initiated stream (odd numbers).
    #[inline]
    pub fn is_client_initiated(self) -> bool {
        self.0 % 2 == 1
    }

    /// Check if this is a server-initiated stream (even numbers, non-zero).
    #[inline]
    pub fn is_server_initiated(self) -> bool {
        self.0 != 0 && self.0 % 2 == 0
    }
}

impl From<u32> for StreamId {
    fn from(id: u32) -> Self {
        StreamId::new(id)
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The common 9-byte frame header.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameHeader {
    /// Payload length (24 bits).
    pub length: u32,
    /// Raw frame type byte.
    pub frame_type: u8,
    /// Frame flags.
    pub flags: u8,
    /// Stream identifier.
    pub stream_id: StreamId,
}

impl FrameHeader {
    pub fn new(frame_type: FrameType, flags: u8, stream_id: StreamId, length: u32) -> Self {
        Self {
            length,
            frame_type: frame_type as u8,
            flags,
            stream_id,
        }
    }

    /// Get the frame type as an enum, if known.
    pub fn get_type(&self) -> Option<FrameType> {
        FrameType::from_u8(self.frame_type)
    }

    /// Check if a flag is set.
    #[inline]
    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }
}

/// Stream priority section (parsed and discarded; no priority tree here).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Priority {
    /// Whether the dependency is exclusive.
    pub exclusive: bool,
    /// Stream this one depends on.
    pub dependency: StreamId,
    /// Weight (wire value 0-255, meaning 1-256).
    pub weight: u8,
}

/// DATA frame (type=0x0), padding already removed.
#[derive(Debug, Clone)]
pub struct DataFrame {
    pub stream_id: StreamId,
    pub end_stream: bool,
    pub data: Bytes,
}

/// HEADERS frame (type=0x1), padding already removed.
#[derive(Debug, Clone)]
pub struct HeadersFrame {
    pub stream_id: StreamId,
    pub end_stream: bool,
    pub end_headers: bool,
    pub priority: Option<Priority>,
    /// Header-block fragment, still compressed.
    pub header_block: Bytes,
}

/// PRIORITY frame (type=0x2).
#[derive(Debug, Clone, Copy)]
pub struct PriorityFrame {
    pub stream_id: StreamId,
    pub priority: Priority,
}

/// RST_STREAM frame (type=0x3).
#[derive(Debug, Clone, Copy)]
pub struct RstStreamFrame {
    pub stream_id: StreamId,
    pub error_code: u32,
}

/// SETTINGS frame (type=0x4).
#[derive(Debug, Clone)]
pub struct SettingsFrame {
    pub ack: bool,
    pub settings: Vec<Setting>,
}

/// Individual setting in a SETTINGS frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Setting {
    pub id: SettingId,
    pub value: u32,
}

/// Setting identifiers (RFC 7540 Section 6.5.2).
///
/// Unknown identifiers are carried through rather than rejected; the peer is
/// allowed to send settings we do not understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingId {
    HeaderTableSize,
    EnablePush,
    MaxConcurrentStreams,
    InitialWindowSize,
    MaxFrameSize,
    MaxHeaderListSize,
    Unknown(u16),
}

impl SettingId {
    pub fn from_u16(id: u16) -> Self {
        match id {
            0x1 => SettingId::HeaderTableSize,
            0x2 => SettingId::EnablePush,
            0x3 => SettingId::MaxConcurrentStreams,
            0x4 => SettingId::InitialWindowSize,
            0x5 => SettingId::MaxFrameSize,
            0x6 => SettingId::MaxHeaderListSize,
            _ => SettingId::Unknown(id),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            SettingId::HeaderTableSize => 0x1,
            SettingId::EnablePush => 0x2,
            SettingId::MaxConcurrentStreams => 0x3,
            SettingId::InitialWindowSize => 0x4,
            SettingId::MaxFrameSize => 0x5,
            SettingId::MaxHeaderListSize => 0x6,
            SettingId::Unknown(id) => id,
        }
    }
}

/// PUSH_PROMISE frame (type=0x5), padding already removed.
#[derive(Debug, Clone)]
pub struct PushPromiseFrame {
    /// Stream the promise is sent on (the associated stream).
    pub stream_id: StreamId,
    pub end_headers: bool,
    /// Stream reserved for the pushed response.
    pub promised_stream_id: StreamId,
    /// Header-block fragment, still compressed.
    pub header_block: Bytes,
}

/// PING frame (type=0x6).
#[derive(Debug, Clone, Copy)]
pub struct PingFrame {
    pub ack: bool,
    /// Opaque payload, big-endian on the wire.
    pub opaque: u64,
}

/// GOAWAY frame (type=0x7).
#[derive(Debug, Clone)]
pub struct GoAwayFrame {
    pub last_stream_id: StreamId,
    pub error_code: u32,
    pub debug_data: Bytes,
}

/// WINDOW_UPDATE frame (type=0x8).
///
/// A zero increment is representable; whether it is an error depends on the
/// stream it arrives on, which is the codec's call.
#[derive(Debug, Clone, Copy)]
pub struct WindowUpdateFrame {
    pub stream_id: StreamId,
    pub increment: u32,
}

/// CONTINUATION frame (type=0x9).
#[derive(Debug, Clone)]
pub struct ContinuationFrame {
    pub stream_id: StreamId,
    pub end_headers: bool,
    /// Header-block fragment, still compressed.
    pub header_block: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_type_from_u8() {
        assert_eq!(FrameType::from_u8(0x0), Some(FrameType::Data));
        assert_eq!(FrameType::from_u8(0x1), Some(FrameType::Headers));
        assert_eq!(FrameType::from_u8(0x9), Some(FrameType::Continuation));
        assert_eq!(FrameType::from_u8(0xa), Some(FrameType::AltSvc));
        assert_eq!(FrameType::from_u8(0xb), None);
        assert_eq!(FrameType::from_u8(0xff), None);
    }

    #[test]
    fn test_frame_type_affects_compression() {
        assert!(FrameType::Headers.affects_compression());
        assert!(FrameType::PushPromise.affects_compression());
        assert!(FrameType::Continuation.affects_compression());
        assert!(!FrameType::Data.affects_compression());
        assert!(!FrameType::Settings.affects_compression());
        assert!(!FrameType::GoAway.affects_compression());
    }

    #[test]
    fn test_stream_id_masks_reserved_bit() {
        let id = StreamId::new(0x8000_0001);
        assert_eq!(id.value(), 1);
    }

    #[test]
    fn test_stream_id_parity() {
        assert!(StreamId::new(1).is_client_initiated());
        assert!(StreamId::new(3).is_client_initiated());
        assert!(!StreamId::new(2).is_client_initiated());

        assert!(StreamId::new(2).is_server_initiated());
        assert!(!StreamId::new(0).is_server_initiated());
        assert!(!StreamId::new(5).is_server_initiated());
    }

    #[test]
    fn test_stream_id_connection_level() {
        assert!(StreamId::CONNECTION.is_connection_level());
        assert!(!StreamId::new(1).is_connection_level());
    }

    #[test]
    fn test_frame_header_flags() {
        let header = FrameHeader::new(
            FrameType::Headers,
            flags::END_STREAM | flags::END_HEADERS,
            StreamId::new(1),
            0,
        );
        assert!(header.has_flag(flags::END_STREAM));
        assert!(header.has_flag(flags::END_HEADERS));
        assert!(!header.has_flag(flags::PADDED));
        assert_eq!(header.get_type(), Some(FrameType::Headers));
    }

    #[test]
    fn test_setting_id_roundtrip() {
        let ids = [
            SettingId::HeaderTableSize,
            SettingId::EnablePush,
            SettingId::MaxConcurrentStreams,
            SettingId::InitialWindowSize,
            SettingId::MaxFrameSize,
            SettingId::MaxHeaderListSize,
            SettingId::Unknown(0x99),
        ];
        for id in ids {
            assert_eq!(SettingId::from_u16(id.to_u16()), id);
        }
    }
}
