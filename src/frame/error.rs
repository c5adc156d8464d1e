//! Frame-layer errors and the standard HTTP/2 error code set.

use std::fmt;

/// HTTP/2 error codes (RFC 7540 Section 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    /// Graceful shutdown.
    NoError = 0x0,
    /// Protocol error detected.
    ProtocolError = 0x1,
    /// Implementation fault.
    InternalError = 0x2,
    /// Flow control limits exceeded.
    FlowControlError = 0x3,
    /// Settings not acknowledged in time.
    SettingsTimeout = 0x4,
    /// Frame received for closed stream.
    StreamClosed = 0x5,
    /// Frame size incorrect.
    FrameSizeError = 0x6,
    /// Stream not processed.
    RefusedStream = 0x7,
    /// Stream cancelled.
    Cancel = 0x8,
    /// Compression state not updated.
    CompressionError = 0x9,
    /// TCP connection error.
    ConnectError = 0xa,
    /// Processing capacity exceeded.
    EnhanceYourCalm = 0xb,
    /// Negotiated TLS requirements not met.
    InadequateSecurity = 0xc,
    /// HTTP/1.1 required.
    Http11Required = 0xd,
}

impl ErrorCode {
    /// Convert a wire value to an error code.
    ///
    /// Unknown codes are treated as INTERNAL_ERROR, as the protocol permits.
    pub fn from_u32(code: u32) -> Self {
        match code {
            0x0 => ErrorCode::NoError,
            0x1 => ErrorCode::ProtocolError,
            0x2 => ErrorCode::InternalError,
            0x3 => ErrorCode::FlowControlError,
            0x4 => ErrorCode::SettingsTimeout,
            0x5 => ErrorCode::StreamClosed,
            0x6 => ErrorCode::FrameSizeError,
            0x7 => ErrorCode::RefusedStream,
            0x8 => ErrorCode::Cancel,
            0x9 => ErrorCode::CompressionError,
            0xa => ErrorCode::ConnectError,
            0xb => ErrorCode::EnhanceYourCalm,
            0xc => ErrorCode::InadequateSecurity,
            0xd => ErrorCode::Http11Required,
            _ => ErrorCode::InternalError,
        }
    }

    pub fn to_u32(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::NoError => "NO_ERROR",
            ErrorCode::ProtocolError => "PROTOCOL_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::FlowControlError => "FLOW_CONTROL_ERROR",
            ErrorCode::SettingsTimeout => "SETTINGS_TIMEOUT",
            ErrorCode::StreamClosed => "STREAM_CLOSED",
            ErrorCode::FrameSizeError => "FRAME_SIZE_ERROR",
            ErrorCode::RefusedStream => "REFUSED_STREAM",
            ErrorCode::Cancel => "CANCEL",
            ErrorCode::CompressionError => "COMPRESSION_ERROR",
            ErrorCode::ConnectError => "CONNECT_ERROR",
            ErrorCode::EnhanceYourCalm => "ENHANCE_YOUR_CALM",
            ErrorCode::InadequateSecurity => "INADEQUATE_SECURITY",
            ErrorCode::Http11Required => "HTTP_1_1_REQUIRED",
        };
        f.write_str(name)
    }
}

/// Errors from parsing a single frame payload.
///
/// The codec maps these onto connection-level [`ErrorCode`]s via
/// [`FrameError::error_code`]; the structured form exists for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Frame type requires a non-zero stream ID.
    StreamIdRequired { frame_type: u8 },
    /// Frame type must be sent on stream 0.
    StreamZeroRequired { frame_type: u8 },
    /// Payload length does not fit the frame type.
    PayloadLength {
        frame_type: u8,
        expected: usize,
        actual: usize,
    },
    /// Padding length meets or exceeds the remaining payload.
    Padding {
        pad_length: u8,
        payload_length: usize,
    },
}

impl FrameError {
    /// The connection error this parse failure escalates to.
    pub fn error_code(self) -> ErrorCode {
        match self {
            FrameError::PayloadLength { .. } => ErrorCode::FrameSizeError,
            _ => ErrorCode::ProtocolError,
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::StreamIdRequired { frame_type } => {
                write!(
                    f,
                    "frame type 0x{:02x} requires non-zero stream ID",
                    frame_type
                )
            }
            FrameError::StreamZeroRequired { frame_type } => {
                write!(f, "frame type 0x{:02x} must be on stream 0", frame_type)
            }
            FrameError::PayloadLength {
                frame_type,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "frame type 0x{:02x} expected {} payload bytes, got {}",
                    frame_type, expected, actual
                )
            }
            FrameError::Padding {
                pad_length,
                payload_length,
            } => {
                write!(
                    f,
                    "padding length {} exceeds payload length {}",
                    pad_length, payload_length
                )
            }
        }
    }
}

impl std::error::Error for FrameError {}
