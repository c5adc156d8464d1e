//! Error value delivered through the event sink.

use std::fmt;

use crate::frame::{ErrorCode, StreamId};

/// Exception reported via [`EventSink::on_error`](crate::codec::EventSink).
///
/// Connection-tier failures carry a codec [`ErrorCode`]; stream-tier
/// failures carry an HTTP status for the response the session should
/// synthesize. The two channels are deliberately kept apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpException {
    message: String,
    codec_status: Option<ErrorCode>,
    http_status: Option<u16>,
}

impl HttpException {
    /// A connection-level protocol failure.
    pub fn connection(code: ErrorCode) -> Self {
        Self {
            message: format!("connection error: {}", code),
            codec_status: Some(code),
            http_status: None,
        }
    }

    /// A stream-level failure the session should answer with `status`.
    pub fn stream(stream_id: StreamId, status: u16, reason: impl fmt::Display) -> Self {
        Self {
            message: format!(
                "stream error: stream={} status={} error: {}",
                stream_id, status, reason
            ),
            codec_status: None,
            http_status: Some(status),
        }
    }

    pub fn codec_status(&self) -> Option<ErrorCode> {
        self.codec_status
    }

    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HttpException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpException {}
