//! HTTP/2 frame parsing.
//!
//! Each function takes the already-parsed common header and the complete
//! frame payload. Callers guarantee the payload slice is exactly
//! `header.length` bytes; these functions own the per-type layout rules.

use bytes::Bytes;

use super::error::FrameError;
use super::types::*;

/// Parse the 9-byte common frame header.
///
/// The caller must supply at least [`super::FRAME_HEADER_SIZE`] bytes.
pub fn parse_frame_header(buf: &[u8]) -> FrameHeader {
    debug_assert!(buf.len() >= super::FRAME_HEADER_SIZE);

    let length = ((buf[0] as u32) << 16) | ((buf[1] as u32) << 8) | (buf[2] as u32);
    let frame_type = buf[3];
    let flags = buf[4];
    // Reserved high bit is ignored on read.
    let stream_id = StreamId::new(read_u32(&buf[5..9]));

    FrameHeader {
        length,
        frame_type,
        flags,
        stream_id,
    }
}

/// Parse a DATA frame payload.
pub fn parse_data(header: &FrameHeader, payload: &[u8]) -> Result<DataFrame, FrameError> {
    require_stream(header)?;
    let data = strip_padding(header, payload)?;

    Ok(DataFrame {
        stream_id: header.stream_id,
        end_stream: header.has_flag(flags::END_STREAM),
        data: Bytes::copy_from_slice(data),
    })
}

/// Parse a HEADERS frame payload, including the optional priority section.
pub fn parse_headers(header: &FrameHeader, payload: &[u8]) -> Result<HeadersFrame, FrameError> {
    require_stream(header)?;
    let mut payload = strip_padding(header, payload)?;

    let priority = if header.has_flag(flags::PRIORITY) {
        if payload.len() < 5 {
            return Err(FrameError::PayloadLength {
                frame_type: header.frame_type,
                expected: 5,
                actual: payload.len(),
            });
        }
        let pri = parse_priority_section(payload);
        payload = &payload[5..];
        Some(pri)
    } else {
        None
    };

    Ok(HeadersFrame {
        stream_id: header.stream_id,
        end_stream: header.has_flag(flags::END_STREAM),
        end_headers: header.has_flag(flags::END_HEADERS),
        priority,
        header_block: Bytes::copy_from_slice(payload),
    })
}

/// Parse a PRIORITY frame payload.
pub fn parse_priority(header: &FrameHeader, payload: &[u8]) -> Result<PriorityFrame, FrameError> {
    require_stream(header)?;
    if payload.len() != 5 {
        return Err(FrameError::PayloadLength {
            frame_type: header.frame_type,
            expected: 5,
            actual: payload.len(),
        });
    }

    Ok(PriorityFrame {
        stream_id: header.stream_id,
        priority: parse_priority_section(payload),
    })
}

/// Parse a RST_STREAM frame payload.
pub fn parse_rst_stream(
    header: &FrameHeader,
    payload: &[u8],
) -> Result<RstStreamFrame, FrameError> {
    require_stream(header)?;
    if payload.len() != 4 {
        return Err(FrameError::PayloadLength {
            frame_type: header.frame_type,
            expected: 4,
            actual: payload.len(),
        });
    }

    Ok(RstStreamFrame {
        stream_id: header.stream_id,
        error_code: read_u32(payload),
    })
}

/// Parse a SETTINGS frame payload.
///
/// An ACK with a non-empty payload and a payload not divisible into
/// (id, value) pairs are both rejected here. Per-value range checks are the
/// codec's job.
pub fn parse_settings(header: &FrameHeader, payload: &[u8]) -> Result<SettingsFrame, FrameError> {
    require_stream_zero(header)?;

    let ack = header.has_flag(flags::ACK);
    if ack && !payload.is_empty() {
        return Err(FrameError::PayloadLength {
            frame_type: header.frame_type,
            expected: 0,
            actual: payload.len(),
        });
    }
    if payload.len() % 6 != 0 {
        return Err(FrameError::PayloadLength {
            frame_type: header.frame_type,
            expected: (payload.len() / 6) * 6,
            actual: payload.len(),
        });
    }

    let settings = payload
        .chunks_exact(6)
        .map(|chunk| Setting {
            id: SettingId::from_u16(((chunk[0] as u16) << 8) | chunk[1] as u16),
            value: read_u32(&chunk[2..6]),
        })
        .collect();

    Ok(SettingsFrame { ack, settings })
}

/// Parse a PUSH_PROMISE frame payload.
pub fn parse_push_promise(
    header: &FrameHeader,
    payload: &[u8],
) -> Result<PushPromiseFrame, FrameError> {
    require_stream(header)?;
    let payload = strip_padding(header, payload)?;

    if payload.len() < 4 {
        return Err(FrameError::PayloadLength {
            frame_type: header.frame_type,
            expected: 4,
            actual: payload.len(),
        });
    }

    Ok(PushPromiseFrame {
        stream_id: header.stream_id,
        end_headers: header.has_flag(flags::END_HEADERS),
        promised_stream_id: StreamId::new(read_u32(&payload[..4])),
        header_block: Bytes::copy_from_slice(&payload[4..]),
    })
}

/// Parse a PING frame payload.
pub fn parse_ping(header: &FrameHeader, payload: &[u8]) -> Result<PingFrame, FrameError> {
    require_stream_zero(header)?;
    if payload.len() != 8 {
        return Err(FrameError::PayloadLength {
            frame_type: header.frame_type,
            expected: 8,
            actual: payload.len(),
        });
    }

    let mut opaque = [0u8; 8];
    opaque.copy_from_slice(payload);

    Ok(PingFrame {
        ack: header.has_flag(flags::ACK),
        opaque: u64::from_be_bytes(opaque),
    })
}

/// Parse a GOAWAY frame payload.
pub fn parse_goaway(header: &FrameHeader, payload: &[u8]) -> Result<GoAwayFrame, FrameError> {
    require_stream_zero(header)?;
    if payload.len() < 8 {
        return Err(FrameError::PayloadLength {
            frame_type: header.frame_type,
            expected: 8,
            actual: payload.len(),
        });
    }

    Ok(GoAwayFrame {
        last_stream_id: StreamId::new(read_u32(&payload[..4])),
        error_code: read_u32(&payload[4..8]),
        debug_data: Bytes::copy_from_slice(&payload[8..]),
    })
}

/// Parse a WINDOW_UPDATE frame payload.
pub fn parse_window_update(
    header: &FrameHeader,
    payload: &[u8],
) -> Result<WindowUpdateFrame, FrameError> {
    if payload.len() != 4 {
        return Err(FrameError::PayloadLength {
            frame_type: header.frame_type,
            expected: 4,
            actual: payload.len(),
        });
    }

    Ok(WindowUpdateFrame {
        stream_id: header.stream_id,
        increment: read_u32(payload) & super::MAX_WINDOW_SIZE,
    })
}

/// Parse a CONTINUATION frame payload.
pub fn parse_continuation(
    header: &FrameHeader,
    payload: &[u8],
) -> Result<ContinuationFrame, FrameError> {
    require_stream(header)?;

    Ok(ContinuationFrame {
        stream_id: header.stream_id,
        end_headers: header.has_flag(flags::END_HEADERS),
        header_block: Bytes::copy_from_slice(payload),
    })
}

#[inline]
fn read_u32(buf: &[u8]) -> u32 {
    u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]])
}

fn parse_priority_section(payload: &[u8]) -> Priority {
    let word = read_u32(&payload[..4]);
    Priority {
        exclusive: word & 0x8000_0000 != 0,
        dependency: StreamId::new(word),
        weight: payload[4],
    }
}

fn require_stream(header: &FrameHeader) -> Result<(), FrameError> {
    if header.stream_id.is_connection_level() {
        return Err(FrameError::StreamIdRequired {
            frame_type: header.frame_type,
        });
    }
    Ok(())
}

fn require_stream_zero(header: &FrameHeader) -> Result<(), FrameError> {
    if !header.stream_id.is_connection_level() {
        return Err(FrameError::StreamZeroRequired {
            frame_type: header.frame_type,
        });
    }
    Ok(())
}

/// Remove the pad-length octet and trailing padding if PADDED is set.
fn strip_padding<'a>(header: &FrameHeader, payload: &'a [u8]) -> Result<&'a [u8], FrameError> {
    if !header.has_flag(flags::PADDED) {
        return Ok(payload);
    }
    if payload.is_empty() {
        return Err(FrameError::Padding {
            pad_length: 0,
            payload_length: 0,
        });
    }
    let pad_length = payload[0] as usize;
    let rest = &payload[1..];
    if pad_length >= rest.len() + 1 {
        return Err(FrameError::Padding {
            pad_length: pad_length as u8,
            payload_length: payload.len(),
        });
    }
    Ok(&rest[..rest.len() - pad_length])
}
