//! HTTP/2 frame writing.
//!
//! Each function appends one complete frame (header and payload) to the
//! caller's buffer and returns the number of bytes written. Padding is never
//! generated.

use bytes::{BufMut, BytesMut};

use super::types::*;
use super::{FRAME_HEADER_SIZE, MAX_STREAM_ID};

/// Write the 9-byte common frame header.
fn write_frame_header(
    buf: &mut BytesMut,
    length: u32,
    frame_type: FrameType,
    flags: u8,
    stream_id: StreamId,
) {
    buf.reserve(FRAME_HEADER_SIZE + length as usize);

    // Length (24 bits, big-endian)
    buf.put_u8((length >> 16) as u8);
    buf.put_u8((length >> 8) as u8);
    buf.put_u8(length as u8);

    buf.put_u8(frame_type as u8);
    buf.put_u8(flags);

    // Stream ID (31 bits, reserved bit zeroed)
    buf.put_u32(stream_id.value() & MAX_STREAM_ID);
}

/// Write a DATA frame.
pub fn write_data(buf: &mut BytesMut, stream_id: StreamId, data: &[u8], end_stream: bool) -> usize {
    let frame_flags = if end_stream { flags::END_STREAM } else { 0 };
    write_frame_header(buf, data.len() as u32, FrameType::Data, frame_flags, stream_id);
    buf.extend_from_slice(data);
    FRAME_HEADER_SIZE + data.len()
}

/// Write a HEADERS frame carrying one header-block fragment.
pub fn write_headers(
    buf: &mut BytesMut,
    stream_id: StreamId,
    priority: Option<Priority>,
    header_block: &[u8],
    end_stream: bool,
    end_headers: bool,
) -> usize {
    let mut frame_flags = 0u8;
    if end_stream {
        frame_flags |= flags::END_STREAM;
    }
    if end_headers {
        frame_flags |= flags::END_HEADERS;
    }
    if priority.is_some() {
        frame_flags |= flags::PRIORITY;
    }

    let priority_len = if priority.is_some() { 5 } else { 0 };
    let length = priority_len + header_block.len() as u32;

    write_frame_header(buf, length, FrameType::Headers, frame_flags, stream_id);
    if let Some(pri) = priority {
        write_priority_section(buf, pri);
    }
    buf.extend_from_slice(header_block);
    FRAME_HEADER_SIZE + length as usize
}

/// Write a PRIORITY frame.
pub fn write_priority(buf: &mut BytesMut, stream_id: StreamId, priority: Priority) -> usize {
    write_frame_header(buf, 5, FrameType::Priority, 0, stream_id);
    write_priority_section(buf, priority);
    FRAME_HEADER_SIZE + 5
}

/// Write a RST_STREAM frame.
pub fn write_rst_stream(buf: &mut BytesMut, stream_id: StreamId, error_code: u32) -> usize {
    write_frame_header(buf, 4, FrameType::RstStream, 0, stream_id);
    buf.put_u32(error_code);
    FRAME_HEADER_SIZE + 4
}

/// Write a SETTINGS frame.
pub fn write_settings(buf: &mut BytesMut, settings: &[Setting]) -> usize {
    let length = (settings.len() * 6) as u32;
    write_frame_header(buf, length, FrameType::Settings, 0, StreamId::CONNECTION);
    for setting in settings {
        buf.put_u16(setting.id.to_u16());
        buf.put_u32(setting.value);
    }
    FRAME_HEADER_SIZE + length as usize
}

/// Write a SETTINGS acknowledgment.
pub fn write_settings_ack(buf: &mut BytesMut) -> usize {
    write_frame_header(buf, 0, FrameType::Settings, flags::ACK, StreamId::CONNECTION);
    FRAME_HEADER_SIZE
}

/// Write a PUSH_PROMISE frame on `stream_id` reserving `promised_stream_id`.
pub fn write_push_promise(
    buf: &mut BytesMut,
    stream_id: StreamId,
    promised_stream_id: StreamId,
    header_block: &[u8],
    end_headers: bool,
) -> usize {
    let frame_flags = if end_headers { flags::END_HEADERS } else { 0 };
    let length = 4 + header_block.len() as u32;

    write_frame_header(buf, length, FrameType::PushPromise, frame_flags, stream_id);
    buf.put_u32(promised_stream_id.value() & MAX_STREAM_ID);
    buf.extend_from_slice(header_block);
    FRAME_HEADER_SIZE + length as usize
}

/// Write a PING frame.
pub fn write_ping(buf: &mut BytesMut, opaque: u64, ack: bool) -> usize {
    let frame_flags = if ack { flags::ACK } else { 0 };
    write_frame_header(buf, 8, FrameType::Ping, frame_flags, StreamId::CONNECTION);
    buf.put_u64(opaque);
    FRAME_HEADER_SIZE + 8
}

/// Write a GOAWAY frame.
pub fn write_goaway(
    buf: &mut BytesMut,
    last_stream_id: StreamId,
    error_code: u32,
    debug_data: &[u8],
) -> usize {
    let length = 8 + debug_data.len() as u32;
    write_frame_header(buf, length, FrameType::GoAway, 0, StreamId::CONNECTION);
    buf.put_u32(last_stream_id.value() & MAX_STREAM_ID);
    buf.put_u32(error_code);
    buf.extend_from_slice(debug_data);
    FRAME_HEADER_SIZE + length as usize
}

/// Write a WINDOW_UPDATE frame.
pub fn write_window_update(buf: &mut BytesMut, stream_id: StreamId, increment: u32) -> usize {
    write_frame_header(buf, 4, FrameType::WindowUpdate, 0, stream_id);
    buf.put_u32(increment & MAX_STREAM_ID);
    FRAME_HEADER_SIZE + 4
}

/// Write a CONTINUATION frame carrying one header-block fragment.
pub fn write_continuation(
    buf: &mut BytesMut,
    stream_id: StreamId,
    header_block: &[u8],
    end_headers: bool,
) -> usize {
    let frame_flags = if end_headers { flags::END_HEADERS } else { 0 };
    write_frame_header(
        buf,
        header_block.len() as u32,
        FrameType::Continuation,
        frame_flags,
        stream_id,
    );
    buf.extend_from_slice(header_block);
    FRAME_HEADER_SIZE + header_block.len()
}

fn write_priority_section(buf: &mut BytesMut, priority: Priority) {
    let mut dep = priority.dependency.value();
    if priority.exclusive {
        dep |= 0x8000_0000;
    }
    buf.put_u32(dep);
    buf.put_u8(priority.weight);
}

#[cfg(test)]
mod tests {
    use super::super::decode::*;
    use super::*;
    use crate::frame::ErrorCode;

    #[test]
    fn test_write_data_roundtrip() {
        let mut buf = BytesMut::new();
        let n = write_data(&mut buf, StreamId::new(1), b"payload", true);
        assert_eq!(n, buf.len());

        let header = parse_frame_header(&buf);
        assert_eq!(header.get_type(), Some(FrameType::Data));
        assert_eq!(header.length as usize, 7);

        let frame = parse_data(&header, &buf[FRAME_HEADER_SIZE..]).unwrap();
        assert!(frame.end_stream);
        assert_eq!(&frame.data[..], b"payload");
    }

    #[test]
    fn test_write_data_empty_end_stream() {
        let mut buf = BytesMut::new();
        let n = write_data(&mut buf, StreamId::new(3), &[], true);
        assert_eq!(n, FRAME_HEADER_SIZE);

        let header = parse_frame_header(&buf);
        assert_eq!(header.length, 0);
        assert!(header.has_flag(flags::END_STREAM));
    }

    #[test]
    fn test_write_headers_roundtrip() {
        let mut buf = BytesMut::new();
        write_headers(&mut buf, StreamId::new(5), None, &[0x82, 0x86], false, true);

        let header = parse_frame_header(&buf);
        let frame = parse_headers(&header, &buf[FRAME_HEADER_SIZE..]).unwrap();
        assert!(frame.end_headers);
        assert!(!frame.end_stream);
        assert_eq!(&frame.header_block[..], &[0x82, 0x86]);
    }

    #[test]
    fn test_write_headers_with_priority_roundtrip() {
        let pri = Priority {
            exclusive: true,
            dependency: StreamId::new(3),
            weight: 42,
        };
        let mut buf = BytesMut::new();
        write_headers(&mut buf, StreamId::new(5), Some(pri), &[0x82], true, true);

        let header = parse_frame_header(&buf);
        assert!(header.has_flag(flags::PRIORITY));
        let frame = parse_headers(&header, &buf[FRAME_HEADER_SIZE..]).unwrap();
        assert_eq!(frame.priority, Some(pri));
        assert_eq!(&frame.header_block[..], &[0x82]);
    }

    #[test]
    fn test_write_settings_roundtrip() {
        let settings = vec![
            Setting {
                id: SettingId::MaxConcurrentStreams,
                value: 100,
            },
            Setting {
                id: SettingId::InitialWindowSize,
                value: 65_535,
            },
        ];
        let mut buf = BytesMut::new();
        write_settings(&mut buf, &settings);

        let header = parse_frame_header(&buf);
        let frame = parse_settings(&header, &buf[FRAME_HEADER_SIZE..]).unwrap();
        assert!(!frame.ack);
        assert_eq!(frame.settings, settings);
    }

    #[test]
    fn test_write_settings_ack() {
        let mut buf = BytesMut::new();
        let n = write_settings_ack(&mut buf);
        assert_eq!(n, FRAME_HEADER_SIZE);

        let header = parse_frame_header(&buf);
        assert!(header.has_flag(flags::ACK));
        assert_eq!(header.length, 0);
    }

    #[test]
    fn test_write_push_promise_roundtrip() {
        let mut buf = BytesMut::new();
        write_push_promise(&mut buf, StreamId::new(1), StreamId::new(2), &[0x88], true);

        let header = parse_frame_header(&buf);
        let frame = parse_push_promise(&header, &buf[FRAME_HEADER_SIZE..]).unwrap();
        assert_eq!(frame.stream_id.value(), 1);
        assert_eq!(frame.promised_stream_id.value(), 2);
        assert_eq!(&frame.header_block[..], &[0x88]);
    }

    #[test]
    fn test_write_ping_roundtrip() {
        let mut buf = BytesMut::new();
        write_ping(&mut buf, 0x0102_0304_0506_0708, true);

        let header = parse_frame_header(&buf);
        let frame = parse_ping(&header, &buf[FRAME_HEADER_SIZE..]).unwrap();
        assert!(frame.ack);
        assert_eq!(frame.opaque, 0x0102_0304_0506_0708);
    }

    #[test]
    fn test_write_goaway_roundtrip() {
        let mut buf = BytesMut::new();
        write_goaway(
            &mut buf,
            StreamId::new(9),
            ErrorCode::EnhanceYourCalm.to_u32(),
            b"slow down",
        );

        let header = parse_frame_header(&buf);
        let frame = parse_goaway(&header, &buf[FRAME_HEADER_SIZE..]).unwrap();
        assert_eq!(frame.last_stream_id.value(), 9);
        assert_eq!(frame.error_code, ErrorCode::EnhanceYourCalm.to_u32());
        assert_eq!(&frame.debug_data[..], b"slow down");
    }

    #[test]
    fn test_write_window_update_roundtrip() {
        let mut buf = BytesMut::new();
        write_window_update(&mut buf, StreamId::CONNECTION, 4096);

        let header = parse_frame_header(&buf);
        let frame = parse_window_update(&header, &buf[FRAME_HEADER_SIZE..]).unwrap();
        assert_eq!(frame.stream_id.value(), 0);
        assert_eq!(frame.increment, 4096);
    }

    #[test]
    fn test_write_continuation_roundtrip() {
        let mut buf = BytesMut::new();
        write_continuation(&mut buf, StreamId::new(7), &[0x41, 0x8a], false);

        let header = parse_frame_header(&buf);
        let frame = parse_continuation(&header, &buf[FRAME_HEADER_SIZE..]).unwrap();
        assert!(!frame.end_headers);
        assert_eq!(&frame.header_block[..], &[0x41, 0x8a]);
    }

    #[test]
    fn test_write_rst_stream() {
        let mut buf = BytesMut::new();
        let n = write_rst_stream(&mut buf, StreamId::new(11), ErrorCode::Cancel.to_u32());
        assert_eq!(n, FRAME_HEADER_SIZE + 4);

        let header = parse_frame_header(&buf);
        let frame = parse_rst_stream(&header, &buf[FRAME_HEADER_SIZE..]).unwrap();
        assert_eq!(frame.error_code, ErrorCode::Cancel.to_u32());
    }

    #[test]
    fn test_reserved_bit_zeroed_on_write() {
        let mut buf = BytesMut::new();
        write_data(&mut buf, StreamId(0xFFFF_FFFF), &[], false);
        // High bit of the stream id word must be clear.
        assert_eq!(buf[5] & 0x80, 0);
    }
}
