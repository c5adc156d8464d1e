//! HTTP/2 connection codec.
//!
//! [`Http2Codec`] is the incremental state machine between a transport byte
//! stream and semantic HTTP/2 events. Ingress bytes go in through
//! [`Http2Codec::on_ingress`], which consumes whole protocol units and fires
//! the [`EventSink`] callbacks in wire order; egress comes out of the
//! `generate_*` operations, which append frames to a caller-owned buffer.
//! The codec never blocks, owns no sockets, and keeps no per-stream state
//! beyond the continuation interlock and the stream-id counters.

mod error;
mod headers;
mod settings;

pub use error::HttpException;
pub use settings::SettingsStore;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::frame::{
    self, ErrorCode, FrameHeader, FrameType, Setting, SettingId, StreamId, flags,
};
use crate::hpack::{HeaderCodec, HeaderSize};
use crate::message::HttpMessage;

/// Which endpoint of the connection this codec speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client side: initiates requests on odd stream ids.
    Upstream,
    /// Server side: receives requests, may push on even stream ids.
    Downstream,
}

/// Progress of the two-step GOAWAY shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosingState {
    Open,
    /// A graceful drain announcement (GOAWAY with the maximum stream id and
    /// NO_ERROR) went out; the final GOAWAY has not.
    FirstGoawaySent,
    Closed,
}

/// Receiver of parsed ingress events.
///
/// Callbacks fire synchronously inside [`Http2Codec::on_ingress`], in the
/// order of their triggering wire events. All methods default to no-ops so a
/// sink implements only what it consumes.
pub trait EventSink {
    /// A HEADERS frame opened a message. `msg` is present only when the
    /// opening frame also completed the header block.
    fn on_message_begin(&mut self, _stream: StreamId, _msg: Option<&HttpMessage>) {}

    /// A PUSH_PROMISE on `assoc` reserved `promised` for a pushed response.
    fn on_push_message_begin(
        &mut self,
        _promised: StreamId,
        _assoc: StreamId,
        _msg: Option<&HttpMessage>,
    ) {
    }

    /// The header block completed and validated into a message.
    fn on_headers_complete(&mut self, _stream: StreamId, _msg: HttpMessage) {}

    fn on_body(&mut self, _stream: StreamId, _data: Bytes) {}

    fn on_message_complete(&mut self, _stream: StreamId, _upgrade: bool) {}

    /// Peer reset the stream.
    fn on_abort(&mut self, _stream: StreamId, _code: ErrorCode) {}

    fn on_goaway(&mut self, _last_good_stream: StreamId, _code: ErrorCode) {}

    fn on_ping_request(&mut self, _opaque: u64) {}

    fn on_ping_reply(&mut self, _opaque: u64) {}

    /// A settings frame was assimilated; `settings` lists the committed
    /// entries in wire order.
    fn on_settings(&mut self, _settings: &[Setting]) {}

    fn on_settings_ack(&mut self) {}

    fn on_window_update(&mut self, _stream: StreamId, _delta: u32) {}

    /// Error escalation. `stream` 0 with a codec status is a connection
    /// error; a nonzero stream with an HTTP status is a stream error and
    /// `new_txn` tells the session to answer it as a fresh transaction.
    fn on_error(&mut self, _stream: StreamId, _error: HttpException, _new_txn: bool) {}
}

/// Sentinel meaning "no GOAWAY seen/sent yet".
const GOAWAY_UNSET: u32 = u32::MAX;

/// HTTP/2 codec for one connection endpoint.
pub struct Http2Codec {
    direction: Direction,
    header_codec: HeaderCodec,
    /// Next locally-initiated stream id; odd upstream, even downstream.
    next_egress_stream_id: u32,
    /// Largest peer-initiated stream id accepted so far.
    last_ingress_stream_id: u32,
    /// Nonzero while a header block is open: the stream the next frame must
    /// be a CONTINUATION on.
    expected_continuation_stream: u32,
    /// Promised stream of the PUSH_PROMISE block in progress, if any.
    cur_promised_stream: Option<StreamId>,
    /// Accumulated header-block fragments awaiting END_HEADERS.
    cur_header_block: BytesMut,
    /// The block in progress belongs to a frame dropped after the final
    /// GOAWAY; its fragments are consumed without callbacks.
    dropping_header_block: bool,
    /// Settings received from the peer.
    ingress_settings: SettingsStore,
    /// Settings we advertise.
    egress_settings: SettingsStore,
    /// Smallest last-good-stream received in a peer GOAWAY.
    ingress_goaway_ack: u32,
    /// Last last-good-stream we sent; must never increase.
    egress_goaway_ack: u32,
    closing_state: ClosingState,
    need_connection_preface: bool,
    need_frame_header: bool,
    cur_header: FrameHeader,
    /// Largest header-block fragment emitted per frame.
    header_split_size: usize,
}

impl Http2Codec {
    pub fn new(direction: Direction) -> Self {
        trace!("creating {:?} HTTP/2 codec", direction);
        Self {
            direction,
            header_codec: HeaderCodec::new(),
            next_egress_stream_id: match direction {
                Direction::Upstream => 1,
                Direction::Downstream => 2,
            },
            last_ingress_stream_id: 0,
            expected_continuation_stream: 0,
            cur_promised_stream: None,
            cur_header_block: BytesMut::new(),
            dropping_header_block: false,
            ingress_settings: SettingsStore::new(),
            egress_settings: SettingsStore::new(),
            ingress_goaway_ack: GOAWAY_UNSET,
            egress_goaway_ack: GOAWAY_UNSET,
            closing_state: ClosingState::Open,
            // Only the server side expects the literal client preface.
            need_connection_preface: direction == Direction::Downstream,
            need_frame_header: true,
            cur_header: FrameHeader::default(),
            header_split_size: frame::DEFAULT_MAX_FRAME_SIZE as usize,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn closing_state(&self) -> ClosingState {
        self.closing_state
    }

    /// Allocate the next locally-initiated stream id.
    pub fn create_stream(&mut self) -> StreamId {
        let id = self.next_egress_stream_id;
        self.next_egress_stream_id += 2;
        StreamId::new(id)
    }

    /// The codec buffers no egress of its own, so it is never busy.
    pub fn is_busy(&self) -> bool {
        false
    }

    pub fn supports_stream_flow_control(&self) -> bool {
        true
    }

    pub fn supports_session_flow_control(&self) -> bool {
        true
    }

    /// Whether new transactions may still be started on this connection.
    pub fn is_reusable(&self) -> bool {
        (self.closing_state == ClosingState::Open
            || (self.direction == Direction::Downstream && self.is_waiting_to_drain()))
            && self.ingress_goaway_ack == GOAWAY_UNSET
    }

    /// True between the graceful drain announcement and the final GOAWAY.
    pub fn is_waiting_to_drain(&self) -> bool {
        self.closing_state == ClosingState::FirstGoawaySent
    }

    pub fn ingress_settings(&self) -> &SettingsStore {
        &self.ingress_settings
    }

    pub fn egress_settings(&self) -> &SettingsStore {
        &self.egress_settings
    }

    /// Mutable access to the advertised settings; call
    /// [`generate_settings`](Self::generate_settings) to put them on the wire.
    pub fn egress_settings_mut(&mut self) -> &mut SettingsStore {
        &mut self.egress_settings
    }

    /// Size of the most recently encoded header block.
    pub fn last_encoded_header_size(&self) -> HeaderSize {
        self.header_codec.last_encoded_size()
    }

    /// Override the header-block fragment size (tests force small values to
    /// exercise CONTINUATION generation).
    pub fn set_header_split_size(&mut self, size: usize) {
        self.header_split_size = size.max(1);
    }

    pub fn header_split_size(&self) -> usize {
        self.header_split_size
    }

    /// Largest frame payload we accept, from the locally-advertised
    /// MAX_FRAME_SIZE.
    fn max_recv_frame_size(&self) -> u32 {
        self.egress_settings.value(SettingId::MaxFrameSize)
    }

    /// Largest frame payload the peer accepts.
    fn max_send_frame_size(&self) -> usize {
        self.ingress_settings.value(SettingId::MaxFrameSize) as usize
    }

    // ===== Ingress =====

    /// Consume as many complete protocol units as `buf` holds, firing sink
    /// callbacks for each. Returns the number of bytes consumed; the caller
    /// resubmits the remainder once more data arrives.
    pub fn on_ingress(&mut self, buf: &[u8], sink: &mut dyn EventSink) -> usize {
        let mut parsed = 0;
        let mut result: Result<(), ErrorCode> = Ok(());

        while result.is_ok() {
            let remaining = &buf[parsed..];
            if self.need_connection_preface {
                if remaining.len() < frame::CONNECTION_PREFACE.len() {
                    break;
                }
                let preface = &remaining[..frame::CONNECTION_PREFACE.len()];
                parsed += frame::CONNECTION_PREFACE.len();
                self.need_connection_preface = false;
                if preface != frame::CONNECTION_PREFACE {
                    debug!("bad connection preface");
                    result = Err(ErrorCode::ProtocolError);
                }
            } else if self.need_frame_header {
                if remaining.len() < frame::FRAME_HEADER_SIZE {
                    break;
                }
                self.cur_header = frame::parse_frame_header(remaining);
                parsed += frame::FRAME_HEADER_SIZE;
                self.need_frame_header = false;
                if self.cur_header.length > self.max_recv_frame_size() {
                    debug!(
                        "frame length {} exceeds advertised maximum {}",
                        self.cur_header.length,
                        self.max_recv_frame_size()
                    );
                    result = Err(ErrorCode::FrameSizeError);
                }
            } else {
                let payload_len = self.cur_header.length as usize;
                if remaining.len() < payload_len {
                    break;
                }
                self.need_frame_header = true;
                result = self.parse_frame(&remaining[..payload_len], sink);
                parsed += payload_len;
            }
        }

        if let Err(code) = result {
            sink.on_error(StreamId::CONNECTION, HttpException::connection(code), false);
        }
        parsed
    }

    /// Enforce the continuation interlock, dispatch one complete frame, and
    /// rearm the interlock from the frame's own flags.
    fn parse_frame(&mut self, payload: &[u8], sink: &mut dyn EventSink) -> Result<(), ErrorCode> {
        let header = self.cur_header;
        let frame_type = header.get_type();

        if self.expected_continuation_stream != 0
            && (frame_type != Some(FrameType::Continuation)
                || self.expected_continuation_stream != header.stream_id.value())
        {
            debug!(
                "expected CONTINUATION with stream={} got type=0x{:02x} stream={}",
                self.expected_continuation_stream, header.frame_type, header.stream_id
            );
            return Err(ErrorCode::ProtocolError);
        }
        if self.expected_continuation_stream == 0 && frame_type == Some(FrameType::Continuation) {
            debug!("unexpected CONTINUATION stream={}", header.stream_id);
            return Err(ErrorCode::ProtocolError);
        }

        let result = match frame_type {
            Some(FrameType::Data) => self.parse_data(payload, sink),
            Some(FrameType::Headers) => self.parse_headers(payload, sink),
            Some(FrameType::Priority) => self.parse_priority(payload),
            Some(FrameType::RstStream) => self.parse_rst_stream(payload, sink),
            Some(FrameType::Settings) => self.parse_settings(payload, sink),
            Some(FrameType::PushPromise) => self.parse_push_promise(payload, sink),
            Some(FrameType::Ping) => self.parse_ping(payload, sink),
            Some(FrameType::GoAway) => self.parse_goaway(payload, sink),
            Some(FrameType::WindowUpdate) => self.parse_window_update(payload, sink),
            Some(FrameType::Continuation) => self.parse_continuation(payload, sink),
            Some(FrameType::AltSvc) | None => {
                // Unknown frames must be ignored and discarded.
                trace!("skipping frame type=0x{:02x}", header.frame_type);
                Ok(())
            }
        };

        self.expected_continuation_stream = match frame_type {
            Some(t) if t.affects_compression() && !header.has_flag(flags::END_HEADERS) => {
                header.stream_id.value()
            }
            _ => 0,
        };
        result
    }

    fn parse_data(&mut self, payload: &[u8], sink: &mut dyn EventSink) -> Result<(), ErrorCode> {
        trace!("parsing DATA frame for stream={}", self.cur_header.stream_id);
        let data = frame::parse_data(&self.cur_header, payload).map_err(log_frame_error)?;
        sink.on_body(data.stream_id, data.data);
        self.handle_end_stream(sink);
        Ok(())
    }

    fn parse_headers(&mut self, payload: &[u8], sink: &mut dyn EventSink) -> Result<(), ErrorCode> {
        trace!(
            "parsing HEADERS frame for stream={}",
            self.cur_header.stream_id
        );
        let headers = frame::parse_headers(&self.cur_header, payload).map_err(log_frame_error)?;

        if self.direction == Direction::Downstream {
            self.check_new_stream(headers.stream_id)?;
            if self.closing_state == ClosingState::Closed {
                debug!(
                    "dropping HEADERS after final GOAWAY, stream={}",
                    headers.stream_id
                );
                if !headers.end_headers {
                    self.dropping_header_block = true;
                }
                return Ok(());
            }
        } else if !headers.stream_id.is_client_initiated() {
            debug!("invalid HEADERS reply on stream={}", headers.stream_id);
            return Err(ErrorCode::ProtocolError);
        }

        self.parse_headers_impl(headers.header_block, sink)
    }

    fn parse_continuation(
        &mut self,
        payload: &[u8],
        sink: &mut dyn EventSink,
    ) -> Result<(), ErrorCode> {
        trace!(
            "parsing CONTINUATION frame for stream={}",
            self.cur_header.stream_id
        );
        let continuation =
            frame::parse_continuation(&self.cur_header, payload).map_err(log_frame_error)?;

        if self.dropping_header_block {
            if continuation.end_headers {
                self.dropping_header_block = false;
            }
            return Ok(());
        }

        self.parse_headers_impl(continuation.header_block, sink)
    }

    /// Shared tail of HEADERS / PUSH_PROMISE / CONTINUATION handling:
    /// accumulate the fragment (exactly once), decode and validate on
    /// END_HEADERS, and fire the message callbacks.
    fn parse_headers_impl(
        &mut self,
        fragment: Bytes,
        sink: &mut dyn EventSink,
    ) -> Result<(), ErrorCode> {
        let header = self.cur_header;
        let stream = header.stream_id;
        let end_headers = header.has_flag(flags::END_HEADERS);
        let promised = self.cur_promised_stream;

        self.cur_header_block.extend_from_slice(&fragment);

        let mut msg = None;
        if end_headers {
            let block = self.cur_header_block.split().freeze();
            let fields = match self.header_codec.decode(&block) {
                Ok(fields) => fields,
                Err(err) => {
                    debug!("failed decoding header block for stream={}: {}", stream, err);
                    return Err(ErrorCode::CompressionError);
                }
            };

            let is_request = self.direction == Direction::Downstream || promised.is_some();
            match headers::parse_header_list(fields, is_request) {
                Ok(parsed) => msg = Some(parsed),
                Err(reason) => {
                    debug!("bad header list for stream={}: {}", stream, reason);
                    self.cur_promised_stream = None;
                    sink.on_error(stream, HttpException::stream(stream, 400, reason), true);
                    return Ok(());
                }
            }
        }

        match header.get_type() {
            Some(FrameType::Headers) => sink.on_message_begin(stream, msg.as_ref()),
            Some(FrameType::PushPromise) => {
                if let Some(promised) = promised {
                    sink.on_push_message_begin(promised, stream, msg.as_ref());
                }
            }
            _ => {}
        }

        if end_headers {
            self.cur_promised_stream = None;
            if let Some(msg) = msg {
                sink.on_headers_complete(promised.unwrap_or(stream), msg);
            }
        }

        self.handle_end_stream(sink);
        Ok(())
    }

    fn parse_priority(&mut self, payload: &[u8]) -> Result<(), ErrorCode> {
        trace!(
            "parsing PRIORITY frame for stream={}",
            self.cur_header.stream_id
        );
        // Parsed for well-formedness; no priority tree, no callback.
        frame::parse_priority(&self.cur_header, payload).map_err(log_frame_error)?;
        Ok(())
    }

    fn parse_rst_stream(
        &mut self,
        payload: &[u8],
        sink: &mut dyn EventSink,
    ) -> Result<(), ErrorCode> {
        trace!(
            "parsing RST_STREAM frame for stream={}",
            self.cur_header.stream_id
        );
        let rst = frame::parse_rst_stream(&self.cur_header, payload).map_err(log_frame_error)?;
        sink.on_abort(rst.stream_id, ErrorCode::from_u32(rst.error_code));
        Ok(())
    }

    fn parse_settings(
        &mut self,
        payload: &[u8],
        sink: &mut dyn EventSink,
    ) -> Result<(), ErrorCode> {
        trace!("parsing SETTINGS frame");
        let settings = frame::parse_settings(&self.cur_header, payload).map_err(log_frame_error)?;

        if settings.ack {
            sink.on_settings_ack();
            return Ok(());
        }

        let mut committed = Vec::with_capacity(settings.settings.len());
        for setting in settings.settings {
            match setting.id {
                SettingId::HeaderTableSize => {
                    debug!("peer header table size={}", setting.value);
                    self.header_codec.set_encoder_table_size(setting.value);
                }
                SettingId::EnablePush => {
                    if setting.value > 1 {
                        debug!("invalid ENABLE_PUSH setting={}", setting.value);
                        return Err(ErrorCode::ProtocolError);
                    }
                }
                SettingId::InitialWindowSize => {
                    if setting.value > frame::MAX_WINDOW_SIZE {
                        debug!("invalid INITIAL_WINDOW_SIZE size={}", setting.value);
                        return Err(ErrorCode::ProtocolError);
                    }
                }
                SettingId::MaxFrameSize => {
                    if !(frame::DEFAULT_MAX_FRAME_SIZE..=frame::MAX_FRAME_PAYLOAD_LENGTH)
                        .contains(&setting.value)
                    {
                        debug!("invalid MAX_FRAME_SIZE size={}", setting.value);
                        return Err(ErrorCode::ProtocolError);
                    }
                }
                // No codec-level validation; session concerns.
                SettingId::MaxConcurrentStreams
                | SettingId::MaxHeaderListSize
                | SettingId::Unknown(_) => {}
            }
            self.ingress_settings.set(setting.id, setting.value);
            committed.push(setting);
        }

        sink.on_settings(&committed);
        Ok(())
    }

    fn parse_push_promise(
        &mut self,
        payload: &[u8],
        sink: &mut dyn EventSink,
    ) -> Result<(), ErrorCode> {
        if self.direction != Direction::Upstream {
            debug!("received PUSH_PROMISE on downstream codec");
            return Err(ErrorCode::ProtocolError);
        }
        if self.egress_settings.value(SettingId::EnablePush) != 1 {
            debug!("received PUSH_PROMISE with push disabled");
            return Err(ErrorCode::ProtocolError);
        }

        trace!(
            "parsing PUSH_PROMISE frame for stream={}",
            self.cur_header.stream_id
        );
        let promise = frame::parse_push_promise(&self.cur_header, payload).map_err(log_frame_error)?;
        self.check_new_stream(promise.promised_stream_id)?;

        if self.closing_state == ClosingState::Closed {
            debug!(
                "dropping PUSH_PROMISE after final GOAWAY, stream={}",
                promise.stream_id
            );
            if !promise.end_headers {
                self.dropping_header_block = true;
            }
            return Ok(());
        }

        self.cur_promised_stream = Some(promise.promised_stream_id);
        self.parse_headers_impl(promise.header_block, sink)
    }

    fn parse_ping(&mut self, payload: &[u8], sink: &mut dyn EventSink) -> Result<(), ErrorCode> {
        trace!("parsing PING frame");
        let ping = frame::parse_ping(&self.cur_header, payload).map_err(log_frame_error)?;
        if ping.ack {
            sink.on_ping_reply(ping.opaque);
        } else {
            sink.on_ping_request(ping.opaque);
        }
        Ok(())
    }

    fn parse_goaway(&mut self, payload: &[u8], sink: &mut dyn EventSink) -> Result<(), ErrorCode> {
        trace!("parsing GOAWAY frame");
        let goaway = frame::parse_goaway(&self.cur_header, payload).map_err(log_frame_error)?;

        if goaway.last_stream_id.value() < self.ingress_goaway_ack {
            self.ingress_goaway_ack = goaway.last_stream_id.value();
            sink.on_goaway(goaway.last_stream_id, ErrorCode::from_u32(goaway.error_code));
        } else {
            warn!("received multiple GOAWAY with increasing ack");
        }
        Ok(())
    }

    fn parse_window_update(
        &mut self,
        payload: &[u8],
        sink: &mut dyn EventSink,
    ) -> Result<(), ErrorCode> {
        trace!(
            "parsing WINDOW_UPDATE frame for stream={}",
            self.cur_header.stream_id
        );
        let update = frame::parse_window_update(&self.cur_header, payload).map_err(log_frame_error)?;

        if update.increment == 0 {
            debug!("zero window delta for stream={}", update.stream_id);
            if update.stream_id.is_connection_level() {
                return Err(ErrorCode::ProtocolError);
            }
            // Stream-local zero delta is the upper layer's problem.
            return Ok(());
        }

        sink.on_window_update(update.stream_id, update.increment);
        Ok(())
    }

    /// Validate a peer-initiated stream id: nonzero, strictly increasing,
    /// and of the parity the peer's role dictates. The watermark advances
    /// only when every check passes.
    fn check_new_stream(&mut self, stream_id: StreamId) -> Result<(), ErrorCode> {
        let id = stream_id.value();
        if id == 0 || id <= self.last_ingress_stream_id {
            debug!("invalid new stream={}", id);
            return Err(ErrorCode::ProtocolError);
        }
        // Peer-initiated streams: odd from a client, even when pushed to us.
        let pushed = self.direction == Direction::Upstream;
        if stream_id.is_client_initiated() == pushed {
            debug!("invalid new stream={}", id);
            return Err(ErrorCode::ProtocolError);
        }
        self.last_ingress_stream_id = id;
        Ok(())
    }

    fn handle_end_stream(&mut self, sink: &mut dyn EventSink) {
        if self.cur_header.has_flag(flags::END_STREAM) {
            sink.on_message_complete(self.cur_header.stream_id, false);
        }
    }

    // ===== Egress =====

    /// Write the literal 24-byte client preface.
    pub fn generate_connection_preface(&self, buf: &mut BytesMut) -> usize {
        buf.extend_from_slice(frame::CONNECTION_PREFACE);
        frame::CONNECTION_PREFACE.len()
    }

    /// Encode a message's headers and emit them as one HEADERS (or
    /// PUSH_PROMISE when `assoc_stream` is set) plus however many
    /// CONTINUATION frames the split size requires. `eom` marks the opening
    /// HEADERS frame END_STREAM for messages with no body.
    pub fn generate_header(
        &mut self,
        buf: &mut BytesMut,
        stream_id: StreamId,
        msg: &HttpMessage,
        assoc_stream: Option<StreamId>,
        eom: bool,
    ) -> usize {
        trace!(
            "generating {} for stream={}",
            if assoc_stream.is_some() {
                "PUSH_PROMISE"
            } else {
                "HEADERS"
            },
            stream_id
        );

        let mut fields: Vec<(String, String)> = Vec::with_capacity(msg.headers().len() + 4);
        if msg.is_request() {
            debug_assert!(self.direction == Direction::Upstream || assoc_stream.is_some());
            if let Some(method) = msg.method() {
                fields.push((":method".to_string(), method.to_string()));
            }
            let scheme = if msg.is_secure() { "https" } else { "http" };
            fields.push((":scheme".to_string(), scheme.to_string()));
            if let Some(url) = msg.url() {
                fields.push((":path".to_string(), url.to_string()));
            }
            if let Some(host) = msg.headers().get("host") {
                fields.push((":authority".to_string(), host.to_string()));
            }
        } else {
            debug_assert!(self.direction == Direction::Downstream);
            if let Some(status) = msg.status() {
                fields.push((":status".to_string(), status.to_string()));
            }
        }

        // Caller headers, minus per-hop names and anything pseudo-shaped.
        for (name, value) in msg.headers().iter() {
            if name.is_empty() || name.starts_with(':') || headers::is_per_hop(name) {
                continue;
            }
            fields.push((name.to_ascii_lowercase(), value.to_string()));
        }

        let block = self.header_codec.encode(&fields);
        if block.is_empty() {
            return 0;
        }

        // CONTINUATION frames ride the same stream as the frame that opened
        // the block: the associated stream for PUSH_PROMISE.
        let carrier_stream = assoc_stream.unwrap_or(stream_id);

        let mut written = 0;
        let total = block.len();
        let mut offset = 0;
        while offset < total {
            let end = (offset + self.header_split_size).min(total);
            let chunk = &block[offset..end];
            let end_headers = end == total;
            written += if offset == 0 {
                match assoc_stream {
                    Some(assoc) => {
                        debug_assert!(self.direction == Direction::Downstream);
                        frame::write_push_promise(buf, assoc, stream_id, chunk, end_headers)
                    }
                    None => frame::write_headers(buf, stream_id, None, chunk, eom, end_headers),
                }
            } else {
                trace!("generating CONTINUATION for stream={}", carrier_stream);
                frame::write_continuation(buf, carrier_stream, chunk, end_headers)
            };
            offset = end;
        }
        written
    }

    /// Emit `data` as DATA frames no larger than the peer's MAX_FRAME_SIZE.
    /// The final frame (possibly empty) carries `eom` as END_STREAM.
    pub fn generate_body(
        &mut self,
        buf: &mut BytesMut,
        stream_id: StreamId,
        mut data: &[u8],
        eom: bool,
    ) -> usize {
        let max = self.max_send_frame_size();
        let mut written = 0;
        while data.len() > max {
            written += frame::write_data(buf, stream_id, &data[..max], false);
            data = &data[max..];
        }
        written + frame::write_data(buf, stream_id, data, eom)
    }

    /// HTTP/2 has no chunk framing; emits nothing.
    pub fn generate_chunk_header(
        &mut self,
        _buf: &mut BytesMut,
        _stream_id: StreamId,
        _length: usize,
    ) -> usize {
        0
    }

    /// HTTP/2 has no chunk framing; emits nothing.
    pub fn generate_chunk_terminator(&mut self, _buf: &mut BytesMut, _stream_id: StreamId) -> usize {
        0
    }

    /// Trailer generation is not part of this codec; emits nothing.
    pub fn generate_trailers(
        &mut self,
        _buf: &mut BytesMut,
        _stream_id: StreamId,
        _trailers: &crate::message::Headers,
    ) -> usize {
        0
    }

    /// End the stream with an empty DATA frame.
    pub fn generate_eom(&mut self, buf: &mut BytesMut, stream_id: StreamId) -> usize {
        trace!("sending EOM for stream={}", stream_id);
        frame::write_data(buf, stream_id, &[], true)
    }

    pub fn generate_rst_stream(
        &mut self,
        buf: &mut BytesMut,
        stream_id: StreamId,
        code: ErrorCode,
    ) -> usize {
        debug!("sending RST_STREAM for stream={} with code={}", stream_id, code);
        frame::write_rst_stream(buf, stream_id, code.to_u32())
    }

    /// Emit a GOAWAY and advance the closing state: a graceful announcement
    /// (maximum stream id, NO_ERROR) from OPEN begins the two-step drain,
    /// anything else from OPEN closes outright, and a second GOAWAY
    /// finalizes. Returns 0 without emitting once closed.
    pub fn generate_goaway(
        &mut self,
        buf: &mut BytesMut,
        last_stream_id: StreamId,
        code: ErrorCode,
    ) -> usize {
        debug_assert!(
            last_stream_id.value() <= self.egress_goaway_ack,
            "cannot increase last good stream"
        );
        self.egress_goaway_ack = self.egress_goaway_ack.min(last_stream_id.value());

        match self.closing_state {
            ClosingState::Closed => {
                debug!("not sending GOAWAY for closed session");
                return 0;
            }
            ClosingState::Open => {
                self.closing_state = if last_stream_id.value() == frame::MAX_STREAM_ID
                    && code == ErrorCode::NoError
                {
                    ClosingState::FirstGoawaySent
                } else {
                    ClosingState::Closed
                };
            }
            ClosingState::FirstGoawaySent => {
                self.closing_state = ClosingState::Closed;
            }
        }

        debug!(
            "sending GOAWAY with last acknowledged stream={} with code={}",
            last_stream_id, code
        );
        frame::write_goaway(buf, last_stream_id, code.to_u32(), &[])
    }

    /// Emit a PING with a random opaque payload.
    pub fn generate_ping_request(&mut self, buf: &mut BytesMut) -> usize {
        let opaque = rand::random::<u64>();
        trace!("generating ping request with opaque={}", opaque);
        frame::write_ping(buf, opaque, false)
    }

    pub fn generate_ping_reply(&mut self, buf: &mut BytesMut, opaque: u64) -> usize {
        trace!("generating ping reply with opaque={}", opaque);
        frame::write_ping(buf, opaque, true)
    }

    /// Emit every explicitly-set egress setting. Advertising
    /// HEADER_TABLE_SIZE also caps our decoder's dynamic table.
    pub fn generate_settings(&mut self, buf: &mut BytesMut) -> usize {
        let settings: Vec<Setting> = self.egress_settings.iter_set().collect();
        for setting in &settings {
            if setting.id == SettingId::HeaderTableSize {
                self.header_codec.set_decoder_table_max_size(setting.value);
            }
        }
        debug!("generating {} settings", settings.len());
        frame::write_settings(buf, &settings)
    }

    pub fn generate_settings_ack(&mut self, buf: &mut BytesMut) -> usize {
        trace!("generating settings ack");
        frame::write_settings_ack(buf)
    }

    pub fn generate_window_update(
        &mut self,
        buf: &mut BytesMut,
        stream_id: StreamId,
        delta: u32,
    ) -> usize {
        trace!(
            "generating window update for stream={}: processed {} bytes",
            stream_id, delta
        );
        frame::write_window_update(buf, stream_id, delta)
    }
}

fn log_frame_error(err: frame::FrameError) -> ErrorCode {
    debug!("{}", err);
    err.error_code()
}
