#![no_main]

use http2_codec::codec::{Direction, EventSink, Http2Codec};
use libfuzzer_sys::fuzz_target;

struct NullSink;

impl EventSink for NullSink {}

fuzz_target!(|data: &[u8]| {
    // First byte picks the direction, the rest is wire bytes. Feed the
    // stream twice: whole, then split in half to exercise resumption.
    if data.is_empty() {
        return;
    }
    let direction = if data[0] & 1 == 0 {
        Direction::Downstream
    } else {
        Direction::Upstream
    };
    let bytes = &data[1..];

    let mut sink = NullSink;

    let mut codec = Http2Codec::new(direction);
    let consumed = codec.on_ingress(bytes, &mut sink);
    assert!(consumed <= bytes.len());

    let mut codec = Http2Codec::new(direction);
    let (first, second) = bytes.split_at(bytes.len() / 2);
    let consumed = codec.on_ingress(first, &mut sink);
    let mut rest = first[consumed..].to_vec();
    rest.extend_from_slice(second);
    let consumed = codec.on_ingress(&rest, &mut sink);
    assert!(consumed <= rest.len());
});
