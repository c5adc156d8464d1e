//! Header-block compression engine.
//!
//! [`HeaderCodec`] wraps the `hpack` crate's encoder/decoder pair behind the
//! small contract the codec needs: encode a flat name/value list to an opaque
//! block, decode a complete block back into a list, apply table-size
//! controls, and report the size of the last encoded block.

use std::fmt;

use bytes::Bytes;

/// One decoded or to-be-encoded header field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    pub name: String,
    pub value: String,
}

impl HeaderField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Size of the most recently encoded header block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderSize {
    /// Bytes on the wire after compression.
    pub compressed: usize,
    /// Sum of name and value lengths before compression, with the
    /// conventional two bytes of per-field overhead.
    pub uncompressed: usize,
}

/// Header-block decode failure. The codec escalates this to a
/// COMPRESSION_ERROR connection error; the payload is diagnostic only.
#[derive(Debug)]
pub struct DecodeError(String);

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "header block decode failed: {}", self.0)
    }
}

impl std::error::Error for DecodeError {}

/// Stateful header compression context for one connection endpoint.
pub struct HeaderCodec {
    encoder: hpack::Encoder<'static>,
    decoder: hpack::Decoder<'static>,
    /// Peer-advertised encoder table size. The underlying encoder keeps its
    /// default table and never emits table-size updates, so this is recorded
    /// for observability rather than applied.
    encoder_table_size: u32,
    last_encoded: HeaderSize,
}

impl Default for HeaderCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderCodec {
    pub fn new() -> Self {
        Self {
            encoder: hpack::Encoder::new(),
            decoder: hpack::Decoder::new(),
            encoder_table_size: crate::frame::DEFAULT_HEADER_TABLE_SIZE,
            last_encoded: HeaderSize::default(),
        }
    }

    /// Encode a header list into one opaque block.
    pub fn encode(&mut self, fields: &[(String, String)]) -> Bytes {
        let pairs: Vec<(&[u8], &[u8])> = fields
            .iter()
            .map(|(name, value)| (name.as_bytes(), value.as_bytes()))
            .collect();
        let block = self.encoder.encode(pairs);
        self.last_encoded = HeaderSize {
            compressed: block.len(),
            uncompressed: fields
                .iter()
                .map(|(name, value)| name.len() + value.len() + 2)
                .sum(),
        };
        Bytes::from(block)
    }

    /// Decode one complete header block into a flat field list.
    ///
    /// Non-UTF-8 names or values are preserved lossily; the replacement
    /// character fails downstream syntax validation, so garbage cannot
    /// masquerade as a clean header.
    pub fn decode(&mut self, block: &[u8]) -> Result<Vec<HeaderField>, DecodeError> {
        match self.decoder.decode(block) {
            Ok(pairs) => Ok(pairs
                .into_iter()
                .map(|(name, value)| HeaderField {
                    name: String::from_utf8_lossy(&name).into_owned(),
                    value: String::from_utf8_lossy(&value).into_owned(),
                })
                .collect()),
            Err(err) => Err(DecodeError(format!("{:?}", err))),
        }
    }

    /// Record the peer's HEADER_TABLE_SIZE for the encoding direction.
    pub fn set_encoder_table_size(&mut self, size: u32) {
        self.encoder_table_size = size;
    }

    /// Peer-advertised encoder table size, as last recorded.
    pub fn encoder_table_size(&self) -> u32 {
        self.encoder_table_size
    }

    /// Cap the dynamic table the decoder will honor, from our advertised
    /// HEADER_TABLE_SIZE.
    pub fn set_decoder_table_max_size(&mut self, size: u32) {
        self.decoder.set_max_table_size(size as usize);
    }

    /// Size of the most recently encoded block.
    pub fn last_encoded_size(&self) -> HeaderSize {
        self.last_encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_list(fields: &[(&str, &str)]) -> Vec<(String, String)> {
        fields
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut codec = HeaderCodec::new();
        let fields = field_list(&[
            (":method", "GET"),
            (":scheme", "https"),
            (":path", "/index.html"),
            ("accept", "*/*"),
        ]);

        let block = codec.encode(&fields);
        let decoded = codec.decode(&block).unwrap();

        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded[0], HeaderField::new(":method", "GET"));
        assert_eq!(decoded[2], HeaderField::new(":path", "/index.html"));
        assert_eq!(decoded[3], HeaderField::new("accept", "*/*"));
    }

    #[test]
    fn test_encode_records_sizes() {
        let mut codec = HeaderCodec::new();
        let fields = field_list(&[(":method", "GET")]);
        let block = codec.encode(&fields);

        let size = codec.last_encoded_size();
        assert_eq!(size.compressed, block.len());
        assert_eq!(size.uncompressed, ":method".len() + "GET".len() + 2);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let mut codec = HeaderCodec::new();
        // An indexed-field representation pointing far past both tables.
        assert!(codec.decode(&[0xff, 0xff, 0xff, 0xff, 0xff]).is_err());
    }

    #[test]
    fn test_decode_empty_block() {
        let mut codec = HeaderCodec::new();
        let decoded = codec.decode(&[]).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_stateful_across_blocks() {
        // A field inserted into the dynamic table by one block must be
        // resolvable from the next.
        let mut sender = HeaderCodec::new();
        let mut receiver = HeaderCodec::new();

        let fields = field_list(&[("x-request-id", "abc123")]);
        let first = sender.encode(&fields);
        let second = sender.encode(&fields);

        assert_eq!(receiver.decode(&first).unwrap(), receiver.decode(&second).unwrap());
    }

    #[test]
    fn test_encoder_table_size_recorded() {
        let mut codec = HeaderCodec::new();
        assert_eq!(codec.encoder_table_size(), 4096);
        codec.set_encoder_table_size(8192);
        assert_eq!(codec.encoder_table_size(), 8192);
    }
}
