//! SSE frame assembly from raw byte deliveries
//!
//! The streaming endpoint sends `data: <JSON>` frames terminated by a blank
//! line. Deliveries from the transport can split a frame at any byte offset
//! (including mid-codepoint) or carry several frames at once, so frames are
//! reassembled from a raw byte buffer rather than per-delivery text.

/// Incremental reader that turns byte deliveries into complete frame payloads.
///
/// A trailing partial frame is held in the buffer until the delimiter for it
/// arrives. If the stream closes first, the partial is simply dropped; abrupt
/// closure is reported by the session, not by the reader.
#[derive(Debug, Default)]
pub struct FrameReader {
    buffer: Vec<u8>,
}

/// Frame delimiter: a blank line between frames, in LF framing
const LF_DELIMITER: &[u8] = b"\n\n";
/// The same blank line when the server (or a proxy) uses CRLF framing
const CRLF_DELIMITER: &[u8] = b"\r\n\r\n";

impl FrameReader {
    /// Create an empty reader
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte delivery, returning the payloads of every frame it
    /// completes, in wire order.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some((pos, len)) = find_delimiter(&self.buffer) {
            let frame = String::from_utf8_lossy(&self.buffer[..pos]).into_owned();
            self.buffer.drain(..pos + len);

            match frame_payload(&frame) {
                Some(payload) => payloads.push(payload),
                // Comment / keep-alive frames carry no data field
                None => tracing::trace!("dropping frame without data field"),
            }
        }
        payloads
    }

    /// Whether a partial frame is still buffered
    pub fn has_partial(&self) -> bool {
        !self.buffer.is_empty()
    }
}

/// Earliest blank-line delimiter in the buffer, with its byte length.
/// CRLF is checked first at each offset since its prefix contains no LF pair.
fn find_delimiter(buffer: &[u8]) -> Option<(usize, usize)> {
    for i in 0..buffer.len() {
        let rest = &buffer[i..];
        if rest.starts_with(CRLF_DELIMITER) {
            return Some((i, CRLF_DELIMITER.len()));
        }
        if rest.starts_with(LF_DELIMITER) {
            return Some((i, LF_DELIMITER.len()));
        }
    }
    None
}

/// Extract the payload of one frame: the concatenation of its `data:` lines.
/// Returns `None` when the frame has no `data:` line at all.
fn frame_payload(frame: &str) -> Option<String> {
    let mut payload: Option<String> = None;
    for line in frame.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let Some(rest) = line.strip_prefix("data:") else {
            continue;
        };
        let rest = rest.strip_prefix(' ').unwrap_or(rest);
        match payload.as_mut() {
            Some(p) => {
                p.push('\n');
                p.push_str(rest);
            }
            None => payload = Some(rest.to_string()),
        }
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIRE: &[u8] =
        b"data: {\"type\":\"chunk\",\"content\":\"Hi\"}\n\ndata: {\"type\":\"chunk\",\"content\":\"!\"}\n\n";

    fn collect(reader: &mut FrameReader, deliveries: &[&[u8]]) -> Vec<String> {
        deliveries
            .iter()
            .flat_map(|d| reader.push(d))
            .collect()
    }

    #[test]
    fn test_single_delivery_multiple_frames() {
        let mut reader = FrameReader::new();
        let payloads = reader.push(WIRE);
        assert_eq!(
            payloads,
            vec![
                r#"{"type":"chunk","content":"Hi"}"#,
                r#"{"type":"chunk","content":"!"}"#,
            ]
        );
        assert!(!reader.has_partial());
    }

    #[test]
    fn test_every_split_offset_yields_identical_frames() {
        let mut expected_reader = FrameReader::new();
        let expected = expected_reader.push(WIRE);

        for split in 0..=WIRE.len() {
            let mut reader = FrameReader::new();
            let payloads = collect(&mut reader, &[&WIRE[..split], &WIRE[split..]]);
            assert_eq!(payloads, expected, "split at byte {split}");
        }
    }

    #[test]
    fn test_byte_at_a_time_delivery() {
        let mut reader = FrameReader::new();
        let mut payloads = Vec::new();
        for byte in WIRE {
            payloads.extend(reader.push(std::slice::from_ref(byte)));
        }
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[1], r#"{"type":"chunk","content":"!"}"#);
    }

    #[test]
    fn test_multibyte_codepoint_split_across_deliveries() {
        let wire = "data: {\"type\":\"chunk\",\"content\":\"héllo\"}\n\n".as_bytes();
        // Split inside the two-byte encoding of 'é'
        let split = wire.iter().position(|&b| b == 0xc3).unwrap() + 1;

        let mut reader = FrameReader::new();
        let payloads = collect(&mut reader, &[&wire[..split], &wire[split..]]);
        assert_eq!(payloads, vec![r#"{"type":"chunk","content":"héllo"}"#]);
    }

    #[test]
    fn test_trailing_partial_retained_until_completed() {
        let mut reader = FrameReader::new();
        assert!(reader.push(b"data: {\"type\":\"chunk\"").is_empty());
        assert!(reader.has_partial());

        let payloads = reader.push(b",\"content\":\"Hi\"}\n\n");
        assert_eq!(payloads, vec![r#"{"type":"chunk","content":"Hi"}"#]);
        assert!(!reader.has_partial());
    }

    #[test]
    fn test_comment_and_keepalive_frames_dropped() {
        let mut reader = FrameReader::new();
        let payloads = reader.push(b": keep-alive\n\nevent: ping\n\ndata: {\"a\":1}\n\n");
        assert_eq!(payloads, vec![r#"{"a":1}"#]);
    }

    #[test]
    fn test_crlf_frame_delimiter() {
        let mut reader = FrameReader::new();
        let payloads = reader.push(b"data: {\"a\":1}\r\n\r\ndata: {\"b\":2}\r\n\r\n");
        assert_eq!(payloads, vec![r#"{"a":1}"#, r#"{"b":2}"#]);
        assert!(!reader.has_partial());
    }

    #[test]
    fn test_crlf_delimiter_split_across_deliveries() {
        let mut reader = FrameReader::new();
        assert!(reader.push(b"data: {\"a\":1}\r\n").is_empty());
        let payloads = reader.push(b"\r\ndata: {\"b\":2}\r\n\r\n");
        assert_eq!(payloads, vec![r#"{"a":1}"#, r#"{"b":2}"#]);
    }

    #[test]
    fn test_crlf_line_endings_tolerated() {
        let mut reader = FrameReader::new();
        let payloads = reader.push(b"data: {\"a\":1}\r\n\ndata: {\"b\":2}\n\n");
        assert_eq!(payloads, vec![r#"{"a":1}"#, r#"{"b":2}"#]);
    }

    #[test]
    fn test_multiline_data_fields_joined() {
        let mut reader = FrameReader::new();
        let payloads = reader.push(b"data: first\ndata: second\n\n");
        assert_eq!(payloads, vec!["first\nsecond"]);
    }

    #[test]
    fn test_data_without_space_after_colon() {
        let mut reader = FrameReader::new();
        let payloads = reader.push(b"data:{\"a\":1}\n\n");
        assert_eq!(payloads, vec![r#"{"a":1}"#]);
    }
}
