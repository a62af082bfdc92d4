//! Minimal server-sent events decoder for `/query-stream/`.
//!
//! Bytes arrive in arbitrary network chunks. Events are separated by a
//! blank line; only `data:` fields are kept (multiple `data:` lines in one
//! event are joined with `\n`).

#[derive(Debug, Default)]
pub struct SseDecoder {
    // Raw bytes; a chunk may end in the middle of a UTF-8 sequence
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the data payloads of all events it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        normalise_crlf(&mut self.buffer);

        let mut payloads = Vec::new();
        while let Some(end) = find_blank_line(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(data) = parse_block(&String::from_utf8_lossy(&block)) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Flush a trailing event the server did not terminate with a blank line.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        parse_block(&String::from_utf8_lossy(&rest))
    }
}

/// Drop every `\r` that precedes a `\n`. A trailing `\r` is kept until its
/// `\n` arrives.
fn normalise_crlf(buffer: &mut Vec<u8>) {
    if !buffer.contains(&b'\r') {
        return;
    }
    let mut out = Vec::with_capacity(buffer.len());
    for (i, &byte) in buffer.iter().enumerate() {
        if byte == b'\r' && buffer.get(i + 1) == Some(&b'\n') {
            continue;
        }
        out.push(byte);
    }
    *buffer = out;
}

fn find_blank_line(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn parse_block(block: &str) -> Option<String> {
    let lines: Vec<&str> = block
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
