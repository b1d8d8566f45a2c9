//! Byte-level line decoding shared by the tailer, backlog and search.
//!
//! Log writers can emit non-UTF-8 bytes, so lines are read as bytes and
//! decoded lossily instead of going through `BufReader::lines()`.

/// Decode one raw line (without its `\n`) into a message.
///
/// Strips a trailing `\r`. Returns `None` for blank lines, which are never
/// emitted.
pub(crate) fn decode_line(mut bytes: &[u8]) -> Option<String> {
    if let [rest @ .., b'\r'] = bytes {
        bytes = rest;
    }
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    Some(String::from_utf8_lossy(bytes).into_owned())
}
