//! Hex argument parsing for raw payloads and UIDs.

/// Decode whitespace-separated hex arguments into bytes.
///
/// The arguments are concatenated, spaces removed, and decoded two digits at
/// a time. Returns `None` for no arguments, an odd digit count, or any
/// non-hex pair.
pub fn parse_hex_args<S: AsRef<str>>(args: &[S]) -> Option<Vec<u8>> {
    if args.is_empty() {
        return None;
    }
    let joined: String = args
        .iter()
        .flat_map(|arg| arg.as_ref().chars())
        .filter(|c| *c != ' ')
        .collect();
    parse_hex(&joined)
}

/// Decode a contiguous hex string into bytes, either case.
pub fn parse_hex(text: &str) -> Option<Vec<u8>> {
    hex::decode(text).ok()
}

/// Lowercase hex rendering without separators.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
