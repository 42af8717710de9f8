//! Hex formatting for diagnostics.

/// Render bytes as space-separated lowercase hex, breaking the line every
/// `per_line` bytes. A `per_line` of zero keeps everything on one line.
pub fn pretty_hex(data: &[u8], per_line: usize) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for (i, byte) in data.iter().enumerate() {
        if i > 0 {
            if per_line > 0 && i % per_line == 0 {
                out.push('\n');
            } else {
                out.push(' ');
            }
        }
        out.push_str(&hex::encode([*byte]));
    }
    out
}
