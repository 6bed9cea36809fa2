//! # Hex Rendering Utilities
//!
//! VE.Direct is a text protocol, but the checksum byte and corrupted input are
//! not. These helpers render raw decoder buffers for the rejected-frame log.
//!
//! ```rust
//! use vedirect_bridge::util::hex::format_hex_compact;
//!
//! assert_eq!(format_hex_compact(b"\r\nV\t"), "0d 0a 56 09");
//! ```

/// Format bytes as "0d 0a 56 09" for single-line log output.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| hex::encode([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hex dump with offsets and a printable column, one row per `bytes_per_line`.
///
/// Tabs, CR and LF show up as `.` in the text column, which keeps the
/// `TAG<TAB>VALUE` layout of a frame readable next to its raw bytes.
pub fn pretty_hex(data: &[u8], bytes_per_line: usize) -> String {
    let width = bytes_per_line.max(1);

    data.chunks(width)
        .enumerate()
        .map(|(row, chunk)| {
            let hex = format_hex_compact(chunk);
            let text: String = chunk
                .iter()
                .map(|&b| {
                    if b.is_ascii_graphic() || b == b' ' {
                        b as char
                    } else {
                        '.'
                    }
                })
                .collect();
            format!("{:04x}: {:<pad$} |{}|", row * width, hex, text, pad = width * 3 - 1)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
