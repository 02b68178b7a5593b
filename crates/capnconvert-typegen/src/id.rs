//! Schema file identifiers.

/// Cap'n Proto requires the top bit of a file ID to be set.
const FILE_ID_MARKER: u64 = 1 << 63;

/// A fresh file ID as 16 lowercase hex digits.
pub fn new_file_id() -> String {
    format_file_id(rand::random::<u64>())
}

/// Render `raw` as a file ID, forcing the marker bit.
pub fn format_file_id(raw: u64) -> String {
    format!("{:016x}", raw | FILE_ID_MARKER)
}
