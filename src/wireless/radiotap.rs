//! Radiotap header skipping
//!
//! Radiotap is the de facto capture encapsulation for 802.11 monitor mode.
//! Only the fixed preamble matters here: version (0), pad, and a
//! little-endian total header length used to find the 802.11 frame.

/// Byte length of the radiotap header at the start of `data`, if present
/// and sane.
pub fn header_len(data: &[u8]) -> Option<usize> {
    if data.len() < 8 || data[0] != 0 {
        return None;
    }
    let len = u16::from_le_bytes([data[2], data[3]]) as usize;
    if len < 8 || len > data.len() {
        return None;
    }
    Some(len)
}
