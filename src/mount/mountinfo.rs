//! `/proc/self/mountinfo` parsing.

use std::path::PathBuf;

/// Extract mount points (field 5) from mountinfo text.
///
/// Octal escapes the kernel uses for whitespace and backslashes (`\040`,
/// `\011`, `\012`, `\134`) are decoded. Malformed lines are skipped.
pub fn parse_mountinfo(content: &str) -> Vec<PathBuf> {
    content
        .lines()
        .filter_map(|line| line.split(' ').nth(4))
        .filter(|field| !field.is_empty())
        .map(|field| PathBuf::from(unescape(field)))
        .collect()
}

/// Mount points of the calling process, or `None` if mountinfo is unreadable.
pub fn mount_points() -> Option<Vec<PathBuf>> {
    std::fs::read_to_string("/proc/self/mountinfo")
        .ok()
        .map(|content| parse_mountinfo(&content))
}

fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() && is_octal_triplet(&bytes[i + 1..i + 4]) {
            let value = (bytes[i + 1] - b'0') * 64 + (bytes[i + 2] - b'0') * 8 + (bytes[i + 3] - b'0');
            out.push(value);
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn is_octal_triplet(digits: &[u8]) -> bool {
    digits.len() == 3 && digits.iter().all(|d| (b'0'..=b'7').contains(d)) && digits[0] <= b'3'
}
