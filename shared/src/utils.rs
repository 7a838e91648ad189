//! # Shared Utility Functions
//!
//! Display helpers used by the backend logs and the tracking CLI.
//!
//! ```rust
//! use shared::utils::truncate_address;
//!
//! assert_eq!(truncate_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"), "0x5aAe...eAed");
//! assert_eq!(truncate_address("8W6QginkhTTxoP2deQjq7rZ9YMwN5FH9JYuLfSKuJKAL"), "8W6Q...JKAL");
//! ```

/// Show the first `prefix_len` and last `suffix_len` characters of an address.
///
/// Addresses too short to shorten are returned unchanged.
pub fn format_address(address: &str, prefix_len: usize, suffix_len: usize) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= prefix_len + suffix_len {
        return address.to_string();
    }

    let head: String = chars[..prefix_len].iter().collect();
    let tail: String = chars[chars.len() - suffix_len..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Address shortened for logs. A `0x` prefix is kept and not counted.
pub fn truncate_address(address: &str) -> String {
    match address.strip_prefix("0x") {
        Some(rest) => format!("0x{}", format_address(rest, 4, 4)),
        None => format_address(address, 4, 4),
    }
}
