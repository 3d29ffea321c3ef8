//! Log sanitization for values derived from client input.
//!
//! Basket names, forward URLs and upstream error strings end up in log
//! lines; raw CR/LF in them would let a caller forge additional log
//! records. Every such value goes through [`sanitize_for_log`] first.

/// Replace ASCII CR and LF with the literal markers `^r` and `^n`.
pub fn sanitize_for_log(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\n' => out.push_str("^n"),
            '\r' => out.push_str("^r"),
            _ => out.push(c),
        }
    }
    out
}
