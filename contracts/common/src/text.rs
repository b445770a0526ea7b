//! Text normalisation over Soroban `String`s.
//!
//! Host strings cannot be sliced in place, so every helper copies the value
//! into a fixed stack buffer, transforms it there, and rebuilds a new host
//! string. Inputs longer than [`MAX_TEXT_LEN`] are rejected with `None` and
//! should surface as a validation error at the contract boundary.

use soroban_sdk::{Env, String};

/// Upper bound on any free-text value handled by the suite.
pub const MAX_TEXT_LEN: u32 = 128;

/// Copies `s` into `buf` and returns the occupied prefix, or `None` when the
/// string does not fit.
fn fill(s: &String, buf: &mut [u8; MAX_TEXT_LEN as usize]) -> Option<usize> {
    let len = s.len();
    if len > MAX_TEXT_LEN {
        return None;
    }
    s.copy_into_slice(&mut buf[..len as usize]);
    Some(len as usize)
}

fn trim_bounds(buf: &[u8]) -> (usize, usize) {
    let mut start = 0usize;
    let mut end = buf.len();
    while start < end && buf[start].is_ascii_whitespace() {
        start += 1;
    }
    while end > start && buf[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    (start, end)
}

/// Returns `s` with leading and trailing ASCII whitespace removed.
///
/// The result may be empty; callers that require non-blank input should
/// check with [`is_blank`] first or inspect the returned length.
pub fn trimmed(env: &Env, s: &String) -> Option<String> {
    let mut buf = [0u8; MAX_TEXT_LEN as usize];
    let len = fill(s, &mut buf)?;
    let (start, end) = trim_bounds(&buf[..len]);
    Some(String::from_bytes(env, &buf[start..end]))
}

/// Trims and ASCII-lowercases `s` in one pass. Used for email identity keys,
/// which must compare equal regardless of the case a caller typed them in.
pub fn trimmed_lower(env: &Env, s: &String) -> Option<String> {
    let mut buf = [0u8; MAX_TEXT_LEN as usize];
    let len = fill(s, &mut buf)?;
    let (start, end) = trim_bounds(&buf[..len]);
    for b in &mut buf[start..end] {
        *b = b.to_ascii_lowercase();
    }
    Some(String::from_bytes(env, &buf[start..end]))
}

/// Extracts the ASCII digits of `s`, dropping every other byte.
pub fn digits_of(env: &Env, s: &String) -> Option<String> {
    let mut buf = [0u8; MAX_TEXT_LEN as usize];
    let len = fill(s, &mut buf)?;
    let mut out = [0u8; MAX_TEXT_LEN as usize];
    let mut n = 0usize;
    for &b in &buf[..len] {
        if b.is_ascii_digit() {
            out[n] = b;
            n += 1;
        }
    }
    Some(String::from_bytes(env, &out[..n]))
}

/// True when `s` is empty or contains only ASCII whitespace.
///
/// Oversized strings report as non-blank so that the length check, not this
/// one, rejects them.
pub fn is_blank(s: &String) -> bool {
    let mut buf = [0u8; MAX_TEXT_LEN as usize];
    match fill(s, &mut buf) {
        Some(len) => buf[..len].iter().all(|b| b.is_ascii_whitespace()),
        None => false,
    }
}

/// True when every byte of `s` is printable ASCII (space through tilde).
pub fn is_printable_ascii(s: &String) -> bool {
    let mut buf = [0u8; MAX_TEXT_LEN as usize];
    match fill(s, &mut buf) {
        Some(len) => buf[..len].iter().all(|&b| (32..=126).contains(&b)),
        None => false,
    }
}

/// True when every byte of `s` is an ASCII digit. Empty strings pass.
pub fn is_all_digits(s: &String) -> bool {
    let mut buf = [0u8; MAX_TEXT_LEN as usize];
    match fill(s, &mut buf) {
        Some(len) => buf[..len].iter().all(|b| b.is_ascii_digit()),
        None => false,
    }
}
