//! Base62 rendering used for short codes and record ids.

/// Digits, then uppercase, then lowercase.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

const BASE: u64 = ALPHABET.len() as u64;

/// Renders `num` into exactly `width` symbols, left-padded with `'0'`.
///
/// Symbols are filled from the right; if `num` needs more than `width`
/// symbols, only the low-order `width` digits are kept (i.e. the value is
/// reduced modulo `62^width`).
pub fn encode_fixed(mut num: u64, width: usize) -> String {
    let mut buf = vec![ALPHABET[0]; width];
    for slot in buf.iter_mut().rev() {
        if num == 0 {
            break;
        }
        *slot = ALPHABET[(num % BASE) as usize];
        num /= BASE;
    }
    buf.into_iter().map(char::from).collect()
}

/// Renders `num` with as few symbols as needed (`"0"` for zero).
pub fn encode(mut num: u64) -> String {
    if num == 0 {
        return char::from(ALPHABET[0]).to_string();
    }

    let mut digits = Vec::with_capacity(11);
    while num > 0 {
        digits.push(ALPHABET[(num % BASE) as usize]);
        num /= BASE;
    }
    digits.into_iter().rev().map(char::from).collect()
}
