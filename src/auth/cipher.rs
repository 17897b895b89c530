//! Password obfuscation used by the EAccess login exchange.

/// Obfuscate `password` against the challenge `key`.
///
/// Each byte is XORed with the key byte at the same position. When the key
/// byte is at or above `b'a'` the result is XORed again with `0x40`, and a
/// result below `0x20` gets its high bit set. The steps are applied in that
/// order.
///
/// Returns `None` when the key is shorter than the password.
pub fn obfuscate_password(key: &[u8], password: &[u8]) -> Option<Vec<u8>> {
    if key.len() < password.len() {
        return None;
    }

    let out = password
        .iter()
        .zip(key)
        .map(|(&p, &k)| {
            let mut c = k ^ p;
            if k >= b'a' {
                c ^= 0x40;
            }
            if c < b' ' {
                c |= 0x80;
            }
            c
        })
        .collect();
    Some(out)
}
