//! Time-based one-time passwords (RFC 6238) for two-factor login.

use hmac::{Hmac, Mac};
use rand::Rng;
use sha1::Sha1;

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Seconds per TOTP step.
pub const STEP_SECONDS: i64 = 30;

/// Digits in a token.
pub const DIGITS: usize = 6;

/// Length of generated secrets, in base32 characters.
pub const SECRET_LENGTH: usize = 16;

type HmacSha1 = Hmac<Sha1>;

/// Generate a random base32 secret.
pub fn generate_secret() -> String {
    let mut rng = rand::rng();
    (0..SECRET_LENGTH)
        .map(|_| BASE32_ALPHABET[rng.random_range(0..BASE32_ALPHABET.len())] as char)
        .collect()
}

/// Decode an RFC 4648 base32 string. Padding, whitespace and case are ignored.
pub fn decode_base32(input: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for c in input.chars().filter(|c| !c.is_whitespace() && *c != '=') {
        if !c.is_ascii() {
            return None;
        }
        let c = c.to_ascii_uppercase() as u8;
        let value = BASE32_ALPHABET.iter().position(|&a| a == c)? as u32;
        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }
    Some(out)
}

/// HOTP value for `counter`, truncated to [`DIGITS`] digits.
pub fn hotp(key: &[u8], counter: u64) -> Option<u32> {
    let mut mac = HmacSha1::new_from_slice(key).ok()?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let code = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);
    Some(code % 10u32.pow(DIGITS as u32))
}

/// Check `token` against `secret` at `unix_time`, accepting one step of drift
/// either way.
pub fn verify(secret: &str, token: &str, unix_time: i64) -> bool {
    if token.len() != DIGITS || !token.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let Some(key) = decode_base32(secret).filter(|k| !k.is_empty()) else {
        return false;
    };

    let step = unix_time.div_euclid(STEP_SECONDS);
    (-1..=1).any(|drift| {
        let counter = step + drift;
        counter >= 0
            && hotp(&key, counter as u64)
                .is_some_and(|code| format!("{code:0width$}", width = DIGITS) == token)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // "12345678901234567890", the RFC 6238 SHA-1 seed.
    const SEED_BASE32: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn test_decode_base32() {
        assert_eq!(
            decode_base32(SEED_BASE32).unwrap(),
            b"12345678901234567890".to_vec()
        );
        assert_eq!(decode_base32("MZXW6===").unwrap(), b"foo".to_vec());
        assert_eq!(decode_base32("mzxw6").unwrap(), b"foo".to_vec());
        assert!(decode_base32("not base32!").is_none());
    }

    #[test]
    fn test_rfc6238_vectors() {
        assert!(verify(SEED_BASE32, "287082", 59));
        assert!(verify(SEED_BASE32, "081804", 1_111_111_109));
        assert!(verify(SEED_BASE32, "005924", 1_234_567_890));
    }

    #[test]
    fn test_drift_window() {
        // 287082 is valid for step 1; steps 0 and 2 are within the window.
        assert!(verify(SEED_BASE32, "287082", 20));
        assert!(verify(SEED_BASE32, "287082", 89));
        assert!(!verify(SEED_BASE32, "287082", 120));
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        assert!(!verify(SEED_BASE32, "28708", 59));
        assert!(!verify(SEED_BASE32, "28708a", 59));
        assert!(!verify("", "287082", 59));
    }

    #[test]
    fn test_generated_secret_decodes() {
        let secret = generate_secret();
        assert_eq!(secret.len(), SECRET_LENGTH);
        assert_eq!(decode_base32(&secret).unwrap().len(), 10);
    }
}
