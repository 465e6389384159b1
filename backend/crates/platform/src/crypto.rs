//! Cryptographic Utilities

use rand::{RngCore, rngs::OsRng};

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Generate a numeric one-time code of the given length
///
/// Digits are drawn with rejection sampling so every digit is uniform.
pub fn numeric_code(len: usize) -> String {
    let mut code = String::with_capacity(len);
    while code.len() < len {
        for byte in random_bytes(len) {
            // Reject 250..=255 to avoid modulo bias
            if byte < 250 {
                code.push(char::from(b'0' + byte % 10));
                if code.len() == len {
                    break;
                }
            }
        }
    }
    code
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes() {
        let bytes = random_bytes(32);
        assert_eq!(bytes.len(), 32);
        // Should not be all zeros (statistically)
        assert!(bytes.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_numeric_code_shape() {
        let code = numeric_code(6);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        let code = numeric_code(8);
        assert_eq!(code.len(), 8);
    }

    #[test]
    fn test_numeric_codes_differ() {
        // 10^12 possibilities for a pair of 6-digit codes; a collision here
        // would indicate a broken RNG
        let a = numeric_code(6);
        let b = numeric_code(6);
        let c = numeric_code(6);
        assert!(a != b || b != c);
    }

    #[test]
    fn test_constant_time_eq() {
        let a = [1u8, 2, 3, 4];
        let b = [1u8, 2, 3, 4];
        let c = [1u8, 2, 3, 5];
        assert!(constant_time_eq(&a, &b));
        assert!(!constant_time_eq(&a, &c));
        assert!(!constant_time_eq(&a, &b[..3]));
    }
}
