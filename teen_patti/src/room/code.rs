//! Private room join codes.

use super::errors::{RoomError, RoomResult};
use rand::Rng;

/// Characters a join code is drawn from
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Draws a code of `len` characters uniformly from [`CODE_ALPHABET`].
pub fn generate_join_code<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
        .collect()
}

/// Canonical form of a user-supplied code: trimmed and upper-cased.
///
/// # Errors
///
/// * `RoomError::InvalidCode` - wrong length or a character outside the
///   alphabet
pub fn normalize_join_code(raw: &str, len: usize) -> RoomResult<String> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() != len || !code.bytes().all(|b| CODE_ALPHABET.contains(&b)) {
        return Err(RoomError::InvalidCode);
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_generated_codes_use_alphabet() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let code = generate_join_code(&mut rng, 6);
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_codes_vary() {
        let mut rng = StdRng::seed_from_u64(12);
        let a = generate_join_code(&mut rng, 6);
        let b = generate_join_code(&mut rng, 6);
        assert_ne!(a, b);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_join_code(" ab12cd ", 6).unwrap(), "AB12CD");
        assert!(matches!(
            normalize_join_code("AB12C", 6),
            Err(RoomError::InvalidCode)
        ));
        assert!(matches!(
            normalize_join_code("AB-2CD", 6),
            Err(RoomError::InvalidCode)
        ));
    }
}
