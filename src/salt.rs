//! Random salts for new PHC strings.

use rand::{rngs::OsRng, Fill};

/// Salt length used when the caller has no preference. 16 bytes encode to 22 base64
/// characters, which is within the limits of both scrypt and Argon2 strings.
pub const DEFAULT_SALT_LENGTH: usize = 16;

/// Generates `len` bytes of salt using the operating system's cryptographically-secure random
/// number generator.
///
/// # Panics
///
/// Panics if the operating system RNG is unavailable.
pub fn generate_salt(len: usize) -> Vec<u8> {
    let mut salt = vec![0u8; len];
    salt.try_fill(&mut OsRng)
        .expect("Failed to fill buffer with random bytes");
    salt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argon2::{Argon2Phc, Argon2Variant};

    #[test]
    fn test_generate_salt() {
        assert_eq!(generate_salt(DEFAULT_SALT_LENGTH).len(), DEFAULT_SALT_LENGTH);
        assert!(generate_salt(0).is_empty());

        let a = generate_salt(32);
        let b = generate_salt(32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_generated_salt_is_valid_for_argon2() {
        let salt = generate_salt(DEFAULT_SALT_LENGTH);
        let phc = Argon2Phc::new(Argon2Variant::Argon2id, 4096, 3, 1)
            .with_salt_and_hash(&salt, &[0u8; 32]);

        assert_eq!(phc.salt.len(), 22);
        assert!(phc.validate_parameters().is_ok());

        let decoded = Argon2Phc::decode(&phc.encode().unwrap()).unwrap();
        assert_eq!(decoded.salt_bytes().unwrap(), salt);
    }
}
