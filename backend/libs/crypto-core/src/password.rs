/// Password hashing and verification using Argon2id
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::seq::SliceRandom;
use rand::Rng;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SPECIALS: &[u8] = b"!@#$%^&*";

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hash a password with Argon2id and a random salt.
///
/// Returns a PHC-formatted string suitable for storage.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Verify a password against its PHC hash.
///
/// A mismatch is `Ok(false)`; an unreadable hash is an error.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Hash(e.to_string())),
    }
}

/// Random password of `length` characters drawn from letters, digits and `!@#$%^&*`.
///
/// For `length >= 3` the result contains at least one character of each class.
pub fn generate_strong_password(length: usize) -> String {
    let mut rng = rand::thread_rng();
    let alphabet: Vec<u8> = [LETTERS, DIGITS, SPECIALS].concat();

    let mut chars: Vec<u8> = Vec::with_capacity(length);
    if length >= 3 {
        for class in [LETTERS, DIGITS, SPECIALS] {
            chars.push(class[rng.gen_range(0..class.len())]);
        }
    }
    while chars.len() < length {
        chars.push(alphabet[rng.gen_range(0..alphabet.len())]);
    }
    chars.shuffle(&mut rng);

    chars.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(PasswordError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_generate_strong_password() {
        let password = generate_strong_password(12);
        assert_eq!(password.len(), 12);
        assert!(password.chars().any(|c| c.is_ascii_alphabetic()));
        assert!(password.chars().any(|c| c.is_ascii_digit()));
        assert!(password.chars().any(|c| "!@#$%^&*".contains(c)));
        assert!(password
            .bytes()
            .all(|b| LETTERS.contains(&b) || DIGITS.contains(&b) || SPECIALS.contains(&b)));
    }

    #[test]
    fn test_generate_short_password() {
        assert_eq!(generate_strong_password(0), "");
        assert_eq!(generate_strong_password(2).len(), 2);
    }
}
