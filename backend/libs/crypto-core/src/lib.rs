//! Token and password primitives for the Campus Crush API.
//!
//! - [`jwt`]: HMAC-signed access tokens (`{sub, exp, iat}`)
//! - [`password`]: Argon2id hashing and random password generation

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtError, JwtKeys};
pub use password::{generate_strong_password, hash_password, verify_password, PasswordError};
