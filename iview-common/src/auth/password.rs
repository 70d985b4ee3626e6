//! Password hashing for tenant users

use crate::{Error, Result};

use super::{constant_time_eq, random_salt, salted_sha256_hex};

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Reject passwords that are too short or blank
pub fn validate_password(password: &str) -> Result<()> {
    if password.trim().is_empty() {
        return Err(Error::InvalidInput("password must not be blank".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::InvalidInput(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Hash a password with a fresh salt. Returns `(hash, salt)`.
pub fn hash_password(password: &str) -> (String, String) {
    let salt = random_salt();
    let hash = salted_sha256_hex(&salt, password);
    (hash, salt)
}

/// Check a password against a stored hash and salt
pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    if expected_hash.is_empty() {
        return false;
    }
    let calculated = salted_sha256_hex(salt, password);
    constant_time_eq(calculated.as_bytes(), expected_hash.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let (hash, salt) = hash_password("correct horse");
        assert!(verify_password("correct horse", &salt, &hash));
        assert!(!verify_password("wrong horse", &salt, &hash));
    }

    #[test]
    fn test_same_password_gets_distinct_hashes() {
        let (h1, s1) = hash_password("repeatable");
        let (h2, s2) = hash_password("repeatable");
        assert_ne!(s1, s2);
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_empty_stored_hash_never_verifies() {
        assert!(!verify_password("", "", ""));
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("         ").is_err());
    }
}
