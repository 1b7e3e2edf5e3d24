//! Password hashing and verification.
//!
//! Argon2id with per-hash random salts plus a server-side pepper. The
//! pepper never leaves process configuration, so a leaked database dump
//! alone is not enough to run an offline dictionary attack.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::errors::{AuthError, AuthResult};

/// Hash a password with Argon2id + pepper
pub fn hash_password(password: &str, pepper: &str) -> AuthResult<String> {
    let peppered = format!("{}{}", password, pepper);
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    Ok(argon2
        .hash_password(peppered.as_bytes(), &salt)
        .map_err(|_| AuthError::HashingFailed)?
        .to_string())
}

/// Verify a password against a stored hash
///
/// Fails with `InvalidCredentials` on mismatch; the caller decides how
/// much of that to expose.
pub fn verify_password(password: &str, pepper: &str, hash: &str) -> AuthResult<()> {
    let peppered = format!("{}{}", password, pepper);
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(peppered.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Validate password strength
pub fn validate_strength(password: &str) -> AuthResult<()> {
    if password.len() < 8 {
        return Err(AuthError::WeakPassword(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());

    if !has_digit || !has_uppercase || !has_lowercase {
        return Err(AuthError::WeakPassword(
            "Password must contain at least one number, one uppercase and one lowercase letter"
                .to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEPPER: &str = "test_pepper";

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("SecurePass123", PEPPER).unwrap();
        assert!(verify_password("SecurePass123", PEPPER, &hash).is_ok());
    }

    #[test]
    fn wrong_password_rejected() {
        let hash = hash_password("SecurePass123", PEPPER).unwrap();
        let err = verify_password("WrongPass123", PEPPER, &hash).unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn wrong_pepper_rejected() {
        let hash = hash_password("SecurePass123", PEPPER).unwrap();
        let err = verify_password("SecurePass123", "other_pepper", &hash).unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("SecurePass123", PEPPER).unwrap();
        let b = hash_password("SecurePass123", PEPPER).unwrap();
        assert_ne!(a, b, "Identical passwords should hash differently");
    }

    #[test]
    fn strength_rules() {
        assert!(matches!(
            validate_strength("Ab1").unwrap_err(),
            AuthError::WeakPassword(_)
        ));
        assert!(matches!(
            validate_strength("alllowercase1").unwrap_err(),
            AuthError::WeakPassword(_)
        ));
        assert!(matches!(
            validate_strength("NoDigitsHere").unwrap_err(),
            AuthError::WeakPassword(_)
        ));
        assert!(validate_strength("GoodPass1").is_ok());
    }
}
