use std::fmt;

use anyhow::{anyhow, Result};
use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::AuthError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash a plain password with argon2id and a random salt.
/// The result is a PHC string carrying the parameters.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow!("could not hash password: {}", e))
}

/// Verify a password against an argon2id hash.
/// Malformed or empty hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    MinLength,
    Uppercase,
    Lowercase,
    Digit,
}

impl fmt::Display for PasswordRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordRule::MinLength => {
                write!(f, "at least {} characters", MIN_PASSWORD_LENGTH)
            }
            PasswordRule::Uppercase => write!(f, "an uppercase letter"),
            PasswordRule::Lowercase => write!(f, "a lowercase letter"),
            PasswordRule::Digit => write!(f, "a digit"),
        }
    }
}

/// The rules a candidate password violates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordWeakness(pub Vec<PasswordRule>);

impl PasswordWeakness {
    pub fn violates(&self, rule: PasswordRule) -> bool {
        self.0.contains(&rule)
    }
}

impl fmt::Display for PasswordWeakness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules: Vec<String> = self.0.iter().map(|r| r.to_string()).collect();
        write!(f, "needs {}", rules.join(", "))
    }
}

/// Check a candidate password against the strength rules
pub fn validate_password_strength(password: &str) -> Result<(), AuthError> {
    let mut violated = vec![];
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        violated.push(PasswordRule::MinLength);
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        violated.push(PasswordRule::Uppercase);
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        violated.push(PasswordRule::Lowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        violated.push(PasswordRule::Digit);
    }

    if violated.is_empty() {
        Ok(())
    } else {
        Err(AuthError::WeakPassword(PasswordWeakness(violated)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weakness(password: &str) -> PasswordWeakness {
        match validate_password_strength(password) {
            Err(AuthError::WeakPassword(w)) => w,
            other => panic!("expected weak password, got {:?}", other),
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Rahasia123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Rahasia123", &hash));
        assert!(!verify_password("rahasia123", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("3174012345678901").unwrap();
        let b = hash_password("3174012345678901").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("3174012345678901", &a));
        assert!(verify_password("3174012345678901", &b));
    }

    #[test]
    fn test_verify_garbage_hash() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "plaintext"));
    }

    #[test]
    fn test_strong_password() {
        assert!(validate_password_strength("Abcdefg1").is_ok());
        assert!(validate_password_strength("Kas RT 05 aman").is_ok());
    }

    #[test]
    fn test_weak_passwords() {
        assert_eq!(weakness("Abcde1").0, vec![PasswordRule::MinLength]);
        assert_eq!(weakness("abcdefg1").0, vec![PasswordRule::Uppercase]);
        assert_eq!(weakness("ABCDEFG1").0, vec![PasswordRule::Lowercase]);
        assert_eq!(weakness("Abcdefgh").0, vec![PasswordRule::Digit]);

        let all = weakness("");
        assert!(all.violates(PasswordRule::MinLength));
        assert!(all.violates(PasswordRule::Uppercase));
        assert!(all.violates(PasswordRule::Lowercase));
        assert!(all.violates(PasswordRule::Digit));
    }

    #[test]
    fn test_length_counts_characters() {
        // 7 characters, more than 8 bytes
        assert!(weakness("Äbcdéf1").violates(PasswordRule::MinLength));
    }

    #[test]
    fn test_weakness_message() {
        assert_eq!(
            weakness("abc").to_string(),
            "needs at least 8 characters, an uppercase letter, a digit"
        );
    }
}
