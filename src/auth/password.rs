// Password hashing and strength checks

use bcrypt::{hash, verify, DEFAULT_COST};
use rand::distr::{Alphanumeric, SampleString};
use rand::RngCore;
use serde::Serialize;

use super::{AuthError, AuthResult};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Checks that must pass, out of five, for a password to be accepted.
pub const MEDIUM_PASSWORD_SCORE: u8 = 3;
pub const STRONG_PASSWORD_SCORE: u8 = 5;

const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Hash a password with bcrypt on the blocking thread pool.
pub async fn hash_password(password: &str, cost: Option<u32>) -> AuthResult<String> {
    let password = password.to_string();
    let cost = cost.unwrap_or(DEFAULT_COST);

    tokio::task::spawn_blocking(move || hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string())))
        .await
        .map_err(|e| AuthError::Hashing(format!("Task join error: {}", e)))?
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub async fn verify_password(password: &str, hashed: &str) -> AuthResult<bool> {
    let password = password.to_string();
    let hashed = hashed.to_string();

    tokio::task::spawn_blocking(move || verify(password, &hashed).map_err(|e| AuthError::Hashing(e.to_string())))
        .await
        .map_err(|e| AuthError::Hashing(format!("Task join error: {}", e)))?
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    Medium,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChecks {
    pub min_length: bool,
    pub has_upper_case: bool,
    pub has_lower_case: bool,
    pub has_numbers: bool,
    pub has_special_char: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PasswordStrength {
    pub valid: bool,
    pub strength: Strength,
    pub checks: PasswordChecks,
    pub score: u8,
}

/// Score a password against five checks. It is valid when long enough and at
/// least three checks pass.
pub fn validate_password_strength(password: &str) -> PasswordStrength {
    let checks = PasswordChecks {
        min_length: password.chars().count() >= MIN_PASSWORD_LENGTH,
        has_upper_case: password.chars().any(|c| c.is_ascii_uppercase()),
        has_lower_case: password.chars().any(|c| c.is_ascii_lowercase()),
        has_numbers: password.chars().any(|c| c.is_ascii_digit()),
        has_special_char: password.chars().any(|c| SPECIAL_CHARS.contains(c)),
    };

    let score = [
        checks.min_length,
        checks.has_upper_case,
        checks.has_lower_case,
        checks.has_numbers,
        checks.has_special_char,
    ]
    .into_iter()
    .filter(|passed| *passed)
    .count() as u8;

    let strength = if score == STRONG_PASSWORD_SCORE {
        Strength::Strong
    } else if score >= MEDIUM_PASSWORD_SCORE {
        Strength::Medium
    } else {
        Strength::Weak
    };

    PasswordStrength {
        valid: checks.min_length && score >= MEDIUM_PASSWORD_SCORE,
        strength,
        checks,
        score,
    }
}

pub fn generate_random_password(length: usize) -> String {
    Alphanumeric.sample_string(&mut rand::rng(), length)
}

/// Hex-encoded random token of `bytes` random bytes.
pub fn generate_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify_password() {
        let hashed = hash_password("Str0ng!Pass", Some(4)).await.expect("Failed to hash");
        assert!(hashed.starts_with("$2b$"));
        assert!(verify_password("Str0ng!Pass", &hashed).await.unwrap());
        assert!(!verify_password("wrong", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn test_unreadable_hash_is_an_error() {
        assert!(verify_password("x", "not-a-bcrypt-hash").await.is_err());
    }

    #[test]
    fn scores_all_five_checks() {
        let result = validate_password_strength("Str0ng!Pass");
        assert_eq!(result.score, 5);
        assert_eq!(result.strength, Strength::Strong);
        assert!(result.valid);
    }

    #[test]
    fn medium_passwords_are_valid() {
        let result = validate_password_strength("lowercase12");
        assert_eq!(result.score, 3);
        assert_eq!(result.strength, Strength::Medium);
        assert!(result.valid);
    }

    #[test]
    fn short_passwords_are_invalid_even_with_variety() {
        let result = validate_password_strength("Ab1!");
        assert_eq!(result.score, 4);
        assert!(!result.checks.min_length);
        assert!(!result.valid);
    }

    #[test]
    fn long_single_class_passwords_are_weak() {
        let result = validate_password_strength("aaaaaaaaaaaa");
        assert_eq!(result.strength, Strength::Weak);
        assert!(!result.valid);
    }

    #[test]
    fn random_values_have_requested_shape() {
        let password = generate_random_password(16);
        assert_eq!(password.len(), 16);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));

        let token = generate_token(32);
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(generate_token(32), token);
    }
}
