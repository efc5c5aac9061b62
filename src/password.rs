//! This file defines the types that carry passwords through the application.
//! `Password` wraps a plaintext password and keeps it out of logs.
//! `PasswordHash` is the salted and hashed form that is stored in the database.

use std::fmt::Debug;

use serde::Deserialize;

use crate::Error;

/// A plaintext password as supplied by a client or an operator.
///
/// The `Debug` implementation never prints the password, so request types
/// holding a `Password` can derive `Debug` safely.
#[derive(Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

/// bcrypt only reads this many bytes of a password.
pub const MAX_PASSWORD_BYTES: usize = 72;

impl Password {
    /// Wrap a plaintext password.
    pub fn new(raw_password: impl Into<String>) -> Self {
        Self(raw_password.into())
    }

    /// The plaintext password.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_too_long(&self) -> bool {
        self.0.len() > MAX_PASSWORD_BYTES
    }
}

impl Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Password({})", str::repeat("*", 8))
    }
}

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// An alias for the default encryption cost for hashing passwords.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with the specified `cost`.
    ///
    /// `cost` increases the rounds of hashing and therefore the time needed to verify a password.
    /// A value of at least 12 is recommended. Pass in [PasswordHash::DEFAULT_COST] to use the recommended cost.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if `cost` is outside of the range bcrypt
    /// accepts (4 to 31) or if the password is longer than
    /// [MAX_PASSWORD_BYTES]. Long passwords are rejected instead of being
    /// silently truncated.
    pub fn new(password: &Password, cost: u32) -> Result<Self, Error> {
        if password.is_too_long() {
            return Err(Error::HashingError(format!(
                "expected {MAX_PASSWORD_BYTES} bytes or fewer, found {} bytes",
                password.as_str().len()
            )));
        }

        bcrypt::hash(password.as_str(), cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Create a new `PasswordHash` without any validation.
    ///
    /// The caller should ensure that `raw_password_hash` is a valid password hash.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if an invalid hash is provided it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_string())
    }

    /// Check that `password` matches the stored password.
    ///
    /// A password that is too long to have been hashed never matches.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if the stored hash cannot be parsed.
    pub fn verify(&self, password: &Password) -> Result<bool, Error> {
        if password.is_too_long() {
            return Ok(false);
        }

        bcrypt::verify(password.as_str(), &self.0)
            .map_err(|error| Error::HashingError(error.to_string()))
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}


#[cfg(test)]
mod password_hash_tests {
    use crate::Error;

    use super::{Password, PasswordHash};

    #[test]
    fn verify_password_succeeds_for_valid_password() {
        let hash = PasswordHash::new_unchecked(
            "$2b$12$Gwf0uvxH3L7JLfo0CC/NCOoijK2vQ/wbgP.LeNup8vj6gg31IiFkm",
        );

        assert!(hash.verify(&Password::new("okon")).unwrap());
    }

    #[test]
    fn verify_password_fails_for_invalid_password() {
        let hash = PasswordHash::new_unchecked(
            "$2b$12$Gwf0uvxH3L7JLfo0CC/NCOoijK2vQ/wbgP.LeNup8vj6gg31IiFkm",
        );

        assert!(!hash.verify(&Password::new("thewrongpassword")).unwrap());
    }

    #[test]
    fn hash_password_produces_verifiable_hash() {
        let password = Password::new("roostersgocockledoodledoo");
        let hash = PasswordHash::new(&password, 4).unwrap();

        assert!(hash.verify(&password).unwrap());
        assert!(!hash.verify(&Password::new("the_wrong_password")).unwrap());
    }

    #[test]
    fn hash_is_never_the_plaintext() {
        let password = Password::new("p");
        let hash = PasswordHash::new(&password, 4).unwrap();

        assert_ne!(hash.as_ref(), "p");
        assert!(!hash.as_ref().is_empty());
    }

    #[test]
    fn hash_duplicate_password_produces_unique_hash() {
        let password = Password::new("turkeysgogobblegobble");
        let hash = PasswordHash::new(&password, 4).unwrap();
        let dupe_hash = PasswordHash::new(&password, 4).unwrap();

        assert_ne!(hash, dupe_hash);
    }

    #[test]
    fn hash_accepts_password_of_exactly_72_bytes() {
        let password = Password::new("a".repeat(72));

        let hash = PasswordHash::new(&password, 4).unwrap();

        assert!(hash.verify(&password).unwrap());
        assert!(!hash.verify(&Password::new("a".repeat(71))).unwrap());
    }

    #[test]
    fn hash_fails_on_password_longer_than_72_bytes() {
        let password = Password::new("a".repeat(73));

        let result = PasswordHash::new(&password, 4);

        assert!(matches!(result, Err(Error::HashingError(_))));
    }

    #[test]
    fn hash_fails_on_invalid_cost() {
        let result = PasswordHash::new(&Password::new("hunter2"), 3);

        assert!(matches!(result, Err(Error::HashingError(_))));
    }

    #[test]
    fn verify_rejects_long_password_sharing_prefix() {
        let stored = Password::new("a".repeat(72));
        let hash = PasswordHash::new(&stored, 4).unwrap();

        assert!(!hash.verify(&Password::new("a".repeat(80))).unwrap());
    }

    #[test]
    fn verify_fails_on_malformed_hash() {
        let hash = PasswordHash::new_unchecked("not a bcrypt hash");

        let result = hash.verify(&Password::new("hunter2"));

        assert!(matches!(result, Err(Error::HashingError(_))));
    }
}
