//! Registering users from the command line.
//!
//! Registration is an operator task and is not exposed over HTTP.

use crate::{CredentialStore, Error, Password, User};

/// The line printed after a user was registered.
pub const USER_ADDED_MSG: &str = "User added successfully";

/// Why the `add-user` command failed.
///
/// The messages are deliberately generic, the underlying cause is logged.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AddUserError {
    /// The password could not be hashed.
    #[error("Error while hashing the password")]
    Hashing,

    /// The user could not be saved, e.g. because the email is already registered.
    #[error("Error while adding the user to the database")]
    Storage,
}

/// Register a new user with `email` and `password`.
///
/// # Errors
///
/// Returns [AddUserError::Hashing] if the password could not be hashed and
/// [AddUserError::Storage] if the user could not be saved.
pub fn add_user(
    store: &CredentialStore,
    email: &str,
    password: &Password,
) -> Result<User, AddUserError> {
    store.register(email, password).map_err(|error| match error {
        Error::HashingError(error) => {
            tracing::error!("Could not hash the password for {email}: {error}");
            AddUserError::Hashing
        }
        Error::DuplicateEmail => {
            tracing::warn!("Could not add {email}: the email is already registered");
            AddUserError::Storage
        }
        error => {
            tracing::error!("Could not add {email}: {error}");
            AddUserError::Storage
        }
    })
}

#[cfg(test)]
mod add_user_tests {
    use crate::{Password, credential_store::test_utils::get_test_store};

    use super::{AddUserError, add_user};

    #[test]
    fn add_user_registers_user() {
        let store = get_test_store();

        let user = add_user(&store, "test@example.com", &Password::new("password")).unwrap();

        assert_eq!(user.email, "test@example.com");
        let users = store.list().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "test@example.com");
        assert!(
            store
                .verify("test@example.com", &Password::new("password"))
                .is_ok()
        );
    }

    #[test]
    fn add_user_fails_on_duplicate_email() {
        let store = get_test_store();
        add_user(&store, "test@example.com", &Password::new("password")).unwrap();

        let result = add_user(&store, "test@example.com", &Password::new("other"));

        assert_eq!(result, Err(AddUserError::Storage));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn add_user_accepts_password_of_exactly_72_bytes() {
        let store = get_test_store();
        let password = Password::new("a".repeat(72));

        add_user(&store, "test@example.com", &password).unwrap();

        assert!(store.verify("test@example.com", &password).is_ok());
    }

    #[test]
    fn add_user_fails_on_unhashable_password() {
        let store = get_test_store();

        let result = add_user(&store, "test@example.com", &Password::new("a".repeat(73)));

        assert_eq!(result, Err(AddUserError::Hashing));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn error_messages_are_generic() {
        assert_eq!(
            AddUserError::Hashing.to_string(),
            "Error while hashing the password"
        );
        assert_eq!(
            AddUserError::Storage.to_string(),
            "Error while adding the user to the database"
        );
    }
}
