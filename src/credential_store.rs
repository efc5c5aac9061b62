//! The credential store: registration, verification and password changes for users.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::{
    Error, Password, PasswordHash,
    db::initialize,
    user::{
        User, UserID, UserSummary, create_user, get_user_by_email, get_user_by_id, list_users,
        replace_password_hash,
    },
};

/// Persists users and checks their passwords.
///
/// Clones share the same database connection.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    connection: Arc<Mutex<Connection>>,
    hash_cost: u32,
    /// Checked when an email is not registered, so that unknown emails take
    /// as long to reject as wrong passwords.
    decoy_hash: PasswordHash,
}

const DECOY_PASSWORD: &str = "decoy password for unknown emails";

impl CredentialStore {
    /// Create a store over an already initialized database.
    ///
    /// `hash_cost` is the bcrypt cost used for new password hashes, see
    /// [PasswordHash::new].
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if `hash_cost` is not a valid bcrypt cost.
    pub fn new(connection: Arc<Mutex<Connection>>, hash_cost: u32) -> Result<Self, Error> {
        let decoy_hash = PasswordHash::new(&Password::new(DECOY_PASSWORD), hash_cost)?;

        Ok(Self {
            connection,
            hash_cost,
            decoy_hash,
        })
    }

    /// Initialize the database schema on `connection` and wrap it in a store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized or `hash_cost`
    /// is not a valid bcrypt cost.
    pub fn open(connection: Connection, hash_cost: u32) -> Result<Self, Error> {
        initialize(&connection)?;

        Self::new(Arc::new(Mutex::new(connection)), hash_cost)
    }

    /// Hash `password` and save a new user registered with `email`.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [Error::DuplicateEmail] if `email` is already registered,
    /// - [Error::HashingError] if the password could not be hashed,
    /// - [Error::SqlError] if there was an unexpected SQL error.
    pub fn register(&self, email: &str, password: &Password) -> Result<User, Error> {
        let password_hash = PasswordHash::new(password, self.hash_cost)?;

        let user = create_user(email, password_hash, &*self.lock()?)?;
        tracing::info!("Registered user {}", user.id);

        Ok(user)
    }

    /// Get the user registered with `email` if `password` matches their
    /// stored password.
    ///
    /// An unregistered email still costs one password comparison.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [Error::NotFound] if `email` is not registered,
    /// - [Error::InvalidCredentials] if the password does not match,
    /// - [Error::HashingError] if the stored hash could not be read,
    /// - [Error::SqlError] if there was an unexpected SQL error.
    pub fn verify(&self, email: &str, password: &Password) -> Result<User, Error> {
        let lookup = get_user_by_email(email, &*self.lock()?);

        let user = match lookup {
            Ok(user) => user,
            Err(Error::NotFound) => {
                self.decoy_hash.verify(password)?;
                return Err(Error::NotFound);
            }
            Err(error) => return Err(error),
        };

        if user.password_hash.verify(password)? {
            Ok(user)
        } else {
            Err(Error::InvalidCredentials)
        }
    }

    /// Replace the password of `user_id` with `new_password` if
    /// `current_password` matches the stored password.
    ///
    /// The stored hash is only overwritten if it has not changed since it was
    /// checked against `current_password`. If another request changed the
    /// password first, this call fails with [Error::InvalidCredentials].
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [Error::NotFound] if there is no user with `user_id`,
    /// - [Error::InvalidCredentials] if `current_password` does not match,
    /// - [Error::HashingError] if `new_password` could not be hashed,
    /// - [Error::SqlError] if there was an unexpected SQL error.
    pub fn change_password(
        &self,
        user_id: UserID,
        current_password: &Password,
        new_password: &Password,
    ) -> Result<(), Error> {
        let user = get_user_by_id(user_id, &*self.lock()?)?;

        if !user.password_hash.verify(current_password)? {
            return Err(Error::InvalidCredentials);
        }

        let new_hash = PasswordHash::new(new_password, self.hash_cost)?;

        if !replace_password_hash(user.id, &user.password_hash, &new_hash, &*self.lock()?)? {
            tracing::warn!(
                "Password for user {user_id} changed while a password change was in progress"
            );
            return Err(Error::InvalidCredentials);
        }

        tracing::info!("Changed password for user {user_id}");

        Ok(())
    }

    /// Get the ID and email of every registered user.
    ///
    /// # Errors
    ///
    /// Returns a [Error::SqlError] if there was an unexpected SQL error.
    pub fn list(&self) -> Result<Vec<UserSummary>, Error> {
        list_users(&*self.lock()?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|error| {
            tracing::error!("Could not acquire the database lock: {error}");
            Error::DatabaseLockError
        })
    }
}
