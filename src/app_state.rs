//! Implements a struct that holds the state of the REST server.

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{CredentialStore, Error};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The store for registering users and checking their passwords.
    pub credential_store: CredentialStore,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `hash_cost` is the bcrypt cost used when hashing new passwords.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, hash_cost: u32) -> Result<Self, Error> {
        Ok(Self {
            credential_store: CredentialStore::open(db_connection, hash_cost)?,
        })
    }
}

impl FromRef<AppState> for CredentialStore {
    fn from_ref(state: &AppState) -> Self {
        state.credential_store.clone()
    }
}
