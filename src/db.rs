//! Database schema setup.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{Error, user::create_user_table};

/// Create the tables for the domain models.
///
/// Safe to call on a database that has already been initialized, existing
/// rows are left untouched. Should be called once before the server starts
/// accepting requests.
///
/// # Errors
///
/// Returns an error if the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        PasswordHash,
        user::{create_user, list_users},
    };

    use super::initialize;

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        create_user(
            "foo@bar.baz",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();

        initialize(&connection).expect("second initialization should succeed");

        let users = list_users(&connection).unwrap();
        assert_eq!(users.len(), 1, "want 1 user after re-initializing, got {users:?}");
    }
}
