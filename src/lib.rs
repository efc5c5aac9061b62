//! Zadanko is a small HTTP service for managing user accounts.
//!
//! Users are registered by an operator from the command line, log in with
//! their email and password, and can change their password over a JSON API.
//! Passwords are only ever stored as salted bcrypt hashes in a SQLite
//! database.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod app_state;
mod change_password;
mod credential_store;
mod db;
mod endpoints;
mod json;
mod list_users;
mod log_in;
mod logging;
mod password;
mod register_user;
mod routing;
mod user;

pub use app_state::AppState;
pub use credential_store::CredentialStore;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{Password, PasswordHash};
pub use register_user::{AddUserError, USER_ADDED_MSG, add_user};
pub use routing::{MAX_REQUEST_BODY_BYTES, build_router};
pub use user::{User, UserID, UserSummary};

use crate::json::render_error;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email used to register a user is already in use.
    #[error("the email is already in use")]
    DuplicateEmail,

    /// There was no user in the database that matched the given details.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested user could not be found")]
    NotFound,

    /// The password did not match the stored password hash.
    #[error("invalid password")]
    InvalidCredentials,

    /// An unexpected error occurred with the underlying hashing library, or
    /// the password could not be hashed (e.g., it is longer than 72 bytes).
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The request body could not be parsed as the expected JSON object.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::MalformedRequest(rejection.body_text())
    }
}

/// The message sent to clients when a password could not be hashed.
pub(crate) const HASHING_FAILED_MSG: &str = "Error while hashing the password";
/// The message sent to clients for errors they cannot fix themselves.
const INTERNAL_ERROR_MSG: &str = "An unexpected error occurred";

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::MalformedRequest(reason) => render_error(StatusCode::BAD_REQUEST, &reason),
            Error::DuplicateEmail => {
                render_error(StatusCode::BAD_REQUEST, "Email is already in use")
            }
            Error::NotFound => render_error(StatusCode::BAD_REQUEST, "User not found"),
            Error::InvalidCredentials => {
                render_error(StatusCode::BAD_REQUEST, "Invalid email or password")
            }
            Error::HashingError(error) => {
                tracing::error!("an error occurred while hashing a password: {error}");
                render_error(StatusCode::INTERNAL_SERVER_ERROR, HASHING_FAILED_MSG)
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MSG)
            }
        }
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;

    use crate::{Error, json::ErrorBody};

    async fn into_status_and_body(error: Error) -> (StatusCode, ErrorBody) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn client_errors_map_to_bad_request() {
        for error in [
            Error::DuplicateEmail,
            Error::NotFound,
            Error::InvalidCredentials,
            Error::MalformedRequest("missing field `email`".to_owned()),
        ] {
            let (status, _) = into_status_and_body(error).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn server_errors_map_to_internal_server_error_without_details() {
        for error in [
            Error::HashingError("secret detail".to_owned()),
            Error::DatabaseLockError,
            Error::SqlError(rusqlite::Error::InvalidQuery),
        ] {
            let (status, body) = into_status_and_body(error).await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(!body.error.contains("secret detail"), "got {}", body.error);
        }
    }

    #[test]
    fn unique_email_violation_maps_to_duplicate_email() {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute("CREATE TABLE user (email TEXT UNIQUE NOT NULL)", ())
            .unwrap();
        connection
            .execute("INSERT INTO user (email) VALUES ('a@x.com')", ())
            .unwrap();

        let error: Error = connection
            .execute("INSERT INTO user (email) VALUES ('a@x.com')", ())
            .unwrap_err()
            .into();

        assert_eq!(error, Error::DuplicateEmail);
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }
}
