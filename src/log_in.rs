//! This file defines the route for handling log-in requests.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    CredentialStore, Error, Password,
    json::{JsonBody, render_error, render_message},
};

/// The message sent when the email and password match a registered user.
pub const LOGGED_IN_MSG: &str = "Logged in successfully";
/// The message sent when the email is unknown or the password is wrong.
///
/// The two cases share one message so that clients cannot find out which
/// emails are registered.
pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Invalid email or password";

/// The credentials sent in a log-in request.
///
/// The email and password are not validated here since they are compared
/// against the registered users.
#[derive(Debug, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    pub email: String,
    /// Password entered during log-in.
    pub password: Password,
}

/// Handler for log-in requests via the POST method.
///
/// Responds with 200 OK if the email and password belong to a registered
/// user, otherwise 400 Bad Request with a message that does not reveal
/// whether the email or the password was wrong.
pub async fn post_log_in(
    State(store): State<CredentialStore>,
    JsonBody(log_in_data): JsonBody<LogInData>,
) -> Response {
    match store.verify(&log_in_data.email, &log_in_data.password) {
        Ok(user) => {
            tracing::info!("User {} logged in", user.id);
            render_message(StatusCode::OK, LOGGED_IN_MSG)
        }
        Err(Error::NotFound | Error::InvalidCredentials) => {
            render_error(StatusCode::BAD_REQUEST, INVALID_CREDENTIALS_ERROR_MSG)
        }
        Err(error) => error.into_response(),
    }
}
