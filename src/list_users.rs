//! The route for listing registered users.

use axum::{extract::State, http::StatusCode, response::Response};
use serde::{Deserialize, Serialize};

use crate::{
    CredentialStore, UserSummary,
    json::{render, render_error},
};

/// The message sent when the users could not be read from the database.
pub const LIST_USERS_ERROR_MSG: &str = "Could not retrieve users";

/// The body of a successful response to a list users request.
#[derive(Debug, Serialize, Deserialize)]
pub struct UsersBody {
    /// Every registered user, without their password hash.
    pub users: Vec<UserSummary>,
}

/// Handler for listing the ID and email of every registered user.
pub async fn get_users(State(store): State<CredentialStore>) -> Response {
    match store.list() {
        Ok(users) => render(StatusCode::OK, UsersBody { users }),
        Err(error) => {
            tracing::error!("Could not list users: {error}");
            render_error(StatusCode::BAD_REQUEST, LIST_USERS_ERROR_MSG)
        }
    }
}
