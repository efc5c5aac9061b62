//! The route for changing a user's password.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    CredentialStore, Error, HASHING_FAILED_MSG, Password, UserID,
    json::{JsonBody, render_error, render_message},
};

/// The message sent when the password was changed.
pub const PASSWORD_CHANGED_MSG: &str = "Password changed successfully";
/// The message sent when the user ID does not belong to a registered user.
pub const USER_NOT_FOUND_MSG: &str = "User not found";
/// The message sent when the current password is wrong.
pub const CURRENT_PASSWORD_MISMATCH_MSG: &str = "Current password does not match";

/// The body of a change password request.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordData {
    /// The password the user currently logs in with.
    pub current_password: Password,
    /// The password to replace it with.
    pub new_password: Password,
}

/// Handler for changing the password of the user with the ID in the path.
///
/// An ID that is not an integer is treated the same as an unknown ID.
pub async fn put_change_password(
    State(store): State<CredentialStore>,
    Path(raw_user_id): Path<String>,
    JsonBody(data): JsonBody<ChangePasswordData>,
) -> Response {
    let Ok(user_id) = raw_user_id.parse().map(UserID::new) else {
        return render_error(StatusCode::BAD_REQUEST, USER_NOT_FOUND_MSG);
    };

    match store.change_password(user_id, &data.current_password, &data.new_password) {
        Ok(()) => render_message(StatusCode::OK, PASSWORD_CHANGED_MSG),
        Err(Error::NotFound) => render_error(StatusCode::BAD_REQUEST, USER_NOT_FOUND_MSG),
        Err(Error::InvalidCredentials) => {
            render_error(StatusCode::BAD_REQUEST, CURRENT_PASSWORD_MISMATCH_MSG)
        }
        Err(Error::HashingError(error)) => {
            tracing::error!("Could not hash new password for user {user_id}: {error}");
            render_error(StatusCode::INTERNAL_SERVER_ERROR, HASHING_FAILED_MSG)
        }
        Err(error) => error.into_response(),
    }
}
