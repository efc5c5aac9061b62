//! The API endpoints URIs.

/// The route for logging in a user.
pub const LOG_IN: &str = "/login";
/// The route for listing users.
pub const USERS: &str = "/users";
/// The route for changing a user's password.
pub const CHANGE_PASSWORD: &str = "/change-password/{user_id}";

/// Replace the `{user_id}` parameter in `endpoint_path` with `user_id`.
///
/// Returns `endpoint_path` unchanged if it has no `{user_id}` parameter.
#[cfg(test)]
pub fn format_user_endpoint(endpoint_path: &str, user_id: crate::UserID) -> String {
    endpoint_path.replace("{user_id}", &user_id.to_string())
}
