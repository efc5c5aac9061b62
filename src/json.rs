//! JSON request extraction and response bodies shared by the route handlers.

use axum::{
    Json,
    extract::FromRequest,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Extracts a JSON request body like [axum::Json], but rejects bad bodies
/// with [Error::MalformedRequest] so clients always get a JSON error.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct JsonBody<T>(pub T);

/// The body of a successful response that only carries a message.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageBody {
    /// A human readable description of the result.
    pub message: String,
}

/// The body of an error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// A human readable description of what went wrong.
    pub error: String,
}

/// Serialize `body` as JSON and send it with `status_code`.
pub fn render<T: Serialize>(status_code: StatusCode, body: T) -> Response {
    (status_code, Json(body)).into_response()
}

/// Render a `{"message": ...}` response.
pub fn render_message(status_code: StatusCode, message: &str) -> Response {
    render(
        status_code,
        MessageBody {
            message: message.to_owned(),
        },
    )
}

/// Render an `{"error": ...}` response.
pub fn render_error(status_code: StatusCode, error: &str) -> Response {
    render(
        status_code,
        ErrorBody {
            error: error.to_owned(),
        },
    )
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, response::Response, routing::post};
    use axum_test::TestServer;
    use serde::Deserialize;

    use super::{ErrorBody, JsonBody, render_message};

    #[derive(Deserialize)]
    struct Greeting {
        name: String,
    }

    async fn greet(JsonBody(greeting): JsonBody<Greeting>) -> Response {
        render_message(StatusCode::OK, &format!("hello {}", greeting.name))
    }

    fn get_test_server() -> TestServer {
        let app = Router::new().route("/greet", post(greet));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn valid_body_is_extracted() {
        let server = get_test_server();

        let response = server
            .post("/greet")
            .json(&serde_json::json!({ "name": "world" }))
            .await;

        response.assert_status_ok();
        assert!(response.text().contains("hello world"));
    }

    #[tokio::test]
    async fn invalid_json_is_rejected_with_json_error() {
        let server = get_test_server();

        let response = server
            .post("/greet")
            .text("{\"name\": ")
            .content_type("application/json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorBody = response.json();
        assert!(!body.error.is_empty());
    }

    #[tokio::test]
    async fn missing_field_is_rejected_with_json_error() {
        let server = get_test_server();

        let response = server
            .post("/greet")
            .json(&serde_json::json!({ "nom": "world" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorBody = response.json();
        assert!(body.error.contains("name"), "got {}", body.error);
    }

    #[tokio::test]
    async fn missing_content_type_is_rejected_with_json_error() {
        let server = get_test_server();

        let response = server.post("/greet").text("{\"name\": \"world\"}").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let _: ErrorBody = response.json();
    }
}
