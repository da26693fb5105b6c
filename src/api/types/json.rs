//! JSON extractor whose rejections use the API error body

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
    Json as AxumJson,
};
use serde::{de::DeserializeOwned, Serialize};

use super::error::{ApiError, ApiErrorType};

/// Wrapper around `axum::Json` that reports malformed bodies as `ApiError`
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        AxumJson::<T>::from_request(req, state)
            .await
            .map(|AxumJson(value)| Json(value))
            .map_err(rejection_to_error)
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    let message = match &rejection {
        JsonRejection::JsonDataError(err) => format!("Invalid request body: {}", err.body_text()),
        JsonRejection::JsonSyntaxError(err) => format!("Malformed JSON: {}", err.body_text()),
        JsonRejection::MissingJsonContentType(_) => {
            "Expected 'Content-Type: application/json'".to_string()
        }
        other => other.body_text(),
    };

    ApiError::new(rejection.status(), ApiErrorType::InvalidRequestError, message)
        .with_code("invalid_body")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::post, Router};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Greeting {
        first_name: String,
    }

    fn app() -> Router {
        Router::new().route("/", post(|Json(g): Json<Greeting>| async move { Json(g) }))
    }

    async fn post_body(content_type: &str, body: &'static str) -> StatusCode {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", content_type)
            .body(Body::from(body))
            .unwrap();

        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_valid_body() {
        assert_eq!(
            post_body("application/json", r#"{"firstName":"Ada"}"#).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_rejections_use_client_error_status() {
        assert_eq!(
            post_body("application/json", r#"{"first_name":"Ada"}"#).await,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            post_body("application/json", "{not json").await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            post_body("text/plain", r#"{"firstName":"Ada"}"#).await,
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }
}
