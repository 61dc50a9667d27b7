//! Handler errors.
use axum::response::IntoResponse;
use http::StatusCode;
use http::header::CONTENT_TYPE;
use thiserror::Error;
use tower::BoxError;

use crate::graphql;
use crate::services::APPLICATION_JSON_HEADER_VALUE;

/// Errors raised while handling a GraphQL request over HTTP.
///
/// Input errors are the client's fault and are rendered with a `4xx` status. Execution errors
/// wrap whatever the [`crate::WebGraphQlHandler`] failed with.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HandlerError {
    /// The request body could not be read.
    #[error("I/O error while reading request body")]
    InputStream {
        /// The underlying read failure.
        #[source]
        source: BoxError,
    },

    /// The request body is not JSON.
    ///
    /// The `application/graphql` content type is accepted as a fallback when the body is JSON.
    #[error(
        "content type '{}' not supported, expected 'application/json'",
        .content_type.as_deref().unwrap_or("<none>")
    )]
    UnsupportedMediaType {
        /// The `Content-Type` the client sent, if any.
        content_type: Option<String>,
    },

    /// The request body is JSON but not a GraphQL request.
    #[error("failed to deserialize the request body into JSON: {reason}")]
    MalformedBody {
        /// The reason deserialization failed.
        reason: String,
    },

    /// The GraphQL handler failed.
    #[error("request handling failed: {0}")]
    Execution(#[source] BoxError),
}

impl HandlerError {
    /// The HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            HandlerError::InputStream { .. } | HandlerError::MalformedBody { .. } => {
                StatusCode::BAD_REQUEST
            }
            HandlerError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            HandlerError::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `extensions.code` of the GraphQL error this is rendered as.
    pub fn extension_code(&self) -> &'static str {
        match self {
            HandlerError::InputStream { .. } => "INPUT_STREAM_ERROR",
            HandlerError::UnsupportedMediaType { .. } => "INVALID_CONTENT_TYPE_HEADER",
            HandlerError::MalformedBody { .. } => "INVALID_GRAPHQL_REQUEST",
            HandlerError::Execution(_) => "REQUEST_HANDLING_FAILED",
        }
    }

    /// Convert the handler error to a GraphQL error.
    pub fn to_graphql_error(&self) -> graphql::Error {
        graphql::Error::builder()
            .message(self.to_string())
            .extension_code(self.extension_code())
            .build()
    }

    /// Whether the error is the client's fault.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> axum::response::Response {
        if self.is_client_error() {
            tracing::debug!(error = %self, "rejecting GraphQL request");
        } else {
            tracing::error!(error = %self, "GraphQL request handling failed");
        }

        let body = serde_json::json!({ "errors": [self.to_graphql_error()] });
        (
            self.status_code(),
            [(CONTENT_TYPE, APPLICATION_JSON_HEADER_VALUE.clone())],
            body.to_string(),
        )
            .into_response()
    }
}
