//! Mounts a [`GraphQlHttpHandler`] on an axum [`Router`].

use axum::Extension;
use axum::Router;
use axum::extract::Request;
use axum::routing::post;
use tower_http::trace::TraceLayer;

use crate::GraphQlHttpHandler;
use crate::error::HandlerError;
use crate::services::body::Body;

/// A router serving GraphQL requests with `handler` on the configured path.
///
/// Only `POST` is routed. Deferred responses are awaited before being sent and handler errors
/// are rendered as GraphQL error responses.
pub fn graphql_route(handler: GraphQlHttpHandler) -> Router {
    let path = handler.configuration().graphql.path.clone();

    Router::new()
        .route(&path, post(handle_post))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(handler))
}

async fn handle_post(
    Extension(handler): Extension<GraphQlHttpHandler>,
    request: Request,
) -> Result<http::Response<Body>, HandlerError> {
    handler
        .handle_request(request)
        .await?
        .into_http_response()
        .await
}
