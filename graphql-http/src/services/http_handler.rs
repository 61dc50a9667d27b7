//! Translates HTTP requests into [`WebGraphQlRequest`]s and their outcome back into HTTP
//! responses.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Context as TaskContext;
use std::task::Poll;

use axum::response::IntoResponse;
use bytes::Bytes;
use futures::FutureExt;
use futures::future::BoxFuture;
use http::HeaderMap;
use http::HeaderValue;
use http::header::CONTENT_TYPE;
use tower::BoxError;
use tower::Service;
use tower::ServiceExt;

use super::body;
use super::body::Body;
use super::layers::content_negotiation::content_type_is_json;
use super::layers::content_negotiation::is_legacy_graphql_content_type;
use super::layers::content_negotiation::select_response_media_type;
use super::web_graphql::IdGenerator;
use super::web_graphql::Locale;
use super::web_graphql::UuidIdGenerator;
use super::web_graphql::WebGraphQlHandler;
use super::web_graphql::WebGraphQlRequest;
use super::web_graphql::WebGraphQlResponse;
use super::web_graphql::cookies_from_headers;
use crate::Configuration;
use crate::Context;
use crate::error::HandlerError;
use crate::graphql;

/// Serves GraphQL requests received over HTTP with a [`WebGraphQlHandler`].
///
/// The handler keeps no state between requests: cloning it is cheap and clones can serve
/// requests concurrently.
#[derive(Clone)]
pub struct GraphQlHttpHandler {
    web_graphql_handler: WebGraphQlHandler,
    configuration: Arc<Configuration>,
    id_generator: Arc<dyn IdGenerator>,
}

impl GraphQlHttpHandler {
    /// Create a handler with the default configuration.
    pub fn new<S>(web_graphql_handler: S) -> Self
    where
        S: Service<WebGraphQlRequest, Response = WebGraphQlResponse, Error = BoxError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        Self::with_configuration(web_graphql_handler, Configuration::default())
    }

    pub fn with_configuration<S>(web_graphql_handler: S, configuration: Configuration) -> Self
    where
        S: Service<WebGraphQlRequest, Response = WebGraphQlResponse, Error = BoxError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        Self {
            web_graphql_handler: WebGraphQlHandler::new(web_graphql_handler),
            configuration: Arc::new(configuration),
            id_generator: Arc::new(UuidIdGenerator),
        }
    }

    /// Replace how request ids are generated.
    pub fn with_id_generator(mut self, id_generator: impl IdGenerator) -> Self {
        self.id_generator = Arc::new(id_generator);
        self
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Handle a GraphQL request received over HTTP.
    ///
    /// The [`WebGraphQlHandler`] is polled once. If it has already completed, its response is
    /// returned as [`ServerResponse::Ready`], and its failure as [`HandlerError::Execution`].
    /// Otherwise the response is [`ServerResponse::Deferred`] and must be awaited.
    pub async fn handle_request(
        &self,
        request: http::Request<Body>,
    ) -> Result<ServerResponse, HandlerError> {
        let (mut parts, body) = request.into_parts();

        let cookies = cookies_from_headers(&parts.headers);
        let attributes = parts.extensions.remove::<Context>().unwrap_or_default();

        // a body that cannot be decoded is never read
        if !content_type_is_json(&parts.headers) && !is_legacy_graphql_content_type(&parts.headers)
        {
            return Err(unsupported_media_type(&parts.headers));
        }
        let bytes =
            body::into_bytes_limited(body, self.configuration.limits.max_request_body_bytes)
                .await
                .map_err(|source| HandlerError::InputStream { source })?;
        let graphql_request = read_graphql_request(&parts.headers, &bytes)?;

        let content_type = select_response_media_type(&parts.headers);
        tracing::trace!(?content_type, "negotiated response content type");
        let locale = Locale::from_headers(&parts.headers, &self.configuration.default_locale);

        let request = WebGraphQlRequest::builder()
            .uri(parts.uri)
            .headers(parts.headers)
            .cookies(cookies)
            .attributes(attributes)
            .body(graphql_request)
            .id(self.id_generator.generate_id())
            .locale(locale)
            .build();
        tracing::debug!("Executing: {request}");

        let mut response = self
            .web_graphql_handler
            .clone()
            .oneshot(request)
            .map(move |result| match result {
                Ok(response) => to_http_response(response, content_type),
                Err(err) => Err(HandlerError::Execution(err)),
            })
            .boxed();

        match (&mut response).now_or_never() {
            Some(Ok(response)) => Ok(ServerResponse::Ready(response)),
            Some(Err(err)) => Err(err),
            None => Ok(ServerResponse::Deferred(DeferredResponse { inner: response })),
        }
    }
}

/// Decode the GraphQL request, accepting `application/graphql` bodies that are JSON.
fn read_graphql_request(
    headers: &HeaderMap,
    bytes: &Bytes,
) -> Result<graphql::Request, HandlerError> {
    decode_json_body(headers, bytes).or_else(|err| match err {
        HandlerError::UnsupportedMediaType { .. } => {
            apply_application_graphql_fallback(headers, bytes, err)
        }
        err => Err(err),
    })
}

fn decode_json_body(headers: &HeaderMap, bytes: &Bytes) -> Result<graphql::Request, HandlerError> {
    if !content_type_is_json(headers) {
        return Err(unsupported_media_type(headers));
    }

    graphql::Request::deserialize_from_bytes(bytes).map_err(|err| HandlerError::MalformedBody {
        reason: err.to_string(),
    })
}

fn unsupported_media_type(headers: &HeaderMap) -> HandlerError {
    HandlerError::UnsupportedMediaType {
        content_type: headers
            .get(CONTENT_TYPE)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned()),
    }
}

/// Decodes the body as JSON once more if it was sent as `application/graphql`.
///
/// Whatever the retry fails with, `original` is what the caller gets.
fn apply_application_graphql_fallback(
    headers: &HeaderMap,
    bytes: &Bytes,
    original: HandlerError,
) -> Result<graphql::Request, HandlerError> {
    if !is_legacy_graphql_content_type(headers) {
        return Err(original);
    }

    match graphql::Request::deserialize_from_bytes(bytes) {
        Ok(request) => {
            tracing::debug!("decoded an application/graphql request body as JSON");
            Ok(request)
        }
        Err(err) => {
            tracing::debug!(error = %err, "application/graphql request body is not JSON");
            Err(original)
        }
    }
}

fn to_http_response(
    response: WebGraphQlResponse,
    content_type: HeaderValue,
) -> Result<http::Response<Body>, HandlerError> {
    let (graphql_response, headers) = response.into_parts();
    let body = graphql_response
        .to_map()
        .and_then(|map| serde_json::to_vec(&map))
        .map_err(|err| HandlerError::Execution(err.into()))?;

    let mut http_response = http::Response::new(body::from_bytes(body));
    http_response.headers_mut().extend(headers);
    http_response.headers_mut().insert(CONTENT_TYPE, content_type);
    tracing::debug!("Execution complete");

    Ok(http_response)
}

/// The outcome of [`GraphQlHttpHandler::handle_request`].
#[derive(Debug)]
pub enum ServerResponse {
    /// The GraphQL request was handled while the HTTP request was being translated.
    Ready(http::Response<Body>),
    /// The GraphQL request is still being handled.
    Deferred(DeferredResponse),
}

impl ServerResponse {
    pub fn is_ready(&self) -> bool {
        matches!(self, ServerResponse::Ready(_))
    }

    /// Wait for the HTTP response.
    pub async fn into_http_response(self) -> Result<http::Response<Body>, HandlerError> {
        match self {
            ServerResponse::Ready(response) => Ok(response),
            ServerResponse::Deferred(deferred) => deferred.await,
        }
    }
}

/// An HTTP response that completes once the [`WebGraphQlHandler`] does.
pub struct DeferredResponse {
    inner: BoxFuture<'static, Result<http::Response<Body>, HandlerError>>,
}

impl Future for DeferredResponse {
    type Output = Result<http::Response<Body>, HandlerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl fmt::Debug for DeferredResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredResponse").finish_non_exhaustive()
    }
}

impl Service<http::Request<Body>> for GraphQlHttpHandler {
    type Response = http::Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: http::Request<Body>) -> Self::Future {
        let handler = self.clone();
        async move {
            let response = match handler.handle_request(request).await {
                Ok(response) => response.into_http_response().await,
                Err(err) => Err(err),
            };
            Ok(response.unwrap_or_else(IntoResponse::into_response))
        }
        .boxed()
    }
}
