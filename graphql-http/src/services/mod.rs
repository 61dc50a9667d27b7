//! Implementation of the steps that turn an HTTP request into a GraphQL request and back.

use http::HeaderValue;

pub use self::http_handler::DeferredResponse;
pub use self::http_handler::GraphQlHttpHandler;
pub use self::http_handler::ServerResponse;
pub use self::layers::content_negotiation::is_legacy_graphql_content_type;
pub use self::layers::content_negotiation::select_response_media_type;

pub mod body;
mod http_handler;
pub(crate) mod layers;
pub mod web_graphql;

pub(crate) const APPLICATION_JSON: &str = "application/json";
pub(crate) const GRAPHQL_JSON_RESPONSE: &str = "application/graphql-response+json";
/// Not compliant with the GraphQL over HTTP specification, but still sent by some clients.
pub(crate) const APPLICATION_GRAPHQL: &str = "application/graphql";

pub(crate) static APPLICATION_JSON_HEADER_VALUE: HeaderValue =
    HeaderValue::from_static(APPLICATION_JSON);
pub(crate) static GRAPHQL_JSON_RESPONSE_HEADER_VALUE: HeaderValue =
    HeaderValue::from_static(GRAPHQL_JSON_RESPONSE);
pub(crate) static APPLICATION_GRAPHQL_HEADER_VALUE: HeaderValue =
    HeaderValue::from_static(APPLICATION_GRAPHQL);
