//! HTTP content negotiation using the Accept and Content-Type headers.
//!
//! Request bodies must be JSON. `application/graphql` is tolerated as a request content type
//! for older clients, as long as the body itself is JSON.

use http::HeaderMap;
use http::HeaderValue;
use http::header::ACCEPT;
use http::header::CONTENT_TYPE;
use mediatype::MediaType;
use mediatype::MediaTypeList;
use mediatype::ReadParams;
use mediatype::names::APPLICATION;
use mediatype::names::JSON;

use crate::services::APPLICATION_GRAPHQL_HEADER_VALUE;
use crate::services::APPLICATION_JSON_HEADER_VALUE;
use crate::services::GRAPHQL_JSON_RESPONSE_HEADER_VALUE;

const GRAPHQL: &str = "graphql";
const GRAPHQL_RESPONSE: &str = "graphql-response";

/// Content types a GraphQL response can be sent with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ResponseContentType {
    ApplicationGraphqlResponseJson,
    ApplicationJson,
    ApplicationGraphql,
}

/// Supported response content types. The client's `Accept` order decides between them.
pub(crate) const SUPPORTED_MEDIA_TYPES: [ResponseContentType; 3] = [
    ResponseContentType::ApplicationGraphqlResponseJson,
    ResponseContentType::ApplicationJson,
    ResponseContentType::ApplicationGraphql,
];

impl ResponseContentType {
    pub(crate) fn header_value(self) -> HeaderValue {
        match self {
            ResponseContentType::ApplicationGraphqlResponseJson => {
                GRAPHQL_JSON_RESPONSE_HEADER_VALUE.clone()
            }
            ResponseContentType::ApplicationJson => APPLICATION_JSON_HEADER_VALUE.clone(),
            ResponseContentType::ApplicationGraphql => APPLICATION_GRAPHQL_HEADER_VALUE.clone(),
        }
    }

    /// Whether an accepted media type is exactly this one.
    ///
    /// Any parameter, a quality weight included, makes it a different media type.
    fn matches(self, accepted: &MediaType) -> bool {
        let same_essence = match self {
            ResponseContentType::ApplicationGraphqlResponseJson => {
                accepted.ty == APPLICATION
                    && accepted
                        .subty
                        .as_str()
                        .eq_ignore_ascii_case(GRAPHQL_RESPONSE)
                    && accepted.suffix == Some(JSON)
            }
            ResponseContentType::ApplicationJson => {
                accepted.ty == APPLICATION && accepted.subty == JSON && accepted.suffix.is_none()
            }
            ResponseContentType::ApplicationGraphql => {
                accepted.ty == APPLICATION
                    && accepted.subty.as_str().eq_ignore_ascii_case(GRAPHQL)
                    && accepted.suffix.is_none()
            }
        };

        same_essence && accepted.params().next().is_none()
    }
}

/// Select the content type of the response from the `Accept` header.
///
/// Accepted media types are looked at in the order the client listed them, and the first
/// supported one wins. Entries with parameters never match. Defaults to `application/json`.
pub fn select_response_media_type(headers: &HeaderMap) -> HeaderValue {
    headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(MediaTypeList::new)
        .filter_map(Result::ok)
        .find_map(|accepted| {
            SUPPORTED_MEDIA_TYPES
                .into_iter()
                .find(|supported| supported.matches(&accepted))
        })
        .map(ResponseContentType::header_value)
        .unwrap_or_else(|| APPLICATION_JSON_HEADER_VALUE.clone())
}

/// Returns true if the first `Content-Type` header is JSON (`application/json` or
/// `application/*+json`).
pub(crate) fn content_type_is_json(headers: &HeaderMap) -> bool {
    content_type(headers)
        .map(|mime| mime.ty == APPLICATION && (mime.subty == JSON || mime.suffix == Some(JSON)))
        .unwrap_or(false)
}

/// Returns true if the first `Content-Type` header is `application/graphql`, whatever its
/// parameters.
pub fn is_legacy_graphql_content_type(headers: &HeaderMap) -> bool {
    content_type(headers)
        .map(|mime| {
            mime.ty == APPLICATION
                && mime.subty.as_str().eq_ignore_ascii_case(GRAPHQL)
                && mime.suffix.is_none()
        })
        .unwrap_or(false)
}

fn content_type(headers: &HeaderMap) -> Option<MediaType<'_>> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| MediaType::parse(value).ok())
}
