//! The request and response exchanged with the GraphQL handler that executes requests.

use std::fmt;
use std::str::FromStr;

use http::HeaderMap;
use http::Uri;
use http::header::ACCEPT_LANGUAGE;
use http::header::COOKIE;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use tower::BoxError;
use uuid::Uuid;

use crate::Context;
use crate::graphql;
use crate::json_ext::Object;

/// The GraphQL request handler this crate delegates execution to.
///
/// Any [`tower::Service`] from [`WebGraphQlRequest`] to [`WebGraphQlResponse`] can be boxed into
/// one with [`WebGraphQlHandler::new`].
pub type WebGraphQlHandler =
    tower::util::BoxCloneSyncService<WebGraphQlRequest, WebGraphQlResponse, BoxError>;

/// Cookies sent with a request, grouped by name in the order they were received.
pub type Cookies = IndexMap<String, Vec<HttpCookie>>;

/// A cookie sent by the client: only its name and value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HttpCookie {
    name: String,
    value: String,
}

impl HttpCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for HttpCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Collect the cookies of every `Cookie` header.
///
/// Duplicated names are kept, in order. Pairs that cannot be parsed are skipped.
pub(crate) fn cookies_from_headers(headers: &HeaderMap) -> Cookies {
    let mut cookies = Cookies::new();
    for value in headers.get_all(COOKIE) {
        let Ok(value) = value.to_str() else {
            tracing::trace!("skipping a Cookie header that is not visible ASCII");
            continue;
        };
        for cookie in cookie::Cookie::split_parse(value).filter_map(Result::ok) {
            cookies
                .entry(cookie.name().to_string())
                .or_default()
                .push(HttpCookie::new(cookie.name(), cookie.value()));
        }
    }
    cookies
}

/// The locale of the client, as a language tag such as `en-US`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    pub fn new(tag: impl Into<String>) -> Self {
        Locale(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The preferred language of the `Accept-Language` header, or `default`.
    ///
    /// Ranges are ordered by quality weight, the client's order breaking ties. The `*` range
    /// and refused ranges (`q=0`) are skipped.
    pub(crate) fn from_headers(headers: &HeaderMap, default: &Locale) -> Locale {
        let mut ranges: Vec<(&str, f32)> = headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(',').filter_map(weighted_language_range).collect())
            .unwrap_or_default();
        // stable sort
        ranges.sort_by(|(_, left), (_, right)| right.total_cmp(left));

        ranges
            .into_iter()
            .map(|(range, _)| range)
            .find(|range| is_language_tag(range))
            .map(Locale::new)
            .unwrap_or_else(|| default.clone())
    }
}

/// A language range with its quality weight, `None` if the weight is invalid or zero.
fn weighted_language_range(range: &str) -> Option<(&str, f32)> {
    let mut parts = range.split(';');
    let tag = parts.next()?.trim();
    let quality = match parts.find_map(|param| param.trim().strip_prefix("q=")) {
        Some(quality) => quality.trim().parse::<f32>().ok()?,
        None => 1.0,
    };
    (quality > 0.0).then_some((tag, quality))
}

fn is_language_tag(range: &str) -> bool {
    !range.is_empty()
        && range != "*"
        && range
            .split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric()))
}

impl Default for Locale {
    fn default() -> Self {
        Locale::new("en-US")
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_language_tag(s) {
            Ok(Locale::new(s))
        } else {
            Err(format!("'{s}' is not a language tag"))
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generates the id of each [`WebGraphQlRequest`].
pub trait IdGenerator: Send + Sync + 'static {
    fn generate_id(&self) -> String;
}

/// Random (version 4) UUIDs.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// A GraphQL request received over HTTP, along with what is known about the HTTP exchange.
///
/// One is built for every HTTP request and handed over to the [`WebGraphQlHandler`].
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct WebGraphQlRequest {
    uri: Uri,
    headers: HeaderMap,
    cookies: Cookies,
    attributes: Context,
    body: graphql::Request,
    id: String,
    locale: Locale,
}

#[buildstructor::buildstructor]
impl WebGraphQlRequest {
    /// Build a request. `cookies` and `attributes` default to empty, `locale` to `en-US`.
    #[builder(visibility = "pub")]
    fn new(
        uri: Uri,
        headers: Option<HeaderMap>,
        cookies: Option<Cookies>,
        attributes: Option<Context>,
        body: graphql::Request,
        id: String,
        locale: Option<Locale>,
    ) -> Self {
        Self {
            uri,
            headers: headers.unwrap_or_default(),
            cookies: cookies.unwrap_or_default(),
            attributes: attributes.unwrap_or_default(),
            body,
            id,
            locale: locale.unwrap_or_default(),
        }
    }
}

impl WebGraphQlRequest {
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    pub fn attributes(&self) -> &Context {
        &self.attributes
    }

    /// The GraphQL payload.
    pub fn body(&self) -> &graphql::Request {
        &self.body
    }

    pub fn document(&self) -> &str {
        &self.body.query
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.body.operation_name.as_deref()
    }

    pub fn variables(&self) -> &Object {
        &self.body.variables
    }

    pub fn extensions(&self) -> &Object {
        &self.body.extensions
    }

    /// Identifies this request in logs and traces. Unique to each HTTP request.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }
}

// Headers and cookies are left out as they may carry credentials.
impl fmt::Display for WebGraphQlRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document='{}'", self.body.query)?;
        if let Some(operation_name) = &self.body.operation_name {
            write!(f, ", operationName='{operation_name}'")?;
        }
        if !self.body.variables.is_empty() {
            write!(
                f,
                ", variables={}",
                serde_json::to_string(&self.body.variables).map_err(|_| fmt::Error)?
            )?;
        }
        write!(f, ", id={}, Locale={}", self.id, self.locale)
    }
}

/// The outcome of a [`WebGraphQlRequest`]: the GraphQL response and the HTTP headers to
/// send it with.
#[derive(Clone, Debug, Default)]
#[non_exhaustive]
pub struct WebGraphQlResponse {
    response: graphql::Response,
    response_headers: HeaderMap,
}

#[buildstructor::buildstructor]
impl WebGraphQlResponse {
    #[builder(visibility = "pub")]
    fn new(response: graphql::Response, response_headers: Option<HeaderMap>) -> Self {
        Self {
            response,
            response_headers: response_headers.unwrap_or_default(),
        }
    }
}

impl WebGraphQlResponse {
    pub fn response(&self) -> &graphql::Response {
        &self.response
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    /// The response fields to serialize as the HTTP response body.
    pub fn to_map(&self) -> Result<Object, serde_json::Error> {
        self.response.to_map()
    }

    pub(crate) fn into_parts(self) -> (graphql::Response, HeaderMap) {
        (self.response, self.response_headers)
    }
}

impl From<graphql::Response> for WebGraphQlResponse {
    fn from(response: graphql::Response) -> Self {
        Self::builder().response(response).build()
    }
}
