use bytes::Bytes;
use http_body_util::BodyExt;
use http_body_util::Limited;
use tower::BoxError;

/// The body type of the HTTP requests and responses handled by this crate.
pub type Body = axum::body::Body;

/// Read a whole body into memory, failing once more than `limit` bytes have been read.
pub(crate) async fn into_bytes_limited(body: Body, limit: usize) -> Result<Bytes, BoxError> {
    Ok(Limited::new(body, limit).collect().await?.to_bytes())
}

/// Create a Full Body using the supplied chunk
pub(crate) fn from_bytes<T: Into<Bytes>>(chunk: T) -> Body {
    Body::from(chunk.into())
}

/// Read a whole body into memory.
pub async fn into_bytes(body: Body) -> Result<Bytes, BoxError> {
    Ok(body.collect().await?.to_bytes())
}
