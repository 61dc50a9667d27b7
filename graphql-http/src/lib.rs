//! Exposes a GraphQL request handler over HTTP.
//!
//! [`GraphQlHttpHandler`] reads a GraphQL request out of an HTTP request, hands it to a
//! [`WebGraphQlHandler`] and writes the GraphQL response back with a content type negotiated
//! from the client's `Accept` header.

#![warn(unreachable_pub)]

pub mod axum_factory;
pub mod configuration;
mod context;
pub mod error;
pub mod graphql;
pub mod json_ext;
pub mod services;

pub use configuration::Configuration;
pub use context::Context;
pub use services::GraphQlHttpHandler;
pub use services::ServerResponse;
pub use services::web_graphql::WebGraphQlHandler;
pub use services::web_graphql::WebGraphQlRequest;
pub use services::web_graphql::WebGraphQlResponse;
