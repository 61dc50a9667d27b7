//! Request and response processing shared by the handler.

pub(crate) mod content_negotiation;
