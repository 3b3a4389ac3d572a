//! REST API surface: routes, handlers, extractors, and the JSend
//! response envelope.

pub mod extract;
pub mod handlers;
pub mod response;
mod routes;

pub use routes::create_router;
