//! HTTP API layer for the chat service.
//!
//! Serves the chat landing page and employee record endpoints behind the session gate.

pub mod handlers;
mod routes;
mod types;

pub use routes::build_router;
pub use types::PageContext;
