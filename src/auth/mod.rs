//! Authentication module for the chat service.
//!
//! Every protected request passes the session gate:
//! - Cookie: unwraps the signed `auth` cookie set by the identity service
//! - JWT: verifies the HS256 session token inside it
//! - Gate: turns the verification outcome into a decision
//! - Middleware: applies the decision to the HTTP exchange

mod cookie;
mod gate;
mod jwt;
mod middleware;

pub use cookie::*;
pub use gate::*;
pub use jwt::*;
pub use middleware::*;

#[cfg(test)]
pub(crate) use jwt::tests as test_tokens;
