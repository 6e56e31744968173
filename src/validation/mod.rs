//! Form validation for the chat service.
//!
//! - Schema: declarative field rules compiled once at startup
//! - Predicates: named custom rules referenced by schemas
//! - Engine: evaluates submitted data and builds the user-facing error report

mod engine;
mod predicates;
mod schema;

pub use engine::*;
pub use predicates::*;
pub use schema::*;
