//! Domain types for the chat service.

mod employee;

pub use employee::*;
