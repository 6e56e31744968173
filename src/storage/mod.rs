//! Storage layer for the chat service.
//!
//! Provides database access via SQLx with SQLite.

mod models;
mod repository;

pub use repository::EmployeeRepository;

#[cfg(test)]
pub(crate) use repository::tests::setup_test_db;
