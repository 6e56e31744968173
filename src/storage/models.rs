//! Database models for the chat service.
//!
//! These are the row types returned by SQLx queries.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::domain::Employee;
use crate::error::ServiceError;

/// Database row for the employee table.
#[derive(Debug, Clone, FromRow)]
pub struct EmployeeRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub title: String,
    pub status: String,
    pub role: String,
    pub created: String,
    pub updated: String,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = ServiceError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        Ok(Employee {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            name: row.name,
            email: row.email,
            phone: row.phone,
            title: row.title,
            status: row.status.parse().map_err(ServiceError::Internal)?,
            role: row.role.parse().map_err(ServiceError::Internal)?,
            created: parse_timestamp(&row.created)?,
            updated: parse_timestamp(&row.updated)?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ServiceError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ServiceError::Internal(e.to_string()))
}
