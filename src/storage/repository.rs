//! Repository layer for database operations.

use sqlx::sqlite::SqlitePool;

use crate::domain::{Employee, EmployeeRole, EmployeeStatus, NewEmployee};
use crate::error::{ServiceError, ServiceResult};
use crate::storage::models::EmployeeRow;

/// Repository for employee records.
#[derive(Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the database schema.
    pub async fn init_schema(&self) -> ServiceResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS employee (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                phone TEXT,
                title TEXT NOT NULL,
                status TEXT NOT NULL,
                role TEXT NOT NULL,
                created TEXT NOT NULL,
                updated TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_employee_status ON employee(status);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert an employee and return the new row id.
    pub async fn create(&self, employee: &NewEmployee) -> ServiceResult<i64> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO employee (username, password_hash, name, email, phone, title, status, role, created, updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&employee.username)
        .bind(&employee.password_hash)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(&employee.title)
        .bind(employee.status.to_string())
        .bind(employee.role.to_string())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                ServiceError::BadRequest("Username or email is already registered".to_string())
            }
            other => ServiceError::Database(other),
        })?;

        Ok(result.last_insert_rowid())
    }

    /// Get an employee by ID.
    pub async fn get(&self, id: i64) -> ServiceResult<Employee> {
        let row: EmployeeRow = sqlx::query_as("SELECT * FROM employee WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", id)))?;

        row.try_into()
    }

    /// Get an employee by email.
    pub async fn get_by_email(&self, email: &str) -> ServiceResult<Employee> {
        let row: EmployeeRow = sqlx::query_as("SELECT * FROM employee WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee '{}' not found", email)))?;

        row.try_into()
    }

    /// Get an employee by username.
    pub async fn get_by_username(&self, username: &str) -> ServiceResult<Employee> {
        let row: EmployeeRow = sqlx::query_as("SELECT * FROM employee WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee '{}' not found", username)))?;

        row.try_into()
    }

    /// Change an employee's status.
    pub async fn update_status(&self, id: i64, status: EmployeeStatus) -> ServiceResult<Employee> {
        self.update_column(id, "status", status.to_string()).await
    }

    /// Change an employee's role.
    pub async fn update_role(&self, id: i64, role: EmployeeRole) -> ServiceResult<Employee> {
        self.update_column(id, "role", role.to_string()).await
    }

    // `column` is always one of the literals above, never user input.
    async fn update_column(
        &self,
        id: i64,
        column: &'static str,
        value: String,
    ) -> ServiceResult<Employee> {
        let sql = format!("UPDATE employee SET {} = ?, updated = ? WHERE id = ?", column);
        let result = sqlx::query(&sql)
            .bind(value)
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound(format!("Employee {} not found", id)));
        }

        self.get(id).await
    }

    /// Delete an employee.
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM employee WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound(format!("Employee {} not found", id)));
        }

        Ok(())
    }
}
