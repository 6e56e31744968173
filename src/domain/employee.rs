//! Employee domain types.

use bcrypt::{hash, BcryptError, DEFAULT_COST};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

#[cfg(not(test))]
const PASSWORD_HASH_COST: u32 = DEFAULT_COST;
// bcrypt's minimum cost
#[cfg(test)]
const PASSWORD_HASH_COST: u32 = 4;

/// Employment status of an employee account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    Inactive,
    Suspended,
}

impl std::fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmployeeStatus::Active => write!(f, "active"),
            EmployeeStatus::Inactive => write!(f, "inactive"),
            EmployeeStatus::Suspended => write!(f, "suspended"),
        }
    }
}

impl std::str::FromStr for EmployeeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(EmployeeStatus::Active),
            "inactive" => Ok(EmployeeStatus::Inactive),
            "suspended" => Ok(EmployeeStatus::Suspended),
            _ => Err(format!("Invalid employee status: {}", s)),
        }
    }
}

/// Role of an employee within the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    Employee,
    Manager,
    Admin,
}

impl std::fmt::Display for EmployeeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmployeeRole::Employee => write!(f, "employee"),
            EmployeeRole::Manager => write!(f, "manager"),
            EmployeeRole::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for EmployeeRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "employee" => Ok(EmployeeRole::Employee),
            "manager" => Ok(EmployeeRole::Manager),
            "admin" => Ok(EmployeeRole::Admin),
            _ => Err(format!("Invalid employee role: {}", s)),
        }
    }
}

/// A stored employee.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Employee {
    pub id: i64,
    pub username: String,
    /// Salted bcrypt hash of the password; never serialized.
    #[serde(skip)]
    pub password_hash: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub title: String,
    pub status: EmployeeStatus,
    pub role: EmployeeRole,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// An employee ready to be written, built from a validated form.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub title: String,
    pub status: EmployeeStatus,
    pub role: EmployeeRole,
}

impl NewEmployee {
    /// Build from form data that already passed validation.
    ///
    /// Returns the name of the first field that is missing or unusable.
    /// Hashing the password is CPU-bound; call from a blocking context.
    pub fn from_form(form: &Map<String, Value>) -> Result<Self, String> {
        let text = |field: &str| -> Result<String, String> {
            form.get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| field.to_string())
        };

        Ok(Self {
            username: text("username")?,
            password_hash: hash_password(&text("password")?).map_err(|e| {
                tracing::error!(error = %e, "Failed to hash password");
                "password".to_string()
            })?,
            name: text("name")?,
            email: text("email")?,
            phone: form.get("phone").and_then(Value::as_str).map(str::to_string),
            title: text("title")?,
            status: text("status")?.parse().map_err(|_| "status".to_string())?,
            role: text("role")?.parse().map_err(|_| "role".to_string())?,
        })
    }
}

/// Hash a password for storage (bcrypt, random salt per call).
pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    hash(password, PASSWORD_HASH_COST)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_and_role_parse() {
        assert_eq!("ACTIVE".parse::<EmployeeStatus>().unwrap(), EmployeeStatus::Active);
        assert_eq!(EmployeeStatus::Suspended.to_string(), "suspended");
        assert!("retired".parse::<EmployeeStatus>().is_err());

        assert_eq!("manager".parse::<EmployeeRole>().unwrap(), EmployeeRole::Manager);
        assert_eq!(EmployeeRole::Admin.to_string(), "admin");
        assert!("owner".parse::<EmployeeRole>().is_err());
    }

    #[test]
    fn test_new_employee_from_form_hashes_password() {
        let form = json!({
            "username": "jdoe2024",
            "password": "Abcdefg1",
            "name": "Jane Doe",
            "email": "jane@example.com",
            "title": "Engineer",
            "status": "active",
            "role": "employee"
        });

        let employee = NewEmployee::from_form(form.as_object().unwrap()).unwrap();
        assert_eq!(employee.username, "jdoe2024");
        assert_ne!(employee.password_hash, "Abcdefg1");
        assert!(bcrypt::verify("Abcdefg1", &employee.password_hash).unwrap());
        assert_eq!(employee.phone, None);
        assert_eq!(employee.role, EmployeeRole::Employee);
    }

    #[test]
    fn test_new_employee_reports_missing_field() {
        let form = json!({"username": "jdoe2024"});
        assert_eq!(
            NewEmployee::from_form(form.as_object().unwrap()).unwrap_err(),
            "password"
        );
    }

    #[test]
    fn test_hash_password_is_salted_bcrypt() {
        let first = hash_password("password123").unwrap();
        let second = hash_password("password123").unwrap();

        assert!(first.starts_with("$2b$"));
        assert_ne!(first, second);
        assert!(bcrypt::verify("password123", &first).unwrap());
        assert!(bcrypt::verify("password123", &second).unwrap());
        assert!(!bcrypt::verify("password124", &first).unwrap());
    }
}
