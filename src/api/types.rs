//! API request and response types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::auth::Claims;
use crate::config::AppConfig;
use crate::domain::Employee;

// ==================== Root ====================

/// Values every page of the portal needs.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PageContext {
    /// Page title.
    pub title: String,
    pub auth_microservice_url: String,
    pub account_microservice_url: String,
    pub chat_microservice_url: String,
    pub cdn_url: String,
}

impl From<&AppConfig> for PageContext {
    fn from(app: &AppConfig) -> Self {
        Self {
            title: app.name.clone(),
            auth_microservice_url: app.auth_service_url.clone(),
            account_microservice_url: app.account_service_url.clone(),
            chat_microservice_url: app.chat_service_url.clone(),
            cdn_url: app.cdn_url.clone(),
        }
    }
}

/// Response for the chat landing page.
#[derive(Debug, Serialize, ToSchema)]
pub struct RootResponse {
    #[serde(flatten)]
    pub page: PageContext,
    /// Claims of the signed-in caller.
    #[schema(value_type = Object)]
    pub current_user: Claims,
}

/// Claims of the signed-in caller, as issued by the identity service.
#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct CurrentUserResponse(pub Claims);

// ==================== Employees ====================

/// Raw employee form as submitted; validated against the employee schema.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct EmployeeForm(pub Map<String, Value>);

/// Response after creating an employee.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateEmployeeResponse {
    /// Row ID of the new employee.
    pub id: i64,
}

/// Employee details.
#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeResponse {
    #[serde(flatten)]
    pub employee: Employee,
}

/// Request to change an employee's status.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// One of: active, inactive, suspended.
    #[serde(default)]
    #[schema(value_type = String)]
    pub status: Value,
}

/// Request to change an employee's role.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    /// One of: employee, manager, admin.
    #[serde(default)]
    #[schema(value_type = String)]
    pub role: Value,
}

// ==================== Health ====================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Database connectivity.
    pub database: String,
    /// Timestamp.
    pub timestamp: String,
}
