//! HTTP request handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{Map, Value};

use crate::api::types::*;
use crate::auth::Claims;
use crate::domain::{EmployeeRole, EmployeeStatus, NewEmployee};
use crate::error::{ServiceError, ServiceResult};
use crate::validation::{validate, validate_complete, Schema};
use crate::AppState;

/// Chat landing page context for the signed-in caller.
///
/// GET /
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Page context", body = RootResponse),
        (status = 302, description = "No valid session; redirected to login")
    ),
    tag = "chat"
)]
pub async fn root(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Json<RootResponse> {
    let mut page = (*state.page).clone();
    page.title = format!("Chat - {}", page.title);

    Json(RootResponse {
        page,
        current_user: claims,
    })
}

/// Claims of the signed-in caller.
///
/// GET /v1/auth/me
#[utoipa::path(
    get,
    path = "/v1/auth/me",
    responses(
        (status = 200, description = "Current session claims", body = CurrentUserResponse),
        (status = 302, description = "No valid session; redirected to login")
    ),
    tag = "auth"
)]
pub async fn get_current_user(Extension(claims): Extension<Claims>) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse(claims))
}

// ==================== Employee Endpoints ====================

/// Create an employee from a submitted form.
///
/// POST /v1/employees
#[utoipa::path(
    post,
    path = "/v1/employees",
    request_body = EmployeeForm,
    responses(
        (status = 201, description = "Employee created", body = CreateEmployeeResponse),
        (status = 400, description = "Username or email already registered"),
        (status = 422, description = "Form failed validation")
    ),
    tag = "employees"
)]
pub async fn create_employee(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(EmployeeForm(form)): Json<EmployeeForm>,
) -> ServiceResult<(StatusCode, Json<CreateEmployeeResponse>)> {
    check_form(&state.employee_schema, &form, true)?;

    // bcrypt is CPU-bound
    let employee = tokio::task::spawn_blocking(move || NewEmployee::from_form(&form))
        .await
        .map_err(|e| ServiceError::Internal(format!("Form processing task failed: {}", e)))?
        .map_err(|field| {
            ServiceError::Internal(format!("Validated form has unusable field '{}'", field))
        })?;
    let id = state.repository.create(&employee).await?;

    tracing::info!(
        employee_id = id,
        username = %employee.username,
        created_by = claims.subject().unwrap_or("unknown"),
        "Employee created"
    );

    Ok((StatusCode::CREATED, Json(CreateEmployeeResponse { id })))
}

/// Get an employee by ID.
///
/// GET /v1/employees/{id}
#[utoipa::path(
    get,
    path = "/v1/employees/{id}",
    params(("id" = i64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee details", body = EmployeeResponse),
        (status = 404, description = "Employee not found")
    ),
    tag = "employees"
)]
pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ServiceResult<Json<EmployeeResponse>> {
    let employee = state.repository.get(id).await?;
    Ok(Json(EmployeeResponse { employee }))
}

/// Get an employee by email.
///
/// GET /v1/employees/by-email/{email}
#[utoipa::path(
    get,
    path = "/v1/employees/by-email/{email}",
    params(("email" = String, Path, description = "Employee email")),
    responses(
        (status = 200, description = "Employee details", body = EmployeeResponse),
        (status = 404, description = "Employee not found")
    ),
    tag = "employees"
)]
pub async fn get_employee_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ServiceResult<Json<EmployeeResponse>> {
    let employee = state.repository.get_by_email(&email).await?;
    Ok(Json(EmployeeResponse { employee }))
}

/// Get an employee by username.
///
/// GET /v1/employees/by-username/{username}
#[utoipa::path(
    get,
    path = "/v1/employees/by-username/{username}",
    params(("username" = String, Path, description = "Employee username")),
    responses(
        (status = 200, description = "Employee details", body = EmployeeResponse),
        (status = 404, description = "Employee not found")
    ),
    tag = "employees"
)]
pub async fn get_employee_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ServiceResult<Json<EmployeeResponse>> {
    let employee = state.repository.get_by_username(&username).await?;
    Ok(Json(EmployeeResponse { employee }))
}

/// Change an employee's status.
///
/// PUT /v1/employees/{id}/status
#[utoipa::path(
    put,
    path = "/v1/employees/{id}/status",
    params(("id" = i64, Path, description = "Employee ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = EmployeeResponse),
        (status = 404, description = "Employee not found"),
        (status = 422, description = "Invalid status")
    ),
    tag = "employees"
)]
pub async fn update_employee_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateStatusRequest>,
) -> ServiceResult<Json<EmployeeResponse>> {
    let status: EmployeeStatus =
        parse_single_field(&state.employee_schema, "status", request.status)?;
    let employee = state.repository.update_status(id, status).await?;

    tracing::info!(employee_id = id, status = %status, "Employee status updated");

    Ok(Json(EmployeeResponse { employee }))
}

/// Change an employee's role.
///
/// PUT /v1/employees/{id}/role
#[utoipa::path(
    put,
    path = "/v1/employees/{id}/role",
    params(("id" = i64, Path, description = "Employee ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = EmployeeResponse),
        (status = 404, description = "Employee not found"),
        (status = 422, description = "Invalid role")
    ),
    tag = "employees"
)]
pub async fn update_employee_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateRoleRequest>,
) -> ServiceResult<Json<EmployeeResponse>> {
    let role: EmployeeRole = parse_single_field(&state.employee_schema, "role", request.role)?;
    let employee = state.repository.update_role(id, role).await?;

    tracing::info!(employee_id = id, role = %role, "Employee role updated");

    Ok(Json(EmployeeResponse { employee }))
}

/// Delete an employee.
///
/// DELETE /v1/employees/{id}
#[utoipa::path(
    delete,
    path = "/v1/employees/{id}",
    params(("id" = i64, Path, description = "Employee ID")),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 404, description = "Employee not found")
    ),
    tag = "employees"
)]
pub async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ServiceResult<StatusCode> {
    state.repository.delete(id).await?;

    tracing::info!(employee_id = id, "Employee deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Health check endpoint.
///
/// GET /v1/health
#[utoipa::path(
    get,
    path = "/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // Check database connectivity
    let db_status = match sqlx::query("SELECT 1")
        .fetch_one(state.repository.pool())
        .await
    {
        Ok(_) => "connected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Run a form through the schema, turning field failures into a 422.
fn check_form(schema: &Schema, form: &Map<String, Value>, complete: bool) -> ServiceResult<()> {
    let verdict = if complete {
        validate_complete(schema, form)?
    } else {
        validate(schema, form)?
    };

    if !verdict.is_valid() {
        tracing::debug!(fields = ?verdict.errors().keys().collect::<Vec<_>>(), "Form rejected");
    }

    verdict.into_result().map_err(ServiceError::Validation)
}

/// Validate a single-field update and parse the accepted value.
fn parse_single_field<T>(schema: &Schema, field: &str, value: Value) -> ServiceResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    let mut form = Map::new();
    form.insert(field.to_string(), value);
    check_form(schema, &form, false)?;

    form.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ServiceError::BadRequest(format!("'{}' must be a string", field)))?
        .parse()
        .map_err(ServiceError::BadRequest)
}
