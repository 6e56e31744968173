//! Route definitions for the API.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers;
use crate::auth::{require_session, SessionAuth};
use crate::AppState;

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::root,
        handlers::get_current_user,
        handlers::create_employee,
        handlers::get_employee,
        handlers::get_employee_by_email,
        handlers::get_employee_by_username,
        handlers::update_employee_status,
        handlers::update_employee_role,
        handlers::delete_employee,
        handlers::health_check,
    ),
    components(schemas(
        crate::api::types::PageContext,
        crate::api::types::RootResponse,
        crate::api::types::CurrentUserResponse,
        crate::api::types::EmployeeForm,
        crate::api::types::CreateEmployeeResponse,
        crate::api::types::EmployeeResponse,
        crate::api::types::UpdateStatusRequest,
        crate::api::types::UpdateRoleRequest,
        crate::api::types::HealthResponse,
        crate::domain::Employee,
        crate::domain::EmployeeStatus,
        crate::domain::EmployeeRole,
    )),
    tags(
        (name = "chat", description = "Chat landing page"),
        (name = "auth", description = "Session information"),
        (name = "employees", description = "Employee records"),
        (name = "health", description = "Health and status endpoints")
    ),
    info(
        title = "Chat Service API",
        version = "0.1.0",
        description = "Chat microservice - session-gated employee portal backend",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Build the API router. Everything except health and docs sits behind the
/// session gate.
pub fn build_router(state: AppState, session_auth: SessionAuth) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Routes requiring a session cookie
    let protected_routes = Router::new()
        .route("/", get(handlers::root))
        .route("/v1/auth/me", get(handlers::get_current_user))
        .route("/v1/employees", post(handlers::create_employee))
        .route(
            "/v1/employees/{id}",
            get(handlers::get_employee).delete(handlers::delete_employee),
        )
        .route(
            "/v1/employees/{id}/status",
            put(handlers::update_employee_status),
        )
        .route("/v1/employees/{id}/role", put(handlers::update_employee_role))
        .route(
            "/v1/employees/by-email/{email}",
            get(handlers::get_employee_by_email),
        )
        .route(
            "/v1/employees/by-username/{username}",
            get(handlers::get_employee_by_username),
        )
        .layer(middleware::from_fn_with_state(session_auth, require_session))
        .with_state(state.clone());

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/v1/health", get(handlers::health_check))
        .with_state(state);

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
