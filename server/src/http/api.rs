//! Public REST API for employees: self-registration, token sign-in and the
//! bearer-protected "me" endpoints.

use axum::{
    Router,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Local;
use platform_api::ApiResponse;
use products_hr::{
    JwtService,
    auth::{Claims, JwtError},
    catalog::DEPARTMENT_NOT_FOUND,
    dto::{DepartmentView, EmployeeApiView, EmployeeLoginInput, RegistrationInput, TokenResponse},
    employees::EMPLOYEE_NOT_FOUND,
    pdf,
    self_service::{LOGIN_SUCCESS, REGISTRATION_SUCCESS},
};
use tracing::{error, warn};

use super::{AppState, HttpError, HttpResult, JsonBody};

const MISSING_TOKEN: &str = "Token no proporcionado";
const INVALID_TOKEN: &str = "Token inválido";
const EXPIRED_TOKEN: &str = "Token expirado";

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/Auth/registro", post(register_handler))
        .route("/api/Auth/login", post(login_handler))
        .route("/api/Empleados/me", get(me_handler))
        .route("/api/Empleados/me/hoja-vida", get(resume_handler))
        .route("/api/Departamentos", get(departments_handler))
        .route("/api/Departamentos/{id}", get(department_handler))
}

/// Claims of a valid bearer token.
pub(crate) struct Bearer(pub Claims);

impl Bearer {
    fn document(&self) -> HttpResult<&str> {
        self.0
            .document
            .as_deref()
            .filter(|document| !document.is_empty())
            .ok_or_else(|| HttpError::unauthorized(INVALID_TOKEN))
    }
}

impl FromRequestParts<AppState> for Bearer {
    type Rejection = HttpError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| HttpError::unauthorized(MISSING_TOKEN))?;
        let token = JwtService::extract_from_header(header)
            .ok_or_else(|| HttpError::unauthorized(INVALID_TOKEN))?;
        match state.jwt.validate_token(token) {
            Ok(claims) => Ok(Self(claims)),
            Err(JwtError::ExpiredToken) => Err(HttpError::unauthorized(EXPIRED_TOKEN)),
            Err(err) => {
                warn!(error = %err, uri = %parts.uri, "bearer token rejected");
                Err(HttpError::unauthorized(INVALID_TOKEN))
            }
        }
    }
}

async fn register_handler(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegistrationInput>,
) -> HttpResult<(StatusCode, ApiResponse<EmployeeApiView>)> {
    let created = state.self_service.register(input).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok_with_message(created, REGISTRATION_SUCCESS),
    ))
}

async fn login_handler(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<EmployeeLoginInput>,
) -> HttpResult<ApiResponse<TokenResponse>> {
    let token = state.self_service.login(input).await?;
    Ok(ApiResponse::ok_with_message(token, LOGIN_SUCCESS))
}

async fn me_handler(
    State(state): State<AppState>,
    bearer: Bearer,
) -> HttpResult<ApiResponse<EmployeeApiView>> {
    let details = state
        .employees
        .get_details_by_document(bearer.document()?)
        .await?
        .ok_or_else(|| HttpError::not_found(EMPLOYEE_NOT_FOUND))?;
    Ok(ApiResponse::ok(EmployeeApiView::from(details)))
}

async fn resume_handler(State(state): State<AppState>, bearer: Bearer) -> HttpResult<Response> {
    let details = state
        .employees
        .get_details_by_document(bearer.document()?)
        .await?
        .ok_or_else(|| HttpError::not_found(EMPLOYEE_NOT_FOUND))?;
    pdf_response(&details)
}

/// Renders the resume as a downloadable attachment.
pub(crate) fn pdf_response(details: &platform_db::EmployeeDetails) -> HttpResult<Response> {
    let bytes = pdf::render_resume(details).map_err(|err| {
        error!(document = %details.employee.document, error = %err, "resume rendering failed");
        HttpError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error al generar PDF: {err}"),
        )
    })?;
    let file_name = pdf::file_name(&details.employee.document, Local::now().date_naive());
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={file_name}"),
            ),
        ],
        bytes,
    )
        .into_response())
}

async fn departments_handler(
    State(state): State<AppState>,
) -> HttpResult<ApiResponse<Vec<DepartmentView>>> {
    Ok(ApiResponse::ok(state.catalogs.departments().await?))
}

async fn department_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> HttpResult<ApiResponse<DepartmentView>> {
    let department = state
        .catalogs
        .department(id)
        .await?
        .ok_or_else(|| HttpError::not_found(DEPARTMENT_NOT_FOUND))?;
    Ok(ApiResponse::ok(department))
}
