//! Admin console endpoints behind a private session cookie.

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use chrono::{DateTime, Utc};
use entity::admin_session;
use platform_api::ApiResponse;
use products_hr::{
    AiAnswer, CurrentAdmin, ImportReport,
    auth::{AdminLogin, AdminRegistration, admin::SESSION_HOURS},
    dto::{CatalogOptions, DashboardStats, EmployeeFilter, EmployeeInput, EmployeeView},
    employees::EMPLOYEE_NOT_FOUND,
    import::{NO_FILE, check_upload},
};
use serde::{Deserialize, Serialize};
use time::Duration as TimeDuration;
use tracing::info;
use uuid::Uuid;

use super::{AppState, HttpError, HttpResult, JsonBody, api::pdf_response};

pub(crate) const SESSION_COOKIE: &str = "__Host-tp_admin";
const NOT_SIGNED_IN: &str = "Debe iniciar sesión como administrador";
const UPLOAD_FIELD: &str = "archivo";
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub(super) fn router(state: AppState) -> axum::Router<AppState> {
    let authenticated = Router::new()
        .route("/Account/Logout", post(logout_handler))
        .route("/Empleados", get(list_employees).post(create_employee))
        .route(
            "/Empleados/{id}",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
        .route("/Empleados/{id}/pdf", get(employee_pdf))
        .route("/Catalogos", get(catalogs_handler))
        .route(
            "/Import/Upload",
            post(import_handler).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/Dashboard", get(dashboard_handler))
        .route("/Dashboard/AskAI", post(ask_handler))
        .layer(middleware::from_fn_with_state(state, require_admin));

    Router::new()
        .route("/Account/Login", post(login_handler))
        .route("/Account/Register", post(register_handler))
        .merge(authenticated)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView {
    email: String,
    full_name: String,
    expires_at: DateTime<Utc>,
    persistent: bool,
}

impl From<&CurrentAdmin> for SessionView {
    fn from(current: &CurrentAdmin) -> Self {
        Self {
            email: current.user.email.clone(),
            full_name: format!("{} {}", current.user.first_names, current.user.last_names),
            expires_at: current.session.expires_at.with_timezone(&Utc),
            persistent: current.session.persistent,
        }
    }
}

fn session_cookie(session: &admin_session::Model) -> Cookie<'static> {
    let mut builder = Cookie::build((SESSION_COOKIE, session.id.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax);
    if session.persistent {
        builder = builder.max_age(TimeDuration::hours(SESSION_HOURS));
    }
    builder.build()
}

/// Resolves the session cookie, slides its expiry and exposes the
/// [`CurrentAdmin`] to handlers.
async fn require_admin(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    mut request: Request,
    next: Next,
) -> HttpResult<Response> {
    let session_id = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
        .ok_or_else(|| HttpError::unauthorized(NOT_SIGNED_IN))?;
    let current = state
        .accounts
        .current(session_id)
        .await?
        .ok_or_else(|| HttpError::unauthorized(NOT_SIGNED_IN))?;

    let refreshed = current
        .session
        .persistent
        .then(|| session_cookie(&current.session));
    request.extensions_mut().insert(current);
    let response = next.run(request).await;
    Ok(match refreshed {
        Some(cookie) => (jar.add(cookie), response).into_response(),
        None => response,
    })
}

async fn login_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    JsonBody(input): JsonBody<AdminLogin>,
) -> HttpResult<(PrivateCookieJar, ApiResponse<SessionView>)> {
    let current = state.accounts.login(&input).await?;
    let jar = jar.add(session_cookie(&current.session));
    let view = SessionView::from(&current);
    Ok((jar, ApiResponse::ok_with_message(view, "Inicio de sesión exitoso")))
}

async fn register_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    JsonBody(input): JsonBody<AdminRegistration>,
) -> HttpResult<(StatusCode, PrivateCookieJar, ApiResponse<SessionView>)> {
    let current = state.accounts.register(&input).await?;
    let jar = jar.add(session_cookie(&current.session));
    let view = SessionView::from(&current);
    Ok((
        StatusCode::CREATED,
        jar,
        ApiResponse::ok_with_message(view, "Administrador registrado exitosamente"),
    ))
}

async fn logout_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAdmin>,
    jar: PrivateCookieJar,
) -> HttpResult<(PrivateCookieJar, StatusCode)> {
    state.accounts.logout(current.session.id).await?;
    info!(admin = %current.user.id, "administrator signed out");
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    Ok((jar, StatusCode::NO_CONTENT))
}

async fn list_employees(
    State(state): State<AppState>,
    Query(filter): Query<EmployeeFilter>,
) -> HttpResult<ApiResponse<Vec<EmployeeView>>> {
    Ok(ApiResponse::ok(state.employees.search(&filter).await?))
}

async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> HttpResult<ApiResponse<EmployeeView>> {
    let employee = state
        .employees
        .get_by_id(id)
        .await?
        .ok_or_else(|| HttpError::not_found(EMPLOYEE_NOT_FOUND))?;
    Ok(ApiResponse::ok(employee))
}

async fn create_employee(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<EmployeeInput>,
) -> HttpResult<(StatusCode, ApiResponse<EmployeeView>)> {
    let created = state.employees.create(input).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok_with_message(created, "Empleado creado exitosamente"),
    ))
}

async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(input): JsonBody<EmployeeInput>,
) -> HttpResult<ApiResponse<EmployeeView>> {
    let updated = state.employees.update(id, input).await?;
    Ok(ApiResponse::ok_with_message(
        updated,
        "Empleado actualizado exitosamente",
    ))
}

async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> HttpResult<ApiResponse<bool>> {
    if !state.employees.delete(id).await? {
        return Err(HttpError::not_found(EMPLOYEE_NOT_FOUND));
    }
    Ok(ApiResponse::ok_with_message(
        true,
        "Empleado eliminado exitosamente",
    ))
}

async fn employee_pdf(State(state): State<AppState>, Path(id): Path<i32>) -> HttpResult<Response> {
    let details = state
        .employees
        .get_details(id)
        .await?
        .ok_or_else(|| HttpError::not_found(EMPLOYEE_NOT_FOUND))?;
    pdf_response(&details)
}

async fn catalogs_handler(State(state): State<AppState>) -> HttpResult<ApiResponse<CatalogOptions>> {
    Ok(ApiResponse::ok(state.catalogs.options().await?))
}

async fn import_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> HttpResult<ApiResponse<ImportReport>> {
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| HttpError::bad_request(format!("Error al leer el archivo: {err}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|err| HttpError::bad_request(format!("Error al leer el archivo: {err}")))?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| HttpError::bad_request(NO_FILE))?;
    check_upload(file_name.as_deref(), bytes.len()).map_err(HttpError::bad_request)?;

    let report = state.importer.import_workbook(&bytes).await;
    info!(
        file = file_name.as_deref().unwrap_or_default(),
        inserted = report.inserted,
        updated = report.updated,
        errors = report.errors,
        "employee workbook imported"
    );
    Ok(ApiResponse::ok_with_message(report, "Importación finalizada"))
}

async fn dashboard_handler(State(state): State<AppState>) -> HttpResult<ApiResponse<DashboardStats>> {
    Ok(ApiResponse::ok(state.employees.dashboard_stats().await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AskRequest {
    query: String,
}

async fn ask_handler(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<AskRequest>,
) -> Json<AiAnswer> {
    Json(state.assistant.ask(&input.query).await)
}
