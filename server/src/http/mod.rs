mod admin;
mod api;

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{FromRef, FromRequest, State, rejection::JsonRejection},
    http::{self, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::cookie::Key;
use platform_api::{ApiError, ApiResponse};
use platform_db::DbPool;
use products_hr::{
    AccountError, AdminAccounts, AiAssistant, CatalogService, EmailSender, EmployeeImporter,
    EmployeeService, JwtService, LoginError, SelfService, ServiceError,
};
use sea_orm::{ConnectionTrait, Statement};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<AppConfig>,
    pub cookie_key: Key,
    pub jwt: JwtService,
    pub employees: EmployeeService,
    pub catalogs: CatalogService,
    pub self_service: SelfService,
    pub accounts: AdminAccounts,
    pub importer: EmployeeImporter,
    pub assistant: AiAssistant,
}

impl AppState {
    pub fn new(pool: DbPool, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let jwt = JwtService::new(config.jwt.clone());
        let mailer = EmailSender::new(config.smtp.clone());
        let assistant = AiAssistant::new(pool.clone(), config.ai.clone())
            .context("failed to build assistant HTTP client")?;
        Ok(Self {
            cookie_key: config.cookie_key.clone(),
            employees: EmployeeService::new(pool.clone()),
            catalogs: CatalogService::new(pool.clone()),
            self_service: SelfService::new(pool.clone(), jwt.clone(), mailer),
            accounts: AdminAccounts::new(pool.clone()),
            importer: EmployeeImporter::new(pool.clone()),
            assistant,
            jwt,
            pool,
            config,
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "talento server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_credentials(true)
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .merge(api::router())
        .merge(admin::router(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.pool.get_database_backend();
    let db_ok = state
        .pool
        .execute(Statement::from_string(backend, "SELECT 1".to_string()))
        .await
        .is_ok();
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

pub(crate) type HttpResult<T> = Result<T, HttpError>;

/// Handler failure, always rendered as the response envelope.
#[derive(Debug)]
pub(crate) struct HttpError {
    status: StatusCode,
    message: String,
    errors: Vec<String>,
}

impl HttpError {
    pub(crate) fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub(crate) fn internal(err: anyhow::Error) -> Self {
        ApiError::internal(err).into()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        if let ApiError::Internal(inner) = &err {
            error!(error = ?inner, "request failed");
        }
        let envelope = err.envelope();
        Self {
            status: err.status(),
            message: envelope.message,
            errors: envelope.errors,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(err: ServiceError) -> Self {
        ApiError::from(err).into()
    }
}

impl From<AccountError> for HttpError {
    fn from(err: AccountError) -> Self {
        ApiError::from(err).into()
    }
}

impl From<LoginError> for HttpError {
    fn from(err: LoginError) -> Self {
        ApiError::from(err).into()
    }
}

impl From<sea_orm::DbErr> for HttpError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::internal(err.into())
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Solicitud inválida".to_string(),
            errors: vec![rejection.body_text()],
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()>::fail(self.message, self.errors);
        (self.status, Json(body)).into_response()
    }
}

/// JSON body whose rejections render as the envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(HttpError))]
pub(crate) struct JsonBody<T>(pub T);

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
    info!("shutdown signal received");
}
