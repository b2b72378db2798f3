//! Administrator accounts and their cookie-backed sessions.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use entity::{
    admin_session,
    admin_user::{self, AdminRole},
};
use platform_api::ApiError;
use platform_db::DbPool;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter,
    sea_query::{Expr, Func},
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::validation::{Violations, normalize_email};

pub const MAX_FAILED_ATTEMPTS: i32 = 5;
pub const LOCKOUT_MINUTES: i64 = 5;
pub const SESSION_HOURS: i64 = 8;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Credenciales inválidas")]
    InvalidCredentials,
    #[error("No tiene permisos de administrador")]
    NotAdministrator,
    #[error("Cuenta bloqueada. Intente más tarde.")]
    LockedOut,
    #[error("Ya existe un administrador registrado. Contacte al administrador actual.")]
    AlreadyRegistered,
    #[error("Datos de registro inválidos")]
    Validation(Vec<String>),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidCredentials | AccountError::LockedOut => {
                ApiError::Unauthorized(err.to_string())
            }
            AccountError::NotAdministrator => ApiError::Forbidden(err.to_string()),
            AccountError::AlreadyRegistered => ApiError::Conflict(err.to_string()),
            AccountError::Validation(errors) => {
                ApiError::invalid("Datos de registro inválidos", errors)
            }
            AccountError::Hash(_) | AccountError::Database(_) => {
                ApiError::internal(anyhow::Error::new(err))
            }
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminLogin {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminRegistration {
    pub first_names: String,
    pub last_names: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// The administrator behind a live session.
#[derive(Clone, Debug)]
pub struct CurrentAdmin {
    pub user: admin_user::Model,
    pub session: admin_session::Model,
}

#[derive(Clone)]
pub struct AdminAccounts {
    db: DbPool,
}

impl AdminAccounts {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn login(&self, input: &AdminLogin) -> Result<CurrentAdmin, AccountError> {
        self.login_at(input, Utc::now()).await
    }

    /// Verifies the password and opens a session, counting failures toward lockout.
    pub async fn login_at(
        &self,
        input: &AdminLogin,
        now: DateTime<Utc>,
    ) -> Result<CurrentAdmin, AccountError> {
        let mut user = self
            .find_by_email(&input.email)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;
        if user.role != AdminRole::Administrator {
            return Err(AccountError::NotAdministrator);
        }
        if is_locked(&user, now) {
            warn!(admin = %user.id, "login refused for locked account");
            return Err(AccountError::LockedOut);
        }

        if !verify_password(&input.password, &user.password_hash) {
            return self.record_failure(user, now).await;
        }

        if user.failed_attempts != 0 || user.locked_until.is_some() {
            let mut active: admin_user::ActiveModel = user.into();
            active.failed_attempts = Set(0);
            active.locked_until = Set(None);
            user = active.update(&self.db).await?;
        }
        let session = self.open_session(user.id, input.remember_me, now).await?;
        info!(admin = %user.id, "administrator signed in");
        Ok(CurrentAdmin { user, session })
    }

    async fn record_failure(
        &self,
        user: admin_user::Model,
        now: DateTime<Utc>,
    ) -> Result<CurrentAdmin, AccountError> {
        let attempts = user.failed_attempts + 1;
        let user_id = user.id;
        let mut active: admin_user::ActiveModel = user.into();
        if attempts >= MAX_FAILED_ATTEMPTS {
            active.failed_attempts = Set(0);
            active.locked_until = Set(Some((now + Duration::minutes(LOCKOUT_MINUTES)).into()));
            active.update(&self.db).await?;
            warn!(admin = %user_id, "administrator locked out");
            return Err(AccountError::LockedOut);
        }
        active.failed_attempts = Set(attempts);
        active.update(&self.db).await?;
        Err(AccountError::InvalidCredentials)
    }

    /// One-time self-registration of the first administrator.
    pub async fn register(
        &self,
        input: &AdminRegistration,
    ) -> Result<CurrentAdmin, AccountError> {
        if self.administrator_exists().await? {
            return Err(AccountError::AlreadyRegistered);
        }
        validate_registration(input)?;

        let now = Utc::now();
        let password_hash = hash_password(&input.password)?;
        let user = admin_user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(normalize_email(&input.email)),
            first_names: Set(input.first_names.trim().to_string()),
            last_names: Set(input.last_names.trim().to_string()),
            role: Set(AdminRole::Administrator),
            password_hash: Set(password_hash),
            failed_attempts: Set(0),
            locked_until: Set(None),
            created_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;
        info!(admin = %user.id, "administrator registered");
        let session = self.open_session(user.id, false, now).await?;
        Ok(CurrentAdmin { user, session })
    }

    pub async fn administrator_exists(&self) -> Result<bool, DbErr> {
        let admins = admin_user::Entity::find()
            .filter(admin_user::Column::Role.eq(AdminRole::Administrator))
            .count(&self.db)
            .await?;
        Ok(admins > 0)
    }

    pub async fn current(&self, session_id: Uuid) -> Result<Option<CurrentAdmin>, DbErr> {
        self.current_at(session_id, Utc::now()).await
    }

    /// Resolves a session and slides its expiry forward.
    pub async fn current_at(
        &self,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<CurrentAdmin>, DbErr> {
        let Some((session, user)) = admin_session::Entity::find_by_id(session_id)
            .find_also_related(admin_user::Entity)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        let Some(user) = user else {
            return Ok(None);
        };
        if session.expires_at.with_timezone(&Utc) < now {
            admin_session::Entity::delete_by_id(session_id)
                .exec(&self.db)
                .await?;
            return Ok(None);
        }
        let mut active: admin_session::ActiveModel = session.into();
        active.expires_at = Set((now + Duration::hours(SESSION_HOURS)).into());
        let session = active.update(&self.db).await?;
        Ok(Some(CurrentAdmin { user, session }))
    }

    pub async fn logout(&self, session_id: Uuid) -> Result<(), DbErr> {
        admin_session::Entity::delete_by_id(session_id)
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<admin_user::Model>, DbErr> {
        admin_user::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(admin_user::Column::Email)))
                    .eq(normalize_email(email)),
            )
            .one(&self.db)
            .await
    }

    async fn open_session(
        &self,
        admin_user_id: Uuid,
        persistent: bool,
        now: DateTime<Utc>,
    ) -> Result<admin_session::Model, DbErr> {
        admin_session::ActiveModel {
            id: Set(Uuid::new_v4()),
            admin_user_id: Set(admin_user_id),
            created_at: Set(now.into()),
            expires_at: Set((now + Duration::hours(SESSION_HOURS)).into()),
            persistent: Set(persistent),
        }
        .insert(&self.db)
        .await
    }
}

fn is_locked(user: &admin_user::Model, now: DateTime<Utc>) -> bool {
    user.locked_until
        .is_some_and(|until| until.with_timezone(&Utc) > now)
}

fn validate_registration(input: &AdminRegistration) -> Result<(), AccountError> {
    let mut violations = Violations::new();
    violations
        .required(&input.first_names, "Los nombres son requeridos")
        .max_length(&input.first_names, 100, "Los nombres no pueden exceder 100 caracteres")
        .required(&input.last_names, "Los apellidos son requeridos")
        .max_length(&input.last_names, 100, "Los apellidos no pueden exceder 100 caracteres")
        .required(&input.email, "El email es requerido")
        .email(&input.email, "El email no es válido")
        .check(
            input.password == input.confirm_password,
            "Las contraseñas no coinciden",
        );
    let mut errors = password_violations(&input.password);
    errors.extend(violations.take());
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AccountError::Validation(errors))
    }
}

/// Length of at least six with a digit, a lowercase and an uppercase letter.
pub fn password_violations(password: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if password.chars().count() < 6 {
        errors.push("La contraseña debe tener al menos 6 caracteres".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("La contraseña debe contener al menos un número".to_string());
    }
    if !password.chars().any(char::is_lowercase) {
        errors.push("La contraseña debe contener al menos una letra minúscula".to_string());
    }
    if !password.chars().any(char::is_uppercase) {
        errors.push("La contraseña debe contener al menos una letra mayúscula".to_string());
    }
    errors
}

pub fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AccountError::Hash(err.to_string()))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_password_passes_policy() {
        assert!(password_violations("Secreto1").is_empty());
    }

    #[test]
    fn weak_password_lists_every_gap() {
        let errors = password_violations("abc");
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&"La contraseña debe tener al menos 6 caracteres".to_string()));
    }

    #[test]
    fn hash_round_trip() {
        let hash = hash_password("Secreto1").unwrap();
        assert!(verify_password("Secreto1", &hash));
        assert!(!verify_password("secreto1", &hash));
        assert!(!verify_password("Secreto1", "not-a-hash"));
    }

    #[test]
    fn mismatched_confirmation_is_reported() {
        let input = AdminRegistration {
            first_names: "Laura".into(),
            last_names: "Pérez".into(),
            email: "laura@example.com".into(),
            password: "Secreto1".into(),
            confirm_password: "Secreto2".into(),
        };
        match validate_registration(&input) {
            Err(AccountError::Validation(errors)) => {
                assert_eq!(errors, vec!["Las contraseñas no coinciden".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
