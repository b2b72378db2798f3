//! Public employee flows: self-registration and token sign-in.

use chrono::Utc;
use entity::{EducationLevel, EmployeeStatus, employee, job_title::DEFAULT_JOB_TITLE};
use platform_api::ApiError;
use platform_db::{DbPool, Repository, UnitOfWork, email_matches};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue::Set, ColumnTrait, Condition};
use thiserror::Error;
use tracing::{Instrument, info, info_span};

use crate::{
    auth::jwt::{JwtError, JwtService},
    dto::{EmployeeApiView, EmployeeLoginInput, RegistrationInput, TokenResponse},
    email::EmailSender,
    employees::{DEPARTMENT_MISSING, EMPLOYEE_NOT_FOUND, JOB_TITLE_MISSING},
    error::{ServiceError, ServiceResult},
    validation::{Violations, normalize_email, optional_text},
};

pub const REGISTRATION_SUCCESS: &str =
    "Registro exitoso. Recibirás un correo de confirmación. Un administrador revisará tu solicitud.";
pub const LOGIN_SUCCESS: &str = "Login exitoso";

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Datos de login inválidos")]
    Invalid(Vec<String>),
    #[error("Credenciales inválidas. Verifique su documento y email.")]
    UnknownCredentials,
    #[error("Su cuenta no está activa. Contacte al administrador.")]
    Inactive,
    #[error(transparent)]
    Token(#[from] JwtError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::Invalid(errors) => ApiError::invalid("Datos de login inválidos", errors),
            LoginError::UnknownCredentials | LoginError::Inactive => {
                ApiError::Unauthorized(err.to_string())
            }
            LoginError::Token(err) => ApiError::internal(anyhow::Error::new(err)),
            LoginError::Service(err) => err.into(),
        }
    }
}

#[derive(Clone)]
pub struct SelfService {
    db: DbPool,
    jwt: JwtService,
    mailer: EmailSender,
}

impl SelfService {
    pub fn new(db: DbPool, jwt: JwtService, mailer: EmailSender) -> Self {
        Self { db, jwt, mailer }
    }

    /// Creates an inactive employee with the onboarding defaults and sends the
    /// welcome email in the background.
    pub async fn register(&self, input: RegistrationInput) -> ServiceResult<EmployeeApiView> {
        let (birth_date, department_id) = validate_registration(&input)?;
        let span = info_span!("employee.register", document = %input.document.trim());
        let created = async {
            let mut uow = UnitOfWork::new(self.db.clone());
            let document = input.document.trim().to_string();
            let by_document =
                Condition::all().add(employee::Column::Document.eq(document.as_str()));
            if uow.employees().exists(by_document).await? {
                return Err(ServiceError::Duplicate(
                    "Ya existe un empleado con este documento".into(),
                ));
            }
            if uow.employees().exists(email_matches(&input.email)).await? {
                return Err(ServiceError::Duplicate(
                    "Ya existe un empleado con este email".into(),
                ));
            }
            if uow.departments().get_by_id(department_id).await?.is_none() {
                return Err(ServiceError::rule(DEPARTMENT_MISSING));
            }
            let job_title = uow
                .job_titles()
                .get_by_name(DEFAULT_JOB_TITLE)
                .await?
                .ok_or_else(|| ServiceError::rule(JOB_TITLE_MISSING))?;

            uow.employees().add(employee::ActiveModel {
                document: Set(document.clone()),
                first_names: Set(input.first_names.trim().to_string()),
                last_names: Set(input.last_names.trim().to_string()),
                birth_date: Set(birth_date),
                address: Set(input.address.trim().to_string()),
                phone: Set(input.phone.trim().to_string()),
                email: Set(normalize_email(&input.email)),
                salary: Set(Decimal::ZERO),
                hire_date: Set(Utc::now().date_naive()),
                status: Set(EmployeeStatus::Inactive),
                education_level: Set(EducationLevel::Technician),
                profile: Set(optional_text(input.profile.clone())),
                department_id: Set(department_id),
                job_title_id: Set(job_title.id),
                password_hash: Set(None),
                ..Default::default()
            });
            uow.save_changes().await?;

            let details = uow
                .employees()
                .get_by_document_with_details(&document)
                .await?
                .ok_or_else(|| ServiceError::NotFound(EMPLOYEE_NOT_FOUND.into()))?;
            info!(id = details.employee.id, "employee self-registered");
            Ok::<_, ServiceError>(details)
        }
        .instrument(span)
        .await?;

        let mailer = self.mailer.clone();
        let to = created.employee.email.clone();
        let name = created.employee.full_name();
        tokio::spawn(async move {
            mailer.send_welcome(&to, &name).await;
        });

        Ok(EmployeeApiView::from(created))
    }

    /// Issues a bearer token for an employee matching both document and email.
    pub async fn login(&self, input: EmployeeLoginInput) -> Result<TokenResponse, LoginError> {
        let mut violations = Violations::new();
        violations
            .required(&input.document, "El documento es requerido")
            .required(&input.email, "El email es requerido")
            .email(&input.email, "El email no es válido");
        let errors = violations.take();
        if !errors.is_empty() {
            return Err(LoginError::Invalid(errors));
        }

        let mut uow = UnitOfWork::new(self.db.clone());
        let employee = uow
            .employees()
            .get_by_document_and_email(&input.document, &input.email)
            .await
            .map_err(ServiceError::from)?
            .ok_or(LoginError::UnknownCredentials)?;
        if !employee.status.can_sign_in() {
            return Err(LoginError::Inactive);
        }

        let issued = self.jwt.generate_token(&employee)?;
        info!(id = employee.id, "employee signed in");
        Ok(TokenResponse {
            token: issued.token,
            expiration: issued.expires_at,
            full_name: employee.full_name(),
            document: employee.document,
            email: employee.email,
        })
    }
}

fn validate_registration(input: &RegistrationInput) -> ServiceResult<(chrono::NaiveDate, i32)> {
    Violations::new()
        .required(&input.document, "El documento es requerido")
        .max_length(&input.document, 20, "El documento no puede exceder 20 caracteres")
        .required(&input.first_names, "Los nombres son requeridos")
        .max_length(&input.first_names, 100, "Los nombres no pueden exceder 100 caracteres")
        .required(&input.last_names, "Los apellidos son requeridos")
        .max_length(&input.last_names, 100, "Los apellidos no pueden exceder 100 caracteres")
        .present(&input.birth_date, "La fecha de nacimiento es requerida")
        .required(&input.address, "La dirección es requerida")
        .max_length(&input.address, 200, "La dirección no puede exceder 200 caracteres")
        .required(&input.phone, "El teléfono es requerido")
        .max_length(&input.phone, 20, "El teléfono no puede exceder 20 caracteres")
        .required(&input.email, "El email es requerido")
        .max_length(&input.email, 150, "El email no puede exceder 150 caracteres")
        .email(&input.email, "El email no es válido")
        .present(&input.department_id, "El departamento es requerido")
        .max_length(
            input.profile.as_deref().unwrap_or_default(),
            500,
            "El perfil profesional no puede exceder 500 caracteres",
        )
        .finish("Datos de registro inválidos")?;
    match (input.birth_date, input.department_id) {
        (Some(birth_date), Some(department_id)) => Ok((birth_date, department_id)),
        _ => Err(ServiceError::rule("Datos de registro inválidos")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_registration_reports_each_field() {
        let err = validate_registration(&RegistrationInput::default()).unwrap_err();
        match err {
            ServiceError::Validation { message, errors } => {
                assert_eq!(message, "Datos de registro inválidos");
                assert!(errors.contains(&"El documento es requerido".to_string()));
                assert!(errors.contains(&"La fecha de nacimiento es requerida".to_string()));
                assert!(errors.contains(&"El departamento es requerido".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn inactive_login_maps_to_unauthorized() {
        let api: ApiError = LoginError::Inactive.into();
        assert_eq!(api.status().as_u16(), 401);
        assert_eq!(api.to_string(), "Su cuenta no está activa. Contacte al administrador.");
    }
}
