use anyhow::Result;
use chrono::{Duration, Utc};
use entity::{EmployeeStatus, employee, job_title::DEFAULT_JOB_TITLE};
use platform_db::{UnitOfWork, email_matches};
use products_hr::{
    AccountError, AdminAccounts, EmailSender, JwtConfig, JwtService, LoginError, SelfService,
    ServiceError, SmtpSettings,
    auth::{AdminLogin, AdminRegistration},
    dto::{EmployeeLoginInput, RegistrationInput},
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, QueryFilter};
use talento_tests::{CONTABILIDAD, date, memory_db};

fn self_service(db: platform_db::DbPool) -> SelfService {
    let jwt = JwtService::new(JwtConfig::new("integration-secret"));
    SelfService::new(db, jwt, EmailSender::new(SmtpSettings::default()))
}

fn registration(document: &str, email: &str) -> RegistrationInput {
    RegistrationInput {
        document: document.to_string(),
        first_names: "Sofía".to_string(),
        last_names: "Castro".to_string(),
        birth_date: Some(date(1995, 9, 30)),
        address: "Avenida 68 # 12-05".to_string(),
        phone: "3207778899".to_string(),
        email: email.to_string(),
        department_id: Some(CONTABILIDAD),
        profile: Some("Contadora pública".to_string()),
    }
}

fn login(document: &str, email: &str) -> EmployeeLoginInput {
    EmployeeLoginInput {
        document: document.to_string(),
        email: email.to_string(),
    }
}

async fn set_status(db: &platform_db::DbPool, email: &str, status: EmployeeStatus) -> Result<()> {
    let stored = employee::Entity::find()
        .filter(email_matches(email))
        .one(db)
        .await?
        .ok_or_else(|| anyhow::anyhow!("employee {email} missing"))?;
    let mut active: employee::ActiveModel = stored.into();
    active.status = Set(status);
    active.update(db).await?;
    Ok(())
}

fn admin_registration(email: &str) -> AdminRegistration {
    AdminRegistration {
        first_names: "Laura".to_string(),
        last_names: "Pérez".to_string(),
        email: email.to_string(),
        password: "Secreto1".to_string(),
        confirm_password: "Secreto1".to_string(),
    }
}

#[tokio::test]
async fn registration_forces_onboarding_defaults() -> Result<()> {
    let db = memory_db().await?;
    let created = self_service(db.clone())
        .register(registration("8001", "sofia@example.com"))
        .await?;
    assert_eq!(created.status, "Inactive");
    assert_eq!(created.job_title, "Auxiliar");
    assert_eq!(created.education_level, "Technician");
    assert_eq!(created.department, "Contabilidad");
    assert_eq!(created.salary, Decimal::ZERO);
    assert_eq!(created.hire_date, Utc::now().date_naive());

    let mut uow = UnitOfWork::new(db);
    let stored = uow.employees().get_by_document("8001").await?.unwrap();
    assert_eq!(stored.status, EmployeeStatus::Inactive);
    assert_eq!(stored.job_title_id, talento_tests::AUXILIAR);
    Ok(())
}

#[tokio::test]
async fn default_job_title_is_part_of_the_seed() -> Result<()> {
    let db = memory_db().await?;
    assert!(migration::JOB_TITLE_NAMES.contains(&DEFAULT_JOB_TITLE));
    let mut uow = UnitOfWork::new(db);
    let seeded = uow.job_titles().get_by_name(DEFAULT_JOB_TITLE).await?.unwrap();
    assert_eq!(seeded.id, talento_tests::AUXILIAR);
    Ok(())
}

#[tokio::test]
async fn registration_rejects_duplicates_and_unknown_departments() -> Result<()> {
    let db = memory_db().await?;
    let service = self_service(db);
    service
        .register(registration("8101", "primero@example.com"))
        .await?;

    let err = service
        .register(registration("8102", "PRIMERO@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Duplicate(_)));

    let mut input = registration("8103", "nuevo@example.com");
    input.department_id = Some(42);
    let err = service.register(input).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation { .. }));
    Ok(())
}

#[tokio::test]
async fn login_requires_document_email_and_an_active_status() -> Result<()> {
    let db = memory_db().await?;
    let service = self_service(db.clone());
    service
        .register(registration("8201", "activa@example.com"))
        .await?;

    let err = service
        .login(login("8201", "activa@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, LoginError::Inactive));

    set_status(&db, "activa@example.com", EmployeeStatus::Active).await?;
    let token = service.login(login("8201", "ACTIVA@example.com")).await?;
    assert_eq!(token.document, "8201");
    assert_eq!(token.full_name, "Sofía Castro");
    assert!(token.expiration > Utc::now());

    let err = service
        .login(login("8201", "otra@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, LoginError::UnknownCredentials));
    let err = service
        .login(login("9999", "activa@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, LoginError::UnknownCredentials));

    set_status(&db, "activa@example.com", EmployeeStatus::OnVacation).await?;
    assert!(service.login(login("8201", "activa@example.com")).await.is_ok());

    let err = service.login(login("", "no-es-email")).await.unwrap_err();
    match err {
        LoginError::Invalid(errors) => assert_eq!(errors.len(), 2),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn issued_tokens_carry_the_document_claim() -> Result<()> {
    let db = memory_db().await?;
    let service = self_service(db.clone());
    service
        .register(registration("8301", "claims@example.com"))
        .await?;
    set_status(&db, "claims@example.com", EmployeeStatus::Active).await?;

    let token = service.login(login("8301", "claims@example.com")).await?;
    let jwt = JwtService::new(JwtConfig::new("integration-secret"));
    let claims = jwt.validate_token(&token.token)?;
    assert_eq!(claims.document.as_deref(), Some("8301"));
    assert_eq!(claims.email, "claims@example.com");

    let other = JwtService::new(JwtConfig::new("another-secret"));
    assert!(other.validate_token(&token.token).is_err());
    Ok(())
}

#[tokio::test]
async fn five_wrong_passwords_lock_the_account() -> Result<()> {
    let db = memory_db().await?;
    let accounts = AdminAccounts::new(db);
    accounts
        .register(&admin_registration("laura@talentoplus.co"))
        .await?;

    let start = Utc::now();
    let wrong = AdminLogin {
        email: "laura@talentoplus.co".into(),
        password: "incorrecta".into(),
        remember_me: false,
    };
    for _ in 0..4 {
        let err = accounts.login_at(&wrong, start).await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));
    }
    let err = accounts.login_at(&wrong, start).await.unwrap_err();
    assert!(matches!(err, AccountError::LockedOut));

    let right = AdminLogin {
        password: "Secreto1".into(),
        remember_me: true,
        ..wrong.clone()
    };
    let err = accounts
        .login_at(&right, start + Duration::minutes(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::LockedOut));

    let signed_in = accounts
        .login_at(&right, start + Duration::minutes(6))
        .await?;
    assert!(signed_in.session.persistent);
    assert_eq!(signed_in.user.failed_attempts, 0);
    assert!(signed_in.user.locked_until.is_none());
    Ok(())
}

#[tokio::test]
async fn only_one_administrator_can_self_register() -> Result<()> {
    let db = memory_db().await?;
    let accounts = AdminAccounts::new(db);
    assert!(!accounts.administrator_exists().await?);
    let first = accounts
        .register(&admin_registration("laura@talentoplus.co"))
        .await?;
    assert!(!first.session.persistent);
    assert!(accounts.administrator_exists().await?);

    let err = accounts
        .register(&admin_registration("otro@talentoplus.co"))
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::AlreadyRegistered));
    Ok(())
}

#[tokio::test]
async fn sessions_slide_and_expire() -> Result<()> {
    let db = memory_db().await?;
    let accounts = AdminAccounts::new(db);
    let first = accounts
        .register(&admin_registration("laura@talentoplus.co"))
        .await?;
    let session_id = first.session.id;

    let later = Utc::now() + Duration::hours(7);
    let current = accounts.current_at(session_id, later).await?.unwrap();
    assert!(current.session.expires_at.with_timezone(&Utc) > later + Duration::hours(7));

    let expired = later + Duration::hours(9);
    assert!(accounts.current_at(session_id, expired).await?.is_none());
    assert!(accounts.current(session_id).await?.is_none());

    accounts.logout(session_id).await?;
    Ok(())
}
