//! Bearer tokens for the public employee API.

use chrono::{DateTime, Duration, Utc};
use entity::employee;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const EMPLOYEE_ROLE: &str = "Employee";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_minutes: i64,
    pub issuer: String,
    pub audience: String,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiration_minutes: 60,
            issuer: "TalentoPlus".to_string(),
            audience: "TalentoPlusUsers".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Document number.
    pub sub: String,
    pub email: String,
    pub jti: String,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub first_names: String,
    #[serde(default)]
    pub last_names: String,
    #[serde(default)]
    pub employee_id: i32,
    pub role: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),
}

/// A freshly signed token and the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            config,
        }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    pub fn generate_token(&self, employee: &employee::Model) -> Result<IssuedToken, JwtError> {
        self.generate_token_at(employee, Utc::now())
    }

    /// Signs a token as if issued at `now`.
    pub fn generate_token_at(
        &self,
        employee: &employee::Model,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, JwtError> {
        let expires_at = now + Duration::minutes(self.config.expiration_minutes);
        let claims = Claims {
            sub: employee.document.clone(),
            email: employee.email.clone(),
            jti: Uuid::new_v4().to_string(),
            document: Some(employee.document.clone()),
            first_names: employee.first_names.clone(),
            last_names: employee.last_names.clone(),
            employee_id: employee.id,
            role: EMPLOYEE_ROLE.to_string(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Checks signature, issuer, audience and lifetime with no clock leeway.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.leeway = 0;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                    ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                    _ => JwtError::InvalidToken(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }

    pub fn extract_from_header(header: &str) -> Option<&str> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use entity::{EducationLevel, EmployeeStatus};
    use rust_decimal::Decimal;

    fn employee() -> employee::Model {
        employee::Model {
            id: 7,
            document: "1020304050".into(),
            first_names: "Ana".into(),
            last_names: "Gómez".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            address: "Calle 1".into(),
            phone: "300".into(),
            email: "ana@example.com".into(),
            salary: Decimal::ZERO,
            hire_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            status: EmployeeStatus::Active,
            education_level: EducationLevel::Technician,
            profile: None,
            department_id: 1,
            job_title_id: 3,
            password_hash: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn service(secret: &str) -> JwtService {
        JwtService::new(JwtConfig::new(secret))
    }

    #[test]
    fn issued_token_carries_employee_claims() {
        let jwt = service("a-test-secret-with-enough-length!!");
        let issued = jwt.generate_token(&employee()).unwrap();
        let claims = jwt.validate_token(&issued.token).unwrap();
        assert_eq!(claims.sub, "1020304050");
        assert_eq!(claims.document.as_deref(), Some("1020304050"));
        assert_eq!(claims.employee_id, 7);
        assert_eq!(claims.role, EMPLOYEE_ROLE);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn other_secret_is_rejected() {
        let issued = service("first-secret-first-secret-first!!")
            .generate_token(&employee())
            .unwrap();
        let err = service("second-secret-second-secret-sec!!")
            .validate_token(&issued.token)
            .unwrap_err();
        assert!(matches!(err, JwtError::InvalidSignature));
    }

    #[test]
    fn other_issuer_or_audience_is_rejected() {
        let signer = service("shared-secret-shared-secret-shar!!");
        let issued = signer.generate_token(&employee()).unwrap();

        let mut config = JwtConfig::new("shared-secret-shared-secret-shar!!");
        config.issuer = "Someone".into();
        assert!(JwtService::new(config).validate_token(&issued.token).is_err());

        let mut config = JwtConfig::new("shared-secret-shared-secret-shar!!");
        config.audience = "Others".into();
        assert!(JwtService::new(config).validate_token(&issued.token).is_err());
    }

    #[test]
    fn expired_token_has_no_grace() {
        let jwt = service("expiry-secret-expiry-secret-expi!!");
        let issued_at = Utc::now() - Duration::minutes(61);
        let issued = jwt.generate_token_at(&employee(), issued_at).unwrap();
        assert!(matches!(
            jwt.validate_token(&issued.token),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
        assert_eq!(JwtService::extract_from_header("Bearer "), None);
    }
}
