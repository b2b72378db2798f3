//! Field checks shared by the employee, registration and admin forms.

use crate::error::ServiceError;

/// Collects every failing rule so a form reports all problems at once.
#[derive(Debug, Default)]
pub(crate) struct Violations(Vec<String>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(&mut self, value: &str, message: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.0.push(message.to_string());
        }
        self
    }

    pub fn present<T>(&mut self, value: &Option<T>, message: &str) -> &mut Self {
        if value.is_none() {
            self.0.push(message.to_string());
        }
        self
    }

    pub fn max_length(&mut self, value: &str, max: usize, message: &str) -> &mut Self {
        if value.trim().chars().count() > max {
            self.0.push(message.to_string());
        }
        self
    }

    pub fn email(&mut self, value: &str, message: &str) -> &mut Self {
        if !value.trim().is_empty() && !is_email(value) {
            self.0.push(message.to_string());
        }
        self
    }

    pub fn check(&mut self, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.0.push(message.to_string());
        }
        self
    }

    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.0)
    }

    pub fn finish(&mut self, message: &str) -> Result<(), ServiceError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::validation(message, std::mem::take(&mut self.0)))
        }
    }
}

pub(crate) fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// One `@` with text on both sides.
pub(crate) fn is_email(value: &str) -> bool {
    let trimmed = value.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !trimmed.contains(char::is_whitespace)
        }
        None => false,
    }
}

pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_violation() {
        let mut violations = Violations::new();
        let err = violations
            .required("", "El documento es requerido")
            .max_length(&"x".repeat(101), 100, "Los nombres no pueden exceder 100 caracteres")
            .email("sin-arroba", "El email no es válido")
            .finish("Datos inválidos")
            .unwrap_err();
        match err {
            ServiceError::Validation { message, errors } => {
                assert_eq!(message, "Datos inválidos");
                assert_eq!(errors.len(), 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn email_shape() {
        assert!(is_email("ana@example.com"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("ana@"));
        assert!(!is_email("ana@@example.com"));
        assert!(!is_email("ana maria@example.com"));
    }

    #[test]
    fn blank_optional_text_becomes_none() {
        assert_eq!(optional_text(Some("   ".into())), None);
        assert_eq!(optional_text(Some(" perfil ".into())), Some("perfil".into()));
    }
}
