use anyhow::{Context, Result, anyhow};
use axum_extra::extract::cookie::Key;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use products_hr::{AiSettings, JwtConfig, SmtpSettings};

/// Signing plus encryption material for the private cookie jar.
const KEY_LEN: usize = 64;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub cookie_key: Key,
    pub cors_allowed_origins: Vec<String>,
    pub jwt: JwtConfig,
    pub smtp: SmtpSettings,
    pub ai: AiSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| anyhow!("missing env {}", key));

        let cookie_secret = required("COOKIE_SECRET_BASE64")?;
        let secret_bytes = STANDARD
            .decode(cookie_secret.trim())
            .context("invalid COOKIE_SECRET_BASE64")?;
        if secret_bytes.len() < KEY_LEN {
            return Err(anyhow!(
                "COOKIE_SECRET_BASE64 must decode to at least {KEY_LEN} bytes"
            ));
        }
        let cookie_key = Key::try_from(&secret_bytes[..KEY_LEN])
            .map_err(|err| anyhow!("invalid COOKIE_SECRET_BASE64: {err}"))?;

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        let mut jwt = JwtConfig::new(required("JWT_SECRET")?);
        if let Some(issuer) = get("JWT_ISSUER") {
            jwt.issuer = issuer;
        }
        if let Some(audience) = get("JWT_AUDIENCE") {
            jwt.audience = audience;
        }
        if let Some(raw) = get("JWT_EXPIRATION_MINUTES") {
            jwt.expiration_minutes = raw
                .trim()
                .parse()
                .with_context(|| format!("invalid JWT_EXPIRATION_MINUTES {raw}"))?;
        }

        let mut smtp = SmtpSettings::default();
        if let Some(host) = get("SMTP_HOST") {
            smtp.host = host;
        }
        if let Some(raw) = get("SMTP_PORT") {
            smtp.port = raw
                .trim()
                .parse()
                .with_context(|| format!("invalid SMTP_PORT {raw}"))?;
        }
        smtp.user = get("SMTP_USER").unwrap_or_default();
        smtp.password = get("SMTP_PASSWORD").unwrap_or_default();
        smtp.from_email = get("SMTP_FROM_EMAIL").unwrap_or_default();
        if let Some(name) = get("SMTP_FROM_NAME") {
            smtp.from_name = name;
        }

        let mut ai = AiSettings::new(get("AI_API_KEY").unwrap_or_default());
        if let Some(model) = get("AI_MODEL") {
            ai.model = model;
        }

        Ok(Self {
            cookie_key,
            cors_allowed_origins,
            jwt,
            smtp,
            ai,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SECRET_B64: &str = "MDEyMzQ1Njc4OTAxMjM0NTY3ODkwMTIzNDU2Nzg5MDEyMzQ1Njc4OTAxMjM0NTY3ODkwMTIzNDU2Nzg5MDEyMw==";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_fill_optional_keys() {
        let config = AppConfig::from_lookup(lookup(&[
            ("COOKIE_SECRET_BASE64", SECRET_B64),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.cors_allowed_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.jwt.issuer, "TalentoPlus");
        assert_eq!(config.jwt.audience, "TalentoPlusUsers");
        assert_eq!(config.jwt.expiration_minutes, 60);
        assert_eq!(config.smtp.host, "smtp.gmail.com");
        assert_eq!(config.smtp.port, 587);
        assert!(!config.smtp.has_credentials());
        assert_eq!(config.ai.model, "gemini-2.0-flash");
        assert!(config.ai.api_key.is_empty());
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup(&[
            ("COOKIE_SECRET_BASE64", SECRET_B64),
            ("JWT_SECRET", "s3cret"),
            ("JWT_EXPIRATION_MINUTES", "15"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
            ("SMTP_PORT", "2525"),
            ("AI_MODEL", "gemini-pro"),
        ]))
        .unwrap();
        assert_eq!(config.jwt.expiration_minutes, 15);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.smtp.port, 2525);
        assert_eq!(config.ai.model, "gemini-pro");
    }

    #[test]
    fn secrets_are_required() {
        assert!(AppConfig::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("COOKIE_SECRET_BASE64", SECRET_B64)])).is_err());
    }

    #[test]
    fn short_cookie_secret_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("COOKIE_SECRET_BASE64", "c2hvcnQ="),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("at least 64 bytes"));
    }

    #[test]
    fn thirty_two_byte_cookie_secret_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[
            (
                "COOKIE_SECRET_BASE64",
                "MDEyMzQ1Njc4OTAxMjM0NTY3ODkwMTIzNDU2Nzg5MDE=",
            ),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("at least 64 bytes"));
    }

    #[test]
    fn longer_cookie_secret_uses_its_prefix() {
        let mut bytes = STANDARD.decode(SECRET_B64).unwrap();
        bytes.extend_from_slice(b"trailing");
        let encoded = STANDARD.encode(&bytes);
        let config = AppConfig::from_lookup(lookup(&[
            ("COOKIE_SECRET_BASE64", encoded.as_str()),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();
        let expected = Key::from(&bytes[..KEY_LEN]);
        assert_eq!(config.cookie_key.master(), expected.master());
    }
}
