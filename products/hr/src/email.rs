use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::{error, info, warn};

pub const WELCOME_SUBJECT: &str = "¡Bienvenido a TalentoPlus S.A.S.!";

#[derive(Clone, Debug)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            user: String::new(),
            password: String::new(),
            from_email: String::new(),
            from_name: "TalentoPlus RRHH".to_string(),
        }
    }
}

impl SmtpSettings {
    pub fn has_credentials(&self) -> bool {
        !self.user.is_empty() && !self.password.is_empty()
    }
}

/// Outbound HTML mail over STARTTLS. Failures are logged, never raised.
#[derive(Clone, Debug)]
pub struct EmailSender {
    settings: SmtpSettings,
}

impl EmailSender {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    pub async fn send_welcome(&self, to: &str, full_name: &str) -> bool {
        self.send_html(to, WELCOME_SUBJECT, &welcome_html(full_name))
            .await
    }

    pub async fn send_html(&self, to: &str, subject: &str, html: &str) -> bool {
        if !self.settings.has_credentials() {
            warn!(to, "smtp credentials missing, email not sent");
            return false;
        }
        let message = match self.build_message(to, subject, html) {
            Ok(message) => message,
            Err(err) => {
                error!(to, error = %err, "could not build email");
                return false;
            }
        };
        let transport = match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(
            &self.settings.host,
        ) {
            Ok(builder) => builder
                .port(self.settings.port)
                .credentials(Credentials::new(
                    self.settings.user.clone(),
                    self.settings.password.clone(),
                ))
                .build(),
            Err(err) => {
                error!(host = %self.settings.host, error = %err, "smtp relay unavailable");
                return false;
            }
        };
        match transport.send(message).await {
            Ok(_) => {
                info!(to, "email sent");
                true
            }
            Err(err) => {
                error!(to, error = %err, "email delivery failed");
                false
            }
        }
    }

    fn build_message(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<Message> {
        let from = Mailbox::new(
            Some(self.settings.from_name.clone()),
            self.settings.from_email.parse()?,
        );
        let recipient = Mailbox::new(Some(to.to_string()), to.parse()?);
        let message = Message::builder()
            .from(from)
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())?;
        Ok(message)
    }
}

pub fn welcome_html(full_name: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background: #5a67d8; color: white; padding: 30px; text-align: center; border-radius: 10px 10px 0 0; }}
        .content {{ background: #f9f9f9; padding: 30px; border-radius: 0 0 10px 10px; }}
        .footer {{ text-align: center; margin-top: 20px; color: #666; font-size: 12px; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>¡Bienvenido a TalentoPlus!</h1>
        </div>
        <div class="content">
            <h2>Hola {name},</h2>
            <p>Tu registro en el sistema de gestión de empleados de <strong>TalentoPlus S.A.S.</strong> se completó correctamente.</p>
            <p>Tu cuenta está pendiente de revisión por parte del administrador de Recursos Humanos.</p>
            <p>Cuando tu cuenta sea activada podrás ingresar con tu documento de identidad y tu correo electrónico.</p>
            <h3>Próximos pasos:</h3>
            <ul>
                <li>Espera la confirmación de activación de tu cuenta</li>
                <li>Inicia sesión en la plataforma una vez esté activa</li>
                <li>Consulta tu información y descarga tu hoja de vida</li>
            </ul>
            <p>Si tienes preguntas, contacta al departamento de Recursos Humanos.</p>
        </div>
        <div class="footer">
            <p>Este correo fue enviado automáticamente por TalentoPlus S.A.S.</p>
            <p>Por favor no respondas a este correo.</p>
        </div>
    </div>
</body>
</html>"#,
        name = escape_html(full_name)
    )
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_greets_by_name() {
        let html = welcome_html("Ana Gómez");
        assert!(html.contains("Hola Ana Gómez,"));
        assert!(html.contains("pendiente de revisión"));
    }

    #[test]
    fn names_are_escaped() {
        assert!(welcome_html("<b>Ana</b>").contains("Hola &lt;b&gt;Ana&lt;/b&gt;,"));
    }

    #[tokio::test]
    async fn missing_credentials_skip_sending() {
        let sender = EmailSender::new(SmtpSettings::default());
        assert!(!sender.send_welcome("ana@example.com", "Ana").await);
    }
}
