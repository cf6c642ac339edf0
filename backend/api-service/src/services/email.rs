/// Outgoing mail (SMTP through lettre, or no-op when unconfigured)
use crate::config::EmailConfig;
use crate::error::{AppError, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct EmailService {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
    app_link: String,
}

impl EmailService {
    /// Build the mailer; an empty SMTP host selects no-op mode.
    pub fn new(config: &EmailConfig, app_link: &str) -> Result<Self> {
        let from = config
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| AppError::Internal(format!("Invalid MAIL_FROM address: {}", e)))?;

        let transport = if config.smtp_host.trim().is_empty() {
            warn!("MAIL_SERVER not configured; email service will operate in no-op mode");
            None
        } else {
            let builder = if config.use_starttls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            }
            .map_err(|e| AppError::Internal(format!("Failed to configure SMTP transport: {}", e)))?
            .port(config.smtp_port);

            let builder = if config.smtp_username.is_empty() {
                builder
            } else {
                builder.credentials(Credentials::new(
                    config.smtp_username.clone(),
                    config.smtp_password.clone(),
                ))
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self {
            transport,
            from,
            app_link: app_link.to_string(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    pub async fn send_welcome_email(&self, recipient: &str, full_name: &str) -> Result<()> {
        let subject = "Welcome to Campus Crush";
        let body = welcome_body(full_name, &self.app_link);
        self.send_mail(recipient, subject, &body).await
    }

    async fn send_mail(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        let Some(transport) = &self.transport else {
            info!(
                subject,
                recipient, "Email service running in no-op mode; skipping actual send"
            );
            return Ok(());
        };

        let to = recipient
            .parse::<Mailbox>()
            .map_err(|e| AppError::Internal(format!("Invalid recipient email address: {}", e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to build email message: {}", e)))?;

        transport
            .send(email)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;
        info!(subject, "email sent successfully");
        Ok(())
    }
}

fn welcome_body(full_name: &str, app_link: &str) -> String {
    format!(
        "Hi {},\n\nWelcome to Campus Crush! Your account is ready.\n\
         Open the app to finish your profile and find your classmates:\n{}\n\n\
         If you did not sign up, you can ignore this email.",
        full_name, app_link
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str) -> EmailConfig {
        EmailConfig {
            smtp_host: host.to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: "Campus Crush <noreply@campuscrush.app>".to_string(),
            use_starttls: true,
        }
    }

    #[tokio::test]
    async fn test_noop_mode_sends_nothing() {
        let service = EmailService::new(&config(""), "campuscrush://").unwrap();
        assert!(!service.is_enabled());
        service
            .send_welcome_email("ada@uni.edu", "Ada")
            .await
            .unwrap();
    }

    #[test]
    fn test_rejects_invalid_from_address() {
        let mut bad = config("");
        bad.from_address = "not an address".to_string();
        assert!(EmailService::new(&bad, "campuscrush://").is_err());
    }

    #[test]
    fn test_welcome_body_mentions_name_and_link() {
        let body = welcome_body("Ada", "campuscrush://home");
        assert!(body.starts_with("Hi Ada,"));
        assert!(body.contains("campuscrush://home"));
    }
}
