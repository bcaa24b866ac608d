//! Email delivery for one-time codes.
//!
//! Messages are rendered from Askama templates (plain text + HTML) and handed
//! to a [`Mailer`]. Production uses SMTP via lettre; without SMTP credentials
//! the API falls back to [`LogMailer`], which only logs the message.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use quillpost_core::Email;

use crate::cache::CodePurpose;
use crate::config::SmtpConfig;

/// HTML template for a one-time code.
#[derive(Template)]
#[template(path = "email/verification_code.html")]
struct VerificationCodeEmailHtml<'a> {
    heading: &'a str,
    instructions: &'a str,
    code: &'a str,
    valid_for: &'a str,
}

/// Plain text template for a one-time code.
#[derive(Template)]
#[template(path = "email/verification_code.txt")]
struct VerificationCodeEmailText<'a> {
    heading: &'a str,
    instructions: &'a str,
    code: &'a str,
    valid_for: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: Email,
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl OutgoingEmail {
    /// Render the one-time code email for `purpose`.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Template` if a template fails to render.
    pub fn verification_code(
        to: &Email,
        code: &str,
        purpose: CodePurpose,
        valid_for: &str,
    ) -> Result<Self, EmailError> {
        let (subject, heading, instructions) = match purpose {
            CodePurpose::Register => (
                "Your Quillpost verification code",
                "Confirm your email",
                "Enter this code to finish creating your Quillpost account.",
            ),
            CodePurpose::ForgotPassword => (
                "Your Quillpost password reset code",
                "Reset your password",
                "Enter this code to choose a new password for your Quillpost account.",
            ),
        };

        let html = VerificationCodeEmailHtml {
            heading,
            instructions,
            code,
            valid_for,
        }
        .render()?;
        let text = VerificationCodeEmailText {
            heading,
            instructions,
            code,
            valid_for,
        }
        .render()?;

        Ok(Self {
            to: to.clone(),
            subject: subject.to_owned(),
            text,
            html,
        })
    }
}

/// Delivers rendered messages.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a message or report why it could not be sent.
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError>;
}

/// SMTP delivery over STARTTLS.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Create a new SMTP mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay host cannot be used for STARTTLS.
    pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.sender.clone(),
            config.password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: config.sender.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(email
                .to
                .as_str()
                .parse()
                .map_err(|_| EmailError::InvalidAddress(email.to.to_string()))?)
            .subject(&email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html),
                    ),
            )?;

        self.transport.send(message).await?;

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent successfully");
        Ok(())
    }
}

/// Local dev mailer that logs the message instead of sending it.
#[derive(Clone, Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.text,
            "SMTP not configured, email logged instead of sent"
        );
        Ok(())
    }
}

/// Generate a 6-digit verification code.
#[must_use]
pub fn generate_verification_code() -> String {
    use rand::Rng;
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_verification_code_format() {
        let code = generate_verification_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_verification_code_range() {
        for _ in 0..100 {
            let code: u32 = generate_verification_code().parse().unwrap();
            assert!((100_000..1_000_000).contains(&code));
        }
    }

    #[test]
    fn test_verification_email_contains_code() {
        let to = Email::parse("reader@example.com").unwrap();
        let email =
            OutgoingEmail::verification_code(&to, "482913", CodePurpose::Register, "1 minute")
                .unwrap();

        assert_eq!(email.to, to);
        assert!(email.subject.contains("verification"));
        assert!(email.text.contains("482913"));
        assert!(email.html.contains("482913"));
        assert!(email.text.contains("1 minute"));
    }

    #[test]
    fn test_reset_email_has_distinct_subject() {
        let to = Email::parse("reader@example.com").unwrap();
        let email = OutgoingEmail::verification_code(
            &to,
            "000111",
            CodePurpose::ForgotPassword,
            "1 minute",
        )
        .unwrap();
        assert!(email.subject.contains("password reset"));
    }
}
