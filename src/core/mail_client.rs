// src/core/mail_client.rs
//! Transactional email through a Brevo-style HTTP API

use anyhow::Result;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::app_log;
use crate::core::config_manager::MailSettings;
use crate::core::ServiceClient;
use crate::lifecycle::ApplicationStatus;

const SEND_ENDPOINT: &str = "/smtp/email";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailOutcome {
    Sent,
    /// No API key configured; the mail was only logged.
    Skipped,
}

#[derive(Serialize)]
struct Contact<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendPayload<'a> {
    sender: Contact<'a>,
    to: Vec<Contact<'a>>,
    subject: &'a str,
    html_content: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    message_id: Option<String>,
}

pub struct MailClient {
    client: Option<ServiceClient>,
    sender_name: String,
    sender_email: String,
}

impl MailClient {
    pub fn new(settings: &MailSettings) -> Result<Self> {
        let client = match settings.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(api_key) => {
                let mut headers = HeaderMap::new();
                let (name, value) = ServiceClient::header("api-key", api_key)?;
                headers.insert(name, value);
                Some(ServiceClient::new(
                    &settings.base_url,
                    settings.timeout_seconds,
                    headers,
                )?)
            }
            None => {
                app_log!(warn, "Mail API key not configured, outgoing mail will only be logged");
                None
            }
        };

        Ok(Self {
            client,
            sender_name: settings.sender_name.clone(),
            sender_email: settings.sender_email.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub async fn send(&self, mail: &OutgoingMail) -> Result<MailOutcome> {
        let Some(client) = &self.client else {
            app_log!(
                info,
                "Mail disabled, would send '{}' to {}",
                mail.subject,
                mail.to_email
            );
            return Ok(MailOutcome::Skipped);
        };

        let payload = SendPayload {
            sender: Contact {
                email: &self.sender_email,
                name: &self.sender_name,
            },
            to: vec![Contact {
                email: &mail.to_email,
                name: &mail.to_name,
            }],
            subject: &mail.subject,
            html_content: &mail.html,
        };

        let response: SendResponse = client.post_json(SEND_ENDPOINT, &payload).await?;
        app_log!(
            info,
            "Sent '{}' to {} (message id: {})",
            mail.subject,
            mail.to_email,
            response.message_id.as_deref().unwrap_or("none")
        );
        Ok(MailOutcome::Sent)
    }
}

impl OutgoingMail {
    pub fn verification(to_email: &str, to_name: &str, verify_url: &str) -> Self {
        Self {
            to_email: to_email.to_string(),
            to_name: to_name.to_string(),
            subject: "Verify your email address".to_string(),
            html: format!(
                r#"<p>Hi {name},</p>
<p>Thanks for registering. Please confirm your email address by opening the link below:</p>
<p><a href="{url}">{url}</a></p>
<p>If you did not create an account you can ignore this message.</p>"#,
                name = escape_html(to_name),
                url = verify_url,
            ),
        }
    }

    pub fn status_update(
        to_email: &str,
        to_name: &str,
        job_title: &str,
        status: ApplicationStatus,
        meeting_link: Option<&str>,
    ) -> Self {
        let name = escape_html(to_name);
        let title = escape_html(job_title);
        let body = match status {
            ApplicationStatus::Shortlisted => {
                let meeting = meeting_link
                    .map(|link| {
                        format!(
                            r#"<p>Your interview meeting link: <a href="{0}">{0}</a></p>"#,
                            link
                        )
                    })
                    .unwrap_or_else(|| {
                        "<p>We will contact you shortly with interview details.</p>".to_string()
                    });
                format!(
                    "<p>Good news! You have been shortlisted for <b>{}</b>.</p>{}",
                    title, meeting
                )
            }
            ApplicationStatus::Interviewed => format!(
                "<p>Thank you for interviewing for <b>{}</b>. We will let you know the outcome soon.</p>",
                title
            ),
            ApplicationStatus::Selected => format!(
                "<p>Congratulations! You have been selected for <b>{}</b>.</p>",
                title
            ),
            ApplicationStatus::Rejected => format!(
                "<p>Thank you for your interest in <b>{}</b>. Unfortunately we will not be moving forward with your application.</p>",
                title
            ),
            ApplicationStatus::Applied => format!(
                "<p>Your application for <b>{}</b> has been received.</p>",
                title
            ),
        };

        Self {
            to_email: to_email.to_string(),
            to_name: to_name.to_string(),
            subject: format!("Application update: {}", job_title),
            html: format!("<p>Hi {},</p>{}", name, body),
        }
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_client_skips() {
        let client = MailClient::new(&MailSettings::default()).unwrap();
        assert!(!client.is_enabled());

        let mail = OutgoingMail::verification("a@b.io", "Ann", "http://x/verify?token=t");
        assert_eq!(client.send(&mail).await.unwrap(), MailOutcome::Skipped);
    }

    #[test]
    fn test_status_update_mentions_meeting_link() {
        let mail = OutgoingMail::status_update(
            "a@b.io",
            "Ann",
            "Backend <Dev>",
            ApplicationStatus::Shortlisted,
            Some("https://meet.example.com/abc"),
        );
        assert_eq!(mail.subject, "Application update: Backend <Dev>");
        assert!(mail.html.contains("https://meet.example.com/abc"));
        assert!(mail.html.contains("Backend &lt;Dev&gt;"));
    }

    #[test]
    fn test_payload_uses_camel_case() {
        let payload = SendPayload {
            sender: Contact {
                email: "s@x.io",
                name: "S",
            },
            to: vec![],
            subject: "hi",
            html_content: "<p>x</p>",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["htmlContent"], "<p>x</p>");
    }
}
