//! Turns email notifications into sent messages.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::metrics;

use super::{
    build_message, parse_recipients, BodyFormat, EmailError, Mailer, OutgoingEmail, SimpleEmail,
    XmlEmail,
};

/// Payload flavour of an email notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    /// JSON object with to/from/subject/body.
    Simple,
    /// Structured XML email document.
    Xml,
}

impl EmailKind {
    /// A body that parses as a JSON object is a simple email; anything else is XML.
    pub fn detect(body: &str) -> Self {
        match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(body) {
            Ok(_) => EmailKind::Simple,
            Err(_) => EmailKind::Xml,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmailKind::Simple => "simple",
            EmailKind::Xml => "xml",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Sent { recipients: usize },
    /// Every `to` address was invalid; nothing was sent.
    NoRecipients,
    /// Parsing, building or sending failed; the message was dropped.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchReport {
    pub kind: EmailKind,
    pub outcome: DispatchOutcome,
}

/// Email dispatcher. Failures are logged and reported, never retried.
pub struct EmailDispatcher {
    mailer: Arc<dyn Mailer>,
}

impl EmailDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    pub async fn dispatch(&self, body: &str) -> DispatchReport {
        let kind = EmailKind::detect(body);
        debug!(kind = kind.as_str(), "Processing email notification");

        let outcome = match self.try_dispatch(kind, body).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(kind = kind.as_str(), error = %e, "Failed to send email");
                DispatchOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let result = match &outcome {
            DispatchOutcome::Sent { .. } => "sent",
            DispatchOutcome::NoRecipients => "skipped",
            DispatchOutcome::Failed { .. } => "failed",
        };
        metrics::EMAILS_TOTAL
            .with_label_values(&[kind.as_str(), result])
            .inc();

        DispatchReport { kind, outcome }
    }

    async fn try_dispatch(
        &self,
        kind: EmailKind,
        body: &str,
    ) -> Result<DispatchOutcome, EmailError> {
        let email = match kind {
            EmailKind::Simple => prepare_simple(body)?,
            EmailKind::Xml => prepare_xml(body)?,
        };

        if email.to.is_empty() {
            info!(subject = %email.subject, "No valid recipients, not sending");
            return Ok(DispatchOutcome::NoRecipients);
        }

        let recipients = email.to.len() + email.cc.len();
        let message = build_message(&email)?;
        self.mailer.send(message).await?;

        info!(
            to = %email.to.join(","),
            subject = %email.subject,
            "Message sent"
        );
        Ok(DispatchOutcome::Sent { recipients })
    }
}

/// Plain-text email from a simple JSON request.
pub fn prepare_simple(body: &str) -> Result<OutgoingEmail, EmailError> {
    let simple: SimpleEmail =
        serde_json::from_str(body).map_err(|e| EmailError::InvalidJson(e.to_string()))?;

    Ok(OutgoingEmail {
        from: simple.from.trim().to_string(),
        to: parse_recipients(&simple.to),
        cc: Vec::new(),
        subject: simple.subject.trim().to_string(),
        format: BodyFormat::Text,
        text: simple.body,
        image: None,
    })
}

/// Email from an XML document, including its image if present.
pub fn prepare_xml(body: &str) -> Result<OutgoingEmail, EmailError> {
    let xml = XmlEmail::parse(body)?;
    let image = xml.image()?;
    let format = xml.format();

    Ok(OutgoingEmail {
        from: xml.header.from.trim().to_string(),
        to: parse_recipients(&xml.header.to),
        cc: xml
            .header
            .cc
            .as_deref()
            .map(parse_recipients)
            .unwrap_or_default(),
        subject: xml.header.subject.trim().to_string(),
        format,
        text: xml.content.body.text,
        image,
    })
}
