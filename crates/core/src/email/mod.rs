//! Email dispatcher.
//!
//! Converts email notifications into outbound mail. Two payload shapes are
//! accepted:
//!
//! - Simple JSON `{"to", "from", "subject", "body"}`, sent as plain text
//! - XML email documents with HTML or text bodies and an optional JPEG,
//!   either embedded (referenced by content id) or attached
//!
//! Recipient lists are validated and invalid addresses dropped. Failures are
//! logged and the message is not retried.

mod dispatcher;
mod message;
mod recipients;
mod transport;
mod types;
mod xml;

pub use dispatcher::{
    prepare_simple, prepare_xml, DispatchOutcome, DispatchReport, EmailDispatcher, EmailKind,
};
pub use message::{build_message, embed_image_tag, ATTACHED_IMAGE_NAME, EMBEDDED_IMAGE_CID};
pub use recipients::{is_valid_address, parse_recipients, validate_recipients};
pub use transport::{Mailer, SmtpMailer};
pub use types::*;
pub use xml::{XmlBody, XmlContent, XmlEmail, XmlHeader, XmlImage};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Invalid JSON email: {0}")]
    InvalidJson(String),

    #[error("Invalid XML email: {0}")]
    InvalidXml(String),

    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("No valid recipients")]
    NoRecipients,

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Mail transport error: {0}")]
    Transport(String),
}
