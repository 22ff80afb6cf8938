//! MIME message construction.

use lettre::message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart};
use lettre::Message;

use super::{BodyFormat, EmailError, EmailImage, ImagePlacement, OutgoingEmail};

/// Content id the embedded image is referenced by.
pub const EMBEDDED_IMAGE_CID: &str = "embedded_image";
/// File name of an attached image.
pub const ATTACHED_IMAGE_NAME: &str = "image.jpg";

const IMAGE_TAG: &str = "<br/><br/><img src=\"cid:embedded_image\">";

/// Build the MIME message for an email.
///
/// - No image: a single text/plain or text/html part.
/// - Embedded image: multipart/related with an HTML body referencing the image.
/// - Attached image: multipart/mixed with the body and an `image.jpg` attachment.
pub fn build_message(email: &OutgoingEmail) -> Result<Message, EmailError> {
    if email.to.is_empty() {
        return Err(EmailError::NoRecipients);
    }

    let mut builder = Message::builder()
        .from(parse_mailbox(&email.from)?)
        .subject(email.subject.as_str());
    for to in &email.to {
        builder = builder.to(parse_mailbox(to)?);
    }
    for cc in &email.cc {
        builder = builder.cc(parse_mailbox(cc)?);
    }

    let message = match &email.image {
        None => match email.format {
            BodyFormat::Html => builder
                .header(ContentType::TEXT_HTML)
                .body(email.text.clone()),
            BodyFormat::Text => builder
                .header(ContentType::TEXT_PLAIN)
                .body(email.text.clone()),
        },
        Some(image) => builder.multipart(image_multipart(email, image)?),
    };

    message.map_err(|e| EmailError::Build(e.to_string()))
}

fn image_multipart(email: &OutgoingEmail, image: &EmailImage) -> Result<MultiPart, EmailError> {
    let jpeg = ContentType::parse("image/jpeg").map_err(|e| EmailError::Build(e.to_string()))?;

    let multipart = match image.placement {
        ImagePlacement::Embed => MultiPart::related()
            .singlepart(SinglePart::html(embed_image_tag(&email.text, email.format)))
            .singlepart(
                Attachment::new_inline(EMBEDDED_IMAGE_CID.to_string())
                    .body(image.jpeg.clone(), jpeg),
            ),
        ImagePlacement::Attach => {
            let body = match email.format {
                BodyFormat::Html => SinglePart::html(email.text.clone()),
                BodyFormat::Text => SinglePart::plain(email.text.clone()),
            };
            MultiPart::mixed().singlepart(body).singlepart(
                Attachment::new(ATTACHED_IMAGE_NAME.to_string()).body(image.jpeg.clone(), jpeg),
            )
        }
    };

    Ok(multipart)
}

/// HTML body with an `<img>` referencing the embedded image.
///
/// HTML bodies get the tag before their last `</body>` (appended if there is
/// none); plain text is wrapped in a minimal HTML document.
pub fn embed_image_tag(text: &str, format: BodyFormat) -> String {
    match format {
        BodyFormat::Html => match text.rfind("</body>") {
            Some(idx) => format!("{}{}{}", &text[..idx], IMAGE_TAG, &text[idx..]),
            None => format!("{}{}", text, IMAGE_TAG),
        },
        BodyFormat::Text => format!("<html><body>{}{}</body></html>", text, IMAGE_TAG),
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|e| EmailError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}
