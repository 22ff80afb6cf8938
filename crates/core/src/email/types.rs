use serde::{Deserialize, Deserializer, Serialize};

/// Simple JSON email request: `{"to", "from", "subject", "body"}`.
///
/// `to` may be a string (one or more comma-separated addresses) or an
/// array of strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimpleEmail {
    #[serde(deserialize_with = "string_or_list")]
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

fn string_or_list<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => s,
        StringOrList::Many(list) => list.join(","),
    })
}

/// Body format of an XML email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    Html,
    Text,
}

impl BodyFormat {
    /// `HTML` (any case) is HTML; anything else, including no format, is plain text.
    pub fn from_xml(format: Option<&str>) -> Self {
        match format {
            Some(f) if f.trim().eq_ignore_ascii_case("html") => BodyFormat::Html,
            _ => BodyFormat::Text,
        }
    }
}

/// How an image travels with the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImagePlacement {
    /// Inline, referenced from the HTML body by content id.
    Embed,
    /// Regular attachment.
    Attach,
}

impl ImagePlacement {
    pub fn from_location(location: &str) -> Self {
        if location.trim() == "embed" {
            ImagePlacement::Embed
        } else {
            ImagePlacement::Attach
        }
    }
}

/// A JPEG image carried by an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailImage {
    pub placement: ImagePlacement,
    pub jpeg: Vec<u8>,
}

/// A validated email ready to be turned into a MIME message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub format: BodyFormat,
    pub text: String,
    pub image: Option<EmailImage>,
}
