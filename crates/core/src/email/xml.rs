//! XML email documents.
//!
//! ```xml
//! <email>
//!   <header>
//!     <from>nics@example.org</from>
//!     <to>a@example.org, b@example.org</to>
//!     <cc>c@example.org</cc>
//!     <subject>Incident report</subject>
//!   </header>
//!   <content>
//!     <body><format>HTML</format><text>&lt;html&gt;...&lt;/html&gt;</text></body>
//!     <image><location>embed</location><JPEGPicture>base64...</JPEGPicture></image>
//!   </content>
//! </email>
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

use super::{BodyFormat, EmailError, EmailImage, ImagePlacement};

#[derive(Debug, Clone, Deserialize)]
pub struct XmlEmail {
    pub header: XmlHeader,
    pub content: XmlContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct XmlHeader {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub cc: Option<String>,
    #[serde(default)]
    pub subject: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct XmlContent {
    pub body: XmlBody,
    #[serde(default)]
    pub image: Option<XmlImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct XmlBody {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct XmlImage {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "JPEGPicture", default)]
    pub jpeg_picture: Option<String>,
}

impl XmlEmail {
    pub fn parse(xml: &str) -> Result<Self, EmailError> {
        quick_xml::de::from_str(xml).map_err(|e| EmailError::InvalidXml(e.to_string()))
    }

    pub fn format(&self) -> BodyFormat {
        BodyFormat::from_xml(self.content.body.format.as_deref())
    }

    /// The image to send, if the document has both a location and picture data.
    pub fn image(&self) -> Result<Option<EmailImage>, EmailError> {
        let Some(image) = &self.content.image else {
            return Ok(None);
        };
        let location = image.location.as_deref().map(str::trim).unwrap_or("");
        let picture = image.jpeg_picture.as_deref().unwrap_or("");
        if location.is_empty() || picture.trim().is_empty() {
            return Ok(None);
        }

        // Encoders wrap base64 across lines
        let compact: String = picture.chars().filter(|c| !c.is_whitespace()).collect();
        let jpeg = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| EmailError::InvalidImage(e.to_string()))?;

        Ok(Some(EmailImage {
            placement: ImagePlacement::from_location(location),
            jpeg,
        }))
    }
}
