use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse file-kind classification derived from a MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Pdf,
    Document,
    Other,
}

const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/msword",
    "application/vnd.ms-excel",
    "application/vnd.ms-powerpoint",
    "application/rtf",
    "application/vnd.oasis.opendocument.text",
    "application/vnd.oasis.opendocument.spreadsheet",
    "application/vnd.oasis.opendocument.presentation",
];

impl FileCategory {
    pub fn from_mime(mime_type: &str) -> Self {
        let mime = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        if mime.starts_with("image/") {
            FileCategory::Image
        } else if mime.starts_with("video/") {
            FileCategory::Video
        } else if mime.starts_with("audio/") {
            FileCategory::Audio
        } else if mime == "application/pdf" {
            FileCategory::Pdf
        } else if mime.starts_with("text/")
            || mime.starts_with("application/vnd.openxmlformats-officedocument.")
            || DOCUMENT_MIME_TYPES.contains(&mime.as_str())
        {
            FileCategory::Document
        } else {
            FileCategory::Other
        }
    }

    /// Name of the configured validation rule that covers this category.
    ///
    /// PDFs are validated by the document rule.
    pub fn rule_key(&self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Video => "video",
            FileCategory::Audio => "audio",
            FileCategory::Pdf | FileCategory::Document => "document",
            FileCategory::Other => "other",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Video => "video",
            FileCategory::Audio => "audio",
            FileCategory::Pdf => "pdf",
            FileCategory::Document => "document",
            FileCategory::Other => "other",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mime() {
        assert_eq!(FileCategory::from_mime("image/png"), FileCategory::Image);
        assert_eq!(FileCategory::from_mime("IMAGE/JPEG"), FileCategory::Image);
        assert_eq!(FileCategory::from_mime("video/mp4"), FileCategory::Video);
        assert_eq!(FileCategory::from_mime("audio/mpeg"), FileCategory::Audio);
        assert_eq!(FileCategory::from_mime("application/pdf"), FileCategory::Pdf);
        assert_eq!(
            FileCategory::from_mime(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            ),
            FileCategory::Document
        );
        assert_eq!(
            FileCategory::from_mime("text/plain; charset=utf-8"),
            FileCategory::Document
        );
        assert_eq!(
            FileCategory::from_mime("application/octet-stream"),
            FileCategory::Other
        );
        assert_eq!(FileCategory::from_mime(""), FileCategory::Other);
    }

    #[test]
    fn test_pdf_uses_document_rule() {
        assert_eq!(FileCategory::Pdf.rule_key(), "document");
        assert_eq!(FileCategory::Pdf.to_string(), "pdf");
    }
}
