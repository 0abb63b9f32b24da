use serde::Deserialize;

use crate::domain::entities::ImageDescriptor;

/// One element of the catalog listing. Other fields are ignored.
#[derive(Debug, Deserialize)]
pub struct ImageRecord {
    /// Catalog identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Absolute URL of the raw image bytes.
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Why a catalog record was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordRejection {
    /// The element could not be read as a record at all.
    NotAnObject(String),
    /// `id` absent or blank.
    MissingId,
    /// `download_url` absent or blank.
    MissingUrl,
    /// `download_url` is not an absolute URL.
    RelativeUrl(String),
}

impl std::fmt::Display for RecordRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject(reason) => write!(f, "unreadable record: {reason}"),
            Self::MissingId => write!(f, "missing id"),
            Self::MissingUrl => write!(f, "missing download_url"),
            Self::RelativeUrl(url) => write!(f, "download_url is not absolute: {url}"),
        }
    }
}

impl TryFrom<serde_json::Value> for ImageRecord {
    type Error = RecordRejection;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value).map_err(|e| RecordRejection::NotAnObject(e.to_string()))
    }
}

impl TryFrom<ImageRecord> for ImageDescriptor {
    type Error = RecordRejection;

    fn try_from(record: ImageRecord) -> Result<Self, Self::Error> {
        let id = record
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or(RecordRejection::MissingId)?;
        let url = record
            .download_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(RecordRejection::MissingUrl)?;

        if reqwest::Url::parse(&url).is_err() {
            return Err(RecordRejection::RelativeUrl(url));
        }

        Ok(Self::new(id, url))
    }
}
