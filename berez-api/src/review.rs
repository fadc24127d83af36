//! Reviews, photos and the opaque submission payloads.
//!
//! The engine only reads `general_rating` and `fountain_id` from a review;
//! the rest is carried for display and for the submission endpoints.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ApiError, Result};
use crate::fountain::FountainType;

/// Largest photo the backend accepts.
pub const MAX_PHOTO_SIZE: u64 = 10 * 1024 * 1024;

/// Extension to MIME type for the image formats the backend accepts.
pub const ALLOWED_IMAGE_TYPES: [(&str, &str); 5] = [
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
];

/// A stored review, as returned by `GET /reviews/{fountain_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub fountain_id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub creation_date: Option<NaiveDateTime>,
    pub general_rating: u8,
    #[serde(default)]
    pub temp_rating: Option<u8>,
    #[serde(default)]
    pub stream_rating: Option<u8>,
    #[serde(default)]
    pub quenching_rating: Option<u8>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub photos: Vec<i64>,
}

fn nullable_vec<'de, D>(deserializer: D) -> std::result::Result<Vec<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<i64>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response envelope of `POST /review`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReviewEnvelope {
    pub review: Review,
}

fn check_rating(value: u8) -> Result<u8> {
    if (1..=5).contains(&value) {
        Ok(value)
    } else {
        Err(ApiError::InvalidRating(value))
    }
}

/// Sub-ratings are optional: 0 means "not rated".
fn optional_rating(value: u8) -> Result<Option<u8>> {
    match value {
        0 => Ok(None),
        v => check_rating(v).map(Some),
    }
}

/// Outgoing payload of `POST /review`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewCreate {
    pub fountain_id: i64,
    pub general_rating: u8,
    pub temp_rating: Option<u8>,
    pub stream_rating: Option<u8>,
    pub quenching_rating: Option<u8>,
    pub description: Option<String>,
    pub photos: Option<Vec<i64>>,
}

impl ReviewCreate {
    /// Start a review; the general rating is mandatory and must be 1 to 5.
    pub fn new(fountain_id: i64, general_rating: u8) -> Result<Self> {
        Ok(Self {
            fountain_id,
            general_rating: check_rating(general_rating)?,
            temp_rating: None,
            stream_rating: None,
            quenching_rating: None,
            description: None,
            photos: None,
        })
    }

    pub fn with_sub_ratings(mut self, temp: u8, stream: u8, quenching: u8) -> Result<Self> {
        self.temp_rating = optional_rating(temp)?;
        self.stream_rating = optional_rating(stream)?;
        self.quenching_rating = optional_rating(quenching)?;
        Ok(self)
    }

    pub fn with_description(mut self, description: &str) -> Self {
        let trimmed = description.trim();
        self.description = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn with_photos(mut self, photos: Vec<i64>) -> Self {
        self.photos = (!photos.is_empty()).then_some(photos);
        self
    }
}

/// A photo attached to a fountain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: i64,
    pub url: String,
    #[serde(default)]
    pub fountain_id: Option<i64>,
}

/// Response of `POST /photos/upload`. `url` is relative to the API base.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhotoUpload {
    pub photo_id: i64,
    pub url: String,
}

/// Check a photo before uploading it and return its MIME type.
pub fn validate_photo(file_name: &str, size: u64) -> Result<&'static str> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    let mime = ALLOWED_IMAGE_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .ok_or_else(|| ApiError::Invalid(format!("{} is not an image", file_name)))?;
    if size > MAX_PHOTO_SIZE {
        return Err(ApiError::Invalid(format!(
            "{} is {} bytes; photos must be at most 10MB",
            file_name, size
        )));
    }
    Ok(mime)
}

/// What is wrong with a fountain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Broken,
    Missing,
    IncorrectLocation,
    Other,
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReportType::Broken => "broken",
            ReportType::Missing => "missing",
            ReportType::IncorrectLocation => "incorrect_location",
            ReportType::Other => "other",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "broken" => Ok(ReportType::Broken),
            "missing" => Ok(ReportType::Missing),
            "incorrect_location" => Ok(ReportType::IncorrectLocation),
            "other" => Ok(ReportType::Other),
            other => Err(format!("unknown report type: {}", other)),
        }
    }
}

/// Payload of `POST /fountains/report`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FountainReport {
    pub fountain_id: i64,
    pub report_type: ReportType,
    pub description: Option<String>,
}

/// Payload of `POST /fountains/submit`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FountainSubmission {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub dog_friendly: bool,
    pub bottle_refill: bool,
    #[serde(rename = "type")]
    pub fountain_type: FountainType,
    pub description: Option<String>,
}

impl FountainSubmission {
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(ApiError::Invalid("address is required".to_string()));
        }
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude)
        {
            return Err(ApiError::Invalid(format!(
                "coordinates out of range: {}, {}",
                self.latitude, self.longitude
            )));
        }
        Ok(())
    }
}
