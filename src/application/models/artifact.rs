use crate::application::models::like::{next_like_count, LikeOutcome};
use crate::error::ValidationErrors;
use crate::presentation::serialization::{lenient_datetime, like_count, object_id};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Fields the server owns; never sent back on update.
const SERVER_OWNED_FIELDS: [&str; 5] = ["_id", "likes", "adderEmail", "adderName", "createdAt"];

static IMAGE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://.+\.(jpg|jpeg|png|webp|avif|gif|svg)$")
        .unwrap_or_else(|e| panic!("invalid image url pattern: {e}"))
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ArtifactId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        object_id(deserializer).map(ArtifactId)
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArtifactId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ArtifactId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Artifact record as served by the API. Fields not modelled here are kept in
/// `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "_id")]
    pub id: ArtifactId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "like_count")]
    pub likes: u64,
    #[serde(rename = "adderName", default, skip_serializing_if = "Option::is_none")]
    pub adder_name: Option<String>,
    #[serde(rename = "adderEmail", default, skip_serializing_if = "Option::is_none")]
    pub adder_email: Option<String>,
    #[serde(
        rename = "createdAt",
        default,
        deserialize_with = "lenient_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Artifact {
    /// Mirrors a confirmed toggle into a copy held by a view. Without a known
    /// count the copy's own count is stepped instead.
    pub fn apply_like(&mut self, outcome: &LikeOutcome) {
        if outcome.artifact_id == self.id {
            self.likes = outcome
                .like_count
                .unwrap_or_else(|| next_like_count(self.likes, outcome.liked));
        }
    }

    pub fn is_owned_by(&self, email: &str) -> bool {
        self.adder_email
            .as_deref()
            .is_some_and(|owner| owner.eq_ignore_ascii_case(email))
    }

    /// Body for `PUT /artifacts/{id}`: every field except the server-owned ones.
    pub fn update_body(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let mut body = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for field in SERVER_OWNED_FIELDS {
            body.remove(field);
        }
        Ok(body)
    }
}

/// Artifact submitted through the "add artifact" form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArtifact {
    pub name: String,
    pub image: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub historical_context: String,
    pub description: String,
    pub historical_creation_date: String,
    pub discovered_at: String,
    pub discovered_by: String,
    pub present_location: String,
}

impl Default for NewArtifact {
    fn default() -> Self {
        Self {
            name: String::new(),
            image: String::new(),
            artifact_type: "Tools".to_string(),
            historical_context: String::new(),
            description: String::new(),
            historical_creation_date: String::new(),
            discovered_at: String::new(),
            discovered_by: String::new(),
            present_location: String::new(),
        }
    }
}

impl NewArtifact {
    /// Checks every required field and the image URL, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let required = [
            ("name", &self.name, "Artifact Name is required."),
            ("type", &self.artifact_type, "Artifact Type is required."),
            (
                "historicalContext",
                &self.historical_context,
                "Historical Context is required.",
            ),
            ("description", &self.description, "Short Description is required."),
            (
                "historicalCreationDate",
                &self.historical_creation_date,
                "Creation Date is required.",
            ),
            ("discoveredAt", &self.discovered_at, "Discovery Date is required."),
            ("discoveredBy", &self.discovered_by, "Discoverer's Name is required."),
            (
                "presentLocation",
                &self.present_location,
                "Present Location is required.",
            ),
        ];
        for (field, value, message) in required {
            if value.trim().is_empty() {
                errors.add(field, message);
            }
        }

        let image = self.image.trim();
        if image.is_empty() {
            errors.add("image", "Image URL is required.");
        } else if !IMAGE_URL.is_match(image) {
            errors.add("image", "Please enter a valid image URL.");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// `POST /artifacts` body: the submitted fields plus who added them.
#[derive(Debug, Serialize)]
pub(crate) struct NewArtifactRequest<'a> {
    #[serde(flatten)]
    pub(crate) artifact: &'a NewArtifact,
    #[serde(rename = "adderName")]
    pub(crate) adder_name: &'a str,
    #[serde(rename = "adderEmail")]
    pub(crate) adder_email: &'a str,
}
