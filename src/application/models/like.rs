use crate::application::models::artifact::ArtifactId;
use serde::{Deserialize, Serialize};

/// Body of a successful `POST /like/{id}`. The server decides the resulting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggleResponse {
    pub liked: bool,
}

/// Confirmed result of a like toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeOutcome {
    pub artifact_id: ArtifactId,
    pub liked: bool,
    /// `None` when no count for the artifact had been loaded before the toggle.
    pub like_count: Option<u64>,
}

/// One entry of `GET /liked`: a full record or just an id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum LikedEntry {
    Record {
        #[serde(rename = "_id")]
        id: ArtifactId,
    },
    Id(ArtifactId),
}

impl LikedEntry {
    pub(crate) fn into_id(self) -> ArtifactId {
        match self {
            LikedEntry::Record { id } | LikedEntry::Id(id) => id,
        }
    }
}

/// Count after a confirmed toggle: one up on like, one down on unlike, never below zero.
pub fn next_like_count(previous: u64, liked: bool) -> u64 {
    if liked {
        previous.saturating_add(1)
    } else {
        previous.saturating_sub(1)
    }
}
