use serde::{Deserialize, Serialize};

/// A channel video as shown in the videos carousel.
///
/// Serialized in camelCase to match what the carousel consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelVideo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub published_at: String,
    /// Human form, e.g. `3m 12s`; empty when the source has no duration.
    pub duration: String,
    /// Human form, e.g. `1.2K`; empty when the source has no view count.
    pub view_count: String,
    pub video_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFeed {
    pub videos: Vec<ChannelVideo>,
    pub channel_id: String,
    pub channel_title: String,
    pub total_videos: usize,
}
