use serde::{Deserialize, Serialize};

/// Lecture video mapped to a curriculum week.
///
/// `video_id` is an opaque identifier of the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef {
    pub video_id: String,
    pub chapter: u8,
    pub title: String,
}
