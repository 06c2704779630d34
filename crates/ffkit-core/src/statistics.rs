//! Encoding statistics samples.

use serde::{Deserialize, Serialize};

use crate::ids::SessionId;

/// One statistics sample reported while an FFmpeg session runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Session that produced the sample.
    pub session_id: SessionId,
    /// Number of video frames processed so far.
    pub video_frame_number: i64,
    /// Current video frame rate.
    pub video_fps: f64,
    /// Current video quantizer.
    pub video_quality: f64,
    /// Output size in bytes.
    pub size: i64,
    /// Output position in milliseconds.
    pub time: f64,
    /// Output bitrate in kbit/s.
    pub bitrate: f64,
    /// Processing speed relative to real time.
    pub speed: f64,
}
