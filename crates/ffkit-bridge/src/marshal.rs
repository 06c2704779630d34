//! Domain objects to flat JSON maps.
//!
//! Key names and numeric encodings are part of the method-channel contract.

use chrono::{DateTime, Utc};
use ffkit_core::{Level, Log, MediaInformation, Session, SessionKind, Statistics};
use serde_json::{Map, Value, json};

/// Session id key.
pub const KEY_SESSION_ID: &str = "sessionId";
/// Creation time key.
pub const KEY_SESSION_CREATE_TIME: &str = "createTime";
/// Start time key.
pub const KEY_SESSION_START_TIME: &str = "startTime";
/// Command line key.
pub const KEY_SESSION_COMMAND: &str = "command";
/// Session type key.
pub const KEY_SESSION_TYPE: &str = "type";
/// Media information key.
pub const KEY_SESSION_MEDIA_INFORMATION: &str = "mediaInformation";

fn epoch_millis(time: Option<DateTime<Utc>>) -> i64 {
    time.map_or(0, |t| t.timestamp_millis())
}

/// Session map.
pub fn session(session: &Session) -> Value {
    let mut map = Map::new();
    let _ = map.insert(KEY_SESSION_ID.into(), json!(session.id.get()));
    let _ = map.insert(
        KEY_SESSION_CREATE_TIME.into(),
        json!(session.create_time.timestamp_millis()),
    );
    let _ = map.insert(KEY_SESSION_START_TIME.into(), json!(epoch_millis(session.start_time)));
    let _ = map.insert(KEY_SESSION_COMMAND.into(), json!(session.command()));
    let _ = map.insert(KEY_SESSION_TYPE.into(), json!(session.kind.type_code()));
    if session.kind == SessionKind::MediaInformation {
        if let Some(info) = &session.media_information {
            let _ = map.insert(KEY_SESSION_MEDIA_INFORMATION.into(), media_information(info));
        }
    }
    Value::Object(map)
}

/// Optional session map (`null` when absent).
pub fn maybe_session(value: Option<&Session>) -> Value {
    value.map_or(Value::Null, session)
}

/// List of session maps.
pub fn sessions(list: &[Session]) -> Value {
    Value::Array(list.iter().map(session).collect())
}

/// Log map. A missing level is reported as `AV_LOG_TRACE`.
pub fn log(log: &Log) -> Value {
    json!({
        "sessionId": log.session_id.get(),
        "level": log.level.unwrap_or(Level::AvLogTrace).value(),
        "message": log.message,
    })
}

/// List of log maps.
pub fn logs(list: &[Log]) -> Value {
    Value::Array(list.iter().map(log).collect())
}

/// Statistics map.
pub fn statistics(statistics: &Statistics) -> Value {
    json!({
        "sessionId": statistics.session_id.get(),
        "videoFrameNumber": statistics.video_frame_number,
        "videoFps": statistics.video_fps,
        "videoQuality": statistics.video_quality,
        "size": statistics.size,
        "time": statistics.time,
        "bitrate": statistics.bitrate,
        "speed": statistics.speed,
    })
}

/// List of statistics maps.
pub fn statistics_list(list: &[Statistics]) -> Value {
    Value::Array(list.iter().map(statistics).collect())
}

/// Media information map: the full ffprobe property object.
pub fn media_information(info: &MediaInformation) -> Value {
    Value::Object(info.all_properties().clone())
}

/// Optional media information map (`null` when absent).
pub fn maybe_media_information(info: Option<&MediaInformation>) -> Value {
    info.map_or(Value::Null, media_information)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
