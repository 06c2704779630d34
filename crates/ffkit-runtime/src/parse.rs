//! Parsers for executable output.
//!
//! - [`parse_log_line`]: a stderr line printed under `-loglevel level+...`
//! - [`ProgressParser`]: `key=value` blocks printed by `-progress pipe:1`

use ffkit_core::{Level, SessionId, Statistics};

/// Split a stderr line into its level tag and message.
///
/// Under `-loglevel level+<lvl>` every line carries a `[level]` tag, possibly
/// after a context tag such as `[h264 @ 0x5581]`. Context tags stay in the
/// message; the level tag is removed.
pub fn parse_log_line(line: &str) -> (Option<Level>, String) {
    let mut rest = line;
    let mut kept = String::new();

    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            break;
        };
        let tag = &inner[..close];
        let after = &inner[close + 1..];
        if let Some(level) = Level::from_cli_name(tag) {
            kept.push_str(after.strip_prefix(' ').unwrap_or(after));
            return (Some(level), kept);
        }
        kept.push_str(&rest[..close + 2]);
        let trimmed = after.trim_start();
        kept.push_str(&after[..after.len() - trimmed.len()]);
        rest = trimmed;
    }

    kept.push_str(rest);
    (None, kept)
}

/// Accumulates `-progress` output into [`Statistics`] samples.
///
/// Each block ends with a `progress=continue` or `progress=end` line.
#[derive(Debug)]
pub struct ProgressParser {
    session_id: SessionId,
    current: Statistics,
    quality_seen: bool,
}

impl ProgressParser {
    /// Parser for one session's stdout.
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            current: Self::blank(session_id),
            quality_seen: false,
        }
    }

    /// Feed one line; returns a sample when the line closes a block.
    pub fn feed(&mut self, line: &str) -> Option<Statistics> {
        let (key, value) = line.split_once('=')?;
        let value = value.trim();
        match key.trim() {
            "frame" => self.current.video_frame_number = parse_int(value),
            "fps" => self.current.video_fps = parse_float(value),
            "total_size" => self.current.size = parse_int(value),
            "out_time_us" => self.current.time = parse_float(value) / 1000.0,
            "bitrate" => self.current.bitrate = parse_float(value.trim_end_matches("kbits/s")),
            "speed" => self.current.speed = parse_float(value.trim_end_matches('x')),
            "progress" => {
                self.quality_seen = false;
                let sample = std::mem::replace(&mut self.current, Self::blank(self.session_id));
                return Some(sample);
            }
            // First quantizer listed belongs to the first video stream.
            k if k.starts_with("stream_") && k.ends_with("_q") && !self.quality_seen => {
                self.quality_seen = true;
                self.current.video_quality = parse_float(value);
            }
            _ => {}
        }
        None
    }

    fn blank(session_id: SessionId) -> Statistics {
        Statistics {
            session_id,
            ..Statistics::default()
        }
    }
}

fn parse_int(value: &str) -> i64 {
    value.parse().unwrap_or(0)
}

fn parse_float(value: &str) -> f64 {
    value.trim().parse().unwrap_or(0.0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
