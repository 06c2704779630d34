//! Media information parsed from ffprobe JSON output.
//!
//! The full property object is kept as-is because the method channel ships
//! it verbatim; the typed accessors only read from it.

use serde_json::{Map, Value};

use crate::errors::ToolkitError;

/// Media information for one probed input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MediaInformation {
    all_properties: Map<String, Value>,
    streams: Vec<StreamInformation>,
    chapters: Vec<Chapter>,
}

impl MediaInformation {
    /// Parse the JSON printed by `ffprobe -print_format json -show_format
    /// -show_streams -show_chapters`.
    pub fn from_json(output: &str) -> Result<Self, ToolkitError> {
        let value: Value = serde_json::from_str(output)
            .map_err(|e| ToolkitError::MediaInformationParse(e.to_string()))?;
        match value {
            Value::Object(map) => Ok(Self::from_properties(map)),
            other => Err(ToolkitError::MediaInformationParse(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Build from an already-parsed property object.
    pub fn from_properties(all_properties: Map<String, Value>) -> Self {
        let streams = object_list(&all_properties, "streams")
            .map(StreamInformation::new)
            .collect();
        let chapters = object_list(&all_properties, "chapters")
            .map(Chapter::new)
            .collect();
        Self {
            all_properties,
            streams,
            chapters,
        }
    }

    /// Every property ffprobe reported.
    pub fn all_properties(&self) -> &Map<String, Value> {
        &self.all_properties
    }

    /// The `format` section.
    pub fn format_properties(&self) -> Option<&Map<String, Value>> {
        self.all_properties.get("format").and_then(Value::as_object)
    }

    /// Input file name.
    pub fn filename(&self) -> Option<&str> {
        self.format_str("filename")
    }

    /// Short container format name.
    pub fn format(&self) -> Option<&str> {
        self.format_str("format_name")
    }

    /// Long container format name.
    pub fn long_format(&self) -> Option<&str> {
        self.format_str("format_long_name")
    }

    /// Duration in seconds, as printed by ffprobe.
    pub fn duration(&self) -> Option<&str> {
        self.format_str("duration")
    }

    /// Start time in seconds, as printed by ffprobe.
    pub fn start_time(&self) -> Option<&str> {
        self.format_str("start_time")
    }

    /// File size in bytes, as printed by ffprobe.
    pub fn size(&self) -> Option<&str> {
        self.format_str("size")
    }

    /// Overall bitrate, as printed by ffprobe.
    pub fn bitrate(&self) -> Option<&str> {
        self.format_str("bit_rate")
    }

    /// Container tags.
    pub fn tags(&self) -> Option<&Map<String, Value>> {
        self.format_properties()
            .and_then(|f| f.get("tags"))
            .and_then(Value::as_object)
    }

    /// Streams in index order.
    pub fn streams(&self) -> &[StreamInformation] {
        &self.streams
    }

    /// Chapters in file order.
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    fn format_str(&self, key: &str) -> Option<&str> {
        self.format_properties()
            .and_then(|f| f.get(key))
            .and_then(Value::as_str)
    }
}

/// One stream of a probed input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StreamInformation {
    properties: Map<String, Value>,
}

impl StreamInformation {
    /// Wrap a stream property object.
    pub fn new(properties: Map<String, Value>) -> Self {
        Self { properties }
    }

    /// Stream index.
    pub fn index(&self) -> Option<i64> {
        self.number("index")
    }

    /// Stream type (`video`, `audio`, `subtitle`, ...).
    pub fn stream_type(&self) -> Option<&str> {
        self.string("codec_type")
    }

    /// Codec short name.
    pub fn codec(&self) -> Option<&str> {
        self.string("codec_name")
    }

    /// Codec long name.
    pub fn codec_long(&self) -> Option<&str> {
        self.string("codec_long_name")
    }

    /// Pixel format of video streams.
    pub fn format(&self) -> Option<&str> {
        self.string("pix_fmt")
    }

    /// Width in pixels.
    pub fn width(&self) -> Option<i64> {
        self.number("width")
    }

    /// Height in pixels.
    pub fn height(&self) -> Option<i64> {
        self.number("height")
    }

    /// Bitrate, as printed by ffprobe.
    pub fn bitrate(&self) -> Option<&str> {
        self.string("bit_rate")
    }

    /// Sample rate of audio streams.
    pub fn sample_rate(&self) -> Option<&str> {
        self.string("sample_rate")
    }

    /// Sample format of audio streams.
    pub fn sample_format(&self) -> Option<&str> {
        self.string("sample_fmt")
    }

    /// Channel layout of audio streams.
    pub fn channel_layout(&self) -> Option<&str> {
        self.string("channel_layout")
    }

    /// Sample aspect ratio.
    pub fn sample_aspect_ratio(&self) -> Option<&str> {
        self.string("sample_aspect_ratio")
    }

    /// Display aspect ratio.
    pub fn display_aspect_ratio(&self) -> Option<&str> {
        self.string("display_aspect_ratio")
    }

    /// Average frame rate.
    pub fn average_frame_rate(&self) -> Option<&str> {
        self.string("avg_frame_rate")
    }

    /// Real base frame rate.
    pub fn real_frame_rate(&self) -> Option<&str> {
        self.string("r_frame_rate")
    }

    /// Stream time base.
    pub fn time_base(&self) -> Option<&str> {
        self.string("time_base")
    }

    /// Stream tags.
    pub fn tags(&self) -> Option<&Map<String, Value>> {
        self.properties.get("tags").and_then(Value::as_object)
    }

    /// Every property ffprobe reported for the stream.
    pub fn all_properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    fn string(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    fn number(&self, key: &str) -> Option<i64> {
        self.properties.get(key).and_then(Value::as_i64)
    }
}

/// One chapter of a probed input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Chapter {
    properties: Map<String, Value>,
}

impl Chapter {
    /// Wrap a chapter property object.
    pub fn new(properties: Map<String, Value>) -> Self {
        Self { properties }
    }

    /// Chapter id.
    pub fn id(&self) -> Option<i64> {
        self.properties.get("id").and_then(Value::as_i64)
    }

    /// Chapter time base.
    pub fn time_base(&self) -> Option<&str> {
        self.properties.get("time_base").and_then(Value::as_str)
    }

    /// Start in time-base units.
    pub fn start(&self) -> Option<i64> {
        self.properties.get("start").and_then(Value::as_i64)
    }

    /// Start in seconds, as printed by ffprobe.
    pub fn start_time(&self) -> Option<&str> {
        self.properties.get("start_time").and_then(Value::as_str)
    }

    /// End in time-base units.
    pub fn end(&self) -> Option<i64> {
        self.properties.get("end").and_then(Value::as_i64)
    }

    /// End in seconds, as printed by ffprobe.
    pub fn end_time(&self) -> Option<&str> {
        self.properties.get("end_time").and_then(Value::as_str)
    }

    /// Chapter tags.
    pub fn tags(&self) -> Option<&Map<String, Value>> {
        self.properties.get("tags").and_then(Value::as_object)
    }

    /// Every property ffprobe reported for the chapter.
    pub fn all_properties(&self) -> &Map<String, Value> {
        &self.properties
    }
}

fn object_list<'a>(
    properties: &'a Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = Map<String, Value>> + 'a {
    properties
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_object().cloned())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
