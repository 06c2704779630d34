//! # ffkit-settings
//!
//! Configuration for the ffkit bridge host.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`FfkitSettings::default()`]
//! 2. **User file**: `~/.ffkit/settings.json`, deep-merged over defaults
//! 3. **Environment variables**: `FFKIT_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
