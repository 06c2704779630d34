//! Toolkit build metadata read from `ffmpeg -version`.

use chrono::NaiveDate;

/// Parsed `ffmpeg -version` banner.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VersionInfo {
    /// Version string, e.g. `6.0`.
    pub version: String,
    /// Build date as `yyyyMMdd`, empty when the banner has none.
    pub build_date: String,
    /// Libraries enabled with `--enable-lib*`, sorted.
    pub external_libraries: Vec<String>,
}

impl VersionInfo {
    /// Parse the banner.
    pub fn parse(banner: &str) -> Self {
        let mut info = Self::default();

        for line in banner.lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("ffmpeg version ") {
                info.version = rest.split_whitespace().next().unwrap_or_default().to_string();
            } else if let Some(rest) = line.strip_prefix("built on ") {
                info.build_date = parse_build_date(rest).unwrap_or_default();
            } else if let Some(rest) = line.strip_prefix("configuration:") {
                info.external_libraries = rest
                    .split_whitespace()
                    .filter_map(|flag| flag.strip_prefix("--enable-lib"))
                    .map(str::to_string)
                    .collect();
                info.external_libraries.sort();
                info.external_libraries.dedup();
            }
        }

        info
    }
}

/// `Jan  1 2024 12:00:00 with gcc` → `20240101`.
fn parse_build_date(text: &str) -> Option<String> {
    let date: Vec<&str> = text.split_whitespace().take(3).collect();
    let date = NaiveDate::parse_from_str(&date.join(" "), "%b %d %Y").ok()?;
    Some(date.format("%Y%m%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER: &str = "\
ffmpeg version 6.0 Copyright (c) 2000-2023 the FFmpeg developers
built on Mar  7 2023 10:12:00 with gcc 12.2.0 (Debian 12.2.0-14)
configuration: --prefix=/usr --enable-gpl --enable-libx264 --enable-libmp3lame --enable-libass --enable-libx264
libavutil      58.  2.100 / 58.  2.100
";

    #[test]
    fn parses_version_date_and_libraries() {
        let info = VersionInfo::parse(BANNER);
        assert_eq!(info.version, "6.0");
        assert_eq!(info.build_date, "20230307");
        assert_eq!(info.external_libraries, vec!["ass", "mp3lame", "x264"]);
    }

    #[test]
    fn banner_without_build_date() {
        let info = VersionInfo::parse("ffmpeg version n7.1 Copyright\nbuilt with gcc 13\n");
        assert_eq!(info.version, "n7.1");
        assert!(info.build_date.is_empty());
        assert!(info.external_libraries.is_empty());
    }

    #[test]
    fn empty_banner() {
        assert_eq!(VersionInfo::parse(""), VersionInfo::default());
    }
}
