//! Mutable toolkit configuration and how it reaches child processes.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use ffkit_core::{Level, LogRedirectionStrategy, Signal};

/// Where fontconfig should look.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FontConfig {
    /// Leave the environment alone.
    #[default]
    System,
    /// A caller-provided configuration directory.
    ConfigurationPath(String),
    /// Generated configuration listing these directories.
    Directories {
        /// Font directories.
        directories: Vec<String>,
        /// Family-name aliases (`from` → `to`).
        name_mapping: HashMap<String, String>,
    },
}

/// Configuration applied to every run.
#[derive(Clone, Debug)]
pub struct ToolkitConfig {
    /// Level passed to `-loglevel`.
    pub log_level: Level,
    /// Whether captured lines may be printed at all.
    pub redirection_enabled: bool,
    /// Default strategy for new sessions.
    pub log_redirection_strategy: LogRedirectionStrategy,
    /// Font lookup.
    pub fonts: FontConfig,
    /// Extra environment for children.
    pub environment: HashMap<String, String>,
    /// Signals whose default handling was disabled.
    pub ignored_signals: BTreeSet<Signal>,
}

impl ToolkitConfig {
    /// Configuration at startup.
    pub fn new(log_level: Level) -> Self {
        Self {
            log_level,
            redirection_enabled: true,
            log_redirection_strategy: LogRedirectionStrategy::default(),
            fonts: FontConfig::default(),
            environment: HashMap::new(),
            ignored_signals: BTreeSet::new(),
        }
    }

    /// Whether children run in their own process group, out of reach of
    /// terminal-generated `SIGINT`/`SIGQUIT`.
    pub fn isolates_terminal_signals(&self) -> bool {
        self.ignored_signals.contains(&Signal::Sigint)
            || self.ignored_signals.contains(&Signal::Sigquit)
    }

    /// Environment for a child process. `fontconfig_dir` is where a
    /// generated `fonts.conf` lives.
    pub fn child_environment(&self, fontconfig_dir: &Path) -> HashMap<String, String> {
        let mut env = self.environment.clone();
        match &self.fonts {
            FontConfig::System => {}
            FontConfig::ConfigurationPath(path) => {
                let _ = env.insert("FONTCONFIG_PATH".into(), path.clone());
            }
            FontConfig::Directories { .. } => {
                let _ = env.insert(
                    "FONTCONFIG_PATH".into(),
                    fontconfig_dir.to_string_lossy().into_owned(),
                );
                let _ = env.insert("FONTCONFIG_FILE".into(), "fonts.conf".into());
            }
        }
        env
    }

    /// Whether a session's captured line should be printed.
    pub fn should_print(
        &self,
        strategy: LogRedirectionStrategy,
        level: Option<Level>,
        callbacks_registered: bool,
    ) -> bool {
        if !self.redirection_enabled {
            return false;
        }
        let permitted = match strategy {
            LogRedirectionStrategy::AlwaysPrintLogs
            | LogRedirectionStrategy::PrintLogsWhenSessionCallbackNotDefined => true,
            LogRedirectionStrategy::PrintLogsWhenNoCallbacksDefined
            | LogRedirectionStrategy::PrintLogsWhenGlobalCallbackNotDefined => !callbacks_registered,
            LogRedirectionStrategy::NeverPrintLogs => false,
        };
        permitted && level.unwrap_or(Level::AvLogTrace) <= self.log_level
    }
}

/// Path of the generated fontconfig file inside `dir`.
pub fn fonts_conf_path(dir: &Path) -> PathBuf {
    dir.join("fonts.conf")
}

/// Render a `fonts.conf` for the given directories and aliases.
pub fn render_fonts_conf(directories: &[String], name_mapping: &HashMap<String, String>) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\"?>\n<!DOCTYPE fontconfig SYSTEM \"fonts.dtd\">\n<fontconfig>\n    <dir prefix=\"cwd\">.</dir>\n",
    );
    for dir in directories {
        let _ = writeln!(out, "    <dir>{}</dir>", xml_escape(dir));
    }

    let mut aliases: Vec<_> = name_mapping.iter().collect();
    aliases.sort();
    for (from, to) in aliases {
        let _ = write!(
            out,
            "    <match target=\"pattern\">\n        <test qual=\"any\" name=\"family\">\n            <string>{}</string>\n        </test>\n        <edit name=\"family\" mode=\"assign\" binding=\"same\">\n            <string>{}</string>\n        </edit>\n    </match>\n",
            xml_escape(from),
            xml_escape(to)
        );
    }
    out.push_str("</fontconfig>\n");
    out
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
