//! # Logging
//!
//! `tracing-subscriber` setup for the workspace binaries.
//!
//! Every format writes to **stderr**: stdout carries raw PCM when the CLI
//! pipes audio into another process, so nothing else may touch it.
//!
//! The filter is resolved in this order:
//! 1. [`LoggingConfig::filter`], when set
//! 2. the `PCM_LOG` environment variable, when set and non-empty
//! 3. the configured level for the workspace crates, `warn` for codec backends
//!
//! ```no_run
//! use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
//!
//! init_logging(LoggingConfig::new(LogFormat::Compact, LogLevel::Debug))
//!     .expect("logging installed twice");
//!
//! tracing::debug!(frames = 1024, "pulled");
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, IsTerminal};
use std::str::FromStr;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable holding a full `EnvFilter` directive string.
pub const FILTER_ENV: &str = "PCM_LOG";

/// Targets that follow the configured level.
const WORKSPACE_TARGETS: [&str; 3] = ["core_runtime", "core_playback", "player_cli"];

/// Codec backends; chatty at debug, so held at warn.
const CODEC_TARGETS: [&str; 2] = ["symphonia", "lewton"];

/// Event rendering on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, for a developer at a terminal
    Pretty,
    /// One JSON object per event
    Json,
    /// One line per event
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Compact
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
            Self::Compact => "compact",
        })
    }
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        [Self::Pretty, Self::Json, Self::Compact]
            .into_iter()
            .find(|format| format.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Config(format!("unknown log format `{s}`")))
    }
}

/// Minimum severity for workspace crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    const ALL: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    /// Directive spelling understood by `EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("warning") {
            return Ok(LogLevel::Warn);
        }
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Config(format!("unknown log level `{s}`")))
    }
}

/// How and what to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Explicit directives (e.g. `core_playback=trace,symphonia=off`);
    /// replaces the level-derived filter entirely.
    pub filter: Option<String>,
    /// Log span open/close, which brackets each decoder `open`.
    pub span_events: bool,
    /// Colour codes; off by default when stderr is redirected.
    pub ansi: bool,
    /// Print the event target (module path).
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new(LogFormat::default(), LogLevel::Info)
    }
}

impl LoggingConfig {
    pub fn new(format: LogFormat, level: LogLevel) -> Self {
        Self {
            format,
            level,
            filter: None,
            span_events: false,
            ansi: io::stderr().is_terminal(),
            show_target: true,
        }
    }

    pub fn with_filter(mut self, directives: impl Into<String>) -> Self {
        self.filter = Some(directives.into());
        self
    }

    pub fn with_span_events(mut self, enable: bool) -> Self {
        self.span_events = enable;
        self
    }

    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.ansi = enable;
        self
    }

    pub fn with_target(mut self, show: bool) -> Self {
        self.show_target = show;
        self
    }

    /// Directives used when neither an explicit filter nor `PCM_LOG` is set.
    pub fn default_directives(&self) -> String {
        let level = self.level.as_str();
        let mut directives = vec![level.to_string()];
        directives.extend(WORKSPACE_TARGETS.iter().map(|t| format!("{t}={level}")));
        directives.extend(CODEC_TARGETS.iter().map(|t| format!("{t}=warn")));
        directives.join(",")
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// [`Error::Config`] if the filter does not parse, or if a subscriber is
/// already installed in this process.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    tracing_subscriber::registry()
        .with(build_layer(&config))
        .with(filter)
        .try_init()
        .map_err(|e| Error::Config(format!("cannot install subscriber: {e}")))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let directives = match &config.filter {
        Some(explicit) => explicit.clone(),
        None => std::env::var(FILTER_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| config.default_directives()),
    };

    EnvFilter::try_new(&directives)
        .map_err(|e| Error::Config(format!("invalid log filter `{directives}`: {e}")))
}

fn build_layer(config: &LoggingConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let spans = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let base = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(config.show_target)
        .with_span_events(spans);

    match config.format {
        LogFormat::Pretty => base.pretty().with_ansi(config.ansi).boxed(),
        LogFormat::Compact => base.compact().with_ansi(config.ansi).boxed(),
        LogFormat::Json => base
            .json()
            .with_ansi(false)
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
    }
}

/// File name of `path`, for log fields that should not leak directories.
///
/// ```
/// use core_runtime::logging::strip_path;
///
/// assert_eq!(strip_path("/home/user/Music/song.ogg"), "song.ogg");
/// assert_eq!(strip_path("C:\\Music\\song.flac"), "song.flac");
/// ```
pub fn strip_path(path: &str) -> &str {
    path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path)
}
