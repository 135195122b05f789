use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use core_playback::SampleConversion;
use core_runtime::logging::{LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "pcm-play", version)]
pub struct Args {
    /// Audio file to decode (.ogg, .oga, .opus, .wav, .mp3, .flac)
    pub path: PathBuf,

    /// Where to write raw s16le PCM; "-" for stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Frames requested per decode call
    #[arg(long, default_value_t = 1024)]
    pub frames: usize,

    /// JSON decoder configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Float to 16-bit conversion policy (overrides the config file)
    #[arg(long, value_enum)]
    pub conversion: Option<ConversionArg>,

    /// Decode Ogg Opus packet by packet instead of as a whole file
    #[arg(long)]
    pub opus_stream: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormatArg::Compact)]
    pub log_format: LogFormatArg,

    /// Minimum log level
    #[arg(long, value_enum, default_value_t = LogLevelArg::Info)]
    pub log_level: LogLevelArg,
}

impl Args {
    /// `true` when PCM goes to stdout.
    pub fn writes_stdout(&self) -> bool {
        self.output
            .as_deref()
            .is_some_and(|p| p.as_os_str() == "-")
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConversionArg {
    Clamp,
    Wrap,
}

impl From<ConversionArg> for SampleConversion {
    fn from(arg: ConversionArg) -> Self {
        match arg {
            ConversionArg::Clamp => SampleConversion::Clamp,
            ConversionArg::Wrap => SampleConversion::Wrap,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Compact => LogFormat::Compact,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevelArg {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Trace => LogLevel::Trace,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Error => LogLevel::Error,
        }
    }
}
