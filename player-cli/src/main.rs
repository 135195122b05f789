mod cli;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use core_playback::{open_decoder, DecoderConfig, PcmDecoder};
use core_runtime::logging::{init_logging, strip_path, LoggingConfig};
use tracing::{info, warn};

use crate::cli::Args;

/// Outcome of one decode run.
#[derive(Debug, Default, PartialEq, Eq)]
struct PlaybackStats {
    frames: u64,
    bytes: u64,
    interrupted: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(LoggingConfig::new(
        args.log_format.into(),
        args.log_level.into(),
    ))
    .context("initialize logging")?;

    let config = load_config(&args)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
        warn!(error = %e, "Ctrl-C handler not installed");
    }

    let mut sink: Box<dyn Write> = match &args.output {
        Some(_) if args.writes_stdout() => Box::new(BufWriter::new(io::stdout().lock())),
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("create {:?}", path))?,
        )),
        None => Box::new(io::sink()),
    };

    let stats = play(&args.path, &config, args.frames, &mut sink, &interrupted)?;
    sink.flush().context("flush PCM output")?;

    if stats.interrupted {
        warn!(frames = stats.frames, "interrupted");
    }
    Ok(())
}

/// Decoder configuration from `--config`, with command-line overrides applied.
fn load_config(args: &Args) -> Result<DecoderConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("open {:?}", path))?;
            serde_json::from_reader(file).with_context(|| format!("parse {:?}", path))?
        }
        None => DecoderConfig::default(),
    };

    if let Some(conversion) = args.conversion {
        config.conversion = conversion.into();
    }
    if args.opus_stream {
        config.prefer_opus_file = false;
    }
    if args.frames > config.buffer_frames {
        config.buffer_frames = args.frames;
    }

    if let Err(e) = config.validate() {
        bail!("invalid decoder configuration: {e}");
    }
    Ok(config)
}

/// Pull `frames`-sized chunks from `path` into `sink` until the stream ends
/// or `interrupted` is raised.
fn play<W: Write + ?Sized>(
    path: &Path,
    config: &DecoderConfig,
    frames: usize,
    sink: &mut W,
    interrupted: &AtomicBool,
) -> Result<PlaybackStats> {
    if frames == 0 {
        bail!("--frames must be > 0");
    }

    let mut decoder =
        open_decoder(path, config).with_context(|| format!("open {:?}", path))?;
    let format = decoder.format()?;
    eprintln!(
        "{}: {:?} {}ch @ {} Hz, s16le",
        strip_path(&path.to_string_lossy()),
        format.codec,
        format.channels,
        format.sample_rate
    );

    let bytes_per_frame = format.bytes_per_frame();
    let mut buffer = vec![0u8; frames * bytes_per_frame];
    let mut stats = PlaybackStats::default();

    let result = loop {
        if interrupted.load(Ordering::Relaxed) {
            stats.interrupted = true;
            break Ok(());
        }

        let decoded = match decoder.decode_samples(frames, &mut buffer) {
            Ok(0) => break Ok(()),
            Ok(n) => n,
            Err(e) => break Err(e).context("decode"),
        };

        let bytes = decoded * bytes_per_frame;
        if let Err(e) = sink.write_all(&buffer[..bytes]) {
            break Err(e).context("write PCM output");
        }
        stats.frames += decoded as u64;
        stats.bytes += bytes as u64;
    };

    decoder.close()?;
    result?;

    info!(
        frames = stats.frames,
        seconds = stats.frames as f64 / f64::from(format.sample_rate),
        "playback finished"
    );
    Ok(stats)
}
