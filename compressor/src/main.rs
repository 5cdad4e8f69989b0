use std::{io, num::NonZeroUsize, path::PathBuf, process::ExitCode, time::Instant};

use clap::{error::ErrorKind, ArgAction, Parser, ValueEnum};
use etc_compression::{
    dispatch::{DispatcherConfig, TaskDispatcher},
    pipeline::Pipeline,
    Codec, EtcSettings, Quality,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Compresses an image into an ETC texture with a full mipmap chain.
///
/// The container is selected by the output suffix: `.ktx` or `.dds`.
#[derive(Parser, Debug)]
#[command(name = "etccompress", version)]
struct Args {
    /// Input image (PNG, JPEG, TGA or BMP).
    input: PathBuf,

    /// Output texture, ending in `.ktx` or `.dds`.
    output: PathBuf,

    /// Compress with ETC1. Alpha is discarded.
    #[arg(long, conflicts_with = "use_etc2")]
    use_etc1: bool,

    /// Compress with ETC2, with EAC alpha for images that have an alpha channel (default).
    #[arg(long)]
    use_etc2: bool,

    /// Encoder search effort.
    #[arg(long, value_enum, default_value_t = QualityArg::Medium)]
    quality: QualityArg,

    /// Number of worker threads. Defaults to the number of CPUs.
    #[arg(long)]
    threads: Option<NonZeroUsize>,

    /// Log more, repeat for debug output. `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum QualityArg {
    Fast,
    Medium,
    Slow,
}

impl From<QualityArg> for Quality {
    fn from(quality: QualityArg) -> Self {
        match quality {
            QualityArg::Fast => Quality::Fast,
            QualityArg::Medium => Quality::Medium,
            QualityArg::Slow => Quality::Slow,
        }
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                let _ = err.print();
                return ExitCode::FAILURE;
            }
        },
    };

    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), etc_compression::Error> {
    let codec = if args.use_etc1 {
        Codec::Etc1
    } else {
        Codec::Etc2
    };

    let mut config = DispatcherConfig::default();
    if let Some(threads) = args.threads {
        config = config.with_threads(threads);
    }

    let pipeline = Pipeline::new(
        TaskDispatcher::new(config)?,
        EtcSettings::from_quality(args.quality.into()),
    );

    let start = Instant::now();

    let summary = pipeline.encode_file(&args.input, &args.output, codec)?;

    let duration = start.elapsed();
    info!(
        "{}x{} {} -> {} with {} levels took: {:.3} ms",
        summary.width,
        summary.height,
        summary.pixel_format.name(),
        summary.container,
        summary.mip_levels,
        duration.as_secs_f64() * 1000.0
    );

    Ok(())
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
