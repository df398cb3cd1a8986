use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use env_logger::Env;
use flipbook::{
    ConvertOptions, ConvertRequest, Converter, FfmpegLogLevel, FfmpegSource, OperationType,
    PixelFormat, ProgressCallback, ProgressInfo, RequestHandler,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  flipbook convert lecture.mp4 --time 2\n  flipbook convert https://example.com/talk.mp4 --time 0.5 --out-dir pdfs --progress\n  flipbook metadata lecture.mp4 --json\n  flipbook completions zsh > _flipbook";

#[derive(Debug, Parser)]
#[command(
    name = "flipbook",
    version,
    about = "Turn a video into a PDF with one sampled frame per page",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while sampling and writing.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting an existing PDF.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Pixel format of the embedded frames (rgb8, gray8).
    #[arg(long, global = true)]
    pixel_format: Option<String>,

    /// JPEG quality of the embedded frames (1-100).
    #[arg(long, global = true)]
    quality: Option<u8>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert a video to a PDF of sampled frames.
    #[command(
        about = "Convert a video to a PDF",
        after_help = "Examples:\n  flipbook convert lecture.mp4 --time 2\n  flipbook convert lecture.mp4 --time 1 --json"
    )]
    Convert {
        /// Input video path or URL.
        input: String,
        /// Minutes of video between two pages. Absent or 0 samples every frame.
        #[arg(long)]
        time: Option<String>,
        /// Directory the PDF is written to.
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Write a zero-page PDF when no frame could be sampled.
        #[arg(long)]
        allow_empty: bool,
        /// Print the result or error as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print metadata for a video (alias: probe).
    #[command(
        about = "Print video metadata",
        visible_alias = "probe",
        after_help = "Examples:\n  flipbook metadata lecture.mp4\n  flipbook metadata lecture.mp4 --json"
    )]
    Metadata {
        /// Input video path or URL.
        input: String,
        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_pixel_format(value: &str) -> Option<PixelFormat> {
    match value.to_ascii_lowercase().as_str() {
        "rgb8" | "rgb" => Some(PixelFormat::Rgb8),
        "gray8" | "gray" | "grey" | "greyscale" | "grayscale" => Some(PixelFormat::Gray8),
        _ => None,
    }
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn init_logging(global: &GlobalOptions) {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        flipbook::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

fn convert_options(global: &GlobalOptions) -> Result<ConvertOptions, Box<dyn std::error::Error>> {
    let mut options = ConvertOptions::new();

    if let Some(pixel_str) = &global.pixel_format {
        let pixel = parse_pixel_format(pixel_str)
            .ok_or(format!("unsupported --pixel-format: {pixel_str}"))?;
        options = options.with_pixel_format(pixel);
    }

    if let Some(quality) = global.quality {
        if !(1..=100).contains(&quality) {
            return Err(format!("--quality must be between 1 and 100, got {quality}").into());
        }
        options = options.with_jpeg_quality(quality);
    }

    if global.progress {
        options = options.with_progress(Arc::new(TerminalProgress::new()?));
    }

    Ok(options)
}

/// Drives one progress bar, restarting it whenever the stage changes.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {msg:<10} {bar:40.cyan/blue} {pos}/{len}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let stage = match info.operation {
            OperationType::FrameSampling => "sampling",
            OperationType::PageComposition => "layout",
            OperationType::DocumentWriting => "writing",
            _ => "working",
        };
        if self.bar.message() != stage {
            self.bar.reset();
            self.bar.set_message(stage);
        }
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        if info.total == Some(info.current) && stage == "writing" {
            self.bar.finish_and_clear();
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Convert {
            input,
            time,
            out_dir,
            allow_empty,
            json,
        } => {
            let options = convert_options(&cli.global)?;
            let handler =
                RequestHandler::new(Converter::ffmpeg(options), out_dir).allow_empty(allow_empty);

            ensure_writable_path(&handler.output_path(&input), cli.global.overwrite)?;

            let request = ConvertRequest::new(Some(&input), time.as_deref());
            match handler.handle(&request) {
                Ok(summary) if json => {
                    println!("{}", serde_json::to_string_pretty(&summary.to_json())?);
                }
                Ok(summary) => {
                    println!(
                        "{} {}",
                        "success:".green().bold(),
                        format!(
                            "Wrote {} page(s) to {} ({})",
                            summary.pages,
                            summary.output.display(),
                            summary.interval
                        )
                        .green()
                    );
                }
                Err(payload) if json => {
                    println!("{}", serde_json::to_string_pretty(&payload.to_json())?);
                    std::process::exit(1);
                }
                Err(payload) => return Err(payload.message.into()),
            }
        }
        Commands::Metadata { input, json } => {
            let options = convert_options(&cli.global)?;
            let metadata = FfmpegSource::new(options.frame_output().clone()).probe(&input)?;
            let video = &metadata.video;
            if json {
                let payload = json!({
                    "format": metadata.format,
                    "duration_seconds": metadata.duration.as_secs_f64(),
                    "video": {
                        "width": video.width,
                        "height": video.height,
                        "fps": video.frames_per_second,
                        "frame_count": video.frame_count,
                        "codec": video.codec,
                    },
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", metadata.format);
                println!("Duration: {:?}", metadata.duration);
                println!(
                    "Video: {}x{} @ {} fps, {} frames [{}]",
                    video.width,
                    video.height,
                    video
                        .frames_per_second
                        .map_or_else(|| "?".to_string(), |fps| format!("{fps:.2}")),
                    video
                        .frame_count
                        .map_or_else(|| "?".to_string(), |count| count.to_string()),
                    video.codec,
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "flipbook", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
