//! Command-line waveform preview for a single media file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use flowerwave::config::{self, AppConfig};
use flowerwave::logging;
use flowerwave::media::{self, LocalMediaFile, MediaFile};
use flowerwave::timeline::TimeGrid;
use flowerwave::waveform::{
    RenderStyle, WaveformPoint, WaveformScope, WaveformService, render_ascii,
    render_points_with_style,
};

const PREVIEW_COLUMNS: usize = 80;
const PREVIEW_ROWS: usize = 9;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    let config = config::load_or_default().unwrap_or_else(|err| {
        eprintln!("Using default settings: {err}");
        AppConfig::default()
    });
    if let Err(err) = logging::init(&config.logging) {
        eprintln!("Logging disabled: {err}");
    }

    let mut settings = config.waveform.clone();
    if let Some(program) = options.ffmpeg.clone() {
        settings.decoder_path = Some(program);
    }
    let mut file = LocalMediaFile::new(&options.media);
    if let Some(duration) = options.duration {
        file = file.with_duration(duration);
    }
    if let Some(frames) = options.frames {
        file = file.with_frame_count(frames);
    }
    if !media::is_media_file(file.path()) {
        warn!(
            "{} has no recognized media extension; decoding anyway",
            file.path().display()
        );
    }

    let long_media =
        WaveformScope::requires_confirmation(file.estimated_duration(), settings.confirm_threshold());
    let scope = if options.prefix {
        settings.prefix_scope()
    } else {
        if long_media {
            info!(
                "Generating a full waveform for long media; pass --prefix to decode only the first {:.0}s",
                settings.prefix_seconds
            );
        }
        WaveformScope::Full
    };

    let file: Arc<dyn MediaFile> = Arc::new(file);
    let service = WaveformService::new(&settings);
    let ready = service
        .request(Arc::clone(&file), scope)
        .recv()
        .map_err(|err| format!("Waveform worker stopped: {err}"))?;
    let points = render_points_with_style(
        &ready.envelope,
        options.width,
        options.height,
        RenderStyle::from_settings(&config.render),
    );
    let grid = TimeGrid::for_media(file.as_ref(), &config.timeline);
    let duration = file.estimated_duration().map(|duration| grid.format(duration));

    if options.json {
        let report = Report {
            path: &ready.path,
            scope: scope_label(ready.scope),
            frame_rate: grid.frame_rate(),
            duration,
            silent: ready.envelope.is_silent(),
            points: &points,
        };
        let json = serde_json::to_string_pretty(&report)
            .map_err(|err| format!("Failed to encode report: {err}"))?;
        println!("{json}");
        return Ok(());
    }

    for line in render_ascii(&ready.envelope, PREVIEW_COLUMNS, PREVIEW_ROWS) {
        println!("{line}");
    }
    println!();
    println!("File:     {}", ready.path.display());
    println!("Scope:    {}", scope_label(ready.scope));
    println!(
        "Points:   {} on {}x{}",
        points.len(),
        options.width,
        options.height
    );
    println!("Duration: {}", duration.as_deref().unwrap_or("unknown"));
    if ready.envelope.is_silent() {
        println!("(no audio decoded; see log for details)");
    }
    Ok(())
}

#[derive(Serialize)]
struct Report<'a> {
    path: &'a std::path::Path,
    scope: String,
    frame_rate: f64,
    duration: Option<String>,
    silent: bool,
    points: &'a [WaveformPoint],
}

fn scope_label(scope: WaveformScope) -> String {
    match scope {
        WaveformScope::Full => "full".to_string(),
        WaveformScope::Prefix(limit) => format!("first {:.0}s", limit.as_secs_f64()),
    }
}

struct Options {
    media: PathBuf,
    prefix: bool,
    width: f32,
    height: f32,
    frames: Option<u64>,
    duration: Option<Duration>,
    ffmpeg: Option<PathBuf>,
    json: bool,
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut media = None;
    let mut options = Options {
        media: PathBuf::new(),
        prefix: false,
        width: 800.0,
        height: 100.0,
        frames: None,
        duration: None,
        ffmpeg: None,
        json: false,
    };
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--prefix" => options.prefix = true,
            "--json" => options.json = true,
            "--width" => {
                idx += 1;
                options.width = parse_value(&args, idx, "--width")?;
            }
            "--height" => {
                idx += 1;
                options.height = parse_value(&args, idx, "--height")?;
            }
            "--frames" => {
                idx += 1;
                options.frames = Some(parse_value(&args, idx, "--frames")?);
            }
            "--duration" => {
                idx += 1;
                let seconds: f64 = parse_value(&args, idx, "--duration")?;
                let duration = Duration::try_from_secs_f64(seconds)
                    .map_err(|_| format!("Invalid --duration: {seconds}"))?;
                options.duration = Some(duration);
            }
            "--ffmpeg" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--ffmpeg requires a value".to_string())?;
                options.ffmpeg = Some(PathBuf::from(value));
            }
            unknown if unknown.starts_with('-') => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
            path => {
                if media.replace(PathBuf::from(path)).is_some() {
                    return Err("Only one media file can be previewed at a time".to_string());
                }
            }
        }
        idx += 1;
    }
    options.media = media.ok_or_else(|| format!("A media file is required\n\n{}", help_text()))?;
    Ok(Some(options))
}

fn parse_value<T: std::str::FromStr>(args: &[String], idx: usize, flag: &str) -> Result<T, String> {
    let value = args
        .get(idx)
        .ok_or_else(|| format!("{flag} requires a value"))?;
    value
        .parse()
        .map_err(|_| format!("Invalid {flag}: {value}"))
}

fn help_text() -> String {
    [
        "flowerwave",
        "",
        "Decodes a media file with ffmpeg and prints its waveform.",
        "",
        "Usage:",
        "  flowerwave <media-file> [options]",
        "",
        "Options:",
        "  --prefix           Only decode the configured prefix (default 300s).",
        "  --width <px>       Render width (default 800).",
        "  --height <px>      Render height (default 100).",
        "  --duration <secs>  Media duration, used for the decode timeout and label.",
        "  --frames <n>       Video frame count, used to estimate the frame rate.",
        "  --ffmpeg <path>    Decoder executable to try first.",
        "  --json             Print the rendered points as JSON.",
    ]
    .join("\n")
}
