//! Video Slide - read videos as single-level virtual slides.
//!
//! This binary inspects videos and exports regions and thumbnails as PNG.

use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use video_slide::{
    config::{Cli, Command, DecoderConfig, ExportArgs, InfoArgs, ThumbnailArgs},
    export::{RegionResponse, RegionService},
    registry::VideoRegistry,
    source::{CachedFrameSource, FrameSource},
};

#[tokio::main]
async fn main() -> ExitCode {
    let (config, command) = Cli::parse().into_parts();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let source = config.build_source();
    if config.frame_cache_enabled() {
        debug!(bytes = config.cache_frames, "frame cache enabled");
        let source = CachedFrameSource::with_capacity(source, config.cache_frames);
        run(&config, source, command).await
    } else {
        run(&config, source, command).await
    }
}

async fn run<S: FrameSource>(config: &DecoderConfig, source: S, command: Command) -> ExitCode {
    let registry = VideoRegistry::with_capacity(source, config.cache_videos);
    let service = RegionService::new(registry);

    match command {
        Command::Info(args) => run_info(&service, args).await,
        Command::Export(args) => run_export(&service, args).await,
        Command::Thumbnail(args) => run_thumbnail(&service, args).await,
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "video_slide=debug"
    } else {
        "video_slide=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// =============================================================================
// Info Command
// =============================================================================

async fn run_info<S: FrameSource>(service: &RegionService<S>, args: InfoArgs) -> ExitCode {
    let metadata = match service.metadata(&args.video).await {
        Ok(metadata) => metadata,
        Err(e) => {
            error!("Failed to open {}: {}", args.video, e);
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&metadata) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize metadata: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("Video: {}", metadata.video_id);
        println!("─────────────────────────────────");
        println!("  Size:        {}x{}", metadata.width, metadata.height);
        println!("  Codec:       {}", metadata.codec);
        println!("  Frames:      {}", metadata.frame_count);
        println!("  FPS:         {:.3}", metadata.fps);
        println!("  Duration:    {:.2}s", metadata.duration);
        println!("  Frame type:  {:?}", metadata.frame_type);
        println!("  Levels:      {}", metadata.level_count);
        for level in &metadata.levels {
            println!(
                "    [{}] {}x{} (downsample {:.1})",
                level.level, level.width, level.height, level.downsample
            );
        }
    }

    if args.descriptors {
        let slide = match service.registry().get_video(&args.video).await {
            Ok(slide) => slide,
            Err(e) => {
                error!("Failed to open {}: {}", args.video, e);
                return ExitCode::FAILURE;
            }
        };
        println!();
        println!("Frames:");
        for (index, label) in slide.frame_descriptors().enumerate() {
            println!("  {:>6}  {}", index, label);
        }
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Export Command
// =============================================================================

async fn run_export<S: FrameSource>(service: &RegionService<S>, args: ExportArgs) -> ExitCode {
    let frame = match args.time {
        Some(seconds) => match service.registry().get_video(&args.video).await {
            Ok(slide) => {
                let frame = slide.time_to_frame(seconds);
                debug!(seconds, frame, "resolved time offset");
                i64::try_from(frame).unwrap_or(i64::MAX)
            }
            Err(e) => {
                error!("Failed to open {}: {}", args.video, e);
                return ExitCode::FAILURE;
            }
        },
        None => args.frame,
    };

    let request = args.request(frame);
    match service.read_region(&args.video, &request).await {
        Ok(response) => write_png(&args.out, &response).await,
        Err(e) => {
            error!("Failed to export region of {}: {}", args.video, e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Thumbnail Command
// =============================================================================

async fn run_thumbnail<S: FrameSource>(
    service: &RegionService<S>,
    args: ThumbnailArgs,
) -> ExitCode {
    match service.thumbnail(&args.video, args.max_dimension).await {
        Ok(response) => write_png(&args.out, &response).await,
        Err(e) => {
            error!("Failed to create thumbnail of {}: {}", args.video, e);
            ExitCode::FAILURE
        }
    }
}

async fn write_png(path: &Path, response: &RegionResponse) -> ExitCode {
    if let Err(e) = tokio::fs::write(path, &response.data).await {
        error!("Failed to write {}: {}", path.display(), e);
        return ExitCode::FAILURE;
    }

    info!(
        "Wrote {}x{} PNG ({} bytes) to {}",
        response.width,
        response.height,
        response.data.len(),
        path.display()
    );
    ExitCode::SUCCESS
}
