mod cli;

use rush_common::StopCode;
use rush_media::{Frame, FrameReader, FrameType, SinkTarget};
use rush_output::{
    config,
    synthetic::{SyntheticHost, SyntheticSource},
    OutputState, RushOutput,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // RUST_LOG wins, then --verbose, then the config file's filter
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "rush_output=trace,rush_media=trace,rush_common=debug".to_string()
        } else {
            config::load_config_or_default(cli.config.as_deref())
                .ok()
                .and_then(|c| c.logging.filter)
                .unwrap_or_else(|| "rush_output=info,rush_media=info,rush_common=info".to_string())
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate {
            output,
            seconds,
            stop_after_ms,
        } => generate(cli.config.as_deref(), output, seconds, stop_after_ms),
        Commands::Inspect { file, json } => inspect_file(&file, json),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("rush-output {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn generate(
    config_path: Option<&Path>,
    output_path: Option<PathBuf>,
    seconds: u64,
    stop_after_ms: Option<u64>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let target = match output_path {
        Some(path) => SinkTarget::File {
            path,
            sync_on_close: config.output.sync_on_close,
        },
        None => config.output.sink_target(),
    };
    let path = target.describe();

    let stop_after_usec = stop_after_ms.map_or(seconds.saturating_mul(1_000_000), |ms| {
        ms.saturating_mul(1000)
    });
    if stop_after_usec == 0 {
        anyhow::bail!("Capture length must be greater than zero");
    }

    let host = Arc::new(SyntheticHost::new());
    let output = Arc::new(RushOutput::new(host.clone(), host.clone(), target));
    output.start().context("Failed to start RUSH output")?;

    // The synthetic clock starts at zero, so the threshold is the capture length.
    output.stop(stop_after_usec.saturating_mul(1000));

    // Run past the threshold so a packet at or after it arrives.
    let source = SyntheticSource::for_host(
        host.as_ref(),
        0,
        i64::try_from(stop_after_usec)?.saturating_add(1_000_000),
    );
    let encoder = {
        let output = output.clone();
        std::thread::spawn(move || {
            for packet in source {
                if output.state() == OutputState::Finalized {
                    break;
                }
                output.encoded_packet(&packet);
            }
        })
    };
    encoder
        .join()
        .map_err(|_| anyhow::anyhow!("Encoder thread panicked"))?;

    if output.state().is_active() {
        tracing::warn!("Source ended before the stop threshold");
        output.force_stop(StopCode::Success);
    }

    let stats = output.stats().unwrap_or_default();
    println!("Output: {}", path.display());
    println!(
        "Frames: {} (video {}, audio {})",
        stats.frames_written, stats.video_frames, stats.audio_frames
    );
    println!("Size: {} bytes", stats.bytes_written);
    if stats.write_errors > 0 {
        anyhow::bail!("{} frames failed to write", stats.write_errors);
    }

    Ok(())
}

fn inspect_file(file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let reader = std::io::BufReader::new(
        std::fs::File::open(file).with_context(|| format!("Failed to open {:?}", file))?,
    );

    let mut video = 0u64;
    let mut audio = 0u64;
    let mut total = 0u64;
    for (index, frame) in FrameReader::new(reader).enumerate() {
        let frame = frame.with_context(|| format!("Invalid frame at index {}", index))?;
        total += 1;
        match frame.frame_type() {
            Some(FrameType::Video) => video += 1,
            Some(FrameType::Audio) => audio += 1,
            _ => {}
        }

        if json {
            println!("{}", serde_json::to_string(&frame)?);
            continue;
        }

        match &frame {
            Frame::Connect {
                id,
                version,
                video_timescale,
                audio_timescale,
                broadcast_id,
                payload,
            } => println!(
                "#{} connect v{} video_timescale={} audio_timescale={} broadcast={} payload={:?}",
                id,
                version,
                video_timescale,
                audio_timescale,
                broadcast_id,
                String::from_utf8_lossy(payload)
            ),
            Frame::Video {
                id,
                pts,
                dts,
                track_id,
                payload,
                ..
            } => println!(
                "#{} video track={} pts={} dts={} size={}",
                id,
                track_id,
                pts,
                dts,
                payload.len()
            ),
            Frame::Audio {
                id,
                dts,
                track_id,
                extradata,
                payload,
                ..
            } => println!(
                "#{} audio track={} dts={} extradata={} size={}",
                id,
                track_id,
                dts,
                extradata.len(),
                payload.len()
            ),
            Frame::Unknown { id, tag, body } => {
                println!("#{} unknown tag=0x{:02x} size={}", id, tag, body.len())
            }
        }
    }

    if !json {
        println!("\nFrames: {} (video {}, audio {})", total, video, audio);
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("✓ Configuration is valid");
    println!("  Output: {}", config.output.path.display());
    println!("  Sync on close: {}", config.output.sync_on_close);
    if let Some(ref filter) = config.logging.filter {
        println!("  Log filter: {}", filter);
    }

    Ok(())
}
