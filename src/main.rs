use anyhow::{Context, Result};
use clap::Parser;
use cloak_fx::capture::WebcamOpener;
use cloak_fx::controls::{self, Command};
use cloak_fx::output::{OutputSink, PngSequenceOutput, V4L2Output};
use cloak_fx::{
    CloakConfig, CloakError, CloakPipeline, EventSink, PipelineState, SourceOpener, StepOutcome,
    TracingEvents,
};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file with color ranges, mask refinement and background capture settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output v4l2loopback device path
    #[arg(short, long, default_value = "/dev/video10")]
    output_device: PathBuf,

    /// Write rendered frames as numbered PNG files here instead of a loopback device
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Output resolution width (loopback device only)
    #[arg(long, default_value_t = 1280)]
    output_width: u32,

    /// Output resolution height (loopback device only)
    #[arg(long, default_value_t = 720)]
    output_height: u32,

    /// Show the refined mask (white = cloak) instead of the composite
    #[arg(long)]
    show_mask: bool,

    /// Wait for a `start` command instead of starting the camera right away
    #[arg(long)]
    paused: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("cloak-fx starting");

    let config = match &args.config {
        Some(path) => CloakConfig::load(path).context("Failed to load config")?,
        None => CloakConfig::default(),
    };
    tracing::debug!("Config: {:?}", config);

    let mut output: Box<dyn OutputSink> = match &args.output_dir {
        Some(dir) => Box::new(PngSequenceOutput::new(dir)?),
        None => Box::new(
            V4L2Output::new(&args.output_device, args.output_width, args.output_height)
                .context("Failed to initialize v4l2loopback output")?,
        ),
    };

    match output.resolution() {
        Some((width, height)) => tracing::info!("Output: {}x{}", width, height),
        None => tracing::info!("Output: camera resolution"),
    }

    let (tx, rx) = mpsc::channel();
    controls::install_ctrlc(tx.clone()).context("Failed to install Ctrl+C handler")?;
    controls::spawn_stdin_reader(tx).context("Failed to spawn command reader")?;

    tracing::info!("Commands: start (s), stop (x), recapture (r), quit (q)");
    tracing::info!("Wear something bright red, start the camera and step out of view");

    let mut pipeline = config.build_pipeline(WebcamOpener::default());
    run_pipeline(&mut pipeline, output.as_mut(), rx, !args.paused, args.show_mask)?;

    tracing::info!("cloak-fx stopped");
    Ok(())
}

fn run_pipeline<O: SourceOpener>(
    pipeline: &mut CloakPipeline<O>,
    output: &mut dyn OutputSink,
    commands: Receiver<Command>,
    autostart: bool,
    show_mask: bool,
) -> Result<()> {
    let mut state = PipelineState::new();
    let mut events = TracingEvents;
    let mut stats = FrameStats::default();

    if autostart {
        apply(Command::Start, pipeline, &mut state, &mut events);
    }

    loop {
        // Commands only take effect between frames
        if !state.is_running() {
            match commands.recv() {
                Ok(command) => {
                    if !apply(command, pipeline, &mut state, &mut events) {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
        let mut quit = false;
        while let Ok(command) = commands.try_recv() {
            if !apply(command, pipeline, &mut state, &mut events) {
                quit = true;
                break;
            }
        }
        if quit {
            break;
        }

        let step_start = Instant::now();
        let outcome = match pipeline.step(&mut state, &mut events) {
            Ok(outcome) => outcome,
            Err(CloakError::ReadError(_)) => {
                tracing::info!("Issue `start` to try again");
                continue;
            }
            Err(e) => return Err(e).context("Pipeline failed"),
        };
        let step_time = step_start.elapsed();

        if let StepOutcome::Rendered(processed) = outcome {
            let image = if show_mask {
                processed.mask_rgb()
            } else {
                processed.to_rgb()
            };

            let output_start = Instant::now();
            output
                .write_frame(&image)
                .context("Failed to write frame")?;
            stats.record(step_time, output_start.elapsed());
        }
    }

    pipeline.stop(&mut state);
    Ok(())
}

/// Apply one command. Returns false when the host should exit.
fn apply<O: SourceOpener>(
    command: Command,
    pipeline: &mut CloakPipeline<O>,
    state: &mut PipelineState,
    events: &mut dyn EventSink,
) -> bool {
    tracing::debug!("Command: {:?}", command);
    match command {
        Command::Start => {
            if let Err(e) = pipeline.start(state, events) {
                tracing::warn!("{}; issue `start` to retry", e);
            }
        }
        Command::Stop => pipeline.stop(state),
        Command::Recapture => pipeline.recapture(state, events),
        Command::Quit => return false,
    }
    true
}

/// Rolling frame timing, logged every 30 rendered frames
#[derive(Default)]
struct FrameStats {
    frames: u64,
    total_step: Duration,
    total_output: Duration,
}

impl FrameStats {
    fn record(&mut self, step: Duration, output: Duration) {
        self.frames += 1;
        self.total_step += step;
        self.total_output += output;

        if self.frames % 30 == 0 {
            let n = self.frames as f64;
            let avg_step_ms = self.total_step.as_secs_f64() * 1000.0 / n;
            let avg_output_ms = self.total_output.as_secs_f64() * 1000.0 / n;
            let total_ms = avg_step_ms + avg_output_ms;

            tracing::info!(
                "Frame {}: capture+cloak={:.1}ms, output={:.1}ms, total={:.1}ms, fps={:.1}",
                self.frames,
                avg_step_ms,
                avg_output_ms,
                total_ms,
                1000.0 / total_ms
            );
        }
    }
}
