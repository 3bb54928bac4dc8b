//! dwplay - Main Entry Point

use std::borrow::Cow;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use dwp_js::ScriptHost;
use dwp_player::{run_snapshot, run_window, PlayerConfig};
use tracing_subscriber::EnvFilter;

/// dwplay: play a short canvas script, one `u(t)` call per frame
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the script file
    script: PathBuf,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 1920, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 1080, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// The window shows the canvas at 1/SCALE of its size
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    scale: u32,

    /// Window title
    #[arg(long, default_value = "Dwitter Player")]
    title: String,

    /// Render without a window up to SECONDS and save the last frame
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds, requires = "output")]
    snapshot: Option<f64>,

    /// PNG written by --snapshot
    #[arg(long, value_name = "PNG")]
    output: Option<PathBuf>,

    /// Frame rate used by --snapshot
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,
}

impl From<Args> for PlayerConfig {
    fn from(args: Args) -> Self {
        Self {
            script: args.script,
            width: args.width,
            height: args.height,
            scale: args.scale,
            title: args.title,
            snapshot: args.snapshot,
            output: args.output,
            fps: args.fps,
        }
    }
}

fn parse_seconds(text: &str) -> Result<f64, String> {
    let seconds: f64 = text.parse().map_err(|e| format!("{e}"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("expected a non-negative number of seconds, got {text}"));
    }
    Ok(seconds)
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // Usage errors are startup failures and exit 1; --help and --version exit 0
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error) => {
            error.print().ok();
            std::process::exit(if error.use_stderr() { 1 } else { 0 });
        }
    };
    let config = PlayerConfig::from(args);

    let bytes = std::fs::read(&config.script)
        .with_context(|| format!("Failed to read script {}", config.script.display()))?;
    let source = String::from_utf8_lossy(&bytes);
    if let Cow::Owned(_) = source {
        tracing::warn!("{} is not valid UTF-8; invalid bytes replaced", config.script.display());
    }

    let host = ScriptHost::new(&source, config.width, config.height)
        .inspect_err(|error| {
            if let Some(stack) = error.stack() {
                tracing::error!(target: "script", "{}", stack.trim_end());
            }
        })
        .with_context(|| format!("Failed to start {}", config.script.display()))?;

    tracing::info!("Playing {} at {}x{}", config.script.display(), config.width, config.height);

    match (config.snapshot, config.output.as_deref()) {
        (Some(until), Some(output)) => {
            run_snapshot(&config, host, until, output).context("Headless run failed")?;
        }
        _ => run_window(&config, host).context("Window run failed")?,
    }

    Ok(())
}
