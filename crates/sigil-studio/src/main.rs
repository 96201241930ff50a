use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use sigil_engine::backend::{SoftwareBackend, SoftwareConfig};
use sigil_engine::logging::{init_logging, LoggingConfig};
use sigil_engine::paint::Color;
use sigil_engine::pixels::PixelBuffer;
use sigil_engine::render::{RenderConfig, RenderContext};

mod scene;

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum BackendKind {
    Software,
    #[cfg(feature = "gpu")]
    Gpu,
}

/// Renders the demo scene off-screen and writes it as a PNG.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    #[arg(long, default_value_t = 480)]
    width: u32,
    #[arg(long, default_value_t = 320)]
    height: u32,
    /// Clock fill progress in degrees (0-360)
    #[arg(long, short, default_value_t = 225.0)]
    progress: f32,
    /// Fan tessellation step in degrees
    #[arg(long, default_value_t = 5.0)]
    circle_step: f32,
    #[arg(long, value_enum, default_value_t = BackendKind::Software)]
    backend: BackendKind,
    /// Log filter in env_logger syntax
    #[arg(long)]
    log: Option<String>,
    /// Output file
    #[arg(long, short, default_value = "sigil.png")]
    out: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log.clone().map(LoggingConfig::with_filter).unwrap_or_default());

    let config = RenderConfig { circle_step: args.circle_step, ..RenderConfig::default() };
    let frame = match args.backend {
        BackendKind::Software => render_software(&args, config)?,
        #[cfg(feature = "gpu")]
        BackendKind::Gpu => render_gpu(&args, config)?,
    };

    frame
        .to_image()
        .save(&args.out)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    log::info!("wrote {}x{} frame to {}", frame.width(), frame.height(), args.out.display());
    Ok(())
}

fn render_software(args: &Args, config: RenderConfig) -> Result<PixelBuffer> {
    let mut backend = SoftwareBackend::new(SoftwareConfig {
        width: args.width,
        height: args.height,
        clear: Color::BLACK,
    });
    let mut ctx = RenderContext::with_config(&mut backend, config);
    scene::draw(&mut ctx, args.progress).context("demo scene rejected")?;
    drop(ctx);
    Ok(backend.frame().clone())
}

#[cfg(feature = "gpu")]
fn render_gpu(args: &Args, config: RenderConfig) -> Result<PixelBuffer> {
    use sigil_engine::backend::GpuBackend;

    let mut backend = GpuBackend::headless(args.width, args.height, Color::BLACK)
        .context("failed to set up the gpu backend")?;
    let mut ctx = RenderContext::with_config(&mut backend, config);
    scene::draw(&mut ctx, args.progress).context("demo scene rejected")?;
    drop(ctx);
    Ok(backend.read_frame())
}
