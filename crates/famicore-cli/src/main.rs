mod args;
mod config;

use std::{fs::File, io::Write, path::Path, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use famicore_core::{
    ppu::palette::{MASTER_PALETTE, SCREEN_HEIGHT, SCREEN_WIDTH},
    Nes,
};

use crate::{args::Args, config::Config};

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load_or_create(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    // Width/height fold into the stored scale the way the original frontend
    // treated them; a windowed build picks the value up from the config.
    let scale = effective_scale(&args, &config);
    info!(scale, config = %args.config.display(), "famicore starting");

    let mut nes = Nes::new();
    nes.load_rom_from_file(&args.rom)
        .with_context(|| format!("loading {}", args.rom.display()))?;

    let start = Instant::now();
    for _ in 0..args.frames {
        nes.run_frame()?;
    }
    let elapsed = start.elapsed();

    let emulated_seconds = f64::from(args.frames) / 60.0;
    info!(
        frames = args.frames,
        cpu_cycles = nes.cpu_cycles(),
        elapsed_ms = elapsed.as_millis() as u64,
        speed = %format_args!("{:.1}x", emulated_seconds / elapsed.as_secs_f64().max(1e-9)),
        "emulation finished"
    );

    if let Some(path) = &args.dump_frame {
        dump_ppm(path, nes.framebuffer())
            .with_context(|| format!("writing frame to {}", path.display()))?;
        info!(path = %path.display(), "frame dumped");
    }

    Ok(())
}

fn effective_scale(args: &Args, config: &Config) -> u32 {
    if let Some(width) = args.width {
        return (width / SCREEN_WIDTH as u32).max(1);
    }
    if let Some(height) = args.height {
        return (height / SCREEN_HEIGHT as u32).max(1);
    }
    args.scale.unwrap_or(config.video.scale).max(1)
}

/// Writes the index buffer as a binary PPM through the master palette.
fn dump_ppm(path: &Path, indices: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    write!(file, "P6\n{SCREEN_WIDTH} {SCREEN_HEIGHT}\n255\n")?;
    let mut rgb = Vec::with_capacity(indices.len() * 3);
    for &index in indices {
        let (r, g, b) = MASTER_PALETTE[usize::from(index & 0x3F)];
        rgb.extend_from_slice(&[r, g, b]);
    }
    file.write_all(&rgb)?;
    Ok(())
}
