use std::path::PathBuf;

use clap::Parser;

/// famicore headless front end.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the iNES ROM file
    #[arg(required = true)]
    pub rom: PathBuf,

    /// Video scale factor (recorded in the config for graphical front ends)
    #[arg(short, long)]
    pub scale: Option<u32>,

    /// Desired window width; overrides the scale
    #[arg(short, long)]
    pub width: Option<u32>,

    /// Desired window height; overrides the scale
    #[arg(short = 'H', long)]
    pub height: Option<u32>,

    /// Path to the configuration file
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Number of frames to emulate before exiting
    #[arg(long, default_value_t = 60)]
    pub frames: u32,

    /// Write the final frame as a binary PPM to this path
    #[arg(long)]
    pub dump_frame: Option<PathBuf>,
}
