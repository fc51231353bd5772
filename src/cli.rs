//! Command-line argument parsing.

use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;

use crate::audio::TrackBuffer;
use crate::transport::format_time;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Cosmodrift")]
#[command(about = "Ambient cosmic particle background with a one-track audio player", long_about = None)]
pub struct Args {
    /// WAV track to play (visuals run without audio when omitted)
    pub track: Option<PathBuf>,

    /// Window width in pixels
    #[arg(long, value_name = "PIXELS", default_value = "1280")]
    pub width: u32,

    /// Window height in pixels
    #[arg(long, value_name = "PIXELS", default_value = "720")]
    pub height: u32,

    /// Seed for the initial sky layout (random when omitted)
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

impl Args {
    /// Decode the requested track, if any. Exits with a message when the
    /// file cannot be read; there is nothing sensible to render instead.
    pub fn load_track(&self) -> Option<TrackBuffer> {
        self.track.as_ref().map(|path| match TrackBuffer::load(path) {
            Ok(track) => {
                println!(
                    "Track: {} ({})",
                    path.display(),
                    format_time(track.duration())
                );
                track
            }
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        })
    }

    /// Random generator for entity placement, seeded for reproducible skies
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
