use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mashup", about = "Automatic DJ-style mashup renderer")]
pub struct Cli {
    /// Input tracks: local files (WAV, MP3, FLAC, OGG) or http(s) URLs. At least two.
    pub inputs: Vec<String>,

    /// Output WAV file
    #[arg(short, long, default_value = "mashup.wav")]
    pub output: PathBuf,

    /// Write the per-track analysis and timeline as JSON
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Config file (defaults to mashup.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Length of each non-final segment in seconds
    #[arg(long, default_value_t = 30.0)]
    pub segment: f64,

    /// Crossfade length in seconds
    #[arg(long, default_value_t = 8.0)]
    pub transition: f64,

    /// Fade on the outer edges of the mix in seconds
    #[arg(long, default_value_t = 2.0)]
    pub edge_fade: f64,

    /// Linear gain applied after the master limiter
    #[arg(long, default_value_t = 1.8)]
    pub makeup_gain: f32,

    /// Only analyze the inputs and print the report
    #[arg(long)]
    pub analyze_only: bool,
}
