use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rule-based mel spectrogram vocoder.")]
#[command(allow_negative_numbers = true)]
pub struct Cli {
    /// KDL config file; defaults to config.kdl in the user config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute log-mel frames from an audio file.
    Analyze {
        audio: PathBuf,
        features: PathBuf,
    },
    /// Synthesise a WAV file from stored mel frames.
    Render {
        features: PathBuf,
        out_file: PathBuf,
        /// Directory of recorded phonemes; a profiles.kdl inside supplies measured formants.
        #[arg(long)]
        phoneme_data: Option<PathBuf>,
        /// Token count of the source text, overrides the one stored with the frames.
        #[arg(long)]
        tokens: Option<usize>,
        /// Run a single named strategy instead of the default chain.
        #[arg(long)]
        strategy: Option<String>,
    },
    /// Print the phonetic category of every frame.
    Classify {
        features: PathBuf,
    },
}
