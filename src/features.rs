use crate::config::VocoderConfig;
use crate::frame::SpectralFrames;
use anyhow::{bail, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelFeatures {
    pub frames: SpectralFrames,
    pub sample_rate: u32,
    pub hop_length: usize,
    /// Text tokens the frames were generated from, when known.
    pub token_count: usize,
}

impl MelFeatures {
    pub fn new(frames: SpectralFrames, config: &VocoderConfig) -> Self {
        Self {
            frames,
            sample_rate: config.sample_rate,
            hop_length: config.hop_length,
            token_count: 0,
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        info!("Saving {} mel frames to {}", self.frames.n_frames(), path.display());
        let bin = bincode::serialize(self)?;
        let mut f = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        f.write_all(&bin)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading mel features from {}", path.display());
        let mut f = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let mut buf = Vec::new();
        f.read_to_end(&mut buf)?;
        let features: MelFeatures = bincode::deserialize(&buf)
            .with_context(|| format!("{} is not a mel feature file", path.display()))?;
        let frames = &features.frames;
        if SpectralFrames::from_flat(frames.n_mels(), frames.values().to_vec()).is_err() {
            bail!("{} holds a truncated mel matrix", path.display());
        }
        Ok(features)
    }

    pub fn check_framing(&self, config: &VocoderConfig) -> Result<()> {
        if self.sample_rate != config.sample_rate || self.hop_length != config.hop_length {
            bail!(
                "features were made at {}Hz / hop {}, config expects {}Hz / hop {}",
                self.sample_rate,
                self.hop_length,
                config.sample_rate,
                config.hop_length
            );
        }
        Ok(())
    }
}
