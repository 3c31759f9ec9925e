use crate::error::{VocoderError, VocoderResult};
use knuffel::Decode;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocoderConfig {
    pub sample_rate: u32,
    pub hop_length: usize,
    pub n_fft: usize,
    pub n_mels: usize,
    pub min_frame_length: usize,
    /// Seed for every noise stream (extension jitter, textures, random phases).
    pub seed: u64,
    pub fricative_highpass: bool,
}

impl Default for VocoderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            hop_length: 256,
            n_fft: 2048,
            n_mels: 80,
            min_frame_length: 50,
            seed: 0,
            fricative_highpass: true,
        }
    }
}

impl VocoderConfig {
    pub fn expected_samples(&self, n_frames: usize) -> usize {
        n_frames * self.hop_length
    }

    pub fn expected_duration(&self, n_frames: usize) -> f64 {
        self.expected_samples(n_frames) as f64 / self.sample_rate as f64
    }

    pub fn validate(&self) -> VocoderResult<()> {
        if self.sample_rate == 0 {
            return Err(VocoderError::invalid_config("sample_rate", "must be positive"));
        }
        if self.hop_length == 0 {
            return Err(VocoderError::invalid_config("hop_length", "must be positive"));
        }
        if self.n_mels == 0 {
            return Err(VocoderError::invalid_config("n_mels", "must be positive"));
        }
        if self.n_fft < 2 {
            return Err(VocoderError::invalid_config("n_fft", "must be at least 2"));
        }
        Ok(())
    }
}

/// A `mora` KDL document:
///
/// ```kdl
/// vocoder sample-rate=48000 hop-length=512 seed=7
/// profile "a" f1=750.0 f2=1150.0 f3=2500.0 pitch=1.05
/// ```
#[derive(Decode, Debug, Clone)]
pub struct MoraConfig {
    #[knuffel(child)]
    pub vocoder: Option<VocoderSection>,
    #[knuffel(children(name = "profile"))]
    pub profiles: Vec<ProfileOverride>,
}

#[derive(Decode, Debug, Clone)]
pub struct VocoderSection {
    #[knuffel(property(name = "sample-rate"), default)]
    pub sample_rate: Option<u32>,
    #[knuffel(property(name = "hop-length"), default)]
    pub hop_length: Option<u32>,
    #[knuffel(property(name = "n-fft"), default)]
    pub n_fft: Option<u32>,
    #[knuffel(property(name = "n-mels"), default)]
    pub n_mels: Option<u32>,
    #[knuffel(property(name = "min-frame-length"), default)]
    pub min_frame_length: Option<u32>,
    #[knuffel(property(name = "seed"), default)]
    pub seed: Option<u64>,
    #[knuffel(property(name = "fricative-highpass"), default)]
    pub fricative_highpass: Option<bool>,
}

/// Measured values for one phonetic category; unset fields keep the standard profile.
#[derive(Decode, Debug, Clone)]
pub struct ProfileOverride {
    #[knuffel(argument)]
    pub name: String,
    #[knuffel(property(name = "f1"), default)]
    pub f1: Option<f32>,
    #[knuffel(property(name = "f2"), default)]
    pub f2: Option<f32>,
    #[knuffel(property(name = "f3"), default)]
    pub f3: Option<f32>,
    #[knuffel(property(name = "pitch"), default)]
    pub pitch: Option<f32>,
}

impl MoraConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("config.kdl");
        Self::parse(name, &content)
    }

    pub fn parse(file_name: &str, content: &str) -> anyhow::Result<Self> {
        let config = knuffel::parse(file_name, content)?;
        Ok(config)
    }

    pub fn apply(&self, base: VocoderConfig) -> VocoderConfig {
        let Some(section) = &self.vocoder else {
            return base;
        };
        VocoderConfig {
            sample_rate: section.sample_rate.unwrap_or(base.sample_rate),
            hop_length: section.hop_length.map_or(base.hop_length, |v| v as usize),
            n_fft: section.n_fft.map_or(base.n_fft, |v| v as usize),
            n_mels: section.n_mels.map_or(base.n_mels, |v| v as usize),
            min_frame_length: section
                .min_frame_length
                .map_or(base.min_frame_length, |v| v as usize),
            seed: section.seed.unwrap_or(base.seed),
            fricative_highpass: section.fricative_highpass.unwrap_or(base.fricative_highpass),
        }
    }
}

impl Default for MoraConfig {
    fn default() -> Self {
        Self {
            vocoder: None,
            profiles: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VocoderConfig::default();
        assert_eq!(config.sample_rate, 22050);
        assert_eq!(config.hop_length, 256);
        assert_eq!(config.n_mels, 80);
        assert_eq!(config.min_frame_length, 50);
        assert_eq!(config.expected_samples(50), 12800);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_hop() {
        let config = VocoderConfig {
            hop_length: 0,
            ..VocoderConfig::default()
        };
        assert!(config.validate().unwrap_err().is_precondition());
    }

    #[test]
    fn test_kdl_overrides() {
        let doc = r#"
vocoder sample-rate=48000 hop-length=512 seed=7 fricative-highpass=false
profile "a" f1=750.0 pitch=1.05
profile "shi" f3=3300.0
"#;
        let parsed = MoraConfig::parse("test.kdl", doc).unwrap();
        let config = parsed.apply(VocoderConfig::default());
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.hop_length, 512);
        assert_eq!(config.seed, 7);
        assert!(!config.fricative_highpass);
        assert_eq!(config.n_mels, 80);
        assert_eq!(parsed.profiles.len(), 2);
        assert_eq!(parsed.profiles[0].name, "a");
        assert_eq!(parsed.profiles[0].f1, Some(750.0));
        assert_eq!(parsed.profiles[0].f2, None);
        assert_eq!(parsed.profiles[1].f3, Some(3300.0));
    }

    #[test]
    fn test_empty_document_keeps_defaults() {
        let parsed = MoraConfig::parse("empty.kdl", "").unwrap();
        assert_eq!(parsed.apply(VocoderConfig::default()), VocoderConfig::default());
    }
}
