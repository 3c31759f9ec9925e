//! Log-mel analysis of recorded audio.
//!
//! Produces matrices in the same layout the vocoder consumes, so recordings
//! can be pushed through the pipeline and inspected with the classifier.

use crate::config::VocoderConfig;
use crate::error::{VocoderError, VocoderResult};
use crate::frame::SpectralFrames;
use crate::util::{hz_to_mel, mel_to_hz};
use log::{debug, info};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

pub const LOG_FLOOR: f32 = 1e-5;

pub struct MelAnalyzer {
    n_fft: usize,
    hop_length: usize,
    window: Vec<f32>,
    filterbank: Vec<Vec<f32>>,
    fft: Arc<dyn Fft<f32>>,
}

impl MelAnalyzer {
    pub fn new(config: &VocoderConfig) -> VocoderResult<Self> {
        config.validate()?;
        let n_fft = config.n_fft;
        let window = (0..n_fft)
            .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n_fft as f32).cos()))
            .collect();
        let filterbank = mel_filterbank(config.sample_rate, n_fft, config.n_mels);
        let fft = FftPlanner::new().plan_fft_forward(n_fft);
        Ok(Self {
            n_fft,
            hop_length: config.hop_length,
            window,
            filterbank,
            fft,
        })
    }

    /// One frame per hop starting at sample 0, each window zero-padded past the end.
    pub fn analyze(&self, samples: &[f32]) -> VocoderResult<SpectralFrames> {
        let n_frames = samples.len().div_ceil(self.hop_length);
        info!("Analysing {} samples into {} mel frames", samples.len(), n_frames);

        let mut rows = Vec::with_capacity(n_frames);
        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.n_fft];
        for frame in 0..n_frames {
            let start = frame * self.hop_length;
            for (i, slot) in buffer.iter_mut().enumerate() {
                let x = samples.get(start + i).copied().unwrap_or(0.0);
                *slot = Complex::new(x * self.window[i], 0.0);
            }
            self.fft.process(&mut buffer);
            let magnitude: Vec<f32> = buffer[..self.n_fft / 2 + 1].iter().map(|c| c.norm()).collect();
            rows.push(
                self.filterbank
                    .iter()
                    .map(|weights| {
                        let energy: f32 = weights.iter().zip(&magnitude).map(|(w, m)| w * m).sum();
                        energy.max(LOG_FLOOR).ln()
                    })
                    .collect(),
            );
        }
        debug!("Mel analysis done: {} frames x {} bins", rows.len(), self.filterbank.len());
        SpectralFrames::from_rows(rows)
    }
}

/// Triangular HTK-mel filters from 0 Hz to Nyquist over the `n_fft / 2 + 1` bins.
pub fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Vec<Vec<f32>> {
    let n_bins = n_fft / 2 + 1;
    let nyquist = sample_rate as f64 / 2.0;
    let top = hz_to_mel(nyquist);
    let edges: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(top * i as f64 / (n_mels + 1) as f64))
        .collect();
    let bin_hz = sample_rate as f64 / n_fft as f64;

    (0..n_mels)
        .map(|m| {
            let (lower, center, upper) = (edges[m], edges[m + 1], edges[m + 2]);
            (0..n_bins)
                .map(|k| {
                    let f = k as f64 * bin_hz;
                    let rising = (f - lower) / (center - lower);
                    let falling = (upper - f) / (upper - center);
                    rising.min(falling).max(0.0) as f32
                })
                .collect()
        })
        .collect()
}

pub fn analyze(samples: &[f32], config: &VocoderConfig) -> VocoderResult<SpectralFrames> {
    if samples.is_empty() {
        return Err(VocoderError::invalid_config("audio", "no samples to analyse"));
    }
    MelAnalyzer::new(config)?.analyze(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::band_argmax;

    #[test]
    fn test_filterbank_shape() {
        let bank = mel_filterbank(22050, 2048, 80);
        assert_eq!(bank.len(), 80);
        assert!(bank.iter().all(|f| f.len() == 1025));
        assert!(bank.iter().all(|f| f.iter().any(|&w| w > 0.0)));
        assert!(bank.iter().flatten().all(|&w| (0.0..=1.0).contains(&w)));
    }

    #[test]
    fn test_frame_count() {
        let config = VocoderConfig::default();
        let frames = analyze(&vec![0.0; 2560], &config).unwrap();
        assert_eq!(frames.n_frames(), 10);
        assert_eq!(frames.n_mels(), 80);
        assert!(frames.values().iter().all(|&v| (v - LOG_FLOOR.ln()).abs() < 1e-3));
    }

    #[test]
    fn test_tone_lands_in_its_band() {
        let config = VocoderConfig::default();
        let freq = 1000.0;
        let samples: Vec<f32> = (0..8192)
            .map(|n| (2.0 * std::f32::consts::PI * freq * n as f32 / 22050.0).sin() * 0.5)
            .collect();
        let frames = analyze(&samples, &config).unwrap();
        let bank = mel_filterbank(22050, 2048, 80);
        let tone_bin = (freq / (22050.0 / 2048.0)).round() as usize;
        let expected = (0..80)
            .max_by(|&a, &b| bank[a][tone_bin].total_cmp(&bank[b][tone_bin]))
            .unwrap();
        let (peak, _) = band_argmax(frames.frame(8), 0..80).unwrap();
        assert!((peak as isize - expected as isize).abs() <= 1, "peak {} expected {}", peak, expected);
    }

    #[test]
    fn test_empty_audio_is_rejected() {
        assert!(analyze(&[], &VocoderConfig::default()).is_err());
    }
}
