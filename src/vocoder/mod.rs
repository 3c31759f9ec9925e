//! Vocoder strategies and the generators they are composed from.
//!
//! Every strategy shares the [`StrategyFn`] signature: it reads a conditioned
//! frame matrix and returns exactly `n_frames * hop_length` samples, already
//! normalised to its own target peak. Strategies never share state; all
//! randomness comes from streams seeded by the config.

pub mod formant;
pub mod fullband;
pub mod harmonic;
pub mod phonetic;
pub mod reliable;
pub mod texture;
pub mod tracking;

use crate::config::VocoderConfig;
use crate::error::VocoderResult;
use crate::frame::SpectralFrames;
use crate::phoneme::PhoneticTable;
use crate::util::peak;
use std::f64::consts::TAU;

#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn silent(len: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![0.0; len],
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn peak(&self) -> f32 {
        peak(&self.samples)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SynthContext<'a> {
    pub config: &'a VocoderConfig,
    pub measured: Option<&'a PhoneticTable>,
}

pub type StrategyFn = fn(&SpectralFrames, &SynthContext<'_>) -> VocoderResult<AudioBuffer>;

#[derive(Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub run: StrategyFn,
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy").field("name", &self.name).finish()
    }
}

pub const PHONEME_TRAINED: Strategy = Strategy {
    name: "phoneme-trained",
    run: phonetic::render_trained,
};

pub const PHONEME_AWARE: Strategy = Strategy {
    name: "phoneme-aware",
    run: phonetic::render,
};

pub const HARMONIC_TRACKING: Strategy = Strategy {
    name: "harmonic-tracking",
    run: tracking::render,
};

pub const FULL_BAND: Strategy = Strategy {
    name: "full-band",
    run: fullband::render,
};

pub const RELIABLE: Strategy = Strategy {
    name: "reliable",
    run: reliable::render,
};

pub const ALL_STRATEGIES: [Strategy; 5] = [PHONEME_TRAINED, PHONEME_AWARE, HARMONIC_TRACKING, FULL_BAND, RELIABLE];

pub fn strategy_by_name(name: &str) -> Option<Strategy> {
    ALL_STRATEGIES.iter().copied().find(|s| s.name == name)
}

/// Adds `amp * sin(2 pi freq t + phase)` where `t` counts from the start of the
/// whole buffer, so a steady partial stays phase-continuous across frames.
pub(crate) fn add_sine(out: &mut [f32], start: usize, sample_rate: u32, freq: f32, amp: f32, phase: f32) {
    let step = TAU * freq as f64 / sample_rate as f64;
    let phase = phase as f64;
    for (n, sample) in out.iter_mut().enumerate() {
        let arg = step * (start + n) as f64 + phase;
        *sample += amp * arg.sin() as f32;
    }
}

pub(crate) fn frame_canvas(frames: &SpectralFrames, config: &VocoderConfig) -> (Vec<f32>, usize) {
    let hop = config.hop_length.max(1);
    (vec![0.0; frames.n_frames() * hop], hop)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_lookup() {
        assert_eq!(strategy_by_name("reliable").map(|s| s.name), Some("reliable"));
        assert!(strategy_by_name("griffin-lim").is_none());
    }

    #[test]
    fn test_add_sine_is_phase_continuous() {
        let mut whole = vec![0.0; 512];
        add_sine(&mut whole, 0, 22050, 440.0, 0.5, 0.0);

        let mut split = vec![0.0; 512];
        let (a, b) = split.split_at_mut(256);
        add_sine(a, 0, 22050, 440.0, 0.5, 0.0);
        add_sine(b, 256, 22050, 440.0, 0.5, 0.0);

        for (x, y) in whole.iter().zip(&split) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_buffer_helpers() {
        let buffer = AudioBuffer::silent(22050, 22050);
        assert_eq!(buffer.len(), 22050);
        assert!((buffer.duration_secs() - 1.0).abs() < 1e-9);
        assert_eq!(buffer.peak(), 0.0);
    }
}
