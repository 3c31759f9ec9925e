//! Ordered fallback over the vocoder strategies.
//!
//! Strategies are tried one after another until one produces a usable buffer.
//! When every strategy fails the selector still answers, with a plain sine of
//! the expected duration.

use crate::config::VocoderConfig;
use crate::error::{VocoderError, VocoderResult};
use crate::frame::SpectralFrames;
use crate::util::linspace;
use crate::vocoder::{AudioBuffer, Strategy, SynthContext, HARMONIC_TRACKING, PHONEME_AWARE, PHONEME_TRAINED, RELIABLE};
use log::{error, info, warn};
use std::f32::consts::TAU;
use std::panic::{catch_unwind, AssertUnwindSafe};

pub const FALLBACK_FREQ: f32 = 200.0;
pub const FALLBACK_AMPLITUDE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SynthesisRequest {
    pub has_phoneme_training_data: bool,
    pub token_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioSource {
    Strategy(&'static str),
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub audio: AudioBuffer,
    pub source: AudioSource,
}

pub fn default_chain(has_phoneme_training_data: bool) -> Vec<Strategy> {
    if has_phoneme_training_data {
        vec![PHONEME_TRAINED, PHONEME_AWARE, RELIABLE]
    } else {
        vec![PHONEME_AWARE, RELIABLE, HARMONIC_TRACKING]
    }
}

pub fn select(frames: &SpectralFrames, ctx: &SynthContext<'_>, chain: &[Strategy]) -> Selection {
    let expected = ctx.config.expected_samples(frames.n_frames());
    for strategy in chain {
        match run_guarded(strategy, frames, ctx).and_then(|audio| validate(audio, expected)) {
            Ok(audio) => {
                info!("Synthesised {} samples with the {} vocoder", audio.len(), strategy.name);
                return Selection {
                    audio,
                    source: AudioSource::Strategy(strategy.name),
                };
            }
            Err(e) => warn!("{} vocoder failed: {}", strategy.name, e),
        }
    }

    error!("All {} vocoder strategies failed, emitting fallback tone", chain.len());
    Selection {
        audio: sine_fallback(frames.n_frames(), ctx.config),
        source: AudioSource::Fallback,
    }
}

fn run_guarded(strategy: &Strategy, frames: &SpectralFrames, ctx: &SynthContext<'_>) -> VocoderResult<AudioBuffer> {
    catch_unwind(AssertUnwindSafe(|| (strategy.run)(frames, ctx))).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(VocoderError::strategy(format!("panicked: {}", message)))
    })
}

fn validate(audio: AudioBuffer, expected: usize) -> VocoderResult<AudioBuffer> {
    if audio.is_empty() {
        return Err(VocoderError::InvalidOutput("empty buffer".into()));
    }
    if audio.len() != expected {
        return Err(VocoderError::InvalidOutput(format!("{} samples, expected {}", audio.len(), expected)));
    }
    if let Some(index) = audio.samples.iter().position(|s| !s.is_finite()) {
        return Err(VocoderError::InvalidOutput(format!("non-finite sample at {}", index)));
    }
    Ok(audio)
}

/// `0.1 * sin(2 pi 200 t)` over the duration `n_frames` frames would cover.
pub fn sine_fallback(n_frames: usize, config: &VocoderConfig) -> AudioBuffer {
    let sample_rate = config.sample_rate.max(1);
    let duration = config.expected_duration(n_frames);
    let len = (duration * sample_rate as f64) as usize;
    let samples = linspace(0.0, duration as f32, len, true)
        .into_iter()
        .map(|t| FALLBACK_AMPLITUDE * (TAU * FALLBACK_FREQ * t).sin())
        .collect();
    AudioBuffer { samples, sample_rate }
}
