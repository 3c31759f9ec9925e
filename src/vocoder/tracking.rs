use super::harmonic::{add_harmonics, track_f0, BinMapping, HarmonicShape};
use super::{frame_canvas, AudioBuffer, SynthContext};
use crate::error::VocoderResult;
use crate::frame::SpectralFrames;
use crate::postprocess::{fade_edges, normalize_peak};
use crate::rng::{create_rng, PHASE_STREAM};

pub const TARGET_PEAK: f32 = 0.7;
pub const FADE_RATIO: f32 = 0.02;

pub const HARMONICS: HarmonicShape = HarmonicShape {
    count: 7,
    mapping: BinMapping::Frequency,
    scale: 25.0,
    rolloff: 0.7,
    gain: 0.15,
    ceiling: 1.0,
    gate: Some(-45.0),
};

/// Harmonic series over a tracked F0, no phoneme classification.
pub fn render(frames: &SpectralFrames, ctx: &SynthContext<'_>) -> VocoderResult<AudioBuffer> {
    let config = ctx.config;
    let f0 = track_f0(frames);
    let (mut samples, hop) = frame_canvas(frames, config);
    let mut rng = create_rng(config.seed, PHASE_STREAM);

    for (idx, (frame, out)) in frames.frames().zip(samples.chunks_exact_mut(hop)).enumerate() {
        if f0[idx] > 0.0 {
            add_harmonics(out, idx * hop, frame, f0[idx], &HARMONICS, config.sample_rate, Some(&mut rng));
        }
    }

    normalize_peak(&mut samples, TARGET_PEAK);
    fade_edges(&mut samples, FADE_RATIO);

    Ok(AudioBuffer {
        samples,
        sample_rate: config.sample_rate,
    })
}
