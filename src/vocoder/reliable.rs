use super::harmonic::{add_harmonics, BinMapping, HarmonicShape};
use super::{frame_canvas, AudioBuffer, SynthContext};
use crate::error::VocoderResult;
use crate::filter::moving_average;
use crate::frame::{band_mean, has_shape, linear_energy, SpectralFrames};
use crate::postprocess::normalize_peak;

pub const ENERGY_GATE: f32 = 0.01;
pub const BASE_F0: f32 = 150.0;
pub const PITCH_BAND: usize = 8;
pub const PITCH_SPAN: f32 = 10.0;
pub const F0_MIN: f32 = 80.0;
pub const F0_MAX: f32 = 400.0;
pub const TARGET_PEAK: f32 = 0.3;
pub const SMOOTHING_WINDOW: usize = 3;

pub const HARMONICS: HarmonicShape = HarmonicShape {
    count: 3,
    mapping: BinMapping::Stride(8),
    scale: 4.0,
    rolloff: 1.0,
    gain: 1.0,
    ceiling: 1.0,
    gate: None,
};

/// Three fixed harmonics gated on coarse frame energy. Cheapest strategy and
/// the one least likely to fail.
pub fn render(frames: &SpectralFrames, ctx: &SynthContext<'_>) -> VocoderResult<AudioBuffer> {
    let config = ctx.config;
    let (mut samples, hop) = frame_canvas(frames, config);

    for (idx, (frame, out)) in frames.frames().zip(samples.chunks_exact_mut(hop)).enumerate() {
        if !has_shape(frame) || linear_energy(frame) <= ENERGY_GATE {
            continue;
        }
        let low = band_mean(frame, 0..PITCH_BAND);
        let f0 = (BASE_F0 * (1.0 + low / PITCH_SPAN)).clamp(F0_MIN, F0_MAX);
        add_harmonics(out, idx * hop, frame, f0, &HARMONICS, config.sample_rate, None);
    }

    normalize_peak(&mut samples, TARGET_PEAK);
    moving_average(&mut samples, SMOOTHING_WINDOW);

    Ok(AudioBuffer {
        samples,
        sample_rate: config.sample_rate,
    })
}
