//! Phoneme-aware synthesis: classify each frame, then voice it with the
//! category's formants, its articulation texture and a short harmonic series.

use super::formant::add_formants;
use super::harmonic::{add_harmonics, BinMapping, HarmonicShape};
use super::texture::{add_texture, Texture, TextureParams};
use super::{frame_canvas, AudioBuffer, SynthContext};
use crate::config::VocoderConfig;
use crate::error::{VocoderError, VocoderResult};
use crate::filter::moving_average;
use crate::frame::{band_mean, has_shape, linear_energy, SpectralFrames};
use crate::phoneme::{classify, PhoneticTable};
use crate::postprocess::{fade_edges, normalize_peak};
use crate::rng::{create_rng, TEXTURE_STREAM};
use log::debug;

pub const ENERGY_GATE: f32 = 0.005;
pub const BASE_F0: f32 = 140.0;
pub const PITCH_BAND: usize = 12;
pub const PITCH_SPAN: f32 = 8.0;
pub const F0_MIN: f32 = 70.0;
pub const F0_MAX: f32 = 350.0;

pub const TARGET_PEAK: f32 = 0.35;
pub const SMOOTHING_WINDOW: usize = 7;
pub const FADE_RATIO: f32 = 0.005;

pub const HARMONICS: HarmonicShape = HarmonicShape {
    count: 5,
    mapping: BinMapping::Stride(10),
    scale: 15.0,
    rolloff: 0.7,
    gain: 1.0,
    ceiling: 0.15,
    gate: None,
};

pub fn render(frames: &SpectralFrames, ctx: &SynthContext<'_>) -> VocoderResult<AudioBuffer> {
    render_with_table(frames, ctx.config, PhoneticTable::standard())
}

/// Same synthesis driven by profiles measured from phoneme recordings.
pub fn render_trained(frames: &SpectralFrames, ctx: &SynthContext<'_>) -> VocoderResult<AudioBuffer> {
    let table = ctx.measured.ok_or(VocoderError::MissingMeasurements)?;
    render_with_table(frames, ctx.config, table)
}

pub fn frame_f0(frame: &[f32], pitch_mult: f32) -> f32 {
    let low = band_mean(frame, 0..PITCH_BAND);
    (BASE_F0 * pitch_mult * (1.0 + low / PITCH_SPAN)).clamp(F0_MIN, F0_MAX)
}

fn render_with_table(frames: &SpectralFrames, config: &VocoderConfig, table: &PhoneticTable) -> VocoderResult<AudioBuffer> {
    let (mut samples, hop) = frame_canvas(frames, config);
    let mut rng = create_rng(config.seed, TEXTURE_STREAM);
    let params = TextureParams {
        sample_rate: config.sample_rate,
        fricative_highpass: config.fricative_highpass,
    };

    let mut voiced = 0;
    for (idx, (frame, out)) in frames.frames().zip(samples.chunks_exact_mut(hop)).enumerate() {
        if !has_shape(frame) || linear_energy(frame) <= ENERGY_GATE {
            continue;
        }
        let start = idx * hop;
        let category = classify(frame);
        let profile = table.get(category);
        let f0 = frame_f0(frame, profile.pitch_mult);

        add_formants(out, start, frame, &profile.formants, config.sample_rate);
        if let Some(texture) = Texture::for_flags(profile.flags) {
            add_texture(texture, out, start, frame, f0, &params, &mut rng);
        }
        add_harmonics(out, start, frame, f0, &HARMONICS, config.sample_rate, None);
        voiced += 1;
    }
    debug!("Phoneme-aware: {}/{} frames voiced", voiced, frames.n_frames());

    normalize_peak(&mut samples, TARGET_PEAK);
    moving_average(&mut samples, SMOOTHING_WINDOW);
    fade_edges(&mut samples, FADE_RATIO);

    Ok(AudioBuffer {
        samples,
        sample_rate: config.sample_rate,
    })
}
