use super::{add_sine, frame_canvas, AudioBuffer, SynthContext};
use crate::error::VocoderResult;
use crate::frame::{has_shape, SpectralFrames};
use crate::postprocess::normalize_peak;
use crate::rng::{create_rng, random_phase, PHASE_STREAM};
use crate::util::linspace;

pub const BIN_GATE: f32 = -40.0;
pub const BIN_SCALE: f32 = 20.0;
pub const BIN_CEILING: f32 = 0.1;
pub const TARGET_PEAK: f32 = 0.8;

/// Every mel bin becomes an oscillator at its linearly mapped frequency.
pub fn render(frames: &SpectralFrames, ctx: &SynthContext<'_>) -> VocoderResult<AudioBuffer> {
    let config = ctx.config;
    let (mut samples, hop) = frame_canvas(frames, config);
    let mut rng = create_rng(config.seed, PHASE_STREAM);
    let freqs = linspace(0.0, (config.sample_rate / 2) as f32, frames.n_mels(), true);

    for (idx, (frame, out)) in frames.frames().zip(samples.chunks_exact_mut(hop)).enumerate() {
        if !has_shape(frame) {
            continue;
        }
        for (&magnitude, &freq) in frame.iter().zip(&freqs) {
            if magnitude <= BIN_GATE {
                continue;
            }
            let amp = (magnitude / BIN_SCALE).exp().min(BIN_CEILING);
            add_sine(out, idx * hop, config.sample_rate, freq, amp, random_phase(&mut rng));
        }
    }

    normalize_peak(&mut samples, TARGET_PEAK);

    Ok(AudioBuffer {
        samples,
        sample_rate: config.sample_rate,
    })
}
