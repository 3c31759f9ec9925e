//! Input conditioning ahead of synthesis.
//!
//! Raw model output can carry outliers, non-finite values or too few frames to
//! produce a useful waveform. `precondition` fixes all three and never fails:
//! whatever comes in, every value that leaves lies in the scale range.

use crate::config::VocoderConfig;
use crate::frame::SpectralFrames;
use crate::rng::{create_rng, gaussian, EXTENSION_STREAM};
use crate::util::lerp;
use log::debug;

pub const MEL_CLIP_MIN: f32 = -10.0;
pub const MEL_CLIP_MAX: f32 = 10.0;
pub const MEL_SCALE_MIN: f32 = -4.0;
pub const MEL_SCALE_MAX: f32 = 4.0;

pub const FRAMES_PER_TOKEN: usize = 15;
pub const EXTENSION_DECAY_END: f32 = 0.8;
pub const EXTENSION_NOISE: f32 = 0.05;

pub fn precondition(frames: &SpectralFrames, config: &VocoderConfig, token_count: usize) -> SpectralFrames {
    let mut out = frames.clone();
    if out.is_empty() {
        // nothing to rescale; extend from a silent frame at the configured width
        out = SpectralFrames::filled(0, config.n_mels, 0.0);
    }
    rescale(out.values_mut());
    extend(&mut out, config, token_count);
    out
}

/// Clips, then maps the clipped range onto the scale range. Infinities clip to
/// the clip bounds like any other outlier; NaN becomes 0.
pub fn rescale(values: &mut [f32]) {
    let (lo, hi) = values
        .iter()
        .filter(|v| !v.is_nan())
        .map(|v| v.clamp(MEL_CLIP_MIN, MEL_CLIP_MAX))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let span = hi - lo;
    let scale_span = MEL_SCALE_MAX - MEL_SCALE_MIN;

    for v in values.iter_mut() {
        if v.is_nan() {
            *v = 0.0;
            continue;
        }
        let clipped = v.clamp(MEL_CLIP_MIN, MEL_CLIP_MAX);
        let mapped = if span > 0.0 {
            MEL_SCALE_MIN + (clipped - lo) / span * scale_span
        } else {
            clipped
        };
        *v = mapped.clamp(MEL_SCALE_MIN, MEL_SCALE_MAX);
    }
}

pub fn extension_target(n_frames: usize, config: &VocoderConfig, token_count: usize) -> usize {
    if n_frames >= config.min_frame_length {
        return n_frames;
    }
    config.min_frame_length.max(token_count.saturating_mul(FRAMES_PER_TOKEN))
}

fn extend(frames: &mut SpectralFrames, config: &VocoderConfig, token_count: usize) {
    let n_frames = frames.n_frames();
    let target = extension_target(n_frames, config, token_count);
    let count = target - n_frames;
    if count == 0 {
        return;
    }

    let last = if n_frames > 0 {
        frames.frame(n_frames - 1).to_vec()
    } else {
        vec![0.0; frames.n_mels()]
    };
    let mut rng = create_rng(config.seed, EXTENSION_STREAM);
    let mut next = vec![0.0; last.len()];
    for i in 0..count {
        let t = if count > 1 { i as f32 / (count - 1) as f32 } else { 0.0 };
        let decay = lerp(1.0, EXTENSION_DECAY_END, t);
        for (dst, &src) in next.iter_mut().zip(&last) {
            let jitter = gaussian(&mut rng) * EXTENSION_NOISE;
            *dst = (src * decay + jitter).clamp(MEL_SCALE_MIN, MEL_SCALE_MAX);
        }
        frames.push_frame(&next);
    }
    debug!("Extended {} frames to {} (tokens: {})", n_frames, target, token_count);
}
