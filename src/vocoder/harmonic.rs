use super::add_sine;
use crate::frame::{band_argmax, has_shape, SpectralFrames};
use crate::rng::random_phase;
use log::debug;
use rand_pcg::Pcg32;

pub const TRACK_BAND: usize = 30;
/// The low band's peak must exceed this for a frame to count as voiced.
pub const TRACK_GATE: f32 = -35.0;
pub const F0_FLOOR: f32 = 80.0;
pub const F0_CEILING: f32 = 400.0;
pub const F0_STEP: f32 = 8.0;
/// Larger frame-to-frame jumps are averaged with the previous estimate.
pub const MAX_F0_JUMP: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinMapping {
    Stride(usize),
    Frequency,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicShape {
    pub count: usize,
    pub mapping: BinMapping,
    /// amplitude = exp(mel / scale) / h^rolloff * gain, capped at ceiling
    pub scale: f32,
    pub rolloff: f32,
    pub gain: f32,
    pub ceiling: f32,
    pub gate: Option<f32>,
}

impl HarmonicShape {
    pub fn amplitude(&self, energy: f32, harmonic: usize) -> f32 {
        let amp = (energy / self.scale).exp() / (harmonic as f32).powf(self.rolloff) * self.gain;
        amp.clamp(0.0, self.ceiling)
    }

    fn bin(&self, harmonic: usize, freq: f32, n_mels: usize, nyquist: f32) -> usize {
        let bin = match self.mapping {
            BinMapping::Stride(stride) => harmonic * stride,
            BinMapping::Frequency => (freq / nyquist * n_mels as f32) as usize,
        };
        bin.min(n_mels.saturating_sub(1))
    }
}

/// Accumulates harmonics 1..=count of `f0` into `out`. Harmonics at or above
/// Nyquist are skipped. With `phases`, each partial starts at a random phase.
pub fn add_harmonics(
    out: &mut [f32],
    start: usize,
    frame: &[f32],
    f0: f32,
    shape: &HarmonicShape,
    sample_rate: u32,
    mut phases: Option<&mut Pcg32>,
) {
    if f0 <= 0.0 || frame.is_empty() {
        return;
    }
    let nyquist = sample_rate as f32 / 2.0;
    for harmonic in 1..=shape.count {
        let freq = f0 * harmonic as f32;
        if freq >= nyquist {
            break;
        }
        let energy = frame[shape.bin(harmonic, freq, frame.len(), nyquist)];
        if shape.gate.is_some_and(|gate| energy <= gate) {
            continue;
        }
        let amp = shape.amplitude(energy, harmonic);
        let phase = phases.as_deref_mut().map_or(0.0, random_phase);
        add_sine(out, start, sample_rate, freq, amp, phase);
    }
}

/// Per-frame F0 from the position of the low-band peak. Unvoiced frames read 0.
pub fn track_f0(frames: &SpectralFrames) -> Vec<f32> {
    let mut f0 = vec![0.0f32; frames.n_frames()];
    for (i, frame) in frames.frames().enumerate() {
        if !has_shape(frame) {
            continue;
        }
        let Some((argmax, level)) = band_argmax(frame, 0..TRACK_BAND) else {
            continue;
        };
        if level <= TRACK_GATE {
            continue;
        }
        let mut estimate = (F0_FLOOR + argmax as f32 * F0_STEP).clamp(F0_FLOOR, F0_CEILING);
        if i > 0 && f0[i - 1] > 0.0 && (estimate - f0[i - 1]).abs() > MAX_F0_JUMP {
            estimate = (estimate + f0[i - 1]) / 2.0;
        }
        f0[i] = estimate;
    }
    let voiced = f0.iter().filter(|&&f| f > 0.0).count();
    debug!("F0 tracker: {}/{} frames voiced", voiced, f0.len());
    f0
}
