//! Formant clusters.
//!
//! A formant is approximated by three partials spread over its bandwidth
//! instead of a resonant filter. Each cluster's level follows the energy of
//! the mel bin nearest the formant's center frequency.

use super::add_sine;

pub const FORMANT_GATE: f32 = -35.0;
pub const FORMANT_SCALE: f32 = 12.0;
pub const FORMANT_GAIN: f32 = 0.08;
pub const FORMANT_CEILING: f32 = 0.2;
/// Bandwidth as a fraction of the center frequency.
pub const BANDWIDTH_RATIO: f32 = 0.08;

pub fn formant_bin(freq: f32, n_mels: usize, nyquist: f32) -> usize {
    ((freq * n_mels as f32 / nyquist) as usize).min(n_mels.saturating_sub(1))
}

pub fn formant_amplitude(energy: f32) -> f32 {
    ((energy / FORMANT_SCALE).exp() * FORMANT_GAIN).clamp(0.0, FORMANT_CEILING)
}

pub fn add_formants(out: &mut [f32], start: usize, frame: &[f32], formants: &[f32; 3], sample_rate: u32) {
    if frame.is_empty() {
        return;
    }
    let nyquist = sample_rate as f32 / 2.0;
    for &center in formants {
        if center >= nyquist {
            continue;
        }
        let energy = frame[formant_bin(center, frame.len(), nyquist)];
        if energy <= FORMANT_GATE {
            continue;
        }
        let amp = formant_amplitude(energy) / 3.0;
        let half_bw = center * BANDWIDTH_RATIO / 2.0;
        for freq in [center - half_bw, center, center + half_bw] {
            if freq > 0.0 && freq < nyquist {
                add_sine(out, start, sample_rate, freq, amp, 0.0);
            }
        }
    }
}
