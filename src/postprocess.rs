use crate::filter::moving_average;
use crate::util::{linspace, peak};
use crate::vocoder::AudioBuffer;
use log::debug;

pub const CLIP_PEAK: f32 = 1.0;
pub const LOUD_TARGET: f32 = 0.8;
pub const QUIET_PEAK: f32 = 0.01;
pub const QUIET_TARGET: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PostProcessor {
    pub smoothing: Option<usize>,
    pub fade_ratio: Option<f32>,
}

impl PostProcessor {
    pub fn process(&self, mut buffer: AudioBuffer) -> AudioBuffer {
        let before = peak(&buffer.samples);
        let gain = if before > CLIP_PEAK {
            LOUD_TARGET / before
        } else if before > 0.0 && before < QUIET_PEAK {
            QUIET_TARGET / before
        } else {
            1.0
        };
        if gain != 1.0 {
            scale(&mut buffer.samples, gain);
        }
        if let Some(window) = self.smoothing {
            moving_average(&mut buffer.samples, window);
        }
        if let Some(ratio) = self.fade_ratio {
            fade_edges(&mut buffer.samples, ratio);
        }
        debug!("Post-processed {} samples: peak {:.6} -> {:.6}", buffer.samples.len(), before, peak(&buffer.samples));
        buffer
    }
}

fn scale(samples: &mut [f32], gain: f32) {
    samples.iter_mut().for_each(|s| *s *= gain);
}

pub fn normalize_peak(samples: &mut [f32], target: f32) {
    let max = peak(samples);
    if max > 0.0 {
        scale(samples, target / max);
    }
}

pub fn fade_edges(samples: &mut [f32], ratio: f32) {
    let fade = (samples.len() as f32 * ratio) as usize;
    if fade == 0 || fade * 2 > samples.len() {
        return;
    }
    let ramp = linspace(0.0, 1.0, fade, true);
    let len = samples.len();
    for (i, &g) in ramp.iter().enumerate() {
        samples[i] *= g;
        samples[len - 1 - i] *= g;
    }
}
