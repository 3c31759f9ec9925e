use super::add_sine;
use crate::filter::highpass;
use crate::frame::{band_mean, band_mean_from};
use crate::phoneme::Articulation;
use crate::util::mean;
use log::debug;
use rand::Rng;
use rand_pcg::Pcg32;

pub const BURST_BAND: std::ops::Range<usize> = 20..40;
pub const BURST_GATE: f32 = -30.0;
pub const BURST_LEVEL: f32 = 0.05;
pub const BURST_SPAN: f32 = 0.1;

pub const FRICATIVE_BAND_START: usize = 30;
pub const FRICATIVE_GATE: f32 = -35.0;
pub const FRICATIVE_LEVEL: f32 = 0.03;
pub const FRICATIVE_CUTOFF: f32 = 2000.0;

pub const NASAL_BAND: std::ops::Range<usize> = 0..20;
pub const NASAL_FREQ: f32 = 1000.0;
pub const NASAL_SCALE: f32 = 15.0;
pub const NASAL_GAIN: f32 = 0.05;
pub const NASAL_CEILING: f32 = 0.1;

pub const BREATH_GATE: f32 = -30.0;
pub const BREATH_LEVEL: f32 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Texture {
    Burst,
    Fricative,
    Nasal,
    Breath,
}

impl Texture {
    /// The single texture a category gets. Liquids, glides and plosives have none.
    pub fn for_flags(flags: Articulation) -> Option<Texture> {
        if flags.contains(Articulation::BURST) {
            Some(Texture::Burst)
        } else if flags.contains(Articulation::FRICATIVE) {
            Some(Texture::Fricative)
        } else if flags.contains(Articulation::NASAL) {
            Some(Texture::Nasal)
        } else if flags.contains(Articulation::BREATH) {
            Some(Texture::Breath)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TextureParams {
    pub sample_rate: u32,
    pub fricative_highpass: bool,
}

pub fn add_texture(
    texture: Texture,
    out: &mut [f32],
    start: usize,
    frame: &[f32],
    f0: f32,
    params: &TextureParams,
    rng: &mut Pcg32,
) {
    match texture {
        Texture::Burst => add_burst(out, frame, rng),
        Texture::Fricative => add_fricative(out, frame, params, rng),
        Texture::Nasal => add_nasal(out, start, frame, f0, params.sample_rate),
        Texture::Breath => add_breath(out, frame, rng),
    }
}

pub fn add_burst(out: &mut [f32], frame: &[f32], rng: &mut Pcg32) {
    if band_mean(frame, BURST_BAND) <= BURST_GATE {
        return;
    }
    let span = ((out.len() as f32 * BURST_SPAN) as usize).min(out.len());
    for sample in &mut out[..span] {
        *sample += rng.gen::<f32>() * BURST_LEVEL;
    }
}

pub fn add_fricative(out: &mut [f32], frame: &[f32], params: &TextureParams, rng: &mut Pcg32) {
    if band_mean_from(frame, FRICATIVE_BAND_START) <= FRICATIVE_GATE {
        return;
    }
    let mut noise: Vec<f32> = (0..out.len()).map(|_| rng.gen::<f32>() * FRICATIVE_LEVEL).collect();
    if params.fricative_highpass {
        if let Err(e) = highpass(&mut noise, params.sample_rate, FRICATIVE_CUTOFF) {
            debug!("Fricative noise left unfiltered: {}", e);
        }
    }
    for (sample, n) in out.iter_mut().zip(noise) {
        *sample += n;
    }
}

pub fn add_nasal(out: &mut [f32], start: usize, frame: &[f32], f0: f32, sample_rate: u32) {
    if f0 <= 0.0 || NASAL_FREQ >= sample_rate as f32 / 2.0 {
        return;
    }
    let level = band_mean(frame, NASAL_BAND);
    let amp = ((level / NASAL_SCALE).exp() * NASAL_GAIN).clamp(0.0, NASAL_CEILING);
    add_sine(out, start, sample_rate, NASAL_FREQ, amp, 0.0);
}

pub fn add_breath(out: &mut [f32], frame: &[f32], rng: &mut Pcg32) {
    if mean(frame) <= BREATH_GATE {
        return;
    }
    for sample in out.iter_mut() {
        *sample += rng.gen::<f32>() * BREATH_LEVEL;
    }
}
