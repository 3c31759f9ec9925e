use biquad::{Biquad, Coefficients, DirectForm1, ToHertz, Type, Q_BUTTERWORTH_F32};
use crate::error::{VocoderError, VocoderResult};

pub fn forward_backward_filter<F: Biquad<f32>>(signal: &mut [f32], filter: &mut F) {
    signal.iter_mut().for_each(|x| *x = filter.run(*x));
    filter.reset_state();
    signal.reverse();
    signal.iter_mut().for_each(|x| *x = filter.run(*x));
    filter.reset_state();
    signal.reverse();
}

pub fn make_coefficients(f_type: Type<f32>, fs: f32, freq: f32, q: f32) -> VocoderResult<Coefficients<f32>> {
    Coefficients::<f32>::from_params(f_type, fs.hz(), freq.hz(), q)
        .map_err(|_| VocoderError::strategy(format!("cannot build filter at {} Hz for fs {} Hz", freq, fs)))
}

/// Zero-phase Butterworth high-pass.
pub fn highpass(signal: &mut [f32], sample_rate: u32, cutoff: f32) -> VocoderResult<()> {
    // biquad only rejects cutoffs above fs, not above Nyquist
    if cutoff <= 0.0 || cutoff >= sample_rate as f32 / 2.0 {
        return Err(VocoderError::strategy(format!(
            "high-pass cutoff {} Hz is outside (0, {}) Hz",
            cutoff,
            sample_rate as f32 / 2.0
        )));
    }
    let coeffs = make_coefficients(Type::HighPass, sample_rate as f32, cutoff, Q_BUTTERWORTH_F32)?;
    let mut hpf = DirectForm1::<f32>::new(coeffs);
    forward_backward_filter(signal, &mut hpf);
    Ok(())
}

/// Centered moving average over an odd `window`. The first and last
/// `window / 2` samples keep their values.
pub fn moving_average(samples: &mut [f32], window: usize) {
    let half = window / 2;
    if window < 2 || samples.len() <= window {
        return;
    }
    let source = samples.to_vec();
    let mut sum: f32 = source[..window].iter().sum();
    let scale = 1.0 / window as f32;
    for i in half..source.len() - half {
        samples[i] = sum * scale;
        if i + half + 1 < source.len() {
            sum += source[i + half + 1] - source[i - half];
        }
    }
}
