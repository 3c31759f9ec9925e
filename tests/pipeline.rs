//! End-to-end behaviour of the render pipeline.

use mora::error::{VocoderError, VocoderResult};
use mora::selector::{AudioSource, SynthesisRequest};
use mora::vocoder::{AudioBuffer, Strategy, SynthContext, ALL_STRATEGIES, RELIABLE};
use mora::{audio, PhoneticTable, SpectralFrames, Vocoder, VocoderConfig};
use std::f64::consts::TAU;

fn vowel_a(n_frames: usize) -> SpectralFrames {
    let frame: Vec<f32> = (0..80).map(|i| if i < 40 { 4.0 } else { 0.0 }).collect();
    SpectralFrames::from_rows(vec![frame; n_frames]).unwrap()
}

/// Magnitude of the single DFT bin at `freq`, normalised by length.
fn tone_level(samples: &[f32], freq: f64, sample_rate: u32) -> f64 {
    let step = TAU * freq / sample_rate as f64;
    let (re, im) = samples.iter().enumerate().fold((0.0, 0.0), |(re, im), (n, &x)| {
        let arg = step * n as f64;
        (re + x as f64 * arg.cos(), im - x as f64 * arg.sin())
    });
    (re * re + im * im).sqrt() / samples.len() as f64
}

fn always_fails(_: &SpectralFrames, _: &SynthContext<'_>) -> VocoderResult<AudioBuffer> {
    Err(VocoderError::strategy("stub"))
}

#[test]
fn test_zero_matrix_renders_near_silence() {
    let config = VocoderConfig::default();
    let measured = PhoneticTable::measured(&[]).unwrap();
    let frames = SpectralFrames::filled(50, 80, 0.0);
    for strategy in ALL_STRATEGIES {
        let vocoder = Vocoder::new(config.clone())
            .with_measured(measured.clone())
            .with_chain(vec![strategy]);
        let selection = vocoder.render_with_source(&frames, &SynthesisRequest::default()).unwrap();
        assert_eq!(selection.source, AudioSource::Strategy(strategy.name));
        assert_eq!(selection.audio.len(), 12800, "{}", strategy.name);
        assert!(selection.audio.peak() < 0.05, "{} peak {}", strategy.name, selection.audio.peak());
    }
}

#[test]
fn test_short_input_is_extended() {
    let frame: Vec<f32> = (0..80).map(|i| 3.0 - i as f32 * 0.1).collect();
    let frames = SpectralFrames::from_rows(vec![frame; 10]).unwrap();
    let vocoder = Vocoder::new(VocoderConfig::default());
    let audio = vocoder.render(&frames, &SynthesisRequest::default()).unwrap();
    assert!(audio.len() >= 50 * 256);
    assert_eq!(audio.len() % 256, 0);
}

#[test]
fn test_vowel_a_carries_its_formants() {
    let vocoder = Vocoder::new(VocoderConfig::default());
    let selection = vocoder.render_with_source(&vowel_a(60), &SynthesisRequest::default()).unwrap();
    assert_eq!(selection.source, AudioSource::Strategy("phoneme-aware"));

    let samples = &selection.audio.samples;
    let control = [1600.0, 2000.0, 3500.0]
        .iter()
        .map(|&f| tone_level(samples, f, 22050))
        .fold(0.0, f64::max);
    for formant in [730.0, 1090.0, 2440.0] {
        let level = tone_level(samples, formant, 22050);
        assert!(level > 5.0 * control, "{} Hz at {:.5}, control {:.5}", formant, level, control);
    }
}

#[test]
fn test_exhausted_chain_falls_back_to_sine() {
    let failing = Strategy { name: "stub", run: always_fails };
    let vocoder = Vocoder::new(VocoderConfig::default()).with_chain(vec![failing, failing]);
    let selection = vocoder
        .render_with_source(&SpectralFrames::filled(50, 80, 1.0), &SynthesisRequest::default())
        .unwrap();
    assert_eq!(selection.source, AudioSource::Fallback);
    let expected = 50.0 * 256.0 / 22050.0;
    assert!((selection.audio.duration_secs() - expected).abs() < 1.0 / 22050.0 + 1e-9);
    assert!((selection.audio.peak() - 0.1).abs() < 1e-3);
    assert!(tone_level(&selection.audio.samples, 200.0, 22050) > 0.04);
}

#[test]
fn test_renders_are_reproducible() {
    let rows: Vec<Vec<f32>> = (0..30)
        .map(|t| (0..80).map(|i| ((t * 7 + i * 3) % 17) as f32 / 2.0 - 4.0).collect())
        .collect();
    let frames = SpectralFrames::from_rows(rows).unwrap();
    let request = SynthesisRequest { has_phoneme_training_data: false, token_count: 3 };
    for strategy in ALL_STRATEGIES.into_iter().skip(1) {
        let vocoder = Vocoder::new(VocoderConfig::default()).with_chain(vec![strategy]);
        let a = vocoder.render(&frames, &request).unwrap();
        let b = vocoder.render(&frames, &request).unwrap();
        assert_eq!(a, b, "{}", strategy.name);
    }
}

#[test]
fn test_mismatched_mels_are_rejected() {
    let vocoder = Vocoder::new(VocoderConfig::default());
    let err = vocoder.render(&SpectralFrames::filled(60, 128, 0.0), &SynthesisRequest::default()).unwrap_err();
    assert!(matches!(err, VocoderError::MelMismatch { expected: 80, found: 128 }));
}

#[test]
fn test_training_data_without_measurements_still_renders() {
    let vocoder = Vocoder::new(VocoderConfig::default());
    let request = SynthesisRequest { has_phoneme_training_data: true, token_count: 0 };
    let selection = vocoder.render_with_source(&vowel_a(60), &request).unwrap();
    assert_eq!(selection.source, AudioSource::Strategy("phoneme-aware"));
}

#[test]
fn test_render_to_wav() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.wav");
    let vocoder = Vocoder::new(VocoderConfig::default()).with_chain(vec![RELIABLE]);
    let output = vocoder.render(&vowel_a(50), &SynthesisRequest::default()).unwrap();
    audio::save_audio(&path, &output).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(bytes.len(), 44 + output.len() * 2);
}
