use crate::config::VocoderConfig;
use crate::error::{VocoderError, VocoderResult};
use crate::frame::SpectralFrames;
use crate::phoneme::PhoneticTable;
use crate::postprocess::PostProcessor;
use crate::precondition::precondition;
use crate::selector::{default_chain, select, AudioSource, Selection, SynthesisRequest};
use crate::vocoder::{AudioBuffer, Strategy, SynthContext};
use log::{debug, info};

/// The whole pipeline: conditioning, strategy selection, post-processing.
#[derive(Debug, Clone, Default)]
pub struct Vocoder {
    config: VocoderConfig,
    measured: Option<PhoneticTable>,
    chain: Option<Vec<Strategy>>,
    post: PostProcessor,
}

impl Vocoder {
    pub fn new(config: VocoderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_measured(mut self, table: PhoneticTable) -> Self {
        self.measured = Some(table);
        self
    }

    pub fn with_chain(mut self, chain: Vec<Strategy>) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_post_processor(mut self, post: PostProcessor) -> Self {
        self.post = post;
        self
    }

    pub fn config(&self) -> &VocoderConfig {
        &self.config
    }

    pub fn render(&self, frames: &SpectralFrames, request: &SynthesisRequest) -> VocoderResult<AudioBuffer> {
        self.render_with_source(frames, request).map(|s| s.audio)
    }

    /// Like [`Vocoder::render`], also reporting which strategy produced the audio.
    pub fn render_with_source(&self, frames: &SpectralFrames, request: &SynthesisRequest) -> VocoderResult<Selection> {
        self.config.validate()?;
        if !frames.is_empty() && frames.n_mels() != self.config.n_mels {
            return Err(VocoderError::MelMismatch {
                expected: self.config.n_mels,
                found: frames.n_mels(),
            });
        }

        info!(
            "Rendering {} frames ({} mels) at {}Hz, hop {}",
            frames.n_frames(),
            frames.n_mels(),
            self.config.sample_rate,
            self.config.hop_length
        );
        let conditioned = precondition(frames, &self.config, request.token_count);
        debug!("Conditioned matrix: {} frames", conditioned.n_frames());

        let ctx = SynthContext {
            config: &self.config,
            measured: self.measured.as_ref(),
        };
        let chain = match &self.chain {
            Some(chain) => chain.clone(),
            None => default_chain(request.has_phoneme_training_data),
        };
        let selection = select(&conditioned, &ctx, &chain);

        Ok(match selection.source {
            AudioSource::Fallback => selection,
            AudioSource::Strategy(_) => Selection {
                audio: self.post.process(selection.audio),
                source: selection.source,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocoder::RELIABLE;

    #[test]
    fn test_mel_mismatch_fails_fast() {
        let vocoder = Vocoder::new(VocoderConfig::default());
        let frames = SpectralFrames::filled(60, 64, 0.0);
        let err = vocoder.render(&frames, &SynthesisRequest::default()).unwrap_err();
        assert!(matches!(err, VocoderError::MelMismatch { expected: 80, found: 64 }));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = VocoderConfig { hop_length: 0, ..VocoderConfig::default() };
        let err = Vocoder::new(config).render(&SpectralFrames::filled(60, 80, 0.0), &SynthesisRequest::default()).unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_zero_matrix_is_quiet() {
        let vocoder = Vocoder::new(VocoderConfig::default());
        let out = vocoder.render(&SpectralFrames::filled(50, 80, 0.0), &SynthesisRequest::default()).unwrap();
        assert_eq!(out.len(), 12800);
        assert!(out.peak() < 0.05);
    }

    #[test]
    fn test_custom_chain() {
        let vocoder = Vocoder::new(VocoderConfig::default()).with_chain(vec![RELIABLE]);
        let frame: Vec<f32> = (0..80).map(|i| 2.0 - i as f32 * 0.05).collect();
        let frames = SpectralFrames::from_rows(vec![frame; 60]).unwrap();
        let selection = vocoder.render_with_source(&frames, &SynthesisRequest::default()).unwrap();
        assert_eq!(selection.source, AudioSource::Strategy("reliable"));
        assert_eq!(selection.audio.len(), 60 * 256);
    }
}
