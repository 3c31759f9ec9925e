//! Rule-based vocoder: mel spectrogram frames in, speech-like audio out.
//!
//! [`Vocoder::render`] runs the whole pipeline. The building blocks (the
//! classifier, the strategies and the selector) are public for callers that
//! need finer control.

pub mod analysis;
pub mod args;
pub mod audio;
pub mod config;
pub mod error;
pub mod features;
pub mod filter;
pub mod frame;
pub mod phoneme;
pub mod postprocess;
pub mod precondition;
pub mod render;
pub mod rng;
pub mod selector;
pub mod util;
pub mod vocoder;

pub use config::VocoderConfig;
pub use error::{VocoderError, VocoderResult};
pub use frame::SpectralFrames;
pub use phoneme::{classify, PhoneticCategory, PhoneticTable};
pub use render::Vocoder;
pub use selector::{AudioSource, SynthesisRequest};
pub use vocoder::AudioBuffer;
