use crate::error::{VocoderError, VocoderResult};
use crate::util::mean;
use serde::{Deserialize, Serialize};
use std::ops::Range;

pub const FLAT_FRAME_SPREAD: f32 = 1e-6;

/// Row-major mel spectrogram: `n_frames` rows of `n_mels` log-magnitudes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralFrames {
    n_mels: usize,
    data: Vec<f32>,
}

impl SpectralFrames {
    pub fn from_rows(rows: Vec<Vec<f32>>) -> VocoderResult<Self> {
        let n_mels = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(rows.len() * n_mels);
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != n_mels {
                return Err(VocoderError::RaggedFrames {
                    index,
                    expected: n_mels,
                    found: row.len(),
                });
            }
            data.extend(row);
        }
        Ok(Self { n_mels, data })
    }

    pub fn from_flat(n_mels: usize, data: Vec<f32>) -> VocoderResult<Self> {
        if n_mels == 0 && !data.is_empty() {
            return Err(VocoderError::invalid_config("n_mels", "must be positive for non-empty data"));
        }
        if n_mels > 0 && data.len() % n_mels != 0 {
            return Err(VocoderError::RaggedFrames {
                index: data.len() / n_mels,
                expected: n_mels,
                found: data.len() % n_mels,
            });
        }
        Ok(Self { n_mels, data })
    }

    pub fn filled(n_frames: usize, n_mels: usize, value: f32) -> Self {
        Self {
            n_mels,
            data: vec![value; n_frames * n_mels],
        }
    }

    pub fn n_mels(&self) -> usize {
        self.n_mels
    }

    pub fn n_frames(&self) -> usize {
        if self.n_mels == 0 { 0 } else { self.data.len() / self.n_mels }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn frame(&self, index: usize) -> &[f32] {
        let start = index * self.n_mels;
        &self.data[start..start + self.n_mels]
    }

    pub fn frames(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact panics on zero, and an empty matrix has no frames anyway
        self.data.chunks_exact(self.n_mels.max(1)).take(self.n_frames())
    }

    pub fn values(&self) -> &[f32] {
        &self.data
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub(crate) fn push_frame(&mut self, frame: &[f32]) {
        debug_assert_eq!(frame.len(), self.n_mels);
        self.data.extend_from_slice(frame);
    }
}

/// Mean of the bins in `range`, clamped to the frame. An empty band reads as
/// negative infinity so it never wins a comparison or passes a gate.
pub fn band_mean(frame: &[f32], range: Range<usize>) -> f32 {
    let end = range.end.min(frame.len());
    let start = range.start.min(end);
    mean(&frame[start..end])
}

pub fn band_mean_from(frame: &[f32], start: usize) -> f32 {
    band_mean(frame, start..frame.len())
}

pub fn linear_energy(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    frame.iter().map(|v| v.exp()).sum::<f32>() / frame.len() as f32
}

pub fn has_shape(frame: &[f32]) -> bool {
    let (lo, hi) = frame
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    hi - lo > FLAT_FRAME_SPREAD
}

/// Index of the largest value in `frame[range]`, relative to `range.start`.
pub fn band_argmax(frame: &[f32], range: Range<usize>) -> Option<(usize, f32)> {
    let end = range.end.min(frame.len());
    let start = range.start.min(end);
    frame[start..end]
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, bv)) if bv >= v => best,
            _ => Some((i, v)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows() {
        let frames = SpectralFrames::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(frames.n_frames(), 2);
        assert_eq!(frames.n_mels(), 2);
        assert_eq!(frames.frame(1), &[3.0, 4.0]);
        assert_eq!(frames.frames().count(), 2);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = SpectralFrames::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, VocoderError::RaggedFrames { index: 1, expected: 2, found: 1 }));
    }

    #[test]
    fn test_empty_matrix() {
        let frames = SpectralFrames::from_rows(Vec::new()).unwrap();
        assert_eq!(frames.n_frames(), 0);
        assert_eq!(frames.frames().count(), 0);
    }

    #[test]
    fn test_band_helpers() {
        let frame = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(band_mean(&frame, 0..2), 0.5);
        assert_eq!(band_mean(&frame, 2..40), 2.5);
        assert_eq!(band_mean(&frame, 10..40), f32::NEG_INFINITY);
        assert_eq!(band_mean_from(&frame, 3), 3.0);
        assert_eq!(band_argmax(&frame, 0..3), Some((2, 2.0)));
        assert_eq!(band_argmax(&frame, 5..8), None);
    }

    #[test]
    fn test_flat_frames_have_no_shape() {
        assert!(!has_shape(&[0.0; 80]));
        assert!(!has_shape(&[]));
        assert!(has_shape(&[0.0, 0.5]));
        assert!((linear_energy(&[0.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
