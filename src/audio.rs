use anyhow::{Context, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, ReadOnlySource};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::get_codecs;
use symphonia::default::get_probe;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use log::{info, debug};
use crate::vocoder::AudioBuffer;

/// Decodes the first audio track of `path`, down-mixed to mono.
pub fn load_audio<P: AsRef<Path>>(path: P) -> Result<AudioBuffer> {
    let path = path.as_ref();
    info!("Loading audio from {}", path.display());

    let file = File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(ReadOnlySource::new(BufReader::new(file))), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let mut format = get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe audio format")?
        .format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No supported audio tracks found")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Audio track does not declare a sample rate")?;
    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create decoder")?;
    debug!("Track {} at {}Hz", track_id, sample_rate);

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                debug!("Decoder reset required");
                continue;
            }
            // end of stream
            Err(_) => break,
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                debug!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(anyhow::anyhow!("Decode error: {}", e)),
        };
        if decoded.capacity() == 0 {
            continue;
        }

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend(
            buffer
                .samples()
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );
    }

    info!("Loaded {} samples at {}Hz", samples.len(), sample_rate);
    Ok(AudioBuffer { samples, sample_rate })
}

pub fn save_audio<P: AsRef<Path>>(path: P, audio: &AudioBuffer) -> Result<()> {
    let path = path.as_ref();
    info!("Saving {:.2}s of audio to {}", audio.duration_secs(), path.display());
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_wav(BufWriter::new(file), &audio.samples, audio.sample_rate)
}

pub fn write_wav<W: Write>(mut file: W, samples: &[f32], sample_rate: u32) -> Result<()> {
    let num_channels = 1u16;
    let bits_per_sample = 16u16;
    let byte_rate = sample_rate * num_channels as u32 * (bits_per_sample / 8) as u32;
    let block_align = num_channels * (bits_per_sample / 8);
    let data_size = samples.len() * 2;
    
    debug!("Writing WAV: channels={}, bits={}, rate={}, size={}", num_channels, bits_per_sample, sample_rate, data_size);

    file.write_all(b"RIFF")?;
    file.write_all(&((36 + data_size) as u32).to_le_bytes())?;
    file.write_all(b"WAVE")?;
    
    file.write_all(b"fmt ")?;
    file.write_all(&16u32.to_le_bytes())?;
    file.write_all(&1u16.to_le_bytes())?;
    file.write_all(&num_channels.to_le_bytes())?;
    file.write_all(&sample_rate.to_le_bytes())?;
    file.write_all(&byte_rate.to_le_bytes())?;
    file.write_all(&block_align.to_le_bytes())?;
    file.write_all(&bits_per_sample.to_le_bytes())?;
    
    file.write_all(b"data")?;
    file.write_all(&(data_size as u32).to_le_bytes())?;
    
    for &sample in samples {
        let int_sample = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
        file.write_all(&int_sample.to_le_bytes())?;
    }
    file.flush()?;

    Ok(())
}
