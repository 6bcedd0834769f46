use std::collections::VecDeque;

use base64::Engine;
use ringbuf::HeapRb;
use rubato::{FastFixedIn, PolynomialDegree};

/// Sample rate of the microphone audio the Live API expects.
pub const LIVE_INPUT_SAMPLE_RATE: f64 = 16000.0;
/// Sample rate of the audio the Live API speaks back.
pub const LIVE_OUTPUT_SAMPLE_RATE: f64 = 24000.0;

/// Mime type attached to every outgoing microphone frame.
pub const LIVE_INPUT_MIME_TYPE: &str = "audio/pcm;rate=16000";

/// Creates a resampler to convert between audio sample rates.
pub fn create_resampler(
    in_sampling_rate: f64,
    out_sampling_rate: f64,
    chunk_size: usize,
) -> anyhow::Result<FastFixedIn<f32>> {
    let resampler = FastFixedIn::<f32>::new(
        out_sampling_rate / in_sampling_rate,
        1.0,
        PolynomialDegree::Cubic,
        chunk_size,
        1,
    )?;
    Ok(resampler)
}

/// Splits a slice of audio samples into fixed-size chunks.
/// The last chunk is padded with zeros.
pub fn split_for_chunks(samples: &[f32], chunk_size: usize) -> Vec<Vec<f32>> {
    samples
        .chunks(chunk_size)
        .map(|chunk| {
            let mut chunk = chunk.to_vec();
            chunk.resize(chunk_size, 0.0);
            chunk
        })
        .collect()
}

/// Averages interleaved multi-channel samples down to mono.
pub fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|c| c.iter().sum::<f32>() / c.len() as f32)
        .collect()
}

/// Creates a new ring buffer on the heap for shared audio data.
pub fn shared_buffer(size: usize) -> HeapRb<f32> {
    HeapRb::new(size)
}

/// Accumulates a continuous sample stream and hands it out in frames of
/// exactly `frame_size` samples. Leftover samples wait for the next push.
#[derive(Debug)]
pub struct FrameBuffer {
    frame_size: usize,
    pending: VecDeque<f32>,
}

impl FrameBuffer {
    pub fn new(frame_size: usize) -> Self {
        Self {
            frame_size,
            pending: VecDeque::with_capacity(frame_size * 2),
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn push(&mut self, samples: &[f32]) {
        self.pending.extend(samples.iter().copied());
    }

    /// Drains every complete frame currently buffered.
    pub fn pop_frames(&mut self) -> Vec<Vec<f32>> {
        let mut frames = Vec::new();
        while self.pending.len() >= self.frame_size {
            frames.push(self.pending.drain(..self.frame_size).collect());
        }
        frames
    }

    /// Hands out whatever is left, shorter than a frame.
    pub fn take_remaining(&mut self) -> Vec<f32> {
        self.pending.drain(..).collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Decodes a base64 string representing PCM16 audio into f32 samples.
/// Each little-endian i16 is divided by 32768 so the result lies in [-1.0, 1.0).
/// A trailing odd byte is ignored.
pub fn decode(base64_fragment: &str) -> Vec<f32> {
    match base64::engine::general_purpose::STANDARD.decode(base64_fragment) {
        Ok(pcm16) => pcm16
            .chunks_exact(2)
            .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]) as f32 / 32768.0)
            .collect(),
        Err(e) => {
            tracing::error!("Failed to decode base64 audio fragment: {}", e);
            Vec::new()
        }
    }
}

/// Encodes f32 samples as base64 little-endian PCM16.
pub fn encode(pcm32: &[f32]) -> String {
    base64::engine::general_purpose::STANDARD.encode(pcm32.to_binary())
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32768.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Converts audio samples to their little-endian PCM16 byte representation.
pub trait ToBinary {
    fn to_binary(&self) -> Vec<u8>;
}

impl ToBinary for [f32] {
    fn to_binary(&self) -> Vec<u8> {
        self.iter()
            .flat_map(|&sample| f32_to_i16(sample).to_le_bytes())
            .collect()
    }
}
