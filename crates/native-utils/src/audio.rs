use base64::Engine;
use rubato::{FastFixedIn, PolynomialDegree, Resampler};

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

/// Averages interleaved frames down to one channel.
pub fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels > 1 {
        data.chunks(channels)
            .map(|c| c.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        data.to_vec()
    }
}

/// Encodes f32 samples as base64 little-endian PCM16.
pub fn encode_f32(pcm32: &[f32]) -> String {
    let pcm16: Vec<u8> = pcm32.to_binary();
    base64::engine::general_purpose::STANDARD.encode(&pcm16)
}

/// Converts samples to little-endian PCM16 bytes.
pub trait ToBinary {
    fn to_binary(&self) -> Vec<u8>;
}

impl ToBinary for [f32] {
    fn to_binary(&self) -> Vec<u8> {
        self.iter()
            .flat_map(|&sample| {
                let v = (sample * 32768.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
                v.to_le_bytes().to_vec()
            })
            .collect()
    }
}

/// Turns captured mono samples into provider-ready PCM16 chunks.
///
/// Samples are buffered until a full resampler chunk is available; leftovers wait for
/// the next push.
pub struct ChunkEncoder {
    resampler: FastFixedIn<f32>,
    pending: Vec<f32>,
}

impl ChunkEncoder {
    pub fn new(
        in_sampling_rate: f64,
        out_sampling_rate: f64,
        chunk_size: usize,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            resampler: create_resampler(in_sampling_rate, out_sampling_rate, chunk_size)?,
            pending: Vec::with_capacity(chunk_size * 2),
        })
    }

    pub fn push(&mut self, samples: &[f32]) -> Vec<String> {
        self.pending.extend_from_slice(samples);
        let mut encoded = Vec::new();
        loop {
            let needed = self.resampler.input_frames_next();
            if self.pending.len() < needed {
                break;
            }
            let chunk: Vec<f32> = self.pending.drain(..needed).collect();
            match self.resampler.process(&[chunk.as_slice()], None) {
                Ok(resampled) => {
                    if let Some(mono) = resampled.first() {
                        if !mono.is_empty() {
                            encoded.push(encode_f32(mono));
                        }
                    }
                }
                Err(e) => tracing::warn!("Failed to resample input chunk: {:?}", e),
            }
        }
        encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_stereo() {
        let stereo = [1.0, 0.0, 0.5, 0.5];
        assert_eq!(downmix(&stereo, 2), vec![0.5, 0.5]);
        assert_eq!(downmix(&stereo, 1), stereo.to_vec());
    }

    #[test]
    fn test_encode_f32_is_base64_pcm16() {
        assert_eq!(encode_f32(&[0.0, 0.0]), "AAAAAA==");
    }

    #[test]
    fn test_f32_clamps_to_pcm16() {
        let binary = [2.0f32, -2.0].to_binary();
        assert_eq!(i16::from_le_bytes([binary[0], binary[1]]), i16::MAX);
        assert_eq!(i16::from_le_bytes([binary[2], binary[3]]), i16::MIN);
    }

    #[test]
    fn test_chunk_encoder_buffers_partial_input() -> anyhow::Result<()> {
        let mut encoder = ChunkEncoder::new(48000.0, 16000.0, 480)?;
        assert!(encoder.push(&[0.0; 100]).is_empty());
        let chunks = encoder.push(&vec![0.1; 1000]);
        // 1100 samples fill two 480-frame chunks; the rest waits.
        assert!(!chunks.is_empty() && chunks.len() <= 2);
        assert!(encoder.push(&[0.1; 100]).is_empty());
        Ok(())
    }
}
