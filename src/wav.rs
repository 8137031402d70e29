//! RIFF/WAVE encoding of mono PCM samples.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! offset  size  field
//!      0     4  "RIFF"
//!      4     4  36 + data length
//!      8     4  "WAVE"
//!     12     4  "fmt "
//!     16     4  16 (fmt chunk size)
//!     20     2  format code (1 = integer PCM, 3 = IEEE float)
//!     22     2  channels (1)
//!     24     4  sample rate
//!     28     4  byte rate = sample rate * block align
//!     32     2  block align = channels * bytes per sample
//!     34     2  bits per sample
//!     36     4  "data"
//!     40     4  data length = samples * bytes per sample
//!     44     -  samples
//! ```

use serde::{Deserialize, Serialize};

/// Size of the header written before the samples.
pub const HEADER_LEN: usize = 44;

const CHANNELS: u16 = 1;

/// Sample representation inside the container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PcmFormat {
    /// 32-bit IEEE float, written as-is.
    #[default]
    Float32,
    /// 16-bit signed integer, clamped to [-1, 1] then scaled.
    Int16,
}

impl PcmFormat {
    pub fn format_code(self) -> u16 {
        match self {
            Self::Float32 => 3,
            Self::Int16 => 1,
        }
    }

    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::Float32 => 4,
            Self::Int16 => 2,
        }
    }

    pub fn bits_per_sample(self) -> u16 {
        (self.bytes_per_sample() * 8) as u16
    }
}

/// Stateless encoder; the same samples always yield the same bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WavEncoder {
    format: PcmFormat,
}

impl WavEncoder {
    pub fn new(format: PcmFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> PcmFormat {
        self.format
    }

    /// Length of the container for `sample_count` samples.
    pub fn encoded_len(&self, sample_count: usize) -> usize {
        HEADER_LEN + sample_count * self.format.bytes_per_sample()
    }

    /// Frame `samples` as a WAV file.
    ///
    /// # Panics
    ///
    /// If `sample_rate` is zero or the payload does not fit the 32-bit size
    /// fields of the header.
    pub fn encode(&self, samples: &[f32], sample_rate: u32) -> Vec<u8> {
        assert!(sample_rate > 0, "sample rate must be positive");

        let bytes_per_sample = self.format.bytes_per_sample();
        let data_len = samples
            .len()
            .checked_mul(bytes_per_sample)
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| n.checked_add(36).is_some());
        let Some(data_len) = data_len else {
            panic!("{} samples do not fit in a WAV container", samples.len());
        };

        let block_align = CHANNELS * bytes_per_sample as u16;
        let byte_rate = sample_rate
            .checked_mul(u32::from(block_align))
            .unwrap_or_else(|| panic!("byte rate overflows at {sample_rate} Hz"));

        let mut out = Vec::with_capacity(self.encoded_len(samples.len()));
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&self.format.format_code().to_le_bytes());
        out.extend_from_slice(&CHANNELS.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&self.format.bits_per_sample().to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());

        match self.format {
            PcmFormat::Float32 => {
                for &s in samples {
                    out.extend_from_slice(&s.to_le_bytes());
                }
            }
            PcmFormat::Int16 => {
                for &s in samples {
                    out.extend_from_slice(&to_i16(s).to_le_bytes());
                }
            }
        }

        debug_assert_eq!(out.len(), self.encoded_len(samples.len()));
        out
    }
}

/// Convert a float sample to 16-bit PCM. NaN maps to silence.
fn to_i16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32768.0) as i16
    } else {
        (clamped * 32767.0) as i16
    }
}
