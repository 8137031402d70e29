//! # summa-tts
//!
//! Summarize text and speak the summary.
//!
//! ## Features
//!
//! - **Pipeline registry**: one load per (task, model) no matter how many
//!   callers race for it
//! - **Lazy speech resources**: tokenizer, speech model and vocoder loaded once
//!   and shared
//! - **Speaker embeddings**: fetched on first use and cached for the process
//! - **WAV encoding**: 32-bit float or 16-bit PCM in a 44-byte-header RIFF
//!   container
//!
//! Model architectures stay behind the traits in [`model`]; plug in a
//! [`PipelineLoader`] and a [`SpeechLoader`] for your runtime.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use summa_tts::{HttpFetcher, Narrator, ShellConfig};
//!
//! let config = ShellConfig::load("summa.json".as_ref())?;
//! let narrator = Narrator::from_config(
//!     &config,
//!     Arc::new(MyPipelineLoader),
//!     Arc::new(MySpeechLoader),
//!     Arc::new(HttpFetcher::new()?),
//! );
//!
//! let narration = narrator.narrate(article).await?;
//! std::fs::write("summary.wav", &narration.wav)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod model;
pub mod narrator;
pub mod orchestrator;
pub mod progress;
pub mod registry;
pub mod resources;
pub mod slot;
pub mod speakers;
pub mod wav;

use std::path::Path;

use async_trait::async_trait;

pub use config::ShellConfig;
pub use error::{Result, ShellError};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use fetch::{EmbeddingFetcher, FileFetcher};
pub use model::{
    GenerationOptions, LoadOptions, Pipeline, PipelineLoader, SpeechLoader, SpeechModel,
    Tokenizer, Vocoder,
};
pub use narrator::{Narration, Narrator};
pub use orchestrator::SynthesisOrchestrator;
pub use progress::{ProgressEvent, ProgressSink};
pub use registry::{ModelDescriptor, PipelineRegistry, Task};
pub use resources::{ModelResourceGroup, SpeechModelConfig, SpeechResources};
pub use speakers::{SpeakerEmbedding, SpeakerEmbeddingCache, SpeakerSource};
pub use wav::{PcmFormat, WavEncoder};

/// Audio produced by one synthesis call.
///
/// Contains raw mono f32 samples and their sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Raw audio samples as f32 values
    pub samples: Vec<f32>,
    /// Sample rate of the audio (16000 for SpeechT5)
    pub sample_rate: u32,
}

impl Waveform {
    /// Encode as a WAV container.
    pub fn to_wav(&self, format: PcmFormat) -> Vec<u8> {
        WavEncoder::new(format).encode(&self.samples, self.sample_rate)
    }

    /// Write the audio to a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_wav(PcmFormat::Float32))?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Common interface for speaker-conditioned speech synthesis.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text` in the voice of `speaker_id`.
    async fn synthesize(&self, text: &str, speaker_id: &str) -> Result<Waveform>;

    /// Synthesize speech and write it to a WAV file.
    ///
    /// Default implementation calls `synthesize()` then `Waveform::write_wav()`.
    async fn synthesize_to_file(&self, text: &str, speaker_id: &str, wav_path: &Path) -> Result<()> {
        self.synthesize(text, speaker_id).await?.write_wav(wav_path)
    }
}
