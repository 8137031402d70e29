//! Interfaces of the inference collaborators.
//!
//! Model architectures and weight formats live behind these traits. The
//! shell only loads handles through a loader, then calls them.

use std::sync::Arc;

use async_trait::async_trait;
use derive_builder::Builder;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::progress::ProgressSink;
use crate::registry::ModelDescriptor;
use crate::speakers::SpeakerEmbedding;

/// Output sample rate of the default SpeechT5 model and HiFi-GAN vocoder.
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Decoding parameters for single-stage pipelines such as summarization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(default)]
#[serde(default)]
pub struct GenerationOptions {
    /// Upper bound on generated tokens.
    pub max_new_tokens: usize,
    #[builder(setter(strip_option))]
    pub min_length: Option<usize>,
    #[builder(setter(strip_option))]
    pub max_length: Option<usize>,
    /// Sample instead of greedy/beam decoding.
    pub do_sample: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_new_tokens: 250,
            min_length: None,
            max_length: None,
            do_sample: false,
        }
    }
}

/// Weight-loading options for the speech model and vocoder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Load quantized weights instead of full precision.
    pub quantized: bool,
}

/// A loaded single-stage text pipeline (summarization, text generation...).
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn run(&self, input: &str, options: &GenerationOptions) -> Result<String>;
}

/// Turns text into model input ids.
///
/// Length limits and empty-input handling are the tokenizer's policy; it
/// reports them as [`ShellError::Tokenization`](crate::ShellError::Tokenization).
pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<i64>>;
}

/// Converts an acoustic representation (frames x mel bins) into samples.
pub trait Vocoder: Send + Sync {
    fn vocode(&self, spectrogram: ArrayView2<'_, f32>) -> Result<Vec<f32>>;
}

/// A speaker-conditioned sequence model producing audio.
#[async_trait]
pub trait SpeechModel: Send + Sync {
    /// Generate mono samples for `tokens` in the voice of `speaker`,
    /// rendering the acoustic output with `vocoder`.
    async fn generate_speech(
        &self,
        tokens: &[i64],
        speaker: &SpeakerEmbedding,
        vocoder: &dyn Vocoder,
    ) -> Result<Vec<f32>>;

    fn sample_rate(&self) -> u32 {
        DEFAULT_SAMPLE_RATE
    }
}

/// Loads pipelines for the [`PipelineRegistry`](crate::PipelineRegistry).
#[async_trait]
pub trait PipelineLoader: Send + Sync {
    async fn load(
        &self,
        descriptor: &ModelDescriptor,
        progress: ProgressSink,
    ) -> Result<Arc<dyn Pipeline>>;
}

/// Loads the three synthesis resources for the
/// [`ModelResourceGroup`](crate::ModelResourceGroup).
#[async_trait]
pub trait SpeechLoader: Send + Sync {
    async fn load_tokenizer(
        &self,
        model_id: &str,
        progress: ProgressSink,
    ) -> Result<Arc<dyn Tokenizer>>;

    async fn load_model(
        &self,
        model_id: &str,
        options: &LoadOptions,
        progress: ProgressSink,
    ) -> Result<Arc<dyn SpeechModel>>;

    async fn load_vocoder(
        &self,
        vocoder_id: &str,
        options: &LoadOptions,
        progress: ProgressSink,
    ) -> Result<Arc<dyn Vocoder>>;
}
