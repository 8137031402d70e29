//! Summarize, speak, encode.

use std::sync::Arc;
use std::time::Instant;

use crate::config::ShellConfig;
use crate::error::{Result, ShellError};
use crate::fetch::EmbeddingFetcher;
use crate::model::{GenerationOptions, PipelineLoader, SpeechLoader};
use crate::orchestrator::SynthesisOrchestrator;
use crate::progress::ProgressSink;
use crate::registry::{ModelDescriptor, PipelineRegistry};
use crate::resources::ModelResourceGroup;
use crate::speakers::SpeakerEmbeddingCache;
use crate::wav::WavEncoder;
use crate::{Synthesizer, Waveform};

/// Result of one narration request.
#[derive(Debug, Clone)]
pub struct Narration {
    pub summary: String,
    pub waveform: Waveform,
    /// `waveform` framed as a WAV file.
    pub wav: Vec<u8>,
}

/// End-to-end shell: text is summarized, the summary is spoken, and the
/// waveform is encoded as WAV.
pub struct Narrator {
    registry: Arc<PipelineRegistry>,
    summarizer: ModelDescriptor,
    generation: GenerationOptions,
    synthesizer: SynthesisOrchestrator,
    encoder: WavEncoder,
    default_speaker: String,
}

impl Narrator {
    pub fn new(
        registry: Arc<PipelineRegistry>,
        summarizer: ModelDescriptor,
        synthesizer: SynthesisOrchestrator,
        default_speaker: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            summarizer,
            generation: GenerationOptions::default(),
            synthesizer,
            encoder: WavEncoder::default(),
            default_speaker: default_speaker.into(),
        }
    }

    /// Wire every component from `config`.
    pub fn from_config(
        config: &ShellConfig,
        pipelines: Arc<dyn PipelineLoader>,
        speech: Arc<dyn SpeechLoader>,
        fetcher: Arc<dyn EmbeddingFetcher>,
    ) -> Self {
        let registry = Arc::new(PipelineRegistry::new(pipelines));
        let resources = Arc::new(ModelResourceGroup::new(speech, config.speech.clone()));
        let speakers = Arc::new(SpeakerEmbeddingCache::new(fetcher, config.speakers.clone()));

        Self::new(
            registry,
            config.summarizer.clone(),
            SynthesisOrchestrator::new(resources, speakers),
            config.default_speaker.clone(),
        )
        .with_generation(config.generation.clone())
        .with_encoder(WavEncoder::new(config.output_format))
    }

    pub fn with_generation(mut self, generation: GenerationOptions) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_encoder(mut self, encoder: WavEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn registry(&self) -> &Arc<PipelineRegistry> {
        &self.registry
    }

    pub fn synthesizer(&self) -> &SynthesisOrchestrator {
        &self.synthesizer
    }

    /// Load the summarization pipeline and the speech resources ahead of the
    /// first request.
    pub async fn warm_up(&self, progress: ProgressSink) -> Result<()> {
        let start = Instant::now();
        let summarizer = self.registry.get_instance(&self.summarizer, progress.clone())?;
        let speech = self.synthesizer.resources().get_instance(progress);
        futures_util::future::try_join(summarizer, speech).await?;
        log::info!("Warm-up finished in {:.2?}", start.elapsed());
        Ok(())
    }

    /// Summarize `text` and speak it with the default speaker.
    pub async fn narrate(&self, text: &str) -> Result<Narration> {
        self.narrate_as(text, &self.default_speaker).await
    }

    pub async fn narrate_as(&self, text: &str, speaker_id: &str) -> Result<Narration> {
        if text.trim().is_empty() {
            return Err(ShellError::InvalidInput("nothing to narrate".into()));
        }

        let pipeline = self
            .registry
            .get(&self.summarizer, ProgressSink::none())
            .await?;
        let summary = pipeline.run(text, &self.generation).await?;
        log::debug!(
            "Summarized {} chars into {} chars",
            text.chars().count(),
            summary.chars().count()
        );

        let waveform = self.synthesizer.synthesize(&summary, speaker_id).await?;
        let wav = self.encoder.encode(&waveform.samples, waveform.sample_rate);

        Ok(Narration {
            summary,
            waveform,
            wav,
        })
    }
}
