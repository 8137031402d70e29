use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::error::Result;
use crate::progress::ProgressSink;
use crate::resources::ModelResourceGroup;
use crate::speakers::SpeakerEmbeddingCache;
use crate::{Synthesizer, Waveform};

/// Text plus speaker id in, waveform out.
///
/// Shares its resource group and embedding cache with any number of
/// concurrent requests.
pub struct SynthesisOrchestrator {
    resources: Arc<ModelResourceGroup>,
    speakers: Arc<SpeakerEmbeddingCache>,
    progress: ProgressSink,
}

impl SynthesisOrchestrator {
    pub fn new(resources: Arc<ModelResourceGroup>, speakers: Arc<SpeakerEmbeddingCache>) -> Self {
        Self {
            resources,
            speakers,
            progress: ProgressSink::none(),
        }
    }

    /// Report resource loading triggered by synthesis to `progress`.
    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub fn resources(&self) -> &Arc<ModelResourceGroup> {
        &self.resources
    }

    pub fn speakers(&self) -> &Arc<SpeakerEmbeddingCache> {
        &self.speakers
    }
}

#[async_trait]
impl Synthesizer for SynthesisOrchestrator {
    async fn synthesize(&self, text: &str, speaker_id: &str) -> Result<Waveform> {
        let res = self.resources.get_instance(self.progress.clone()).await?;

        let tokens = res.tokenizer.encode(text)?;
        let speaker = self.speakers.get(speaker_id).await?;

        let start = Instant::now();
        let samples = res
            .model
            .generate_speech(&tokens, &speaker, res.vocoder.as_ref())
            .await?;
        let waveform = Waveform {
            samples,
            sample_rate: res.model.sample_rate(),
        };

        log::info!(
            "Synthesized {:.2}s of audio for {} tokens as {speaker_id} in {:.2?}",
            waveform.duration_secs(),
            tokens.len(),
            start.elapsed()
        );
        Ok(waveform)
    }
}
