//! The tokenizer, speech model and vocoder needed for synthesis.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::try_join3;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{LoadOptions, SpeechLoader, SpeechModel, Tokenizer, Vocoder};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::slot::LazyResource;

/// Which weights the synthesis resources come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechModelConfig {
    /// Speech model id; the tokenizer is loaded from the same id.
    pub model_id: String,
    pub vocoder_id: String,
    #[serde(flatten)]
    pub load: LoadOptions,
}

impl Default for SpeechModelConfig {
    fn default() -> Self {
        Self {
            model_id: "Xenova/speecht5_tts".to_string(),
            vocoder_id: "Xenova/speecht5_hifigan".to_string(),
            load: LoadOptions::default(),
        }
    }
}

/// A loaded tokenizer/model/vocoder triple.
#[derive(Clone)]
pub struct SpeechResources {
    pub tokenizer: Arc<dyn Tokenizer>,
    pub model: Arc<dyn SpeechModel>,
    pub vocoder: Arc<dyn Vocoder>,
}

/// Lazily loads and memoizes the three synthesis resources.
///
/// Each slot loads at most once. A failure in one slot fails the join but
/// leaves the other slots to finish (or stay ready); the failed slot becomes
/// loadable again on the next call.
pub struct ModelResourceGroup {
    loader: Arc<dyn SpeechLoader>,
    config: SpeechModelConfig,
    tokenizer: Arc<LazyResource<dyn Tokenizer>>,
    model: Arc<LazyResource<dyn SpeechModel>>,
    vocoder: Arc<LazyResource<dyn Vocoder>>,
}

impl ModelResourceGroup {
    pub fn new(loader: Arc<dyn SpeechLoader>, config: SpeechModelConfig) -> Self {
        Self {
            tokenizer: LazyResource::new(format!("tokenizer {}", config.model_id)),
            model: LazyResource::new(format!("speech model {}", config.model_id)),
            vocoder: LazyResource::new(format!("vocoder {}", config.vocoder_id)),
            loader,
            config,
        }
    }

    pub fn config(&self) -> &SpeechModelConfig {
        &self.config
    }

    /// Load whatever is not loaded yet and wait for all three resources.
    ///
    /// Emits exactly one [`ProgressEvent::Ready`] on `progress` when the join
    /// succeeds, however many slots were already warm.
    pub async fn get_instance(&self, progress: ProgressSink) -> Result<SpeechResources> {
        let start = Instant::now();

        let tokenizer = self.tokenizer.get_or_load(|| {
            let loader = Arc::clone(&self.loader);
            let model_id = self.config.model_id.clone();
            let progress = progress.clone();
            async move { loader.load_tokenizer(&model_id, progress).await }
        });

        let model = self.model.get_or_load(|| {
            let loader = Arc::clone(&self.loader);
            let model_id = self.config.model_id.clone();
            let options = self.config.load.clone();
            let progress = progress.clone();
            async move { loader.load_model(&model_id, &options, progress).await }
        });

        let vocoder = self.vocoder.get_or_load(|| {
            let loader = Arc::clone(&self.loader);
            let vocoder_id = self.config.vocoder_id.clone();
            let options = self.config.load.clone();
            let progress = progress.clone();
            async move { loader.load_vocoder(&vocoder_id, &options, progress).await }
        });

        let (tokenizer, model, vocoder) = try_join3(tokenizer, model, vocoder).await?;

        log::debug!("Speech resources ready in {:.2?}", start.elapsed());
        progress.emit(ProgressEvent::Ready);

        Ok(SpeechResources {
            tokenizer,
            model,
            vocoder,
        })
    }

    /// True when all three resources are loaded.
    pub fn is_ready(&self) -> bool {
        self.tokenizer.is_ready() && self.model.is_ready() && self.vocoder.is_ready()
    }
}
