#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use ndarray::{Array2, ArrayView2};
use parking_lot::Mutex;

use summa_tts::{
    EmbeddingFetcher, GenerationOptions, LoadOptions, ModelDescriptor, Pipeline, PipelineLoader,
    ProgressEvent, ProgressSink, Result, ShellError, SpeakerEmbedding, SpeechLoader, SpeechModel,
    Tokenizer, Vocoder,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Keeps the first `limit` words.
pub struct FirstWords {
    pub limit: usize,
}

#[async_trait]
impl Pipeline for FirstWords {
    async fn run(&self, input: &str, options: &GenerationOptions) -> Result<String> {
        let limit = self.limit.min(options.max_new_tokens);
        Ok(input.split_whitespace().take(limit).collect::<Vec<_>>().join(" "))
    }
}

#[derive(Default)]
pub struct CountingPipelineLoader {
    pub loads: AtomicUsize,
}

impl CountingPipelineLoader {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PipelineLoader for CountingPipelineLoader {
    async fn load(
        &self,
        descriptor: &ModelDescriptor,
        progress: ProgressSink,
    ) -> Result<Arc<dyn Pipeline>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let name = descriptor.to_string();
        progress.emit(ProgressEvent::Initiate {
            name: name.clone(),
            file: "model.onnx".into(),
        });
        tokio::task::yield_now().await;
        progress.emit(ProgressEvent::Done {
            name,
            file: "model.onnx".into(),
        });
        Ok(Arc::new(FirstWords { limit: 4 }))
    }
}

/// Byte-level tokenizer that refuses empty input.
pub struct ByteTokenizer;

impl Tokenizer for ByteTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<i64>> {
        if text.is_empty() {
            return Err(ShellError::Tokenization("empty input".into()));
        }
        Ok(text.bytes().map(i64::from).collect())
    }
}

/// Emits one spectrogram frame per token, one sample per frame.
pub struct FrameModel;

#[async_trait]
impl SpeechModel for FrameModel {
    async fn generate_speech(
        &self,
        tokens: &[i64],
        speaker: &SpeakerEmbedding,
        vocoder: &dyn Vocoder,
    ) -> Result<Vec<f32>> {
        let bias = speaker.as_slice().first().copied().unwrap_or(0.0);
        let frames = Array2::from_shape_fn((tokens.len(), 2), |(i, j)| {
            (tokens[i] as f32 / 255.0) * if j == 0 { 1.0 } else { bias }
        });
        tokio::task::yield_now().await;
        vocoder.vocode(frames.view())
    }
}

/// Averages each frame into a sample.
pub struct MeanVocoder;

impl Vocoder for MeanVocoder {
    fn vocode(&self, spectrogram: ArrayView2<'_, f32>) -> Result<Vec<f32>> {
        Ok(spectrogram
            .rows()
            .into_iter()
            .map(|row| row.mean().unwrap_or(0.0))
            .collect())
    }
}

#[derive(Default)]
pub struct CountingSpeechLoader {
    pub tokenizers: AtomicUsize,
    pub models: AtomicUsize,
    pub vocoders: AtomicUsize,
}

impl CountingSpeechLoader {
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.tokenizers.load(Ordering::SeqCst),
            self.models.load(Ordering::SeqCst),
            self.vocoders.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl SpeechLoader for CountingSpeechLoader {
    async fn load_tokenizer(
        &self,
        _model_id: &str,
        _progress: ProgressSink,
    ) -> Result<Arc<dyn Tokenizer>> {
        self.tokenizers.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(ByteTokenizer))
    }

    async fn load_model(
        &self,
        _model_id: &str,
        _options: &LoadOptions,
        _progress: ProgressSink,
    ) -> Result<Arc<dyn SpeechModel>> {
        self.models.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(Arc::new(FrameModel))
    }

    async fn load_vocoder(
        &self,
        _vocoder_id: &str,
        _options: &LoadOptions,
        _progress: ProgressSink,
    ) -> Result<Arc<dyn Vocoder>> {
        self.vocoders.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MeanVocoder))
    }
}

/// Serves a constant 512-float embedding and records every url.
#[derive(Default)]
pub struct RecordingFetcher {
    pub urls: Mutex<Vec<String>>,
}

impl RecordingFetcher {
    pub fn fetches_for(&self, speaker_id: &str) -> usize {
        self.urls
            .lock()
            .iter()
            .filter(|url| url.contains(speaker_id))
            .count()
    }

    pub fn total(&self) -> usize {
        self.urls.lock().len()
    }
}

#[async_trait]
impl EmbeddingFetcher for RecordingFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
        self.urls.lock().push(url.to_string());
        tokio::task::yield_now().await;
        Ok(embedding_bytes(512, 0.5))
    }
}

pub fn embedding_bytes(dim: usize, value: f32) -> Bytes {
    (0..dim)
        .flat_map(|_| value.to_le_bytes())
        .collect::<Vec<u8>>()
        .into()
}
