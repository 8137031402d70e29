use std::collections::HashMap;
use std::sync::Arc;

use ndarray::{Array2, ArrayView2};
use parking_lot::Mutex;

use crate::error::{Result, ShellError};
use crate::fetch::EmbeddingFetcher;
use crate::slot::LazyResource;

/// Width of a SpeechT5 x-vector speaker embedding.
pub const EMBEDDING_DIM: usize = 512;

/// Where the CMU Arctic x-vectors are published.
pub const DEFAULT_EMBEDDINGS_URL: &str =
    "https://huggingface.co/datasets/Xenova/cmu-arctic-xvectors-extracted/resolve/main/";

/// A speaker identity vector, shaped `[1, dim]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerEmbedding {
    speaker_id: String,
    data: Array2<f32>,
}

impl SpeakerEmbedding {
    pub fn new(speaker_id: impl Into<String>, values: Vec<f32>) -> Result<Self> {
        let speaker_id = speaker_id.into();
        let dim = values.len();
        let data = Array2::from_shape_vec((1, dim), values)
            .map_err(|e| ShellError::load(format!("speaker embedding {speaker_id}"), e))?;
        Ok(Self { speaker_id, data })
    }

    pub fn speaker_id(&self) -> &str {
        &self.speaker_id
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    pub fn dim(&self) -> usize {
        self.data.ncols()
    }

    pub fn as_slice(&self) -> &[f32] {
        self.data.as_slice().unwrap_or(&[])
    }
}

/// Where embeddings live and how large they are.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SpeakerSource {
    /// Prefix joined directly with the speaker id.
    pub base_url: String,
    /// Appended after the speaker id.
    pub suffix: String,
    /// Expected float count per embedding.
    pub dim: usize,
}

impl Default for SpeakerSource {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_EMBEDDINGS_URL.to_string(),
            suffix: ".bin".to_string(),
            dim: EMBEDDING_DIM,
        }
    }
}

impl SpeakerSource {
    pub fn url_for(&self, speaker_id: &str) -> String {
        format!("{}{}{}", self.base_url, speaker_id, self.suffix)
    }
}

/// Process-lifetime cache of speaker embeddings.
///
/// Misses fetch `base_url + speaker_id + suffix`. Concurrent misses for one
/// speaker share a single fetch; a failed fetch leaves the speaker absent.
/// Nothing is ever evicted.
pub struct SpeakerEmbeddingCache {
    fetcher: Arc<dyn EmbeddingFetcher>,
    source: SpeakerSource,
    entries: Mutex<HashMap<String, Arc<LazyResource<SpeakerEmbedding>>>>,
}

impl SpeakerEmbeddingCache {
    pub fn new(fetcher: Arc<dyn EmbeddingFetcher>, source: SpeakerSource) -> Self {
        Self {
            fetcher,
            source,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &SpeakerSource {
        &self.source
    }

    pub async fn get(&self, speaker_id: &str) -> Result<Arc<SpeakerEmbedding>> {
        if speaker_id.trim().is_empty() {
            return Err(ShellError::InvalidInput("speaker id is empty".into()));
        }

        let entry = {
            let mut entries = self.entries.lock();
            entries
                .entry(speaker_id.to_string())
                .or_insert_with(|| LazyResource::new(format!("speaker {speaker_id}")))
                .clone()
        };

        if let Some(embedding) = entry.ready() {
            log::debug!("Speaker embedding cache hit: {speaker_id}");
            return Ok(embedding);
        }

        entry
            .get_or_load(|| {
                let fetcher = Arc::clone(&self.fetcher);
                let url = self.source.url_for(speaker_id);
                let dim = self.source.dim;
                let speaker_id = speaker_id.to_string();
                async move {
                    log::info!("Fetching speaker embedding {speaker_id} from {url}");
                    let bytes = fetcher.fetch_bytes(&url).await?;
                    let values = parse_f32_le(&bytes, dim, &speaker_id)?;
                    SpeakerEmbedding::new(speaker_id, values).map(Arc::new)
                }
            })
            .await
    }

    /// True once `speaker_id` has been fetched successfully.
    pub fn contains(&self, speaker_id: &str) -> bool {
        self.entries
            .lock()
            .get(speaker_id)
            .is_some_and(|entry| entry.is_ready())
    }

    /// Number of cached embeddings.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|entry| entry.is_ready())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decode a flat little-endian float32 buffer holding exactly `dim` values.
fn parse_f32_le(data: &[u8], dim: usize, name: &str) -> Result<Vec<f32>> {
    let resource = format!("speaker embedding {name}");
    if data.len() % 4 != 0 {
        return Err(ShellError::load(
            resource,
            format!("byte length {} is not a multiple of 4", data.len()),
        ));
    }

    let n_floats = data.len() / 4;
    if n_floats != dim {
        return Err(ShellError::load(
            resource,
            format!("expected {dim} floats, got {n_floats}"),
        ));
    }

    Ok(data
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
