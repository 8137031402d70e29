use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShellError};
use crate::model::GenerationOptions;
use crate::registry::ModelDescriptor;
use crate::resources::SpeechModelConfig;
use crate::speakers::SpeakerSource;
use crate::wav::PcmFormat;

/// Speaker used when a request does not name one.
pub const DEFAULT_SPEAKER: &str = "cmu_us_slt_arctic-wav-arctic_a0001";

/// Settings for the whole summarize-and-speak shell.
///
/// Every section is optional in JSON and falls back to its default.
///
/// ```json
/// {
///   "summarizer": { "task": "summarization", "model": "Xenova/distilbart-cnn-6-6" },
///   "generation": { "max_new_tokens": 250 },
///   "speech": { "model_id": "Xenova/speecht5_tts", "vocoder_id": "Xenova/speecht5_hifigan" },
///   "speakers": { "base_url": "https://example.com/xvectors/", "suffix": ".bin" },
///   "default_speaker": "cmu_us_slt_arctic-wav-arctic_a0001",
///   "output_format": "float32"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct ShellConfig {
    pub summarizer: ModelDescriptor,
    pub generation: GenerationOptions,
    pub speech: SpeechModelConfig,
    pub speakers: SpeakerSource,
    pub default_speaker: String,
    pub output_format: PcmFormat,
    /// Request timeout for remote embedding fetches; none by default.
    pub fetch_timeout_secs: Option<u64>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            summarizer: ModelDescriptor::summarization(),
            generation: GenerationOptions::default(),
            speech: SpeechModelConfig::default(),
            speakers: SpeakerSource::default(),
            default_speaker: DEFAULT_SPEAKER.to_string(),
            output_format: PcmFormat::default(),
            fetch_timeout_secs: None,
        }
    }
}

impl ShellConfig {
    /// Load a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            ShellError::Configuration(format!("Failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.summarizer.resolve()?;
        if self.default_speaker.trim().is_empty() {
            return Err(ShellError::Configuration("'default_speaker' is empty".into()));
        }
        if self.speakers.dim == 0 {
            return Err(ShellError::Configuration("'speakers.dim' must be positive".into()));
        }
        if self.speech.model_id.is_empty() || self.speech.vocoder_id.is_empty() {
            return Err(ShellError::Configuration(
                "'speech.model_id' and 'speech.vocoder_id' must be set".into(),
            ));
        }
        Ok(())
    }

    /// An HTTP fetcher honouring `fetch_timeout_secs`.
    #[cfg(feature = "http")]
    pub fn http_fetcher(&self) -> Result<crate::fetch::HttpFetcher> {
        crate::fetch::HttpFetcher::with_timeout(
            self.fetch_timeout_secs.map(std::time::Duration::from_secs),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Task;

    #[test]
    fn empty_json_gives_defaults() {
        let config: ShellConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ShellConfig::default());
        assert_eq!(config.generation.max_new_tokens, 250);
        assert_eq!(config.speech.vocoder_id, "Xenova/speecht5_hifigan");
        assert!(!config.speech.load.quantized);
        config.validate().unwrap();
    }

    #[test]
    fn load_reads_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summa.json");
        std::fs::write(
            &path,
            r#"{
                "summarizer": { "task": "summarization", "model": "Falconsai/text_summarization" },
                "generation": { "max_new_tokens": 120, "min_length": 30, "max_length": 230 },
                "speech": { "quantized": true },
                "speakers": { "base_url": "file:///voices/", "suffix": ".f32" },
                "output_format": "int16"
            }"#,
        )
        .unwrap();

        let config = ShellConfig::load(&path).unwrap();
        assert_eq!(
            config.summarizer,
            ModelDescriptor::new(Task::Summarization, "Falconsai/text_summarization")
        );
        assert_eq!(config.generation.min_length, Some(30));
        assert!(config.speech.load.quantized);
        assert_eq!(config.speech.model_id, "Xenova/speecht5_tts");
        assert_eq!(config.speakers.url_for("a"), "file:///voices/a.f32");
        assert_eq!(config.output_format, PcmFormat::Int16);
        assert_eq!(config.default_speaker, DEFAULT_SPEAKER);
    }

    #[test]
    fn incomplete_summarizer_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "summarizer": { "task": "summarization" } }"#).unwrap();

        let err = ShellConfig::load(&path).unwrap_err();
        assert!(matches!(err, ShellError::Configuration(_)));
    }

    #[test]
    fn malformed_json_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            ShellConfig::load(&path),
            Err(ShellError::Configuration(_))
        ));
    }

    #[test]
    fn builder_overrides_selected_fields() {
        let config = ShellConfigBuilder::default()
            .default_speaker("voice-A")
            .output_format(PcmFormat::Int16)
            .build()
            .unwrap();
        assert_eq!(config.default_speaker, "voice-A");
        assert_eq!(config.output_format, PcmFormat::Int16);
        assert_eq!(config.summarizer, ModelDescriptor::summarization());
    }
}
