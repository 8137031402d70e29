//! Lazy pipeline registry keyed by task and model id.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShellError};
use crate::model::{Pipeline, PipelineLoader};
use crate::progress::ProgressSink;
use crate::slot::{LazyResource, PendingResource};

/// Inference capability a pipeline provides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Task {
    Summarization,
    TextGeneration,
    TextToSpeech,
    Custom(String),
}

impl Task {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Summarization => "summarization",
            Self::TextGeneration => "text-generation",
            Self::TextToSpeech => "text-to-speech",
            Self::Custom(name) => name.as_str(),
        }
    }
}

impl From<String> for Task {
    fn from(name: String) -> Self {
        match name.as_str() {
            "summarization" => Self::Summarization,
            "text-generation" => Self::TextGeneration,
            "text-to-speech" => Self::TextToSpeech,
            _ => Self::Custom(name),
        }
    }
}

impl From<&str> for Task {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<Task> for String {
    fn from(task: Task) -> Self {
        task.as_str().to_string()
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies which capability and weight set to load.
///
/// Both fields have to be set before the registry will hand out an
/// instance; `Default` yields an unset descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub task: Option<Task>,
    #[serde(rename = "model")]
    pub model_id: Option<String>,
}

impl ModelDescriptor {
    pub fn new(task: impl Into<Task>, model_id: impl Into<String>) -> Self {
        Self {
            task: Some(task.into()),
            model_id: Some(model_id.into()),
        }
    }

    /// `summarization` with `Xenova/distilbart-cnn-6-6`.
    pub fn summarization() -> Self {
        Self::new(Task::Summarization, "Xenova/distilbart-cnn-6-6")
    }

    /// `text-generation` with `Xenova/phi-1_5_dev`.
    pub fn text_generation() -> Self {
        Self::new(Task::TextGeneration, "Xenova/phi-1_5_dev")
    }

    /// The task and model id, or a configuration error naming what is unset.
    pub fn resolve(&self) -> Result<(&Task, &str)> {
        let task = self
            .task
            .as_ref()
            .ok_or_else(|| ShellError::Configuration("Must set task and model: task is unset".into()))?;
        let model_id = self
            .model_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                ShellError::Configuration(format!("Must set task and model: no model for task '{task}'"))
            })?;
        Ok((task, model_id))
    }
}

impl fmt::Display for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let task = self.task.as_ref().map(Task::as_str).unwrap_or("<unset>");
        let model = self.model_id.as_deref().unwrap_or("<unset>");
        write!(f, "{task}:{model}")
    }
}

/// Process-scoped factory that loads each pipeline at most once.
///
/// The entry for a descriptor holds the in-flight load, so callers that
/// arrive before the first load finishes wait on that same load instead of
/// starting their own.
pub struct PipelineRegistry {
    loader: Arc<dyn PipelineLoader>,
    entries: Mutex<HashMap<(Task, String), Arc<LazyResource<dyn Pipeline>>>>,
}

impl PipelineRegistry {
    pub fn new(loader: Arc<dyn PipelineLoader>) -> Self {
        Self {
            loader,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The pending pipeline for `descriptor`, starting the load on first use.
    ///
    /// `progress` only observes the load if this call is the one that starts
    /// it.
    pub fn get_instance(
        &self,
        descriptor: &ModelDescriptor,
        progress: ProgressSink,
    ) -> Result<PendingResource<dyn Pipeline>> {
        let (task, model_id) = descriptor.resolve()?;

        let entry = {
            let mut entries = self.entries.lock();
            entries
                .entry((task.clone(), model_id.to_string()))
                .or_insert_with(|| LazyResource::new(format!("pipeline {descriptor}")))
                .clone()
        };

        Ok(entry.get_or_load(|| {
            let loader = Arc::clone(&self.loader);
            let descriptor = descriptor.clone();
            async move {
                log::info!("Loading pipeline {descriptor}");
                let pipeline = loader.load(&descriptor, progress).await?;
                log::info!("Pipeline {descriptor} loaded");
                Ok(pipeline)
            }
        }))
    }

    /// Like [`get_instance`](Self::get_instance), awaiting the loaded pipeline.
    pub async fn get(
        &self,
        descriptor: &ModelDescriptor,
        progress: ProgressSink,
    ) -> Result<Arc<dyn Pipeline>> {
        self.get_instance(descriptor, progress)?.await
    }

    pub fn is_ready(&self, descriptor: &ModelDescriptor) -> bool {
        let Ok((task, model_id)) = descriptor.resolve() else {
            return false;
        };
        self.entries
            .lock()
            .get(&(task.clone(), model_id.to_string()))
            .is_some_and(|entry| entry.is_ready())
    }

    /// Number of descriptors that have been requested.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
