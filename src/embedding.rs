// embedding.rs — Public embedding service.
//
// Construction resolves defaults, brings the engine runtime up (idempotent),
// retrieves the model artifact, and configures the tokenizer. After that the
// service is immutable and freely shared across batch threads; no network or
// file access happens again unless the cache was cold.

use std::path::PathBuf;

use crate::config;
use crate::download;
use crate::encoder::Encoder;
use crate::error::{Error, Result};
use crate::inference::{InferenceBackend, OnnxBackend};
use crate::model::EmbeddingModel;
use crate::runtime;
use crate::tensor;
use crate::{batch, pooling};

/// Construction options. `Default` carries the documented defaults; override
/// through the `with_*` builders or the public fields.
#[derive(Debug, Clone)]
pub struct InitOptions {
    pub model: EmbeddingModel,
    /// Backend hints handed to the inference engine ("cuda", "cpu").
    /// Unknown names are logged and skipped.
    pub execution_providers: Vec<String>,
    /// Token sequence length; 0 selects the default of 512.
    pub max_length: usize,
    pub cache_dir: PathBuf,
    pub show_download_progress: bool,
    /// Where to load the engine's shared runtime library from; `None` leaves
    /// the engine's own lookup.
    pub onnx_lib_path: Option<PathBuf>,
    /// Cap on concurrently processed chunks. `None` (the default) runs every
    /// chunk of a call at once.
    pub max_in_flight: Option<usize>,
}

impl Default for InitOptions {
    fn default() -> Self {
        InitOptions {
            model: EmbeddingModel::default(),
            execution_providers: Vec::new(),
            max_length: config::encoding::DEFAULT_MAX_LENGTH,
            cache_dir: PathBuf::from(config::cache::DEFAULT_CACHE_DIR),
            show_download_progress: true,
            onnx_lib_path: None,
            max_in_flight: None,
        }
    }
}

impl InitOptions {
    pub fn with_model(mut self, model: EmbeddingModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_execution_providers(mut self, providers: Vec<String>) -> Self {
        self.execution_providers = providers;
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    pub fn with_show_download_progress(mut self, show: bool) -> Self {
        self.show_download_progress = show;
        self
    }

    pub fn with_onnx_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.onnx_lib_path = Some(path.into());
        self
    }

    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = Some(limit);
        self
    }
}

/// Text embedding service over a pretrained model.
pub struct FlagEmbedding {
    encoder: Encoder,
    backend: Box<dyn InferenceBackend>,
    max_in_flight: Option<usize>,
}

impl FlagEmbedding {
    /// Resolves the model artifact (downloading on first use), loads the
    /// tokenizer and initializes the engine runtime.
    pub fn new(options: InitOptions) -> Result<Self> {
        let max_length = if options.max_length == 0 {
            config::encoding::DEFAULT_MAX_LENGTH
        } else {
            options.max_length
        };

        runtime::ensure_initialized(options.onnx_lib_path.as_deref(), &options.execution_providers)?;

        let model_dir = download::retrieve_model(
            options.model,
            &options.cache_dir,
            options.show_download_progress,
        )?;

        let encoder = Encoder::new(&model_dir.join(config::artifact::TOKENIZER_FILE), max_length)?;
        let backend = OnnxBackend::new(
            model_dir.join(config::artifact::WEIGHTS_FILE),
            options.model.hidden_dim(),
        );

        log::info!(
            "Embedding service ready: model={}, dims={}, max_length={max_length}",
            options.model,
            options.model.hidden_dim()
        );

        Ok(Self::with_backend(encoder, Box::new(backend), options.max_in_flight))
    }

    /// Builds the service over a caller-supplied inference backend. No
    /// artifact retrieval or engine runtime initialization happens here.
    pub fn with_backend(
        encoder: Encoder,
        backend: Box<dyn InferenceBackend>,
        max_in_flight: Option<usize>,
    ) -> Self {
        FlagEmbedding { encoder, backend, max_in_flight }
    }

    /// Embeds `inputs` in concurrent chunks of `batch_size` (0 selects the
    /// default of 512). The i-th output vector corresponds to the i-th
    /// input, whatever order the chunks finish in.
    pub fn embed(&self, inputs: &[String], batch_size: usize) -> Result<Vec<Vec<f32>>> {
        batch::run_batches(inputs, batch_size, self.max_in_flight, |chunk| {
            self.embed_chunk(chunk)
        })
    }

    /// Embeds one search query, prefixed with the task instruction the
    /// supported model family expects.
    pub fn query_embed(&self, query: &str) -> Result<Vec<f32>> {
        let prefixed = format!("{}{query}", config::prefix::QUERY);
        let vectors = self.embed_chunk(&[prefixed])?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::Shape("no embedding produced for query".into()))
    }

    /// Embeds passages/documents, each prefixed with the task instruction,
    /// then batched like [`embed`](Self::embed).
    pub fn passage_embed(&self, inputs: &[String], batch_size: usize) -> Result<Vec<Vec<f32>>> {
        let prefixed: Vec<String> = inputs
            .iter()
            .map(|text| format!("{}{text}", config::prefix::PASSAGE))
            .collect();
        self.embed(&prefixed, batch_size)
    }

    /// Width of the vectors this service produces.
    pub fn hidden_dim(&self) -> usize {
        self.backend.hidden_dim()
    }

    /// Releases the service and shuts the engine runtime down. Dropping the
    /// service without calling this leaves the runtime initialized for other
    /// instances.
    pub fn close(self) {
        drop(self);
        runtime::shutdown();
    }

    /// One chunk through the full pipeline: encode → assemble → infer → pool.
    fn embed_chunk(&self, chunk: &[String]) -> Result<Vec<Vec<f32>>> {
        let encoded = self.encoder.encode(chunk)?;
        let (ids, mask, type_ids) = tensor::assemble(&encoded)?;
        let hidden = self.backend.infer(&ids, &mask, &type_ids)?;
        pooling::pooled_embeddings(&hidden)
    }
}
