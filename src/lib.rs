//! Batch text embeddings from pretrained transformer models, with a local
//! model artifact cache.
//!
//! The first construction of a [`FlagEmbedding`] downloads the selected
//! model's archive into the cache directory; every later construction (in
//! this process or another) resolves the cached copy without touching the
//! network. Inputs are embedded in concurrent fixed-size chunks and come
//! back in input order, L2-normalized.
//!
//! ## Main types
//!
//! - [`FlagEmbedding`] — the embedding service: `embed`, `query_embed`,
//!   `passage_embed`, `close`
//! - [`InitOptions`] — construction options (model, cache dir, max length,
//!   execution providers, ...)
//! - [`EmbeddingModel`] — the supported model set
//! - [`InferenceBackend`] — the inference engine boundary, swappable for a
//!   caller-supplied engine
//!
//! ## Usage
//!
//! ```rust,no_run
//! use flagembed::{FlagEmbedding, InitOptions};
//!
//! fn main() -> flagembed::Result<()> {
//!     let service = FlagEmbedding::new(InitOptions::default())?;
//!     let vectors = service.embed(
//!         &["hello world".to_string(), "foo".to_string()],
//!         0,
//!     )?;
//!     assert_eq!(vectors.len(), 2);
//!     service.close();
//!     Ok(())
//! }
//! ```

pub mod batch;
mod config;
pub mod download;
pub mod encoder;
pub mod error;
pub mod inference;
pub mod model;
pub mod pooling;
pub mod runtime;
pub mod tensor;

mod embedding;

pub use embedding::{FlagEmbedding, InitOptions};
pub use error::{Error, Result};
pub use inference::{InferenceBackend, OnnxBackend};
pub use model::EmbeddingModel;
pub use tensor::TensorBuffer;
