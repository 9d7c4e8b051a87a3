// error.rs — Error kinds surfaced by the public API.
//
// Every fallible operation returns `Result<T, Error>`; nothing is swallowed.
// Concurrent batch failures are reduced to the first error observed after all
// chunks finish (see batch.rs), so callers see one error per operation.

use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The archive server answered with a non-2xx status.
    #[error("model download failed: {status}")]
    Download { status: String },

    /// The archive request never produced a response (DNS, TLS, timeout, ...).
    #[error("model download failed: {0}")]
    Transport(#[from] Box<ureq::Error>),

    /// The archive could not be decoded or written out.
    #[error("model archive extraction failed at {path}: {source}")]
    Extract {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache directory or model file I/O failure outside of extraction.
    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    /// The tokenizer could not be loaded or rejected an input.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// A tensor's flat length disagrees with its shape, or batch dimensions
    /// disagree across the buffers of one inference call.
    #[error("tensor shape mismatch: {0}")]
    Shape(String),

    /// The inference engine failed to load the model or execute the forward pass.
    #[error("inference failed: {0}")]
    Inference(#[from] ort::Error),
}

impl Error {
    /// Wraps the boxed error the `tokenizers` crate returns.
    pub(crate) fn encoding(e: impl std::fmt::Display) -> Self {
        Error::Encoding(e.to_string())
    }
}
