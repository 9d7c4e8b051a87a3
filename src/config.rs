// IMPORTANT:
// Keep ALL numeric values centralized here (repo rule: no hardcoded numeric values scattered around).

pub mod remote {
    /// Base URL the model archives are served from. Archives live at
    /// `{STORAGE_BASE_URL}/{archive_name}.tar.gz`.
    pub const STORAGE_BASE_URL: &str = "https://storage.googleapis.com/qdrant-fastembed";

    /// Connect timeout for the archive GET. The transfer itself is unbounded:
    /// archives run to hundreds of megabytes and stream straight to disk.
    pub const CONNECT_TIMEOUT_SECS: u64 = 30;
}

pub mod cache {
    /// Default on-disk cache directory, relative to the working directory.
    pub const DEFAULT_CACHE_DIR: &str = "local_cache";

    /// Staging directory prefix used while an archive is being extracted.
    /// The staged directory is renamed to the final model directory only
    /// after extraction completes, so a model directory that exists is
    /// always complete.
    pub const STAGING_PREFIX: &str = ".download-";
}

pub mod encoding {
    /// Default maximum token sequence length. Every encoded sequence is
    /// padded or truncated to exactly this many tokens.
    pub const DEFAULT_MAX_LENGTH: usize = 512;

    /// Token id used for right padding.
    pub const PAD_ID: u32 = 0;

    /// Padding token string, as named in the tokenizer vocabularies of the
    /// supported model family.
    pub const PAD_TOKEN: &str = "[PAD]";
}

pub mod batching {
    /// Default chunk size when the caller passes 0.
    pub const DEFAULT_BATCH_SIZE: usize = 512;
}

pub mod normalize {
    /// Bias added to each vector component after the division by the norm.
    /// Applied to the quotient, not the denominator.
    pub const EPSILON: f32 = 1e-12;
}

pub mod prefix {
    /// Task-instruction prefix for search queries. Plain concatenation;
    /// the tokenizer gives it no special handling.
    pub const QUERY: &str = "query: ";

    /// Task-instruction prefix for passages/documents.
    pub const PASSAGE: &str = "passage: ";
}

pub mod engine {
    /// Name the process-wide engine environment registers under.
    pub const ENV_NAME: &str = "flagembed";

    /// Graph input names of the supported model family.
    pub const INPUT_IDS: &str = "input_ids";
    pub const ATTENTION_MASK: &str = "attention_mask";
    pub const TOKEN_TYPE_IDS: &str = "token_type_ids";

    /// Graph output holding the per-token hidden states.
    pub const OUTPUT: &str = "last_hidden_state";
}

pub mod artifact {
    /// Tokenizer definition file inside a model directory.
    pub const TOKENIZER_FILE: &str = "tokenizer.json";

    /// Model weights file inside a model directory.
    pub const WEIGHTS_FILE: &str = "model_optimized.onnx";
}
