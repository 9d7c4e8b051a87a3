// model.rs — The closed set of supported embedding models.

use std::fmt;

/// Pretrained models this crate can download and run.
///
/// The archive name doubles as the remote object key and the local cache
/// directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbeddingModel {
    /// sentence-transformers/all-MiniLM-L6-v2, 384 dimensions.
    AllMiniLmL6V2,
    /// BAAI/bge-base-en, 768 dimensions.
    BgeBaseEn,
    /// BAAI/bge-small-en, 384 dimensions.
    BgeSmallEn,
}

impl EmbeddingModel {
    /// Remote archive key and cache directory name.
    pub fn archive_name(&self) -> &'static str {
        match self {
            EmbeddingModel::AllMiniLmL6V2 => "fast-all-MiniLM-L6-v2",
            EmbeddingModel::BgeBaseEn => "fast-bge-base-en",
            EmbeddingModel::BgeSmallEn => "fast-bge-small-en",
        }
    }

    /// Width of the hidden-state vectors this model emits.
    pub fn hidden_dim(&self) -> usize {
        match self {
            EmbeddingModel::AllMiniLmL6V2 => 384,
            EmbeddingModel::BgeBaseEn => 768,
            EmbeddingModel::BgeSmallEn => 384,
        }
    }
}

impl Default for EmbeddingModel {
    fn default() -> Self {
        EmbeddingModel::BgeSmallEn
    }
}

impl fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.archive_name())
    }
}
