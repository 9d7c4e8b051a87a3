// encoder.rs — Tokenization boundary.
//
// Wraps the external tokenizer, configured exactly once at construction:
// longest-first truncation capped at `max_length`, right padding to exactly
// `max_length` with pad id 0. Every encoded sequence therefore has the same
// fixed length, empty inputs included.

use std::path::Path;

use tokenizers::{
    PaddingDirection, PaddingParams, PaddingStrategy, Tokenizer, TruncationParams,
    TruncationStrategy,
};

use crate::config;
use crate::error::{Error, Result};

/// One tokenized input: three parallel arrays of exactly `max_length` entries.
#[derive(Debug, Clone)]
pub struct EncodedSequence {
    pub ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub type_ids: Vec<u32>,
}

pub struct Encoder {
    tokenizer: Tokenizer,
    max_length: usize,
}

impl Encoder {
    /// Loads `tokenizer.json` from disk and applies the fixed-length
    /// truncation/padding configuration.
    pub fn new(tokenizer_path: &Path, max_length: usize) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| Error::Encoding(format!("load {}: {e}", tokenizer_path.display())))?;
        Self::from_tokenizer(tokenizer, max_length)
    }

    /// Wraps a caller-supplied tokenizer, applying the same fixed-length
    /// configuration. The tokenizer's own truncation/padding settings are
    /// overwritten.
    pub fn from_tokenizer(mut tokenizer: Tokenizer, max_length: usize) -> Result<Self> {
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                strategy: TruncationStrategy::LongestFirst,
                ..Default::default()
            }))
            .map_err(Error::encoding)?;

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(max_length),
            direction: PaddingDirection::Right,
            pad_id: config::encoding::PAD_ID,
            pad_token: config::encoding::PAD_TOKEN.to_string(),
            ..Default::default()
        }));

        Ok(Encoder { tokenizer, max_length })
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Tokenizes a batch, in order. Each result carries exactly
    /// `max_length` ids, mask entries and type ids.
    pub fn encode(&self, batch: &[String]) -> Result<Vec<EncodedSequence>> {
        let inputs: Vec<&str> = batch.iter().map(|s| s.as_str()).collect();
        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(Error::encoding)?;

        Ok(encodings
            .iter()
            .map(|e| EncodedSequence {
                ids: e.get_ids().to_vec(),
                attention_mask: e.get_attention_mask().to_vec(),
                type_ids: e.get_type_ids().to_vec(),
            })
            .collect())
    }
}
