// inference.rs — The boundary call into the inference engine.
//
// The forward pass is a pure function from three [batch, max_length] i64
// buffers to one [batch, max_length, hidden] f32 buffer. The engine session
// and its tensors are acquired per call and released on scope exit, success
// or failure.

use std::path::PathBuf;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;

use crate::config;
use crate::error::{Error, Result};
use crate::tensor::TensorBuffer;

/// The external inference engine, seen from the embedding pipeline.
///
/// Implementations own none of the pipeline's state and may be called from
/// several batch threads at once.
pub trait InferenceBackend: Send + Sync {
    /// Runs the forward pass. The output shape is
    /// `[batch, max_length, hidden_dim()]` with `batch` taken from the
    /// inputs.
    fn infer(
        &self,
        ids: &TensorBuffer<i64>,
        mask: &TensorBuffer<i64>,
        type_ids: &TensorBuffer<i64>,
    ) -> Result<TensorBuffer<f32>>;

    /// Width of the hidden-state vectors the model emits.
    fn hidden_dim(&self) -> usize;
}

/// ONNX Runtime implementation. Holds only the weights path; a session is
/// built per call and dropped with it.
pub struct OnnxBackend {
    weights_path: PathBuf,
    hidden_dim: usize,
}

impl OnnxBackend {
    pub fn new(weights_path: PathBuf, hidden_dim: usize) -> Self {
        OnnxBackend { weights_path, hidden_dim }
    }
}

impl InferenceBackend for OnnxBackend {
    fn infer(
        &self,
        ids: &TensorBuffer<i64>,
        mask: &TensorBuffer<i64>,
        type_ids: &TensorBuffer<i64>,
    ) -> Result<TensorBuffer<f32>> {
        let (batch, max_length) = input_dims(ids, mask, type_ids)?;

        let mut session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(&self.weights_path)?;

        let ids_tensor = Tensor::from_array((vec![batch, max_length], ids.data().to_vec()))?;
        let mask_tensor = Tensor::from_array((vec![batch, max_length], mask.data().to_vec()))?;
        let type_tensor = Tensor::from_array((vec![batch, max_length], type_ids.data().to_vec()))?;

        let outputs = session.run(ort::inputs![
            config::engine::INPUT_IDS => ids_tensor,
            config::engine::ATTENTION_MASK => mask_tensor,
            config::engine::TOKEN_TYPE_IDS => type_tensor,
        ])?;

        let hidden = outputs.get(config::engine::OUTPUT).ok_or_else(|| {
            Error::Shape(format!("model has no {:?} output", config::engine::OUTPUT))
        })?;
        let (out_shape, out_data) = hidden.try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = out_shape.iter().map(|&d| d as usize).collect();

        if dims != [batch, max_length, self.hidden_dim] {
            return Err(Error::Shape(format!(
                "expected hidden states of shape [{batch}, {max_length}, {}], got {dims:?}",
                self.hidden_dim
            )));
        }

        TensorBuffer::new(out_data.to_vec(), dims)
    }

    fn hidden_dim(&self) -> usize {
        self.hidden_dim
    }
}

/// Checks the three input buffers are rank-2 and share one shape, and
/// returns (batch, max_length).
fn input_dims(
    ids: &TensorBuffer<i64>,
    mask: &TensorBuffer<i64>,
    type_ids: &TensorBuffer<i64>,
) -> Result<(usize, usize)> {
    let shape = ids.shape();
    if shape.len() != 2 {
        return Err(Error::Shape(format!("expected [batch, max_length] inputs, got {shape:?}")));
    }
    if mask.shape() != shape || type_ids.shape() != shape {
        return Err(Error::Shape(format!(
            "input tensor shapes disagree: ids {:?}, mask {:?}, type ids {:?}",
            shape,
            mask.shape(),
            type_ids.shape()
        )));
    }
    Ok((shape[0], shape[1]))
}
