// tensor.rs — Flat tensor buffers and the encoding→tensor assembly step.
//
// The inference engine consumes three contiguous i64 buffers of shape
// [batch, max_length] and produces one f32 buffer of shape
// [batch, max_length, hidden]. Token-space u32 values widen to i64 losslessly.

use crate::encoder::EncodedSequence;
use crate::error::{Error, Result};

/// A flat buffer plus its shape. Invariant: `data.len()` equals the product
/// of the dimensions; the constructor refuses anything else.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorBuffer<T> {
    data: Vec<T>,
    shape: Vec<usize>,
}

impl<T> TensorBuffer<T> {
    pub fn new(data: Vec<T>, shape: Vec<usize>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(Error::Shape(format!(
                "buffer holds {} elements but shape {:?} implies {}",
                data.len(),
                shape,
                expected
            )));
        }
        Ok(TensorBuffer { data, shape })
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// First dimension, 0 for a rank-0 buffer.
    pub fn batch_size(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }
}

/// Flattens a batch of encoded sequences into the three input buffers
/// (ids, attention mask, type ids), each of shape [batch, max_length].
pub fn assemble(
    sequences: &[EncodedSequence],
) -> Result<(TensorBuffer<i64>, TensorBuffer<i64>, TensorBuffer<i64>)> {
    let batch = sequences.len();
    let max_length = sequences.first().map(|s| s.ids.len()).unwrap_or(0);

    let total = batch * max_length;
    let mut ids = Vec::with_capacity(total);
    let mut mask = Vec::with_capacity(total);
    let mut type_ids = Vec::with_capacity(total);

    for seq in sequences {
        if seq.ids.len() != max_length {
            return Err(Error::Shape(format!(
                "encoded sequence length {} differs from batch length {}",
                seq.ids.len(),
                max_length
            )));
        }
        ids.extend(seq.ids.iter().map(|&v| i64::from(v)));
        mask.extend(seq.attention_mask.iter().map(|&v| i64::from(v)));
        type_ids.extend(seq.type_ids.iter().map(|&v| i64::from(v)));
    }

    let shape = vec![batch, max_length];
    Ok((
        TensorBuffer::new(ids, shape.clone())?,
        TensorBuffer::new(mask, shape.clone())?,
        TensorBuffer::new(type_ids, shape)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(ids: &[u32], mask: &[u32]) -> EncodedSequence {
        EncodedSequence {
            ids: ids.to_vec(),
            attention_mask: mask.to_vec(),
            type_ids: vec![0; ids.len()],
        }
    }

    #[test]
    fn test_new_rejects_shape_mismatch() {
        let err = TensorBuffer::new(vec![1i64, 2, 3], vec![2, 2]).unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }

    #[test]
    fn test_assemble_shapes_and_order() {
        let sequences = vec![seq(&[101, 7, 102, 0], &[1, 1, 1, 0]), seq(&[101, 9, 102, 0], &[1, 1, 1, 0])];
        let (ids, mask, type_ids) = assemble(&sequences).unwrap();

        assert_eq!(ids.shape(), &[2, 4]);
        assert_eq!(mask.shape(), &[2, 4]);
        assert_eq!(type_ids.shape(), &[2, 4]);
        assert_eq!(ids.batch_size(), 2);

        // Row-major, input order preserved.
        assert_eq!(ids.data(), &[101, 7, 102, 0, 101, 9, 102, 0]);
        assert_eq!(mask.data(), &[1, 1, 1, 0, 1, 1, 1, 0]);
        assert!(type_ids.data().iter().all(|&t| t == 0));
    }

    #[test]
    fn test_assemble_empty_batch() {
        let (ids, mask, type_ids) = assemble(&[]).unwrap();
        assert_eq!(ids.shape(), &[0, 0]);
        assert!(mask.data().is_empty());
        assert!(type_ids.data().is_empty());
    }

    #[test]
    fn test_assemble_rejects_ragged_batch() {
        let sequences = vec![seq(&[101, 102], &[1, 1]), seq(&[101, 7, 102], &[1, 1, 1])];
        assert!(matches!(assemble(&sequences).unwrap_err(), Error::Shape(_)));
    }

    #[test]
    fn test_widening_preserves_full_u32_range() {
        let sequences = vec![seq(&[u32::MAX, 0], &[1, 0])];
        let (ids, _, _) = assemble(&sequences).unwrap();
        assert_eq!(ids.data()[0], u32::MAX as i64);
    }
}
