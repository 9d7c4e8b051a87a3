// batch.rs — Chunked, concurrent batch scheduling.
//
// Inputs split into contiguous chunks; one scoped thread per chunk writes
// into its own disjoint slice of a pre-sized result vector, so the results
// need no lock. Failures go into a bounded channel; after every chunk has
// finished, the first recorded failure (if any) wins and partial results are
// discarded.

use std::sync::mpsc;
use std::sync::{Condvar, Mutex};
use std::thread;

use crate::config;
use crate::error::{Error, Result};

/// Runs `embed_chunk` over `inputs` split into chunks of `batch_size`
/// (0 selects the default of 512; the final chunk may be shorter) and
/// returns one result per input, in input order.
///
/// `max_in_flight` caps how many chunks run at once; `None` runs every
/// chunk concurrently.
pub fn run_batches<F>(
    inputs: &[String],
    batch_size: usize,
    max_in_flight: Option<usize>,
    embed_chunk: F,
) -> Result<Vec<Vec<f32>>>
where
    F: Fn(&[String]) -> Result<Vec<Vec<f32>>> + Sync,
{
    let batch_size = if batch_size == 0 {
        config::batching::DEFAULT_BATCH_SIZE
    } else {
        batch_size
    };

    let mut results: Vec<Vec<f32>> = vec![Vec::new(); inputs.len()];
    if inputs.is_empty() {
        return Ok(results);
    }

    let chunk_count = inputs.len().div_ceil(batch_size);
    let (error_tx, error_rx) = mpsc::sync_channel::<Error>(chunk_count);
    let gate = max_in_flight.map(Semaphore::new);

    thread::scope(|scope| {
        for (chunk, slots) in inputs.chunks(batch_size).zip(results.chunks_mut(batch_size)) {
            let error_tx = error_tx.clone();
            let embed_chunk = &embed_chunk;
            let gate = gate.as_ref();
            scope.spawn(move || {
                let _permit = gate.map(Semaphore::acquire);
                match embed_chunk(chunk) {
                    Ok(vectors) if vectors.len() == chunk.len() => {
                        for (slot, vector) in slots.iter_mut().zip(vectors) {
                            *slot = vector;
                        }
                    }
                    Ok(vectors) => {
                        let _ = error_tx.send(Error::Shape(format!(
                            "chunk of {} inputs produced {} vectors",
                            chunk.len(),
                            vectors.len()
                        )));
                    }
                    Err(e) => {
                        let _ = error_tx.send(e);
                    }
                }
            });
        }
    });

    // Every chunk has joined; surface one failure if any occurred.
    drop(error_tx);
    match error_rx.try_recv() {
        Ok(error) => Err(error),
        Err(_) => Ok(results),
    }
}

/// Counting semaphore gating in-flight chunks.
struct Semaphore {
    slots: Mutex<usize>,
    freed: Condvar,
}

struct Permit<'a>(&'a Semaphore);

impl Semaphore {
    fn new(slots: usize) -> Self {
        // A zero bound would deadlock every chunk; treat it as one.
        Semaphore {
            slots: Mutex::new(slots.max(1)),
            freed: Condvar::new(),
        }
    }

    fn acquire(&self) -> Permit<'_> {
        let mut slots = self.lock();
        while *slots == 0 {
            slots = self
                .freed
                .wait(slots)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        *slots -= 1;
        Permit(self)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, usize> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        *self.0.lock() += 1;
        self.0.freed.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn inputs(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("text-{i}")).collect()
    }

    /// Embeds each string to a vector holding its numeric suffix, so order
    /// is checkable after reassembly.
    fn index_embedder(chunk: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(chunk
            .iter()
            .map(|s| {
                let idx: f32 = s.trim_start_matches("text-").parse().unwrap();
                vec![idx, idx * 2.0]
            })
            .collect())
    }

    #[test]
    fn test_order_preserved_across_chunk_sizes() {
        let texts = inputs(23);
        for batch_size in [1, 2, 3, 7, 23, 100] {
            let out = run_batches(&texts, batch_size, None, index_embedder).unwrap();
            assert_eq!(out.len(), 23);
            for (i, v) in out.iter().enumerate() {
                assert_eq!(v[0], i as f32, "batch_size={batch_size}");
            }
        }
    }

    #[test]
    fn test_zero_batch_size_uses_default() {
        let texts = inputs(3);
        let out = run_batches(&texts, 0, None, index_embedder).unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_empty_input() {
        let out = run_batches(&[], 4, None, index_embedder).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_single_failure_discards_all_results() {
        let texts = inputs(10);
        let calls = AtomicUsize::new(0);
        let result = run_batches(&texts, 3, None, |chunk| {
            calls.fetch_add(1, Ordering::SeqCst);
            if chunk[0] == "text-3" {
                Err(Error::Encoding("boom".into()))
            } else {
                index_embedder(chunk)
            }
        });
        assert!(matches!(result.unwrap_err(), Error::Encoding(_)));
        // Siblings are not cancelled; every chunk still ran.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_short_vector_count_is_a_shape_error() {
        let texts = inputs(4);
        let result = run_batches(&texts, 4, None, |_| Ok(vec![vec![1.0]]));
        assert!(matches!(result.unwrap_err(), Error::Shape(_)));
    }

    #[test]
    fn test_bounded_concurrency_never_exceeds_limit() {
        let texts = inputs(16);
        let running = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let out = run_batches(&texts, 1, Some(2), |chunk| {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(5));
            running.fetch_sub(1, Ordering::SeqCst);
            index_embedder(chunk)
        })
        .unwrap();
        assert_eq!(out.len(), 16);
        assert!(peak.load(Ordering::SeqCst) <= 2, "peak={}", peak.load(Ordering::SeqCst));
    }
}
