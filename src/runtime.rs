// runtime.rs — Process-wide inference engine lifecycle.
//
// The engine environment is global to the process. Initialization is
// idempotent (repeat calls are no-ops) and never happens behind the caller's
// back; teardown is an explicit call, not a hidden destructor.

use std::path::Path;
use std::sync::Mutex;

use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch};

use crate::config;
use crate::error::Result;

static INITIALIZED: Mutex<bool> = Mutex::new(false);

/// Initializes the engine environment once per process.
///
/// `library_path` overrides where the engine's shared runtime library is
/// loaded from; `execution_providers` are backend hints ("cuda", "cpu")
/// registered as session defaults. Both are ignored on every call after the
/// first successful one.
pub fn ensure_initialized(library_path: Option<&Path>, execution_providers: &[String]) -> Result<()> {
    let mut initialized = lock_state();
    if *initialized {
        return Ok(());
    }

    let builder = match library_path {
        Some(path) => {
            log::info!("Loading inference runtime from {}", path.display());
            ort::init_from(path.to_string_lossy())
        }
        None => ort::init(),
    };

    builder
        .with_name(config::engine::ENV_NAME)
        .with_execution_providers(resolve_providers(execution_providers))
        .commit()?;

    *initialized = true;
    log::info!("Inference runtime initialized");
    Ok(())
}

/// Marks the engine environment as torn down, allowing a later
/// re-initialization. The environment itself is reference-counted by open
/// sessions and freed with the last one.
pub fn shutdown() {
    let mut initialized = lock_state();
    if *initialized {
        *initialized = false;
        log::info!("Inference runtime shut down");
    }
}

fn lock_state() -> std::sync::MutexGuard<'static, bool> {
    INITIALIZED.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Maps backend hint strings to engine execution providers. Unknown hints
/// are logged and skipped; an empty list leaves the engine's own default.
fn resolve_providers(hints: &[String]) -> Vec<ExecutionProviderDispatch> {
    hints
        .iter()
        .filter_map(|hint| match hint.to_ascii_lowercase().as_str() {
            "cuda" => Some(CUDAExecutionProvider::default().build()),
            "cpu" => Some(CPUExecutionProvider::default().build()),
            other => {
                log::warn!("Ignoring unknown execution provider {other:?}");
                None
            }
        })
        .collect()
}
