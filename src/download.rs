// download.rs — Model artifact retrieval and the local cache.
//
// Resolves a model to a populated local directory. On a cache miss the
// archive is fetched, gunzipped and untarred in a streaming pass into a
// staging directory, which is renamed into place only after extraction
// succeeds. A model directory that exists is therefore always complete.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use indicatif::ProgressBar;
use tar::{Archive, EntryType};

use crate::config;
use crate::error::{Error, Result};
use crate::model::EmbeddingModel;

/// Resolves `model` to `cache_dir/<archive_name>`, downloading and
/// extracting the archive on first use.
///
/// A cache hit returns immediately and performs no network I/O. Hit
/// detection is existence-only; directory contents are not validated.
pub fn retrieve_model(model: EmbeddingModel, cache_dir: &Path, show_progress: bool) -> Result<PathBuf> {
    retrieve_model_from(config::remote::STORAGE_BASE_URL, model, cache_dir, show_progress)
}

/// Same as [`retrieve_model`] but against an alternate archive host
/// (self-hosted mirrors). Archives must live at `{base_url}/{model}.tar.gz`.
pub fn retrieve_model_from(
    base_url: &str,
    model: EmbeddingModel,
    cache_dir: &Path,
    show_progress: bool,
) -> Result<PathBuf> {
    let model_dir = cache_dir.join(model.archive_name());
    if model_dir.exists() {
        log::debug!("Model already cached at {}", model_dir.display());
        return Ok(model_dir);
    }
    download_and_extract(base_url, model, cache_dir, &model_dir, show_progress)?;
    Ok(model_dir)
}

fn download_and_extract(
    base_url: &str,
    model: EmbeddingModel,
    cache_dir: &Path,
    model_dir: &Path,
    show_progress: bool,
) -> Result<()> {
    let url = format!("{base_url}/{}.tar.gz", model.archive_name());
    log::info!("Downloading {model} from {url}");

    let agent = ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(config::remote::CONNECT_TIMEOUT_SECS))
        .build();

    let response = match agent.get(&url).call() {
        Ok(r) => r,
        Err(ureq::Error::Status(code, resp)) => {
            return Err(Error::Download {
                status: format!("{code} {}", resp.status_text()),
            })
        }
        Err(e) => return Err(Error::Transport(Box::new(e))),
    };

    let content_length = response
        .header("Content-Length")
        .and_then(|v| v.parse::<u64>().ok());
    let body = response.into_reader();

    // The progress bar wraps the response reader transparently; the
    // extractor sees the same bytes either way.
    let bar = show_progress.then(|| {
        let bar = content_length.map_or_else(ProgressBar::new_spinner, ProgressBar::new);
        bar.set_message(format!("Downloading {model}"));
        bar
    });
    let reader: Box<dyn Read> = match &bar {
        Some(bar) => Box::new(bar.wrap_read(body)),
        None => Box::new(body),
    };

    let staging = cache_dir.join(format!(
        "{}{}",
        config::cache::STAGING_PREFIX,
        model.archive_name()
    ));
    if staging.exists() {
        log::warn!("Removing stale staging directory {}", staging.display());
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)?;

    match untar_into(reader, &staging) {
        Ok(()) => {
            if let Some(bar) = &bar {
                bar.finish_and_clear();
            }
            fs::rename(&staging, model_dir)?;
            log::info!("Model extracted to {}", model_dir.display());
            Ok(())
        }
        Err(e) => {
            if let Some(bar) = &bar {
                bar.abandon();
            }
            // Leave nothing a later run could mistake for a cached model.
            let _ = fs::remove_dir_all(&staging);
            Err(e)
        }
    }
}

/// Streams a gzip-compressed tar archive into `target`, preserving relative
/// paths. Directory and regular-file entries are materialized; every other
/// entry type is skipped.
fn untar_into(reader: impl Read, target: &Path) -> Result<()> {
    let extract_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| Error::Extract { path, source }
    };

    let mut archive = Archive::new(GzDecoder::new(reader));
    for entry in archive.entries().map_err(extract_err(target))? {
        let mut entry = entry.map_err(extract_err(target))?;
        let rel = entry.path().map_err(extract_err(target))?.into_owned();
        let dest = target.join(&rel);

        match entry.header().entry_type() {
            EntryType::Directory => {
                fs::create_dir_all(&dest).map_err(extract_err(&dest))?;
            }
            EntryType::Regular => {
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent).map_err(extract_err(parent))?;
                }
                let mut file = fs::File::create(&dest).map_err(extract_err(&dest))?;
                std::io::copy(&mut entry, &mut file).map_err(extract_err(&dest))?;
            }
            other => {
                log::debug!("Skipping archive entry {} ({other:?})", rel.display());
            }
        }
    }
    Ok(())
}
