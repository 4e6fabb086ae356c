//! Session-oriented command API.
//!
//! A [`Session`] is the explicitly constructed context for command handling: configuration, the
//! subject image source, the artifact cache and the optional post-optimizer. It holds no
//! per-request state and is `Send + Sync`, so a platform adapter can share one session across
//! worker threads.

use std::path::{Path, PathBuf};

use crate::boundary::{Delivery, PET_CAPTION, Subject, SubjectSource, boil_caption};
use crate::cache::store::{CacheKey, CacheStore};
use crate::config::BoilConfig;
use crate::foundation::error::{BoilError, BoilResult};
use crate::optimize::gifsicle::Gifsicle;
use crate::optimize::{PostOptimizer, refine};
use crate::sequence::processor::{ComposeStats, compose};
use crate::sequence::template::{AnimatedTemplate, decode_source_image};

/// Where a delivered artifact came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactOrigin {
    /// Served from the cache; the pipeline did not run.
    Cache,
    /// Produced by this invocation.
    Fresh,
}

/// Outcome of a successful boil command.
#[derive(Clone, Debug)]
pub struct BoilReport {
    /// Cache key of the artifact.
    pub key: CacheKey,
    /// Cache hit or fresh render.
    pub origin: ArtifactOrigin,
    /// Delivered artifact size in bytes.
    pub size_bytes: u64,
    /// Cache entry path, if the artifact is cached.
    pub cached_path: Option<PathBuf>,
    /// Compositing statistics for fresh renders.
    pub stats: Option<ComposeStats>,
}

/// Command-handling context.
pub struct Session {
    cfg: BoilConfig,
    source: Box<dyn SubjectSource>,
    cache: CacheStore,
    optimizer: Option<Box<dyn PostOptimizer>>,
}

impl Session {
    /// Build a session with an explicit optimizer (or none).
    pub fn new(
        cfg: BoilConfig,
        source: Box<dyn SubjectSource>,
        optimizer: Option<Box<dyn PostOptimizer>>,
    ) -> BoilResult<Self> {
        cfg.validate()?;
        let cache = CacheStore::open(&cfg.cache_dir)?;
        Ok(Self {
            cfg,
            source,
            cache,
            optimizer,
        })
    }

    /// Build a session, probing `PATH` for the optimizer when it is enabled.
    pub fn from_config(cfg: BoilConfig, source: Box<dyn SubjectSource>) -> BoilResult<Self> {
        let optimizer = if cfg.optimizer.enabled {
            Gifsicle::detect(cfg.optimizer.gifsicle.clone())
                .map(|g| Box::new(g) as Box<dyn PostOptimizer>)
        } else {
            None
        };
        Self::new(cfg, source, optimizer)
    }

    /// Active configuration.
    pub fn config(&self) -> &BoilConfig {
        &self.cfg
    }

    /// Artifact cache.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Fetch, composite (or reuse the cache), and deliver one subject's animation.
    ///
    /// Scratch files live in a per-call directory under `temp_dir` that is removed on every
    /// exit path. Two concurrent calls for one subject may both render; the cache still ends
    /// with a single entry.
    #[tracing::instrument(skip(self, delivery), fields(subject = %subject.id))]
    pub fn boil(&self, subject: &Subject, delivery: &mut dyn Delivery) -> BoilResult<BoilReport> {
        self.ensure_template()?;

        let image = self
            .source
            .fetch_subject_image(&subject.id)
            .map_err(|e| match e {
                BoilError::Input(_) | BoilError::Validation(_) => e,
                other => BoilError::input(format!("failed to fetch subject image: {other}")),
            })?;
        let key = CacheKey::new(subject.id.as_str(), image.fingerprint.as_str())?;
        let caption = boil_caption(&subject.mention);

        if let Some(entry) = self.cache.cached_entry(&key) {
            tracing::info!(fingerprint = key.fingerprint(), "using cached artifact");
            delivery.deliver(&entry.path, &caption)?;
            return Ok(BoilReport {
                key,
                origin: ArtifactOrigin::Cache,
                size_bytes: entry.size_bytes,
                cached_path: Some(entry.path),
                stats: None,
            });
        }
        tracing::info!("no cached artifact, rendering");

        let workspace = self.workspace()?;
        let template = AnimatedTemplate::open(&self.cfg.template_path)?;
        let insert = decode_source_image(&image.bytes)?;
        let composed = compose(&template, &insert, &self.cfg.compose)?;
        let bytes = refine(self.optimizer.as_deref(), composed.bytes);

        let size_bytes = bytes.len() as u64;
        tracing::info!(
            mib = size_bytes as f64 / (1024.0 * 1024.0),
            "output artifact size"
        );
        if size_bytes > self.cfg.max_artifact_bytes {
            tracing::warn!(
                size_bytes,
                limit = self.cfg.max_artifact_bytes,
                "artifact exceeds delivery ceiling"
            );
            close_workspace(workspace);
            return Err(BoilError::SizeLimit {
                size: size_bytes,
                limit: self.cfg.max_artifact_bytes,
            });
        }

        let output_path = workspace.path().join(key.file_name());
        std::fs::write(&output_path, &bytes).map_err(|e| {
            BoilError::Other(anyhow::Error::new(e).context("write artifact to scratch"))
        })?;

        let cached_path = match self.cache.put_cached(&key, &bytes) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(error = %e, "cache write failed, delivering uncached artifact");
                None
            }
        };

        let delivered = delivery.deliver(&output_path, &caption);
        close_workspace(workspace);
        delivered?;

        Ok(BoilReport {
            key,
            origin: ArtifactOrigin::Fresh,
            size_bytes,
            cached_path,
            stats: Some(composed.stats),
        })
    }

    /// Deliver the pre-made pet animation.
    #[tracing::instrument(skip_all)]
    pub fn pet(&self, delivery: &mut dyn Delivery) -> BoilResult<()> {
        if !self.cfg.pet_path.is_file() {
            return Err(BoilError::input(format!(
                "pet animation not found at '{}'",
                self.cfg.pet_path.display()
            )));
        }
        delivery.deliver(&self.cfg.pet_path, PET_CAPTION)
    }

    fn ensure_template(&self) -> BoilResult<()> {
        if self.cfg.template_path.is_file() {
            return Ok(());
        }
        Err(BoilError::input(format!(
            "template GIF not found at '{}'",
            self.cfg.template_path.display()
        )))
    }

    fn workspace(&self) -> BoilResult<tempfile::TempDir> {
        let root: &Path = &self.cfg.temp_dir;
        std::fs::create_dir_all(root).map_err(|e| {
            BoilError::Other(
                anyhow::Error::new(e).context(format!("create temp root '{}'", root.display())),
            )
        })?;
        tempfile::Builder::new()
            .prefix("boil-")
            .tempdir_in(root)
            .map_err(|e| BoilError::Other(anyhow::Error::new(e).context("create scratch dir")))
    }
}

fn close_workspace(workspace: tempfile::TempDir) {
    let path = workspace.path().to_path_buf();
    if let Err(e) = workspace.close() {
        tracing::debug!(path = %path.display(), error = %e, "failed to remove scratch dir");
    }
}

#[cfg(test)]
#[path = "../tests/unit/session.rs"]
mod tests;
