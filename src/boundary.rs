//! Contracts with the chat platform, plus filesystem stand-ins used by the CLI.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{BoilError, BoilResult};
use crate::foundation::math::sha256_hex;

/// Extensions probed by [`FsSubjectSource`], in order.
pub const SUBJECT_IMAGE_EXTS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Who a command is about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subject {
    /// Stable platform id; used as the cache key prefix.
    pub id: String,
    /// How to address the subject in a caption (e.g. a mention).
    pub mention: String,
}

impl Subject {
    /// Subject whose mention is its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            mention: id.clone(),
            id,
        }
    }

    /// Override the caption mention.
    pub fn with_mention(mut self, mention: impl Into<String>) -> Self {
        self.mention = mention.into();
        self
    }
}

/// The subject's current image and a stable fingerprint of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectImage {
    /// Identifier that changes whenever the image changes.
    pub fingerprint: String,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

/// Fetches a subject's current image. Must be idempotent for a given fingerprint.
pub trait SubjectSource: Send + Sync {
    /// Fetch the image for `subject_id`.
    fn fetch_subject_image(&self, subject_id: &str) -> BoilResult<SubjectImage>;
}

/// Sends a finished artifact back to the requester.
pub trait Delivery {
    /// Deliver the file at `artifact` with `caption`.
    fn deliver(&mut self, artifact: &Path, caption: &str) -> BoilResult<()>;
}

/// Caption sent with a boiled animation.
pub fn boil_caption(mention: &str) -> String {
    format!("\"hey {mention}\" and they're boiled 😭😭😭😭")
}

/// Caption sent with the pet animation.
pub const PET_CAPTION: &str = "\"thanks for petting me 🥰\" -boiler bot";

/// Reads subject images from `<dir>/<subject>.<ext>` and fingerprints them with SHA-256.
#[derive(Clone, Debug)]
pub struct FsSubjectSource {
    dir: PathBuf,
}

impl FsSubjectSource {
    /// Source rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SubjectSource for FsSubjectSource {
    fn fetch_subject_image(&self, subject_id: &str) -> BoilResult<SubjectImage> {
        crate::cache::store::validate_subject(subject_id)?;

        let Some(path) = SUBJECT_IMAGE_EXTS
            .iter()
            .map(|ext| self.dir.join(format!("{subject_id}.{ext}")))
            .find(|p| p.is_file())
        else {
            return Err(BoilError::input(format!(
                "no image for subject '{subject_id}' in '{}'",
                self.dir.display()
            )));
        };

        let bytes = std::fs::read(&path)
            .with_context(|| format!("read subject image '{}'", path.display()))
            .map_err(|e| BoilError::input(format!("{e:#}")))?;
        tracing::info!(
            subject = subject_id,
            bytes = bytes.len(),
            "subject image fetched"
        );
        Ok(SubjectImage {
            fingerprint: sha256_hex(&bytes),
            bytes,
        })
    }
}

/// Copies delivered artifacts into a directory and remembers the captions.
#[derive(Debug)]
pub struct DirDelivery {
    dir: PathBuf,
    delivered: Vec<(PathBuf, String)>,
}

impl DirDelivery {
    /// Deliver into `dir` (created on first use).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            delivered: Vec::new(),
        }
    }

    /// Delivered file paths with their captions, in delivery order.
    pub fn delivered(&self) -> &[(PathBuf, String)] {
        &self.delivered
    }
}

impl Delivery for DirDelivery {
    fn deliver(&mut self, artifact: &Path, caption: &str) -> BoilResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            BoilError::delivery(format!(
                "failed to create output directory '{}': {e}",
                self.dir.display()
            ))
        })?;
        let name = artifact
            .file_name()
            .ok_or_else(|| BoilError::delivery("artifact path has no file name"))?;
        let dest = self.dir.join(name);
        std::fs::copy(artifact, &dest).map_err(|e| {
            BoilError::delivery(format!(
                "failed to copy '{}' to '{}': {e}",
                artifact.display(),
                dest.display()
            ))
        })?;
        self.delivered.push((dest, caption.to_string()));
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/boundary.rs"]
mod tests;
