/// Convenience result type used across boilgif.
pub type BoilResult<T> = Result<T, BoilError>;

/// Top-level error taxonomy for the compositing pipeline and its boundary.
#[derive(thiserror::Error, Debug)]
pub enum BoilError {
    /// Template or source image missing, unreadable or undecodable.
    #[error("input error: {0}")]
    Input(String),

    /// Assembled artifact exceeds the delivery ceiling.
    #[error("size limit error: artifact is {size} bytes, limit is {limit} bytes")]
    SizeLimit {
        /// Artifact size in bytes.
        size: u64,
        /// Configured ceiling in bytes.
        limit: u64,
    },

    /// External post-optimizer failed or is unavailable.
    #[error("optimizer error: {0}")]
    Optimizer(String),

    /// Cache directory write or purge failure.
    #[error("cache io error: {0}")]
    CacheIo(String),

    /// Invalid configuration or identifiers.
    #[error("validation error: {0}")]
    Validation(String),

    /// The boundary could not deliver the artifact.
    #[error("delivery error: {0}")]
    Delivery(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BoilError {
    /// Build a [`BoilError::Input`] value.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Build a [`BoilError::Optimizer`] value.
    pub fn optimizer(msg: impl Into<String>) -> Self {
        Self::Optimizer(msg.into())
    }

    /// Build a [`BoilError::CacheIo`] value.
    pub fn cache_io(msg: impl Into<String>) -> Self {
        Self::CacheIo(msg.into())
    }

    /// Build a [`BoilError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BoilError::Delivery`] value.
    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    /// Short message suitable for showing to the person who issued the command.
    ///
    /// Internal context stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Input(msg) => format!("❌ Couldn't read the image: {msg}"),
            Self::SizeLimit { size, limit } => format!(
                "❌ The output GIF is too large ({:.1} MB)! The limit is {:.1} MB.",
                mib(*size),
                mib(*limit)
            ),
            Self::Delivery(_) => "❌ Failed to send the result.".to_string(),
            Self::Optimizer(_) | Self::CacheIo(_) | Self::Validation(_) | Self::Other(_) => {
                "❌ Error processing image.".to_string()
            }
        }
    }
}

fn mib(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
