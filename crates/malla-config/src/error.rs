//! Errors from loading and validating a [`crate::DspConfig`].

/// Errors from reading, parsing, or validating a config file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// TOML parse error.
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// Standard I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A field's value is outside its valid range.
    #[error("invalid config: {field} {reason}")]
    Validation {
        /// The offending field's name.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
}

/// Convenience result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
