use thiserror::Error;

/// tsdocgen error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    ConfigValidation(String),

    #[error("Extraction failed for package '{package}': {message}")]
    Extraction { package: String, message: String },

    #[error("Malformed metadata: {0}")]
    Metadata(String),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for tsdocgen operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config validation error
    pub fn config_validation(msg: impl Into<String>) -> Self {
        Error::ConfigValidation(msg.into())
    }

    /// Create an extraction error for a package
    pub fn extraction(package: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Extraction {
            package: package.into(),
            message: message.into(),
        }
    }

    /// Create a malformed metadata error
    pub fn metadata(msg: impl Into<String>) -> Self {
        Error::Metadata(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Whether this error came from the extraction collaborator
    pub fn is_extraction(&self) -> bool {
        matches!(self, Error::Extraction { .. })
    }
}
