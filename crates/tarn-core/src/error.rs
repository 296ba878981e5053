//! Error types for Tarn

use thiserror::Error;

/// The main error type for Tarn operations
#[derive(Debug, Error)]
pub enum TarnError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("Invalid texture slot: {0} (expected 0..=3)")]
    InvalidTextureSlot(u32),

    #[error("Shader error in '{program}': {message}")]
    ShaderError { program: String, message: String },

    #[error("Texture error: {0}")]
    TextureError(String),

    #[error("Render error: {0}")]
    RenderError(String),
}

/// Result type alias for Tarn operations
pub type Result<T> = std::result::Result<T, TarnError>;

impl From<toml::de::Error> for TarnError {
    fn from(err: toml::de::Error) -> Self {
        TarnError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for TarnError {
    fn from(err: toml::ser::Error) -> Self {
        TarnError::TomlSerError(err.to_string())
    }
}
