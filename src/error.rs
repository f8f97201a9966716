use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScoreError>;

#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Invalid definition in {file}: {message}")]
    Validation { file: String, message: String },

    #[error("Cannot decrypt {file}: {message}")]
    Decrypt { file: String, message: String },

    #[error("Cannot encrypt {file}: {message}")]
    Encrypt { file: String, message: String },

    #[error("No comparator available for platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ScoreError {
    pub fn exit_code(&self) -> i32 {
        2
    }
}
