use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read log")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize statistics")]
    Json(#[from] serde_json::Error),
}
