/// Core error type.
///
/// Adapter crates map their specific errors into this type so the controller can
/// tell a recoverable render failure (`MessageNotEditable`) from everything else.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The transport refused an in-place edit (too old, not a text message,
    /// content unchanged, or already gone).
    #[error("message cannot be edited: {0}")]
    MessageNotEditable(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
