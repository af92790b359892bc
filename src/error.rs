use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoachError {
    #[error("{name}: unsupported file type '{mime_type}'")]
    InvalidFileType { name: String, mime_type: String },

    #[error("player tag is empty")]
    EmptyInput,

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl CoachError {
    /// Notice title as shown in the UI.
    pub fn title(&self) -> &'static str {
        match self {
            CoachError::InvalidFileType { .. } => "Invalid file type",
            CoachError::EmptyInput => "BattleTag required",
            CoachError::Clipboard(_) => "Failed to copy",
            CoachError::Backend(_) => "Request failed",
        }
    }

    pub fn description(&self) -> String {
        match self {
            CoachError::InvalidFileType { .. } => {
                "Please drop .mp4, .wav, .png, or .jpg files only.".to_string()
            }
            CoachError::EmptyInput => {
                "Please enter your BattleTag (e.g., Player#1234)".to_string()
            }
            CoachError::Clipboard(_) => "Could not copy advice to clipboard".to_string(),
            CoachError::Backend(msg) => msg.clone(),
        }
    }
}
