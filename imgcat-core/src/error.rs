// ABOUTME: Error types for the inline image encoder with user-friendly messages
// ABOUTME: Separates terminal support, sink, and source failures for callers

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImgcatError {
    #[error("Inline images are not supported by this terminal ({terminal})")]
    Unsupported { terminal: String },

    #[error("Failed to write image to output: {0}")]
    SinkWrite(io::Error),

    #[error("Failed to read image source: {0}")]
    SourceRead(io::Error),

    #[error("Failed to start drain thread: {0}")]
    Spawn(io::Error),
}

impl ImgcatError {
    pub fn help_text(&self) -> Option<&'static str> {
        match self {
            ImgcatError::Unsupported { .. } => Some(
                "Run inside iTerm2 (or a compatible terminal), or set IMGCAT_FORCE_INLINE=1 to skip the check",
            ),
            ImgcatError::SinkWrite(_) => Some("Check that the output is still open and writable"),
            _ => None,
        }
    }

    /// True when the terminal gate rejected the session; callers usually skip the image.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ImgcatError::Unsupported { .. })
    }

    /// The underlying I/O error, if this failure came from the sink or source.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            ImgcatError::SinkWrite(err) | ImgcatError::SourceRead(err) | ImgcatError::Spawn(err) => {
                Some(err)
            }
            ImgcatError::Unsupported { .. } => None,
        }
    }
}

impl From<ImgcatError> for io::Error {
    fn from(err: ImgcatError) -> Self {
        match err {
            ImgcatError::SinkWrite(err) | ImgcatError::SourceRead(err) | ImgcatError::Spawn(err) => {
                err
            }
            unsupported @ ImgcatError::Unsupported { .. } => {
                io::Error::new(io::ErrorKind::Unsupported, unsupported.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ImgcatError>;
