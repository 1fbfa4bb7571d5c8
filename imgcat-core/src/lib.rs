// ABOUTME: Streaming encoder for the iTerm2 inline image escape sequence protocol
// ABOUTME: Frames arbitrary image bytes and base64 encodes them on a background thread

pub mod detection;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod options;
pub mod pipe;
pub mod transcoder;

pub use detection::{EnvVars, TerminalCapabilities};
pub use encoder::{Encoder, EncoderConfig};
pub use error::{ImgcatError, Result};
pub use frame::{Frame, Passthrough};
pub use options::{ImageOption, Length, ParseLengthError};
pub use transcoder::ImageWriter;

/// Whether the current terminal can show inline images, judged from the environment.
pub fn is_supported() -> bool {
    TerminalCapabilities::detect().supports_inline_images
}
