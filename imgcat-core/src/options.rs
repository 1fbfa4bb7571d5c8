// ABOUTME: Display options for the iTerm2 inline image protocol
// ABOUTME: Renders names, sizes, dimensions and flags into key=value fragments

use base64::{Engine, engine::general_purpose::STANDARD};
use std::fmt;
use std::str::FromStr;

/// A width or height as understood by the `width=`/`height=` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    /// Character cells.
    Cells(u32),
    /// Pixels.
    Pixels(u32),
    /// Percentage of the session's width or height.
    Percent(u32),
    /// The image's inherent size.
    Auto,
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Cells(n) => write!(f, "{}", n),
            Length::Pixels(n) => write!(f, "{}px", n),
            Length::Percent(n) => write!(f, "{}%", n),
            Length::Auto => f.write_str("auto"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid length '{0}'. Expected N, Npx, N% or auto")]
pub struct ParseLengthError(String);

impl FromStr for Length {
    type Err = ParseLengthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Length::Auto);
        }

        let number = |digits: &str| -> Result<u32, ParseLengthError> {
            // u32::from_str accepts a leading '+', the wire format does not
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ParseLengthError(s.to_string()));
            }
            digits.parse().map_err(|_| ParseLengthError(s.to_string()))
        };

        if let Some(digits) = trimmed.strip_suffix("px") {
            number(digits).map(Length::Pixels)
        } else if let Some(digits) = trimmed.strip_suffix('%') {
            number(digits).map(Length::Percent)
        } else {
            number(trimmed).map(Length::Cells)
        }
    }
}

/// A single `key=value` fragment of the option span.
///
/// Options are opaque once built. Their order in a list is kept verbatim on the wire
/// and nothing is deduplicated or validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageOption(String);

impl ImageOption {
    /// Filename shown by the terminal. The name is base64 encoded on its own, separately
    /// from the payload.
    pub fn name(name: impl AsRef<[u8]>) -> Self {
        Self(format!("name={}", STANDARD.encode(name.as_ref())))
    }

    /// File size in bytes; only drives the terminal's progress indicator.
    pub fn size(bytes: u64) -> Self {
        Self(format!("size={}", bytes))
    }

    pub fn width(length: Length) -> Self {
        Self(format!("width={}", length))
    }

    pub fn height(length: Length) -> Self {
        Self(format!("height={}", length))
    }

    /// When false the image is stretched to the given width and height.
    pub fn preserve_aspect_ratio(preserve: bool) -> Self {
        Self(format!("preserveAspectRatio={}", u8::from(preserve)))
    }

    /// When false the terminal downloads the file instead of displaying it.
    pub fn inline(inline: bool) -> Self {
        Self(format!("inline={}", u8::from(inline)))
    }

    /// Any other key, passed through as-is.
    pub fn custom(key: &str, value: impl fmt::Display) -> Self {
        Self(format!("{}={}", key, value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ImageOption {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
