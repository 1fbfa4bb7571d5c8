// ABOUTME: Escape sequence framing for the iTerm2 inline image protocol
// ABOUTME: Builds the header and footer around a base64 payload, with tmux passthrough

use crate::options::ImageOption;

const OSC: &str = "\x1b]";
const BEL: &str = "\x07";
const FILE_TAG: &str = "1337;File=";

// tmux forwards a DCS sequence with doubled ESC bytes to the outer terminal
const TMUX_PASSTHROUGH_START: &str = "\x1bPtmux;\x1b";
const TMUX_PASSTHROUGH_END: &str = "\x1b\\";

/// Whether the escape sequence must be wrapped for a terminal multiplexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Passthrough {
    #[default]
    None,
    Tmux,
}

/// The fixed bytes surrounding one image transfer.
///
/// `header` is the prologue plus the option span (ending in `:`), `footer` is the
/// terminator. The payload goes between them untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    header: Vec<u8>,
    footer: Vec<u8>,
}

impl Frame {
    pub fn new(options: &[ImageOption], passthrough: Passthrough) -> Self {
        let mut header = String::new();
        if passthrough == Passthrough::Tmux {
            header.push_str(TMUX_PASSTHROUGH_START);
        }
        header.push_str(OSC);
        header.push_str(FILE_TAG);
        header.push_str(&option_span(options));

        let mut footer = String::from(BEL);
        if passthrough == Passthrough::Tmux {
            footer.push_str(TMUX_PASSTHROUGH_END);
        }
        footer.push('\n');

        Self {
            header: header.into_bytes(),
            footer: footer.into_bytes(),
        }
    }

    pub fn header(&self) -> &[u8] {
        &self.header
    }

    pub fn footer(&self) -> &[u8] {
        &self.footer
    }

    /// Frame a complete, already base64 encoded payload in memory.
    pub fn wrap(&self, payload_b64: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header.len() + payload_b64.len() + self.footer.len());
        out.extend_from_slice(&self.header);
        out.extend_from_slice(payload_b64);
        out.extend_from_slice(&self.footer);
        out
    }
}

/// Options joined by `;` in the given order, terminated by `:`.
pub fn option_span(options: &[ImageOption]) -> String {
    let mut span = options
        .iter()
        .map(ImageOption::as_str)
        .collect::<Vec<_>>()
        .join(";");
    span.push(':');
    span
}
