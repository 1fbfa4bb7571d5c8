// ABOUTME: Public entry points for encoding images to an iTerm2-compatible terminal
// ABOUTME: Whole-reader and incremental modes behind a terminal support gate

use crate::detection::TerminalCapabilities;
use crate::error::{ImgcatError, Result};
use crate::frame::{Frame, Passthrough};
use crate::options::ImageOption;
use crate::transcoder::ImageWriter;
use std::io::{self, Read, Write};
use typed_builder::TypedBuilder;

const COPY_BUF_SIZE: usize = 32 * 1024;

#[derive(Debug, Clone, TypedBuilder)]
pub struct EncoderConfig {
    /// Display options, written to the header in this order.
    #[builder(default)]
    pub options: Vec<ImageOption>,

    /// Terminal support and multiplexer wrapping. Read from the environment unless given.
    #[builder(default = TerminalCapabilities::detect())]
    pub terminal: TerminalCapabilities,
}

/// Encodes images onto an output sink.
///
/// The same encoder can encode several images one after another; each one is a
/// separate frame with the same options.
pub struct Encoder<W> {
    out: Option<W>,
    options: Vec<ImageOption>,
    passthrough: Passthrough,
}

impl<W: Write + Send + 'static> Encoder<W> {
    /// Create an encoder, detecting terminal support from the environment.
    pub fn new(out: W, options: Vec<ImageOption>) -> Result<Self> {
        Self::with_config(out, EncoderConfig::builder().options(options).build())
    }

    /// Create an encoder with explicit terminal capabilities.
    ///
    /// Fails with [`ImgcatError::Unsupported`] before anything is allocated when the
    /// terminal cannot show inline images.
    pub fn with_config(out: W, config: EncoderConfig) -> Result<Self> {
        config.terminal.ensure_supported()?;

        Ok(Self {
            out: Some(out),
            options: config.options,
            passthrough: config.terminal.passthrough,
        })
    }

    pub fn options(&self) -> &[ImageOption] {
        &self.options
    }

    /// Encode everything `reader` yields as one image.
    ///
    /// Returns the first failure, whether reading the source or writing the sink. The
    /// frame is closed either way, so the output stays well formed up to the point the
    /// sink failed.
    pub fn encode<R: Read>(&mut self, mut reader: R) -> Result<()> {
        let out = self.take_out()?;
        let mut writer = ImageWriter::start(out, self.frame())?;

        let copied = copy_into(&mut reader, &mut writer);
        let closed = writer.close();
        self.out = writer.take_sink();

        let copied = copied?;
        closed.map_err(ImgcatError::SinkWrite)?;
        log::debug!("Encoded {} byte image", copied);
        Ok(())
    }

    /// Start an incremental session. Write the image to the returned handle, then close it.
    pub fn into_writer(mut self) -> Result<ImageWriter<W>> {
        let out = self.take_out()?;
        ImageWriter::start(out, self.frame())
    }

    /// Give back the output sink.
    pub fn into_inner(self) -> Option<W> {
        self.out
    }

    pub fn get_ref(&self) -> Option<&W> {
        self.out.as_ref()
    }

    fn frame(&self) -> Frame {
        Frame::new(&self.options, self.passthrough)
    }

    fn take_out(&mut self) -> Result<W> {
        // Only a failed drain thread spawn can lose the sink
        self.out.take().ok_or_else(|| {
            ImgcatError::SinkWrite(io::Error::new(
                io::ErrorKind::NotConnected,
                "output sink was lost by an earlier session",
            ))
        })
    }
}

fn copy_into<R: Read, W: Write>(reader: &mut R, writer: &mut W) -> Result<u64> {
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(ImgcatError::SourceRead(err)),
        };
        writer
            .write_all(&buf[..n])
            .map_err(ImgcatError::SinkWrite)?;
        total += n as u64;
    }
}
