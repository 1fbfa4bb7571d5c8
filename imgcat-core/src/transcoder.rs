// ABOUTME: Streaming base64 transcoder that frames image bytes on a background thread
// ABOUTME: Caller writes raw bytes; a drain thread forwards header, payload and footer

use crate::error::{ImgcatError, Result};
use crate::frame::Frame;
use crate::pipe::{self, PipeReader, PipeWriter};
use base64::engine::GeneralPurpose;
use base64::engine::general_purpose::STANDARD;
use base64::write::EncoderWriter;
use std::io::{self, Write};
use std::thread::{self, JoinHandle};

type Base64Writer = EncoderWriter<'static, GeneralPurpose, PipeWriter>;

/// One image transfer in progress.
///
/// Bytes written here are base64 encoded and handed through a rendezvous pipe to a
/// drain thread, which owns the sink until the session is closed. `close` must be
/// called to finish the frame; dropping an open writer closes it and discards the
/// result.
pub struct ImageWriter<W: Write + Send + 'static> {
    encoder: Option<Base64Writer>,
    drain: Option<JoinHandle<W>>,
    sink: Option<W>,
    closed: Option<std::result::Result<(), (io::ErrorKind, String)>>,
}

impl<W: Write + Send + 'static> ImageWriter<W> {
    /// Spawn the drain thread and return the writable end.
    pub(crate) fn start(out: W, frame: Frame) -> Result<Self> {
        let (reader, writer) = pipe::pipe();

        let drain = thread::Builder::new()
            .name("imgcat-drain".to_string())
            .spawn(move || drain(out, reader, frame))
            .map_err(ImgcatError::Spawn)?;

        Ok(Self {
            encoder: Some(EncoderWriter::new(writer, &STANDARD)),
            drain: Some(drain),
            sink: None,
            closed: None,
        })
    }

    /// Finish the payload, wait for the drain thread to write the footer, and report
    /// the first sink error seen during the session.
    ///
    /// Calling `close` again returns the same outcome without doing anything.
    pub fn close(&mut self) -> io::Result<()> {
        if let Some(outcome) = &self.closed {
            return outcome
                .clone()
                .map_err(|(kind, message)| io::Error::new(kind, message));
        }

        let result = self.shutdown();
        self.closed = Some(
            result
                .as_ref()
                .map(|_| ())
                .map_err(|err| (err.kind(), err.to_string())),
        );
        result
    }

    /// Close the session and hand back the sink.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.close()?;
        self.sink
            .take()
            .ok_or_else(|| io::Error::other("image writer lost its output sink"))
    }

    /// Sink recovery for the whole-reader path, which must return it even on failure.
    pub(crate) fn take_sink(&mut self) -> Option<W> {
        self.sink.take()
    }

    fn shutdown(&mut self) -> io::Result<()> {
        let Some(mut encoder) = self.encoder.take() else {
            return Ok(());
        };

        let outcome = match encoder.finish() {
            Ok(pipe_writer) => {
                let mut failure = pipe_writer.close();
                self.join_drain();
                failure.poll().map_or(Ok(()), Err)
            }
            Err(err) => {
                // Dropping the encoder closes the write end before the join
                drop(encoder);
                self.join_drain();
                Err(err)
            }
        };

        log::debug!(
            "Image session closed{}",
            if outcome.is_ok() { "" } else { " with error" }
        );
        outcome
    }

    fn join_drain(&mut self) {
        if let Some(handle) = self.drain.take() {
            match handle.join() {
                Ok(sink) => self.sink = Some(sink),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
    }
}

impl<W: Write + Send + 'static> Write for ImageWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.encoder.as_mut() {
            Some(encoder) => encoder.write(buf),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "image writer is closed",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.encoder.as_mut() {
            Some(encoder) => encoder.flush(),
            None => Ok(()),
        }
    }
}

impl<W: Write + Send + 'static> Drop for ImageWriter<W> {
    fn drop(&mut self) {
        if self.closed.is_none() && !thread::panicking() {
            let _ = self.close();
        }
    }
}

/// Drain thread body: header, everything from the pipe, footer.
///
/// Stops at the first sink error, which is handed to the writer through the pipe.
/// The sink is always returned so the caller can reuse it.
fn drain<W: Write>(mut out: W, mut reader: PipeReader, frame: Frame) -> W {
    log::debug!("Drain thread started");

    let result = out
        .write_all(frame.header())
        .and_then(|_| io::copy(&mut reader, &mut out))
        .and_then(|forwarded| {
            log::debug!("Forwarded {} base64 bytes", forwarded);
            out.write_all(frame.footer())
        })
        .and_then(|_| out.flush());

    if let Err(err) = result {
        log::debug!("Drain thread stopped on sink error: {}", err);
        reader.close_with_error(err);
    }

    out
}
