// ABOUTME: Synchronous in-process byte pipe with error propagation from the read side
// ABOUTME: Rendezvous channel of chunks; a write blocks until the reader takes it

use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};

/// Create a connected pipe pair.
///
/// The data channel has no buffer, so every write waits for the reader to pick the
/// chunk up. The reader can close its end with an error, which the writer then
/// reports on its next write instead of blocking.
pub fn pipe() -> (PipeReader, PipeWriter) {
    let (data_tx, data_rx) = mpsc::sync_channel(0);
    let (failure_tx, failure_rx) = mpsc::sync_channel(1);

    (
        PipeReader {
            data: data_rx,
            failure: failure_tx,
            pending: Vec::new(),
            offset: 0,
        },
        PipeWriter {
            data: data_tx,
            failure: FailureSignal {
                receiver: failure_rx,
                observed: None,
            },
        },
    )
}

pub struct PipeReader {
    data: Receiver<Vec<u8>>,
    failure: SyncSender<io::Error>,
    pending: Vec<u8>,
    offset: usize,
}

impl PipeReader {
    /// Close the read end, handing `err` to the writer.
    pub fn close_with_error(self, err: io::Error) {
        // Capacity 1 and a single sender, so this never blocks. The error must be queued
        // before the data receiver is dropped below.
        let _ = self.failure.try_send(err);
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.offset >= self.pending.len() {
            match self.data.recv() {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.offset = 0;
                }
                // Writer closed: end of stream
                Err(_) => return Ok(0),
            }
        }

        let available = &self.pending[self.offset..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.offset += n;
        Ok(n)
    }
}

pub struct PipeWriter {
    data: SyncSender<Vec<u8>>,
    failure: FailureSignal,
}

impl PipeWriter {
    /// Close the write end. The reader sees end of stream once it drains what it has.
    ///
    /// The returned signal reports an error the reader may still close with.
    pub fn close(self) -> FailureSignal {
        self.failure
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(err) = self.failure.replay() {
            return Err(err);
        }
        if buf.is_empty() {
            return Ok(0);
        }

        match self.data.send(buf.to_vec()) {
            Ok(()) => Ok(buf.len()),
            Err(_) => Err(self.failure.wait()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.failure.replay() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Receiving side of the reader's close-with-error.
pub struct FailureSignal {
    receiver: Receiver<io::Error>,
    observed: Option<(io::ErrorKind, String)>,
}

impl FailureSignal {
    /// Block until the reader is gone and return the error it closed with.
    ///
    /// The first call hands back the original error; later calls get a copy with the
    /// same kind and message.
    pub fn wait(&mut self) -> io::Error {
        if let Some(err) = self.replay() {
            return err;
        }
        match self.receiver.recv() {
            Ok(err) => self.observe(err),
            Err(_) => io::Error::new(io::ErrorKind::BrokenPipe, "read end of pipe closed"),
        }
    }

    /// The reader's error if it has already been sent, without blocking.
    pub fn poll(&mut self) -> Option<io::Error> {
        if let Some(err) = self.replay() {
            return Some(err);
        }
        match self.receiver.try_recv() {
            Ok(err) => Some(self.observe(err)),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    fn observe(&mut self, err: io::Error) -> io::Error {
        self.observed = Some((err.kind(), err.to_string()));
        err
    }

    fn replay(&self) -> Option<io::Error> {
        self.observed
            .as_ref()
            .map(|(kind, message)| io::Error::new(*kind, message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_bytes_arrive_in_order() {
        let (mut reader, mut writer) = pipe();

        let drain = thread::spawn(move || {
            let mut out = Vec::new();
            reader.read_to_end(&mut out).unwrap();
            out
        });

        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"pipe").unwrap();
        let mut failure = writer.close();

        assert_eq!(drain.join().unwrap(), b"hello pipe");
        assert!(failure.poll().is_none());
    }

    #[test]
    fn test_small_reads_split_chunks() {
        let (mut reader, mut writer) = pipe();

        let drain = thread::spawn(move || {
            let mut pieces = Vec::new();
            let mut buf = [0u8; 3];
            loop {
                let n = reader.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                pieces.push(buf[..n].to_vec());
            }
            pieces
        });

        writer.write_all(b"abcdefg").unwrap();
        drop(writer.close());

        assert_eq!(
            drain.join().unwrap(),
            vec![b"abc".to_vec(), b"def".to_vec(), b"g".to_vec()]
        );
    }

    #[test]
    fn test_close_without_writes_is_eof() {
        let (mut reader, writer) = pipe();
        drop(writer.close());

        let mut out = Vec::new();
        assert_eq!(reader.read_to_end(&mut out).unwrap(), 0);
    }

    #[test]
    fn test_reader_error_reaches_writer() {
        let (reader, mut writer) = pipe();

        let drain = thread::spawn(move || {
            reader.close_with_error(io::Error::other("bad writer"));
        });

        let err = writer.write(b"data").unwrap_err();
        assert_eq!(err.to_string(), "bad writer");
        drain.join().unwrap();

        // Later writes keep failing the same way instead of blocking
        let err = writer.write(b"more").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert_eq!(err.to_string(), "bad writer");
        assert_eq!(writer.flush().unwrap_err().to_string(), "bad writer");
    }

    #[test]
    fn test_dropped_reader_is_broken_pipe() {
        let (reader, mut writer) = pipe();
        drop(reader);

        let err = writer.write(b"data").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_failure_signal_after_close() {
        let (mut reader, mut writer) = pipe();

        let drain = thread::spawn(move || {
            let mut buf = [0u8; 16];
            while reader.read(&mut buf).unwrap() > 0 {}
            reader.close_with_error(io::Error::other("late failure"));
        });

        writer.write_all(b"payload").unwrap();
        let mut failure = writer.close();
        drain.join().unwrap();

        assert_eq!(failure.poll().unwrap().to_string(), "late failure");
        // Replayed on the next look
        assert_eq!(failure.wait().to_string(), "late failure");
    }
}
