//! Chunked, sequential reading of a scan target.

use crate::core::error::ScanError;
use crate::core::target::ScanTarget;
use crate::core::traits::ByteStream;

use std::io::{ErrorKind, Read};

/// Reader lifecycle. The stream handle lives only in `Open`.
enum ReaderState {
    Unopened,
    Open(ByteStream),
    Exhausted,
}

impl ReaderState {
    fn name(&self) -> &'static str {
        match self {
            Self::Unopened => "unopened",
            Self::Open(_) => "open",
            Self::Exhausted => "exhausted",
        }
    }
}

/// Yields a target's bytes in fixed-size chunks.
///
/// The backend stream is opened on the first call to
/// [`next_chunk`](Self::next_chunk) and closed exactly once: when the stream
/// reports end of data, when a read fails, or when the reader is dropped
/// mid-stream. An exhausted reader never reopens.
pub struct ChunkReader<'a> {
    target: &'a ScanTarget,
    chunk_size: usize,
    state: ReaderState,
    bytes_read: u64,
    chunks_read: u64,
}

impl<'a> ChunkReader<'a> {
    /// Creates a reader over `target`.
    ///
    /// A `chunk_size` of zero is raised to one byte.
    pub fn new(target: &'a ScanTarget, chunk_size: usize) -> Self {
        Self {
            target,
            chunk_size: chunk_size.max(1),
            state: ReaderState::Unopened,
            bytes_read: 0,
            chunks_read: 0,
        }
    }

    /// Returns the next chunk, or `None` once the stream is exhausted.
    ///
    /// Also returns `None`, without touching the backend, whenever the target
    /// is not valid.
    ///
    /// # Errors
    ///
    /// - `Open` if the backend refuses to open the stream.
    /// - `Read` if the open stream fails; the reader is exhausted afterwards.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ScanError> {
        if !self.target.is_valid() {
            return Ok(None);
        }

        if let ReaderState::Unopened = self.state {
            self.open()?;
        }

        let mut buf = vec![0u8; self.chunk_size];
        let result = match &mut self.state {
            ReaderState::Open(stream) => read_retrying(stream.as_mut(), &mut buf),
            _ => return Ok(None),
        };

        let read = match result {
            Ok(n) => n,
            Err(e) => {
                self.close();
                return Err(ScanError::Read {
                    path: self.target.path().to_string(),
                    source: e,
                });
            }
        };

        if read == 0 {
            self.close();
            return Ok(None);
        }

        buf.truncate(read);
        self.bytes_read += read as u64;
        self.chunks_read += 1;
        Ok(Some(buf))
    }

    /// Returns the number of bytes handed out so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Returns the number of chunks handed out so far.
    pub fn chunks_read(&self) -> u64 {
        self.chunks_read
    }

    /// Returns `true` once the stream has been closed.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, ReaderState::Exhausted)
    }

    fn open(&mut self) -> Result<(), ScanError> {
        let stream = self
            .target
            .storage()
            .open_read(self.target.path())
            .map_err(|e| ScanError::open(self.target.path(), e.to_string()))?;

        tracing::debug!(
            object_id = %self.target.id(),
            owner = ?self.target.owner(),
            path = %self.target.path(),
            chunk_size = self.chunk_size,
            "Opened read stream"
        );

        self.state = ReaderState::Open(stream);
        Ok(())
    }

    fn close(&mut self) {
        if let ReaderState::Open(stream) = std::mem::replace(&mut self.state, ReaderState::Exhausted)
        {
            drop(stream);
            tracing::debug!(
                object_id = %self.target.id(),
                owner = ?self.target.owner(),
                path = %self.target.path(),
                bytes_read = self.bytes_read,
                chunks = self.chunks_read,
                "Read stream exhausted"
            );
        }
    }
}

fn read_retrying(stream: &mut (dyn Read + Send), buf: &mut [u8]) -> std::io::Result<usize> {
    loop {
        match stream.read(buf) {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

impl std::fmt::Debug for ChunkReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkReader")
            .field("path", &self.target.path())
            .field("chunk_size", &self.chunk_size)
            .field("state", &self.state.name())
            .field("bytes_read", &self.bytes_read)
            .finish()
    }
}
