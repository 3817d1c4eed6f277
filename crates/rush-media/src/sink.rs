//! Ordered byte sinks that completed frames are appended to.
//!
//! A sink is opened when a session starts and closed when it finalizes. It is
//! owned by exactly one session and only ever written from inside that
//! session's lock, so frames land whole and in order.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

/// Destination for encoded frames.
pub trait FrameSink: Send {
    /// Append one complete frame.
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Flush and release the destination. No frames are written afterwards.
    fn close(&mut self) -> io::Result<()>;
}

/// Buffered file sink.
pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    sync_on_close: bool,
}

impl FileSink {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            sync_on_close: true,
        })
    }

    /// Whether `close` also fsyncs the file.
    pub fn sync_on_close(mut self, sync: bool) -> Self {
        self.sync_on_close = sync;
        self
    }
}

impl FrameSink for FileSink {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.write_all(frame),
            None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed")),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        writer.flush()?;
        if self.sync_on_close {
            writer.get_ref().sync_all()?;
        }
        tracing::debug!(path = %self.path.display(), "Closed RUSH file sink");
        Ok(())
    }
}

/// In-memory sink sharing its buffer with every clone.
#[derive(Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    data: Vec<u8>,
    frames: usize,
    closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.inner.lock().data.clone()
    }

    /// Number of frames written so far.
    pub fn frame_count(&self) -> usize {
        self.inner.lock().frames
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Drop previous contents and accept writes again, like truncating a file.
    fn reset(&self) {
        let mut state = self.inner.lock();
        state.data.clear();
        state.frames = 0;
        state.closed = false;
    }
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        let mut state = self.inner.lock();
        if state.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));
        }
        state.data.extend_from_slice(frame);
        state.frames += 1;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.lock().closed = true;
        Ok(())
    }
}

/// Where a session's sink is opened.
#[derive(Clone)]
pub enum SinkTarget {
    /// A file, created or truncated on open.
    File { path: PathBuf, sync_on_close: bool },
    /// A shared in-memory buffer.
    Memory(MemorySink),
}

impl SinkTarget {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            sync_on_close: true,
        }
    }

    /// Open the destination.
    pub fn open(&self) -> io::Result<Box<dyn FrameSink>> {
        match self {
            Self::File {
                path,
                sync_on_close,
            } => Ok(Box::new(
                FileSink::create(path)?.sync_on_close(*sync_on_close),
            )),
            Self::Memory(sink) => {
                sink.reset();
                Ok(Box::new(sink.clone()))
            }
        }
    }

    /// Human-readable description for logs and errors.
    pub fn describe(&self) -> PathBuf {
        match self {
            Self::File { path, .. } => path.clone(),
            Self::Memory(_) => PathBuf::from("<memory>"),
        }
    }
}
