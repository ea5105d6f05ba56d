use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;

/// Returned by [StreamBuffer::write] once the stream has been closed. The write
/// is dropped and the content is left as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamClosed {
    pub name: String,
}

impl fmt::Display for StreamClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream `{}` is closed", self.name)
    }
}

impl std::error::Error for StreamClosed {}

impl From<StreamClosed> for io::Error {
    fn from(err: StreamClosed) -> Self {
        io::Error::new(io::ErrorKind::BrokenPipe, err)
    }
}

/// Anything the aggregator can display: a name, a current last line, and
/// whether more output may follow. [StreamBuffer] is the implementation
/// producers usually write into.
pub trait Source: Send + Sync {
    fn name(&self) -> &str;

    /// The line to show, already trimmed.
    fn last_line(&self) -> String;

    /// Once true, stays true.
    fn is_closed(&self) -> bool;
}

/// An append-only text sink for one named source.
///
/// One producer appends bytes while the render loop reads the derived state, so
/// the content lives behind a lock and is only reachable through these methods.
#[derive(Debug)]
pub struct StreamBuffer {
    name: String,
    content: Mutex<Vec<u8>>,
    closed: AtomicBool,
}

impl StreamBuffer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends `bytes` to the content. Fails with [StreamClosed] after [close](Self::close).
    pub fn write(&self, bytes: &[u8]) -> Result<(), StreamClosed> {
        // Hold the lock across the closed check so a write can't land after a
        // concurrent close has been observed by a reader.
        let mut content = self.lock();
        if self.is_closed() {
            return Err(StreamClosed {
                name: self.name.clone(),
            });
        }
        content.extend_from_slice(bytes);
        Ok(())
    }

    /// Marks the stream as finished. Calling it more than once has no further effect.
    pub fn close(&self) {
        let _content = self.lock();
        if !self.closed.swap(true, Ordering::AcqRel) {
            log::debug!("stream `{}` closed", self.name);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// The most recent line written, trimmed. A trailing partial line counts;
    /// trailing whitespace-only writes do not.
    pub fn last_line(&self) -> String {
        let content = self.lock();
        let text = String::from_utf8_lossy(&content);
        let trimmed = text.trim();
        let line = match trimmed.rfind('\n') {
            Some(pos) => &trimmed[pos + 1..],
            None => trimmed,
        };
        line.trim().to_string()
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.content.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Source for StreamBuffer {
    fn name(&self) -> &str {
        StreamBuffer::name(self)
    }

    fn last_line(&self) -> String {
        StreamBuffer::last_line(self)
    }

    fn is_closed(&self) -> bool {
        StreamBuffer::is_closed(self)
    }
}

/// A producer's handle on a shared [StreamBuffer], usable wherever a
/// [std::io::Write] or [tokio::io::AsyncWrite] is expected. Shutting it down
/// closes the stream.
#[derive(Debug, Clone)]
pub struct StreamWriter {
    stream: Arc<StreamBuffer>,
}

impl StreamWriter {
    pub fn new(stream: Arc<StreamBuffer>) -> Self {
        Self { stream }
    }

    pub fn stream(&self) -> &Arc<StreamBuffer> {
        &self.stream
    }

    pub fn close(&self) {
        self.stream.close()
    }
}

impl io::Write for StreamWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsyncWrite for StreamWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(
            self.stream
                .write(buf)
                .map(|()| buf.len())
                .map_err(io::Error::from),
        )
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.stream.close();
        Poll::Ready(Ok(()))
    }
}
