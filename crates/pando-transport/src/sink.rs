//! Durable sink: formatted lines appended to stdout or a file.
//!
//! The dispatcher hands lines to a [`SinkHandle`] with `try_send`; a writer
//! task owns the actual output. When the queue is full the line is dropped
//! and counted instead of stalling routing.

use crate::error::{Result, TransportError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    Stdout,
    File(PathBuf),
}

impl SinkTarget {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map_or(SinkTarget::Stdout, SinkTarget::File)
    }
}

/// Sending side of the sink. Cheap to clone; the writer task finishes and
/// flushes once every handle is dropped.
#[derive(Debug, Clone)]
pub struct SinkHandle {
    tx: mpsc::Sender<String>,
    dropped: Arc<AtomicU64>,
}

impl SinkHandle {
    /// Queue one line (without trailing newline). Returns `false` if the line
    /// was dropped.
    pub fn write(&self, line: String) -> bool {
        match self.tx.try_send(line) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(dropped, "sink queue full, line dropped");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Lines dropped so far because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Open `target` and start its writer task.
pub async fn open(
    target: &SinkTarget,
    buffer: usize,
) -> Result<(SinkHandle, JoinHandle<std::io::Result<()>>)> {
    match target {
        SinkTarget::Stdout => Ok(spawn_writer(tokio::io::stdout(), buffer)),
        SinkTarget::File(path) => {
            let file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await
                .map_err(|source| TransportError::OpenSink { path: path.clone(), source })?;
            Ok(spawn_writer(file, buffer))
        }
    }
}

/// Start a writer task over any async writer.
pub fn spawn_writer<W>(writer: W, buffer: usize) -> (SinkHandle, JoinHandle<std::io::Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(buffer.max(1));
    let task = tokio::spawn(async move {
        let mut out = BufWriter::new(writer);
        while let Some(line) = rx.recv().await {
            out.write_all(line.as_bytes()).await?;
            out.write_all(b"\n").await?;
            if rx.is_empty() {
                out.flush().await?;
            }
        }
        out.flush().await
    });
    let handle = SinkHandle {
        tx,
        dropped: Arc::new(AtomicU64::new(0)),
    };
    (handle, task)
}
