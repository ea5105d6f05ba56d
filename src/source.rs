//! Producers: feeding text from readers and child processes into streams.

use crate::stream::StreamBuffer;
use anyhow::{Context, Result};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Copies `reader` into `stream` until EOF, then closes the stream. The stream
/// is closed on a read error too, and the error is returned.
pub async fn pipe_lines<R: AsyncRead + Unpin>(reader: R, stream: &StreamBuffer) -> Result<()> {
    let result = copy_lines(reader, stream).await;
    stream.close();
    result
}

/// Copies `reader` into `stream` one line per write, so a line from one reader
/// is never split by a write from another feeding the same stream.
async fn copy_lines<R: AsyncRead + Unpin>(reader: R, stream: &StreamBuffer) -> Result<()> {
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(());
        }
        stream.write(&line)?;
    }
}

/// Spawns `command` with stdout and stderr both feeding a new stream named
/// `name`. The stream closes once the child has exited and its output is
/// drained. Aborting the returned task kills the child.
pub fn spawn_command(
    name: impl Into<String>,
    mut command: Command,
) -> Result<(Arc<StreamBuffer>, JoinHandle<Result<ExitStatus>>)> {
    let stream = Arc::new(StreamBuffer::new(name));
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    let mut child = command
        .spawn()
        .with_context(|| format!("failed to spawn command for `{}`", stream.name()))?;
    let stdout = child.stdout.take().context("child stdout not captured")?;
    let stderr = child.stderr.take().context("child stderr not captured")?;
    log::debug!("spawned `{}` (pid {:?})", stream.name(), child.id());

    let writer = stream.clone();
    let task = tokio::spawn(async move {
        let (out, err) = tokio::join!(copy_lines(stdout, &writer), copy_lines(stderr, &writer));
        let status = child.wait().await;
        writer.close();
        out.context("reading stdout")?;
        err.context("reading stderr")?;
        let status = status?;
        log::debug!("`{}` exited with {status}", writer.name());
        Ok(status)
    });
    Ok((stream, task))
}
