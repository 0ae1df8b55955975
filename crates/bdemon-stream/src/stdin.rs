//! Piped input source
//!
//! Reads the log stream from our own stdin, e.g.
//! `npx expo start --json | bdemon --stdin`.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use bdemon_core::prelude::*;

use crate::SourceEvent;

/// Spawn a task that forwards stdin lines as [`SourceEvent::Stdout`].
///
/// The task ends at EOF, dropping its sender.
pub fn spawn_stdin_reader(tx: mpsc::Sender<SourceEvent>) -> JoinHandle<()> {
    tokio::spawn(forward_lines(BufReader::new(tokio::io::stdin()), tx))
}

/// Forward every line of `reader` until EOF or the receiver goes away.
pub async fn forward_lines<R>(reader: R, tx: mpsc::Sender<SourceEvent>)
where
    R: AsyncBufRead + Unpin,
{
    if send_lines(reader, &tx, SourceEvent::Stdout).await.is_ok() {
        info!("Input stream reached EOF");
    }
}

/// Read one line without its `\n` or `\r\n` terminator.
///
/// Invalid UTF-8 becomes U+FFFD. Returns `None` at EOF.
pub async fn read_line_lossy<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Send each line of `reader` wrapped by `event`.
///
/// `Ok` at EOF. `Err` when reading fails or the receiver is gone.
pub(crate) async fn send_lines<R>(
    mut reader: R,
    tx: &mpsc::Sender<SourceEvent>,
    event: fn(String) -> SourceEvent,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();

    loop {
        match read_line_lossy(&mut reader, &mut buf).await {
            Ok(Some(line)) => {
                trace!("line: {}", line);
                if tx.send(event(line)).await.is_err() {
                    debug!("source channel closed");
                    return Err(Error::ChannelClosed);
                }
            }
            Ok(None) => return Ok(()),
            Err(e) => {
                error!("Failed to read input: {}", e);
                return Err(e.into());
            }
        }
    }
}
