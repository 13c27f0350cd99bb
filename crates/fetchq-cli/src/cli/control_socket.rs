//! Control socket: server (during `fetchq serve`) and client (every other subcommand).
//! Protocol: one JSON [`Request`] per line in, one JSON [`Response`] per line out.

use anyhow::{bail, Context, Result};
use fetchq_core::control::{Control, Request, Response};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;

/// Binds `path` and serves requests against `control` until the returned task
/// is aborted. A socket file nobody answers on is replaced; one with a live
/// daemon behind it is an error.
pub async fn spawn_control_listener(
    control: Arc<Control>,
    path: impl AsRef<Path>,
) -> Result<JoinHandle<()>> {
    let path = path.as_ref();
    if tokio::fs::symlink_metadata(path).await.is_ok() {
        if UnixStream::connect(path).await.is_ok() {
            bail!(
                "another fetchq daemon is already listening on {}",
                path.display()
            );
        }
        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("remove stale control socket {}", path.display()))?;
        tracing::debug!(path = %path.display(), "removed stale control socket");
    }
    let listener = UnixListener::bind(path)
        .with_context(|| format!("bind control socket {}", path.display()))?;
    tracing::debug!(path = %path.display(), "control socket listening");

    Ok(tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    tokio::spawn(serve_connection(Arc::clone(&control), stream));
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    }))
}

async fn serve_connection(control: Arc<Control>, stream: UnixStream) {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        let response = control.handle_line(&line);
        let mut out = match serde_json::to_vec(&response) {
            Ok(out) => out,
            Err(e) => {
                tracing::warn!("encode control response: {}", e);
                break;
            }
        };
        out.push(b'\n');
        if write.write_all(&out).await.is_err() {
            break;
        }
    }
}

/// Sends one request and waits for its response.
pub async fn send_request(socket_path: &Path, request: &Request) -> Result<Response> {
    let stream = UnixStream::connect(socket_path).await.with_context(|| {
        format!(
            "connect to {} (is `fetchq serve` running?)",
            socket_path.display()
        )
    })?;
    let (read, mut write) = stream.into_split();

    let mut msg = serde_json::to_vec(request)?;
    msg.push(b'\n');
    write.write_all(&msg).await?;

    let reply = BufReader::new(read)
        .lines()
        .next_line()
        .await?
        .context("control socket closed without a reply")?;
    Ok(serde_json::from_str(&reply)?)
}
