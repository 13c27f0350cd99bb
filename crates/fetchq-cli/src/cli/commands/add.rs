//! `fetchq add <url>` – queue a video.

use anyhow::Result;
use fetchq_core::control::{Request, Response};
use fetchq_core::job::Quality;
use std::path::Path;

use super::{request, unexpected};

pub async fn run_add(socket: &Path, url: &str, quality: Quality) -> Result<()> {
    let req = Request::Enqueue {
        target: url.to_string(),
        quality: quality.as_str().to_string(),
    };
    match request(socket, req).await? {
        Response::Enqueued { id } => {
            println!("Queued job {id}");
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}
