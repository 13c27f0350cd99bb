//! `fetchq resume <id>` – re-queue a paused job at the back of the queue.

use anyhow::Result;
use fetchq_core::control::{Request, Response};
use fetchq_core::job::JobId;
use std::path::Path;

use super::{request, unexpected};

pub async fn run_resume(socket: &Path, id: JobId) -> Result<()> {
    match request(socket, Request::Resume { id }).await? {
        Response::Done => {
            println!("Resumed job {id}");
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}
