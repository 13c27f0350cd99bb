//! `fetchq pause <id>` – pause a job. A running download is stopped at once.

use anyhow::Result;
use fetchq_core::control::{Request, Response};
use fetchq_core::job::JobId;
use std::path::Path;

use super::{request, unexpected};

pub async fn run_pause(socket: &Path, id: JobId) -> Result<()> {
    match request(socket, Request::Pause { id }).await? {
        Response::Done => {
            println!("Paused job {id}");
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}
