//! `fetchq prioritize <id> up|down` – accepted, but the queue stays FIFO.

use anyhow::Result;
use fetchq_core::control::{Direction, Request, Response};
use fetchq_core::job::JobId;
use std::path::Path;

use super::{request, unexpected};

pub async fn run_prioritize(socket: &Path, id: JobId, direction: Direction) -> Result<()> {
    match request(socket, Request::Prioritize { id, direction }).await? {
        Response::Done => {
            println!("Job {id}: reordering is not supported; queue order unchanged");
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}
