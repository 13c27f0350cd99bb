//! `fetchq pause-all` / `fetchq resume-all`.

use anyhow::Result;
use fetchq_core::control::{Request, Response};
use std::path::Path;

use super::{request, unexpected};

pub async fn run_pause_all(socket: &Path) -> Result<()> {
    let count = count_of(request(socket, Request::PauseAll).await?)?;
    println!("Paused {count} job(s)");
    Ok(())
}

pub async fn run_resume_all(socket: &Path) -> Result<()> {
    let count = count_of(request(socket, Request::ResumeAll).await?)?;
    println!("Resumed {count} job(s)");
    Ok(())
}

fn count_of(response: Response) -> Result<usize> {
    match response {
        Response::Count { count } => Ok(count),
        other => Err(unexpected(other)),
    }
}
