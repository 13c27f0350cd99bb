//! `fetchq status <id>` – one job in detail.

use anyhow::Result;
use fetchq_core::control::{Request, Response};
use fetchq_core::job::JobId;
use std::path::Path;

use super::{request, unexpected};

pub async fn run_status(socket: &Path, id: JobId) -> Result<()> {
    let job = match request(socket, Request::Status { id }).await? {
        Response::Job { job } => job,
        other => return Err(unexpected(other)),
    };
    println!("id:        {}", job.id);
    println!("title:     {}", job.title);
    println!("target:    {}", job.target);
    println!("quality:   {}", job.quality.as_str());
    println!("status:    {}", job.status);
    println!("progress:  {}%", job.progress);
    if let Some(rate) = &job.rate {
        println!("rate:      {rate}");
    }
    if let Some(pos) = job.queue_position {
        println!("position:  {pos}");
    }
    if let Some(file) = &job.output_filename {
        println!("file:      {file}");
    }
    if let Some(err) = &job.last_error {
        println!("error:     {err}");
    }
    println!("created:   {}", job.created_at.to_rfc3339());
    if let Some(done) = job.completed_at {
        println!("completed: {}", done.to_rfc3339());
    }
    Ok(())
}
