//! `fetchq list` – one row per job, in submission order.

use anyhow::Result;
use fetchq_core::control::{Request, Response};
use fetchq_core::job::JobView;
use std::path::Path;

use super::{request, unexpected};

pub async fn run_list(socket: &Path) -> Result<()> {
    let jobs = match request(socket, Request::List).await? {
        Response::Jobs { jobs } => jobs,
        other => return Err(unexpected(other)),
    };
    if jobs.is_empty() {
        println!("No jobs.");
        return Ok(());
    }
    println!(
        "{:<6} {:<12} {:>5} {:>4} {:<12} {}",
        "ID", "STATUS", "PROG", "POS", "RATE", "TITLE"
    );
    for job in &jobs {
        println!("{}", row(job));
    }
    Ok(())
}

fn row(job: &JobView) -> String {
    format!(
        "{:<6} {:<12} {:>4}% {:>4} {:<12} {}",
        job.id,
        job.status,
        job.progress,
        job.queue_position
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string()),
        job.rate.as_deref().unwrap_or("-"),
        job.title
    )
}
