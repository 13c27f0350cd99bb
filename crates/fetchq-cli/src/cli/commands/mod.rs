//! CLI command handlers. Each command is in its own file.

mod add;
mod bulk;
mod generate;
mod list;
mod pause;
mod prioritize;
mod resume;
mod serve;
mod status;

pub use add::run_add;
pub use bulk::{run_pause_all, run_resume_all};
pub use generate::{run_completions, run_man};
pub use list::run_list;
pub use pause::run_pause;
pub use prioritize::run_prioritize;
pub use resume::run_resume;
pub use serve::run_serve;
pub use status::run_status;

use anyhow::{bail, Result};
use fetchq_core::control::{Request, Response};
use std::path::Path;

use crate::cli::control_socket;

/// Round trip to the daemon; an error response becomes an `Err`.
async fn request(socket: &Path, request: Request) -> Result<Response> {
    match control_socket::send_request(socket, &request).await? {
        Response::Error { kind, message } => bail!("{message} ({kind})"),
        other => Ok(other),
    }
}

fn unexpected(response: Response) -> anyhow::Error {
    anyhow::anyhow!("unexpected response from daemon: {response:?}")
}
