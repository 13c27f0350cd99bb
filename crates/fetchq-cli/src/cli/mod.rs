//! CLI for the fetchq media fetch queue.
//!
//! `fetchq serve` owns the queue and the worker; every other subcommand is a
//! client that sends one request over the control socket.

mod commands;
pub(crate) mod control_socket;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use fetchq_core::config;
use fetchq_core::control::{default_control_socket_path, Direction};
use fetchq_core::job::{JobId, Quality};
use std::path::PathBuf;

use commands::{
    run_add, run_completions, run_list, run_man, run_pause, run_pause_all, run_prioritize,
    run_resume, run_resume_all, run_serve, run_status,
};

/// Top-level CLI for fetchq.
#[derive(Debug, Parser)]
#[command(name = "fetchq")]
#[command(about = "fetchq: one-at-a-time media fetch queue with client fallback", long_about = None)]
pub struct Cli {
    /// Control socket path (default: ~/.local/state/fetchq/control.sock).
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum QualityArg {
    #[default]
    Best,
    Worst,
}

impl From<QualityArg> for Quality {
    fn from(q: QualityArg) -> Self {
        match q {
            QualityArg::Best => Quality::Best,
            QualityArg::Worst => Quality::Worst,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    Up,
    Down,
}

impl From<DirectionArg> for Direction {
    fn from(d: DirectionArg) -> Self {
        match d {
            DirectionArg::Up => Direction::Up,
            DirectionArg::Down => Direction::Down,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the queue worker and the control socket until Ctrl-C.
    Serve {
        /// Directory finished files are written to (default: config, then current dir).
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,
    },

    /// Queue a video for download.
    Add {
        /// Video URL (watch, short, embed or shorts link).
        url: String,
        #[arg(long, value_enum, default_value_t = QualityArg::Best)]
        quality: QualityArg,
    },

    /// List every job with status and progress.
    List,

    /// Show one job in detail.
    Status {
        /// Job identifier.
        id: JobId,
    },

    /// Pause a queued or downloading job.
    Pause {
        /// Job identifier.
        id: JobId,
    },

    /// Re-queue a paused job (it goes to the back of the queue).
    Resume {
        /// Job identifier.
        id: JobId,
    },

    /// Pause every queued and downloading job.
    PauseAll,

    /// Resume every paused job.
    ResumeAll,

    /// Accepted for compatibility; queue order does not change.
    Prioritize {
        /// Job identifier.
        id: JobId,
        #[arg(value_enum)]
        direction: DirectionArg,
    },

    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print the man page (roff).
    Man,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let socket_override = cli.socket;
        let socket = || -> Result<PathBuf> {
            match &socket_override {
                Some(path) => Ok(path.clone()),
                None => default_control_socket_path(),
            }
        };

        match cli.command {
            CliCommand::Serve { download_dir } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_serve(&cfg, download_dir, &socket()?).await?;
            }
            CliCommand::Add { url, quality } => run_add(&socket()?, &url, quality.into()).await?,
            CliCommand::List => run_list(&socket()?).await?,
            CliCommand::Status { id } => run_status(&socket()?, id).await?,
            CliCommand::Pause { id } => run_pause(&socket()?, id).await?,
            CliCommand::Resume { id } => run_resume(&socket()?, id).await?,
            CliCommand::PauseAll => run_pause_all(&socket()?).await?,
            CliCommand::ResumeAll => run_resume_all(&socket()?).await?,
            CliCommand::Prioritize { id, direction } => {
                run_prioritize(&socket()?, id, direction.into()).await?
            }
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Man => run_man()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
