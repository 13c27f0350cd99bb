//! `fetchq serve` – run the dispatcher and the control socket until Ctrl-C.

use anyhow::{Context, Result};
use fetchq_core::config::FetchqConfig;
use fetchq_core::control::Control;
use fetchq_core::dispatcher::Dispatcher;
use fetchq_core::executor::FetchExecutor;
use fetchq_core::registry::Registry;
use fetchq_core::title::TitleProber;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::cli::control_socket;

pub async fn run_serve(
    cfg: &FetchqConfig,
    download_dir: Option<PathBuf>,
    socket: &Path,
) -> Result<()> {
    let download_dir = match download_dir.or_else(|| cfg.download_dir.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    tokio::fs::create_dir_all(&download_dir)
        .await
        .with_context(|| format!("create download dir {}", download_dir.display()))?;

    let registry = Arc::new(Registry::new());
    let titles = Arc::new(TitleProber::new(Arc::clone(&registry), cfg));
    let executor = Arc::new(FetchExecutor::new(
        Arc::clone(&registry),
        cfg,
        download_dir.clone(),
    ));
    let dispatcher = Dispatcher::new(Arc::clone(&registry), executor, cfg)
        .with_title_prober(Arc::clone(&titles));
    let control = Arc::new(Control::new(Arc::clone(&registry)).with_title_prober(titles));

    let listener = control_socket::spawn_control_listener(control, socket).await?;
    tracing::info!(
        socket = %socket.display(),
        download_dir = %download_dir.display(),
        tool = %cfg.tool_path.display(),
        "fetchq serving"
    );
    println!(
        "fetchq serving on {} (downloads to {})",
        socket.display(),
        download_dir.display()
    );

    let shutdown = CancellationToken::new();
    let signal_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("ctrl-c received, shutting down");
                    shutdown.cancel();
                }
                Err(e) => tracing::warn!("cannot listen for ctrl-c: {}", e),
            }
        })
    };

    dispatcher.run(shutdown).await;

    listener.abort();
    signal_task.abort();
    if let Err(e) = std::fs::remove_file(socket) {
        tracing::debug!(path = %socket.display(), "remove control socket: {}", e);
    }
    Ok(())
}
