//! Shared helpers for the integration tests.
#![allow(dead_code)]

pub mod fake_tool;

use fetchq_core::config::FetchqConfig;
use fetchq_core::executor::FetchExecutor;
use fetchq_core::registry::Registry;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

pub const TARGET: &str = "https://www.youtube.com/watch?v=AAAAAAAAAAA";

/// A registry plus an executor wired to a fake tool in a scratch directory.
pub struct Harness {
    pub registry: Arc<Registry>,
    pub executor: Arc<FetchExecutor>,
    pub cfg: FetchqConfig,
    pub download_dir: TempDir,
    pub tool_dir: TempDir,
}

impl Harness {
    pub fn new(script_body: &str) -> Self {
        let tool_dir = tempdir().unwrap();
        let download_dir = tempdir().unwrap();
        let tool_path = fake_tool::write(tool_dir.path(), script_body);
        let cfg = FetchqConfig {
            tool_path,
            idle_poll_ms: 20,
            fault_backoff_ms: 50,
            ..FetchqConfig::default()
        };
        let registry = Arc::new(Registry::new());
        let executor = Arc::new(FetchExecutor::new(
            Arc::clone(&registry),
            &cfg,
            download_dir.path().to_path_buf(),
        ));
        Self {
            registry,
            executor,
            cfg,
            download_dir,
            tool_dir,
        }
    }

    /// Client identities the fake tool was invoked with, in order (`dl:<name>` / `title:<name>`).
    pub fn invocations(&self) -> Vec<String> {
        fake_tool::invocations(self.tool_dir.path())
    }

    /// (max concurrent, total) title lookups recorded by [`fake_tool::SLOW_TITLE`].
    pub fn title_overlap(&self) -> (usize, usize) {
        fake_tool::overlap(self.tool_dir.path())
    }

    pub fn download_path(&self, name: &str) -> PathBuf {
        self.download_dir.path().join(name)
    }
}

/// Polls `cond` every 10ms; panics after 10s.
pub async fn wait_until<F: FnMut() -> bool>(what: &str, mut cond: F) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

/// `fut` must finish within 10s.
pub async fn within<T>(fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(10), fut)
        .await
        .expect("operation timed out")
}
